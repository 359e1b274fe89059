// handlers/protected/mod.rs - JWT-authenticated API
//
// Role requirements are attached per route in `crate::app`; handlers only
// perform the per-resource checks (ticket submitter, profile owner).
pub mod tickets;
pub mod users;
