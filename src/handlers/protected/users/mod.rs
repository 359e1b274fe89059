// handlers/protected/users/mod.rs - /api/users

pub mod create; // POST  /api/users            (ADMIN)
pub mod list; //   GET   /api/users            (ADMIN), /api/users/technicians
pub mod show; //   GET   /api/users/:id        (self or ADMIN)
pub mod update; // PATCH /api/users/:id        (self or ADMIN)

pub use create::user_post;
pub use list::{technicians_get, users_get};
pub use show::user_get;
pub use update::user_patch;
