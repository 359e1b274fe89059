// handlers/mod.rs - two security tiers
//
// Public (no auth): /api/login
// Protected (JWT auth, plus a per-route role guard): /api/users/*, /api/tickets/*
pub mod protected;
pub mod public;
