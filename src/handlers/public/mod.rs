// handlers/public/mod.rs - token acquisition, no authentication required

pub mod login; // POST /api/login

pub use login::login_post;
