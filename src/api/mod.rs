pub mod extract;
pub mod format;

pub use extract::{JsonBody, PathParams, QueryParams};
pub use format::populate_ticket;
