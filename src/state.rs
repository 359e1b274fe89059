use std::sync::Arc;

use crate::auth::directory::DirectoryAuthenticator;
use crate::config::AppConfig;
use crate::database::{SequenceStore, TicketStore, UserStore};
use crate::notify::Notifier;

/// Everything a handler needs, built once in `main` (or a test) and shared
/// through axum's `State`.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub users: Arc<dyn UserStore>,
    pub tickets: Arc<dyn TicketStore>,
    pub sequences: Arc<dyn SequenceStore>,
    pub directory: Arc<dyn DirectoryAuthenticator>,
    pub notifier: Notifier,
}
