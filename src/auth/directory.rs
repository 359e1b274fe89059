use async_trait::async_trait;

#[derive(Debug, thiserror::Error)]
pub enum DirectoryError {
    /// Credentials refused by the directory.
    #[error("directory rejected the credentials")]
    Rejected,

    #[error("directory unavailable: {0}")]
    Unavailable(String),
}

/// Bind check for accounts that are not authenticated locally
/// (`local = false`), e.g. campus LDAP / Active Directory.
#[async_trait]
pub trait DirectoryAuthenticator: Send + Sync {
    async fn bind(&self, username: &str, password: &str) -> Result<(), DirectoryError>;
}

/// Used when no directory is configured. Every bind is refused, so
/// non-local accounts cannot log in.
pub struct NoDirectory;

#[async_trait]
impl DirectoryAuthenticator for NoDirectory {
    async fn bind(&self, username: &str, _password: &str) -> Result<(), DirectoryError> {
        tracing::warn!("No directory configured; rejecting bind for {}", username);
        Err(DirectoryError::Rejected)
    }
}
