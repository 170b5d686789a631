//! Error types for credential lookup and request signing

/// Errors from authentication operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("missing credentials: {0}")]
    MissingCredentials(String),

    #[error("request signing failed: {0}")]
    Signing(String),
}

/// Result alias for auth operations.
pub type Result<T> = std::result::Result<T, Error>;
