//! Error taxonomy for client operations
//!
//! - `Service`: the service answered with a non-200 status that is not retried
//! - `RetryTimeout`: a retryable status persisted past the timeout budget
//! - `Transport` / `Decode`: the exchange itself failed; never retried
//! - `Auth`: credentials could not be resolved or the request not signed
//! - `InvalidRequest`: the caller's arguments cannot form a request

use std::fmt;
use std::time::Duration;

/// Message used when an error response carries no `message` field.
pub const UNKNOWN_ERROR: &str = "Unknown error";

/// A non-200 answer from the service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceError {
    pub status_code: u16,
    /// Reason phrase, when one is known for the status.
    pub status_text: Option<String>,
    /// `message` from the response body, or `UNKNOWN_ERROR`.
    pub message: String,
}

impl fmt::Display for ServiceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.status_text {
            Some(text) => write!(f, "{} ({}): {}", self.status_code, text, self.message),
            None => write!(f, "{}: {}", self.status_code, self.message),
        }
    }
}

impl std::error::Error for ServiceError {}

/// Errors from client operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Service(#[from] ServiceError),

    #[error("Failed to {operation} within {} seconds (last response: {last})", .timeout.as_secs())]
    RetryTimeout {
        operation: &'static str,
        timeout: Duration,
        attempts: u32,
        last: ServiceError,
    },

    #[error("{0}")]
    Transport(#[source] Box<dyn std::error::Error + Send + Sync>),

    #[error("invalid response body: {0}")]
    Decode(String),

    #[error(transparent)]
    Auth(#[from] atmosphere_auth::Error),

    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

impl Error {
    /// HTTP status behind this error, if the service answered at all.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Error::Service(err) => Some(err.status_code),
            Error::RetryTimeout { last, .. } => Some(last.status_code),
            _ => None,
        }
    }
}

/// Result alias for client operations.
pub type Result<T> = std::result::Result<T, Error>;
