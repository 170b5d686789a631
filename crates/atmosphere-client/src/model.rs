//! Wire types for the allocation API
//!
//! Field names follow the service's camelCase JSON. Allocations are created by
//! the service and only ever deserialized here.

use std::fmt;

use serde::{Deserialize, Serialize};

/// How long `acquire` keeps polling when no `timeout_secs` is given.
pub const DEFAULT_ACQUIRE_TIMEOUT_SECS: u64 = 600;

/// A cloud account/region pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Environment {
    pub account: String,
    pub region: String,
}

/// Short-lived credentials for an allocated environment.
///
/// Passed through to the caller untouched; `Debug` redacts the secret parts.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Credentials {
    pub access_key_id: String,
    pub secret_access_key: String,
    pub session_token: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"[REDACTED]")
            .field("session_token", &"[REDACTED]")
            .finish()
    }
}

/// A leased environment. Valid until released.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Allocation {
    pub id: String,
    pub environment: Environment,
    pub credentials: Credentials,
}

/// Input to `AtmosphereClient::acquire`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AcquireOptions {
    /// Pool to allocate from.
    pub pool: String,
    /// Who is asking; recorded by the service.
    pub requester: String,
    /// Polling budget; `DEFAULT_ACQUIRE_TIMEOUT_SECS` when `None`.
    pub timeout_secs: Option<u64>,
}

impl AcquireOptions {
    pub fn new(pool: impl Into<String>, requester: impl Into<String>) -> Self {
        Self {
            pool: pool.into(),
            requester: requester.into(),
            timeout_secs: None,
        }
    }

    pub fn with_timeout_secs(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = Some(timeout_secs);
        self
    }

    pub fn effective_timeout_secs(&self) -> u64 {
        self.timeout_secs.unwrap_or(DEFAULT_ACQUIRE_TIMEOUT_SECS)
    }
}

/// Body of `POST /allocations`.
#[derive(Debug, Serialize)]
pub(crate) struct AcquireBody<'a> {
    pub pool: &'a str,
    pub requester: &'a str,
}

/// Body of `DELETE /allocations/{id}`.
#[derive(Debug, Serialize)]
pub(crate) struct ReleaseBody<'a> {
    pub outcome: &'a str,
}
