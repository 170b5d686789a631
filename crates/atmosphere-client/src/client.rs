//! Public client: acquire and release allocations

use std::sync::Arc;

use atmosphere_auth::SigningScope;
use reqwest::Method;
use serde_json::Value;

use crate::error::{Error, Result};
use crate::log::{LogSink, StdoutSink};
use crate::model::{AcquireBody, AcquireOptions, Allocation, ReleaseBody};
use crate::retry::{self, RetryPolicy};
use crate::transport::{ApiRequest, HttpTransport, Transport};

/// Client for one Atmosphere endpoint.
///
/// Cheap to clone; clones share the transport and therefore the signer.
#[derive(Clone)]
pub struct AtmosphereClient {
    transport: Arc<dyn Transport>,
    log: Arc<dyn LogSink>,
}

impl AtmosphereClient {
    /// Client over an arbitrary transport, logging to stdout.
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            log: Arc::new(StdoutSink),
        }
    }

    /// HTTPS client signing with credentials from the default AWS chain.
    /// The chain is loaded on the first request, not here.
    pub fn connect(endpoint: &str, scope: SigningScope) -> Result<Self> {
        let transport = HttpTransport::new(endpoint, scope)?;
        Ok(Self::new(Arc::new(transport)))
    }

    pub fn with_log_sink(mut self, log: Arc<dyn LogSink>) -> Self {
        self.log = log;
        self
    }

    /// Wait until the service hands out an environment from `options.pool`.
    ///
    /// Polls while the pool is exhausted (423) or the service throttles (429),
    /// for up to `options.timeout_secs` (default 600). Fails with
    /// `Error::RetryTimeout` once that budget is spent.
    pub async fn acquire(&self, options: &AcquireOptions) -> Result<Allocation> {
        let timeout_secs = options.effective_timeout_secs();
        let body = serde_json::to_value(AcquireBody {
            pool: &options.pool,
            requester: &options.requester,
        })
        .map_err(|e| Error::Decode(format!("encoding acquire request: {e}")))?;
        let request = ApiRequest::new(Method::POST, "/allocations", body);

        self.log.log(&format!(
            "Acquiring environment from pool '{}' for '{}' (timeout: {timeout_secs}s)",
            options.pool, options.requester
        ));

        let result = retry::run(
            self.transport.as_ref(),
            &request,
            &RetryPolicy::acquire(timeout_secs),
            self.log.as_ref(),
        )
        .await
        .and_then(|body| {
            serde_json::from_value::<Allocation>(body)
                .map_err(|e| Error::Decode(format!("allocation response: {e}")))
        });

        match &result {
            Ok(allocation) => self.log.log(&format!(
                "Acquired allocation '{}' (account: {}, region: {})",
                allocation.id, allocation.environment.account, allocation.environment.region
            )),
            Err(e) => self.log.log(&format!(
                "Failed to acquire environment from pool '{}': {e}",
                options.pool
            )),
        }
        result
    }

    /// Hand an allocation back to the service, recording how it went.
    ///
    /// Only throttling (429) is retried, for up to 30 seconds. The service's
    /// JSON reply is returned as-is.
    pub async fn release(&self, allocation_id: &str, outcome: &str) -> Result<Value> {
        let body = serde_json::to_value(ReleaseBody { outcome })
            .map_err(|e| Error::Decode(format!("encoding release request: {e}")))?;
        let request = ApiRequest::new(Method::DELETE, allocation_path(allocation_id)?, body);

        self.log.log(&format!(
            "Releasing allocation '{allocation_id}' (outcome: {outcome})"
        ));

        let result = retry::run(
            self.transport.as_ref(),
            &request,
            &RetryPolicy::release(),
            self.log.as_ref(),
        )
        .await;

        match &result {
            Ok(_) => self
                .log
                .log(&format!("Released allocation '{allocation_id}'")),
            Err(e) => self
                .log
                .log(&format!("Failed to release allocation '{allocation_id}': {e}")),
        }
        result
    }
}

/// `/allocations/{id}` with the id percent-encoded as one path segment.
fn allocation_path(allocation_id: &str) -> Result<String> {
    if matches!(allocation_id, "" | "." | "..") {
        return Err(Error::InvalidRequest(format!(
            "allocation id {allocation_id:?} is not a path segment"
        )));
    }
    Ok(format!("/allocations/{}", urlencoding::encode(allocation_id)))
}
