//! Client for the Atmosphere environment allocation service
//!
//! Callers lease a temporary cloud environment (account, region and
//! short-lived credentials) from a named pool and hand it back when done.
//! When a pool has no free environment the service answers `423 Locked`, so
//! acquisition is a polling loop with exponential backoff bounded by a
//! timeout budget.
//!
//! Request flow:
//! 1. `AtmosphereClient::acquire()` / `release()` build a fixed `ApiRequest`
//! 2. `retry::run()` drives the pipeline under a `RetryPolicy`
//! 3. `pipeline::send_once()` sends through the `Transport` and classifies
//!    the response as success or `ServiceError`
//! 4. `HttpTransport` signs each request with SigV4 (credentials from the
//!    default AWS chain) and sends it with reqwest
//!
//! Progress lines (start, each retry, outcome) go to a `LogSink` chosen by
//! the host; the default prints to stdout.

pub mod client;
pub mod error;
pub mod log;
pub mod model;
pub mod pipeline;
pub mod retry;
pub mod transport;

#[cfg(test)]
pub(crate) mod test_support;

pub use client::AtmosphereClient;
pub use error::{Error, Result, ServiceError, UNKNOWN_ERROR};
pub use log::{LogSink, MemorySink, StdoutSink, TracingSink};
pub use model::{AcquireOptions, Allocation, Credentials, DEFAULT_ACQUIRE_TIMEOUT_SECS, Environment};
pub use retry::{RetryDecision, RetryPolicy, RetryState};
pub use transport::{ApiRequest, ApiResponse, DEFAULT_REQUEST_TIMEOUT, HttpTransport, Transport};
