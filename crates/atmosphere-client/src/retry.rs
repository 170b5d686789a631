//! Retry/backoff controller
//!
//! Drives the pipeline until it gets a non-retryable outcome or the timeout
//! budget runs out. The per-call state is an explicit `RetryState` with a pure
//! transition (`on_retryable`); the async loop in `run` only performs the I/O
//! and sleeps that the transition asks for.
//!
//! Backoff starts at 1s and doubles up to the policy's maximum. The budget is
//! checked after a retryable failure and before sleeping: once the time since
//! the first attempt reaches the timeout, the controller gives up instead of
//! waiting again.

use std::time::Duration;

use serde_json::Value;
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::log::LogSink;
use crate::pipeline;
use crate::transport::{ApiRequest, Transport};

/// Throttling is retried by every policy.
pub const THROTTLED: u16 = 429;

/// No capacity in the pool yet.
pub const LOCKED: u16 = 423;

/// First backoff delay.
pub const INITIAL_DELAY: Duration = Duration::from_secs(1);

/// Timeout budget, backoff cap and retryable statuses for one operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Used in the give-up message: "Failed to {operation} within …".
    pub operation: &'static str,
    pub timeout: Duration,
    pub max_delay: Duration,
    /// Statuses retried in addition to `THROTTLED`.
    pub retryable_statuses: Vec<u16>,
}

impl RetryPolicy {
    /// Long budget; waits out `423 Locked` until capacity frees up.
    pub fn acquire(timeout_secs: u64) -> Self {
        Self {
            operation: "acquire environment",
            timeout: Duration::from_secs(timeout_secs),
            max_delay: Duration::from_secs(60),
            retryable_statuses: vec![LOCKED],
        }
    }

    /// Short budget; only throttling is retried.
    pub fn release() -> Self {
        Self {
            operation: "release allocation",
            timeout: Duration::from_secs(30),
            max_delay: Duration::from_secs(32),
            retryable_statuses: Vec::new(),
        }
    }

    pub fn is_retryable(&self, status: u16) -> bool {
        status == THROTTLED || self.retryable_statuses.contains(&status)
    }
}

/// What to do after a retryable failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetryDecision {
    /// Sleep for `delay`, then try again with `next`.
    Wait { delay: Duration, next: RetryState },
    /// Budget exhausted.
    GiveUp,
}

/// Per-call retry state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryState {
    /// 1-based number of the attempt that just failed.
    pub attempt: u32,
    pub next_delay: Duration,
    /// `None` when the budget reaches past what the clock can represent.
    pub deadline: Option<Instant>,
    max_delay: Duration,
}

impl RetryState {
    pub fn start(policy: &RetryPolicy, now: Instant) -> Self {
        Self {
            attempt: 1,
            next_delay: INITIAL_DELAY.min(policy.max_delay),
            deadline: now.checked_add(policy.timeout),
            max_delay: policy.max_delay,
        }
    }

    /// Transition after attempt `self.attempt` failed with a retryable status at `now`.
    pub fn on_retryable(self, now: Instant) -> RetryDecision {
        if self.deadline.is_some_and(|deadline| now >= deadline) {
            return RetryDecision::GiveUp;
        }
        let delay = self.next_delay;
        RetryDecision::Wait {
            delay,
            next: RetryState {
                attempt: self.attempt + 1,
                next_delay: (delay * 2).min(self.max_delay),
                ..self
            },
        }
    }
}

/// Run `request` through the pipeline under `policy`.
pub async fn run(
    transport: &dyn Transport,
    request: &ApiRequest,
    policy: &RetryPolicy,
    log: &dyn LogSink,
) -> Result<Value> {
    let mut state = RetryState::start(policy, Instant::now());

    loop {
        let err = match pipeline::send_once(transport, request).await {
            Ok(body) => {
                debug!(
                    method = %request.method,
                    path = %request.path,
                    attempts = state.attempt,
                    "request succeeded"
                );
                return Ok(body);
            }
            Err(Error::Service(err)) if policy.is_retryable(err.status_code) => err,
            Err(e) => return Err(e),
        };

        let attempts = state.attempt;
        match state.on_retryable(Instant::now()) {
            RetryDecision::Wait { delay, next } => {
                log.log(&format!(
                    "{} {} failed with {err}, retrying in {}s (attempt {})",
                    request.method,
                    request.path,
                    delay.as_secs(),
                    next.attempt
                ));
                debug!(
                    status = err.status_code,
                    delay_secs = delay.as_secs(),
                    attempt = next.attempt,
                    "backing off"
                );
                tokio::time::sleep(delay).await;
                state = next;
            }
            RetryDecision::GiveUp => {
                warn!(
                    operation = policy.operation,
                    status = err.status_code,
                    attempts,
                    timeout_secs = policy.timeout.as_secs(),
                    "retry budget exhausted"
                );
                return Err(Error::RetryTimeout {
                    operation: policy.operation,
                    timeout: policy.timeout,
                    attempts,
                    last: err,
                });
            }
        }
    }
}
