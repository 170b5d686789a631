//! Scripted transport for unit tests
//!
//! Plays back a fixed list of responses and records every request along with
//! the (tokio) time it was sent, so backoff delays can be read off as the
//! gaps between calls under a paused clock.

use std::collections::VecDeque;
use std::future::Future;
use std::pin::Pin;
use std::sync::Mutex;

use tokio::time::Instant;

use crate::error::{Error, Result};
use crate::transport::{ApiRequest, ApiResponse, Transport};

pub(crate) enum Scripted {
    Respond(ApiResponse),
    Fail(&'static str),
}

pub(crate) struct ScriptedTransport {
    script: Mutex<VecDeque<Scripted>>,
    /// Replay the last entry forever once the script runs out.
    keep_last: bool,
    calls: Mutex<Vec<(ApiRequest, Instant)>>,
}

impl ScriptedTransport {
    pub(crate) fn new(script: Vec<Scripted>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            keep_last: false,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Answer every request with the same response.
    pub(crate) fn always(status: u16, status_text: &str, body: &str) -> Self {
        Self {
            keep_last: true,
            ..Self::new(vec![respond(status, status_text, body)])
        }
    }

    pub(crate) fn requests(&self) -> Vec<ApiRequest> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .map(|(r, _)| r.clone())
            .collect()
    }

    pub(crate) fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    /// Time between consecutive calls, in milliseconds.
    pub(crate) fn gaps_ms(&self) -> Vec<u128> {
        let calls = self.calls.lock().unwrap();
        calls
            .windows(2)
            .map(|w| (w[1].1 - w[0].1).as_millis())
            .collect()
    }

    /// Time from the first call to the last one.
    pub(crate) fn span(&self) -> std::time::Duration {
        let calls = self.calls.lock().unwrap();
        match (calls.first(), calls.last()) {
            (Some(first), Some(last)) => last.1 - first.1,
            _ => std::time::Duration::ZERO,
        }
    }

    fn next(&self) -> Result<ApiResponse> {
        let mut script = self.script.lock().unwrap();
        let entry = if self.keep_last && script.len() == 1 {
            match &script[0] {
                Scripted::Respond(r) => Scripted::Respond(r.clone()),
                Scripted::Fail(m) => Scripted::Fail(*m),
            }
        } else {
            script.pop_front().expect("transport script exhausted")
        };
        match entry {
            Scripted::Respond(response) => Ok(response),
            Scripted::Fail(message) => Err(Error::Transport(message.into())),
        }
    }
}

impl Transport for ScriptedTransport {
    fn send<'a>(
        &'a self,
        request: &'a ApiRequest,
    ) -> Pin<Box<dyn Future<Output = Result<ApiResponse>> + Send + 'a>> {
        self.calls
            .lock()
            .unwrap()
            .push((request.clone(), Instant::now()));
        let result = self.next();
        Box::pin(async move { result })
    }
}

pub(crate) fn respond(status: u16, status_text: &str, body: &str) -> Scripted {
    Scripted::Respond(ApiResponse {
        status,
        status_text: Some(status_text.to_owned()),
        body: body.to_owned(),
    })
}

pub(crate) fn locked() -> Scripted {
    respond(423, "Locked", r#"{"message":"No available environments"}"#)
}

pub(crate) fn throttled() -> Scripted {
    respond(429, "Too Many Requests", r#"{"message":"Rate exceeded"}"#)
}

pub(crate) fn ok(body: &str) -> Scripted {
    respond(200, "OK", body)
}

pub(crate) fn allocation_json() -> &'static str {
    r#"{
        "id": "id",
        "environment": {"account": "account", "region": "region"},
        "credentials": {
            "accessKeyId": "accessKeyId",
            "secretAccessKey": "secretAccessKey",
            "sessionToken": "sessionToken"
        }
    }"#
}
