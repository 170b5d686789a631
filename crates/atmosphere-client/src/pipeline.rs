//! Single request/response exchange
//!
//! Sends one request and classifies the answer:
//! - 200 → parsed JSON body
//! - anything else → `ServiceError` with the body's `message` (or `UNKNOWN_ERROR`)
//! - body that isn't JSON → `Error::Decode`, whatever the status
//!
//! Transport and auth failures pass through untouched.

use serde_json::Value;

use crate::error::{Error, Result, ServiceError, UNKNOWN_ERROR};
use crate::transport::{ApiRequest, Transport};

pub async fn send_once(transport: &dyn Transport, request: &ApiRequest) -> Result<Value> {
    let response = transport.send(request).await?;

    let body: Value = serde_json::from_str(&response.body).map_err(|e| {
        Error::Decode(format!(
            "{} {} returned {}: {e}",
            request.method, request.path, response.status
        ))
    })?;

    if response.status == 200 {
        return Ok(body);
    }

    Err(ServiceError {
        status_code: response.status,
        status_text: response.status_text,
        message: error_message(&body),
    }
    .into())
}

/// The service puts a human-readable reason in `message`.
fn error_message(body: &Value) -> String {
    match body.get("message") {
        None | Some(Value::Null) => UNKNOWN_ERROR.to_owned(),
        Some(Value::String(message)) => message.clone(),
        Some(other) => other.to_string(),
    }
}
