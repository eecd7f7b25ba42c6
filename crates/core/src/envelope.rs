//! Normalized error envelope.
//!
//! Every failure the gateway reports to the browser has this shape, whatever
//! went wrong underneath (transport, upstream rejection, bad local input).

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Message used when the upstream could not be reached at all.
pub const NO_RESPONSE_MESSAGE: &str = "No response from Server";

/// Fallback message when neither the payload nor the status says anything useful.
pub const GENERIC_FAILURE_MESSAGE: &str = "Request failed";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorEnvelope {
    pub status: u16,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw: Option<Value>,
}

impl ErrorEnvelope {
    pub fn new(status: u16, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            raw: None,
        }
    }

    /// Attach the upstream payload verbatim.
    pub fn with_raw(mut self, raw: Value) -> Self {
        self.raw = Some(raw);
        self
    }

    /// Upstream never answered. Deliberately carries no upstream detail.
    pub fn no_response() -> Self {
        Self::new(503, NO_RESPONSE_MESSAGE)
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(400, message)
    }

    /// Build an envelope from an upstream error payload.
    ///
    /// The message is taken from the payload when it carries one, otherwise
    /// `fallback` is used. A `null` payload is not kept as `raw`.
    pub fn from_payload(status: u16, payload: Value, fallback: &str) -> Self {
        let message = payload_message(&payload).unwrap_or_else(|| fallback.to_string());
        let envelope = Self::new(status, message);
        if payload.is_null() {
            envelope
        } else {
            envelope.with_raw(payload)
        }
    }
}

impl core::fmt::Display for ErrorEnvelope {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{} ({})", self.message, self.status)
    }
}

/// Pull a human readable message out of an arbitrary upstream payload.
///
/// Looks at `message`, then `error` (string), then `error.message`. A bare
/// JSON string payload is used as-is.
pub fn payload_message(payload: &Value) -> Option<String> {
    let non_empty = |s: &str| {
        let s = s.trim();
        (!s.is_empty()).then(|| s.to_string())
    };

    match payload {
        Value::String(s) => non_empty(s),
        Value::Object(map) => {
            if let Some(msg) = map.get("message").and_then(Value::as_str).and_then(non_empty) {
                return Some(msg);
            }
            match map.get("error") {
                Some(Value::String(s)) => non_empty(s),
                Some(Value::Object(inner)) => {
                    inner.get("message").and_then(Value::as_str).and_then(non_empty)
                }
                _ => None,
            }
        }
        _ => None,
    }
}
