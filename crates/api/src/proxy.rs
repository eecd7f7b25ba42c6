//! Shared proxy contract: read credential, call upstream, normalise the outcome.
//!
//! Outcome classification is evaluated in a fixed order:
//! 1. transport failure      -> 503, generic message
//! 2. upstream 4xx/5xx       -> upstream status, upstream message, raw body
//! 3. falsy business flag    -> payload status (4xx/5xx) or 400
//! 4. otherwise              -> upstream status + body, verbatim

use std::collections::HashMap;

use axum::{
    extract::Request,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::Value;

use dashgate_core::envelope::GENERIC_FAILURE_MESSAGE;
use dashgate_core::ErrorEnvelope;

use crate::app::errors;
use crate::app::GatewayState;
use crate::context::RequestContext;
use crate::operations::{BodyKind, Operation};
use crate::upstream::{UpstreamBody, UpstreamError, UpstreamResponse};

/// Inbound JSON bodies larger than this are rejected before reaching upstream.
pub const MAX_JSON_BODY: usize = 2 * 1024 * 1024;

#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Success { status: StatusCode, data: Value },
    Failure(ErrorEnvelope),
}

impl IntoResponse for Outcome {
    fn into_response(self) -> Response {
        match self {
            Outcome::Success { status, data } => (status, Json(data)).into_response(),
            Outcome::Failure(envelope) => errors::envelope_response(envelope),
        }
    }
}

/// Run one operation end to end. Never panics, always produces an outcome.
pub async fn forward(
    op: &'static Operation,
    state: &GatewayState,
    ctx: &RequestContext,
    params: &HashMap<String, String>,
    query: Option<&str>,
    request: Request,
) -> Outcome {
    let path = match interpolate(op.upstream, params) {
        Ok(path) => path,
        Err(envelope) => return Outcome::Failure(envelope),
    };

    let body = match read_body(op.body, request).await {
        Ok(body) => body,
        Err(envelope) => return Outcome::Failure(envelope),
    };

    // A missing credential is not fatal here: upstream is the authority on auth.
    let credential = if op.authenticated { ctx.credential() } else { None };

    let result = state
        .upstream
        .call(op.method.clone(), &path, query, body, credential)
        .await;

    let outcome = classify(result);
    let request_id = ctx.request_id();
    match &outcome {
        Outcome::Success { status, .. } => {
            tracing::debug!(%request_id, operation = op.name, status = status.as_u16(), "proxied");
        }
        Outcome::Failure(envelope) if envelope.status == 503 => {
            tracing::warn!(%request_id, operation = op.name, "upstream unreachable");
        }
        Outcome::Failure(envelope) => {
            tracing::info!(
                %request_id,
                operation = op.name,
                status = envelope.status,
                "upstream rejected request"
            );
        }
    }
    outcome
}

/// Map an upstream result onto the normalised vocabulary.
pub fn classify(result: Result<UpstreamResponse, UpstreamError>) -> Outcome {
    let response = match result {
        Ok(response) => response,
        Err(err) => {
            tracing::debug!(error = %err, "no response from upstream");
            return Outcome::Failure(ErrorEnvelope::no_response());
        }
    };

    let UpstreamResponse { status, data } = response;

    if status.is_client_error() || status.is_server_error() {
        return Outcome::Failure(ErrorEnvelope::from_payload(
            status.as_u16(),
            data,
            status.canonical_reason().unwrap_or(GENERIC_FAILURE_MESSAGE),
        ));
    }

    if !business_success(&data) {
        let status = payload_error_status(&data).unwrap_or(400);
        let fallback = StatusCode::from_u16(status)
            .ok()
            .and_then(|s| s.canonical_reason())
            .unwrap_or(GENERIC_FAILURE_MESSAGE);
        return Outcome::Failure(ErrorEnvelope::from_payload(status, data, fallback));
    }

    Outcome::Success { status, data }
}

/// The payload's own success flag.
///
/// `success` wins when present, by truthiness. Otherwise a `status` of
/// `false`, `0`, `null`, `""` or an HTTP error code marks a failure. Any
/// other `status` belongs to the domain record and is left alone.
pub fn business_success(data: &Value) -> bool {
    if let Some(flag) = data.get("success") {
        return truthy(flag);
    }
    match data.get("status") {
        Some(Value::Number(n)) if n.as_u64().is_some_and(|s| (400..=599).contains(&s)) => false,
        Some(status) => truthy(status),
        None => true,
    }
}

fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

fn payload_error_status(data: &Value) -> Option<u16> {
    ["status", "statusCode", "code"]
        .iter()
        .filter_map(|key| data.get(*key).and_then(Value::as_u64))
        .find(|s| (400..=599).contains(s))
        .and_then(|s| u16::try_from(s).ok())
}

/// Substitute `{name}` placeholders. Every path param is a numeric id.
pub fn interpolate(template: &str, params: &HashMap<String, String>) -> Result<String, ErrorEnvelope> {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find('{') {
        out.push_str(&rest[..start]);
        let Some(len) = rest[start..].find('}') else {
            break;
        };
        let name = &rest[start + 1..start + len];
        let id = params
            .get(name)
            .and_then(|raw| raw.parse::<u64>().ok())
            .ok_or_else(|| ErrorEnvelope::bad_request("Invalid id"))?;
        out.push_str(&id.to_string());
        rest = &rest[start + len + 1..];
    }
    out.push_str(rest);

    Ok(out)
}

async fn read_body(kind: BodyKind, request: Request) -> Result<UpstreamBody, ErrorEnvelope> {
    match kind {
        BodyKind::None => Ok(UpstreamBody::Empty),
        BodyKind::Json => {
            let bytes = axum::body::to_bytes(request.into_body(), MAX_JSON_BODY)
                .await
                .map_err(|_| ErrorEnvelope::new(413, "Request body too large"))?;
            if bytes.is_empty() {
                Ok(UpstreamBody::Empty)
            } else {
                Ok(UpstreamBody::Json(bytes))
            }
        }
        BodyKind::Stream => {
            let content_type = request.headers().get(header::CONTENT_TYPE).cloned();
            Ok(UpstreamBody::Stream {
                body: request.into_body(),
                content_type,
            })
        }
    }
}
