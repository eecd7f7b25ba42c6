use axum::http::StatusCode;
use axum::response::IntoResponse;

use dashgate_core::ErrorEnvelope;

/// The only place failures become HTTP responses.
///
/// The response status mirrors `envelope.status`; an out-of-range status
/// falls back to 502 since it can only have come from a misbehaving upstream.
pub fn envelope_response(envelope: ErrorEnvelope) -> axum::response::Response {
    let status = StatusCode::from_u16(envelope.status)
        .ok()
        .filter(|s| s.is_client_error() || s.is_server_error())
        .unwrap_or(StatusCode::BAD_GATEWAY);

    (status, axum::Json(envelope)).into_response()
}

pub fn json_error(status: StatusCode, message: impl Into<String>) -> axum::response::Response {
    envelope_response(ErrorEnvelope::new(status.as_u16(), message))
}
