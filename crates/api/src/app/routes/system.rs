use axum::http::StatusCode;

/// Liveness probe. Does not touch the upstream.
pub async fn health() -> StatusCode {
    StatusCode::OK
}
