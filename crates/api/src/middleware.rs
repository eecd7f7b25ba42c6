use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::State,
    http::{HeaderName, HeaderValue},
    middleware::Next,
    response::Response,
};
use tracing::Instrument;

use dashgate_core::RequestId;

use crate::context::RequestContext;
use crate::credentials::CredentialStore;

pub const REQUEST_ID_HEADER: HeaderName = HeaderName::from_static("x-request-id");

#[derive(Clone)]
pub struct RequestState {
    pub credentials: Arc<CredentialStore>,
}

/// Attach a [`RequestContext`] and wrap the request in a tracing span.
///
/// Only method, path and outcome are logged; headers and cookies never are.
pub async fn request_context(
    State(state): State<RequestState>,
    mut req: axum::http::Request<axum::body::Body>,
    next: Next,
) -> Response {
    let request_id = RequestId::new();
    let credential = state.credentials.read(req.headers());

    let span = tracing::info_span!(
        "http_request",
        request_id = %request_id,
        method = %req.method(),
        path = %req.uri().path(),
        authenticated = credential.is_some(),
    );

    req.extensions_mut()
        .insert(RequestContext::new(request_id, credential));

    async move {
        let started = Instant::now();
        let mut response = next.run(req).await;

        tracing::info!(
            status = response.status().as_u16(),
            latency_ms = started.elapsed().as_millis() as u64,
            "request completed"
        );

        if let Ok(value) = HeaderValue::from_str(&request_id.to_string()) {
            response.headers_mut().insert(REQUEST_ID_HEADER, value);
        }
        response
    }
    .instrument(span)
    .await
}
