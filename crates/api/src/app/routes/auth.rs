//! Session endpoints: login issues the credential cookie, logout revokes it.

use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    extract::{Extension, RawQuery, Request},
    http::{header, Method, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::Value;

use crate::app::{errors, GatewayState};
use crate::context::RequestContext;
use crate::credentials::Credential;
use crate::operations::LOGIN;
use crate::proxy::{self, Outcome};

const TOKEN_FIELDS: [&str; 3] = ["token", "accessToken", "access_token"];

/// POST /api/auth/login
///
/// The credential is only issued after the upstream answer classified as a
/// success. The token never reaches the browser in the body.
pub async fn login(
    Extension(state): Extension<Arc<GatewayState>>,
    Extension(ctx): Extension<RequestContext>,
    RawQuery(query): RawQuery,
    request: Request,
) -> Response {
    let outcome = proxy::forward(&LOGIN, &state, &ctx, &HashMap::new(), query.as_deref(), request).await;

    let (status, mut data) = match outcome {
        Outcome::Success { status, data } => (status, data),
        failure => return failure.into_response(),
    };

    let Some(token) = take_token(&mut data) else {
        tracing::warn!("login succeeded upstream but no token was issued");
        return errors::json_error(StatusCode::BAD_GATEWAY, "Login response did not include a token");
    };

    let cookie = match state.credentials.issue(&token, state.config.session_ttl) {
        Ok(cookie) => cookie,
        Err(err) => {
            tracing::warn!(error = %err, "login succeeded upstream but the token cannot be stored");
            return errors::json_error(StatusCode::BAD_GATEWAY, "Login response included an invalid token");
        }
    };
    tracing::info!(ttl_secs = state.config.session_ttl.as_secs(), "session credential issued");

    let mut response = (status, Json(data)).into_response();
    response.headers_mut().append(header::SET_COOKIE, cookie);
    response
}

/// /api/auth/logout: POST only, anything else gets an empty 405.
pub async fn logout(method: Method, Extension(state): Extension<Arc<GatewayState>>) -> Response {
    if method != Method::POST {
        return StatusCode::METHOD_NOT_ALLOWED.into_response();
    }

    tracing::info!("session credential revoked");
    (StatusCode::OK, [(header::SET_COOKIE, state.credentials.revoke())]).into_response()
}

/// Remove every token field from the body (top level and `data`), returning
/// the first non-empty one.
fn take_token(body: &mut Value) -> Option<Credential> {
    let mut found = None;

    let mut take_from = |map: &mut serde_json::Map<String, Value>| {
        for field in TOKEN_FIELDS {
            if let Some(Value::String(token)) = map.remove(field) {
                if found.is_none() && !token.trim().is_empty() {
                    found = Some(Credential::new(token.trim()));
                }
            }
        }
    };

    if let Some(map) = body.as_object_mut() {
        take_from(map);
        if let Some(inner) = map.get_mut("data").and_then(Value::as_object_mut) {
            take_from(inner);
        }
    }

    found
}
