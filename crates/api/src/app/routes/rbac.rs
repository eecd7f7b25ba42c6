//! RBAC introspection endpoints.
//!
//! Lets the role admin screens list the permission identifiers this build
//! knows about and which screens they unlock. Static data, no upstream call.

use axum::{response::IntoResponse, routing::get, Json, Router};
use serde::Serialize;

use dashgate_auth::permissions::catalog;
use dashgate_auth::RouteMap;

#[derive(Debug, Serialize)]
pub struct RouteView {
    pub path: &'static str,
    pub page_access_permission: Option<String>,
}

pub fn router() -> Router {
    Router::new()
        .route("/permissions", get(list_permissions))
        .route("/routes", get(list_routes))
}

/// GET /api/rbac/permissions
pub async fn list_permissions() -> impl IntoResponse {
    let names: Vec<&str> = catalog::ALL.iter().map(|p| p.as_str()).collect();
    Json(serde_json::json!({ "permissions": names }))
}

/// GET /api/rbac/routes
pub async fn list_routes() -> impl IntoResponse {
    let routes: Vec<RouteView> = RouteMap::default()
        .entries()
        .iter()
        .map(|entry| RouteView {
            path: entry.path,
            page_access_permission: entry
                .page_access_permission
                .as_ref()
                .map(|p| p.as_str().to_string()),
        })
        .collect();
    Json(serde_json::json!({ "routes": routes }))
}
