//! Catalogue of proxied operations.
//!
//! Each entry maps one inbound route onto one upstream call. All of them go
//! through [`crate::proxy::forward`]; login, logout and download have their
//! own handlers on top of that.

use axum::http::Method;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyKind {
    None,
    /// JSON body forwarded verbatim.
    Json,
    /// Raw body streamed to upstream without being read.
    Stream,
}

#[derive(Debug)]
pub struct Operation {
    pub name: &'static str,
    pub method: Method,
    /// Inbound route (axum syntax, `:id` params).
    pub path: &'static str,
    /// Upstream path template relative to the base URL; `{id}` is substituted.
    pub upstream: &'static str,
    /// Whether the session credential is attached.
    pub authenticated: bool,
    pub body: BodyKind,
}

const fn public(name: &'static str, path: &'static str, upstream: &'static str) -> Operation {
    Operation {
        name,
        method: Method::POST,
        path,
        upstream,
        authenticated: false,
        body: BodyKind::Json,
    }
}

const fn get(name: &'static str, path: &'static str, upstream: &'static str) -> Operation {
    Operation {
        name,
        method: Method::GET,
        path,
        upstream,
        authenticated: true,
        body: BodyKind::None,
    }
}

const fn delete(name: &'static str, path: &'static str, upstream: &'static str) -> Operation {
    Operation {
        name,
        method: Method::DELETE,
        path,
        upstream,
        authenticated: true,
        body: BodyKind::None,
    }
}

const fn write(
    name: &'static str,
    method: Method,
    path: &'static str,
    upstream: &'static str,
) -> Operation {
    Operation {
        name,
        method,
        path,
        upstream,
        authenticated: true,
        body: BodyKind::Json,
    }
}

/// Login is routed by its own handler, which issues the credential.
pub static LOGIN: Operation = public("login", "/api/auth/login", "auth/login");

/// Operations served by the generic proxy handler.
pub static OPERATIONS: &[Operation] = &[
    public("forgot_password", "/api/auth/forgot-password", "auth/forgot-password"),
    public("reset_password", "/api/auth/reset-password", "auth/reset-password"),
    get("get_profile", "/api/profile", "auth/me"),
    write("update_profile", Method::PUT, "/api/profile", "auth/me"),
    write("change_password", Method::PUT, "/api/profile/password", "auth/change-password"),
    get("dashboard_stats", "/api/dashboard", "dashboard"),
    get("list_permissions", "/api/permissions", "permissions"),
    // campaigns
    get("list_campaigns", "/api/campaigns", "campaigns"),
    get("get_campaign", "/api/campaigns/:id", "campaigns/{id}"),
    write("create_campaign", Method::POST, "/api/campaigns", "campaigns"),
    write("update_campaign", Method::PUT, "/api/campaigns/:id", "campaigns/{id}"),
    delete("delete_campaign", "/api/campaigns/:id", "campaigns/{id}"),
    // screens
    get("list_screens", "/api/screens", "screens"),
    get("get_screen", "/api/screens/:id", "screens/{id}"),
    write("create_screen", Method::POST, "/api/screens", "screens"),
    write("update_screen", Method::PUT, "/api/screens/:id", "screens/{id}"),
    delete("delete_screen", "/api/screens/:id", "screens/{id}"),
    // events
    get("list_events", "/api/events", "events"),
    get("get_event", "/api/events/:id", "events/{id}"),
    write("create_event", Method::POST, "/api/events", "events"),
    write("update_event", Method::PUT, "/api/events/:id", "events/{id}"),
    delete("delete_event", "/api/events/:id", "events/{id}"),
    // roles
    get("list_roles", "/api/roles", "roles"),
    get("get_role", "/api/roles/:id", "roles/{id}"),
    write("create_role", Method::POST, "/api/roles", "roles"),
    write("update_role", Method::PUT, "/api/roles/:id", "roles/{id}"),
    delete("delete_role", "/api/roles/:id", "roles/{id}"),
    // users
    get("list_users", "/api/users", "users"),
    get("get_user", "/api/users/:id", "users/{id}"),
    write("create_user", Method::POST, "/api/users", "users"),
    write("update_user", Method::PUT, "/api/users/:id", "users/{id}"),
    delete("delete_user", "/api/users/:id", "users/{id}"),
    // media
    get("list_media", "/api/media", "media"),
    get("get_media", "/api/media/:id", "media/{id}"),
    Operation {
        name: "upload_media",
        method: Method::POST,
        path: "/api/media",
        upstream: "media",
        authenticated: true,
        body: BodyKind::Stream,
    },
    delete("delete_media", "/api/media/:id", "media/{id}"),
];
