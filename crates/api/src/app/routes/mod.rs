use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use axum::{
    extract::{Extension, Path, RawQuery, Request},
    http::Method,
    routing::{any, get, on, post, MethodFilter, MethodRouter},
    Router,
};

use crate::app::GatewayState;
use crate::context::RequestContext;
use crate::operations::{Operation, OPERATIONS};
use crate::proxy;

pub mod auth;
pub mod download;
pub mod rbac;
pub mod system;

/// Router for every browser-facing endpoint except `/health`.
pub fn router() -> Router {
    let mut by_path: BTreeMap<&'static str, MethodRouter> = BTreeMap::new();
    for op in OPERATIONS {
        let routes = match by_path.remove(op.path) {
            Some(existing) => existing.merge(proxied(op)),
            None => proxied(op),
        };
        by_path.insert(op.path, routes);
    }

    by_path
        .into_iter()
        .fold(Router::new(), |router, (path, routes)| router.route(path, routes))
        .route("/api/auth/login", post(auth::login))
        .route("/api/auth/logout", any(auth::logout))
        .route("/api/download", get(download::download))
        .nest("/api/rbac", rbac::router())
}

/// Generic handler for one catalogue entry, bound to its method.
fn proxied(op: &'static Operation) -> MethodRouter {
    let handler = move |Extension(state): Extension<Arc<GatewayState>>,
                        Extension(ctx): Extension<RequestContext>,
                        params: Option<Path<HashMap<String, String>>>,
                        RawQuery(query): RawQuery,
                        request: Request| async move {
        let params = params.map(|Path(p)| p).unwrap_or_default();
        proxy::forward(op, &state, &ctx, &params, query.as_deref(), request).await
    };
    on(method_filter(&op.method), handler)
}

fn method_filter(method: &Method) -> MethodFilter {
    if method == Method::GET {
        MethodFilter::GET
    } else if method == Method::PUT {
        MethodFilter::PUT
    } else if method == Method::PATCH {
        MethodFilter::PATCH
    } else if method == Method::DELETE {
        MethodFilter::DELETE
    } else {
        MethodFilter::POST
    }
}
