//! HTTP application wiring (Axum router + shared state).
//!
//! - `routes/`: inbound routes (generic proxy, auth, download, system)
//! - `errors.rs`: the single failure → response mapping

use std::sync::Arc;

use axum::{routing::get, Extension, Router};
use tower::ServiceBuilder;

use crate::config::GatewayConfig;
use crate::credentials::CredentialStore;
use crate::middleware;
use crate::upstream::UpstreamClient;

pub mod errors;
pub mod routes;

/// Immutable state shared by all handlers.
#[derive(Debug)]
pub struct GatewayState {
    pub config: GatewayConfig,
    pub credentials: Arc<CredentialStore>,
    pub upstream: UpstreamClient,
}

impl GatewayState {
    pub fn new(config: GatewayConfig) -> Result<Self, reqwest::Error> {
        let credentials = Arc::new(CredentialStore::new(
            config.cookie_name.clone(),
            config.cookie_secure,
        ));
        let upstream = UpstreamClient::new(&config)?;
        Ok(Self {
            config,
            credentials,
            upstream,
        })
    }
}

/// Build the full HTTP router (public entrypoint used by `main.rs`).
pub fn build_app(config: GatewayConfig) -> Result<Router, reqwest::Error> {
    let state = Arc::new(GatewayState::new(config)?);
    let request_state = middleware::RequestState {
        credentials: state.credentials.clone(),
    };

    let proxied = routes::router().layer(
        ServiceBuilder::new()
            .layer(axum::middleware::from_fn_with_state(
                request_state,
                middleware::request_context,
            ))
            .layer(Extension(state)),
    );

    Ok(Router::new()
        .route("/health", get(routes::system::health))
        .merge(proxied))
}
