//! Console-side client for the gateway.
//!
//! The credential cookie is HttpOnly, so it lives in reqwest's cookie store
//! and this code never sees it. What the console does see is the operator
//! profile, which is pushed into the [`SessionContext`].

use std::sync::Arc;

use reqwest::{Method, StatusCode, Url};
use serde::Serialize;
use serde_json::{json, Value};
use thiserror::Error;

use dashgate_auth::UserProfile;
use dashgate_core::ErrorEnvelope;

use crate::session::{Session, SessionContext};

const FALLBACK_FAILURE_MESSAGE: &str = "Request failed";

#[derive(Debug, Error)]
pub enum ConsoleError {
    /// The gateway answered with a failure envelope.
    #[error("gateway error: {0}")]
    Gateway(ErrorEnvelope),

    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("unexpected response body: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("invalid gateway url: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

impl ConsoleError {
    /// HTTP status of a gateway failure, if that's what this is.
    pub fn status(&self) -> Option<u16> {
        match self {
            ConsoleError::Gateway(envelope) => Some(envelope.status),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ConsoleClient {
    http: reqwest::Client,
    base_url: Url,
    session: SessionContext,
}

impl ConsoleClient {
    pub fn new(base_url: &str, session: SessionContext) -> Result<Self, ConsoleError> {
        let mut base_url = Url::parse(base_url)?;
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        let http = reqwest::Client::builder().cookie_store(true).build()?;
        Ok(Self {
            http,
            base_url,
            session,
        })
    }

    pub fn session(&self) -> &SessionContext {
        &self.session
    }

    /// Sign in and populate the session with the returned profile.
    pub async fn login(&self, email: &str, password: &str) -> Result<Arc<Session>, ConsoleError> {
        let body = self
            .send_json(
                Method::POST,
                "/api/auth/login",
                &json!({ "email": email, "password": password }),
            )
            .await?;

        let user = UserProfile::from_payload(&body)?;
        let unknown: Vec<&str> = user.role.unknown_permissions().map(|p| p.as_str()).collect();
        if !unknown.is_empty() {
            tracing::warn!(role = %user.role, ?unknown, "role carries permissions this build does not know");
        }
        Ok(self.session.sign_in(user))
    }

    /// Clear the session, then ask the gateway to revoke the cookie.
    ///
    /// The local session is gone before the request is even sent; a failed
    /// revoke is logged and otherwise ignored.
    pub async fn logout(&self) {
        self.session.sign_out();

        let result = async {
            let url = self.endpoint("/api/auth/logout")?;
            let response = self.http.post(url).send().await?;
            Ok::<_, ConsoleError>(response.status())
        }
        .await;

        match result {
            Ok(status) if status.is_success() => tracing::debug!("gateway revoked session cookie"),
            Ok(status) => tracing::warn!(status = status.as_u16(), "logout rejected by gateway"),
            Err(err) => tracing::warn!(error = %err, "logout request failed"),
        }
    }

    /// Re-fetch the profile. Returns `None` if the operator signed out meanwhile.
    pub async fn refresh_profile(&self) -> Result<Option<Arc<Session>>, ConsoleError> {
        let body = self.get_json("/api/profile").await?;
        let user = UserProfile::from_payload(&body)?;
        Ok(self.session.refresh(user))
    }

    pub async fn get_json(&self, path: &str) -> Result<Value, ConsoleError> {
        let url = self.endpoint(path)?;
        let response = self.http.get(url).send().await?;
        Self::decode(response).await
    }

    pub async fn send_json<B: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        body: &B,
    ) -> Result<Value, ConsoleError> {
        let url = self.endpoint(path)?;
        let response = self.http.request(method, url).json(body).send().await?;
        Self::decode(response).await
    }

    fn endpoint(&self, path: &str) -> Result<Url, ConsoleError> {
        Ok(self.base_url.join(path.trim_start_matches('/'))?)
    }

    async fn decode(response: reqwest::Response) -> Result<Value, ConsoleError> {
        let status = response.status();
        let bytes = response.bytes().await?;

        if status.is_success() {
            if bytes.is_empty() {
                return Ok(Value::Null);
            }
            return Ok(serde_json::from_slice(&bytes)?);
        }

        Err(ConsoleError::Gateway(failure_envelope(status, &bytes)))
    }
}

fn failure_envelope(status: StatusCode, bytes: &[u8]) -> ErrorEnvelope {
    serde_json::from_slice::<ErrorEnvelope>(bytes)
        .unwrap_or_else(|_| ErrorEnvelope::new(status.as_u16(), FALLBACK_FAILURE_MESSAGE))
}
