//! HTTP client for the upstream API.
//!
//! A completed HTTP exchange is always `Ok`, whatever its status. Only a
//! transport failure (nothing came back) is an `Err`; classifying 4xx/5xx is
//! the proxy's job.

use axum::body::Body;
use axum::http::{HeaderValue, Method, StatusCode};
use bytes::Bytes;
use reqwest::Url;
use serde_json::Value;
use thiserror::Error;

use crate::config::GatewayConfig;
use crate::credentials::Credential;

#[derive(Debug, Error)]
pub enum UpstreamError {
    /// No response was received (connect/DNS failure, timeout, broken body).
    #[error("upstream transport failure: {0}")]
    Transport(#[source] reqwest::Error),

    /// The request could not be built (bad path or URL).
    #[error("invalid upstream url: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

/// Outbound request body.
pub enum UpstreamBody {
    Empty,
    /// Already-serialized JSON, forwarded byte for byte.
    Json(Bytes),
    /// Raw inbound body streamed through untouched.
    Stream {
        body: Body,
        content_type: Option<HeaderValue>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct UpstreamResponse {
    pub status: StatusCode,
    pub data: Value,
}

#[derive(Debug, Clone)]
pub struct UpstreamClient {
    http: reqwest::Client,
    /// Download client. No total deadline: a large file may take longer
    /// than any API call, so only connecting and each read are bounded.
    files: reqwest::Client,
    base_url: Url,
}

impl UpstreamClient {
    pub fn new(config: &GatewayConfig) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder()
            .timeout(config.upstream_timeout)
            .build()?;
        let files = reqwest::Client::builder()
            .connect_timeout(config.upstream_timeout)
            .read_timeout(config.upstream_timeout)
            .build()?;
        Ok(Self {
            http,
            files,
            base_url: config.upstream_base_url.clone(),
        })
    }

    /// Issue a call relative to the upstream base URL.
    ///
    /// `path` is relative (no leading `/`), `query` is forwarded verbatim.
    pub async fn call(
        &self,
        method: Method,
        path: &str,
        query: Option<&str>,
        body: UpstreamBody,
        credential: Option<&Credential>,
    ) -> Result<UpstreamResponse, UpstreamError> {
        let mut url = self.base_url.join(path.trim_start_matches('/'))?;
        url.set_query(query.filter(|q| !q.is_empty()));

        let mut request = self
            .http
            .request(method.clone(), url)
            .header(reqwest::header::ACCEPT, "application/json");

        if let Some(credential) = credential {
            request = request.bearer_auth(credential.expose());
        }

        request = match body {
            UpstreamBody::Empty => request,
            UpstreamBody::Json(bytes) => request
                .header(reqwest::header::CONTENT_TYPE, "application/json")
                .body(bytes),
            UpstreamBody::Stream { body, content_type } => {
                if let Some(content_type) = content_type {
                    request = request.header(reqwest::header::CONTENT_TYPE, content_type);
                }
                request.body(reqwest::Body::wrap_stream(body.into_data_stream()))
            }
        };

        let response = request.send().await.map_err(UpstreamError::Transport)?;
        let status = response.status();
        let bytes = response.bytes().await.map_err(UpstreamError::Transport)?;

        tracing::debug!(%method, path, status = status.as_u16(), "upstream responded");

        Ok(UpstreamResponse {
            status,
            data: decode_body(&bytes),
        })
    }

    /// Unauthenticated GET of an absolute URL, used for file downloads.
    pub async fn fetch(&self, url: Url) -> Result<reqwest::Response, UpstreamError> {
        self.files
            .get(url)
            .send()
            .await
            .map_err(UpstreamError::Transport)
    }
}

/// JSON when it parses, a JSON string when it does not, `null` when empty.
fn decode_body(bytes: &[u8]) -> Value {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Value::Null;
    }
    serde_json::from_slice(bytes)
        .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(bytes).into_owned()))
}
