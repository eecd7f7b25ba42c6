//! GET /api/download?url=...: fetch a file server-side and stream it back as an attachment.

use std::sync::Arc;

use axum::{
    body::Body,
    extract::{Extension, Query},
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use reqwest::Url;
use serde::Deserialize;

use crate::app::{errors, GatewayState};

pub const MISSING_URL_MESSAGE: &str = "URL is required";
pub const DOWNLOAD_FAILED_MESSAGE: &str = "Failed to download file";

const DEFAULT_FILENAME: &str = "download";

#[derive(Debug, Deserialize)]
pub struct DownloadQuery {
    pub url: Option<String>,
}

pub async fn download(
    Extension(state): Extension<Arc<GatewayState>>,
    query: Option<Query<DownloadQuery>>,
) -> Response {
    let Some(raw) = query
        .and_then(|Query(q)| q.url)
        .map(|u| u.trim().to_string())
        .filter(|u| !u.is_empty())
    else {
        return errors::json_error(StatusCode::BAD_REQUEST, MISSING_URL_MESSAGE);
    };

    let url = match Url::parse(&raw) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => url,
        _ => {
            tracing::info!("download rejected: unsupported url");
            return errors::json_error(StatusCode::INTERNAL_SERVER_ERROR, DOWNLOAD_FAILED_MESSAGE);
        }
    };

    let filename = attachment_filename(&url);

    let upstream = match state.upstream.fetch(url).await {
        Ok(response) if response.status().is_success() => response,
        Ok(response) => {
            tracing::warn!(status = response.status().as_u16(), "download source returned an error");
            return errors::json_error(StatusCode::INTERNAL_SERVER_ERROR, DOWNLOAD_FAILED_MESSAGE);
        }
        Err(err) => {
            tracing::warn!(error = %err, "download fetch failed");
            return errors::json_error(StatusCode::INTERNAL_SERVER_ERROR, DOWNLOAD_FAILED_MESSAGE);
        }
    };

    let content_type = upstream
        .headers()
        .get(header::CONTENT_TYPE)
        .cloned()
        .unwrap_or_else(|| HeaderValue::from_static("application/octet-stream"));
    let content_length = upstream.headers().get(header::CONTENT_LENGTH).cloned();

    let disposition = HeaderValue::from_str(&format!("attachment; filename=\"{filename}\""))
        .unwrap_or_else(|_| HeaderValue::from_static("attachment; filename=\"download\""));

    let mut response = (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, content_type),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        Body::from_stream(upstream.bytes_stream()),
    )
        .into_response();

    if let Some(length) = content_length {
        response.headers_mut().insert(header::CONTENT_LENGTH, length);
    }
    response
}

/// Last non-empty path segment of the URL, made safe for a quoted header value.
pub fn attachment_filename(url: &Url) -> String {
    let segment = url
        .path_segments()
        .and_then(|segments| segments.filter(|s| !s.is_empty()).last())
        .unwrap_or(DEFAULT_FILENAME);

    let cleaned: String = segment
        .chars()
        .map(|c| if c.is_ascii_graphic() && c != '"' && c != '\\' { c } else { '_' })
        .collect();

    if cleaned.is_empty() {
        DEFAULT_FILENAME.to_string()
    } else {
        cleaned
    }
}
