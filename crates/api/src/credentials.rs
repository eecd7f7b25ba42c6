//! Credential store: the session token lives in an HttpOnly cookie.
//!
//! Operations never fail observably. A missing or unreadable cookie is simply
//! "no credential"; the upstream decides what that means.

use std::time::Duration;

use axum::http::{header, HeaderMap, HeaderValue};
use thiserror::Error;

/// Opaque bearer token issued by the upstream on login.
///
/// Deliberately has no `Display` impl and a redacted `Debug` so it cannot end
/// up in logs by accident.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Debug for Credential {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str("Credential(<redacted>)")
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CredentialError {
    #[error("credential is not a valid cookie value")]
    InvalidToken,
}

#[derive(Debug, Clone)]
pub struct CredentialStore {
    cookie_name: String,
    secure: bool,
}

impl CredentialStore {
    pub fn new(cookie_name: impl Into<String>, secure: bool) -> Self {
        Self {
            cookie_name: cookie_name.into(),
            secure,
        }
    }

    /// `Set-Cookie` value storing `credential` for `ttl`.
    ///
    /// Tokens come from upstream. One that is not a plain cookie value is
    /// refused instead of being spliced into the header, where a `;` would
    /// start a new attribute.
    pub fn issue(&self, credential: &Credential, ttl: Duration) -> Result<HeaderValue, CredentialError> {
        let token = credential.expose();
        if !token.bytes().all(is_cookie_octet) {
            return Err(CredentialError::InvalidToken);
        }
        self.cookie(token, &ttl.as_secs().to_string())
            .ok_or(CredentialError::InvalidToken)
    }

    /// `Set-Cookie` value that expires the credential immediately.
    ///
    /// Idempotent: the value only depends on configuration.
    pub fn revoke(&self) -> HeaderValue {
        self.cookie("", "-1").unwrap_or_else(|| {
            tracing::error!("session cookie name is not a valid header value");
            HeaderValue::from_static("invalid=; Max-Age=-1")
        })
    }

    /// Read the credential from the inbound `Cookie` header(s).
    pub fn read(&self, headers: &HeaderMap) -> Option<Credential> {
        headers
            .get_all(header::COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .flat_map(|raw| raw.split(';'))
            .filter_map(|pair| pair.trim().split_once('='))
            .filter(|(name, _)| name.trim() == self.cookie_name)
            .map(|(_, value)| value.trim().trim_matches('"'))
            .find(|value| !value.is_empty())
            .map(Credential::new)
    }

    fn cookie(&self, value: &str, max_age: &str) -> Option<HeaderValue> {
        let secure = if self.secure { "; Secure" } else { "" };
        let cookie = format!(
            "{}={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}{}",
            self.cookie_name, value, max_age, secure
        );
        HeaderValue::from_str(&cookie).ok()
    }
}

/// RFC 6265 `cookie-octet`: visible ASCII minus `"`, `,`, `;` and `\`.
fn is_cookie_octet(b: u8) -> bool {
    matches!(b, 0x21 | 0x23..=0x2B | 0x2D..=0x3A | 0x3C..=0x5B | 0x5D..=0x7E)
}
