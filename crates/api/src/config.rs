//! Gateway configuration, read from the environment.
//!
//! | variable                | default                 |
//! |-------------------------|-------------------------|
//! | `UPSTREAM_BASE_URL`     | `http://localhost:4000` |
//! | `BIND_ADDR`             | `0.0.0.0:8080`          |
//! | `SESSION_COOKIE_NAME`   | `dashboard_session`     |
//! | `SESSION_COOKIE_SECURE` | `false`                 |
//! | `SESSION_TTL_SECS`      | `777600` (9 days)       |
//! | `UPSTREAM_TIMEOUT_SECS` | `30`                    |

use std::net::SocketAddr;
use std::time::Duration;

use reqwest::Url;
use thiserror::Error;

pub const DEFAULT_COOKIE_NAME: &str = "dashboard_session";
pub const DEFAULT_SESSION_TTL: Duration = Duration::from_secs(777_600);
pub const DEFAULT_UPSTREAM_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{var} is not a valid URL: {source}")]
    InvalidUrl {
        var: &'static str,
        source: url::ParseError,
    },

    #[error("{var} has an invalid value '{value}'")]
    InvalidValue { var: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub bind_addr: SocketAddr,
    /// Base URL of the upstream API. Always ends with `/` so relative joins keep its path.
    pub upstream_base_url: Url,
    pub upstream_timeout: Duration,
    pub cookie_name: String,
    pub cookie_secure: bool,
    pub session_ttl: Duration,
}

impl GatewayConfig {
    /// Config with defaults for everything except the upstream.
    pub fn new(upstream_base_url: Url) -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
            upstream_base_url: with_trailing_slash(upstream_base_url),
            upstream_timeout: DEFAULT_UPSTREAM_TIMEOUT,
            cookie_name: DEFAULT_COOKIE_NAME.to_string(),
            cookie_secure: false,
            session_ttl: DEFAULT_SESSION_TTL,
        }
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        let base = std::env::var("UPSTREAM_BASE_URL").unwrap_or_else(|_| {
            tracing::warn!("UPSTREAM_BASE_URL not set; using http://localhost:4000");
            "http://localhost:4000".to_string()
        });
        let base = Url::parse(&base).map_err(|source| ConfigError::InvalidUrl {
            var: "UPSTREAM_BASE_URL",
            source,
        })?;

        let mut config = Self::new(base);

        if let Some(addr) = env_parsed::<SocketAddr>("BIND_ADDR")? {
            config.bind_addr = addr;
        }
        if let Ok(name) = std::env::var("SESSION_COOKIE_NAME") {
            config.cookie_name = validate_cookie_name(name)?;
        }
        if let Some(secure) = env_parsed::<bool>("SESSION_COOKIE_SECURE")? {
            config.cookie_secure = secure;
        }
        if let Some(secs) = env_parsed::<u64>("SESSION_TTL_SECS")? {
            config.session_ttl = Duration::from_secs(secs);
        }
        if let Some(secs) = env_parsed::<u64>("UPSTREAM_TIMEOUT_SECS")? {
            config.upstream_timeout = Duration::from_secs(secs);
        }

        Ok(config)
    }
}

fn env_parsed<T: std::str::FromStr>(var: &'static str) -> Result<Option<T>, ConfigError> {
    match std::env::var(var) {
        Ok(value) => value
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|_| ConfigError::InvalidValue { var, value }),
        Err(_) => Ok(None),
    }
}

fn validate_cookie_name(name: String) -> Result<String, ConfigError> {
    let valid = !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'));
    if valid {
        Ok(name)
    } else {
        Err(ConfigError::InvalidValue {
            var: "SESSION_COOKIE_NAME",
            value: name,
        })
    }
}

fn with_trailing_slash(mut url: Url) -> Url {
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url
}
