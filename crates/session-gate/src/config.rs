//! Session Gate configuration.
//!
//! Configuration is loaded from environment variables. The backend URL may
//! carry credentials in development setups, so it is redacted in Debug
//! output.

use std::collections::HashMap;
use std::env;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Default server bind address.
pub const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0:3000";

/// Default identity backend API base URL.
pub const DEFAULT_API_BASE_URL: &str = "http://localhost:1411/api";

/// Default timeout for identity backend requests in seconds.
pub const DEFAULT_API_REQUEST_TIMEOUT_SECONDS: u64 = 10;

/// Default name of the cookie carrying the caller's access token.
pub const DEFAULT_ACCESS_TOKEN_COOKIE_NAME: &str = "__Host-access_token";

/// Default release feed (latest published release).
pub const DEFAULT_RELEASE_FEED_URL: &str =
    "https://api.github.com/repos/pocket-id/pocket-id/releases/latest";

/// Default release feed timeout in milliseconds.
pub const DEFAULT_RELEASE_FEED_TIMEOUT_MS: u64 = 2_000;

/// Default version cache TTL in seconds (2 hours).
pub const DEFAULT_VERSION_CACHE_TTL_SECONDS: u64 = 2 * 60 * 60;

/// Session Gate configuration.
#[derive(Clone)]
pub struct Config {
    /// Server bind address (default: "0.0.0.0:3000").
    pub bind_address: String,

    /// Base URL of the identity backend REST API.
    pub api_base_url: String,

    /// Per-request timeout for identity backend calls.
    pub api_request_timeout_seconds: u64,

    /// Request `/application-configuration/all` instead of the public subset.
    pub app_config_show_all: bool,

    /// Name of the cookie that carries the caller's access token.
    pub access_token_cookie_name: String,

    /// URL of the release feed consulted by the version cache.
    pub release_feed_url: String,

    /// Timeout for a single release feed request, in milliseconds.
    pub release_feed_timeout_ms: u64,

    /// How long a fetched newest version is trusted, in seconds.
    pub version_cache_ttl_seconds: u64,

    /// Directory for the file-backed version cache store.
    /// `None` keeps the cache in memory only.
    pub version_cache_dir: Option<PathBuf>,
}

impl Config {
    /// Release feed timeout as a `Duration`.
    pub fn release_feed_timeout(&self) -> Duration {
        Duration::from_millis(self.release_feed_timeout_ms)
    }

    /// Version cache TTL as a `Duration`.
    pub fn version_cache_ttl(&self) -> Duration {
        Duration::from_secs(self.version_cache_ttl_seconds)
    }

    /// Identity backend request timeout as a `Duration`.
    pub fn api_request_timeout(&self) -> Duration {
        Duration::from_secs(self.api_request_timeout_seconds)
    }
}

/// Custom Debug implementation that redacts the backend URL.
impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("bind_address", &self.bind_address)
            .field("api_base_url", &"[REDACTED]")
            .field(
                "api_request_timeout_seconds",
                &self.api_request_timeout_seconds,
            )
            .field("app_config_show_all", &self.app_config_show_all)
            .field("access_token_cookie_name", &self.access_token_cookie_name)
            .field("release_feed_url", &self.release_feed_url)
            .field("release_feed_timeout_ms", &self.release_feed_timeout_ms)
            .field("version_cache_ttl_seconds", &self.version_cache_ttl_seconds)
            .field("version_cache_dir", &self.version_cache_dir)
            .finish()
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid API request timeout configuration: {0}")]
    InvalidApiTimeout(String),

    #[error("Invalid boolean for {0}: {1}")]
    InvalidBool(String, String),

    #[error("Invalid access token cookie name: {0}")]
    InvalidCookieName(String),

    #[error("Invalid release feed timeout configuration: {0}")]
    InvalidReleaseFeedTimeout(String),

    #[error("Invalid version cache TTL configuration: {0}")]
    InvalidVersionCacheTtl(String),
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(&env::vars().collect())
    }

    /// Load configuration from a HashMap (for testing).
    pub fn from_vars(vars: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let bind_address = vars
            .get("BIND_ADDRESS")
            .cloned()
            .unwrap_or_else(|| DEFAULT_BIND_ADDRESS.to_string());

        let api_base_url = vars
            .get("API_BASE_URL")
            .map(|url| url.trim_end_matches('/').to_string())
            .unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string());

        let api_request_timeout_seconds = parse_positive(
            vars,
            "API_REQUEST_TIMEOUT_SECONDS",
            DEFAULT_API_REQUEST_TIMEOUT_SECONDS,
        )
        .map_err(ConfigError::InvalidApiTimeout)?;

        let app_config_show_all = match vars.get("APP_CONFIG_SHOW_ALL") {
            None => false,
            Some(value) => match value.as_str() {
                "true" | "1" => true,
                "false" | "0" => false,
                other => {
                    return Err(ConfigError::InvalidBool(
                        "APP_CONFIG_SHOW_ALL".to_string(),
                        other.to_string(),
                    ))
                }
            },
        };

        let access_token_cookie_name = vars
            .get("ACCESS_TOKEN_COOKIE_NAME")
            .cloned()
            .unwrap_or_else(|| DEFAULT_ACCESS_TOKEN_COOKIE_NAME.to_string());

        if access_token_cookie_name.is_empty()
            || access_token_cookie_name
                .chars()
                .any(|c| c.is_whitespace() || c == '=' || c == ';')
        {
            return Err(ConfigError::InvalidCookieName(format!(
                "ACCESS_TOKEN_COOKIE_NAME must be a non-empty cookie token, got '{}'",
                access_token_cookie_name
            )));
        }

        let release_feed_url = vars
            .get("RELEASE_FEED_URL")
            .cloned()
            .unwrap_or_else(|| DEFAULT_RELEASE_FEED_URL.to_string());

        let release_feed_timeout_ms = parse_positive(
            vars,
            "RELEASE_FEED_TIMEOUT_MS",
            DEFAULT_RELEASE_FEED_TIMEOUT_MS,
        )
        .map_err(ConfigError::InvalidReleaseFeedTimeout)?;

        let version_cache_ttl_seconds = parse_positive(
            vars,
            "VERSION_CACHE_TTL_SECONDS",
            DEFAULT_VERSION_CACHE_TTL_SECONDS,
        )
        .map_err(ConfigError::InvalidVersionCacheTtl)?;

        let version_cache_dir = vars
            .get("VERSION_CACHE_DIR")
            .filter(|dir| !dir.is_empty())
            .map(PathBuf::from);

        Ok(Config {
            bind_address,
            api_base_url,
            api_request_timeout_seconds,
            app_config_show_all,
            access_token_cookie_name,
            release_feed_url,
            release_feed_timeout_ms,
            version_cache_ttl_seconds,
            version_cache_dir,
        })
    }
}

/// Parse an optional positive integer variable, falling back to `default`.
fn parse_positive(
    vars: &HashMap<String, String>,
    name: &str,
    default: u64,
) -> Result<u64, String> {
    let Some(value_str) = vars.get(name) else {
        return Ok(default);
    };

    let value: u64 = value_str.parse().map_err(|e| {
        format!(
            "{} must be a valid positive integer, got '{}': {}",
            name, value_str, e
        )
    })?;

    if value == 0 {
        return Err(format!("{} must be greater than 0", name));
    }

    Ok(value)
}
