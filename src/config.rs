//! Client configuration parsed from environment variables.

use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "http://localhost:3000";
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 5000;
pub const DEFAULT_CONNECT_TIMEOUT_MS: u64 = 2000;
pub const DEFAULT_STATE_FILE: &str = ".admin-console.json";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid base URL: {0}")]
    InvalidBaseUrl(String),
    #[error("invalid value for {var}: {value}")]
    InvalidNumber { var: &'static str, value: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeouts {
    pub request_ms: u64,
    pub connect_ms: u64,
}

impl Timeouts {
    #[must_use]
    pub fn request(self) -> Duration {
        Duration::from_millis(self.request_ms)
    }

    #[must_use]
    pub fn connect(self) -> Duration {
        Duration::from_millis(self.connect_ms)
    }
}

impl Default for Timeouts {
    fn default() -> Self {
        Self { request_ms: DEFAULT_REQUEST_TIMEOUT_MS, connect_ms: DEFAULT_CONNECT_TIMEOUT_MS }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// API root without a trailing slash, e.g. `http://localhost:3000`.
    pub base_url: String,
    pub timeouts: Timeouts,
    /// JSON file holding the persisted token and profile snapshot.
    pub state_file: PathBuf,
}

impl ClientConfig {
    /// Build typed client config from environment variables.
    ///
    /// Optional:
    /// - `ADMIN_API_BASE_URL`: default `http://localhost:3000`
    /// - `ADMIN_REQUEST_TIMEOUT_MS`: default 5000
    /// - `ADMIN_CONNECT_TIMEOUT_MS`: default 2000
    /// - `ADMIN_STATE_FILE`: default `.admin-console.json`
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL is not http(s) or a timeout is not a number.
    pub fn from_env() -> Result<Self, ConfigError> {
        let base_url = std::env::var("ADMIN_API_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_owned());
        let timeouts = Timeouts {
            request_ms: env_parse_u64("ADMIN_REQUEST_TIMEOUT_MS", DEFAULT_REQUEST_TIMEOUT_MS)?,
            connect_ms: env_parse_u64("ADMIN_CONNECT_TIMEOUT_MS", DEFAULT_CONNECT_TIMEOUT_MS)?,
        };
        let state_file = std::env::var("ADMIN_STATE_FILE").unwrap_or_else(|_| DEFAULT_STATE_FILE.to_owned());

        Ok(Self { base_url: normalize_base_url(&base_url)?, timeouts, state_file: PathBuf::from(state_file) })
    }

    /// Config pointing at `base_url` with default timeouts and state file.
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL is not http(s).
    pub fn with_base_url(base_url: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            base_url: normalize_base_url(base_url)?,
            timeouts: Timeouts::default(),
            state_file: PathBuf::from(DEFAULT_STATE_FILE),
        })
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_owned(),
            timeouts: Timeouts::default(),
            state_file: PathBuf::from(DEFAULT_STATE_FILE),
        }
    }
}

pub(crate) fn normalize_base_url(raw: &str) -> Result<String, ConfigError> {
    let trimmed = raw.trim().trim_end_matches('/');
    if !(trimmed.starts_with("http://") || trimmed.starts_with("https://")) {
        return Err(ConfigError::InvalidBaseUrl(raw.to_owned()));
    }
    Ok(trimmed.to_owned())
}

fn env_parse_u64(var: &'static str, default: u64) -> Result<u64, ConfigError> {
    match std::env::var(var) {
        Ok(value) => value
            .trim()
            .parse::<u64>()
            .map_err(|_| ConfigError::InvalidNumber { var, value }),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
