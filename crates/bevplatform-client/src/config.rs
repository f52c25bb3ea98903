//! Client configuration.

use std::time::Duration;

use crate::ApiError;

pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";

/// Access tokens live for five minutes; refresh with half a minute to spare.
pub const DEFAULT_TOKEN_REFRESH: Duration = Duration::from_secs(270);

pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Server root without trailing slash, e.g. `https://bev.example.dk`.
    pub base_url: String,
    pub token_refresh_interval: Duration,
    pub request_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL)
    }
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url: String = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            token_refresh_interval: DEFAULT_TOKEN_REFRESH,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    pub fn with_token_refresh_interval(mut self, interval: Duration) -> Self {
        self.token_refresh_interval = interval;
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Read `BEV_API_URL` and `BEV_TOKEN_REFRESH_SECS`, falling back to defaults.
    pub fn from_env() -> Result<Self, ApiError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ApiError> {
        let mut config = Self::new(lookup("BEV_API_URL").unwrap_or_else(|| DEFAULT_BASE_URL.into()));
        if let Some(raw) = lookup("BEV_TOKEN_REFRESH_SECS") {
            let secs: u64 = raw
                .trim()
                .parse()
                .map_err(|_| ApiError::Config(format!("BEV_TOKEN_REFRESH_SECS={raw:?}")))?;
            if secs == 0 {
                return Err(ApiError::Config("BEV_TOKEN_REFRESH_SECS must be positive".into()));
            }
            config.token_refresh_interval = Duration::from_secs(secs);
        }
        Ok(config)
    }

    /// Absolute URL for an API path such as `cases/12/`.
    pub fn api_url(&self, path: &str) -> String {
        format!("{}/api/{}", self.base_url, path.trim_start_matches('/'))
    }
}
