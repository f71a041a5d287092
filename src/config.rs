//! Tracker configuration
//!
//! Defaults come from [`crate::constants`]. The core never reads the
//! environment on its own; an embedding shell may call
//! [`TrackerConfig::from_env`] to pick up overrides.

use crate::constants::{
    DEFAULT_API_BASE_URL, MIN_REFRESH_INTERVAL_SECS, REFRESH_INTERVAL_SECS, REQUEST_TIMEOUT_SECS,
};
use std::env;
use std::time::Duration;

/// Environment variable overriding the backend base URL
pub const ENV_API_URL: &str = "TOP_TOKENS_API_URL";

/// Environment variable overriding the refresh interval (seconds)
pub const ENV_REFRESH_SECS: &str = "TOP_TOKENS_REFRESH_SECS";

/// Settings for the poller and its HTTP provider
#[derive(Debug, Clone, PartialEq)]
pub struct TrackerConfig {
    /// Base URL of the ranking backend, without trailing slash
    pub api_base_url: String,
    /// Delay between the end of one fetch and the start of the next
    pub refresh_interval: Duration,
    /// Per-request timeout
    pub request_timeout: Duration,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            refresh_interval: Duration::from_secs(REFRESH_INTERVAL_SECS),
            request_timeout: Duration::from_secs(REQUEST_TIMEOUT_SECS),
        }
    }
}

impl TrackerConfig {
    /// Defaults with environment overrides applied
    pub fn from_env() -> Self {
        Self::from_lookup(|name| env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        let api_base_url = lookup(ENV_API_URL)
            .map(|s| s.trim().trim_end_matches('/').to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or(defaults.api_base_url);

        let refresh_interval = lookup(ENV_REFRESH_SECS)
            .and_then(|s| s.trim().parse::<u64>().ok())
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
            .unwrap_or(defaults.refresh_interval);

        Self {
            api_base_url,
            refresh_interval,
            request_timeout: defaults.request_timeout,
        }
    }

    /// Overrides the base URL
    pub fn with_api_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    /// Overrides the refresh interval, raising it to at least
    /// [`MIN_REFRESH_INTERVAL_SECS`]
    pub fn with_refresh_interval(mut self, interval: Duration) -> Self {
        self.refresh_interval = interval.max(Duration::from_secs(MIN_REFRESH_INTERVAL_SECS));
        self
    }
}
