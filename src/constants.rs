//! Constants for the Top Tokens Tracker
//!
//! All configuration for the tracker is centralized here.
//! No runtime configuration file is used - the poller operates with these
//! compile-time constants unless the embedding shell overrides them through
//! [`TrackerConfig`](crate::config::TrackerConfig).

/// How often to refresh the ranking (in seconds)
pub const REFRESH_INTERVAL_SECS: u64 = 40;

/// HTTP request timeout when fetching the ranking (in seconds)
pub const REQUEST_TIMEOUT_SECS: u64 = 10;

/// Base URL of the ranking backend
pub const DEFAULT_API_BASE_URL: &str = "http://127.0.0.1:5000";

/// Endpoint returning the ranked token list
pub const TOP_TOKENS_ENDPOINT: &str = "/api/top-rated-tokens";

/// Endpoint returning the backend health message
pub const HEALTH_ENDPOINT: &str = "/api/health";

/// User agent for HTTP requests
pub const USER_AGENT: &str = "top-tokens-tracker/0.1.0";

/// Capacity of the tracker event broadcast channel
pub const EVENT_CHANNEL_CAPACITY: usize = 64;

/// Icon shown when a token has no logo or its logo failed to load
pub const FALLBACK_LOGO_URL: &str = "https://via.placeholder.com/20?text=?";

/// Name or symbol shown when the backend sends none
pub const MISSING_LABEL: &str = "N/A";

/// Shortest refresh interval the tracker accepts
pub const MIN_REFRESH_INTERVAL_SECS: u64 = 1;

/// Placeholder for any absent value in the table
pub const PLACEHOLDER: &str = "-";

/// Smallest price rendered with digits
pub const MIN_DISPLAY_PRICE: f64 = 0.000_001;

/// Marker for prices below [`MIN_DISPLAY_PRICE`]
pub const BELOW_MIN_PRICE_MARKER: &str = "$<0.000001";

/// Currency prefix for prices
pub const CURRENCY_PREFIX: &str = "$";

/// Fractional digits bounds for prices
pub const PRICE_MIN_FRACTION_DIGITS: usize = 2;
pub const PRICE_MAX_FRACTION_DIGITS: usize = 8;
