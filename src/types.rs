//! Types for the top tokens tracker

use crate::{constants::MISSING_LABEL, error::FailureKind};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::sync::Arc;
use uuid::Uuid;

/// Time window used to pick which change/volume figure is shown
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Timeframe {
    /// Last 24 hours
    #[default]
    H24,
    /// Last 6 hours
    H6,
    /// Last 5 minutes
    M5,
}

impl Timeframe {
    /// Tab label
    pub fn label(&self) -> &'static str {
        match self {
            Timeframe::H24 => "24H",
            Timeframe::H6 => "6H",
            Timeframe::M5 => "5M",
        }
    }

    /// Get all timeframes, in tab order
    pub fn all() -> &'static [Timeframe] {
        &[Timeframe::H24, Timeframe::H6, Timeframe::M5]
    }
}

/// One optional figure per timeframe
///
/// Entries that are missing, `null` or not a finite number are all treated as
/// absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TimeframeValues {
    #[serde(default, deserialize_with = "lenient_f64")]
    pub h24: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub h6: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub m5: Option<f64>,
}

impl TimeframeValues {
    /// Value for a timeframe
    pub fn get(&self, timeframe: Timeframe) -> Option<f64> {
        match timeframe {
            Timeframe::H24 => self.h24,
            Timeframe::H6 => self.h6,
            Timeframe::M5 => self.m5,
        }
    }
}

fn lenient_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(value.and_then(|v| v.as_f64()).filter(|v| v.is_finite()))
}

/// Text field that falls back to [`MISSING_LABEL`] when missing, `null` or not
/// a string
fn lenient_label<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::String(s)) if !s.trim().is_empty() => s,
        _ => MISSING_LABEL.to_string(),
    })
}

fn missing_label() -> String {
    MISSING_LABEL.to_string()
}

/// One ranked token as returned by the backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Asset {
    /// Position in the ranking (1 = top)
    pub rank: u32,

    /// Ticker symbol
    #[serde(default = "missing_label", deserialize_with = "lenient_label")]
    pub symbol: String,

    /// Display name
    #[serde(default = "missing_label", deserialize_with = "lenient_label")]
    pub name: String,

    /// Logo URL, if the backend has one
    #[serde(rename = "logo", default)]
    pub logo_url: Option<String>,

    /// Price in USD
    #[serde(default)]
    pub price: Option<f64>,

    /// Signed percent change per timeframe
    #[serde(rename = "change", default)]
    pub change_by_timeframe: TimeframeValues,

    /// Traded volume per timeframe
    #[serde(rename = "volume", default)]
    pub volume_by_timeframe: TimeframeValues,
}

/// Result of one successful fetch
///
/// Assets are kept sorted by ascending rank. The sort is stable, so duplicate
/// ranks keep the order the backend sent them in.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Snapshot {
    generation: u64,
    received_at: DateTime<Utc>,
    assets: Vec<Asset>,
}

impl Snapshot {
    /// Create a snapshot from the assets of fetch `generation`
    pub fn new(generation: u64, mut assets: Vec<Asset>) -> Self {
        assets.sort_by_key(|a| a.rank);
        Self {
            generation,
            received_at: Utc::now(),
            assets,
        }
    }

    /// Assets ordered by rank
    pub fn assets(&self) -> &[Asset] {
        &self.assets
    }

    /// Generation of the fetch that produced this snapshot
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// When the snapshot was received
    pub fn received_at(&self) -> DateTime<Utc> {
        self.received_at
    }

    pub fn len(&self) -> usize {
        self.assets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }
}

/// Outcome of the most recent fetch cycle
#[derive(Debug, Clone, Default, PartialEq)]
pub enum FetchState {
    /// Nothing fetched yet
    #[default]
    Idle,
    /// A fetch is in flight
    Loading,
    /// The latest fetch succeeded
    Success(Arc<Snapshot>),
    /// The latest fetch failed with this message
    Failure(String),
}

impl FetchState {
    pub fn is_loading(&self) -> bool {
        matches!(self, FetchState::Loading)
    }

    /// Failure message, if the latest fetch failed
    pub fn error_message(&self) -> Option<&str> {
        match self {
            FetchState::Failure(message) => Some(message),
            _ => None,
        }
    }
}

/// Everything the poller publishes to renderers
///
/// `last_snapshot` survives `Loading` and `Failure` so a background refresh
/// can keep showing the previous ranking.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrackerState {
    pub fetch: FetchState,
    pub last_snapshot: Option<Arc<Snapshot>>,
}

/// Tracker events for observers (logging sinks, UIs)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TrackerEvent {
    /// A fetch succeeded and its snapshot was applied
    SnapshotUpdated {
        id: Uuid,
        generation: u64,
        asset_count: usize,
        timestamp: DateTime<Utc>,
    },

    /// A fetch failed and the failure was applied
    FetchFailed {
        id: Uuid,
        generation: u64,
        kind: FailureKind,
        error_message: String,
        timestamp: DateTime<Utc>,
    },

    /// A fetch resolved after being superseded or cancelled
    ResultDiscarded {
        id: Uuid,
        generation: u64,
        latest_generation: u64,
        timestamp: DateTime<Utc>,
    },
}

impl TrackerEvent {
    pub fn snapshot_updated(generation: u64, asset_count: usize) -> Self {
        TrackerEvent::SnapshotUpdated {
            id: Uuid::new_v4(),
            generation,
            asset_count,
            timestamp: Utc::now(),
        }
    }

    pub fn fetch_failed(generation: u64, kind: FailureKind, error_message: String) -> Self {
        TrackerEvent::FetchFailed {
            id: Uuid::new_v4(),
            generation,
            kind,
            error_message,
            timestamp: Utc::now(),
        }
    }

    pub fn result_discarded(generation: u64, latest_generation: u64) -> Self {
        TrackerEvent::ResultDiscarded {
            id: Uuid::new_v4(),
            generation,
            latest_generation,
            timestamp: Utc::now(),
        }
    }

    /// Get the event ID
    pub fn id(&self) -> Uuid {
        match self {
            TrackerEvent::SnapshotUpdated { id, .. } => *id,
            TrackerEvent::FetchFailed { id, .. } => *id,
            TrackerEvent::ResultDiscarded { id, .. } => *id,
        }
    }

    /// Get the event type as string
    pub fn event_type(&self) -> &'static str {
        match self {
            TrackerEvent::SnapshotUpdated { .. } => "SNAPSHOT_UPDATED",
            TrackerEvent::FetchFailed { .. } => "FETCH_FAILED",
            TrackerEvent::ResultDiscarded { .. } => "RESULT_DISCARDED",
        }
    }
}

impl std::fmt::Display for TrackerEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TrackerEvent::SnapshotUpdated {
                generation,
                asset_count,
                ..
            } => write!(f, "Snapshot #{} applied ({} tokens)", generation, asset_count),
            TrackerEvent::FetchFailed {
                generation,
                kind,
                error_message,
                ..
            } => write!(
                f,
                "Fetch #{} failed ({:?}): {}",
                generation, kind, error_message
            ),
            TrackerEvent::ResultDiscarded {
                generation,
                latest_generation,
                ..
            } => write!(
                f,
                "Result of fetch #{} discarded (latest is #{})",
                generation, latest_generation
            ),
        }
    }
}

/// Body of the backend health endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackendHealth {
    #[serde(default)]
    pub status: Option<String>,
    pub message: String,
}

/// Overall tracker health status
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum HealthStatus {
    /// Latest fetch succeeded
    Healthy,
    /// Rows are available but the latest fetch failed
    Degraded,
    /// Nothing to show
    Unhealthy,
}

/// Component health information
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentHealth {
    /// Component name
    pub name: String,
    /// Component status
    pub status: HealthStatus,
    /// Optional status message
    pub message: Option<String>,
    /// Component-specific details
    pub details: std::collections::HashMap<String, serde_json::Value>,
    /// Last checked timestamp
    pub last_checked: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn asset(rank: u32, symbol: &str) -> Asset {
        Asset {
            rank,
            symbol: symbol.to_string(),
            name: symbol.to_string(),
            logo_url: None,
            price: None,
            change_by_timeframe: TimeframeValues::default(),
            volume_by_timeframe: TimeframeValues::default(),
        }
    }

    #[test]
    fn test_asset_from_backend_json() {
        let json = r#"{
            "rank": 3,
            "name": "Pepe",
            "symbol": "PEPE",
            "logo": null,
            "price": 0.0000123,
            "change": {"h24": 4.27, "h6": null, "m5": -0.01},
            "volume": {"h24": 1500000, "h6": "n/a"}
        }"#;

        let asset: Asset = serde_json::from_str(json).unwrap();
        assert_eq!(asset.rank, 3);
        assert_eq!(asset.logo_url, None);
        assert_eq!(asset.price, Some(0.0000123));
        assert_eq!(asset.change_by_timeframe.get(Timeframe::H24), Some(4.27));
        assert_eq!(asset.change_by_timeframe.get(Timeframe::H6), None);
        assert_eq!(asset.change_by_timeframe.get(Timeframe::M5), Some(-0.01));
        assert_eq!(asset.volume_by_timeframe.get(Timeframe::H24), Some(1_500_000.0));
        // non-numeric and missing entries are absent
        assert_eq!(asset.volume_by_timeframe.get(Timeframe::H6), None);
        assert_eq!(asset.volume_by_timeframe.get(Timeframe::M5), None);
    }

    #[test]
    fn test_missing_change_and_volume_objects() {
        let asset: Asset =
            serde_json::from_str(r#"{"rank": 1, "name": "N/A", "symbol": "N/A"}"#).unwrap();
        assert_eq!(asset.change_by_timeframe, TimeframeValues::default());
        assert_eq!(asset.volume_by_timeframe, TimeframeValues::default());
        assert_eq!(asset.price, None);
    }

    #[test]
    fn test_null_name_and_symbol_fall_back_to_label() {
        let asset: Asset =
            serde_json::from_str(r#"{"rank": 2, "name": null, "symbol": 42, "price": 1.0}"#)
                .unwrap();
        assert_eq!(asset.name, "N/A");
        assert_eq!(asset.symbol, "N/A");
        assert_eq!(asset.price, Some(1.0));

        let asset: Asset = serde_json::from_str(r#"{"rank": 5}"#).unwrap();
        assert_eq!(asset.name, "N/A");
        assert_eq!(asset.symbol, "N/A");
    }

    #[test]
    fn test_snapshot_sorts_by_rank() {
        let snapshot = Snapshot::new(
            7,
            vec![asset(3, "C"), asset(1, "A"), asset(2, "B1"), asset(2, "B2")],
        );
        let order: Vec<_> = snapshot.assets().iter().map(|a| a.symbol.as_str()).collect();
        assert_eq!(order, ["A", "B1", "B2", "C"]);
        assert_eq!(snapshot.generation(), 7);
        assert_eq!(snapshot.len(), 4);
    }

    #[test]
    fn test_timeframe_keys_and_labels() {
        assert_eq!(Timeframe::default(), Timeframe::H24);
        let labels: Vec<_> = Timeframe::all().iter().map(|t| t.label()).collect();
        assert_eq!(labels, ["24H", "6H", "5M"]);
        assert_eq!(serde_json::to_string(&Timeframe::H6).unwrap(), "\"h6\"");
    }

    #[test]
    fn test_event_serialization_tag() {
        let event = TrackerEvent::fetch_failed(4, FailureKind::Response, "rate limited".into());
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "FETCH_FAILED");
        assert_eq!(json["kind"], "response");
        assert_eq!(event.event_type(), "FETCH_FAILED");
        assert_eq!(event.to_string(), "Fetch #4 failed (Response): rate limited");
    }
}
