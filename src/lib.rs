//! # Top Tokens Tracker
//!
//! Keeps an auto-refreshed ranking of the top traded tokens from the dashboard
//! backend and turns it into table rows for any of the 24H / 6H / 5M views.
//!
//! Switching the timeframe never triggers a fetch: every snapshot carries the
//! change and volume figures for all three windows, and the view only picks
//! which one to format.
//!
//! ## Usage
//!
//! ```no_run
//! use top_tokens_tracker::{Projection, Timeframe, TokenTable, TopTokensTracker};
//!
//! # async fn example() {
//! // Starts polling on first access (immediate fetch, then every 40s)
//! let tracker = TopTokensTracker::global().await;
//! let mut table = TokenTable::default();
//! table.select_timeframe(Timeframe::H6);
//!
//! let mut updates = tracker.subscribe();
//! while updates.changed().await.is_ok() {
//!     let state = updates.borrow_and_update().clone();
//!     if let Projection::Rows { rows, refreshing, .. } = table.render(&state) {
//!         for row in rows {
//!             println!("{} {} {} {}", row.rank, row.symbol, row.price, row.change.text);
//!         }
//!         if refreshing {
//!             println!("Updating...");
//!         }
//!     }
//! }
//! # }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! TopTokensTracker (start / stop / refresh_now)
//!     ↓
//! Schedule task (fetch now, then every 40s)
//!     ↓
//! RankingProvider (HTTP backend)
//!     ↓
//! TrackerStore (generation-guarded, watch channel)
//!     ↓
//! ViewProjector / TokenTable (pure row derivation)
//! ```
//!
//! ## Error Handling
//!
//! Fetch failures never escape the tracker. They become
//! `FetchState::Failure(message)`, where the message is the backend's `error`
//! field, `HTTP error <status>`, or the transport error text. The next
//! scheduled tick tries again.

pub mod config;
pub mod constants;
pub mod error;
pub mod format;
pub mod metrics;
pub mod provider;
pub mod providers;
pub mod store;
pub mod tracker;
pub mod types;
pub mod view;

// Re-export commonly used types
pub use config::TrackerConfig;
pub use error::{FailureKind, ProviderError};
pub use format::{ChangeCell, ChangeTone};
pub use metrics::ProviderMetrics;
pub use provider::RankingProvider;
pub use providers::HttpRankingProvider;
pub use tracker::TopTokensTracker;
pub use types::{
    Asset, BackendHealth, ComponentHealth, FetchState, HealthStatus, Snapshot, Timeframe,
    TimeframeValues, TrackerEvent, TrackerState,
};
pub use view::{AssetRow, FailurePolicy, Projection, TokenTable, ViewProjector};
