//! Projection of tracker state into table rows
//!
//! Nothing here touches the network or the timer. The selected timeframe is a
//! plain parameter; changing it only changes which change/volume figures are
//! read from each asset.

use crate::{
    format::{format_change, format_price, format_volume, resolve_logo, ChangeCell},
    types::{Asset, FetchState, Snapshot, Timeframe, TrackerState},
};
use serde::Serialize;
use std::collections::HashSet;

/// Column titles, in display order
pub const COLUMNS: [&str; 5] = ["Rank", "Name", "Price", "Change (%)", "Volume"];

/// What to show when a refresh fails while older rows are available
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FailurePolicy {
    /// The error replaces the table
    #[default]
    ErrorTakesPrecedence,
    /// Keep the stale rows and report the error alongside them
    KeepStaleRows,
}

/// One displayable table row
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AssetRow {
    pub rank: u32,
    pub symbol: String,
    pub name: String,
    pub logo_url: String,
    pub price: String,
    pub change: ChangeCell,
    pub volume: String,
}

impl AssetRow {
    /// Derives the row for `asset` in `timeframe`
    pub fn project(asset: &Asset, timeframe: Timeframe, logo_failed: bool) -> Self {
        Self {
            rank: asset.rank,
            symbol: asset.symbol.clone(),
            name: asset.name.clone(),
            logo_url: resolve_logo(asset.logo_url.as_deref(), logo_failed).to_string(),
            price: format_price(asset.price),
            change: format_change(asset.change_by_timeframe.get(timeframe)),
            volume: format_volume(asset.volume_by_timeframe.get(timeframe)),
        }
    }
}

/// What the table area should show
#[derive(Debug, Clone, PartialEq)]
pub enum Projection {
    /// Nothing received yet
    Loading,
    /// The latest fetch failed
    Error { message: String },
    /// Ranked rows; `refreshing` is set while a background fetch runs
    Rows {
        rows: Vec<AssetRow>,
        refreshing: bool,
        error: Option<String>,
    },
}

/// Turns a [`TrackerState`] into a [`Projection`]
#[derive(Debug, Clone, Copy, Default)]
pub struct ViewProjector {
    policy: FailurePolicy,
}

impl ViewProjector {
    pub fn new(policy: FailurePolicy) -> Self {
        Self { policy }
    }

    /// Projects `state` for `timeframe`, with every logo assumed loadable
    pub fn project(&self, state: &TrackerState, timeframe: Timeframe) -> Projection {
        self.project_with(state, timeframe, |_| false)
    }

    /// Projects `state` for `timeframe`; `logo_failed` reports logos the
    /// renderer could not load
    pub fn project_with(
        &self,
        state: &TrackerState,
        timeframe: Timeframe,
        logo_failed: impl Fn(&str) -> bool,
    ) -> Projection {
        let rows = |snapshot: &Snapshot| -> Vec<AssetRow> {
            snapshot
                .assets()
                .iter()
                .map(|asset| {
                    let failed = asset.logo_url.as_deref().is_some_and(&logo_failed);
                    AssetRow::project(asset, timeframe, failed)
                })
                .collect()
        };

        match (&state.fetch, &state.last_snapshot) {
            (FetchState::Failure(message), Some(snapshot))
                if self.policy == FailurePolicy::KeepStaleRows =>
            {
                Projection::Rows {
                    rows: rows(snapshot),
                    refreshing: false,
                    error: Some(message.clone()),
                }
            }
            (FetchState::Failure(message), _) => Projection::Error {
                message: message.clone(),
            },
            (FetchState::Success(snapshot), _) => Projection::Rows {
                rows: rows(snapshot),
                refreshing: false,
                error: None,
            },
            (FetchState::Loading | FetchState::Idle, Some(snapshot)) => Projection::Rows {
                rows: rows(snapshot),
                refreshing: state.fetch.is_loading(),
                error: None,
            },
            (FetchState::Loading | FetchState::Idle, None) => Projection::Loading,
        }
    }
}

/// A timeframe tab
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tab {
    pub timeframe: Timeframe,
    pub label: &'static str,
    pub active: bool,
}

/// Presentation-side state of the token table
///
/// Owns the selected timeframe and the set of logos the renderer failed to
/// load; neither ever reaches the tracker.
#[derive(Debug, Clone, Default)]
pub struct TokenTable {
    projector: ViewProjector,
    timeframe: Timeframe,
    failed_logos: HashSet<String>,
}

impl TokenTable {
    pub fn new(policy: FailurePolicy) -> Self {
        Self {
            projector: ViewProjector::new(policy),
            ..Self::default()
        }
    }

    /// Currently selected timeframe
    pub fn timeframe(&self) -> Timeframe {
        self.timeframe
    }

    /// Selects a timeframe; returns true if the selection changed
    pub fn select_timeframe(&mut self, timeframe: Timeframe) -> bool {
        let changed = self.timeframe != timeframe;
        self.timeframe = timeframe;
        changed
    }

    /// Records that the renderer could not load `url`
    pub fn mark_logo_failed(&mut self, url: &str) {
        self.failed_logos.insert(url.to_string());
    }

    /// Tabs in display order with the active one flagged
    pub fn tabs(&self) -> Vec<Tab> {
        Timeframe::all()
            .iter()
            .map(|&timeframe| Tab {
                timeframe,
                label: timeframe.label(),
                active: timeframe == self.timeframe,
            })
            .collect()
    }

    /// Projects `state` with the current selection
    pub fn render(&self, state: &TrackerState) -> Projection {
        self.projector
            .project_with(state, self.timeframe, |url| self.failed_logos.contains(url))
    }
}
