//! Top tokens tracker service
//!
//! Owns the refresh schedule and the fetch state machine. Renderers read the
//! published [`TrackerState`] and project it with [`crate::view`].

use crate::{
    config::TrackerConfig,
    constants::{EVENT_CHANNEL_CAPACITY, MIN_REFRESH_INTERVAL_SECS},
    error::ProviderError,
    metrics::{MetricsCollector, ProviderMetrics},
    provider::RankingProvider,
    providers::HttpRankingProvider,
    store::{ApplyOutcome, TrackerStore},
    types::{Asset, ComponentHealth, FetchState, HealthStatus, TrackerEvent, TrackerState},
};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::sync::{broadcast, watch, OnceCell};
use tokio::task::JoinHandle;
use tokio::time::{sleep, Instant};
use tokio_util::sync::CancellationToken;

static GLOBAL_TRACKER: OnceCell<Arc<TopTokensTracker>> = OnceCell::const_new();

/// Top Tokens Tracker
///
/// Polls the ranking backend on a fixed interval and publishes the result as
/// a [`TrackerState`]. While a refresh is running the previous snapshot stays
/// available ("stale while revalidating").
///
/// # Example
/// ```no_run
/// use top_tokens_tracker::{TopTokensTracker, TokenTable, Projection};
///
/// # async fn example() {
/// let tracker = TopTokensTracker::global().await;
/// let table = TokenTable::default();
///
/// match table.render(&tracker.state()) {
///     Projection::Rows { rows, .. } => println!("{} tokens", rows.len()),
///     Projection::Loading => println!("Loading tokens..."),
///     Projection::Error { message } => eprintln!("Error loading tokens: {}", message),
/// }
/// # }
/// ```
pub struct TopTokensTracker {
    cycle: FetchCycle,
    metrics: Arc<MetricsCollector>,
    refresh_interval: Duration,
    task: Mutex<Option<PollerTask>>,
}

/// Handle of the running schedule
struct PollerTask {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

/// Everything one refresh needs; cloned into the schedule task
#[derive(Clone)]
struct FetchCycle {
    store: Arc<TrackerStore>,
    provider: Arc<dyn RankingProvider>,
    metrics: Arc<MetricsCollector>,
    events: broadcast::Sender<TrackerEvent>,
}

impl FetchCycle {
    /// Runs one refresh
    ///
    /// Returns `None` when `cancel` had already fired and no fetch was issued.
    async fn run(&self, cancel: &CancellationToken) -> Option<ApplyOutcome> {
        let generation = self.store.begin_fetch(cancel)?;
        let start = Instant::now();

        let result = self.provider.fetch_ranking().await;
        let latency = start.elapsed();
        self.metrics
            .record_request(latency, result.as_ref().err().map(ProviderError::kind))
            .await;

        let outcome = self.store.apply(generation, &result);
        self.report(generation, &result, &outcome, latency);

        Some(outcome)
    }

    fn report(
        &self,
        generation: u64,
        result: &Result<Vec<Asset>, ProviderError>,
        outcome: &ApplyOutcome,
        latency: Duration,
    ) {
        let event = match (outcome, result) {
            (ApplyOutcome::Discarded { latest_generation }, _) => {
                tracing::debug!(
                    generation,
                    latest_generation = *latest_generation,
                    "Discarding superseded fetch result"
                );
                TrackerEvent::result_discarded(generation, *latest_generation)
            }
            (ApplyOutcome::Applied, Ok(assets)) => {
                tracing::debug!(
                    generation,
                    count = assets.len(),
                    provider = self.provider.provider_name(),
                    latency_ms = latency.as_millis() as u64,
                    "Applied top tokens snapshot"
                );
                TrackerEvent::snapshot_updated(generation, assets.len())
            }
            (ApplyOutcome::Applied, Err(e)) => {
                tracing::warn!(
                    generation,
                    kind = ?e.kind(),
                    error = %e,
                    "Failed to fetch top tokens"
                );
                TrackerEvent::fetch_failed(generation, e.kind(), e.display_message())
            }
        };

        // No subscribers is fine
        let _ = self.events.send(event);
    }

    /// Immediate refresh, then one refresh per interval until cancelled
    async fn poll(self, cancel: CancellationToken, interval: Duration) {
        tracing::info!(
            refresh_interval_secs = interval.as_secs(),
            provider = self.provider.provider_name(),
            "Starting top tokens polling"
        );

        loop {
            if self.run(&cancel).await.is_none() {
                break;
            }

            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                _ = sleep(interval) => {}
            }
        }

        tracing::info!("Top tokens polling stopped");
    }
}

impl Default for TopTokensTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl TopTokensTracker {
    /// Returns the global singleton instance
    ///
    /// On first call, this creates the tracker with the default configuration
    /// and starts polling. Subsequent calls return the same instance.
    pub async fn global() -> Arc<Self> {
        GLOBAL_TRACKER
            .get_or_init(|| async {
                let tracker = Self::new();
                tracker.start();
                Arc::new(tracker)
            })
            .await
            .clone()
    }

    /// Creates a tracker against the default backend
    ///
    /// Use `global()` in production code, or `from_config()` to point at
    /// another backend.
    pub fn new() -> Self {
        Self::with_provider(Arc::new(HttpRankingProvider::default()))
    }

    /// Creates a tracker for the backend and interval in `config`
    pub fn from_config(config: &TrackerConfig) -> Result<Self, ProviderError> {
        let provider = HttpRankingProvider::new(config)?;
        Ok(Self::with_provider(Arc::new(provider)).with_refresh_interval(config.refresh_interval))
    }

    /// Creates a tracker with a custom provider
    ///
    /// This is primarily for testing with mock providers.
    pub fn with_provider(provider: Arc<dyn RankingProvider>) -> Self {
        let metrics = Arc::new(MetricsCollector::new(provider.provider_name()));
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);

        Self {
            cycle: FetchCycle {
                store: Arc::new(TrackerStore::new()),
                provider,
                metrics: metrics.clone(),
                events,
            },
            metrics,
            refresh_interval: TrackerConfig::default().refresh_interval,
            task: Mutex::new(None),
        }
    }

    /// Overrides the refresh interval; takes effect on the next `start()`
    ///
    /// Intervals shorter than [`MIN_REFRESH_INTERVAL_SECS`] are raised to it.
    pub fn with_refresh_interval(mut self, interval: Duration) -> Self {
        let min = Duration::from_secs(MIN_REFRESH_INTERVAL_SECS);
        if interval < min {
            tracing::warn!(
                requested_ms = interval.as_millis() as u64,
                "Refresh interval too short, using minimum"
            );
        }
        self.refresh_interval = interval.max(min);
        self
    }

    /// Delay between the end of one fetch and the start of the next
    pub fn refresh_interval(&self) -> Duration {
        self.refresh_interval
    }

    fn task(&self) -> MutexGuard<'_, Option<PollerTask>> {
        self.task.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Starts polling: one fetch now, then one per refresh interval
    ///
    /// Must be called from within a tokio runtime. Calling it while already
    /// running does nothing.
    ///
    /// # Returns
    /// True if this call started the schedule
    pub fn start(&self) -> bool {
        let mut task = self.task();
        if task.as_ref().is_some_and(|t| !t.handle.is_finished()) {
            return false;
        }

        let cancel = CancellationToken::new();
        let handle = tokio::spawn(
            self.cycle
                .clone()
                .poll(cancel.clone(), self.refresh_interval),
        );
        *task = Some(PollerTask { cancel, handle });

        true
    }

    /// Stops polling
    ///
    /// A fetch that is still in flight is left to finish, but its result is
    /// discarded: the state does not change after this returns.
    ///
    /// # Returns
    /// True if the schedule was running
    pub fn stop(&self) -> bool {
        let task = self.task().take();
        if let Some(task) = &task {
            task.cancel.cancel();
        }
        self.cycle.store.invalidate();

        if task.is_some() {
            tracing::info!("Stopping top tokens polling");
        }
        task.is_some()
    }

    /// True while the schedule is running
    pub fn is_running(&self) -> bool {
        self.task()
            .as_ref()
            .is_some_and(|t| !t.cancel.is_cancelled() && !t.handle.is_finished())
    }

    /// Forces an immediate refresh outside the schedule
    ///
    /// Follows the same rules as scheduled refreshes: if another refresh is
    /// issued before this one resolves, or polling is stopped meanwhile, this
    /// result is discarded.
    ///
    /// # Returns
    /// True if this refresh's result was applied
    pub async fn refresh_now(&self) -> bool {
        let cancel = self.session_token();
        matches!(self.cycle.run(&cancel).await, Some(ApplyOutcome::Applied))
    }

    /// Token of the running schedule, or a fresh one when stopped
    fn session_token(&self) -> CancellationToken {
        self.task()
            .as_ref()
            .map(|t| t.cancel.clone())
            .unwrap_or_else(CancellationToken::new)
    }

    /// Current fetch state and last snapshot
    pub fn state(&self) -> TrackerState {
        self.cycle.store.current()
    }

    /// Receiver notified on every state change
    pub fn subscribe(&self) -> watch::Receiver<TrackerState> {
        self.cycle.store.subscribe()
    }

    /// Stream of tracker events
    pub fn subscribe_events(&self) -> broadcast::Receiver<TrackerEvent> {
        self.cycle.events.subscribe()
    }

    /// Returns the name of the current provider
    pub fn provider_name(&self) -> &str {
        self.cycle.provider.provider_name()
    }

    /// Gets provider metrics including latency percentiles and failure split
    pub async fn get_provider_metrics(&self) -> ProviderMetrics {
        self.metrics.get_metrics().await
    }

    /// Perform a health check on the tracker
    ///
    /// # Returns
    /// ComponentHealth derived from the current state
    pub async fn health_check(&self) -> ComponentHealth {
        let state = self.state();
        let mut details = std::collections::HashMap::new();

        details.insert(
            "provider_name".to_string(),
            serde_json::json!(self.provider_name()),
        );
        details.insert("running".to_string(), serde_json::json!(self.is_running()));
        details.insert(
            "generation".to_string(),
            serde_json::json!(self.cycle.store.latest_generation()),
        );

        if let Some(snapshot) = &state.last_snapshot {
            details.insert(
                "available_tokens".to_string(),
                serde_json::json!(snapshot.len()),
            );
            details.insert(
                "last_updated".to_string(),
                serde_json::json!(snapshot.received_at().to_rfc3339()),
            );
        }

        let metrics = self.get_provider_metrics().await;
        details.insert(
            "success_rate".to_string(),
            serde_json::json!(metrics.success_rate),
        );

        let status = match (&state.fetch, &state.last_snapshot) {
            (_, None) => HealthStatus::Unhealthy,
            (FetchState::Failure(_), Some(_)) => HealthStatus::Degraded,
            (_, Some(_)) => HealthStatus::Healthy,
        };

        let message = match (&status, state.fetch.error_message()) {
            (HealthStatus::Healthy, _) => "Top tokens tracker is operational".to_string(),
            (_, Some(error)) => format!("Latest fetch failed: {}", error),
            (_, None) => "Top tokens tracker has no data yet".to_string(),
        };

        ComponentHealth {
            name: "top_tokens_tracker".to_string(),
            status,
            message: Some(message),
            details,
            last_checked: chrono::Utc::now(),
        }
    }
}

impl Drop for TopTokensTracker {
    fn drop(&mut self) {
        self.stop();
    }
}
