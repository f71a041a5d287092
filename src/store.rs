//! In-memory fetch state with generation guarding and watch-based updates

use crate::{
    error::ProviderError,
    types::{Asset, FetchState, Snapshot, TrackerState},
};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

/// What happened to a fetch result handed to [`TrackerStore::apply`]
#[derive(Debug, Clone, PartialEq)]
pub enum ApplyOutcome {
    /// The result became the new state
    Applied,
    /// A newer fetch was issued (or polling stopped) before this one resolved
    Discarded { latest_generation: u64 },
}

/// Owner of the published [`TrackerState`]
///
/// Every fetch is tagged with a generation when it starts. Only the result of
/// the latest issued generation may change the state, so late responses never
/// overwrite newer data and results arriving after `invalidate` are dropped.
///
/// All mutations happen while holding the `issued` lock, which makes the
/// generation check and the state write one step.
pub struct TrackerStore {
    issued: Mutex<u64>,
    state: watch::Sender<TrackerState>,
}

impl TrackerStore {
    /// Creates a store in the `Idle` state
    pub fn new() -> Self {
        let (state, _) = watch::channel(TrackerState::default());
        Self {
            issued: Mutex::new(0),
            state,
        }
    }

    fn issued(&self) -> MutexGuard<'_, u64> {
        // The counter stays consistent even if a holder panicked.
        self.issued.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Issues a new generation and moves the state to `Loading`
    ///
    /// The last snapshot is kept. Returns `None` without touching the state
    /// when `cancel` has already fired.
    pub fn begin_fetch(&self, cancel: &CancellationToken) -> Option<u64> {
        let mut issued = self.issued();
        if cancel.is_cancelled() {
            return None;
        }

        *issued += 1;
        let generation = *issued;
        self.state.send_modify(|state| state.fetch = FetchState::Loading);

        Some(generation)
    }

    /// Applies the result of fetch `generation` if it is still the latest
    pub fn apply(
        &self,
        generation: u64,
        result: &Result<Vec<Asset>, ProviderError>,
    ) -> ApplyOutcome {
        let issued = self.issued();
        if generation != *issued {
            return ApplyOutcome::Discarded {
                latest_generation: *issued,
            };
        }

        self.state.send_modify(|state| match result {
            Ok(assets) => {
                let snapshot = Arc::new(Snapshot::new(generation, assets.clone()));
                state.fetch = FetchState::Success(snapshot.clone());
                state.last_snapshot = Some(snapshot);
            }
            Err(e) => {
                state.fetch = FetchState::Failure(e.display_message());
            }
        });

        ApplyOutcome::Applied
    }

    /// Makes every outstanding generation stale without changing the state
    pub fn invalidate(&self) {
        *self.issued() += 1;
    }

    /// Latest issued generation
    pub fn latest_generation(&self) -> u64 {
        *self.issued()
    }

    /// Current state
    pub fn current(&self) -> TrackerState {
        self.state.borrow().clone()
    }

    /// Receiver notified on every state change
    pub fn subscribe(&self) -> watch::Receiver<TrackerState> {
        self.state.subscribe()
    }
}

impl Default for TrackerStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::mock::token;

    fn ok(symbols: &[&str]) -> Result<Vec<Asset>, ProviderError> {
        Ok(symbols
            .iter()
            .enumerate()
            .map(|(i, s)| token(i as u32 + 1, s, Some(1.0)))
            .collect())
    }

    #[test]
    fn test_success_keeps_snapshot_through_next_loading() {
        let store = TrackerStore::new();
        let cancel = CancellationToken::new();

        let g1 = store.begin_fetch(&cancel).unwrap();
        assert_eq!(store.current().fetch, FetchState::Loading);
        assert_eq!(store.apply(g1, &ok(&["A", "B"])), ApplyOutcome::Applied);

        let g2 = store.begin_fetch(&cancel).unwrap();
        let state = store.current();
        assert_eq!(state.fetch, FetchState::Loading);
        assert_eq!(state.last_snapshot.as_ref().unwrap().generation(), g1);
        assert_eq!(g2, g1 + 1);
    }

    #[test]
    fn test_failure_keeps_last_snapshot_in_memory() {
        let store = TrackerStore::new();
        let cancel = CancellationToken::new();

        let g1 = store.begin_fetch(&cancel).unwrap();
        store.apply(g1, &ok(&["A"]));
        let g2 = store.begin_fetch(&cancel).unwrap();
        store.apply(g2, &Err(ProviderError::response(500, "rate limited")));

        let state = store.current();
        assert_eq!(state.fetch, FetchState::Failure("rate limited".into()));
        assert_eq!(state.last_snapshot.unwrap().len(), 1);
    }

    #[test]
    fn test_latest_issued_wins_regardless_of_arrival() {
        let store = TrackerStore::new();
        let cancel = CancellationToken::new();

        let older = store.begin_fetch(&cancel).unwrap();
        let newer = store.begin_fetch(&cancel).unwrap();

        assert_eq!(store.apply(newer, &ok(&["NEW"])), ApplyOutcome::Applied);
        assert_eq!(
            store.apply(older, &ok(&["OLD"])),
            ApplyOutcome::Discarded {
                latest_generation: newer
            }
        );

        let state = store.current();
        let snapshot = state.last_snapshot.unwrap();
        assert_eq!(snapshot.assets()[0].symbol, "NEW");
    }

    #[test]
    fn test_invalidate_discards_in_flight_without_mutation() {
        let store = TrackerStore::new();
        let cancel = CancellationToken::new();

        let g = store.begin_fetch(&cancel).unwrap();
        let before = store.current();
        store.invalidate();

        assert!(matches!(
            store.apply(g, &ok(&["LATE"])),
            ApplyOutcome::Discarded { .. }
        ));
        assert_eq!(store.current(), before);
    }

    #[test]
    fn test_cancelled_token_refuses_new_fetch() {
        let store = TrackerStore::new();
        let cancel = CancellationToken::new();
        cancel.cancel();

        assert_eq!(store.begin_fetch(&cancel), None);
        assert_eq!(store.current().fetch, FetchState::Idle);
        assert_eq!(store.latest_generation(), 0);
    }

    #[tokio::test]
    async fn test_subscribers_see_changes() {
        let store = TrackerStore::new();
        let mut rx = store.subscribe();
        let cancel = CancellationToken::new();

        let g = store.begin_fetch(&cancel).unwrap();
        rx.changed().await.unwrap();
        assert!(rx.borrow_and_update().fetch.is_loading());

        store.apply(g, &ok(&["A"]));
        rx.changed().await.unwrap();
        assert!(matches!(rx.borrow().fetch, FetchState::Success(_)));
    }
}
