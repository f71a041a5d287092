//! Provider abstraction for fetching the token ranking from a backend

use crate::{error::ProviderError, types::Asset};
use async_trait::async_trait;

/// Trait for ranking providers
///
/// Implementations return the full ranked list in one call. The tracker
/// treats every call as all-or-nothing: either a complete list or an error.
#[async_trait]
pub trait RankingProvider: Send + Sync {
    /// Fetches the current ranking
    ///
    /// # Returns
    /// The ranked assets in wire order, or the reason the fetch failed
    async fn fetch_ranking(&self) -> Result<Vec<Asset>, ProviderError>;

    /// Returns the name of this provider
    fn provider_name(&self) -> &'static str;
}

#[cfg(test)]
pub mod mock {
    use super::*;
    use crate::types::TimeframeValues;
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};
    use tokio::sync::oneshot;

    /// One scripted answer; a gated answer waits until its release is sent
    struct Scripted {
        result: Result<Vec<Asset>, ProviderError>,
        gate: Option<oneshot::Receiver<()>>,
    }

    /// Mock provider for testing
    ///
    /// Answers are consumed in call order. When the script runs dry the
    /// provider keeps answering with an empty ranking.
    pub struct MockProvider {
        script: Arc<Mutex<VecDeque<Scripted>>>,
        call_count: Arc<Mutex<usize>>,
    }

    impl Default for MockProvider {
        fn default() -> Self {
            Self::new()
        }
    }

    impl MockProvider {
        pub fn new() -> Self {
            Self {
                script: Arc::new(Mutex::new(VecDeque::new())),
                call_count: Arc::new(Mutex::new(0)),
            }
        }

        pub fn push_ok(&self, assets: Vec<Asset>) {
            self.push(Ok(assets), None);
        }

        pub fn push_err(&self, error: ProviderError) {
            self.push(Err(error), None);
        }

        /// Queues an answer that is held back until the returned sender fires
        pub fn push_gated(
            &self,
            result: Result<Vec<Asset>, ProviderError>,
        ) -> oneshot::Sender<()> {
            let (tx, rx) = oneshot::channel();
            self.push(result, Some(rx));
            tx
        }

        fn push(
            &self,
            result: Result<Vec<Asset>, ProviderError>,
            gate: Option<oneshot::Receiver<()>>,
        ) {
            self.script
                .lock()
                .unwrap()
                .push_back(Scripted { result, gate });
        }

        pub fn call_count(&self) -> usize {
            *self.call_count.lock().unwrap()
        }
    }

    #[async_trait]
    impl RankingProvider for MockProvider {
        async fn fetch_ranking(&self) -> Result<Vec<Asset>, ProviderError> {
            *self.call_count.lock().unwrap() += 1;
            let next = self.script.lock().unwrap().pop_front();
            match next {
                Some(Scripted { result, gate }) => {
                    if let Some(gate) = gate {
                        let _ = gate.await;
                    }
                    result
                }
                None => Ok(Vec::new()),
            }
        }

        fn provider_name(&self) -> &'static str {
            "mock"
        }
    }

    /// Builds a token with the same change/volume in every timeframe
    pub fn token(rank: u32, symbol: &str, price: Option<f64>) -> Asset {
        Asset {
            rank,
            symbol: symbol.to_string(),
            name: format!("{} Token", symbol),
            logo_url: Some(format!("https://img.example/{}.png", symbol.to_lowercase())),
            price,
            change_by_timeframe: TimeframeValues {
                h24: Some(4.27),
                h6: Some(-0.01),
                m5: Some(0.0),
            },
            volume_by_timeframe: TimeframeValues {
                h24: Some(1_000_000.0),
                h6: Some(1_500.0),
                m5: None,
            },
        }
    }
}
