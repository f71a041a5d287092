//! Fetch health metrics collection and reporting
//!
//! Tracks latency percentiles, success rate and the network/response split
//! of failures for the ranking provider.

use crate::error::FailureKind;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

/// Maximum number of samples to keep for metrics calculation
const MAX_SAMPLES: usize = 100;

/// Metrics for the ranking provider
#[derive(Debug, Clone)]
pub struct ProviderMetrics {
    /// Name of the provider
    pub provider_name: String,
    /// 50th percentile latency in milliseconds
    pub latency_p50_ms: f64,
    /// 99th percentile latency in milliseconds
    pub latency_p99_ms: f64,
    /// Success rate (0.0 to 1.0)
    pub success_rate: f64,
    /// Total number of requests tracked
    pub total_requests: u64,
    /// Requests that never got a response
    pub network_failures: u64,
    /// Requests answered with an error status or unusable body
    pub response_failures: u64,
}

impl ProviderMetrics {
    /// Creates metrics with no data
    pub fn empty(provider_name: &str) -> Self {
        Self {
            provider_name: provider_name.to_string(),
            latency_p50_ms: 0.0,
            latency_p99_ms: 0.0,
            success_rate: 1.0,
            total_requests: 0,
            network_failures: 0,
            response_failures: 0,
        }
    }

    /// Failed requests of any kind
    pub fn failed_requests(&self) -> u64 {
        self.network_failures + self.response_failures
    }
}

/// Internal sample for latency tracking
#[derive(Debug, Clone)]
struct LatencySample {
    duration_ms: f64,
    success: bool,
}

#[derive(Debug, Default)]
struct Totals {
    requests: u64,
    network_failures: u64,
    response_failures: u64,
}

/// Collects and computes metrics for a provider
pub struct MetricsCollector {
    provider_name: String,
    /// Rolling window of latency samples
    samples: Arc<RwLock<VecDeque<LatencySample>>>,
    /// Lifetime counters
    totals: Arc<RwLock<Totals>>,
}

impl MetricsCollector {
    /// Creates a new metrics collector for a provider
    pub fn new(provider_name: &str) -> Self {
        Self {
            provider_name: provider_name.to_string(),
            samples: Arc::new(RwLock::new(VecDeque::with_capacity(MAX_SAMPLES))),
            totals: Arc::new(RwLock::new(Totals::default())),
        }
    }

    /// Records a request with its duration and, if it failed, the failure kind
    pub async fn record_request(&self, duration: Duration, failure: Option<FailureKind>) {
        let duration_ms = duration.as_secs_f64() * 1000.0;

        {
            let mut totals = self.totals.write().await;
            totals.requests += 1;
            match failure {
                Some(FailureKind::Network) => totals.network_failures += 1,
                Some(FailureKind::Response) => totals.response_failures += 1,
                None => {}
            }
        }

        let mut samples = self.samples.write().await;
        if samples.len() >= MAX_SAMPLES {
            samples.pop_front();
        }
        samples.push_back(LatencySample {
            duration_ms,
            success: failure.is_none(),
        });
    }

    /// Computes current metrics from collected samples
    pub async fn get_metrics(&self) -> ProviderMetrics {
        let samples = self.samples.read().await;
        let totals = self.totals.read().await;

        if samples.is_empty() {
            return ProviderMetrics::empty(&self.provider_name);
        }

        // Only successful requests count towards latency
        let mut latencies: Vec<f64> = samples
            .iter()
            .filter(|s| s.success)
            .map(|s| s.duration_ms)
            .collect();

        latencies.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

        let failed = totals.network_failures + totals.response_failures;
        let success_rate = if totals.requests > 0 {
            (totals.requests - failed) as f64 / totals.requests as f64
        } else {
            1.0
        };

        ProviderMetrics {
            provider_name: self.provider_name.clone(),
            latency_p50_ms: percentile(&latencies, 50.0),
            latency_p99_ms: percentile(&latencies, 99.0),
            success_rate,
            total_requests: totals.requests,
            network_failures: totals.network_failures,
            response_failures: totals.response_failures,
        }
    }
}

/// Calculate percentile from sorted values
fn percentile(sorted_values: &[f64], p: f64) -> f64 {
    if sorted_values.is_empty() {
        return 0.0;
    }

    let idx = (p / 100.0 * (sorted_values.len() - 1) as f64).round() as usize;
    sorted_values[idx.min(sorted_values.len() - 1)]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_metrics_collector() {
        let collector = MetricsCollector::new("test");

        collector.record_request(Duration::from_millis(100), None).await;
        collector.record_request(Duration::from_millis(200), None).await;
        collector
            .record_request(Duration::from_millis(150), Some(FailureKind::Response))
            .await;
        collector
            .record_request(Duration::from_millis(10), Some(FailureKind::Network))
            .await;

        let metrics = collector.get_metrics().await;

        assert_eq!(metrics.provider_name, "test");
        assert_eq!(metrics.total_requests, 4);
        assert_eq!(metrics.network_failures, 1);
        assert_eq!(metrics.response_failures, 1);
        assert_eq!(metrics.failed_requests(), 2);
        assert!((metrics.success_rate - 0.5).abs() < f64::EPSILON);
        assert_eq!(metrics.latency_p99_ms, 200.0);
    }

    #[tokio::test]
    async fn test_empty_metrics() {
        let metrics = MetricsCollector::new("idle").get_metrics().await;
        assert_eq!(metrics.total_requests, 0);
        assert_eq!(metrics.success_rate, 1.0);
    }

    #[test]
    fn test_percentile() {
        let values = vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0];
        assert_eq!(percentile(&values, 50.0), 5.0);
        assert_eq!(percentile(&values, 99.0), 9.0);
        assert_eq!(percentile(&[], 50.0), 0.0);
    }
}
