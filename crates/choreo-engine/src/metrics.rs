//! Execution metrics.
//!
//! Counts registrations and completions and keeps a moving average of the
//! wall-clock cost of each execution (the time spent inside driver calls on
//! its behalf). Executions costing more than the frame budget are counted.
//! None of this feeds back into scheduling.

use choreo_config::MetricsConfig;
use serde::{Deserialize, Serialize};
use web_time::Duration;

/// Point-in-time copy of the collected metrics.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub total_registered: u64,
    pub total_completed: u64,
    /// Descriptors queued or running when the snapshot was taken.
    pub in_flight: usize,
    /// Smoothed per-execution cost in milliseconds.
    pub average_cost_ms: f64,
    pub over_budget: u64,
    /// Completions that took the reduced-motion path.
    pub instant_settles: u64,
    /// Fire requests dropped as stale or unknown.
    pub dropped_requests: u64,
}

#[derive(Debug, Clone)]
pub struct MetricsCollector {
    frame_budget_ms: f64,
    /// Weight of the newest sample (0.0-1.0).
    smoothing: f64,
    total_registered: u64,
    total_completed: u64,
    average_cost_ms: Option<f64>,
    over_budget: u64,
    instant_settles: u64,
    dropped_requests: u64,
}

impl MetricsCollector {
    pub fn new(config: &MetricsConfig) -> Self {
        Self {
            frame_budget_ms: config.frame_budget_ms,
            smoothing: config.smoothing.clamp(0.0, 1.0),
            total_registered: 0,
            total_completed: 0,
            average_cost_ms: None,
            over_budget: 0,
            instant_settles: 0,
            dropped_requests: 0,
        }
    }

    pub fn record_registered(&mut self) {
        self.total_registered += 1;
    }

    pub fn record_dropped(&mut self) {
        self.dropped_requests += 1;
    }

    /// Record one finished execution and what it cost.
    pub fn record_completion(&mut self, cost: Duration, instant: bool) {
        self.total_completed += 1;
        if instant {
            self.instant_settles += 1;
        }

        let cost_ms = cost.as_secs_f64() * 1000.0;
        self.average_cost_ms = Some(match self.average_cost_ms {
            // First sample seeds the average.
            None => cost_ms,
            Some(avg) => avg * (1.0 - self.smoothing) + cost_ms * self.smoothing,
        });

        if cost_ms > self.frame_budget_ms {
            self.over_budget += 1;
            tracing::trace!(cost_ms, budget_ms = self.frame_budget_ms, "execution over frame budget");
        }
    }

    pub fn total_registered(&self) -> u64 {
        self.total_registered
    }

    pub fn total_completed(&self) -> u64 {
        self.total_completed
    }

    pub fn average_cost_ms(&self) -> f64 {
        self.average_cost_ms.unwrap_or(0.0)
    }

    pub fn snapshot(&self, in_flight: usize) -> MetricsSnapshot {
        MetricsSnapshot {
            total_registered: self.total_registered,
            total_completed: self.total_completed,
            in_flight,
            average_cost_ms: self.average_cost_ms(),
            over_budget: self.over_budget,
            instant_settles: self.instant_settles,
            dropped_requests: self.dropped_requests,
        }
    }

}

impl Default for MetricsCollector {
    fn default() -> Self {
        Self::new(&MetricsConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collector(budget_ms: f64, smoothing: f64) -> MetricsCollector {
        MetricsCollector::new(&MetricsConfig {
            frame_budget_ms: budget_ms,
            smoothing,
        })
    }

    #[test]
    fn test_counts() {
        let mut metrics = MetricsCollector::default();
        metrics.record_registered();
        metrics.record_registered();
        metrics.record_completion(Duration::ZERO, false);
        metrics.record_completion(Duration::ZERO, true);
        metrics.record_dropped();

        let snapshot = metrics.snapshot(3);
        assert_eq!(snapshot.total_registered, 2);
        assert_eq!(snapshot.total_completed, 2);
        assert_eq!(snapshot.instant_settles, 1);
        assert_eq!(snapshot.dropped_requests, 1);
        assert_eq!(snapshot.in_flight, 3);
    }

    #[test]
    fn test_moving_average() {
        let mut metrics = collector(16.67, 0.5);
        assert_eq!(metrics.average_cost_ms(), 0.0);

        metrics.record_completion(Duration::from_millis(4), false);
        assert!((metrics.average_cost_ms() - 4.0).abs() < 1e-9);

        metrics.record_completion(Duration::from_millis(8), false);
        assert!((metrics.average_cost_ms() - 6.0).abs() < 1e-9);
    }

    #[test]
    fn test_over_budget() {
        let mut metrics = collector(10.0, 0.1);
        metrics.record_completion(Duration::from_millis(5), false);
        metrics.record_completion(Duration::from_millis(11), false);
        metrics.record_completion(Duration::from_millis(30), false);
        assert_eq!(metrics.snapshot(0).over_budget, 2);
    }
}
