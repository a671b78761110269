//! Internal metrics collection.
//!
//! Per-process counters only. Authoritative occupancy lives in the shared
//! store; the gauges here are the last values this instance observed.
//! [`Metrics::snapshot`] is served as JSON on `/metrics`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

/// A counter metric.
#[derive(Debug, Default)]
pub struct Counter(AtomicU64);

impl Counter {
    pub fn new() -> Self {
        Self(AtomicU64::new(0))
    }

    pub fn inc(&self) {
        self.0.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_by(&self, n: u64) {
        self.0.fetch_add(n, Ordering::Relaxed);
    }

    pub fn get(&self) -> u64 {
        self.0.load(Ordering::Relaxed)
    }
}

/// A gauge metric (can go up or down).
#[derive(Debug, Default)]
pub struct Gauge(AtomicU64);

impl Gauge {
    pub fn new() -> Self {
        Self(AtomicU64::new(0))
    }

    pub fn set(&self, val: u64) {
        self.0.store(val, Ordering::Relaxed);
    }

    pub fn get(&self) -> u64 {
        self.0.load(Ordering::Relaxed)
    }
}

/// Histogram for latency tracking.
#[derive(Debug)]
pub struct Histogram {
    /// Buckets: 1ms, 5ms, 10ms, 25ms, 50ms, 100ms, 250ms, 500ms, 1s, 5s, 10s
    buckets: [AtomicU64; 11],
    sum: AtomicU64,
    count: AtomicU64,
}

impl Default for Histogram {
    fn default() -> Self {
        Self::new()
    }
}

impl Histogram {
    const BUCKET_BOUNDS: [u64; 11] = [1, 5, 10, 25, 50, 100, 250, 500, 1000, 5000, 10000];

    pub fn new() -> Self {
        Self {
            buckets: Default::default(),
            sum: AtomicU64::new(0),
            count: AtomicU64::new(0),
        }
    }

    /// Records a value in milliseconds.
    pub fn observe(&self, ms: u64) {
        self.sum.fetch_add(ms, Ordering::Relaxed);
        self.count.fetch_add(1, Ordering::Relaxed);

        for (i, &bound) in Self::BUCKET_BOUNDS.iter().enumerate() {
            if ms <= bound {
                self.buckets[i].fetch_add(1, Ordering::Relaxed);
                return;
            }
        }
        // Value exceeds all buckets, add to last
        self.buckets[10].fetch_add(1, Ordering::Relaxed);
    }

    pub fn count(&self) -> u64 {
        self.count.load(Ordering::Relaxed)
    }

    pub fn sum(&self) -> u64 {
        self.sum.load(Ordering::Relaxed)
    }

    pub fn mean(&self) -> f64 {
        let count = self.count();
        if count == 0 {
            0.0
        } else {
            self.sum() as f64 / count as f64
        }
    }

    /// Returns bucket counts.
    pub fn buckets(&self) -> Vec<(u64, u64)> {
        Self::BUCKET_BOUNDS
            .iter()
            .zip(self.buckets.iter())
            .map(|(&bound, count)| (bound, count.load(Ordering::Relaxed)))
            .collect()
    }
}

/// Collected metrics for the waiting room.
#[derive(Debug, Default)]
pub struct Metrics {
    // Decision metrics
    pub decisions: Counter,
    pub tokens_issued: Counter,
    pub admitted_direct: Counter,
    pub admitted_promoted: Counter,
    pub active_refreshed: Counter,
    pub sessions_queued: Counter,

    // Promotion metrics
    pub promotion_runs: Counter,
    pub sessions_promoted: Counter,

    // Failure handling
    pub store_errors: Counter,
    pub fail_open_requests: Counter,
    pub fail_closed_requests: Counter,

    // Latency histograms
    pub decision_latency_ms: Histogram,

    // Gauges
    pub active_sessions: Gauge,
    pub queue_depth: Gauge,
}

impl Metrics {
    pub fn new() -> Self {
        Self::default()
    }
}

/// A snapshot of metrics at a point in time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub timestamp: DateTime<Utc>,
    pub decisions: u64,
    pub tokens_issued: u64,
    pub admitted_direct: u64,
    pub admitted_promoted: u64,
    pub active_refreshed: u64,
    pub sessions_queued: u64,
    pub promotion_runs: u64,
    pub sessions_promoted: u64,
    pub store_errors: u64,
    pub fail_open_requests: u64,
    pub fail_closed_requests: u64,
    pub decision_latency_mean_ms: f64,
    /// `(upper bound ms, count)` pairs
    pub decision_latency_buckets: Vec<(u64, u64)>,
    pub active_sessions: u64,
    pub queue_depth: u64,
}

impl Metrics {
    /// Takes a snapshot of current metrics.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            timestamp: Utc::now(),
            decisions: self.decisions.get(),
            tokens_issued: self.tokens_issued.get(),
            admitted_direct: self.admitted_direct.get(),
            admitted_promoted: self.admitted_promoted.get(),
            active_refreshed: self.active_refreshed.get(),
            sessions_queued: self.sessions_queued.get(),
            promotion_runs: self.promotion_runs.get(),
            sessions_promoted: self.sessions_promoted.get(),
            store_errors: self.store_errors.get(),
            fail_open_requests: self.fail_open_requests.get(),
            fail_closed_requests: self.fail_closed_requests.get(),
            decision_latency_mean_ms: self.decision_latency_ms.mean(),
            decision_latency_buckets: self.decision_latency_ms.buckets(),
            active_sessions: self.active_sessions.get(),
            queue_depth: self.queue_depth.get(),
        }
    }
}

/// Global metrics registry.
pub static METRICS: std::sync::LazyLock<Metrics> = std::sync::LazyLock::new(Metrics::new);

/// Get the global metrics instance.
pub fn metrics() -> &'static Metrics {
    &METRICS
}
