//! Internal metrics collection.
//!
//! Counters, gauges and latency histograms held in memory and exposed as a
//! JSON snapshot on `/metrics`.

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

    pub fn reset(&self) -> u64 {
        self.0.swap(0, Ordering::Relaxed)
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

    pub fn inc(&self) {
        self.0.fetch_add(1, Ordering::Relaxed);
    }

    /// Decrement, stopping at zero.
    pub fn dec(&self) {
        let _ = self
            .0
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |v| v.checked_sub(1));
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

/// Collected metrics for the dashboards.
#[derive(Debug, Default)]
pub struct Metrics {
    // Request metrics
    pub dashboard_requests: Counter,
    pub growth_requests: Counter,
    pub degraded_responses: Counter,
    pub logins_succeeded: Counter,
    pub logins_failed: Counter,
    pub rate_limited_requests: Counter,

    // Catalog source metrics
    pub catalog_fetches: Counter,
    pub catalog_fetch_errors: Counter,
    pub catalog_cache_hits: Counter,
    pub catalog_rows_fetched: Counter,

    // Analytics source metrics
    pub analytics_fetches: Counter,
    pub analytics_fetch_errors: Counter,
    pub analytics_cache_hits: Counter,
    pub analytics_rows_fetched: Counter,

    // Reconciliation metrics
    pub rows_reconciled: Counter,
    pub rows_matched: Counter,

    // Latency histograms
    pub catalog_latency_ms: Histogram,
    pub analytics_latency_ms: Histogram,
    pub pipeline_latency_ms: Histogram,

    // Gauges
    pub active_sessions: Gauge,
}

impl Metrics {
    pub fn new() -> Self {
        Self::default()
    }
}

/// A snapshot of metrics at a point in time.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsSnapshot {
    pub timestamp: DateTime<Utc>,
    pub dashboard_requests: u64,
    pub growth_requests: u64,
    pub degraded_responses: u64,
    pub logins_succeeded: u64,
    pub logins_failed: u64,
    pub rate_limited_requests: u64,
    pub catalog_fetches: u64,
    pub catalog_fetch_errors: u64,
    pub catalog_cache_hits: u64,
    pub catalog_rows_fetched: u64,
    pub analytics_fetches: u64,
    pub analytics_fetch_errors: u64,
    pub analytics_cache_hits: u64,
    pub analytics_rows_fetched: u64,
    pub rows_reconciled: u64,
    pub rows_matched: u64,
    /// Share of reconciled catalog rows that found analytics, 0-1.
    pub match_rate: f64,
    pub catalog_latency_mean_ms: f64,
    pub analytics_latency_mean_ms: f64,
    pub pipeline_latency_mean_ms: f64,
    pub active_sessions: u64,
}

impl Metrics {
    /// Takes a snapshot of current metrics.
    pub fn snapshot(&self) -> MetricsSnapshot {
        let rows_reconciled = self.rows_reconciled.get();
        let rows_matched = self.rows_matched.get();

        MetricsSnapshot {
            timestamp: Utc::now(),
            dashboard_requests: self.dashboard_requests.get(),
            growth_requests: self.growth_requests.get(),
            degraded_responses: self.degraded_responses.get(),
            logins_succeeded: self.logins_succeeded.get(),
            logins_failed: self.logins_failed.get(),
            rate_limited_requests: self.rate_limited_requests.get(),
            catalog_fetches: self.catalog_fetches.get(),
            catalog_fetch_errors: self.catalog_fetch_errors.get(),
            catalog_cache_hits: self.catalog_cache_hits.get(),
            catalog_rows_fetched: self.catalog_rows_fetched.get(),
            analytics_fetches: self.analytics_fetches.get(),
            analytics_fetch_errors: self.analytics_fetch_errors.get(),
            analytics_cache_hits: self.analytics_cache_hits.get(),
            analytics_rows_fetched: self.analytics_rows_fetched.get(),
            rows_reconciled,
            rows_matched,
            match_rate: if rows_reconciled == 0 {
                0.0
            } else {
                rows_matched as f64 / rows_reconciled as f64
            },
            catalog_latency_mean_ms: self.catalog_latency_ms.mean(),
            analytics_latency_mean_ms: self.analytics_latency_ms.mean(),
            pipeline_latency_mean_ms: self.pipeline_latency_ms.mean(),
            active_sessions: self.active_sessions.get(),
        }
    }
}

/// Global metrics registry.
pub static METRICS: std::sync::LazyLock<Metrics> = std::sync::LazyLock::new(Metrics::new);

/// Get the global metrics instance.
pub fn metrics() -> &'static Metrics {
    &METRICS
}
