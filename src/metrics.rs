//! Gateway metrics
//!
//! Atomic counters exposed on `GET /metrics` and fed by the routing
//! engine through its metrics trait.

use modelgate_routing::{RoutingMetrics, TaskCategory};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;
use std::time::Duration;

/// Process-wide counters
#[derive(Debug, Default)]
pub struct Metrics {
    requests_total: AtomicU64,
    errors_total: AtomicU64,
    cache_hits: AtomicU64,
    cache_misses: AtomicU64,
    classifications_total: AtomicU64,
    classification_latency_us_total: AtomicU64,
    routed_per_model: RwLock<HashMap<String, u64>>,
}

/// Point-in-time counter values
#[derive(Debug, Serialize)]
pub struct MetricsSnapshot {
    /// Requests received
    pub requests_total: u64,
    /// Requests that ended in an error response
    pub errors_total: u64,
    /// Classification cache hits
    pub cache_hits: u64,
    /// Classification cache misses
    pub cache_misses: u64,
    /// Classifier runs
    pub classifications_total: u64,
    /// Mean classifier latency in microseconds
    pub classification_latency_us_avg: u64,
    /// Requests routed, per model id
    pub routed_per_model: HashMap<String, u64>,
}

impl Metrics {
    /// Count one incoming request
    pub fn request(&self) {
        self.requests_total.fetch_add(1, Ordering::Relaxed);
    }

    /// Count one error response
    pub fn error(&self) {
        self.errors_total.fetch_add(1, Ordering::Relaxed);
    }

    /// Current counter values
    pub fn snapshot(&self) -> MetricsSnapshot {
        let classifications = self.classifications_total.load(Ordering::Relaxed);
        let latency_total = self.classification_latency_us_total.load(Ordering::Relaxed);
        let routed_per_model = self
            .routed_per_model
            .read()
            .map(|map| map.clone())
            .unwrap_or_default();

        MetricsSnapshot {
            requests_total: self.requests_total.load(Ordering::Relaxed),
            errors_total: self.errors_total.load(Ordering::Relaxed),
            cache_hits: self.cache_hits.load(Ordering::Relaxed),
            cache_misses: self.cache_misses.load(Ordering::Relaxed),
            classifications_total: classifications,
            classification_latency_us_avg: latency_total
                .checked_div(classifications)
                .unwrap_or(0),
            routed_per_model,
        }
    }
}

impl RoutingMetrics for Metrics {
    fn cache_hit(&self) {
        self.cache_hits.fetch_add(1, Ordering::Relaxed);
    }

    fn cache_miss(&self) {
        self.cache_misses.fetch_add(1, Ordering::Relaxed);
    }

    fn classification(&self, _category: TaskCategory, elapsed: Duration) {
        self.classifications_total.fetch_add(1, Ordering::Relaxed);
        self.classification_latency_us_total
            .fetch_add(elapsed.as_micros() as u64, Ordering::Relaxed);
    }

    fn routed(&self, model: &str) {
        if let Ok(mut map) = self.routed_per_model.write() {
            *map.entry(model.to_string()).or_insert(0) += 1;
        }
    }
}
