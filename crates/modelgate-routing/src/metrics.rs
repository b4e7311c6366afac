//! Metrics sink consumed by the routing engine
//!
//! The engine reports cache and classification activity through this
//! trait; the binary wires in a concrete counter set and tests use the
//! no-op sink.

use crate::category::TaskCategory;
use std::time::Duration;

/// Counter sink for routing activity
pub trait RoutingMetrics: Send + Sync {
    /// A classification result was served from the cache
    fn cache_hit(&self) {}

    /// The cache had no usable entry
    fn cache_miss(&self) {}

    /// A classifier run completed
    fn classification(&self, _category: TaskCategory, _elapsed: Duration) {}

    /// A request was routed to the given model
    fn routed(&self, _model: &str) {}
}

/// Sink that records nothing
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopMetrics;

impl RoutingMetrics for NoopMetrics {}
