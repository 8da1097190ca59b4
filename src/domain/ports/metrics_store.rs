//! Metrics Store Port
//!
//! Defines the interface for hit/miss and request accounting.

use crate::domain::value_objects::Source;
use std::time::Duration;

/// Store for resolution metrics.
pub trait MetricsStore: Send + Sync {
    /// A fresh record was served from the store.
    fn record_hit(&self);

    /// No fresh record was found; the provider was consulted.
    fn record_miss(&self);

    /// A resolution completed successfully.
    fn record_request(&self, source: Source, country: &str, elapsed: Duration);
}
