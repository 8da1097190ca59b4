//! Freshness Policy
//!
//! Pure domain logic deciding whether a cached record may be served.
//! Freshness is evaluated at read time; nothing expires records in the
//! background.

use crate::domain::entities::CacheRecord;
use chrono::{DateTime, Duration, Utc};

/// Fixed time-to-live for cached records.
pub const DEFAULT_TTL_HOURS: i64 = 24;

/// Time-based freshness rule for cache records.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FreshnessPolicy {
    ttl: Duration,
}

impl FreshnessPolicy {
    pub fn new(ttl: Duration) -> Self {
        Self { ttl }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// A record is fresh iff `now - refreshed_at < ttl`.
    ///
    /// A record stamped in the future (clock skew between writers) counts
    /// as fresh.
    pub fn is_fresh(&self, record: &CacheRecord, now: DateTime<Utc>) -> bool {
        now.signed_duration_since(record.refreshed_at) < self.ttl
    }
}

impl Default for FreshnessPolicy {
    fn default() -> Self {
        Self::new(Duration::hours(DEFAULT_TTL_HOURS))
    }
}
