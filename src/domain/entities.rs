//! Domain Entities - Core business objects
//!
//! These entities represent the core concepts of the geolocation cache.
//! They have no external dependencies beyond serialization and time.

use crate::domain::value_objects::{Source, ERROR_PLACEHOLDER, INVALID_IP_PLACEHOLDER};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A cached geolocation answer for one address.
///
/// There is at most one record per address; writing the same address again
/// replaces `country` and `refreshed_at`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheRecord {
    /// Canonical IP literal (unique key)
    #[serde(rename = "ip")]
    pub address: String,
    /// Country name, or "Unknown" when the provider had none
    pub country: String,
    /// Time of the last successful write
    #[serde(rename = "cached_at")]
    pub refreshed_at: DateTime<Utc>,
}

impl CacheRecord {
    pub fn new(address: impl Into<String>, country: impl Into<String>, refreshed_at: DateTime<Utc>) -> Self {
        Self {
            address: address.into(),
            country: country.into(),
            refreshed_at,
        }
    }
}

/// Outcome of resolving one entry of a batch.
#[derive(Debug, Clone, PartialEq)]
pub enum BatchOutcome {
    Resolved(CacheRecord, Source),
    /// Entry was not an IP literal
    InvalidAddress,
    /// Provider lookup failed for this entry
    Failed,
}

/// One output entry of a batch resolution, in input order.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchEntry {
    /// The address exactly as submitted
    pub address: String,
    pub outcome: BatchOutcome,
}

impl BatchEntry {
    pub fn resolved(address: impl Into<String>, record: CacheRecord, source: Source) -> Self {
        Self {
            address: address.into(),
            outcome: BatchOutcome::Resolved(record, source),
        }
    }

    pub fn invalid(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            outcome: BatchOutcome::InvalidAddress,
        }
    }

    pub fn failed(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            outcome: BatchOutcome::Failed,
        }
    }

    /// Country to report for this entry, placeholders included.
    pub fn country(&self) -> &str {
        match &self.outcome {
            BatchOutcome::Resolved(record, _) => &record.country,
            BatchOutcome::InvalidAddress => INVALID_IP_PLACEHOLDER,
            BatchOutcome::Failed => ERROR_PLACEHOLDER,
        }
    }

    pub fn record(&self) -> Option<&CacheRecord> {
        match &self.outcome {
            BatchOutcome::Resolved(record, _) => Some(record),
            _ => None,
        }
    }
}
