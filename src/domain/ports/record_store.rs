//! Record Store Port
//!
//! Defines the interface for the persistent cache table.
//! Implementations may use SQLite or in-memory storage.

use crate::domain::entities::CacheRecord;
use crate::domain::errors::StoreError;
use async_trait::async_trait;

/// Durable table of cache records keyed by canonical IP address.
///
/// This is an outbound port. The resolver reads through it on every lookup
/// and writes through it only after a successful provider call.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Point lookup by address. `Ok(None)` when no row exists.
    async fn get(&self, address: &str) -> Result<Option<CacheRecord>, StoreError>;

    /// Insert or overwrite the record for `record.address`.
    ///
    /// Concurrent writers of the same key must leave exactly one row behind;
    /// the last write wins.
    async fn upsert(&self, record: &CacheRecord) -> Result<(), StoreError>;

    /// Remove one address. Returns whether a row existed.
    async fn delete_one(&self, address: &str) -> Result<bool, StoreError>;

    /// Remove every row. Returns the number of rows removed.
    async fn delete_all(&self) -> Result<u64, StoreError>;

    /// Up to `limit` records, most recently refreshed first.
    async fn list_recent(&self, limit: usize) -> Result<Vec<CacheRecord>, StoreError>;
}
