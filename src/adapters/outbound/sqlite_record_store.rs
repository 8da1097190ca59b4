//! SQLite Record Store
//!
//! Implements RecordStore using SQLite for durable storage.

use crate::domain::entities::CacheRecord;
use crate::domain::errors::StoreError;
use crate::domain::ports::RecordStore;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;
use std::sync::Arc;

/// SQL schema for the cache table.
pub const IP_LOCATIONS_SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS ip_locations (
    ip TEXT PRIMARY KEY NOT NULL,
    country TEXT NOT NULL,
    cached_at INTEGER NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_ip_locations_cached_at ON ip_locations(cached_at);
"#;

/// SQLite-backed record store.
///
/// One connection is shared behind a mutex; every statement runs on the
/// blocking pool so the async runtime is never stalled by disk I/O.
/// `cached_at` is stored as Unix milliseconds.
#[derive(Clone)]
pub struct SqliteRecordStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteRecordStore {
    /// Open (or create) a database file and ensure the schema exists.
    pub fn open(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let conn = Connection::open(path)?;
        Self::from_connection(conn)
    }

    /// Open a private in-memory database.
    pub fn in_memory() -> anyhow::Result<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> anyhow::Result<Self> {
        conn.execute_batch(IP_LOCATIONS_SCHEMA)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Run a closure against the connection on the blocking pool.
    async fn with_conn<T, F>(&self, f: F) -> Result<T, StoreError>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> Result<T, StoreError> + Send + 'static,
    {
        let conn = self.conn.clone();
        tokio::task::spawn_blocking(move || {
            let guard = conn.lock();
            f(&guard)
        })
        .await
        .map_err(|e| StoreError::Worker(e.to_string()))?
    }

    /// Convert a SQLite row to a CacheRecord.
    fn row_to_record(row: &Row) -> rusqlite::Result<CacheRecord> {
        let millis: i64 = row.get(2)?;
        let refreshed_at = DateTime::<Utc>::from_timestamp_millis(millis).ok_or_else(|| {
            rusqlite::Error::IntegralValueOutOfRange(2, millis)
        })?;

        Ok(CacheRecord {
            address: row.get(0)?,
            country: row.get(1)?,
            refreshed_at,
        })
    }
}

#[async_trait]
impl RecordStore for SqliteRecordStore {
    async fn get(&self, address: &str) -> Result<Option<CacheRecord>, StoreError> {
        let address = address.to_string();
        self.with_conn(move |conn| {
            conn.query_row(
                "SELECT ip, country, cached_at FROM ip_locations WHERE ip = ?1",
                params![address],
                Self::row_to_record,
            )
            .optional()
            .map_err(StoreError::from)
        })
        .await
    }

    async fn upsert(&self, record: &CacheRecord) -> Result<(), StoreError> {
        let record = record.clone();
        self.with_conn(move |conn| {
            conn.execute(
                "INSERT INTO ip_locations (ip, country, cached_at)
                 VALUES (?1, ?2, ?3)
                 ON CONFLICT(ip) DO UPDATE SET country = excluded.country, cached_at = excluded.cached_at",
                params![
                    record.address,
                    record.country,
                    record.refreshed_at.timestamp_millis()
                ],
            )?;
            Ok(())
        })
        .await
    }

    async fn delete_one(&self, address: &str) -> Result<bool, StoreError> {
        let address = address.to_string();
        self.with_conn(move |conn| {
            let removed = conn.execute("DELETE FROM ip_locations WHERE ip = ?1", params![address])?;
            Ok(removed > 0)
        })
        .await
    }

    async fn delete_all(&self) -> Result<u64, StoreError> {
        self.with_conn(|conn| {
            let removed = conn.execute("DELETE FROM ip_locations", [])?;
            Ok(removed as u64)
        })
        .await
    }

    async fn list_recent(&self, limit: usize) -> Result<Vec<CacheRecord>, StoreError> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        self.with_conn(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT ip, country, cached_at FROM ip_locations
                 ORDER BY cached_at DESC, ip ASC
                 LIMIT ?1",
            )?;

            let records = stmt
                .query_map(params![limit], Self::row_to_record)?
                .collect::<Result<Vec<_>, _>>()?;

            Ok(records)
        })
        .await
    }
}
