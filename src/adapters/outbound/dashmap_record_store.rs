//! DashMap Record Store
//!
//! Implements RecordStore in memory using DashMap for concurrent access.
//! Contents are lost on restart; suitable for tests and ephemeral deployments.

use crate::domain::entities::CacheRecord;
use crate::domain::errors::StoreError;
use crate::domain::ports::RecordStore;
use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::Arc;

/// DashMap-backed record store.
#[derive(Clone, Default)]
pub struct DashMapRecordStore {
    records: Arc<DashMap<String, CacheRecord>>,
}

impl DashMapRecordStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[async_trait]
impl RecordStore for DashMapRecordStore {
    async fn get(&self, address: &str) -> Result<Option<CacheRecord>, StoreError> {
        Ok(self.records.get(address).map(|e| e.value().clone()))
    }

    async fn upsert(&self, record: &CacheRecord) -> Result<(), StoreError> {
        self.records.insert(record.address.clone(), record.clone());
        Ok(())
    }

    async fn delete_one(&self, address: &str) -> Result<bool, StoreError> {
        Ok(self.records.remove(address).is_some())
    }

    async fn delete_all(&self) -> Result<u64, StoreError> {
        let count = self.records.len() as u64;
        self.records.clear();
        Ok(count)
    }

    async fn list_recent(&self, limit: usize) -> Result<Vec<CacheRecord>, StoreError> {
        let mut records: Vec<CacheRecord> = self.records.iter().map(|e| e.value().clone()).collect();
        records.sort_by(|a, b| {
            b.refreshed_at
                .cmp(&a.refreshed_at)
                .then_with(|| a.address.cmp(&b.address))
        });
        records.truncate(limit);
        Ok(records)
    }
}
