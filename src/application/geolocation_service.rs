//! Geolocation Service - Main application use case
//!
//! Cache-aside resolution of IP addresses to countries: consult the record
//! store, serve fresh records, otherwise ask the provider and persist the
//! answer. This is the primary interface for the inbound adapter.

use crate::domain::entities::{BatchEntry, CacheRecord};
use crate::domain::errors::GeoError;
use crate::domain::ports::{GeoProvider, MetricsStore, RecordStore};
use crate::domain::services::FreshnessPolicy;
use crate::domain::value_objects::{IpLiteral, Source};
use chrono::{SubsecRound, Utc};
use futures::stream::{self, StreamExt};
use std::sync::Arc;
use std::time::Instant;

/// Maximum number of addresses accepted by one batch call.
pub const MAX_BATCH_SIZE: usize = 100;

/// Maximum number of records returned by a listing.
pub const MAX_LIST_SIZE: usize = 1000;

/// Sub-second digits kept on `refreshed_at`, matching the SQLite store's
/// millisecond column so a hit returns the record handed out on the miss.
const TIMESTAMP_PRECISION: u16 = 3;

/// Geolocation service - the resolver context.
///
/// Built once at startup and shared by reference with every request
/// handler. Concurrent misses for the same address are not deduplicated:
/// both may reach the provider and both upsert, last write wins.
pub struct GeolocationService {
    store: Arc<dyn RecordStore>,
    provider: Arc<dyn GeoProvider>,
    metrics: Arc<dyn MetricsStore>,
    policy: FreshnessPolicy,
    batch_concurrency: usize,
}

impl GeolocationService {
    /// Create a new service with the default 24h freshness policy and
    /// sequential batch processing.
    pub fn new(
        store: Arc<dyn RecordStore>,
        provider: Arc<dyn GeoProvider>,
        metrics: Arc<dyn MetricsStore>,
    ) -> Self {
        Self {
            store,
            provider,
            metrics,
            policy: FreshnessPolicy::default(),
            batch_concurrency: 1,
        }
    }

    /// Number of batch items resolved concurrently (minimum 1).
    pub fn with_batch_concurrency(mut self, concurrency: usize) -> Self {
        self.batch_concurrency = concurrency.max(1);
        self
    }

    pub fn with_policy(mut self, policy: FreshnessPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Name of the active provider.
    pub fn provider_name(&self) -> &'static str {
        self.provider.name()
    }

    /// Resolve a single address.
    ///
    /// The literal is validated before the store or provider is touched.
    /// A store read failure is treated as a miss; a store write failure
    /// after a successful fetch is logged and the fetched record is still
    /// returned. A provider failure leaves any stale row untouched.
    pub async fn resolve(&self, address: &str) -> Result<(CacheRecord, Source), GeoError> {
        let ip = IpLiteral::parse(address)?;
        self.resolve_ip(ip).await
    }

    async fn resolve_ip(&self, ip: IpLiteral) -> Result<(CacheRecord, Source), GeoError> {
        let started = Instant::now();
        let key = ip.as_key();

        // 1. Fresh record in the store?
        match self.store.get(&key).await {
            Ok(Some(record)) if self.policy.is_fresh(&record, Utc::now()) => {
                tracing::debug!("cache hit for {} -> {}", key, record.country);
                self.metrics.record_hit();
                self.metrics
                    .record_request(Source::Cache, &record.country, started.elapsed());
                return Ok((record, Source::Cache));
            }
            Ok(Some(record)) => {
                tracing::debug!("stale record for {} (refreshed {})", key, record.refreshed_at);
            }
            Ok(None) => {}
            Err(e) => {
                tracing::warn!("cache read failed for {}, falling back to provider: {}", key, e);
            }
        }

        // 2. Miss: ask the provider
        self.metrics.record_miss();
        let country = self.provider.lookup(ip.addr()).await.map_err(|e| {
            tracing::warn!("{} lookup failed for {}: {}", self.provider.name(), key, e);
            GeoError::Provider(e)
        })?;

        // 3. Persist, non-fatal on failure
        let refreshed_at = Utc::now().trunc_subsecs(TIMESTAMP_PRECISION);
        let record = CacheRecord::new(key, country, refreshed_at);
        if let Err(e) = self.store.upsert(&record).await {
            tracing::warn!("failed to save {} to cache: {}", record.address, e);
        }

        tracing::debug!(
            "resolved {} -> {} via {}",
            record.address,
            record.country,
            self.provider.name()
        );
        self.metrics
            .record_request(Source::External, &record.country, started.elapsed());

        Ok((record, Source::External))
    }

    /// Resolve a list of addresses.
    ///
    /// The whole call is rejected if the list exceeds [`MAX_BATCH_SIZE`].
    /// Otherwise every input yields exactly one entry, in input order; an
    /// invalid literal or a provider failure only affects its own entry.
    pub async fn resolve_all(&self, addresses: &[String]) -> Result<Vec<BatchEntry>, GeoError> {
        if addresses.len() > MAX_BATCH_SIZE {
            return Err(GeoError::BatchTooLarge {
                size: addresses.len(),
                max: MAX_BATCH_SIZE,
            });
        }

        let entries = stream::iter(addresses.to_vec())
            .map(|address| async move { self.resolve_entry(&address).await })
            .buffered(self.batch_concurrency)
            .collect::<Vec<_>>()
            .await;

        Ok(entries)
    }

    async fn resolve_entry(&self, address: &str) -> BatchEntry {
        let ip = match IpLiteral::parse(address) {
            Ok(ip) => ip,
            Err(_) => return BatchEntry::invalid(address),
        };

        match self.resolve_ip(ip).await {
            Ok((record, source)) => BatchEntry::resolved(address, record, source),
            Err(_) => BatchEntry::failed(address),
        }
    }

    /// Most recently refreshed records, at most [`MAX_LIST_SIZE`].
    pub async fn list_recent(&self) -> Result<Vec<CacheRecord>, GeoError> {
        Ok(self.store.list_recent(MAX_LIST_SIZE).await?)
    }

    /// Remove one address from the cache.
    ///
    /// Returns whether a record existed; deleting an absent address is not
    /// an error.
    pub async fn delete_one(&self, address: &str) -> Result<bool, GeoError> {
        let ip = IpLiteral::parse(address)?;
        let existed = self.store.delete_one(&ip.as_key()).await?;
        if existed {
            tracing::info!("cleared cache for {}", ip);
        }
        Ok(existed)
    }

    /// Remove every cached record. Returns the number removed.
    pub async fn delete_all(&self) -> Result<u64, GeoError> {
        let removed = self.store.delete_all().await?;
        tracing::info!("cleared entire cache ({} records)", removed);
        Ok(removed)
    }
}
