//! geo-cache Library
//!
//! This module exposes the geolocation cache components for use in
//! integration tests and as a library.

#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;

// Re-export commonly used types
pub use application::GeolocationService;
pub use config::{load_config, Config, StoreKind};
pub use domain::entities::{BatchEntry, BatchOutcome, CacheRecord};
pub use domain::errors::{GeoError, ProviderError, StoreError};
pub use domain::ports::{GeoProvider, MetricsStore, RecordStore};
pub use domain::services::FreshnessPolicy;
pub use domain::value_objects::{IpLiteral, Source};
