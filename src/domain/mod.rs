//! Domain Layer
//!
//! Entities, value objects, errors, ports and pure policies.
//! Nothing in here performs I/O.

pub mod entities;
pub mod errors;
pub mod ports;
pub mod services;
pub mod value_objects;

pub use entities::{BatchEntry, BatchOutcome, CacheRecord};
pub use errors::{GeoError, ProviderError, StoreError};
pub use value_objects::{IpLiteral, Source};
