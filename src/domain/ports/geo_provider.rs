//! Geolocation Provider Port
//!
//! Defines the interface for resolving an IP address to a country name
//! through a third-party service.

use crate::domain::errors::ProviderError;
use async_trait::async_trait;
use std::net::IpAddr;

/// External IP-to-country lookup.
///
/// Implementations return the sentinel "Unknown" when the provider answers
/// without a country, and an error only when the call itself fails.
/// A single attempt is made per call; there is no retry.
#[async_trait]
pub trait GeoProvider: Send + Sync {
    async fn lookup(&self, ip: IpAddr) -> Result<String, ProviderError>;

    /// Provider name (for logs and health output).
    fn name(&self) -> &'static str;
}
