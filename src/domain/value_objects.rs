//! Value Objects - Immutable domain primitives
//!
//! Value objects are identified by their value rather than identity.
//! They are immutable and can be freely shared.

use crate::domain::errors::GeoError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::IpAddr;

/// Country value used when a provider answered but had no country for the IP.
pub const UNKNOWN_COUNTRY: &str = "Unknown";

/// Batch placeholder for an entry that is not an IP literal.
pub const INVALID_IP_PLACEHOLDER: &str = "Invalid IP";

/// Batch placeholder for an entry whose provider lookup failed.
pub const ERROR_PLACEHOLDER: &str = "Error";

/// A validated IP literal (v4 or v6).
///
/// The canonical textual form is used as the cache key, so equivalent
/// spellings of the same address (e.g. `::0001` and `::1`) share one record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct IpLiteral(IpAddr);

impl IpLiteral {
    /// Parse a textual address.
    ///
    /// # Examples
    /// ```
    /// use geo_cache::domain::value_objects::IpLiteral;
    ///
    /// assert_eq!(IpLiteral::parse("8.8.8.8").unwrap().as_key(), "8.8.8.8");
    /// assert_eq!(IpLiteral::parse("::0001").unwrap().as_key(), "::1");
    /// assert!(IpLiteral::parse("not-an-ip").is_err());
    /// ```
    pub fn parse(raw: &str) -> Result<Self, GeoError> {
        raw.parse::<IpAddr>()
            .map(Self)
            .map_err(|_| GeoError::InvalidAddress(raw.to_string()))
    }

    pub fn addr(&self) -> IpAddr {
        self.0
    }

    /// Canonical string used as the store key.
    pub fn as_key(&self) -> String {
        self.0.to_string()
    }
}

impl From<IpAddr> for IpLiteral {
    fn from(addr: IpAddr) -> Self {
        Self(addr)
    }
}

impl fmt::Display for IpLiteral {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Where a resolved record came from.
///
/// A cache hit and a refresh from the provider are mutually exclusive
/// outcomes of a single resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Source {
    /// Served from a fresh store record
    Cache,
    /// Fetched from the geolocation provider during this call
    #[serde(rename = "external_api")]
    External,
}

impl Source {
    /// Label used in metrics output.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Cache => "cache",
            Self::External => "external_api",
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Normalize a provider's country answer.
///
/// Missing, blank or whitespace-only values collapse to [`UNKNOWN_COUNTRY`]
/// so a stored country is never empty.
pub fn normalize_country(country: Option<String>) -> String {
    match country {
        Some(c) if !c.trim().is_empty() => c.trim().to_string(),
        _ => UNKNOWN_COUNTRY.to_string(),
    }
}
