//! Domain Errors
//!
//! Failure taxonomy for resolution, provider lookups and the record store.

/// Errors returned by the geolocation service.
#[derive(Debug, thiserror::Error)]
pub enum GeoError {
    /// Input is not an IPv4 or IPv6 literal.
    #[error("invalid IP address: {0:?}")]
    InvalidAddress(String),

    /// Batch request exceeds the per-call cap.
    #[error("batch of {size} addresses exceeds the maximum of {max}")]
    BatchTooLarge { size: usize, max: usize },

    /// The geolocation provider could not answer.
    #[error("geolocation lookup failed: {0}")]
    Provider(#[from] ProviderError),

    /// Listing or deletion against the store failed.
    #[error("record store error: {0}")]
    Store(#[from] StoreError),
}

impl GeoError {
    /// Whether this error was raised by input validation, before any
    /// store or provider access.
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::InvalidAddress(_) | Self::BatchTooLarge { .. })
    }
}

/// Errors raised by a geolocation provider adapter.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ProviderError {
    /// Request could not be sent or the connection failed
    #[error("request error: {0}")]
    Request(String),
    /// Provider answered with a non-success HTTP status
    #[error("unexpected status: {0}")]
    Status(u16),
    /// Response body could not be decoded
    #[error("decode error: {0}")]
    Decode(String),
}

impl From<reqwest::Error> for ProviderError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            Self::Decode(e.to_string())
        } else {
            Self::Request(e.to_string())
        }
    }
}

/// Errors raised by a record store adapter.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum StoreError {
    /// Query or statement failed
    #[error("query error: {0}")]
    Query(String),
    /// Stored data could not be converted back into a record
    #[error("data error: {0}")]
    Data(String),
    /// Blocking worker panicked or was cancelled
    #[error("worker error: {0}")]
    Worker(String),
}

impl From<rusqlite::Error> for StoreError {
    fn from(e: rusqlite::Error) -> Self {
        match e {
            rusqlite::Error::IntegralValueOutOfRange(..)
            | rusqlite::Error::FromSqlConversionFailure(..)
            | rusqlite::Error::InvalidColumnType(..) => Self::Data(e.to_string()),
            other => Self::Query(other.to_string()),
        }
    }
}
