//! Adapters Layer
//!
//! Inbound adapters drive the application (HTTP API); outbound adapters are
//! driven by it (record stores, geolocation providers, metrics).

pub mod inbound;
pub mod outbound;
