//! Application Layer
//!
//! Use cases that orchestrate the domain ports.

mod geolocation_service;

pub use geolocation_service::{GeolocationService, MAX_BATCH_SIZE, MAX_LIST_SIZE};
