mod geo_provider;
mod metrics_store;
mod record_store;

pub use geo_provider::GeoProvider;
pub use metrics_store::MetricsStore;
pub use record_store::RecordStore;
