mod dashmap_record_store;
mod ip_api_geo_provider;
mod ipstack_geo_provider;
mod prometheus_metrics_store;
mod sqlite_record_store;

pub use dashmap_record_store::DashMapRecordStore;
pub use ip_api_geo_provider::{IpApiConfig, IpApiGeoProvider};
pub use ipstack_geo_provider::{IpStackConfig, IpStackGeoProvider};
pub use prometheus_metrics_store::PrometheusMetricsStore;
pub use sqlite_record_store::{SqliteRecordStore, IP_LOCATIONS_SCHEMA};
