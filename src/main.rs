//! geo-cache - IP Geolocation Cache Service with Hexagonal Architecture
//!
//! This is the composition root that wires together all the components.

use geo_cache::adapters::inbound::{ApiServer, ApiState};
use geo_cache::adapters::outbound::{
    DashMapRecordStore, IpApiConfig, IpApiGeoProvider, IpStackConfig, IpStackGeoProvider,
    PrometheusMetricsStore, SqliteRecordStore,
};
use geo_cache::config::{load_config, Config, StoreKind};
use geo_cache::domain::ports::{GeoProvider, RecordStore};
use geo_cache::infrastructure::shutdown_signal;
use geo_cache::GeolocationService;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::fmt::format::FmtSpan;

/// Pick the provider once: ipstack when a key is configured, else ip-api.
fn build_provider(cfg: &Config) -> anyhow::Result<Arc<dyn GeoProvider>> {
    let timeout = Duration::from_secs(cfg.provider_timeout_secs);

    match &cfg.ipstack_api_key {
        Some(key) => {
            let provider = IpStackGeoProvider::new(IpStackConfig {
                base_url: cfg.ipstack_base_url.clone(),
                api_key: key.clone(),
                timeout,
            })?;
            Ok(Arc::new(provider))
        }
        None => {
            let provider = IpApiGeoProvider::new(IpApiConfig {
                base_url: cfg.ipapi_base_url.clone(),
                timeout,
            })?;
            Ok(Arc::new(provider))
        }
    }
}

fn build_store(cfg: &Config) -> anyhow::Result<Arc<dyn RecordStore>> {
    match cfg.store {
        StoreKind::Sqlite => {
            let store = SqliteRecordStore::open(&cfg.db_path)?;
            tracing::info!("record store: sqlite at {}", cfg.db_path);
            Ok(Arc::new(store))
        }
        StoreKind::Memory => {
            tracing::info!("record store: in-memory");
            Ok(Arc::new(DashMapRecordStore::new()))
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration from environment
    let cfg = load_config()?;

    // Setup logging
    let log_level = if cfg.debug {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_span_events(FmtSpan::CLOSE)
        .init();

    tracing::info!("starting geo-cache listen={}", cfg.listen_addr);

    // ===== COMPOSITION ROOT =====

    // 1. Create outbound adapters
    let store = build_store(&cfg)?;
    let provider = build_provider(&cfg)?;
    tracing::info!("geolocation provider: {}", provider.name());
    let metrics = Arc::new(PrometheusMetricsStore::new());

    // 2. Create application service
    let service = Arc::new(
        GeolocationService::new(store, provider, metrics.clone())
            .with_batch_concurrency(cfg.batch_concurrency),
    );

    // 3. Create inbound adapter and run
    let server = ApiServer::new(cfg.listen_addr.clone(), ApiState::new(service, metrics));

    server.run(shutdown_signal()).await
}
