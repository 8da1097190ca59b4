//! Integration tests for the geolocation API
//!
//! Runs the real router over a TCP socket, backed by a SQLite file and a
//! wiremock server standing in for the geolocation provider.

use chrono::{Duration as ChronoDuration, Utc};
use geo_cache::adapters::inbound::{router, ApiState};
use geo_cache::adapters::outbound::{
    IpApiConfig, IpApiGeoProvider, IpStackConfig, IpStackGeoProvider, PrometheusMetricsStore,
    SqliteRecordStore,
};
use geo_cache::domain::ports::{GeoProvider, RecordStore};
use geo_cache::{CacheRecord, GeolocationService};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tokio::net::TcpListener;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn ip_api_provider(server: &MockServer) -> Arc<dyn GeoProvider> {
    Arc::new(
        IpApiGeoProvider::new(IpApiConfig {
            base_url: server.uri(),
            timeout: Duration::from_secs(2),
        })
        .unwrap(),
    )
}

fn ipstack_provider(server: &MockServer) -> Arc<dyn GeoProvider> {
    Arc::new(
        IpStackGeoProvider::new(IpStackConfig {
            base_url: server.uri(),
            api_key: "test-key".to_string(),
            timeout: Duration::from_secs(2),
        })
        .unwrap(),
    )
}

/// Serve the API on an ephemeral port and return its base URL.
async fn spawn_api(db_path: &Path, provider: Arc<dyn GeoProvider>) -> String {
    let store = Arc::new(SqliteRecordStore::open(db_path).unwrap());
    let metrics = Arc::new(PrometheusMetricsStore::new());
    let service = Arc::new(GeolocationService::new(store, provider, metrics.clone()));
    let app = router(ApiState::new(service, metrics));

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    format!("http://{}", addr)
}

async fn mount_ip_api(server: &MockServer, ip: &str, country: &str, times: u64) {
    Mock::given(method("GET"))
        .and(path(format!("/json/{}", ip)))
        .and(query_param("fields", "country"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({ "country": country })),
        )
        .expect(times)
        .mount(server)
        .await;
}

/// Test a miss is served by the provider and the repeat by the cache
#[tokio::test]
async fn test_resolve_miss_then_hit() {
    let dir = TempDir::new().unwrap();
    let mock_server = MockServer::start().await;
    mount_ip_api(&mock_server, "8.8.8.8", "United States", 1).await;

    let base = spawn_api(&dir.path().join("geo.db"), ip_api_provider(&mock_server)).await;
    let client = reqwest::Client::new();

    let first: serde_json::Value = client
        .get(format!("{}/api/v1/geolocate/8.8.8.8", base))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(first["country"], "United States");
    assert_eq!(first["source"], "external_api");

    let second: serde_json::Value = client
        .get(format!("{}/api/v1/geolocate/8.8.8.8", base))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(second["country"], "United States");
    assert_eq!(second["source"], "cache");
    assert_eq!(second["cached_at"], first["cached_at"]);
}

/// Test cached answers survive a restart on the same database file
#[tokio::test]
async fn test_cache_survives_restart() {
    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("geo.db");

    let first_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/1.1.1.1"))
        .and(query_param("access_key", "test-key"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({ "country_name": "Australia" })),
        )
        .expect(1)
        .mount(&first_server)
        .await;

    let base = spawn_api(&db_path, ipstack_provider(&first_server)).await;
    let resp = reqwest::get(format!("{}/api/v1/geolocate/1.1.1.1", base))
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    // Second instance must not hit its provider at all.
    let second_server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&second_server)
        .await;

    let base = spawn_api(&db_path, ipstack_provider(&second_server)).await;
    let body: serde_json::Value = reqwest::get(format!("{}/api/v1/geolocate/1.1.1.1", base))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["country"], "Australia");
    assert_eq!(body["source"], "cache");
}

/// Test a record older than the TTL is refreshed from the provider
#[tokio::test]
async fn test_stale_record_is_refreshed() {
    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("geo.db");

    let seed = SqliteRecordStore::open(&db_path).unwrap();
    let stale_at = Utc::now() - ChronoDuration::hours(25);
    seed.upsert(&CacheRecord::new("9.9.9.9", "Unknown", stale_at))
        .await
        .unwrap();

    let mock_server = MockServer::start().await;
    mount_ip_api(&mock_server, "9.9.9.9", "Switzerland", 1).await;

    let base = spawn_api(&db_path, ip_api_provider(&mock_server)).await;
    let body: serde_json::Value = reqwest::get(format!("{}/api/v1/geolocate/9.9.9.9", base))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(body["country"], "Switzerland");
    assert_eq!(body["source"], "external_api");

    let stored = seed.get("9.9.9.9").await.unwrap().unwrap();
    assert_eq!(stored.country, "Switzerland");
    assert!(stored.refreshed_at > stale_at);
}

/// Test bulk resolution keeps order and isolates failures
#[tokio::test]
async fn test_bulk_isolates_failures() {
    let dir = TempDir::new().unwrap();
    let mock_server = MockServer::start().await;
    mount_ip_api(&mock_server, "8.8.8.8", "United States", 1).await;
    Mock::given(method("GET"))
        .and(path("/json/4.4.4.4"))
        .respond_with(ResponseTemplate::new(503))
        .expect(1)
        .mount(&mock_server)
        .await;

    let base = spawn_api(&dir.path().join("geo.db"), ip_api_provider(&mock_server)).await;
    let client = reqwest::Client::new();

    let resp = client
        .post(format!("{}/api/v1/geolocate/bulk", base))
        .json(&serde_json::json!({ "ips": ["4.4.4.4", "bogus", "8.8.8.8"] }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    let body: serde_json::Value = resp.json().await.unwrap();
    let results = body["results"].as_array().unwrap();
    assert_eq!(results[0]["ip"], "4.4.4.4");
    assert_eq!(results[0]["country"], "Error");
    assert_eq!(results[1]["country"], "Invalid IP");
    assert_eq!(results[2]["country"], "United States");

    let cached: serde_json::Value = client
        .get(format!("{}/api/v1/cached", base))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(cached["count"], 1);
    assert_eq!(cached["cached_ips"][0]["ip"], "8.8.8.8");
}

/// Test provider outage surfaces as a server error and caches nothing
#[tokio::test]
async fn test_provider_outage() {
    let dir = TempDir::new().unwrap();
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&mock_server)
        .await;

    let base = spawn_api(&dir.path().join("geo.db"), ip_api_provider(&mock_server)).await;

    let resp = reqwest::get(format!("{}/api/v1/geolocate/8.8.4.4", base))
        .await
        .unwrap();
    assert_eq!(resp.status(), 500);

    let cached: serde_json::Value = reqwest::get(format!("{}/api/v1/cached", base))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(cached["count"], 0);
}

/// Test deleting entries forces a fresh provider lookup
#[tokio::test]
async fn test_delete_then_resolve_again() {
    let dir = TempDir::new().unwrap();
    let mock_server = MockServer::start().await;
    mount_ip_api(&mock_server, "8.8.8.8", "United States", 2).await;

    let base = spawn_api(&dir.path().join("geo.db"), ip_api_provider(&mock_server)).await;
    let client = reqwest::Client::new();
    let url = format!("{}/api/v1/geolocate/8.8.8.8", base);

    client.get(&url).send().await.unwrap();

    let resp = client
        .delete(format!("{}/api/v1/cache/8.8.8.8", base))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    let body: serde_json::Value = client.get(&url).send().await.unwrap().json().await.unwrap();
    assert_eq!(body["source"], "external_api");

    let cleared: serde_json::Value = client
        .delete(format!("{}/api/v1/cache", base))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(cleared["rows_affected"], 1);
}
