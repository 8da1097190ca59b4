//! Geolocation HTTP API Server
//!
//! Exposes single and bulk resolution, cache listing and cache deletion
//! over HTTP, plus health and Prometheus metrics endpoints.

use crate::adapters::outbound::PrometheusMetricsStore;
use crate::application::GeolocationService;
use crate::domain::entities::{BatchEntry, CacheRecord};
use crate::domain::errors::GeoError;
use crate::domain::value_objects::Source;
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{delete, get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

/// Bulk resolution request.
#[derive(Debug, Clone, Deserialize)]
pub struct BulkRequest {
    pub ips: Vec<String>,
}

/// Single resolution response.
#[derive(Debug, Serialize)]
pub struct ResolveResponse {
    #[serde(flatten)]
    pub record: CacheRecord,
    pub source: Source,
}

/// One entry of a bulk response.
///
/// Placeholder entries carry "Invalid IP" or "Error" as the country and no
/// timestamp.
#[derive(Debug, Serialize)]
pub struct BulkResult {
    pub ip: String,
    pub country: String,
    pub cached_at: Option<DateTime<Utc>>,
}

impl From<BatchEntry> for BulkResult {
    fn from(entry: BatchEntry) -> Self {
        Self {
            country: entry.country().to_string(),
            cached_at: entry.record().map(|r| r.refreshed_at),
            ip: entry.address,
        }
    }
}

/// Bulk resolution response.
#[derive(Debug, Serialize)]
pub struct BulkResponse {
    pub results: Vec<BulkResult>,
}

/// Cache listing response.
#[derive(Debug, Serialize)]
pub struct CachedListResponse {
    pub cached_ips: Vec<CacheRecord>,
    pub count: usize,
}

/// Health response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub provider: String,
}

/// API Server state.
#[derive(Clone)]
pub struct ApiState {
    pub service: Arc<GeolocationService>,
    pub metrics: Arc<PrometheusMetricsStore>,
}

impl ApiState {
    pub fn new(service: Arc<GeolocationService>, metrics: Arc<PrometheusMetricsStore>) -> Self {
        Self { service, metrics }
    }
}

/// Build the API router.
pub fn router(state: ApiState) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/metrics", get(metrics_handler))
        .route("/api/v1/geolocate/bulk", post(bulk_handler))
        .route("/api/v1/geolocate/:ip", get(geolocate_handler))
        .route("/api/v1/cached", get(cached_handler))
        .route("/api/v1/cache/:ip", delete(clear_one_handler))
        .route("/api/v1/cache", delete(clear_all_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// HTTP API server.
pub struct ApiServer {
    listen_addr: String,
    state: ApiState,
}

impl ApiServer {
    pub fn new(listen_addr: String, state: ApiState) -> Self {
        Self { listen_addr, state }
    }

    /// Run the API server until `shutdown` completes.
    #[cfg_attr(coverage_nightly, coverage(off))]
    pub async fn run<F>(&self, shutdown: F) -> anyhow::Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let app = router(self.state.clone());

        let listener = TcpListener::bind(&self.listen_addr).await?;
        tracing::info!("geolocation API listening on {}", self.listen_addr);

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown)
            .await?;

        tracing::info!("geolocation API stopped");
        Ok(())
    }
}

fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (
        status,
        Json(serde_json::json!({
            "error": message.into()
        })),
    )
        .into_response()
}

/// Map a service error to an HTTP response.
fn geo_error_response(err: GeoError) -> Response {
    match err {
        GeoError::InvalidAddress(_) => error_response(StatusCode::BAD_REQUEST, "Invalid IP address"),
        GeoError::BatchTooLarge { max, .. } => error_response(
            StatusCode::BAD_REQUEST,
            format!("Maximum {} IPs allowed per request", max),
        ),
        GeoError::Provider(_) => {
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "Failed to get location")
        }
        GeoError::Store(e) => {
            tracing::error!("record store error: {}", e);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "Cache storage error")
        }
    }
}

// Handler functions

async fn health_handler(State(state): State<ApiState>) -> impl IntoResponse {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        provider: state.service.provider_name().to_string(),
    })
}

async fn metrics_handler(State(state): State<ApiState>) -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.export_prometheus(),
    )
}

async fn geolocate_handler(State(state): State<ApiState>, Path(ip): Path<String>) -> Response {
    match state.service.resolve(&ip).await {
        Ok((record, source)) => Json(ResolveResponse { record, source }).into_response(),
        Err(e) => geo_error_response(e),
    }
}

async fn bulk_handler(
    State(state): State<ApiState>,
    payload: Result<Json<BulkRequest>, JsonRejection>,
) -> Response {
    let Json(req) = match payload {
        Ok(payload) => payload,
        Err(rejection) => {
            tracing::debug!("rejected bulk request: {}", rejection);
            return error_response(StatusCode::BAD_REQUEST, "Invalid request format");
        }
    };

    match state.service.resolve_all(&req.ips).await {
        Ok(entries) => Json(BulkResponse {
            results: entries.into_iter().map(BulkResult::from).collect(),
        })
        .into_response(),
        Err(e) => geo_error_response(e),
    }
}

async fn cached_handler(State(state): State<ApiState>) -> Response {
    match state.service.list_recent().await {
        Ok(cached_ips) => {
            let count = cached_ips.len();
            Json(CachedListResponse { cached_ips, count }).into_response()
        }
        Err(e) => geo_error_response(e),
    }
}

async fn clear_one_handler(State(state): State<ApiState>, Path(ip): Path<String>) -> Response {
    match state.service.delete_one(&ip).await {
        Ok(true) => (
            StatusCode::OK,
            Json(serde_json::json!({
                "message": "Cache cleared for IP",
                "ip": ip
            })),
        )
            .into_response(),
        Ok(false) => error_response(StatusCode::NOT_FOUND, "IP not found in cache"),
        Err(e) => geo_error_response(e),
    }
}

async fn clear_all_handler(State(state): State<ApiState>) -> Response {
    match state.service.delete_all().await {
        Ok(rows_affected) => Json(serde_json::json!({
            "message": "All cache cleared",
            "rows_affected": rows_affected
        }))
        .into_response(),
        Err(e) => geo_error_response(e),
    }
}
