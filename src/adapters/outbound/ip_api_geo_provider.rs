//! ip-api.com Geo Provider
//!
//! Implements GeoProvider against the keyless ip-api.com JSON endpoint.

use crate::domain::errors::ProviderError;
use crate::domain::ports::GeoProvider;
use crate::domain::value_objects::normalize_country;
use async_trait::async_trait;
use serde::Deserialize;
use std::net::IpAddr;
use std::time::Duration;

/// ip-api.com connection configuration.
#[derive(Debug, Clone)]
pub struct IpApiConfig {
    /// Base URL (e.g., http://ip-api.com)
    pub base_url: String,
    /// Transport timeout for a single lookup
    pub timeout: Duration,
}

impl Default for IpApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://ip-api.com".to_string(),
            timeout: Duration::from_secs(10),
        }
    }
}

/// ip-api.com payload when queried with `fields=country`.
///
/// Failed queries come back as `{"status":"fail","message":...}`.
#[derive(Debug, Deserialize)]
struct IpApiResponse {
    #[serde(default)]
    country: Option<String>,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

/// Keyless fallback provider.
pub struct IpApiGeoProvider {
    config: IpApiConfig,
    client: reqwest::Client,
}

impl IpApiGeoProvider {
    pub fn new(config: IpApiConfig) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder().timeout(config.timeout).build()?;
        Ok(Self { config, client })
    }
}

#[async_trait]
impl GeoProvider for IpApiGeoProvider {
    async fn lookup(&self, ip: IpAddr) -> Result<String, ProviderError> {
        let url = format!("{}/json/{}", self.config.base_url.trim_end_matches('/'), ip);
        let response = self
            .client
            .get(&url)
            .query(&[("fields", "country")])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ProviderError::Status(status.as_u16()));
        }

        let body: IpApiResponse = response.json().await?;

        if body.status.as_deref() == Some("fail") {
            tracing::warn!("ip-api query failed for {}: {:?}", ip, body.message);
        }

        Ok(normalize_country(body.country))
    }

    fn name(&self) -> &'static str {
        "ip-api"
    }
}
