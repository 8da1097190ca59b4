//! ipstack Geo Provider
//!
//! Implements GeoProvider against the credentialed ipstack API.

use crate::domain::errors::ProviderError;
use crate::domain::ports::GeoProvider;
use crate::domain::value_objects::normalize_country;
use async_trait::async_trait;
use serde::Deserialize;
use std::net::IpAddr;
use std::time::Duration;

/// ipstack connection configuration.
#[derive(Debug, Clone)]
pub struct IpStackConfig {
    /// Base URL (e.g., http://api.ipstack.com)
    pub base_url: String,
    /// Access key sent as `access_key`
    pub api_key: String,
    /// Transport timeout for a single lookup
    pub timeout: Duration,
}

impl IpStackConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            ..Default::default()
        }
    }
}

impl Default for IpStackConfig {
    fn default() -> Self {
        Self {
            base_url: "http://api.ipstack.com".to_string(),
            api_key: String::new(),
            timeout: Duration::from_secs(10),
        }
    }
}

/// Subset of the ipstack payload this service reads.
#[derive(Debug, Deserialize)]
struct IpStackResponse {
    #[serde(default)]
    country_name: Option<String>,
    /// Present when ipstack rejects the request with a 200 status
    #[serde(default)]
    error: Option<IpStackApiError>,
}

#[derive(Debug, Deserialize)]
struct IpStackApiError {
    #[serde(default)]
    code: Option<i64>,
    #[serde(default)]
    info: Option<String>,
}

/// ipstack-backed provider (primary, requires an access key).
pub struct IpStackGeoProvider {
    config: IpStackConfig,
    client: reqwest::Client,
}

impl IpStackGeoProvider {
    /// Create a provider with its own HTTP client.
    pub fn new(config: IpStackConfig) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder().timeout(config.timeout).build()?;
        Ok(Self { config, client })
    }

    fn lookup_url(&self, ip: IpAddr) -> String {
        format!(
            "{}/{}",
            self.config.base_url.trim_end_matches('/'),
            ip
        )
    }
}

#[async_trait]
impl GeoProvider for IpStackGeoProvider {
    async fn lookup(&self, ip: IpAddr) -> Result<String, ProviderError> {
        let response = self
            .client
            .get(self.lookup_url(ip))
            .query(&[("access_key", self.config.api_key.as_str())])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ProviderError::Status(status.as_u16()));
        }

        let body: IpStackResponse = response.json().await?;

        if let Some(err) = &body.error {
            tracing::warn!(
                "ipstack reported an error for {}: code={:?} info={:?}",
                ip,
                err.code,
                err.info
            );
        }

        Ok(normalize_country(body.country_name))
    }

    fn name(&self) -> &'static str {
        "ipstack"
    }
}
