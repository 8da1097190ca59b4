use serde::Deserialize;

/// Record store backend selected at startup.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum StoreKind {
    #[default]
    Sqlite,
    Memory,
}

impl StoreKind {
    fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "sqlite" => Some(Self::Sqlite),
            "memory" => Some(Self::Memory),
            _ => None,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    // Server settings
    pub listen_addr: String,
    pub debug: bool,

    // Record store settings
    pub store: StoreKind,
    pub db_path: String,

    // Provider settings
    pub ipstack_api_key: Option<String>,
    pub ipstack_base_url: String,
    pub ipapi_base_url: String,
    pub provider_timeout_secs: u64,

    // Batch settings
    pub batch_concurrency: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:8080".to_string(),
            debug: false,
            store: StoreKind::Sqlite,
            db_path: "geolocation.db".to_string(),
            ipstack_api_key: None,
            ipstack_base_url: "http://api.ipstack.com".to_string(),
            ipapi_base_url: "http://ip-api.com".to_string(),
            provider_timeout_secs: 10,
            batch_concurrency: 1,
        }
    }
}

pub fn load_config() -> anyhow::Result<Config> {
    Ok(config_from(|key| std::env::var(key).ok()))
}

/// Build a config from a variable lookup, falling back to defaults for
/// anything missing or unparseable.
fn config_from<F>(var: F) -> Config
where
    F: Fn(&str) -> Option<String>,
{
    let defaults = Config::default();

    let listen_addr = var("GEO_LISTEN_ADDR")
        .or_else(|| var("PORT").map(|port| format!("0.0.0.0:{}", port.trim())))
        .unwrap_or(defaults.listen_addr);

    let debug = var("DEBUG").is_some();

    let store = var("GEO_STORE")
        .and_then(|v| StoreKind::parse(&v))
        .unwrap_or(defaults.store);

    let db_path = var("GEO_DB_PATH").unwrap_or(defaults.db_path);

    let ipstack_api_key = var("GEO_IPSTACK_API_KEY").filter(|k| !k.trim().is_empty());

    let ipstack_base_url = var("GEO_IPSTACK_BASE_URL").unwrap_or(defaults.ipstack_base_url);

    let ipapi_base_url = var("GEO_IPAPI_BASE_URL").unwrap_or(defaults.ipapi_base_url);

    let provider_timeout_secs = var("GEO_PROVIDER_TIMEOUT_SECS")
        .and_then(|v| v.parse().ok())
        .unwrap_or(defaults.provider_timeout_secs);

    let batch_concurrency = var("GEO_BATCH_CONCURRENCY")
        .and_then(|v| v.parse::<usize>().ok())
        .unwrap_or(defaults.batch_concurrency)
        .max(1);

    Config {
        listen_addr,
        debug,
        store,
        db_path,
        ipstack_api_key,
        ipstack_base_url,
        ipapi_base_url,
        provider_timeout_secs,
        batch_concurrency,
    }
}
