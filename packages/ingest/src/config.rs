use config::{Config, ConfigError, Environment, File};
use reqwest::Url;
use serde::Deserialize;

pub use common::config::DatabaseConfig;
use common::file_ref::DEFAULT_BASE_URL;

/// Remote file server settings.
#[derive(Debug, Deserialize, Clone)]
pub struct SourceConfig {
    /// Root of the reference product tree. Default: the IRSA `products/ref/` URL.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Default: 30.
    #[serde(default = "default_head_timeout_secs")]
    pub head_timeout_secs: u64,
    /// Default: 120.
    #[serde(default = "default_download_timeout_secs")]
    pub download_timeout_secs: u64,
    /// Default: 60.
    #[serde(default = "default_listing_timeout_secs")]
    pub listing_timeout_secs: u64,
}

impl SourceConfig {
    /// `base_url` must be an absolute http(s) URL that file paths can be joined onto.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let url = Url::parse(&self.base_url)
            .map_err(|e| ConfigError::Message(format!("source.base_url {:?}: {e}", self.base_url)))?;
        if !matches!(url.scheme(), "http" | "https") || url.cannot_be_a_base() {
            return Err(ConfigError::Message(format!(
                "source.base_url {:?} is not an http(s) base URL",
                self.base_url
            )));
        }
        Ok(())
    }
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.into()
}
fn default_head_timeout_secs() -> u64 {
    30
}
fn default_download_timeout_secs() -> u64 {
    120
}
fn default_listing_timeout_secs() -> u64 {
    60
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            head_timeout_secs: default_head_timeout_secs(),
            download_timeout_secs: default_download_timeout_secs(),
            listing_timeout_secs: default_listing_timeout_secs(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct IngestConfig {
    /// Number of concurrent workers. Default: 10.
    #[serde(default = "default_workers")]
    pub workers: usize,
    /// Apply the schema before ingesting. Default: true.
    #[serde(default = "default_init_schema")]
    pub init_schema: bool,
}

fn default_workers() -> usize {
    10
}
fn default_init_schema() -> bool {
    true
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            workers: default_workers(),
            init_schema: default_init_schema(),
        }
    }
}

/// Ingest application configuration.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct IngestAppConfig {
    #[serde(default)]
    pub source: SourceConfig,
    #[serde(default)]
    pub ingest: IngestConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
}

impl IngestAppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        let config_path =
            std::env::var("ZTFREF_CONFIG").unwrap_or_else(|_| "config/config".to_string());

        let s = Config::builder()
            .set_default("source.base_url", DEFAULT_BASE_URL)?
            .set_default("ingest.workers", 10_i64)?
            .add_source(File::with_name(&config_path).required(false))
            .add_source(Environment::with_prefix("ZTFREF").separator("__"))
            .build()?;

        let config: Self = s.try_deserialize()?;
        config.source.validate()?;
        Ok(config)
    }
}
