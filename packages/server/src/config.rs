use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

pub use common::config::DatabaseConfig;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct CorsConfig {
    /// Allowed origins. Empty means any origin.
    #[serde(default)]
    pub allow_origins: Vec<String>,
    /// Preflight cache lifetime in seconds. Default: 3600.
    #[serde(default = "default_cors_max_age")]
    pub max_age: u64,
}

fn default_cors_max_age() -> u64 {
    3600
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    /// Default: "127.0.0.1".
    #[serde(default = "default_host")]
    pub host: String,
    /// Default: 8080.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Upper bound on a single catalog query. Default: 30.
    #[serde(default = "default_query_timeout_secs")]
    pub query_timeout_secs: u64,
    #[serde(default)]
    pub cors: CorsConfig,
}

fn default_host() -> String {
    "127.0.0.1".into()
}
fn default_port() -> u16 {
    8080
}
fn default_query_timeout_secs() -> u64 {
    30
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            query_timeout_secs: default_query_timeout_secs(),
            cors: CorsConfig {
                allow_origins: Vec::new(),
                max_age: default_cors_max_age(),
            },
        }
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        let config_path =
            std::env::var("ZTFREF_CONFIG").unwrap_or_else(|_| "config/config".to_string());

        let s = Config::builder()
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 8080)?
            // Load from config/config.toml
            .add_source(File::with_name(&config_path).required(false))
            // Override from environment (e.g., ZTFREF__DATABASE__HOST)
            .add_source(Environment::with_prefix("ZTFREF").separator("__"))
            .build()?;

        s.try_deserialize()
    }
}
