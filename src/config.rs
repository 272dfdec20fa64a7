use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use tracing::info;
use validator::Validate;

const DEFAULT_ENV: &str = "development";
const CONFIG_DIR: &str = "config";

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_environment() -> String {
    DEFAULT_ENV.to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_max_connections() -> u32 {
    10
}

fn default_min_connections() -> u32 {
    1
}

fn default_connect_timeout() -> u64 {
    30
}

fn default_acquire_timeout() -> u64 {
    8
}

fn default_idle_timeout() -> u64 {
    600
}

fn default_event_buffer() -> usize {
    256
}

fn default_true() -> bool {
    true
}

/// Application configuration, layered from `config/default.toml`, an
/// environment-specific file, and `APP__*` environment variables.
#[derive(Clone, Debug, Deserialize, Validate)]
pub struct AppConfig {
    /// Database connection URL (postgres or sqlite).
    #[validate(length(min = 1))]
    pub database_url: String,

    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_environment")]
    pub environment: String,

    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default = "default_max_connections")]
    #[validate(range(min = 1, max = 100))]
    pub db_max_connections: u32,

    #[serde(default = "default_min_connections")]
    pub db_min_connections: u32,

    #[serde(default = "default_connect_timeout")]
    pub db_connect_timeout_secs: u64,

    /// Upper bound on waiting for a pooled connection; keeps storage calls
    /// from blocking indefinitely.
    #[serde(default = "default_acquire_timeout")]
    pub db_acquire_timeout_secs: u64,

    #[serde(default = "default_idle_timeout")]
    pub db_idle_timeout_secs: u64,

    /// Run embedded migrations on startup.
    #[serde(default = "default_true")]
    pub auto_migrate: bool,

    #[serde(default = "default_event_buffer")]
    pub event_buffer_size: usize,
}

impl AppConfig {
    /// Loads configuration for the environment named by `RUN_ENV`
    /// (default: development).
    pub fn load() -> Result<Self, ConfigError> {
        let env = std::env::var("RUN_ENV").unwrap_or_else(|_| DEFAULT_ENV.to_string());
        info!(environment = %env, "loading configuration");

        let config: AppConfig = Config::builder()
            .add_source(File::with_name(&format!("{}/default", CONFIG_DIR)).required(false))
            .add_source(File::with_name(&format!("{}/{}", CONFIG_DIR, env)).required(false))
            .add_source(Environment::with_prefix("APP").separator("__"))
            .build()?
            .try_deserialize()?;

        config
            .validate()
            .map_err(|e| ConfigError::Message(format!("invalid configuration: {}", e)))?;

        Ok(config)
    }

    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}
