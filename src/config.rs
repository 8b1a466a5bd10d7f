use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use tracing_subscriber::EnvFilter;
use validator::Validate;

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 8080;
const DEFAULT_LOG_LEVEL: &str = "info";
const DEFAULT_ACCESS_TOKEN_TTL_SECS: u64 = 3600;
const DEFAULT_REFRESH_TOKEN_TTL_SECS: u64 = 7 * 24 * 3600;
const DEFAULT_TOKEN_SWEEP_INTERVAL_SECS: u64 = 3600;
const CONFIG_DIR: &str = "config";

/// Application configuration, loaded from `config/` files overlaid with
/// `APP__`-prefixed environment variables.
#[derive(Clone, Debug, Deserialize, Validate)]
pub struct AppConfig {
    pub database_url: String,

    /// JWT signing secret.
    #[validate(length(min = 32))]
    pub jwt_secret: String,

    #[serde(default = "default_access_token_ttl")]
    pub access_token_ttl_secs: u64,

    #[serde(default = "default_refresh_token_ttl")]
    pub refresh_token_ttl_secs: u64,

    /// How often expired revoked tokens are swept from the database.
    #[serde(default = "default_token_sweep_interval")]
    pub token_sweep_interval_secs: u64,

    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Emit logs as JSON lines instead of human-readable text.
    #[serde(default)]
    pub log_json: bool,

    /// Run database migrations on startup.
    #[serde(default)]
    pub auto_migrate: bool,
}

fn default_host() -> String {
    DEFAULT_HOST.to_string()
}
fn default_port() -> u16 {
    DEFAULT_PORT
}
fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}
fn default_access_token_ttl() -> u64 {
    DEFAULT_ACCESS_TOKEN_TTL_SECS
}
fn default_refresh_token_ttl() -> u64 {
    DEFAULT_REFRESH_TOKEN_TTL_SECS
}
fn default_token_sweep_interval() -> u64 {
    DEFAULT_TOKEN_SWEEP_INTERVAL_SECS
}

impl AppConfig {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Loads configuration: `config/default` first, then an environment-specific
/// file named by `APP_ENV`, then `APP__` environment variables on top.
pub fn load_config() -> Result<AppConfig, ConfigError> {
    let env = std::env::var("APP_ENV").unwrap_or_else(|_| "development".to_string());

    let settings = Config::builder()
        .add_source(File::with_name(&format!("{CONFIG_DIR}/default")).required(false))
        .add_source(File::with_name(&format!("{CONFIG_DIR}/{env}")).required(false))
        .add_source(Environment::with_prefix("APP").separator("__"))
        .build()?;

    let config: AppConfig = settings.try_deserialize()?;
    config
        .validate()
        .map_err(|e| ConfigError::Message(format!("Invalid configuration: {e}")))?;
    Ok(config)
}

/// Installs the global tracing subscriber. `RUST_LOG` wins over the
/// configured level when set.
pub fn init_tracing(log_level: &str, json: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(log_level.to_string()));

    if json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_jwt_secret_is_rejected() {
        let config = AppConfig {
            database_url: "sqlite::memory:".to_string(),
            jwt_secret: "too-short".to_string(),
            access_token_ttl_secs: default_access_token_ttl(),
            refresh_token_ttl_secs: default_refresh_token_ttl(),
            token_sweep_interval_secs: default_token_sweep_interval(),
            host: default_host(),
            port: default_port(),
            log_level: default_log_level(),
            log_json: false,
            auto_migrate: false,
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn bind_addr_joins_host_and_port() {
        let config = AppConfig {
            database_url: "sqlite::memory:".to_string(),
            jwt_secret: "0123456789abcdef0123456789abcdef".to_string(),
            access_token_ttl_secs: 60,
            refresh_token_ttl_secs: 120,
            token_sweep_interval_secs: 30,
            host: "127.0.0.1".to_string(),
            port: 9000,
            log_level: "debug".to_string(),
            log_json: false,
            auto_migrate: true,
        };
        assert_eq!(config.bind_addr(), "127.0.0.1:9000");
    }
}
