use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::env;
use std::path::Path;
use thiserror::Error;
use tracing::{error, info};
use validator::{Validate, ValidationErrors};

/// Default values for configuration
const DEFAULT_LOG_LEVEL: &str = "info";
const DEFAULT_ENV: &str = "development";
const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 8080;
const CONFIG_DIR: &str = "config";
const DEFAULT_VENDOR_TIMEOUT_SECS: u64 = 30;
const DEFAULT_CART_STORAGE_PATH: &str = "data/cart.json";
const DEFAULT_PRINTIFY_BASE_URL: &str = "https://api.printify.com/v1";
const DEFAULT_PRINTFUL_BASE_URL_V1: &str = "https://api.printful.com";
const DEFAULT_PRINTFUL_BASE_URL_V2: &str = "https://api.printful.com/v2";

/// Printify vendor API configuration.
#[derive(Clone, Debug, Deserialize, Validate)]
pub struct PrintifyConfig {
    /// Bearer token for the Printify REST API
    #[validate(length(min = 1))]
    pub api_key: String,

    /// Shop whose product catalog is exposed
    #[validate(length(min = 1))]
    pub shop_id: String,

    #[serde(default = "default_printify_base_url")]
    pub base_url: String,

    /// Per-request timeout in seconds
    #[serde(default = "default_vendor_timeout_secs")]
    pub timeout_secs: u64,
}

/// Printful vendor API configuration.
///
/// Printful needs two base URLs: the legacy v1 API carries the rich sync
/// variant detail (files, options) that the v2 catalog API does not.
#[derive(Clone, Debug, Deserialize, Validate)]
pub struct PrintfulConfig {
    /// Bearer token for the Printful REST API
    #[validate(length(min = 1))]
    pub api_key: String,

    /// Store id used to scope the shared catalog listing
    #[validate(range(min = 1))]
    pub store_id: u64,

    #[serde(default = "default_printful_base_url_v1")]
    pub base_url_v1: String,

    #[serde(default = "default_printful_base_url_v2")]
    pub base_url_v2: String,

    /// Per-request timeout in seconds
    #[serde(default = "default_vendor_timeout_secs")]
    pub timeout_secs: u64,
}

/// Application configuration structure with validation
#[derive(Clone, Debug, Deserialize, Validate)]
pub struct AppConfig {
    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Application environment
    #[serde(default = "default_environment")]
    pub environment: String,

    /// Logging level
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Log in JSON format (structured logging)
    #[serde(default)]
    pub log_json: bool,

    #[validate]
    pub printify: PrintifyConfig,

    #[validate]
    pub printful: PrintfulConfig,

    /// Path of the persisted cart snapshot
    #[serde(default = "default_cart_storage_path")]
    pub cart_storage_path: String,

    /// CORS: comma-separated list of allowed origins; unset falls back to
    /// a permissive policy suitable for development
    #[serde(default)]
    pub cors_allowed_origins: Option<String>,
}

fn default_host() -> String {
    DEFAULT_HOST.to_string()
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_environment() -> String {
    DEFAULT_ENV.to_string()
}

fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}

fn default_vendor_timeout_secs() -> u64 {
    DEFAULT_VENDOR_TIMEOUT_SECS
}

fn default_cart_storage_path() -> String {
    DEFAULT_CART_STORAGE_PATH.to_string()
}

fn default_printify_base_url() -> String {
    DEFAULT_PRINTIFY_BASE_URL.to_string()
}

fn default_printful_base_url_v1() -> String {
    DEFAULT_PRINTFUL_BASE_URL_V1.to_string()
}

fn default_printful_base_url_v2() -> String {
    DEFAULT_PRINTFUL_BASE_URL_V2.to_string()
}

#[derive(Debug, Error)]
pub enum AppConfigError {
    #[error("configuration error: {0}")]
    Load(#[from] ConfigError),

    #[error("configuration validation error: {0}")]
    Validation(#[from] ValidationErrors),
}

/// Loads configuration from defaults, optional `config/{env}` files, and
/// `APP__`-prefixed environment variables (e.g. `APP__PRINTIFY__API_KEY`).
pub fn load_config() -> Result<AppConfig, AppConfigError> {
    let run_env = env::var("RUN_ENV")
        .or_else(|_| env::var("APP_ENV"))
        .unwrap_or_else(|_| DEFAULT_ENV.to_string());
    info!("Loading configuration for environment: {}", run_env);

    if !Path::new(CONFIG_DIR).exists() {
        info!(
            "Config directory '{}' not found; relying on built-in defaults and environment variables",
            CONFIG_DIR
        );
    }

    let config = Config::builder()
        .set_default("host", DEFAULT_HOST)?
        .set_default("port", DEFAULT_PORT as i64)?
        .set_default("environment", DEFAULT_ENV)?
        .set_default("log_level", DEFAULT_LOG_LEVEL)?
        .set_default("log_json", false)?
        .set_default("cart_storage_path", DEFAULT_CART_STORAGE_PATH)?
        .add_source(File::with_name(&format!("{}/default", CONFIG_DIR)).required(false))
        .add_source(File::with_name(&format!("{}/{}", CONFIG_DIR, run_env)).required(false))
        .add_source(Environment::with_prefix("APP").separator("__"))
        .build()?;

    // Vendor credentials have no defaults; fail early with a clear message
    // instead of a generic deserialization error.
    if config.get_string("printify.api_key").is_err() {
        error!("Printify API key is not configured. Set APP__PRINTIFY__API_KEY (and APP__PRINTIFY__SHOP_ID).");
        return Err(AppConfigError::Load(ConfigError::NotFound(
            "printify.api_key is required but not configured".into(),
        )));
    }
    if config.get_string("printful.api_key").is_err() {
        error!("Printful API key is not configured. Set APP__PRINTFUL__API_KEY (and APP__PRINTFUL__STORE_ID).");
        return Err(AppConfigError::Load(ConfigError::NotFound(
            "printful.api_key is required but not configured".into(),
        )));
    }

    let app_config: AppConfig = config.try_deserialize()?;

    app_config.validate().map_err(|e| {
        error!("Configuration validation failed: {:?}", e);
        AppConfigError::Validation(e)
    })?;

    Ok(app_config)
}

/// Initializes the tracing subscriber. `RUST_LOG` overrides the configured
/// level when set.
pub fn init_tracing(level: &str, json: bool) {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let default_directive = format!("pod_storefront={},tower_http=debug", level);
    let filter_directive = env::var("RUST_LOG")
        .ok()
        .filter(|s| !s.trim().is_empty())
        .unwrap_or(default_directive);
    let filter = EnvFilter::new(filter_directive);

    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer())
            .init();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn printify_config() -> PrintifyConfig {
        PrintifyConfig {
            api_key: "test-key".to_string(),
            shop_id: "shop-1".to_string(),
            base_url: default_printify_base_url(),
            timeout_secs: DEFAULT_VENDOR_TIMEOUT_SECS,
        }
    }

    fn printful_config() -> PrintfulConfig {
        PrintfulConfig {
            api_key: "test-key".to_string(),
            store_id: 16386751,
            base_url_v1: default_printful_base_url_v1(),
            base_url_v2: default_printful_base_url_v2(),
            timeout_secs: DEFAULT_VENDOR_TIMEOUT_SECS,
        }
    }

    #[test]
    fn valid_config_passes_validation() {
        let cfg = AppConfig {
            host: default_host(),
            port: default_port(),
            environment: default_environment(),
            log_level: default_log_level(),
            log_json: false,
            printify: printify_config(),
            printful: printful_config(),
            cart_storage_path: default_cart_storage_path(),
            cors_allowed_origins: None,
        };
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn empty_api_key_fails_validation() {
        let mut cfg = printify_config();
        cfg.api_key = String::new();
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn zero_store_id_fails_validation() {
        let mut cfg = printful_config();
        cfg.store_id = 0;
        assert!(cfg.validate().is_err());
    }
}
