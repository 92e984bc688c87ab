use std::collections::HashMap;
use std::env;
use std::path::Path;
use std::time::Duration;

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use thiserror::Error;
use tracing::info;
use validator::{Validate, ValidationError};

use crate::discovery::{HealthCheckSpec, ServiceEndpoint, ServiceRegistration};

/// Default values for configuration
const DEFAULT_LOG_LEVEL: &str = "info";
const DEFAULT_ENV: &str = "development";
const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_ADVERTISE_ADDRESS: &str = "127.0.0.1";
const DEFAULT_CART_PORT: u16 = 5001;
const DEFAULT_CHECKOUT_PORT: u16 = 5000;
const CONFIG_DIR: &str = "config";
const DEFAULT_DISCOVERY_BACKEND: &str = "consul";
const DEFAULT_CONSUL_URL: &str = "http://127.0.0.1:8500";
const DEFAULT_HEALTH_CHECK_INTERVAL_SECS: u64 = 5;
const DEFAULT_HEALTH_CHECK_TIMEOUT_SECS: u64 = 10;
const DEFAULT_DEREGISTER_AFTER_SECS: u64 = 30;
const DEFAULT_CHECKOUT_TIMEOUT_SECS: u64 = 10;

/// Service discovery configuration
#[derive(Clone, Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct DiscoveryConfig {
    /// Discovery backend to use: "consul" or "static"
    #[serde(default = "default_discovery_backend")]
    #[validate(custom = "validate_discovery_backend")]
    pub backend: String,

    /// Consul agent base URL
    #[serde(default = "default_consul_url")]
    pub consul_url: String,

    /// Fixed endpoints for the static backend, keyed by logical service name
    #[serde(default)]
    pub static_endpoints: HashMap<String, ServiceEndpoint>,

    /// Interval between registry health probes, in seconds
    #[serde(default = "default_health_check_interval")]
    #[validate(range(min = 1))]
    pub health_check_interval_secs: u64,

    /// Timeout for a single health probe, in seconds
    #[serde(default = "default_health_check_timeout")]
    #[validate(range(min = 1))]
    pub health_check_timeout_secs: u64,

    /// How long a critical instance stays registered before the registry
    /// drops it, in seconds
    #[serde(default = "default_deregister_after")]
    #[validate(range(min = 1))]
    pub deregister_after_secs: u64,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            backend: default_discovery_backend(),
            consul_url: default_consul_url(),
            static_endpoints: HashMap::new(),
            health_check_interval_secs: default_health_check_interval(),
            health_check_timeout_secs: default_health_check_timeout(),
            deregister_after_secs: default_deregister_after(),
        }
    }
}

/// Application configuration shared by both server binaries
#[derive(Clone, Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
    /// Bind address for the HTTP listeners
    #[serde(default = "default_host")]
    pub host: String,

    /// Address other services should use to reach this instance; this is
    /// what gets registered with the discovery backend
    #[serde(default = "default_advertise_address")]
    pub advertise_address: String,

    /// Cart service port
    #[serde(default = "default_cart_port")]
    pub cart_port: u16,

    /// Checkout service port
    #[serde(default = "default_checkout_port")]
    pub checkout_port: u16,

    /// Application environment
    #[serde(default = "default_environment")]
    pub environment: String,

    /// Logging level
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Log in JSON format (structured logging)
    #[serde(default)]
    pub log_json: bool,

    /// Logical name the cart service registers under
    #[serde(default = "default_cart_service_name")]
    pub cart_service_name: String,

    /// Logical name the checkout service registers under and the cart
    /// service resolves
    #[serde(default = "default_checkout_service_name")]
    pub checkout_service_name: String,

    /// Timeout for the outbound cart -> checkout call, in seconds. A timed
    /// out call has an unknown outcome; the idempotent ledger makes it safe
    /// for the caller to retry.
    #[serde(default = "default_checkout_timeout")]
    #[validate(range(min = 1, max = 300))]
    pub checkout_timeout_secs: u64,

    /// Whether the cart service exposes the entry-removal route
    #[serde(default = "default_expose_entry_removal")]
    pub expose_entry_removal: bool,

    /// Service discovery configuration
    #[serde(default)]
    #[validate]
    pub discovery: DiscoveryConfig,
}

fn default_host() -> String {
    DEFAULT_HOST.to_string()
}
fn default_advertise_address() -> String {
    DEFAULT_ADVERTISE_ADDRESS.to_string()
}
fn default_cart_port() -> u16 {
    DEFAULT_CART_PORT
}
fn default_checkout_port() -> u16 {
    DEFAULT_CHECKOUT_PORT
}
fn default_environment() -> String {
    DEFAULT_ENV.to_string()
}
fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}
fn default_cart_service_name() -> String {
    "cart".to_string()
}
fn default_checkout_service_name() -> String {
    "checkout".to_string()
}
fn default_checkout_timeout() -> u64 {
    DEFAULT_CHECKOUT_TIMEOUT_SECS
}
fn default_expose_entry_removal() -> bool {
    true
}
fn default_discovery_backend() -> String {
    DEFAULT_DISCOVERY_BACKEND.to_string()
}
fn default_consul_url() -> String {
    DEFAULT_CONSUL_URL.to_string()
}
fn default_health_check_interval() -> u64 {
    DEFAULT_HEALTH_CHECK_INTERVAL_SECS
}
fn default_health_check_timeout() -> u64 {
    DEFAULT_HEALTH_CHECK_TIMEOUT_SECS
}
fn default_deregister_after() -> u64 {
    DEFAULT_DEREGISTER_AFTER_SECS
}

fn validate_discovery_backend(backend: &str) -> Result<(), ValidationError> {
    match backend.to_ascii_lowercase().as_str() {
        "consul" | "static" => Ok(()),
        _ => {
            let mut err = ValidationError::new("backend");
            err.message = Some("discovery backend must be \"consul\" or \"static\"".into());
            Err(err)
        }
    }
}

impl AppConfig {
    pub fn log_level(&self) -> &str {
        &self.log_level
    }

    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }

    pub fn checkout_timeout(&self) -> Duration {
        Duration::from_secs(self.checkout_timeout_secs)
    }

    /// Builds the registration record for one of this process's services,
    /// advertising its health endpoint to the registry.
    pub fn registration_for(&self, service_name: &str, port: u16) -> ServiceRegistration {
        ServiceRegistration {
            name: service_name.to_string(),
            address: self.advertise_address.clone(),
            port,
            health_check: HealthCheckSpec {
                url: format!("http://{}:{}/healthcheck", self.advertise_address, port),
                interval: Duration::from_secs(self.discovery.health_check_interval_secs),
                timeout: Duration::from_secs(self.discovery.health_check_timeout_secs),
                deregister_after: Duration::from_secs(self.discovery.deregister_after_secs),
            },
        }
    }
}

/// Configuration loading errors
#[derive(Debug, Error)]
pub enum AppConfigError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("invalid configuration: {0}")]
    Validation(String),
}

/// Initializes tracing using the provided log level as the default filter
pub fn init_tracing(level: &str, json: bool) {
    use tracing_subscriber::fmt;

    let default_directive = format!("storefront_api={},tower_http=debug", level);
    let filter_directive = env::var("RUST_LOG")
        .ok()
        .filter(|s| !s.trim().is_empty())
        .unwrap_or(default_directive);

    if json {
        let _ = fmt().with_env_filter(filter_directive).json().try_init();
    } else {
        let _ = fmt().with_env_filter(filter_directive).try_init();
    }
}

/// Loads application configuration
///
/// Layers configuration sources in this order:
/// 1. Built-in defaults
/// 2. Default config (config/default.toml)
/// 3. Environment-specific config (config/{env}.toml)
/// 4. Environment variables (APP__*)
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

    let settings = Config::builder()
        .add_source(File::with_name(&format!("{}/default", CONFIG_DIR)).required(false))
        .add_source(File::with_name(&format!("{}/{}", CONFIG_DIR, run_env)).required(false))
        .add_source(Environment::with_prefix("APP").separator("__"))
        .build()?;

    let config: AppConfig = settings.try_deserialize()?;
    config
        .validate()
        .map_err(|e| AppConfigError::Validation(e.to_string()))?;

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use config::FileFormat;

    fn from_toml(raw: &str) -> Result<AppConfig, ConfigError> {
        Config::builder()
            .add_source(File::from_str(raw, FileFormat::Toml))
            .build()?
            .try_deserialize()
    }

    #[test]
    fn empty_config_uses_defaults() {
        let config = from_toml("").unwrap();
        assert_eq!(config.cart_port, 5001);
        assert_eq!(config.checkout_port, 5000);
        assert_eq!(config.checkout_service_name, "checkout");
        assert_eq!(config.discovery.backend, "consul");
        assert_eq!(config.checkout_timeout_secs, 10);
        assert!(config.expose_entry_removal);
        assert!(config.is_development());
        config.validate().unwrap();
    }

    #[test]
    fn nested_discovery_overrides_apply() {
        let config = from_toml(
            r#"
            [discovery]
            backend = "static"

            [discovery.static_endpoints.checkout]
            address = "10.0.0.7"
            port = 9000
            "#,
        )
        .unwrap();
        assert_eq!(config.discovery.backend, "static");
        let endpoint = &config.discovery.static_endpoints["checkout"];
        assert_eq!(endpoint.address, "10.0.0.7");
        assert_eq!(endpoint.port, 9000);
        config.validate().unwrap();
    }

    #[test]
    fn unknown_discovery_backend_fails_validation() {
        let config = from_toml("[discovery]\nbackend = \"zookeeper\"\n").unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn zero_checkout_timeout_fails_validation() {
        let config = from_toml("checkout_timeout_secs = 0\n").unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn registration_builds_health_check_url() {
        let config = from_toml("advertise_address = \"192.168.1.20\"\n").unwrap();
        let registration = config.registration_for("cart", config.cart_port);
        assert_eq!(registration.name, "cart");
        assert_eq!(registration.port, 5001);
        assert_eq!(
            registration.health_check.url,
            "http://192.168.1.20:5001/healthcheck"
        );
        assert_eq!(
            registration.health_check.interval,
            Duration::from_secs(5)
        );
    }
}
