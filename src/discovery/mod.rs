//! Service discovery. The rest of the crate only consumes the
//! `register`/`resolve` capability; which registry sits behind it is a
//! deployment decision.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::DiscoveryConfig;
use crate::errors::ServiceError;

pub mod consul;

pub use consul::ConsulDiscovery;

/// A reachable instance of a logical service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceEndpoint {
    pub address: String,
    pub port: u16,
}

impl ServiceEndpoint {
    pub fn base_url(&self) -> String {
        format!("http://{}:{}", self.address, self.port)
    }
}

/// Health probe the registry runs against a registered instance.
#[derive(Debug, Clone)]
pub struct HealthCheckSpec {
    pub url: String,
    pub interval: Duration,
    pub timeout: Duration,
    /// How long the instance may stay critical before the registry drops it
    pub deregister_after: Duration,
}

/// Everything a registry needs to advertise one service instance.
#[derive(Debug, Clone)]
pub struct ServiceRegistration {
    pub name: String,
    pub address: String,
    pub port: u16,
    pub health_check: HealthCheckSpec,
}

#[async_trait]
pub trait ServiceDiscovery: Send + Sync {
    /// Advertises this instance to the registry.
    async fn register(&self, registration: &ServiceRegistration) -> Result<(), ServiceError>;

    /// Resolves a logical service name to a reachable endpoint. A service
    /// with no live instance resolves to `Unavailable`, never a panic.
    async fn resolve(&self, service: &str) -> Result<ServiceEndpoint, ServiceError>;
}

/// Fixed name -> endpoint table. Used when the deployment wires addresses
/// by configuration instead of a live registry, and by tests.
#[derive(Debug, Clone, Default)]
pub struct StaticDiscovery {
    endpoints: HashMap<String, ServiceEndpoint>,
}

impl StaticDiscovery {
    pub fn new(endpoints: HashMap<String, ServiceEndpoint>) -> Self {
        Self { endpoints }
    }

    pub fn with_endpoint(mut self, service: impl Into<String>, endpoint: ServiceEndpoint) -> Self {
        self.endpoints.insert(service.into(), endpoint);
        self
    }
}

#[async_trait]
impl ServiceDiscovery for StaticDiscovery {
    async fn register(&self, registration: &ServiceRegistration) -> Result<(), ServiceError> {
        debug!(
            "Static discovery: skipping registration of '{}' at {}:{}",
            registration.name, registration.address, registration.port
        );
        Ok(())
    }

    async fn resolve(&self, service: &str) -> Result<ServiceEndpoint, ServiceError> {
        self.endpoints.get(service).cloned().ok_or_else(|| {
            ServiceError::Unavailable(format!(
                "no endpoint configured for service '{}'",
                service
            ))
        })
    }
}

/// Builds the discovery backend selected by configuration.
pub fn from_config(config: &DiscoveryConfig) -> Result<Arc<dyn ServiceDiscovery>, ServiceError> {
    match config.backend.to_ascii_lowercase().as_str() {
        "consul" => Ok(Arc::new(ConsulDiscovery::new(&config.consul_url)?)),
        "static" => Ok(Arc::new(StaticDiscovery::new(
            config.static_endpoints.clone(),
        ))),
        other => Err(ServiceError::InvalidInput(format!(
            "unknown discovery backend '{}'",
            other
        ))),
    }
}
