use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use super::{ServiceDiscovery, ServiceEndpoint, ServiceRegistration};
use crate::errors::ServiceError;

const CONSUL_CLIENT_TIMEOUT: Duration = Duration::from_secs(5);

/// Discovery backend over the Consul HTTP API: registration through the
/// local agent, resolution through the catalog.
#[derive(Debug, Clone)]
pub struct ConsulDiscovery {
    client: reqwest::Client,
    base_url: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct RegisterPayload<'a> {
    name: &'a str,
    address: &'a str,
    port: u16,
    check: CheckPayload,
}

#[derive(Debug, Serialize)]
struct CheckPayload {
    #[serde(rename = "HTTP")]
    http: String,
    #[serde(rename = "Interval")]
    interval: String,
    #[serde(rename = "Timeout")]
    timeout: String,
    #[serde(rename = "DeregisterCriticalServiceAfter")]
    deregister_critical_service_after: String,
}

#[derive(Debug, Deserialize)]
struct CatalogService {
    #[serde(default, rename = "Address")]
    address: String,
    #[serde(default, rename = "ServiceAddress")]
    service_address: String,
    #[serde(rename = "ServicePort")]
    service_port: u16,
}

fn format_secs(duration: Duration) -> String {
    format!("{}s", duration.as_secs())
}

impl ConsulDiscovery {
    pub fn new(base_url: &str) -> Result<Self, ServiceError> {
        let client = reqwest::Client::builder()
            .timeout(CONSUL_CLIENT_TIMEOUT)
            .build()
            .map_err(|e| {
                ServiceError::Unavailable(format!("failed to build consul client: {}", e))
            })?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl ServiceDiscovery for ConsulDiscovery {
    #[instrument(skip(self, registration), fields(service = %registration.name))]
    async fn register(&self, registration: &ServiceRegistration) -> Result<(), ServiceError> {
        let payload = RegisterPayload {
            name: &registration.name,
            address: &registration.address,
            port: registration.port,
            check: CheckPayload {
                http: registration.health_check.url.clone(),
                interval: format_secs(registration.health_check.interval),
                timeout: format_secs(registration.health_check.timeout),
                deregister_critical_service_after: format_secs(
                    registration.health_check.deregister_after,
                ),
            },
        };

        let url = format!("{}/v1/agent/service/register", self.base_url);
        let response = self
            .client
            .put(&url)
            .json(&payload)
            .send()
            .await
            .map_err(|e| {
                ServiceError::Unavailable(format!("consul registration failed: {}", e))
            })?;

        if !response.status().is_success() {
            return Err(ServiceError::Unavailable(format!(
                "consul registration failed with status {}",
                response.status()
            )));
        }

        info!(
            "Registered '{}' at {}:{} with consul",
            registration.name, registration.address, registration.port
        );
        Ok(())
    }

    #[instrument(skip(self))]
    async fn resolve(&self, service: &str) -> Result<ServiceEndpoint, ServiceError> {
        let url = format!("{}/v1/catalog/service/{}", self.base_url, service);
        let instances: Vec<CatalogService> = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| ServiceError::Unavailable(format!("consul lookup failed: {}", e)))?
            .error_for_status()
            .map_err(|e| ServiceError::Unavailable(format!("consul lookup failed: {}", e)))?
            .json()
            .await
            .map_err(|e| {
                ServiceError::Unavailable(format!("malformed consul catalog response: {}", e))
            })?;

        let instance = instances.into_iter().next().ok_or_else(|| {
            ServiceError::Unavailable(format!("no instance of '{}' registered", service))
        })?;

        // The catalog leaves ServiceAddress empty when the service runs on
        // the node address.
        let address = if instance.service_address.is_empty() {
            instance.address
        } else {
            instance.service_address
        };

        let endpoint = ServiceEndpoint {
            address,
            port: instance.service_port,
        };
        debug!("Resolved '{}' to {}", service, endpoint.base_url());
        Ok(endpoint)
    }
}
