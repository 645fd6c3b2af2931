// ABOUTME: Bollard-based swarm client for the Docker Engine service API.
// ABOUTME: Inspects services and submits versioned spec updates.

use crate::deployer::{DeployError, SwarmClient, SwarmService};
use async_trait::async_trait;
use bollard::Docker;
use bollard::models::ServiceSpec;
use bollard::query_parameters::{InspectServiceOptions, UpdateServiceOptionsBuilder};

// =============================================================================
// Error Mapping Helpers
// =============================================================================

/// Message swarm returns when the submitted version is stale.
const OUT_OF_SEQUENCE: &str = "update out of sequence";

pub(crate) fn map_service_error(e: bollard::errors::Error, name: &str) -> DeployError {
    match &e {
        bollard::errors::Error::DockerResponseServerError {
            status_code,
            message,
        } if *status_code == 404 => DeployError::NotFound(format!("service {}: {}", name, message)),
        bollard::errors::Error::DockerResponseServerError {
            status_code,
            message,
        } if *status_code == 409 || message.contains(OUT_OF_SEQUENCE) => {
            DeployError::Conflict(format!("service {}: {}", name, message))
        }
        _ => DeployError::Transport(e.to_string()),
    }
}

// =============================================================================
// BollardSwarmClient
// =============================================================================

/// Swarm client talking to a Docker daemon in swarm mode.
pub struct BollardSwarmClient {
    client: Docker,
}

impl BollardSwarmClient {
    pub fn new(client: Docker) -> Self {
        Self { client }
    }

    /// Connect using the environment (`DOCKER_HOST`), falling back to the local socket.
    pub fn connect() -> Result<Self, bollard::errors::Error> {
        Docker::connect_with_defaults().map(Self::new)
    }
}

#[async_trait]
impl SwarmClient for BollardSwarmClient {
    async fn fetch_service(&self, name: &str) -> Result<SwarmService, DeployError> {
        let service = self
            .client
            .inspect_service(name, None::<InspectServiceOptions>)
            .await
            .map_err(|e| map_service_error(e, name))?;

        let id = service
            .id
            .ok_or_else(|| DeployError::Transport(format!("service {} has no ID", name)))?;
        let version = service
            .version
            .and_then(|v| v.index)
            .ok_or_else(|| DeployError::Transport(format!("service {} has no version", name)))?;

        Ok(SwarmService {
            id,
            version,
            spec: service.spec.unwrap_or_default(),
        })
    }

    async fn submit_service_update(
        &self,
        id: &str,
        version: u64,
        spec: ServiceSpec,
    ) -> Result<(), DeployError> {
        let version = i32::try_from(version).map_err(|_| {
            DeployError::Transport(format!("service version {} out of range", version))
        })?;
        let options = UpdateServiceOptionsBuilder::default()
            .version(version)
            .build();

        let response = self
            .client
            .update_service(id, spec, options, None)
            .await
            .map_err(|e| map_service_error(e, id))?;

        for warning in response.warnings.unwrap_or_default() {
            tracing::warn!(service = id, "{}", warning);
        }

        Ok(())
    }
}
