// ABOUTME: Swarm-mode deployer that rewrites a service's container image.
// ABOUTME: Single conditional write against the service version; conflicts are not retried.

use super::{DeployError, Deployer};
use async_trait::async_trait;
use bollard::models::ServiceSpec;

/// A swarm service as read from the orchestrator.
#[derive(Debug, Clone, PartialEq)]
pub struct SwarmService {
    /// Service ID.
    pub id: String,
    /// Version index the update is conditioned on.
    pub version: u64,
    /// Full service specification.
    pub spec: ServiceSpec,
}

/// Service operations the swarm deployer needs from the orchestrator.
#[async_trait]
pub trait SwarmClient: Send + Sync {
    /// Look up a service by name or ID.
    async fn fetch_service(&self, name: &str) -> Result<SwarmService, DeployError>;

    /// Replace a service's spec, failing if it moved past `version`.
    async fn submit_service_update(
        &self,
        id: &str,
        version: u64,
        spec: ServiceSpec,
    ) -> Result<(), DeployError>;
}

/// Deployer for swarm services.
pub struct SwarmDeployer<C> {
    client: C,
}

impl<C: SwarmClient> SwarmDeployer<C> {
    pub fn new(client: C) -> Self {
        Self { client }
    }
}

#[async_trait]
impl<C: SwarmClient> Deployer for SwarmDeployer<C> {
    async fn update(&self, target: &str, image: &str) -> Result<(), DeployError> {
        let service = self.client.fetch_service(target).await?;
        tracing::debug!(
            service = target,
            id = %service.id,
            version = service.version,
            "fetched swarm service"
        );

        let spec = with_image(service.spec, image);
        self.client
            .submit_service_update(&service.id, service.version, spec)
            .await
    }
}

/// Set the task template's container image, leaving the rest of the spec intact.
fn with_image(mut spec: ServiceSpec, image: &str) -> ServiceSpec {
    let container = spec
        .task_template
        .get_or_insert_with(Default::default)
        .container_spec
        .get_or_insert_with(Default::default);
    container.image = Some(image.to_string());
    spec
}
