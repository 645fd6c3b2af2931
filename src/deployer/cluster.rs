// ABOUTME: Cluster-mode deployer that sets one container's image in a deployment.
// ABOUTME: Each attempt re-fetches the deployment; version conflicts are retried.

use super::retry::{RetryPolicy, retry_on_conflict};
use super::{DeployError, Deployer};
use async_trait::async_trait;
use k8s_openapi::api::apps::v1::Deployment;

/// Namespace deployments are looked up in.
pub const DEFAULT_NAMESPACE: &str = "default";

/// Deployment operations the cluster deployer needs from the orchestrator.
///
/// Implementations must report a stale-version rejection as
/// [`DeployError::Conflict`] so it can be told apart from other failures.
#[async_trait]
pub trait ClusterClient: Send + Sync {
    /// Fetch a deployment by name.
    async fn fetch_deployment(
        &self,
        name: &str,
        namespace: &str,
    ) -> Result<Deployment, DeployError>;

    /// Replace a deployment with the given (previously fetched) resource.
    async fn submit_deployment_update(&self, deployment: &Deployment) -> Result<(), DeployError>;
}

/// Deployer for cluster deployments.
///
/// The container whose name equals the target is the one updated, so a
/// deployment `api` is expected to run a container named `api`.
pub struct ClusterDeployer<C> {
    client: C,
    policy: RetryPolicy,
}

impl<C: ClusterClient> ClusterDeployer<C> {
    pub fn new(client: C) -> Self {
        Self {
            client,
            policy: RetryPolicy::default(),
        }
    }

    /// Replace the conflict retry schedule.
    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    async fn try_update(&self, target: &str, image: &str) -> Result<(), DeployError> {
        let mut deployment = self.client.fetch_deployment(target, DEFAULT_NAMESPACE).await?;
        set_container_image(&mut deployment, target, image)?;
        self.client.submit_deployment_update(&deployment).await
    }
}

#[async_trait]
impl<C: ClusterClient> Deployer for ClusterDeployer<C> {
    async fn update(&self, target: &str, image: &str) -> Result<(), DeployError> {
        retry_on_conflict(&self.policy, DeployError::is_conflict, || {
            self.try_update(target, image)
        })
        .await
    }
}

/// Point the first container named `container` at `image`.
fn set_container_image(
    deployment: &mut Deployment,
    container: &str,
    image: &str,
) -> Result<(), DeployError> {
    let found = deployment
        .spec
        .as_mut()
        .and_then(|spec| spec.template.spec.as_mut())
        .and_then(|pod| pod.containers.iter_mut().find(|c| c.name == container));

    match found {
        Some(c) => {
            c.image = Some(image.to_string());
            Ok(())
        }
        None => Err(DeployError::ContainerNotFound(container.to_string())),
    }
}
