// ABOUTME: Kubernetes cluster client backed by the kube crate.
// ABOUTME: Reads and replaces apps/v1 Deployments, reporting 409s as conflicts.

use crate::deployer::{ClusterClient, DEFAULT_NAMESPACE, DeployError};
use async_trait::async_trait;
use k8s_openapi::api::apps::v1::Deployment;
use kube::Client;
use kube::api::{Api, PostParams};

fn map_deployment_error(e: kube::Error, name: &str) -> DeployError {
    match &e {
        kube::Error::Api(response) if response.code == 404 => {
            DeployError::NotFound(format!("deployment {}: {}", name, response.message))
        }
        kube::Error::Api(response) if response.code == 409 => {
            DeployError::Conflict(format!("deployment {}: {}", name, response.message))
        }
        _ => DeployError::Transport(e.to_string()),
    }
}

/// Cluster client using the ambient Kubernetes configuration.
pub struct KubeClusterClient {
    client: Client,
}

impl KubeClusterClient {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Connect with in-cluster configuration, or the local kubeconfig outside a cluster.
    pub async fn connect() -> Result<Self, kube::Error> {
        Client::try_default().await.map(Self::new)
    }

    fn deployments(&self, namespace: &str) -> Api<Deployment> {
        Api::namespaced(self.client.clone(), namespace)
    }
}

#[async_trait]
impl ClusterClient for KubeClusterClient {
    async fn fetch_deployment(
        &self,
        name: &str,
        namespace: &str,
    ) -> Result<Deployment, DeployError> {
        self.deployments(namespace)
            .get(name)
            .await
            .map_err(|e| map_deployment_error(e, name))
    }

    async fn submit_deployment_update(&self, deployment: &Deployment) -> Result<(), DeployError> {
        let name = deployment
            .metadata
            .name
            .as_deref()
            .ok_or_else(|| DeployError::Transport("deployment has no name".to_string()))?;
        let namespace = deployment
            .metadata
            .namespace
            .as_deref()
            .unwrap_or(DEFAULT_NAMESPACE);

        self.deployments(namespace)
            .replace(name, &PostParams::default(), deployment)
            .await
            .map_err(|e| map_deployment_error(e, name))?;

        Ok(())
    }
}
