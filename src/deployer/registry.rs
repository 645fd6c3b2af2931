// ABOUTME: Registry mapping mode identifiers to deployer constructors.
// ABOUTME: Exactly one mode is connected at startup; unknown modes are rejected.

use super::{ClusterDeployer, Deployer, SwarmDeployer};
use crate::runtime::{BollardSwarmClient, KubeClusterClient};
use futures::FutureExt;
use futures::future::BoxFuture;
use snafu::{ResultExt, Snafu};
use std::collections::BTreeMap;

/// Mode identifier for Docker Swarm services.
pub const SWARM_MODE: &str = "docker-swarm";

/// Mode identifier for Kubernetes deployments.
pub const CLUSTER_MODE: &str = "cluster";

/// Zero-argument constructor for a deployer.
pub type Constructor = fn() -> BoxFuture<'static, Result<Box<dyn Deployer>, ConnectError>>;

/// Failure to build the configured deployer.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum ConnectError {
    #[snafu(display("unknown mode {mode:?} (expected one of: {known})"))]
    UnknownMode { mode: String, known: String },

    #[snafu(display("failed to connect to Docker: {source}"))]
    Docker { source: bollard::errors::Error },

    #[snafu(display("failed to connect to Kubernetes: {source}"))]
    Kubernetes { source: kube::Error },
}

/// Maps mode identifiers to constructors.
pub struct DeployerRegistry {
    constructors: BTreeMap<&'static str, Constructor>,
}

impl DeployerRegistry {
    /// A registry with no modes.
    pub fn empty() -> Self {
        Self {
            constructors: BTreeMap::new(),
        }
    }

    /// Register `constructor` under `mode`, replacing any previous entry.
    pub fn register(&mut self, mode: &'static str, constructor: Constructor) {
        self.constructors.insert(mode, constructor);
    }

    pub fn contains(&self, mode: &str) -> bool {
        self.constructors.contains_key(mode)
    }

    /// Registered mode identifiers in sorted order.
    pub fn modes(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.constructors.keys().copied()
    }

    /// Build the deployer registered under `mode`.
    pub async fn connect(&self, mode: &str) -> Result<Box<dyn Deployer>, ConnectError> {
        let constructor = self.constructors.get(mode).ok_or_else(|| {
            UnknownModeSnafu {
                mode,
                known: self.modes().collect::<Vec<_>>().join(", "),
            }
            .build()
        })?;

        tracing::info!(mode, "connecting deployer");
        constructor().await
    }
}

impl Default for DeployerRegistry {
    /// Swarm and cluster modes, plus the `docker` and `kubernetes` aliases.
    fn default() -> Self {
        let mut registry = Self::empty();
        registry.register(SWARM_MODE, connect_swarm);
        registry.register("docker", connect_swarm);
        registry.register(CLUSTER_MODE, connect_cluster);
        registry.register("kubernetes", connect_cluster);
        registry
    }
}

fn connect_swarm() -> BoxFuture<'static, Result<Box<dyn Deployer>, ConnectError>> {
    async {
        let client = BollardSwarmClient::connect().context(DockerSnafu)?;
        Ok(Box::new(SwarmDeployer::new(client)) as Box<dyn Deployer>)
    }
    .boxed()
}

fn connect_cluster() -> BoxFuture<'static, Result<Box<dyn Deployer>, ConnectError>> {
    async {
        let client = KubeClusterClient::connect().await.context(KubernetesSnafu)?;
        Ok(Box::new(ClusterDeployer::new(client)) as Box<dyn Deployer>)
    }
    .boxed()
}
