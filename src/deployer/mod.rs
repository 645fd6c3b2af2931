// ABOUTME: Deployer capability trait and its swarm and cluster implementations.
// ABOUTME: One update operation drives either backend; the registry picks one at startup.

mod cluster;
mod error;
mod registry;
mod retry;
mod swarm;

pub use cluster::{ClusterClient, ClusterDeployer, DEFAULT_NAMESPACE};
pub use error::{DeployError, DeployErrorKind};
pub use registry::{CLUSTER_MODE, ConnectError, Constructor, DeployerRegistry, SWARM_MODE};
pub use retry::{RetryPolicy, retry_on_conflict};
pub use swarm::{SwarmClient, SwarmDeployer, SwarmService};

use async_trait::async_trait;

/// Updates the image a named service runs.
#[async_trait]
pub trait Deployer: Send + Sync {
    /// Point `target` at `image`.
    ///
    /// Callers guarantee both arguments are non-empty. Every call fetches
    /// fresh state from the orchestrator; nothing is cached between calls.
    async fn update(&self, target: &str, image: &str) -> Result<(), DeployError>;
}
