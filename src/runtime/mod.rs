// ABOUTME: Orchestrator clients for Docker Swarm and Kubernetes.
// ABOUTME: Adapt bollard and kube to the deployer client traits.

mod bollard;
mod kube;

pub use self::bollard::BollardSwarmClient;
pub use self::kube::KubeClusterClient;
