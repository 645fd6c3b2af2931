// ABOUTME: Error types for deployer update operations.
// ABOUTME: Distinguishes not-found, conflict, transport, and missing-container failures.

/// Errors that can occur while updating a service image.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DeployError {
    /// The target service or deployment does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// The resource changed between fetch and submit.
    #[error("conflict: {0}")]
    Conflict(String),

    /// Network or API failure unrelated to concurrency.
    #[error("{0}")]
    Transport(String),

    /// The deployment has no container with the target's name.
    #[error("couldn't find container spec with name: {0}")]
    ContainerNotFound(String),
}

/// Error kind for programmatic handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeployErrorKind {
    NotFound,
    Conflict,
    Transport,
    ContainerNotFound,
}

impl DeployError {
    /// Returns the error kind for programmatic handling.
    pub fn kind(&self) -> DeployErrorKind {
        match self {
            DeployError::NotFound(_) => DeployErrorKind::NotFound,
            DeployError::Conflict(_) => DeployErrorKind::Conflict,
            DeployError::Transport(_) => DeployErrorKind::Transport,
            DeployError::ContainerNotFound(_) => DeployErrorKind::ContainerNotFound,
        }
    }

    /// Whether this is an optimistic-concurrency failure.
    pub fn is_conflict(&self) -> bool {
        matches!(self, DeployError::Conflict(_))
    }
}
