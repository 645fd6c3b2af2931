// ABOUTME: Test support utilities.
// ABOUTME: Provides tracing setup and a recording deployer for HTTP tests.

use async_trait::async_trait;
use deployd::deployer::{DeployError, Deployer};
use parking_lot::Mutex;
use std::sync::{Arc, Once};

static TRACING_INIT: Once = Once::new();

/// Initialize tracing for tests. Safe to call multiple times.
#[allow(dead_code)]
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::EnvFilter;
        let filter = EnvFilter::from_default_env().add_directive("deployd=debug".parse().unwrap());
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .try_init()
            .ok();
    });
}

/// Deployer that records calls and answers with a fixed result.
#[allow(dead_code)]
#[derive(Clone, Default)]
pub struct RecordingDeployer {
    calls: Arc<Mutex<Vec<(String, String)>>>,
    failure: Option<DeployError>,
}

#[allow(dead_code)]
impl RecordingDeployer {
    pub fn failing(error: DeployError) -> Self {
        Self {
            failure: Some(error),
            ..Self::default()
        }
    }

    pub fn calls(&self) -> Vec<(String, String)> {
        self.calls.lock().clone()
    }
}

#[async_trait]
impl Deployer for RecordingDeployer {
    async fn update(&self, target: &str, image: &str) -> Result<(), DeployError> {
        self.calls
            .lock()
            .push((target.to_string(), image.to_string()));
        match &self.failure {
            Some(e) => Err(e.clone()),
            None => Ok(()),
        }
    }
}
