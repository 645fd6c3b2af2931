// ABOUTME: Command-line interface definition using clap derive macros.
// ABOUTME: Flags override the config file and DEPLOYD_* environment variables.

use clap::Parser;
use deployd::config::{LogFormat, Overrides};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "deployd")]
#[command(about = "Deployment webhook that updates service images on Docker Swarm or Kubernetes")]
#[command(version)]
pub struct Cli {
    /// Path to a YAML config file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Listen address, host:port or :port [default: :7070]
    #[arg(short, long)]
    pub address: Option<String>,

    /// Token the Authorization header must equal (empty disables auth)
    #[arg(long)]
    pub token: Option<String>,

    /// Orchestrator backend: docker-swarm or cluster [default: docker-swarm]
    #[arg(short, long)]
    pub mode: Option<String>,

    /// Log output format: json or text [default: json]
    #[arg(long)]
    pub log_format: Option<LogFormat>,

    /// Enable debug logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    pub fn overrides(&self) -> Overrides {
        Overrides {
            address: self.address.clone(),
            token: self.token.clone(),
            mode: self.mode.clone(),
            log_format: self.log_format,
        }
    }
}
