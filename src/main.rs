// ABOUTME: Entry point for the deployd webhook server.
// ABOUTME: Loads config, connects the configured deployer, and serves /update.

mod cli;

use clap::Parser;
use cli::Cli;
use deployd::config::{Config, LogFormat};
use deployd::deployer::DeployerRegistry;
use deployd::error::Result;
use deployd::server;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match Config::resolve(cli.config.as_deref(), cli.overrides()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    };

    init_tracing(cli.verbose, config.log_format);

    if let Err(e) = run(config).await {
        tracing::error!(error = %e, "deployd failed");
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

/// Install the global subscriber. `RUST_LOG` takes precedence over `--verbose`.
fn init_tracing(verbose: bool, format: LogFormat) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr);

    match format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Text => builder.init(),
    }
}

async fn run(config: Config) -> Result<()> {
    let registry = DeployerRegistry::default();
    let deployer = registry.connect(&config.mode).await?;

    server::serve(&config, Arc::from(deployer)).await
}
