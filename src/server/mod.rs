// ABOUTME: HTTP server exposing the deployment webhook.
// ABOUTME: Builds the axum router, binds the listener, and shuts down on signals.

mod auth;
mod error;
mod handler;

pub use auth::{TokenAuth, TokenAuthLayer};
pub use error::ApiError;
pub use handler::{UpdateParams, UpdateRequest, handle_update};

use crate::config::Config;
use crate::deployer::Deployer;
use crate::error::{Error, Result};
use axum::Router;
use axum::routing::any;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;

/// Build the router. `/update` sits behind token auth when a token is given.
pub fn router(deployer: Arc<dyn Deployer>, token: Option<&str>) -> Router {
    let router = Router::new().route("/update", any(handle_update));

    let router = match token {
        Some(token) => router.route_layer(TokenAuthLayer::new(token)),
        None => router,
    };

    router.with_state(deployer)
}

/// Serve the webhook until SIGINT or SIGTERM.
pub async fn serve(config: &Config, deployer: Arc<dyn Deployer>) -> Result<()> {
    let address = config.listen_address();
    let listener = TcpListener::bind(&address)
        .await
        .map_err(|source| Error::Bind {
            address: address.clone(),
            source,
        })?;

    if config.token.is_none() {
        tracing::warn!("no token configured, /update accepts unauthenticated requests");
    }
    tracing::info!("Starting server listening at {}", config.address);

    let app = router(deployer, config.token.as_deref());
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {}
        () = terminate => {}
    }

    tracing::info!("Shutdown signal received");
}
