//! Startup orchestration.
//!
//! # Responsibilities
//! - Initialize subsystems in dependency order
//! - Register every route before the listener accepts anything
//! - Bind the listener and run the server until shutdown
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - Subsystems initialize in order, not concurrently
//! - Listener binds last (traffic only when ready)

use std::net::SocketAddr;

use thiserror::Error;

use crate::config::ServerConfig;
use crate::handlers::register_defaults;
use crate::http::HttpServer;
use crate::lifecycle::Shutdown;
use crate::net::{Listener, ListenerError};
use crate::observability::metrics::init_metrics;
use crate::routing::{RouteError, Router};

/// Errors that abort startup.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("route registration failed: {0}")]
    Routes(#[from] RouteError),

    #[error(transparent)]
    Listener(#[from] ListenerError),

    #[error("metrics exporter failed: {0}")]
    Metrics(#[from] metrics_exporter_prometheus::BuildError),

    #[error("invalid metrics address {0:?}")]
    MetricsAddress(String),
}

/// Build the route registry for a configuration.
pub fn build_router(config: &ServerConfig) -> Result<Router, RouteError> {
    let mut router = Router::new();
    register_defaults(&mut router, config.files.directory.clone())?;
    Ok(router)
}

/// Bring the server up and run it until `shutdown` fires.
///
/// `config` must already be validated.
pub async fn start(config: ServerConfig, shutdown: &Shutdown) -> Result<(), StartupError> {
    if config.observability.metrics_enabled {
        let addr: SocketAddr = config
            .observability
            .metrics_address
            .parse()
            .map_err(|_| StartupError::MetricsAddress(config.observability.metrics_address.clone()))?;
        init_metrics(addr)?;
    }

    let router = build_router(&config)?;
    if let Some(dir) = &config.files.directory {
        tracing::info!(directory = ?dir, "Serving files");
    }

    let listener = Listener::bind(&config.listener).await?;
    let server = HttpServer::new(&config, router);
    server.run(listener, shutdown.subscribe()).await;
    Ok(())
}
