//! HTTP server: accept loop and connection task spawning.
//!
//! # Responsibilities
//! - Accept connections from the bounded listener
//! - Spawn one independent task per connection
//! - Share the immutable route registry with every task
//! - Stop accepting on shutdown and drain in-flight connections
//!
//! # Design Decisions
//! - No shared mutable per-request state; the router is behind an `Arc`
//! - Accept failures are logged and the loop keeps going
//! - Connection failures are logged inside their task and never reach the loop
//! - Draining is bounded by `timeouts.shutdown_grace_secs`; stragglers are abandoned

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast;
use tracing::Instrument;

use crate::config::ServerConfig;
use crate::net::connection::{serve_connection, ConnectionSettings, ConnectionTracker};
use crate::net::listener::Listener;
use crate::observability::metrics;
use crate::routing::Router;

/// The HTTP server.
#[derive(Debug)]
pub struct HttpServer {
    router: Arc<Router>,
    settings: Arc<ConnectionSettings>,
    tracker: ConnectionTracker,
    shutdown_grace: Duration,
}

impl HttpServer {
    /// Create a server from a validated config and a fully registered router.
    pub fn new(config: &ServerConfig, router: Router) -> Self {
        Self {
            router: Arc::new(router),
            settings: Arc::new(ConnectionSettings::from(config)),
            tracker: ConnectionTracker::new(),
            shutdown_grace: Duration::from_secs(config.timeouts.shutdown_grace_secs),
        }
    }

    /// Live connection tracker, for observing drain progress.
    pub fn tracker(&self) -> &ConnectionTracker {
        &self.tracker
    }

    /// Run the accept loop until `shutdown` fires, then wait up to the grace
    /// period for open connections.
    pub async fn run(self, listener: Listener, mut shutdown: broadcast::Receiver<()>) {
        if let Ok(addr) = listener.local_addr() {
            tracing::info!(address = %addr, routes = self.router.len(), "HTTP server starting");
        }

        loop {
            tokio::select! {
                _ = shutdown.recv() => {
                    tracing::info!("Shutdown signal received, no longer accepting");
                    break;
                }
                accepted = listener.accept() => {
                    let (stream, peer, permit) = match accepted {
                        Ok(accepted) => accepted,
                        Err(e) => {
                            tracing::error!(error = %e, "Accept failed");
                            continue;
                        }
                    };

                    let guard = self.tracker.track();
                    let span = tracing::info_span!("connection", id = %guard.id(), peer = %peer);
                    let router = Arc::clone(&self.router);
                    let settings = Arc::clone(&self.settings);

                    tokio::spawn(
                        async move {
                            let _permit = permit;
                            let _guard = guard;
                            if let Err(e) = serve_connection(stream, router, &settings).await {
                                metrics::record_connection_error(e.kind());
                                tracing::warn!(error = %e, "Connection aborted");
                            }
                        }
                        .instrument(span),
                    );
                }
            }
        }

        let open = self.tracker.active_count();
        if open > 0 {
            tracing::info!(open, grace = ?self.shutdown_grace, "Draining connections");
            if tokio::time::timeout(self.shutdown_grace, self.tracker.wait_idle())
                .await
                .is_err()
            {
                tracing::warn!(
                    abandoned = self.tracker.active_count(),
                    "Shutdown grace period elapsed, abandoning connections"
                );
            }
        }
        tracing::info!("HTTP server stopped");
    }
}
