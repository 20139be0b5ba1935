//! OS signal handling.
//!
//! # Responsibilities
//! - Listen for SIGINT (Ctrl-C) everywhere and SIGTERM on unix
//! - Turn the first one received into a graceful shutdown
//!
//! # Design Decisions
//! - Uses Tokio's signal handling (async-safe)
//! - A failed handler install is logged, not fatal

use crate::lifecycle::Shutdown;

/// Trigger `shutdown` when SIGINT or SIGTERM arrives.
pub fn spawn_signal_handler(shutdown: Shutdown) {
    tokio::spawn(async move {
        let signal = tokio::select! {
            name = ctrl_c() => name,
            name = terminate() => name,
        };
        if let Some(name) = signal {
            tracing::info!(signal = name, "Shutdown signal received");
            shutdown.trigger();
        }
    });
}

async fn ctrl_c() -> Option<&'static str> {
    match tokio::signal::ctrl_c().await {
        Ok(()) => Some("SIGINT"),
        Err(e) => {
            tracing::error!(error = %e, "Failed to install Ctrl-C handler");
            std::future::pending().await
        }
    }
}

#[cfg(unix)]
async fn terminate() -> Option<&'static str> {
    use tokio::signal::unix::{signal, SignalKind};

    match signal(SignalKind::terminate()) {
        Ok(mut stream) => stream.recv().await.map(|()| "SIGTERM"),
        Err(e) => {
            tracing::error!(error = %e, "Failed to install SIGTERM handler");
            std::future::pending().await
        }
    }
}

#[cfg(not(unix))]
async fn terminate() -> Option<&'static str> {
    std::future::pending().await
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn sigterm_triggers_shutdown() {
        let shutdown = Shutdown::new();
        let mut rx = shutdown.subscribe();
        spawn_signal_handler(shutdown.clone());
        // let the handler install before raising
        tokio::time::sleep(Duration::from_millis(50)).await;

        let status = std::process::Command::new("kill")
            .args(["-TERM", &std::process::id().to_string()])
            .status()
            .unwrap();
        assert!(status.success());

        tokio::time::timeout(Duration::from_secs(5), rx.recv())
            .await
            .expect("SIGTERM did not trigger shutdown")
            .unwrap();
    }
}
