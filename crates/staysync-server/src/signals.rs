//! Signal handling for graceful shutdown.
//!
//! SIGTERM and SIGINT (Ctrl+C elsewhere) stop accepting connections and let
//! in-flight requests finish.

use std::sync::Arc;

use tokio::sync::watch;
use tracing::{debug, error, info};

/// Listens for termination signals and fans them out to waiters.
pub struct SignalHandler {
    shutdown_tx: Arc<watch::Sender<bool>>,
    shutdown_rx: watch::Receiver<bool>,
}

impl Default for SignalHandler {
    fn default() -> Self {
        Self::new()
    }
}

impl SignalHandler {
    pub fn new() -> Self {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        Self {
            shutdown_tx: Arc::new(shutdown_tx),
            shutdown_rx,
        }
    }

    /// Spawns the signal listener task. Call once at startup.
    #[cfg(unix)]
    pub fn spawn_listener(&self) {
        let shutdown_tx = self.shutdown_tx.clone();

        tokio::spawn(async move {
            use tokio::signal::unix::{SignalKind, signal};

            let (mut sigterm, mut sigint) =
                match (signal(SignalKind::terminate()), signal(SignalKind::interrupt())) {
                    (Ok(term), Ok(int)) => (term, int),
                    (Err(e), _) | (_, Err(e)) => {
                        error!(error = %e, "Failed to install signal handlers");
                        return;
                    }
                };

            tokio::select! {
                _ = sigterm.recv() => info!("Received SIGTERM, initiating shutdown"),
                _ = sigint.recv() => info!("Received SIGINT, initiating shutdown"),
            }
            let _ = shutdown_tx.send(true);
            debug!("Signal listener stopped");
        });
    }

    /// Non-Unix: only Ctrl+C.
    #[cfg(not(unix))]
    pub fn spawn_listener(&self) {
        let shutdown_tx = self.shutdown_tx.clone();

        tokio::spawn(async move {
            if let Ok(()) = tokio::signal::ctrl_c().await {
                info!("Received Ctrl+C, initiating shutdown");
                let _ = shutdown_tx.send(true);
            }
        });
    }

    /// Returns a future that completes when shutdown is signaled.
    pub fn shutdown(&self) -> ShutdownSignal {
        ShutdownSignal {
            rx: self.shutdown_rx.clone(),
        }
    }

    /// Programmatically triggers a shutdown.
    pub fn trigger_shutdown(&self) {
        let _ = self.shutdown_tx.send(true);
    }

    pub fn is_shutdown(&self) -> bool {
        *self.shutdown_rx.borrow()
    }
}

/// Completes when shutdown is signaled.
pub struct ShutdownSignal {
    rx: watch::Receiver<bool>,
}

impl ShutdownSignal {
    pub async fn wait(mut self) {
        // A closed channel also means shutdown.
        let _ = self.rx.wait_for(|stop| *stop).await;
    }
}
