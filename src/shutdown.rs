//! Cooperative shutdown signal.
//!
//! A single watch channel carries the operator's termination request from the
//! binary's signal handlers to the launcher (forward to the child) and the run
//! executor (stop before the next submission).

use tokio::sync::watch;
use tracing::info;

/// Sender half: owned by the binary's signal listener.
pub struct ShutdownHandle {
    tx: watch::Sender<bool>,
}

/// Receiver half: cloned into every component that must observe cancellation.
#[derive(Clone)]
pub struct ShutdownSignal {
    rx: watch::Receiver<bool>,
}

/// Create a connected handle/signal pair.
pub fn channel() -> (ShutdownHandle, ShutdownSignal) {
    let (tx, rx) = watch::channel(false);
    (ShutdownHandle { tx }, ShutdownSignal { rx })
}

impl ShutdownHandle {
    /// Request shutdown. Idempotent.
    pub fn trigger(&self) {
        let _ = self.tx.send(true);
    }
}

impl ShutdownSignal {
    /// Whether shutdown has been requested.
    pub fn is_triggered(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolves when shutdown is requested. If the handle was dropped without
    /// triggering, this never resolves.
    pub async fn listen(&mut self) {
        loop {
            if *self.rx.borrow() {
                return;
            }
            if self.rx.changed().await.is_err() {
                std::future::pending::<()>().await;
            }
        }
    }
}

/// Wire SIGINT and SIGTERM to the shutdown handle. The spawned task owns the
/// handle for the life of the process.
pub fn install_signal_listener(handle: ShutdownHandle) {
    tokio::spawn(async move {
        let mut sigterm = match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(s) => s,
            Err(e) => {
                tracing::warn!("Failed to register SIGTERM handler: {}", e);
                return;
            }
        };
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("Received interrupt, finishing current submission and stopping");
            }
            _ = sigterm.recv() => {
                info!("Received SIGTERM, finishing current submission and stopping");
            }
        }
        handle.trigger();
    });
}
