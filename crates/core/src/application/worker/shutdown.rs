// Shutdown Token & Service Lifecycle

use crate::error::{AppError, Result};
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Shutdown signal for graceful termination
#[derive(Clone)]
pub struct ShutdownToken {
    rx: watch::Receiver<bool>,
}

impl ShutdownToken {
    /// Check if shutdown was requested
    pub fn is_shutdown(&self) -> bool {
        *self.rx.borrow()
    }

    /// Wait for shutdown signal
    ///
    /// Returns immediately if shutdown was already requested. If the sender is
    /// dropped without signalling, this never resolves.
    pub async fn wait(&mut self) {
        if self.rx.wait_for(|stop| *stop).await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}

/// Shutdown sender
pub struct ShutdownSender {
    tx: watch::Sender<bool>,
}

impl ShutdownSender {
    /// Signal shutdown to every token
    pub fn shutdown(&self) {
        let _ = self.tx.send(true);
    }

    /// Another token observing this sender
    pub fn subscribe(&self) -> ShutdownToken {
        ShutdownToken {
            rx: self.tx.subscribe(),
        }
    }

    pub fn is_shutdown(&self) -> bool {
        *self.tx.borrow()
    }
}

/// Create a shutdown channel
pub fn shutdown_channel() -> (ShutdownSender, ShutdownToken) {
    let (tx, rx) = watch::channel(false);
    (ShutdownSender { tx }, ShutdownToken { rx })
}

/// A spawned background service with an explicit stop
pub struct ServiceHandle<T> {
    shutdown: ShutdownSender,
    join: JoinHandle<T>,
}

impl<T> ServiceHandle<T> {
    pub fn new(shutdown: ShutdownSender, join: JoinHandle<T>) -> Self {
        Self { shutdown, join }
    }

    pub fn is_finished(&self) -> bool {
        self.join.is_finished()
    }

    /// Signal the service and wait for its task to return
    pub async fn stop(self) -> Result<T> {
        self.shutdown.shutdown();
        self.join
            .await
            .map_err(|e| AppError::Internal(format!("Service task failed: {}", e)))
    }
}
