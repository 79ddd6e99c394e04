//! Graceful shutdown handling for SIGTERM and SIGINT.
//!
//! Ensures that:
//! - The scheduler stops arming new runs as soon as a signal arrives
//! - In-flight backup and retention tasks run to completion, never cancelled
//! - The process only exits once every tracked task has finished

use tokio::signal;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::info;

/// Shutdown coordinator: owns the cancellation token the scheduler watches
/// and the tracker that acts as the completion barrier for spawned work.
pub struct ShutdownCoordinator {
    cancel: CancellationToken,
    tracker: TaskTracker,
}

impl ShutdownCoordinator {
    /// Create a new shutdown coordinator
    pub fn new() -> Self {
        Self {
            cancel: CancellationToken::new(),
            tracker: TaskTracker::new(),
        }
    }

    /// Token cancelled once a termination signal has been received
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Tracker on which all backup and retention tasks are spawned
    pub fn tracker(&self) -> &TaskTracker {
        &self.tracker
    }

    /// Wait for SIGINT (Ctrl+C) or SIGTERM, then cancel the token
    pub async fn wait_for_signal(&self) {
        let ctrl_c = async {
            signal::ctrl_c()
                .await
                .expect("Failed to install Ctrl+C handler");
        };

        #[cfg(unix)]
        let terminate = async {
            signal::unix::signal(signal::unix::SignalKind::terminate())
                .expect("Failed to install SIGTERM handler")
                .recv()
                .await;
        };

        #[cfg(not(unix))]
        let terminate = std::future::pending::<()>();

        tokio::select! {
            _ = ctrl_c => {
                info!("Received SIGINT (Ctrl+C), initiating graceful shutdown...");
            }
            _ = terminate => {
                info!("Received SIGTERM, initiating graceful shutdown...");
            }
        }

        self.cancel.cancel();
    }

    /// Block until every in-flight task has completed, success or failure
    pub async fn drain(&self) {
        info!("Waiting for in-flight backup tasks to complete");

        self.tracker.close();
        self.tracker.wait().await;

        info!("Graceful shutdown complete");
    }
}

impl Default for ShutdownCoordinator {
    fn default() -> Self {
        Self::new()
    }
}
