//! Ctrl+C handling for long category runs.
//!
//! A [`ShutdownCoordinator`] is checked between listing pages. Once a stop is
//! requested the current page finishes, the stream is dropped and whatever
//! was collected is still written out.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::warn;

/// Shared handle to a shutdown coordinator.
pub type SharedShutdown = Arc<ShutdownCoordinator>;

/// Sticky stop flag polled by the download driver.
#[derive(Debug, Default)]
pub struct ShutdownCoordinator {
    is_shutdown: AtomicBool,
}

impl ShutdownCoordinator {
    /// Create a coordinator with no stop requested.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a coordinator wrapped in [`Arc`].
    pub fn shared() -> SharedShutdown {
        Arc::new(Self::new())
    }

    /// Request a stop.
    pub fn request_shutdown(&self) {
        self.is_shutdown.store(true, Ordering::SeqCst);
    }

    /// Whether a stop was requested.
    pub fn is_shutdown_requested(&self) -> bool {
        self.is_shutdown.load(Ordering::SeqCst)
    }

    /// Spawn a task that requests a stop on the first Ctrl+C.
    pub fn listen_for_ctrl_c(self: &Arc<Self>) {
        let handle = Arc::clone(self);
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("Interrupt received, finishing current page before stopping");
                handle.request_shutdown();
            }
        });
    }
}
