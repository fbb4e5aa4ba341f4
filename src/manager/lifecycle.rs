//! Worker stop and process shutdown.

use std::sync::atomic::Ordering;

use crate::api::ApiServerHandle;
use crate::error::Result;
use crate::types::Event;

use super::TaskManager;

impl TaskManager {
    /// Tell the worker to stop picking up files
    ///
    /// Sets the stop flag and cancels the worker token so an idle worker wakes
    /// up. A fetch already in flight is not interrupted. Task creation is still
    /// accepted afterwards; new tasks simply wait for the next process start.
    pub fn stop_worker(&self) {
        let already = self.worker_state.stopping.swap(true, Ordering::SeqCst);
        self.worker_state.cancel.cancel();
        if !already {
            tracing::info!("Stopped processing new files");
            self.emit_event(Event::Shutdown);
        }
    }

    /// Gracefully shut down
    ///
    /// This method performs the shutdown sequence:
    /// 1. Stops the worker (flag + cancellation token)
    /// 2. Waits the configured grace period so in-flight task submissions land
    /// 3. Closes the API listener, bounded by the configured server timeout
    /// 4. Persists one final snapshot
    ///
    /// An in-progress download is not awaited. Failures in steps 3 and 4 are
    /// logged and do not abort the sequence.
    pub async fn shutdown(&self, server: Option<ApiServerHandle>) -> Result<()> {
        tracing::info!("Initiating graceful shutdown");

        // 1. Stop the worker
        self.stop_worker();

        // 2. Grace window for task creation already underway
        let grace = self.config.shutdown.grace_period;
        if !grace.is_zero() {
            tracing::info!(
                grace_secs = grace.as_secs(),
                "Waiting for in-flight requests before closing the listener"
            );
            tokio::time::sleep(grace).await;
        }

        // 3. Close the HTTP listener
        if let Some(server) = server
            && let Err(e) = server.stop(self.config.shutdown.server_timeout).await
        {
            tracing::warn!(error = %e, "API server did not stop cleanly");
        }

        // 4. Persist final state
        match self.persist_snapshot().await {
            Ok(()) => tracing::info!(
                path = %self.store.path().display(),
                "Final snapshot persisted"
            ),
            Err(e) => tracing::error!(error = %e, "Failed to persist final snapshot"),
        }

        tracing::info!("Graceful shutdown complete");
        Ok(())
    }
}
