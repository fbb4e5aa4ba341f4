//! Task manager split into focused submodules.
//!
//! The `TaskManager` struct and its methods are organized by domain:
//! - [`tasks`] - Task submission and lookup
//! - [`worker`] - The sequential worker loop
//! - [`lifecycle`] - Worker stop and process shutdown

mod lifecycle;
mod tasks;
mod worker;

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
pub(crate) mod test_helpers;
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests;

use std::sync::Arc;
use std::sync::atomic::AtomicBool;

use tokio_util::sync::CancellationToken;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::fetcher::{Fetcher, HttpFetcher};
use crate::registry::TaskRegistry;
use crate::snapshot::SnapshotStore;
use crate::types::Event;

/// Worker stop signalling
#[derive(Clone)]
pub(crate) struct WorkerState {
    /// Set once shutdown begins; the worker stops picking up files
    pub(crate) stopping: Arc<AtomicBool>,
    /// Cancelled together with `stopping` so an idle worker wakes immediately
    pub(crate) cancel: CancellationToken,
}

impl WorkerState {
    pub(crate) fn new() -> Self {
        Self {
            stopping: Arc::new(AtomicBool::new(false)),
            cancel: CancellationToken::new(),
        }
    }
}

/// Main task manager instance (cloneable - all fields are Arc-wrapped)
#[derive(Clone)]
pub struct TaskManager {
    /// In-memory registry of all tasks
    pub(crate) registry: TaskRegistry,
    /// Snapshot persistence
    pub(crate) store: Arc<SnapshotStore>,
    /// Fetches one URL at a time for the worker
    pub(crate) fetcher: Arc<dyn Fetcher>,
    /// Event broadcast channel sender (multiple subscribers supported)
    pub(crate) event_tx: tokio::sync::broadcast::Sender<Event>,
    /// Configuration (wrapped in Arc for sharing across tasks)
    pub(crate) config: Arc<Config>,
    /// Worker stop signalling
    pub(crate) worker_state: WorkerState,
}

impl TaskManager {
    /// Create a new TaskManager using the HTTP fetcher
    ///
    /// This initializes all core components:
    /// - Creates the download and snapshot directories
    /// - Restores tasks from the snapshot, re-queueing interrupted files
    /// - Sets up the event broadcast channel
    ///
    /// The worker is not started; call [`TaskManager::start_worker`].
    pub async fn new(config: Config) -> Result<Self> {
        let fetcher = Arc::new(HttpFetcher::new(&config.download)?);
        Self::with_fetcher(config, fetcher).await
    }

    /// Create a new TaskManager with a custom [`Fetcher`]
    pub async fn with_fetcher(config: Config, fetcher: Arc<dyn Fetcher>) -> Result<Self> {
        tokio::fs::create_dir_all(&config.download.download_dir)
            .await
            .map_err(|e| {
                Error::Io(std::io::Error::new(
                    e.kind(),
                    format!(
                        "Failed to create download directory '{}': {}",
                        config.download.download_dir.display(),
                        e
                    ),
                ))
            })?;

        let registry = TaskRegistry::new();
        let store = SnapshotStore::new(config.persistence.snapshot_path.clone());

        // A bad snapshot never blocks startup
        if let Err(e) = store.load(&registry).await {
            tracing::warn!(
                path = %store.path().display(),
                error = %e,
                "Failed to load snapshot, starting with an empty registry"
            );
        }

        // Buffer of 1000 events per subscriber
        let (event_tx, _rx) = tokio::sync::broadcast::channel(1000);

        Ok(Self {
            registry,
            store: Arc::new(store),
            fetcher,
            event_tx,
            config: Arc::new(config),
            worker_state: WorkerState::new(),
        })
    }

    /// Subscribe to task events
    ///
    /// Each subscriber receives all events independently. A subscriber that
    /// falls more than 1000 events behind receives `RecvError::Lagged`.
    pub fn subscribe(&self) -> tokio::sync::broadcast::Receiver<Event> {
        self.event_tx.subscribe()
    }

    /// Get the current configuration
    pub fn get_config(&self) -> Arc<Config> {
        Arc::clone(&self.config)
    }

    /// The shared task registry
    pub fn registry(&self) -> &TaskRegistry {
        &self.registry
    }

    /// Write the full registry to the snapshot file
    pub async fn persist_snapshot(&self) -> Result<()> {
        self.store.save(&self.registry).await
    }

    /// Emit an event to all subscribers; dropped silently when nobody listens
    pub(crate) fn emit_event(&self, event: Event) {
        self.event_tx.send(event).ok();
    }

    /// Bind the REST API listener and serve it in a background task
    ///
    /// Binding happens before this returns, so an unusable address is reported
    /// to the caller instead of being lost in the spawned task.
    pub async fn spawn_api_server(self: &Arc<Self>) -> Result<crate::api::ApiServerHandle> {
        crate::api::bind_api_server(self.clone(), self.config.clone()).await
    }
}
