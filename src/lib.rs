//! # batch-dl
//!
//! Small HTTP service that accepts batches of URLs as tasks and downloads
//! their files one at a time in the background.
//!
//! - Task IDs are derived from the ordered URL list, so resubmitting the same
//!   list is idempotent
//! - A single worker fetches files sequentially, oldest task first
//! - Progress survives restarts through a JSON snapshot rewritten after every file
//! - Consumers can follow progress through an event channel or `GET /events`
//!
//! ## Quick Start
//!
//! ```no_run
//! use batch_dl::{Config, TaskManager};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let manager = TaskManager::new(Config::default()).await?;
//!
//!     let mut events = manager.subscribe();
//!     tokio::spawn(async move {
//!         while let Ok(event) = events.recv().await {
//!             println!("Event: {:?}", event);
//!         }
//!     });
//!
//!     let worker = manager.start_worker();
//!     let id = manager
//!         .submit_task(vec!["https://example.com/a.bin".to_string()])
//!         .await?;
//!     println!("created task {id}");
//!
//!     manager.shutdown(None).await?;
//!     worker.await?;
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

use std::future::Future;
use std::sync::Arc;

/// REST API module
pub mod api;
/// Configuration types
pub mod config;
/// Error types
pub mod error;
/// Single-URL fetching
pub mod fetcher;
/// Task manager (decomposed into focused submodules)
pub mod manager;
/// In-memory task registry
pub mod registry;
/// On-disk state snapshot
pub mod snapshot;
/// Deterministic task identifiers
pub mod task_id;
/// Core types and events
pub mod types;

// Re-export commonly used types
pub use api::ApiServerHandle;
pub use config::Config;
pub use error::{ApiError, Error, FetchError, Result, SnapshotError, ToHttpStatus};
pub use fetcher::{Fetcher, HttpFetcher};
pub use manager::TaskManager;
pub use registry::TaskRegistry;
pub use snapshot::SnapshotStore;
pub use task_id::make_task_id;
pub use types::{
    CreateTaskRequest, CreateTaskResponse, Event, FileEntry, FileStatus, Task, TaskId, TaskStatus,
};

/// Serve the API, run the worker and shut down gracefully on a termination signal.
///
/// - **Unix:** listens for SIGTERM and SIGINT, with fallbacks if signal registration fails.
/// - **Windows/other:** listens for Ctrl+C via `tokio::signal::ctrl_c()`.
///
/// # Example
///
/// ```no_run
/// use batch_dl::{Config, TaskManager, run_with_shutdown};
/// use std::sync::Arc;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let manager = Arc::new(TaskManager::new(Config::default()).await?);
///     run_with_shutdown(manager).await?;
///     Ok(())
/// }
/// ```
pub async fn run_with_shutdown(manager: Arc<TaskManager>) -> Result<()> {
    run_until(manager, wait_for_signal()).await
}

/// Like [`run_with_shutdown`], but shuts down when `stop` completes.
///
/// Fails without starting the worker if the listener cannot be bound.
pub async fn run_until<F>(manager: Arc<TaskManager>, stop: F) -> Result<()>
where
    F: Future<Output = ()>,
{
    let server = manager.spawn_api_server().await?;
    let _worker = manager.start_worker();

    stop.await;
    manager.shutdown(Some(server)).await
}

#[cfg(unix)]
async fn wait_for_signal() {
    use tokio::signal::unix::{SignalKind, signal};

    // Registration can fail in restricted environments (containers, tests)
    match (signal(SignalKind::terminate()), signal(SignalKind::interrupt())) {
        (Ok(mut sigterm), Ok(mut sigint)) => {
            tokio::select! {
                _ = sigterm.recv() => tracing::info!(signal = "SIGTERM", "Received shutdown signal"),
                _ = sigint.recv() => tracing::info!(signal = "SIGINT", "Received shutdown signal"),
            }
        }
        (Ok(mut sigterm), Err(e)) => {
            tracing::warn!(error = %e, "Could not register SIGINT handler, waiting for SIGTERM only");
            sigterm.recv().await;
            tracing::info!(signal = "SIGTERM", "Received shutdown signal");
        }
        (Err(e), Ok(mut sigint)) => {
            tracing::warn!(error = %e, "Could not register SIGTERM handler, waiting for SIGINT only");
            sigint.recv().await;
            tracing::info!(signal = "SIGINT", "Received shutdown signal");
        }
        (Err(e), Err(_)) => {
            tracing::error!(error = %e, "Could not register any signal handlers, using ctrl_c fallback");
            tokio::signal::ctrl_c().await.ok();
        }
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => tracing::info!("Received Ctrl+C signal"),
        Err(e) => tracing::error!(error = %e, "Failed to listen for Ctrl+C signal"),
    }
}
