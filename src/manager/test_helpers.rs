//! Shared test helpers for creating TaskManager instances in tests.

use crate::config::Config;
use crate::error::FetchError;
use crate::fetcher::{Fetcher, destination_name};
use crate::manager::TaskManager;
use crate::types::{FileStatus, Task, TaskId, TaskStatus};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tempfile::tempdir;

/// Scripted [`Fetcher`] that writes the URL itself as the file body.
///
/// URLs registered with [`StubFetcher::fail`] return the given error instead.
pub(crate) struct StubFetcher {
    download_dir: PathBuf,
    delay: Duration,
    failures: Mutex<HashMap<String, FetchError>>,
    calls: Mutex<Vec<String>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl StubFetcher {
    pub(crate) fn new(download_dir: &Path) -> Self {
        Self {
            download_dir: download_dir.to_path_buf(),
            delay: Duration::ZERO,
            failures: Mutex::new(HashMap::new()),
            calls: Mutex::new(Vec::new()),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        }
    }

    pub(crate) fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub(crate) fn fail(&self, url: &str, status: &str) {
        self.failures.lock().unwrap().insert(
            url.to_string(),
            FetchError::HttpStatus {
                url: url.to_string(),
                status: status.to_string(),
            },
        );
    }

    pub(crate) fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub(crate) fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl Fetcher for StubFetcher {
    async fn fetch(&self, url: &str) -> std::result::Result<PathBuf, FetchError> {
        self.calls.lock().unwrap().push(url.to_string());
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if let Some(err) = self.failures.lock().unwrap().get(url).cloned() {
            return Err(err);
        }

        let path = self
            .download_dir
            .join(destination_name(url, "download", chrono::Utc::now()));
        std::fs::write(&path, url.as_bytes()).map_err(|e| FetchError::Write {
            path: path.clone(),
            reason: e.to_string(),
        })?;
        Ok(path)
    }
}

/// Configuration rooted in `root`, with no shutdown grace period.
pub(crate) fn test_config(root: &Path) -> Config {
    let mut config = Config::default();
    config.download.download_dir = root.join("downloads");
    config.persistence.snapshot_path = root.join("data").join("state.json");
    config.worker.idle_poll_interval = Duration::from_secs(60);
    config.shutdown.grace_period = Duration::ZERO;
    config.shutdown.server_timeout = Duration::from_secs(1);
    config.server.api.bind_address = "127.0.0.1:0".parse().unwrap();
    config
}

/// Create a TaskManager backed by a [`StubFetcher`].
/// Returns the manager, the fetcher and the tempdir (which must be kept alive).
pub(crate) async fn create_test_manager() -> (TaskManager, Arc<StubFetcher>, tempfile::TempDir) {
    create_test_manager_with_delay(Duration::ZERO).await
}

/// Like [`create_test_manager`], but every fetch takes at least `delay`.
pub(crate) async fn create_test_manager_with_delay(
    delay: Duration,
) -> (TaskManager, Arc<StubFetcher>, tempfile::TempDir) {
    let temp_dir = tempdir().unwrap();
    let (manager, fetcher) = open_test_manager(temp_dir.path(), delay).await;
    (manager, fetcher, temp_dir)
}

/// Open a TaskManager over an existing test root, restoring its snapshot.
pub(crate) async fn open_test_manager(
    root: &Path,
    delay: Duration,
) -> (TaskManager, Arc<StubFetcher>) {
    let config = test_config(root);
    std::fs::create_dir_all(&config.download.download_dir).unwrap();

    let fetcher = Arc::new(StubFetcher::new(&config.download.download_dir).with_delay(delay));
    let manager = TaskManager::with_fetcher(config, fetcher.clone())
        .await
        .unwrap();
    (manager, fetcher)
}

/// Poll until `check` accepts the task, panicking after two seconds.
pub(crate) async fn wait_for_task<F>(manager: &TaskManager, id: &TaskId, check: F) -> Task
where
    F: Fn(&Task) -> bool,
{
    let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
    loop {
        if let Some(task) = manager.get_task(id).await
            && check(&task)
        {
            return task;
        }
        if tokio::time::Instant::now() >= deadline {
            panic!(
                "task {id} did not reach the expected state: {:?}",
                manager.get_task(id).await
            );
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}

/// Poll until the task reaches `status`.
pub(crate) async fn wait_for_status(manager: &TaskManager, id: &TaskId, status: TaskStatus) -> Task {
    wait_for_task(manager, id, |t| t.status == status).await
}

/// Poll until no file of the task is pending or running.
pub(crate) async fn wait_until_settled(manager: &TaskManager, id: &TaskId) -> Task {
    wait_for_task(manager, id, |t| {
        t.files
            .iter()
            .all(|f| matches!(f.status, FileStatus::Done | FileStatus::Failed))
    })
    .await
}
