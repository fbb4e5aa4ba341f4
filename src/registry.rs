//! Concurrency-safe store of all tasks.
//!
//! One reader/writer lock covers the whole map including every nested file, so
//! readers never observe a half-applied status change.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::sync::Arc;

use tokio::sync::{Notify, RwLock};

use crate::error::FetchError;
use crate::types::{FileStatus, Task, TaskId, TaskStatus};

/// Shared task registry (cloneable - all fields are Arc-wrapped)
#[derive(Clone, Default)]
pub struct TaskRegistry {
    tasks: Arc<RwLock<HashMap<TaskId, Task>>>,
    /// Signalled whenever new pending work is inserted
    new_work: Arc<Notify>,
}

impl TaskRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a task for `urls` under `id` unless one already exists.
    ///
    /// Idempotent by ID: re-submitting an existing ID leaves that task untouched.
    /// Returns the ID together with whether a new task was inserted. Callers
    /// must reject an empty URL list before calling this.
    pub async fn create_if_absent<S: AsRef<str>>(&self, id: TaskId, urls: &[S]) -> (TaskId, bool) {
        let inserted = {
            let mut tasks = self.tasks.write().await;
            if tasks.contains_key(&id) {
                false
            } else {
                tasks.insert(id.clone(), Task::new(id.clone(), urls));
                true
            }
        };

        if inserted {
            self.new_work.notify_one();
        }
        (id, inserted)
    }

    /// Look up a task, returning an owned copy
    pub async fn get(&self, id: &TaskId) -> Option<Task> {
        self.tasks.read().await.get(id).cloned()
    }

    /// Copy of every task, oldest first (ties broken by ID).
    ///
    /// Taken so the worker can iterate without holding the lock during fetches.
    pub async fn snapshot(&self) -> Vec<Task> {
        let mut tasks: Vec<Task> = self.tasks.read().await.values().cloned().collect();
        tasks.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then_with(|| a.id.cmp(&b.id))
        });
        tasks
    }

    /// Number of registered tasks
    pub async fn len(&self) -> usize {
        self.tasks.read().await.len()
    }

    /// Whether no task is registered
    pub async fn is_empty(&self) -> bool {
        self.tasks.read().await.is_empty()
    }

    /// Merge tasks restored from a snapshot into the live map.
    ///
    /// Anything recorded as running is reset to pending before insertion.
    /// Returns the number of tasks inserted.
    pub async fn apply_loaded(&self, loaded: HashMap<TaskId, Task>) -> usize {
        let count = loaded.len();
        let mut has_pending = false;
        {
            let mut tasks = self.tasks.write().await;
            for (id, mut task) in loaded {
                task.reset_interrupted();
                has_pending |= task.files.iter().any(|f| f.status == FileStatus::Pending);
                tasks.insert(id, task);
            }
        }

        if has_pending {
            self.new_work.notify_one();
        }
        count
    }

    /// Claim a pending file for download.
    ///
    /// Marks the file running, and the task running if it was still pending.
    /// Returns false when the file is gone or no longer pending.
    pub async fn mark_running(&self, id: &TaskId, file_index: usize) -> bool {
        let mut tasks = self.tasks.write().await;
        let Some(task) = tasks.get_mut(id) else {
            return false;
        };
        let Some(file) = task.files.get_mut(file_index) else {
            return false;
        };
        if file.status != FileStatus::Pending {
            return false;
        }

        file.status = FileStatus::Running;
        if task.status == TaskStatus::Pending {
            task.status = TaskStatus::Running;
        }
        true
    }

    /// Record a fetch outcome and recompute the task status.
    ///
    /// The task becomes done only when every file is done. Returns the task's
    /// status after the update, or `None` if the task or file no longer exists.
    pub async fn record_outcome(
        &self,
        id: &TaskId,
        file_index: usize,
        outcome: &std::result::Result<std::path::PathBuf, FetchError>,
    ) -> Option<TaskStatus> {
        let mut tasks = self.tasks.write().await;
        let task = tasks.get_mut(id)?;
        let file = task.files.get_mut(file_index)?;

        match outcome {
            Ok(path) => {
                file.status = FileStatus::Done;
                file.path = Some(display_path(path));
                file.error = None;
            }
            Err(e) => {
                file.status = FileStatus::Failed;
                file.path = None;
                file.error = Some(e.to_string());
            }
        }

        if task.all_files_done() {
            task.status = TaskStatus::Done;
        }
        Some(task.status)
    }

    /// Serialize the whole map as pretty JSON while holding the read lock.
    ///
    /// Keys are written in sorted order so consecutive snapshots diff cleanly.
    pub(crate) async fn encode_json(&self) -> serde_json::Result<Vec<u8>> {
        let tasks = self.tasks.read().await;
        let ordered: BTreeMap<&TaskId, &Task> = tasks.iter().collect();
        serde_json::to_vec_pretty(&ordered)
    }

    /// Wait until new pending work is signalled
    pub(crate) async fn wait_for_work(&self) {
        self.new_work.notified().await;
    }
}

fn display_path(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}
