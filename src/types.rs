//! Core types for batch-dl

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Deterministic identifier of a task, derived from its ordered URL list
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ToSchema)]
#[serde(transparent)]
pub struct TaskId(pub String);

impl TaskId {
    /// Borrow the hex string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for TaskId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&str> for TaskId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl std::fmt::Display for TaskId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Task status
///
/// There is no failed state: a task with a failed file never reaches `Done`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    /// No file has started yet
    #[default]
    Pending,
    /// At least one file has started
    Running,
    /// Every file is done
    Done,
}

/// Per-file status
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum FileStatus {
    /// Waiting for the worker
    #[default]
    Pending,
    /// Fetch in flight
    Running,
    /// Fetched and written to disk
    Done,
    /// Fetch failed, see `error`
    Failed,
}

/// One URL of a task and its download outcome
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct FileEntry {
    /// Requested URL
    pub url: String,
    /// Current status
    pub status: FileStatus,
    /// Local path of the downloaded file, set only when `status` is done
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    /// Failure description, set only when `status` is failed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl FileEntry {
    /// Create a pending file for `url`
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            status: FileStatus::Pending,
            path: None,
            error: None,
        }
    }
}

/// A batch of URLs submitted together
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Task {
    /// Identifier derived from the ordered URL list
    pub id: TaskId,
    /// Creation time (UTC)
    pub created_at: DateTime<Utc>,
    /// Aggregate status
    pub status: TaskStatus,
    /// Files in request order
    #[serde(default)]
    pub files: Vec<FileEntry>,
}

impl Task {
    /// Create a pending task with one pending file per URL, preserving order
    pub fn new<S: AsRef<str>>(id: TaskId, urls: &[S]) -> Self {
        Self {
            id,
            created_at: Utc::now(),
            status: TaskStatus::Pending,
            files: urls.iter().map(|u| FileEntry::new(u.as_ref())).collect(),
        }
    }

    /// True when every file is done (an empty task is never complete)
    pub fn all_files_done(&self) -> bool {
        !self.files.is_empty() && self.files.iter().all(|f| f.status == FileStatus::Done)
    }

    /// Re-queue work that was in flight when the previous process stopped.
    ///
    /// Running files go back to pending, and so does a running task.
    pub fn reset_interrupted(&mut self) {
        for file in &mut self.files {
            if file.status == FileStatus::Running {
                file.status = FileStatus::Pending;
            }
        }
        if self.status == TaskStatus::Running {
            self.status = TaskStatus::Pending;
        }
    }
}

/// Request body for POST /tasks
#[derive(Clone, Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct CreateTaskRequest {
    /// URLs to download, in order
    #[serde(default)]
    pub urls: Vec<String>,
}

/// Response body for POST /tasks
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct CreateTaskResponse {
    /// Identifier of the (possibly pre-existing) task
    pub id: TaskId,
}

/// Event emitted during task processing
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    /// A new task was registered
    TaskCreated {
        /// Task ID
        id: TaskId,
        /// Number of files in the task
        files: usize,
    },

    /// The worker started fetching a file
    FileStarted {
        /// Task ID
        id: TaskId,
        /// URL being fetched
        url: String,
    },

    /// A file was fetched successfully
    FileCompleted {
        /// Task ID
        id: TaskId,
        /// URL that was fetched
        url: String,
        /// Local path of the file
        path: String,
    },

    /// A file fetch failed
    FileFailed {
        /// Task ID
        id: TaskId,
        /// URL that failed
        url: String,
        /// Failure description
        error: String,
    },

    /// Every file of a task is done
    TaskComplete {
        /// Task ID
        id: TaskId,
    },

    /// The worker was told to stop
    Shutdown,
}

impl Event {
    /// Short name used as the SSE event type
    pub fn kind(&self) -> &'static str {
        match self {
            Event::TaskCreated { .. } => "task_created",
            Event::FileStarted { .. } => "file_started",
            Event::FileCompleted { .. } => "file_completed",
            Event::FileFailed { .. } => "file_failed",
            Event::TaskComplete { .. } => "task_complete",
            Event::Shutdown => "shutdown",
        }
    }
}
