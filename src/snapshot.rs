//! Durable snapshot of the task registry.
//!
//! The snapshot is a pretty-printed JSON object mapping task ID to task. It is
//! rewritten in full after every finished file and once more at shutdown.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::Mutex;

use crate::error::{Result, SnapshotError};
use crate::registry::TaskRegistry;
use crate::types::{Task, TaskId};

/// Reads and writes the registry snapshot file
///
/// Clones share one write lock, so saves through any of them run one at a time.
#[derive(Clone, Debug)]
pub struct SnapshotStore {
    path: PathBuf,
    write_lock: Arc<Mutex<()>>,
}

impl SnapshotStore {
    /// Create a store for the snapshot at `path`
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    /// Snapshot file location
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write the full registry to disk.
    ///
    /// The registry is encoded under its read lock, written to a sibling
    /// temporary file, then renamed over the snapshot so a crash mid-write
    /// leaves the previous snapshot intact.
    ///
    /// Saves are serialized from encode through rename: the last save to
    /// encode is the last to land on disk.
    pub async fn save(&self, registry: &TaskRegistry) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        let bytes = registry.encode_json().await?;
        let tmp = self.temp_path();

        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|source| self.write_error(source))?;
        }

        tokio::fs::write(&tmp, &bytes)
            .await
            .map_err(|source| self.write_error(source))?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .map_err(|source| self.write_error(source))?;

        tracing::debug!(path = %self.path.display(), bytes = bytes.len(), "Snapshot saved");
        Ok(())
    }

    /// Read the snapshot from disk without touching any registry.
    ///
    /// A missing file is a first run and yields an empty map. Running files
    /// and running tasks are reset to pending.
    pub async fn read(&self) -> Result<HashMap<TaskId, Task>> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!(path = %self.path.display(), "No snapshot found, starting empty");
                return Ok(HashMap::new());
            }
            Err(source) => {
                return Err(SnapshotError::Read {
                    path: self.path.clone(),
                    source,
                }
                .into());
            }
        };

        let mut tasks: HashMap<TaskId, Task> =
            serde_json::from_slice(&bytes).map_err(|source| SnapshotError::Parse {
                path: self.path.clone(),
                source,
            })?;

        for task in tasks.values_mut() {
            task.reset_interrupted();
        }
        Ok(tasks)
    }

    /// Restore the snapshot into `registry`, returning the number of tasks restored
    pub async fn load(&self, registry: &TaskRegistry) -> Result<usize> {
        let tasks = self.read().await?;
        if tasks.is_empty() {
            return Ok(0);
        }

        let restored = registry.apply_loaded(tasks).await;
        tracing::info!(
            path = %self.path.display(),
            restored,
            "Restored tasks from snapshot"
        );
        Ok(restored)
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "state.json".into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    fn write_error(&self, source: std::io::Error) -> SnapshotError {
        SnapshotError::Write {
            path: self.path.clone(),
            source,
        }
    }
}
