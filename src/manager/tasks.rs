//! Task submission and lookup.

use crate::error::{Error, Result};
use crate::task_id::make_task_id;
use crate::types::{Event, Task, TaskId};

use super::TaskManager;

/// Validation message for an empty URL list
pub(crate) const NO_URLS: &str = "no urls";

impl TaskManager {
    /// Submit a batch of URLs as a task
    ///
    /// The task ID is derived from the ordered URL list, so submitting the same
    /// list again returns the existing task's ID without creating a duplicate.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] if `urls` is empty; no task is created.
    pub async fn submit_task(&self, urls: Vec<String>) -> Result<TaskId> {
        if urls.is_empty() {
            return Err(Error::Validation(NO_URLS.to_string()));
        }

        let id = make_task_id(&urls);
        let (id, created) = self.registry.create_if_absent(id, &urls).await;

        if created {
            tracing::info!(task_id = %id, files = urls.len(), "Task created");
            self.emit_event(Event::TaskCreated {
                id: id.clone(),
                files: urls.len(),
            });
        } else {
            tracing::debug!(task_id = %id, "Task already exists");
        }

        Ok(id)
    }

    /// Get a copy of a single task
    pub async fn get_task(&self, id: &TaskId) -> Option<Task> {
        self.registry.get(id).await
    }

    /// Get copies of all tasks, oldest first
    pub async fn list_tasks(&self) -> Vec<Task> {
        self.registry.snapshot().await
    }
}
