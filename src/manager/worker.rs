//! Worker loop: drives every pending file through its download, one at a time.

use std::sync::atomic::Ordering;

use crate::types::{Event, FileStatus, TaskId, TaskStatus};

use super::TaskManager;

impl TaskManager {
    /// Start the worker task
    ///
    /// The spawned task repeatedly:
    /// 1. Checks the stop signal and exits if it is set
    /// 2. Takes a snapshot of all tasks, oldest first
    /// 3. Fetches every pending file in task order, then file order
    /// 4. Waits for new work when a pass found nothing to do
    ///
    /// Exactly one fetch is in flight system-wide. Tasks created during a pass
    /// are picked up by the next pass. The stop signal is only observed between
    /// files, so an in-flight fetch always runs to completion or timeout.
    pub fn start_worker(&self) -> tokio::task::JoinHandle<()> {
        let manager = self.clone();
        tokio::spawn(async move { manager.run_worker().await })
    }

    pub(crate) async fn run_worker(&self) {
        tracing::info!("Worker started");

        loop {
            if self.is_stopping() {
                break;
            }

            let processed = self.run_pass().await;
            if processed > 0 || self.is_stopping() {
                continue;
            }

            tracing::debug!("No pending files, waiting for new work");
            tokio::select! {
                _ = self.worker_state.cancel.cancelled() => {}
                _ = self.registry.wait_for_work() => {}
                _ = tokio::time::sleep(self.config.worker.idle_poll_interval) => {}
            }
        }

        tracing::info!("Worker stopped");
    }

    /// Run one full pass over a registry snapshot, returning how many files were processed
    pub(crate) async fn run_pass(&self) -> usize {
        let tasks = self.registry.snapshot().await;
        let mut processed = 0;

        for task in &tasks {
            for (index, file) in task.files.iter().enumerate() {
                if file.status != FileStatus::Pending {
                    continue;
                }
                if self.is_stopping() {
                    return processed;
                }
                if self.process_file(&task.id, index, &file.url).await {
                    processed += 1;
                }
            }
        }

        processed
    }

    /// Download one file and commit the outcome.
    ///
    /// No lock is held during the fetch. The snapshot is rewritten after every
    /// file whether it succeeded or failed.
    async fn process_file(&self, id: &TaskId, index: usize, url: &str) -> bool {
        if !self.registry.mark_running(id, index).await {
            return false;
        }

        tracing::info!(task_id = %id, file_index = index, url, "Downloading file");
        self.emit_event(Event::FileStarted {
            id: id.clone(),
            url: url.to_string(),
        });

        let outcome = self.fetcher.fetch(url).await;
        let task_status = self.registry.record_outcome(id, index, &outcome).await;

        match &outcome {
            Ok(path) => {
                tracing::info!(task_id = %id, url, path = %path.display(), "File downloaded");
                self.emit_event(Event::FileCompleted {
                    id: id.clone(),
                    url: url.to_string(),
                    path: path.to_string_lossy().into_owned(),
                });
            }
            Err(e) => {
                tracing::warn!(task_id = %id, url, error = %e, "File download failed");
                self.emit_event(Event::FileFailed {
                    id: id.clone(),
                    url: url.to_string(),
                    error: e.to_string(),
                });
            }
        }

        if task_status == Some(TaskStatus::Done) {
            tracing::info!(task_id = %id, "Task complete");
            self.emit_event(Event::TaskComplete { id: id.clone() });
        }

        if let Err(e) = self.persist_snapshot().await {
            tracing::warn!(error = %e, "Failed to persist snapshot");
        }

        true
    }

    /// Whether the worker has been told to stop
    pub fn is_stopping(&self) -> bool {
        self.worker_state.stopping.load(Ordering::SeqCst)
            || self.worker_state.cancel.is_cancelled()
    }
}
