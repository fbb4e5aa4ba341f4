//! Common test utilities for batch-dl end-to-end tests

#![allow(dead_code)]

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use batch_dl::{Config, TaskManager, api::create_router};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tower::ServiceExt;

/// Configuration rooted in a temp directory, listening on an OS-assigned port
pub fn test_config(root: &Path) -> Config {
    let mut config = Config::default();
    config.download.download_dir = root.join("downloads");
    config.download.fetch_timeout = Duration::from_secs(5);
    config.persistence.snapshot_path = root.join("data").join("state.json");
    config.shutdown.grace_period = Duration::ZERO;
    config.shutdown.server_timeout = Duration::from_secs(1);
    config.server.api.bind_address = "127.0.0.1:0".parse().unwrap();
    config
}

/// A manager with its worker running and a router over it
pub struct Service {
    pub manager: Arc<TaskManager>,
    pub app: Router,
    pub worker: JoinHandle<()>,
}

impl Service {
    /// Start a service over `root`, restoring any snapshot already there
    pub async fn start(root: &Path) -> Self {
        let manager = Arc::new(TaskManager::new(test_config(root)).await.unwrap());
        let app = create_router(manager.clone(), manager.get_config());
        let worker = manager.start_worker();
        Self {
            manager,
            app,
            worker,
        }
    }

    /// Stop the worker and wait for it to exit
    pub async fn stop(self) {
        self.manager.shutdown(None).await.unwrap();
        self.worker.await.unwrap();
    }

    pub async fn post_tasks(&self, body: &str) -> (StatusCode, serde_json::Value) {
        let request = Request::builder()
            .method("POST")
            .uri("/tasks")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        self.send(request).await
    }

    pub async fn get_task(&self, id: &str) -> (StatusCode, serde_json::Value) {
        let request = Request::builder()
            .uri(format!("/tasks/{id}"))
            .body(Body::empty())
            .unwrap();
        self.send(request).await
    }

    /// Poll `GET /tasks/{id}` until `check` accepts the body
    pub async fn wait_for_task<F>(&self, id: &str, check: F) -> serde_json::Value
    where
        F: Fn(&serde_json::Value) -> bool,
    {
        let deadline = tokio::time::Instant::now() + Duration::from_secs(10);
        loop {
            let (status, task) = self.get_task(id).await;
            if status == StatusCode::OK && check(&task) {
                return task;
            }
            assert!(
                tokio::time::Instant::now() < deadline,
                "task {id} did not reach the expected state: {task}"
            );
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
    }

    async fn send(&self, request: Request<Body>) -> (StatusCode, serde_json::Value) {
        let response = self.app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let value = if body.is_empty() {
            serde_json::Value::Null
        } else {
            serde_json::from_slice(&body).unwrap()
        };
        (status, value)
    }
}

/// Whether every file of a task is done or failed
pub fn settled(task: &serde_json::Value) -> bool {
    task["files"]
        .as_array()
        .is_some_and(|files| files.iter().all(|f| f["status"] == "done" || f["status"] == "failed"))
}
