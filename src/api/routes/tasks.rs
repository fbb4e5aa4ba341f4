//! Task creation and lookup handlers.

use crate::api::AppState;
use crate::error::{ApiError, Error};
use crate::types::{CreateTaskRequest, CreateTaskResponse, Task, TaskId};
use axum::{
    Json,
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};

/// POST /tasks - Create a task from an ordered list of URLs
///
/// Any undecodable body gets `{"error": "invalid json"}`, whatever its
/// content type.
#[utoipa::path(
    post,
    path = "/tasks",
    tag = "tasks",
    request_body = CreateTaskRequest,
    responses(
        (status = 202, description = "Task accepted (new or already existing)", body = CreateTaskResponse),
        (status = 400, description = "Body is not valid JSON or has no URLs", body = ApiError)
    )
)]
pub async fn create_task(State(state): State<AppState>, body: Bytes) -> Response {
    let request: CreateTaskRequest = match serde_json::from_slice(&body) {
        Ok(request) => request,
        Err(e) => {
            tracing::debug!(error = %e, "Rejected undecodable task request");
            return (StatusCode::BAD_REQUEST, Json(ApiError::new("invalid json"))).into_response();
        }
    };

    match state.manager.submit_task(request.urls).await {
        Ok(id) => (StatusCode::ACCEPTED, Json(CreateTaskResponse { id })).into_response(),
        Err(e) => e.into_response(),
    }
}

/// GET /tasks - List all tasks, oldest first
#[utoipa::path(
    get,
    path = "/tasks",
    tag = "tasks",
    responses(
        (status = 200, description = "All known tasks", body = Vec<Task>)
    )
)]
pub async fn list_tasks(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.manager.list_tasks().await)
}

/// GET /tasks/{id} - Get a single task
#[utoipa::path(
    get,
    path = "/tasks/{id}",
    tag = "tasks",
    params(
        ("id" = String, Path, description = "Task ID")
    ),
    responses(
        (status = 200, description = "Task details", body = Task),
        (status = 404, description = "Task not found", body = ApiError)
    )
)]
pub async fn get_task(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    let id = TaskId::from(id);
    match state.manager.get_task(&id).await {
        Some(task) => (StatusCode::OK, Json(task)).into_response(),
        None => Error::NotFound(id.to_string()).into_response(),
    }
}

/// GET /tasks/ - Empty task ID, answered with a bodiless 404
pub async fn missing_task_id() -> StatusCode {
    StatusCode::NOT_FOUND
}
