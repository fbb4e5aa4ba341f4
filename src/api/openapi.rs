//! OpenAPI documentation and schema generation

use utoipa::OpenApi;

/// OpenAPI documentation for the batch-dl REST API
///
/// Served at `/openapi.json`, and at `/swagger-ui` when enabled.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "batch-dl REST API",
        version = "0.1.0",
        description = "Submit batches of URLs as tasks and follow their downloads"
    ),
    servers(
        (url = "http://localhost:8080", description = "Local development server")
    ),
    paths(
        // Tasks
        crate::api::routes::create_task,
        crate::api::routes::list_tasks,
        crate::api::routes::get_task,

        // System
        crate::api::routes::health_check,
        crate::api::routes::openapi_spec,
        crate::api::routes::event_stream,
    ),
    components(
        schemas(
            crate::types::TaskId,
            crate::types::Task,
            crate::types::TaskStatus,
            crate::types::FileEntry,
            crate::types::FileStatus,
            crate::types::CreateTaskRequest,
            crate::types::CreateTaskResponse,
            crate::types::Event,
            crate::error::ApiError,
        )
    ),
    tags(
        (name = "tasks", description = "Task creation and lookup"),
        (name = "system", description = "Health, events and API documentation")
    )
)]
pub struct ApiDoc;

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openapi_lists_task_routes() {
        let doc = ApiDoc::openapi();
        let paths: Vec<&String> = doc.paths.paths.keys().collect();

        assert!(paths.iter().any(|p| p.as_str() == "/tasks"));
        assert!(paths.iter().any(|p| p.as_str() == "/tasks/{id}"));
        assert!(paths.iter().any(|p| p.as_str() == "/events"));
    }

    #[test]
    fn test_openapi_serializes() {
        let json = serde_json::to_value(ApiDoc::openapi()).unwrap();
        assert_eq!(json["info"]["title"], "batch-dl REST API");
        assert!(json["components"]["schemas"]["Task"].is_object());
    }
}
