//! REST API server module
//!
//! Accepts URL batches as tasks and reports task progress over HTTP.

use crate::error::Error;
use crate::{Config, Result, TaskManager};
use axum::{
    Router,
    http::HeaderValue,
    routing::{get, post},
};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

pub mod error_response;
pub mod openapi;
pub mod routes;
pub mod state;

pub use openapi::ApiDoc;
pub use state::AppState;

/// Create the API router with all route definitions
///
/// # Routes
///
/// ## Tasks
/// - `POST /tasks` - Create a task from a list of URLs
/// - `GET /tasks` - List all tasks, oldest first
/// - `GET /tasks/:id` - Get a single task
///
/// ## System
/// - `GET /health` - Health check
/// - `GET /openapi.json` - OpenAPI specification
/// - `GET /swagger-ui` - Interactive Swagger UI documentation (if enabled)
/// - `GET /events` - Server-sent events stream
pub fn create_router(manager: Arc<TaskManager>, config: Arc<Config>) -> Router {
    let state = AppState::new(manager, config.clone());

    let router = Router::new()
        // Tasks
        .route("/tasks", post(routes::create_task))
        .route("/tasks", get(routes::list_tasks))
        .route("/tasks/", get(routes::missing_task_id))
        .route("/tasks/:id", get(routes::get_task))
        // System
        .route("/health", get(routes::health_check))
        .route("/openapi.json", get(routes::openapi_spec))
        .route("/events", get(routes::event_stream));

    // Swagger UI serves its own copy of the document; `/openapi.json` is already routed above
    let router = if config.server.api.swagger_ui {
        router.merge(
            SwaggerUi::new("/swagger-ui").url("/swagger-ui/openapi.json", ApiDoc::openapi()),
        )
    } else {
        router
    };

    let router = router.with_state(state).layer(TraceLayer::new_for_http());

    if config.server.api.cors_enabled {
        let cors = build_cors_layer(&config.server.api.cors_origins);
        router.layer(cors)
    } else {
        router
    }
}

/// Build a CORS layer based on configured origins
///
/// `"*"` or an empty list allows any origin.
fn build_cors_layer(origins: &[String]) -> CorsLayer {
    let allow_any = origins.iter().any(|o| o == "*");

    if allow_any || origins.is_empty() {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        let allowed: Vec<HeaderValue> = origins.iter().filter_map(|o| o.parse().ok()).collect();

        CorsLayer::new()
            .allow_origin(AllowOrigin::list(allowed))
            .allow_methods(Any)
            .allow_headers(Any)
    }
}

/// A running API server spawned by [`bind_api_server`]
pub struct ApiServerHandle {
    local_addr: SocketAddr,
    shutdown: CancellationToken,
    join: JoinHandle<Result<()>>,
}

impl ApiServerHandle {
    /// Address the listener is actually bound to
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Stop accepting connections and wait for open ones to finish
    ///
    /// Connections still open after `timeout` (for example SSE subscribers)
    /// are dropped by aborting the server task.
    pub async fn stop(mut self, timeout: Duration) -> Result<()> {
        self.shutdown.cancel();

        match tokio::time::timeout(timeout, &mut self.join).await {
            Ok(Ok(result)) => result,
            Ok(Err(e)) => Err(Error::ApiServerError(format!("server task failed: {e}"))),
            Err(_) => {
                self.join.abort();
                Err(Error::ApiServerError(format!(
                    "server did not stop within {}s",
                    timeout.as_secs_f64()
                )))
            }
        }
    }
}

/// Bind the configured address and serve the API in a background task.
///
/// Bind failures are returned here rather than from the spawned task.
pub async fn bind_api_server(
    manager: Arc<TaskManager>,
    config: Arc<Config>,
) -> Result<ApiServerHandle> {
    let listener = bind_listener(config.server.api.bind_address).await?;
    let local_addr = listener.local_addr()?;

    let shutdown = CancellationToken::new();
    let app = create_router(manager, config);
    let join = tokio::spawn(serve(listener, app, shutdown.clone()));

    Ok(ApiServerHandle {
        local_addr,
        shutdown,
        join,
    })
}

/// Start the API server on the configured bind address.
///
/// Runs until `shutdown` is cancelled and every open connection has closed.
///
/// # Example
///
/// ```no_run
/// use batch_dl::{TaskManager, Config};
/// use std::sync::Arc;
/// use tokio_util::sync::CancellationToken;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = Arc::new(Config::default());
/// let manager = Arc::new(TaskManager::new((*config).clone()).await?);
///
/// // Start API server (blocks until shutdown)
/// batch_dl::api::start_api_server(manager, config, CancellationToken::new()).await?;
/// # Ok(())
/// # }
/// ```
pub async fn start_api_server(
    manager: Arc<TaskManager>,
    config: Arc<Config>,
    shutdown: CancellationToken,
) -> Result<()> {
    let listener = bind_listener(config.server.api.bind_address).await?;
    let app = create_router(manager, config);
    serve(listener, app, shutdown).await
}

async fn bind_listener(bind_address: SocketAddr) -> Result<TcpListener> {
    tracing::info!(address = %bind_address, "Starting API server");

    let listener = TcpListener::bind(bind_address).await.map_err(|e| {
        Error::ApiServerError(format!("failed to bind {bind_address}: {e}"))
    })?;

    tracing::info!(address = %listener.local_addr()?, "API server listening");
    Ok(listener)
}

async fn serve(listener: TcpListener, app: Router, shutdown: CancellationToken) -> Result<()> {
    axum::serve(listener, app)
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await
        .map_err(|e| Error::ApiServerError(e.to_string()))?;

    tracing::info!("API server stopped");
    Ok(())
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests;
