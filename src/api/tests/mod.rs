use super::*;
use crate::manager::test_helpers::StubFetcher;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use std::time::Duration;
use tower::ServiceExt;


/// Helper to create a test TaskManager wrapped in Arc
async fn create_test_manager() -> (Arc<TaskManager>, Arc<StubFetcher>, tempfile::TempDir) {
    let (manager, fetcher, temp_dir) = crate::manager::test_helpers::create_test_manager().await;
    (Arc::new(manager), fetcher, temp_dir)
}

/// Router over a fresh test manager
async fn create_test_app() -> (Router, Arc<TaskManager>, tempfile::TempDir) {
    let (manager, _fetcher, temp_dir) = create_test_manager().await;
    let config = manager.get_config();
    (create_router(manager.clone(), config), manager, temp_dir)
}

/// Send one request through the router, returning status and raw body
async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Vec<u8>) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, body.to_vec())
}

fn json(body: &[u8]) -> serde_json::Value {
    serde_json::from_slice(body).unwrap()
}

fn post_json(uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get_request(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

#[tokio::test]
async fn test_api_server_binds_and_stops() {
    let (manager, _fetcher, _temp_dir) = create_test_manager().await;

    let handle = manager.spawn_api_server().await.unwrap();
    assert_ne!(handle.local_addr().port(), 0);

    handle.stop(Duration::from_secs(1)).await.unwrap();
}

#[tokio::test]
async fn test_api_server_bind_failure_is_reported() {
    let (manager, _fetcher, _temp_dir) = create_test_manager().await;
    let first = manager.spawn_api_server().await.unwrap();

    let mut config = (*manager.get_config()).clone();
    config.server.api.bind_address = first.local_addr();
    let err = bind_api_server(manager.clone(), Arc::new(config))
        .await
        .err()
        .expect("second bind on the same port must fail");
    assert!(matches!(err, Error::ApiServerError(_)));

    first.stop(Duration::from_secs(1)).await.unwrap();
}

#[tokio::test]
async fn test_start_api_server_returns_after_cancel() {
    let (manager, _fetcher, _temp_dir) = create_test_manager().await;
    let config = manager.get_config();
    let shutdown = CancellationToken::new();

    let server = tokio::spawn(start_api_server(manager, config, shutdown.clone()));
    tokio::time::sleep(Duration::from_millis(50)).await;
    shutdown.cancel();

    tokio::time::timeout(Duration::from_secs(2), server)
        .await
        .unwrap()
        .unwrap()
        .unwrap();
}

#[tokio::test]
async fn test_cors_enabled() {
    let (manager, _fetcher, _temp_dir) = create_test_manager().await;

    let mut config = (*manager.get_config()).clone();
    config.server.api.cors_enabled = true;
    config.server.api.cors_origins = vec!["*".to_string()];
    let app = create_router(manager, Arc::new(config));

    let request = Request::builder()
        .uri("/health")
        .header("Origin", "http://localhost:3000")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(
        response
            .headers()
            .contains_key("access-control-allow-origin"),
        "CORS header should be present when CORS is enabled"
    );
}

#[tokio::test]
async fn test_cors_disabled() {
    let (manager, _fetcher, _temp_dir) = create_test_manager().await;

    let mut config = (*manager.get_config()).clone();
    config.server.api.cors_enabled = false;
    let app = create_router(manager, Arc::new(config));

    let request = Request::builder()
        .uri("/health")
        .header("Origin", "http://localhost:3000")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert!(!response.headers().contains_key("access-control-allow-origin"));
}

#[tokio::test]
async fn test_swagger_ui_mounted_when_enabled() {
    let (manager, _fetcher, _temp_dir) = create_test_manager().await;

    let mut config = (*manager.get_config()).clone();
    config.server.api.swagger_ui = true;
    let app = create_router(manager, Arc::new(config));

    let (status, body) = send(&app, get_request("/swagger-ui/openapi.json")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json(&body)["info"]["title"], "batch-dl REST API");
}
