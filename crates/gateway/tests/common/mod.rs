//! Test harness: the production router wired against a mock backend.
#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Method, Request};
use axum::response::Response;
use axum::Router;
use http_body_util::BodyExt;
use tower::ServiceExt;

use revq_core::store::ReviewStore;
use revq_gateway::config::GatewayConfig;
use revq_gateway::router::build_app_router;
use revq_gateway::state::AppState;
use revq_queue::{ReviewEvents, ReviewQueueController, UpdateDetector};
use revq_rag::RagApi;

/// Build a test `GatewayConfig` pointing at the given backend URL.
pub fn test_config(backend_url: &str) -> GatewayConfig {
    GatewayConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:3000".to_string()],
        request_timeout_secs: 30,
        backend_base_url: backend_url.to_string(),
        backend_token: "test-token".to_string(),
        backend_timeout_secs: 5,
        poll_interval_secs: 60,
        page_size: 5,
    }
}

pub struct TestApp {
    pub router: Router,
    pub state: AppState,
}

/// Build the full application router with all middleware layers, wired to
/// a real `RagApi` pointing at `backend_url` (normally a wiremock server).
///
/// This mirrors the wiring in `main.rs` so integration tests exercise the
/// same middleware stack and state machine that production uses.
pub fn build_test_app(backend_url: &str) -> TestApp {
    let config = test_config(backend_url);

    let store: Arc<dyn ReviewStore> = Arc::new(
        RagApi::new(&config.backend_base_url, &config.backend_token)
            .with_timeout(Duration::from_secs(config.backend_timeout_secs)),
    );
    let events = ReviewEvents::default();
    let detector = Arc::new(UpdateDetector::new(Arc::clone(&store), events.clone()));
    let controller = Arc::new(ReviewQueueController::new(
        Arc::clone(&store),
        Arc::clone(&detector),
        events.clone(),
        config.page_size,
        Duration::from_secs(config.poll_interval_secs),
    ));

    let state = AppState {
        config: Arc::new(config),
        store,
        controller,
        detector,
        events,
    };
    let router = build_app_router(state.clone(), &state.config);
    TestApp { router, state }
}

pub async fn get(app: Router, uri: &str) -> Response {
    app.oneshot(
        Request::builder()
            .uri(uri)
            .body(Body::empty())
            .unwrap(),
    )
    .await
    .unwrap()
}

pub async fn post_json(app: Router, uri: &str, body: serde_json::Value) -> Response {
    send_json(app, Method::POST, uri, body).await
}

pub async fn patch_json(app: Router, uri: &str, body: serde_json::Value) -> Response {
    send_json(app, Method::PATCH, uri, body).await
}

async fn send_json(app: Router, method: Method, uri: &str, body: serde_json::Value) -> Response {
    app.oneshot(
        Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
    )
    .await
    .unwrap()
}

pub async fn body_json(response: Response) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}
