#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{HeaderValue, Method, Request};
use axum::response::Response;
use axum::Router;
use drapely_core::config::TryOnConfig;
use drapely_pipeline::{queue, JobReceiver};
use http_body_util::BodyExt;
use tower::ServiceExt;

use drapely_api::config::ServerConfig;
use drapely_api::router::build_app_router;
use drapely_api::state::AppState;

pub const TEST_API_KEY: &str = "test-api-key";

/// Build a test `ServerConfig` with safe defaults.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec![HeaderValue::from_static("http://localhost:5173")],
        request_timeout_secs: 30,
        shutdown_drain_secs: 5,
        queue_capacity: 8,
    }
}

/// A running app plus the worker side of its job queue.
///
/// Tests inspect queued jobs through `jobs` instead of running a worker.
pub struct TestApp {
    pub router: Router,
    pub jobs: JobReceiver,
}

/// Build the full application router with the production middleware stack.
pub fn build_test_app(api_key: Option<&str>) -> TestApp {
    build_test_app_with_capacity(api_key, test_config().queue_capacity)
}

pub fn build_test_app_with_capacity(api_key: Option<&str>, capacity: usize) -> TestApp {
    let config = test_config();
    let tryon_config = TryOnConfig {
        api_key: api_key.map(str::to_string),
        ..TryOnConfig::default()
    };
    let (job_queue, jobs) = queue::channel(capacity);

    let state = AppState {
        config: Arc::new(config.clone()),
        tryon_config: Arc::new(tryon_config),
        queue: job_queue,
    };

    TestApp {
        router: build_app_router(state, &config),
        jobs,
    }
}

pub async fn get(app: Router, uri: &str) -> Response {
    app.oneshot(Request::get(uri).body(Body::empty()).unwrap())
        .await
        .unwrap()
}

/// POST a JSON body, optionally with a bearer token.
pub async fn post_json(
    app: Router,
    uri: &str,
    body: serde_json::Value,
    token: Option<&str>,
) -> Response {
    post_raw(app, uri, body.to_string(), token).await
}

/// POST a JSON document exactly as written, so object key order is kept.
pub async fn post_raw(app: Router, uri: &str, body: String, token: Option<&str>) -> Response {
    let mut builder = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header("content-type", "application/json");
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {token}"));
    }
    app.oneshot(builder.body(Body::from(body)).unwrap())
        .await
        .unwrap()
}

pub async fn body_json(response: Response) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}
