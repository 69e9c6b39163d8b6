#![allow(dead_code)]

use std::sync::Arc;

use avstudio_api::config::ServerConfig;
use avstudio_api::router::build_app_router;
use avstudio_api::state::AppState;
use avstudio_backends::testing::ScriptedBackend;
use avstudio_events::JobStore;
use avstudio_pipeline::{Orchestrator, PipelineSession};
use avstudio_worker::{ExecutorConfig, PipelineExecutor};
use axum::body::Body;
use axum::http::{Method, Request, Response, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use tokio_util::sync::CancellationToken;
use tower::ServiceExt;

/// Build a test `ServerConfig` with safe defaults.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:3000".to_string()],
        request_timeout_secs: 30,
        shutdown_timeout_secs: 1,
    }
}

/// Application state over `backend`, with zero step delays.
pub fn test_state(backend: ScriptedBackend) -> AppState {
    let executor = PipelineExecutor::new(Arc::new(backend), ExecutorConfig::immediate());
    let jobs = JobStore::new(Arc::new(executor));
    let shutdown = CancellationToken::new();
    let (orchestrator, _task) = Orchestrator::spawn(shutdown.child_token());
    let session = Arc::new(PipelineSession::new(jobs.clone(), orchestrator, shutdown));

    AppState {
        config: Arc::new(test_config()),
        jobs,
        session,
    }
}

/// Build the full application router, mirroring `main.rs`.
pub fn build_test_app(backend: ScriptedBackend) -> (Router, AppState) {
    let state = test_state(backend);
    let app = build_app_router(state.clone(), &test_config());
    (app, state)
}

pub async fn get(app: &Router, uri: &str) -> Response<Body> {
    let request = Request::builder()
        .method(Method::GET)
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    app.clone().oneshot(request).await.unwrap()
}

pub async fn post_json(app: &Router, uri: &str, body: serde_json::Value) -> Response<Body> {
    let request = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    app.clone().oneshot(request).await.unwrap()
}

pub async fn body_text(response: Response<Body>) -> String {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    serde_json::from_str(&body_text(response).await).unwrap()
}

/// POST and assert the status, returning the decoded body.
pub async fn post_expect(
    app: &Router,
    uri: &str,
    body: serde_json::Value,
    status: StatusCode,
) -> serde_json::Value {
    let response = post_json(app, uri, body).await;
    assert_eq!(response.status(), status, "unexpected status for POST {uri}");
    body_json(response).await
}

/// One parsed SSE frame.
#[derive(Debug, Clone, PartialEq)]
pub struct SseFrame {
    pub event: String,
    pub data: serde_json::Value,
}

/// Split a complete SSE body into frames, skipping keep-alive comments.
pub fn parse_sse(body: &str) -> Vec<SseFrame> {
    body.split("\n\n")
        .filter_map(|block| {
            let mut event = None;
            let mut data = None;
            for line in block.lines() {
                if let Some(name) = line.strip_prefix("event:") {
                    event = Some(name.trim().to_string());
                } else if let Some(payload) = line.strip_prefix("data:") {
                    data = serde_json::from_str(payload.trim()).ok();
                }
            }
            Some(SseFrame {
                event: event?,
                data: data?,
            })
        })
        .collect()
}
