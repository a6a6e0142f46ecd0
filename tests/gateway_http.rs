//! HTTP-level tests for the debate relay endpoint.
//!
//! Drives the axum router directly with oneshot requests; the upstream
//! provider is stubbed so no network is involved.

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::Value;
use std::sync::Arc;
use tower::ServiceExt;

use parley::gateway::{create_router, AppState, Completer, COMPLETION_ERROR_TEXT};
use parley::{ParleyError, Result};

struct EchoCompleter;

#[async_trait]
impl Completer for EchoCompleter {
    async fn complete(&self, prompt: &str) -> Result<String> {
        Ok(format!("echo: {}", prompt))
    }
}

struct FailingCompleter;

#[async_trait]
impl Completer for FailingCompleter {
    async fn complete(&self, _prompt: &str) -> Result<String> {
        Err(ParleyError::ProviderError("connection refused".into()))
    }
}

fn make_app(completer: Arc<dyn Completer>) -> axum::Router {
    create_router(AppState::new(completer))
}

fn post_json(json: &str) -> Request<Body> {
    Request::post("/api/debate")
        .header("content-type", "application/json")
        .body(Body::from(json.to_string()))
        .unwrap()
}

async fn body_json(resp: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(resp.into_body(), 1024 * 1024)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_valid_prompt_returns_completion() {
    let app = make_app(Arc::new(EchoCompleter));
    let resp = app
        .oneshot(post_json(r#"{"prompt":"Hello"}"#))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_json(resp).await;
    assert_eq!(body["response"], "echo: Hello");
}

#[tokio::test]
async fn test_missing_prompt_is_bad_request() {
    let app = make_app(Arc::new(EchoCompleter));
    let resp = app.oneshot(post_json(r#"{}"#)).await.unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body = body_json(resp).await;
    assert_eq!(body["error"], "prompt is required");
}

#[tokio::test]
async fn test_empty_prompt_is_bad_request() {
    let app = make_app(Arc::new(EchoCompleter));
    let resp = app
        .oneshot(post_json(r#"{"prompt":"   "}"#))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_provider_failure_maps_to_fixed_fallback() {
    let app = make_app(Arc::new(FailingCompleter));
    let resp = app
        .oneshot(post_json(r#"{"prompt":"Hello"}"#))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = body_json(resp).await;
    assert_eq!(body["response"], COMPLETION_ERROR_TEXT);
}

#[tokio::test]
async fn test_malformed_body_is_client_error() {
    let app = make_app(Arc::new(EchoCompleter));
    let resp = app.oneshot(post_json("{not json")).await.unwrap();
    assert!(resp.status().is_client_error());
}
