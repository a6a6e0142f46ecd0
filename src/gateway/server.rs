//! The local relay endpoint: `POST /api/debate`.
//!
//! Accepts `{ "prompt": string }` and answers `{ "response": string }`.
//! A missing or empty prompt is a 400; a provider failure is a 500 whose
//! body carries the fixed fallback text so clients can render it directly.

use super::{Completer, COMPLETION_ERROR_TEXT};
use crate::ParleyError;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

/// Shared state for the relay endpoint: the upstream completion backend.
#[derive(Clone)]
pub struct AppState {
    pub completer: Arc<dyn Completer>,
}

impl AppState {
    pub fn new(completer: Arc<dyn Completer>) -> Self {
        Self { completer }
    }
}

#[derive(Debug, Deserialize)]
pub struct DebateRequest {
    pub prompt: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct DebateResponse {
    pub response: String,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
}

/// Error type mapping relay failures to HTTP responses.
#[derive(Debug)]
pub enum ApiError {
    /// 400 Bad Request: missing or empty prompt.
    BadRequest(String),
    /// 500 Internal Server Error: provider failure. The body uses the
    /// `response` field with the fixed fallback text (source contract).
    ProviderFailure,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::BadRequest(message) => (
                StatusCode::BAD_REQUEST,
                Json(ErrorBody { error: message }),
            )
                .into_response(),
            ApiError::ProviderFailure => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(DebateResponse {
                    response: COMPLETION_ERROR_TEXT.to_string(),
                }),
            )
                .into_response(),
        }
    }
}

async fn debate(
    State(state): State<AppState>,
    Json(request): Json<DebateRequest>,
) -> Result<Json<DebateResponse>, ApiError> {
    let prompt = request
        .prompt
        .as_deref()
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .ok_or_else(|| ApiError::BadRequest("prompt is required".to_string()))?;

    match state.completer.complete(prompt).await {
        Ok(response) => Ok(Json(DebateResponse { response })),
        Err(ParleyError::EmptyPrompt) => {
            Err(ApiError::BadRequest("prompt is required".to_string()))
        }
        Err(e) => {
            error!(error = %e, "Provider call failed");
            Err(ApiError::ProviderFailure)
        }
    }
}

/// Create the relay router with tracing and permissive CORS.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/api/debate", post(debate))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Bind and serve the relay endpoint until the process exits.
pub async fn start_server(bind_addr: &str, state: AppState) -> crate::Result<()> {
    let router = create_router(state);

    info!("Starting debate relay on {}", bind_addr);

    let listener = tokio::net::TcpListener::bind(bind_addr)
        .await
        .map_err(|e| ParleyError::GatewayError(format!("Failed to bind {}: {}", bind_addr, e)))?;

    axum::serve(listener, router)
        .await
        .map_err(|e| ParleyError::GatewayError(format!("Server error: {}", e)))?;

    Ok(())
}
