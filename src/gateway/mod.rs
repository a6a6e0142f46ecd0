//! Completion gateway: relay between the conversation and the LLM provider.
//!
//! Three pieces share one `Completer` seam:
//! - `provider`: the upstream Ollama-style generation call
//! - `server`: the local `POST /api/debate` relay endpoint
//! - `client`: the controller-side client for that endpoint

pub mod client;
pub mod provider;
pub mod server;

pub use client::DebateClient;
pub use provider::{OllamaProvider, ProviderConfig};
pub use server::{create_router, start_server, AppState};

use crate::Result;
use async_trait::async_trait;

/// Fixed system framing prepended to every relayed prompt.
pub const SYSTEM_PROMPT: &str =
    "You are a debate assistant. Respond logically and persuasively.";

/// Fallback text shown in place of a reply when the gateway fails.
pub const COMPLETION_ERROR_TEXT: &str = "Error generating response.";

/// A completion backend: prompt in, full (non-streamed) reply text out.
///
/// Implemented by the upstream provider, the HTTP relay client, and test
/// doubles. Prompts must be non-empty; an empty prompt is a caller error.
#[async_trait]
pub trait Completer: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String>;
}
