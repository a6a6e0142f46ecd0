//! Upstream LLM provider client (Ollama-style generate API).
//!
//! Sends the framed prompt to `POST {base_url}/api/generate` with
//! `stream: false` and returns the full response text. No retry and no
//! timeout beyond transport defaults.

use super::{Completer, SYSTEM_PROMPT};
use crate::{ParleyError, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

const DEFAULT_BASE_URL: &str = "http://localhost:11434";
const DEFAULT_MODEL: &str = "llama3.1";

/// Configuration for the upstream provider.
#[derive(Clone, Debug)]
pub struct ProviderConfig {
    /// Base URL of the generation API.
    pub base_url: String,

    /// Model name passed with every request.
    pub model: String,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
        }
    }
}

impl ProviderConfig {
    /// Override defaults from `PARLEY_PROVIDER_URL` / `PARLEY_MODEL`.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(url) = std::env::var("PARLEY_PROVIDER_URL") {
            config.base_url = url;
        }
        if let Ok(model) = std::env::var("PARLEY_MODEL") {
            config.model = model;
        }
        config
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }
}

#[derive(Serialize)]
struct GenerateRequest {
    model: String,
    prompt: String,
    stream: bool,
}

#[derive(Deserialize)]
struct GenerateResponse {
    response: String,
}

/// Client for the upstream generation API.
#[derive(Clone)]
pub struct OllamaProvider {
    client: Client,
    config: ProviderConfig,
}

impl OllamaProvider {
    pub fn new(config: ProviderConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    /// Frame a user prompt with the fixed debate-assistant instruction.
    pub fn frame_prompt(prompt: &str) -> String {
        format!("{} User: {}", SYSTEM_PROMPT, prompt)
    }

    fn endpoint(&self) -> String {
        format!("{}/api/generate", self.config.base_url.trim_end_matches('/'))
    }
}

#[async_trait]
impl Completer for OllamaProvider {
    async fn complete(&self, prompt: &str) -> Result<String> {
        if prompt.trim().is_empty() {
            return Err(ParleyError::EmptyPrompt);
        }

        let request = GenerateRequest {
            model: self.config.model.clone(),
            prompt: Self::frame_prompt(prompt),
            stream: false,
        };

        debug!(model = %request.model, "Sending completion request");

        let response = self
            .client
            .post(self.endpoint())
            .json(&request)
            .send()
            .await
            .map_err(|e| ParleyError::ProviderError(format!("Request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(ParleyError::ProviderError(format!(
                "Provider returned status {}",
                response.status()
            )));
        }

        let body: GenerateResponse = response
            .json()
            .await
            .map_err(|e| ParleyError::ProviderError(format!("Invalid provider response: {}", e)))?;

        Ok(body.response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_prompt_includes_system_framing() {
        let framed = OllamaProvider::frame_prompt("Is water wet?");
        assert!(framed.starts_with(SYSTEM_PROMPT));
        assert!(framed.ends_with("User: Is water wet?"));
    }

    #[test]
    fn test_endpoint_trims_trailing_slash() {
        let provider = OllamaProvider::new(ProviderConfig {
            base_url: "http://localhost:11434/".to_string(),
            model: "llama3.1".to_string(),
        });
        assert_eq!(provider.endpoint(), "http://localhost:11434/api/generate");
    }

    #[tokio::test]
    async fn test_empty_prompt_is_rejected_before_any_request() {
        let provider = OllamaProvider::new(ProviderConfig::default());
        let err = provider.complete("   ").await.unwrap_err();
        assert!(matches!(err, ParleyError::EmptyPrompt));
    }

    #[test]
    fn test_generate_response_parses() {
        let body: GenerateResponse =
            serde_json::from_str(r#"{"response":"Hi there","model":"llama3.1","done":true}"#)
                .unwrap();
        assert_eq!(body.response, "Hi there");
    }
}
