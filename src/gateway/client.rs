//! Controller-side client for the local `POST /api/debate` relay.

use super::Completer;
use crate::{ParleyError, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

#[derive(Serialize)]
struct DebateRequest {
    prompt: String,
}

#[derive(Deserialize)]
struct DebateResponse {
    response: String,
}

/// HTTP client for the debate relay endpoint.
#[derive(Clone)]
pub struct DebateClient {
    client: Client,
    endpoint: String,
}

impl DebateClient {
    /// Create a client for the given endpoint URL
    /// (e.g. `http://127.0.0.1:3030/api/debate`).
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            endpoint: endpoint.into(),
        }
    }
}

#[async_trait]
impl Completer for DebateClient {
    async fn complete(&self, prompt: &str) -> Result<String> {
        if prompt.trim().is_empty() {
            return Err(ParleyError::EmptyPrompt);
        }

        let response = self
            .client
            .post(&self.endpoint)
            .json(&DebateRequest {
                prompt: prompt.to_string(),
            })
            .send()
            .await
            .map_err(|e| ParleyError::GatewayError(format!("Request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(ParleyError::GatewayError(format!(
                "Gateway returned status {}",
                response.status()
            )));
        }

        let body: DebateResponse = response
            .json()
            .await
            .map_err(|e| ParleyError::GatewayError(format!("Invalid gateway response: {}", e)))?;

        Ok(body.response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_empty_prompt_is_rejected_locally() {
        let client = DebateClient::new("http://127.0.0.1:1/api/debate");
        let err = client.complete("").await.unwrap_err();
        assert!(matches!(err, ParleyError::EmptyPrompt));
    }

    #[test]
    fn test_request_body_shape() {
        let json = serde_json::to_string(&DebateRequest {
            prompt: "Hello".to_string(),
        })
        .unwrap();
        assert_eq!(json, r#"{"prompt":"Hello"}"#);
    }
}
