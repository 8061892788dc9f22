//! Ollama backend implementation
//!
//! HTTP client for the Ollama `/api/generate` endpoint. The role instruction
//! goes in Ollama's `system` field.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};

use super::AIBackend;

/// Ollama backend
#[derive(Clone)]
pub struct OllamaBackend {
    http_client: Client,
    base_url: String,
    model: String,
}

impl OllamaBackend {
    pub fn new(base_url: &str, model: &str) -> Self {
        Self {
            http_client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
        }
    }
}

/// Request to Ollama API
#[derive(Debug, Serialize)]
struct OllamaRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    system: &'a str,
    stream: bool,
}

/// Response from Ollama API
#[derive(Debug, Deserialize)]
struct OllamaResponse {
    #[serde(default)]
    response: Option<String>,
}

#[async_trait]
impl AIBackend for OllamaBackend {
    async fn generate(&self, prompt: &str, system_instruction: &str) -> Result<String> {
        let request = OllamaRequest {
            model: &self.model,
            prompt,
            system: system_instruction,
            stream: false,
        };

        let response = self
            .http_client
            .post(format!("{}/api/generate", self.base_url))
            .json(&request)
            .send()
            .await
            .map_err(Error::generation)?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Generation(format!(
                "Ollama error {}: {}",
                status, body
            )));
        }

        let body = response.text().await.map_err(Error::generation)?;
        let reply = match serde_json::from_str::<OllamaResponse>(&body) {
            Ok(r) => r.response.unwrap_or_default(),
            Err(e) => {
                debug!(error = %e, "Unparseable Ollama body, using empty reply");
                String::new()
            }
        };

        Ok(reply.trim().to_string())
    }

    async fn health_check(&self) -> bool {
        match self
            .http_client
            .get(format!("{}/api/tags", self.base_url))
            .send()
            .await
        {
            Ok(resp) => resp.status().is_success(),
            Err(_) => false,
        }
    }

    fn model(&self) -> &str {
        &self.model
    }

    fn host(&self) -> &str {
        &self.base_url
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_carries_system_field() {
        let request = OllamaRequest {
            model: "llama3.2",
            prompt: "p",
            system: "s",
            stream: false,
        };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["system"], "s");
        assert_eq!(value["prompt"], "p");
    }

    #[test]
    fn test_missing_response_field() {
        let r: OllamaResponse = serde_json::from_str(r#"{"done":true}"#).unwrap();
        assert!(r.response.is_none());
    }
}
