//! Chat proxy backend
//!
//! Talks to a hosted proxy in front of Gemini. The request carries the
//! conversation as role-tagged `contents` turns plus a `systemInstruction`:
//!
//! ```json
//! {
//!   "contents": [{"role": "user", "parts": [{"text": "..."}]}],
//!   "systemInstruction": {"role": "user", "parts": [{"text": "..."}]}
//! }
//! ```
//!
//! The reply text is read from `reply`. Proxies that forward the raw Gemini
//! response are also understood (`candidates[0].content.parts[0].text`).

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::{Error, Result};

use super::AIBackend;

/// Backend for the `contents` + `systemInstruction` chat proxy
#[derive(Clone)]
pub struct GeminiProxyBackend {
    http_client: Client,
    endpoint: String,
    model: String,
}

impl GeminiProxyBackend {
    /// Create a backend posting to `endpoint`
    ///
    /// The proxy chooses the model itself; `model` is kept for display.
    pub fn new(endpoint: &str, model: &str) -> Self {
        Self {
            http_client: Client::new(),
            endpoint: endpoint.to_string(),
            model: model.to_string(),
        }
    }
}

/// Chat proxy request body
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ProxyRequest<'a> {
    contents: Vec<Turn<'a>>,
    system_instruction: Turn<'a>,
}

/// One role-tagged turn
#[derive(Debug, Serialize)]
struct Turn<'a> {
    role: &'a str,
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

impl<'a> Turn<'a> {
    fn user(text: &'a str) -> Self {
        Self {
            role: "user",
            parts: vec![Part { text }],
        }
    }
}

/// Pull the reply text out of a proxy response body
fn extract_reply(body: &Value) -> Option<&str> {
    if let Some(reply) = body.get("reply").and_then(Value::as_str) {
        return Some(reply);
    }
    body.pointer("/candidates/0/content/parts/0/text")
        .and_then(Value::as_str)
}

fn truncate(s: &str, max: usize) -> String {
    if s.len() <= max {
        s.to_string()
    } else {
        let mut end = max;
        while !s.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}...", &s[..end])
    }
}

#[async_trait]
impl AIBackend for GeminiProxyBackend {
    async fn generate(&self, prompt: &str, system_instruction: &str) -> Result<String> {
        let request = ProxyRequest {
            contents: vec![Turn::user(prompt)],
            // The proxy expects the instruction tagged as a user turn
            system_instruction: Turn::user(system_instruction),
        };

        let response = self
            .http_client
            .post(&self.endpoint)
            .json(&request)
            .send()
            .await
            .map_err(Error::generation)?;

        let status = response.status();
        let body = response.text().await.map_err(Error::generation)?;
        let parsed: Option<Value> = serde_json::from_str(&body).ok();
        let reply = parsed.as_ref().and_then(extract_reply).map(str::trim);

        if status.is_success() {
            if reply.is_none() {
                debug!(status = %status, "Proxy reply had no text, using empty reply");
            }
            return Ok(reply.unwrap_or_default().to_string());
        }

        match reply {
            Some(text) if !text.is_empty() => {
                warn!(status = %status, "Proxy returned an error status with a usable reply");
                Ok(text.to_string())
            }
            _ => Err(Error::Generation(format!(
                "proxy returned {}: {}",
                status,
                truncate(&body, 200)
            ))),
        }
    }

    async fn health_check(&self) -> bool {
        // The chat route only accepts POST; any HTTP answer means it is up
        self.http_client.get(&self.endpoint).send().await.is_ok()
    }

    fn model(&self) -> &str {
        &self.model
    }

    fn host(&self) -> &str {
        &self.endpoint
    }
}
