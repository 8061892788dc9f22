//! Pluggable text-generation backend abstraction
//!
//! Every model call in the insight pipeline is "send a prompt plus a role
//! instruction, receive free text". This module hides which hosted or local
//! service answers it.
//!
//! # Architecture
//!
//! - `AIBackend` trait: the single generation capability
//! - `AIClient` enum: concrete wrapper providing Clone + compile-time dispatch
//! - Backend implementations: `GeminiProxyBackend`, `OpenAICompatibleBackend`,
//!   `OllamaBackend`, `MockBackend`
//!
//! # Usage
//!
//! ```rust,ignore
//! let ai = AIClient::from_config(&config.ai);
//! let reply = generate_bounded(&ai, "Summarize...", "You are...", config.ai.timeout).await?;
//! ```
//!
//! Each call is attempted exactly once. `generate_bounded` turns an elapsed
//! timeout into `Error::Generation`; `health_check_bounded` reports a stalled
//! backend as unreachable.

mod gemini_proxy;
pub(crate) mod mock;
mod ollama;
mod openai_compatible;
pub mod parsing;

pub use gemini_proxy::GeminiProxyBackend;
pub use mock::{MockBackend, MockCall};
pub use ollama::OllamaBackend;
pub use openai_compatible::OpenAICompatibleBackend;

use std::time::Duration;

use async_trait::async_trait;
use tracing::warn;

use crate::config::{AiBackendKind, AiConfig};
use crate::error::{Error, Result};

/// Trait defining the interface for all generation backends
///
/// Backends should be Send + Sync to allow use across async tasks.
#[async_trait]
pub trait AIBackend: Send + Sync {
    /// Send one prompt with a role instruction and return the trimmed reply
    ///
    /// A reply payload that is missing or malformed yields `Ok("")`; only a
    /// call that cannot complete is an error.
    async fn generate(&self, prompt: &str, system_instruction: &str) -> Result<String>;

    /// Check if the backend is reachable
    async fn health_check(&self) -> bool;

    /// Get the model name (for logging)
    fn model(&self) -> &str;

    /// Get the host URL (for logging)
    fn host(&self) -> &str;
}

/// Concrete AI client enum
///
/// Provides Clone and compile-time dispatch without Box<dyn> overhead.
#[derive(Clone)]
pub enum AIClient {
    /// Chat proxy (`contents` + `systemInstruction`)
    GeminiProxy(GeminiProxyBackend),
    /// OpenAI-compatible backend (vLLM, LocalAI, llama-server, etc.)
    OpenAICompatible(OpenAICompatibleBackend),
    /// Ollama backend (HTTP API)
    Ollama(OllamaBackend),
    /// Mock backend for testing
    Mock(MockBackend),
}

impl AIClient {
    /// Build the client selected by configuration
    pub fn from_config(config: &AiConfig) -> Self {
        match config.backend {
            AiBackendKind::GeminiProxy => {
                AIClient::GeminiProxy(GeminiProxyBackend::new(&config.host, &config.model))
            }
            AiBackendKind::OpenAICompatible => {
                let backend = match config.api_key {
                    Some(ref key) => {
                        OpenAICompatibleBackend::with_api_key(&config.host, &config.model, key)
                    }
                    None => OpenAICompatibleBackend::new(&config.host, &config.model),
                };
                AIClient::OpenAICompatible(backend)
            }
            AiBackendKind::Ollama => AIClient::Ollama(OllamaBackend::new(&config.host, &config.model)),
            AiBackendKind::Mock => AIClient::Mock(MockBackend::new()),
        }
    }

    /// Create a mock backend for testing
    pub fn mock() -> Self {
        AIClient::Mock(MockBackend::new())
    }

    /// Short backend name for display
    pub fn kind(&self) -> AiBackendKind {
        match self {
            AIClient::GeminiProxy(_) => AiBackendKind::GeminiProxy,
            AIClient::OpenAICompatible(_) => AiBackendKind::OpenAICompatible,
            AIClient::Ollama(_) => AiBackendKind::Ollama,
            AIClient::Mock(_) => AiBackendKind::Mock,
        }
    }
}

// Implement AIBackend for AIClient by delegating to the inner backend
#[async_trait]
impl AIBackend for AIClient {
    async fn generate(&self, prompt: &str, system_instruction: &str) -> Result<String> {
        match self {
            AIClient::GeminiProxy(b) => b.generate(prompt, system_instruction).await,
            AIClient::OpenAICompatible(b) => b.generate(prompt, system_instruction).await,
            AIClient::Ollama(b) => b.generate(prompt, system_instruction).await,
            AIClient::Mock(b) => b.generate(prompt, system_instruction).await,
        }
    }

    async fn health_check(&self) -> bool {
        match self {
            AIClient::GeminiProxy(b) => b.health_check().await,
            AIClient::OpenAICompatible(b) => b.health_check().await,
            AIClient::Ollama(b) => b.health_check().await,
            AIClient::Mock(b) => b.health_check().await,
        }
    }

    fn model(&self) -> &str {
        match self {
            AIClient::GeminiProxy(b) => b.model(),
            AIClient::OpenAICompatible(b) => b.model(),
            AIClient::Ollama(b) => b.model(),
            AIClient::Mock(b) => b.model(),
        }
    }

    fn host(&self) -> &str {
        match self {
            AIClient::GeminiProxy(b) => b.host(),
            AIClient::OpenAICompatible(b) => b.host(),
            AIClient::Ollama(b) => b.host(),
            AIClient::Mock(b) => b.host(),
        }
    }
}

/// Run one generation call with an upper bound on its duration
pub async fn generate_bounded(
    backend: &dyn AIBackend,
    prompt: &str,
    system_instruction: &str,
    timeout: Duration,
) -> Result<String> {
    match tokio::time::timeout(timeout, backend.generate(prompt, system_instruction)).await {
        Ok(result) => result,
        Err(_) => Err(Error::Generation(format!(
            "timed out after {:?} waiting for {}",
            timeout,
            backend.host()
        ))),
    }
}

/// Health check with the same upper bound as generation calls
///
/// A backend that does not answer in time counts as unreachable.
pub async fn health_check_bounded(backend: &dyn AIBackend, timeout: Duration) -> bool {
    match tokio::time::timeout(timeout, backend.health_check()).await {
        Ok(healthy) => healthy,
        Err(_) => {
            warn!(host = backend.host(), timeout = ?timeout, "Health check timed out");
            false
        }
    }
}
