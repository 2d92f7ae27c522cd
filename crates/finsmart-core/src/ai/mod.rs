//! Pluggable AI text-completion backends
//!
//! The core treats the model as an external completion service: a prompt
//! goes in, free text comes out. Callers extract JSON from that text
//! themselves and fall back to rule-based logic on any failure.
//!
//! # Architecture
//!
//! - `AIBackend` trait: one completion call plus health/identity
//! - `AIClient` enum: concrete wrapper providing Clone + compile-time dispatch
//! - Backend implementations: `OpenAICompatibleBackend`, `OllamaBackend`, `MockBackend`
//!
//! # Configuration
//!
//! Environment variables:
//! - `AI_BACKEND`: Backend to use (openai_compatible, ollama, mock). Default: openai_compatible
//! - `OPENAI_COMPATIBLE_HOST`: Server URL (default https://api.deepseek.com when
//!   `DEEPSEEK_API_KEY` is set)
//! - `OPENAI_COMPATIBLE_MODEL`: Model name (default: deepseek-chat)
//! - `OPENAI_COMPATIBLE_API_KEY` / `DEEPSEEK_API_KEY`: Bearer token
//! - `OLLAMA_HOST`: Ollama server URL (required for ollama backend)
//! - `OLLAMA_MODEL`: Model name (default: llama3.2)
//!
//! Missing configuration means no client at all, which callers treat as
//! an ordinary reason to use the rule-based path.

mod mock;
mod ollama;
mod openai_compatible;
pub mod parsing;
pub mod types;

pub use mock::MockBackend;
pub use ollama::OllamaBackend;
pub use openai_compatible::OpenAICompatibleBackend;
pub use parsing::{extract_json_array, parse_json_array};
pub use types::{AiAmount, AiInsightItem, AiRecommendationItem, AiTransactionItem};

use std::time::Duration;

use async_trait::async_trait;

use crate::error::Result;

/// Default HTTP timeout for completion calls
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(20);

/// Interface every completion backend implements
#[async_trait]
pub trait AIBackend: Send + Sync {
    /// Run one completion and return the model's raw text
    async fn complete(&self, system: Option<&str>, user: &str) -> Result<String>;

    /// Whether the server answers its listing endpoint
    async fn health_check(&self) -> bool;

    /// Model name (for logging)
    fn model(&self) -> &str;

    /// Host URL (for logging)
    fn host(&self) -> &str;
}

/// Backend selected at startup
#[derive(Clone)]
pub enum AIClient {
    /// OpenAI-compatible chat completions (DeepSeek, vLLM, LocalAI, llama-server)
    OpenAICompatible(OpenAICompatibleBackend),
    /// Ollama backend (HTTP API)
    Ollama(OllamaBackend),
    /// Mock backend for testing
    Mock(MockBackend),
}

impl AIClient {
    /// Pick a backend from `AI_BACKEND` and its variables
    ///
    /// Returns None if the selected backend is not configured.
    pub fn from_env() -> Option<Self> {
        let backend =
            std::env::var("AI_BACKEND").unwrap_or_else(|_| "openai_compatible".to_string());

        match backend.to_lowercase().as_str() {
            "openai_compatible" | "openai" | "deepseek" => {
                OpenAICompatibleBackend::from_env().map(AIClient::OpenAICompatible)
            }
            "ollama" => OllamaBackend::from_env().map(AIClient::Ollama),
            "mock" => Some(AIClient::Mock(MockBackend::new())),
            "none" | "off" | "" => None,
            _ => {
                tracing::warn!(backend = %backend, "Unknown AI_BACKEND, falling back to openai_compatible");
                OpenAICompatibleBackend::from_env().map(AIClient::OpenAICompatible)
            }
        }
    }

    pub fn mock() -> Self {
        AIClient::Mock(MockBackend::new())
    }

    /// Same backend, another model
    pub fn with_model(&self, model: &str) -> Self {
        match self {
            AIClient::OpenAICompatible(b) => AIClient::OpenAICompatible(b.with_model(model)),
            AIClient::Ollama(b) => AIClient::Ollama(b.with_model(model)),
            AIClient::Mock(b) => AIClient::Mock(b.with_model(model)),
        }
    }

    /// Rebuild the HTTP client with a request timeout
    pub fn with_timeout(self, timeout: Duration) -> Self {
        match self {
            AIClient::OpenAICompatible(b) => AIClient::OpenAICompatible(b.with_timeout(timeout)),
            AIClient::Ollama(b) => AIClient::Ollama(b.with_timeout(timeout)),
            AIClient::Mock(b) => AIClient::Mock(b),
        }
    }

    /// Backend kind, for logging and CLI output
    pub fn kind(&self) -> &'static str {
        match self {
            AIClient::OpenAICompatible(_) => "openai_compatible",
            AIClient::Ollama(_) => "ollama",
            AIClient::Mock(_) => "mock",
        }
    }
}

#[async_trait]
impl AIBackend for AIClient {
    async fn complete(&self, system: Option<&str>, user: &str) -> Result<String> {
        match self {
            AIClient::OpenAICompatible(b) => b.complete(system, user).await,
            AIClient::Ollama(b) => b.complete(system, user).await,
            AIClient::Mock(b) => b.complete(system, user).await,
        }
    }

    async fn health_check(&self) -> bool {
        match self {
            AIClient::OpenAICompatible(b) => b.health_check().await,
            AIClient::Ollama(b) => b.health_check().await,
            AIClient::Mock(b) => b.health_check().await,
        }
    }

    fn model(&self) -> &str {
        match self {
            AIClient::OpenAICompatible(b) => b.model(),
            AIClient::Ollama(b) => b.model(),
            AIClient::Mock(b) => b.model(),
        }
    }

    fn host(&self) -> &str {
        match self {
            AIClient::OpenAICompatible(b) => b.host(),
            AIClient::Ollama(b) => b.host(),
            AIClient::Mock(b) => b.host(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_client_identity() {
        let client = AIClient::mock();
        assert_eq!(client.kind(), "mock");
        assert_eq!(client.model(), "mock");
        let renamed = client.with_model("other");
        assert_eq!(renamed.model(), "other");
    }

    #[tokio::test]
    async fn test_client_delegates_completion() {
        let client = AIClient::Mock(MockBackend::new().with_response("[1, 2]"));
        let text = client.complete(Some("system"), "user").await.unwrap();
        assert_eq!(text, "[1, 2]");
        assert!(client.health_check().await);
    }
}
