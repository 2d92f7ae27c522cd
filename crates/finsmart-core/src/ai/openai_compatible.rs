//! Chat-completions backend
//!
//! Receipt and insight prompts are sent as one system and one user message.
//! Known servers:
//! - DeepSeek (https://api.deepseek.com)
//! - vLLM (http://localhost:8000)
//! - LocalAI / llama-server (http://localhost:8080)

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};

use super::{AIBackend, DEFAULT_TIMEOUT};

const DEEPSEEK_HOST: &str = "https://api.deepseek.com";

/// OpenAI-compatible backend
///
/// Talks to `/v1/chat/completions` with an optional bearer key.
#[derive(Clone)]
pub struct OpenAICompatibleBackend {
    http_client: Client,
    base_url: String,
    model: String,
    api_key: Option<String>,
    temperature: f32,
    timeout: Duration,
}

impl OpenAICompatibleBackend {
    /// Keyless backend, e.g. a local vLLM or llama-server
    pub fn new(base_url: &str, model: &str) -> Self {
        Self {
            http_client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            api_key: None,
            temperature: 0.2,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Backend sending `Authorization: Bearer <key>`
    pub fn with_api_key(base_url: &str, model: &str, api_key: &str) -> Self {
        Self {
            api_key: Some(api_key.to_string()),
            ..Self::new(base_url, model)
        }
    }

    pub fn with_model(&self, model: &str) -> Self {
        Self {
            model: model.to_string(),
            ..self.clone()
        }
    }

    /// Applied to every request this backend sends
    pub fn with_timeout(self, timeout: Duration) -> Self {
        Self { timeout, ..self }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Read host, model and key from the environment
    ///
    /// `OPENAI_COMPATIBLE_HOST` is required unless `DEEPSEEK_API_KEY` is
    /// set, in which case the DeepSeek endpoint is used.
    pub fn from_env() -> Option<Self> {
        let api_key = std::env::var("OPENAI_COMPATIBLE_API_KEY")
            .or_else(|_| std::env::var("DEEPSEEK_API_KEY"))
            .ok()
            .filter(|k| !k.is_empty());
        let host = match std::env::var("OPENAI_COMPATIBLE_HOST") {
            Ok(host) if !host.is_empty() => host,
            _ if std::env::var("DEEPSEEK_API_KEY").is_ok() => DEEPSEEK_HOST.to_string(),
            _ => return None,
        };
        let model = std::env::var("OPENAI_COMPATIBLE_MODEL")
            .unwrap_or_else(|_| "deepseek-chat".to_string());

        let mut backend = Self::new(&host, &model);
        backend.api_key = api_key;
        Some(backend)
    }

    async fn chat_completion(&self, system: Option<&str>, user: &str) -> Result<String> {
        let mut messages = Vec::with_capacity(2);
        if let Some(system) = system {
            messages.push(ChatMessage {
                role: "system".to_string(),
                content: system.to_string(),
            });
        }
        messages.push(ChatMessage {
            role: "user".to_string(),
            content: user.to_string(),
        });

        let request = ChatCompletionRequest {
            model: self.model.clone(),
            messages,
            temperature: Some(self.temperature),
            stream: false,
        };

        let mut req_builder = self
            .http_client
            .post(format!("{}/v1/chat/completions", self.base_url))
            .timeout(self.timeout)
            .json(&request);

        if let Some(ref api_key) = self.api_key {
            req_builder = req_builder.header("Authorization", format!("Bearer {}", api_key));
        }

        let response = req_builder.send().await?;

        if !response.status().is_success() {
            return Err(Error::Backend {
                backend: "chat completions",
                status: response.status().as_u16(),
                body: response.text().await.unwrap_or_default(),
            });
        }

        let chat_response: ChatCompletionResponse = response.json().await?;
        debug!(model = %self.model, choices = chat_response.choices.len(), "Chat completion received");

        chat_response
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| Error::InvalidData("completion response had no choices".into()))
    }
}

#[async_trait]
impl AIBackend for OpenAICompatibleBackend {
    async fn complete(&self, system: Option<&str>, user: &str) -> Result<String> {
        self.chat_completion(system, user).await
    }

    async fn health_check(&self) -> bool {
        let mut req = self
            .http_client
            .get(format!("{}/v1/models", self.base_url))
            .timeout(self.timeout);
        if let Some(ref api_key) = self.api_key {
            req = req.header("Authorization", format!("Bearer {}", api_key));
        }
        match req.send().await {
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

/// `/v1/chat/completions` request body
#[derive(Debug, Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    stream: bool,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

/// Only the first choice's content is used
#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    content: String,
}
