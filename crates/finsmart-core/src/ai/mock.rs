//! Mock backend for testing
//!
//! Returns a canned completion, a failure, or a delayed completion so the
//! fallback paths can be exercised without a model server.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::error::{Error, Result};

use super::AIBackend;

#[derive(Debug, Clone)]
enum MockReply {
    Text(String),
    Fail(String),
    Delayed(Duration, String),
}

/// Scripted backend for parser and insight tests
#[derive(Debug, Clone)]
pub struct MockBackend {
    /// Whether health_check should return true
    pub healthy: bool,
    reply: MockReply,
    model: String,
    calls: Arc<AtomicUsize>,
}

impl Default for MockBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl MockBackend {
    /// Healthy mock answering with an empty JSON array
    pub fn new() -> Self {
        Self {
            healthy: true,
            reply: MockReply::Text("[]".to_string()),
            model: "mock".to_string(),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Mock whose health check fails
    pub fn unhealthy() -> Self {
        Self {
            healthy: false,
            ..Self::new()
        }
    }

    /// Answer every completion with `text`
    pub fn with_response(self, text: impl Into<String>) -> Self {
        Self {
            reply: MockReply::Text(text.into()),
            ..self
        }
    }

    /// Fail every completion
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            reply: MockReply::Fail(message.into()),
            ..Self::new()
        }
    }

    /// Answer with `text` after sleeping for `delay`
    pub fn slow(delay: Duration, text: impl Into<String>) -> Self {
        Self {
            reply: MockReply::Delayed(delay, text.into()),
            ..Self::new()
        }
    }

    pub fn with_model(&self, model: &str) -> Self {
        Self {
            model: model.to_string(),
            ..self.clone()
        }
    }

    /// Number of completions requested so far (shared between clones)
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AIBackend for MockBackend {
    async fn complete(&self, _system: Option<&str>, _user: &str) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.reply {
            MockReply::Text(text) => Ok(text.clone()),
            MockReply::Fail(message) => Err(Error::InvalidData(message.clone())),
            MockReply::Delayed(delay, text) => {
                tokio::time::sleep(*delay).await;
                Ok(text.clone())
            }
        }
    }

    async fn health_check(&self) -> bool {
        self.healthy
    }

    fn model(&self) -> &str {
        &self.model
    }

    fn host(&self) -> &str {
        "mock://"
    }
}
