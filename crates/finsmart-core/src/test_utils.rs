//! Test utilities for finsmart-core
//!
//! A mock completion server speaking just enough of the OpenAI-compatible
//! and Ollama HTTP APIs to exercise the real backends end-to-end.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use tokio::sync::oneshot;

#[derive(Debug, Clone)]
enum Reply {
    Content(String),
    Status(u16),
    Delayed(Duration, String),
}

struct ServerState {
    reply: Reply,
    requests: AtomicUsize,
    last_body: Mutex<Option<Value>>,
}

/// Mock completion server for integration tests
pub struct MockCompletionServer {
    addr: SocketAddr,
    state: Arc<ServerState>,
    shutdown_tx: Option<oneshot::Sender<()>>,
}

impl MockCompletionServer {
    /// Answer every completion with `content`
    pub async fn start(content: impl Into<String>) -> Self {
        Self::spawn(Reply::Content(content.into())).await
    }

    /// Answer every completion with an error status
    pub async fn with_status(status: u16) -> Self {
        Self::spawn(Reply::Status(status)).await
    }

    /// Answer with `content` after `delay`
    pub async fn with_delay(delay: Duration, content: impl Into<String>) -> Self {
        Self::spawn(Reply::Delayed(delay, content.into())).await
    }

    async fn spawn(reply: Reply) -> Self {
        let state = Arc::new(ServerState {
            reply,
            requests: AtomicUsize::new(0),
            last_body: Mutex::new(None),
        });
        let app = Router::new()
            .route("/v1/models", get(handle_models))
            .route("/v1/chat/completions", post(handle_chat))
            .route("/api/tags", get(handle_tags))
            .route("/api/generate", post(handle_generate))
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind mock server");
        let addr = listener.local_addr().expect("mock server address");

        let (shutdown_tx, shutdown_rx) = oneshot::channel();

        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    shutdown_rx.await.ok();
                })
                .await
                .ok();
        });

        Self {
            addr,
            state,
            shutdown_tx: Some(shutdown_tx),
        }
    }

    /// Base URL for this mock server
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Completion requests received so far
    pub fn requests(&self) -> usize {
        self.state.requests.load(Ordering::SeqCst)
    }

    /// JSON body of the most recent completion request
    pub fn last_request(&self) -> Option<Value> {
        self.state.last_body.lock().ok().and_then(|b| b.clone())
    }

    /// Stop the mock server
    pub fn stop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

impl Drop for MockCompletionServer {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Record the request and resolve the configured reply to content or a status
async fn reply(state: &ServerState, body: Value) -> Result<String, StatusCode> {
    state.requests.fetch_add(1, Ordering::SeqCst);
    if let Ok(mut last) = state.last_body.lock() {
        *last = Some(body);
    }
    match &state.reply {
        Reply::Content(content) => Ok(content.clone()),
        Reply::Status(code) => {
            Err(StatusCode::from_u16(*code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR))
        }
        Reply::Delayed(delay, content) => {
            tokio::time::sleep(*delay).await;
            Ok(content.clone())
        }
    }
}

async fn handle_chat(State(state): State<Arc<ServerState>>, Json(body): Json<Value>) -> Response {
    let model = body["model"].as_str().unwrap_or("mock").to_string();
    match reply(&state, body).await {
        Ok(content) => Json(json!({
            "id": "chatcmpl-mock",
            "object": "chat.completion",
            "model": model,
            "choices": [{
                "index": 0,
                "message": {"role": "assistant", "content": content},
                "finish_reason": "stop"
            }]
        }))
        .into_response(),
        Err(status) => (status, Json(json!({"error": {"message": "mock failure"}}))).into_response(),
    }
}

async fn handle_generate(State(state): State<Arc<ServerState>>, Json(body): Json<Value>) -> Response {
    let model = body["model"].as_str().unwrap_or("mock").to_string();
    match reply(&state, body).await {
        Ok(content) => Json(json!({"model": model, "response": content, "done": true})).into_response(),
        Err(status) => (status, "mock failure").into_response(),
    }
}

async fn handle_models() -> Json<Value> {
    Json(json!({"object": "list", "data": [{"id": "mock-chat", "object": "model"}]}))
}

async fn handle_tags() -> Json<Value> {
    Json(json!({"models": [{"name": "mock:latest"}]}))
}
