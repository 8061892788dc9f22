//! Test utilities for mindlink-core
//!
//! This module provides a mock chat proxy speaking the `contents` +
//! `systemInstruction` wire format, for integration tests and local
//! development without a hosted model.
//!
//! Routes:
//! - `POST /api/chat/` - canned reply chosen by the role instruction, as `{"reply": ...}`
//! - `POST /raw/` - same replies in the raw Gemini `candidates` shape
//! - `POST /slow/` - answers after two seconds
//! - `POST /error/` - `500` with an error body and no reply
//! - `POST /empty/` - `200` with no reply field

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{Json, State},
    http::StatusCode,
    routing::post,
    Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::sync::oneshot;

use crate::ai::mock::canned_reply;

/// Mock chat proxy server for testing and development
pub struct MockGeminiServer {
    addr: SocketAddr,
    requests: Arc<AtomicUsize>,
    shutdown_tx: Option<oneshot::Sender<()>>,
}

impl MockGeminiServer {
    /// Start the mock server on an available port
    pub async fn start() -> Self {
        let requests = Arc::new(AtomicUsize::new(0));
        let app = Router::new()
            .route("/api/chat/", post(handle_chat))
            .route("/raw/", post(handle_raw))
            .route("/slow/", post(handle_slow))
            .route("/error/", post(handle_error))
            .route("/empty/", post(handle_empty))
            .with_state(requests.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let (shutdown_tx, shutdown_rx) = oneshot::channel();

        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    shutdown_rx.await.ok();
                })
                .await
                .unwrap();
        });

        Self {
            addr,
            requests,
            shutdown_tx: Some(shutdown_tx),
        }
    }

    /// Base URL, e.g. `http://127.0.0.1:PORT`
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Full URL of the well-behaved chat endpoint
    pub fn chat_url(&self) -> String {
        format!("{}/api/chat/", self.url())
    }

    /// Full URL of one of the misbehaving routes (`slow`, `error`, `empty`, `raw`)
    pub fn route_url(&self, route: &str) -> String {
        format!("{}/{}/", self.url(), route)
    }

    /// Number of POST requests received on any route
    pub fn request_count(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }

    /// Stop the mock server
    pub fn stop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

impl Drop for MockGeminiServer {
    fn drop(&mut self) {
        self.stop();
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChatRequest {
    #[allow(dead_code)]
    contents: Vec<Value>,
    system_instruction: Value,
}

impl ChatRequest {
    fn system_text(&self) -> &str {
        self.system_instruction
            .pointer("/parts/0/text")
            .and_then(Value::as_str)
            .unwrap_or_default()
    }
}

async fn handle_chat(
    State(requests): State<Arc<AtomicUsize>>,
    Json(request): Json<ChatRequest>,
) -> Json<Value> {
    requests.fetch_add(1, Ordering::SeqCst);
    Json(json!({ "reply": canned_reply(request.system_text()) }))
}

async fn handle_raw(
    State(requests): State<Arc<AtomicUsize>>,
    Json(request): Json<ChatRequest>,
) -> Json<Value> {
    requests.fetch_add(1, Ordering::SeqCst);
    Json(json!({
        "candidates": [{
            "content": {"role": "model", "parts": [{"text": canned_reply(request.system_text())}]}
        }]
    }))
}

async fn handle_slow(
    State(requests): State<Arc<AtomicUsize>>,
    Json(request): Json<ChatRequest>,
) -> Json<Value> {
    requests.fetch_add(1, Ordering::SeqCst);
    tokio::time::sleep(Duration::from_secs(2)).await;
    Json(json!({ "reply": canned_reply(request.system_text()) }))
}

async fn handle_error(State(requests): State<Arc<AtomicUsize>>) -> (StatusCode, Json<Value>) {
    requests.fetch_add(1, Ordering::SeqCst);
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "error": "upstream model unavailable" })),
    )
}

async fn handle_empty(State(requests): State<Arc<AtomicUsize>>) -> Json<Value> {
    requests.fetch_add(1, Ordering::SeqCst);
    Json(json!({}))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::{AIBackend, GeminiProxyBackend};

    #[tokio::test]
    async fn test_mock_server_replies_by_role() {
        let server = MockGeminiServer::start().await;
        let backend = GeminiProxyBackend::new(&server.chat_url(), "gemini-1.5-flash");

        let reply = backend
            .generate("entries", "You are an expert in thematic analysis.")
            .await
            .unwrap();
        assert!(reply.starts_with('['));
        assert_eq!(server.request_count(), 1);
    }

    #[tokio::test]
    async fn test_mock_server_raw_shape() {
        let server = MockGeminiServer::start().await;
        let backend = GeminiProxyBackend::new(&server.route_url("raw"), "m");
        let reply = backend.generate("x", "anything").await.unwrap();
        assert_eq!(reply, "Mock reply.");
    }
}
