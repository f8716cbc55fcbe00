//! Mock implementations for testing.
//!
//! Provides a mock transport and canned response bodies for unit testing
//! without a running Ollama server.

use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, PoisonError};

use crate::transport::{HttpRequest, HttpResponse, HttpTransport, TransportError};

/// A recorded request.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    /// Request URL.
    pub url: String,
    /// Request body.
    pub body: Option<Vec<u8>>,
    /// Request headers.
    pub headers: HashMap<String, String>,
}

impl RecordedRequest {
    /// Parses the body as JSON.
    pub fn json(&self) -> serde_json::Value {
        self.body
            .as_deref()
            .and_then(|body| serde_json::from_slice(body).ok())
            .unwrap_or(serde_json::Value::Null)
    }
}

/// What the mock does when a request arrives.
#[derive(Debug, Clone)]
pub enum MockResponse {
    /// Reply with a status and body.
    Reply {
        /// HTTP status code.
        status: u16,
        /// Response body.
        body: Vec<u8>,
    },
    /// Fail at the transport level.
    Fail(String),
    /// Never reply.
    Pending,
}

impl MockResponse {
    /// Creates a successful JSON response.
    pub fn json<T: serde::Serialize>(value: &T) -> Self {
        MockResponse::Reply {
            status: 200,
            body: serde_json::to_vec(value).unwrap_or_default(),
        }
    }

    /// Creates a response with a raw body.
    pub fn raw(status: u16, body: impl Into<Vec<u8>>) -> Self {
        MockResponse::Reply {
            status,
            body: body.into(),
        }
    }

    /// Creates an Ollama-style error response.
    pub fn error(status: u16, message: &str) -> Self {
        Self::raw(
            status,
            serde_json::to_vec(&serde_json::json!({ "error": message })).unwrap_or_default(),
        )
    }
}

/// Mock HTTP transport for testing.
pub struct MockTransport {
    responses: Mutex<VecDeque<MockResponse>>,
    requests: Mutex<Vec<RecordedRequest>>,
}

impl MockTransport {
    /// Creates a new mock transport.
    pub fn new() -> Self {
        Self {
            responses: Mutex::new(VecDeque::new()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Queues a response.
    pub fn queue(&self, response: MockResponse) {
        self.responses.lock().unwrap_or_else(PoisonError::into_inner).push_back(response);
    }

    /// Queues a JSON response.
    pub fn queue_json<T: serde::Serialize>(&self, value: &T) {
        self.queue(MockResponse::json(value));
    }

    /// Gets all recorded requests.
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Gets the last recorded request.
    pub fn last_request(&self) -> Option<RecordedRequest> {
        self.requests.lock().unwrap_or_else(PoisonError::into_inner).last().cloned()
    }

    /// Returns the number of requests made.
    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    fn next_response(&self) -> MockResponse {
        self.responses
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front()
            .unwrap_or_else(|| MockResponse::error(500, "No mock response configured"))
    }
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl HttpTransport for MockTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        self.requests.lock().unwrap_or_else(PoisonError::into_inner).push(RecordedRequest {
            url: request.url,
            body: request.body,
            headers: request.headers,
        });

        match self.next_response() {
            MockResponse::Reply { status, body } => Ok(HttpResponse { status, body }),
            MockResponse::Fail(message) => Err(TransportError::Connection { message }),
            MockResponse::Pending => std::future::pending().await,
        }
    }
}

impl std::fmt::Debug for MockTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockTransport")
            .field("request_count", &self.request_count())
            .finish()
    }
}

/// Canned `/api/embed` response bodies.
pub mod fixtures {
    use serde_json::{json, Value};

    /// A response with the given vectors and no metadata.
    pub fn embed_response(model: &str, embeddings: &[Vec<f32>]) -> Value {
        json!({
            "model": model,
            "embeddings": embeddings,
        })
    }

    /// A response with vectors plus timing and token metadata.
    pub fn embed_response_with_metadata(
        model: &str,
        embeddings: &[Vec<f32>],
        prompt_eval_count: u64,
    ) -> Value {
        json!({
            "model": model,
            "embeddings": embeddings,
            "total_duration": 14_143_917u64,
            "load_duration": 1_019_500u64,
            "prompt_eval_count": prompt_eval_count,
        })
    }

    /// `count` distinct vectors of `dimensions` values; vector `i` is filled with `i`.
    #[allow(clippy::cast_precision_loss)]
    pub fn vectors(count: usize, dimensions: usize) -> Vec<Vec<f32>> {
        (0..count).map(|i| vec![i as f32; dimensions]).collect()
    }
}
