//! In-process fakes for unit tests

use std::collections::VecDeque;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;

use crate::transport::{ApiRequest, ApiResponse, Transport, TransportError};

/// Replays canned responses in order and records every request it receives
#[derive(Default)]
pub struct ScriptedTransport {
    replies: Mutex<VecDeque<Result<ApiResponse, String>>>,
    requests: Mutex<Vec<ApiRequest>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reply(self, status: u16, body: Value) -> Self {
        self.replies.lock().push_back(Ok(ApiResponse::new(status, body)));
        self
    }

    pub fn fail(self, reason: &str) -> Self {
        self.replies.lock().push_back(Err(reason.to_string()));
        self
    }

    pub fn requests(&self) -> Vec<ApiRequest> {
        self.requests.lock().clone()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse, TransportError> {
        let url = request.path.clone();
        self.requests.lock().push(request);
        // Suspend once, like a real round-trip, so concurrent callers interleave
        tokio::task::yield_now().await;
        match self.replies.lock().pop_front() {
            Some(Ok(response)) => Ok(response),
            Some(Err(reason)) => Err(TransportError::Connect { url, reason }),
            None => Err(TransportError::Other(format!("no scripted reply for {}", url))),
        }
    }
}
