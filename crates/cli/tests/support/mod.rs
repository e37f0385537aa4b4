//! Fake backend shared by the integration tests

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::{json, Value};
use tempfile::TempDir;

use biocloud_cli::guard::GuardPolicy;
use biocloud_cli::{
    ApiRequest, ApiResponse, App, CliConfig, FileSessionStore, SessionContext, Transport,
    TransportError,
};

/// Answers requests from a queue and remembers what it was asked
#[derive(Default)]
pub struct FakeBackend {
    replies: Mutex<VecDeque<ApiResponse>>,
    seen: Mutex<Vec<ApiRequest>>,
}

impl FakeBackend {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn queue(&self, status: u16, body: Value) {
        self.replies.lock().push_back(ApiResponse::new(status, body));
    }

    pub fn seen(&self) -> Vec<ApiRequest> {
        self.seen.lock().clone()
    }

    pub fn paths(&self) -> Vec<String> {
        self.seen().into_iter().map(|r| r.path).collect()
    }
}

#[async_trait]
impl Transport for FakeBackend {
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse, TransportError> {
        let path = request.path.clone();
        self.seen.lock().push(request);
        self.replies
            .lock()
            .pop_front()
            .ok_or_else(|| TransportError::Other(format!("unexpected request to {}", path)))
    }
}

/// An app wired to a fake backend and a session file in a temp dir
pub struct Harness {
    pub app: App,
    pub backend: Arc<FakeBackend>,
    pub session: SessionContext,
    _dir: TempDir,
}

impl Harness {
    pub fn new(policy: GuardPolicy) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let backend = FakeBackend::new();
        let session: SessionContext = Arc::new(FileSessionStore::new(dir.path().join("session.json")));
        let config = CliConfig {
            guard_policy: policy,
            display_utc_offset: "Z".into(),
            poll_interval_secs: 0,
            poll_attempts: 2,
            ..Default::default()
        };
        let app = App::with_parts(config, backend.clone(), session.clone()).unwrap();
        Self {
            app,
            backend,
            session,
            _dir: dir,
        }
    }

    /// Log in through the real login flow with the given balance
    pub async fn logged_in(policy: GuardPolicy, credits: i64) -> Self {
        let harness = Self::new(policy);
        harness.backend.queue(
            200,
            json!({
                "access_token": "tok-123",
                "email": "ana@example.com",
                "name": "Ana",
                "surname": "García",
                "credits": credits,
                "location_id": 1
            }),
        );
        harness
            .app
            .auth
            .login("ana@example.com", "Secret1!")
            .await
            .unwrap();
        harness
    }
}

pub fn expired() -> (u16, Value) {
    (401, json!({"msg": "Token has expired"}))
}
