//! Test helpers: an in-memory generation backend and a session builder

use std::collections::{HashSet, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{Value, json};

use client::types::{ApiRequest, ApiResponse, HttpMethod, routes};
use client::{ClientConfig, ClientResult, SessionClient, Transport};
use shared::StoryboardTable;

use super::fixtures::TestFixtures;

#[derive(Default)]
struct BackendState {
    ids: VecDeque<String>,
    issued: u32,
    live: HashSet<String>,
    fail_registration: bool,
    requests: Vec<ApiRequest>,

    storyboard: Option<StoryboardTable>,
    storyboard_pending_polls: u32,
    storyboard_error: Option<String>,
    saved_storyboard: Option<Value>,
    saved_model_config: Option<Value>,

    video_pending_polls: Option<u32>,
    video_error: Option<String>,
}

/// Fake backend speaking the session contract. Every request is recorded.
#[derive(Clone, Default)]
pub struct FakeBackend {
    state: Arc<Mutex<BackendState>>,
    latency: Option<Duration>,
}

impl FakeBackend {
    pub fn new() -> Self {
        let backend = Self::default();
        backend
            .lock()
            .ids
            .extend([TestFixtures::FIRST_ID.to_string(), TestFixtures::SECOND_ID.to_string()]);
        backend.lock().storyboard = Some(TestFixtures::two_cell_storyboard());
        backend.lock().video_pending_polls = Some(2);
        backend
    }

    /// Delay every response, so concurrent callers interleave
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    pub fn with_storyboard_after(self, pending_polls: u32) -> Self {
        self.lock().storyboard_pending_polls = pending_polls;
        self
    }

    pub fn with_storyboard_error(self, message: &str) -> Self {
        self.lock().storyboard_error = Some(message.to_string());
        self
    }

    /// Video completes after `pending_polls` processing reads
    pub fn with_video_after(self, pending_polls: u32) -> Self {
        self.lock().video_pending_polls = Some(pending_polls);
        self
    }

    /// Video never leaves `processing`
    pub fn with_endless_video(self) -> Self {
        self.lock().video_pending_polls = None;
        self
    }

    pub fn with_video_error(self, message: &str) -> Self {
        self.lock().video_error = Some(message.to_string());
        self
    }

    pub fn failing_registration(self) -> Self {
        self.lock().fail_registration = true;
        self
    }

    /// Forget a client, as the backend does after its offline timeout
    pub fn expire(&self, id: &str) {
        self.lock().live.remove(id);
    }

    pub fn requests(&self) -> Vec<ApiRequest> {
        self.lock().requests.clone()
    }

    pub fn request_paths(&self) -> Vec<String> {
        self.lock().requests.iter().map(|r| r.path.clone()).collect()
    }

    pub fn count(&self, prefix: &str) -> usize {
        self.lock().requests.iter().filter(|r| r.path.starts_with(prefix)).count()
    }

    pub fn registrations(&self) -> usize {
        self.count(routes::REGISTER)
    }

    pub fn saved_storyboard(&self) -> Option<Value> {
        self.lock().saved_storyboard.clone()
    }

    pub fn saved_model_config(&self) -> Option<Value> {
        self.lock().saved_model_config.clone()
    }

    fn lock(&self) -> MutexGuard<'_, BackendState> {
        self.state.lock().unwrap()
    }

    fn respond(&self, request: &ApiRequest) -> ApiResponse {
        let mut state = self.lock();
        state.requests.push(request.clone());

        if request.path == routes::REGISTER {
            return register(&mut state);
        }
        if request.path == routes::SESSION_STATS {
            let total = state.issued as usize;
            let online = state.live.len();
            let offline = total - online;
            return ok(json!({"success": true, "stats": {
                "total_clients": total, "online_clients": online, "offline_clients": offline
            }}));
        }
        if request.path == routes::STORYBOARD_EXAMPLES {
            return ok(json!({"success": true, "examples": [TestFixtures::two_cell_storyboard()]}));
        }

        let Some((route, id)) = request.path.rsplit_once('/') else {
            return ApiResponse::json(404, &json!({"detail": "Not Found"}));
        };
        if !state.live.contains(id) {
            return ApiResponse::json(404, &json!({"detail": format!("Client {id} not found")}));
        }

        match (request.method, route) {
            (HttpMethod::Post, "/client/heartbeat") => ok(json!({"success": true})),
            (HttpMethod::Get, "/client/status") => {
                ok(json!({"success": true, "data": {"status": "online", "is_online": true}}))
            }
            (HttpMethod::Post, "/config/model") => {
                state.saved_model_config = request.body.clone();
                ok(json!({"success": true, "message": "model config saved"}))
            }
            (HttpMethod::Post, "/config/audiovideo") | (HttpMethod::Post, "/novel/submit") => {
                ok(json!({"success": true}))
            }
            (HttpMethod::Get, "/storyboard") => storyboard(&mut state),
            (HttpMethod::Post, "/storyboard") => {
                state.saved_storyboard = request.body.clone();
                ok(json!({"success": true}))
            }
            (HttpMethod::Get, "/video/status") => video_status(&mut state),
            (HttpMethod::Get, "/video/download") => ApiResponse::new(200, TestFixtures::VIDEO_BYTES),
            _ => ApiResponse::json(405, &json!({"detail": "Method Not Allowed"})),
        }
    }
}

fn ok(body: Value) -> ApiResponse {
    ApiResponse::json(200, &body)
}

fn register(state: &mut BackendState) -> ApiResponse {
    if state.fail_registration {
        return ApiResponse::json(503, &json!({"detail": "client limit reached"}));
    }
    state.issued += 1;
    let id = state
        .ids
        .pop_front()
        .unwrap_or_else(|| format!("client-{}", state.issued));
    state.live.insert(id.clone());
    ok(json!({
        "success": true,
        "client_id": id,
        "client_name": "Big Niu Frontend",
        "created_at": "2024-05-01T12:00:00.000000"
    }))
}

fn storyboard(state: &mut BackendState) -> ApiResponse {
    if let Some(message) = &state.storyboard_error {
        return ok(json!({"success": false, "message": message}));
    }
    if state.storyboard_pending_polls > 0 {
        state.storyboard_pending_polls -= 1;
        return ok(json!({"success": true, "message": "storyboard not generated yet", "data": null}));
    }
    ok(json!({"success": true, "data": state.storyboard}))
}

fn video_status(state: &mut BackendState) -> ApiResponse {
    if let Some(message) = &state.video_error {
        return ok(json!({"success": true, "data": {"status": "error", "error": message}}));
    }
    match state.video_pending_polls {
        Some(0) => ok(json!({"success": true, "data": {
            "status": "completed", "url": "/video/download/current", "progress": 100
        }})),
        Some(remaining) => {
            state.video_pending_polls = Some(remaining - 1);
            ok(json!({"success": true, "data": {"status": "processing", "progress": 40}}))
        }
        None => ok(json!({"success": true, "status": "processing", "progress": 0.1})),
    }
}

#[async_trait]
impl Transport for FakeBackend {
    async fn send(&self, request: ApiRequest) -> ClientResult<ApiResponse> {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
        Ok(self.respond(&request))
    }
}

/// Builder for session clients wired to a [`FakeBackend`]
pub struct SessionBuilder {
    config: ClientConfig,
}

impl SessionBuilder {
    pub fn new() -> Self {
        Self { config: ClientConfig::default() }
    }

    pub fn with_poll_ceiling(mut self, ceiling: Duration) -> Self {
        self.config.poll_ceiling = ceiling;
        self
    }

    pub fn with_max_reconnects(mut self, attempts: u32) -> Self {
        self.config.max_reconnect_attempts = attempts;
        self
    }

    pub fn build(self, backend: &FakeBackend) -> SessionClient {
        SessionClient::new(self.config, Arc::new(backend.clone()))
    }
}
