//! Client-internal request/response types and backend routes

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use shared::{ClientId, ConnectionState};

use crate::error::{ClientError, ClientResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
}

/// A request relative to the API prefix
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: HttpMethod,
    pub path: String,
    pub body: Option<Value>,
}

impl ApiRequest {
    pub fn get(path: impl Into<String>) -> Self {
        Self { method: HttpMethod::Get, path: path.into(), body: None }
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self { method: HttpMethod::Post, path: path.into(), body: None }
    }

    pub fn with_json<T: Serialize>(mut self, body: &T) -> ClientResult<Self> {
        self.body = Some(serde_json::to_value(body)?);
        Ok(self)
    }
}

/// Raw backend response
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl ApiResponse {
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self { status, body: body.into() }
    }

    pub fn json(status: u16, value: &Value) -> Self {
        Self::new(status, value.to_string())
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn decode<T: serde::de::DeserializeOwned>(&self) -> ClientResult<T> {
        serde_json::from_slice(&self.body).map_err(|e| ClientError::invalid_response(e.to_string()))
    }

    /// Best-effort error text: FastAPI `detail`, then envelope fields, then raw body
    pub fn error_message(&self) -> String {
        if let Ok(Value::Object(map)) = serde_json::from_slice::<Value>(&self.body) {
            for key in ["detail", "error", "message"] {
                if let Some(Value::String(text)) = map.get(key) {
                    return text.clone();
                }
            }
        }
        let text = String::from_utf8_lossy(&self.body).trim().to_string();
        if text.is_empty() { format!("status {}", self.status) } else { text }
    }
}

/// Result of a successful registration
#[derive(Debug, Clone, PartialEq)]
pub struct ClientInfo {
    pub client_id: ClientId,
    pub status: ConnectionState,
    pub created_at: Option<DateTime<Utc>>,
}

/// Backend routes. Identity-scoped routes embed the client id.
pub mod routes {
    use super::ClientId;

    pub const REGISTER: &str = "/client/register";
    pub const SESSION_STATS: &str = "/client/stats";
    pub const STORYBOARD_EXAMPLES: &str = "/storyboard/examples";

    pub fn heartbeat(id: &ClientId) -> String {
        format!("/client/heartbeat/{id}")
    }

    pub fn client_status(id: &ClientId) -> String {
        format!("/client/status/{id}")
    }

    pub fn model_config(id: &ClientId) -> String {
        format!("/config/model/{id}")
    }

    pub fn audio_video_config(id: &ClientId) -> String {
        format!("/config/audiovideo/{id}")
    }

    pub fn submit_novel(id: &ClientId) -> String {
        format!("/novel/submit/{id}")
    }

    pub fn storyboard(id: &ClientId) -> String {
        format!("/storyboard/{id}")
    }

    pub fn video_status(id: &ClientId) -> String {
        format!("/video/status/{id}")
    }

    pub fn video_download(id: &ClientId) -> String {
        format!("/video/download/{id}")
    }
}
