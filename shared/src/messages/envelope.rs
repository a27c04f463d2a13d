//! Response envelope and client lifecycle payloads
//!
//! Every backend response shares `{success, data?, message?, error?}`.
//! Some endpoints put their payload at the top level instead of under
//! `data`; [`ApiEnvelope::into_payload`] reads either shape.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::errors::{SharedError, SharedResult};

/// Longest novel text the backend accepts, in characters
pub const MAX_NOVEL_CHARS: usize = 1_000_000;

/// Common response envelope
#[derive(Debug, Clone, Deserialize)]
pub struct ApiEnvelope<T = Value> {
    pub success: bool,
    pub data: Option<T>,
    pub message: Option<String>,
    pub error: Option<String>,
    /// Numeric status some endpoints echo next to `success`
    #[serde(default)]
    pub status_code: Option<i64>,
    /// Top-level fields outside the envelope keys
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl<T: DeserializeOwned> ApiEnvelope<T> {
    /// Human readable reason for a rejected request
    pub fn failure_message(&self) -> String {
        self.error
            .clone()
            .or_else(|| self.message.clone())
            .unwrap_or_else(|| "request rejected by backend".to_string())
    }

    /// Extract the payload from `data`, falling back to the top-level
    /// fields. `Ok(None)` means the backend sent no payload at all.
    pub fn into_payload(self) -> SharedResult<Option<T>> {
        if let Some(data) = self.data {
            return Ok(Some(data));
        }
        if self.extra.is_empty() {
            return Ok(None);
        }
        serde_json::from_value(Value::Object(self.extra))
            .map(Some)
            .map_err(|e| SharedError::DeserializationError { message: e.to_string() })
    }

    /// Decode a single top-level field outside the envelope keys
    pub fn take_field<U: DeserializeOwned>(&mut self, key: &str) -> SharedResult<Option<U>> {
        match self.extra.remove(key) {
            None | Some(Value::Null) => Ok(None),
            Some(value) => serde_json::from_value(value)
                .map(Some)
                .map_err(|e| SharedError::DeserializationError { message: format!("{key}: {e}") }),
        }
    }
}

/// Body of `POST /client/register`
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct RegisterRequest {
    pub client_name: String,
}

/// Payload of a successful registration
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct RegisterResponse {
    pub client_id: String,
    #[serde(default)]
    pub client_name: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
}

impl RegisterResponse {
    /// Creation time reported by the backend. The backend emits naive
    /// ISO-8601 timestamps, which are read as UTC.
    pub fn created_at_utc(&self) -> Option<DateTime<Utc>> {
        let raw = self.created_at.as_deref()?;
        if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
            return Some(ts.with_timezone(&Utc));
        }
        NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
            .ok()
            .map(|naive| naive.and_utc())
    }
}

/// Payload of `GET /client/status/{id}`
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct RemoteClientStatus {
    pub status: String,
    #[serde(default)]
    pub is_online: Option<bool>,
    #[serde(default)]
    pub last_heartbeat: Option<String>,
    #[serde(default)]
    pub offline_duration: Option<String>,
}

/// Server-wide session counters from `GET /client/stats`
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct SessionStats {
    #[serde(default)]
    pub total_clients: u64,
    #[serde(default, alias = "active_clients")]
    pub online_clients: u64,
    #[serde(default)]
    pub offline_clients: u64,
    #[serde(default)]
    pub max_clients: Option<u64>,
    #[serde(default)]
    pub timeout_minutes: Option<u64>,
}

/// Example storyboards offered by the backend; their shape is backend-defined
pub type StoryboardExamples = Vec<Value>;

/// Body of `POST /novel/submit/{id}`
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct NovelSubmitRequest {
    pub text: String,
    pub use_storyboard: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt: Option<String>,
}

impl NovelSubmitRequest {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            use_storyboard: false,
            prompt: None,
        }
    }

    pub fn with_storyboard(mut self, use_storyboard: bool) -> Self {
        self.use_storyboard = use_storyboard;
        self
    }

    pub fn with_prompt(mut self, prompt: impl Into<String>) -> Self {
        let prompt = prompt.into();
        self.prompt = if prompt.trim().is_empty() { None } else { Some(prompt) };
        self
    }

    /// Reject blank text and text beyond the backend limit before sending
    pub fn validate(&self) -> SharedResult<()> {
        if self.text.trim().is_empty() {
            return Err(SharedError::invalid_config("text", "<empty>"));
        }
        let chars = self.text.chars().count();
        if chars > MAX_NOVEL_CHARS {
            return Err(SharedError::invalid_config("text", format!("{chars} characters")));
        }
        Ok(())
    }
}
