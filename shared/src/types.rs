//! Core shared types and identifiers

use serde::{Deserialize, Serialize};
use std::fmt;

/// Server-issued opaque token identifying one client session
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClientId(String);

impl ClientId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Connection lifecycle of a session client
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connecting,
    Connected,
    Reconnecting,
    Error,
}

impl ConnectionState {
    /// Map a backend-reported session status onto a connection state.
    /// The backend reports `online`/`offline` for its own sessions.
    pub fn from_remote(status: &str) -> Self {
        match status.to_ascii_lowercase().as_str() {
            "connected" | "online" | "active" => ConnectionState::Connected,
            "connecting" => ConnectionState::Connecting,
            "reconnecting" => ConnectionState::Reconnecting,
            "disconnected" | "offline" | "expired" => ConnectionState::Disconnected,
            _ => ConnectionState::Error,
        }
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ConnectionState::Disconnected => "disconnected",
            ConnectionState::Connecting => "connecting",
            ConnectionState::Connected => "connected",
            ConnectionState::Reconnecting => "reconnecting",
            ConnectionState::Error => "error",
        };
        f.write_str(name)
    }
}

/// Rendering state of a backend video job.
///
/// Anything the backend reports outside the four known states (it uses
/// `not_started` before the first render) reads as `Pending`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobState {
    Processing,
    Completed,
    Error,
    // serde requires `other` on the last variant
    #[default]
    #[serde(other)]
    Pending,
}

impl JobState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobState::Completed | JobState::Error)
    }
}

/// Video rendering status as polled from the backend
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct VideoStatus {
    pub status: JobState,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub progress: Option<f64>,
}

impl VideoStatus {
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Progress as a fraction in [0, 1]. The backend sometimes reports
    /// whole percentages, which are scaled down.
    pub fn progress_fraction(&self) -> Option<f64> {
        self.progress.map(|p| {
            let fraction = if p > 1.0 { p / 100.0 } else { p };
            clamp_unit(fraction)
        })
    }
}

/// Clamp a continuous parameter into [0, 1]. NaN maps to 0.
pub fn clamp_unit(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}
