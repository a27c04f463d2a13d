//! Session client error types

use thiserror::Error;
use shared::SharedError;

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("Client not registered")]
    NotRegistered,

    #[error("Transport failure: {message}")]
    Transport { message: String },

    #[error("HTTP {status} from backend: {message}")]
    Http { status: u16, message: String },

    #[error("Backend rejected request: {message}")]
    Rejected { message: String },

    #[error("Session expired and could not be re-established")]
    SessionExpired,

    #[error("Client registration failed: {message}")]
    RegistrationFailed { message: String },

    #[error("Invalid response from backend: {message}")]
    InvalidResponse { message: String },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Shared component error: {0}")]
    SharedError(#[from] SharedError),

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

impl ClientError {
    pub fn transport(message: impl Into<String>) -> Self {
        ClientError::Transport { message: message.into() }
    }

    pub fn config(message: impl Into<String>) -> Self {
        ClientError::Config { message: message.into() }
    }

    pub fn invalid_response(message: impl Into<String>) -> Self {
        ClientError::InvalidResponse { message: message.into() }
    }

    /// Whether a polling loop may keep going after this error
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            ClientError::Transport { .. } | ClientError::Http { .. } | ClientError::InvalidResponse { .. }
        )
    }
}

pub type ClientResult<T> = Result<T, ClientError>;
