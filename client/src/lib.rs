//! Session client for the novel-to-video generation backend
//!
//! Registers an ephemeral client identity, keeps it alive with a
//! heartbeat, re-registers when the backend expires it and polls the
//! storyboard and video jobs to a terminal state.

pub mod config;
pub mod core;
pub mod error;
pub mod services;
pub mod traits;
pub mod types;

// Re-export main types
pub use crate::config::ClientConfig;
pub use crate::core::{PollHandle, PollOutcome, SessionClient, SessionMetrics};
pub use error::{ClientError, ClientResult};
pub use types::{ApiRequest, ApiResponse, ClientInfo, HttpMethod};

// Re-export trait definitions and implementations
pub use services::ReqwestTransport;
pub use traits::Transport;
