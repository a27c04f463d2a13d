//! Session client configuration
//!
//! The backend origin is the only setting read from the environment
//! (`API_BASE_URL`, optionally from a `.env` file). Timing knobs default
//! to the backend contract and are overridable for tests.

use std::time::Duration;
use url::Url;

use crate::error::{ClientError, ClientResult};

pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";
pub const DEFAULT_API_PREFIX: &str = "/api/v1/bigniu";
pub const DEFAULT_CLIENT_NAME: &str = "Big Niu Frontend";

pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
pub const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(30);
pub const POLL_INTERVAL: Duration = Duration::from_secs(3);
pub const POLL_CEILING: Duration = Duration::from_secs(120);
pub const MAX_RECONNECT_ATTEMPTS: u32 = 5;

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url: Url,
    pub api_prefix: String,
    pub client_name: String,
    pub request_timeout: Duration,
    pub heartbeat_interval: Duration,
    pub poll_interval: Duration,
    pub poll_ceiling: Duration,
    pub max_reconnect_attempts: u32,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: Url::parse(DEFAULT_BASE_URL).expect("default base URL is valid"),
            api_prefix: DEFAULT_API_PREFIX.to_string(),
            client_name: DEFAULT_CLIENT_NAME.to_string(),
            request_timeout: REQUEST_TIMEOUT,
            heartbeat_interval: HEARTBEAT_INTERVAL,
            poll_interval: POLL_INTERVAL,
            poll_ceiling: POLL_CEILING,
            max_reconnect_attempts: MAX_RECONNECT_ATTEMPTS,
        }
    }
}

impl ClientConfig {
    /// Build a config pointed at `base_url`, accepting bare `host:port`
    pub fn with_base_url(base_url: &str) -> ClientResult<Self> {
        Ok(Self {
            base_url: parse_base_url(base_url)?,
            ..Self::default()
        })
    }

    /// Load from the environment. A missing `.env` file is fine.
    pub fn from_env() -> ClientResult<Self> {
        let _ = dotenvy::dotenv();

        let mut config = match std::env::var("API_BASE_URL") {
            Ok(url) if !url.trim().is_empty() => Self::with_base_url(url.trim())?,
            _ => Self::default(),
        };

        if let Ok(prefix) = std::env::var("API_PREFIX") {
            config.api_prefix = prefix;
        }
        if let Ok(name) = std::env::var("CLIENT_NAME") {
            if !name.trim().is_empty() {
                config.client_name = name;
            }
        }

        Ok(config)
    }

    /// Absolute URL for an API path such as `/client/register`. A path on
    /// the base URL (a reverse proxy mount) is kept.
    pub fn endpoint_url(&self, path: &str) -> ClientResult<Url> {
        let prefix = self.api_prefix.trim_matches('/');
        let path = path.trim_start_matches('/');
        let relative = if prefix.is_empty() { path.to_string() } else { format!("{prefix}/{path}") };

        let mut base = self.base_url.clone();
        if !base.path().ends_with('/') {
            let mounted = format!("{}/", base.path());
            base.set_path(&mounted);
        }
        base.join(&relative)
            .map_err(|e| ClientError::config(format!("Invalid endpoint {relative}: {e}")))
    }
}

fn parse_base_url(raw: &str) -> ClientResult<Url> {
    let with_scheme = if raw.starts_with("http://") || raw.starts_with("https://") {
        raw.to_string()
    } else {
        format!("http://{raw}")
    };
    Url::parse(&with_scheme).map_err(|e| ClientError::config(format!("Invalid base URL {raw}: {e}")))
}
