//! reqwest-backed transport
//!
//! Resolves request paths against the configured base URL and API prefix.
//! Every status code is returned to the caller; only network failures
//! and the 30 second request timeout become errors.

use async_trait::async_trait;
use tracing::debug;

use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};
use crate::traits::Transport;
use crate::types::{ApiRequest, ApiResponse, HttpMethod};

/// Real transport implementation over HTTP
#[derive(Clone)]
pub struct ReqwestTransport {
    config: ClientConfig,
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new(config: ClientConfig) -> ClientResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| ClientError::config(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self { config, client })
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: ApiRequest) -> ClientResult<ApiResponse> {
        let url = self.config.endpoint_url(&request.path)?;
        debug!(method = ?request.method, %url, "Sending backend request");

        let builder = match request.method {
            HttpMethod::Get => self.client.get(url),
            HttpMethod::Post => self.client.post(url),
        };
        let builder = match &request.body {
            Some(body) => builder.json(body),
            None => builder,
        };

        let response = builder.send().await.map_err(|e| {
            if e.is_timeout() {
                ClientError::transport(format!("Request to {} timed out", request.path))
            } else {
                ClientError::transport(format!("Request to {} failed: {e}", request.path))
            }
        })?;

        let status = response.status().as_u16();
        let body = response
            .bytes()
            .await
            .map_err(|e| ClientError::transport(format!("Reading body of {} failed: {e}", request.path)))?;

        Ok(ApiResponse::new(status, body.to_vec()))
    }
}
