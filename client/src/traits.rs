//! Service trait definitions for dependency injection
//!
//! All network I/O goes through [`Transport`] so the session logic can be
//! driven by fakes in tests.

use async_trait::async_trait;

use crate::error::ClientResult;
use crate::types::{ApiRequest, ApiResponse};

/// HTTP transport to the generation backend
#[mockall::automock]
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send a request and return the raw response for any status code.
    /// Only network failures and timeouts are errors here.
    async fn send(&self, request: ApiRequest) -> ClientResult<ApiResponse>;
}
