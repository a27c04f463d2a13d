//! Test helpers for session tests

use std::sync::Arc;
use std::time::Duration;

use serde_json::{Value, json};

use crate::config::ClientConfig;
use crate::core::SessionClient;
use crate::traits::MockTransport;
use crate::types::ApiResponse;

/// Default timings with a short request timeout
pub fn test_config() -> ClientConfig {
    ClientConfig {
        request_timeout: Duration::from_secs(1),
        ..ClientConfig::default()
    }
}

pub fn client_with(mock: MockTransport) -> SessionClient {
    SessionClient::new(test_config(), Arc::new(mock))
}

pub fn ok_json(value: Value) -> ApiResponse {
    ApiResponse::json(200, &value)
}

pub fn ok_empty() -> ApiResponse {
    ok_json(json!({"success": true}))
}

pub fn registered(id: &str) -> ApiResponse {
    ok_json(json!({
        "success": true,
        "client_id": id,
        "client_name": "Big Niu Frontend",
        "created_at": "2024-05-01T12:00:00.000000"
    }))
}

pub fn not_found() -> ApiResponse {
    ApiResponse::json(404, &json!({"detail": "Client not found"}))
}

pub fn server_error() -> ApiResponse {
    ApiResponse::json(500, &json!({"detail": "internal error"}))
}

/// Transport that registers `id` and answers everything else with `{success:true}`
pub fn registering_mock(id: &'static str) -> MockTransport {
    let mut mock = MockTransport::new();
    mock.expect_send().returning(move |request| {
        if request.path == crate::types::routes::REGISTER {
            Ok(registered(id))
        } else {
            Ok(ok_empty())
        }
    });
    mock
}
