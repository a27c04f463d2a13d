//! Tests for registration and identity-scoped calls

use std::sync::{Arc, Mutex};

use serde_json::json;
use shared::{ClientId, ConnectionState, JobState, ModelConfig, NovelSubmitRequest};

use super::helpers::*;
use crate::error::ClientError;
use crate::traits::MockTransport;
use crate::types::{ApiRequest, ApiResponse, HttpMethod, routes};

mod registration_tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_register_stores_identity_and_connects() {
        let client = client_with(registering_mock("abc123"));

        let info = client.register().await.unwrap();

        assert_eq!(info.client_id, ClientId::new("abc123"));
        assert_eq!(info.status, ConnectionState::Connected);
        assert!(info.created_at.is_some());
        assert_eq!(client.client_id().await, Some(ClientId::new("abc123")));
        assert_eq!(client.connection_state(), ConnectionState::Connected);
        assert!(client.heartbeat_active());
        assert_eq!(client.reconnect_attempts(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_register_sends_client_name() {
        let mut mock = MockTransport::new();
        mock.expect_send()
            .withf(|request| {
                request.method == HttpMethod::Post
                    && request.path == routes::REGISTER
                    && request.body == Some(json!({"client_name": "Big Niu Frontend"}))
            })
            .times(1)
            .returning(|_| Ok(registered("abc123")));

        let client = client_with(mock);
        client.register().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_register_http_failure_leaves_error_state() {
        let mut mock = MockTransport::new();
        mock.expect_send().times(1).returning(|_| Ok(server_error()));

        let client = client_with(mock);
        let result = client.register().await;

        assert!(matches!(result, Err(ClientError::RegistrationFailed { .. })));
        assert_eq!(client.connection_state(), ConnectionState::Error);
        assert!(client.client_id().await.is_none());
        assert!(!client.heartbeat_active());

        // No automatic retry and nothing reaches the network afterwards
        let scoped = client.get_video_status().await;
        assert!(matches!(scoped, Err(ClientError::NotRegistered)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_register_rejected_by_envelope() {
        let mut mock = MockTransport::new();
        mock.expect_send()
            .times(1)
            .returning(|_| Ok(ok_json(json!({"success": false, "message": "too many clients"}))));

        let client = client_with(mock);
        match client.register().await {
            Err(ClientError::RegistrationFailed { message }) => assert_eq!(message, "too many clients"),
            other => panic!("unexpected result {other:?}"),
        }
        assert_eq!(client.connection_state(), ConnectionState::Error);
    }

    #[tokio::test(start_paused = true)]
    async fn test_register_transport_failure() {
        let mut mock = MockTransport::new();
        mock.expect_send()
            .times(1)
            .returning(|_| Err(ClientError::transport("connection refused")));

        let client = client_with(mock);
        assert!(matches!(client.register().await, Err(ClientError::Transport { .. })));
        assert_eq!(client.connection_state(), ConnectionState::Error);
    }

    #[tokio::test(start_paused = true)]
    async fn test_register_publishes_state_transitions() {
        let client = client_with(registering_mock("abc123"));
        let mut states = client.subscribe();

        client.register().await.unwrap();

        assert!(states.has_changed().unwrap());
        assert_eq!(*states.borrow_and_update(), ConnectionState::Connected);
    }
}

mod scoped_call_tests {
    use super::*;

    #[tokio::test]
    async fn test_scoped_calls_fail_fast_without_identity() {
        let mut mock = MockTransport::new();
        mock.expect_send().times(0);
        let client = client_with(mock);

        assert!(matches!(client.get_storyboard().await, Err(ClientError::NotRegistered)));
        assert!(matches!(client.download_video().await, Err(ClientError::NotRegistered)));
        assert!(matches!(client.send_heartbeat().await, Err(ClientError::NotRegistered)));
        assert!(matches!(
            client.save_model_config(&ModelConfig::default()).await,
            Err(ClientError::NotRegistered)
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_scoped_call_embeds_identity() {
        let seen: Arc<Mutex<Vec<ApiRequest>>> = Arc::default();
        let recorder = seen.clone();

        let mut mock = MockTransport::new();
        mock.expect_send().returning(move |request| {
            recorder.lock().unwrap().push(request.clone());
            if request.path == routes::REGISTER {
                return Ok(registered("abc123"));
            }
            Ok(ok_empty())
        });

        let client = client_with(mock);
        client.register().await.unwrap();
        client
            .submit_novel(&NovelSubmitRequest::new("Once upon a time").with_storyboard(true))
            .await
            .unwrap();

        let requests = seen.lock().unwrap();
        let submit = requests.last().unwrap();
        assert_eq!(submit.path, "/novel/submit/abc123");
        assert_eq!(submit.body.as_ref().unwrap()["use_storyboard"], true);
    }

    #[tokio::test(start_paused = true)]
    async fn test_invalid_config_never_sent() {
        let mut mock = MockTransport::new();
        mock.expect_send()
            .withf(|request| request.path == routes::REGISTER)
            .times(1)
            .returning(|_| Ok(registered("abc123")));

        let client = client_with(mock);
        client.register().await.unwrap();

        let mut config = ModelConfig::default();
        config.characters = vec!["only one".to_string()];
        let result = client.save_model_config(&config).await;
        assert!(matches!(result, Err(ClientError::SharedError(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn test_non_expiry_http_error_surfaces() {
        let mut mock = MockTransport::new();
        mock.expect_send().returning(|request| {
            if request.path == routes::REGISTER {
                Ok(registered("abc123"))
            } else {
                Ok(ApiResponse::json(400, &json!({"detail": "text too long"})))
            }
        });

        let client = client_with(mock);
        client.register().await.unwrap();

        match client.submit_novel(&NovelSubmitRequest::new("text")).await {
            Err(ClientError::Http { status, message }) => {
                assert_eq!(status, 400);
                assert_eq!(message, "text too long");
            }
            other => panic!("unexpected result {other:?}"),
        }
        assert_eq!(client.connection_state(), ConnectionState::Connected);
    }

    #[tokio::test(start_paused = true)]
    async fn test_rejected_envelope_surfaces_message() {
        let mut mock = MockTransport::new();
        mock.expect_send().returning(|request| {
            if request.path == routes::REGISTER {
                Ok(registered("abc123"))
            } else {
                Ok(ok_json(json!({"success": false, "error": "storyboard locked"})))
            }
        });

        let client = client_with(mock);
        client.register().await.unwrap();

        match client.save_storyboard(&Default::default()).await {
            Err(ClientError::Rejected { message }) => assert_eq!(message, "storyboard locked"),
            other => panic!("unexpected result {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_storyboard_pending_reads_as_none() {
        let mut mock = MockTransport::new();
        mock.expect_send().returning(|request| {
            if request.path == routes::REGISTER {
                Ok(registered("abc123"))
            } else {
                Ok(ok_json(json!({"success": true, "message": "storyboard not ready", "data": null})))
            }
        });

        let client = client_with(mock);
        client.register().await.unwrap();
        assert!(client.get_storyboard().await.unwrap().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_video_status_flat_shape() {
        let mut mock = MockTransport::new();
        mock.expect_send().returning(|request| {
            if request.path == routes::REGISTER {
                Ok(registered("abc123"))
            } else {
                Ok(ok_json(json!({"success": true, "status": "not_started", "progress": 0})))
            }
        });

        let client = client_with(mock);
        client.register().await.unwrap();

        let status = client.get_video_status().await.unwrap().unwrap();
        assert_eq!(status.status, JobState::Pending);
    }

    #[tokio::test(start_paused = true)]
    async fn test_download_returns_raw_bytes() {
        let mut mock = MockTransport::new();
        mock.expect_send().returning(|request| {
            if request.path == routes::REGISTER {
                Ok(registered("abc123"))
            } else {
                assert_eq!(request.path, "/video/download/abc123");
                Ok(ApiResponse::new(200, vec![0u8, 1, 2, 3]))
            }
        });

        let client = client_with(mock);
        client.register().await.unwrap();
        assert_eq!(client.download_video().await.unwrap(), vec![0, 1, 2, 3]);
    }
}

mod status_tests {
    use super::*;

    #[tokio::test]
    async fn test_check_status_without_identity_is_disconnected() {
        let mut mock = MockTransport::new();
        mock.expect_send().times(0);
        let client = client_with(mock);

        assert_eq!(client.check_client_status().await, ConnectionState::Disconnected);
    }

    #[tokio::test(start_paused = true)]
    async fn test_check_status_maps_remote_status() {
        let mut mock = MockTransport::new();
        mock.expect_send().returning(|request| {
            if request.path == routes::REGISTER {
                Ok(registered("abc123"))
            } else {
                Ok(ok_json(json!({"success": true, "data": {"status": "online", "is_online": true}})))
            }
        });

        let client = client_with(mock);
        client.register().await.unwrap();
        assert_eq!(client.check_client_status().await, ConnectionState::Connected);
    }

    #[tokio::test(start_paused = true)]
    async fn test_check_status_failure_reads_as_error() {
        let mut mock = MockTransport::new();
        mock.expect_send().returning(|request| {
            if request.path == routes::REGISTER {
                Ok(registered("abc123"))
            } else {
                Err(ClientError::transport("connection reset"))
            }
        });

        let client = client_with(mock);
        client.register().await.unwrap();
        assert_eq!(client.check_client_status().await, ConnectionState::Error);
        // a failed status check never moves the session itself
        assert_eq!(client.connection_state(), ConnectionState::Connected);
    }

    #[tokio::test]
    async fn test_session_stats_from_stats_field() {
        let mut mock = MockTransport::new();
        mock.expect_send()
            .withf(|request| request.path == routes::SESSION_STATS)
            .returning(|_| {
                Ok(ok_json(json!({
                    "success": true,
                    "stats": {"total_clients": 4, "online_clients": 3, "offline_clients": 1, "timeout_minutes": 5}
                })))
            });

        let client = client_with(mock);
        let stats = client.session_stats().await.unwrap();
        assert_eq!(stats.total_clients, 4);
        assert_eq!(stats.online_clients, 3);
        assert_eq!(stats.timeout_minutes, Some(5));
    }

    #[tokio::test]
    async fn test_storyboard_examples() {
        let mut mock = MockTransport::new();
        mock.expect_send()
            .withf(|request| request.path == routes::STORYBOARD_EXAMPLES)
            .returning(|_| Ok(ok_json(json!({"success": true, "examples": [{"title": "demo"}]}))));

        let client = client_with(mock);
        let examples = client.storyboard_examples().await.unwrap();
        assert_eq!(examples.len(), 1);
        assert_eq!(examples[0]["title"], "demo");
    }
}
