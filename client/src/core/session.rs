//! Session client
//!
//! Owns the client identity and connection lifecycle and exposes the
//! identity-scoped request surface of the generation backend.
//!
//! - `register` obtains an identity and starts the heartbeat.
//! - Scoped calls fail with [`ClientError::NotRegistered`] before touching
//!   the network when no identity is held.
//! - A 404 (or 410) on a scoped call is a session expiry: the heartbeat
//!   stops, the identity is dropped and the client re-registers, up to
//!   `max_reconnect_attempts` times, then re-issues the original request.
//! - `disconnect` stops the heartbeat and drops the identity.

use std::path::Path;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use tokio::sync::{Mutex, watch};

use shared::{
    ApiEnvelope, AudioVideoConfig, ClientId, ConnectionState, ModelConfig, NovelSubmitRequest,
    RegisterRequest, RegisterResponse, RemoteClientStatus, SessionStats, StoryboardExamples,
    StoryboardTable, VideoStatus, session_debug, session_error, session_info, session_warn,
};

use crate::config::ClientConfig;
use crate::core::state::{SessionMetrics, SessionState};
use crate::core::tasks::RepeatingTask;
use crate::error::{ClientError, ClientResult};
use crate::services::ReqwestTransport;
use crate::traits::Transport;
use crate::types::{ApiRequest, ApiResponse, ClientInfo, routes};

const UNREGISTERED: &str = "unregistered";

/// Status codes the backend uses for an unknown or offline client
fn is_expiry_signal(status: u16) -> bool {
    status == 404 || status == 410
}

/// Session client for the generation backend. Clones share one session.
#[derive(Clone)]
pub struct SessionClient {
    pub(crate) inner: Arc<SessionInner>,
}

pub(crate) struct SessionInner {
    pub(crate) config: ClientConfig,
    transport: Arc<dyn Transport>,
    state: SessionState,
    expiry_lock: Mutex<()>,
}

impl SessionClient {
    pub fn new(config: ClientConfig, transport: Arc<dyn Transport>) -> Self {
        Self {
            inner: Arc::new(SessionInner {
                config,
                transport,
                state: SessionState::new(),
                expiry_lock: Mutex::new(()),
            }),
        }
    }

    /// Session client over the real HTTP transport
    pub fn over_http(config: ClientConfig) -> ClientResult<Self> {
        let transport = ReqwestTransport::new(config.clone())?;
        Ok(Self::new(config, Arc::new(transport)))
    }

    pub fn config(&self) -> &ClientConfig {
        &self.inner.config
    }

    pub fn connection_state(&self) -> ConnectionState {
        self.inner.state.connection_state()
    }

    /// Watch connection state transitions
    pub fn subscribe(&self) -> watch::Receiver<ConnectionState> {
        self.inner.state.subscribe()
    }

    pub async fn client_id(&self) -> Option<ClientId> {
        self.inner.state.identity().await
    }

    pub fn reconnect_attempts(&self) -> u32 {
        self.inner.state.reconnect_attempts()
    }

    pub fn heartbeat_active(&self) -> bool {
        self.inner.state.heartbeat_active()
    }

    pub fn metrics(&self) -> SessionMetrics {
        self.inner.state.metrics()
    }

    // ---- lifecycle ----

    /// Register a new client identity. Resets the reconnect counter on
    /// success; never retries on failure. A registration still in flight
    /// from before this call is discarded when it completes.
    pub async fn register(&self) -> ClientResult<ClientInfo> {
        let epoch = {
            let _identity = self.inner.state.write_identity().await;
            self.inner.state.advance_epoch()
        };
        self.register_as(ConnectionState::Connecting, true, epoch).await
    }

    /// Register and install the identity, unless the session was ended or
    /// restarted after `epoch` was read. A superseded registration leaves
    /// the state untouched and fails with [`ClientError::NotRegistered`].
    async fn register_as(
        &self,
        transitional: ConnectionState,
        explicit: bool,
        epoch: u64,
    ) -> ClientResult<ClientInfo> {
        let state = &self.inner.state;
        {
            let _identity = state.write_identity().await;
            if state.epoch() != epoch {
                return Err(ClientError::NotRegistered);
            }
            state.set_connection_state(transitional);
        }
        state.record_registration();

        let result = self.request_registration().await;

        let mut identity = state.write_identity().await;
        if state.epoch() != epoch {
            let outcome = result.as_ref().map(|r| r.client_id.as_str()).unwrap_or("failed");
            session_info!(UNREGISTERED, outcome, "Registration superseded, result discarded");
            return Err(ClientError::NotRegistered);
        }

        match result {
            Ok(registered) => {
                let client_id = ClientId::new(registered.client_id.clone());
                *identity = Some(client_id.clone());
                if explicit {
                    state.reset_reconnect_attempts();
                }
                self.start_heartbeat(&client_id);
                state.set_connection_state(ConnectionState::Connected);
                drop(identity);
                session_info!(client_id, explicit, "✅ Client registered");

                Ok(ClientInfo {
                    client_id,
                    status: ConnectionState::Connected,
                    created_at: registered.created_at_utc(),
                })
            }
            Err(e) => {
                state.stop_heartbeat();
                *identity = None;
                state.set_connection_state(ConnectionState::Error);
                drop(identity);
                session_error!(UNREGISTERED, error = %e, "❌ Client registration failed");
                Err(e)
            }
        }
    }

    async fn request_registration(&self) -> ClientResult<RegisterResponse> {
        let request = ApiRequest::post(routes::REGISTER).with_json(&RegisterRequest {
            client_name: self.inner.config.client_name.clone(),
        })?;
        let response = self.inner.transport.send(request).await?;

        if !response.is_success() {
            return Err(ClientError::RegistrationFailed {
                message: format!("HTTP {}: {}", response.status, response.error_message()),
            });
        }

        let envelope: ApiEnvelope<RegisterResponse> = response.decode()?;
        if !envelope.success {
            return Err(ClientError::RegistrationFailed { message: envelope.failure_message() });
        }
        envelope
            .into_payload()?
            .ok_or_else(|| ClientError::invalid_response("registration response carried no client_id"))
    }

    /// Stop the heartbeat and drop the identity. Safe to call repeatedly.
    /// A re-registration in flight is discarded when its response arrives.
    pub async fn disconnect(&self) {
        let state = &self.inner.state;
        let previous = {
            let mut identity = state.write_identity().await;
            state.advance_epoch();
            state.stop_heartbeat();
            state.set_connection_state(ConnectionState::Disconnected);
            identity.take()
        };

        if let Some(client_id) = previous {
            session_info!(client_id, "👋 Client disconnected");
        }
    }

    /// Page visibility changes: hiding tears the heartbeat down, showing
    /// restarts it while an identity is held. Polling is unaffected.
    pub async fn set_visible(&self, visible: bool) {
        let state = &self.inner.state;
        if state.is_visible() == visible {
            return;
        }
        state.set_visible(visible);

        if !visible {
            if state.stop_heartbeat() {
                session_debug!(UNREGISTERED, "Heartbeat paused while hidden");
            }
        } else if let Some(client_id) = state.identity().await {
            self.start_heartbeat(&client_id);
        }
    }

    // ---- heartbeat ----

    fn start_heartbeat(&self, client_id: &ClientId) {
        let state = &self.inner.state;
        if !state.is_visible() {
            state.stop_heartbeat();
            session_debug!(client_id, "Hidden, heartbeat deferred");
            return;
        }

        let weak = Arc::downgrade(&self.inner);
        let task = RepeatingTask::spawn("heartbeat", self.inner.config.heartbeat_interval, move || {
            let weak = weak.clone();
            async move {
                if let Some(inner) = weak.upgrade() {
                    SessionClient { inner }.beat().await;
                }
            }
        });
        state.replace_heartbeat(task);
        session_debug!(client_id, "💓 Heartbeat started");
    }

    /// Send one heartbeat for the current identity
    pub async fn send_heartbeat(&self) -> ClientResult<()> {
        let client_id = self.require_identity().await?;
        let response = self
            .inner
            .transport
            .send(ApiRequest::post(routes::heartbeat(&client_id)))
            .await?;

        if !response.is_success() {
            return Err(ClientError::Http { status: response.status, message: response.error_message() });
        }
        expect_success(&response)
    }

    async fn beat(&self) {
        let state = &self.inner.state;
        match self.send_heartbeat().await {
            Ok(()) => state.record_heartbeat(true),
            Err(ClientError::NotRegistered) => {}
            Err(e) => {
                state.record_heartbeat(false);
                let label = state.identity().await.map(|id| id.to_string());
                session_warn!(label.as_deref().unwrap_or(UNREGISTERED), error = %e, "💔 Heartbeat failed");
            }
        }
    }

    // ---- identity-scoped transport ----

    async fn require_identity(&self) -> ClientResult<ClientId> {
        self.inner.state.identity().await.ok_or(ClientError::NotRegistered)
    }

    /// Send a request built for the current identity, recovering from
    /// session expiry and re-issuing the request with the new identity.
    async fn send_scoped<F>(&self, build: F) -> ClientResult<ApiResponse>
    where
        F: Fn(&ClientId) -> ClientResult<ApiRequest>,
    {
        loop {
            let client_id = self.require_identity().await?;
            let response = self.inner.transport.send(build(&client_id)?).await?;

            if is_expiry_signal(response.status) {
                self.recover_expired(&client_id).await?;
                continue;
            }
            if !response.is_success() {
                return Err(ClientError::Http { status: response.status, message: response.error_message() });
            }
            return Ok(response);
        }
    }

    async fn recover_expired(&self, stale: &ClientId) -> ClientResult<()> {
        let _guard = self.inner.expiry_lock.lock().await;
        let state = &self.inner.state;
        let epoch = state.epoch();

        if !state.clear_identity_if(stale).await {
            // Another caller already handled this expiry, or we disconnected
            return match state.identity().await {
                Some(_) => Ok(()),
                None => Err(ClientError::NotRegistered),
            };
        }

        state.record_expiry();
        state.stop_heartbeat();
        session_warn!(stale, "⌛ Session expired");

        let max = self.inner.config.max_reconnect_attempts;
        if !state.try_claim_reconnect(max) {
            let _identity = state.write_identity().await;
            if state.epoch() == epoch {
                state.set_connection_state(ConnectionState::Error);
            }
            session_error!(stale, max_attempts = max, "❌ Reconnect attempts exhausted");
            return Err(ClientError::SessionExpired);
        }

        session_info!(
            stale,
            attempt = state.reconnect_attempts(),
            max_attempts = max,
            "🔄 Re-registering after session expiry"
        );
        match self.register_as(ConnectionState::Reconnecting, false, epoch).await {
            Ok(_) => Ok(()),
            // superseded by disconnect, or by an explicit register
            Err(ClientError::NotRegistered) => match state.identity().await {
                Some(_) => Ok(()),
                None => Err(ClientError::NotRegistered),
            },
            Err(_) => Err(ClientError::SessionExpired),
        }
    }

    async fn send_unscoped(&self, request: ApiRequest) -> ClientResult<ApiResponse> {
        let response = self.inner.transport.send(request).await?;
        if !response.is_success() {
            return Err(ClientError::Http { status: response.status, message: response.error_message() });
        }
        Ok(response)
    }

    // ---- configuration ----

    pub async fn save_model_config(&self, config: &ModelConfig) -> ClientResult<()> {
        let response = self
            .send_scoped(|id| {
                config.validate()?;
                ApiRequest::post(routes::model_config(id)).with_json(config)
            })
            .await?;
        expect_success(&response)
    }

    pub async fn get_model_config(&self) -> ClientResult<Option<ModelConfig>> {
        let response = self.send_scoped(|id| Ok(ApiRequest::get(routes::model_config(id)))).await?;
        decode_payload(&response)
    }

    pub async fn save_audio_video_config(&self, config: &AudioVideoConfig) -> ClientResult<()> {
        let response = self
            .send_scoped(|id| {
                config.validate()?;
                ApiRequest::post(routes::audio_video_config(id)).with_json(config)
            })
            .await?;
        expect_success(&response)
    }

    pub async fn get_audio_video_config(&self) -> ClientResult<Option<AudioVideoConfig>> {
        let response = self
            .send_scoped(|id| Ok(ApiRequest::get(routes::audio_video_config(id))))
            .await?;
        decode_payload(&response)
    }

    // ---- generation ----

    pub async fn submit_novel(&self, request: &NovelSubmitRequest) -> ClientResult<()> {
        let response = self
            .send_scoped(|id| {
                request.validate()?;
                ApiRequest::post(routes::submit_novel(id)).with_json(request)
            })
            .await?;
        expect_success(&response)?;

        if let Some(client_id) = self.client_id().await {
            session_info!(
                client_id,
                chars = request.text.chars().count(),
                use_storyboard = request.use_storyboard,
                "📖 Novel submitted"
            );
        }
        Ok(())
    }

    /// Current storyboard; `None` while the backend has not produced one
    pub async fn get_storyboard(&self) -> ClientResult<Option<StoryboardTable>> {
        let response = self.send_scoped(|id| Ok(ApiRequest::get(routes::storyboard(id)))).await?;
        decode_payload(&response)
    }

    pub async fn save_storyboard(&self, storyboard: &StoryboardTable) -> ClientResult<()> {
        let response = self
            .send_scoped(|id| ApiRequest::post(routes::storyboard(id)).with_json(storyboard))
            .await?;
        expect_success(&response)
    }

    pub async fn get_video_status(&self) -> ClientResult<Option<VideoStatus>> {
        let response = self.send_scoped(|id| Ok(ApiRequest::get(routes::video_status(id)))).await?;
        decode_payload(&response)
    }

    pub async fn download_video(&self) -> ClientResult<Vec<u8>> {
        let response = self
            .send_scoped(|id| Ok(ApiRequest::get(routes::video_download(id))))
            .await?;
        Ok(response.body)
    }

    /// Download the rendered video into `path`, returning the byte count
    pub async fn download_video_to(&self, path: &Path) -> ClientResult<u64> {
        let bytes = self.download_video().await?;
        tokio::fs::write(path, &bytes).await?;
        Ok(bytes.len() as u64)
    }

    // ---- status ----

    pub async fn client_status(&self) -> ClientResult<RemoteClientStatus> {
        let response = self.send_scoped(|id| Ok(ApiRequest::get(routes::client_status(id)))).await?;
        decode_payload(&response)?
            .ok_or_else(|| ClientError::invalid_response("client status response carried no status"))
    }

    /// Backend view of this client as a connection state. Never fails:
    /// no identity reads as disconnected, any failure as error.
    pub async fn check_client_status(&self) -> ConnectionState {
        let Some(client_id) = self.client_id().await else {
            return ConnectionState::Disconnected;
        };
        match self.client_status().await {
            Ok(remote) => ConnectionState::from_remote(&remote.status),
            Err(e) => {
                session_warn!(client_id, error = %e, "Client status check failed");
                ConnectionState::Error
            }
        }
    }

    pub async fn session_stats(&self) -> ClientResult<SessionStats> {
        let response = self.send_unscoped(ApiRequest::get(routes::SESSION_STATS)).await?;
        let mut envelope: ApiEnvelope<SessionStats> = response.decode()?;
        if !envelope.success {
            return Err(ClientError::Rejected { message: envelope.failure_message() });
        }
        if envelope.data.is_none() {
            if let Some(stats) = envelope.take_field("stats")? {
                return Ok(stats);
            }
        }
        Ok(envelope.into_payload()?.unwrap_or_default())
    }

    pub async fn storyboard_examples(&self) -> ClientResult<StoryboardExamples> {
        let response = self.send_unscoped(ApiRequest::get(routes::STORYBOARD_EXAMPLES)).await?;
        let mut envelope: ApiEnvelope<StoryboardExamples> = response.decode()?;
        if !envelope.success {
            return Err(ClientError::Rejected { message: envelope.failure_message() });
        }
        if let Some(examples) = envelope.data.take() {
            return Ok(examples);
        }
        Ok(envelope.take_field("examples")?.unwrap_or_default())
    }
}

fn expect_success(response: &ApiResponse) -> ClientResult<()> {
    let envelope: ApiEnvelope = response.decode()?;
    if !envelope.success {
        return Err(ClientError::Rejected { message: envelope.failure_message() });
    }
    Ok(())
}

fn decode_payload<T: DeserializeOwned>(response: &ApiResponse) -> ClientResult<Option<T>> {
    let envelope: ApiEnvelope<T> = response.decode()?;
    if !envelope.success {
        return Err(ClientError::Rejected { message: envelope.failure_message() });
    }
    Ok(envelope.into_payload()?)
}
