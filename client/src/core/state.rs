//! Session state
//!
//! The identity is the only value shared between foreground calls and
//! background tasks. It sits behind an async `RwLock`; everything else is
//! atomics or a watch channel.
//!
//! The session epoch advances whenever a session is started or ended. It
//! is only advanced with the identity write lock held, so a registration
//! that commits under the same lock can tell whether it was superseded.

use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard};

use tokio::sync::{RwLock, RwLockWriteGuard, watch};

use shared::{ClientId, ConnectionState};

use crate::core::tasks::RepeatingTask;

/// Counters describing the session's lifetime activity
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionMetrics {
    pub registrations: u64,
    pub heartbeat_starts: u64,
    pub heartbeat_stops: u64,
    pub heartbeats_sent: u64,
    pub heartbeat_failures: u64,
    pub expiries: u64,
}

#[derive(Debug)]
pub struct SessionState {
    identity: RwLock<Option<ClientId>>,
    epoch: AtomicU64,
    connection: watch::Sender<ConnectionState>,
    reconnect_attempts: AtomicU32,
    visible: AtomicBool,
    heartbeat: Mutex<Option<RepeatingTask>>,

    registrations: AtomicU64,
    heartbeat_starts: AtomicU64,
    heartbeat_stops: AtomicU64,
    heartbeats_sent: AtomicU64,
    heartbeat_failures: AtomicU64,
    expiries: AtomicU64,
}

impl SessionState {
    pub fn new() -> Self {
        let (connection, _) = watch::channel(ConnectionState::Disconnected);
        Self {
            identity: RwLock::new(None),
            epoch: AtomicU64::new(0),
            connection,
            reconnect_attempts: AtomicU32::new(0),
            visible: AtomicBool::new(true),
            heartbeat: Mutex::new(None),
            registrations: AtomicU64::new(0),
            heartbeat_starts: AtomicU64::new(0),
            heartbeat_stops: AtomicU64::new(0),
            heartbeats_sent: AtomicU64::new(0),
            heartbeat_failures: AtomicU64::new(0),
            expiries: AtomicU64::new(0),
        }
    }

    pub async fn identity(&self) -> Option<ClientId> {
        self.identity.read().await.clone()
    }

    /// Exclusive access to the identity, for changes that must not
    /// interleave with the end of a session
    pub async fn write_identity(&self) -> RwLockWriteGuard<'_, Option<ClientId>> {
        self.identity.write().await
    }

    pub fn epoch(&self) -> u64 {
        self.epoch.load(Ordering::SeqCst)
    }

    /// Invalidate registrations in flight. Call with the identity write
    /// lock held; returns the new epoch.
    pub fn advance_epoch(&self) -> u64 {
        self.epoch.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Clear the identity only if it still equals `stale`
    pub async fn clear_identity_if(&self, stale: &ClientId) -> bool {
        let mut identity = self.identity.write().await;
        if identity.as_ref() == Some(stale) {
            *identity = None;
            true
        } else {
            false
        }
    }

    pub fn connection_state(&self) -> ConnectionState {
        *self.connection.borrow()
    }

    pub fn set_connection_state(&self, state: ConnectionState) {
        self.connection.send_replace(state);
    }

    pub fn subscribe(&self) -> watch::Receiver<ConnectionState> {
        self.connection.subscribe()
    }

    pub fn reconnect_attempts(&self) -> u32 {
        self.reconnect_attempts.load(Ordering::SeqCst)
    }

    pub fn reset_reconnect_attempts(&self) {
        self.reconnect_attempts.store(0, Ordering::SeqCst);
    }

    /// Claim one reconnect attempt if fewer than `max` were used
    pub fn try_claim_reconnect(&self, max: u32) -> bool {
        self.reconnect_attempts
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| (n < max).then_some(n + 1))
            .is_ok()
    }

    pub fn is_visible(&self) -> bool {
        self.visible.load(Ordering::SeqCst)
    }

    pub fn set_visible(&self, visible: bool) {
        self.visible.store(visible, Ordering::SeqCst);
    }

    fn heartbeat_slot(&self) -> MutexGuard<'_, Option<RepeatingTask>> {
        self.heartbeat.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Install a heartbeat task, stopping any previous one first
    pub fn replace_heartbeat(&self, task: RepeatingTask) {
        let mut slot = self.heartbeat_slot();
        if let Some(mut prior) = slot.take() {
            if prior.stop() {
                self.heartbeat_stops.fetch_add(1, Ordering::SeqCst);
            }
        }
        *slot = Some(task);
        self.heartbeat_starts.fetch_add(1, Ordering::SeqCst);
    }

    /// Stop the heartbeat task. Returns whether one was running.
    pub fn stop_heartbeat(&self) -> bool {
        let stopped = self.heartbeat_slot().take().is_some_and(|mut task| task.stop());
        if stopped {
            self.heartbeat_stops.fetch_add(1, Ordering::SeqCst);
        }
        stopped
    }

    pub fn heartbeat_active(&self) -> bool {
        self.heartbeat_slot().as_ref().is_some_and(|task| task.is_running())
    }

    pub fn record_registration(&self) {
        self.registrations.fetch_add(1, Ordering::SeqCst);
    }

    pub fn record_heartbeat(&self, delivered: bool) {
        let counter = if delivered { &self.heartbeats_sent } else { &self.heartbeat_failures };
        counter.fetch_add(1, Ordering::SeqCst);
    }

    pub fn record_expiry(&self) {
        self.expiries.fetch_add(1, Ordering::SeqCst);
    }

    pub fn metrics(&self) -> SessionMetrics {
        SessionMetrics {
            registrations: self.registrations.load(Ordering::SeqCst),
            heartbeat_starts: self.heartbeat_starts.load(Ordering::SeqCst),
            heartbeat_stops: self.heartbeat_stops.load(Ordering::SeqCst),
            heartbeats_sent: self.heartbeats_sent.load(Ordering::SeqCst),
            heartbeat_failures: self.heartbeat_failures.load(Ordering::SeqCst),
            expiries: self.expiries.load(Ordering::SeqCst),
        }
    }
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new()
    }
}
