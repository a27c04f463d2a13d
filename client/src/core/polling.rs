//! Bounded job polling
//!
//! A status check runs every `poll_interval` until the job reaches a
//! terminal state or `poll_ceiling` elapses. The ceiling also bounds a
//! check that is still in flight when it passes.

use std::future::Future;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use shared::{JobState, StoryboardTable, VideoStatus};

use crate::core::session::SessionClient;
use crate::error::{ClientError, ClientResult};

/// How a polling run ended
#[derive(Debug, Clone, PartialEq)]
pub enum PollOutcome<T> {
    Completed(T),
    /// The job reached its error state; carries the backend message
    Failed(String),
    TimedOut,
    Cancelled,
}

impl<T> PollOutcome<T> {
    pub fn is_completed(&self) -> bool {
        matches!(self, PollOutcome::Completed(_))
    }

    pub fn completed(self) -> Option<T> {
        match self {
            PollOutcome::Completed(value) => Some(value),
            _ => None,
        }
    }
}

/// Run `check` every `interval` until it yields an outcome or `ceiling`
/// passes. `check` returns `Ok(None)` while the job is still running.
///
/// Transient failures are logged and polling continues; any other error
/// ends the run.
pub async fn poll_until<T, F, Fut>(
    job: &'static str,
    interval: Duration,
    ceiling: Duration,
    mut check: F,
) -> ClientResult<PollOutcome<T>>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = ClientResult<Option<PollOutcome<T>>>>,
{
    let started = Instant::now();
    let deadline = started + ceiling;
    let mut ticker = tokio::time::interval_at(started + interval, interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let mut checks = 0u32;
    loop {
        tokio::select! {
            biased;
            _ = tokio::time::sleep_until(deadline) => break,
            _ = ticker.tick() => {}
        }

        checks += 1;
        match tokio::time::timeout_at(deadline, check()).await {
            Err(_) => break,
            Ok(Ok(Some(outcome))) => {
                debug!(job, checks, elapsed_ms = started.elapsed().as_millis() as u64, "Polling finished");
                return Ok(outcome);
            }
            Ok(Ok(None)) => {}
            Ok(Err(e)) if e.is_transient() => {
                warn!(job, checks, error = %e, "Status check failed, polling continues");
            }
            Ok(Err(e)) => return Err(e),
        }
    }

    warn!(job, checks, ceiling_secs = ceiling.as_secs(), "⏰ Polling ceiling reached");
    Ok(PollOutcome::TimedOut)
}

/// Background polling run that can be cancelled
pub struct PollHandle<T> {
    handle: JoinHandle<ClientResult<PollOutcome<T>>>,
}

impl<T: Send + 'static> PollHandle<T> {
    fn spawn<Fut>(run: Fut) -> Self
    where
        Fut: Future<Output = ClientResult<PollOutcome<T>>> + Send + 'static,
    {
        Self { handle: tokio::spawn(run) }
    }

    /// Stop polling. No status check runs after this returns. Repeated
    /// calls are no-ops.
    pub fn cancel(&self) {
        self.handle.abort();
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Wait for the run to end
    pub async fn outcome(self) -> ClientResult<PollOutcome<T>> {
        match self.handle.await {
            Ok(result) => result,
            Err(e) if e.is_cancelled() => Ok(PollOutcome::Cancelled),
            Err(e) => Err(ClientError::transport(format!("polling task failed: {e}"))),
        }
    }
}

impl SessionClient {
    /// Wait for the storyboard after a submission with `use_storyboard`
    pub async fn wait_for_storyboard(&self) -> ClientResult<PollOutcome<StoryboardTable>> {
        let config = &self.inner.config;
        poll_until("storyboard", config.poll_interval, config.poll_ceiling, move || async move {
            match self.get_storyboard().await {
                Ok(Some(storyboard)) => {
                    info!(cells = storyboard.len(), "🎬 Storyboard ready");
                    Ok(Some(PollOutcome::Completed(storyboard)))
                }
                Ok(None) => Ok(None),
                Err(ClientError::Rejected { message }) => Ok(Some(PollOutcome::Failed(message))),
                Err(e) => Err(e),
            }
        })
        .await
    }

    /// Wait for the video to finish rendering
    pub async fn wait_for_video(&self) -> ClientResult<PollOutcome<VideoStatus>> {
        self.poll_video(None).await
    }

    /// Wait for the video, forwarding every status read to `updates`.
    /// A full or closed channel drops the update; polling is unaffected.
    pub async fn wait_for_video_with_updates(
        &self,
        updates: mpsc::Sender<VideoStatus>,
    ) -> ClientResult<PollOutcome<VideoStatus>> {
        self.poll_video(Some(updates)).await
    }

    async fn poll_video(
        &self,
        updates: Option<mpsc::Sender<VideoStatus>>,
    ) -> ClientResult<PollOutcome<VideoStatus>> {
        let config = &self.inner.config;
        poll_until("video", config.poll_interval, config.poll_ceiling, move || {
            let updates = updates.clone();
            async move {
                let Some(status) = self.get_video_status().await? else {
                    return Ok(None);
                };
                if let Some(tx) = &updates {
                    let _ = tx.try_send(status.clone());
                }
                Ok(video_outcome(status))
            }
        })
        .await
    }

    pub fn spawn_video_poll(&self) -> PollHandle<VideoStatus> {
        let client = self.clone();
        PollHandle::spawn(async move { client.wait_for_video().await })
    }

    pub fn spawn_storyboard_poll(&self) -> PollHandle<StoryboardTable> {
        let client = self.clone();
        PollHandle::spawn(async move { client.wait_for_storyboard().await })
    }
}

fn video_outcome(status: VideoStatus) -> Option<PollOutcome<VideoStatus>> {
    match status.status {
        JobState::Completed => {
            info!(url = status.url.as_deref().unwrap_or(""), "🎥 Video ready");
            Some(PollOutcome::Completed(status))
        }
        JobState::Error => {
            let message = status.error.unwrap_or_else(|| "video generation failed".to_string());
            warn!(error = %message, "Video generation failed");
            Some(PollOutcome::Failed(message))
        }
        JobState::Pending | JobState::Processing => {
            debug!(state = ?status.status, progress = ?status.progress_fraction(), "Video still rendering");
            None
        }
    }
}
