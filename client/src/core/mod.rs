//! Session lifecycle, heartbeat and polling

pub mod polling;
pub mod session;
pub mod state;
pub mod tasks;

pub use polling::{PollHandle, PollOutcome, poll_until};
pub use session::SessionClient;
pub use state::{SessionMetrics, SessionState};
pub use tasks::RepeatingTask;

#[cfg(test)]
mod tests;
