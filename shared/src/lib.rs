//! Shared types for the novel-to-video backend contract
//!
//! Contains the wire types exchanged with the generation backend plus the
//! logging helpers every binary in the workspace uses. Client-internal
//! types (transport, session state) live in the `client` crate.

pub mod types;
pub mod errors;
pub mod logging;
pub mod messages;

pub use types::*;
pub use errors::*;

pub use messages::{
    // Response envelope and client lifecycle payloads
    ApiEnvelope, RegisterRequest, RegisterResponse, RemoteClientStatus, SessionStats,
    NovelSubmitRequest, StoryboardExamples,

    // Generation parameters
    ModelConfig, AudioVideoConfig, AnimeMode, Era, ShotDirection,
    AudioFormat, ChannelLayout, VideoFormat, Resolution,

    // Storyboard
    StoryboardTable, StoryboardCell,
};
