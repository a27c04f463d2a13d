//! Message types for the generation backend
//!
//! This module organizes the backend contract by category:
//! - `envelope`: Response envelope and client lifecycle payloads
//! - `config`: Model and audio/video generation parameters
//! - `storyboard`: The editable shot table produced before rendering

pub mod envelope;
pub mod config;
pub mod storyboard;

pub use envelope::{
    ApiEnvelope, RegisterRequest, RegisterResponse, RemoteClientStatus, SessionStats,
    NovelSubmitRequest, StoryboardExamples, MAX_NOVEL_CHARS,
};

pub use config::{
    ModelConfig, AudioVideoConfig, AnimeMode, Era, ShotDirection,
    AudioFormat, ChannelLayout, VideoFormat, Resolution,
};

pub use storyboard::{StoryboardTable, StoryboardCell};
