//! Generation parameters
//!
//! `ModelConfig` describes the visual style, `AudioVideoConfig` the output
//! encoding. Both are sent opaquely to the backend; continuous values are
//! clamped to [0, 1] at the point of edit.

use serde::{Deserialize, Serialize};

use crate::errors::{SharedError, SharedResult};
use crate::types::clamp_unit;

pub const MIN_CHARACTERS: usize = 2;
pub const MAX_CHARACTERS: usize = 5;

#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum AnimeMode {
    Blackwhite,
    #[default]
    Color,
    Illustration,
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Era {
    Medieval,
    Renaissance,
    ColdWar,
    #[default]
    Modern,
    Digital,
    WarringStates,
    Tang,
    Song,
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ShotDirection {
    Vertical,
    #[default]
    Horizontal,
}

/// Visual style parameters
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ModelConfig {
    pub anime_mode: AnimeMode,
    pub era: Era,
    pub random_fine_tune: bool,
    pub random_composition: bool,
    pub random_shot: bool,
    #[serde(default)]
    pub shot_direction: ShotDirection,
    atmosphere: f64,
    distance: f64,
    realism: f64,
    dynamic: f64,
    pub characters: Vec<String>,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            anime_mode: AnimeMode::Color,
            era: Era::Modern,
            random_fine_tune: false,
            random_composition: false,
            random_shot: false,
            shot_direction: ShotDirection::Horizontal,
            atmosphere: 0.5,
            distance: 0.5,
            realism: 0.5,
            dynamic: 0.5,
            characters: vec![String::new(); MAX_CHARACTERS],
        }
    }
}

impl ModelConfig {
    pub fn atmosphere(&self) -> f64 {
        self.atmosphere
    }

    pub fn distance(&self) -> f64 {
        self.distance
    }

    pub fn realism(&self) -> f64 {
        self.realism
    }

    pub fn dynamic(&self) -> f64 {
        self.dynamic
    }

    pub fn set_atmosphere(&mut self, value: f64) {
        self.atmosphere = clamp_unit(value);
    }

    pub fn set_distance(&mut self, value: f64) {
        self.distance = clamp_unit(value);
    }

    pub fn set_realism(&mut self, value: f64) {
        self.realism = clamp_unit(value);
    }

    pub fn set_dynamic(&mut self, value: f64) {
        self.dynamic = clamp_unit(value);
    }

    /// Replace the character descriptions. At most 5 slots, of which at
    /// least 2 must be described; blank slots are unfilled.
    pub fn set_characters(&mut self, characters: Vec<String>) -> SharedResult<()> {
        check_characters(&characters)?;
        self.characters = characters;
        Ok(())
    }

    /// Check everything the setters cannot enforce on their own, i.e.
    /// values that arrived through deserialization
    pub fn validate(&self) -> SharedResult<()> {
        check_characters(&self.characters)?;
        for (field, value) in [
            ("atmosphere", self.atmosphere),
            ("distance", self.distance),
            ("realism", self.realism),
            ("dynamic", self.dynamic),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(SharedError::invalid_config(field, value));
            }
        }
        Ok(())
    }
}

fn check_characters(characters: &[String]) -> SharedResult<()> {
    if characters.len() > MAX_CHARACTERS {
        return Err(SharedError::invalid_config("characters", format!("{} entries", characters.len())));
    }
    let described = characters.iter().filter(|c| !c.trim().is_empty()).count();
    if described < MIN_CHARACTERS {
        return Err(SharedError::invalid_config("characters", format!("{described} described")));
    }
    Ok(())
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum AudioFormat {
    #[default]
    Aac,
    Mp3,
    Wav,
    M4a,
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ChannelLayout {
    Mono,
    #[default]
    Stereo,
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum VideoFormat {
    #[default]
    Mp4,
    Avi,
    Mkv,
    Mov,
    Webm,
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Resolution {
    #[serde(rename = "720p")]
    Hd720,
    #[default]
    #[serde(rename = "1080p")]
    Hd1080,
}

/// Output encoding parameters
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct AudioVideoConfig {
    pub audio_format: AudioFormat,
    pub sample_rate: u32,
    pub channels: ChannelLayout,
    /// kbps
    pub audio_bitrate: u32,
    pub video_format: VideoFormat,
    pub resolution: Resolution,
    pub frame_rate: u32,
    /// kbps
    pub video_bitrate: u32,
}

impl AudioVideoConfig {
    pub const SAMPLE_RATES: [u32; 4] = [16_000, 32_000, 44_100, 48_000];
    pub const FRAME_RATES: [u32; 2] = [25, 30];

    pub fn validate(&self) -> SharedResult<()> {
        if !Self::SAMPLE_RATES.contains(&self.sample_rate) {
            return Err(SharedError::invalid_config("sample_rate", self.sample_rate));
        }
        if !Self::FRAME_RATES.contains(&self.frame_rate) {
            return Err(SharedError::invalid_config("frame_rate", self.frame_rate));
        }
        if self.audio_bitrate == 0 {
            return Err(SharedError::invalid_config("audio_bitrate", 0));
        }
        if self.video_bitrate == 0 {
            return Err(SharedError::invalid_config("video_bitrate", 0));
        }
        Ok(())
    }
}

impl Default for AudioVideoConfig {
    fn default() -> Self {
        Self {
            audio_format: AudioFormat::Aac,
            sample_rate: 44_100,
            channels: ChannelLayout::Stereo,
            audio_bitrate: 128,
            video_format: VideoFormat::Mp4,
            resolution: Resolution::Hd1080,
            frame_rate: 30,
            video_bitrate: 5000,
        }
    }
}
