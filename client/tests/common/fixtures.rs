//! Test fixtures and data for session client tests

use shared::{AudioVideoConfig, ModelConfig, StoryboardCell, StoryboardTable};

/// Standard test data and fixtures
pub struct TestFixtures;

impl TestFixtures {
    /// Identities handed out by the fake backend, in order
    pub const FIRST_ID: &'static str = "abc123";
    pub const SECOND_ID: &'static str = "def456";

    pub const NOVEL: &'static str = "The ferryman waited at the river until the lanterns went out.";
    pub const VIDEO_BYTES: &'static [u8] = b"\x00\x00\x00\x18ftypmp42fake-video";

    /// Two-shot storyboard as the backend would generate it
    pub fn two_cell_storyboard() -> StoryboardTable {
        let mut first = StoryboardCell::new(1);
        first.scene_image = "/static/shots/1.png".to_string();
        first.scene_description = "A ferry at dusk".to_string();
        first.dialogue = "Is anyone there?".to_string();
        first.main_character = "Ferryman".to_string();
        first.set_shooting_distance(0.8);

        let mut second = StoryboardCell::new(2);
        second.scene_image = "/static/shots/2.png".to_string();
        second.scene_description = "Lanterns fading on the water".to_string();
        second.dialogue = "...".to_string();
        second.main_character = "Traveller".to_string();
        second.set_scene_atmosphere(0.2);

        StoryboardTable::new(vec![first, second], 4)
    }

    pub fn model_config() -> ModelConfig {
        let mut config = ModelConfig::default();
        config
            .set_characters(vec!["Ferryman, old and quiet".to_string(), "Traveller".to_string()])
            .unwrap();
        config
    }

    pub fn audio_video_config() -> AudioVideoConfig {
        AudioVideoConfig::default()
    }
}
