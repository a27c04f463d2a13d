//! Storyboard table
//!
//! Produced by the backend after a novel is submitted with storyboarding
//! enabled; the user may edit cells before saving it back. `rows` and
//! `columns` are descriptive only and never override `cells.len()`.

use serde::{Deserialize, Serialize};

use crate::errors::{SharedError, SharedResult};
use crate::types::clamp_unit;

/// One shot of the storyboard
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct StoryboardCell {
    pub shot_number: u32,
    /// Preview image reference
    pub scene_image: String,
    pub scene_description: String,
    pub dialogue: String,
    pub main_character: String,
    shooting_distance: f64,
    dynamic_intensity: f64,
    scene_atmosphere: f64,
}

impl StoryboardCell {
    pub fn new(shot_number: u32) -> Self {
        Self {
            shot_number,
            scene_image: String::new(),
            scene_description: String::new(),
            dialogue: String::new(),
            main_character: String::new(),
            shooting_distance: 0.5,
            dynamic_intensity: 0.5,
            scene_atmosphere: 0.5,
        }
    }

    pub fn shooting_distance(&self) -> f64 {
        self.shooting_distance
    }

    pub fn dynamic_intensity(&self) -> f64 {
        self.dynamic_intensity
    }

    pub fn scene_atmosphere(&self) -> f64 {
        self.scene_atmosphere
    }

    pub fn set_shooting_distance(&mut self, value: f64) {
        self.shooting_distance = clamp_unit(value);
    }

    pub fn set_dynamic_intensity(&mut self, value: f64) {
        self.dynamic_intensity = clamp_unit(value);
    }

    pub fn set_scene_atmosphere(&mut self, value: f64) {
        self.scene_atmosphere = clamp_unit(value);
    }

    // Step editing, e.g. the +/- 0.1 buttons of a storyboard editor.

    pub fn adjust_shooting_distance(&mut self, delta: f64) {
        self.set_shooting_distance(self.shooting_distance + delta);
    }

    pub fn adjust_dynamic_intensity(&mut self, delta: f64) {
        self.set_dynamic_intensity(self.dynamic_intensity + delta);
    }

    pub fn adjust_scene_atmosphere(&mut self, delta: f64) {
        self.set_scene_atmosphere(self.scene_atmosphere + delta);
    }
}

/// Ordered shot table
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct StoryboardTable {
    pub rows: u32,
    pub columns: u32,
    pub cells: Vec<StoryboardCell>,
}

impl StoryboardTable {
    pub fn new(cells: Vec<StoryboardCell>, columns: u32) -> Self {
        Self {
            rows: cells.len() as u32,
            columns,
            cells,
        }
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn cell(&self, index: usize) -> Option<&StoryboardCell> {
        self.cells.get(index)
    }

    /// Apply an edit to one cell, leaving every other cell untouched
    pub fn edit_cell<F>(&mut self, index: usize, edit: F) -> SharedResult<()>
    where
        F: FnOnce(&mut StoryboardCell),
    {
        let len = self.cells.len();
        let cell = self
            .cells
            .get_mut(index)
            .ok_or(SharedError::CellOutOfRange { index, len })?;
        edit(cell);
        Ok(())
    }
}
