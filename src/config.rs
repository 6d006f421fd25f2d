//! Game configuration

use crate::game::{OutputFormat, OutputMode, VerbosityLevel};
use crate::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Settings fixed for the lifetime of a game
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    pub starting_life: i32,
    /// Cards the active player may keep at cleanup
    pub max_hand_size: usize,
    /// Seed for library shuffles
    pub seed: u64,
    pub verbosity: VerbosityLevel,
    pub output_mode: OutputMode,
    pub output_format: OutputFormat,
}

impl Default for GameConfig {
    fn default() -> Self {
        GameConfig {
            starting_life: 20,
            max_hand_size: 7,
            seed: 0,
            verbosity: VerbosityLevel::Normal,
            output_mode: OutputMode::Memory,
            output_format: OutputFormat::Text,
        }
    }
}

impl GameConfig {
    /// Parse a JSON config; missing fields take their defaults
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }
}
