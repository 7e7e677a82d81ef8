//! Stage configuration.
//!
//! [`StageConfig`] is plain serde data, loadable from JSON. Every field has a
//! default, so `{}` is a valid configuration describing a 480 x 480 canvas,
//! 95 x 100 actors and a 60 Hz tick.

use std::fs;
use std::path::Path;

use blockstage_core::geometry::{Size, StageBounds};
use blockstage_core::scheduler::DEFAULT_BUBBLE_OFFSET;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Configuration loading and validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("failed to read config file: {0}")]
    Read(#[from] std::io::Error),

    /// The JSON did not match the schema.
    #[error("failed to parse config JSON: {0}")]
    Parse(#[from] serde_json::Error),

    /// A value is out of range.
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Canvas, actor and timing parameters for a [`Stage`](crate::stage::Stage).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StageConfig {
    /// Canvas width.
    pub canvas_width: f64,
    /// Canvas height.
    pub canvas_height: f64,
    /// Width of every actor's box (taken from the sprite asset).
    pub actor_width: f64,
    /// Height of every actor's box.
    pub actor_height: f64,
    /// Seconds per tick. Must be positive and finite.
    pub fixed_dt: f64,
    /// Distance between an actor's top edge and its bubble anchor.
    pub bubble_offset: f64,
    /// Seed for random actor placement.
    pub seed: u64,
}

impl Default for StageConfig {
    fn default() -> Self {
        Self {
            canvas_width: 480.0,
            canvas_height: 480.0,
            actor_width: 95.0,
            actor_height: 100.0,
            fixed_dt: 1.0 / 60.0,
            bubble_offset: DEFAULT_BUBBLE_OFFSET,
            seed: 0,
        }
    }
}

impl StageConfig {
    /// Parse and validate a JSON document.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: StageConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a JSON file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        Self::from_json_str(&content)
    }

    /// Check every value is usable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let positive = |name: &str, value: f64| {
            if value.is_finite() && value > 0.0 {
                Ok(())
            } else {
                Err(ConfigError::Invalid(format!(
                    "{name} must be positive and finite, got {value}"
                )))
            }
        };
        positive("canvas_width", self.canvas_width)?;
        positive("canvas_height", self.canvas_height)?;
        positive("actor_width", self.actor_width)?;
        positive("actor_height", self.actor_height)?;
        positive("fixed_dt", self.fixed_dt)?;

        if self.actor_width > self.canvas_width || self.actor_height > self.canvas_height {
            return Err(ConfigError::Invalid(format!(
                "actor box {}x{} does not fit the {}x{} canvas",
                self.actor_width, self.actor_height, self.canvas_width, self.canvas_height
            )));
        }
        if !self.bubble_offset.is_finite() {
            return Err(ConfigError::Invalid(format!(
                "bubble_offset must be finite, got {}",
                self.bubble_offset
            )));
        }
        Ok(())
    }

    /// Canvas and actor sizes as scheduler bounds.
    pub fn bounds(&self) -> StageBounds {
        StageBounds::new(
            Size::new(self.canvas_width, self.canvas_height),
            Size::new(self.actor_width, self.actor_height),
        )
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
