//! Headless scenarios.
//!
//! A [`Scenario`] is a JSON description of a run: an optional configuration,
//! the actors with their block programs, and how many ticks to execute.
//!
//! ```json
//! {
//!   "config": { "seed": 7 },
//!   "actors": [
//!     { "position": [100, 190], "program": ["X_5", "REP"] },
//!     { "program": ["SAY_hi_1", "ROT_90"] }
//!   ],
//!   "ticks": 120
//! }
//! ```
//!
//! Actors without a position are placed randomly from the seed. An empty
//! actor list spawns the two default actors with empty programs.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::config::{ConfigError, StageConfig};
use crate::stage::Stage;

/// One actor in a scenario.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ActorSpec {
    /// Top-left corner; random when absent.
    pub position: Option<[f64; 2]>,
    /// Block tokens, compiled on load.
    pub program: Vec<String>,
}

/// A complete headless run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Scenario {
    /// Stage configuration; defaults apply to missing fields.
    pub config: StageConfig,
    /// Actors in id order. Empty means the two default actors.
    pub actors: Vec<ActorSpec>,
    /// Ticks to run before the final snapshot.
    pub ticks: u64,
}

impl Scenario {
    /// Parse a scenario document. The embedded config is validated.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let scenario: Scenario = serde_json::from_str(json)?;
        scenario.config.validate()?;
        Ok(scenario)
    }

    /// Read and parse a scenario file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        Self::from_json_str(&content)
    }

    /// Build the stage with every actor placed and programmed, stopped.
    pub fn build(&self) -> Result<Stage, ConfigError> {
        let mut stage = Stage::new(self.config.clone())?;
        if self.actors.is_empty() {
            stage.spawn_default_actors();
            return Ok(stage);
        }
        for entry in &self.actors {
            let id = match entry.position {
                Some([x, y]) => stage.add_actor_at(x, y),
                None => stage.add_actor(),
            };
            stage.set_program(id, &entry.program);
        }
        Ok(stage)
    }

    /// Build the stage and run it for `ticks` ticks. The returned stage is
    /// stopped.
    pub fn run(&self) -> Result<Stage, ConfigError> {
        let mut stage = self.build()?;
        stage.start();
        stage.run_ticks(self.ticks);
        stage.stop();
        info!(
            ticks = stage.tick_count(),
            actors = stage.state().actor_count(),
            "scenario finished"
        );
        Ok(stage)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
