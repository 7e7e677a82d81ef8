//! Blockstage engine -- fixed-timestep stage runner around the core scheduler.
//!
//! This crate builds on [`blockstage_core`] to provide the host-facing side:
//! a [`Stage`](stage::Stage) that owns the simulation, advances it one tick
//! per frame while running, places actors, compiles programs from block
//! tokens, and captures hashed snapshots for save/restore and determinism
//! checks.
//!
//! # Quick Start
//!
//! ```
//! use blockstage_engine::prelude::*;
//!
//! let mut stage = Stage::with_default_actors(StageConfig::default()).unwrap();
//! stage.set_program(ActorId(0), ["SAY_hello_0.5", "X_10"]);
//! stage.set_program(ActorId(1), ["ROT_15", "REP"]);
//!
//! stage.start();
//! stage.run_ticks(60);
//! assert_eq!(stage.tick_count(), 60);
//! assert_eq!(stage.state().actor(ActorId(0)).unwrap().x, 82.5);
//! ```

#![deny(unsafe_code)]

pub mod config;
pub mod scenario;
pub mod snapshot;
pub mod stage;

// ---------------------------------------------------------------------------
// Re-exports
// ---------------------------------------------------------------------------

/// Re-export the core crate for convenience.
pub use blockstage_core;

// ---------------------------------------------------------------------------
// Prelude
// ---------------------------------------------------------------------------

/// Convenience re-exports for common engine usage.
pub mod prelude {
    pub use blockstage_core::prelude::*;

    pub use crate::config::{ConfigError, StageConfig};
    pub use crate::scenario::{ActorSpec, Scenario};
    pub use crate::snapshot::StageSnapshot;
    pub use crate::stage::{Stage, TickDiagnostics};
}
