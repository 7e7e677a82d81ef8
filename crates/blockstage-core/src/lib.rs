//! Blockstage core -- block compiler and stepped motion scheduler.
//!
//! Actors on a bounded 2D canvas each run their own program of motion and
//! speech blocks. This crate turns block tokens into typed programs and
//! advances all actors together, one instruction per tick, with wall bounces,
//! pairwise collisions and timed speech pauses.
//!
//! The crate is pure: no I/O, no clocks. The caller owns a
//! [`SimulationState`](state::SimulationState) and a
//! [`BubbleManager`](bubble::BubbleManager) and hands them to
//! [`Scheduler::step`](scheduler::Scheduler::step) with the current time.
//!
//! # Quick Start
//!
//! ```
//! use blockstage_core::prelude::*;
//!
//! let bounds = StageBounds::new(Size::new(480.0, 480.0), Size::new(95.0, 100.0));
//! let mut state = SimulationState::new(bounds);
//! let mut bubbles = BubbleManager::new();
//! let scheduler = Scheduler::default();
//!
//! let cat = state.add_actor(100.0, 100.0);
//! state.install_program(&mut bubbles, cat, compile(["X_10", "ROT_15"]));
//!
//! scheduler.step(&mut state, &mut bubbles, 0.0);
//! assert_eq!(state.actor(cat).unwrap().x, 110.0);
//! ```

#![deny(unsafe_code)]

pub mod actor;
pub mod bubble;
pub mod compiler;
pub mod cursor;
pub mod geometry;
pub mod instruction;
pub mod scheduler;
pub mod state;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors from stage operations outside the tick path.
///
/// Ticking itself never fails; these only arise from explicit requests made
/// by the host.
#[derive(Debug, thiserror::Error)]
pub enum StageError {
    /// The referenced actor does not exist.
    #[error("actor {actor} does not exist")]
    UnknownActor {
        /// The missing id.
        actor: actor::ActorId,
    },

    /// The request is only allowed while the run is stopped.
    #[error("cannot {operation} while the stage is running")]
    Running {
        /// What was attempted.
        operation: &'static str,
    },
}

// ---------------------------------------------------------------------------
// Prelude
// ---------------------------------------------------------------------------

/// Convenience re-exports for common usage.
pub mod prelude {
    pub use crate::actor::{Actor, ActorId};
    pub use crate::bubble::{Bubble, BubbleEvent, BubbleManager};
    pub use crate::compiler::{compile, describe_token, parse_token};
    pub use crate::cursor::{CursorState, CursorStore, Direction};
    pub use crate::geometry::{Aabb, Point, Side, Size, StageBounds};
    pub use crate::instruction::{ActionQueue, Instruction, SpeechKind};
    pub use crate::scheduler::{
        BounceAxis, BounceEvent, CollisionEvent, Scheduler, TickReport, DEFAULT_BUBBLE_OFFSET,
    };
    pub use crate::state::{ProgramTable, SimulationState};
    pub use crate::StageError;
}
