//! Typed instructions and the immutable per-actor action queue.
//!
//! An [`Instruction`] is one compiled block. An [`ActionQueue`] is the ordered
//! program an actor executes; it is built once by the
//! [`compiler`](crate::compiler) and never mutated afterwards. Replacing an
//! actor's program means installing a brand-new queue.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Instruction
// ---------------------------------------------------------------------------

/// Whether a timed text overlay is spoken or thought.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpeechKind {
    /// Rectangular speech bubble with a tail.
    Say,
    /// Rounded thought bubble.
    Think,
}

impl SpeechKind {
    /// Lowercase name used by the view layer.
    pub fn as_str(self) -> &'static str {
        match self {
            SpeechKind::Say => "say",
            SpeechKind::Think => "think",
        }
    }
}

/// A single compiled block.
///
/// Numeric payloads are always finite: the compiler coerces anything it cannot
/// parse to `0` (or to the 1 second default for durations).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Instruction {
    /// Linear displacement per tick, in canvas units.
    Move {
        /// Horizontal displacement.
        dx: f64,
        /// Vertical displacement.
        dy: f64,
    },
    /// Rotation per tick, in degrees.
    Rotate {
        /// Signed angle delta.
        d_angle: f64,
    },
    /// Show a speech bubble and pause the actor for `duration_seconds`.
    Say {
        /// Bubble text.
        text: String,
        /// How long the actor stays paused, always positive.
        duration_seconds: f64,
    },
    /// Show a thought bubble and pause the actor for `duration_seconds`.
    Think {
        /// Bubble text.
        text: String,
        /// How long the actor stays paused, always positive.
        duration_seconds: f64,
    },
    /// Jump back to the start of the queue, looping forever.
    RepeatMarker,
}

impl Instruction {
    /// The speech payload if this is a `Say` or `Think` instruction.
    pub fn speech(&self) -> Option<(SpeechKind, &str, f64)> {
        match self {
            Instruction::Say {
                text,
                duration_seconds,
            } => Some((SpeechKind::Say, text, *duration_seconds)),
            Instruction::Think {
                text,
                duration_seconds,
            } => Some((SpeechKind::Think, text, *duration_seconds)),
            _ => None,
        }
    }

    /// Whether executing this instruction rewinds the cursor.
    pub fn is_repeat(&self) -> bool {
        matches!(self, Instruction::RepeatMarker)
    }
}

impl fmt::Display for Instruction {
    /// Palette-style label, e.g. `Move by X: 3 steps, Y: 4 steps`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Instruction::Move { dx, dy } if *dy == 0.0 => write!(f, "Move X by {dx} steps"),
            Instruction::Move { dx, dy } if *dx == 0.0 => write!(f, "Move Y by {dy} steps"),
            Instruction::Move { dx, dy } => write!(f, "Move by X: {dx} steps, Y: {dy} steps"),
            Instruction::Rotate { d_angle } if *d_angle < 0.0 => {
                write!(f, "Rotate left by {} degrees", -d_angle)
            }
            Instruction::Rotate { d_angle } => write!(f, "Rotate by {d_angle} degrees"),
            Instruction::Say {
                text,
                duration_seconds,
            } => write!(f, "Say: \"{text}\" for {duration_seconds}s"),
            Instruction::Think {
                text,
                duration_seconds,
            } => write!(f, "Think: \"{text}\" for {duration_seconds}s"),
            Instruction::RepeatMarker => f.write_str("Repeat forever"),
        }
    }
}

// ---------------------------------------------------------------------------
// ActionQueue
// ---------------------------------------------------------------------------

/// An immutable, cheaply clonable instruction sequence.
///
/// Cloning shares the underlying buffer, so swapping two actors' programs
/// exchanges references rather than copying instructions.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActionQueue {
    instructions: Arc<[Instruction]>,
}

impl ActionQueue {
    /// Build a queue from already-compiled instructions.
    pub fn new(instructions: Vec<Instruction>) -> Self {
        Self {
            instructions: instructions.into(),
        }
    }

    /// Number of instructions.
    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    /// Whether the queue has no instructions.
    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    /// The instruction at `index`, if any.
    pub fn get(&self, index: usize) -> Option<&Instruction> {
        self.instructions.get(index)
    }

    /// Iterate instructions in execution order.
    pub fn iter(&self) -> std::slice::Iter<'_, Instruction> {
        self.instructions.iter()
    }

    /// Whether any instruction loops the program.
    pub fn repeats(&self) -> bool {
        self.instructions.iter().any(Instruction::is_repeat)
    }

    /// Whether two queues share the same buffer.
    pub fn ptr_eq(&self, other: &ActionQueue) -> bool {
        Arc::ptr_eq(&self.instructions, &other.instructions)
    }
}

impl From<Vec<Instruction>> for ActionQueue {
    fn from(instructions: Vec<Instruction>) -> Self {
        Self::new(instructions)
    }
}

impl<'a> IntoIterator for &'a ActionQueue {
    type Item = &'a Instruction;
    type IntoIter = std::slice::Iter<'a, Instruction>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
