//! Per-actor scheduling state: queue position, bounce direction, queue length.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::actor::ActorId;

// ---------------------------------------------------------------------------
// Direction
// ---------------------------------------------------------------------------

/// The ±1 multiplier applied to movement and rotation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "i8", try_from = "i8")]
pub enum Direction {
    /// `+1`.
    #[default]
    Forward,
    /// `-1`.
    Backward,
}

impl Direction {
    /// The multiplier as a float.
    pub fn sign(self) -> f64 {
        match self {
            Direction::Forward => 1.0,
            Direction::Backward => -1.0,
        }
    }

    /// The opposite direction.
    pub fn flipped(self) -> Self {
        match self {
            Direction::Forward => Direction::Backward,
            Direction::Backward => Direction::Forward,
        }
    }
}

impl From<Direction> for i8 {
    fn from(direction: Direction) -> Self {
        match direction {
            Direction::Forward => 1,
            Direction::Backward => -1,
        }
    }
}

impl TryFrom<i8> for Direction {
    type Error = String;

    fn try_from(value: i8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Direction::Forward),
            -1 => Ok(Direction::Backward),
            other => Err(format!("direction must be 1 or -1, got {other}")),
        }
    }
}

// ---------------------------------------------------------------------------
// CursorState
// ---------------------------------------------------------------------------

/// Where an actor is in its queue.
///
/// `cursor == length` means the actor is idle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CursorState {
    /// Index of the next instruction to execute.
    pub cursor: usize,
    /// Bounce direction.
    pub direction: Direction,
    /// Length of the installed queue.
    pub length: usize,
}

impl CursorState {
    /// Cursor at the start of a queue of `length` instructions, moving forward.
    pub fn fresh(length: usize) -> Self {
        Self {
            cursor: 0,
            direction: Direction::Forward,
            length,
        }
    }

    /// Whether the actor has nothing left to execute.
    pub fn is_idle(&self) -> bool {
        self.cursor >= self.length
    }

    /// Move past the instruction just executed.
    ///
    /// A repeat marker sends the cursor back to the start; anything else
    /// increments it, saturating at `length`.
    pub fn advance(&mut self, executed_repeat: bool) {
        if executed_repeat {
            self.cursor = 0;
        } else {
            self.cursor = (self.cursor + 1).min(self.length);
        }
    }

    /// Restart at the beginning of a (possibly different) queue, keeping the
    /// current direction.
    pub fn rewind(&mut self, length: usize) {
        self.cursor = 0;
        self.length = length;
    }
}

impl Default for CursorState {
    fn default() -> Self {
        Self::fresh(0)
    }
}

// ---------------------------------------------------------------------------
// CursorStore
// ---------------------------------------------------------------------------

/// Cursor states keyed by actor id.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CursorStore {
    entries: BTreeMap<ActorId, CursorState>,
}

impl CursorStore {
    /// An empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// The cursor for `actor`.
    pub fn get(&self, actor: ActorId) -> Option<&CursorState> {
        self.entries.get(&actor)
    }

    /// Mutable cursor for `actor`.
    pub fn get_mut(&mut self, actor: ActorId) -> Option<&mut CursorState> {
        self.entries.get_mut(&actor)
    }

    /// Install or replace the cursor for `actor`.
    pub fn insert(&mut self, actor: ActorId, state: CursorState) {
        self.entries.insert(actor, state);
    }

    /// Number of tracked actors.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no actor is tracked.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate in ascending actor id order.
    pub fn iter(&self) -> impl Iterator<Item = (ActorId, &CursorState)> {
        self.entries.iter().map(|(id, state)| (*id, state))
    }

    /// Drop every entry.
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
