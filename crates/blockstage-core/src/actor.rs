//! Actor identifiers and the positioned, rotatable actor record.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Stable actor identifier.
///
/// Ids are handed out in increasing order and never reused until a full
/// reset. Ordering by id is the scheduler's deterministic iteration order.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActorId(pub u32);

impl ActorId {
    /// Raw numeric value.
    #[inline]
    pub fn to_raw(self) -> u32 {
        self.0
    }
}

impl fmt::Debug for ActorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ActorId({})", self.0)
    }
}

impl fmt::Display for ActorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An actor on the canvas. `(x, y)` is the top-left corner of its box.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Actor {
    /// Identifier.
    pub id: ActorId,
    /// Left edge.
    pub x: f64,
    /// Top edge.
    pub y: f64,
    /// Heading in degrees, always in `[0, 360)`.
    pub angle: f64,
}

impl Actor {
    /// A new actor at `(x, y)` with angle 0.
    pub fn new(id: ActorId, x: f64, y: f64) -> Self {
        Self {
            id,
            x,
            y,
            angle: 0.0,
        }
    }
}
