//! The stepped motion scheduler.
//!
//! [`Scheduler::step`] advances every actor's program by one instruction.
//! Each tick:
//!
//! 1. Bubble timers that fired since the last tick un-pause their actors,
//!    whose cursors move past the speech instruction.
//! 2. Paused, held and idle actors are skipped.
//! 3. Every active actor fetches the instruction at its cursor. Speech shows
//!    a bubble and pauses the actor. Motion produces a tentative pose
//!    (`x + dx * dir`, `y + dy * dir`, `angle + d_angle * dir`).
//! 4. Tentative poses outside the canvas are clamped and flip the
//!    direction, at most once per tick, X before Y.
//! 5. All tentative poses are collected before anything is committed.
//! 6. Unordered pairs are tested in ascending id order. The first overlap an
//!    actor is part of reverts both poses, swaps the two programs, rewinds
//!    both cursors to 0 of the inherited program and holds the higher id out
//!    of the next tick.
//! 7. Poses and directions are committed.
//! 8. Every actor that executed a motion instruction advances its cursor,
//!    collided ones included (a repeat marker rewinds to 0 instead).
//!
//! Nothing here fails: missing actors, programs or cursors are skipped.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::actor::{Actor, ActorId};
use crate::bubble::{BubbleEvent, BubbleManager};
use crate::cursor::Direction;
use crate::geometry::{normalize_degrees, Point, Side, StageBounds};
use crate::instruction::Instruction;
use crate::state::SimulationState;

/// Default distance between an actor's top edge and its bubble anchor.
pub const DEFAULT_BUBBLE_OFFSET: f64 = 25.0;

// ---------------------------------------------------------------------------
// TickReport
// ---------------------------------------------------------------------------

/// Two actors whose tentative boxes overlapped in a tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollisionEvent {
    /// Lower id of the pair.
    pub first: ActorId,
    /// Higher id of the pair; sits out the next tick.
    pub second: ActorId,
    /// Side of `second` that `first` ran into.
    pub side: Side,
}

/// Which wall bounce flipped an actor's direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BounceAxis {
    /// Left or right wall.
    X,
    /// Top or bottom wall, with no X bounce in the same tick.
    Y,
}

/// A wall bounce.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BounceEvent {
    /// The bouncing actor.
    pub actor: ActorId,
    /// The axis whose wall flipped the direction.
    pub axis: BounceAxis,
}

/// What happened during one tick, for the view layer and diagnostics.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TickReport {
    /// Bubbles shown and hidden, hides first.
    pub bubble_events: Vec<BubbleEvent>,
    /// Resolved collisions in resolution order.
    pub collisions: Vec<CollisionEvent>,
    /// Wall bounces in ascending actor id order.
    pub bounces: Vec<BounceEvent>,
    /// Actors that executed a motion or repeat instruction.
    pub executed: Vec<ActorId>,
}

impl TickReport {
    /// Whether the tick changed nothing.
    pub fn is_quiet(&self) -> bool {
        self.bubble_events.is_empty()
            && self.collisions.is_empty()
            && self.bounces.is_empty()
            && self.executed.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Tentative
// ---------------------------------------------------------------------------

/// An uncommitted pose for one actor.
#[derive(Debug, Clone)]
struct Tentative {
    before: Actor,
    after: Actor,
    direction: Direction,
    bounce: Option<BounceAxis>,
    repeat: bool,
    collided: bool,
}

impl Tentative {
    fn propose(
        actor: &Actor,
        direction: Direction,
        instruction: &Instruction,
        bounds: &StageBounds,
    ) -> Self {
        let (dx, dy, d_angle) = match instruction {
            Instruction::Move { dx, dy } => (*dx, *dy, 0.0),
            Instruction::Rotate { d_angle } => (0.0, 0.0, *d_angle),
            _ => (0.0, 0.0, 0.0),
        };
        let sign = direction.sign();
        let mut after = actor.clone();
        after.x = actor.x + dx * sign;
        after.y = actor.y + dy * sign;
        after.angle = normalize_degrees(actor.angle + d_angle * sign);

        let mut direction = direction;
        let mut bounce = None;
        if bounds.outside_x(after.x) {
            after.x = bounds.clamp_x(after.x);
            direction = direction.flipped();
            bounce = Some(BounceAxis::X);
        }
        if bounds.outside_y(after.y) {
            after.y = bounds.clamp_y(after.y);
            if bounce.is_none() {
                direction = direction.flipped();
                bounce = Some(BounceAxis::Y);
            }
        }

        Self {
            before: actor.clone(),
            after,
            direction,
            bounce,
            repeat: instruction.is_repeat(),
            collided: false,
        }
    }

    fn revert(&mut self) {
        self.after = self.before.clone();
        self.collided = true;
    }
}

// ---------------------------------------------------------------------------
// Scheduler
// ---------------------------------------------------------------------------

/// Advances a [`SimulationState`] one tick at a time.
#[derive(Debug, Clone)]
pub struct Scheduler {
    bubble_offset: f64,
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new(DEFAULT_BUBBLE_OFFSET)
    }
}

impl Scheduler {
    /// A scheduler that anchors bubbles `bubble_offset` units above actors.
    pub fn new(bubble_offset: f64) -> Self {
        Self { bubble_offset }
    }

    /// Distance between an actor's top edge and its bubble anchor.
    pub fn bubble_offset(&self) -> f64 {
        self.bubble_offset
    }

    /// Run one tick at time `now` (seconds, monotonically non-decreasing).
    pub fn step(
        &self,
        state: &mut SimulationState,
        bubbles: &mut BubbleManager,
        now: f64,
    ) -> TickReport {
        let mut report = TickReport::default();

        // 1. Deferred advances from fired timers.
        for actor in bubbles.tick(now) {
            report.bubble_events.push(BubbleEvent::Hidden { actor });
            match state.cursors.get_mut(actor) {
                Some(cursor) => cursor.advance(false),
                None => debug!(%actor, "timer fired for an actor without a cursor"),
            }
        }

        // 2-4. Fetch, branch and bounce.
        let held = std::mem::take(&mut state.hold);
        let bounds = state.bounds;
        let mut pending: Vec<Tentative> = Vec::new();
        for (&id, actor) in &state.actors {
            if bubbles.is_paused(id) || held.contains(&id) {
                continue;
            }
            let Some(cursor) = state.cursors.get(id) else {
                continue;
            };
            if cursor.is_idle() {
                continue;
            }
            let Some(instruction) = state.programs.get(id).and_then(|q| q.get(cursor.cursor))
            else {
                debug!(actor = %id, cursor = cursor.cursor, "cursor points past program, skipping");
                continue;
            };

            if let Some((kind, text, duration)) = instruction.speech() {
                let anchor = self.anchor(actor, &bounds);
                report
                    .bubble_events
                    .push(bubbles.show(id, kind, text, duration, anchor, now));
                trace!(actor = %id, kind = kind.as_str(), "speech pause");
                continue;
            }

            pending.push(Tentative::propose(
                actor,
                cursor.direction,
                instruction,
                &bounds,
            ));
        }

        // 5-6. Pairwise collisions on the full tentative set. Swapped
        // programs start over before the advance below.
        let collisions = resolve_collisions(&mut pending, &bounds);
        for collision in &collisions {
            let (a, b) = (collision.first, collision.second);
            state.programs.swap(a, b);
            for id in [a, b] {
                let length = state.programs.len_of(id);
                if let Some(cursor) = state.cursors.get_mut(id) {
                    cursor.rewind(length);
                }
            }
            state.hold.insert(b);
            trace!(first = %a, second = %b, side = ?collision.side, "collision, programs swapped");
        }

        // 7-8. Commit poses and directions, then advance cursors.
        for tentative in &pending {
            let id = tentative.after.id;
            if let Some(actor) = state.actors.get_mut(&id) {
                *actor = tentative.after.clone();
            }
            if let Some(cursor) = state.cursors.get_mut(id) {
                cursor.direction = tentative.direction;
                cursor.advance(tentative.repeat);
            }
            if let Some(axis) = tentative.bounce {
                trace!(actor = %id, ?axis, "wall bounce");
                report.bounces.push(BounceEvent { actor: id, axis });
            }
            report.executed.push(id);
        }
        report.collisions = collisions;

        report
    }

    /// Bubble anchor: horizontally centred, `bubble_offset` above the top edge.
    fn anchor(&self, actor: &Actor, bounds: &StageBounds) -> Point {
        Point {
            x: actor.x + bounds.actor.width / 2.0,
            y: actor.y - self.bubble_offset,
        }
    }
}

/// Test every unordered pair once, in ascending id order.
///
/// An actor takes part in at most one collision per tick; the first pair
/// found wins. Returns the resolved pairs.
fn resolve_collisions(pending: &mut [Tentative], bounds: &StageBounds) -> Vec<CollisionEvent> {
    let mut collisions = Vec::new();
    for i in 0..pending.len() {
        if pending[i].collided {
            continue;
        }
        for j in (i + 1)..pending.len() {
            if pending[j].collided {
                continue;
            }
            let first = bounds.actor_box(pending[i].after.x, pending[i].after.y);
            let second = bounds.actor_box(pending[j].after.x, pending[j].after.y);
            let Some(side) = first.contact_side(&second) else {
                continue;
            };
            collisions.push(CollisionEvent {
                first: pending[i].after.id,
                second: pending[j].after.id,
                side,
            });
            pending[i].revert();
            pending[j].revert();
            break;
        }
    }
    collisions
}

/// The set of actors a tick would skip as paused or held.
pub fn blocked_actors(state: &SimulationState, bubbles: &BubbleManager) -> BTreeSet<ActorId> {
    bubbles
        .paused()
        .iter()
        .chain(state.hold.iter())
        .copied()
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
