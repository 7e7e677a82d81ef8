//! The simulation state value object.
//!
//! [`SimulationState`] groups everything the scheduler reads and writes each
//! tick: the actor arena, the cursor store, the installed programs and the
//! one-tick collision hold. Actors, cursors and programs are parallel maps
//! keyed by the same [`ActorId`], so there is no aliasing between them.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::actor::{Actor, ActorId};
use crate::bubble::BubbleManager;
use crate::cursor::{CursorState, CursorStore};
use crate::geometry::StageBounds;
use crate::instruction::ActionQueue;
use crate::StageError;

// ---------------------------------------------------------------------------
// ProgramTable
// ---------------------------------------------------------------------------

/// Installed action queues keyed by actor id.
///
/// A program may exist for an id with no actor; the scheduler skips it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProgramTable {
    queues: BTreeMap<ActorId, ActionQueue>,
}

impl ProgramTable {
    /// The queue installed for `actor`.
    pub fn get(&self, actor: ActorId) -> Option<&ActionQueue> {
        self.queues.get(&actor)
    }

    /// Install `queue` for `actor`, returning the replaced queue.
    pub fn install(&mut self, actor: ActorId, queue: ActionQueue) -> Option<ActionQueue> {
        self.queues.insert(actor, queue)
    }

    /// Exchange the queues bound to `a` and `b`.
    pub fn swap(&mut self, a: ActorId, b: ActorId) {
        let first = self.queues.remove(&a);
        let second = self.queues.remove(&b);
        if let Some(queue) = second {
            self.queues.insert(a, queue);
        }
        if let Some(queue) = first {
            self.queues.insert(b, queue);
        }
    }

    /// Length of `actor`'s queue, 0 when none is installed.
    pub fn len_of(&self, actor: ActorId) -> usize {
        self.queues.get(&actor).map_or(0, ActionQueue::len)
    }

    /// Iterate in ascending actor id order.
    pub fn iter(&self) -> impl Iterator<Item = (ActorId, &ActionQueue)> {
        self.queues.iter().map(|(id, queue)| (*id, queue))
    }

    /// Whether no program is installed.
    pub fn is_empty(&self) -> bool {
        self.queues.is_empty()
    }

    /// Remove every program.
    pub fn clear(&mut self) {
        self.queues.clear();
    }
}

// ---------------------------------------------------------------------------
// SimulationState
// ---------------------------------------------------------------------------

/// Everything the scheduler needs between ticks, apart from bubbles.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationState {
    pub(crate) bounds: StageBounds,
    pub(crate) actors: BTreeMap<ActorId, Actor>,
    pub(crate) cursors: CursorStore,
    pub(crate) programs: ProgramTable,
    /// Actors sitting out the next tick after a collision.
    pub(crate) hold: BTreeSet<ActorId>,
    next_id: u32,
}

impl SimulationState {
    /// An empty stage with the given bounds.
    pub fn new(bounds: StageBounds) -> Self {
        Self {
            bounds,
            actors: BTreeMap::new(),
            cursors: CursorStore::new(),
            programs: ProgramTable::default(),
            hold: BTreeSet::new(),
            next_id: 0,
        }
    }

    /// Add an actor at `(x, y)`, clamped into bounds, and give it a default
    /// cursor. Returns the new id.
    ///
    /// If a program was installed for this id beforehand, the cursor covers it.
    pub fn add_actor(&mut self, x: f64, y: f64) -> ActorId {
        let id = ActorId(self.next_id);
        self.next_id += 1;
        let actor = Actor::new(id, self.bounds.clamp_x(x), self.bounds.clamp_y(y));
        self.actors.insert(id, actor);
        self.cursors
            .insert(id, CursorState::fresh(self.programs.len_of(id)));
        id
    }

    /// Replace `actor`'s program and reset its cursor to the start.
    ///
    /// Any live bubble of `actor` is cancelled with its timer, so the actor
    /// is unpaused and the new program starts at its first instruction.
    pub fn install_program(
        &mut self,
        bubbles: &mut BubbleManager,
        actor: ActorId,
        queue: ActionQueue,
    ) {
        if bubbles.cancel(actor) {
            debug!(%actor, "bubble cancelled by program change");
        }
        let length = queue.len();
        self.programs.install(actor, queue);
        self.cursors.insert(actor, CursorState::fresh(length));
        self.hold.remove(&actor);
        if !self.actors.contains_key(&actor) {
            debug!(%actor, "program installed for an actor that does not exist yet");
        }
    }

    /// Move an actor to `(x, y)`, clamped into bounds.
    pub fn place_actor(&mut self, actor: ActorId, x: f64, y: f64) -> Result<(), StageError> {
        let bounds = self.bounds;
        let record = self
            .actors
            .get_mut(&actor)
            .ok_or(StageError::UnknownActor { actor })?;
        record.x = bounds.clamp_x(x);
        record.y = bounds.clamp_y(y);
        Ok(())
    }

    /// The topmost actor whose box contains `(x, y)`.
    ///
    /// Later actors draw over earlier ones, so the highest id wins.
    pub fn actor_at(&self, x: f64, y: f64) -> Option<ActorId> {
        self.actors
            .values()
            .rev()
            .find(|actor| self.bounds.actor_box(actor.x, actor.y).contains(x, y))
            .map(|actor| actor.id)
    }

    /// Remove every actor, cursor and program and restart id allocation.
    pub fn reset(&mut self) {
        self.actors.clear();
        self.cursors.clear();
        self.programs.clear();
        self.hold.clear();
        self.next_id = 0;
    }

    // -- accessors ----------------------------------------------------------

    /// Canvas and actor dimensions.
    pub fn bounds(&self) -> StageBounds {
        self.bounds
    }

    /// The actor with `id`.
    pub fn actor(&self, id: ActorId) -> Option<&Actor> {
        self.actors.get(&id)
    }

    /// All actors in ascending id order.
    pub fn actors(&self) -> impl Iterator<Item = &Actor> {
        self.actors.values()
    }

    /// Number of actors.
    pub fn actor_count(&self) -> usize {
        self.actors.len()
    }

    /// `id`'s cursor.
    pub fn cursor(&self, id: ActorId) -> Option<&CursorState> {
        self.cursors.get(id)
    }

    /// The cursor store.
    pub fn cursors(&self) -> &CursorStore {
        &self.cursors
    }

    /// `id`'s installed program.
    pub fn program(&self, id: ActorId) -> Option<&ActionQueue> {
        self.programs.get(id)
    }

    /// The program table.
    pub fn programs(&self) -> &ProgramTable {
        &self.programs
    }

    /// Whether `id` sits out the next tick after a collision.
    pub fn is_held(&self, id: ActorId) -> bool {
        self.hold.contains(&id)
    }

    /// The id the next added actor will receive.
    pub fn next_id(&self) -> ActorId {
        ActorId(self.next_id)
    }

    /// Whether every actor has run out of instructions.
    pub fn all_idle(&self) -> bool {
        self.actors
            .keys()
            .all(|id| self.cursors.get(*id).map_or(true, CursorState::is_idle))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
