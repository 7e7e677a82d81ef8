//! Timed speech/thought bubbles and the pause set they drive.
//!
//! Showing a bubble pauses its actor until the bubble's expiry time. Expiry
//! is never applied from a timer callback: the scheduler calls
//! [`BubbleManager::tick`] at the start of each tick, receives the set of
//! actors whose timers fired, and advances their cursors itself. This keeps
//! every mutation on the scheduler's single serial path.
//!
//! Timers can be suspended while a run is stopped. Suspension freezes every
//! pending deadline; [`resume`](BubbleManager::resume) shifts them by the time
//! spent stopped, so a bubble shown for 2 seconds is visible for 2 seconds of
//! running time regardless of pauses in between.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::actor::ActorId;
use crate::compiler::DEFAULT_SPEECH_SECONDS;
use crate::geometry::Point;
use crate::instruction::SpeechKind;

// ---------------------------------------------------------------------------
// Bubble
// ---------------------------------------------------------------------------

/// A live overlay attached to one actor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bubble {
    /// Speech or thought.
    pub kind: SpeechKind,
    /// Text to display.
    pub text: String,
    /// Where the view should draw the bubble (centred above the actor).
    pub anchor: Point,
    /// Time at which the bubble disappears and the actor resumes.
    pub expires_at: f64,
}

/// Bubble changes for the view layer to render.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum BubbleEvent {
    /// A bubble was shown (or replaced an existing one).
    Shown {
        /// Owning actor.
        actor: ActorId,
        /// The new bubble.
        bubble: Bubble,
    },
    /// A bubble expired and was removed.
    Hidden {
        /// Owning actor.
        actor: ActorId,
    },
}

// ---------------------------------------------------------------------------
// BubbleManager
// ---------------------------------------------------------------------------

/// Owns all bubbles, their expiry timers, and the pause set.
///
/// This is the only writer of the pause set.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BubbleManager {
    bubbles: BTreeMap<ActorId, Bubble>,
    paused: BTreeSet<ActorId>,
    /// Time at which timers were suspended, if they are.
    suspended_at: Option<f64>,
}

impl BubbleManager {
    /// An empty manager.
    pub fn new() -> Self {
        Self::default()
    }

    /// Show a bubble for `actor`, replacing any existing bubble and timer.
    ///
    /// The actor joins the pause set until the timer fires. Non-positive or
    /// non-finite durations fall back to one second.
    pub fn show(
        &mut self,
        actor: ActorId,
        kind: SpeechKind,
        text: impl Into<String>,
        duration_seconds: f64,
        anchor: Point,
        now: f64,
    ) -> BubbleEvent {
        let duration = if duration_seconds.is_finite() && duration_seconds > 0.0 {
            duration_seconds
        } else {
            DEFAULT_SPEECH_SECONDS
        };
        // While suspended, deadlines are measured from the suspension instant.
        let start = self.suspended_at.unwrap_or(now);
        let bubble = Bubble {
            kind,
            text: text.into(),
            anchor,
            expires_at: start + duration,
        };
        if self.bubbles.insert(actor, bubble.clone()).is_some() {
            debug!(%actor, "replacing live bubble");
        }
        self.paused.insert(actor);
        BubbleEvent::Shown { actor, bubble }
    }

    /// Collect every actor whose timer has fired by `now`.
    ///
    /// Expired actors lose their bubble and leave the pause set. Each expiry
    /// is reported exactly once. Suspended timers never fire.
    pub fn tick(&mut self, now: f64) -> BTreeSet<ActorId> {
        if self.suspended_at.is_some() {
            return BTreeSet::new();
        }
        let expired: BTreeSet<ActorId> = self
            .bubbles
            .iter()
            .filter(|(_, bubble)| bubble.expires_at <= now)
            .map(|(actor, _)| *actor)
            .collect();
        for actor in &expired {
            self.bubbles.remove(actor);
            self.paused.remove(actor);
        }
        expired
    }

    /// Cancel `actor`'s bubble and timer without reporting an expiry.
    ///
    /// Returns whether a bubble was live.
    pub fn cancel(&mut self, actor: ActorId) -> bool {
        self.paused.remove(&actor);
        self.bubbles.remove(&actor).is_some()
    }

    /// Freeze all pending timers.
    pub fn suspend(&mut self, now: f64) {
        if self.suspended_at.is_none() {
            self.suspended_at = Some(now);
        }
    }

    /// Re-arm suspended timers, extending each deadline by the time spent
    /// suspended.
    pub fn resume(&mut self, now: f64) {
        if let Some(since) = self.suspended_at.take() {
            let shift = (now - since).max(0.0);
            for bubble in self.bubbles.values_mut() {
                bubble.expires_at += shift;
            }
        }
    }

    /// Whether timers are currently suspended.
    pub fn is_suspended(&self) -> bool {
        self.suspended_at.is_some()
    }

    /// Drop every bubble, timer and pause.
    pub fn clear_all(&mut self) {
        self.bubbles.clear();
        self.paused.clear();
        self.suspended_at = None;
    }

    /// Whether `actor` is waiting on a bubble timer.
    pub fn is_paused(&self, actor: ActorId) -> bool {
        self.paused.contains(&actor)
    }

    /// The pause set.
    pub fn paused(&self) -> &BTreeSet<ActorId> {
        &self.paused
    }

    /// `actor`'s live bubble.
    pub fn bubble(&self, actor: ActorId) -> Option<&Bubble> {
        self.bubbles.get(&actor)
    }

    /// Every live bubble in ascending actor id order.
    pub fn bubbles(&self) -> impl Iterator<Item = (ActorId, &Bubble)> {
        self.bubbles.iter().map(|(actor, bubble)| (*actor, bubble))
    }

    /// Number of live bubbles.
    pub fn len(&self) -> usize {
        self.bubbles.len()
    }

    /// Whether no bubble is live.
    pub fn is_empty(&self) -> bool {
        self.bubbles.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
