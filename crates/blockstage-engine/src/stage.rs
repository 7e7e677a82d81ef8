//! Fixed-timestep run loop around the scheduler.
//!
//! The [`Stage`] owns the [`SimulationState`], the [`BubbleManager`] and the
//! placement RNG, and exposes the lifecycle the host drives:
//!
//! - build the scene: [`add_actor`](Stage::add_actor),
//!   [`set_program`](Stage::set_program), [`place_actor`](Stage::place_actor),
//! - run it: [`start`](Stage::start), [`tick`](Stage::tick) once per frame,
//!   [`stop`](Stage::stop),
//! - [`reset`](Stage::reset) everything back to an empty stage.
//!
//! Simulation time is `tick_count * fixed_dt`, never accumulated, and only
//! advances while running. Given the same config, the same scene edits and
//! the same number of ticks, two stages end in identical states.
//!
//! # Example
//!
//! ```
//! use blockstage_engine::config::StageConfig;
//! use blockstage_engine::stage::Stage;
//!
//! let mut stage = Stage::new(StageConfig::default()).unwrap();
//! let cat = stage.add_actor_at(100.0, 100.0);
//! stage.set_program(cat, ["X_10", "REP"]);
//!
//! stage.start();
//! stage.run_ticks(4);
//! assert_eq!(stage.state().actor(cat).unwrap().x, 120.0);
//! ```

use std::time::{Duration, Instant};

use blockstage_core::actor::ActorId;
use blockstage_core::bubble::BubbleManager;
use blockstage_core::compiler::compile;
use blockstage_core::instruction::ActionQueue;
use blockstage_core::scheduler::{blocked_actors, Scheduler, TickReport};
use blockstage_core::state::SimulationState;
use blockstage_core::StageError;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg64;
use tracing::{debug, info};

use crate::config::{ConfigError, StageConfig};

// ---------------------------------------------------------------------------
// TickDiagnostics
// ---------------------------------------------------------------------------

/// Timing and activity for the last executed tick.
#[derive(Debug, Clone, Default)]
pub struct TickDiagnostics {
    /// Wall-clock time spent in the scheduler.
    pub step_time: Duration,
    /// Actors that executed a motion or repeat instruction.
    pub executed: usize,
    /// Actors skipped because of a speech pause or collision hold.
    pub blocked: usize,
    /// Collisions resolved.
    pub collisions: usize,
    /// Wall bounces.
    pub bounces: usize,
}

// ---------------------------------------------------------------------------
// Stage
// ---------------------------------------------------------------------------

/// The deterministic run loop.
pub struct Stage {
    config: StageConfig,
    scheduler: Scheduler,
    state: SimulationState,
    bubbles: BubbleManager,
    rng: Pcg64,
    tick_counter: u64,
    running: bool,
    last_diagnostics: TickDiagnostics,
}

impl Stage {
    /// Create an empty, stopped stage.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if the configuration fails validation.
    pub fn new(config: StageConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            scheduler: Scheduler::new(config.bubble_offset),
            state: SimulationState::new(config.bounds()),
            bubbles: BubbleManager::new(),
            rng: Pcg64::seed_from_u64(config.seed),
            tick_counter: 0,
            running: false,
            last_diagnostics: TickDiagnostics::default(),
            config,
        })
    }

    /// Create a stage populated with the two starting actors.
    pub fn with_default_actors(config: StageConfig) -> Result<Self, ConfigError> {
        let mut stage = Self::new(config)?;
        stage.spawn_default_actors();
        Ok(stage)
    }

    // -- scene editing ------------------------------------------------------

    /// Add the two starting actors, vertically centred at a quarter and three
    /// quarters of the canvas width.
    pub fn spawn_default_actors(&mut self) -> [ActorId; 2] {
        let bounds = self.config.bounds();
        let y = bounds.canvas.height / 2.0 - bounds.actor.height / 2.0;
        let half_width = bounds.actor.width / 2.0;
        [
            self.add_actor_at(bounds.canvas.width * 0.25 - half_width, y),
            self.add_actor_at(bounds.canvas.width * 0.75 - half_width, y),
        ]
    }

    /// Add an actor at a random position inside the canvas.
    pub fn add_actor(&mut self) -> ActorId {
        let bounds = self.state.bounds();
        let x = self.rng.gen_range(0.0..=bounds.max_x());
        let y = self.rng.gen_range(0.0..=bounds.max_y());
        self.add_actor_at(x, y)
    }

    /// Add an actor at `(x, y)`, clamped into the canvas.
    pub fn add_actor_at(&mut self, x: f64, y: f64) -> ActorId {
        let id = self.state.add_actor(x, y);
        info!(actor = %id, x, y, "actor added");
        id
    }

    /// Compile `tokens` and install them as `actor`'s program.
    ///
    /// The previous program is discarded, the cursor restarts at 0 moving
    /// forward, and any live bubble of that actor is cancelled. Returns the
    /// compiled program length.
    pub fn set_program<I, S>(&mut self, actor: ActorId, tokens: I) -> usize
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.install_program(actor, compile(tokens))
    }

    /// Install an already-compiled program. See [`set_program`](Self::set_program).
    pub fn install_program(&mut self, actor: ActorId, queue: ActionQueue) -> usize {
        let length = queue.len();
        self.state.install_program(&mut self.bubbles, actor, queue);
        debug!(%actor, length, "program installed");
        length
    }

    /// Move an actor by hand, clamped into the canvas.
    ///
    /// # Errors
    ///
    /// [`StageError::Running`] while the run is active,
    /// [`StageError::UnknownActor`] if `actor` does not exist.
    pub fn place_actor(&mut self, actor: ActorId, x: f64, y: f64) -> Result<(), StageError> {
        if self.running {
            return Err(StageError::Running {
                operation: "place an actor",
            });
        }
        self.state.place_actor(actor, x, y)
    }

    /// The topmost actor under `(x, y)`.
    pub fn actor_at(&self, x: f64, y: f64) -> Option<ActorId> {
        self.state.actor_at(x, y)
    }

    // -- run control --------------------------------------------------------

    /// Begin generating ticks. Suspended bubble timers are re-armed.
    pub fn start(&mut self) {
        if self.running {
            return;
        }
        self.running = true;
        self.bubbles.resume(self.sim_time());
        info!(tick = self.tick_counter, "run started");
    }

    /// Stop generating ticks.
    ///
    /// Pending bubble timers are suspended; actors, cursors and bubbles stay
    /// exactly as the last completed tick left them.
    pub fn stop(&mut self) {
        if !self.running {
            return;
        }
        self.running = false;
        self.bubbles.suspend(self.sim_time());
        info!(tick = self.tick_counter, "run stopped");
    }

    /// Whether ticks are being generated.
    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Execute one tick if running. A stopped stage returns an empty report
    /// and does not advance time.
    pub fn tick(&mut self) -> TickReport {
        if !self.running {
            return TickReport::default();
        }
        let start = Instant::now();
        let now = self.sim_time();
        let blocked = blocked_actors(&self.state, &self.bubbles).len();
        let report = self.scheduler.step(&mut self.state, &mut self.bubbles, now);
        self.tick_counter += 1;

        self.last_diagnostics = TickDiagnostics {
            step_time: start.elapsed(),
            executed: report.executed.len(),
            blocked,
            collisions: report.collisions.len(),
            bounces: report.bounces.len(),
        };
        report
    }

    /// Run up to `count` ticks. Returns how many were executed (0 if stopped).
    pub fn run_ticks(&mut self, count: u64) -> u64 {
        if !self.running {
            return 0;
        }
        for _ in 0..count {
            self.tick();
        }
        count
    }

    /// Stop and clear every store: actors, programs, cursors, bubbles. Ids,
    /// the tick counter and the placement RNG start over.
    pub fn reset(&mut self) {
        self.running = false;
        self.state.reset();
        self.bubbles.clear_all();
        self.rng = Pcg64::seed_from_u64(self.config.seed);
        self.tick_counter = 0;
        self.last_diagnostics = TickDiagnostics::default();
        info!("stage reset");
    }

    // -- accessors ----------------------------------------------------------

    /// Read-only view of the simulation state.
    pub fn state(&self) -> &SimulationState {
        &self.state
    }

    /// Read-only view of bubbles and the pause set.
    pub fn bubbles(&self) -> &BubbleManager {
        &self.bubbles
    }

    /// The configuration this stage was built with.
    pub fn config(&self) -> &StageConfig {
        &self.config
    }

    /// Number of ticks executed.
    pub fn tick_count(&self) -> u64 {
        self.tick_counter
    }

    /// Seconds per tick.
    pub fn fixed_dt(&self) -> f64 {
        self.config.fixed_dt
    }

    /// Simulation time in seconds, computed as `tick_count * fixed_dt`.
    pub fn sim_time(&self) -> f64 {
        self.tick_counter as f64 * self.config.fixed_dt
    }

    /// Diagnostics from the last executed tick.
    pub fn last_diagnostics(&self) -> &TickDiagnostics {
        &self.last_diagnostics
    }

    // -- snapshot support ---------------------------------------------------

    pub(crate) fn rng(&self) -> &Pcg64 {
        &self.rng
    }

    pub(crate) fn restore_parts(
        &mut self,
        config: StageConfig,
        state: SimulationState,
        bubbles: BubbleManager,
        rng: Pcg64,
        tick_counter: u64,
    ) {
        self.scheduler = Scheduler::new(config.bubble_offset);
        self.config = config;
        self.state = state;
        self.bubbles = bubbles;
        self.rng = rng;
        self.tick_counter = tick_counter;
        self.running = false;
        // Restored stages start stopped; freeze timers at the restored time.
        self.bubbles.suspend(self.sim_time());
        self.last_diagnostics = TickDiagnostics::default();
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use blockstage_core::cursor::CursorState;

    fn stage() -> Stage {
        Stage::new(StageConfig::default()).unwrap()
    }

    // -- 1. Construction ----------------------------------------------------

    #[test]
    fn new_stage_is_empty_and_stopped() {
        let stage = stage();
        assert_eq!(stage.tick_count(), 0);
        assert_eq!(stage.sim_time(), 0.0);
        assert!(!stage.is_running());
        assert_eq!(stage.state().actor_count(), 0);
    }

    #[test]
    fn invalid_config_is_rejected() {
        let config = StageConfig {
            fixed_dt: -1.0,
            ..Default::default()
        };
        assert!(Stage::new(config).is_err());
    }

    #[test]
    fn default_actors_are_centred_at_quarters() {
        let stage = Stage::with_default_actors(StageConfig::default()).unwrap();
        let positions: Vec<(f64, f64)> = stage.state().actors().map(|a| (a.x, a.y)).collect();
        assert_eq!(positions, vec![(72.5, 190.0), (312.5, 190.0)]);
    }

    // -- 2. Placement -------------------------------------------------------

    #[test]
    fn random_placement_is_in_bounds_and_seeded() {
        let mut a = stage();
        let mut b = stage();
        for _ in 0..50 {
            let id_a = a.add_actor();
            let id_b = b.add_actor();
            let actor = a.state().actor(id_a).unwrap();
            assert!((0.0..=385.0).contains(&actor.x));
            assert!((0.0..=380.0).contains(&actor.y));
            assert_eq!(actor, b.state().actor(id_b).unwrap());
        }
    }

    #[test]
    fn place_actor_rejected_while_running() {
        let mut stage = stage();
        let id = stage.add_actor_at(0.0, 0.0);
        stage.start();
        assert!(matches!(
            stage.place_actor(id, 10.0, 10.0),
            Err(StageError::Running { .. })
        ));
        stage.stop();
        stage.place_actor(id, 1000.0, 10.0).unwrap();
        assert_eq!(stage.state().actor(id).unwrap().x, 385.0);
    }

    // -- 3. Run control -----------------------------------------------------

    #[test]
    fn stopped_stage_does_not_tick() {
        let mut stage = stage();
        let id = stage.add_actor_at(100.0, 100.0);
        stage.set_program(id, ["X_5"]);

        assert!(stage.tick().is_quiet());
        assert_eq!(stage.run_ticks(10), 0);
        assert_eq!(stage.tick_count(), 0);
        assert_eq!(stage.state().actor(id).unwrap().x, 100.0);
    }

    #[test]
    fn sim_time_computed_not_accumulated() {
        let mut stage = Stage::new(StageConfig {
            fixed_dt: 0.1,
            ..Default::default()
        })
        .unwrap();
        stage.start();
        stage.run_ticks(1000);
        assert_eq!(stage.sim_time(), 1000.0 * 0.1);
    }

    #[test]
    fn stop_preserves_speech_pause_across_restart() {
        let mut stage = stage();
        let id = stage.add_actor_at(100.0, 100.0);
        stage.set_program(id, ["SAY_hi_1", "X_5"]);

        stage.start();
        stage.run_ticks(30);
        stage.stop();
        let frozen = stage.bubbles().clone();
        assert!(frozen.is_paused(id));

        stage.start();
        stage.run_ticks(30);
        assert!(stage.bubbles().is_paused(id), "timer must not fire early");
        stage.run_ticks(2);
        assert!(!stage.bubbles().is_paused(id));
        assert_eq!(stage.state().actor(id).unwrap().x, 105.0);
    }

    #[test]
    fn program_change_cancels_bubble() {
        let mut stage = stage();
        let id = stage.add_actor_at(100.0, 100.0);
        stage.set_program(id, ["THINK_hmm_10"]);
        stage.start();
        stage.tick();
        assert!(stage.bubbles().is_paused(id));

        let length = stage.set_program(id, ["Y_1", "BOGUS"]);
        assert_eq!(length, 1);
        assert!(!stage.bubbles().is_paused(id));
        assert_eq!(stage.state().cursor(id), Some(&CursorState::fresh(1)));
    }

    #[test]
    fn diagnostics_track_last_tick() {
        let mut stage = stage();
        let id = stage.add_actor_at(0.0, 100.0);
        stage.set_program(id, ["X_-5"]);
        stage.start();
        stage.tick();

        let diag = stage.last_diagnostics();
        assert_eq!(diag.executed, 1);
        assert_eq!(diag.bounces, 1);
        assert_eq!(diag.collisions, 0);
    }

    // -- 4. Reset -----------------------------------------------------------

    #[test]
    fn reset_clears_everything() {
        let mut stage = Stage::with_default_actors(StageConfig::default()).unwrap();
        stage.set_program(ActorId(0), ["SAY_bye_3"]);
        stage.start();
        stage.run_ticks(5);

        stage.reset();

        assert!(!stage.is_running());
        assert_eq!(stage.tick_count(), 0);
        assert_eq!(stage.state().actor_count(), 0);
        assert!(stage.state().programs().is_empty());
        assert!(stage.state().cursors().is_empty());
        assert!(stage.bubbles().is_empty());
        assert_eq!(stage.add_actor_at(0.0, 0.0), ActorId(0));
    }
}
