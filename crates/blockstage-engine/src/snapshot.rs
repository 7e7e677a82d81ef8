//! Stage snapshot and restore with BLAKE3 hashing.
//!
//! A [`StageSnapshot`] is the full serializable state of a [`Stage`]: actors,
//! cursors, programs, the collision hold set, bubbles and their timers, the
//! placement RNG, the tick counter and the configuration. The BLAKE3 digest
//! over all of it doubles as a determinism fingerprint: two stages that
//! reached the same state hash the same.
//!
//! ```
//! use blockstage_engine::prelude::*;
//!
//! let mut stage = Stage::with_default_actors(StageConfig::default()).unwrap();
//! stage.set_program(ActorId(0), ["X_3", "REP"]);
//! stage.start();
//! stage.run_ticks(10);
//!
//! let snapshot = stage.capture_snapshot().unwrap();
//! assert_eq!(snapshot.hash.len(), 64);
//!
//! stage.run_ticks(10);
//! stage.restore_from_snapshot(&snapshot).unwrap();
//! assert_eq!(stage.tick_count(), 10);
//! assert!(!stage.is_running());
//! ```
//!
//! Restored stages are always stopped, with bubble timers frozen at the
//! restored time. Diagnostics are transient and not captured.

use anyhow::{anyhow, Context};
use blockstage_core::bubble::BubbleManager;
use blockstage_core::state::SimulationState;
use rand_pcg::Pcg64;
use serde::{Deserialize, Serialize};

use crate::config::StageConfig;
use crate::stage::Stage;

// ---------------------------------------------------------------------------
// StageSnapshot
// ---------------------------------------------------------------------------

/// Serializable stage state plus its BLAKE3 hex digest.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageSnapshot {
    /// Configuration in effect at capture.
    pub config: StageConfig,
    /// Actors, cursors, programs and the collision hold set.
    pub state: SimulationState,
    /// Live bubbles, timers and the pause set.
    pub bubbles: BubbleManager,
    /// Placement RNG, so later random placements continue the sequence.
    pub rng: Pcg64,
    /// Ticks executed at capture.
    pub tick_counter: u64,
    /// BLAKE3 hex digest (64 lowercase hex chars) of everything above.
    pub hash: String,
}

// ---------------------------------------------------------------------------
// Hashing
// ---------------------------------------------------------------------------

fn compute_hash(
    config: &StageConfig,
    state: &SimulationState,
    bubbles: &BubbleManager,
    rng: &Pcg64,
    tick_counter: u64,
) -> anyhow::Result<String> {
    #[derive(Serialize)]
    struct HashableState<'a> {
        config: &'a StageConfig,
        state: &'a SimulationState,
        bubbles: &'a BubbleManager,
        rng: &'a Pcg64,
        tick_counter: u64,
    }

    let bytes = serde_json::to_vec(&HashableState {
        config,
        state,
        bubbles,
        rng,
        tick_counter,
    })
    .context("failed to serialize stage state for hashing")?;

    Ok(blake3::hash(&bytes).to_hex().to_string())
}

// ---------------------------------------------------------------------------
// Stage snapshot/restore
// ---------------------------------------------------------------------------

impl Stage {
    /// Capture the complete stage state.
    pub fn capture_snapshot(&self) -> anyhow::Result<StageSnapshot> {
        let hash = compute_hash(
            self.config(),
            self.state(),
            self.bubbles(),
            self.rng(),
            self.tick_count(),
        )?;
        Ok(StageSnapshot {
            config: self.config().clone(),
            state: self.state().clone(),
            bubbles: self.bubbles().clone(),
            rng: self.rng().clone(),
            tick_counter: self.tick_count(),
            hash,
        })
    }

    /// Replace this stage's state with `snapshot`.
    ///
    /// The snapshot's configuration and hash are checked first; on failure
    /// the stage is left untouched.
    ///
    /// # Errors
    ///
    /// Fails if the configuration is invalid or the recorded hash does not
    /// match the snapshot contents.
    pub fn restore_from_snapshot(&mut self, snapshot: &StageSnapshot) -> anyhow::Result<()> {
        snapshot
            .config
            .validate()
            .context("snapshot carries an invalid configuration")?;

        let expected = compute_hash(
            &snapshot.config,
            &snapshot.state,
            &snapshot.bubbles,
            &snapshot.rng,
            snapshot.tick_counter,
        )?;
        if expected != snapshot.hash {
            return Err(anyhow!(
                "snapshot hash mismatch: recorded {} but recomputed {}",
                snapshot.hash,
                expected
            ));
        }

        self.restore_parts(
            snapshot.config.clone(),
            snapshot.state.clone(),
            snapshot.bubbles.clone(),
            snapshot.rng.clone(),
            snapshot.tick_counter,
        );
        Ok(())
    }

    /// BLAKE3 digest of the current state, same as `capture_snapshot()?.hash`.
    pub fn state_hash(&self) -> anyhow::Result<String> {
        compute_hash(
            self.config(),
            self.state(),
            self.bubbles(),
            self.rng(),
            self.tick_count(),
        )
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use blockstage_core::actor::ActorId;

    fn busy_stage() -> Stage {
        let mut stage = Stage::with_default_actors(StageConfig::default()).unwrap();
        stage.set_program(ActorId(0), ["X_7", "SAY_hi_0.5", "ROT_30", "REP"]);
        stage.set_program(ActorId(1), ["X_-9", "Y_4", "REP"]);
        stage.start();
        stage
    }

    #[test]
    fn same_history_same_hash() {
        let mut a = busy_stage();
        let mut b = busy_stage();
        a.run_ticks(90);
        b.run_ticks(90);
        assert_eq!(a.state_hash().unwrap(), b.state_hash().unwrap());
    }

    #[test]
    fn different_history_different_hash() {
        let mut a = busy_stage();
        let mut b = busy_stage();
        a.run_ticks(90);
        b.run_ticks(91);
        assert_ne!(a.state_hash().unwrap(), b.state_hash().unwrap());
    }

    #[test]
    fn restore_then_replay_matches_uninterrupted_run() {
        let mut straight = busy_stage();
        straight.run_ticks(120);

        let mut branched = busy_stage();
        branched.run_ticks(50);
        let fork = branched.capture_snapshot().unwrap();
        branched.run_ticks(33);
        branched.restore_from_snapshot(&fork).unwrap();
        branched.start();
        branched.run_ticks(70);

        assert_eq!(branched.state(), straight.state());
        assert_eq!(branched.tick_count(), 120);
        assert_eq!(
            branched.bubbles().paused(),
            straight.bubbles().paused()
        );
    }

    #[test]
    fn json_round_trip_restores() {
        let mut stage = Stage::new(StageConfig {
            seed: 11,
            ..Default::default()
        })
        .unwrap();
        for _ in 0..4 {
            let id = stage.add_actor();
            stage.set_program(id, ["XY_1.1_-0.7", "ROT_13.3", "REP"]);
        }
        stage.start();
        stage.run_ticks(37);

        let snapshot = stage.capture_snapshot().unwrap();
        let json = serde_json::to_string(&snapshot).unwrap();
        let parsed: StageSnapshot = serde_json::from_str(&json).unwrap();

        let mut fresh = Stage::new(StageConfig::default()).unwrap();
        fresh.restore_from_snapshot(&parsed).unwrap();
        assert_eq!(fresh.state(), stage.state());
        assert_eq!(fresh.tick_count(), 37);
    }

    #[test]
    fn tampered_snapshot_is_rejected() {
        let mut stage = busy_stage();
        stage.run_ticks(10);
        let mut snapshot = stage.capture_snapshot().unwrap();
        snapshot.tick_counter += 1;

        let mut target = Stage::new(StageConfig::default()).unwrap();
        let err = target.restore_from_snapshot(&snapshot).unwrap_err();
        assert!(err.to_string().contains("hash mismatch"));
        assert_eq!(target.tick_count(), 0);
    }

    #[test]
    fn invalid_config_is_rejected_before_hash() {
        let stage = busy_stage();
        let mut snapshot = stage.capture_snapshot().unwrap();
        snapshot.config.fixed_dt = f64::NAN;

        let mut target = Stage::new(StageConfig::default()).unwrap();
        assert!(target.restore_from_snapshot(&snapshot).is_err());
    }
}
