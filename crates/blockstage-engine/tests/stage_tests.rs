//! Stage-level tests: lifecycle, run control, default scene, snapshots and
//! headless scenarios.

use blockstage_engine::prelude::*;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn default_stage() -> Stage {
    Stage::with_default_actors(StageConfig::default()).unwrap()
}

fn run_until_collision(stage: &mut Stage, limit: u64) -> Option<TickReport> {
    for _ in 0..limit {
        let report = stage.tick();
        if !report.collisions.is_empty() {
            return Some(report);
        }
    }
    None
}

// -- 1. Default scene ---------------------------------------------------------

#[test]
fn default_actors_walk_into_each_other_and_swap() {
    let mut stage = default_stage();
    let (a, b) = (ActorId(0), ActorId(1));
    stage.set_program(a, ["X_20", "REP"]);
    stage.set_program(b, ["X_-20", "ROT_10", "REP"]);
    let program_a = stage.state().program(a).cloned().unwrap();
    let program_b = stage.state().program(b).cloned().unwrap();

    stage.start();
    let report = run_until_collision(&mut stage, 60).expect("actors should meet");

    assert_eq!(report.collisions.len(), 1);
    let collision = &report.collisions[0];
    assert_eq!((collision.first, collision.second), (a, b));
    assert!(stage.state().program(a).unwrap().ptr_eq(&program_b));
    assert!(stage.state().program(b).unwrap().ptr_eq(&program_a));
    assert!(stage.state().is_held(b));
    assert!(!stage.state().is_held(a));

    // Reverted poses never overlap.
    let bounds = stage.state().bounds();
    let box_a = {
        let actor = stage.state().actor(a).unwrap();
        bounds.actor_box(actor.x, actor.y)
    };
    let box_b = {
        let actor = stage.state().actor(b).unwrap();
        bounds.actor_box(actor.x, actor.y)
    };
    assert!(!box_a.overlaps(&box_b));
}

#[test]
fn held_actor_sits_out_exactly_one_tick() {
    let mut stage = default_stage();
    let (a, b) = (ActorId(0), ActorId(1));
    stage.set_program(a, ["X_20", "REP"]);
    stage.set_program(b, ["X_-20", "REP"]);
    stage.start();
    run_until_collision(&mut stage, 60).expect("actors should meet");

    let before = stage.state().actor(b).unwrap().clone();
    let report = stage.tick();
    assert!(!report.executed.contains(&b));
    assert_eq!(stage.state().actor(b).unwrap(), &before);
    assert!(!stage.state().is_held(b));
}

// -- 2. Run control -----------------------------------------------------------

#[test]
fn stop_and_start_lose_nothing() {
    let mut stage = default_stage();
    stage.set_program(ActorId(0), ["THINK_plan_2", "XY_5_5", "REP"]);
    stage.set_program(ActorId(1), ["ROT_7", "REP"]);

    stage.start();
    stage.run_ticks(45);
    stage.stop();
    let hash_at_stop = stage.state_hash().unwrap();

    // Ticks while stopped change nothing.
    stage.run_ticks(100);
    stage.tick();
    assert_eq!(stage.tick_count(), 45);
    assert_eq!(stage.state_hash().unwrap(), hash_at_stop);

    // Resuming matches a run that was never interrupted.
    stage.start();
    stage.run_ticks(200);

    let mut straight = default_stage();
    straight.set_program(ActorId(0), ["THINK_plan_2", "XY_5_5", "REP"]);
    straight.set_program(ActorId(1), ["ROT_7", "REP"]);
    straight.start();
    straight.run_ticks(245);

    assert_eq!(stage.state(), straight.state());
    assert_eq!(
        stage.bubbles().paused(),
        straight.bubbles().paused()
    );
}

#[test]
fn start_and_stop_are_idempotent() {
    let mut stage = default_stage();
    stage.start();
    stage.start();
    assert!(stage.is_running());
    stage.stop();
    stage.stop();
    assert!(!stage.is_running());
}

#[test]
fn editing_between_runs() {
    let mut stage = default_stage();
    stage.set_program(ActorId(0), ["Y_10"]);
    stage.start();
    stage.tick();
    stage.stop();

    stage.place_actor(ActorId(0), -50.0, 9_999.0).unwrap();
    let actor = stage.state().actor(ActorId(0)).unwrap();
    assert_eq!((actor.x, actor.y), (0.0, 380.0));
    assert_eq!(stage.actor_at(10.0, 400.0), Some(ActorId(0)));
    assert_eq!(stage.actor_at(479.0, 0.0), None);

    assert!(matches!(
        stage.place_actor(ActorId(9), 0.0, 0.0),
        Err(StageError::UnknownActor { actor }) if actor == ActorId(9)
    ));
}

#[test]
fn overlapping_actors_hit_test_topmost() {
    let mut stage = Stage::new(StageConfig::default()).unwrap();
    let low = stage.add_actor_at(100.0, 100.0);
    let high = stage.add_actor_at(150.0, 150.0);
    assert_eq!(stage.actor_at(160.0, 160.0), Some(high));
    assert_eq!(stage.actor_at(110.0, 110.0), Some(low));
}

// -- 3. Reset -----------------------------------------------------------------

#[test]
fn reset_then_rebuild_matches_fresh_stage() {
    let mut stage = default_stage();
    stage.set_program(ActorId(0), ["X_3", "REP"]);
    stage.add_actor();
    stage.start();
    stage.run_ticks(30);

    stage.reset();
    stage.spawn_default_actors();
    let random = stage.add_actor();

    let mut fresh = default_stage();
    let fresh_random = fresh.add_actor();

    assert_eq!(random, fresh_random);
    assert_eq!(stage.state_hash().unwrap(), fresh.state_hash().unwrap());
}

// -- 4. Snapshots -------------------------------------------------------------

#[test]
fn snapshot_preserves_rng_sequence() {
    let mut stage = Stage::new(StageConfig {
        seed: 42,
        ..Default::default()
    })
    .unwrap();
    stage.add_actor();
    let snapshot = stage.capture_snapshot().unwrap();

    let next = stage.add_actor();
    let expected = stage.state().actor(next).unwrap().clone();

    let mut restored = Stage::new(StageConfig::default()).unwrap();
    restored.restore_from_snapshot(&snapshot).unwrap();
    let replayed = restored.add_actor();
    assert_eq!(restored.state().actor(replayed).unwrap(), &expected);
    assert_eq!(restored.config().seed, 42);
}

#[test]
fn snapshot_mid_speech_resumes_timer() {
    let mut stage = Stage::new(StageConfig::default()).unwrap();
    let id = stage.add_actor_at(100.0, 100.0);
    stage.set_program(id, ["SAY_wait_1", "X_1"]);
    stage.start();
    stage.run_ticks(20);
    let snapshot = stage.capture_snapshot().unwrap();

    let mut restored = Stage::new(StageConfig::default()).unwrap();
    restored.restore_from_snapshot(&snapshot).unwrap();
    assert!(restored.bubbles().is_paused(id));
    assert!(restored.bubbles().bubble(id).is_some());

    restored.start();
    restored.run_ticks(39);
    assert_eq!(restored.state().actor(id).unwrap().x, 100.0);
    restored.run_ticks(3);
    assert_eq!(restored.state().actor(id).unwrap().x, 101.0);
}

// -- 5. Scenarios -------------------------------------------------------------

#[test]
fn scenario_file_round_trip() {
    let path = std::env::temp_dir().join(format!(
        "blockstage-scenario-{}.json",
        std::process::id()
    ));
    std::fs::write(
        &path,
        r#"{
            "config": { "seed": 3 },
            "actors": [
                { "program": [] },
                { "position": [300, 300], "program": ["X_4", "REP"] },
                { "position": [0, 0], "program": ["SAY_hi_there_0.25", "LEFT_5"] }
            ],
            "ticks": 30
        }"#,
    )
    .unwrap();

    let scenario = Scenario::from_file(&path).unwrap();
    std::fs::remove_file(&path).unwrap();

    let first = scenario.run().unwrap();
    let second = scenario.run().unwrap();
    assert_eq!(first.tick_count(), 30);
    assert_eq!(first.state_hash().unwrap(), second.state_hash().unwrap());

    // LEFT_5 at the left wall bounces instead of leaving the canvas.
    let talker = first.state().actor(ActorId(2)).unwrap();
    assert_eq!(talker.x, 0.0);
    assert_eq!(
        first.state().cursor(ActorId(2)).unwrap().direction,
        Direction::Backward
    );
}
