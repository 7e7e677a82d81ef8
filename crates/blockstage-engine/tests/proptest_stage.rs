//! Property tests for stage determinism and snapshot branching.

use blockstage_engine::prelude::*;
use proptest::prelude::*;

fn token_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        (-40i32..40).prop_map(|n| format!("X_{n}")),
        (-40i32..40).prop_map(|n| format!("Y_{n}")),
        (-40i32..40, -40i32..40).prop_map(|(a, b)| format!("XY_{a}_{b}")),
        (-180i32..180).prop_map(|n| format!("ROT_{n}")),
        (1u32..20).prop_map(|n| format!("SAY_hey_{}", n as f64 / 10.0)),
        (1u32..20).prop_map(|n| format!("THINK_hmm_{}", n as f64 / 10.0)),
        Just("REP".to_owned()),
    ]
}

fn build(seed: u64, programs: &[Vec<String>]) -> Stage {
    let mut stage = Stage::new(StageConfig {
        seed,
        ..Default::default()
    })
    .unwrap();
    for tokens in programs {
        let id = stage.add_actor();
        stage.set_program(id, tokens);
    }
    stage.start();
    stage
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn same_seed_same_hash(
        seed in any::<u64>(),
        programs in prop::collection::vec(prop::collection::vec(token_strategy(), 0..6), 1..6),
        ticks in 0u64..200,
    ) {
        let mut a = build(seed, &programs);
        let mut b = build(seed, &programs);
        a.run_ticks(ticks);
        b.run_ticks(ticks);
        prop_assert_eq!(a.state_hash().unwrap(), b.state_hash().unwrap());
    }

    #[test]
    fn restored_branch_converges_with_straight_run(
        seed in any::<u64>(),
        programs in prop::collection::vec(prop::collection::vec(token_strategy(), 1..6), 1..5),
        split in 0u64..100,
        rest in 0u64..100,
    ) {
        let mut straight = build(seed, &programs);
        straight.run_ticks(split + rest);

        let mut branched = build(seed, &programs);
        branched.run_ticks(split);
        let fork = branched.capture_snapshot().unwrap();
        branched.run_ticks(17);
        branched.restore_from_snapshot(&fork).unwrap();
        branched.start();
        branched.run_ticks(rest);

        prop_assert_eq!(branched.state(), straight.state());
        prop_assert_eq!(branched.tick_count(), straight.tick_count());
    }

    #[test]
    fn json_snapshot_restores_exactly(
        seed in any::<u64>(),
        actors in 1usize..6,
        dx in -30.0f64..30.0,
        dy in -30.0f64..30.0,
        d_angle in -180.0f64..180.0,
        ticks in 0u64..80,
    ) {
        let program = vec![
            format!("XY_{dx}_{dy}"),
            format!("ROT_{d_angle}"),
            "REP".to_owned(),
        ];
        let mut stage = build(seed, &vec![program; actors]);
        stage.run_ticks(ticks);

        let snapshot = stage.capture_snapshot().unwrap();
        let json = serde_json::to_string(&snapshot).unwrap();
        let parsed: StageSnapshot = serde_json::from_str(&json).unwrap();
        prop_assert_eq!(&parsed.hash, &snapshot.hash);

        let mut restored = Stage::new(StageConfig::default()).unwrap();
        prop_assert!(restored.restore_from_snapshot(&parsed).is_ok());
        prop_assert_eq!(restored.state(), stage.state());
    }

    #[test]
    fn committed_poses_stay_in_bounds(
        seed in any::<u64>(),
        programs in prop::collection::vec(prop::collection::vec(token_strategy(), 1..6), 1..6),
        ticks in 1u64..300,
    ) {
        let mut stage = build(seed, &programs);
        let bounds = stage.state().bounds();
        for _ in 0..ticks {
            stage.tick();
            for actor in stage.state().actors() {
                prop_assert!((0.0..=bounds.max_x()).contains(&actor.x));
                prop_assert!((0.0..=bounds.max_y()).contains(&actor.y));
                prop_assert!((0.0..360.0).contains(&actor.angle));
            }
        }
    }
}
