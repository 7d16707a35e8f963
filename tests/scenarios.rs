//! End-to-end rounds through the public API

use bubble_pop::consts::{POINTS_PER_HIT, SIM_DT};
use bubble_pop::sim::{
    ArenaEvent, BubbleArena, BubbleId, ConfigError, EndReason, ManualClock, PlacementQuality,
    RoundConfig, RoundController, RoundEvent, Rule, ScoreKind, Termination,
};

fn quiet(rule: Rule, value: i32, bubbles: u32) -> RoundConfig {
    RoundConfig {
        rule,
        value_min: value,
        value_max: value,
        max_bubbles: bubbles,
        initial_burst: bubbles,
        spawn_interval: 100.0,
        spawn_jitter: 0.0,
        spawn_interval_floor: 0.1,
        termination: Termination::Endless,
        progression: None,
        ..Default::default()
    }
}

fn ids(controller: &RoundController) -> Vec<BubbleId> {
    controller.arena().bubbles().iter().map(|b| b.id).collect()
}

#[test]
fn even_round_scores_hits_and_misses() {
    let mut hits = RoundController::new();
    hits.start(quiet(Rule::Even, 4, 2), 10).unwrap();
    for id in ids(&hits) {
        assert_eq!(hits.pop(id).unwrap().kind, ScoreKind::Hit);
    }
    assert_eq!(hits.scoreboard().score, 2 * POINTS_PER_HIT);

    let mut misses = RoundController::new();
    misses.start(quiet(Rule::Even, 7, 1), 10).unwrap();
    let id = ids(&misses)[0];
    let event = misses.pop(id).unwrap();
    assert_eq!(event.kind, ScoreKind::Miss);
    assert_eq!(event.value, 7);
    assert_eq!(misses.scoreboard().lives, 2);
    assert!(misses.pop(id).is_none());
}

#[test]
fn clear_spawns_never_share_columns() {
    let config = RoundConfig {
        max_bubbles: 8,
        initial_burst: 8,
        size_min: 40.0,
        size_max: 40.0,
        ..Default::default()
    };
    let mut arena = BubbleArena::new();
    arena.start_round(config, 77).unwrap();

    let spawned: Vec<(BubbleId, PlacementQuality)> = arena
        .drain_events()
        .iter()
        .filter_map(|e| match e {
            ArenaEvent::Spawned { bubble, quality } => Some((bubble.id, *quality)),
            _ => None,
        })
        .collect();
    assert_eq!(spawned.len(), 8);
    // Nothing to dodge on an empty grid
    assert_eq!(spawned[0].1, PlacementQuality::Clear);

    for (i, (id, quality)) in spawned.iter().enumerate() {
        if *quality != PlacementQuality::Clear {
            continue;
        }
        let span = arena.grid().reservation(*id).unwrap();
        for (earlier, _) in &spawned[..i] {
            let other = arena.grid().reservation(*earlier).unwrap();
            assert!(!span.overlaps(&other), "{} overlaps {}", id, earlier);
        }
    }
}

#[test]
fn timed_round_ends_once() {
    let config = RoundConfig {
        termination: Termination::Duration { secs: 2.0 },
        ..Default::default()
    };
    let mut controller = RoundController::new();
    controller.start(config, 3).unwrap();
    for _ in 0..200 {
        controller.step(SIM_DT);
    }

    let events = controller.drain_events();
    let ends: Vec<_> = events
        .iter()
        .filter(|e| matches!(e, RoundEvent::RoundEnd(_)))
        .collect();
    assert_eq!(ends.len(), 1);
    assert!(matches!(events.last(), Some(RoundEvent::RoundEnd(_))));
    assert_eq!(
        controller.outcome().map(|end| end.reason),
        Some(EndReason::TimeExpired)
    );
    assert!(!controller.is_running());
}

#[test]
fn stopped_round_is_silent() {
    let mut controller = RoundController::new();
    controller.start(RoundConfig::default(), 5).unwrap();
    controller.step(SIM_DT);
    controller.stop();
    controller.drain_events();

    let frozen = controller.frame();
    for _ in 0..120 {
        controller.step(SIM_DT);
    }
    for id in ids(&controller) {
        assert!(controller.pop(id).is_none());
    }
    assert!(controller.drain_events().is_empty());
    assert_eq!(controller.frame(), frozen);
    assert!(controller.outcome().is_none());
}

#[test]
fn rejected_config_reports_reason() {
    let mut controller = RoundController::new();
    let empty = RoundConfig {
        value_min: 10,
        value_max: 1,
        ..Default::default()
    };
    assert!(matches!(
        controller.start(empty, 1),
        Err(ConfigError::EmptyValueRange { min: 10, max: 1 })
    ));

    assert!(matches!(
        RoundConfig::from_json(r#"{ "max_bubbles": -3 }"#),
        Err(ConfigError::Parse(_))
    ));
}

#[test]
fn wall_clock_drives_same_round_as_manual_steps() {
    let clock = ManualClock::new();
    let mut clocked = RoundController::new();
    let mut stepped = RoundController::new();
    clocked.start(RoundConfig::default(), 99).unwrap();
    stepped.start(RoundConfig::default(), 99).unwrap();

    let mut steps = clocked.update(&clock);
    for _ in 0..30 {
        clock.advance(0.05);
        steps += clocked.update(&clock);
    }
    assert!(steps > 0);
    for _ in 0..steps {
        stepped.step(SIM_DT);
    }
    assert_eq!(clocked.frame(), stepped.frame());
    assert_eq!(clocked.drain_events(), stepped.drain_events());
}
