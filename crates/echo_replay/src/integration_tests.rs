//! Integration tests for the replay engine using the `TestScene` harness.
//!
//! These spin up a headless Bevy App with `EchoReplayPlugin` and play whole
//! turns: live capture, hand-off, scene reload and replay.

mod restart_tests;
mod wiring_replay_tests;

use crate::actor::ActorSlot;
use crate::scene::{FireIndex, SceneIndex};
use crate::task_events::TaskEventRecording;
use crate::test_harness::{TestScene, DOOR_TASK, FIRE_HEALTHS, FIRE_TASK, LEVER_COUNT, PANEL_TASK};
use crate::SceneClock;

// ===========================================================================
// 1. Harness bootstrap
// ===========================================================================

#[test]
fn first_turn_belongs_to_engineer() {
    let mut scene = TestScene::new();
    assert_eq!(scene.active(), ActorSlot::Engineer);
    assert!(!scene.is_ghost(ActorSlot::Engineer));
    assert!(!scene.is_ghost(ActorSlot::Firefighter));
}

#[test]
fn scene_objects_are_indexed_on_load() {
    let scene = TestScene::new();
    let index = scene.resource::<SceneIndex>();
    assert_eq!(index.fire_count(), FIRE_HEALTHS.len());
    assert_eq!(index.lever_count(), LEVER_COUNT as usize);
}

#[test]
fn task_recordings_registered_per_owner() {
    let scene = TestScene::new();
    let registry = scene.registry();
    assert_eq!(registry.recording_count(), 3);
    assert_eq!(registry.get(PANEL_TASK).unwrap().owner(), ActorSlot::Engineer);
    assert_eq!(registry.get(FIRE_TASK).unwrap().owner(), ActorSlot::Firefighter);
    assert_eq!(registry.get(DOOR_TASK).unwrap().owner(), ActorSlot::Firefighter);
}

#[test]
fn scene_clock_restarts_on_reload() {
    let mut scene = TestScene::new();
    scene.tick(20);
    assert!(scene.clock() > 1.5);
    scene.reload();
    assert!(scene.resource::<SceneClock>().elapsed() < 0.15);
}

#[test]
fn same_seed_builds_same_layout() {
    let mut a = TestScene::new();
    let mut b = TestScene::new();
    assert_eq!(a.seating(), b.seating());
    a.reload();
    assert_eq!(a.seating(), b.seating());
}

#[test]
fn fires_start_at_construction_healths() {
    let mut scene = TestScene::new();
    let healths = scene.fire_healths();
    assert_eq!(
        healths,
        vec![
            (FireIndex(0), FIRE_HEALTHS[0]),
            (FireIndex(1), FIRE_HEALTHS[1]),
            (FireIndex(2), FIRE_HEALTHS[2]),
        ]
    );
}
