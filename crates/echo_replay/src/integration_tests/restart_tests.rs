//! Restarting the current actor or the whole session.

use bevy::prelude::*;

use crate::actor::ActorSlot;
use crate::task_events::TaskEventRecording;
use crate::test_harness::{TestScene, DOOR_TASK, FIRE_TASK, PANEL_TASK};
use crate::RestartRequest;

fn engineer_then_firefighter(scene: &mut TestScene) {
    scene.walk_live(Vec3::X, 5);
    scene.swap_wires(0, 1);
    scene.tick(2);
    scene.end_turn();

    scene.walk_live(Vec3::Z, 3);
    scene.pull_lever(0);
    scene.spray_fire(2, 10.0);
    scene.tick(2);
}

#[test]
fn restart_current_actor_keeps_earlier_turns() {
    let mut scene = TestScene::new();
    engineer_then_firefighter(&mut scene);
    let seed = scene.registry().seed();

    scene.restart(RestartRequest::CurrentActor);

    assert_eq!(scene.active(), ActorSlot::Firefighter);
    let registry = scene.registry();
    assert!(registry.has_sequence(ActorSlot::Engineer));
    assert_eq!(registry.get(PANEL_TASK).unwrap().event_count(), 1);
    assert_eq!(registry.get(DOOR_TASK).unwrap().event_count(), 0);
    assert_eq!(registry.get(FIRE_TASK).unwrap().event_count(), 0);
    assert_eq!(registry.seed(), seed);
    assert!(scene.is_ghost(ActorSlot::Engineer));
}

#[test]
fn restarted_turn_replays_earlier_actor_again() {
    let mut scene = TestScene::new();
    let initial = scene.seating();
    engineer_then_firefighter(&mut scene);
    scene.tick(20);
    let swapped = scene.seating();
    assert_ne!(initial, swapped);

    scene.restart(RestartRequest::CurrentActor);
    assert_eq!(scene.seating(), initial);
    scene.tick(20);
    assert_eq!(scene.seating(), swapped);
    assert_eq!(scene.lever_pulls(), vec![0, 0]);
}

#[test]
fn restart_everything_returns_to_first_actor() {
    let mut scene = TestScene::new();
    engineer_then_firefighter(&mut scene);
    let seed = scene.registry().seed();

    scene.restart(RestartRequest::Everything);

    assert_eq!(scene.active(), ActorSlot::Engineer);
    let registry = scene.registry();
    assert!(!registry.has_sequence(ActorSlot::Engineer));
    assert_eq!(registry.recording_count(), 3);
    for (_, recording) in registry.recordings() {
        assert_eq!(recording.event_count(), 0);
    }
    assert_ne!(registry.seed(), seed);
    assert!(!scene.is_ghost(ActorSlot::Engineer));
}
