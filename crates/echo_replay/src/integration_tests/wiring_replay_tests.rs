//! Wiring panel capture during the engineer's turn and replay afterwards.

use crate::actor::ActorSlot;
use crate::scene::WireIndex;
use crate::task_events::TaskEventRecording;
use crate::test_harness::{TestScene, PANEL_TASK};

/// Play the engineer's panel and return the seating it ended with.
fn solve_panel(scene: &mut TestScene) -> Vec<Option<WireIndex>> {
    scene.tick(2);
    scene.swap_wires(0, 1);
    scene.tick(3);
    let wire = scene.seating()[3].unwrap();
    scene.pick_up_wire(wire.0, 3);
    scene.tick(2);
    scene.connect_wire(wire.0, 3);
    scene.tick(1);
    scene.swap_wires(2, 3);
    scene.tick(2);
    scene.complete_panel();
    scene.tick(2);
    scene.seating()
}

#[test]
fn live_panel_moves_are_recorded() {
    let mut scene = TestScene::new();
    let initial = scene.seating();
    let solved = solve_panel(&mut scene);

    assert_ne!(initial, solved);
    assert_eq!(scene.registry().get(PANEL_TASK).unwrap().event_count(), 5);
}

#[test]
fn next_turn_rebuilds_engineer_topology() {
    let mut scene = TestScene::new();
    let initial = scene.seating();
    let solved = solve_panel(&mut scene);
    scene.end_turn();

    // fresh scene, nothing replayed yet
    assert_eq!(scene.seating(), initial);
    assert!(!scene.panel_completed());

    scene.tick(30);
    assert_eq!(scene.seating(), solved);
    assert!(scene.panel_completed());
    assert_eq!(scene.diagnostics().total_skipped, 0);
}

#[test]
fn replay_is_idempotent_once_caught_up() {
    let mut scene = TestScene::new();
    let solved = solve_panel(&mut scene);
    scene.end_turn();
    scene.tick(30);

    let applied = scene.diagnostics().total_applied;
    scene.tick(10);
    assert_eq!(scene.seating(), solved);
    assert_eq!(scene.diagnostics().total_applied, applied);
    assert_eq!(scene.diagnostics().last.applied, 0);
}

#[test]
fn reload_replays_the_log_from_the_start() {
    let mut scene = TestScene::new();
    let initial = scene.seating();
    let solved = solve_panel(&mut scene);
    scene.end_turn();
    scene.tick(30);

    scene.reload();
    assert_eq!(scene.seating(), initial);
    scene.tick(30);
    assert_eq!(scene.seating(), solved);
}

#[test]
fn other_actors_do_not_record_into_the_panel() {
    let mut scene = TestScene::new();
    solve_panel(&mut scene);
    scene.end_turn();
    assert_eq!(scene.active(), ActorSlot::Firefighter);

    scene.tick(30);
    let wire = scene.seating()[0].unwrap();
    scene.pick_up_wire(wire.0, 0);
    scene.tick(2);

    assert_eq!(scene.registry().get(PANEL_TASK).unwrap().event_count(), 5);
}

#[test]
fn panel_log_dumps_as_json() {
    let mut scene = TestScene::new();
    solve_panel(&mut scene);
    let json = scene.registry().get(PANEL_TASK).unwrap().to_json();
    assert!(json.contains("Swap"));
    assert!(json.contains("Complete"));
}
