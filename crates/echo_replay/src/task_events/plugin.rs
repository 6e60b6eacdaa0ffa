//! Registers task recordings for freshly built scenes, captures the live
//! actor's interactions and replays past turns.

use bevy::prelude::*;

use super::{
    DomainEvent, ExtinguisherActivationEvent, FireRecording, LeverPullEvent, LeverRecording,
    TaskEventRecording, WireAction, WireEvent, WiringRecording,
};
use crate::actor::ActiveTurn;
use crate::clock::SceneClock;
use crate::echo_sets::EchoSet;
use crate::replay_error::PlaybackReport;
use crate::scene::{
    ConnectorIndex, Extinguisher, FireSource, Lever, LeverIndex, WireIndex, WiringPanel,
};
use crate::session::{SessionRegistry, TaskId};

// ---------------------------------------------------------------------------
// Live interactions
// ---------------------------------------------------------------------------

/// Something the live actor did to a task object.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LiveAction {
    WirePickup {
        wire: WireIndex,
        connector: ConnectorIndex,
    },
    WireConnect {
        wire: WireIndex,
        connector: ConnectorIndex,
    },
    WireSwap {
        wire: WireIndex,
        connector: ConnectorIndex,
        target_wire: WireIndex,
        target_connector: ConnectorIndex,
    },
    PanelComplete,
    ExtinguisherToggled(bool),
    LeverPulled(LeverIndex),
}

impl LiveAction {
    /// Stamp the action with the scene clock.
    pub fn at(self, timestamp: f32) -> DomainEvent {
        let wire = |action| DomainEvent::Wire(WireEvent { timestamp, action });
        match self {
            LiveAction::WirePickup { wire: w, connector } => {
                wire(WireAction::Pickup { wire: w, connector })
            }
            LiveAction::WireConnect { wire: w, connector } => {
                wire(WireAction::Connect { wire: w, connector })
            }
            LiveAction::WireSwap {
                wire: w,
                connector,
                target_wire,
                target_connector,
            } => wire(WireAction::Swap {
                wire: w,
                connector,
                target_wire,
                target_connector,
            }),
            LiveAction::PanelComplete => wire(WireAction::Complete),
            LiveAction::ExtinguisherToggled(active) => {
                DomainEvent::ExtinguisherActivation(ExtinguisherActivationEvent { timestamp, active })
            }
            LiveAction::LeverPulled(lever) => {
                DomainEvent::LeverPull(LeverPullEvent { timestamp, lever })
            }
        }
    }
}

/// Sent by gameplay after it applied `action` to the objects of `task`.
#[derive(Event, Debug, Clone)]
pub struct LiveInteraction {
    pub task: TaskId,
    pub action: LiveAction,
}

impl LiveInteraction {
    pub fn new(task: impl Into<TaskId>, action: LiveAction) -> Self {
        Self {
            task: task.into(),
            action,
        }
    }
}

/// Anomalies from the most recent playback pass, plus running totals.
#[derive(Resource, Debug, Default)]
pub struct PlaybackDiagnostics {
    pub last: PlaybackReport,
    pub total_applied: usize,
    pub total_skipped: usize,
}

// ---------------------------------------------------------------------------
// Binding
// ---------------------------------------------------------------------------

pub fn bind_wiring_panels(
    panels: Query<(Entity, &WiringPanel), Added<WiringPanel>>,
    mut registry: ResMut<SessionRegistry>,
) {
    for (entity, panel) in &panels {
        registry.register(
            panel.task.clone(),
            WiringRecording::new(panel.owner, panel.task.clone()),
        );
        match registry.wiring_mut(panel.task.as_str()) {
            Some(recording) => recording.bind_panel(entity),
            None => warn!("Task '{}' is registered but is not a wiring task", panel.task),
        }
    }
}

pub fn bind_extinguishers(
    extinguishers: Query<(Entity, &Extinguisher), Added<Extinguisher>>,
    mut registry: ResMut<SessionRegistry>,
) {
    for (entity, extinguisher) in &extinguishers {
        registry.register(
            extinguisher.task.clone(),
            FireRecording::new(extinguisher.owner, extinguisher.task.clone()),
        );
        match registry.fire_mut(extinguisher.task.as_str()) {
            Some(recording) => recording.bind_extinguisher(entity),
            None => warn!(
                "Task '{}' is registered but is not a fire task",
                extinguisher.task
            ),
        }
    }
}

/// Baseline health for delta compression. Runs after the extinguisher has
/// registered the fire task.
pub fn bind_fires(
    fires: Query<&FireSource, Added<FireSource>>,
    mut registry: ResMut<SessionRegistry>,
) {
    for fire in &fires {
        if let Some(recording) = registry.fire_mut(fire.task.as_str()) {
            recording.seed_fire(fire.index, fire.health);
        }
    }
}

pub fn bind_levers(levers: Query<&Lever, Added<Lever>>, mut registry: ResMut<SessionRegistry>) {
    for lever in &levers {
        registry.register(
            lever.task.clone(),
            LeverRecording::new(lever.owner, lever.task.clone()),
        );
    }
}

// ---------------------------------------------------------------------------
// Capture
// ---------------------------------------------------------------------------

/// Log the live actor's interactions into the recordings it owns.
pub fn capture_live_interactions(
    mut events: EventReader<LiveInteraction>,
    clock: Res<SceneClock>,
    active: Res<ActiveTurn>,
    mut registry: ResMut<SessionRegistry>,
) {
    let now = clock.elapsed();
    for interaction in events.read() {
        match registry.recording_for_live(interaction.task.as_str(), active.0) {
            Some(recording) => {
                recording.record_event(interaction.action.at(now));
            }
            None => debug!(
                "Ignoring {:?} on '{}': not a task of {:?}",
                interaction.action, interaction.task, active.0
            ),
        }
    }
}

/// Snapshot fire health whenever a live-owned fire changed.
pub fn capture_fire_health(
    fires: Query<&FireSource, Changed<FireSource>>,
    clock: Res<SceneClock>,
    active: Res<ActiveTurn>,
    mut registry: ResMut<SessionRegistry>,
) {
    let now = clock.elapsed();
    for fire in &fires {
        let Some(recording) = registry
            .recording_for_live(fire.task.as_str(), active.0)
            .and_then(|r| r.as_fire_mut())
        else {
            continue;
        };
        recording.record_fire_state(now, fire.index, fire.health);
    }
}

// ---------------------------------------------------------------------------
// Playback
// ---------------------------------------------------------------------------

/// Replay every past actor's task events up to the scene clock.
pub fn play_task_events(world: &mut World) {
    let now = world.resource::<SceneClock>().elapsed();
    let active = world.resource::<ActiveTurn>().0;
    let report = world.resource_scope(|world, mut registry: Mut<SessionRegistry>| {
        registry.play_past_recordings(active, now, world)
    });
    if !report.is_clean() {
        debug!(
            "Task playback at {:.2}s: {} applied, {} skipped",
            now,
            report.applied,
            report.skipped.len()
        );
    }
    let mut diagnostics = world.resource_mut::<PlaybackDiagnostics>();
    diagnostics.total_applied += report.applied;
    diagnostics.total_skipped += report.skipped.len();
    diagnostics.last = report;
}

pub struct TaskEventsPlugin;

impl Plugin for TaskEventsPlugin {
    fn build(&self, app: &mut App) {
        app.add_event::<LiveInteraction>()
            .init_resource::<PlaybackDiagnostics>()
            .add_systems(
                Update,
                (
                    bind_wiring_panels,
                    bind_extinguishers,
                    bind_fires.after(bind_extinguishers),
                    bind_levers,
                )
                    .in_set(EchoSet::Bind),
            )
            .add_systems(
                Update,
                (capture_live_interactions, capture_fire_health).in_set(EchoSet::Capture),
            )
            .add_systems(Update, play_task_events.in_set(EchoSet::Playback));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn live_actions_map_to_domain_events() {
        let event = LiveAction::LeverPulled(LeverIndex(2)).at(4.0);
        assert_eq!(
            event,
            DomainEvent::LeverPull(LeverPullEvent {
                timestamp: 4.0,
                lever: LeverIndex(2)
            })
        );
        match LiveAction::PanelComplete.at(1.5) {
            DomainEvent::Wire(e) => {
                assert_eq!(e.action, WireAction::Complete);
                assert_eq!(e.timestamp, 1.5);
            }
            other => panic!("unexpected {other:?}"),
        }
    }
}
