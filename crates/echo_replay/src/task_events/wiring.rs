//! Wiring puzzle recording.
//!
//! Every event names wires and connectors by stable index, so replaying the
//! whole ordered log rebuilds the final topology no matter how many
//! intermediate moves the live actor made.

use bevy::prelude::*;
use serde::Serialize;

use super::events::{DomainEvent, WireAction, WireEvent};
use super::log::EventLog;
use super::{dump_json, TaskEventRecording};
use crate::actor::ActorSlot;
use crate::replay_error::{PlaybackReport, ReplayAnomaly};
use crate::scene::{
    resolve, resolve_bound, Connector, ConnectorIndex, SceneIndex, SceneObject, Wire, WireIndex,
    WiringPanel,
};
use crate::session::TaskId;

#[derive(Debug, Clone, Serialize)]
pub struct WiringRecording {
    owner: ActorSlot,
    task: TaskId,
    log: EventLog<WireEvent>,
    #[serde(skip)]
    panel: Option<Entity>,
}

impl WiringRecording {
    pub fn new(owner: ActorSlot, task: impl Into<TaskId>) -> Self {
        Self {
            owner,
            task: task.into(),
            log: EventLog::default(),
            panel: None,
        }
    }

    /// Point the recording at the panel of the freshly loaded scene.
    pub fn bind_panel(&mut self, panel: Entity) {
        self.panel = Some(panel);
    }

    pub fn panel(&self) -> Option<Entity> {
        self.panel
    }

    pub fn events(&self) -> &[WireEvent] {
        self.log.events()
    }

    pub fn record_pickup(&mut self, time: f32, wire: WireIndex, connector: ConnectorIndex) {
        self.push(time, WireAction::Pickup { wire, connector });
    }

    pub fn record_connect(&mut self, time: f32, wire: WireIndex, connector: ConnectorIndex) {
        self.push(time, WireAction::Connect { wire, connector });
    }

    pub fn record_swap(
        &mut self,
        time: f32,
        wire: WireIndex,
        connector: ConnectorIndex,
        target_wire: WireIndex,
        target_connector: ConnectorIndex,
    ) {
        self.push(
            time,
            WireAction::Swap {
                wire,
                connector,
                target_wire,
                target_connector,
            },
        );
    }

    pub fn record_complete(&mut self, time: f32) {
        self.push(time, WireAction::Complete);
    }

    fn push(&mut self, timestamp: f32, action: WireAction) {
        if let Some(anomaly) = self.log.append(WireEvent { timestamp, action }) {
            warn!("Wiring '{}': {}", self.task, anomaly);
        }
        debug!("Wiring '{}': recorded {:?} at {:.2}s", self.task, action, timestamp);
    }

    fn apply(&self, world: &mut World, action: WireAction) -> Result<(), ReplayAnomaly> {
        match action {
            WireAction::Pickup { wire, connector } => {
                let connector_entity = resolve::<Connector>(world, &SceneObject::Connector(connector))?;
                let wire_entity = resolve::<Wire>(world, &SceneObject::Wire(wire))?;
                if let Some(mut c) = world.get_mut::<Connector>(connector_entity) {
                    if c.seated == Some(wire) {
                        c.release();
                    }
                }
                set_held(world, wire_entity, true);
            }
            WireAction::Connect { wire, connector } => {
                let connector_entity = resolve::<Connector>(world, &SceneObject::Connector(connector))?;
                let wire_entity = resolve::<Wire>(world, &SceneObject::Wire(wire))?;
                unseat_everywhere(world, wire);
                let displaced = world
                    .get_mut::<Connector>(connector_entity)
                    .and_then(|mut c| c.seat(wire));
                set_held(world, wire_entity, false);
                if let Some(displaced) = displaced {
                    debug!(
                        "Wiring '{}': connect displaced wire {} from connector {}",
                        self.task, displaced.0, connector.0
                    );
                    if let Ok(e) = resolve::<Wire>(world, &SceneObject::Wire(displaced)) {
                        set_held(world, e, true);
                    }
                }
            }
            WireAction::Swap {
                wire,
                connector,
                target_wire,
                target_connector,
            } => {
                // Resolve everything before touching anything so the swap is all-or-nothing.
                let a = resolve::<Connector>(world, &SceneObject::Connector(connector))?;
                let b = resolve::<Connector>(world, &SceneObject::Connector(target_connector))?;
                let wire_a = resolve::<Wire>(world, &SceneObject::Wire(wire))?;
                let wire_b = resolve::<Wire>(world, &SceneObject::Wire(target_wire))?;
                unseat_everywhere(world, wire);
                unseat_everywhere(world, target_wire);
                if let Some(mut c) = world.get_mut::<Connector>(a) {
                    c.seat(target_wire);
                }
                if let Some(mut c) = world.get_mut::<Connector>(b) {
                    c.seat(wire);
                }
                set_held(world, wire_a, false);
                set_held(world, wire_b, false);
            }
            WireAction::Complete => {
                let panel = resolve_bound::<WiringPanel>(
                    world,
                    self.panel,
                    SceneObject::Panel(self.task.clone()),
                )?;
                if let Some(mut p) = world.get_mut::<WiringPanel>(panel) {
                    p.mark_complete();
                }
            }
        }
        Ok(())
    }
}

fn set_held(world: &mut World, entity: Entity, held: bool) {
    if let Some(mut w) = world.get_mut::<Wire>(entity) {
        w.held = held;
    }
}

/// Release `wire` from whichever connectors currently seat it.
fn unseat_everywhere(world: &mut World, wire: WireIndex) {
    let connectors: Vec<Entity> = world
        .get_resource::<SceneIndex>()
        .map(|index| index.connectors().map(|(_, e)| e).collect())
        .unwrap_or_default();
    for entity in connectors {
        if let Some(mut c) = world.get_mut::<Connector>(entity) {
            if c.seated == Some(wire) {
                c.release();
            }
        }
    }
}

impl TaskEventRecording for WiringRecording {
    fn owner(&self) -> ActorSlot {
        self.owner
    }

    fn clear(&mut self) {
        self.log.clear();
        info!("Cleared wiring events for {:?} ('{}')", self.owner, self.task);
    }

    fn rewind(&mut self) {
        self.log.rewind();
        self.panel = None;
    }

    fn record_event(&mut self, event: DomainEvent) -> bool {
        match event {
            DomainEvent::Wire(e) => {
                self.push(e.timestamp, e.action);
                true
            }
            other => {
                warn!(
                    "Wiring '{}': {}",
                    self.task,
                    ReplayAnomaly::ForeignEvent {
                        recording: "wiring",
                        event: other.family(),
                    }
                );
                false
            }
        }
    }

    fn playback(&mut self, current_time: f32, world: &mut World) -> PlaybackReport {
        let mut report = PlaybackReport::default();
        for event in self.log.take_window(current_time) {
            match self.apply(world, event.action) {
                Ok(()) => report.applied += 1,
                Err(anomaly) => {
                    warn!("Wiring '{}' replay at {:.2}s: {}", self.task, event.timestamp, anomaly);
                    report.skipped.push(anomaly);
                }
            }
        }
        report
    }

    fn cursor(&self) -> f32 {
        self.log.cursor()
    }

    fn event_count(&self) -> usize {
        self.log.len()
    }

    fn to_json(&self) -> String {
        dump_json(self)
    }
}
