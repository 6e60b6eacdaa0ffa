use bevy::prelude::*;
use serde::Serialize;

use super::events::{DomainEvent, LeverPullEvent};
use super::log::EventLog;
use super::{dump_json, TaskEventRecording};
use crate::actor::ActorSlot;
use crate::replay_error::{PlaybackReport, ReplayAnomaly};
use crate::scene::{resolve, Lever, LeverIndex, SceneObject};
use crate::session::TaskId;

/// Lever pulls by stable index, resolved through the scene index on replay.
#[derive(Debug, Clone, Serialize)]
pub struct LeverRecording {
    owner: ActorSlot,
    task: TaskId,
    log: EventLog<LeverPullEvent>,
}

impl LeverRecording {
    pub fn new(owner: ActorSlot, task: impl Into<TaskId>) -> Self {
        Self {
            owner,
            task: task.into(),
            log: EventLog::default(),
        }
    }

    pub fn record_lever_pull(&mut self, time: f32, lever: LeverIndex) {
        if let Some(anomaly) = self.log.append(LeverPullEvent {
            timestamp: time,
            lever,
        }) {
            warn!("Lever task '{}': {}", self.task, anomaly);
        }
    }

    pub fn events(&self) -> &[LeverPullEvent] {
        self.log.events()
    }
}

impl TaskEventRecording for LeverRecording {
    fn owner(&self) -> ActorSlot {
        self.owner
    }

    fn clear(&mut self) {
        self.log.clear();
        info!("Cleared lever events for {:?} ('{}')", self.owner, self.task);
    }

    fn rewind(&mut self) {
        self.log.rewind();
    }

    fn record_event(&mut self, event: DomainEvent) -> bool {
        if let DomainEvent::LeverPull(e) = event {
            self.record_lever_pull(e.timestamp, e.lever);
            return true;
        }
        warn!(
            "Lever task '{}': {}",
            self.task,
            ReplayAnomaly::ForeignEvent {
                recording: "lever",
                event: event.family(),
            }
        );
        false
    }

    fn playback(&mut self, current_time: f32, world: &mut World) -> PlaybackReport {
        let mut report = PlaybackReport::default();
        for event in self.log.take_window(current_time) {
            match resolve::<Lever>(world, &SceneObject::Lever(event.lever)) {
                Ok(entity) => {
                    if let Some(mut lever) = world.get_mut::<Lever>(entity) {
                        lever.pull();
                    }
                    report.applied += 1;
                }
                Err(anomaly) => {
                    warn!("Lever task '{}' replay: {}", self.task, anomaly);
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
