//! Task event recordings: timestamped domain events owned by one actor and
//! replayed idempotently against the current scene.
//!
//! Each variant is a small state machine over its own event type. They share
//! the `TaskEventRecording` capability, and the `SessionRegistry` stores them
//! as the closed `TaskRecording` union.

pub mod events;
pub mod fire;
pub mod lever;
pub mod log;
pub mod plugin;
pub mod wiring;

use bevy::prelude::*;

use crate::actor::ActorSlot;
use crate::replay_error::PlaybackReport;

pub use events::{
    DomainEvent, ExtinguisherActivationEvent, FireStateEvent, FireTaskEvent, LeverPullEvent,
    WireAction, WireEvent, WireEventKind,
};
pub use fire::FireRecording;
pub use lever::LeverRecording;
pub use log::{EventLog, Timestamped, INITIAL_CURSOR};
pub use plugin::{LiveAction, LiveInteraction, PlaybackDiagnostics, TaskEventsPlugin};
pub use wiring::WiringRecording;

/// Shared contract of every task recording.
pub trait TaskEventRecording {
    /// The actor whose turn produced this log.
    fn owner(&self) -> ActorSlot;

    fn belongs_to_actor(&self, slot: ActorSlot) -> bool {
        self.owner() == slot
    }

    /// Empty the log and rewind the cursor.
    fn clear(&mut self);

    /// Forget everything tied to the current scene instance (cursor, bound
    /// entities, memorized remaps). The log is kept.
    fn rewind(&mut self);

    /// Append an event of this recording's family. Events of another family
    /// are rejected with a logged diagnostic.
    fn record_event(&mut self, event: DomainEvent) -> bool;

    /// Apply every event in `(cursor, current_time]` exactly once, then move
    /// the cursor to `current_time`.
    fn playback(&mut self, current_time: f32, world: &mut World) -> PlaybackReport;

    fn cursor(&self) -> f32;

    fn event_count(&self) -> usize;

    /// Human-readable dump of the log for debugging.
    fn to_json(&self) -> String;
}

/// Every recording the session can hold.
#[derive(Debug, Clone)]
pub enum TaskRecording {
    Wiring(WiringRecording),
    Fire(FireRecording),
    Lever(LeverRecording),
}

impl TaskRecording {
    pub fn kind(&self) -> &'static str {
        match self {
            TaskRecording::Wiring(_) => "wiring",
            TaskRecording::Fire(_) => "fire",
            TaskRecording::Lever(_) => "lever",
        }
    }

    fn inner(&self) -> &dyn TaskEventRecording {
        match self {
            TaskRecording::Wiring(r) => r,
            TaskRecording::Fire(r) => r,
            TaskRecording::Lever(r) => r,
        }
    }

    fn inner_mut(&mut self) -> &mut dyn TaskEventRecording {
        match self {
            TaskRecording::Wiring(r) => r,
            TaskRecording::Fire(r) => r,
            TaskRecording::Lever(r) => r,
        }
    }

    pub fn as_wiring_mut(&mut self) -> Option<&mut WiringRecording> {
        match self {
            TaskRecording::Wiring(r) => Some(r),
            _ => None,
        }
    }

    pub fn as_fire_mut(&mut self) -> Option<&mut FireRecording> {
        match self {
            TaskRecording::Fire(r) => Some(r),
            _ => None,
        }
    }

    pub fn as_lever_mut(&mut self) -> Option<&mut LeverRecording> {
        match self {
            TaskRecording::Lever(r) => Some(r),
            _ => None,
        }
    }
}

impl TaskEventRecording for TaskRecording {
    fn owner(&self) -> ActorSlot {
        self.inner().owner()
    }

    fn clear(&mut self) {
        self.inner_mut().clear();
    }

    fn rewind(&mut self) {
        self.inner_mut().rewind();
    }

    fn record_event(&mut self, event: DomainEvent) -> bool {
        self.inner_mut().record_event(event)
    }

    fn playback(&mut self, current_time: f32, world: &mut World) -> PlaybackReport {
        self.inner_mut().playback(current_time, world)
    }

    fn cursor(&self) -> f32 {
        self.inner().cursor()
    }

    fn event_count(&self) -> usize {
        self.inner().event_count()
    }

    fn to_json(&self) -> String {
        self.inner().to_json()
    }
}

impl From<WiringRecording> for TaskRecording {
    fn from(recording: WiringRecording) -> Self {
        TaskRecording::Wiring(recording)
    }
}

impl From<FireRecording> for TaskRecording {
    fn from(recording: FireRecording) -> Self {
        TaskRecording::Fire(recording)
    }
}

impl From<LeverRecording> for TaskRecording {
    fn from(recording: LeverRecording) -> Self {
        TaskRecording::Lever(recording)
    }
}

/// Serialize a log for debugging, the way replay files are dumped.
pub(crate) fn dump_json<T: serde::Serialize>(value: &T) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|e| format!("{{\"error\": \"{e}\"}}"))
}
