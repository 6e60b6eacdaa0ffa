//! Session-scoped store of finished pose sequences and task recordings.
//!
//! Lives for the whole session across scene reloads. Nothing here survives
//! process exit.

use std::borrow::Borrow;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use bevy::prelude::*;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::Serialize;

use crate::actor::ActorSlot;
use crate::pose::SampleSequence;
use crate::replay_error::PlaybackReport;
use crate::task_events::{
    FireRecording, LeverRecording, TaskEventRecording, TaskRecording, WiringRecording,
};

/// Identifier of one task recording in the scene ("panel-a", "galley-fire").
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct TaskId(String);

impl TaskId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for TaskId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for TaskId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl Borrow<str> for TaskId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Resource, Debug)]
pub struct SessionRegistry {
    sequences: BTreeMap<ActorSlot, Arc<SampleSequence>>,
    recordings: BTreeMap<TaskId, TaskRecording>,
    seed: u64,
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::with_seed(rand::random())
    }
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_seed(seed: u64) -> Self {
        Self {
            sequences: BTreeMap::new(),
            recordings: BTreeMap::new(),
            seed,
        }
    }

    // -----------------------------------------------------------------------
    // Pose sequences
    // -----------------------------------------------------------------------

    /// Take ownership of a finished turn's sequence, replacing any earlier
    /// sequence for the same slot.
    pub fn store_sequence(&mut self, slot: ActorSlot, sequence: SampleSequence, log_stats: bool) {
        if let Err(e) = sequence.validate() {
            warn!("Sequence for {:?} failed validation: {}", slot, e);
        }
        if log_stats {
            info!("Recording stats for {:?}: {}", slot, sequence.stats());
        } else {
            info!("Stored {} samples for {:?}", sequence.len(), slot);
        }
        self.sequences.insert(slot, Arc::new(sequence));
    }

    pub fn sequence(&self, slot: ActorSlot) -> Option<Arc<SampleSequence>> {
        self.sequences.get(&slot).cloned()
    }

    pub fn has_sequence(&self, slot: ActorSlot) -> bool {
        self.sequences.contains_key(&slot)
    }

    // -----------------------------------------------------------------------
    // Task recordings
    // -----------------------------------------------------------------------

    /// Register `recording` under `task` unless the id is already taken.
    ///
    /// Returns whether it was inserted. Re-registration is a silent no-op so
    /// scene rebuilds can register unconditionally.
    pub fn register(&mut self, task: impl Into<TaskId>, recording: impl Into<TaskRecording>) -> bool {
        let task = task.into();
        if self.recordings.contains_key(&task) {
            debug!("Task '{}' already registered, keeping existing recording", task);
            return false;
        }
        let recording = recording.into();
        info!(
            "Registered {} recording '{}' for {:?}",
            recording.kind(),
            task,
            recording.owner()
        );
        self.recordings.insert(task, recording);
        true
    }

    pub fn get(&self, task: &str) -> Option<&TaskRecording> {
        self.recordings.get(task)
    }

    pub fn get_mut(&mut self, task: &str) -> Option<&mut TaskRecording> {
        self.recordings.get_mut(task)
    }

    pub fn wiring_mut(&mut self, task: &str) -> Option<&mut WiringRecording> {
        self.get_mut(task).and_then(TaskRecording::as_wiring_mut)
    }

    pub fn fire_mut(&mut self, task: &str) -> Option<&mut FireRecording> {
        self.get_mut(task).and_then(TaskRecording::as_fire_mut)
    }

    pub fn lever_mut(&mut self, task: &str) -> Option<&mut LeverRecording> {
        self.get_mut(task).and_then(TaskRecording::as_lever_mut)
    }

    /// The recording for `task` if it belongs to the live slot. Interactions
    /// with another actor's task objects are not captured.
    pub fn recording_for_live(&mut self, task: &str, live: ActorSlot) -> Option<&mut TaskRecording> {
        self.get_mut(task).filter(|r| r.belongs_to_actor(live))
    }

    pub fn recordings(&self) -> impl Iterator<Item = (&TaskId, &TaskRecording)> {
        self.recordings.iter()
    }

    pub fn recording_count(&self) -> usize {
        self.recordings.len()
    }

    // -----------------------------------------------------------------------
    // Lifecycle
    // -----------------------------------------------------------------------

    /// Full restart: every sequence dropped, every recording emptied, and a
    /// fresh session seed.
    pub fn wipe_all(&mut self) {
        self.sequences.clear();
        for recording in self.recordings.values_mut() {
            recording.clear();
        }
        self.seed = rand::random();
        info!("Session wiped, new seed {}", self.seed);
    }

    /// Restart one actor's turn: only that slot's sequence and recordings.
    pub fn wipe_actor(&mut self, slot: ActorSlot) {
        self.sequences.remove(&slot);
        for recording in self.recordings.values_mut() {
            if recording.belongs_to_actor(slot) {
                recording.clear();
            }
        }
        info!("Wiped recordings for {:?}", slot);
    }

    /// Called when a scene instance starts: cursors and bindings belong to
    /// the old instance.
    pub fn rewind_all(&mut self) {
        for recording in self.recordings.values_mut() {
            recording.rewind();
        }
    }

    /// Replay every recording whose owner played before `active`.
    pub fn play_past_recordings(
        &mut self,
        active: ActorSlot,
        now: f32,
        world: &mut World,
    ) -> PlaybackReport {
        let mut report = PlaybackReport::default();
        for recording in self.recordings.values_mut() {
            if recording.owner() < active {
                report.merge(recording.playback(now, world));
            }
        }
        report
    }

    // -----------------------------------------------------------------------
    // Randomness
    // -----------------------------------------------------------------------

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Fresh RNG for scene construction. Same seed, same layout on every
    /// reload until the next `wipe_all`.
    pub fn scene_rng(&self) -> ChaCha8Rng {
        ChaCha8Rng::seed_from_u64(self.seed)
    }
}
