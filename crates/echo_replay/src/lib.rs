//! Turn-based record/replay engine.
//!
//! Each actor plays one turn live while every earlier actor is replayed as a
//! ghost: its movement from a compressed pose sequence and its puzzle
//! interactions from task event logs applied idempotently to the freshly
//! loaded scene.

use bevy::prelude::*;

pub mod actor;
pub mod clock;
pub mod config;
pub mod echo_sets;
pub mod movement;
pub mod pose;
pub mod replay_error;
pub mod scene;
pub mod session;
pub mod task_events;

#[cfg(test)]
mod integration_tests;
#[cfg(any(test, feature = "bench"))]
pub mod test_harness;

pub use actor::{ActiveTurn, Actor, ActorSlot, TurnEnded};
pub use clock::SceneClock;
pub use config::ReplayConfig;
pub use echo_sets::EchoSet;
pub use replay_error::{PlaybackReport, ReplayAnomaly};
pub use session::{SessionRegistry, TaskId};

use movement::MovementPlugin;
use scene::{IndexAllocator, SceneIndex};
use task_events::{PlaybackDiagnostics, TaskEventsPlugin};

/// Sent by gameplay to restart. The caller reloads the scene afterwards.
#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub enum RestartRequest {
    /// Discard the live actor's sequence and recordings and replay its turn.
    CurrentActor,
    /// Discard everything and go back to the first actor.
    Everything,
}

/// Prepare the world for a new scene instance. Call before spawning the new
/// scene's objects; the old ones must already be despawned.
pub fn begin_scene_load(world: &mut World) {
    world.resource_mut::<SceneClock>().reset();
    world.resource_mut::<IndexAllocator>().reset();
    world.resource_mut::<SceneIndex>().clear();
    world.resource_mut::<SessionRegistry>().rewind_all();
    *world.resource_mut::<PlaybackDiagnostics>() = PlaybackDiagnostics::default();
    info!("Scene load for {:?}", world.resource::<ActiveTurn>().0);
}

pub fn handle_restart_requests(
    mut events: EventReader<RestartRequest>,
    mut registry: ResMut<SessionRegistry>,
    mut active: ResMut<ActiveTurn>,
) {
    for request in events.read() {
        match request {
            RestartRequest::CurrentActor => registry.wipe_actor(active.0),
            RestartRequest::Everything => {
                registry.wipe_all();
                active.0 = ActorSlot::default();
            }
        }
    }
}

/// Registers the replay resources, events and systems.
///
/// A `SessionRegistry` or `ReplayConfig` inserted before the plugin is kept,
/// so a session can start from a known seed or custom thresholds.
pub struct EchoReplayPlugin;

impl Plugin for EchoReplayPlugin {
    fn build(&self, app: &mut App) {
        echo_sets::configure_echo_sets(app);

        app.init_resource::<SessionRegistry>()
            .init_resource::<ReplayConfig>()
            .init_resource::<ActiveTurn>()
            .init_resource::<SceneClock>()
            .init_resource::<IndexAllocator>()
            .init_resource::<SceneIndex>()
            .add_event::<TurnEnded>()
            .add_event::<RestartRequest>()
            .add_systems(
                Update,
                (clock::advance_scene_clock, handle_restart_requests).in_set(EchoSet::Clock),
            )
            .add_systems(
                Update,
                (scene::index_scene_objects, actor::configure_new_actors).in_set(EchoSet::Bind),
            )
            .add_plugins((MovementPlugin, TaskEventsPlugin));
    }
}
