//! Systems wiring the sampler and the ghost player into the frame.

use bevy::prelude::*;

use super::{MovementSampler, PosePlayer};
use crate::actor::{Actor, GhostActor, LiveActor, TurnEnded};
use crate::config::ReplayConfig;
use crate::echo_sets::EchoSet;
use crate::pose::{AnimationBlend, Pose};
use crate::session::SessionRegistry;

/// Feed the live actor's pose to its sampler once per frame.
pub fn sample_live_actor(
    time: Res<Time>,
    mut live: Query<(&Transform, Option<&AnimationBlend>, &mut MovementSampler), With<LiveActor>>,
) {
    let dt = time.delta_secs();
    for (transform, blend, mut sampler) in &mut live {
        let blend = blend.map(|b| b.0).unwrap_or_default();
        sampler.advance(dt, Pose::from_transform(transform, blend));
    }
}

/// On `TurnEnded`, move each live sampler's sequence into the registry. The
/// actor stops recording; it becomes a ghost on the next scene load.
pub fn hand_off_on_turn_end(
    mut commands: Commands,
    mut events: EventReader<TurnEnded>,
    mut live: Query<(Entity, &Actor, &mut MovementSampler), With<LiveActor>>,
    mut registry: ResMut<SessionRegistry>,
    config: Res<ReplayConfig>,
) {
    if events.read().count() == 0 {
        return;
    }
    for (entity, actor, mut sampler) in &mut live {
        let sampler = std::mem::take(&mut *sampler);
        registry.store_sequence(actor.slot, sampler.finish(), config.log_recording_stats);
        commands.entity(entity).remove::<(MovementSampler, LiveActor)>();
    }
}

/// Place freshly configured ghosts on their first sample.
pub fn init_ghost_poses(
    mut ghosts: Query<
        (&mut Transform, Option<&mut AnimationBlend>, &PosePlayer),
        (With<GhostActor>, Added<PosePlayer>),
    >,
) {
    for (mut transform, blend, player) in &mut ghosts {
        if let Some(pose) = player.target_pose() {
            write_pose(&pose, &mut transform, blend);
        }
    }
}

pub fn drive_ghosts(
    time: Res<Time>,
    mut ghosts: Query<
        (&mut Transform, Option<&mut AnimationBlend>, &mut PosePlayer),
        With<GhostActor>,
    >,
) {
    let dt = time.delta_secs();
    for (mut transform, blend, mut player) in &mut ghosts {
        let current_blend = blend.as_deref().map(|b| b.0).unwrap_or_default();
        let rendered = Pose::from_transform(&transform, current_blend);
        if let Some(pose) = player.drive(dt, rendered) {
            write_pose(&pose, &mut transform, blend);
        }
    }
}

fn write_pose(pose: &Pose, transform: &mut Transform, blend: Option<Mut<AnimationBlend>>) {
    match blend {
        Some(mut blend) => pose.write_to(transform, &mut blend),
        None => {
            transform.translation = pose.position;
            transform.rotation = pose.orientation;
        }
    }
}

pub struct MovementPlugin;

impl Plugin for MovementPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(
            Update,
            (sample_live_actor, hand_off_on_turn_end)
                .chain()
                .in_set(EchoSet::Capture),
        )
        .add_systems(
            Update,
            (init_ghost_poses, drive_ghosts)
                .chain()
                .in_set(EchoSet::Playback),
        );
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::actor::ActorSlot;
    use crate::pose::{PoseSample, SampleSequence};

    #[test]
    fn ghost_starts_on_first_sample() {
        let mut world = World::new();
        let sequence = SampleSequence::from_samples(vec![
            PoseSample::new(
                Pose {
                    position: Vec3::new(3.0, 0.0, 1.0),
                    ..Default::default()
                },
                0.0,
            ),
            PoseSample::new(
                Pose {
                    position: Vec3::new(6.0, 0.0, 1.0),
                    ..Default::default()
                },
                1.0,
            ),
        ]);
        let ghost = world
            .spawn((
                Actor {
                    slot: ActorSlot::Engineer,
                },
                GhostActor,
                Transform::default(),
                AnimationBlend::default(),
                PosePlayer::new(Arc::new(sequence), None),
            ))
            .id();

        let mut schedule = Schedule::default();
        schedule.add_systems(init_ghost_poses);
        schedule.run(&mut world);

        let transform = world.get::<Transform>(ghost).unwrap();
        assert_eq!(transform.translation, Vec3::new(3.0, 0.0, 1.0));
    }
}
