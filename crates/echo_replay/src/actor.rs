//! Turn identities and how each actor entity is driven in the current turn.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::config::ReplayConfig;
use crate::movement::{MovementSampler, PosePlayer};
use crate::session::SessionRegistry;

/// Logical turn identity, independent of any scene object. Ordered by turn.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
pub enum ActorSlot {
    #[default]
    Engineer,
    Firefighter,
    Doctor,
}

impl ActorSlot {
    pub const ALL: [ActorSlot; 3] = [ActorSlot::Engineer, ActorSlot::Firefighter, ActorSlot::Doctor];

    /// The slot playing after this one, if any.
    pub fn next(self) -> Option<ActorSlot> {
        match self {
            ActorSlot::Engineer => Some(ActorSlot::Firefighter),
            ActorSlot::Firefighter => Some(ActorSlot::Doctor),
            ActorSlot::Doctor => None,
        }
    }

    pub fn is_first(self) -> bool {
        self == ActorSlot::Engineer
    }
}

/// The slot currently under live control.
#[derive(Resource, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ActiveTurn(pub ActorSlot);

/// Sent by gameplay when the live actor's turn is over. The live sampler's
/// sequence is handed to the `SessionRegistry` on the same frame.
#[derive(Event, Debug, Clone, Copy)]
pub struct TurnEnded;

/// A character in the scene. Spawned fresh on every load.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actor {
    pub slot: ActorSlot,
}

/// Marks the actor under live control this turn.
#[derive(Component, Debug, Default)]
pub struct LiveActor;

/// Marks an actor replaying a previous turn.
#[derive(Component, Debug, Default)]
pub struct GhostActor;

/// Marks an actor with nothing to do this turn (not played yet, or its
/// turn left no sequence).
#[derive(Component, Debug, Default)]
pub struct DormantActor;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActorRole {
    Live,
    Ghost,
    Dormant,
}

impl ActorRole {
    pub fn resolve(slot: ActorSlot, active: ActorSlot, has_sequence: bool) -> Self {
        if slot == active {
            ActorRole::Live
        } else if slot < active && has_sequence {
            ActorRole::Ghost
        } else {
            ActorRole::Dormant
        }
    }
}

/// Attach the live sampler or ghost player to every newly spawned actor.
pub fn configure_new_actors(
    mut commands: Commands,
    actors: Query<(Entity, &Actor), Added<Actor>>,
    active: Res<ActiveTurn>,
    registry: Res<SessionRegistry>,
    config: Res<ReplayConfig>,
) {
    for (entity, actor) in &actors {
        let sequence = registry.sequence(actor.slot);
        match ActorRole::resolve(actor.slot, active.0, sequence.is_some()) {
            ActorRole::Live => {
                commands
                    .entity(entity)
                    .insert((LiveActor, MovementSampler::new(config.sampler)));
                info!("{:?} is live", actor.slot);
            }
            ActorRole::Ghost => {
                if let Some(sequence) = sequence {
                    debug!("{:?} replays {} samples", actor.slot, sequence.len());
                    commands.entity(entity).insert((
                        GhostActor,
                        PosePlayer::new(sequence, config.ghost_smoothing_rate),
                    ));
                }
            }
            ActorRole::Dormant => {
                commands.entity(entity).insert(DormantActor);
            }
        }
    }
}
