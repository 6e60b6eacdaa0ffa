//! Live gameplay objects and the index tables recordings resolve them through.
//!
//! Scene objects are recreated on every load, so recordings never hold on
//! to them directly. Construction code assigns each object a stable index
//! from `IndexAllocator`; `SceneIndex` maps those indices to whatever entity
//! currently carries them and is rebuilt from scratch on each load.

use std::collections::BTreeMap;
use std::fmt;

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::actor::ActorSlot;
use crate::replay_error::ReplayAnomaly;
use crate::session::TaskId;

// ---------------------------------------------------------------------------
// Stable indices
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WireIndex(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConnectorIndex(pub u32);

/// Assigned in construction order, but not guaranteed to name the same
/// logical fire after a reload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FireIndex(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LeverIndex(pub u32);

/// Identifies a scene object in diagnostics and lookups.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SceneObject {
    Wire(WireIndex),
    Connector(ConnectorIndex),
    Fire(FireIndex),
    Lever(LeverIndex),
    Panel(TaskId),
    Extinguisher(TaskId),
}

impl fmt::Display for SceneObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SceneObject::Wire(i) => write!(f, "wire {}", i.0),
            SceneObject::Connector(i) => write!(f, "connector {}", i.0),
            SceneObject::Fire(i) => write!(f, "fire {}", i.0),
            SceneObject::Lever(i) => write!(f, "lever {}", i.0),
            SceneObject::Panel(task) => write!(f, "wiring panel for task '{task}'"),
            SceneObject::Extinguisher(task) => write!(f, "extinguisher for task '{task}'"),
        }
    }
}

// ---------------------------------------------------------------------------
// Index assignment
// ---------------------------------------------------------------------------

/// Hands out stable indices during scene construction.
///
/// Owned by the scene builder and reset when a scene starts building, so
/// the same construction order always yields the same indices.
#[derive(Resource, Debug, Default)]
pub struct IndexAllocator {
    next_wire: u32,
    next_connector: u32,
    next_fire: u32,
    next_lever: u32,
}

impl IndexAllocator {
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn next_wire(&mut self) -> WireIndex {
        let index = WireIndex(self.next_wire);
        self.next_wire += 1;
        index
    }

    pub fn next_connector(&mut self) -> ConnectorIndex {
        let index = ConnectorIndex(self.next_connector);
        self.next_connector += 1;
        index
    }

    pub fn next_fire(&mut self) -> FireIndex {
        let index = FireIndex(self.next_fire);
        self.next_fire += 1;
        index
    }

    pub fn next_lever(&mut self) -> LeverIndex {
        let index = LeverIndex(self.next_lever);
        self.next_lever += 1;
        index
    }
}

// ---------------------------------------------------------------------------
// Scene components
// ---------------------------------------------------------------------------

#[derive(Component, Debug, Clone, PartialEq)]
pub struct Wire {
    pub index: WireIndex,
    /// Picked up and not seated in any connector.
    pub held: bool,
}

impl Wire {
    pub fn new(index: WireIndex) -> Self {
        Self { index, held: false }
    }
}

#[derive(Component, Debug, Clone, PartialEq)]
pub struct Connector {
    pub index: ConnectorIndex,
    pub seated: Option<WireIndex>,
}

impl Connector {
    pub fn new(index: ConnectorIndex, seated: Option<WireIndex>) -> Self {
        Self { index, seated }
    }

    /// Seat `wire`, returning whatever was displaced.
    pub fn seat(&mut self, wire: WireIndex) -> Option<WireIndex> {
        self.seated.replace(wire).filter(|w| *w != wire)
    }

    pub fn release(&mut self) -> Option<WireIndex> {
        self.seated.take()
    }
}

/// The wiring puzzle. Completion is triggered by the panel's lever.
#[derive(Component, Debug, Clone, PartialEq)]
pub struct WiringPanel {
    pub task: TaskId,
    pub owner: ActorSlot,
    pub completed: bool,
}

impl WiringPanel {
    pub fn new(task: impl Into<TaskId>, owner: ActorSlot) -> Self {
        Self {
            task: task.into(),
            owner,
            completed: false,
        }
    }

    pub fn mark_complete(&mut self) {
        self.completed = true;
    }
}

#[derive(Component, Debug, Clone, PartialEq)]
pub struct FireSource {
    pub index: FireIndex,
    pub task: TaskId,
    pub health: f32,
}

impl FireSource {
    pub fn new(index: FireIndex, task: impl Into<TaskId>, health: f32) -> Self {
        Self {
            index,
            task: task.into(),
            health,
        }
    }

    /// Live damage from the extinguisher spray.
    pub fn extinguish(&mut self, damage: f32) {
        self.health = (self.health - damage).max(0.0);
    }

    /// Replay sets health absolutely, never as a delta.
    pub fn set_health_for_playback(&mut self, health: f32) {
        self.health = health.max(0.0);
    }

    pub fn is_out(&self) -> bool {
        self.health <= 0.0
    }
}

#[derive(Component, Debug, Clone, PartialEq)]
pub struct Extinguisher {
    pub task: TaskId,
    pub owner: ActorSlot,
    pub active: bool,
}

impl Extinguisher {
    pub fn new(task: impl Into<TaskId>, owner: ActorSlot) -> Self {
        Self {
            task: task.into(),
            owner,
            active: false,
        }
    }

    pub fn set_active(&mut self, active: bool) {
        self.active = active;
    }
}

#[derive(Component, Debug, Clone, PartialEq)]
pub struct Lever {
    pub index: LeverIndex,
    pub task: TaskId,
    pub owner: ActorSlot,
    pub pulls: u32,
}

impl Lever {
    pub fn new(index: LeverIndex, task: impl Into<TaskId>, owner: ActorSlot) -> Self {
        Self {
            index,
            task: task.into(),
            owner,
            pulls: 0,
        }
    }

    pub fn pull(&mut self) {
        self.pulls += 1;
    }

    pub fn is_pulled(&self) -> bool {
        self.pulls > 0
    }
}

// ---------------------------------------------------------------------------
// SceneIndex
// ---------------------------------------------------------------------------

/// Index → entity tables for the current scene instance.
#[derive(Resource, Debug, Default)]
pub struct SceneIndex {
    wires: BTreeMap<WireIndex, Entity>,
    connectors: BTreeMap<ConnectorIndex, Entity>,
    fires: BTreeMap<FireIndex, Entity>,
    levers: BTreeMap<LeverIndex, Entity>,
}

impl SceneIndex {
    pub fn clear(&mut self) {
        self.wires.clear();
        self.connectors.clear();
        self.fires.clear();
        self.levers.clear();
    }

    pub fn insert_wire(&mut self, index: WireIndex, entity: Entity) {
        if self.wires.insert(index, entity).is_some() {
            warn!("SceneIndex: wire {} re-registered", index.0);
        }
    }

    pub fn insert_connector(&mut self, index: ConnectorIndex, entity: Entity) {
        if self.connectors.insert(index, entity).is_some() {
            warn!("SceneIndex: connector {} re-registered", index.0);
        }
    }

    pub fn insert_fire(&mut self, index: FireIndex, entity: Entity) {
        if self.fires.insert(index, entity).is_some() {
            warn!("SceneIndex: fire {} re-registered", index.0);
        }
    }

    pub fn insert_lever(&mut self, index: LeverIndex, entity: Entity) {
        if self.levers.insert(index, entity).is_some() {
            warn!("SceneIndex: lever {} re-registered", index.0);
        }
    }

    /// Entity currently carrying `object`. Panels and extinguishers are bound
    /// directly on their recording and never appear here.
    pub fn entity(&self, object: &SceneObject) -> Option<Entity> {
        match object {
            SceneObject::Wire(i) => self.wires.get(i).copied(),
            SceneObject::Connector(i) => self.connectors.get(i).copied(),
            SceneObject::Fire(i) => self.fires.get(i).copied(),
            SceneObject::Lever(i) => self.levers.get(i).copied(),
            SceneObject::Panel(_) | SceneObject::Extinguisher(_) => None,
        }
    }

    /// Fires in index order.
    pub fn fires(&self) -> impl Iterator<Item = (FireIndex, Entity)> + '_ {
        self.fires.iter().map(|(i, e)| (*i, *e))
    }

    pub fn connectors(&self) -> impl Iterator<Item = (ConnectorIndex, Entity)> + '_ {
        self.connectors.iter().map(|(i, e)| (*i, *e))
    }

    pub fn lever_count(&self) -> usize {
        self.levers.len()
    }

    pub fn fire_count(&self) -> usize {
        self.fires.len()
    }
}

/// Resolve an indexed object to its live entity, checking that the entity
/// still carries component `C`.
pub fn resolve<C: Component>(world: &World, object: &SceneObject) -> Result<Entity, ReplayAnomaly> {
    let entity = world
        .get_resource::<SceneIndex>()
        .and_then(|index| index.entity(object))
        .ok_or_else(|| ReplayAnomaly::Missing(object.clone()))?;
    if world.get::<C>(entity).is_none() {
        return Err(ReplayAnomaly::Destroyed(object.clone()));
    }
    Ok(entity)
}

/// Check that a directly bound entity still carries component `C`.
pub fn resolve_bound<C: Component>(
    world: &World,
    bound: Option<Entity>,
    object: SceneObject,
) -> Result<Entity, ReplayAnomaly> {
    let entity = bound.ok_or_else(|| ReplayAnomaly::Missing(object.clone()))?;
    if world.get::<C>(entity).is_none() {
        return Err(ReplayAnomaly::Destroyed(object));
    }
    Ok(entity)
}

/// Index every scene object spawned since the last run.
pub fn index_scene_objects(
    mut index: ResMut<SceneIndex>,
    wires: Query<(Entity, &Wire), Added<Wire>>,
    connectors: Query<(Entity, &Connector), Added<Connector>>,
    fires: Query<(Entity, &FireSource), Added<FireSource>>,
    levers: Query<(Entity, &Lever), Added<Lever>>,
) {
    for (entity, wire) in &wires {
        index.insert_wire(wire.index, entity);
    }
    for (entity, connector) in &connectors {
        index.insert_connector(connector.index, entity);
    }
    for (entity, fire) in &fires {
        index.insert_fire(fire.index, entity);
    }
    for (entity, lever) in &levers {
        index.insert_lever(lever.index, entity);
    }
}
