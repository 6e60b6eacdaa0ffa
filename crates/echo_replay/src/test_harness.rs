//! # TestScene - headless harness for the replay engine
//!
//! Wraps a `bevy::app::App` with `MinimalPlugins` + `EchoReplayPlugin` and a
//! small standard scene: one wiring panel (engineer), three fires with an
//! extinguisher and two door levers (firefighter), and one actor per slot.
//! The doctor owns no task, so every task owner is replayed by the time the
//! last turn is played. Frame time is fixed so recordings are reproducible.

use std::time::Duration;

use bevy::app::App;
use bevy::prelude::*;
use bevy::time::TimeUpdateStrategy;
use rand::seq::SliceRandom;

use crate::actor::{ActiveTurn, Actor, ActorSlot, GhostActor, LiveActor, TurnEnded};
use crate::pose::AnimationBlend;
use crate::scene::{
    Connector, ConnectorIndex, Extinguisher, FireIndex, FireSource, IndexAllocator, Lever,
    LeverIndex, SceneIndex, SceneObject, Wire, WireIndex, WiringPanel,
};
use crate::session::SessionRegistry;
use crate::task_events::{LiveAction, LiveInteraction, PlaybackDiagnostics};
use crate::{begin_scene_load, EchoReplayPlugin, RestartRequest, SceneClock};

pub const PANEL_TASK: &str = "engine-panel";
pub const FIRE_TASK: &str = "galley-fire";
pub const DOOR_TASK: &str = "bulkhead-doors";

pub const WIRE_COUNT: u32 = 4;
pub const LEVER_COUNT: u32 = 2;
/// Starting health of the fires, in construction order.
pub const FIRE_HEALTHS: [f32; 3] = [80.0, 50.0, 20.0];

/// Seconds per frame.
pub const FRAME_DT: f32 = 0.1;
pub const DEFAULT_SEED: u64 = 42;

pub struct TestScene {
    app: App,
    spawned: Vec<Entity>,
    /// Fire indices handed out before the real fires on the next load, so the
    /// recorded indices no longer exist.
    fire_index_offset: u32,
}

impl Default for TestScene {
    fn default() -> Self {
        Self::new()
    }
}

impl TestScene {
    // -----------------------------------------------------------------------
    // Constructors
    // -----------------------------------------------------------------------

    pub fn new() -> Self {
        Self::with_registry(SessionRegistry::with_seed(DEFAULT_SEED))
    }

    pub fn with_registry(registry: SessionRegistry) -> Self {
        let mut app = App::new();
        app.add_plugins(MinimalPlugins);
        app.insert_resource(registry);
        app.add_plugins(EchoReplayPlugin);
        app.insert_resource(TimeUpdateStrategy::ManualDuration(
            Duration::from_secs_f32(FRAME_DT),
        ));
        // The very first frame has zero delta; get it out of the way before
        // any scene exists.
        app.update();

        let mut scene = Self {
            app,
            spawned: Vec::new(),
            fire_index_offset: 0,
        };
        scene.load();
        scene
    }

    /// Shift fire indices on the next load.
    pub fn with_fire_index_offset(mut self, offset: u32) -> Self {
        self.fire_index_offset = offset;
        self
    }

    pub fn set_fire_index_offset(&mut self, offset: u32) {
        self.fire_index_offset = offset;
    }

    // -----------------------------------------------------------------------
    // Scene lifecycle
    // -----------------------------------------------------------------------

    /// Despawn the scene, rebuild it and run the first frame.
    pub fn reload(&mut self) {
        self.load();
    }

    fn load(&mut self) {
        let offset = self.fire_index_offset;
        let world = self.app.world_mut();
        for entity in self.spawned.drain(..) {
            world.despawn(entity);
        }
        begin_scene_load(world);
        self.spawned = spawn_standard_scene(world, offset);
        self.app.update();
    }

    /// Hand off the live sequence, advance to the next slot and reload.
    /// Returns `false` after the last slot.
    pub fn end_turn(&mut self) -> bool {
        self.app.world_mut().send_event(TurnEnded);
        self.app.update();
        let next = self.active().next();
        if let Some(next) = next {
            self.app.world_mut().resource_mut::<ActiveTurn>().0 = next;
        }
        self.reload();
        next.is_some()
    }

    pub fn restart(&mut self, request: RestartRequest) {
        self.app.world_mut().send_event(request);
        self.app.update();
        self.reload();
    }

    pub fn tick(&mut self, frames: u32) {
        for _ in 0..frames {
            self.app.update();
        }
    }

    pub fn tick_secs(&mut self, secs: f32) {
        self.tick((secs / FRAME_DT).round() as u32);
    }

    // -----------------------------------------------------------------------
    // Live actor input
    // -----------------------------------------------------------------------

    /// Translate the live actor by `delta` without running a frame.
    pub fn move_live(&mut self, delta: Vec3) {
        let world = self.app.world_mut();
        let mut live = world.query_filtered::<&mut Transform, With<LiveActor>>();
        for mut transform in live.iter_mut(world) {
            transform.translation += delta;
        }
    }

    /// Walk the live actor along `step` for `frames` frames.
    pub fn walk_live(&mut self, step: Vec3, frames: u32) {
        for _ in 0..frames {
            self.move_live(step);
            self.app.update();
        }
    }

    pub fn pick_up_wire(&mut self, wire: u32, connector: u32) {
        let (wire, connector) = (WireIndex(wire), ConnectorIndex(connector));
        self.with_connector(connector, |c| {
            if c.seated == Some(wire) {
                c.release();
            }
        });
        self.with_wire(wire, |w| w.held = true);
        self.send(PANEL_TASK, LiveAction::WirePickup { wire, connector });
    }

    pub fn connect_wire(&mut self, wire: u32, connector: u32) {
        let (wire, connector) = (WireIndex(wire), ConnectorIndex(connector));
        self.with_connector(connector, |c| {
            c.seat(wire);
        });
        self.with_wire(wire, |w| w.held = false);
        self.send(PANEL_TASK, LiveAction::WireConnect { wire, connector });
    }

    pub fn swap_wires(&mut self, connector: u32, target_connector: u32) {
        let (connector, target_connector) =
            (ConnectorIndex(connector), ConnectorIndex(target_connector));
        let seating = self.seating();
        let (Some(wire), Some(target_wire)) = (
            seating[connector.0 as usize],
            seating[target_connector.0 as usize],
        ) else {
            return;
        };
        self.with_connector(connector, |c| {
            c.seat(target_wire);
        });
        self.with_connector(target_connector, |c| {
            c.seat(wire);
        });
        self.send(
            PANEL_TASK,
            LiveAction::WireSwap {
                wire,
                connector,
                target_wire,
                target_connector,
            },
        );
    }

    pub fn complete_panel(&mut self) {
        let world = self.app.world_mut();
        let mut panels = world.query::<&mut WiringPanel>();
        for mut panel in panels.iter_mut(world) {
            panel.mark_complete();
        }
        self.send(PANEL_TASK, LiveAction::PanelComplete);
    }

    pub fn toggle_extinguisher(&mut self, active: bool) {
        let world = self.app.world_mut();
        let mut extinguishers = world.query::<&mut Extinguisher>();
        for mut extinguisher in extinguishers.iter_mut(world) {
            extinguisher.set_active(active);
        }
        self.send(FIRE_TASK, LiveAction::ExtinguisherToggled(active));
    }

    /// Damage the fire carrying `fire`. Health is captured by change
    /// detection, not by an explicit interaction.
    pub fn spray_fire(&mut self, fire: u32, damage: f32) {
        let world = self.app.world_mut();
        let Some(entity) = world
            .resource::<SceneIndex>()
            .entity(&SceneObject::Fire(FireIndex(fire)))
        else {
            return;
        };
        if let Some(mut source) = world.get_mut::<FireSource>(entity) {
            source.extinguish(damage);
        }
    }

    pub fn pull_lever(&mut self, lever: u32) {
        let lever = LeverIndex(lever);
        let world = self.app.world_mut();
        if let Some(entity) = world.resource::<SceneIndex>().entity(&SceneObject::Lever(lever)) {
            if let Some(mut l) = world.get_mut::<Lever>(entity) {
                l.pull();
            }
        }
        self.send(DOOR_TASK, LiveAction::LeverPulled(lever));
    }

    fn send(&mut self, task: &str, action: LiveAction) {
        self.app
            .world_mut()
            .send_event(LiveInteraction::new(task, action));
    }

    fn with_connector(&mut self, connector: ConnectorIndex, f: impl FnOnce(&mut Connector)) {
        let world = self.app.world_mut();
        let Some(entity) = world
            .resource::<SceneIndex>()
            .entity(&SceneObject::Connector(connector))
        else {
            return;
        };
        if let Some(mut c) = world.get_mut::<Connector>(entity) {
            f(&mut *c);
        }
    }

    fn with_wire(&mut self, wire: WireIndex, f: impl FnOnce(&mut Wire)) {
        let world = self.app.world_mut();
        let Some(entity) = world.resource::<SceneIndex>().entity(&SceneObject::Wire(wire)) else {
            return;
        };
        if let Some(mut w) = world.get_mut::<Wire>(entity) {
            f(&mut *w);
        }
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    pub fn world_mut(&mut self) -> &mut World {
        self.app.world_mut()
    }

    pub fn resource<T: Resource>(&self) -> &T {
        self.app.world().resource::<T>()
    }

    pub fn registry(&self) -> &SessionRegistry {
        self.resource::<SessionRegistry>()
    }

    pub fn registry_mut(&mut self) -> Mut<'_, SessionRegistry> {
        self.app.world_mut().resource_mut::<SessionRegistry>()
    }

    pub fn diagnostics(&self) -> &PlaybackDiagnostics {
        self.resource::<PlaybackDiagnostics>()
    }

    pub fn active(&self) -> ActorSlot {
        self.resource::<ActiveTurn>().0
    }

    pub fn clock(&self) -> f32 {
        self.resource::<SceneClock>().elapsed()
    }

    pub fn actor_position(&mut self, slot: ActorSlot) -> Option<Vec3> {
        let world = self.app.world_mut();
        let mut actors = world.query::<(&Actor, &Transform)>();
        actors
            .iter(world)
            .find(|(actor, _)| actor.slot == slot)
            .map(|(_, t)| t.translation)
    }

    pub fn is_ghost(&mut self, slot: ActorSlot) -> bool {
        let world = self.app.world_mut();
        let mut ghosts = world.query_filtered::<&Actor, With<GhostActor>>();
        ghosts.iter(world).any(|a| a.slot == slot)
    }

    /// Seated wire per connector, in connector order.
    pub fn seating(&mut self) -> Vec<Option<WireIndex>> {
        let world = self.app.world_mut();
        let mut connectors = world.query::<&Connector>();
        let mut seats: Vec<(ConnectorIndex, Option<WireIndex>)> = connectors
            .iter(world)
            .map(|c| (c.index, c.seated))
            .collect();
        seats.sort_by_key(|(i, _)| *i);
        seats.into_iter().map(|(_, w)| w).collect()
    }

    /// Fire healths in index order.
    pub fn fire_healths(&mut self) -> Vec<(FireIndex, f32)> {
        let world = self.app.world_mut();
        let mut fires = world.query::<&FireSource>();
        let mut healths: Vec<(FireIndex, f32)> =
            fires.iter(world).map(|f| (f.index, f.health)).collect();
        healths.sort_by_key(|(i, _)| *i);
        healths
    }

    pub fn lever_pulls(&mut self) -> Vec<u32> {
        let world = self.app.world_mut();
        let mut levers = world.query::<&Lever>();
        let mut pulls: Vec<(LeverIndex, u32)> =
            levers.iter(world).map(|l| (l.index, l.pulls)).collect();
        pulls.sort_by_key(|(i, _)| *i);
        pulls.into_iter().map(|(_, p)| p).collect()
    }

    pub fn panel_completed(&mut self) -> bool {
        let world = self.app.world_mut();
        let mut panels = world.query::<&WiringPanel>();
        panels.iter(world).any(|p| p.completed)
    }

    pub fn extinguisher_active(&mut self) -> bool {
        let world = self.app.world_mut();
        let mut extinguishers = world.query::<&Extinguisher>();
        extinguishers.iter(world).any(|e| e.active)
    }
}

/// Build the standard scene and return every spawned entity.
fn spawn_standard_scene(world: &mut World, fire_index_offset: u32) -> Vec<Entity> {
    let mut rng = world.resource::<SessionRegistry>().scene_rng();
    let mut spawned = Vec::new();

    world.resource_scope(|world, mut alloc: Mut<IndexAllocator>| {
        let wires: Vec<WireIndex> = (0..WIRE_COUNT).map(|_| alloc.next_wire()).collect();
        let mut layout = wires.clone();
        layout.shuffle(&mut rng);
        for wire in &wires {
            spawned.push(world.spawn(Wire::new(*wire)).id());
        }
        for seated in layout {
            let connector = alloc.next_connector();
            spawned.push(world.spawn(Connector::new(connector, Some(seated))).id());
        }
        spawned.push(
            world
                .spawn(WiringPanel::new(PANEL_TASK, ActorSlot::Engineer))
                .id(),
        );

        for _ in 0..fire_index_offset {
            alloc.next_fire();
        }
        for health in FIRE_HEALTHS {
            let fire = alloc.next_fire();
            spawned.push(world.spawn(FireSource::new(fire, FIRE_TASK, health)).id());
        }
        spawned.push(
            world
                .spawn(Extinguisher::new(FIRE_TASK, ActorSlot::Firefighter))
                .id(),
        );

        for _ in 0..LEVER_COUNT {
            let lever = alloc.next_lever();
            spawned.push(
                world
                    .spawn(Lever::new(lever, DOOR_TASK, ActorSlot::Firefighter))
                    .id(),
            );
        }
    });

    for (i, slot) in ActorSlot::ALL.into_iter().enumerate() {
        spawned.push(
            world
                .spawn((
                    Actor { slot },
                    Transform::from_xyz(i as f32 * 5.0, 0.0, 0.0),
                    AnimationBlend::default(),
                ))
                .id(),
        );
    }
    spawned
}
