//! Fire suppression recording.
//!
//! Health is logged as absolute snapshots and replayed by assignment, so an
//! overlapping window can never apply the same damage twice. Fire indices are
//! only best-effort stable across reloads; an event whose index has no live
//! fire falls back to a nearest-health remap.

use std::collections::BTreeMap;

use bevy::prelude::*;
use serde::Serialize;

use super::events::{DomainEvent, ExtinguisherActivationEvent, FireStateEvent, FireTaskEvent};
use super::log::EventLog;
use super::{dump_json, TaskEventRecording};
use crate::actor::ActorSlot;
use crate::config::{FIRE_HEALTH_EPSILON, FIRE_REMAP_TOLERANCE};
use crate::replay_error::{PlaybackReport, ReplayAnomaly};
use crate::scene::{resolve, resolve_bound, Extinguisher, FireIndex, FireSource, SceneIndex, SceneObject};
use crate::session::TaskId;

#[derive(Debug, Clone, Serialize)]
pub struct FireRecording {
    owner: ActorSlot,
    task: TaskId,
    log: EventLog<FireTaskEvent>,
    /// Last snapshot per fire, for delta compression.
    #[serde(skip)]
    last_recorded: BTreeMap<FireIndex, f32>,
    /// Recorded index -> live index, accepted by the remap fallback.
    #[serde(skip)]
    remaps: BTreeMap<FireIndex, FireIndex>,
    #[serde(skip)]
    extinguisher: Option<Entity>,
}

impl FireRecording {
    pub fn new(owner: ActorSlot, task: impl Into<TaskId>) -> Self {
        Self {
            owner,
            task: task.into(),
            log: EventLog::default(),
            last_recorded: BTreeMap::new(),
            remaps: BTreeMap::new(),
            extinguisher: None,
        }
    }

    pub fn bind_extinguisher(&mut self, extinguisher: Entity) {
        self.extinguisher = Some(extinguisher);
    }

    pub fn extinguisher(&self) -> Option<Entity> {
        self.extinguisher
    }

    /// Baseline health of a freshly spawned fire. Later snapshots are
    /// compared against it.
    pub fn seed_fire(&mut self, fire: FireIndex, health: f32) {
        self.last_recorded.insert(fire, health);
    }

    pub fn events(&self) -> &[FireTaskEvent] {
        self.log.events()
    }

    /// Remaps accepted since the last rebind.
    pub fn remaps(&self) -> impl Iterator<Item = (FireIndex, FireIndex)> + '_ {
        self.remaps.iter().map(|(from, to)| (*from, *to))
    }

    /// Log a health snapshot unless it is within `FIRE_HEALTH_EPSILON` of the
    /// previous one for this fire. Returns whether it was logged.
    pub fn record_fire_state(&mut self, time: f32, fire: FireIndex, health: f32) -> bool {
        if let Some(last) = self.last_recorded.get(&fire) {
            if (last - health).abs() <= FIRE_HEALTH_EPSILON {
                return false;
            }
        }
        self.last_recorded.insert(fire, health);
        self.push(FireTaskEvent::FireState(FireStateEvent {
            timestamp: time,
            fire,
            health,
        }));
        true
    }

    pub fn record_extinguisher_state(&mut self, time: f32, active: bool) {
        self.push(FireTaskEvent::Extinguisher(ExtinguisherActivationEvent {
            timestamp: time,
            active,
        }));
    }

    fn push(&mut self, event: FireTaskEvent) {
        if let Some(anomaly) = self.log.append(event) {
            warn!("Fire task '{}': {}", self.task, anomaly);
        }
    }

    fn apply_activation(
        &self,
        world: &mut World,
        event: ExtinguisherActivationEvent,
    ) -> Result<(), ReplayAnomaly> {
        let entity = resolve_bound::<Extinguisher>(
            world,
            self.extinguisher,
            SceneObject::Extinguisher(self.task.clone()),
        )?;
        if let Some(mut extinguisher) = world.get_mut::<Extinguisher>(entity) {
            extinguisher.set_active(event.active);
        }
        Ok(())
    }

    fn apply_fire_state(
        &mut self,
        world: &mut World,
        event: FireStateEvent,
        claimed: &mut Vec<Entity>,
    ) -> Result<(), ReplayAnomaly> {
        let entity = self.match_fire(world, event.fire, event.health, claimed)?;
        if let Some(mut fire) = world.get_mut::<FireSource>(entity) {
            fire.set_health_for_playback(event.health);
        }
        if !claimed.contains(&entity) {
            claimed.push(entity);
        }
        Ok(())
    }

    /// Exact index, then a memorized remap, then the closest unclaimed live
    /// fire by health within `FIRE_REMAP_TOLERANCE`.
    fn match_fire(
        &mut self,
        world: &World,
        fire: FireIndex,
        health: f32,
        claimed: &[Entity],
    ) -> Result<Entity, ReplayAnomaly> {
        if let Ok(entity) = resolve::<FireSource>(world, &SceneObject::Fire(fire)) {
            return Ok(entity);
        }
        if let Some(live) = self.remaps.get(&fire) {
            if let Ok(entity) = resolve::<FireSource>(world, &SceneObject::Fire(*live)) {
                return Ok(entity);
            }
        }

        let live: Vec<(FireIndex, Entity, f32)> = world
            .get_resource::<SceneIndex>()
            .map(|index| {
                index
                    .fires()
                    .filter_map(|(i, e)| world.get::<FireSource>(e).map(|f| (i, e, f.health)))
                    .collect()
            })
            .unwrap_or_default();

        let mut best: Option<(FireIndex, Entity, f32)> = None;
        for (index, entity, live_health) in &live {
            if claimed.contains(entity) {
                continue;
            }
            let gap = (live_health - health).abs();
            if best.map_or(true, |(_, _, best_gap)| gap < best_gap) {
                best = Some((*index, *entity, gap));
            }
        }

        match best {
            Some((index, entity, gap)) if gap <= FIRE_REMAP_TOLERANCE => {
                info!(
                    "Fire task '{}': remapped fire {} -> {} (gap {:.1})",
                    self.task, fire.0, index.0, gap
                );
                self.remaps.insert(fire, index);
                Ok(entity)
            }
            _ => Err(ReplayAnomaly::UnmatchedFire {
                fire,
                health,
                available: live.iter().map(|(i, _, _)| *i).collect(),
            }),
        }
    }
}

impl TaskEventRecording for FireRecording {
    fn owner(&self) -> ActorSlot {
        self.owner
    }

    fn clear(&mut self) {
        self.log.clear();
        self.last_recorded.clear();
        self.remaps.clear();
        info!("Cleared fire events for {:?} ('{}')", self.owner, self.task);
    }

    fn rewind(&mut self) {
        self.log.rewind();
        self.remaps.clear();
        self.extinguisher = None;
    }

    fn record_event(&mut self, event: DomainEvent) -> bool {
        match event {
            DomainEvent::FireState(e) => self.record_fire_state(e.timestamp, e.fire, e.health),
            DomainEvent::ExtinguisherActivation(e) => {
                self.record_extinguisher_state(e.timestamp, e.active);
                true
            }
            other => {
                warn!(
                    "Fire task '{}': {}",
                    self.task,
                    ReplayAnomaly::ForeignEvent {
                        recording: "fire",
                        event: other.family(),
                    }
                );
                false
            }
        }
    }

    fn playback(&mut self, current_time: f32, world: &mut World) -> PlaybackReport {
        let mut report = PlaybackReport::default();
        let mut claimed = Vec::new();
        for event in self.log.take_window(current_time) {
            let outcome = match event {
                FireTaskEvent::Extinguisher(e) => self.apply_activation(world, e),
                FireTaskEvent::FireState(e) => self.apply_fire_state(world, e, &mut claimed),
            };
            match outcome {
                Ok(()) => report.applied += 1,
                Err(anomaly) => {
                    warn!("Fire task '{}' replay: {}", self.task, anomaly);
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

#[cfg(test)]
mod tests {
    use super::*;

    fn world_with_fires(healths: &[f32]) -> (World, Vec<Entity>) {
        let mut world = World::new();
        let mut index = SceneIndex::default();
        let mut entities = Vec::new();
        for (i, health) in healths.iter().enumerate() {
            let fire = FireIndex(i as u32);
            let e = world.spawn(FireSource::new(fire, "fires", *health)).id();
            index.insert_fire(fire, e);
            entities.push(e);
        }
        world.insert_resource(index);
        (world, entities)
    }

    fn health(world: &World, entity: Entity) -> f32 {
        world.get::<FireSource>(entity).unwrap().health
    }

    #[test]
    fn small_changes_are_not_logged() {
        let mut rec = FireRecording::new(ActorSlot::Firefighter, "fires");
        rec.seed_fire(FireIndex(0), 100.0);
        assert!(!rec.record_fire_state(0.1, FireIndex(0), 99.95));
        assert!(rec.record_fire_state(0.2, FireIndex(0), 99.5));
        assert!(!rec.record_fire_state(0.3, FireIndex(0), 99.45));
        assert_eq!(rec.event_count(), 1);
    }

    #[test]
    fn exact_index_sets_health_absolutely() {
        let (mut world, fires) = world_with_fires(&[80.0, 50.0]);
        let mut rec = FireRecording::new(ActorSlot::Firefighter, "fires");
        rec.record_fire_state(1.0, FireIndex(1), 30.0);
        rec.record_fire_state(2.0, FireIndex(1), 10.0);

        rec.playback(1.5, &mut world);
        assert_eq!(health(&world, fires[1]), 30.0);
        rec.playback(2.0, &mut world);
        rec.playback(2.0, &mut world);
        assert_eq!(health(&world, fires[1]), 10.0);
        assert_eq!(health(&world, fires[0]), 80.0);
    }

    #[test]
    fn remap_picks_nearest_and_never_reclaims_in_batch() {
        let (mut world, fires) = world_with_fires(&[80.0, 50.0, 20.0]);
        let mut rec = FireRecording::new(ActorSlot::Firefighter, "fires");
        rec.record_fire_state(1.0, FireIndex(5), 52.0);
        rec.record_fire_state(1.0, FireIndex(6), 49.0);

        let report = rec.playback(1.0, &mut world);
        assert_eq!(report.applied, 1);
        assert_eq!(health(&world, fires[1]), 52.0);
        assert_eq!(rec.remaps().collect::<Vec<_>>(), vec![(FireIndex(5), FireIndex(1))]);
        // fire 1 is claimed; 0 and 2 are both beyond tolerance
        assert_eq!(
            report.skipped,
            vec![ReplayAnomaly::UnmatchedFire {
                fire: FireIndex(6),
                health: 49.0,
                available: vec![FireIndex(0), FireIndex(1), FireIndex(2)],
            }]
        );
        assert_eq!(health(&world, fires[0]), 80.0);
        assert_eq!(health(&world, fires[2]), 20.0);
    }

    #[test]
    fn accepted_remap_is_memorized() {
        let (mut world, fires) = world_with_fires(&[80.0, 50.0, 20.0]);
        let mut rec = FireRecording::new(ActorSlot::Firefighter, "fires");
        rec.record_fire_state(1.0, FireIndex(5), 52.0);
        // closer to fire 2 by health, but 5 is already mapped to 1
        rec.record_fire_state(2.0, FireIndex(5), 25.0);

        rec.playback(1.0, &mut world);
        rec.playback(2.0, &mut world);
        assert_eq!(health(&world, fires[1]), 25.0);
        assert_eq!(health(&world, fires[2]), 20.0);
    }

    #[test]
    fn rewind_forgets_remaps_but_keeps_log() {
        let (mut world, _) = world_with_fires(&[80.0, 50.0, 20.0]);
        let mut rec = FireRecording::new(ActorSlot::Firefighter, "fires");
        rec.record_fire_state(1.0, FireIndex(5), 52.0);
        rec.playback(1.0, &mut world);
        rec.rewind();
        assert_eq!(rec.remaps().count(), 0);
        assert_eq!(rec.event_count(), 1);
        assert_eq!(rec.cursor(), crate::task_events::INITIAL_CURSOR);
    }

    #[test]
    fn remap_failure_without_fires() {
        let (mut world, _) = world_with_fires(&[]);
        let mut rec = FireRecording::new(ActorSlot::Firefighter, "fires");
        rec.record_fire_state(1.0, FireIndex(0), 10.0);
        let report = rec.playback(1.0, &mut world);
        assert!(report.skipped[0].to_string().contains("<none>"));
    }

    #[test]
    fn extinguisher_toggles_follow_log() {
        let (mut world, _) = world_with_fires(&[80.0]);
        let ext = world
            .spawn(Extinguisher::new("fires", ActorSlot::Firefighter))
            .id();
        let mut rec = FireRecording::new(ActorSlot::Firefighter, "fires");
        rec.bind_extinguisher(ext);
        rec.record_extinguisher_state(0.5, true);
        rec.record_fire_state(1.0, FireIndex(0), 60.0);
        rec.record_extinguisher_state(1.5, false);

        rec.playback(1.0, &mut world);
        assert!(world.get::<Extinguisher>(ext).unwrap().active);
        rec.playback(2.0, &mut world);
        assert!(!world.get::<Extinguisher>(ext).unwrap().active);
    }

    #[test]
    fn unbound_extinguisher_is_skipped() {
        let (mut world, _) = world_with_fires(&[]);
        let mut rec = FireRecording::new(ActorSlot::Firefighter, "fires");
        rec.record_extinguisher_state(0.5, true);
        let report = rec.playback(1.0, &mut world);
        assert_eq!(
            report.skipped,
            vec![ReplayAnomaly::Missing(SceneObject::Extinguisher(TaskId::from("fires")))]
        );
    }

    #[test]
    fn record_event_routes_both_families() {
        let mut rec = FireRecording::new(ActorSlot::Firefighter, "fires");
        assert!(rec.record_event(DomainEvent::ExtinguisherActivation(
            ExtinguisherActivationEvent {
                timestamp: 0.1,
                active: true
            }
        )));
        assert!(rec.record_event(DomainEvent::FireState(FireStateEvent {
            timestamp: 0.2,
            fire: FireIndex(0),
            health: 40.0
        })));
        assert!(!rec.record_event(DomainEvent::LeverPull(crate::task_events::LeverPullEvent {
            timestamp: 0.3,
            lever: crate::scene::LeverIndex(0)
        })));
        assert_eq!(rec.event_count(), 2);
    }
}
