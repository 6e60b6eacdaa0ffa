//! Criterion benchmarks for the per-frame replay paths.
//!
//! Run with: cargo bench -p echo_replay --bench replay_bench

use std::sync::Arc;

use bevy::prelude::*;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use echo_replay::actor::ActorSlot;
use echo_replay::config::SamplerConfig;
use echo_replay::movement::{MovementSampler, PosePlayer};
use echo_replay::pose::{Pose, SampleSequence};
use echo_replay::scene::{FireIndex, FireSource, SceneIndex};
use echo_replay::task_events::{FireRecording, TaskEventRecording};

const FRAME: f32 = 1.0 / 60.0;

/// Record a ten-minute turn of an actor walking a slow circle.
fn recorded_turn(frames: usize) -> SampleSequence {
    let mut sampler = MovementSampler::new(SamplerConfig::default());
    for i in 0..frames {
        let angle = i as f32 * 0.01;
        let pose = Pose {
            position: Vec3::new(angle.cos() * 20.0, 0.0, angle.sin() * 20.0),
            orientation: Quat::from_rotation_y(angle),
            blend: Vec2::new(0.0, 1.0),
        };
        sampler.advance(FRAME, pose);
    }
    sampler.finish()
}

fn bench_sampler(c: &mut Criterion) {
    c.bench_function("sampler_ten_minutes", |b| {
        b.iter(|| black_box(recorded_turn(36_000)).len())
    });
}

fn bench_ghost_playback(c: &mut Criterion) {
    let sequence = Arc::new(recorded_turn(36_000));
    c.bench_function("ghost_drive_full_sequence", |b| {
        b.iter(|| {
            let mut player = PosePlayer::new(Arc::clone(&sequence), Some(10.0));
            let mut rendered = player.target_pose().unwrap_or_default();
            while !player.finished() {
                if let Some(pose) = player.drive(FRAME, rendered) {
                    rendered = pose;
                }
            }
            black_box(rendered)
        })
    });
}

fn bench_fire_remap(c: &mut Criterion) {
    let mut group = c.benchmark_group("fire_remap");
    for fire_count in [8u32, 64, 256] {
        group.bench_with_input(
            BenchmarkId::from_parameter(fire_count),
            &fire_count,
            |b, &fire_count| {
                b.iter(|| {
                    let mut world = World::new();
                    let mut index = SceneIndex::default();
                    for i in 0..fire_count {
                        let fire = FireIndex(i + fire_count);
                        let e = world
                            .spawn(FireSource::new(fire, "fires", i as f32 * 3.0))
                            .id();
                        index.insert_fire(fire, e);
                    }
                    world.insert_resource(index);

                    let mut recording = FireRecording::new(ActorSlot::Firefighter, "fires");
                    for i in 0..fire_count {
                        recording.record_fire_state(1.0, FireIndex(i), i as f32 * 3.0 + 1.0);
                    }
                    black_box(recording.playback(1.0, &mut world).applied)
                })
            },
        );
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_sampler,
    bench_ghost_playback,
    bench_fire_remap
);
criterion_main!(benches);
