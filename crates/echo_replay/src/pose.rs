//! Pose snapshots and the per-turn sample sequence they form.

use std::fmt;

use bevy::prelude::*;
use serde::Serialize;

/// Animation blend-tree parameters driven alongside the transform
/// (typically strafe and forward speed).
#[derive(Component, Debug, Clone, Copy, PartialEq, Default)]
pub struct AnimationBlend(pub Vec2);

/// An untimed pose: what gets written back onto an actor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pose {
    pub position: Vec3,
    pub orientation: Quat,
    pub blend: Vec2,
}

impl Default for Pose {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            orientation: Quat::IDENTITY,
            blend: Vec2::ZERO,
        }
    }
}

impl Pose {
    pub fn from_transform(transform: &Transform, blend: Vec2) -> Self {
        Self {
            position: transform.translation,
            orientation: transform.rotation,
            blend,
        }
    }

    /// Move a fraction `alpha` of the way toward `target`.
    pub fn approach(&self, target: &Pose, alpha: f32) -> Pose {
        let alpha = alpha.clamp(0.0, 1.0);
        Pose {
            position: self.position.lerp(target.position, alpha),
            orientation: self.orientation.slerp(target.orientation, alpha),
            blend: self.blend.lerp(target.blend, alpha),
        }
    }

    pub fn write_to(&self, transform: &mut Transform, blend: &mut AnimationBlend) {
        transform.translation = self.position;
        transform.rotation = self.orientation;
        blend.0 = self.blend;
    }
}

/// One captured pose. Immutable once captured.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PoseSample {
    pub position: Vec3,
    pub orientation: Quat,
    /// Seconds since the actor became live.
    pub timestamp: f32,
    pub blend: Vec2,
}

impl PoseSample {
    pub fn new(pose: Pose, timestamp: f32) -> Self {
        Self {
            position: pose.position,
            orientation: pose.orientation,
            timestamp,
            blend: pose.blend,
        }
    }

    pub fn pose(&self) -> Pose {
        Pose {
            position: self.position,
            orientation: self.orientation,
            blend: self.blend,
        }
    }

    /// Interpolate between two samples: lerp for position and blend, slerp
    /// for orientation. The endpoints are returned untouched so `t == 0`
    /// reproduces `a` bit for bit.
    pub fn interpolate(a: &PoseSample, b: &PoseSample, t: f32) -> Pose {
        if t <= 0.0 {
            return a.pose();
        }
        if t >= 1.0 {
            return b.pose();
        }
        Pose {
            position: a.position.lerp(b.position, t),
            orientation: a.orientation.slerp(b.orientation, t),
            blend: a.blend.lerp(b.blend, t),
        }
    }
}

/// Ordered pose history for one actor's turn.
///
/// Append-only while the turn is live; handed to the `SessionRegistry` by
/// value at turn end and shared read-only from then on.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SampleSequence {
    samples: Vec<PoseSample>,
}

impl SampleSequence {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a sequence from already-ordered samples.
    pub fn from_samples(samples: Vec<PoseSample>) -> Self {
        Self { samples }
    }

    pub(crate) fn push(&mut self, sample: PoseSample) {
        self.samples.push(sample);
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&PoseSample> {
        self.samples.get(index)
    }

    pub fn first(&self) -> Option<&PoseSample> {
        self.samples.first()
    }

    pub fn last(&self) -> Option<&PoseSample> {
        self.samples.last()
    }

    pub fn samples(&self) -> &[PoseSample] {
        &self.samples
    }

    /// Timestamp of the final sample (0 for an empty sequence).
    pub fn duration(&self) -> f32 {
        self.last().map_or(0.0, |s| s.timestamp)
    }

    /// Check that timestamps are strictly increasing.
    pub fn validate(&self) -> Result<(), String> {
        for (i, window) in self.samples.windows(2).enumerate() {
            if window[1].timestamp <= window[0].timestamp {
                return Err(format!(
                    "sample {} at {:.3}s does not follow {:.3}s",
                    i + 1,
                    window[1].timestamp,
                    window[0].timestamp
                ));
            }
        }
        Ok(())
    }

    pub fn stats(&self) -> RecordingStats {
        let duration = self.duration();
        let samples = self.samples.len();
        RecordingStats {
            duration,
            samples,
            avg_rate: if duration > 0.0 {
                samples as f32 / duration
            } else {
                0.0
            },
            approx_bytes: samples * std::mem::size_of::<PoseSample>(),
        }
    }
}

/// Size and density summary of a finished sequence.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RecordingStats {
    pub duration: f32,
    pub samples: usize,
    /// Samples per second over the whole turn.
    pub avg_rate: f32,
    pub approx_bytes: usize,
}

impl fmt::Display for RecordingStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:.2}s, {} samples, {:.1} samples/s, ~{:.2} KB",
            self.duration,
            self.samples,
            self.avg_rate,
            self.approx_bytes as f32 / 1024.0
        )
    }
}
