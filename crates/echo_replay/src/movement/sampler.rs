//! Delta-based pose sampler for the live actor.
//!
//! The first observation is always kept. After that a sample is emitted only
//! when the minimum interval has passed AND the pose moved enough along at
//! least one axis (position, orientation, blend). Compression is greedy and
//! forward-only: skipped poses are never revisited.

use bevy::prelude::*;

use crate::config::SamplerConfig;
use crate::pose::{Pose, PoseSample, SampleSequence};

/// Attached to the live actor for the duration of its turn.
#[derive(Component, Debug, Clone, Default)]
pub struct MovementSampler {
    config: SamplerConfig,
    /// Seconds since the actor became live.
    elapsed: f32,
    sequence: SampleSequence,
    last_emitted: Option<PoseSample>,
}

impl MovementSampler {
    pub fn new(config: SamplerConfig) -> Self {
        Self {
            config,
            ..Default::default()
        }
    }

    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    pub fn sample_count(&self) -> usize {
        self.sequence.len()
    }

    /// Advance the actor clock by `dt` and consider `pose` for sampling.
    ///
    /// Returns `true` when a sample was emitted.
    pub fn advance(&mut self, dt: f32, pose: Pose) -> bool {
        self.elapsed += dt.max(0.0);

        let Some(last) = self.last_emitted else {
            self.emit(pose);
            return true;
        };

        let since_last = self.elapsed - last.timestamp;
        // Timestamps must stay strictly increasing even with a zero interval.
        if since_last <= 0.0 || since_last < self.config.min_interval {
            return false;
        }

        if !self.moved_enough(&last, &pose) {
            return false;
        }

        self.emit(pose);
        true
    }

    fn moved_enough(&self, last: &PoseSample, pose: &Pose) -> bool {
        let position_delta = last.position.distance(pose.position);
        let rotation_delta = last.orientation.angle_between(pose.orientation).to_degrees();
        let blend_delta = (pose.blend - last.blend).abs().max_element();

        position_delta >= self.config.min_position_delta
            || rotation_delta >= self.config.min_rotation_delta_deg
            || blend_delta >= self.config.min_blend_delta
    }

    fn emit(&mut self, pose: Pose) {
        let sample = PoseSample::new(pose, self.elapsed);
        self.sequence.push(sample);
        self.last_emitted = Some(sample);
    }

    /// End the turn: the sampler is consumed and its sequence returned.
    pub fn finish(self) -> SampleSequence {
        self.sequence
    }
}
