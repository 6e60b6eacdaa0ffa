//! Ghost pose playback: single-pass interpolation over a finished sequence.

use std::sync::Arc;

use bevy::prelude::*;

use crate::pose::{Pose, PoseSample, SampleSequence};

/// Drives a passive actor through a recorded `SampleSequence`.
///
/// The index pointer only moves forward, so each tick costs amortized O(1)
/// regardless of how long the sequence is.
#[derive(Component, Debug, Clone, Default)]
pub struct PosePlayer {
    sequence: Arc<SampleSequence>,
    play_time: f32,
    /// Index of the sample at or before `play_time`.
    current: usize,
    smoothing_rate: Option<f32>,
}

impl PosePlayer {
    pub fn new(sequence: Arc<SampleSequence>, smoothing_rate: Option<f32>) -> Self {
        let mut player = Self {
            smoothing_rate,
            ..Default::default()
        };
        player.initialize(sequence);
        player
    }

    /// Bind to a finished sequence and rewind.
    pub fn initialize(&mut self, sequence: Arc<SampleSequence>) {
        self.sequence = sequence;
        self.reset();
    }

    /// Rewind to play-time 0, index 0.
    pub fn reset(&mut self) {
        self.play_time = 0.0;
        self.current = 0;
    }

    pub fn play_time(&self) -> f32 {
        self.play_time
    }

    pub fn current_index(&self) -> usize {
        self.current
    }

    pub fn sequence(&self) -> &SampleSequence {
        &self.sequence
    }

    /// True once the pointer sits on the last sample. Sequences with fewer
    /// than two samples are finished from the start.
    pub fn finished(&self) -> bool {
        self.sequence.len() <= 1 || self.current >= self.sequence.len() - 1
    }

    /// Fraction of the recorded duration already played, in `[0, 1]`.
    pub fn progress(&self) -> f32 {
        let duration = self.sequence.duration();
        if duration <= 0.0 || self.finished() {
            return 1.0;
        }
        (self.play_time / duration).clamp(0.0, 1.0)
    }

    /// Interpolation fraction between `current` and `current + 1`.
    pub fn fraction(&self) -> f32 {
        let (Some(a), Some(b)) = (
            self.sequence.get(self.current),
            self.sequence.get(self.current + 1),
        ) else {
            return 0.0;
        };
        let span = b.timestamp - a.timestamp;
        if span <= 0.0 {
            return 0.0;
        }
        ((self.play_time - a.timestamp) / span).clamp(0.0, 1.0)
    }

    /// Raw interpolated pose at the current play-time, before smoothing.
    pub fn target_pose(&self) -> Option<Pose> {
        if self.finished() {
            return self.sequence.last().map(PoseSample::pose);
        }
        let a = self.sequence.get(self.current)?;
        let b = self.sequence.get(self.current + 1)?;
        Some(PoseSample::interpolate(a, b, self.fraction()))
    }

    /// Advance play-time by `dt` and return the raw target pose.
    pub fn advance(&mut self, dt: f32) -> Option<Pose> {
        if !self.finished() {
            self.play_time += dt.max(0.0);
            let samples = self.sequence.samples();
            while self.current + 1 < samples.len()
                && samples[self.current + 1].timestamp <= self.play_time
            {
                self.current += 1;
            }
        }
        self.target_pose()
    }

    /// Advance and blend the target into `rendered`.
    ///
    /// With a smoothing rate the rendered pose approaches the target
    /// exponentially; once finished it snaps to the final sample.
    pub fn drive(&mut self, dt: f32, rendered: Pose) -> Option<Pose> {
        let target = self.advance(dt)?;
        if self.finished() {
            return Some(target);
        }
        match self.smoothing_rate {
            Some(rate) if rate > 0.0 => {
                let alpha = 1.0 - (-rate * dt).exp();
                Some(rendered.approach(&target, alpha))
            }
            _ => Some(target),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(position: Vec3, timestamp: f32) -> PoseSample {
        PoseSample::new(
            Pose {
                position,
                ..Default::default()
            },
            timestamp,
        )
    }

    fn l_path() -> Arc<SampleSequence> {
        Arc::new(SampleSequence::from_samples(vec![
            sample(Vec3::new(0.0, 0.0, 0.0), 0.0),
            sample(Vec3::new(10.0, 0.0, 0.0), 1.0),
            sample(Vec3::new(10.0, 0.0, 10.0), 2.0),
        ]))
    }

    #[test]
    fn play_time_zero_is_first_sample() {
        let seq = l_path();
        let player = PosePlayer::new(seq.clone(), None);
        assert_eq!(player.target_pose(), Some(seq.samples()[0].pose()));
        assert!(!player.finished());
    }

    #[test]
    fn midway_between_second_and_third_sample() {
        let mut player = PosePlayer::new(l_path(), None);
        player.advance(1.5);
        assert_eq!(player.current_index(), 1);
        assert!((player.fraction() - 0.5).abs() < 1e-6);
        let pose = player.target_pose().unwrap();
        assert!(pose.position.abs_diff_eq(Vec3::new(10.0, 0.0, 5.0), 1e-5));
    }

    #[test]
    fn finishes_and_snaps_to_last_sample() {
        let seq = l_path();
        let mut player = PosePlayer::new(seq.clone(), Some(10.0));
        for _ in 0..30 {
            player.drive(0.1, Pose::default());
        }
        assert!(player.finished());
        let last = seq.last().unwrap().pose();
        assert_eq!(player.drive(0.1, Pose::default()), Some(last));
        assert_eq!(player.progress(), 1.0);
    }

    #[test]
    fn pointer_only_moves_forward() {
        let mut player = PosePlayer::new(l_path(), None);
        let mut last_index = 0;
        for _ in 0..25 {
            player.advance(0.1);
            assert!(player.current_index() >= last_index);
            last_index = player.current_index();
        }
    }

    #[test]
    fn single_sample_is_constant_and_finished() {
        let seq = Arc::new(SampleSequence::from_samples(vec![sample(Vec3::ONE, 0.3)]));
        let mut player = PosePlayer::new(seq, None);
        assert!(player.finished());
        assert_eq!(player.advance(5.0).unwrap().position, Vec3::ONE);
        assert_eq!(player.play_time(), 0.0);
    }

    #[test]
    fn empty_sequence_yields_no_pose() {
        let mut player = PosePlayer::new(Arc::new(SampleSequence::new()), None);
        assert!(player.finished());
        assert_eq!(player.advance(1.0), None);
    }

    #[test]
    fn reset_rewinds_deterministically() {
        let mut player = PosePlayer::new(l_path(), None);
        player.advance(1.7);
        let before = player.target_pose();
        player.reset();
        assert_eq!(player.play_time(), 0.0);
        assert_eq!(player.current_index(), 0);
        player.advance(1.7);
        assert_eq!(player.target_pose(), before);
    }

    #[test]
    fn equal_timestamps_give_zero_fraction() {
        let seq = Arc::new(SampleSequence::from_samples(vec![
            sample(Vec3::ZERO, 0.0),
            sample(Vec3::X, 0.0),
            sample(Vec3::Y, 1.0),
        ]));
        let player = PosePlayer::new(seq, None);
        // pointer at 0, next shares its timestamp
        assert_eq!(player.fraction(), 0.0);
    }

    #[test]
    fn smoothing_lags_behind_target() {
        let mut player = PosePlayer::new(l_path(), Some(5.0));
        let rendered = player.drive(0.5, Pose::default()).unwrap();
        // raw target is x = 5; smoothed pose is somewhere in between
        assert!(rendered.position.x > 0.0 && rendered.position.x < 5.0);
    }
}
