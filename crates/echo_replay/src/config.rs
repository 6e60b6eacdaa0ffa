//! Tunables for movement sampling, ghost playback and task replay.
//!
//! The constants are the shipped defaults; `ReplayConfig` carries the live
//! values so a scene can tighten or relax sampling without a rebuild.

use bevy::prelude::*;

/// Minimum seconds between two emitted pose samples (20 samples/s).
pub const MIN_SAMPLE_INTERVAL: f32 = 0.05;
/// Minimum positional change (world units) that justifies a new sample.
pub const MIN_POSITION_DELTA: f32 = 0.01;
/// Minimum orientation change in degrees that justifies a new sample.
pub const MIN_ROTATION_DELTA_DEG: f32 = 0.5;
/// Minimum change of either animation blend parameter.
pub const MIN_BLEND_DELTA: f32 = 0.01;

/// Rate of the exponential approach toward the interpolated ghost pose.
pub const GHOST_SMOOTHING_RATE: f32 = 10.0;

/// Fire health changes smaller than this are not logged.
pub const FIRE_HEALTH_EPSILON: f32 = 0.1;
/// Largest health gap accepted when remapping a recorded fire onto a live one.
///
/// Heuristic: two unmatched fires with similar target health can still bind
/// to the wrong live fire.
pub const FIRE_REMAP_TOLERANCE: f32 = 20.0;

/// Thresholds for the delta-based movement sampler.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SamplerConfig {
    pub min_interval: f32,
    pub min_position_delta: f32,
    pub min_rotation_delta_deg: f32,
    pub min_blend_delta: f32,
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self {
            min_interval: MIN_SAMPLE_INTERVAL,
            min_position_delta: MIN_POSITION_DELTA,
            min_rotation_delta_deg: MIN_ROTATION_DELTA_DEG,
            min_blend_delta: MIN_BLEND_DELTA,
        }
    }
}

/// Session-wide replay configuration.
#[derive(Resource, Debug, Clone, PartialEq)]
pub struct ReplayConfig {
    /// Sampling thresholds applied to every new live actor.
    pub sampler: SamplerConfig,
    /// `None` snaps ghosts straight onto the interpolated pose.
    pub ghost_smoothing_rate: Option<f32>,
    /// Log `RecordingStats` whenever a turn's sequence is handed off.
    pub log_recording_stats: bool,
}

impl Default for ReplayConfig {
    fn default() -> Self {
        Self {
            sampler: SamplerConfig::default(),
            ghost_smoothing_rate: Some(GHOST_SMOOTHING_RATE),
            log_recording_stats: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_uses_shipped_constants() {
        let config = ReplayConfig::default();
        assert_eq!(config.sampler.min_interval, MIN_SAMPLE_INTERVAL);
        assert_eq!(config.sampler.min_rotation_delta_deg, MIN_ROTATION_DELTA_DEG);
        assert_eq!(config.ghost_smoothing_rate, Some(GHOST_SMOOTHING_RATE));
        assert!(!config.log_recording_stats);
    }
}
