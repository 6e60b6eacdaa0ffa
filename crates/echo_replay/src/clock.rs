use bevy::prelude::*;

/// Seconds since the current scene instance was loaded. Every task event is
/// stamped with this clock, so it restarts at 0 on each load.
#[derive(Resource, Debug, Clone, Copy, Default, PartialEq)]
pub struct SceneClock {
    elapsed: f32,
}

impl SceneClock {
    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    pub fn advance(&mut self, dt: f32) {
        self.elapsed += dt.max(0.0);
    }

    pub fn reset(&mut self) {
        self.elapsed = 0.0;
    }
}

pub fn advance_scene_clock(time: Res<Time>, mut clock: ResMut<SceneClock>) {
    clock.advance(time.delta_secs());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clock_is_monotonic_until_reset() {
        let mut clock = SceneClock::default();
        clock.advance(0.5);
        clock.advance(-1.0);
        clock.advance(0.25);
        assert_eq!(clock.elapsed(), 0.75);
        clock.reset();
        assert_eq!(clock.elapsed(), 0.0);
    }
}
