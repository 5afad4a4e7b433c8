//! Simulation clock
//!
//! All periodic effects (bite ticks, fire zones, sparks, noise expiry) run on
//! accumulated simulation time, never wall-clock time.

use bevy::prelude::*;

#[derive(Resource, Debug, Clone, Copy, Default, PartialEq)]
pub struct SimClock {
    /// Seconds of simulated time
    pub now: f32,
    pub tick: u64,
    /// Delta of the current tick
    pub delta: f32,
}

impl SimClock {
    pub fn advance(&mut self, delta: f32) {
        self.delta = delta;
        self.now += delta;
        self.tick += 1;
    }
}

/// System: advance the simulation clock by the fixed timestep
pub fn advance_clock(time: Res<Time<Fixed>>, mut clock: ResMut<SimClock>) {
    clock.advance(time.delta_secs());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clock_accumulates() {
        let mut clock = SimClock::default();
        clock.advance(0.25);
        clock.advance(0.25);
        assert_eq!(clock.now, 0.5);
        assert_eq!(clock.tick, 2);
        assert_eq!(clock.delta, 0.25);
    }
}
