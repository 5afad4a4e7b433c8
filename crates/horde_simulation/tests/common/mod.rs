//! Shared helpers for app-level tests
#![allow(dead_code)]

use std::time::Duration;

use bevy::prelude::*;
use bevy::time::TimeUpdateStrategy;
use horde_simulation::{create_headless_app_with_config, HordeEvent, SimulationConfig, SpawnRequest};

pub const DT: f32 = 1.0 / 60.0;

/// Headless app stepping exactly one fixed tick per `update()`.
pub fn horde_app(seed: u64, config: SimulationConfig) -> App {
    let mut app = create_headless_app_with_config(seed, config);
    app.insert_resource(TimeUpdateStrategy::ManualDuration(Duration::from_secs_f64(1.0 / 60.0)));
    // Первый update: Time стартует с нулевой delta
    app.update();
    app
}

/// Run `ticks` updates and collect every `HordeEvent` they produced.
pub fn run(app: &mut App, ticks: usize) -> Vec<HordeEvent> {
    let mut collected = Vec::new();
    for _ in 0..ticks {
        app.update();
        collected.extend(app.world_mut().resource_mut::<Events<HordeEvent>>().drain());
    }
    collected
}

pub fn spawn(app: &mut App, request: SpawnRequest) {
    app.world_mut().send_event(request);
}
