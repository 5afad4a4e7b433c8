//! Headless horde session
//!
//! Запускает Bevy App без рендера: spawns a few waves around a stationary
//! player who fires a rotating mix of weapons, then prints kill stats.
//! Optional first argument: path to a JSON `SimulationConfig`.

use std::time::Duration;

use bevy::prelude::*;
use bevy::time::TimeUpdateStrategy;

use horde_simulation::{
    create_headless_app_with_config, log_error, AgentPool, ArchetypeKind, FireRequest, KillStats, Obstacle,
    SimClock, SimulationConfig, SpatialIndex, SpawnRequest, WeaponId,
};

const TICKS: u32 = 3600;
const WAVE_EVERY: u32 = 600;

fn main() {
    let seed = 42;
    println!("Starting horde headless simulation (seed: {})", seed);

    let config = match std::env::args().nth(1) {
        Some(path) => SimulationConfig::from_json_file(&path).unwrap_or_else(|err| {
            log_error(&format!("Could not load {}: {}; using defaults", path, err));
            SimulationConfig::default()
        }),
        None => SimulationConfig::default(),
    };

    let mut app = create_headless_app_with_config(seed, config);
    app.insert_resource(TimeUpdateStrategy::ManualDuration(Duration::from_secs_f64(1.0 / 60.0)));
    // First update only initializes time
    app.update();

    {
        let mut index = app.world_mut().resource_mut::<SpatialIndex>();
        index.insert_obstacle(Obstacle::sphere(Vec3::new(6.0, 0.0, 6.0), 1.5));
        index.insert_obstacle(Obstacle::oriented_box(Vec3::new(-8.0, 0.0, 4.0), Vec2::new(3.0, 0.5), 0.4));
    }

    let weapons = [WeaponId::Shotgun, WeaponId::Revolver, WeaponId::Rifle, WeaponId::Grenade, WeaponId::Molotov];
    let mut wave = 0;

    for tick in 0..TICKS {
        if tick % WAVE_EVERY == 0 {
            wave += 1;
            spawn_wave(&mut app, wave);
        }

        if tick % 20 == 0 {
            let angle = tick as f32 * 0.05;
            let weapon = weapons[(tick / 20) as usize % weapons.len()];
            app.world_mut().send_event(FireRequest {
                weapon,
                origin: Vec3::new(0.0, 1.5, 0.0),
                direction: Vec3::new(angle.sin(), 0.0, angle.cos()),
            });
        }

        app.update();

        if tick % 600 == 0 {
            let world = app.world();
            let clock = world.resource::<SimClock>();
            let stats = world.resource::<KillStats>();
            let population = world.resource::<AgentPool>().len();
            println!(
                "Tick {} (t={:.1}s): {} agents, {} kills, {:.0} damage",
                tick, clock.now, population, stats.total_kills, stats.total_damage
            );
        }
    }

    let stats = app.world().resource::<KillStats>();
    for kind in ArchetypeKind::ALL {
        println!("  {:>8}: {}", kind.name(), stats.kills_of(kind));
    }
    println!(
        "Simulation complete! score {}, xp {}, peak population {}",
        stats.total_score, stats.total_xp, stats.peak_population
    );
}

fn spawn_wave(app: &mut App, wave: u32) {
    let count = 8 + wave * 4;
    for i in 0..count {
        let angle = i as f32 / count as f32 * std::f32::consts::TAU;
        let distance = 18.0 + (i % 3) as f32 * 4.0;
        let archetype = match i % 10 {
            0 => ArchetypeKind::Brute,
            1 | 2 => ArchetypeKind::Runner,
            3 => ArchetypeKind::Bomber,
            _ => ArchetypeKind::Walker,
        };
        app.world_mut().send_event(SpawnRequest {
            archetype,
            position: Vec3::new(angle.sin() * distance, 0.0, angle.cos() * distance),
            wave: Some(wave),
        });
    }
    if wave % 3 == 0 {
        app.world_mut().send_event(SpawnRequest {
            archetype: ArchetypeKind::Boss,
            position: Vec3::new(0.0, 0.0, 30.0),
            wave: Some(wave),
        });
    }
}
