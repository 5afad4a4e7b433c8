//! Тесты детерминизма
//!
//! Одинаковый seed + одинаковые входы → идентичный пул, статистика и события.

mod common;

use bevy::prelude::*;
use common::{horde_app, run};
use horde_simulation::*;

const TICK_COUNT: usize = 900;

/// Scripted session: two waves, a stationary shooter cycling weapons.
fn run_session(seed: u64) -> String {
    let mut app = horde_app(seed, SimulationConfig::default());
    app.world_mut()
        .resource_mut::<SpatialIndex>()
        .insert_obstacle(Obstacle::sphere(Vec3::new(4.0, 0.0, 8.0), 1.5));

    let weapons = [WeaponId::Shotgun, WeaponId::Rifle, WeaponId::Grenade, WeaponId::Tesla];
    let mut events = Vec::new();

    for tick in 0..TICK_COUNT {
        if tick % 300 == 0 {
            for i in 0..16 {
                let angle = i as f32 * 0.39;
                let archetype = ArchetypeKind::ALL[i % ArchetypeKind::COUNT];
                app.world_mut().send_event(SpawnRequest {
                    archetype,
                    position: Vec3::new(angle.sin() * 22.0, 0.0, angle.cos() * 22.0),
                    wave: Some(tick as u32 / 300),
                });
            }
        }
        if tick % 15 == 0 {
            let angle = tick as f32 * 0.07;
            app.world_mut().send_event(FireRequest {
                weapon: weapons[(tick / 15) % weapons.len()],
                origin: Vec3::new(0.0, 1.5, 0.0),
                direction: Vec3::new(angle.sin(), 0.0, angle.cos()),
            });
        }
        events.extend(run(&mut app, 1));
    }

    snapshot(&app, &events)
}

/// Debug-форматированный снепшот (agents in slot order)
fn snapshot(app: &App, events: &[HordeEvent]) -> String {
    let world = app.world();
    let mut out = String::new();
    for agent in world.resource::<AgentPool>().iter() {
        out.push_str(&format!("{:?}\n", agent));
    }
    out.push_str(&format!("{:?}\n", world.resource::<KillStats>()));
    out.push_str(&format!("{:?}\n", events));
    out
}

#[test]
fn test_determinism_same_seed() {
    const SEED: u64 = 12345;

    let snapshot1 = run_session(SEED);
    let snapshot2 = run_session(SEED);

    assert_eq!(
        snapshot1, snapshot2,
        "Симуляция с одинаковым seed ({}) дала разные результаты!",
        SEED
    );
}

#[test]
fn test_session_actually_fights() {
    let mut app = horde_app(42, SimulationConfig::default());
    for i in 0..6 {
        app.world_mut().send_event(SpawnRequest {
            archetype: ArchetypeKind::Walker,
            position: Vec3::new(i as f32 * 2.0 - 5.0, 0.0, 10.0),
            wave: None,
        });
    }
    run(&mut app, 20);
    for _ in 0..10 {
        app.world_mut().send_event(FireRequest {
            weapon: WeaponId::Rifle,
            origin: Vec3::new(0.0, 1.5, 0.0),
            direction: Vec3::Z,
        });
        run(&mut app, 6);
    }

    assert!(app.world().resource::<KillStats>().total_damage > 0.0);
}

#[test]
fn test_wander_depends_on_seed() {
    let wander_targets = |seed: u64| -> Vec<Vec3> {
        let mut app = horde_app(seed, SimulationConfig::default());
        for i in 0..4 {
            app.world_mut().send_event(SpawnRequest {
                archetype: ArchetypeKind::Walker,
                position: Vec3::new(80.0 + i as f32 * 5.0, 0.0, 80.0),
                wave: None,
            });
        }
        run(&mut app, 150);
        app.world()
            .resource::<AgentPool>()
            .iter()
            .map(|agent| agent.wander_target)
            .collect()
    };

    assert_eq!(wander_targets(1), wander_targets(1));
    assert_ne!(wander_targets(1), wander_targets(2));
}
