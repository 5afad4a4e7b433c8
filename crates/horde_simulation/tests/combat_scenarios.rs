//! Combat scenarios through the full plugin stack
//!
//! Проверяем:
//! - Self-destruct blast only hurts a player inside the blast radius
//! - Grenade kills a pack, rewards are paid on reclaim
//! - Molotov fire zone burns a pack down to ash
//! - Boss kill → loot drop + BossDefeated

mod common;

use bevy::prelude::*;
use common::{horde_app, run, spawn, DT};
use horde_simulation::events::{NoiseKind, PlayerHitCause};
use horde_simulation::*;

fn player_hits(events: &[HordeEvent]) -> Vec<(f32, PlayerHitCause)> {
    events
        .iter()
        .filter_map(|e| match e {
            HordeEvent::PlayerHit { damage, cause, .. } => Some((*damage, *cause)),
            _ => None,
        })
        .collect()
}

fn fire_at(app: &mut App, weapon: WeaponId, direction: Vec3) {
    app.world_mut().send_event(FireRequest {
        weapon,
        origin: Vec3::new(0.0, 1.5, 0.0),
        direction,
    });
}

#[test]
fn test_bomber_blast_denied_when_player_escapes() {
    let mut app = horde_app(42, SimulationConfig::default());
    spawn(
        &mut app,
        SpawnRequest {
            archetype: ArchetypeKind::Bomber,
            position: Vec3::new(0.0, 0.0, 3.0),
            wave: None,
        },
    );

    // Spawn + perception + AI: bomber arms its fuse
    let mut events = run(&mut app, 2);
    {
        let pool = app.world().resource::<AgentPool>();
        let bomber = pool.iter().next().expect("bomber spawned");
        assert_eq!(bomber.ai_state, AIState::Exploding);
    }

    // Player sprints away before the fuse runs out
    app.world_mut().resource_mut::<PlayerState>().position = Vec3::new(0.0, 0.0, -50.0);
    events.extend(run(&mut app, 120));

    assert!(player_hits(&events).is_empty(), "player outside blast radius took damage");
    let stats = app.world().resource::<KillStats>();
    assert_eq!(stats.kills_of(ArchetypeKind::Bomber), 1);
    assert!(app.world().resource::<AgentPool>().is_empty());
    assert!(events
        .iter()
        .any(|e| matches!(e, HordeEvent::Noise { kind: NoiseKind::Explosion, .. })));
}

#[test]
fn test_bomber_blast_hits_player_in_range() {
    let mut app = horde_app(42, SimulationConfig::default());
    spawn(
        &mut app,
        SpawnRequest {
            archetype: ArchetypeKind::Bomber,
            position: Vec3::new(0.0, 0.0, 3.0),
            wave: None,
        },
    );

    let events = run(&mut app, 120);
    let hits = player_hits(&events);
    assert_eq!(hits, vec![(35.0, PlayerHitCause::Explosion)]);
    assert_eq!(app.world().resource::<KillStats>().kills_of(ArchetypeKind::Bomber), 1);
}

#[test]
fn test_grenade_clears_a_pack() {
    let mut app = horde_app(7, SimulationConfig::default());
    for x in [-2.0, 0.0, 2.0] {
        spawn(
            &mut app,
            SpawnRequest {
                archetype: ArchetypeKind::Walker,
                position: Vec3::new(x, 0.0, 13.0),
                wave: Some(1),
            },
        );
    }
    run(&mut app, 20);

    fire_at(&mut app, WeaponId::Grenade, Vec3::Z);
    let events = run(&mut app, 90);

    let stats = app.world().resource::<KillStats>();
    assert_eq!(stats.kills_of(ArchetypeKind::Walker), 3);
    assert_eq!(stats.horde_kills, 3);
    assert_eq!(stats.total_score, 3 * u64::from(agent::Archetype::WALKER.score));
    assert!((stats.total_damage - 120.0).abs() < 1e-3, "damage {}", stats.total_damage);

    let rewards = events
        .iter()
        .filter(|e| matches!(e, HordeEvent::KillReward { wave: Some(1), .. }))
        .count();
    assert_eq!(rewards, 3);
    assert!(app.world().resource::<ProjectileWorld>().projectiles.is_empty());
}

#[test]
fn test_fire_zone_burns_pack_to_ash() {
    let mut app = horde_app(9, SimulationConfig::default());
    for x in [-3.0, 3.0] {
        spawn(
            &mut app,
            SpawnRequest {
                archetype: ArchetypeKind::Runner,
                position: Vec3::new(x, 0.0, 20.0),
                wave: None,
            },
        );
    }
    run(&mut app, 20);

    fire_at(&mut app, WeaponId::Molotov, Vec3::Z);
    let events = run(&mut app, (4.0 / DT) as usize);

    let ash = events
        .iter()
        .filter(|e| matches!(e, HordeEvent::AshStart { .. }))
        .count();
    assert_eq!(ash, 2);
    assert!(events
        .iter()
        .any(|e| matches!(e, HordeEvent::Decal { material: events::DecalMaterial::Ash, .. })));
    assert_eq!(app.world().resource::<KillStats>().kills_of(ArchetypeKind::Runner), 2);
}

#[test]
fn test_boss_kill_drops_loot() {
    let mut config = SimulationConfig::default();
    if let Some(boss) = config.archetypes.get_mut(ArchetypeKind::Boss) {
        boss.max_hp = 50.0;
    }
    let mut app = horde_app(3, config);
    spawn(
        &mut app,
        SpawnRequest {
            archetype: ArchetypeKind::Boss,
            position: Vec3::new(0.0, 0.0, 12.0),
            wave: Some(3),
        },
    );
    run(&mut app, 30);

    fire_at(&mut app, WeaponId::Revolver, Vec3::Z);
    let events = run(&mut app, 30);

    assert!(events.contains(&HordeEvent::BossDefeated { boss_id: 900 }));
    assert!(events
        .iter()
        .any(|e| matches!(e, HordeEvent::LootDrop { boss_id: 900, .. })));
    assert!(events
        .iter()
        .any(|e| matches!(e, HordeEvent::DamageDealt { is_boss: true, .. })));

    let stats = app.world().resource::<KillStats>();
    assert_eq!(stats.bosses_defeated, 1);
    assert_eq!(stats.kills_of(ArchetypeKind::Boss), 1);
}
