//! Combat module: weapons, projectiles, area impacts, status effects
//!
//! Architecture:
//! - `weapon_stats`: data-driven weapon table (bullets + throwables)
//! - `projectile`: fire requests → projectiles, bullet sweeps, throwable arcs
//! - `impact`: explosions, fire zones, flashes
//! - `damage`: single-hit resolution (protection, clamped reporting, last hit)
//! - `status`: burning/afterburn DoT, stun/blind/slow decay
//!
//! Смерть здесь не обрабатывается: hp ≤ 0 only marks the agent, the death
//! phase promotes it on the same tick.

use bevy::prelude::*;

use crate::clock::SimClock;
use crate::config::SimulationConfig;
use crate::events::{FireRequest, HordeEvent, NoiseRelay};
use crate::lifecycle::{AgentPool, KillStats};
use crate::perception::NoiseBoard;
use crate::spatial::SpatialIndex;
use crate::{DeterministicRng, HordeSet};

pub mod damage;
pub mod impact;
pub mod projectile;
pub mod status;
pub mod weapon_stats;

#[cfg(test)]
mod damage_tests;

pub use damage::{apply_damage, deal_damage, Hit};
pub use impact::FireZone;
pub use projectile::{fire, update_projectiles, CombatScratch, Projectile, ProjectileKind, ProjectileWorld};
pub use weapon_stats::{WeaponId, WeaponStats, WeaponTable};

/// Combat Plugin
///
/// Регистрирует combat системы в FixedUpdate (`HordeSet::Combat`).
///
/// Порядок выполнения:
/// 1. process_fire_requests: FireRequest → projectiles (+ gunshot noise)
/// 2. advance_projectiles: bullet sweeps, throwable arcs, detonations
/// 3. burn_fire_zones: fire zone damage ticks
/// 4. tick_status_effects: burning/afterburn, lock and slow decay
pub struct CombatPlugin;

impl Plugin for CombatPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(
            FixedUpdate,
            (
                process_fire_requests,
                advance_projectiles,
                burn_fire_zones,
                tick_status_effects,
            )
                .chain()
                .in_set(HordeSet::Combat),
        );
    }
}

/// System: spawn projectiles for player fire requests
pub fn process_fire_requests(
    mut requests: EventReader<FireRequest>,
    mut world: ResMut<ProjectileWorld>,
    mut noise: ResMut<NoiseBoard>,
    mut rng: ResMut<DeterministicRng>,
    config: Res<SimulationConfig>,
    clock: Res<SimClock>,
    mut events: EventWriter<HordeEvent>,
) {
    let mut sink = NoiseRelay::new(&mut events, &mut noise, clock.now);
    for request in requests.read() {
        let weapon = config.weapons.get(request.weapon);
        fire(&mut world, weapon, request.origin, request.direction, &mut rng.rng, &mut sink);
    }
}

/// System: move projectiles and resolve their hits
#[allow(clippy::too_many_arguments)]
pub fn advance_projectiles(
    mut world: ResMut<ProjectileWorld>,
    mut pool: ResMut<AgentPool>,
    mut index: ResMut<SpatialIndex>,
    mut noise: ResMut<NoiseBoard>,
    mut stats: ResMut<KillStats>,
    config: Res<SimulationConfig>,
    clock: Res<SimClock>,
    mut scratch: Local<CombatScratch>,
    mut events: EventWriter<HordeEvent>,
) {
    if world.projectiles.is_empty() {
        return;
    }
    let mut sink = NoiseRelay::new(&mut events, &mut noise, clock.now);
    stats.total_damage += update_projectiles(
        &mut world,
        &mut pool,
        &mut index,
        &config,
        clock.now,
        clock.delta,
        &mut scratch,
        &mut sink,
    );
}

/// System: fire zone damage ticks
pub fn burn_fire_zones(
    mut world: ResMut<ProjectileWorld>,
    mut pool: ResMut<AgentPool>,
    index: Res<SpatialIndex>,
    mut stats: ResMut<KillStats>,
    config: Res<SimulationConfig>,
    clock: Res<SimClock>,
    mut scratch: Local<CombatScratch>,
    mut events: EventWriter<HordeEvent>,
) {
    if world.fire_zones.is_empty() {
        return;
    }
    stats.total_damage += impact::update_fire_zones(
        &mut world.fire_zones,
        &mut pool,
        &index,
        &config,
        clock.now,
        clock.delta,
        &mut scratch.agents,
        &mut events,
    );
}

/// System: status effect ticks
pub fn tick_status_effects(
    mut pool: ResMut<AgentPool>,
    mut stats: ResMut<KillStats>,
    config: Res<SimulationConfig>,
    clock: Res<SimClock>,
    mut events: EventWriter<HordeEvent>,
) {
    stats.total_damage += status::tick_status(
        &mut pool,
        &config.combat,
        &config.pool,
        clock.now,
        clock.delta,
        &mut events,
    );
}
