//! Area impacts: throwable detonations and fire zones
//!
//! - Explosive: fixed damage, knockback falling off linearly with distance
//! - Incendiary: spawns a `FireZone` that ticks on its own sim-time interval
//! - Flash: blind + stun, no damage
//!
//! Agents are affected when their hit circle overlaps the effect radius.

use bevy::prelude::*;

use crate::agent::{planar_dist_sq, DamageCause};
use crate::combat::damage::{deal_damage, splash_force, Hit};
use crate::combat::weapon_stats::{Payload, ThrowableStats, WeaponStats};
use crate::config::SimulationConfig;
use crate::events::{DecalMaterial, EffectKind, EffectSink, HordeEvent, NoiseKind, SoundId};
use crate::lifecycle::AgentPool;
use crate::spatial::{AgentEntry, SpatialIndex};

/// Slack added to index queries (agents move after the index is rebuilt)
const AREA_SLACK: f32 = 2.0;

/// Burning ground left by an incendiary impact
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FireZone {
    pub position: Vec3,
    pub radius: f32,
    /// Seconds left
    pub lifetime: f32,
    pub tick_damage: f32,
    pub interval: f32,
    /// Sim time accumulated toward the next damage tick
    pub accumulator: f32,
}

impl FireZone {
    /// New zone; the first damage tick lands on the first update.
    pub fn new(position: Vec3, radius: f32, lifetime: f32, tick_damage: f32, interval: f32) -> Self {
        Self {
            position,
            radius,
            lifetime,
            tick_damage,
            interval,
            accumulator: interval,
        }
    }
}

/// Detonate a throwable at `position`. Returns the total reported damage.
#[allow(clippy::too_many_arguments)]
pub fn detonate<S: EffectSink>(
    throwable: &ThrowableStats,
    weapon: &WeaponStats,
    position: Vec3,
    pool: &mut AgentPool,
    index: &SpatialIndex,
    zones: &mut Vec<FireZone>,
    zone_capacity: usize,
    now: f32,
    agents: &mut Vec<AgentEntry>,
    sink: &mut S,
) -> f32 {
    let radius = throwable.radius;
    let mut total = 0.0;

    match throwable.payload {
        Payload::Explosive { damage, min_force, max_force } => {
            index.query_agents(position, radius + AREA_SLACK, agents);
            for entry in agents.iter() {
                let Some(agent) = pool.get_mut(entry.id) else {
                    continue;
                };
                let reach = radius + agent.hit_radius();
                let dist_sq = planar_dist_sq(agent.position, position);
                if dist_sq >= reach * reach {
                    continue;
                }

                let distance = dist_sq.sqrt();
                let direction = Vec3::new(agent.position.x - position.x, 0.0, agent.position.z - position.z)
                    .try_normalize()
                    .unwrap_or(Vec3::Z);
                let hit = Hit {
                    amount: damage,
                    cause: DamageCause::Explosive,
                    high_impact: false,
                    direction,
                };
                if let Some(reported) = deal_damage(agent, &hit, now, sink) {
                    total += reported;
                    let force = splash_force(distance, radius, min_force, max_force);
                    agent.knockback += direction * force + Vec3::Y * (force * 0.25);
                }
            }

            sink.emit(HordeEvent::VisualEffect { position, kind: EffectKind::Explosion, count: 1 });
            sink.emit(HordeEvent::Sound { id: SoundId::Explosion });
            sink.emit(HordeEvent::Decal {
                position,
                scale: radius * 0.3,
                material: DecalMaterial::Scorch,
            });
            sink.emit(HordeEvent::Noise {
                position,
                radius: weapon.hearing_range,
                kind: NoiseKind::Explosion,
            });
        }

        Payload::Incendiary { zone_radius, zone_lifetime, tick_damage, tick_interval } => {
            if zones.len() < zone_capacity {
                zones.push(FireZone::new(position, zone_radius, zone_lifetime, tick_damage, tick_interval));
            } else {
                crate::log_warning(&format!("Fire zone capacity {} reached, impact fizzles", zone_capacity));
            }
            sink.emit(HordeEvent::VisualEffect { position, kind: EffectKind::Fire, count: 1 });
            sink.emit(HordeEvent::Sound { id: SoundId::Ignite });
            sink.emit(HordeEvent::Decal {
                position,
                scale: zone_radius * 0.5,
                material: DecalMaterial::Scorch,
            });
        }

        Payload::Flash { blind, stun } => {
            index.query_agents(position, radius + AREA_SLACK, agents);
            for entry in agents.iter() {
                let Some(agent) = pool.get_mut(entry.id) else {
                    continue;
                };
                if !agent.is_targetable() {
                    continue;
                }
                let reach = radius + agent.hit_radius();
                if planar_dist_sq(agent.position, position) >= reach * reach {
                    continue;
                }
                agent.status.blind = agent.status.blind.max(blind);
                agent.status.stun = agent.status.stun.max(stun);
            }

            sink.emit(HordeEvent::VisualEffect { position, kind: EffectKind::Flash, count: 1 });
            sink.emit(HordeEvent::Sound { id: SoundId::Flashbang });
            sink.emit(HordeEvent::Noise {
                position,
                radius: weapon.hearing_range,
                kind: NoiseKind::Explosion,
            });
        }
    }

    total
}

/// Tick every fire zone. Returns the total reported damage.
#[allow(clippy::too_many_arguments)]
pub fn update_fire_zones<S: EffectSink>(
    zones: &mut Vec<FireZone>,
    pool: &mut AgentPool,
    index: &SpatialIndex,
    config: &SimulationConfig,
    now: f32,
    dt: f32,
    agents: &mut Vec<AgentEntry>,
    sink: &mut S,
) -> f32 {
    let mut total = 0.0;

    for zone in zones.iter_mut() {
        zone.lifetime -= dt;
        zone.accumulator += dt;

        while zone.accumulator >= zone.interval {
            zone.accumulator -= zone.interval;

            index.query_agents(zone.position, zone.radius + AREA_SLACK, agents);
            for entry in agents.iter() {
                let Some(agent) = pool.get_mut(entry.id) else {
                    continue;
                };
                let reach = zone.radius + agent.hit_radius();
                if planar_dist_sq(agent.position, zone.position) >= reach * reach {
                    continue;
                }
                let hit = Hit::new(zone.tick_damage, DamageCause::Incendiary);
                if let Some(reported) = deal_damage(agent, &hit, now, sink) {
                    total += reported;
                    agent.status.burning = agent.status.burning.max(config.combat.fire_zone_burn_refresh);
                }
            }
        }
    }

    zones.retain(|zone| zone.lifetime > 0.0);
    total
}
