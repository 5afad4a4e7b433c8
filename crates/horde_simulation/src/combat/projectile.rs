//! Projectiles: bullets (segment sweep) and throwables (ballistic arc)
//!
//! Architecture:
//! - `ProjectileWorld` reserves projectile and fire zone storage up front
//! - Bullets sweep `position → position + velocity·dt` each tick; obstacles
//!   stop them, agents before the obstacle are hit nearest first
//! - Each projectile carries an inline set of agents it already hit
//! - Throwables fall under gravity and detonate on ground contact or fuse expiry

use bevy::prelude::*;
use rand::Rng;

use crate::agent::{planar_dist_sq, AgentId};
use crate::combat::damage::{deal_damage, is_high_impact, Hit};
use crate::combat::impact::{detonate, FireZone};
use crate::combat::weapon_stats::{Delivery, StatusPayload, WeaponId, WeaponStats};
use crate::config::SimulationConfig;
use crate::events::{EffectKind, EffectSink, HordeEvent, NoiseKind, SoundId};
use crate::lifecycle::AgentPool;
use crate::spatial::obstacle::segment_circle;
use crate::spatial::{AgentEntry, SpatialIndex};

/// Agents tracked per projectile; a bullet that fills it stops.
pub const MAX_TRACKED_HITS: usize = 16;

/// Extra reach when pulling sweep candidates from the index (agents move
/// after the index is rebuilt).
const SWEEP_SLACK: f32 = 2.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProjectileKind {
    Bullet,
    Throwable,
}

/// Inline set of already-hit agents
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HitSet {
    ids: [AgentId; MAX_TRACKED_HITS],
    len: usize,
}

impl Default for HitSet {
    fn default() -> Self {
        Self {
            ids: [AgentId::new(u32::MAX, 0); MAX_TRACKED_HITS],
            len: 0,
        }
    }
}

impl HitSet {
    pub fn contains(&self, id: AgentId) -> bool {
        self.ids[..self.len].contains(&id)
    }

    /// False when the set is full.
    pub fn insert(&mut self, id: AgentId) -> bool {
        if self.contains(id) {
            return true;
        }
        if self.len == MAX_TRACKED_HITS {
            return false;
        }
        self.ids[self.len] = id;
        self.len += 1;
        true
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Projectile {
    pub kind: ProjectileKind,
    pub weapon: WeaponId,
    pub position: Vec3,
    pub velocity: Vec3,
    pub origin: Vec3,
    /// Remaining damage (decays under piercing)
    pub damage: f32,
    /// Seconds left (fuse for throwables)
    pub lifetime: f32,
    pub splash_radius: Option<f32>,
    pub hits: HitSet,
    pub alive: bool,
}

/// Live projectiles and fire zones
#[derive(Resource, Debug)]
pub struct ProjectileWorld {
    pub projectiles: Vec<Projectile>,
    pub fire_zones: Vec<FireZone>,
    projectile_capacity: usize,
    zone_capacity: usize,
}

impl ProjectileWorld {
    pub fn new(projectile_capacity: usize, zone_capacity: usize) -> Self {
        Self {
            projectiles: Vec::with_capacity(projectile_capacity),
            fire_zones: Vec::with_capacity(zone_capacity),
            projectile_capacity,
            zone_capacity,
        }
    }

    pub fn projectile_capacity(&self) -> usize {
        self.projectile_capacity
    }

    pub fn zone_capacity(&self) -> usize {
        self.zone_capacity
    }

    pub fn is_empty(&self) -> bool {
        self.projectiles.is_empty() && self.fire_zones.is_empty()
    }
}

/// Caller-owned buffers for combat queries
#[derive(Debug, Default)]
pub struct CombatScratch {
    pub agents: Vec<AgentEntry>,
    pub obstacles: Vec<u32>,
    pub candidates: Vec<(f32, AgentId)>,
}

/// Rotate a planar direction around +Y.
fn rotate_yaw(direction: Vec3, angle: f32) -> Vec3 {
    let (sin, cos) = angle.sin_cos();
    Vec3::new(
        direction.x * cos + direction.z * sin,
        direction.y,
        -direction.x * sin + direction.z * cos,
    )
}

/// Spawn the projectiles of one trigger pull. Returns how many were spawned.
///
/// Bullet weapons spawn `pellets` bullets with seeded yaw spread and make a
/// gunshot noise; throwables spawn a single arc.
pub fn fire<R: Rng, S: EffectSink>(
    world: &mut ProjectileWorld,
    weapon: &WeaponStats,
    origin: Vec3,
    direction: Vec3,
    rng: &mut R,
    sink: &mut S,
) -> usize {
    let Some(aim) = Vec3::new(direction.x, 0.0, direction.z).try_normalize() else {
        crate::log_warning(&format!("Fire request for {} without a planar direction", weapon.id.name()));
        return 0;
    };

    let mut spawned = 0;
    match weapon.delivery {
        Delivery::Bullet => {
            for _ in 0..weapon.pellets.max(1) {
                if world.projectiles.len() >= world.projectile_capacity {
                    crate::log_warning(&format!(
                        "Projectile capacity {} reached, dropping {} pellets",
                        world.projectile_capacity,
                        weapon.pellets as usize - spawned
                    ));
                    break;
                }
                let offset = if weapon.spread > 0.0 {
                    rng.gen_range(-weapon.spread..=weapon.spread)
                } else {
                    0.0
                };
                world.projectiles.push(Projectile {
                    kind: ProjectileKind::Bullet,
                    weapon: weapon.id,
                    position: origin,
                    velocity: rotate_yaw(aim, offset) * weapon.projectile_speed,
                    origin,
                    damage: weapon.base_damage,
                    lifetime: weapon.lifetime,
                    splash_radius: None,
                    hits: HitSet::default(),
                    alive: true,
                });
                spawned += 1;
            }
            if spawned > 0 {
                sink.emit(HordeEvent::Sound { id: SoundId::WeaponFire(weapon.id) });
                sink.emit(HordeEvent::Noise {
                    position: origin,
                    radius: weapon.hearing_range,
                    kind: NoiseKind::Gunshot,
                });
            }
        }
        Delivery::Throwable(throwable) => {
            if world.projectiles.len() >= world.projectile_capacity {
                crate::log_warning(&format!(
                    "Projectile capacity {} reached, dropping {}",
                    world.projectile_capacity,
                    weapon.id.name()
                ));
                return 0;
            }
            world.projectiles.push(Projectile {
                kind: ProjectileKind::Throwable,
                weapon: weapon.id,
                position: origin,
                velocity: aim * throwable.throw_speed + Vec3::Y * throwable.throw_lift,
                origin,
                damage: weapon.base_damage,
                lifetime: throwable.fuse,
                splash_radius: Some(throwable.radius),
                hits: HitSet::default(),
                alive: true,
            });
            sink.emit(HordeEvent::Sound { id: SoundId::WeaponFire(weapon.id) });
            spawned = 1;
        }
    }

    spawned
}

/// Advance every projectile one tick. Returns the total reported damage.
#[allow(clippy::too_many_arguments)]
pub fn update_projectiles<S: EffectSink>(
    world: &mut ProjectileWorld,
    pool: &mut AgentPool,
    index: &mut SpatialIndex,
    config: &SimulationConfig,
    now: f32,
    dt: f32,
    scratch: &mut CombatScratch,
    sink: &mut S,
) -> f32 {
    let mut total = 0.0;

    for i in 0..world.projectiles.len() {
        let mut projectile = world.projectiles[i];
        if !projectile.alive {
            continue;
        }
        let weapon = config.weapons.get(projectile.weapon);

        match (projectile.kind, weapon.delivery) {
            (ProjectileKind::Throwable, Delivery::Throwable(throwable)) => {
                projectile.velocity.y -= config.combat.throwable_gravity * dt;
                projectile.position += projectile.velocity * dt;
                projectile.lifetime -= dt;

                let ground = config.locomotion.ground_level;
                if projectile.position.y <= ground || projectile.lifetime <= 0.0 {
                    projectile.position.y = projectile.position.y.max(ground);
                    projectile.alive = false;
                    total += detonate(
                        &throwable,
                        weapon,
                        projectile.position,
                        pool,
                        index,
                        &mut world.fire_zones,
                        world.zone_capacity,
                        now,
                        &mut scratch.agents,
                        sink,
                    );
                }
            }
            _ => {
                total += sweep_bullet(&mut projectile, weapon, pool, index, config, now, dt, scratch, sink);
            }
        }

        world.projectiles[i] = projectile;
    }

    world.projectiles.retain(|projectile| projectile.alive);
    total
}

/// Move a bullet one tick along its segment, resolving hits in order.
#[allow(clippy::too_many_arguments)]
fn sweep_bullet<S: EffectSink>(
    projectile: &mut Projectile,
    weapon: &WeaponStats,
    pool: &mut AgentPool,
    index: &mut SpatialIndex,
    config: &SimulationConfig,
    now: f32,
    dt: f32,
    scratch: &mut CombatScratch,
    sink: &mut S,
) -> f32 {
    let from = projectile.position;
    let to = from + projectile.velocity * dt;
    let mid = (from + to) * 0.5;
    let half = Vec2::new(to.x - from.x, to.z - from.z).length() * 0.5;

    let mut t_obstacle = f32::INFINITY;
    index.query_obstacles(mid, half, &mut scratch.obstacles);
    for &obstacle_index in &scratch.obstacles {
        if let Some(t) = index.obstacle(obstacle_index).and_then(|o| o.segment_hit(from, to)) {
            t_obstacle = t_obstacle.min(t);
        }
    }

    index.query_agents(mid, half + SWEEP_SLACK, &mut scratch.agents);
    scratch.candidates.clear();
    let a = Vec2::new(from.x, from.z);
    let b = Vec2::new(to.x, to.z);
    for entry in &scratch.agents {
        let Some(agent) = pool.get(entry.id) else {
            continue;
        };
        if !agent.is_targetable() || projectile.hits.contains(entry.id) {
            continue;
        }
        let center = Vec2::new(agent.position.x, agent.position.z);
        if let Some(t) = segment_circle(a, b, center, agent.hit_radius()) {
            if t <= t_obstacle {
                scratch.candidates.push((t, entry.id));
            }
        }
    }
    scratch
        .candidates
        .sort_unstable_by(|x, y| x.0.total_cmp(&y.0).then(x.1.slot.cmp(&y.1.slot)));

    let direction = Vec3::new(projectile.velocity.x, 0.0, projectile.velocity.z).normalize_or_zero();
    let mut total = 0.0;

    for &(t, id) in &scratch.candidates {
        let Some(agent) = pool.get_mut(id) else {
            continue;
        };
        if agent.is_protected(now) {
            continue;
        }
        if !projectile.hits.insert(id) {
            projectile.alive = false;
            break;
        }

        let hit_point = from.lerp(to, t);
        let distance = planar_dist_sq(hit_point, projectile.origin).sqrt();
        let hit = Hit {
            amount: projectile.damage,
            cause: weapon.cause,
            high_impact: is_high_impact(weapon, &config.combat, distance, projectile.damage),
            direction,
        };

        if let Some(reported) = deal_damage(agent, &hit, now, sink) {
            total += reported;
            agent.status.slow = agent.status.slow.max(config.combat.hit_slow_duration);
            match weapon.status {
                StatusPayload::None => {}
                StatusPayload::Stun(seconds) => agent.status.stun = agent.status.stun.max(seconds),
                StatusPayload::Burn(seconds) => agent.status.burning = agent.status.burning.max(seconds),
            }
            agent.knockback += direction * weapon.knockback;
            sink.emit(HordeEvent::VisualEffect {
                position: hit_point,
                kind: EffectKind::Blood,
                count: 1,
            });
        }

        match weapon.pierce {
            Some(pierce) => {
                projectile.damage *= pierce.decay;
                if projectile.damage < pierce.floor {
                    projectile.alive = false;
                    break;
                }
            }
            None => {
                projectile.alive = false;
                break;
            }
        }
    }

    if !projectile.alive {
        return total;
    }

    if t_obstacle <= 1.0 {
        projectile.alive = false;
        sink.emit(HordeEvent::VisualEffect {
            position: from.lerp(to, t_obstacle),
            kind: EffectKind::BulletImpact,
            count: 1,
        });
        sink.emit(HordeEvent::Sound { id: SoundId::BulletImpact });
        return total;
    }

    projectile.position = to;
    projectile.lifetime -= dt;
    if projectile.lifetime <= 0.0 {
        projectile.alive = false;
    }
    total
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_hit_set_is_bounded() {
        let mut set = HitSet::default();
        for slot in 0..MAX_TRACKED_HITS as u32 {
            assert!(set.insert(AgentId::new(slot, 0)));
        }
        assert!(set.insert(AgentId::new(3, 0)), "re-inserting a member is fine");
        assert!(!set.insert(AgentId::new(99, 0)));
        assert_eq!(set.len(), MAX_TRACKED_HITS);
        assert!(!set.contains(AgentId::new(3, 1)), "generation matters");
    }

    #[test]
    fn test_fire_spawns_pellets_and_gunshot_noise() {
        let mut world = ProjectileWorld::new(32, 4);
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let mut events = Vec::new();

        let spawned = fire(&mut world, &WeaponStats::SHOTGUN, Vec3::ZERO, Vec3::Z, &mut rng, &mut events);

        assert_eq!(spawned, 8);
        assert_eq!(world.projectiles.len(), 8);
        for pellet in &world.projectiles {
            let angle = pellet.velocity.x.atan2(pellet.velocity.z).abs();
            assert!(angle <= 0.09 + 1e-5, "pellet outside spread: {}", angle);
            assert!((pellet.velocity.length() - 70.0).abs() < 1e-3);
        }
        assert!(events.contains(&HordeEvent::Noise {
            position: Vec3::ZERO,
            radius: 40.0,
            kind: NoiseKind::Gunshot,
        }));
    }

    #[test]
    fn test_fire_respects_projectile_capacity() {
        let mut world = ProjectileWorld::new(5, 4);
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let mut events: Vec<HordeEvent> = Vec::new();

        assert_eq!(fire(&mut world, &WeaponStats::SHOTGUN, Vec3::ZERO, Vec3::X, &mut rng, &mut events), 5);
        assert_eq!(fire(&mut world, &WeaponStats::PISTOL, Vec3::ZERO, Vec3::X, &mut rng, &mut events), 0);
        assert_eq!(world.projectiles.len(), 5);
    }

    #[test]
    fn test_fire_without_direction_is_ignored() {
        let mut world = ProjectileWorld::new(8, 4);
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let mut events: Vec<HordeEvent> = Vec::new();
        assert_eq!(fire(&mut world, &WeaponStats::PISTOL, Vec3::ZERO, Vec3::Y, &mut rng, &mut events), 0);
        assert!(events.is_empty());
    }

    #[test]
    fn test_throwable_arc() {
        let mut world = ProjectileWorld::new(8, 4);
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let mut events: Vec<HordeEvent> = Vec::new();
        fire(&mut world, &WeaponStats::GRENADE, Vec3::new(0.0, 1.5, 0.0), Vec3::X, &mut rng, &mut events);

        let grenade = world.projectiles[0];
        assert_eq!(grenade.kind, ProjectileKind::Throwable);
        assert_eq!(grenade.splash_radius, Some(10.0));
        assert_eq!(grenade.lifetime, 2.0);
        assert!(grenade.velocity.y > 0.0);
    }
}
