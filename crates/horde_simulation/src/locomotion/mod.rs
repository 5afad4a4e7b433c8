//! Locomotion & collision resolution
//!
//! Architecture:
//! - Intent → planar step (speed × slow factor), facing by yaw only
//! - Separation from neighbours within `separation_radius` (inverse-distance)
//! - Knockback: `inertia = dt / max(min_mass, mass)`, gravity on the vertical
//!   component, friction scaled down by mass (heavy agents slide longer), ground clamp
//! - Obstacle push-out last, so nothing ends a tick inside a collider
//!
//! Kinematic only: no physics engine, no pathfinding.

use bevy::prelude::*;

use crate::agent::{yaw_towards, AIState, Agent, MoveIntent};
use crate::clock::SimClock;
use crate::config::{LocomotionConfig, SimulationConfig};
use crate::lifecycle::AgentPool;
use crate::player::PlayerState;
use crate::spatial::{AgentEntry, SpatialIndex};
use crate::HordeSet;

const GOLDEN_ANGLE: f32 = 2.399_963;
/// Separation weight for neighbours sharing a position
const STACKED_PUSH: f32 = 4.0;

/// Caller-owned query buffers (capacity reused between ticks)
#[derive(Debug, Default)]
pub struct LocomotionScratch {
    pub neighbors: Vec<AgentEntry>,
    pub obstacles: Vec<u32>,
}

pub struct LocomotionPlugin;

impl Plugin for LocomotionPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(FixedUpdate, move_agents.in_set(HordeSet::Locomotion));
    }
}

/// System: apply movement intents, separation, knockback and obstacle push-out
pub fn move_agents(
    mut pool: ResMut<AgentPool>,
    mut index: ResMut<SpatialIndex>,
    player: Res<PlayerState>,
    config: Res<SimulationConfig>,
    clock: Res<SimClock>,
    mut scratch: Local<LocomotionScratch>,
) {
    move_all(
        &mut pool,
        &mut index,
        &player,
        &config.locomotion,
        clock.delta,
        &mut scratch,
    );
}

pub fn move_all(
    pool: &mut AgentPool,
    index: &mut SpatialIndex,
    player: &PlayerState,
    config: &LocomotionConfig,
    dt: f32,
    scratch: &mut LocomotionScratch,
) {
    if dt <= 0.0 {
        return;
    }
    for agent in pool.iter_mut() {
        if agent.is_alive() {
            move_agent(agent, index, player, config, dt, scratch);
        }
    }
}

pub fn move_agent(
    agent: &mut Agent,
    index: &mut SpatialIndex,
    player: &PlayerState,
    config: &LocomotionConfig,
    dt: f32,
    scratch: &mut LocomotionScratch,
) {
    let mut delta = Vec3::ZERO;
    let start = agent.position;

    if agent.ai_state == AIState::Biting {
        if let MoveIntent::Pinned { offset } = agent.intent {
            let anchor = player.position + offset;
            delta.x = anchor.x - agent.position.x;
            delta.z = anchor.z - agent.position.z;
            if let Some(yaw) = yaw_towards(-offset) {
                agent.yaw = yaw;
            }
        }
    } else if !agent.is_locked() {
        delta += steer(agent, config, dt);
        delta += separation(agent, index, config, dt, &mut scratch.neighbors);
    }

    delta += integrate_knockback(agent, config, dt);

    let mut candidate = agent.position + delta;
    let reach = agent.hit_radius() + config.obstacle_margin;
    index.query_obstacles(candidate, reach, &mut scratch.obstacles);
    for &obstacle_index in &scratch.obstacles {
        if let Some(obstacle) = index.obstacle(obstacle_index) {
            if let Some(resolved) = obstacle.push_out(candidate, reach) {
                candidate = resolved;
            }
        }
    }

    agent.position = candidate;
    agent.velocity = (candidate - start) / dt;
}

/// Planar step toward the intent target; also updates yaw.
fn steer(agent: &mut Agent, config: &LocomotionConfig, dt: f32) -> Vec3 {
    match agent.intent {
        MoveIntent::MoveTo { target, speed_factor } => {
            let to = Vec3::new(target.x - agent.position.x, 0.0, target.z - agent.position.z);
            let dist = to.length();
            if dist < 1e-3 {
                return Vec3::ZERO;
            }
            if let Some(yaw) = yaw_towards(to) {
                agent.yaw = yaw;
            }
            let slow = if agent.status.slow > 0.0 { config.slow_factor } else { 1.0 };
            let step = (agent.speed * speed_factor * slow * dt).min(dist);
            to / dist * step
        }
        MoveIntent::Turn { rate } => {
            agent.yaw = (agent.yaw + rate * dt).rem_euclid(std::f32::consts::TAU);
            Vec3::ZERO
        }
        MoveIntent::Face { target } => {
            if let Some(yaw) = yaw_towards(target - agent.position) {
                agent.yaw = yaw;
            }
            Vec3::ZERO
        }
        MoveIntent::Hold | MoveIntent::Pinned { .. } => Vec3::ZERO,
    }
}

/// Inverse-distance push away from neighbours, scaled by dt.
fn separation(
    agent: &Agent,
    index: &SpatialIndex,
    config: &LocomotionConfig,
    dt: f32,
    neighbors: &mut Vec<AgentEntry>,
) -> Vec3 {
    let radius = config.separation_radius;
    index.query_agents(agent.position, radius, neighbors);

    let mut push = Vec3::ZERO;
    for neighbor in neighbors.iter() {
        if neighbor.id == agent.id {
            continue;
        }
        let away = Vec3::new(
            agent.position.x - neighbor.position.x,
            0.0,
            agent.position.z - neighbor.position.z,
        );
        let dist = away.length();
        if dist >= radius {
            continue;
        }
        if dist < 1e-4 {
            push += stacked_push(agent.id.slot, neighbor.id.slot);
            continue;
        }
        push += away / (dist * dist);
    }

    push * config.separation_strength * dt
}

/// Push for two agents on the same spot: opposite directions per pair, picked by slot order.
fn stacked_push(slot: u32, other: u32) -> Vec3 {
    let (low, high) = if slot < other { (slot, other) } else { (other, slot) };
    let angle = (low.wrapping_mul(31).wrapping_add(high)) as f32 * GOLDEN_ANGLE;
    let direction = Vec3::new(angle.sin(), 0.0, angle.cos());
    let sign = if slot < other { 1.0 } else { -1.0 };
    direction * sign * STACKED_PUSH
}

/// Knockback displacement for this tick; decays the stored knockback.
fn integrate_knockback(agent: &mut Agent, config: &LocomotionConfig, dt: f32) -> Vec3 {
    if agent.knockback == Vec3::ZERO && agent.position.y <= config.ground_level {
        return Vec3::ZERO;
    }

    let mass = agent.mass().max(config.min_mass);
    let inertia = dt / mass;
    let mut displacement = Vec3::new(agent.knockback.x * inertia, 0.0, agent.knockback.z * inertia);

    let airborne = agent.position.y > config.ground_level || agent.knockback.y > 0.0;
    if airborne {
        agent.knockback.y -= config.gravity * dt;
        displacement.y = agent.knockback.y * inertia;
    }
    if agent.position.y + displacement.y <= config.ground_level {
        displacement.y = config.ground_level - agent.position.y;
        agent.knockback.y = agent.knockback.y.max(0.0);
    }

    let decay = (1.0 - config.friction * dt / mass).max(0.0);
    agent.knockback.x *= decay;
    agent.knockback.z *= decay;

    if agent.knockback.length() < config.knockback_epsilon {
        agent.knockback = Vec3::ZERO;
    }

    displacement
}
