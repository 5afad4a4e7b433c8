//! Perception: sight check against the player, hearing via the noise board
//!
//! Architecture:
//! - `NoiseBoard` is a fixed-capacity ring of recent noise events (gunshots,
//!   explosions, footsteps); emitting into a full ring overwrites the oldest
//! - `sense_all` only writes `Agent::senses` and `Agent::memory`
//! - Sight wins over hearing; no occlusion

use bevy::prelude::*;

use crate::agent::{planar_dist_sq, Agent};
use crate::clock::SimClock;
use crate::config::PerceptionConfig;
use crate::events::NoiseKind;
use crate::lifecycle::AgentPool;
use crate::player::PlayerState;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NoiseEvent {
    pub position: Vec3,
    pub radius: f32,
    pub time: f32,
    pub kind: NoiseKind,
}

#[derive(Resource, Debug, Clone)]
pub struct NoiseBoard {
    slots: Vec<Option<NoiseEvent>>,
    /// Next slot to write
    head: usize,
    expiry: f32,
}

impl NoiseBoard {
    pub fn new(capacity: usize, expiry: f32) -> Self {
        Self {
            slots: vec![None; capacity.max(1)],
            head: 0,
            expiry,
        }
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub fn emit(&mut self, position: Vec3, radius: f32, kind: NoiseKind, now: f32) {
        self.slots[self.head] = Some(NoiseEvent { position, radius, time: now, kind });
        self.head = (self.head + 1) % self.slots.len();
    }

    fn is_live(&self, event: &NoiseEvent, now: f32) -> bool {
        now - event.time <= self.expiry
    }

    /// Free slots whose events are past the expiry window.
    pub fn expire(&mut self, now: f32) {
        let expiry = self.expiry;
        for slot in self.slots.iter_mut() {
            if matches!(slot, Some(event) if now - event.time > expiry) {
                *slot = None;
            }
        }
    }

    pub fn active_count(&self, now: f32) -> usize {
        self.slots
            .iter()
            .flatten()
            .filter(|event| self.is_live(event, now))
            .count()
    }

    /// Most recent live noise audible at `position` (ties: lowest ring index).
    pub fn latest_heard(&self, position: Vec3, now: f32) -> Option<&NoiseEvent> {
        let mut best: Option<&NoiseEvent> = None;
        for event in self.slots.iter().flatten() {
            if !self.is_live(event, now) {
                continue;
            }
            if planar_dist_sq(position, event.position) >= event.radius * event.radius {
                continue;
            }
            if best.map_or(true, |current| event.time > current.time) {
                best = Some(event);
            }
        }
        best
    }

    pub fn clear(&mut self) {
        self.slots.iter_mut().for_each(|slot| *slot = None);
        self.head = 0;
    }
}

/// Sense one agent. Returns true when the agent saw or heard something.
pub fn sense(
    agent: &mut Agent,
    player: &PlayerState,
    noise: &NoiseBoard,
    config: &PerceptionConfig,
    now: f32,
) -> bool {
    agent.senses.can_see = false;
    agent.senses.heard = false;

    let range_sq = config.vision_range * config.vision_range;
    if player.alive && planar_dist_sq(agent.position, player.position) < range_sq {
        agent.senses.can_see = true;
        agent.memory.last_seen_pos = Some(player.position);
        agent.memory.last_seen_time = now;
        return true;
    }

    if let Some(event) = noise.latest_heard(agent.position, now) {
        agent.senses.heard = true;
        agent.memory.last_seen_pos = Some(event.position);
        agent.memory.last_seen_time = now;
        return true;
    }

    false
}

/// Perception pass over every living agent in slot order.
pub fn sense_all(
    pool: &mut AgentPool,
    player: &PlayerState,
    noise: &NoiseBoard,
    config: &PerceptionConfig,
    now: f32,
) {
    for agent in pool.iter_mut() {
        if !agent.is_alive() {
            continue;
        }
        sense(agent, player, noise, config, now);
    }
}

/// System: drop noise events that can no longer be heard
pub fn expire_noise(mut board: ResMut<NoiseBoard>, clock: Res<SimClock>) {
    board.expire(clock.now);
}
