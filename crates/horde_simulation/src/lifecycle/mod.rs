//! Entity lifecycle: the agent pool
//!
//! Architecture:
//! - One backing `Vec` of slots, reserved up front to the population cap
//! - Freed slots go on a LIFO free list and are recycled with a DNA reset
//! - Each release bumps the slot generation so stale `AgentId`s miss
//! - Rewards are finalized only when a `Dead` agent is reclaimed

use bevy::prelude::*;

use crate::agent::{Agent, AgentId, ArchetypeKind, DeathState};
use crate::clock::SimClock;
use crate::config::SimulationConfig;
use crate::events::{EffectSink, HordeEvent, SpawnRequest};

pub mod stats;

pub use stats::KillStats;

#[derive(Debug, Clone)]
struct Slot {
    generation: u32,
    live: bool,
    agent: Agent,
}

#[derive(Resource, Debug)]
pub struct AgentPool {
    slots: Vec<Slot>,
    free: Vec<u32>,
    capacity: usize,
    live: usize,
}

impl AgentPool {
    pub fn new(capacity: usize) -> Self {
        Self {
            slots: Vec::with_capacity(capacity),
            free: Vec::with_capacity(capacity),
            capacity,
            live: 0,
        }
    }

    /// Hard population cap
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Current population
    pub fn len(&self) -> usize {
        self.live
    }

    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    /// Slots ever allocated (live or free)
    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    /// Spawn an agent of `kind`; `None` when the pool is full.
    pub fn spawn(
        &mut self,
        config: &SimulationConfig,
        kind: ArchetypeKind,
        position: Vec3,
        now: f32,
        wave: Option<u32>,
    ) -> Option<AgentId> {
        if self.live >= self.capacity {
            return None;
        }

        let archetype = config.archetypes.get(kind);
        let protection = config.pool.spawn_protection;

        let slot_index = match self.free.pop() {
            Some(index) => index as usize,
            None => {
                self.slots.push(Slot {
                    generation: 0,
                    live: false,
                    agent: Agent::from_archetype(AgentId::new(0, 0), archetype, position, now, 0.0, None),
                });
                self.slots.len() - 1
            }
        };

        let slot = &mut self.slots[slot_index];
        let id = AgentId::new(slot_index as u32, slot.generation);
        slot.agent = Agent::from_archetype(id, archetype, position, now, protection, wave);
        slot.agent.timers.idle = config.ai.idle_time[0];
        slot.live = true;
        self.live += 1;

        Some(id)
    }

    /// Return a slot to the free list. Stale or already-free ids are ignored.
    pub fn release(&mut self, id: AgentId) -> bool {
        let Some(slot) = self.slots.get_mut(id.slot as usize) else {
            return false;
        };
        if !slot.live || slot.generation != id.generation {
            return false;
        }

        slot.live = false;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(id.slot);
        self.live -= 1;
        true
    }

    pub fn contains(&self, id: AgentId) -> bool {
        self.get(id).is_some()
    }

    pub fn get(&self, id: AgentId) -> Option<&Agent> {
        self.slots
            .get(id.slot as usize)
            .filter(|slot| slot.live && slot.generation == id.generation)
            .map(|slot| &slot.agent)
    }

    pub fn get_mut(&mut self, id: AgentId) -> Option<&mut Agent> {
        self.slots
            .get_mut(id.slot as usize)
            .filter(|slot| slot.live && slot.generation == id.generation)
            .map(|slot| &mut slot.agent)
    }

    /// Live agent in `slot`, whatever its generation
    pub fn slot(&self, slot: usize) -> Option<&Agent> {
        self.slots.get(slot).filter(|s| s.live).map(|s| &s.agent)
    }

    pub fn slot_mut(&mut self, slot: usize) -> Option<&mut Agent> {
        self.slots.get_mut(slot).filter(|s| s.live).map(|s| &mut s.agent)
    }

    /// Live agents in slot order
    pub fn iter(&self) -> impl Iterator<Item = &Agent> {
        self.slots.iter().filter(|slot| slot.live).map(|slot| &slot.agent)
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Agent> {
        self.slots
            .iter_mut()
            .filter(|slot| slot.live)
            .map(|slot| &mut slot.agent)
    }
}

/// Spawn from a request, keeping stats and logs. Over-cap requests are dropped.
pub fn handle_spawn(
    pool: &mut AgentPool,
    stats: &mut KillStats,
    config: &SimulationConfig,
    request: &SpawnRequest,
    now: f32,
) -> Option<AgentId> {
    match pool.spawn(config, request.archetype, request.position, now, request.wave) {
        Some(id) => {
            stats.spawned += 1;
            stats.record_population(pool.len());
            if crate::logger::enabled(crate::LogLevel::Debug) {
                crate::log(&format!(
                    "Spawned {} as {:?} at {:?} (population {})",
                    request.archetype.name(),
                    id,
                    request.position,
                    pool.len()
                ));
            }
            Some(id)
        }
        None => {
            stats.dropped_spawns += 1;
            None
        }
    }
}

/// Finalize rewards for every `Dead` agent and free its slot.
///
/// Returns the number of reclaimed agents.
pub fn reclaim_dead<S: EffectSink>(pool: &mut AgentPool, stats: &mut KillStats, sink: &mut S) -> usize {
    let mut reclaimed = 0;

    for index in 0..pool.slot_count() {
        let Some(agent) = pool.slot(index) else {
            continue;
        };
        if agent.death_state != DeathState::Dead {
            continue;
        }

        let id = agent.id;
        let kind = agent.archetype;
        let position = agent.position;
        let (score, xp, wave) = (agent.score, agent.xp, agent.wave);
        let boss_id = agent.is_boss.then_some(agent.external_id);

        stats.record_kill(kind, score, xp, wave.is_some());
        sink.emit(HordeEvent::KillReward {
            agent: id,
            archetype: kind,
            score,
            xp,
            wave,
        });

        if let Some(boss_id) = boss_id {
            stats.bosses_defeated += 1;
            sink.emit(HordeEvent::LootDrop { position, boss_id });
            sink.emit(HordeEvent::BossDefeated { boss_id });
            crate::log_info(&format!("👑 Boss {} defeated at {:?}", boss_id, position));
        }

        pool.release(id);
        reclaimed += 1;
    }

    reclaimed
}

/// System: turn spawn requests into agents
pub fn process_spawn_requests(
    mut requests: EventReader<SpawnRequest>,
    mut pool: ResMut<AgentPool>,
    mut stats: ResMut<KillStats>,
    config: Res<SimulationConfig>,
    clock: Res<SimClock>,
) {
    spawn_batch(&mut pool, &mut stats, &config, requests.read(), clock.now);
}

/// Apply one tick's spawn requests; returns how many were dropped.
///
/// Drops at the population cap are reported with one warning per batch.
pub fn spawn_batch<'a>(
    pool: &mut AgentPool,
    stats: &mut KillStats,
    config: &SimulationConfig,
    requests: impl IntoIterator<Item = &'a SpawnRequest>,
    now: f32,
) -> u32 {
    let mut dropped = 0;
    for request in requests {
        if handle_spawn(pool, stats, config, request, now).is_none() {
            dropped += 1;
        }
    }
    if dropped > 0 {
        crate::log_warning(&format!(
            "Population cap {} reached, dropped {} spawn request(s)",
            pool.capacity(),
            dropped
        ));
    }
    dropped
}

/// System: reclaim finished corpses and pay out rewards
pub fn reclaim_dead_agents(
    mut pool: ResMut<AgentPool>,
    mut stats: ResMut<KillStats>,
    mut events: EventWriter<HordeEvent>,
) {
    let reclaimed = reclaim_dead(&mut pool, &mut stats, &mut events);
    if reclaimed > 0 && crate::logger::enabled(crate::LogLevel::Debug) {
        crate::log(&format!("♻️ Reclaimed {} agents (population {})", reclaimed, pool.len()));
    }
}
