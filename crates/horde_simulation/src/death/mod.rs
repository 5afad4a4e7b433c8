//! Death transition machine
//!
//! Architecture:
//! - `promote`: first tick with hp ≤ 0 while `Alive` → one of five branches,
//!   chosen from the last hit (explosive, incendiary/burning, high impact,
//!   electrical, plain shot)
//! - `step`: per-branch kinematic/visual sequence; returns true when done
//! - Completion only marks `Dead`; rewards are paid by the lifecycle phase
//!
//! Monotonic: `Alive → branch → Dead`, enforced by `Agent::advance_death`.

use std::f32::consts::FRAC_PI_2;

use bevy::prelude::*;
use rand::Rng;

use crate::agent::{Agent, DamageCause, DeathState, MoveIntent};
use crate::clock::SimClock;
use crate::config::{DeathConfig, SimulationConfig};
use crate::events::{DecalMaterial, EffectKind, EffectSink, HordeEvent, NoiseKind, NoiseRelay, SoundId};
use crate::lifecycle::AgentPool;
use crate::perception::NoiseBoard;
use crate::{DeterministicRng, HordeSet};

/// Electrocution jitter amplitude
const JITTER: f32 = 0.06;
const SPARKS_PER_BURST: u32 = 3;

pub struct DeathPlugin;

impl Plugin for DeathPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(FixedUpdate, advance_deaths.in_set(HordeSet::Death));
    }
}

/// System: promote freshly killed agents and advance dying ones
pub fn advance_deaths(
    mut pool: ResMut<AgentPool>,
    mut noise: ResMut<NoiseBoard>,
    mut rng: ResMut<DeterministicRng>,
    config: Res<SimulationConfig>,
    clock: Res<SimClock>,
    mut events: EventWriter<HordeEvent>,
) {
    let mut sink = NoiseRelay::new(&mut events, &mut noise, clock.now);
    run_death_phase(&mut pool, &config, clock.delta, &mut rng.rng, &mut sink);
}

/// Death phase for the whole pool. Returns how many agents were promoted.
///
/// A freshly promoted agent starts its sequence on the next tick.
/// Corpses fall under the same gravity as live knockback.
pub fn run_death_phase<R: Rng, S: EffectSink>(
    pool: &mut AgentPool,
    config: &SimulationConfig,
    dt: f32,
    rng: &mut R,
    sink: &mut S,
) -> usize {
    let gravity = config.locomotion.gravity;
    let config = &config.death;
    let mut promoted = 0;
    for agent in pool.iter_mut() {
        if agent.is_alive() {
            if agent.hp <= 0.0 && promote(agent, config, sink) {
                promoted += 1;
            }
        } else if agent.is_dying() && step(agent, config, gravity, dt, rng, sink) {
            agent.advance_death(DeathState::Dead);
        }
    }
    promoted
}

/// Branch for an agent that just died
pub fn classify(agent: &Agent) -> DeathState {
    let Some(hit) = agent.last_hit else {
        return if agent.is_burning() { DeathState::Burning } else { DeathState::Shot };
    };
    match hit.cause {
        DamageCause::Explosive => DeathState::Exploded,
        DamageCause::Incendiary => DeathState::Burning,
        _ if agent.is_burning() => DeathState::Burning,
        _ if hit.high_impact => DeathState::Gibbed,
        DamageCause::Electrical => DeathState::Electrified,
        DamageCause::Ballistic => DeathState::Shot,
    }
}

/// Alive → branch. Snapshots the launch and fires the branch's one-shot effects.
pub fn promote<S: EffectSink>(agent: &mut Agent, config: &DeathConfig, sink: &mut S) -> bool {
    let branch = classify(agent);
    if !agent.advance_death(branch) {
        return false;
    }

    let push = agent
        .last_hit
        .map(|hit| Vec3::new(hit.direction.x, 0.0, hit.direction.z).normalize_or_zero())
        .unwrap_or(Vec3::ZERO);
    let pitch_sign = if push.dot(agent.forward()) >= 0.0 { 1.0 } else { -1.0 };

    agent.death.velocity = push * config.launch_speed + Vec3::Y * config.launch_lift;
    agent.death.elapsed = 0.0;
    agent.death.pitch_target = pitch_sign * FRAC_PI_2;
    agent.death.spark_accum = 0.0;
    agent.death.settled_for = 0.0;
    agent.death.anchor = agent.position;
    agent.intent = MoveIntent::Hold;
    agent.knockback = Vec3::ZERO;
    agent.velocity = Vec3::ZERO;
    agent.visual.bob = 0.0;

    let mass = agent.mass();
    match branch {
        DeathState::Gibbed => {
            agent.visual.visible = false;
            sink.emit(HordeEvent::VisualEffect {
                position: agent.position,
                kind: EffectKind::Gore,
                count: (mass * config.gore_per_mass).ceil() as u32,
            });
            sink.emit(HordeEvent::Decal {
                position: agent.position,
                scale: mass,
                material: DecalMaterial::Blood,
            });
            sink.emit(HordeEvent::Sound { id: SoundId::Gib });
        }
        DeathState::Burning => {
            sink.emit(HordeEvent::AshStart { agent: agent.id });
            sink.emit(HordeEvent::Sound { id: SoundId::Sizzle });
        }
        DeathState::Exploded => {
            agent.visual.visible = false;
            sink.emit(HordeEvent::VisualEffect {
                position: agent.position,
                kind: EffectKind::Debris,
                count: (mass * config.debris_per_mass).ceil() as u32,
            });
            sink.emit(HordeEvent::VisualEffect {
                position: agent.position,
                kind: EffectKind::Explosion,
                count: 1,
            });
            sink.emit(HordeEvent::Sound { id: SoundId::Explosion });
            sink.emit(HordeEvent::Noise {
                position: agent.position,
                radius: config.explosion_noise_radius,
                kind: NoiseKind::Explosion,
            });
            sink.emit(HordeEvent::Decal {
                position: agent.position,
                scale: mass * 1.5,
                material: DecalMaterial::Scorch,
            });
        }
        DeathState::Electrified => {
            sink.emit(HordeEvent::Sound { id: SoundId::Zap });
        }
        _ => {}
    }

    if crate::logger::enabled(crate::LogLevel::Debug) {
        crate::log(&format!(
            "💀 Agent {}#{} ({}) → {:?}",
            agent.id.slot,
            agent.id.generation,
            agent.archetype.name(),
            branch
        ));
    }
    true
}

/// One tick of the branch sequence. Returns true once the sequence is finished.
pub fn step<R: Rng, S: EffectSink>(
    agent: &mut Agent,
    config: &DeathConfig,
    gravity: f32,
    dt: f32,
    rng: &mut R,
    sink: &mut S,
) -> bool {
    agent.death.elapsed += dt;

    match agent.death_state {
        DeathState::Gibbed => agent.death.elapsed >= config.gib_duration,
        DeathState::Exploded => true,
        DeathState::Burning => burn_down(agent, config, sink),
        DeathState::Electrified if agent.death.elapsed < config.electrocute_duration => {
            electrocute(agent, config, dt, rng, sink);
            false
        }
        DeathState::Shot | DeathState::Electrified => fall_over(agent, config, gravity, dt, sink),
        DeathState::Alive | DeathState::Dead => false,
    }
}

fn burn_down<S: EffectSink>(agent: &mut Agent, config: &DeathConfig, sink: &mut S) -> bool {
    let progress = if config.burn_duration > 0.0 {
        (agent.death.elapsed / config.burn_duration).min(1.0)
    } else {
        1.0
    };
    agent.visual.visual_scale = agent.original_scale * (1.0 - progress);
    agent.visual.color_fade = progress;
    agent.visual.ash_scale = progress;

    if progress < 1.0 {
        return false;
    }
    agent.visual.visible = false;
    sink.emit(HordeEvent::Decal {
        position: agent.position,
        scale: agent.mass(),
        material: DecalMaterial::Ash,
    });
    true
}

fn electrocute<R: Rng, S: EffectSink>(agent: &mut Agent, config: &DeathConfig, dt: f32, rng: &mut R, sink: &mut S) {
    let anchor = agent.death.anchor;
    agent.position = anchor
        + Vec3::new(
            rng.gen_range(-JITTER..=JITTER),
            0.0,
            rng.gen_range(-JITTER..=JITTER),
        );

    agent.death.spark_accum += dt;
    while agent.death.spark_accum >= config.spark_interval {
        agent.death.spark_accum -= config.spark_interval;
        sink.emit(HordeEvent::VisualEffect {
            position: agent.position + Vec3::Y,
            kind: EffectKind::Sparks,
            count: SPARKS_PER_BURST,
        });
    }
}

/// Launch arc, pitch-over, then rest for `corpse_linger`.
fn fall_over<S: EffectSink>(agent: &mut Agent, config: &DeathConfig, gravity: f32, dt: f32, sink: &mut S) -> bool {
    let ground = agent.death.anchor.y;

    if agent.death.velocity != Vec3::ZERO {
        agent.death.velocity.y -= gravity * dt;
        agent.position += agent.death.velocity * dt;
        if agent.position.y <= ground {
            agent.position.y = ground;
            agent.death.velocity = Vec3::ZERO;
            sink.emit(HordeEvent::Sound { id: SoundId::BodyFall });
        }
    }

    let target = agent.death.pitch_target;
    let turn = config.pitch_speed * dt;
    let pitch = agent.visual.pitch;
    agent.visual.pitch = if (target - pitch).abs() <= turn {
        target
    } else {
        pitch + turn * (target - pitch).signum()
    };

    let settled = agent.death.velocity == Vec3::ZERO && agent.visual.pitch == target;
    if !settled {
        return false;
    }
    agent.death.settled_for += dt;
    agent.death.settled_for >= config.corpse_linger
}
