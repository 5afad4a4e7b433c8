//! Horde AI FSM
//!
//! Конечный автомат одного агента:
//! Idle → Wander → Idle, any → Chase on sight, Chase → Search on lost contact,
//! Chase → Biting / Exploding / heavy slam in range, any → Stunned while locked.
//!
//! Architecture:
//! - Pure function of (agent, perception result, timers); no world access
//! - Writes `ai_state` and `intent`; locomotion turns intent into motion
//! - Distances compared squared; attack cooldown in ms, other timers in seconds

use bevy::prelude::*;
use rand::Rng;

use crate::agent::{planar_dist_sq, AIState, Agent, AttackStyle, DamageCause, LastHit, MoveIntent};
use crate::config::AIConfig;
use crate::events::{EffectSink, HordeEvent, PlayerHitCause, SoundId};
use crate::lifecycle::AgentPool;
use crate::player::PlayerState;

/// Read-only inputs shared by every agent this tick
#[derive(Debug, Clone, Copy)]
pub struct AiContext<'a> {
    pub player: &'a PlayerState,
    pub config: &'a AIConfig,
    pub now: f32,
    pub dt: f32,
}

/// Run the FSM for every living agent in slot order.
pub fn think_all<R: Rng, S: EffectSink>(pool: &mut AgentPool, ctx: &AiContext, rng: &mut R, sink: &mut S) {
    for agent in pool.iter_mut() {
        think(agent, ctx, rng, sink);
    }
}

/// One FSM step. Dying agents are ignored.
pub fn think<R: Rng, S: EffectSink>(agent: &mut Agent, ctx: &AiContext, rng: &mut R, sink: &mut S) {
    if !agent.is_alive() {
        return;
    }

    if agent.is_locked() {
        enter_lock(agent);
        return;
    }

    if agent.ai_state == AIState::Stunned {
        agent.ai_state = agent.resume_state;
    }

    agent.timers.attack_cooldown_ms = (agent.timers.attack_cooldown_ms - ctx.dt * 1000.0).max(0.0);

    match agent.ai_state {
        AIState::Idle => {
            agent.timers.idle -= ctx.dt;
            agent.intent = MoveIntent::Hold;

            if agent.senses.can_see {
                agent.ai_state = AIState::Chase;
                chase(agent, ctx, sink);
            } else if agent.senses.heard {
                enter_search(agent, ctx.config);
            } else if agent.timers.idle <= 0.0 {
                enter_wander(agent, ctx.config, rng);
            }
        }

        AIState::Wander => {
            agent.timers.wander -= ctx.dt;

            if agent.senses.can_see {
                agent.ai_state = AIState::Chase;
                chase(agent, ctx, sink);
            } else if agent.timers.wander <= 0.0 {
                enter_idle(agent, ctx.config, rng);
            } else {
                agent.intent = MoveIntent::MoveTo {
                    target: agent.wander_target,
                    speed_factor: ctx.config.wander_speed_factor,
                };
            }
        }

        AIState::Chase => chase(agent, ctx, sink),

        AIState::Search => {
            agent.timers.search -= ctx.dt;

            if agent.senses.can_see {
                agent.ai_state = AIState::Chase;
                chase(agent, ctx, sink);
            } else if agent.timers.search <= 0.0 {
                enter_idle(agent, ctx.config, rng);
            } else {
                let arrive_sq = ctx.config.search_arrive_distance * ctx.config.search_arrive_distance;
                agent.intent = match agent.memory.last_seen_pos {
                    Some(target) if planar_dist_sq(agent.position, target) >= arrive_sq => {
                        MoveIntent::MoveTo { target, speed_factor: 1.0 }
                    }
                    _ => MoveIntent::Turn { rate: ctx.config.search_turn_rate },
                };
            }
        }

        AIState::Biting => bite(agent, ctx, sink),

        AIState::Exploding => burn_fuse(agent, ctx, sink),

        // Never stored as a resume state
        AIState::Stunned => agent.ai_state = AIState::Idle,
    }
}

/// Stun/blind lock: remember what to resume, cancel grapple and fuse.
fn enter_lock(agent: &mut Agent) {
    if agent.ai_state != AIState::Stunned {
        agent.resume_state = match agent.ai_state {
            AIState::Biting | AIState::Exploding => {
                agent.timers.grapple = 0.0;
                agent.timers.fuse = 0.0;
                agent.timers.bite_accum = 0.0;
                agent.visual.bob = 0.0;
                AIState::Chase
            }
            state => state,
        };
        agent.ai_state = AIState::Stunned;
    }
    agent.intent = MoveIntent::Hold;
}

fn enter_idle<R: Rng>(agent: &mut Agent, config: &AIConfig, rng: &mut R) {
    agent.ai_state = AIState::Idle;
    agent.timers.idle = rng.gen_range(config.idle_time[0]..=config.idle_time[1]);
    agent.intent = MoveIntent::Hold;
}

fn enter_wander<R: Rng>(agent: &mut Agent, config: &AIConfig, rng: &mut R) {
    let angle = rng.gen_range(0.0..std::f32::consts::TAU);
    let distance = config.wander_radius * rng.gen::<f32>().sqrt();
    agent.wander_target = agent.spawn_point + Vec3::new(angle.sin() * distance, 0.0, angle.cos() * distance);
    agent.timers.wander = rng.gen_range(config.wander_time[0]..=config.wander_time[1]);
    agent.ai_state = AIState::Wander;
    agent.intent = MoveIntent::MoveTo {
        target: agent.wander_target,
        speed_factor: config.wander_speed_factor,
    };
}

fn enter_search(agent: &mut Agent, config: &AIConfig) {
    agent.ai_state = AIState::Search;
    agent.timers.search = config.search_duration;
    agent.intent = match agent.memory.last_seen_pos {
        Some(target) => MoveIntent::MoveTo { target, speed_factor: 1.0 },
        None => MoveIntent::Turn { rate: config.search_turn_rate },
    };
}

fn chase<S: EffectSink>(agent: &mut Agent, ctx: &AiContext, sink: &mut S) {
    let config = ctx.config;

    let target = if agent.senses.can_see {
        ctx.player.position
    } else {
        match agent.memory.last_seen_pos {
            Some(position) if ctx.now - agent.memory.last_seen_time <= config.memory_timeout => position,
            _ => {
                enter_search(agent, config);
                return;
            }
        }
    };

    let dist_sq = planar_dist_sq(agent.position, target);
    if dist_sq > config.disengage_distance * config.disengage_distance {
        enter_search(agent, config);
        return;
    }

    if agent.attack_style == AttackStyle::SelfDestruct {
        if dist_sq < config.explode_trigger_distance * config.explode_trigger_distance {
            agent.ai_state = AIState::Exploding;
            agent.timers.fuse = config.fuse_duration;
            agent.intent = MoveIntent::Face { target };
            return;
        }
    } else if agent.senses.can_see && ctx.player.alive && dist_sq <= agent.attack_range * agent.attack_range {
        if agent.timers.attack_cooldown_ms <= 0.0 {
            start_attack(agent, ctx, sink);
            return;
        }
        agent.intent = MoveIntent::Face { target };
        return;
    }

    agent.intent = MoveIntent::MoveTo { target, speed_factor: 1.0 };
}

fn start_attack<S: EffectSink>(agent: &mut Agent, ctx: &AiContext, sink: &mut S) {
    match agent.attack_style {
        AttackStyle::Heavy => {
            sink.emit(HordeEvent::PlayerHit {
                damage: agent.damage,
                attacker: agent.id,
                cause: PlayerHitCause::HeavySlam,
            });
            sink.emit(HordeEvent::Sound { id: SoundId::Slam });
            agent.timers.attack_cooldown_ms = agent.base_attack_cooldown_ms;
            agent.intent = MoveIntent::Face { target: ctx.player.position };
        }
        AttackStyle::Grapple => {
            let away = Vec3::new(
                agent.position.x - ctx.player.position.x,
                0.0,
                agent.position.z - ctx.player.position.z,
            );
            let direction = away.try_normalize().unwrap_or(Vec3::Z);
            agent.ai_state = AIState::Biting;
            agent.timers.grapple = ctx.config.grapple_duration;
            agent.timers.bite_accum = 0.0;
            agent.intent = MoveIntent::Pinned { offset: direction * ctx.config.bite_offset };
        }
        AttackStyle::SelfDestruct => {}
    }
}

fn release_grapple(agent: &mut Agent) {
    agent.ai_state = AIState::Chase;
    agent.timers.grapple = 0.0;
    agent.timers.bite_accum = 0.0;
    agent.timers.attack_cooldown_ms = agent.base_attack_cooldown_ms;
    agent.intent = MoveIntent::Hold;
}

fn bite<S: EffectSink>(agent: &mut Agent, ctx: &AiContext, sink: &mut S) {
    if !ctx.player.alive {
        release_grapple(agent);
        return;
    }

    agent.timers.grapple -= ctx.dt;
    agent.timers.bite_accum += ctx.dt;

    while agent.timers.bite_accum >= ctx.config.bite_interval {
        agent.timers.bite_accum -= ctx.config.bite_interval;
        sink.emit(HordeEvent::PlayerHit {
            damage: agent.damage,
            attacker: agent.id,
            cause: PlayerHitCause::Bite,
        });
        sink.emit(HordeEvent::Sound { id: SoundId::Bite });
    }

    if agent.timers.grapple <= 0.0 {
        release_grapple(agent);
    }
}

fn burn_fuse<S: EffectSink>(agent: &mut Agent, ctx: &AiContext, sink: &mut S) {
    let config = ctx.config;
    agent.timers.fuse -= ctx.dt;
    agent.visual.bob = if config.fuse_duration > 0.0 {
        (1.0 - agent.timers.fuse / config.fuse_duration).clamp(0.0, 1.0)
    } else {
        1.0
    };
    agent.intent = MoveIntent::Hold;

    if agent.timers.fuse > 0.0 {
        return;
    }

    let blast_sq = config.blast_check_radius * config.blast_check_radius;
    if ctx.player.alive && planar_dist_sq(agent.position, ctx.player.position) < blast_sq {
        sink.emit(HordeEvent::PlayerHit {
            damage: config.blast_damage,
            attacker: agent.id,
            cause: PlayerHitCause::Explosion,
        });
    }

    agent.timers.fuse = 0.0;
    agent.hp = 0.0;
    agent.last_hit = Some(LastHit {
        cause: DamageCause::Explosive,
        high_impact: false,
        direction: Vec3::ZERO,
    });
    agent.last_hit_time = ctx.now;
}
