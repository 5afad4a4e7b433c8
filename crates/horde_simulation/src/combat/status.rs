//! Status effect ticks
//!
//! Burning deals incendiary damage-over-time; once it runs out the agent
//! smoulders (afterburn) at half rate. Stun, blind and slow only decay.

use crate::agent::{Agent, DamageCause};
use crate::combat::damage::{deal_damage, Hit};
use crate::config::{CombatConfig, PoolConfig};
use crate::events::EffectSink;
use crate::lifecycle::AgentPool;

/// Tick status effects of every living agent. Returns the total reported damage.
pub fn tick_status<S: EffectSink>(
    pool: &mut AgentPool,
    combat: &CombatConfig,
    limits: &PoolConfig,
    now: f32,
    dt: f32,
    sink: &mut S,
) -> f32 {
    let mut total = 0.0;
    for agent in pool.iter_mut() {
        if !agent.is_alive() {
            continue;
        }
        clear_stale_timers(agent, limits, now);
        total += tick_agent(agent, combat, now, dt, sink);
    }
    total
}

fn tick_agent<S: EffectSink>(agent: &mut Agent, combat: &CombatConfig, now: f32, dt: f32, sink: &mut S) -> f32 {
    let mut dps = 0.0;

    if agent.status.burning > 0.0 {
        dps = combat.burn_dps;
        agent.status.burning -= dt;
        if agent.status.burning <= 0.0 {
            agent.status.burning = 0.0;
            agent.status.afterburn = combat.afterburn_duration;
        }
    } else if agent.status.afterburn > 0.0 {
        dps = combat.burn_dps * 0.5;
        agent.status.afterburn = (agent.status.afterburn - dt).max(0.0);
    }

    agent.status.stun = (agent.status.stun - dt).max(0.0);
    agent.status.blind = (agent.status.blind - dt).max(0.0);
    agent.status.slow = (agent.status.slow - dt).max(0.0);

    if dps <= 0.0 {
        return 0.0;
    }
    deal_damage(agent, &Hit::new(dps * dt, DamageCause::Incendiary), now, sink).unwrap_or(0.0)
}

/// Spawn protection that drifted too far from "now" (clock reset, bad data)
/// is dropped.
fn clear_stale_timers(agent: &mut Agent, limits: &PoolConfig, now: f32) {
    if (agent.protected_until - now).abs() > limits.stale_after {
        agent.protected_until = now;
    }
}
