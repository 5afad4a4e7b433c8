//! Damage application
//!
//! Обрабатывает одиночный hit по агенту:
//! - Skipped while the agent is not targetable (dying, hp already ≤ 0) or spawn-protected
//! - Stored hp may go negative; the reported amount is clamped to the hp that was left
//! - The last hit (cause, high-impact flag, direction) drives death classification

use bevy::prelude::*;

use crate::agent::{Agent, DamageCause, LastHit};
use crate::combat::weapon_stats::{ImpactClass, WeaponStats};
use crate::config::CombatConfig;
use crate::events::{EffectSink, HordeEvent};

/// One resolved hit
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hit {
    pub amount: f32,
    pub cause: DamageCause,
    pub high_impact: bool,
    /// Planar push direction (zero for damage-over-time)
    pub direction: Vec3,
}

impl Hit {
    pub fn new(amount: f32, cause: DamageCause) -> Self {
        Self {
            amount,
            cause,
            high_impact: false,
            direction: Vec3::ZERO,
        }
    }
}

/// Apply `hit` to `agent`. Returns the reported damage, or `None` when ignored.
pub fn apply_damage(agent: &mut Agent, hit: &Hit, now: f32) -> Option<f32> {
    if !agent.is_targetable() || agent.is_protected(now) {
        return None;
    }

    let reported = hit.amount.min(agent.hp.max(0.0));
    agent.hp -= hit.amount;
    agent.last_hit = Some(LastHit {
        cause: hit.cause,
        high_impact: hit.high_impact,
        direction: hit.direction,
    });
    agent.last_hit_time = now;
    Some(reported)
}

/// `apply_damage` plus the `DamageDealt` callback.
pub fn deal_damage<S: EffectSink>(agent: &mut Agent, hit: &Hit, now: f32, sink: &mut S) -> Option<f32> {
    let reported = apply_damage(agent, hit, now)?;
    sink.emit(HordeEvent::DamageDealt {
        amount: reported,
        is_boss: agent.is_boss,
    });
    Some(reported)
}

/// High-impact classification of a bullet hit.
///
/// `distance` is measured from the muzzle, `remaining` is the bullet damage at
/// the moment of the hit (after piercing decay).
pub fn is_high_impact(weapon: &WeaponStats, config: &CombatConfig, distance: f32, remaining: f32) -> bool {
    match weapon.impact_class {
        ImpactClass::Normal => false,
        ImpactClass::CloseRange => distance < config.shotgun_close_range,
        ImpactClass::FullPower => remaining >= config.revolver_full_ratio * weapon.base_damage,
    }
}

/// Knockback force of a splash hit: `min + (max - min) · (1 - d/r)`.
pub fn splash_force(distance: f32, radius: f32, min_force: f32, max_force: f32) -> f32 {
    let ratio = if radius > 0.0 { (distance / radius).clamp(0.0, 1.0) } else { 1.0 };
    min_force + (max_force - min_force) * (1.0 - ratio)
}
