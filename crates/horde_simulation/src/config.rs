//! Tuning configuration for the horde simulation
//!
//! Every tuning constant lives here as a default. The whole tree is a Bevy
//! `Resource` and round-trips through JSON so designers can override any
//! subset of values (missing fields keep their defaults).

use std::path::Path;

use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::agent::archetype::ArchetypeTable;
use crate::combat::weapon_stats::{Delivery, Payload, WeaponTable};

/// Errors raised while loading or validating a `SimulationConfig`.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
    /// A value that cannot be simulated (e.g. non-positive cell size).
    #[error("invalid configuration: {0}")]
    InvalidConfig(&'static str),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PoolConfig {
    /// Hard population cap
    pub max_agents: usize,
    /// Reserved projectile slots; fire requests beyond it are dropped
    pub projectile_capacity: usize,
    pub fire_zone_capacity: usize,
    /// Seconds after spawning during which damage is ignored
    pub spawn_protection: f32,
    /// Timers further than this from "now" are treated as stale and cleared
    pub stale_after: f32,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max_agents: 100,
            projectile_capacity: 256,
            fire_zone_capacity: 16,
            spawn_protection: 0.25,
            stale_after: 30.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpatialConfig {
    pub cell_size: f32,
}

impl Default for SpatialConfig {
    fn default() -> Self {
        Self { cell_size: 4.0 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PerceptionConfig {
    pub vision_range: f32,
    /// Seconds a noise event stays audible
    pub noise_expiry: f32,
    /// Noise ring size
    pub noise_capacity: usize,
}

impl Default for PerceptionConfig {
    fn default() -> Self {
        Self {
            vision_range: 25.0,
            noise_expiry: 2.0,
            noise_capacity: 64,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AIConfig {
    pub search_duration: f32,
    /// Memory older than this sends a chaser to `Search`
    pub memory_timeout: f32,
    /// Chase gives up beyond this distance
    pub disengage_distance: f32,
    pub wander_radius: f32,
    /// `[min, max]` seconds
    pub wander_time: [f32; 2],
    /// `[min, max]` seconds
    pub idle_time: [f32; 2],
    pub wander_speed_factor: f32,
    pub search_arrive_distance: f32,
    /// Rotation speed while scanning at the last known position (rad/s)
    pub search_turn_rate: f32,
    pub explode_trigger_distance: f32,
    pub fuse_duration: f32,
    pub blast_check_radius: f32,
    pub blast_damage: f32,
    pub grapple_duration: f32,
    pub bite_interval: f32,
    /// Distance from the player at which a biter is pinned
    pub bite_offset: f32,
}

impl Default for AIConfig {
    fn default() -> Self {
        Self {
            search_duration: 5.0,
            memory_timeout: 5.0,
            disengage_distance: 50.0,
            wander_radius: 10.0,
            wander_time: [2.0, 5.0],
            idle_time: [1.0, 3.0],
            wander_speed_factor: 0.5,
            search_arrive_distance: 1.5,
            search_turn_rate: 1.5,
            explode_trigger_distance: 3.5,
            fuse_duration: 1.5,
            blast_check_radius: 4.5,
            blast_damage: 35.0,
            grapple_duration: 2.0,
            bite_interval: 0.5,
            bite_offset: 1.1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LocomotionConfig {
    /// Speed multiplier while slowed
    pub slow_factor: f32,
    pub separation_radius: f32,
    pub separation_strength: f32,
    /// Extra clearance kept from obstacles
    pub obstacle_margin: f32,
    /// Lower bound for mass in the knockback inertia term
    pub min_mass: f32,
    pub gravity: f32,
    pub friction: f32,
    pub ground_level: f32,
    /// Residual knockback below this snaps to zero
    pub knockback_epsilon: f32,
}

impl Default for LocomotionConfig {
    fn default() -> Self {
        Self {
            slow_factor: 0.55,
            separation_radius: 1.6,
            separation_strength: 2.5,
            obstacle_margin: 0.1,
            min_mass: 0.5,
            gravity: 20.0,
            friction: 6.0,
            ground_level: 0.0,
            knockback_epsilon: 0.01,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CombatConfig {
    /// Slow applied by any bullet hit (seconds)
    pub hit_slow_duration: f32,
    /// Close-range class hits count as high impact under this distance
    pub shotgun_close_range: f32,
    /// Full-power class hits count as high impact while damage >= ratio * base
    pub revolver_full_ratio: f32,
    /// Burning damage per second (afterburn deals half)
    pub burn_dps: f32,
    pub afterburn_duration: f32,
    pub throwable_gravity: f32,
    /// Burning time set/refreshed by a fire zone tick
    pub fire_zone_burn_refresh: f32,
}

impl Default for CombatConfig {
    fn default() -> Self {
        Self {
            hit_slow_duration: 0.3,
            shotgun_close_range: 6.0,
            revolver_full_ratio: 0.9,
            burn_dps: 8.0,
            afterburn_duration: 1.5,
            throwable_gravity: 18.0,
            fire_zone_burn_refresh: 3.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeathConfig {
    pub gib_duration: f32,
    pub burn_duration: f32,
    pub electrocute_duration: f32,
    pub spark_interval: f32,
    /// Rest time of a settled corpse before it completes
    pub corpse_linger: f32,
    /// Pitch-over speed (rad/s)
    pub pitch_speed: f32,
    pub launch_speed: f32,
    pub launch_lift: f32,
    pub gore_per_mass: f32,
    pub debris_per_mass: f32,
    /// Noise radius of a self-destruct blast
    pub explosion_noise_radius: f32,
}

impl Default for DeathConfig {
    fn default() -> Self {
        Self {
            gib_duration: 0.1,
            burn_duration: 2.0,
            electrocute_duration: 1.0,
            spark_interval: 0.15,
            corpse_linger: 0.6,
            pitch_speed: 6.0,
            launch_speed: 4.0,
            launch_lift: 3.0,
            gore_per_mass: 12.0,
            debris_per_mass: 20.0,
            explosion_noise_radius: 40.0,
        }
    }
}

/// Root configuration resource
#[derive(Resource, Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    pub pool: PoolConfig,
    pub spatial: SpatialConfig,
    pub perception: PerceptionConfig,
    pub ai: AIConfig,
    pub locomotion: LocomotionConfig,
    pub combat: CombatConfig,
    pub death: DeathConfig,
    pub archetypes: ArchetypeTable,
    pub weapons: WeaponTable,
}

impl SimulationConfig {
    /// Parse and validate a JSON document.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: SimulationConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json_str(&contents)
    }

    pub fn to_json_string(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.spatial.cell_size.is_finite() && self.spatial.cell_size > 0.0) {
            return Err(ConfigError::InvalidConfig("spatial.cell_size must be positive"));
        }
        if self.pool.max_agents == 0 {
            return Err(ConfigError::InvalidConfig("pool.max_agents must be non-zero"));
        }
        if self.pool.projectile_capacity == 0 {
            return Err(ConfigError::InvalidConfig(
                "pool.projectile_capacity must be non-zero",
            ));
        }
        if self.perception.noise_capacity == 0 {
            return Err(ConfigError::InvalidConfig(
                "perception.noise_capacity must be non-zero",
            ));
        }
        if self.ai.bite_interval <= 0.0 {
            return Err(ConfigError::InvalidConfig("ai.bite_interval must be positive"));
        }
        if self.ai.wander_time[0] > self.ai.wander_time[1] || self.ai.idle_time[0] > self.ai.idle_time[1] {
            return Err(ConfigError::InvalidConfig("ai timer ranges must be [min, max]"));
        }
        if self.locomotion.min_mass <= 0.0 {
            return Err(ConfigError::InvalidConfig("locomotion.min_mass must be positive"));
        }
        if self.death.spark_interval <= 0.0 {
            return Err(ConfigError::InvalidConfig("death.spark_interval must be positive"));
        }

        for weapon in &self.weapons.weapons {
            if weapon.pellets == 0 {
                return Err(ConfigError::InvalidConfig("weapon pellets must be at least 1"));
            }
            if let Some(pierce) = weapon.pierce {
                if !(pierce.decay > 0.0 && pierce.decay <= 1.0) {
                    return Err(ConfigError::InvalidConfig("pierce decay must be in (0, 1]"));
                }
            }
            if let Delivery::Throwable(throwable) = weapon.delivery {
                if throwable.radius <= 0.0 {
                    return Err(ConfigError::InvalidConfig("throwable radius must be positive"));
                }
                if let Payload::Incendiary { tick_interval, .. } = throwable.payload {
                    if tick_interval <= 0.0 {
                        return Err(ConfigError::InvalidConfig(
                            "fire zone tick interval must be positive",
                        ));
                    }
                }
            }
        }

        Ok(())
    }
}
