//! Horde Simulation Core
//!
//! Headless enemy-horde simulation на Bevy 0.16 (FixedUpdate, 60Hz).
//!
//! Architecture:
//! - Agents are flat records in a capped `AgentPool` (arena + free list +
//!   generations), not ECS entities; Bevy supplies the schedule, resources
//!   and events
//! - Every phase is a pure function over the pool plus a thin system wrapper
//! - One tick: clock → spawn → spatial index → perception → AI → locomotion →
//!   combat → death → reclaim
//! - Outputs leave as `HordeEvent`s; the host renders, plays audio and owns the player

use bevy::prelude::*;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

pub mod agent;
pub mod ai;
pub mod clock;
pub mod combat;
pub mod config;
pub mod death;
pub mod events;
pub mod lifecycle;
pub mod locomotion;
pub mod logger;
pub mod perception;
pub mod player;
pub mod spatial;

pub use agent::{AIState, Agent, AgentId, ArchetypeKind, DamageCause, DeathState};
pub use ai::AIPlugin;
pub use clock::SimClock;
pub use combat::{CombatPlugin, ProjectileWorld, WeaponId};
pub use config::{ConfigError, SimulationConfig};
pub use death::DeathPlugin;
pub use events::{EffectSink, FireRequest, HordeEvent, SpawnRequest};
pub use lifecycle::{AgentPool, KillStats};
pub use locomotion::LocomotionPlugin;
pub use logger::{
    init_logger, log, log_error, log_info, log_warning, log_with_level, set_log_level, set_logger,
    set_logger_if_needed, LogLevel, LogPrinter,
};
pub use perception::NoiseBoard;
pub use player::PlayerState;
pub use spatial::{Obstacle, SpatialIndex};

/// Phase order of one simulation tick
#[derive(SystemSet, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HordeSet {
    Clock,
    Spawn,
    Index,
    Perception,
    Ai,
    Locomotion,
    Combat,
    Death,
    Lifecycle,
}

/// Главный plugin симуляции
///
/// Fixed timestep + default RNG + `HordePlugin`. A `DeterministicRng` or
/// `SimulationConfig` inserted before this plugin is kept.
pub struct SimulationPlugin;

impl Plugin for SimulationPlugin {
    fn build(&self, app: &mut App) {
        // Fixed timestep 60Hz для simulation tick
        app.insert_resource(Time::<Fixed>::from_hz(60.0));
        if !app.world().contains_resource::<DeterministicRng>() {
            app.insert_resource(DeterministicRng::new(42));
        }
        app.add_plugins(HordePlugin);
    }
}

/// Horde resources, events and phase systems
pub struct HordePlugin;

impl Plugin for HordePlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<SimulationConfig>();
        let mut config = app.world().resource::<SimulationConfig>().clone();
        if let Err(err) = config.validate() {
            log_warning(&format!("Invalid simulation config: {}; falling back to defaults", err));
            config = SimulationConfig::default();
            app.insert_resource(config.clone());
        }

        let index = SpatialIndex::new(config.spatial.cell_size).unwrap_or_else(|err| {
            log_error(&format!("{}; falling back to the default cell size", err));
            SpatialIndex::default()
        });

        app.insert_resource(AgentPool::new(config.pool.max_agents))
            .insert_resource(index)
            .insert_resource(NoiseBoard::new(
                config.perception.noise_capacity,
                config.perception.noise_expiry,
            ))
            .insert_resource(ProjectileWorld::new(
                config.pool.projectile_capacity,
                config.pool.fire_zone_capacity,
            ))
            .init_resource::<KillStats>()
            .init_resource::<SimClock>()
            .init_resource::<PlayerState>();

        app.add_event::<SpawnRequest>()
            .add_event::<FireRequest>()
            .add_event::<HordeEvent>();

        app.configure_sets(
            FixedUpdate,
            (
                HordeSet::Clock,
                HordeSet::Spawn,
                HordeSet::Index,
                HordeSet::Perception,
                HordeSet::Ai,
                HordeSet::Locomotion,
                HordeSet::Combat,
                HordeSet::Death,
                HordeSet::Lifecycle,
            )
                .chain(),
        );

        app.add_systems(
            FixedUpdate,
            (
                (clock::advance_clock, perception::expire_noise)
                    .chain()
                    .in_set(HordeSet::Clock),
                lifecycle::process_spawn_requests.in_set(HordeSet::Spawn),
                spatial::rebuild_spatial_index.in_set(HordeSet::Index),
                lifecycle::reclaim_dead_agents.in_set(HordeSet::Lifecycle),
            ),
        );

        app.add_plugins((AIPlugin, LocomotionPlugin, CombatPlugin, DeathPlugin));

        log_info(&format!(
            "🧟 Horde simulation ready (cap {}, cell {})",
            config.pool.max_agents, config.spatial.cell_size
        ));
    }
}

/// Детерминистичный RNG resource (seeded)
#[derive(Resource)]
pub struct DeterministicRng {
    pub rng: ChaCha8Rng,
    pub seed: u64,
}

impl DeterministicRng {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            seed,
        }
    }
}

/// Создаёт minimal Bevy App для headless симуляции
pub fn create_headless_app(seed: u64) -> App {
    create_headless_app_with_config(seed, SimulationConfig::default())
}

/// Headless app with a custom config (capacities are fixed at build time)
pub fn create_headless_app_with_config(seed: u64, config: SimulationConfig) -> App {
    let mut app = App::new();
    init_logger();
    app.add_plugins(MinimalPlugins)
        .insert_resource(DeterministicRng::new(seed))
        .insert_resource(config)
        .add_plugins(SimulationPlugin);

    app
}
