//! AI decision-making module
//!
//! Perception feeds a per-agent FSM; the FSM only produces state + intent.
//! Movement itself happens in `locomotion`.

use bevy::prelude::*;

use crate::clock::SimClock;
use crate::config::SimulationConfig;
use crate::events::HordeEvent;
use crate::lifecycle::AgentPool;
use crate::perception::{self, NoiseBoard};
use crate::player::PlayerState;
use crate::{DeterministicRng, HordeSet};

pub mod fsm;


pub use fsm::{think, think_all, AiContext};

/// AI Plugin
///
/// Регистрирует AI системы в FixedUpdate.
/// Порядок выполнения:
/// 1. perceive_player: sight/hearing → agent memory (`HordeSet::Perception`)
/// 2. ai_fsm_transitions: FSM state + intent, player attacks (`HordeSet::Ai`)
pub struct AIPlugin;

impl Plugin for AIPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(FixedUpdate, perceive_player.in_set(HordeSet::Perception))
            .add_systems(FixedUpdate, ai_fsm_transitions.in_set(HordeSet::Ai));
    }
}

/// System: perception pass
pub fn perceive_player(
    mut pool: ResMut<AgentPool>,
    player: Res<PlayerState>,
    noise: Res<NoiseBoard>,
    config: Res<SimulationConfig>,
    clock: Res<SimClock>,
) {
    perception::sense_all(&mut pool, &player, &noise, &config.perception, clock.now);
}

/// System: AI FSM transitions
///
/// Bites, slams and self-destruct blasts against the player leave as
/// `HordeEvent::PlayerHit`.
pub fn ai_fsm_transitions(
    mut pool: ResMut<AgentPool>,
    player: Res<PlayerState>,
    config: Res<SimulationConfig>,
    clock: Res<SimClock>,
    mut rng: ResMut<DeterministicRng>,
    mut events: EventWriter<HordeEvent>,
) {
    let ctx = AiContext {
        player: &player,
        config: &config.ai,
        now: clock.now,
        dt: clock.delta,
    };
    think_all(&mut pool, &ctx, &mut rng.rng, &mut events);
}
