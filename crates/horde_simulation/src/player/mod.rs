//! Player state as seen by the horde
//!
//! The host owns the real player (input, health, camera) and copies the parts
//! the simulation reads into this resource before each tick. Damage flows the
//! other way through `HordeEvent::PlayerHit`.

use bevy::prelude::*;

/// Read-only player snapshot
///
/// # Architecture note
/// - Perception only sees the player while `alive`
/// - AI never starts an attack against a dead player
/// - Biters are pinned relative to `position`
#[derive(Resource, Debug, Clone, Copy, PartialEq)]
pub struct PlayerState {
    pub position: Vec3,
    pub alive: bool,
}

impl Default for PlayerState {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            alive: true,
        }
    }
}
