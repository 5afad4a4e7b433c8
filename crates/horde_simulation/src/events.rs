//! Boundary events
//!
//! Inputs (`SpawnRequest`, `FireRequest`) arrive as Bevy events. Everything the
//! simulation reports to external collaborators (audio, VFX, HUD, loot) leaves
//! as a `HordeEvent` pushed into an `EffectSink`:
//! - Bevy systems write straight into `EventWriter<HordeEvent>`
//! - Pure phase functions and unit tests collect into `Vec<HordeEvent>`
//! - `NoiseRelay` forwards to any sink and mirrors `Noise` into the `NoiseBoard`

use bevy::prelude::*;

use crate::agent::archetype::ArchetypeKind;
use crate::agent::AgentId;
use crate::combat::weapon_stats::WeaponId;
use crate::perception::NoiseBoard;

/// Request to spawn one agent (dropped silently at the population cap)
#[derive(Event, Debug, Clone, Copy)]
pub struct SpawnRequest {
    pub archetype: ArchetypeKind,
    pub position: Vec3,
    /// Wave id for horde accounting
    pub wave: Option<u32>,
}

/// Request to fire a weapon (the host enforces fire rate and ammo)
#[derive(Event, Debug, Clone, Copy)]
pub struct FireRequest {
    pub weapon: WeaponId,
    pub origin: Vec3,
    pub direction: Vec3,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerHitCause {
    Bite,
    HeavySlam,
    Explosion,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EffectKind {
    Blood,
    Gore,
    Debris,
    Sparks,
    Explosion,
    Fire,
    Flash,
    BulletImpact,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecalMaterial {
    Blood,
    Ash,
    Scorch,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SoundId {
    WeaponFire(WeaponId),
    BulletImpact,
    Explosion,
    Ignite,
    Flashbang,
    Bite,
    Slam,
    Gib,
    Sizzle,
    Zap,
    BodyFall,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoiseKind {
    Footstep,
    Gunshot,
    Explosion,
}

/// Everything the simulation tells the outside world
#[derive(Event, Debug, Clone, PartialEq)]
pub enum HordeEvent {
    PlayerHit {
        damage: f32,
        attacker: AgentId,
        cause: PlayerHitCause,
    },
    /// Reported damage (already clamped to the victim's remaining hp)
    DamageDealt {
        amount: f32,
        is_boss: bool,
    },
    VisualEffect {
        position: Vec3,
        kind: EffectKind,
        count: u32,
    },
    Decal {
        position: Vec3,
        scale: f32,
        material: DecalMaterial,
    },
    Sound {
        id: SoundId,
    },
    Noise {
        position: Vec3,
        radius: f32,
        kind: NoiseKind,
    },
    AshStart {
        agent: AgentId,
    },
    BossDefeated {
        boss_id: u32,
    },
    KillReward {
        agent: AgentId,
        archetype: ArchetypeKind,
        score: u32,
        xp: u32,
        wave: Option<u32>,
    },
    LootDrop {
        position: Vec3,
        boss_id: u32,
    },
}

/// Destination for `HordeEvent`s
pub trait EffectSink {
    fn emit(&mut self, event: HordeEvent);
}

impl EffectSink for Vec<HordeEvent> {
    fn emit(&mut self, event: HordeEvent) {
        self.push(event);
    }
}

impl EffectSink for EventWriter<'_, HordeEvent> {
    fn emit(&mut self, event: HordeEvent) {
        self.write(event);
    }
}

/// Forwards events to `sink`; `Noise` events are also recorded on the board
/// so agents can hear them on the next perception pass.
pub struct NoiseRelay<'a, S: EffectSink> {
    pub sink: &'a mut S,
    pub board: &'a mut NoiseBoard,
    pub now: f32,
}

impl<'a, S: EffectSink> NoiseRelay<'a, S> {
    pub fn new(sink: &'a mut S, board: &'a mut NoiseBoard, now: f32) -> Self {
        Self { sink, board, now }
    }
}

impl<S: EffectSink> EffectSink for NoiseRelay<'_, S> {
    fn emit(&mut self, event: HordeEvent) {
        if let HordeEvent::Noise { position, radius, kind } = event {
            self.board.emit(position, radius, kind, self.now);
        }
        self.sink.emit(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relay_records_noise_and_forwards_everything() {
        let mut board = NoiseBoard::new(4, 2.0);
        let mut events: Vec<HordeEvent> = Vec::new();

        {
            let mut relay = NoiseRelay::new(&mut events, &mut board, 3.0);
            relay.emit(HordeEvent::Sound { id: SoundId::Explosion });
            relay.emit(HordeEvent::Noise {
                position: Vec3::new(1.0, 0.0, 2.0),
                radius: 30.0,
                kind: NoiseKind::Explosion,
            });
        }

        assert_eq!(events.len(), 2);
        assert_eq!(board.active_count(3.0), 1);
    }
}
