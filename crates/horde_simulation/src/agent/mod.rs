//! Agent records
//!
//! Architecture:
//! - One flat `Agent` struct per pool slot (no ECS entity per enemy)
//! - `Agent::from_archetype` is the DNA reset: every field is rebuilt from the
//!   template, so a recycled slot never leaks state from its previous occupant
//! - Other phases keep `AgentId` (slot + generation) across ticks, never references

use bevy::prelude::*;

pub mod archetype;

pub use archetype::{Archetype, ArchetypeKind, ArchetypeTable, AttackStyle};

/// Stable agent handle; the generation detects recycled slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AgentId {
    pub slot: u32,
    pub generation: u32,
}

impl AgentId {
    pub const fn new(slot: u32, generation: u32) -> Self {
        Self { slot, generation }
    }
}

/// AI FSM states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AIState {
    #[default]
    Idle,
    Wander,
    Chase,
    Search,
    /// Grappling the player, pinned in front of them
    Biting,
    /// Fuse armed (self-destruct archetype)
    Exploding,
    /// Locked by stun or blind
    Stunned,
}

/// Death branch. Only `Alive → branch → Dead` is allowed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DeathState {
    #[default]
    Alive,
    Shot,
    Gibbed,
    Burning,
    Exploded,
    Electrified,
    Dead,
}

impl DeathState {
    fn rank(self) -> u8 {
        match self {
            DeathState::Alive => 0,
            DeathState::Dead => 2,
            _ => 1,
        }
    }

    pub fn is_dying(self) -> bool {
        self.rank() == 1
    }
}

/// What dealt the last hit; drives death classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum DamageCause {
    Ballistic,
    Explosive,
    Incendiary,
    Electrical,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LastHit {
    pub cause: DamageCause,
    pub high_impact: bool,
    /// Planar direction the hit pushed the agent
    pub direction: Vec3,
}

/// Perception memory
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Memory {
    pub last_seen_pos: Option<Vec3>,
    pub last_seen_time: f32,
}

/// Perception output for the current tick
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Senses {
    pub can_see: bool,
    pub heard: bool,
}

/// Movement intent produced by the AI and consumed by locomotion
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum MoveIntent {
    #[default]
    Hold,
    MoveTo { target: Vec3, speed_factor: f32 },
    /// Rotate in place (rad/s)
    Turn { rate: f32 },
    Face { target: Vec3 },
    /// Held at `offset` from the player, facing them
    Pinned { offset: Vec3 },
}

/// Per-state timers (seconds unless noted)
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct AgentTimers {
    pub idle: f32,
    pub wander: f32,
    pub search: f32,
    /// Milliseconds
    pub attack_cooldown_ms: f32,
    pub grapple: f32,
    pub fuse: f32,
    /// Sim time accumulated toward the next bite tick
    pub bite_accum: f32,
}

/// Remaining status effect durations (seconds)
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct StatusEffects {
    pub burning: f32,
    pub afterburn: f32,
    pub blind: f32,
    pub stun: f32,
    pub slow: f32,
}

/// Kinematic state of a dying agent
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct DeathMotion {
    pub velocity: Vec3,
    pub elapsed: f32,
    pub pitch_target: f32,
    pub spark_accum: f32,
    pub settled_for: f32,
    /// Rest position electrocution jitters around
    pub anchor: Vec3,
}

/// Render-facing outputs
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Visual {
    pub visual_scale: f32,
    pub color_fade: f32,
    pub ash_scale: f32,
    pub visible: bool,
    /// Fuse pulse (0..1)
    pub bob: f32,
    /// Corpse pitch (radians)
    pub pitch: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Agent {
    pub id: AgentId,
    pub archetype: ArchetypeKind,
    pub hp: f32,
    pub max_hp: f32,
    pub speed: f32,
    pub damage: f32,
    pub attack_range: f32,
    pub attack_style: AttackStyle,
    pub base_attack_cooldown_ms: f32,
    pub is_boss: bool,
    pub external_id: u32,
    pub score: u32,
    pub xp: u32,

    pub position: Vec3,
    pub yaw: f32,
    pub velocity: Vec3,
    pub spawn_point: Vec3,
    pub original_scale: f32,
    pub width_scale: f32,

    pub ai_state: AIState,
    /// State restored when a stun/blind lock ends
    pub resume_state: AIState,
    pub death_state: DeathState,
    pub memory: Memory,
    pub senses: Senses,
    pub wander_target: Vec3,
    pub intent: MoveIntent,
    pub timers: AgentTimers,
    pub status: StatusEffects,

    pub knockback: Vec3,
    pub death: DeathMotion,
    pub last_hit: Option<LastHit>,
    /// Sim time of the last hit (hit flash)
    pub last_hit_time: f32,
    /// Damage is ignored until this sim time
    pub protected_until: f32,

    pub visual: Visual,
    pub wave: Option<u32>,
}

impl Agent {
    /// Build a fresh record from a template (DNA reset).
    pub fn from_archetype(
        id: AgentId,
        archetype: &Archetype,
        position: Vec3,
        now: f32,
        spawn_protection: f32,
        wave: Option<u32>,
    ) -> Self {
        Self {
            id,
            archetype: archetype.kind,
            hp: archetype.max_hp,
            max_hp: archetype.max_hp,
            speed: archetype.speed,
            damage: archetype.damage,
            attack_range: archetype.attack_range,
            attack_style: archetype.attack_style,
            base_attack_cooldown_ms: archetype.attack_cooldown_ms,
            is_boss: archetype.is_boss,
            external_id: archetype.external_id,
            score: archetype.score,
            xp: archetype.xp,

            position,
            yaw: 0.0,
            velocity: Vec3::ZERO,
            spawn_point: position,
            original_scale: archetype.scale,
            width_scale: archetype.width_scale,

            ai_state: AIState::Idle,
            resume_state: AIState::Idle,
            death_state: DeathState::Alive,
            memory: Memory::default(),
            senses: Senses::default(),
            wander_target: position,
            intent: MoveIntent::Hold,
            timers: AgentTimers::default(),
            status: StatusEffects::default(),

            knockback: Vec3::ZERO,
            death: DeathMotion::default(),
            last_hit: None,
            last_hit_time: f32::NEG_INFINITY,
            protected_until: now + spawn_protection,

            visual: Visual {
                visual_scale: archetype.scale,
                color_fade: 0.0,
                ash_scale: 0.0,
                visible: true,
                bob: 0.0,
                pitch: 0.0,
            },
            wave,
        }
    }

    pub fn is_alive(&self) -> bool {
        self.death_state == DeathState::Alive
    }

    pub fn is_dying(&self) -> bool {
        self.death_state.is_dying()
    }

    /// Can be hit by projectiles and area effects
    pub fn is_targetable(&self) -> bool {
        self.death_state == DeathState::Alive && self.hp > 0.0
    }

    pub fn is_burning(&self) -> bool {
        self.status.burning > 0.0
    }

    /// Stunned or blinded: no steering, no decisions
    pub fn is_locked(&self) -> bool {
        self.status.stun > 0.0 || self.status.blind > 0.0
    }

    pub fn is_protected(&self, now: f32) -> bool {
        now < self.protected_until
    }

    pub fn mass(&self) -> f32 {
        self.original_scale * self.width_scale
    }

    pub fn hit_radius(&self) -> f32 {
        0.5 * self.original_scale * self.width_scale
    }

    /// Planar facing vector for the current yaw
    pub fn forward(&self) -> Vec3 {
        Vec3::new(self.yaw.sin(), 0.0, self.yaw.cos())
    }

    /// Move the death state one step forward. Anything else (skipping `Dead`
    /// before a branch, reverting, re-entering) is refused.
    pub fn advance_death(&mut self, next: DeathState) -> bool {
        if next.rank() != self.death_state.rank() + 1 {
            return false;
        }
        self.death_state = next;
        true
    }
}

/// Yaw that faces along planar `direction` (0 = +Z)
pub fn yaw_towards(direction: Vec3) -> Option<f32> {
    if direction.x * direction.x + direction.z * direction.z < 1e-8 {
        return None;
    }
    Some(direction.x.atan2(direction.z))
}

/// Squared distance in the ground plane
pub fn planar_dist_sq(a: Vec3, b: Vec3) -> f32 {
    let dx = a.x - b.x;
    let dz = a.z - b.z;
    dx * dx + dz * dz
}
