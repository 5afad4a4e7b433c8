//! Archetypes: static templates every spawned agent is stamped from.

use serde::{Deserialize, Serialize};

/// Enemy archetype tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ArchetypeKind {
    /// Basic melee shambler (the fallback for unknown names)
    Walker,
    /// Fast, fragile grappler
    Runner,
    /// Heavy hitter with a long-reach slam
    Brute,
    /// Self-destructing charger
    Bomber,
    /// Boss: heavy attacks, guaranteed loot
    Boss,
}

impl ArchetypeKind {
    pub const COUNT: usize = 5;

    pub const ALL: [ArchetypeKind; Self::COUNT] = [
        ArchetypeKind::Walker,
        ArchetypeKind::Runner,
        ArchetypeKind::Brute,
        ArchetypeKind::Bomber,
        ArchetypeKind::Boss,
    ];

    pub fn index(self) -> usize {
        match self {
            ArchetypeKind::Walker => 0,
            ArchetypeKind::Runner => 1,
            ArchetypeKind::Brute => 2,
            ArchetypeKind::Bomber => 3,
            ArchetypeKind::Boss => 4,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            ArchetypeKind::Walker => "walker",
            ArchetypeKind::Runner => "runner",
            ArchetypeKind::Brute => "brute",
            ArchetypeKind::Bomber => "bomber",
            ArchetypeKind::Boss => "boss",
        }
    }

    /// Resolve a level-authored name; unknown names become `Walker`.
    pub fn from_name(name: &str) -> Self {
        Self::ALL
            .iter()
            .copied()
            .find(|kind| kind.name().eq_ignore_ascii_case(name))
            .unwrap_or_else(|| {
                crate::log_warning(&format!("Unknown archetype '{}', falling back to walker", name));
                ArchetypeKind::Walker
            })
    }
}

/// How an archetype attacks once in range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AttackStyle {
    /// Latches onto the player (`Biting`) and chews on a timer
    Grapple,
    /// One instant slam, then cooldown
    Heavy,
    /// Never attacks; arms a fuse near the target
    SelfDestruct,
}

/// Static archetype data
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Archetype {
    pub kind: ArchetypeKind,
    /// Id reported to external collaborators (boss callbacks, loot tables)
    pub external_id: u32,
    pub max_hp: f32,
    /// Full chase speed (units/sec)
    pub speed: f32,
    /// Damage per bite tick / per slam
    pub damage: f32,
    pub score: u32,
    pub xp: u32,
    /// Visual scale; together with `width_scale` defines hit radius and mass
    pub scale: f32,
    pub width_scale: f32,
    /// Center-to-center attack reach
    pub attack_range: f32,
    pub attack_cooldown_ms: f32,
    pub attack_style: AttackStyle,
    pub is_boss: bool,
}

impl Archetype {
    pub const WALKER: Archetype = Archetype {
        kind: ArchetypeKind::Walker,
        external_id: 101,
        max_hp: 40.0,
        speed: 3.2,
        damage: 8.0,
        score: 10,
        xp: 5,
        scale: 1.0,
        width_scale: 1.0,
        attack_range: 3.8,
        attack_cooldown_ms: 1200.0,
        attack_style: AttackStyle::Grapple,
        is_boss: false,
    };

    pub const RUNNER: Archetype = Archetype {
        kind: ArchetypeKind::Runner,
        external_id: 102,
        max_hp: 30.0,
        speed: 5.5,
        damage: 5.0,
        score: 15,
        xp: 6,
        scale: 0.9,
        width_scale: 0.85,
        attack_range: 3.8,
        attack_cooldown_ms: 900.0,
        attack_style: AttackStyle::Grapple,
        is_boss: false,
    };

    pub const BRUTE: Archetype = Archetype {
        kind: ArchetypeKind::Brute,
        external_id: 103,
        max_hp: 220.0,
        speed: 2.4,
        damage: 28.0,
        score: 40,
        xp: 20,
        scale: 1.5,
        width_scale: 1.35,
        attack_range: 7.0,
        attack_cooldown_ms: 2200.0,
        attack_style: AttackStyle::Heavy,
        is_boss: false,
    };

    pub const BOMBER: Archetype = Archetype {
        kind: ArchetypeKind::Bomber,
        external_id: 104,
        max_hp: 50.0,
        speed: 4.2,
        damage: 0.0,
        score: 20,
        xp: 8,
        scale: 1.1,
        width_scale: 1.2,
        attack_range: 3.8,
        attack_cooldown_ms: 0.0,
        attack_style: AttackStyle::SelfDestruct,
        is_boss: false,
    };

    pub const BOSS: Archetype = Archetype {
        kind: ArchetypeKind::Boss,
        external_id: 900,
        max_hp: 1500.0,
        speed: 2.8,
        damage: 40.0,
        score: 500,
        xp: 250,
        scale: 2.4,
        width_scale: 1.6,
        attack_range: 7.0,
        attack_cooldown_ms: 2600.0,
        attack_style: AttackStyle::Heavy,
        is_boss: true,
    };
}

/// Archetype lookup table (part of `SimulationConfig`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArchetypeTable {
    pub archetypes: Vec<Archetype>,
}

impl Default for ArchetypeTable {
    fn default() -> Self {
        Self {
            archetypes: vec![
                Archetype::WALKER,
                Archetype::RUNNER,
                Archetype::BRUTE,
                Archetype::BOMBER,
                Archetype::BOSS,
            ],
        }
    }
}

impl ArchetypeTable {
    /// Template for `kind`; a table without the entry yields the basic walker.
    pub fn get(&self, kind: ArchetypeKind) -> &Archetype {
        self.archetypes
            .iter()
            .find(|archetype| archetype.kind == kind)
            .unwrap_or(&Archetype::WALKER)
    }

    pub fn get_mut(&mut self, kind: ArchetypeKind) -> Option<&mut Archetype> {
        self.archetypes.iter_mut().find(|archetype| archetype.kind == kind)
    }
}
