//! Weapon table: bullet weapons and throwables in one data type
//!
//! Architecture:
//! - `WeaponStats` is plain data looked up by `WeaponId` from `WeaponTable`
//! - `Delivery` decides how `fire()` spawns projectiles (bullet pellets vs one arc)
//! - Piercing, high-impact class, damage cause and status payload are per weapon
//!
//! Unknown weapon names resolve to the pistol.

use serde::{Deserialize, Serialize};

use crate::agent::DamageCause;

/// Weapon identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WeaponId {
    Pistol,
    Revolver,
    Shotgun,
    Rifle,
    Smg,
    Tesla,
    Flare,
    Grenade,
    Molotov,
    Flashbang,
}

impl WeaponId {
    pub const ALL: [WeaponId; 10] = [
        WeaponId::Pistol,
        WeaponId::Revolver,
        WeaponId::Shotgun,
        WeaponId::Rifle,
        WeaponId::Smg,
        WeaponId::Tesla,
        WeaponId::Flare,
        WeaponId::Grenade,
        WeaponId::Molotov,
        WeaponId::Flashbang,
    ];

    pub fn name(self) -> &'static str {
        match self {
            WeaponId::Pistol => "pistol",
            WeaponId::Revolver => "revolver",
            WeaponId::Shotgun => "shotgun",
            WeaponId::Rifle => "rifle",
            WeaponId::Smg => "smg",
            WeaponId::Tesla => "tesla",
            WeaponId::Flare => "flare",
            WeaponId::Grenade => "grenade",
            WeaponId::Molotov => "molotov",
            WeaponId::Flashbang => "flashbang",
        }
    }

    /// Resolve a weapon name; unknown names become `Pistol`.
    pub fn from_name(name: &str) -> Self {
        Self::ALL
            .iter()
            .copied()
            .find(|id| id.name().eq_ignore_ascii_case(name))
            .unwrap_or_else(|| {
                crate::log_warning(&format!("Unknown weapon '{}', falling back to pistol", name));
                WeaponId::Pistol
            })
    }
}

/// Piercing parameters: remaining damage is multiplied by `decay` after
/// every hit, and the bullet stops once it drops below `floor`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pierce {
    pub decay: f32,
    pub floor: f32,
}

/// Which hits count as high impact (lethal high-impact hits gib)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ImpactClass {
    Normal,
    /// Shotgun-like: high impact when the hit lands close to the muzzle
    CloseRange,
    /// Revolver-like: high impact while the bullet keeps most of its damage
    FullPower,
}

/// Status effect a bullet leaves on the agent it hits
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum StatusPayload {
    None,
    /// Seconds of stun
    Stun(f32),
    /// Seconds of burning
    Burn(f32),
}

/// What a throwable does on detonation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Payload {
    Explosive {
        damage: f32,
        min_force: f32,
        max_force: f32,
    },
    Incendiary {
        zone_radius: f32,
        zone_lifetime: f32,
        tick_damage: f32,
        tick_interval: f32,
    },
    Flash {
        blind: f32,
        stun: f32,
    },
}

/// Throwable arc parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ThrowableStats {
    /// Seconds until detonation if the arc never touches the ground
    pub fuse: f32,
    /// Effect radius (agents within `radius + agent radius` are affected)
    pub radius: f32,
    /// Launch speed along the throw direction
    pub throw_speed: f32,
    /// Extra upward launch velocity
    pub throw_lift: f32,
    pub payload: Payload,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Delivery {
    Bullet,
    Throwable(ThrowableStats),
}

/// Static weapon data
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WeaponStats {
    pub id: WeaponId,
    /// Damage per bullet / pellet
    pub base_damage: f32,
    /// Max yaw deviation per pellet (radians)
    pub spread: f32,
    /// Shots per second (the host enforces the cadence)
    pub fire_rate: f32,
    pub magazine: u32,
    pub projectile_speed: f32,
    /// Bullet lifetime (seconds)
    pub lifetime: f32,
    pub pellets: u32,
    /// Gunshot noise radius heard by agents
    pub hearing_range: f32,
    /// Knockback force applied on hit
    pub knockback: f32,
    pub pierce: Option<Pierce>,
    pub impact_class: ImpactClass,
    pub cause: DamageCause,
    pub status: StatusPayload,
    pub delivery: Delivery,
}

impl WeaponStats {
    pub const PISTOL: WeaponStats = WeaponStats {
        id: WeaponId::Pistol,
        base_damage: 25.0,
        spread: 0.02,
        fire_rate: 4.0,
        magazine: 12,
        projectile_speed: 80.0,
        lifetime: 1.5,
        pellets: 1,
        hearing_range: 25.0,
        knockback: 1.5,
        pierce: None,
        impact_class: ImpactClass::Normal,
        cause: DamageCause::Ballistic,
        status: StatusPayload::None,
        delivery: Delivery::Bullet,
    };

    pub const REVOLVER: WeaponStats = WeaponStats {
        id: WeaponId::Revolver,
        base_damage: 60.0,
        spread: 0.01,
        fire_rate: 1.5,
        magazine: 6,
        projectile_speed: 110.0,
        lifetime: 1.5,
        pellets: 1,
        hearing_range: 35.0,
        knockback: 4.0,
        pierce: Some(Pierce { decay: 0.7, floor: 10.0 }),
        impact_class: ImpactClass::FullPower,
        cause: DamageCause::Ballistic,
        status: StatusPayload::None,
        delivery: Delivery::Bullet,
    };

    pub const SHOTGUN: WeaponStats = WeaponStats {
        id: WeaponId::Shotgun,
        base_damage: 15.0,
        spread: 0.09,
        fire_rate: 1.2,
        magazine: 6,
        projectile_speed: 70.0,
        lifetime: 0.6,
        pellets: 8,
        hearing_range: 40.0,
        knockback: 3.0,
        pierce: None,
        impact_class: ImpactClass::CloseRange,
        cause: DamageCause::Ballistic,
        status: StatusPayload::None,
        delivery: Delivery::Bullet,
    };

    pub const RIFLE: WeaponStats = WeaponStats {
        id: WeaponId::Rifle,
        base_damage: 35.0,
        spread: 0.015,
        fire_rate: 8.0,
        magazine: 30,
        projectile_speed: 120.0,
        lifetime: 1.5,
        pellets: 1,
        hearing_range: 45.0,
        knockback: 2.0,
        pierce: Some(Pierce { decay: 0.8, floor: 12.0 }),
        impact_class: ImpactClass::Normal,
        cause: DamageCause::Ballistic,
        status: StatusPayload::None,
        delivery: Delivery::Bullet,
    };

    pub const SMG: WeaponStats = WeaponStats {
        id: WeaponId::Smg,
        base_damage: 14.0,
        spread: 0.05,
        fire_rate: 12.0,
        magazine: 40,
        projectile_speed: 90.0,
        lifetime: 1.2,
        pellets: 1,
        hearing_range: 28.0,
        knockback: 1.0,
        pierce: None,
        impact_class: ImpactClass::Normal,
        cause: DamageCause::Ballistic,
        status: StatusPayload::None,
        delivery: Delivery::Bullet,
    };

    pub const TESLA: WeaponStats = WeaponStats {
        id: WeaponId::Tesla,
        base_damage: 20.0,
        spread: 0.0,
        fire_rate: 3.0,
        magazine: 20,
        projectile_speed: 60.0,
        lifetime: 1.0,
        pellets: 1,
        hearing_range: 20.0,
        knockback: 0.5,
        pierce: Some(Pierce { decay: 0.85, floor: 8.0 }),
        impact_class: ImpactClass::Normal,
        cause: DamageCause::Electrical,
        status: StatusPayload::Stun(0.6),
        delivery: Delivery::Bullet,
    };

    pub const FLARE: WeaponStats = WeaponStats {
        id: WeaponId::Flare,
        base_damage: 12.0,
        spread: 0.02,
        fire_rate: 2.0,
        magazine: 8,
        projectile_speed: 50.0,
        lifetime: 2.0,
        pellets: 1,
        hearing_range: 20.0,
        knockback: 0.5,
        pierce: None,
        impact_class: ImpactClass::Normal,
        cause: DamageCause::Incendiary,
        status: StatusPayload::Burn(3.0),
        delivery: Delivery::Bullet,
    };

    pub const GRENADE: WeaponStats = WeaponStats {
        id: WeaponId::Grenade,
        base_damage: 160.0,
        spread: 0.0,
        fire_rate: 1.0,
        magazine: 1,
        projectile_speed: 14.0,
        lifetime: 2.0,
        pellets: 1,
        hearing_range: 60.0,
        knockback: 0.0,
        pierce: None,
        impact_class: ImpactClass::Normal,
        cause: DamageCause::Explosive,
        status: StatusPayload::None,
        delivery: Delivery::Throwable(ThrowableStats {
            fuse: 2.0,
            radius: 10.0,
            throw_speed: 14.0,
            throw_lift: 6.0,
            payload: Payload::Explosive {
                damage: 160.0,
                min_force: 6.0,
                max_force: 24.0,
            },
        }),
    };

    pub const MOLOTOV: WeaponStats = WeaponStats {
        id: WeaponId::Molotov,
        base_damage: 15.0,
        spread: 0.0,
        fire_rate: 1.0,
        magazine: 1,
        projectile_speed: 12.0,
        lifetime: 3.0,
        pellets: 1,
        hearing_range: 30.0,
        knockback: 0.0,
        pierce: None,
        impact_class: ImpactClass::Normal,
        cause: DamageCause::Incendiary,
        status: StatusPayload::None,
        delivery: Delivery::Throwable(ThrowableStats {
            fuse: 3.0,
            radius: 15.0,
            throw_speed: 12.0,
            throw_lift: 5.0,
            payload: Payload::Incendiary {
                zone_radius: 15.0,
                zone_lifetime: 5.5,
                tick_damage: 15.0,
                tick_interval: 0.5,
            },
        }),
    };

    pub const FLASHBANG: WeaponStats = WeaponStats {
        id: WeaponId::Flashbang,
        base_damage: 0.0,
        spread: 0.0,
        fire_rate: 1.0,
        magazine: 1,
        projectile_speed: 14.0,
        lifetime: 1.5,
        pellets: 1,
        hearing_range: 50.0,
        knockback: 0.0,
        pierce: None,
        impact_class: ImpactClass::Normal,
        cause: DamageCause::Ballistic,
        status: StatusPayload::None,
        delivery: Delivery::Throwable(ThrowableStats {
            fuse: 1.5,
            radius: 12.0,
            throw_speed: 14.0,
            throw_lift: 6.0,
            payload: Payload::Flash { blind: 3.0, stun: 2.0 },
        }),
    };

    pub fn is_throwable(&self) -> bool {
        matches!(self.delivery, Delivery::Throwable(_))
    }
}

/// Weapon lookup table (part of `SimulationConfig`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeaponTable {
    pub weapons: Vec<WeaponStats>,
}

impl Default for WeaponTable {
    fn default() -> Self {
        Self {
            weapons: vec![
                WeaponStats::PISTOL,
                WeaponStats::REVOLVER,
                WeaponStats::SHOTGUN,
                WeaponStats::RIFLE,
                WeaponStats::SMG,
                WeaponStats::TESLA,
                WeaponStats::FLARE,
                WeaponStats::GRENADE,
                WeaponStats::MOLOTOV,
                WeaponStats::FLASHBANG,
            ],
        }
    }
}

impl WeaponTable {
    /// Stats for `id`; a table without the entry yields the pistol.
    pub fn get(&self, id: WeaponId) -> &WeaponStats {
        self.weapons
            .iter()
            .find(|weapon| weapon.id == id)
            .unwrap_or(&WeaponStats::PISTOL)
    }

    pub fn get_mut(&mut self, id: WeaponId) -> Option<&mut WeaponStats> {
        self.weapons.iter_mut().find(|weapon| weapon.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_weapon_is_pistol() {
        assert_eq!(WeaponId::from_name("railgun"), WeaponId::Pistol);
        assert_eq!(WeaponId::from_name("Shotgun"), WeaponId::Shotgun);
    }

    #[test]
    fn test_table_fallback() {
        let table = WeaponTable { weapons: vec![WeaponStats::SHOTGUN] };
        assert_eq!(table.get(WeaponId::Shotgun).pellets, 8);
        assert_eq!(table.get(WeaponId::Rifle).id, WeaponId::Pistol);
    }

    #[test]
    fn test_throwables_are_flagged() {
        let table = WeaponTable::default();
        assert!(table.get(WeaponId::Grenade).is_throwable());
        assert!(table.get(WeaponId::Molotov).is_throwable());
        assert!(!table.get(WeaponId::Revolver).is_throwable());
    }

    #[test]
    fn test_tesla_is_electrical_and_stuns() {
        let tesla = *WeaponTable::default().get(WeaponId::Tesla);
        assert_eq!(tesla.cause, DamageCause::Electrical);
        assert_eq!(tesla.status, StatusPayload::Stun(0.6));
    }
}
