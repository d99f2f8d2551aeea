//! Unit type data structures for data-driven unit definitions.

use serde::{Deserialize, Serialize};

use crate::controller::ControllerKind;
use crate::math::{fixed_serde, Fixed};

/// Weapon carried by a unit type.
///
/// Only the cadence and reach live here; what a shot does once fired is
/// decided by whoever consumes the emitted shot events.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct WeaponData {
    /// Identifier of the weapon.
    pub name: String,

    /// Range of the bullet this weapon fires.
    #[serde(with = "fixed_serde")]
    pub range: Fixed,

    /// Ticks between shots on one weapon side.
    pub reload: u32,

    /// Whether the weapon alternates between left and right sides.
    #[serde(default)]
    pub alternate: bool,

    /// Bullet type handed to the ballistics layer.
    pub bullet: String,
}

/// An amount of one item.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct ItemStack {
    /// Item identifier.
    pub item: String,
    /// Number of items.
    pub amount: u32,
}

/// Data-driven unit type definition.
///
/// # Example RON
///
/// ```ron
/// UnitTypeData(
///     name: "dagger",
///     health: 558345748480,       // Fixed-point for 130.0
///     mass: 7516192768,           // 1.75
///     speed: 858993459,           // 0.2
///     max_velocity: 6012954214,   // 1.4
///     drag: 1717986918,           // 0.4
///     rotate_speed: 429496729,    // 0.1
///     hit_size: 34359738368,      // 8.0
///     hit_size_tile: 34359738368,
///     range: 0,
///     weapon: WeaponData(
///         name: "chain-blaster",
///         range: 257698037760,    // 60.0
///         reload: 28,
///         alternate: true,
///         bullet: "standard-copper",
///     ),
///     controller: Ground,
/// )
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnitTypeData {
    /// Unique string identifier for this unit type.
    pub name: String,

    /// Base maximum health before rule multipliers.
    #[serde(with = "fixed_serde")]
    pub health: Fixed,

    /// Mass used by separation.
    #[serde(with = "fixed_serde")]
    pub mass: Fixed,

    /// Acceleration applied per tick while moving.
    #[serde(with = "fixed_serde")]
    pub speed: Fixed,

    /// Velocity cap.
    #[serde(with = "fixed_serde")]
    pub max_velocity: Fixed,

    /// Fraction of velocity lost per tick.
    #[serde(with = "fixed_serde")]
    pub drag: Fixed,

    /// Fraction of the remaining turn applied per tick.
    #[serde(with = "fixed_serde")]
    pub rotate_speed: Fixed,

    /// Hitbox edge length against other entities.
    #[serde(with = "fixed_serde")]
    pub hit_size: Fixed,

    /// Hitbox edge length against tiles.
    #[serde(with = "fixed_serde")]
    pub hit_size_tile: Fixed,

    /// Whether the unit flies over terrain.
    #[serde(default)]
    pub flying: bool,

    /// Whether the unit may target flying units.
    #[serde(default)]
    pub target_air: bool,

    /// Engagement range independent of the weapon.
    #[serde(with = "fixed_serde")]
    pub range: Fixed,

    /// Names of status effects this type ignores.
    #[serde(default)]
    pub immunities: Vec<String>,

    /// The weapon this type carries.
    pub weapon: WeaponData,

    /// Sound played on death.
    #[serde(default = "default_death_sound")]
    pub death_sound: String,

    /// Item capacity.
    #[serde(default)]
    pub item_capacity: u32,

    /// Items released when a unit of this type dies.
    #[serde(default)]
    pub drops: Vec<ItemStack>,

    /// AI controller driving units of this type.
    pub controller: ControllerKind,
}

fn default_death_sound() -> String {
    "unit-explode".to_string()
}

impl UnitTypeData {
    /// Check if this type is immune to the named status effect.
    #[must_use]
    pub fn is_immune_to(&self, status: &str) -> bool {
        self.immunities.iter().any(|s| s == status)
    }
}
