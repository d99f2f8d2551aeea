//! Status effect data structures.

use serde::{Deserialize, Serialize};

use crate::math::{fixed_serde, Fixed};

/// Data-driven status effect definition.
///
/// # Example RON
///
/// ```ron
/// StatusEffectData(
///     name: "burning",
///     damage_multiplier: 4294967296,  // 1.0
///     speed_multiplier: 4294967296,   // 1.0
///     damage_per_tick: 257698037,     // 0.06
/// )
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StatusEffectData {
    /// Unique string identifier.
    pub name: String,

    /// Multiplier applied to outgoing damage while active.
    #[serde(with = "fixed_serde", default = "one")]
    pub damage_multiplier: Fixed,

    /// Multiplier applied to movement while active.
    #[serde(with = "fixed_serde", default = "one")]
    pub speed_multiplier: Fixed,

    /// Damage taken every tick while active.
    #[serde(with = "fixed_serde", default)]
    pub damage_per_tick: Fixed,
}

fn one() -> Fixed {
    Fixed::from_num(1)
}

impl StatusEffectData {
    /// A status with no gameplay effect beyond being present.
    #[must_use]
    pub fn marker(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            damage_multiplier: one(),
            speed_multiplier: one(),
            damage_per_tick: Fixed::ZERO,
        }
    }
}
