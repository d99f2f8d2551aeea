//! Global ruleset shared read-only by every unit.

use serde::{Deserialize, Serialize};

use crate::error::{GameError, Result};
use crate::math::{fixed_serde, Fixed};
use crate::timer::RETARGET_INTERVAL;

/// Game rules that scale or gate unit behavior.
///
/// # Example RON
///
/// ```ron
/// Rules(
///     unit_health_multiplier: 8589934592,  // 2.0
///     retarget_interval: 30,
/// )
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Rules {
    /// Multiplier on every unit type's base health.
    #[serde(with = "fixed_serde")]
    pub unit_health_multiplier: Fixed,

    /// Multiplier on damage dealt by units.
    #[serde(with = "fixed_serde")]
    pub unit_damage_multiplier: Fixed,

    /// Ticks between closest-target scans.
    pub retarget_interval: u32,

    /// Distance within which an allied command center commands a unit.
    /// `None` means command centers reach the whole map.
    #[serde(with = "crate::math::option_fixed_serde")]
    pub command_radius: Option<Fixed>,

    /// Ticks a hit flash stays visible after damage.
    pub hit_flash_ticks: u32,
}

impl Default for Rules {
    fn default() -> Self {
        Self {
            unit_health_multiplier: Fixed::from_num(1),
            unit_damage_multiplier: Fixed::from_num(1),
            retarget_interval: RETARGET_INTERVAL,
            command_radius: None,
            hit_flash_ticks: 9,
        }
    }
}

impl Rules {
    /// Parse rules from RON. Missing fields keep their defaults.
    pub fn from_ron(source: &str) -> Result<Self> {
        ron::from_str(source).map_err(|e| GameError::DataParseError {
            path: "<rules>".to_string(),
            message: e.to_string(),
        })
    }
}
