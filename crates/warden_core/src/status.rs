//! Active status effects on a unit.
//!
//! Effect definitions live in the [`ContentRegistry`]; a unit only stores
//! which effects are active and for how long.

use serde::{Deserialize, Serialize};

use crate::content::{ContentRegistry, StatusEffect};
use crate::error::Result;
use crate::math::{fixed_serde, Fixed};

/// One active effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StatusEntry {
    /// Registry id of the effect.
    pub effect: u8,
    /// Ticks left before the effect expires.
    #[serde(with = "fixed_serde")]
    pub remaining: Fixed,
}

/// Set of active effects, at most one entry per effect.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StatusEffects {
    entries: Vec<StatusEntry>,
}

impl StatusEffects {
    /// Create an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply an effect, extending it if already active.
    pub fn apply(&mut self, effect: &StatusEffect, duration: Fixed) {
        if let Some(entry) = self.entries.iter_mut().find(|e| e.effect == effect.id) {
            entry.remaining = entry.remaining.max(duration);
        } else {
            self.entries.push(StatusEntry {
                effect: effect.id,
                remaining: duration,
            });
        }
    }

    /// Whether the effect is active.
    #[must_use]
    pub fn has(&self, effect: u8) -> bool {
        self.entries.iter().any(|e| e.effect == effect)
    }

    /// Active entries.
    #[must_use]
    pub fn entries(&self) -> &[StatusEntry] {
        &self.entries
    }

    /// Remove every effect.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Advance all effects by one tick.
    ///
    /// Returns the damage the effects deal this tick. Expired effects are
    /// dropped after contributing their last tick.
    pub fn update(&mut self, registry: &ContentRegistry) -> Fixed {
        let mut damage = Fixed::ZERO;
        for entry in &mut self.entries {
            if let Ok(effect) = registry.resolve_status(entry.effect) {
                damage += effect.damage_per_tick;
            }
            entry.remaining -= Fixed::from_num(1);
        }
        self.entries.retain(|e| e.remaining > Fixed::ZERO);
        damage
    }

    /// Product of the active effects' damage multipliers.
    #[must_use]
    pub fn damage_multiplier(&self, registry: &ContentRegistry) -> Fixed {
        self.product(registry, |e| e.damage_multiplier)
    }

    /// Product of the active effects' speed multipliers.
    #[must_use]
    pub fn speed_multiplier(&self, registry: &ContentRegistry) -> Fixed {
        self.product(registry, |e| e.speed_multiplier)
    }

    fn product(&self, registry: &ContentRegistry, pick: impl Fn(&StatusEffect) -> Fixed) -> Fixed {
        self.entries
            .iter()
            .filter_map(|e| registry.resolve_status(e.effect).ok())
            .fold(Fixed::from_num(1), |acc, effect| acc * pick(&effect))
    }

    /// Check that every active effect exists in `registry`.
    ///
    /// # Errors
    ///
    /// Returns `UnknownType` for the first unregistered effect id.
    pub fn validate(&self, registry: &ContentRegistry) -> Result<()> {
        for entry in &self.entries {
            registry.resolve_status(entry.effect)?;
        }
        Ok(())
    }
}
