//! Content registry: unit types and status effects by numeric id.
//!
//! The registry is built once, then shared read-only (behind an `Arc`)
//! by every simulation that uses it. Ids are assigned in registration
//! order and are what saves and snapshots carry on the wire.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::controller::ControllerKind;
use crate::data::{ContentData, ItemStack, StatusEffectData, UnitTypeData, WeaponData};
use crate::error::{GameError, Result};
use crate::math::Fixed;

/// Category a content id is resolved under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ContentCategory {
    /// Unit types.
    Unit,
    /// Status effects.
    Status,
}

impl fmt::Display for ContentCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unit => f.write_str("unit"),
            Self::Status => f.write_str("status"),
        }
    }
}

/// Registered unit type. Shared by every unit of this type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnitType {
    /// Numeric id written to saves and snapshots.
    pub id: u8,
    /// Unique name.
    pub name: String,
    /// Base maximum health.
    pub health: Fixed,
    /// Mass used by separation.
    pub mass: Fixed,
    /// Acceleration per tick.
    pub speed: Fixed,
    /// Velocity cap.
    pub max_velocity: Fixed,
    /// Fraction of velocity lost per tick.
    pub drag: Fixed,
    /// Fraction of the remaining turn applied per tick.
    pub rotate_speed: Fixed,
    /// Hitbox edge against entities.
    pub hit_size: Fixed,
    /// Hitbox edge against tiles.
    pub hit_size_tile: Fixed,
    /// Flies over terrain.
    pub flying: bool,
    /// May target flying units.
    pub target_air: bool,
    /// Engagement range independent of the weapon.
    pub range: Fixed,
    /// Status effect names this type ignores.
    pub immunities: Vec<String>,
    /// Carried weapon.
    pub weapon: WeaponData,
    /// Sound played on death.
    pub death_sound: String,
    /// Item capacity.
    pub item_capacity: u32,
    /// Items released on death.
    pub drops: Vec<ItemStack>,
    /// AI controller.
    pub controller: ControllerKind,
}

impl UnitType {
    fn from_data(id: u8, data: UnitTypeData) -> Self {
        Self {
            id,
            name: data.name,
            health: data.health,
            mass: data.mass,
            speed: data.speed,
            max_velocity: data.max_velocity,
            drag: data.drag,
            rotate_speed: data.rotate_speed,
            hit_size: data.hit_size,
            hit_size_tile: data.hit_size_tile,
            flying: data.flying,
            target_air: data.target_air,
            range: data.range,
            immunities: data.immunities,
            weapon: data.weapon,
            death_sound: data.death_sound,
            item_capacity: data.item_capacity,
            drops: data.drops,
            controller: data.controller,
        }
    }

    /// Reach used for closest-target scans.
    #[must_use]
    pub fn targeting_range(&self) -> Fixed {
        self.weapon.range.max(self.range)
    }

    /// Check immunity against a status effect.
    #[must_use]
    pub fn is_immune(&self, effect: &StatusEffect) -> bool {
        self.immunities.iter().any(|name| *name == effect.name)
    }
}

/// Registered status effect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusEffect {
    /// Numeric id.
    pub id: u8,
    /// Unique name.
    pub name: String,
    /// Outgoing damage multiplier.
    pub damage_multiplier: Fixed,
    /// Movement multiplier.
    pub speed_multiplier: Fixed,
    /// Damage per tick.
    pub damage_per_tick: Fixed,
}

/// Name of the status effect that marks boss units.
pub const BOSS_STATUS: &str = "boss";

/// Read-only lookup of unit types and status effects.
#[derive(Debug, Clone, Default)]
pub struct ContentRegistry {
    units: Vec<Arc<UnitType>>,
    statuses: Vec<Arc<StatusEffect>>,
}

impl ContentRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry from a content set.
    pub fn from_data(data: ContentData) -> Result<Self> {
        let mut registry = Self::new();
        for unit in data.units {
            registry.register_unit(unit)?;
        }
        for status in data.status_effects {
            registry.register_status(status)?;
        }
        Ok(registry)
    }

    /// Parse a RON [`ContentData`] document and build a registry from it.
    pub fn from_ron(source: &str) -> Result<Self> {
        let data: ContentData = ron::from_str(source).map_err(|e| GameError::DataParseError {
            path: "<content>".to_string(),
            message: e.to_string(),
        })?;
        Self::from_data(data)
    }

    /// Register a unit type and return its id.
    pub fn register_unit(&mut self, data: UnitTypeData) -> Result<u8> {
        if self.units.iter().any(|u| u.name == data.name) {
            return Err(GameError::InvalidState(format!(
                "Duplicate unit type '{}'",
                data.name
            )));
        }
        let id = next_id(self.units.len(), ContentCategory::Unit)?;
        tracing::debug!(id, name = %data.name, "Registered unit type");
        self.units.push(Arc::new(UnitType::from_data(id, data)));
        Ok(id)
    }

    /// Register a status effect and return its id.
    pub fn register_status(&mut self, data: StatusEffectData) -> Result<u8> {
        if self.statuses.iter().any(|s| s.name == data.name) {
            return Err(GameError::InvalidState(format!(
                "Duplicate status effect '{}'",
                data.name
            )));
        }
        let id = next_id(self.statuses.len(), ContentCategory::Status)?;
        self.statuses.push(Arc::new(StatusEffect {
            id,
            name: data.name,
            damage_multiplier: data.damage_multiplier,
            speed_multiplier: data.speed_multiplier,
            damage_per_tick: data.damage_per_tick,
        }));
        Ok(id)
    }

    /// Resolve a unit type by id.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::UnknownType`] if no unit type has this id.
    pub fn resolve_unit(&self, id: u8) -> Result<Arc<UnitType>> {
        self.units
            .get(usize::from(id))
            .cloned()
            .ok_or(GameError::UnknownType {
                category: ContentCategory::Unit,
                id,
            })
    }

    /// Resolve a status effect by id.
    pub fn resolve_status(&self, id: u8) -> Result<Arc<StatusEffect>> {
        self.statuses
            .get(usize::from(id))
            .cloned()
            .ok_or(GameError::UnknownType {
                category: ContentCategory::Status,
                id,
            })
    }

    /// Look up a unit type by name.
    pub fn unit_named(&self, name: &str) -> Result<Arc<UnitType>> {
        self.units
            .iter()
            .find(|u| u.name == name)
            .cloned()
            .ok_or_else(|| GameError::UnknownTypeName {
                category: ContentCategory::Unit,
                name: name.to_string(),
            })
    }

    /// Look up a status effect by name.
    pub fn status_named(&self, name: &str) -> Result<Arc<StatusEffect>> {
        self.statuses
            .iter()
            .find(|s| s.name == name)
            .cloned()
            .ok_or_else(|| GameError::UnknownTypeName {
                category: ContentCategory::Status,
                name: name.to_string(),
            })
    }

    /// Number of registered unit types.
    #[must_use]
    pub fn unit_count(&self) -> usize {
        self.units.len()
    }
}

fn next_id(len: usize, category: ContentCategory) -> Result<u8> {
    u8::try_from(len)
        .map_err(|_| GameError::InvalidState(format!("Too many {category} types registered")))
}
