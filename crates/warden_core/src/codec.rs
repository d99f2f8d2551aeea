//! Save and snapshot encoding for units.
//!
//! Both formats share one record schema and differ only in their leading
//! version tag and in how a decoded record is applied:
//!
//! ```text
//! [tag: u8][body fields][type id: u8][spawner: i32]
//! ```
//!
//! The body and trailer are `bincode` with its default fixed-width little
//! endian integers, so the type id takes one byte and the spawner four.
//!
//! A save record produces a new unit marked as loaded. A snapshot record
//! is applied to an existing mirror unit and hands the pose change to its
//! interpolation buffer instead of moving the unit.

use serde::{Deserialize, Serialize};

use crate::components::{TeamId, TilePos};
use crate::content::ContentRegistry;
use crate::error::{GameError, Result};
use crate::math::{fixed_serde, Fixed, Vec2Fixed};
use crate::status::StatusEffects;
use crate::unit::Unit;

/// Version tag of the save record.
pub const SAVE_VERSION: u8 = 0;

/// Version tag of the snapshot record.
pub const WIRE_VERSION: u8 = 1;

const SAVE_FORMAT: &str = "save";
const WIRE_FORMAT: &str = "snapshot";

/// Fields every unit record starts with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BodyRecord {
    /// Owning team.
    pub team: TeamId,
    /// Position.
    pub position: Vec2Fixed,
    /// Velocity.
    pub velocity: Vec2Fixed,
    /// Facing in degrees.
    #[serde(with = "fixed_serde")]
    pub rotation: Fixed,
    /// Health.
    #[serde(with = "fixed_serde")]
    pub health: Fixed,
    /// Whether the unit is dead.
    pub dead: bool,
    /// Active status effects.
    pub status: StatusEffects,
}

/// A complete unit record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitRecord {
    /// Shared body fields.
    pub body: BodyRecord,
    /// Registry id of the unit type.
    pub type_id: u8,
    /// Packed spawner tile, or [`NO_SPAWNER`](crate::components::NO_SPAWNER).
    pub spawner: i32,
}

impl UnitRecord {
    /// Capture a unit.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::Uninitialized`] for a unit without a type.
    pub fn capture(unit: &Unit) -> Result<Self> {
        let type_id = unit.type_id().ok_or(GameError::Uninitialized(unit.id()))?;
        Ok(Self {
            body: BodyRecord {
                team: unit.team(),
                position: unit.position,
                velocity: unit.velocity,
                rotation: unit.rotation,
                health: unit.health(),
                dead: unit.is_dead(),
                status: unit.status().clone(),
            },
            type_id,
            spawner: TilePos::pack_optional(unit.spawner()),
        })
    }

    fn encode(&self, tag: u8, format: &'static str) -> Result<Vec<u8>> {
        let mut bytes = vec![tag];
        bincode::serialize_into(&mut bytes, self).map_err(|e| GameError::Encode {
            format,
            message: e.to_string(),
        })?;
        Ok(bytes)
    }

    fn decode(bytes: &[u8], tag: u8, format: &'static str) -> Result<Self> {
        let (&found, body) = bytes.split_first().ok_or_else(|| GameError::Decode {
            format,
            message: "empty record".to_string(),
        })?;
        if found != tag {
            return Err(GameError::VersionMismatch {
                format,
                expected: u32::from(tag),
                found: u32::from(found),
            });
        }
        bincode::deserialize(body).map_err(|e| GameError::Decode {
            format,
            message: e.to_string(),
        })
    }
}

/// Encode a unit in the save format.
pub fn write_save(unit: &Unit) -> Result<Vec<u8>> {
    UnitRecord::capture(unit)?.encode(SAVE_VERSION, SAVE_FORMAT)
}

/// Decode a save record into a new, loaded unit with the given id.
///
/// # Errors
///
/// Fails on a wrong version tag, malformed bytes, or a type or status id
/// the registry does not know. Nothing is substituted for unknown ids.
pub fn read_save(bytes: &[u8], id: u64, registry: &ContentRegistry) -> Result<Unit> {
    let record = UnitRecord::decode(bytes, SAVE_VERSION, SAVE_FORMAT)?;
    let unit_type = registry.resolve_unit(record.type_id)?;
    record.body.status.validate(registry)?;

    let mut unit = Unit::raw(id);
    unit.init(unit_type, record.body.team)?;
    unit.position = record.body.position;
    unit.velocity = record.body.velocity;
    unit.rotation = record.body.rotation;
    unit.health = record.body.health;
    unit.dead = record.body.dead;
    unit.status = record.body.status;
    unit.spawner = TilePos::unpack(record.spawner);
    unit.loaded = true;
    Ok(unit)
}

/// Encode a unit in the snapshot format.
pub fn write_snapshot(unit: &Unit) -> Result<Vec<u8>> {
    UnitRecord::capture(unit)?.encode(WIRE_VERSION, WIRE_FORMAT)
}

/// Apply a snapshot record to a mirror unit.
///
/// An untyped unit is initialized from the record and placed directly at
/// the authoritative pose. A typed unit keeps its current pose and feeds
/// the old and new poses to its interpolation buffer. The dead flag is not
/// taken from snapshots; mirrors learn of deaths only through death notices.
///
/// # Errors
///
/// Fails on a wrong version tag, malformed bytes, an unknown type or
/// status id, or a record that would change the unit's type or team. The
/// unit is untouched on error.
pub fn read_snapshot(unit: &mut Unit, bytes: &[u8], registry: &ContentRegistry) -> Result<()> {
    let record = UnitRecord::decode(bytes, WIRE_VERSION, WIRE_FORMAT)?;
    let unit_type = registry.resolve_unit(record.type_id)?;
    record.body.status.validate(registry)?;

    let fresh = match unit.type_id() {
        None => true,
        Some(current) if current != record.type_id => {
            return Err(GameError::TypeMismatch {
                unit: unit.id(),
                current,
                incoming: record.type_id,
            });
        }
        Some(_) if unit.team() != record.body.team => {
            return Err(GameError::InvalidState(format!(
                "Snapshot would move unit {} from {} to {}",
                unit.id(),
                unit.team(),
                record.body.team
            )));
        }
        Some(_) => false,
    };

    let old_position = unit.position;
    let old_rotation = unit.rotation;

    if fresh {
        unit.init(unit_type, record.body.team)?;
        unit.loaded = true;
    }
    unit.position = record.body.position;
    unit.velocity = record.body.velocity;
    unit.rotation = record.body.rotation;
    unit.health = record.body.health;
    unit.status = record.body.status;
    unit.spawner = TilePos::unpack(record.spawner);

    if fresh {
        unit.interpolator.snap(unit.position, unit.rotation);
    } else {
        unit.interpolator
            .read(old_position, old_rotation, unit.position, unit.rotation);
        unit.position = old_position;
        unit.rotation = old_rotation;
    }
    Ok(())
}
