//! Small shared value types.
//!
//! Identifiers, tile coordinates and the weak target reference live here
//! so that the unit, world and targeting modules can share them without
//! depending on each other's internals.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::math::{Fixed, Vec2Fixed};

/// Unique identifier for units.
pub type EntityId = u64;

/// Owning faction of a unit or structure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TeamId(pub u8);

impl TeamId {
    /// Neutral team, never hostile to anyone.
    pub const DERELICT: Self = Self(0);
    /// Default player team.
    pub const SHARDED: Self = Self(1);
    /// Default wave team.
    pub const CRUX: Self = Self(2);

    /// Whether `other` is a valid enemy of this team.
    #[must_use]
    pub fn is_enemy(self, other: Self) -> bool {
        self != other && self != Self::DERELICT && other != Self::DERELICT
    }
}

impl fmt::Display for TeamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "team#{}", self.0)
    }
}

/// Identifier of a static structure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct StructureId(pub u32);

/// World units per tile edge.
pub const TILE_SIZE: i32 = 8;

/// Packed value meaning "no spawner".
pub const NO_SPAWNER: i32 = -1;

/// Integer tile coordinate.
///
/// Packs into a single `i32` (`x` in the high half, `y` in the low half)
/// for saves and snapshots. The packed value `-1` is reserved for
/// [`NO_SPAWNER`], so the tile `(65535, 65535)` cannot be encoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TilePos {
    /// Column.
    pub x: u16,
    /// Row.
    pub y: u16,
}

impl TilePos {
    /// Create a tile coordinate.
    #[must_use]
    pub const fn new(x: u16, y: u16) -> Self {
        Self { x, y }
    }

    /// Pack into the on-wire representation.
    #[must_use]
    pub const fn pack(self) -> i32 {
        ((self.x as u32) << 16 | self.y as u32) as i32
    }

    /// Unpack an on-wire value; [`NO_SPAWNER`] maps to `None`.
    #[must_use]
    pub const fn unpack(packed: i32) -> Option<Self> {
        if packed == NO_SPAWNER {
            return None;
        }
        let bits = packed as u32;
        Some(Self {
            x: (bits >> 16) as u16,
            y: (bits & 0xFFFF) as u16,
        })
    }

    /// Pack an optional tile, using [`NO_SPAWNER`] for `None`.
    #[must_use]
    pub fn pack_optional(tile: Option<Self>) -> i32 {
        tile.map_or(NO_SPAWNER, Self::pack)
    }

    /// World-space center of this tile.
    #[must_use]
    pub fn world_center(self) -> Vec2Fixed {
        let size = Fixed::from_num(TILE_SIZE);
        Vec2Fixed::new(
            Fixed::from_num(self.x) * size,
            Fixed::from_num(self.y) * size,
        )
    }

    /// Tile containing a world position, if it has non-negative coordinates.
    #[must_use]
    pub fn from_world(position: Vec2Fixed) -> Option<Self> {
        let size = Fixed::from_num(TILE_SIZE);
        let x = (position.x / size).round().checked_to_num::<u16>()?;
        let y = (position.y / size).round().checked_to_num::<u16>()?;
        Some(Self { x, y })
    }
}

/// Capability flag carried by a structure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum BlockFlag {
    /// Issues commands to allied units.
    CommandCenter,
    /// Produces units and tracks the ones it produced.
    UnitFactory,
    /// Team core.
    Core,
    /// Rally point for commanded units.
    Rally,
    /// Defensive turret.
    Turret,
    /// Generates power.
    Producer,
}

/// Weak reference to whatever a unit is aiming at.
///
/// Never owns the referent. It is resolved through the unit storage or
/// the world each tick and cleared as soon as it stops resolving.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum TargetRef {
    /// No target.
    #[default]
    None,
    /// Another unit.
    Unit(EntityId),
    /// A structure at a tile; the id detects replacement by a new structure.
    Structure {
        /// Structure identity at the time it was targeted.
        id: StructureId,
        /// Tile the structure occupies.
        tile: TilePos,
    },
}

impl TargetRef {
    /// Whether there is no target.
    #[must_use]
    pub const fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }

    /// Whether there is a target.
    #[must_use]
    pub const fn is_some(&self) -> bool {
        !self.is_none()
    }
}
