//! World collaborator interface and a minimal grid implementation.
//!
//! The unit core only needs a narrow view of the world: what kind of tile
//! sits under a position, which structures exist and what they can do, the
//! playable bounds, and a way to tell a unit factory that one of its units
//! is gone. [`World`] captures exactly that. [`GridWorld`] is a small
//! in-memory implementation used by tests and the headless host.

use std::collections::{BTreeMap, VecDeque};

use serde::{Deserialize, Serialize};

use crate::components::{BlockFlag, EntityId, StructureId, TeamId, TilePos, TILE_SIZE};
use crate::controller::UnitCommand;
use crate::math::{Fixed, Vec2Fixed};

/// What occupies a tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum BlockKind {
    /// Open ground.
    #[default]
    Floor,
    /// Static terrain wall.
    Wall,
    /// Construction placeholder for a block being built or deconstructed.
    ConstructSite,
    /// A finished structure.
    Structure,
}

/// A single tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Tile {
    /// Block on the tile.
    pub block: BlockKind,
    /// Whether ground units collide with the tile.
    pub solid: bool,
}

impl Tile {
    /// Open floor.
    pub const FLOOR: Self = Self {
        block: BlockKind::Floor,
        solid: false,
    };

    /// Solid terrain wall.
    pub const WALL: Self = Self {
        block: BlockKind::Wall,
        solid: true,
    };

    /// Solid construction placeholder.
    pub const CONSTRUCT_SITE: Self = Self {
        block: BlockKind::ConstructSite,
        solid: true,
    };

    /// Whether a ground unit standing here must be destroyed.
    ///
    /// Construction placeholders are solid but exempt.
    #[must_use]
    pub fn crushes_ground_units(&self) -> bool {
        self.solid && self.block != BlockKind::ConstructSite
    }
}

/// A static structure placed on the map.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Structure {
    /// Identity, unique for the lifetime of the world.
    pub id: StructureId,
    /// Tile the structure occupies.
    pub tile: TilePos,
    /// Owning team.
    pub team: TeamId,
    /// Capability flags.
    pub flags: Vec<BlockFlag>,
    /// Current command, for command centers.
    pub command: Option<UnitCommand>,
    /// Units produced by this structure that are still alive.
    pub active_units: u32,
}

impl Structure {
    /// Whether the structure carries `flag`.
    #[must_use]
    pub fn has_flag(&self, flag: BlockFlag) -> bool {
        self.flags.contains(&flag)
    }

    /// World-space center of the structure.
    #[must_use]
    pub fn position(&self) -> Vec2Fixed {
        self.tile.world_center()
    }
}

/// Axis-aligned playable area.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bounds {
    /// Lowest corner.
    pub min: Vec2Fixed,
    /// Highest corner.
    pub max: Vec2Fixed,
}

impl Bounds {
    /// Clamp a position into the bounds.
    #[must_use]
    pub fn clamp(&self, position: Vec2Fixed) -> Vec2Fixed {
        Vec2Fixed::new(
            position.x.clamp(self.min.x, self.max.x),
            position.y.clamp(self.min.y, self.max.y),
        )
    }

    /// Whether the position is inside the bounds.
    #[must_use]
    pub fn contains(&self, position: Vec2Fixed) -> bool {
        self.clamp(position) == position
    }
}

/// The slice of world state the unit core reads and notifies.
pub trait World {
    /// Tile at a tile coordinate, or `None` outside the map.
    fn tile(&self, pos: TilePos) -> Option<Tile>;

    /// Structure occupying a tile.
    fn structure_at(&self, pos: TilePos) -> Option<&Structure>;

    /// Every structure, in a stable order.
    fn structures(&self) -> Box<dyn Iterator<Item = &Structure> + '_>;

    /// Ground spawn points used by waves.
    fn ground_spawns(&self) -> Vec<TilePos>;

    /// Playable bounds.
    fn bounds(&self) -> Bounds;

    /// Tell the structure at `at` that `unit` now exists and is bound to it.
    fn notify_unit_spawned(&mut self, at: TilePos, unit: EntityId);

    /// Tell the structure at `at` that `unit` was removed.
    fn notify_unit_removed(&mut self, at: TilePos, unit: EntityId);

    /// Tile under a world position.
    fn tile_at_world(&self, position: Vec2Fixed) -> Option<Tile> {
        TilePos::from_world(position).and_then(|pos| self.tile(pos))
    }
}

/// Removal notifications a [`GridWorld`] remembers; older ones are dropped.
pub const REMOVAL_LOG_CAPACITY: usize = 256;

/// Rectangular tile grid with structures stored by tile.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GridWorld {
    width: u16,
    height: u16,
    tiles: Vec<Tile>,
    structures: BTreeMap<TilePos, Structure>,
    spawns: Vec<TilePos>,
    next_structure: u32,
    removal_log: VecDeque<(TilePos, EntityId)>,
}

impl GridWorld {
    /// Create a world of open floor.
    #[must_use]
    pub fn new(width: u16, height: u16) -> Self {
        Self {
            width,
            height,
            tiles: vec![Tile::FLOOR; usize::from(width) * usize::from(height)],
            structures: BTreeMap::new(),
            spawns: Vec::new(),
            next_structure: 1,
            removal_log: VecDeque::new(),
        }
    }

    fn index(&self, pos: TilePos) -> Option<usize> {
        (pos.x < self.width && pos.y < self.height)
            .then(|| usize::from(pos.y) * usize::from(self.width) + usize::from(pos.x))
    }

    /// Replace a tile. Out-of-range coordinates are ignored.
    pub fn set_tile(&mut self, pos: TilePos, tile: Tile) {
        if let Some(index) = self.index(pos) {
            self.tiles[index] = tile;
        }
    }

    /// Place a structure, replacing anything already on the tile.
    pub fn place_structure(
        &mut self,
        pos: TilePos,
        team: TeamId,
        flags: Vec<BlockFlag>,
    ) -> StructureId {
        let id = StructureId(self.next_structure);
        self.next_structure += 1;
        self.set_tile(
            pos,
            Tile {
                block: BlockKind::Structure,
                solid: true,
            },
        );
        self.structures.insert(
            pos,
            Structure {
                id,
                tile: pos,
                team,
                flags,
                command: None,
                active_units: 0,
            },
        );
        id
    }

    /// Remove the structure on a tile, leaving floor behind.
    pub fn remove_structure(&mut self, pos: TilePos) -> Option<Structure> {
        let removed = self.structures.remove(&pos);
        if removed.is_some() {
            self.set_tile(pos, Tile::FLOOR);
        }
        removed
    }

    /// Mutable access to a structure.
    pub fn structure_mut(&mut self, pos: TilePos) -> Option<&mut Structure> {
        self.structures.get_mut(&pos)
    }

    /// Set the command broadcast by a command center.
    pub fn set_command(&mut self, pos: TilePos, command: UnitCommand) -> bool {
        match self.structures.get_mut(&pos) {
            Some(structure) if structure.has_flag(BlockFlag::CommandCenter) => {
                structure.command = Some(command);
                true
            }
            _ => false,
        }
    }

    /// Register a ground spawn point.
    pub fn add_ground_spawn(&mut self, pos: TilePos) {
        self.spawns.push(pos);
    }

    /// The most recent removal notifications, oldest first, at most
    /// [`REMOVAL_LOG_CAPACITY`] of them.
    #[must_use]
    pub fn removal_log(&self) -> Vec<(TilePos, EntityId)> {
        self.removal_log.iter().copied().collect()
    }
}

impl World for GridWorld {
    fn tile(&self, pos: TilePos) -> Option<Tile> {
        self.index(pos).map(|index| self.tiles[index])
    }

    fn structure_at(&self, pos: TilePos) -> Option<&Structure> {
        self.structures.get(&pos)
    }

    fn structures(&self) -> Box<dyn Iterator<Item = &Structure> + '_> {
        Box::new(self.structures.values())
    }

    fn ground_spawns(&self) -> Vec<TilePos> {
        self.spawns.clone()
    }

    fn bounds(&self) -> Bounds {
        let size = Fixed::from_num(TILE_SIZE);
        Bounds {
            min: Vec2Fixed::ZERO,
            max: Vec2Fixed::new(
                Fixed::from_num(self.width.saturating_sub(1)) * size,
                Fixed::from_num(self.height.saturating_sub(1)) * size,
            ),
        }
    }

    fn notify_unit_spawned(&mut self, at: TilePos, unit: EntityId) {
        if let Some(structure) = self.structures.get_mut(&at) {
            structure.active_units = structure.active_units.saturating_add(1);
        }
        tracing::debug!(unit, x = at.x, y = at.y, "Spawner notified of new unit");
    }

    fn notify_unit_removed(&mut self, at: TilePos, unit: EntityId) {
        if self.removal_log.len() == REMOVAL_LOG_CAPACITY {
            self.removal_log.pop_front();
        }
        self.removal_log.push_back((at, unit));
        if let Some(structure) = self.structures.get_mut(&at) {
            structure.active_units = structure.active_units.saturating_sub(1);
        }
        tracing::debug!(unit, x = at.x, y = at.y, "Spawner notified of unit removal");
    }
}
