//! Target validation and acquisition.
//!
//! Targets are weak [`TargetRef`]s. Every authoritative tick the current
//! reference is re-resolved through the unit storage or the world and
//! dropped if it no longer points at something worth shooting. New targets
//! come from a rate-limited closest-enemy scan or from on-demand flag
//! searches over structures.

use crate::components::{BlockFlag, EntityId, TargetRef, TeamId, TilePos};
use crate::math::{Fixed, Vec2Fixed};
use crate::simulation::SimContext;
use crate::timer::TimerSlot;
use crate::unit::Unit;
use crate::world::Structure;

/// Something a unit can aim at.
pub trait Targetable {
    /// World position.
    fn position(&self) -> Vec2Fixed;
    /// Owning team.
    fn team(&self) -> TeamId;
    /// Whether it is dead and must not be targeted.
    fn is_dead(&self) -> bool;
    /// Whether it is airborne.
    fn is_flying(&self) -> bool;
}

impl Targetable for Unit {
    fn position(&self) -> Vec2Fixed {
        self.position
    }

    fn team(&self) -> TeamId {
        self.team
    }

    fn is_dead(&self) -> bool {
        self.dead
    }

    fn is_flying(&self) -> bool {
        Unit::is_flying(self)
    }
}

impl Targetable for Structure {
    fn position(&self) -> Vec2Fixed {
        Structure::position(self)
    }

    fn team(&self) -> TeamId {
        self.team
    }

    fn is_dead(&self) -> bool {
        false
    }

    fn is_flying(&self) -> bool {
        false
    }
}

/// Resolve a target reference to a live referent.
#[must_use]
pub fn resolve<'a>(target: TargetRef, ctx: &SimContext<'a>) -> Option<&'a dyn Targetable> {
    match target {
        TargetRef::None => None,
        TargetRef::Unit(id) => ctx.units.get(id).map(|u| u as &dyn Targetable),
        TargetRef::Structure { id, tile } => ctx
            .world
            .structure_at(tile)
            .filter(|s| s.id == id)
            .map(|s| s as &dyn Targetable),
    }
}

/// Clear the unit's target if it stopped being valid.
///
/// A unit target is invalid once it is missing, dead, or on the unit's own
/// team. A structure target is invalid once its tile no longer holds the
/// same structure.
pub fn update_targeting(unit: &mut Unit, ctx: &SimContext<'_>) {
    let invalid = match unit.target {
        TargetRef::None => false,
        TargetRef::Unit(id) => ctx
            .units
            .get(id)
            .map_or(true, |t| t.is_dead() || t.team() == unit.team),
        TargetRef::Structure { id, tile } => {
            ctx.world.structure_at(tile).map(|s| s.id) != Some(id)
        }
    };
    if invalid {
        tracing::trace!(unit = unit.id(), target = ?unit.target, "Target invalidated");
        unit.clear_target();
    }
}

/// Reacquire the closest target if the retarget slot has elapsed.
///
/// Returns whether a scan ran.
pub fn retarget(unit: &mut Unit, ctx: &SimContext<'_>) -> bool {
    if unit
        .timer
        .elapsed(TimerSlot::Target, ctx.rules.retarget_interval)
    {
        target_closest(unit, ctx);
        true
    } else {
        false
    }
}

/// Target the closest legal enemy within reach.
///
/// Enemy units are preferred; enemy structures are only considered when
/// no unit qualifies. Exact distance ties go to the lower id. Keeps the
/// current target when nothing is found.
pub fn target_closest(unit: &mut Unit, ctx: &SimContext<'_>) {
    let Some(kind) = unit.unit_type() else {
        return;
    };
    let range = kind.targeting_range();
    if let Some(found) = closest_target(unit, range, ctx) {
        unit.set_target(found);
    }
}

fn closest_target(unit: &Unit, range: Fixed, ctx: &SimContext<'_>) -> Option<TargetRef> {
    let origin = unit.position;
    let range_sq = range * range;
    let targets_air = unit.targets_air();

    let closest_unit = ctx
        .units
        .iter()
        .filter(|other| other.id() != unit.id())
        .filter(|other| unit.team.is_enemy(other.team()) && !other.is_dead())
        .filter(|other| targets_air || !other.is_flying())
        .map(|other| (origin.distance_squared(other.position), other.id()))
        .filter(|(dist, _)| *dist <= range_sq)
        .min();
    if let Some((_, id)) = closest_unit {
        return Some(TargetRef::Unit(id));
    }

    closest_structure(origin, ctx, |s| {
        unit.team.is_enemy(s.team) && origin.distance_squared(s.position()) <= range_sq
    })
    .map(structure_ref)
}

fn closest_structure<'a>(
    origin: Vec2Fixed,
    ctx: &SimContext<'a>,
    accept: impl Fn(&Structure) -> bool,
) -> Option<&'a Structure> {
    ctx.world
        .structures()
        .filter(|s| accept(s))
        .min_by_key(|s| (origin.distance_squared(s.position()), s.id))
}

fn structure_ref(structure: &Structure) -> TargetRef {
    TargetRef::Structure {
        id: structure.id,
        tile: structure.tile,
    }
}

/// Closest structure of the unit's team carrying `flag`.
#[must_use]
pub fn closest_allied<'a>(unit: &Unit, flag: BlockFlag, ctx: &SimContext<'a>) -> Option<&'a Structure> {
    closest_structure(unit.position, ctx, |s| s.team == unit.team && s.has_flag(flag))
}

/// Closest enemy structure carrying `flag`.
#[must_use]
pub fn closest_enemy<'a>(unit: &Unit, flag: BlockFlag, ctx: &SimContext<'a>) -> Option<&'a Structure> {
    closest_structure(unit.position, ctx, |s| unit.team.is_enemy(s.team) && s.has_flag(flag))
}

/// Closest enemy core.
#[must_use]
pub fn closest_enemy_core<'a>(unit: &Unit, ctx: &SimContext<'a>) -> Option<&'a Structure> {
    closest_enemy(unit, BlockFlag::Core, ctx)
}

/// Closest ground spawn point.
#[must_use]
pub fn closest_spawner(unit: &Unit, ctx: &SimContext<'_>) -> Option<TilePos> {
    ctx.world
        .ground_spawns()
        .into_iter()
        .min_by_key(|tile| (unit.position.distance_squared(tile.world_center()), *tile))
}

/// Target the closest allied structure carrying `flag`.
///
/// Returns the adopted structure, or `None` (keeping the old target).
pub fn target_closest_ally_flag<'a>(
    unit: &mut Unit,
    flag: BlockFlag,
    ctx: &SimContext<'a>,
) -> Option<&'a Structure> {
    let found = closest_allied(unit, flag, ctx)?;
    unit.set_target(structure_ref(found));
    Some(found)
}

/// Target the closest enemy structure carrying `flag`.
///
/// Returns the adopted structure, or `None` (keeping the old target).
pub fn target_closest_enemy_flag<'a>(
    unit: &mut Unit,
    flag: BlockFlag,
    ctx: &SimContext<'a>,
) -> Option<&'a Structure> {
    let found = closest_enemy(unit, flag, ctx)?;
    unit.set_target(structure_ref(found));
    Some(found)
}

/// Whether the current target is a structure carrying `flag`.
#[must_use]
pub fn target_has_flag(unit: &Unit, flag: BlockFlag, ctx: &SimContext<'_>) -> bool {
    match unit.target {
        TargetRef::Structure { id, tile } => ctx
            .world
            .structure_at(tile)
            .is_some_and(|s| s.id == id && s.has_flag(flag)),
        _ => false,
    }
}

/// Id of the targeted unit, if the target is a unit.
#[must_use]
pub fn target_unit(unit: &Unit) -> Option<EntityId> {
    match unit.target {
        TargetRef::Unit(id) => Some(id),
        _ => None,
    }
}
