//! Unit activation, death and removal.
//!
//! Death runs once per unit no matter how many times it is triggered.
//! Everything it produces (drops, effects, spawner notices, outgoing
//! messages, pending removals) is written to a [`LifecycleQueue`] that the
//! simulation drains at fixed points, so a dying unit stays a readable
//! member of the unit storage until the pass that killed it has finished.
//!
//! The authority owns loot. A mirror only ever runs the visual half of the
//! protocol in response to a [`DeathNotice`](crate::net::DeathNotice).

use std::collections::BTreeSet;
use std::fmt;

use crate::components::{BlockFlag, EntityId, TilePos};
use crate::content::UnitType;
use crate::controller;
use crate::data::ItemStack;
use crate::math::{Fixed, Vec2Fixed};
use crate::net::{DeathNotice, NetMessage, NetRole};
use crate::simulation::SimContext;
use crate::unit::Unit;

/// Decides what a dying unit drops.
pub trait DropResolver: fmt::Debug + Send + Sync {
    /// Items released by `unit` of type `kind`.
    fn resolve(&self, unit: &Unit, kind: &UnitType) -> Vec<ItemStack>;
}

/// Drops exactly the stacks listed on the unit type.
#[derive(Debug, Clone, Copy, Default)]
pub struct TypeDrops;

impl DropResolver for TypeDrops {
    fn resolve(&self, _unit: &Unit, kind: &UnitType) -> Vec<ItemStack> {
        kind.drops.clone()
    }
}

/// Items released at a death location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DropEvent {
    /// Unit that dropped the items.
    pub unit: EntityId,
    /// Where the items fall.
    pub position: Vec2Fixed,
    /// The items.
    pub stack: ItemStack,
}

/// Sound and visual cue for a death.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeathEffect {
    /// Unit that died.
    pub unit: EntityId,
    /// Where it died.
    pub position: Vec2Fixed,
    /// Sound to play.
    pub sound: String,
    /// Whether the unit was a boss.
    pub boss: bool,
}

/// Notice owed to the structure that produced a unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpawnerNotice {
    /// Tile of the producing structure.
    pub tile: TilePos,
    /// The unit being removed.
    pub unit: EntityId,
}

/// Output of the lifecycle protocol, drained by the simulation.
#[derive(Debug, Default)]
pub struct LifecycleQueue {
    /// Loot released by authoritative deaths.
    pub drops: Vec<DropEvent>,
    /// Death cues.
    pub effects: Vec<DeathEffect>,
    /// Spawner notifications not yet delivered to the world.
    pub notices: Vec<SpawnerNotice>,
    /// Messages for peers.
    pub messages: Vec<NetMessage>,
    /// Units to remove once the current pass ends.
    pub removals: BTreeSet<EntityId>,
}

/// Put a unit into play.
///
/// Sets the start state, restores full health unless the unit came from a
/// save, and applies the command of an allied command center in range.
pub fn activate(unit: &mut Unit, ctx: &SimContext<'_>) {
    let Some(kind) = unit.unit_type().map(|t| t.controller) else {
        return;
    };
    unit.set_state(ctx, Some(controller::start_state(kind)));
    if !unit.loaded {
        unit.health = unit.max_health(ctx.rules);
    }
    if let Some(command) = controller::command(unit, ctx) {
        controller::on_command(unit, ctx, command);
    }
}

/// Run the death protocol.
///
/// Returns `false` without side effects if it already ran for this unit.
/// Loot is only resolved under authority. A mirror unbinds from its
/// spawner here, since the authority will never send it a removal; the
/// authority unbinds in [`finalize_removal`]. A server also queues a
/// [`NetMessage::UnitDeath`] for its peers.
pub fn on_death(
    unit: &mut Unit,
    ctx: &SimContext<'_>,
    drops: &dyn DropResolver,
    queue: &mut LifecycleQueue,
) -> bool {
    if unit.death_handled {
        tracing::trace!(unit = unit.id(), "Death already handled");
        return false;
    }
    unit.death_handled = true;
    unit.dead = true;

    if let Some(kind) = unit.unit_type().cloned() {
        if ctx.role.is_authority() {
            for stack in drops.resolve(unit, &kind) {
                queue.drops.push(DropEvent {
                    unit: unit.id(),
                    position: unit.position,
                    stack,
                });
            }
        }
        queue.effects.push(DeathEffect {
            unit: unit.id(),
            position: unit.position,
            sound: kind.death_sound.clone(),
            boss: unit.is_boss(ctx.registry),
        });
    }

    if ctx.role.is_mirror() {
        if let Some(tile) = unit.take_spawner() {
            queue.notices.push(SpawnerNotice {
                tile,
                unit: unit.id(),
            });
        }
    }
    if ctx.role.broadcasts() {
        queue
            .messages
            .push(NetMessage::UnitDeath(DeathNotice { unit: unit.id() }));
    }

    queue.removals.insert(unit.id());
    tracing::debug!(unit = unit.id(), role = ?ctx.role, "Unit died");
    true
}

/// Force a policy kill through the death protocol.
///
/// Mirrors never decide deaths, so this does nothing there.
pub fn kill(
    unit: &mut Unit,
    ctx: &SimContext<'_>,
    drops: &dyn DropResolver,
    queue: &mut LifecycleQueue,
) -> bool {
    if !ctx.role.is_authority() {
        return false;
    }
    unit.health = unit.health.min(Fixed::ZERO);
    on_death(unit, ctx, drops, queue)
}

/// Unbind a unit that is leaving the simulation.
///
/// The spawner reference is cleared here at the latest. Only the authority
/// notifies the structure; a mirror already did so on death.
pub fn finalize_removal(unit: &mut Unit, role: NetRole, queue: &mut LifecycleQueue) {
    if let Some(tile) = unit.take_spawner() {
        if role.is_authority() {
            queue.notices.push(SpawnerNotice {
                tile,
                unit: unit.id(),
            });
        }
    }
    tracing::debug!(unit = unit.id(), "Unit removed");
}

/// Whether a ground unit is standing inside solid terrain.
#[must_use]
pub fn crushed_by_terrain(unit: &Unit, ctx: &SimContext<'_>) -> bool {
    !unit.is_flying()
        && ctx
            .world
            .tile_at_world(unit.position)
            .is_some_and(|tile| tile.crushes_ground_units())
}

/// Whether the unit's producing structure is gone or is no factory.
#[must_use]
pub fn spawner_lost(unit: &Unit, ctx: &SimContext<'_>) -> bool {
    unit.spawner().is_some_and(|tile| {
        ctx.world
            .structure_at(tile)
            .map_or(true, |s| !s.has_flag(BlockFlag::UnitFactory))
    })
}
