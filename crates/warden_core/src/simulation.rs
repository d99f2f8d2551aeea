//! Core simulation loop.
//!
//! The simulation runs at a fixed tick rate and advances every unit once
//! per tick, in ascending id order. It owns the units, the world, the
//! network role and the message queues; everything a unit reads during its
//! own update is handed to it through a [`SimContext`].
//!
//! # Determinism
//!
//! All operations in this module are fully deterministic:
//! - No floating-point math (uses fixed-point via [`Fixed`])
//! - No system randomness
//! - Consistent iteration order (sorted entity IDs)
//! - Same inputs always produce same outputs
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//!
//! use warden_core::components::TeamId;
//! use warden_core::content::ContentRegistry;
//! use warden_core::math::Vec2Fixed;
//! use warden_core::net::NetRole;
//! use warden_core::rules::Rules;
//! use warden_core::simulation::Simulation;
//! use warden_core::world::GridWorld;
//!
//! let registry = ContentRegistry::from_ron(
//!     r#"ContentData(units: [UnitTypeData(
//!         name: "dagger", health: 558345748480, mass: 4294967296,
//!         speed: 2147483648, max_velocity: 8589934592, drag: 1073741824,
//!         rotate_speed: 1073741824, hit_size: 34359738368,
//!         hit_size_tile: 34359738368, range: 0,
//!         weapon: WeaponData(name: "blaster", range: 257698037760,
//!             reload: 20, bullet: "standard"),
//!         controller: Ground,
//!     )])"#,
//! )
//! .unwrap();
//!
//! let mut sim = Simulation::new(
//!     Arc::new(registry),
//!     Rules::default(),
//!     GridWorld::new(32, 32),
//!     NetRole::Standalone,
//! );
//! let unit = sim.spawn_unit(0, TeamId::SHARDED, Vec2Fixed::ZERO, None).unwrap();
//! sim.tick();
//! assert_eq!(sim.get_tick(), 1);
//! assert!(sim.unit(unit).is_some());
//! ```

use std::collections::hash_map::DefaultHasher;
use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::codec;
use crate::components::{EntityId, TeamId, TilePos};
use crate::content::ContentRegistry;
use crate::controller::{self, ShotEvent};
use crate::error::{GameError, Result};
use crate::lifecycle::{self, DeathEffect, DropEvent, DropResolver, LifecycleQueue, TypeDrops};
use crate::math::{Fixed, Vec2Fixed};
use crate::net::{DeathNotice, NetMessage, NetRole};
use crate::rules::Rules;
use crate::systems;
use crate::targeting;
use crate::unit::Unit;
use crate::world::{GridWorld, World};

/// Ticks per second for the simulation.
pub const TICK_RATE: u32 = 60;

/// Version of the whole-simulation save container.
pub const SAVE_FILE_VERSION: u32 = 1;

/// Ticks a mirror keeps ignoring snapshots for a removed unit.
pub const RETIRED_SNAPSHOT_TICKS: u64 = 600;

/// Read-only view handed to a unit while it updates.
///
/// The unit being updated is not in `units` while it holds the context.
pub struct SimContext<'a> {
    /// Tick being simulated.
    pub tick: u64,
    /// Network role of this instance.
    pub role: NetRole,
    /// Global ruleset.
    pub rules: &'a Rules,
    /// Content registry.
    pub registry: &'a ContentRegistry,
    /// World view.
    pub world: &'a dyn World,
    /// Every other unit.
    pub units: &'a UnitStorage,
}

impl SimContext<'_> {
    /// Whether this instance decides deaths.
    #[must_use]
    pub fn is_authority(&self) -> bool {
        self.role.is_authority()
    }
}

/// Storage for all units in the simulation.
///
/// Keyed by ID in a `BTreeMap`, so every iteration runs in ascending ID
/// order.
#[derive(Debug)]
pub struct UnitStorage {
    units: BTreeMap<EntityId, Unit>,
    next_id: EntityId,
}

impl Default for UnitStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl UnitStorage {
    /// Create empty storage.
    #[must_use]
    pub fn new() -> Self {
        Self::with_next_id(1)
    }

    fn with_next_id(next_id: EntityId) -> Self {
        Self {
            units: BTreeMap::new(),
            next_id,
        }
    }

    /// Reserve a fresh unit ID.
    pub fn allocate_id(&mut self) -> EntityId {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// ID the next allocation will return.
    #[must_use]
    pub fn next_id(&self) -> EntityId {
        self.next_id
    }

    /// Insert a unit under its own ID, replacing any unit with that ID.
    pub fn insert(&mut self, unit: Unit) {
        self.next_id = self.next_id.max(unit.id() + 1);
        self.units.insert(unit.id(), unit);
    }

    /// Remove a unit by ID.
    pub fn remove(&mut self, id: EntityId) -> Option<Unit> {
        self.units.remove(&id)
    }

    /// Get a unit by ID.
    #[must_use]
    pub fn get(&self, id: EntityId) -> Option<&Unit> {
        self.units.get(&id)
    }

    /// Get a mutable reference to a unit by ID.
    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut Unit> {
        self.units.get_mut(&id)
    }

    /// Check if a unit exists.
    #[must_use]
    pub fn contains(&self, id: EntityId) -> bool {
        self.units.contains_key(&id)
    }

    /// Number of units.
    #[must_use]
    pub fn len(&self) -> usize {
        self.units.len()
    }

    /// Check if storage is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    /// Unit IDs in ascending order.
    #[must_use]
    pub fn sorted_ids(&self) -> Vec<EntityId> {
        self.units.keys().copied().collect()
    }

    /// Iterate over all units in ascending ID order.
    pub fn iter(&self) -> impl Iterator<Item = &Unit> {
        self.units.values()
    }
}

/// Events generated during a simulation tick.
///
/// These events can be used by the host to trigger ballistics, loot,
/// sounds and so on.
#[derive(Debug, Clone, Default)]
pub struct TickEvents {
    /// Shots fired.
    pub shots: Vec<ShotEvent>,
    /// Loot released by deaths.
    pub drops: Vec<DropEvent>,
    /// Death cues.
    pub deaths: Vec<DeathEffect>,
    /// Units removed from the simulation.
    pub removed: Vec<EntityId>,
}

#[derive(Serialize, Deserialize)]
struct SaveFile {
    version: u32,
    tick: u64,
    next_id: EntityId,
    units: Vec<SavedUnit>,
}

#[derive(Serialize, Deserialize)]
struct SavedUnit {
    id: EntityId,
    record: Vec<u8>,
}

enum Fate {
    Keep,
    Remove,
}

/// The unit simulation.
///
/// # Tick Order
///
/// 1. Apply queued network messages
/// 2. Update every unit in ascending ID order (see [`Simulation::tick`])
/// 3. Remove units whose death was handled during the pass
/// 4. Deliver spawner notices and queue outgoing messages
#[derive(Debug)]
pub struct Simulation<W: World = GridWorld> {
    tick: u64,
    role: NetRole,
    rules: Rules,
    registry: Arc<ContentRegistry>,
    world: W,
    units: UnitStorage,
    lifecycle: LifecycleQueue,
    /// Mirror only: removed unit ids and the tick they were removed on.
    retired: BTreeMap<EntityId, u64>,
    inbox: VecDeque<NetMessage>,
    outbox: Vec<NetMessage>,
    drops: Box<dyn DropResolver>,
}

impl<W: World> Simulation<W> {
    /// Create an empty simulation at tick 0.
    #[must_use]
    pub fn new(registry: Arc<ContentRegistry>, rules: Rules, world: W, role: NetRole) -> Self {
        Self {
            tick: 0,
            role,
            rules,
            registry,
            world,
            units: UnitStorage::new(),
            lifecycle: LifecycleQueue::default(),
            retired: BTreeMap::new(),
            inbox: VecDeque::new(),
            outbox: Vec::new(),
            drops: Box::new(TypeDrops),
        }
    }

    /// Replace the drop resolver.
    #[must_use]
    pub fn with_drop_resolver(mut self, resolver: impl DropResolver + 'static) -> Self {
        self.drops = Box::new(resolver);
        self
    }

    /// Get the current tick number.
    #[must_use]
    pub const fn get_tick(&self) -> u64 {
        self.tick
    }

    /// Network role.
    #[must_use]
    pub fn role(&self) -> NetRole {
        self.role
    }

    /// Ruleset.
    #[must_use]
    pub fn rules(&self) -> &Rules {
        &self.rules
    }

    /// Content registry.
    #[must_use]
    pub fn registry(&self) -> &Arc<ContentRegistry> {
        &self.registry
    }

    /// World.
    #[must_use]
    pub fn world(&self) -> &W {
        &self.world
    }

    /// Mutable world, for hosts placing or removing structures.
    pub fn world_mut(&mut self) -> &mut W {
        &mut self.world
    }

    /// Unit storage.
    #[must_use]
    pub fn units(&self) -> &UnitStorage {
        &self.units
    }

    /// Get a unit by ID.
    #[must_use]
    pub fn unit(&self, id: EntityId) -> Option<&Unit> {
        self.units.get(id)
    }

    /// Units whose removal is deferred to the end of the current pass.
    #[must_use]
    pub fn pending_removals(&self) -> &BTreeSet<EntityId> {
        &self.lifecycle.removals
    }

    /// Advance the simulation by one tick.
    ///
    /// Each unit runs, in order:
    /// 1. If dead, finalize removal and stop
    /// 2. Count down the hit flash
    /// 3. On a mirror: interpolate, tick status effects, stop
    /// 4. Kill ground units inside solid terrain
    /// 5. Separation from overlapping units
    /// 6. Kill units whose spawner is gone
    /// 7. Validate the target, then retarget on cadence
    /// 8. Advance the AI state
    /// 9. Status damage and velocity integration
    /// 10. Behavior hook, if a target exists
    /// 11. Clamp ground units to the bounds
    pub fn tick(&mut self) -> TickEvents {
        let mut events = TickEvents::default();
        self.drain_inbox();

        for id in self.units.sorted_ids() {
            let Some(mut unit) = self.units.remove(id) else {
                continue;
            };
            let ctx = SimContext {
                tick: self.tick,
                role: self.role,
                rules: &self.rules,
                registry: &self.registry,
                world: &self.world,
                units: &self.units,
            };
            let fate = update_unit(
                &mut unit,
                &ctx,
                self.drops.as_ref(),
                &mut self.lifecycle,
                &mut events.shots,
            );
            match fate {
                Fate::Keep => self.units.insert(unit),
                Fate::Remove => {
                    self.retire(id);
                    events.removed.push(id);
                }
            }
            self.settle();
        }

        self.drain_removals(&mut events);
        events.drops.append(&mut self.lifecycle.drops);
        events.deaths.append(&mut self.lifecycle.effects);

        self.tick += 1;
        self.prune_retired();

        #[cfg(feature = "debug-validation")]
        debug_assert!(
            events.removed.iter().all(|id| !self.units.contains(*id)),
            "removed unit still in storage after tick {}",
            self.tick
        );

        #[cfg(debug_assertions)]
        {
            let hash = self.state_hash();
            tracing::trace!(tick = self.tick, state_hash = hash, "Simulation state hash");
        }

        events
    }

    /// Run `f` on a unit taken out of storage, then put it back.
    fn with_unit<R>(
        &mut self,
        id: EntityId,
        f: impl FnOnce(&mut Unit, &SimContext<'_>, &dyn DropResolver, &mut LifecycleQueue) -> R,
    ) -> Option<R> {
        let mut unit = self.units.remove(id)?;
        let ctx = SimContext {
            tick: self.tick,
            role: self.role,
            rules: &self.rules,
            registry: &self.registry,
            world: &self.world,
            units: &self.units,
        };
        let result = f(&mut unit, &ctx, self.drops.as_ref(), &mut self.lifecycle);
        self.units.insert(unit);
        self.settle();
        Some(result)
    }

    fn activate_and_insert(&mut self, mut unit: Unit) {
        let ctx = SimContext {
            tick: self.tick,
            role: self.role,
            rules: &self.rules,
            registry: &self.registry,
            world: &self.world,
            units: &self.units,
        };
        lifecycle::activate(&mut unit, &ctx);
        self.units.insert(unit);
    }

    /// Activate a new unit and tell its spawner, if any, that it exists.
    fn bind_and_insert(&mut self, unit: Unit) {
        let id = unit.id();
        let spawner = unit.spawner();
        self.activate_and_insert(unit);
        if let Some(tile) = spawner {
            self.world.notify_unit_spawned(tile, id);
        }
    }

    /// Deliver spawner notices to the world and queue outgoing messages.
    fn settle(&mut self) {
        for notice in self.lifecycle.notices.drain(..) {
            self.world.notify_unit_removed(notice.tile, notice.unit);
        }
        self.outbox.append(&mut self.lifecycle.messages);
    }

    fn retire(&mut self, id: EntityId) {
        if self.role.is_mirror() {
            self.retired.insert(id, self.tick);
        }
    }

    fn prune_retired(&mut self) {
        let now = self.tick;
        self.retired
            .retain(|_, removed_at| now.saturating_sub(*removed_at) <= RETIRED_SNAPSHOT_TICKS);
    }

    /// Number of removed ids a mirror still filters snapshots for.
    #[must_use]
    pub fn retired_count(&self) -> usize {
        self.retired.len()
    }

    fn drain_removals(&mut self, events: &mut TickEvents) {
        let pending = std::mem::take(&mut self.lifecycle.removals);
        for id in pending {
            let Some(mut unit) = self.units.remove(id) else {
                continue;
            };
            lifecycle::finalize_removal(&mut unit, self.role, &mut self.lifecycle);
            self.retire(id);
            events.removed.push(id);
        }
        self.settle();
    }

    fn drain_inbox(&mut self) {
        while let Some(message) = self.inbox.pop_front() {
            match message {
                NetMessage::UnitDeath(notice) => self.apply_death_notice(notice),
                NetMessage::UnitSnapshot { unit, payload } => self.apply_snapshot(unit, &payload),
            }
        }
    }

    fn apply_death_notice(&mut self, notice: DeathNotice) {
        if !self.role.is_mirror() {
            tracing::warn!(unit = notice.unit, "Authority ignored a death notice");
            return;
        }
        let handled = self.with_unit(notice.unit, |unit, ctx, drops, queue| {
            lifecycle::on_death(unit, ctx, drops, queue)
        });
        if handled != Some(true) {
            tracing::trace!(unit = notice.unit, "Absorbed duplicate death notice");
        }
    }

    fn apply_snapshot(&mut self, id: EntityId, payload: &[u8]) {
        if !self.role.is_mirror() {
            tracing::warn!(unit = id, "Authority ignored a unit snapshot");
            return;
        }
        if self.retired.contains_key(&id) {
            tracing::trace!(unit = id, "Snapshot for removed unit");
            return;
        }
        if let Some(unit) = self.units.get_mut(id) {
            if let Err(err) = codec::read_snapshot(unit, payload, &self.registry) {
                tracing::warn!(unit = id, %err, "Rejected unit snapshot");
            }
            return;
        }

        let mut unit = Unit::raw(id);
        match codec::read_snapshot(&mut unit, payload, &self.registry) {
            Ok(()) => {
                tracing::debug!(unit = id, "Mirror unit created from snapshot");
                self.bind_and_insert(unit);
            }
            Err(err) => tracing::warn!(unit = id, %err, "Rejected unit snapshot"),
        }
    }

    /// Queue a message from a peer for the next tick.
    pub fn enqueue(&mut self, message: NetMessage) {
        self.inbox.push_back(message);
    }

    /// Take every message queued for peers.
    pub fn take_outgoing(&mut self) -> Vec<NetMessage> {
        std::mem::take(&mut self.outbox)
    }

    /// Spawn a fresh unit.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::UnknownType`] for an unregistered type, or
    /// [`GameError::InvalidState`] on a mirror.
    pub fn spawn_unit(
        &mut self,
        type_id: u8,
        team: TeamId,
        position: Vec2Fixed,
        spawner: Option<TilePos>,
    ) -> Result<EntityId> {
        if !self.role.is_authority() {
            return Err(GameError::InvalidState(
                "Mirrors only create units from snapshots".to_string(),
            ));
        }
        let unit_type = self.registry.resolve_unit(type_id)?;
        let id = self.units.allocate_id();
        let mut unit = Unit::new(id, unit_type, team);
        unit.position = position;
        unit.set_spawner(spawner);
        self.bind_and_insert(unit);
        tracing::debug!(unit = id, type_id, %team, "Unit spawned");
        Ok(id)
    }

    /// Damage a unit, running the death protocol once health runs out.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::InvalidState`] on a mirror and
    /// [`GameError::UnitNotFound`] if the unit does not exist.
    pub fn damage_unit(&mut self, id: EntityId, amount: Fixed) -> Result<()> {
        if !self.role.is_authority() {
            return Err(GameError::InvalidState(
                "Mirrors cannot damage units".to_string(),
            ));
        }
        self.with_unit(id, |unit, ctx, drops, queue| {
            unit.damage(amount, ctx.rules);
            if unit.health() <= Fixed::ZERO {
                lifecycle::on_death(unit, ctx, drops, queue);
            }
        })
        .ok_or(GameError::UnitNotFound(id))
    }

    /// Kill a unit outright.
    ///
    /// Returns whether the death protocol ran; `false` means it already had.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::InvalidState`] on a mirror and
    /// [`GameError::UnitNotFound`] if the unit does not exist.
    pub fn kill_unit(&mut self, id: EntityId) -> Result<bool> {
        if !self.role.is_authority() {
            return Err(GameError::InvalidState(
                "Mirrors cannot decide unit deaths".to_string(),
            ));
        }
        self.with_unit(id, |unit, ctx, drops, queue| {
            lifecycle::kill(unit, ctx, drops, queue)
        })
        .ok_or(GameError::UnitNotFound(id))
    }

    /// Apply a status effect to a unit.
    ///
    /// Returns whether it was applied (immune types refuse it).
    ///
    /// # Errors
    ///
    /// Fails for an unknown unit or status id.
    pub fn apply_status(&mut self, id: EntityId, status: u8, duration: Fixed) -> Result<bool> {
        let effect = self.registry.resolve_status(status)?;
        let unit = self.units.get_mut(id).ok_or(GameError::UnitNotFound(id))?;
        Ok(unit.apply_status(&effect, duration))
    }

    /// Re-read command centers for every unit of `team`.
    ///
    /// Call after changing a command center's command. Returns how many
    /// units switched state.
    pub fn propagate_commands(&mut self, team: TeamId) -> usize {
        let mut switched = 0;
        for id in self.units.sorted_ids() {
            let changed = self.with_unit(id, |unit, ctx, _, _| {
                if unit.team() != team || unit.is_dead() {
                    return false;
                }
                match controller::command(unit, ctx) {
                    Some(command) => {
                        controller::on_command(unit, ctx, command);
                        true
                    }
                    None => false,
                }
            });
            if changed == Some(true) {
                switched += 1;
            }
        }
        switched
    }

    /// Snapshot messages for every live unit, in ID order.
    ///
    /// # Errors
    ///
    /// Fails if a unit cannot be encoded.
    pub fn snapshot_messages(&self) -> Result<Vec<NetMessage>> {
        let mut messages = Vec::with_capacity(self.units.len());
        for id in self.units.sorted_ids() {
            let Some(unit) = self.units.get(id) else {
                continue;
            };
            if unit.is_dead() {
                continue;
            }
            messages.push(NetMessage::UnitSnapshot {
                unit: id,
                payload: codec::write_snapshot(unit)?,
            });
        }
        Ok(messages)
    }

    /// Serialize every live unit into a save file.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn save(&self) -> Result<Vec<u8>> {
        let mut units = Vec::with_capacity(self.units.len());
        for id in self.units.sorted_ids() {
            let Some(unit) = self.units.get(id) else {
                continue;
            };
            if unit.is_dead() {
                continue;
            }
            units.push(SavedUnit {
                id,
                record: codec::write_save(unit)?,
            });
        }
        let file = SaveFile {
            version: SAVE_FILE_VERSION,
            tick: self.tick,
            next_id: self.units.next_id(),
            units,
        };
        bincode::serialize(&file).map_err(|e| GameError::Encode {
            format: "save file",
            message: e.to_string(),
        })
    }

    /// Replace every unit with the contents of a save file.
    ///
    /// Every record is decoded before anything is replaced, so a bad
    /// record leaves the simulation exactly as it was.
    ///
    /// # Errors
    ///
    /// Returns an error for a malformed file, a version mismatch, or any
    /// record that fails to decode.
    pub fn load(&mut self, bytes: &[u8]) -> Result<()> {
        let file: SaveFile = bincode::deserialize(bytes).map_err(|e| GameError::Decode {
            format: "save file",
            message: e.to_string(),
        })?;
        if file.version != SAVE_FILE_VERSION {
            return Err(GameError::VersionMismatch {
                format: "save file",
                expected: SAVE_FILE_VERSION,
                found: file.version,
            });
        }

        let mut decoded = Vec::with_capacity(file.units.len());
        for saved in &file.units {
            decoded.push(codec::read_save(&saved.record, saved.id, &self.registry)?);
        }

        let discarded =
            std::mem::replace(&mut self.units, UnitStorage::with_next_id(file.next_id));
        for unit in discarded.iter() {
            if let Some(tile) = unit.spawner() {
                self.world.notify_unit_removed(tile, unit.id());
            }
        }
        self.tick = file.tick;
        self.lifecycle = LifecycleQueue::default();
        self.retired.clear();
        self.inbox.clear();
        for unit in decoded {
            self.bind_and_insert(unit);
        }
        tracing::info!(tick = self.tick, units = self.units.len(), "Save loaded");
        Ok(())
    }

    /// Calculate a hash of the current simulation state.
    ///
    /// Used for desync detection. Two simulations with identical state
    /// produce identical hashes.
    #[must_use]
    pub fn state_hash(&self) -> u64 {
        let mut hasher = DefaultHasher::new();

        self.tick.hash(&mut hasher);

        let ids = self.units.sorted_ids();
        ids.len().hash(&mut hasher);

        for id in ids {
            if let Some(unit) = self.units.get(id) {
                id.hash(&mut hasher);
                unit.type_id().hash(&mut hasher);
                unit.team().hash(&mut hasher);
                unit.position.hash(&mut hasher);
                unit.velocity.hash(&mut hasher);
                unit.rotation.hash(&mut hasher);
                unit.health().hash(&mut hasher);
                unit.is_dead().hash(&mut hasher);
                unit.target().hash(&mut hasher);
                unit.spawner().hash(&mut hasher);
                unit.status().hash(&mut hasher);
                unit.state_name().hash(&mut hasher);
            }
        }

        hasher.finish()
    }
}

/// One unit's tick. See [`Simulation::tick`] for the step order.
fn update_unit(
    unit: &mut Unit,
    ctx: &SimContext<'_>,
    drops: &dyn DropResolver,
    queue: &mut LifecycleQueue,
    shots: &mut Vec<ShotEvent>,
) -> Fate {
    if unit.is_dead() {
        lifecycle::finalize_removal(unit, ctx.role, queue);
        return Fate::Remove;
    }

    systems::hit_flash_system(unit);

    if ctx.role.is_mirror() {
        unit.interpolate();
        unit.status.update(ctx.registry);
        return Fate::Keep;
    }

    if lifecycle::crushed_by_terrain(unit, ctx) {
        tracing::debug!(unit = unit.id(), "Unit crushed by terrain");
        lifecycle::kill(unit, ctx, drops, queue);
        return Fate::Keep;
    }

    systems::separation_system(unit, ctx);

    if lifecycle::spawner_lost(unit, ctx) {
        tracing::debug!(unit = unit.id(), "Unit lost its spawner");
        lifecycle::kill(unit, ctx, drops, queue);
        return Fate::Keep;
    }

    targeting::update_targeting(unit, ctx);
    targeting::retarget(unit, ctx);

    unit.update_state(ctx);

    let status_damage = unit.status.update(ctx.registry);
    if status_damage > Fixed::ZERO {
        unit.damage(status_damage, ctx.rules);
    }
    if unit.health() <= Fixed::ZERO {
        lifecycle::on_death(unit, ctx, drops, queue);
        return Fate::Keep;
    }
    let speed = unit.status.speed_multiplier(ctx.registry);
    systems::velocity_system(unit, speed);

    if unit.target().is_some() {
        shots.extend(controller::behavior(unit, ctx));
    }

    if !unit.is_flying() {
        systems::bounds_system(unit, &ctx.world.bounds());
    }

    Fate::Keep
}
