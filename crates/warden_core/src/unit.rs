//! The unit entity.
//!
//! Units are created in two phases. [`Unit::raw`] allocates an untyped
//! shell that a decoder fills in; [`Unit::init`] (or [`Unit::new`], which
//! does both) binds the shared type descriptor and team exactly once.

use std::sync::Arc;

use crate::components::{EntityId, TargetRef, TeamId, TilePos};
use crate::content::{ContentRegistry, StatusEffect, UnitType, BOSS_STATUS};
use crate::data::WeaponData;
use crate::error::{GameError, Result};
use crate::interpolation::Interpolator;
use crate::math::{lerp_angle, Fixed, Vec2Fixed};
use crate::rules::Rules;
use crate::simulation::SimContext;
use crate::state::{StateMachine, UnitState};
use crate::status::StatusEffects;
use crate::timer::IntervalTimer;

/// An autonomous combat unit.
#[derive(Debug)]
pub struct Unit {
    id: EntityId,
    pub(crate) unit_type: Option<Arc<UnitType>>,
    pub(crate) team: TeamId,
    /// World position.
    pub position: Vec2Fixed,
    /// Velocity applied during integration.
    pub velocity: Vec2Fixed,
    /// Facing in degrees.
    pub rotation: Fixed,
    pub(crate) health: Fixed,
    pub(crate) dead: bool,
    pub(crate) death_handled: bool,
    pub(crate) status: StatusEffects,
    pub(crate) state: StateMachine,
    pub(crate) target: TargetRef,
    pub(crate) spawner: Option<TilePos>,
    pub(crate) timer: IntervalTimer,
    pub(crate) loaded: bool,
    pub(crate) hit_time: u32,
    pub(crate) interpolator: Interpolator,
}

impl Unit {
    /// Allocate an untyped unit, ready to be filled by a decoder.
    #[must_use]
    pub fn raw(id: EntityId) -> Self {
        Self {
            id,
            unit_type: None,
            team: TeamId::DERELICT,
            position: Vec2Fixed::ZERO,
            velocity: Vec2Fixed::ZERO,
            rotation: Fixed::ZERO,
            health: Fixed::ZERO,
            dead: false,
            death_handled: false,
            status: StatusEffects::new(),
            state: StateMachine::new(),
            target: TargetRef::None,
            spawner: None,
            timer: IntervalTimer::new(),
            loaded: false,
            hit_time: 0,
            interpolator: Interpolator::default(),
        }
    }

    /// Create a typed unit for a fresh spawn.
    #[must_use]
    pub fn new(id: EntityId, unit_type: Arc<UnitType>, team: TeamId) -> Self {
        let mut unit = Self::raw(id);
        unit.bind(unit_type, team);
        unit
    }

    /// Bind the type and team.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::AlreadyInitialized`] if the unit already has a
    /// type. Callers must treat this as a programming error.
    pub fn init(&mut self, unit_type: Arc<UnitType>, team: TeamId) -> Result<()> {
        if self.unit_type.is_some() {
            return Err(GameError::AlreadyInitialized(self.id));
        }
        self.bind(unit_type, team);
        Ok(())
    }

    fn bind(&mut self, unit_type: Arc<UnitType>, team: TeamId) {
        self.health = unit_type.health;
        self.unit_type = Some(unit_type);
        self.team = team;
    }

    /// Unique id.
    #[must_use]
    pub fn id(&self) -> EntityId {
        self.id
    }

    /// Shared type descriptor, if initialized.
    #[must_use]
    pub fn unit_type(&self) -> Option<&Arc<UnitType>> {
        self.unit_type.as_ref()
    }

    /// Registry id of the type, if initialized.
    #[must_use]
    pub fn type_id(&self) -> Option<u8> {
        self.unit_type.as_ref().map(|t| t.id)
    }

    /// Owning team.
    #[must_use]
    pub fn team(&self) -> TeamId {
        self.team
    }

    /// Current health.
    #[must_use]
    pub fn health(&self) -> Fixed {
        self.health
    }

    /// Maximum health under the given rules.
    #[must_use]
    pub fn max_health(&self, rules: &Rules) -> Fixed {
        self.stat(|t| t.health) * rules.unit_health_multiplier
    }

    /// Subtract health and start the hit flash.
    ///
    /// Does not run the death protocol; the simulation decides that.
    pub fn damage(&mut self, amount: Fixed, rules: &Rules) {
        if self.dead {
            return;
        }
        self.health -= amount;
        self.hit_time = rules.hit_flash_ticks;
    }

    /// Ticks left on the hit flash.
    #[must_use]
    pub fn hit_time(&self) -> u32 {
        self.hit_time
    }

    /// Whether the unit has died.
    #[must_use]
    pub fn is_dead(&self) -> bool {
        self.dead
    }

    /// Whether the unit flies over terrain.
    #[must_use]
    pub fn is_flying(&self) -> bool {
        self.unit_type.as_ref().is_some_and(|t| t.flying)
    }

    /// Whether this unit may target flying units.
    #[must_use]
    pub fn targets_air(&self) -> bool {
        self.unit_type.as_ref().is_some_and(|t| t.target_air)
    }

    /// Active status effects.
    #[must_use]
    pub fn status(&self) -> &StatusEffects {
        &self.status
    }

    /// Apply a status effect unless the type is immune.
    ///
    /// Returns whether the effect was applied.
    pub fn apply_status(&mut self, effect: &StatusEffect, duration: Fixed) -> bool {
        if self.unit_type.as_ref().is_some_and(|t| t.is_immune(effect)) {
            return false;
        }
        self.status.apply(effect, duration);
        true
    }

    /// Whether the unit carries the boss effect.
    #[must_use]
    pub fn is_boss(&self, registry: &ContentRegistry) -> bool {
        registry
            .status_named(BOSS_STATUS)
            .is_ok_and(|boss| self.status.has(boss.id))
    }

    /// Units always count towards a team's enemy total.
    #[must_use]
    pub fn counts_as_enemy(&self) -> bool {
        true
    }

    fn stat(&self, pick: impl Fn(&UnitType) -> Fixed) -> Fixed {
        self.unit_type.as_deref().map_or(Fixed::ZERO, pick)
    }

    /// Mass used by separation.
    #[must_use]
    pub fn mass(&self) -> Fixed {
        self.stat(|t| t.mass)
    }

    /// Fraction of velocity lost per tick.
    #[must_use]
    pub fn drag(&self) -> Fixed {
        self.stat(|t| t.drag)
    }

    /// Acceleration per tick.
    #[must_use]
    pub fn speed(&self) -> Fixed {
        self.stat(|t| t.speed)
    }

    /// Velocity cap.
    #[must_use]
    pub fn max_velocity(&self) -> Fixed {
        self.stat(|t| t.max_velocity)
    }

    /// Hitbox edge against entities.
    #[must_use]
    pub fn hitbox(&self) -> Fixed {
        self.stat(|t| t.hit_size)
    }

    /// Hitbox edge against tiles.
    #[must_use]
    pub fn hitbox_tile(&self) -> Fixed {
        self.stat(|t| t.hit_size_tile)
    }

    /// Item capacity.
    #[must_use]
    pub fn item_capacity(&self) -> u32 {
        self.unit_type.as_ref().map_or(0, |t| t.item_capacity)
    }

    /// Carried weapon.
    #[must_use]
    pub fn weapon(&self) -> Option<&WeaponData> {
        self.unit_type.as_ref().map(|t| &t.weapon)
    }

    /// Turn towards `angle` by the type's rotate speed.
    pub fn rotate(&mut self, angle: Fixed) {
        let step = self.stat(|t| t.rotate_speed);
        self.rotation = lerp_angle(self.rotation, angle, step);
    }

    /// Advance the interpolation buffer and adopt its pose.
    pub fn interpolate(&mut self) {
        if self.interpolator.is_idle() {
            return;
        }
        let (position, rotation) = self.interpolator.update();
        self.position = position;
        self.rotation = rotation;
    }

    /// Interpolation buffer.
    #[must_use]
    pub fn interpolator(&self) -> &Interpolator {
        &self.interpolator
    }

    /// Current target.
    #[must_use]
    pub fn target(&self) -> TargetRef {
        self.target
    }

    /// Replace the target.
    pub fn set_target(&mut self, target: TargetRef) {
        self.target = target;
    }

    /// Drop the target.
    pub fn clear_target(&mut self) {
        self.target = TargetRef::None;
    }

    /// Tile of the structure that produced this unit.
    #[must_use]
    pub fn spawner(&self) -> Option<TilePos> {
        self.spawner
    }

    /// Bind the producing structure.
    pub fn set_spawner(&mut self, spawner: Option<TilePos>) {
        self.spawner = spawner;
    }

    pub(crate) fn take_spawner(&mut self) -> Option<TilePos> {
        self.spawner.take()
    }

    /// Debounce timers.
    #[must_use]
    pub fn timer(&self) -> &IntervalTimer {
        &self.timer
    }

    /// Mutable debounce timers.
    pub fn timer_mut(&mut self) -> &mut IntervalTimer {
        &mut self.timer
    }

    /// Whether the unit came from a save rather than a fresh spawn.
    #[must_use]
    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    /// Name of the active AI state.
    #[must_use]
    pub fn state_name(&self) -> Option<&'static str> {
        self.state.current_name()
    }

    /// Switch AI state, running exit and enter hooks.
    pub fn set_state(&mut self, ctx: &SimContext<'_>, next: Option<Box<dyn UnitState>>) {
        let mut machine = std::mem::take(&mut self.state);
        machine.set(self, ctx, next);
        self.state = machine;
    }

    /// Run one tick of the active AI state.
    pub fn update_state(&mut self, ctx: &SimContext<'_>) {
        let mut machine = std::mem::take(&mut self.state);
        machine.update(self, ctx);
        self.state = machine;
    }
}
