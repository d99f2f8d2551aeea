//! Built-in unit AI.
//!
//! Each unit type names a [`ControllerKind`]. The kind picks the start
//! state and shapes how the [`AttackState`], [`RallyState`] and
//! [`RetreatState`] move the unit. Steering is a straight line towards the
//! destination; real path search belongs to the host.
//!
//! [`behavior`] is the per-tick combat hook. It only runs while the unit
//! has a target, turns towards it and fires the weapon sides whose shot
//! cadence has elapsed.

use serde::{Deserialize, Serialize};

use crate::components::{BlockFlag, EntityId, TargetRef, TeamId};
use crate::content::ContentRegistry;
use crate::data::WeaponData;
use crate::math::{angle_delta, Fixed, Vec2Fixed};
use crate::rules::Rules;
use crate::simulation::SimContext;
use crate::state::{Transition, UnitState};
use crate::targeting::{self, Targetable};
use crate::timer::TimerSlot;
use crate::unit::Unit;

/// Largest aim error, in degrees, at which a unit still fires.
pub const FACING_TOLERANCE: i32 = 13;

/// Distance at which a unit stops closing on a rally point or home.
pub const HOLD_DISTANCE: i32 = 80;

/// Which AI drives a unit type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ControllerKind {
    /// Walks along the ground and pushes towards enemy cores.
    #[default]
    Ground,
    /// Flies straight at whatever it targets.
    Flying,
}

/// Order broadcast by a command center.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UnitCommand {
    /// Push towards the enemy.
    Attack,
    /// Gather at rally points.
    Rally,
    /// Fall back to home.
    Retreat,
}

/// Anything that fires a weapon on two alternating sides.
pub trait ShotSource {
    /// Timer slot gating one side of the weapon.
    fn shoot_timer(&self, left: bool) -> TimerSlot;
    /// The weapon fired.
    fn weapon(&self) -> Option<&WeaponData>;
    /// Multiplier applied to outgoing damage.
    fn damage_multiplier(&self, registry: &ContentRegistry, rules: &Rules) -> Fixed;
}

impl ShotSource for Unit {
    fn shoot_timer(&self, left: bool) -> TimerSlot {
        if left {
            TimerSlot::ShootLeft
        } else {
            TimerSlot::ShootRight
        }
    }

    fn weapon(&self) -> Option<&WeaponData> {
        Unit::weapon(self)
    }

    fn damage_multiplier(&self, registry: &ContentRegistry, rules: &Rules) -> Fixed {
        self.status.damage_multiplier(registry) * rules.unit_damage_multiplier
    }
}

/// A shot fired this tick. Ballistics are resolved by the consumer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShotEvent {
    /// Tick the shot was fired on.
    pub tick: u64,
    /// Firing unit.
    pub shooter: EntityId,
    /// Team of the firing unit.
    pub team: TeamId,
    /// Weapon side that fired.
    pub left: bool,
    /// Muzzle position.
    pub origin: Vec2Fixed,
    /// Firing angle in degrees.
    pub angle: Fixed,
    /// Bullet type.
    pub bullet: String,
    /// Outgoing damage multiplier.
    pub damage_multiplier: Fixed,
}

/// State a freshly activated unit starts in.
#[must_use]
pub fn start_state(kind: ControllerKind) -> Box<dyn UnitState> {
    Box::new(AttackState { kind })
}

/// State that carries out `command`.
#[must_use]
pub fn state_for_command(kind: ControllerKind, command: UnitCommand) -> Box<dyn UnitState> {
    match command {
        UnitCommand::Attack => Box::new(AttackState { kind }),
        UnitCommand::Rally => Box::new(RallyState { kind }),
        UnitCommand::Retreat => Box::new(RetreatState { kind }),
    }
}

/// Command of the closest allied command center in range.
///
/// Range comes from [`Rules::command_radius`]; `None` there means any
/// distance. Returns `None` when no such center exists or it has not been
/// given a command.
#[must_use]
pub fn command(unit: &Unit, ctx: &SimContext<'_>) -> Option<UnitCommand> {
    let center = targeting::closest_allied(unit, BlockFlag::CommandCenter, ctx)?;
    if let Some(radius) = ctx.rules.command_radius {
        if unit.position.distance_squared(center.position()) > radius.saturating_mul(radius) {
            return None;
        }
    }
    center.command
}

/// Whether an allied command center is directing this unit.
#[must_use]
pub fn is_commanded(unit: &Unit, ctx: &SimContext<'_>) -> bool {
    command(unit, ctx).is_some()
}

/// Switch the unit to the state that carries out `command`.
pub fn on_command(unit: &mut Unit, ctx: &SimContext<'_>, command: UnitCommand) {
    let Some(kind) = unit.unit_type().map(|t| t.controller) else {
        return;
    };
    tracing::debug!(unit = unit.id(), ?command, "Unit received command");
    unit.set_state(ctx, Some(state_for_command(kind, command)));
}

/// Combat hook, run once per authoritative tick while a target exists.
///
/// Turns towards a live enemy target in weapon range and, once facing it,
/// fires every weapon side whose cadence has elapsed. Alternating weapons
/// push the opposite side half a reload behind after each shot.
pub fn behavior(unit: &mut Unit, ctx: &SimContext<'_>) -> Vec<ShotEvent> {
    let mut shots = Vec::new();
    let Some(kind) = unit.unit_type().cloned() else {
        return shots;
    };
    let weapon = &kind.weapon;
    let Some(target) = targeting::resolve(unit.target(), ctx) else {
        return shots;
    };
    if target.is_dead() || !unit.team().is_enemy(target.team()) {
        return shots;
    }

    let aim = target.position();
    if unit.position.distance_squared(aim) > weapon.range.saturating_mul(weapon.range) {
        return shots;
    }
    let angle = unit.position.angle_to(aim);
    unit.rotate(angle);
    if angle_delta(unit.rotation, angle).abs() > Fixed::from_num(FACING_TOLERANCE) {
        return shots;
    }

    for left in [true, false] {
        let slot = unit.shoot_timer(left);
        if !unit.timer.elapsed(slot, weapon.reload) {
            continue;
        }
        if weapon.alternate {
            let opposite = unit.shoot_timer(!left);
            let half = Fixed::from_num(weapon.reload) / Fixed::from_num(2);
            unit.timer.set_accumulated(opposite, half);
        }
        shots.push(ShotEvent {
            tick: ctx.tick,
            shooter: unit.id(),
            team: unit.team(),
            left,
            origin: unit.position,
            angle,
            bullet: weapon.bullet.clone(),
            damage_multiplier: unit.damage_multiplier(ctx.registry, ctx.rules),
        });
    }
    shots
}

fn move_towards(unit: &mut Unit, destination: Vec2Fixed) {
    let direction = (destination - unit.position).normalize();
    unit.velocity = unit.velocity + direction.scale(unit.speed());
}

fn distance(a: Vec2Fixed, b: Vec2Fixed) -> Fixed {
    (b - a).length()
}

fn weapon_range(unit: &Unit) -> Fixed {
    Unit::weapon(unit).map_or(Fixed::ZERO, |w| w.range)
}

/// Pushes towards the closest enemy core.
///
/// Ground units adopt the core as target once it is within reach and stop
/// closing at half weapon range. Flying units target the core outright
/// when they have nothing better and fly at their target.
#[derive(Debug)]
pub struct AttackState {
    kind: ControllerKind,
}

impl UnitState for AttackState {
    fn name(&self) -> &'static str {
        "attack"
    }

    fn update(&mut self, unit: &mut Unit, ctx: &SimContext<'_>) -> Transition {
        let range = weapon_range(unit);
        match self.kind {
            ControllerKind::Ground => {
                let Some(core) = targeting::closest_enemy_core(unit, ctx) else {
                    return Transition::Stay;
                };
                let dist = distance(unit.position, core.position());
                if dist < range * Fixed::from_num(10) / Fixed::from_num(11) {
                    unit.set_target(TargetRef::Structure {
                        id: core.id,
                        tile: core.tile,
                    });
                }
                if dist > range / Fixed::from_num(2) {
                    move_towards(unit, core.position());
                }
            }
            ControllerKind::Flying => {
                if unit.target().is_none() {
                    targeting::target_closest_enemy_flag(unit, BlockFlag::Core, ctx);
                }
                if let Some(target) = targeting::resolve(unit.target(), ctx) {
                    let aim = target.position();
                    if distance(unit.position, aim) > range * Fixed::from_num(4) / Fixed::from_num(5) {
                        move_towards(unit, aim);
                    }
                }
            }
        }
        Transition::Stay
    }
}

/// Gathers at the closest allied rally point.
///
/// Flying units keep scanning while rallying and break off to attack as
/// soon as an enemy comes into reach.
#[derive(Debug)]
pub struct RallyState {
    kind: ControllerKind,
}

impl UnitState for RallyState {
    fn name(&self) -> &'static str {
        "rally"
    }

    fn update(&mut self, unit: &mut Unit, ctx: &SimContext<'_>) -> Transition {
        if self.kind == ControllerKind::Flying
            && unit
                .timer
                .elapsed(TimerSlot::Target2, ctx.rules.retarget_interval)
        {
            targeting::target_closest(unit, ctx);
            let engaged = targeting::resolve(unit.target(), ctx)
                .is_some_and(|t| unit.team().is_enemy(t.team()));
            if engaged {
                return Transition::Switch(Some(Box::new(AttackState { kind: self.kind })));
            }
        }

        if let Some(rally) = targeting::closest_allied(unit, BlockFlag::Rally, ctx) {
            let home = rally.position();
            if distance(unit.position, home) > Fixed::from_num(HOLD_DISTANCE) {
                move_towards(unit, home);
            }
        }
        Transition::Stay
    }
}

/// Falls back to the producing structure, or the closest allied core.
#[derive(Debug)]
pub struct RetreatState {
    kind: ControllerKind,
}

impl UnitState for RetreatState {
    fn name(&self) -> &'static str {
        "retreat"
    }

    fn enter(&mut self, unit: &mut Unit, _ctx: &SimContext<'_>) {
        if self.kind == ControllerKind::Flying {
            unit.clear_target();
        }
    }

    fn update(&mut self, unit: &mut Unit, ctx: &SimContext<'_>) -> Transition {
        let home = unit
            .spawner()
            .map(|tile| tile.world_center())
            .or_else(|| targeting::closest_allied(unit, BlockFlag::Core, ctx).map(|s| s.position()));
        if let Some(home) = home {
            if distance(unit.position, home) > Fixed::from_num(HOLD_DISTANCE) {
                move_towards(unit, home);
            }
        }
        Transition::Stay
    }
}
