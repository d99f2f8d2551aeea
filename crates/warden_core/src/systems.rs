//! Per-unit kinematics systems.
//!
//! Each system does one thing to one unit. The orchestrator in
//! [`simulation`](crate::simulation) decides the order.
//!
//! All systems use fixed-point math for deterministic simulation.

use crate::math::{Fixed, Vec2Fixed};
use crate::simulation::SimContext;
use crate::unit::Unit;
use crate::world::Bounds;

/// Largest push a single neighbour contributes to separation, in tenths.
const MAX_PAIR_PUSH_TENTHS: i32 = 4;

/// Largest total separation push per tick, in tenths.
const MAX_TOTAL_PUSH_TENTHS: i32 = 2;

/// Divisor applied to the summed hit sizes to get the separation radius.
const SEPARATION_SCALE: i32 = 3;

/// Counts down the hit flash.
pub fn hit_flash_system(unit: &mut Unit) {
    unit.hit_time = unit.hit_time.saturating_sub(1);
}

/// Pushes a unit away from overlapping units on the same layer.
///
/// Ground units only avoid ground units and flying units only avoid flying
/// units. The push is scaled by how deep the overlap is and divided by the
/// unit's mass before it is added to the velocity.
pub fn separation_system(unit: &mut Unit, ctx: &SimContext<'_>) {
    let tenth = Fixed::from_num(1) / Fixed::from_num(10);
    let flying = unit.is_flying();
    let own_size = unit.hitbox();
    let mut push = Vec2Fixed::ZERO;

    for other in ctx.units.iter() {
        if other.id() == unit.id() || other.is_dead() || other.is_flying() != flying {
            continue;
        }
        let reach = (own_size + other.hitbox()) / Fixed::from_num(SEPARATION_SCALE);
        if reach <= Fixed::ZERO {
            continue;
        }
        let offset = unit.position - other.position;
        if offset.x.abs() >= reach || offset.y.abs() >= reach {
            continue;
        }
        let dist = offset.length();
        if dist >= reach {
            continue;
        }
        let depth = Fixed::from_num(1) - dist / reach;
        push = push + offset.scale(depth).clamp_length(tenth * Fixed::from_num(MAX_PAIR_PUSH_TENTHS));
    }

    let push = push.clamp_length(tenth * Fixed::from_num(MAX_TOTAL_PUSH_TENTHS));
    let mass = unit.mass();
    if push != Vec2Fixed::ZERO && mass > Fixed::ZERO {
        unit.velocity = unit.velocity + push.scale(Fixed::from_num(1) / mass);
    }
}

/// Integrates velocity into position and applies drag.
///
/// Velocity is capped at the type's maximum and scaled by the status
/// speed multiplier before moving; drag is applied afterwards.
pub fn velocity_system(unit: &mut Unit, speed_multiplier: Fixed) {
    let velocity = unit
        .velocity
        .clamp_length(unit.max_velocity())
        .scale(speed_multiplier);
    unit.position = unit.position + velocity;
    let retain = (Fixed::from_num(1) - unit.drag()).clamp(Fixed::ZERO, Fixed::from_num(1));
    unit.velocity = velocity.scale(retain);
}

/// Keeps a unit inside the playable area.
pub fn bounds_system(unit: &mut Unit, bounds: &Bounds) {
    unit.position = bounds.clamp(unit.position);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::TeamId;
    use crate::test_support::{at, context_fixture, dagger, flare};

    #[test]
    fn test_hit_flash_counts_down_to_zero() {
        let fixture = context_fixture();
        let mut unit = Unit::new(1, dagger(&fixture.registry), TeamId::SHARDED);
        unit.hit_time = 1;
        hit_flash_system(&mut unit);
        hit_flash_system(&mut unit);
        assert_eq!(unit.hit_time(), 0);
    }

    #[test]
    fn test_velocity_moves_then_drags() {
        let fixture = context_fixture();
        let mut unit = Unit::new(1, dagger(&fixture.registry), TeamId::SHARDED);
        unit.velocity = at(1, 0);
        velocity_system(&mut unit, Fixed::from_num(1));

        assert_eq!(unit.position, at(1, 0));
        // dagger drag is a quarter
        assert_eq!(unit.velocity.x, Fixed::from_num(0.75));
    }

    #[test]
    fn test_velocity_is_capped() {
        let fixture = context_fixture();
        let mut unit = Unit::new(1, dagger(&fixture.registry), TeamId::SHARDED);
        unit.velocity = at(50, 0);
        velocity_system(&mut unit, Fixed::from_num(1));
        let error = (unit.position.x - unit.max_velocity()).abs();
        assert!(error < Fixed::from_num(0.001));
    }

    #[test]
    fn test_speed_multiplier_slows_movement() {
        let fixture = context_fixture();
        let mut unit = Unit::new(1, dagger(&fixture.registry), TeamId::SHARDED);
        unit.velocity = at(1, 0);
        velocity_system(&mut unit, Fixed::from_num(0.5));
        assert_eq!(unit.position, Vec2Fixed::new(Fixed::from_num(0.5), Fixed::ZERO));
    }

    #[test]
    fn test_separation_pushes_apart_same_layer_only() {
        let mut fixture = context_fixture();
        fixture.add_unit(dagger(&fixture.registry), TeamId::SHARDED, at(1, 0));
        let ctx = fixture.context();

        let mut ground = Unit::new(100, dagger(&fixture.registry), TeamId::SHARDED);
        separation_system(&mut ground, &ctx);
        assert!(ground.velocity.x < Fixed::ZERO);

        let mut air = Unit::new(101, flare(&fixture.registry), TeamId::SHARDED);
        separation_system(&mut air, &ctx);
        assert_eq!(air.velocity, Vec2Fixed::ZERO);
    }

    #[test]
    fn test_separation_ignores_distant_units() {
        let mut fixture = context_fixture();
        fixture.add_unit(dagger(&fixture.registry), TeamId::CRUX, at(60_000, 16));
        fixture.add_unit(dagger(&fixture.registry), TeamId::CRUX, at(16, 40_000));
        let ctx = fixture.context();

        let mut unit = Unit::new(100, dagger(&fixture.registry), TeamId::SHARDED);
        unit.position = at(16, 16);
        separation_system(&mut unit, &ctx);
        assert_eq!(unit.velocity, Vec2Fixed::ZERO);
    }

    #[test]
    fn test_bounds_clamp() {
        let fixture = context_fixture();
        let ctx = fixture.context();
        let mut unit = Unit::new(1, dagger(&fixture.registry), TeamId::SHARDED);
        unit.position = at(-10, 5);
        bounds_system(&mut unit, &ctx.world.bounds());
        assert_eq!(unit.position, at(0, 5));
    }
}
