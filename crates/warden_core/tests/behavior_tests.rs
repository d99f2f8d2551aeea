//! Targeting, commands and combat behavior driven through the simulation.

use warden_core::components::{BlockFlag, TargetRef, TeamId, TilePos};
use warden_core::controller::UnitCommand;
use warden_core::math::Fixed;
use warden_core::net::NetRole;
use warden_core::rules::Rules;
use warden_core::simulation::Simulation;
use warden_core::world::GridWorld;
use warden_test_utils::fixtures::{arena, at, spawn, standard_registry, ARENA_TILES, DAGGER, FLARE};

fn duel() -> (Simulation, u64, u64) {
    let mut sim = arena(NetRole::Standalone);
    let hunter = spawn(&mut sim, DAGGER, TeamId::SHARDED, at(100, 100), None);
    let prey = spawn(&mut sim, DAGGER, TeamId::CRUX, at(140, 100), None);
    (sim, hunter, prey)
}

// =============================================================================
// Targeting
// =============================================================================

#[test]
fn target_acquired_on_twentieth_tick() {
    let (mut sim, hunter, prey) = duel();

    for _ in 0..19 {
        sim.tick();
        assert!(sim.unit(hunter).unwrap().target().is_none());
    }
    sim.tick();
    assert_eq!(sim.unit(hunter).unwrap().target(), TargetRef::Unit(prey));
}

#[test]
fn dead_target_is_cleared_next_tick() {
    let (mut sim, hunter, prey) = duel();
    for _ in 0..20 {
        sim.tick();
    }
    assert!(sim.unit(hunter).unwrap().target().is_some());

    sim.kill_unit(prey).unwrap();
    sim.tick();
    assert!(sim.unit(hunter).unwrap().target().is_none());
}

#[test]
fn allies_are_never_targeted() {
    let mut sim = arena(NetRole::Standalone);
    let a = spawn(&mut sim, DAGGER, TeamId::SHARDED, at(100, 100), None);
    let b = spawn(&mut sim, DAGGER, TeamId::SHARDED, at(130, 100), None);
    for _ in 0..60 {
        sim.tick();
    }
    assert!(sim.unit(a).unwrap().target().is_none());
    assert!(sim.unit(b).unwrap().target().is_none());
}

#[test]
fn ground_units_ignore_flyers() {
    let mut sim = arena(NetRole::Standalone);
    let walker = spawn(&mut sim, DAGGER, TeamId::SHARDED, at(100, 100), None);
    let flyer = spawn(&mut sim, FLARE, TeamId::CRUX, at(120, 100), None);
    for _ in 0..20 {
        sim.tick();
    }
    assert!(sim.unit(walker).unwrap().target().is_none());
    assert!(sim.unit(flyer).unwrap().target().is_some());
}

// =============================================================================
// Combat
// =============================================================================

#[test]
fn engaged_units_fire_alternating_sides() {
    let (mut sim, hunter, prey) = duel();
    let mut shots = Vec::new();
    for _ in 0..80 {
        shots.extend(sim.tick().shots);
    }

    let hunter_shots: Vec<_> = shots.iter().filter(|s| s.shooter == hunter).collect();
    assert!(hunter_shots.len() >= 2);
    assert!(hunter_shots[0].left);
    assert!(!hunter_shots[1].left);
    assert!(hunter_shots[0].tick < hunter_shots[1].tick);
    assert_eq!(hunter_shots[0].team, TeamId::SHARDED);
    assert_eq!(hunter_shots[0].damage_multiplier, Fixed::from_num(1));

    assert!(shots.iter().any(|s| s.shooter == prey));
}

#[test]
fn out_of_range_units_hold_fire() {
    let mut sim = arena(NetRole::Standalone);
    spawn(&mut sim, DAGGER, TeamId::SHARDED, at(100, 100), None);
    spawn(&mut sim, DAGGER, TeamId::CRUX, at(300, 100), None);
    for _ in 0..80 {
        assert!(sim.tick().shots.is_empty());
    }
}

#[test]
fn ground_units_march_on_enemy_core() {
    let mut sim = arena(NetRole::Standalone);
    let core = TilePos::new(50, 12);
    sim.world_mut()
        .place_structure(core, TeamId::CRUX, vec![BlockFlag::Core]);
    let walker = spawn(&mut sim, DAGGER, TeamId::SHARDED, at(100, 100), None);

    let start = sim.unit(walker).unwrap().position.distance_squared(core.world_center());
    for _ in 0..30 {
        sim.tick();
    }
    let end = sim.unit(walker).unwrap().position.distance_squared(core.world_center());
    assert!(end < start);
}

#[test]
fn slowed_units_move_less() {
    let run = |slowed: bool| {
        let mut sim = arena(NetRole::Standalone);
        let core = TilePos::new(50, 12);
        sim.world_mut()
            .place_structure(core, TeamId::CRUX, vec![BlockFlag::Core]);
        let walker = spawn(&mut sim, DAGGER, TeamId::SHARDED, at(100, 100), None);
        if slowed {
            let slow = sim.registry().status_named("slow").unwrap();
            sim.apply_status(walker, slow.id, Fixed::from_num(100)).unwrap();
        }
        for _ in 0..20 {
            sim.tick();
        }
        let position = sim.unit(walker).unwrap().position;
        position.distance_squared(at(100, 100))
    };
    assert!(run(true) < run(false));
}

// =============================================================================
// Commands
// =============================================================================

fn commanded_arena(radius: Option<i32>) -> Simulation {
    let rules = Rules {
        command_radius: radius.map(Fixed::from_num),
        ..Rules::default()
    };
    let mut sim = Simulation::new(
        standard_registry(),
        rules,
        GridWorld::new(ARENA_TILES, ARENA_TILES),
        NetRole::Standalone,
    );
    sim.world_mut().place_structure(
        TilePos::new(6, 4),
        TeamId::SHARDED,
        vec![BlockFlag::CommandCenter],
    );
    sim.world_mut()
        .place_structure(TilePos::new(8, 8), TeamId::SHARDED, vec![BlockFlag::Rally]);
    sim
}

#[test]
fn command_reaches_units_inside_radius_only() {
    let mut sim = commanded_arena(Some(100));
    let near = spawn(&mut sim, DAGGER, TeamId::SHARDED, at(80, 40), None);
    let far = spawn(&mut sim, DAGGER, TeamId::SHARDED, at(400, 400), None);

    sim.world_mut()
        .set_command(TilePos::new(6, 4), UnitCommand::Retreat);
    assert_eq!(sim.propagate_commands(TeamId::SHARDED), 1);
    assert_eq!(sim.unit(near).unwrap().state_name(), Some("retreat"));
    assert_eq!(sim.unit(far).unwrap().state_name(), Some("attack"));
}

#[test]
fn new_units_start_under_current_command() {
    let mut sim = commanded_arena(None);
    sim.world_mut()
        .set_command(TilePos::new(6, 4), UnitCommand::Rally);
    let unit = spawn(&mut sim, FLARE, TeamId::SHARDED, at(300, 300), None);
    assert_eq!(sim.unit(unit).unwrap().state_name(), Some("rally"));
}

#[test]
fn rallied_units_gather_at_rally_point() {
    let mut sim = commanded_arena(None);
    let rally = TilePos::new(8, 8).world_center();
    let unit = spawn(&mut sim, DAGGER, TeamId::SHARDED, at(400, 400), None);
    sim.world_mut()
        .set_command(TilePos::new(6, 4), UnitCommand::Rally);
    sim.propagate_commands(TeamId::SHARDED);

    let start = sim.unit(unit).unwrap().position.distance_squared(rally);
    for _ in 0..60 {
        sim.tick();
    }
    let end = sim.unit(unit).unwrap().position.distance_squared(rally);
    assert!(end < start);
}

#[test]
fn enemy_command_centers_are_ignored() {
    let mut sim = commanded_arena(None);
    let unit = spawn(&mut sim, DAGGER, TeamId::CRUX, at(60, 40), None);
    sim.world_mut()
        .set_command(TilePos::new(6, 4), UnitCommand::Retreat);
    assert_eq!(sim.propagate_commands(TeamId::CRUX), 0);
    assert_eq!(sim.unit(unit).unwrap().state_name(), Some("attack"));
}
