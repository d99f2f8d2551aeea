//! Death, removal and mirroring across the authority boundary.
//!
//! These tests drive whole simulations through their public API and check
//! what an authority and its mirrors agree on.

use warden_core::components::{BlockFlag, TeamId, TilePos};
use warden_core::error::GameError;
use warden_core::math::Fixed;
use warden_core::net::{DeathNotice, NetMessage, NetRole};
use warden_core::simulation::Simulation;
use warden_core::world::{Tile, World};
use warden_test_utils::fixtures::{arena, at, relay, skirmish, spawn, DAGGER, FLARE};

fn with_factory(role: NetRole) -> (Simulation, TilePos) {
    let factory = TilePos::new(20, 20);
    let mut sim = arena(role);
    sim.world_mut()
        .place_structure(factory, TeamId::CRUX, vec![BlockFlag::UnitFactory]);
    (sim, factory)
}

// =============================================================================
// Idempotent death
// =============================================================================

#[test]
fn repeated_kills_drop_and_notify_once() {
    let (mut sim, factory) = with_factory(NetRole::Standalone);
    let unit = spawn(&mut sim, DAGGER, TeamId::CRUX, at(40, 40), Some(factory));

    assert!(sim.kill_unit(unit).unwrap());
    assert!(!sim.kill_unit(unit).unwrap());
    sim.damage_unit(unit, Fixed::from_num(500)).unwrap();

    let events = sim.tick();
    assert_eq!(events.drops.len(), 1);
    assert_eq!(events.drops[0].stack.item, "copper");
    assert_eq!(events.deaths.len(), 1);
    assert_eq!(events.removed, vec![unit]);
    assert_eq!(sim.world().removal_log(), &[(factory, unit)]);

    for _ in 0..5 {
        let events = sim.tick();
        assert!(events.drops.is_empty());
        assert!(events.deaths.is_empty());
    }
    assert_eq!(sim.world().removal_log().len(), 1);
}

#[test]
fn overkill_damage_runs_death_once() {
    let mut sim = arena(NetRole::Standalone);
    let unit = spawn(&mut sim, DAGGER, TeamId::CRUX, at(40, 40), None);

    sim.damage_unit(unit, Fixed::from_num(100)).unwrap();
    sim.damage_unit(unit, Fixed::from_num(100)).unwrap();
    sim.damage_unit(unit, Fixed::from_num(100)).unwrap();

    let events = sim.tick();
    assert_eq!(events.deaths.len(), 1);
    assert_eq!(events.drops.len(), 1);
}

#[test]
fn removed_units_are_gone() {
    let mut sim = arena(NetRole::Standalone);
    let unit = spawn(&mut sim, FLARE, TeamId::CRUX, at(40, 40), None);
    sim.kill_unit(unit).unwrap();
    sim.tick();

    assert!(sim.unit(unit).is_none());
    assert!(matches!(
        sim.damage_unit(unit, Fixed::from_num(1)),
        Err(GameError::UnitNotFound(id)) if id == unit
    ));
}

#[test]
fn boss_deaths_are_flagged() {
    let mut sim = arena(NetRole::Standalone);
    let unit = spawn(&mut sim, DAGGER, TeamId::CRUX, at(40, 40), None);
    let boss = sim.registry().status_named("boss").unwrap();
    assert!(sim.apply_status(unit, boss.id, Fixed::from_num(1000)).unwrap());
    assert!(sim.unit(unit).unwrap().is_boss(sim.registry()));

    sim.kill_unit(unit).unwrap();
    let events = sim.tick();
    assert!(events.deaths[0].boss);
}

// =============================================================================
// Structural and spawner kills
// =============================================================================

#[test]
fn ground_unit_on_new_wall_dies_next_tick() {
    let mut sim = arena(NetRole::Standalone);
    let walker = spawn(&mut sim, DAGGER, TeamId::SHARDED, at(80, 80), None);
    let flyer = spawn(&mut sim, FLARE, TeamId::SHARDED, at(80, 80), None);
    sim.tick();
    assert!(sim.unit(walker).is_some());

    sim.world_mut().set_tile(TilePos::new(10, 10), Tile::WALL);
    let events = sim.tick();

    assert_eq!(events.removed, vec![walker]);
    assert!(sim.unit(flyer).is_some());
}

#[test]
fn construction_sites_do_not_crush() {
    let mut sim = arena(NetRole::Standalone);
    sim.world_mut()
        .set_tile(TilePos::new(10, 10), Tile::CONSTRUCT_SITE);
    let walker = spawn(&mut sim, DAGGER, TeamId::SHARDED, at(80, 80), None);

    for _ in 0..10 {
        sim.tick();
    }
    assert!(sim.unit(walker).is_some());
}

#[test]
fn losing_the_factory_kills_bound_units() {
    let (mut sim, factory) = with_factory(NetRole::Standalone);
    let bound = spawn(&mut sim, DAGGER, TeamId::CRUX, at(40, 40), Some(factory));
    let free = spawn(&mut sim, DAGGER, TeamId::CRUX, at(100, 40), None);

    sim.world_mut().remove_structure(factory);
    let events = sim.tick();

    assert_eq!(events.removed, vec![bound]);
    assert!(sim.unit(free).is_some());
}

#[test]
fn factory_replaced_by_other_block_kills_bound_units() {
    let (mut sim, factory) = with_factory(NetRole::Standalone);
    let bound = spawn(&mut sim, DAGGER, TeamId::CRUX, at(40, 40), Some(factory));

    sim.world_mut()
        .place_structure(factory, TeamId::CRUX, vec![BlockFlag::Turret]);
    let events = sim.tick();
    assert_eq!(events.removed, vec![bound]);
}

// =============================================================================
// Server / client protocol
// =============================================================================

#[test]
fn server_broadcasts_each_death_once() {
    let mut server = arena(NetRole::Server);
    let unit = spawn(&mut server, DAGGER, TeamId::CRUX, at(40, 40), None);

    server.kill_unit(unit).unwrap();
    server.kill_unit(unit).unwrap();
    server.tick();

    assert_eq!(
        server.take_outgoing(),
        vec![NetMessage::UnitDeath(DeathNotice { unit })]
    );
}

#[test]
fn standalone_never_broadcasts() {
    let mut sim = arena(NetRole::Standalone);
    let unit = spawn(&mut sim, DAGGER, TeamId::CRUX, at(40, 40), None);
    sim.kill_unit(unit).unwrap();
    sim.tick();
    assert!(sim.take_outgoing().is_empty());
}

#[test]
fn mirror_applies_death_without_drops() {
    let (mut server, factory) = with_factory(NetRole::Server);
    let (mut client, _) = with_factory(NetRole::Client);
    let unit = spawn(&mut server, DAGGER, TeamId::CRUX, at(40, 40), Some(factory));

    relay(&mut server, &mut client);
    client.tick();
    assert!(client.unit(unit).is_some());

    server.kill_unit(unit).unwrap();
    let server_events = server.tick();
    assert_eq!(server_events.drops.len(), 1);

    relay(&mut server, &mut client);
    let client_events = client.tick();
    assert!(client_events.drops.is_empty());
    assert_eq!(client_events.deaths.len(), 1);
    assert_eq!(client_events.removed, vec![unit]);
    assert_eq!(client.world().removal_log(), &[(factory, unit)]);
}

#[test]
fn factory_counts_return_to_zero_on_both_sides() {
    let (mut server, factory) = with_factory(NetRole::Server);
    let (mut client, _) = with_factory(NetRole::Client);
    let active = |sim: &Simulation| sim.world().structure_at(factory).unwrap().active_units;

    let units: Vec<_> = (0..3)
        .map(|i| spawn(&mut server, DAGGER, TeamId::CRUX, at(40 + i * 10, 40), Some(factory)))
        .collect();
    relay(&mut server, &mut client);
    client.tick();
    assert_eq!(active(&server), 3);
    assert_eq!(active(&client), 3);

    for unit in units {
        server.kill_unit(unit).unwrap();
    }
    server.tick();
    relay(&mut server, &mut client);
    client.tick();
    assert_eq!(active(&server), 0);
    assert_eq!(active(&client), 0);
}

#[test]
fn duplicate_death_notices_are_absorbed() {
    let (mut server, factory) = with_factory(NetRole::Server);
    let (mut client, _) = with_factory(NetRole::Client);
    let unit = spawn(&mut server, DAGGER, TeamId::CRUX, at(40, 40), Some(factory));
    relay(&mut server, &mut client);
    client.tick();

    let notice = NetMessage::UnitDeath(DeathNotice { unit });
    client.enqueue(notice.clone());
    client.enqueue(notice.clone());
    let events = client.tick();
    assert_eq!(events.deaths.len(), 1);

    client.enqueue(notice);
    let events = client.tick();
    assert!(events.deaths.is_empty());
    assert_eq!(client.world().removal_log().len(), 1);
}

#[test]
fn mirror_never_decides_deaths() {
    let mut server = arena(NetRole::Server);
    let mut client = arena(NetRole::Client);
    let unit = spawn(&mut server, DAGGER, TeamId::CRUX, at(40, 40), None);
    relay(&mut server, &mut client);
    client.tick();

    assert!(matches!(
        client.kill_unit(unit),
        Err(GameError::InvalidState(_))
    ));
    assert!(matches!(
        client.damage_unit(unit, Fixed::from_num(10_000)),
        Err(GameError::InvalidState(_))
    ));
    client.tick();
    assert!(client.unit(unit).is_some());
    assert!(!client.unit(unit).unwrap().is_dead());
}

#[test]
fn mirror_drops_snapshots_for_removed_units() {
    let mut server = arena(NetRole::Server);
    let mut client = arena(NetRole::Client);
    let unit = spawn(&mut server, DAGGER, TeamId::CRUX, at(40, 40), None);
    let stale = server.snapshot_messages().unwrap();

    relay(&mut server, &mut client);
    client.tick();
    server.kill_unit(unit).unwrap();
    server.tick();
    relay(&mut server, &mut client);
    client.tick();
    assert!(client.unit(unit).is_none());

    for message in stale {
        client.enqueue(message);
    }
    client.tick();
    assert!(client.unit(unit).is_none());
}

#[test]
fn skirmish_mirror_stays_in_step() {
    let mut server = skirmish(NetRole::Server);
    let mut client = skirmish(NetRole::Client);

    for _ in 0..120 {
        server.tick();
        relay(&mut server, &mut client);
        client.tick();
        assert_eq!(server.units().sorted_ids(), client.units().sorted_ids());
    }
}

#[test]
fn messages_survive_the_wire() {
    let mut server = arena(NetRole::Server);
    let unit = spawn(&mut server, DAGGER, TeamId::CRUX, at(40, 40), None);
    server.kill_unit(unit).unwrap();

    for message in server.take_outgoing() {
        let bytes = message.encode().unwrap();
        assert_eq!(NetMessage::decode(&bytes).unwrap(), message);
    }
}
