//! Test fixtures and helpers.
//!
//! Pre-built content, arenas and skirmishes for consistent testing.

use std::sync::Arc;

use fixed::types::I32F32;
use warden_core::components::{BlockFlag, EntityId, TeamId, TilePos};
use warden_core::content::{ContentRegistry, BOSS_STATUS};
use warden_core::controller::ControllerKind;
use warden_core::data::{ContentData, ItemStack, StatusEffectData, UnitTypeData, WeaponData};
use warden_core::math::Vec2Fixed;
use warden_core::net::NetRole;
use warden_core::rules::Rules;
use warden_core::simulation::Simulation;
use warden_core::world::{GridWorld, World};

/// Registry id of the ground fixture unit.
pub const DAGGER: u8 = 0;

/// Registry id of the flying fixture unit.
pub const FLARE: u8 = 1;

/// Side length of fixture arenas, in tiles.
pub const ARENA_TILES: u16 = 64;

/// Create a fixed-point number from an integer.
#[must_use]
pub fn fixed(n: i32) -> I32F32 {
    I32F32::from_num(n)
}

/// Create a fixed-point number from a ratio.
#[must_use]
pub fn fixed_ratio(numerator: i32, denominator: i32) -> I32F32 {
    I32F32::from_num(numerator) / I32F32::from_num(denominator)
}

/// World position from integer coordinates.
#[must_use]
pub fn at(x: i32, y: i32) -> Vec2Fixed {
    Vec2Fixed::new(fixed(x), fixed(y))
}

fn weapon(name: &str, range: i32, reload: u32, alternate: bool) -> WeaponData {
    WeaponData {
        name: name.to_string(),
        range: fixed(range),
        reload,
        alternate,
        bullet: format!("{name}-bullet"),
    }
}

/// Ground unit with an alternating blaster and a copper drop.
#[must_use]
pub fn dagger_data() -> UnitTypeData {
    UnitTypeData {
        name: "dagger".to_string(),
        health: fixed(130),
        mass: fixed(1),
        speed: fixed_ratio(1, 2),
        max_velocity: fixed(2),
        drag: fixed_ratio(1, 4),
        rotate_speed: fixed_ratio(1, 4),
        hit_size: fixed(8),
        hit_size_tile: fixed(8),
        flying: false,
        target_air: false,
        range: I32F32::ZERO,
        immunities: vec!["wet".to_string()],
        weapon: weapon("blaster", 60, 20, true),
        death_sound: "unit-explode".to_string(),
        item_capacity: 10,
        drops: vec![ItemStack {
            item: "copper".to_string(),
            amount: 3,
        }],
        controller: ControllerKind::Ground,
    }
}

/// Flying unit that can hit air and ground.
#[must_use]
pub fn flare_data() -> UnitTypeData {
    UnitTypeData {
        name: "flare".to_string(),
        health: fixed(70),
        mass: fixed(1),
        speed: fixed(1),
        max_velocity: fixed(3),
        drag: fixed_ratio(1, 4),
        rotate_speed: fixed_ratio(1, 2),
        hit_size: fixed(8),
        hit_size_tile: fixed(8),
        flying: true,
        target_air: true,
        range: fixed(40),
        immunities: Vec::new(),
        weapon: weapon("flare-gun", 40, 10, false),
        death_sound: "unit-explode".to_string(),
        item_capacity: 0,
        drops: Vec::new(),
        controller: ControllerKind::Flying,
    }
}

/// Dagger, flare, and the `boss`, `burning`, `wet` and `slow` statuses.
#[must_use]
pub fn standard_content() -> ContentData {
    ContentData {
        units: vec![dagger_data(), flare_data()],
        status_effects: vec![
            StatusEffectData::marker(BOSS_STATUS),
            StatusEffectData {
                damage_per_tick: fixed(2),
                ..StatusEffectData::marker("burning")
            },
            StatusEffectData::marker("wet"),
            StatusEffectData {
                speed_multiplier: fixed_ratio(1, 2),
                ..StatusEffectData::marker("slow")
            },
        ],
    }
}

/// Shared registry built from [`standard_content`].
///
/// # Panics
///
/// Panics if the fixture content is invalid.
#[must_use]
pub fn standard_registry() -> Arc<ContentRegistry> {
    Arc::new(ContentRegistry::from_data(standard_content()).expect("fixture content is valid"))
}

/// Empty open arena with default rules.
#[must_use]
pub fn arena(role: NetRole) -> Simulation {
    Simulation::new(
        standard_registry(),
        Rules::default(),
        GridWorld::new(ARENA_TILES, ARENA_TILES),
        role,
    )
}

/// Tiles of the structures placed by [`skirmish`].
#[derive(Debug, Clone, Copy)]
pub struct SkirmishLayout {
    /// Sharded core.
    pub sharded_core: TilePos,
    /// Crux core.
    pub crux_core: TilePos,
    /// Crux unit factory every crux unit is bound to.
    pub crux_factory: TilePos,
    /// Sharded command center.
    pub command_center: TilePos,
    /// Sharded rally point.
    pub rally: TilePos,
}

impl Default for SkirmishLayout {
    fn default() -> Self {
        Self {
            sharded_core: TilePos::new(4, 4),
            crux_core: TilePos::new(40, 40),
            crux_factory: TilePos::new(44, 40),
            command_center: TilePos::new(6, 4),
            rally: TilePos::new(8, 8),
        }
    }
}

/// Place the skirmish structures into a world.
pub fn place_skirmish_structures(world: &mut GridWorld, layout: &SkirmishLayout) {
    world.place_structure(layout.sharded_core, TeamId::SHARDED, vec![BlockFlag::Core]);
    world.place_structure(layout.crux_core, TeamId::CRUX, vec![BlockFlag::Core]);
    world.place_structure(layout.crux_factory, TeamId::CRUX, vec![BlockFlag::UnitFactory]);
    world.place_structure(
        layout.command_center,
        TeamId::SHARDED,
        vec![BlockFlag::CommandCenter],
    );
    world.place_structure(layout.rally, TeamId::SHARDED, vec![BlockFlag::Rally]);
}

/// Two teams with cores, a factory and a mix of ground and air units
/// close enough to fight.
///
/// Mirrors get the structures only; their units arrive by snapshot.
///
/// # Panics
///
/// Panics if a fixture unit cannot be spawned.
#[must_use]
pub fn skirmish(role: NetRole) -> Simulation {
    let layout = SkirmishLayout::default();
    let mut sim = arena(role);
    place_skirmish_structures(sim.world_mut(), &layout);
    if !role.is_authority() {
        return sim;
    }

    for i in 0..4 {
        spawn(&mut sim, DAGGER, TeamId::SHARDED, at(200 + i * 12, 200), None);
        spawn(
            &mut sim,
            DAGGER,
            TeamId::CRUX,
            at(240 + i * 12, 220),
            Some(layout.crux_factory),
        );
    }
    spawn(&mut sim, FLARE, TeamId::SHARDED, at(180, 240), None);
    spawn(&mut sim, FLARE, TeamId::CRUX, at(260, 260), None);
    sim
}

/// Spawn a unit on an authority.
///
/// # Panics
///
/// Panics if the spawn fails.
pub fn spawn(
    sim: &mut Simulation,
    type_id: u8,
    team: TeamId,
    position: Vec2Fixed,
    spawner: Option<TilePos>,
) -> EntityId {
    sim.spawn_unit(type_id, team, position, spawner)
        .expect("fixture spawn succeeds")
}

/// Move every queued message from `from` into `to`, followed by fresh
/// snapshots of every live unit on `from`.
///
/// # Panics
///
/// Panics if a snapshot cannot be encoded.
pub fn relay<W: World>(from: &mut Simulation<W>, to: &mut Simulation<W>) {
    for message in from.take_outgoing() {
        to.enqueue(message);
    }
    for message in from.snapshot_messages().expect("snapshots encode") {
        to.enqueue(message);
    }
}
