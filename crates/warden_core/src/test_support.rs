//! Fixtures shared by the unit tests in this crate.

use std::sync::Arc;

use crate::components::{EntityId, TeamId};
use crate::content::{ContentRegistry, UnitType, BOSS_STATUS};
use crate::controller::ControllerKind;
use crate::data::{ContentData, ItemStack, StatusEffectData, UnitTypeData, WeaponData};
use crate::math::{Fixed, Vec2Fixed};
use crate::net::NetRole;
use crate::rules::Rules;
use crate::simulation::{SimContext, Simulation, UnitStorage};
use crate::unit::Unit;
use crate::world::GridWorld;

fn ratio(numerator: i32, denominator: i32) -> Fixed {
    Fixed::from_num(numerator) / Fixed::from_num(denominator)
}

fn dagger_data() -> UnitTypeData {
    UnitTypeData {
        name: "dagger".to_string(),
        health: Fixed::from_num(130),
        mass: Fixed::from_num(1),
        speed: ratio(1, 2),
        max_velocity: Fixed::from_num(2),
        drag: ratio(1, 4),
        rotate_speed: ratio(1, 4),
        hit_size: Fixed::from_num(8),
        hit_size_tile: Fixed::from_num(8),
        flying: false,
        target_air: false,
        range: Fixed::ZERO,
        immunities: vec!["wet".to_string()],
        weapon: WeaponData {
            name: "blaster".to_string(),
            range: Fixed::from_num(60),
            reload: 20,
            alternate: true,
            bullet: "standard-copper".to_string(),
        },
        death_sound: "unit-explode".to_string(),
        item_capacity: 10,
        drops: vec![ItemStack {
            item: "copper".to_string(),
            amount: 3,
        }],
        controller: ControllerKind::Ground,
    }
}

fn flare_data() -> UnitTypeData {
    UnitTypeData {
        name: "flare".to_string(),
        health: Fixed::from_num(70),
        mass: Fixed::from_num(1),
        speed: Fixed::from_num(1),
        max_velocity: Fixed::from_num(3),
        drag: ratio(1, 4),
        rotate_speed: ratio(1, 2),
        hit_size: Fixed::from_num(8),
        hit_size_tile: Fixed::from_num(8),
        flying: true,
        target_air: true,
        range: Fixed::from_num(40),
        immunities: Vec::new(),
        weapon: WeaponData {
            name: "flare-gun".to_string(),
            range: Fixed::from_num(40),
            reload: 10,
            alternate: false,
            bullet: "standard-flare".to_string(),
        },
        death_sound: "unit-explode".to_string(),
        item_capacity: 0,
        drops: Vec::new(),
        controller: ControllerKind::Flying,
    }
}

/// Registry with a ground "dagger" (id 0), a flying "flare" (id 1) and the
/// "boss", "burning" and "wet" statuses.
pub(crate) fn registry() -> ContentRegistry {
    let burning = StatusEffectData {
        damage_per_tick: Fixed::from_num(2),
        ..StatusEffectData::marker("burning")
    };
    ContentRegistry::from_data(ContentData {
        units: vec![dagger_data(), flare_data()],
        status_effects: vec![
            StatusEffectData::marker(BOSS_STATUS),
            burning,
            StatusEffectData::marker("wet"),
        ],
    })
    .unwrap()
}

pub(crate) fn dagger(registry: &ContentRegistry) -> Arc<UnitType> {
    registry.unit_named("dagger").unwrap()
}

pub(crate) fn flare(registry: &ContentRegistry) -> Arc<UnitType> {
    registry.unit_named("flare").unwrap()
}

pub(crate) fn at(x: i32, y: i32) -> Vec2Fixed {
    Vec2Fixed::new(Fixed::from_num(x), Fixed::from_num(y))
}

/// Everything a [`SimContext`] borrows, owned in one place.
pub(crate) struct ContextFixture {
    pub registry: Arc<ContentRegistry>,
    pub rules: Rules,
    pub world: GridWorld,
    pub units: UnitStorage,
    pub role: NetRole,
}

impl ContextFixture {
    pub fn context(&self) -> SimContext<'_> {
        SimContext {
            tick: 0,
            role: self.role,
            rules: &self.rules,
            registry: &self.registry,
            world: &self.world,
            units: &self.units,
        }
    }

    pub fn add_unit(&mut self, kind: Arc<UnitType>, team: TeamId, position: Vec2Fixed) -> EntityId {
        let id = self.units.allocate_id();
        let mut unit = Unit::new(id, kind, team);
        unit.position = position;
        self.units.insert(unit);
        id
    }
}

pub(crate) fn context_fixture() -> ContextFixture {
    ContextFixture {
        registry: Arc::new(registry()),
        rules: Rules::default(),
        world: GridWorld::new(64, 64),
        units: UnitStorage::new(),
        role: NetRole::Standalone,
    }
}

pub(crate) fn simulation(role: NetRole) -> Simulation {
    Simulation::new(
        Arc::new(registry()),
        Rules::default(),
        GridWorld::new(64, 64),
        role,
    )
}
