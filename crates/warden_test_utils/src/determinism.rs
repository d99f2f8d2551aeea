//! Reproducibility checks for the unit simulation.
//!
//! A mirror only stays in step with its authority when identical inputs
//! give identical units on every tick. The helpers here run fixture
//! simulations side by side and report where they first disagree, using
//! [`Simulation::state_hash`] as the fingerprint.

use std::thread;

use warden_core::net::NetRole;
use warden_core::simulation::Simulation;

use crate::fixtures;

/// Final state hashes of several runs of the same setup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HashRuns {
    /// One hash per run, in run order.
    pub hashes: Vec<u64>,
    /// Ticks each run advanced.
    pub ticks: u64,
}

impl HashRuns {
    /// Whether every run ended in the same state.
    #[must_use]
    pub fn is_consistent(&self) -> bool {
        self.hashes.windows(2).all(|pair| pair[0] == pair[1])
    }

    /// Fail the test unless every run ended in the same state.
    ///
    /// # Panics
    ///
    /// Panics with the distinct hashes if the runs disagree.
    pub fn assert_consistent(&self) {
        let mut distinct = self.hashes.clone();
        distinct.sort_unstable();
        distinct.dedup();
        assert!(
            distinct.len() <= 1,
            "{} runs of {} ticks ended in {} different states: {distinct:?}",
            self.hashes.len(),
            self.ticks,
            distinct.len()
        );
    }
}

fn run_to_hash(mut sim: Simulation, ticks: u64) -> u64 {
    for _ in 0..ticks {
        sim.tick();
    }
    sim.state_hash()
}

/// Build and run `setup` `runs` times, one after another.
///
/// ```
/// use warden_core::net::NetRole;
/// use warden_test_utils::determinism::hash_runs;
/// use warden_test_utils::fixtures::skirmish;
///
/// hash_runs(|| skirmish(NetRole::Standalone), 3, 60).assert_consistent();
/// ```
pub fn hash_runs<F>(setup: F, runs: usize, ticks: u64) -> HashRuns
where
    F: Fn() -> Simulation,
{
    HashRuns {
        hashes: (0..runs).map(|_| run_to_hash(setup(), ticks)).collect(),
        ticks,
    }
}

/// Like [`hash_runs`], with every run on its own scoped thread.
///
/// # Panics
///
/// Panics if a run panics.
pub fn hash_runs_parallel<F>(setup: F, runs: usize, ticks: u64) -> HashRuns
where
    F: Fn() -> Simulation + Sync,
{
    let hashes = thread::scope(|scope| {
        let handles: Vec<_> = (0..runs)
            .map(|_| scope.spawn(|| run_to_hash(setup(), ticks)))
            .collect();
        handles
            .into_iter()
            .map(|handle| handle.join().expect("simulation run panicked"))
            .collect()
    });
    HashRuns { hashes, ticks }
}

/// Step two copies of `setup` together and return the first tick after
/// which their hashes differ (0 if they differ before any tick).
pub fn first_divergence<F>(setup: F, ticks: u64) -> Option<u64>
where
    F: Fn() -> Simulation,
{
    let mut a = setup();
    let mut b = setup();
    if a.state_hash() != b.state_hash() {
        return Some(0);
    }
    (1..=ticks).find(|_| {
        a.tick();
        b.tick();
        a.state_hash() != b.state_hash()
    })
}

/// Save after `ticks`, load into an empty simulation sharing the same
/// registry, rules and world, then save again. True if both saves are
/// byte-identical.
pub fn save_round_trip_is_exact<F>(setup: F, ticks: u64) -> bool
where
    F: Fn() -> Simulation,
{
    let mut sim = setup();
    for _ in 0..ticks {
        sim.tick();
    }
    let Ok(first) = sim.save() else {
        return false;
    };

    let mut restored = Simulation::new(
        sim.registry().clone(),
        sim.rules().clone(),
        sim.world().clone(),
        sim.role(),
    );
    restored.load(&first).is_ok() && matches!(restored.save(), Ok(second) if second == first)
}

/// Run a server and a client built by `setup`, relaying after every server
/// tick. Returns the first tick after which they hold different unit ids.
pub fn first_membership_divergence<F>(setup: F, ticks: u64) -> Option<u64>
where
    F: Fn(NetRole) -> Simulation,
{
    let mut server = setup(NetRole::Server);
    let mut client = setup(NetRole::Client);
    (1..=ticks).find(|_| {
        server.tick();
        fixtures::relay(&mut server, &mut client);
        client.tick();
        server.units().sorted_ids() != client.units().sorted_ids()
    })
}

/// Proptest strategies for fixture units.
pub mod strategies {
    use proptest::prelude::*;
    use warden_core::components::TeamId;
    use warden_core::math::{Fixed, Vec2Fixed};

    use crate::fixtures::{ARENA_TILES, DAGGER, FLARE};

    /// Generate a coordinate inside a fixture arena.
    pub fn arb_coordinate() -> impl Strategy<Value = Fixed> {
        let edge = i32::from(ARENA_TILES - 1) * 8;
        (0..edge).prop_map(Fixed::from_num)
    }

    /// Generate a position inside a fixture arena.
    pub fn arb_position() -> impl Strategy<Value = Vec2Fixed> {
        (arb_coordinate(), arb_coordinate()).prop_map(|(x, y)| Vec2Fixed::new(x, y))
    }

    /// Generate one of the two fighting teams.
    pub fn arb_team() -> impl Strategy<Value = TeamId> {
        prop_oneof![Just(TeamId::SHARDED), Just(TeamId::CRUX)]
    }

    /// Generate a fixture unit type id.
    pub fn arb_unit_type() -> impl Strategy<Value = u8> {
        prop_oneof![Just(DAGGER), Just(FLARE)]
    }

    /// Damage from a single hit.
    pub fn arb_damage() -> impl Strategy<Value = Fixed> {
        (1i32..200).prop_map(Fixed::from_num)
    }

    /// Parameters for spawning a test unit.
    #[derive(Debug, Clone)]
    pub struct TestUnitParams {
        /// Unit type id.
        pub type_id: u8,
        /// Team.
        pub team: TeamId,
        /// Position.
        pub position: Vec2Fixed,
    }

    /// Generate parameters for a test unit.
    pub fn arb_unit_params() -> impl Strategy<Value = TestUnitParams> {
        (arb_unit_type(), arb_team(), arb_position()).prop_map(|(type_id, team, position)| {
            TestUnitParams {
                type_id,
                team,
                position,
            }
        })
    }

    /// Generate a list of unit spawn parameters.
    pub fn arb_unit_list(max_units: usize) -> impl Strategy<Value = Vec<TestUnitParams>> {
        proptest::collection::vec(arb_unit_params(), 1..max_units)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{arena, at, skirmish, spawn, DAGGER, FLARE};
    use proptest::prelude::*;
    use warden_core::components::TeamId;

    fn standalone_skirmish() -> Simulation {
        skirmish(NetRole::Standalone)
    }

    fn populated(units: &[strategies::TestUnitParams], role: NetRole) -> Simulation {
        let mut sim = arena(role);
        if role.is_authority() {
            for params in units {
                spawn(&mut sim, params.type_id, params.team, params.position, None);
            }
        }
        sim
    }

    #[test]
    fn test_empty_arena_is_consistent() {
        assert!(hash_runs(|| arena(NetRole::Standalone), 2, 100).is_consistent());
    }

    #[test]
    fn test_skirmish_is_consistent() {
        hash_runs(standalone_skirmish, 3, 300).assert_consistent();
    }

    #[test]
    fn test_inconsistent_runs_are_reported() {
        let runs = HashRuns {
            hashes: vec![1, 1, 2],
            ticks: 10,
        };
        assert!(!runs.is_consistent());
        assert!(std::panic::catch_unwind(|| runs.assert_consistent()).is_err());
    }

    #[test]
    fn test_no_divergence_in_skirmish() {
        assert_eq!(first_divergence(standalone_skirmish, 200), None);
    }

    #[test]
    fn test_divergent_setups_are_caught() {
        let flip = std::cell::Cell::new(false);
        let setup = || {
            let mut sim = arena(NetRole::Standalone);
            let x = if flip.replace(true) { 120 } else { 100 };
            spawn(&mut sim, DAGGER, TeamId::SHARDED, at(x, 100), None);
            sim
        };
        assert_eq!(first_divergence(setup, 10), Some(0));
    }

    #[test]
    fn test_hash_changes_as_units_move() {
        let mut sim = standalone_skirmish();
        let before = sim.state_hash();
        sim.tick();
        assert_ne!(before, sim.state_hash());
    }

    #[test]
    fn test_parallel_skirmishes() {
        let parallel = hash_runs_parallel(standalone_skirmish, 4, 200);
        parallel.assert_consistent();
        assert_eq!(parallel.hashes[0], hash_runs(standalone_skirmish, 1, 200).hashes[0]);
    }

    #[test]
    fn test_save_round_trip_mid_fight() {
        assert!(save_round_trip_is_exact(standalone_skirmish, 90));
    }

    #[test]
    fn test_mirror_tracks_authority_membership() {
        assert_eq!(first_membership_divergence(skirmish, 300), None);
    }

    #[test]
    fn test_flyers_over_open_ground() {
        let setup = || {
            let mut sim = arena(NetRole::Standalone);
            spawn(&mut sim, FLARE, TeamId::SHARDED, at(100, 100), None);
            spawn(&mut sim, FLARE, TeamId::CRUX, at(130, 100), None);
            sim
        };
        assert!(hash_runs(setup, 2, 200).is_consistent());
    }

    proptest! {
        #[test]
        fn prop_random_units_are_reproducible(units in strategies::arb_unit_list(12)) {
            let runs = hash_runs(|| populated(&units, NetRole::Standalone), 2, 100);
            prop_assert!(runs.is_consistent());
        }

        #[test]
        fn prop_save_round_trip_is_exact(
            units in strategies::arb_unit_list(8),
            ticks in 0u64..60,
        ) {
            prop_assert!(save_round_trip_is_exact(|| populated(&units, NetRole::Standalone), ticks));
        }

        #[test]
        fn prop_repeated_damage_drops_once(
            hits in proptest::collection::vec(strategies::arb_damage(), 1..10),
        ) {
            let mut sim = arena(NetRole::Standalone);
            let unit = spawn(&mut sim, DAGGER, TeamId::CRUX, at(100, 100), None);
            let mut drops = 0;
            for hit in hits {
                if sim.unit(unit).is_some() {
                    sim.damage_unit(unit, hit).unwrap();
                }
                drops += sim.tick().drops.len();
            }
            prop_assert!(drops <= 1);
        }

        #[test]
        fn prop_mirror_membership_matches(units in strategies::arb_unit_list(8)) {
            prop_assert_eq!(first_membership_divergence(|role| populated(&units, role), 60), None);
        }
    }

    #[test]
    #[ignore = "Long-running stress test"]
    fn stress_test_hundred_daggers() {
        let setup = || {
            let mut sim = arena(NetRole::Standalone);
            for i in 0..100 {
                let team = if i % 2 == 0 { TeamId::SHARDED } else { TeamId::CRUX };
                spawn(&mut sim, DAGGER, team, at((i % 10) * 40 + 20, (i / 10) * 40 + 20), None);
            }
            sim
        };
        hash_runs_parallel(setup, 5, 1000).assert_consistent();
    }
}
