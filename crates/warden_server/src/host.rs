//! Session host.
//!
//! Runs an authority simulation next to one mirror, relaying deaths every
//! tick and snapshots every `snapshot_interval` ticks over a [`PeerLink`].

use std::sync::Arc;
use std::time::Duration;

use tokio::time::{interval, MissedTickBehavior};
use warden_core::components::{BlockFlag, TeamId, TilePos};
use warden_core::content::ContentRegistry;
use warden_core::math::{Fixed, Vec2Fixed};
use warden_core::net::NetRole;
use warden_core::rules::Rules;
use warden_core::simulation::Simulation;
use warden_core::world::GridWorld;

use crate::network::PeerLink;
use crate::{ServerConfig, ServerError};

/// Side length of the session map in tiles.
pub const MAP_TILES: u16 = 64;

const SHARDED_CORE: TilePos = TilePos::new(4, 4);
const SHARDED_RALLY: TilePos = TilePos::new(8, 8);
const SHARDED_COMMAND: TilePos = TilePos::new(6, 4);
const CRUX_CORE: TilePos = TilePos::new(56, 56);
const CRUX_FACTORY: TilePos = TilePos::new(52, 56);

/// Summary of a finished session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionReport {
    /// Ticks run.
    pub ticks: u64,
    /// Shots fired on the authority.
    pub shots: usize,
    /// Units that died on the authority.
    pub deaths: usize,
    /// Units left on the authority.
    pub units_left: usize,
    /// Units present on the mirror at the end.
    pub mirror_units: usize,
    /// Authority state hash at the end.
    pub state_hash: u64,
}

/// Build a session map with cores, a factory and a command post.
#[must_use]
pub fn session_world() -> GridWorld {
    let mut world = GridWorld::new(MAP_TILES, MAP_TILES);
    world.place_structure(SHARDED_CORE, TeamId::SHARDED, vec![BlockFlag::Core]);
    world.place_structure(SHARDED_COMMAND, TeamId::SHARDED, vec![BlockFlag::CommandCenter]);
    world.place_structure(SHARDED_RALLY, TeamId::SHARDED, vec![BlockFlag::Rally]);
    world.place_structure(CRUX_CORE, TeamId::CRUX, vec![BlockFlag::Core]);
    world.place_structure(CRUX_FACTORY, TeamId::CRUX, vec![BlockFlag::UnitFactory]);
    world
}

/// Field each team's squad around the middle of the map.
///
/// Crux units are bound to the crux factory.
pub fn deploy_squads(sim: &mut Simulation, squad: &[String]) -> Result<usize, ServerError> {
    let middle = i32::from(MAP_TILES) * 4;
    let mut spawned = 0;
    for (slot, name) in (0i32..).zip(squad) {
        let type_id = sim.registry().unit_named(name)?.id;
        let offset = Fixed::from_num(slot * 12);
        let lane = Fixed::from_num(middle);
        sim.spawn_unit(
            type_id,
            TeamId::SHARDED,
            Vec2Fixed::new(lane - Fixed::from_num(40) + offset, lane - Fixed::from_num(30)),
            None,
        )?;
        sim.spawn_unit(
            type_id,
            TeamId::CRUX,
            Vec2Fixed::new(lane - Fixed::from_num(40) + offset, lane + Fixed::from_num(30)),
            Some(CRUX_FACTORY),
        )?;
        spawned += 2;
    }
    Ok(spawned)
}

/// Run one authority/mirror session to completion.
pub async fn run_session(
    config: &ServerConfig,
    registry: Arc<ContentRegistry>,
    rules: Rules,
) -> Result<SessionReport, ServerError> {
    let mut server = Simulation::new(
        Arc::clone(&registry),
        rules.clone(),
        session_world(),
        NetRole::Server,
    );
    let mut client = Simulation::new(registry, rules, session_world(), NetRole::Client);
    let (server_end, mut client_end) = PeerLink::pair();

    let fielded = deploy_squads(&mut server, &config.squad)?;
    tracing::info!(units = fielded, ticks = config.ticks, "Session started");

    let period = Duration::from_secs(1) / config.tick_rate.max(1);
    let mut pacer = interval(period);
    pacer.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let snapshot_interval = u64::from(config.snapshot_interval.max(1));

    let mut shots = 0;
    let mut deaths = 0;
    for _ in 0..config.ticks {
        if config.realtime {
            pacer.tick().await;
        } else {
            tokio::task::yield_now().await;
        }

        let events = server.tick();
        shots += events.shots.len();
        deaths += events.deaths.len();
        for death in &events.deaths {
            tracing::debug!(unit = death.unit, "Unit died");
        }

        server_end.flush(&mut server)?;
        if server.get_tick() % snapshot_interval == 0 {
            server_end.send_snapshots(&server)?;
        }
        client_end.pump(&mut client)?;
        client.tick();
    }

    let report = SessionReport {
        ticks: server.get_tick(),
        shots,
        deaths,
        units_left: server.units().len(),
        mirror_units: client.units().len(),
        state_hash: server.state_hash(),
    };
    tracing::info!(?report, "Session finished");
    Ok(report)
}
