//! # Warden Core
//!
//! Deterministic core of autonomous combat units.
//!
//! This crate contains **only** deterministic logic:
//! - No rendering
//! - No IO
//! - No system randomness
//! - No floating-point math (uses fixed-point)
//!
//! A unit carries its own health, status effects, timers, target and AI
//! state machine. Each tick it validates and reacquires targets, runs its
//! controller, moves, and fires. Deaths follow an authority protocol: only
//! the server (or a standalone game) decides them, mirrors apply the
//! broadcast notice and interpolate between snapshots.
//!
//! ## Crate Structure
//!
//! - [`unit`] - The unit entity
//! - [`state`] - AI state machine
//! - [`controller`] - Ground and flying controllers
//! - [`targeting`] - Target validation and closest-target queries
//! - [`lifecycle`] - Activation, death and removal
//! - [`codec`] - Save and snapshot records
//! - [`simulation`] - Core simulation loop
//! - [`math`] - Fixed-point math utilities

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

pub mod codec;
pub mod components;
pub mod content;
pub mod controller;
pub mod data;
pub mod error;
pub mod interpolation;
pub mod lifecycle;
pub mod math;
pub mod net;
pub mod rules;
pub mod simulation;
pub mod state;
pub mod status;
pub mod systems;
pub mod targeting;
pub mod timer;
pub mod unit;
pub mod world;

#[cfg(test)]
mod test_support;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::components::*;
    pub use crate::content::{ContentRegistry, StatusEffect, UnitType};
    pub use crate::controller::{ControllerKind, ShotEvent, UnitCommand};
    pub use crate::error::{GameError, Result};
    pub use crate::lifecycle::{DeathEffect, DropEvent, DropResolver};
    pub use crate::math::{Fixed, Vec2Fixed};
    pub use crate::net::{DeathNotice, NetMessage, NetRole};
    pub use crate::rules::Rules;
    pub use crate::simulation::{SimContext, Simulation, TickEvents, UnitStorage};
    pub use crate::unit::Unit;
    pub use crate::world::{GridWorld, Structure, Tile, World};
}
