//! Data structures for content definitions.
//!
//! This module contains pure data structures that define unit types and
//! status effects. All structs are designed to be deserialized from RON.
//!
//! **Note:** This module contains no IO - it only defines data types.
//! Reading files is left to the host.

mod status_data;
mod unit_data;

use serde::{Deserialize, Serialize};

pub use status_data::StatusEffectData;
pub use unit_data::{ItemStack, UnitTypeData, WeaponData};

/// A complete content set, in registration order.
///
/// Position in each list becomes the numeric id written to saves and
/// snapshots, so reordering entries breaks existing data.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContentData {
    /// Unit types.
    #[serde(default)]
    pub units: Vec<UnitTypeData>,
    /// Status effects.
    #[serde(default)]
    pub status_effects: Vec<StatusEffectData>,
}
