//! Network roles and the messages exchanged between authority and mirrors.
//!
//! Messages never touch a unit directly. A receiving host pushes them into
//! a simulation's inbox and the simulation applies them at the start of its
//! next tick.

use serde::{Deserialize, Serialize};

use crate::components::EntityId;
use crate::error::{GameError, Result};

/// How a simulation instance participates in a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum NetRole {
    /// Single instance with no peers. Authoritative.
    #[default]
    Standalone,
    /// Authoritative host that broadcasts to mirrors.
    Server,
    /// Mirror of a server.
    Client,
}

impl NetRole {
    /// Whether this instance decides damage, death and targeting.
    #[must_use]
    pub const fn is_authority(self) -> bool {
        matches!(self, Self::Standalone | Self::Server)
    }

    /// Whether this instance only reflects another's state.
    #[must_use]
    pub const fn is_mirror(self) -> bool {
        matches!(self, Self::Client)
    }

    /// Whether this instance must tell peers about deaths.
    #[must_use]
    pub const fn broadcasts(self) -> bool {
        matches!(self, Self::Server)
    }
}

/// Authority's announcement that a unit died.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DeathNotice {
    /// The unit that died.
    pub unit: EntityId,
}

/// A message between peers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum NetMessage {
    /// A unit died on the authority.
    UnitDeath(DeathNotice),
    /// Authoritative state of one unit, in the snapshot wire format.
    UnitSnapshot {
        /// The unit described.
        unit: EntityId,
        /// Encoded snapshot record.
        payload: Vec<u8>,
    },
}

impl NetMessage {
    /// Frame the message for a byte transport.
    pub fn encode(&self) -> Result<Vec<u8>> {
        bincode::serialize(self).map_err(|e| GameError::Encode {
            format: "message",
            message: e.to_string(),
        })
    }

    /// Parse a framed message.
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        bincode::deserialize(bytes).map_err(|e| GameError::Decode {
            format: "message",
            message: e.to_string(),
        })
    }
}
