//! # Warden Dedicated Server
//!
//! Headless authority host.
//!
//! Runs the unit core as the authority and relays deaths and snapshots to
//! mirrors over peer links.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

pub mod host;
pub mod network;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use warden_core::content::ContentRegistry;
use warden_core::error::GameError;
use warden_core::rules::Rules;

/// Content shipped with the server, used when no content file is configured.
pub const BUILTIN_CONTENT: &str = include_str!("../assets/content.ron");

/// Errors raised by the server host.
#[derive(Debug, Error)]
pub enum ServerError {
    /// The unit core rejected an operation.
    #[error("Game error: {0}")]
    Game(#[from] GameError),

    /// A data file could not be read.
    #[error("Failed to read {path}: {source}")]
    Io {
        /// File that failed.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The server configuration could not be parsed.
    #[error("Invalid server config: {0}")]
    Config(#[from] ron::error::SpannedError),

    /// The other end of a peer link went away.
    #[error("Peer link closed")]
    LinkClosed,
}

/// Server configuration.
///
/// # Example RON
///
/// ```ron
/// ServerConfig(
///     tick_rate: 60,
///     snapshot_interval: 4,
///     ticks: 1200,
///     content_path: Some("data/content.ron"),
///     squad: ["dagger", "flare"],
/// )
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Tick rate (should match mirrors).
    pub tick_rate: u32,
    /// Ticks between snapshot broadcasts.
    pub snapshot_interval: u32,
    /// Ticks to run before the session ends.
    pub ticks: u64,
    /// Pace ticks against the wall clock.
    pub realtime: bool,
    /// RON content file; the built-in content is used when unset.
    pub content_path: Option<PathBuf>,
    /// RON rules file; default rules are used when unset.
    pub rules_path: Option<PathBuf>,
    /// Unit type names fielded by each team at session start.
    pub squad: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            tick_rate: warden_core::simulation::TICK_RATE,
            snapshot_interval: 4,
            ticks: 600,
            realtime: true,
            content_path: None,
            rules_path: None,
            squad: vec![
                "dagger".to_string(),
                "dagger".to_string(),
                "dagger".to_string(),
                "flare".to_string(),
            ],
        }
    }
}

impl ServerConfig {
    /// Parse a config from RON. Missing fields keep their defaults.
    pub fn from_ron(source: &str) -> Result<Self, ServerError> {
        Ok(ron::from_str(source)?)
    }

    /// Read and parse a config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ServerError> {
        Self::from_ron(&read(path.as_ref())?)
    }

    /// Build the content registry this config points at.
    pub fn load_content(&self) -> Result<Arc<ContentRegistry>, ServerError> {
        let registry = match &self.content_path {
            Some(path) => ContentRegistry::from_ron(&read(path)?)?,
            None => ContentRegistry::from_ron(BUILTIN_CONTENT)?,
        };
        Ok(Arc::new(registry))
    }

    /// Load the ruleset this config points at.
    pub fn load_rules(&self) -> Result<Rules, ServerError> {
        match &self.rules_path {
            Some(path) => Ok(Rules::from_ron(&read(path)?)?),
            None => Ok(Rules::default()),
        }
    }
}

fn read(path: &Path) -> Result<String, ServerError> {
    std::fs::read_to_string(path).map_err(|source| ServerError::Io {
        path: path.to_path_buf(),
        source,
    })
}
