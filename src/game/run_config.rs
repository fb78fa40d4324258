//! TOML run configuration.
//!
//! Names players by registry name so a match can be described in a file:
//!
//! ```toml
//! mode = "normal"
//! map = "arena"
//! players = ["idle", "random"]
//! save_replay = true
//! seed = 42
//! turn_timeout_ms = 500
//! isolation = "process"
//! ```

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::config::GameConfig;
use crate::core::{GameMode, Isolation};
use crate::error::ConfigError;
use crate::player::PlayerRegistry;
use crate::simulation::Simulation;

/// File form of a `GameConfig`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunConfig {
    /// Match mode.
    #[serde(default)]
    pub mode: GameMode,

    /// Map identifier.
    pub map: String,

    /// Registry names in team order.
    #[serde(default)]
    pub players: Vec<String>,

    /// Explicit team count; defaults to the number of players.
    #[serde(default)]
    pub team_count: Option<usize>,

    /// Record action-log segments.
    #[serde(default)]
    pub save_replay: bool,

    /// A presentation layer is attached.
    #[serde(default)]
    pub interactive: bool,

    /// Base seed.
    #[serde(default)]
    pub seed: u64,

    /// Per-turn deadline in milliseconds; 0 disables it.
    #[serde(default)]
    pub turn_timeout_ms: Option<u64>,

    /// Where bot agents run.
    #[serde(default)]
    pub isolation: Isolation,

    /// Force debug mode on or off; detected when unset.
    #[serde(default)]
    pub debug: Option<bool>,
}

impl RunConfig {
    /// Read and parse a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Parse(format!("{}: {e}", path.display())))?;
        Self::parse(&content)
    }

    /// Parse TOML text.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Render as TOML text.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string(self).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Resolve player names through `registry` into a `GameConfig`.
    pub fn to_game_config<S: Simulation>(&self, registry: &PlayerRegistry<S>) -> Result<GameConfig<S>, ConfigError> {
        let mut config = GameConfig::new(self.map.clone())
            .with_mode(self.mode)
            .with_save_replay(self.save_replay)
            .with_interactive(self.interactive)
            .with_seed(self.seed)
            .with_isolation(self.isolation);

        for name in &self.players {
            config = config.with_player(registry.get(name)?.clone());
        }
        if let Some(team_count) = self.team_count {
            config = config.with_team_count(team_count);
        }
        if let Some(ms) = self.turn_timeout_ms {
            let timeout = (ms > 0).then(|| Duration::from_millis(ms));
            config = config.with_turn_timeout(timeout);
        }
        if let Some(debug) = self.debug {
            config = config.with_debug(debug);
        }
        Ok(config)
    }
}
