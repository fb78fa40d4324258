//! Match-level configuration values.
//!
//! Plain, serializable knobs shared by `GameConfig` and the TOML run
//! configuration:
//! - `GameId`: identifies a match in thread names and log events
//! - `GameMode`: normal or campaign
//! - `Isolation`: where bot agents run
//! - `AnimationSync`: when the orchestrator waits for the presentation layer

use serde::{Deserialize, Serialize};

/// Match identifier.
///
/// Chosen by the caller; used for thread names and log correlation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GameId(pub u64);

impl GameId {
    /// Create a new game ID.
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Get the raw ID value.
    #[must_use]
    pub const fn raw(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for GameId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "game-{}", self.0)
    }
}

/// Match mode.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GameMode {
    /// Every team slot is filled from the configured players.
    #[default]
    Normal,
    /// One configured player against the map's scripted opponents.
    Campaign,
}

/// Execution strategy for bot agents.
///
/// Human players always run locally.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Isolation {
    /// Agent runs on a thread of this process.
    Local,
    /// Agent runs behind a `Transport` with an enforced turn timeout.
    #[default]
    Process,
}

/// When the orchestrator blocks on `AnimationSink::await_notification`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AnimationSync {
    /// Never wait for the presentation layer.
    Never,
    /// Wait after each end-of-turn transition.
    #[default]
    EndOfTurn,
    /// Wait after every animated segment.
    EveryCommand,
}

impl AnimationSync {
    /// Whether to wait after an end-of-turn segment.
    #[must_use]
    pub const fn at_end_of_turn(self) -> bool {
        matches!(self, AnimationSync::EndOfTurn | AnimationSync::EveryCommand)
    }

    /// Whether to wait after a command segment.
    #[must_use]
    pub const fn at_every_command(self) -> bool {
        matches!(self, AnimationSync::EveryCommand)
    }
}

/// Whether a debugger is attached to this process.
///
/// Reads `TracerPid` from `/proc/self/status`; always `false` where that file
/// does not exist.
#[must_use]
pub fn debugger_attached() -> bool {
    std::fs::read_to_string("/proc/self/status")
        .ok()
        .and_then(|status| {
            status
                .lines()
                .find_map(|line| line.strip_prefix("TracerPid:"))
                .and_then(|pid| pid.trim().parse::<u32>().ok())
        })
        .is_some_and(|pid| pid != 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_game_id() {
        let id = GameId::new(7);
        assert_eq!(id.raw(), 7);
        assert_eq!(id.to_string(), "game-7");
    }

    #[test]
    fn test_defaults() {
        assert_eq!(GameMode::default(), GameMode::Normal);
        assert_eq!(Isolation::default(), Isolation::Process);
        assert_eq!(AnimationSync::default(), AnimationSync::EndOfTurn);
    }

    #[test]
    fn test_animation_sync_policy() {
        assert!(!AnimationSync::Never.at_end_of_turn());
        assert!(AnimationSync::EndOfTurn.at_end_of_turn());
        assert!(!AnimationSync::EndOfTurn.at_every_command());
        assert!(AnimationSync::EveryCommand.at_end_of_turn());
        assert!(AnimationSync::EveryCommand.at_every_command());
    }

    #[test]
    fn test_serde_names() {
        assert_eq!(serde_json::to_string(&GameMode::Campaign).unwrap(), "\"campaign\"");
        assert_eq!(serde_json::to_string(&Isolation::Local).unwrap(), "\"local\"");
        assert_eq!(
            serde_json::from_str::<AnimationSync>("\"every-command\"").unwrap(),
            AnimationSync::EveryCommand
        );
    }
}
