//! Error types for match orchestration.
//!
//! - `ConfigError`: the match setup was rejected before the turn loop ran
//! - `AgentError`: an agent failed, timed out, or its wait was interrupted
//! - `TransportError`: the boundary to an out-of-process agent failed
//! - `GameError`: anything that stops a match, wrapping the above

use std::time::Duration;

use thiserror::Error;

use crate::core::{Status, TeamId};

/// Invalid team or player setup.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Campaign matches are played by exactly one configured player.
    #[error("campaign mode requires exactly 1 player, found {found}")]
    CampaignPlayerCount {
        /// Number of configured players.
        found: usize,
    },

    /// Team slots and configured players disagree.
    #[error("team count {team_count} does not match {players} configured players")]
    TeamCountMismatch {
        /// Configured team count.
        team_count: usize,
        /// Configured player count.
        players: usize,
    },

    /// A match needs between 1 and 255 teams.
    #[error("a match needs between 1 and 255 teams, got {0}")]
    TeamCount(usize),

    /// Human players need a presentation layer to capture their input.
    #[error("human player `{name}` requires an interactive session")]
    HumanWithoutInterface {
        /// Display name of the human player.
        name: String,
    },

    /// No player implementation is registered under this name.
    #[error("unknown player `{0}`")]
    UnknownPlayer(String),

    /// The run configuration could not be read or parsed.
    #[error("invalid run configuration: {0}")]
    Parse(String),
}

/// Failure at the boundary to an out-of-process agent.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// The remote side went away.
    #[error("transport closed")]
    Closed,

    /// The remote agent reported a failure of its own.
    #[error("remote agent failed: {0}")]
    Remote(String),

    /// The agent process could not be started.
    #[error("failed to launch agent: {0}")]
    Launch(String),

    /// Reading or writing the transport failed.
    #[error("transport i/o failure: {0}")]
    Io(String),
}

/// Failure of a single agent or of the machinery running it.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AgentError {
    /// Agent code returned an error.
    #[error("agent failed: {0}")]
    Failed(String),

    /// Agent code (or the task running it) panicked.
    #[error("agent panicked: {0}")]
    Panicked(String),

    /// The agent did not finish its turn in time.
    #[error("agent exceeded the turn timeout of {0:?}")]
    Timeout(Duration),

    /// A blocking wait was cancelled.
    #[error("agent wait was interrupted")]
    Interrupted,

    /// The agent's command queue closed without an end-turn command.
    #[error("agent command queue disconnected")]
    Disconnected,

    /// The executor already runs a task.
    #[error("executor already has a task in flight")]
    Busy,

    /// `execute_turn` was called before `init`.
    #[error("player handler used before init")]
    NotInitialized,

    /// The command stream completed without ending the turn.
    #[error("turn finished without an end-turn command")]
    MissingEndTurn,

    /// A worker or agent thread could not be spawned.
    #[error("failed to spawn thread: {0}")]
    Spawn(String),

    /// Transport-level fault, treated like any other agent failure.
    #[error(transparent)]
    Transport(#[from] TransportError),
}

impl AgentError {
    /// Convenience constructor for agent code reporting its own failure.
    pub fn failed(reason: impl Into<String>) -> Self {
        AgentError::Failed(reason.into())
    }
}

/// The rules engine refused to set up a match.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("simulation error: {0}")]
pub struct SimulationError(pub String);

/// Anything that stops a match.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GameError {
    /// Rejected configuration.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// An agent failure, tagged with the team it belongs to.
    #[error("{team}: {source}")]
    Agent {
        /// Team whose agent failed.
        team: TeamId,
        /// Underlying failure.
        #[source]
        source: AgentError,
    },

    /// The rules engine failed.
    #[error(transparent)]
    Simulation(#[from] SimulationError),

    /// Lifecycle operation not allowed in the current state.
    #[error("cannot {action} a game in state {from}")]
    InvalidTransition {
        /// Status at the time of the call.
        from: Status,
        /// Attempted operation.
        action: &'static str,
    },

    /// The configuration was already consumed by an earlier start.
    #[error("game configuration was already consumed")]
    ConfigConsumed,

    /// The game was disposed.
    #[error("game has been disposed")]
    Disposed,

    /// The simulation named a team without a player handler.
    #[error("simulation reported unknown team {0}")]
    UnknownTeam(TeamId),

    /// The orchestration thread could not be spawned.
    #[error("failed to spawn orchestration thread: {0}")]
    Spawn(String),

    /// The orchestration thread panicked.
    #[error("orchestration thread panicked: {0}")]
    Panicked(String),
}

impl GameError {
    /// Attach a team to an agent failure.
    #[must_use]
    pub fn agent(team: TeamId, source: AgentError) -> Self {
        GameError::Agent { team, source }
    }

    /// The team this error is attributed to, if any.
    #[must_use]
    pub fn team(&self) -> Option<TeamId> {
        match self {
            GameError::Agent { team, .. } | GameError::UnknownTeam(team) => Some(*team),
            _ => None,
        }
    }

    /// Whether this error is an interrupted wait.
    #[must_use]
    pub fn is_interrupted(&self) -> bool {
        matches!(
            self,
            GameError::Agent {
                source: AgentError::Interrupted,
                ..
            }
        )
    }
}

/// Result type for orchestration operations.
pub type ArenaResult<T> = Result<T, GameError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_agent_error_display() {
        let err = GameError::agent(TeamId::new(1), AgentError::failed("boom"));
        assert_eq!(err.to_string(), "Team 1: agent failed: boom");
        assert_eq!(err.team(), Some(TeamId::new(1)));
    }

    #[test]
    fn test_transport_error_converts_to_agent_error() {
        let err: AgentError = TransportError::Closed.into();
        assert_eq!(err, AgentError::Transport(TransportError::Closed));
    }

    #[test]
    fn test_config_error_converts_to_game_error() {
        let err: GameError = ConfigError::CampaignPlayerCount { found: 2 }.into();
        assert_eq!(err.team(), None);
        assert!(err.to_string().contains("exactly 1 player"));
    }

    #[test]
    fn test_is_interrupted() {
        assert!(GameError::agent(TeamId::new(0), AgentError::Interrupted).is_interrupted());
        assert!(!GameError::agent(TeamId::new(0), AgentError::Busy).is_interrupted());
        assert!(!GameError::Disposed.is_interrupted());
    }

    #[test]
    fn test_invalid_transition_display() {
        let err = GameError::InvalidTransition {
            from: Status::Completed,
            action: "pause",
        };
        assert_eq!(err.to_string(), "cannot pause a game in state COMPLETED");
    }
}
