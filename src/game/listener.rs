//! Presentation and completion hooks.

use serde::{Deserialize, Serialize};

use super::orchestrator::Game;
use crate::core::{GameId, Status, TeamId};
use crate::simulation::{LogOf, Simulation, SimulationSetup};

/// Presentation layer fed with replay-relevant log segments.
///
/// Called from the orchestration thread. `await_notification` blocks the
/// turn loop until the presentation caught up, at the points selected by
/// `AnimationSync`.
pub trait AnimationSink<S: Simulation>: Send + Sync {
    /// Initial snapshot, display names and match setup, once before the
    /// first turn.
    fn init(&self, initial_state: &S::State, player_names: &[String], setup: &SimulationSetup);

    /// One log segment to animate.
    fn animate(&self, log: &LogOf<S>);

    /// Block until the presentation caught up.
    fn await_notification(&self) {}
}

/// Invoked once when a match reaches `Completed` or `Crashed`.
///
/// Runs on the orchestration thread; must not call `Game::wait`.
pub type CompletionListener<S> = Box<dyn Fn(&Game<S>) + Send + Sync>;

/// Diagnostic context captured when a match crashes.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrashReport {
    /// Crashed match.
    pub game: GameId,
    /// Status when the failure happened.
    pub status: Status,
    /// Team whose agent failed, if the failure is attributable.
    pub team: Option<TeamId>,
    /// Failure description.
    pub error: String,
    /// Display names in team order.
    pub players: Vec<String>,
}

impl std::fmt::Display for CrashReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} crashed while {}", self.game, self.status)?;
        if let Some(team) = self.team {
            let player = self.players.get(team.index()).map_or("?", String::as_str);
            write!(f, " ({team}, {player})")?;
        }
        write!(f, ": {}", self.error)
    }
}
