//! Simulation traits for rules-engine implementations.
//!
//! Games implement `Simulation` to plug into the orchestrator:
//! - How a match is set up for a mode, map and team count
//! - Which team acts next
//! - What state deltas each step produced
//! - When the match is over and how it scored
//!
//! The orchestrator never inspects rules. It applies commands through the
//! `TurnController`, drains action logs, and asks `GameState` whether to keep
//! going.

use std::fmt::Debug;

use serde::{Deserialize, Serialize};

use crate::command::BoxedCommand;
use crate::core::{ActionLog, GameMode, TeamId};
use crate::error::SimulationError;
use crate::player::PlayerSpec;

/// Observable match state.
///
/// Cloned for the replay snapshot, for agents on their own threads, and for
/// the live snapshot readable through `Game::state`.
pub trait GameState: Clone + Debug + Send + Sync + 'static {
    /// Whether the match continues.
    fn is_active(&self) -> bool;

    /// One score per team.
    fn scores(&self) -> Vec<f32>;
}

/// The simulation-side object commands mutate state through.
pub trait TurnController: Send + 'static {
    /// Payload of the action records this controller produces.
    type Action: Clone + Debug + Send + Sync + 'static;

    /// Team whose turn it is.
    fn current_team(&self) -> TeamId;
}

/// Everything a simulation needs to set up a match.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimulationSetup {
    /// Match mode.
    pub mode: GameMode,
    /// Map identifier.
    pub map: String,
    /// Number of team slots.
    pub team_count: usize,
    /// Base seed of the match.
    pub seed: u64,
}

/// Rules engine driven by the orchestrator.
///
/// ## Implementation Notes
///
/// - `clear_and_return_action_log`: returns the pending segment and clears it
/// - `end_turn`: runs the end-of-turn transition and returns its own segment;
///   follow-up deltas (next turn start, eliminations) stay pending
/// - `campaign_opponents`: only consulted in `GameMode::Campaign`
pub trait Simulation: Send + Sized + 'static {
    /// Match state type.
    type State: GameState;

    /// Turn controller type.
    type Controller: TurnController;

    /// Set up a match.
    fn create(setup: &SimulationSetup) -> Result<Self, SimulationError>;

    /// Current state.
    fn state(&self) -> &Self::State;

    /// Turn controller commands are applied against.
    fn controller(&mut self) -> &mut Self::Controller;

    /// Return the pending action log and clear it.
    fn clear_and_return_action_log(&mut self) -> LogOf<Self>;

    /// Run the end-of-turn transition.
    fn end_turn(&mut self) -> LogOf<Self>;

    /// Opponent roster for a campaign map.
    fn campaign_opponents(_map: &str) -> Vec<PlayerSpec<Self>> {
        Vec::new()
    }
}

/// Action payload of a simulation.
pub type ActionOf<S> = <<S as Simulation>::Controller as TurnController>::Action;

/// Action-log segment of a simulation.
pub type LogOf<S> = ActionLog<ActionOf<S>>;

/// Command type accepted by a simulation.
pub type CommandOf<S> = BoxedCommand<<S as Simulation>::Controller>;
