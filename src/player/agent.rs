//! Agent-side API: the `Player` trait, the controller agents issue commands
//! through, and `PlayerSpec` factories.

use std::sync::Arc;

use crossbeam_channel::Sender;

use crate::command::{BoxedCommand, Command};
use crate::core::TeamId;
use crate::error::AgentError;
use crate::simulation::{Simulation, TurnController};

/// Player-supplied logic producing commands.
///
/// Entry points run on the agent's own thread. Returning from
/// `execute_turn` ends the turn; the handler infrastructure appends the
/// end-turn command.
pub trait Player<S: Simulation>: Send + 'static {
    /// Called once before the first turn with the initial state and this
    /// team's seed.
    fn init(&mut self, state: &S::State, seed: u64) -> Result<(), AgentError> {
        let _ = (state, seed);
        Ok(())
    }

    /// Play one turn by issuing commands through `controller`.
    fn execute_turn(
        &mut self,
        state: &S::State,
        controller: &mut AgentController<S::Controller>,
    ) -> Result<(), AgentError>;
}

/// What travels over an agent's command queue.
pub type QueueItem<C> = Result<BoxedCommand<C>, AgentError>;

/// Handle agents issue commands through during a turn.
#[derive(Debug)]
pub struct AgentController<C: TurnController> {
    team: TeamId,
    queue: Sender<QueueItem<C>>,
}

impl<C: TurnController> AgentController<C> {
    pub(crate) fn new(team: TeamId, queue: Sender<QueueItem<C>>) -> Self {
        Self {
            team,
            queue,
        }
    }

    /// Team this agent plays.
    #[must_use]
    pub fn team(&self) -> TeamId {
        self.team
    }

    /// Queue a command for the orchestrator.
    ///
    /// Fails with `Disconnected` once nobody is listening any more; agents
    /// should return promptly when that happens.
    pub fn issue(&mut self, command: impl Command<C> + 'static) -> Result<(), AgentError> {
        self.queue
            .send(Ok(Box::new(command)))
            .map_err(|_| AgentError::Disconnected)
    }
}

/// Whether a player is a bot or a human-input adapter.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PlayerKind {
    /// Automated agent.
    Bot,
    /// Adapter for a human at a presentation layer.
    Human,
}

type PlayerFactory<S> = Arc<dyn Fn() -> Box<dyn Player<S>> + Send + Sync>;

/// Named factory for a player implementation.
///
/// Stands in for "the player class": the match creates one agent per team
/// slot from it.
pub struct PlayerSpec<S: Simulation> {
    name: String,
    kind: PlayerKind,
    factory: PlayerFactory<S>,
}

impl<S: Simulation> PlayerSpec<S> {
    /// A bot built by `factory`.
    pub fn bot<P, F>(name: impl Into<String>, factory: F) -> Self
    where
        P: Player<S>,
        F: Fn() -> P + Send + Sync + 'static,
    {
        Self::with_kind(name, PlayerKind::Bot, factory)
    }

    /// A human-input adapter built by `factory`.
    pub fn human<P, F>(name: impl Into<String>, factory: F) -> Self
    where
        P: Player<S>,
        F: Fn() -> P + Send + Sync + 'static,
    {
        Self::with_kind(name, PlayerKind::Human, factory)
    }

    fn with_kind<P, F>(name: impl Into<String>, kind: PlayerKind, factory: F) -> Self
    where
        P: Player<S>,
        F: Fn() -> P + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            kind,
            factory: Arc::new(move || Box::new(factory()) as Box<dyn Player<S>>),
        }
    }

    /// Display name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Bot or human.
    #[must_use]
    pub fn kind(&self) -> PlayerKind {
        self.kind
    }

    /// Whether this is a human-input adapter.
    #[must_use]
    pub fn is_human(&self) -> bool {
        self.kind == PlayerKind::Human
    }

    /// Build a fresh agent.
    #[must_use]
    pub fn instantiate(&self) -> Box<dyn Player<S>> {
        (self.factory)()
    }
}

impl<S: Simulation> Clone for PlayerSpec<S> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            kind: self.kind,
            factory: Arc::clone(&self.factory),
        }
    }
}

impl<S: Simulation> std::fmt::Debug for PlayerSpec<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlayerSpec")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .finish_non_exhaustive()
    }
}

/// Ends every turn without issuing a command.
#[derive(Clone, Copy, Debug, Default)]
pub struct IdleBot;

impl<S: Simulation> Player<S> for IdleBot {
    fn execute_turn(
        &mut self,
        _state: &S::State,
        _controller: &mut AgentController<S::Controller>,
    ) -> Result<(), AgentError> {
        Ok(())
    }
}
