//! Out-of-process execution strategy.
//!
//! The agent lives behind a `Transport` obtained from a `ProcessLauncher`.
//! This module only fixes the contract: init data is delivered once, each
//! turn starts with a notification, and the transport yields the same
//! ordered command stream a local agent would, ending with an end-turn
//! command. A per-turn budget is enforced unless debugging; only time spent
//! waiting on the transport is charged to it, not time the orchestrator
//! spends applying or animating earlier commands.
//!
//! `ThreadLauncher` provides an in-memory transport that runs the agent on
//! its own thread, for tests and single-binary deployments.

use std::sync::Arc;
use std::time::{Duration, Instant};

use crossbeam_channel::RecvTimeoutError;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::agent::PlayerSpec;
use super::handler::{command_channel, forward_until_end, PlayerHandler, TurnHandle};
use super::thread::{CommandQueue, PlayerThread};
use crate::concurrent::{CancelToken, Interrupter, ThreadExecutor};
use crate::core::{GameId, TeamId};
use crate::error::{AgentError, TransportError};
use crate::simulation::{CommandOf, Simulation};

/// Longest single blocking receive, so cancellation is noticed promptly.
const POLL_SLICE: Duration = Duration::from_millis(50);

/// Initialization data delivered once per agent.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct InitPayload<T> {
    /// Initial match state.
    pub state: T,
    /// Seed for the agent's own randomness.
    pub seed: u64,
    /// Team the agent plays.
    pub team: TeamId,
    /// Match the agent belongs to.
    pub game: GameId,
    /// Whether turn timeouts are disabled.
    pub debug: bool,
}

/// Connection to one out-of-process agent.
pub trait Transport<S: Simulation>: Send {
    /// Deliver initialization data.
    fn send_init(&mut self, payload: InitPayload<S::State>) -> Result<(), TransportError>;

    /// Notify the agent that its turn started.
    fn send_turn(&mut self, state: S::State) -> Result<(), TransportError>;

    /// Next command, waiting at most `wait`. `Ok(None)` means nothing yet.
    fn recv_command(&mut self, wait: Duration) -> Result<Option<CommandOf<S>>, TransportError>;

    /// Tear the connection down. Idempotent.
    fn close(&mut self);
}

/// Starts out-of-process agents.
pub trait ProcessLauncher<S: Simulation>: Send + Sync {
    /// Start the agent for `team` and connect to it.
    fn launch(&self, spec: &PlayerSpec<S>, game: GameId, team: TeamId) -> Result<Box<dyn Transport<S>>, TransportError>;
}

/// Runs the agent behind the transport boundary on its own thread.
///
/// ```
/// use std::sync::Arc;
/// use rust_arena::player::{ProcessLauncher, ThreadLauncher};
/// use rust_arena::games::simple::SimpleGame;
///
/// let launcher: Arc<dyn ProcessLauncher<SimpleGame>> = Arc::new(ThreadLauncher);
/// # let _ = launcher;
/// ```
#[derive(Clone, Copy, Debug, Default)]
pub struct ThreadLauncher;

impl<S: Simulation> ProcessLauncher<S> for ThreadLauncher {
    fn launch(&self, spec: &PlayerSpec<S>, game: GameId, team: TeamId) -> Result<Box<dyn Transport<S>>, TransportError> {
        let agent = PlayerThread::spawn(spec, team, format!("{game}-team-{}-remote", team.0))
            .map_err(|e| TransportError::Launch(e.to_string()))?;
        Ok(Box::new(ChannelTransport { agent, pending: None }))
    }
}

/// In-memory transport over a `PlayerThread`.
pub struct ChannelTransport<S: Simulation> {
    agent: PlayerThread<S>,
    pending: Option<CommandQueue<S>>,
}

impl<S: Simulation> std::fmt::Debug for ChannelTransport<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChannelTransport")
            .field("agent", &self.agent)
            .field("pending", &self.pending.is_some())
            .finish()
    }
}

impl<S: Simulation> Transport<S> for ChannelTransport<S> {
    fn send_init(&mut self, payload: InitPayload<S::State>) -> Result<(), TransportError> {
        let queue = self
            .agent
            .init(payload.state, payload.seed)
            .map_err(|_| TransportError::Closed)?;
        self.pending = Some(queue);
        Ok(())
    }

    fn send_turn(&mut self, state: S::State) -> Result<(), TransportError> {
        let queue = self.agent.execute_turn(state).map_err(|_| TransportError::Closed)?;
        self.pending = Some(queue);
        Ok(())
    }

    fn recv_command(&mut self, wait: Duration) -> Result<Option<CommandOf<S>>, TransportError> {
        let queue = self
            .pending
            .as_ref()
            .ok_or_else(|| TransportError::Io("no request in progress".to_string()))?;
        let received = queue.recv_timeout(wait);
        match received {
            Ok(Ok(command)) => {
                if command.ends_turn() {
                    self.pending = None;
                }
                Ok(Some(command))
            }
            Ok(Err(e)) => {
                self.pending = None;
                Err(TransportError::Remote(e.to_string()))
            }
            Err(RecvTimeoutError::Timeout) => Ok(None),
            Err(RecvTimeoutError::Disconnected) => Err(TransportError::Closed),
        }
    }

    fn close(&mut self) {
        self.pending = None;
        self.agent.shutdown();
    }
}

type SharedTransport<S> = Arc<Mutex<Option<Box<dyn Transport<S>>>>>;

/// Drives an agent through a `Transport` with a per-turn deadline.
pub struct ProcessPlayerHandler<S: Simulation> {
    spec: PlayerSpec<S>,
    team: TeamId,
    game: GameId,
    executor: ThreadExecutor,
    launcher: Arc<dyn ProcessLauncher<S>>,
    transport: SharedTransport<S>,
    timeout: Option<Duration>,
    debug: bool,
    disposed: bool,
}

impl<S: Simulation> std::fmt::Debug for ProcessPlayerHandler<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProcessPlayerHandler")
            .field("player", &self.spec.name())
            .field("team", &self.team)
            .field("game", &self.game)
            .field("timeout", &self.timeout)
            .field("debug", &self.debug)
            .field("disposed", &self.disposed)
            .finish_non_exhaustive()
    }
}

impl<S: Simulation> ProcessPlayerHandler<S> {
    /// Create the handler. `timeout` of `None` disables the turn deadline.
    pub fn new(
        spec: PlayerSpec<S>,
        game: GameId,
        team: TeamId,
        launcher: Arc<dyn ProcessLauncher<S>>,
        timeout: Option<Duration>,
    ) -> Result<Self, AgentError> {
        let executor = ThreadExecutor::new(format!("{game}-team-{}-worker", team.0))?;
        Ok(Self {
            spec,
            team,
            game,
            executor,
            launcher,
            transport: Arc::new(Mutex::new(None)),
            timeout,
            debug: false,
            disposed: false,
        })
    }

    /// Tell the agent a debugger is attached.
    #[must_use]
    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    /// Per-turn deadline, if enforced.
    #[must_use]
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    fn pump(&self) -> Result<TurnHandle<S::Controller>, AgentError> {
        let transport = Arc::clone(&self.transport);
        let timeout = self.timeout;
        let (sink, commands) = command_channel();

        let task = self.executor.execute(move |token| {
            let mut budget = timeout.map(TurnBudget::new);
            let mut guard = transport.lock();
            let transport = guard.as_mut().ok_or(AgentError::NotInitialized)?;
            let outcome = forward_until_end(
                |token: &CancelToken| next_command(&mut **transport, &mut budget, token),
                &sink,
                token,
            );
            drop(guard);
            outcome
        })?;
        Ok(TurnHandle::new(commands, task))
    }
}

/// Agent time left in the current turn.
#[derive(Clone, Copy, Debug)]
struct TurnBudget {
    limit: Duration,
    left: Duration,
}

impl TurnBudget {
    fn new(limit: Duration) -> Self {
        Self { limit, left: limit }
    }
}

/// Receive the next command, charging only the receive wait to `budget`.
fn next_command<S: Simulation>(
    transport: &mut dyn Transport<S>,
    budget: &mut Option<TurnBudget>,
    token: &CancelToken,
) -> Result<CommandOf<S>, AgentError> {
    loop {
        if token.is_cancelled() {
            return Err(AgentError::Interrupted);
        }
        let wait = match *budget {
            Some(budget) if budget.left.is_zero() => return Err(AgentError::Timeout(budget.limit)),
            Some(budget) => budget.left.min(POLL_SLICE),
            None => POLL_SLICE,
        };

        let started = Instant::now();
        let received = transport.recv_command(wait)?;
        if let Some(budget) = budget.as_mut() {
            budget.left = budget.left.saturating_sub(started.elapsed());
        }
        if let Some(command) = received {
            return Ok(command);
        }
    }
}

impl<S: Simulation> PlayerHandler<S> for ProcessPlayerHandler<S> {
    fn init(&mut self, state: &S::State, seed: u64) -> Result<TurnHandle<S::Controller>, AgentError> {
        if self.disposed {
            return Err(AgentError::Interrupted);
        }
        let mut transport = self.launcher.launch(&self.spec, self.game, self.team)?;
        transport.send_init(InitPayload {
            state: state.clone(),
            seed,
            team: self.team,
            game: self.game,
            debug: self.debug,
        })?;
        debug!(player = self.spec.name(), team = %self.team, "agent launched");
        *self.transport.lock() = Some(transport);
        self.pump()
    }

    fn execute_turn(&mut self, state: &S::State) -> Result<TurnHandle<S::Controller>, AgentError> {
        if self.disposed {
            return Err(AgentError::Interrupted);
        }
        self.transport
            .lock()
            .as_mut()
            .ok_or(AgentError::NotInitialized)?
            .send_turn(state.clone())?;
        self.pump()
    }

    fn is_human_player(&self) -> bool {
        self.spec.is_human()
    }

    fn name(&self) -> &str {
        self.spec.name()
    }

    fn interrupter(&self) -> Interrupter {
        self.executor.interrupter()
    }

    fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        self.disposed = true;
        self.executor.interrupt();
        if let Some(mut transport) = self.transport.lock().take() {
            transport.close();
        }
    }
}

impl<S: Simulation> Drop for ProcessPlayerHandler<S> {
    fn drop(&mut self) {
        self.dispose();
    }
}
