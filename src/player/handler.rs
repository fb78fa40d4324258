//! The `PlayerHandler` abstraction and the awaitable `TurnHandle`.

use crossbeam_channel::{bounded, Receiver, Sender};

use crate::command::{BoxedCommand, CommandHandler};
use crate::concurrent::{send_or_cancel, CancelToken, Interrupter, TaskHandle};
use crate::error::AgentError;
use crate::simulation::{Simulation, TurnController};

/// Drives one team's agent under some execution strategy.
///
/// `init` and `execute_turn` return immediately with a `TurnHandle`; the
/// caller must `wait` on it to apply the commands and learn the outcome.
pub trait PlayerHandler<S: Simulation>: Send {
    /// Deliver initial state and seed to the agent.
    fn init(&mut self, state: &S::State, seed: u64) -> Result<TurnHandle<S::Controller>, AgentError>;

    /// Ask the agent to play one turn.
    fn execute_turn(&mut self, state: &S::State) -> Result<TurnHandle<S::Controller>, AgentError>;

    /// Whether the agent is a human-input adapter.
    fn is_human_player(&self) -> bool;

    /// Display name of the player.
    fn name(&self) -> &str;

    /// Cross-thread handle cancelling whatever this handler is waiting on.
    fn interrupter(&self) -> Interrupter;

    /// Interrupt in-flight work and release the agent. Idempotent.
    fn dispose(&mut self);
}

/// Awaitable outcome of `init` or `execute_turn`.
///
/// Dropping it without waiting cancels the worker task.
///
/// The worker hands commands over a rendezvous channel, so `wait` applies
/// each one on the calling thread before the worker forwards the next.
#[derive(Debug)]
pub struct TurnHandle<C: TurnController> {
    commands: Receiver<BoxedCommand<C>>,
    task: TaskHandle<()>,
}

impl<C: TurnController> TurnHandle<C> {
    /// Handle for a task forwarding into `commands`.
    pub(crate) fn new(commands: Receiver<BoxedCommand<C>>, task: TaskHandle<()>) -> Self {
        Self { commands, task }
    }

    /// Apply every forwarded command through `handler`, then return the
    /// task's outcome.
    pub fn wait(self, handler: &mut dyn CommandHandler<C>) -> Result<(), AgentError> {
        for command in self.commands.iter() {
            handler.handle_command(command);
        }
        self.task.wait()
    }

}

/// Rendezvous channel between a worker task and its `TurnHandle`.
pub(crate) fn command_channel<C: TurnController>() -> (Sender<BoxedCommand<C>>, Receiver<BoxedCommand<C>>) {
    bounded(0)
}

/// Forward commands produced by `next` into `sink` until one ends the turn.
pub(crate) fn forward_until_end<C, F>(
    mut next: F,
    sink: &Sender<BoxedCommand<C>>,
    token: &CancelToken,
) -> Result<(), AgentError>
where
    C: TurnController,
    F: FnMut(&CancelToken) -> Result<BoxedCommand<C>, AgentError>,
{
    loop {
        let command = next(token)?;
        let ends_turn = command.ends_turn();
        send_or_cancel(sink, command, token)?;
        if ends_turn {
            return Ok(());
        }
    }
}
