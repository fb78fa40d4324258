//! Command and command-handler traits.

use std::fmt::Debug;

use crate::core::ActionLog;
use crate::simulation::TurnController;

/// One discrete unit of player intent.
///
/// Agents issue commands; the orchestrator applies them to the simulation's
/// turn controller on its own thread. Only `on_execute` and `ends_turn` are
/// load-bearing; everything else about a command is opaque to the transport.
pub trait Command<C: TurnController>: Send + Debug {
    /// Apply the command against the turn controller.
    ///
    /// Returns the action-log segment it produced, possibly empty.
    fn on_execute(&self, controller: &mut C) -> ActionLog<C::Action>;

    /// Whether this command terminates the current turn.
    fn ends_turn(&self) -> bool {
        false
    }
}

/// Commands travel between threads boxed.
pub type BoxedCommand<C> = Box<dyn Command<C>>;

/// Callback applying commands as they arrive.
///
/// Invoked once per command, strictly in emission order, and only from the
/// thread awaiting the turn.
pub trait CommandHandler<C: TurnController> {
    /// Apply one command.
    fn handle_command(&mut self, command: BoxedCommand<C>);
}

impl<C, F> CommandHandler<C> for F
where
    C: TurnController,
    F: FnMut(BoxedCommand<C>),
{
    fn handle_command(&mut self, command: BoxedCommand<C>) {
        self(command);
    }
}
