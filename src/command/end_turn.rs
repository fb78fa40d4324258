//! The turn terminator.

use crate::core::ActionLog;
use crate::simulation::TurnController;

use super::traits::Command;

/// Ends the issuing team's turn.
///
/// Has no effect of its own; the orchestrator reacts to it by running the
/// simulation's end-of-turn transition. Agent code cannot build one: the
/// handler infrastructure appends it when an agent entry point returns.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EndTurnCommand {
    _sealed: (),
}

impl EndTurnCommand {
    pub(crate) const fn new() -> Self {
        Self { _sealed: () }
    }
}

impl<C: TurnController> Command<C> for EndTurnCommand {
    fn on_execute(&self, _controller: &mut C) -> ActionLog<C::Action> {
        ActionLog::new()
    }

    fn ends_turn(&self) -> bool {
        true
    }
}
