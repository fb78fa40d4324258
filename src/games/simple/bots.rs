//! Built-in agents for the simple game.

use crate::core::GameRng;
use crate::error::AgentError;
use crate::player::{AgentController, Player};

use super::game::{Attack, Board, SimpleGame, SimpleState};

/// Attacks a random opponent with power 1-3 once per turn.
///
/// Seeded from the team seed handed out on `init`, so replays are
/// deterministic.
#[derive(Clone, Debug, Default)]
pub struct RandomBot {
    rng: Option<GameRng>,
}

impl Player<SimpleGame> for RandomBot {
    fn init(&mut self, _state: &SimpleState, seed: u64) -> Result<(), AgentError> {
        self.rng = Some(GameRng::new(seed));
        Ok(())
    }

    fn execute_turn(&mut self, state: &SimpleState, controller: &mut AgentController<Board>) -> Result<(), AgentError> {
        let rng = self.rng.as_mut().ok_or(AgentError::NotInitialized)?;
        let opponents = state.opponents(controller.team());
        if let Some(&target) = rng.choose(&opponents) {
            let power = rng.gen_range(1..4);
            controller.issue(Attack::new(target, power))?;
        }
        Ok(())
    }
}
