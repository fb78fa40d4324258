//! In-process execution strategy.

use tracing::debug;

use super::agent::PlayerSpec;
use super::handler::{command_channel, forward_until_end, PlayerHandler, TurnHandle};
use super::thread::{CommandQueue, PlayerThread};
use crate::concurrent::{recv_or_cancel, CancelToken, Interrupter, ThreadExecutor};
use crate::core::{GameId, TeamId};
use crate::error::AgentError;
use crate::simulation::Simulation;

/// Runs the agent on a dedicated thread of this process.
///
/// The handler's executor worker pumps the agent's command queue into the
/// `TurnHandle` until the end-turn command has been forwarded.
pub struct LocalPlayerHandler<S: Simulation> {
    spec: PlayerSpec<S>,
    team: TeamId,
    label: String,
    executor: ThreadExecutor,
    agent: Option<PlayerThread<S>>,
    disposed: bool,
}

impl<S: Simulation> std::fmt::Debug for LocalPlayerHandler<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalPlayerHandler")
            .field("player", &self.spec.name())
            .field("team", &self.team)
            .field("initialized", &self.agent.is_some())
            .field("disposed", &self.disposed)
            .finish()
    }
}

impl<S: Simulation> LocalPlayerHandler<S> {
    /// Create the handler and its executor worker. The agent thread starts
    /// on `init`.
    pub fn new(spec: PlayerSpec<S>, game: GameId, team: TeamId) -> Result<Self, AgentError> {
        let label = format!("{game}-team-{}", team.0);
        let executor = ThreadExecutor::new(format!("{label}-worker"))?;
        Ok(Self {
            spec,
            team,
            label,
            executor,
            agent: None,
            disposed: false,
        })
    }

    /// Team this handler plays.
    #[must_use]
    pub fn team(&self) -> TeamId {
        self.team
    }

    fn pump(&self, queue: CommandQueue<S>) -> Result<TurnHandle<S::Controller>, AgentError> {
        let (sink, commands) = command_channel();
        let task = self.executor.execute(move |token| {
            forward_until_end(|token: &CancelToken| recv_or_cancel(&queue, token)?, &sink, token)
        })?;
        Ok(TurnHandle::new(commands, task))
    }
}

impl<S: Simulation> PlayerHandler<S> for LocalPlayerHandler<S> {
    fn init(&mut self, state: &S::State, seed: u64) -> Result<TurnHandle<S::Controller>, AgentError> {
        if self.disposed {
            return Err(AgentError::Interrupted);
        }
        if self.agent.is_none() {
            let agent = PlayerThread::spawn(&self.spec, self.team, format!("{}-agent", self.label))?;
            debug!(player = self.spec.name(), thread = agent.name(), "agent thread started");
            self.agent = Some(agent);
        }
        let queue = self
            .agent
            .as_ref()
            .ok_or(AgentError::NotInitialized)?
            .init(state.clone(), seed)?;
        self.pump(queue)
    }

    fn execute_turn(&mut self, state: &S::State) -> Result<TurnHandle<S::Controller>, AgentError> {
        if self.disposed {
            return Err(AgentError::Interrupted);
        }
        let queue = self
            .agent
            .as_ref()
            .ok_or(AgentError::NotInitialized)?
            .execute_turn(state.clone())?;
        self.pump(queue)
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
        if let Some(mut agent) = self.agent.take() {
            agent.shutdown();
        }
    }
}

impl<S: Simulation> Drop for LocalPlayerHandler<S> {
    fn drop(&mut self) {
        self.dispose();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::BoxedCommand;
    use crate::games::simple::{Attack, Board, SimpleGame};
    use crate::player::{AgentController, IdleBot, Player};
    use crate::simulation::SimulationSetup;
    use std::time::Duration;

    fn simulation() -> SimpleGame {
        SimpleGame::create(&SimulationSetup {
            mode: Default::default(),
            map: "arena".to_string(),
            team_count: 2,
            seed: 1,
        })
        .unwrap()
    }

    struct ThreeAttacks;

    impl Player<SimpleGame> for ThreeAttacks {
        fn execute_turn(
            &mut self,
            _state: &<SimpleGame as Simulation>::State,
            controller: &mut AgentController<Board>,
        ) -> Result<(), AgentError> {
            for power in 1..=3 {
                controller.issue(Attack::new(TeamId::new(1), power))?;
            }
            Ok(())
        }
    }

    struct Failing;

    impl Player<SimpleGame> for Failing {
        fn execute_turn(
            &mut self,
            _state: &<SimpleGame as Simulation>::State,
            _controller: &mut AgentController<Board>,
        ) -> Result<(), AgentError> {
            Err(AgentError::failed("no moves"))
        }
    }

    struct Stuck;

    impl Player<SimpleGame> for Stuck {
        fn execute_turn(
            &mut self,
            _state: &<SimpleGame as Simulation>::State,
            _controller: &mut AgentController<Board>,
        ) -> Result<(), AgentError> {
            std::thread::sleep(Duration::from_millis(300));
            Ok(())
        }
    }

    fn handler(spec: PlayerSpec<SimpleGame>) -> LocalPlayerHandler<SimpleGame> {
        LocalPlayerHandler::new(spec, GameId::new(1), TeamId::new(0)).unwrap()
    }

    #[test]
    fn test_init_yields_only_end_turn() {
        let sim = simulation();
        let mut handler = handler(PlayerSpec::bot("idle", || IdleBot));
        let mut seen = Vec::new();
        handler
            .init(sim.state(), 9)
            .unwrap()
            .wait(&mut |c: BoxedCommand<Board>| seen.push(c.ends_turn()))
            .unwrap();
        assert_eq!(seen, vec![true]);
    }

    #[test]
    fn test_execute_turn_before_init() {
        let sim = simulation();
        let mut handler = handler(PlayerSpec::bot("idle", || IdleBot));
        assert!(matches!(handler.execute_turn(sim.state()), Err(AgentError::NotInitialized)));
    }

    #[test]
    fn test_commands_forwarded_in_order_then_end() {
        let mut sim = simulation();
        let mut handler = handler(PlayerSpec::bot("attacker", || ThreeAttacks));
        handler.init(sim.state(), 1).unwrap().wait(&mut |_: BoxedCommand<Board>| {}).unwrap();

        let mut lens = Vec::new();
        let mut ends = Vec::new();
        let state = sim.state().clone();
        handler
            .execute_turn(&state)
            .unwrap()
            .wait(&mut |c: BoxedCommand<Board>| {
                ends.push(c.ends_turn());
                lens.push(c.on_execute(sim.controller()).len());
            })
            .unwrap();

        assert_eq!(ends, vec![false, false, false, true]);
        assert_eq!(lens, vec![1, 1, 1, 0]);
        assert_eq!(sim.state().life(TeamId::new(1)), 20 - 6);
    }

    #[test]
    fn test_agent_error_surfaces_on_wait() {
        let sim = simulation();
        let mut handler = handler(PlayerSpec::bot("failing", || Failing));
        handler.init(sim.state(), 1).unwrap().wait(&mut |_: BoxedCommand<Board>| {}).unwrap();

        let mut handled = 0;
        let result = handler
            .execute_turn(sim.state())
            .unwrap()
            .wait(&mut |_: BoxedCommand<Board>| handled += 1);
        assert_eq!(result, Err(AgentError::failed("no moves")));
        assert_eq!(handled, 0);
    }

    #[test]
    fn test_interrupter_cancels_wait() {
        let sim = simulation();
        let mut handler = handler(PlayerSpec::bot("stuck", || Stuck));
        handler.init(sim.state(), 1).unwrap().wait(&mut |_: BoxedCommand<Board>| {}).unwrap();

        let turn = handler.execute_turn(sim.state()).unwrap();
        let interrupter = handler.interrupter();
        let remote = std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(20));
            interrupter.interrupt();
        });

        assert_eq!(turn.wait(&mut |_: BoxedCommand<Board>| {}), Err(AgentError::Interrupted));
        remote.join().unwrap();
    }

    #[test]
    fn test_dispose_is_idempotent() {
        let sim = simulation();
        let mut handler = handler(PlayerSpec::bot("idle", || IdleBot));
        handler.init(sim.state(), 1).unwrap().wait(&mut |_: BoxedCommand<Board>| {}).unwrap();
        handler.dispose();
        handler.dispose();
        assert!(matches!(handler.execute_turn(sim.state()), Err(AgentError::Interrupted)));
    }

    #[test]
    fn test_reports_player_kind() {
        let human = handler(PlayerSpec::human("you", || IdleBot));
        assert!(human.is_human_player());
        assert_eq!(human.name(), "you");

        let bot = handler(PlayerSpec::bot("idle", || IdleBot));
        assert!(!bot.is_human_player());
    }
}
