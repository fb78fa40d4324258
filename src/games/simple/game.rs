//! Simple game implementation.

use serde::{Deserialize, Serialize};

use crate::command::Command;
use crate::core::{ActionLog, ActionRecord, TeamId, TeamMap};
use crate::error::SimulationError;
use crate::player::{IdleBot, PlayerRegistry, PlayerSpec};
use crate::simulation::{GameState, LogOf, Simulation, SimulationSetup, TurnController};

use super::bots::RandomBot;

/// State deltas recorded by the simple game.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SimpleAction {
    /// A team's turn began.
    TurnStarted {
        /// Round the turn belongs to (1-based).
        round: u32,
    },
    /// Life was lost.
    Damage {
        /// Damaged team.
        target: TeamId,
        /// Life lost.
        amount: i64,
        /// Life left afterwards.
        remaining: i64,
    },
    /// A team dropped to 0 life.
    Eliminated {
        /// Eliminated team.
        team: TeamId,
    },
    /// The acting team ended its turn.
    TurnEnded,
    /// The match is over.
    GameOver,
}

/// Life total and round limit of a map.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MapRules {
    /// Life every team starts with.
    pub starting_life: i64,
    /// Rounds after which the match ends.
    pub max_rounds: u32,
}

impl MapRules {
    /// Rules for a named map.
    pub fn named(map: &str) -> Result<Self, SimulationError> {
        let (starting_life, max_rounds) = match map {
            "arena" => (20, 5),
            "marathon" => (20, 1000),
            "sudden-death" => (3, 50),
            "tutorial" => (10, 3),
            "gauntlet" => (15, 10),
            other => return Err(SimulationError(format!("unknown map `{other}`"))),
        };
        Ok(Self {
            starting_life,
            max_rounds,
        })
    }
}

/// Observable state of the simple game.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimpleState {
    life: TeamMap<i64>,
    active: TeamId,
    turn: u32,
    round: u32,
    max_rounds: u32,
}

impl SimpleState {
    /// Fresh state for `team_count` teams.
    #[must_use]
    pub fn new(team_count: usize, rules: MapRules) -> Self {
        Self {
            life: TeamMap::with_value(team_count, rules.starting_life),
            active: TeamId::new(0),
            turn: 0,
            round: 1,
            max_rounds: rules.max_rounds,
        }
    }

    /// Life of a team, 0 for an unknown team.
    #[must_use]
    pub fn life(&self, team: TeamId) -> i64 {
        self.life.get(team).copied().unwrap_or(0)
    }

    /// Number of teams.
    #[must_use]
    pub fn team_count(&self) -> usize {
        self.life.team_count()
    }

    /// Team whose turn it is.
    #[must_use]
    pub fn active_team(&self) -> TeamId {
        self.active
    }

    /// Turns played so far.
    #[must_use]
    pub fn turn(&self) -> u32 {
        self.turn
    }

    /// Current round (1-based).
    #[must_use]
    pub fn round(&self) -> u32 {
        self.round
    }

    /// Check if a team is alive.
    #[must_use]
    pub fn is_alive(&self, team: TeamId) -> bool {
        self.life(team) > 0
    }

    /// Get alive teams.
    #[must_use]
    pub fn alive_teams(&self) -> Vec<TeamId> {
        TeamId::all(self.team_count()).filter(|&t| self.is_alive(t)).collect()
    }

    /// Get opponents of a team (other alive teams).
    #[must_use]
    pub fn opponents(&self, team: TeamId) -> Vec<TeamId> {
        self.alive_teams().into_iter().filter(|&t| t != team).collect()
    }

    /// Next alive team after the active one, cycling.
    fn next_team(&self) -> TeamId {
        let n = self.team_count();
        (1..=n)
            .map(|offset| TeamId::new(((self.active.index() + offset) % n) as u8))
            .find(|&t| self.is_alive(t))
            .unwrap_or(self.active)
    }
}

impl GameState for SimpleState {
    fn is_active(&self) -> bool {
        self.alive_teams().len() > 1 && self.round <= self.max_rounds
    }

    fn scores(&self) -> Vec<f32> {
        self.life.values().map(|&life| life.max(0) as f32).collect()
    }
}

/// Turn controller of the simple game.
#[derive(Debug)]
pub struct Board {
    state: SimpleState,
    pending: ActionLog<SimpleAction>,
    sequence: u32,
}

impl Board {
    fn new(state: SimpleState) -> Self {
        Self {
            state,
            pending: ActionLog::new(),
            sequence: 0,
        }
    }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> &SimpleState {
        &self.state
    }

    fn record(&mut self, log: &mut ActionLog<SimpleAction>, team: TeamId, action: SimpleAction) {
        log.push(ActionRecord::new(team, self.state.turn, self.sequence, action));
        self.sequence += 1;
    }

    /// The active team deals `power` damage to `target`.
    ///
    /// Attacks on itself, on dead or unknown teams, with non-positive power,
    /// or after the match ended have no effect.
    pub fn attack(&mut self, target: TeamId, power: i64) -> ActionLog<SimpleAction> {
        let mut log = ActionLog::new();
        let attacker = self.state.active;
        if power <= 0 || target == attacker || !self.state.is_alive(target) || !self.state.is_active() {
            return log;
        }

        let remaining = self.state.life[target] - power;
        self.state.life[target] = remaining;
        self.record(
            &mut log,
            attacker,
            SimpleAction::Damage {
                target,
                amount: power,
                remaining,
            },
        );
        if remaining <= 0 {
            self.record(&mut log, attacker, SimpleAction::Eliminated { team: target });
        }
        log
    }

    fn end_turn(&mut self) -> ActionLog<SimpleAction> {
        let mut log = ActionLog::new();
        let ending = self.state.active;
        self.record(&mut log, ending, SimpleAction::TurnEnded);

        let next = self.state.next_team();
        if next.index() <= ending.index() {
            self.state.round += 1;
        }
        self.state.active = next;
        self.state.turn += 1;
        self.sequence = 0;

        let mut pending = std::mem::take(&mut self.pending);
        if self.state.is_active() {
            let round = self.state.round;
            self.record(&mut pending, next, SimpleAction::TurnStarted { round });
        } else {
            self.record(&mut pending, next, SimpleAction::GameOver);
        }
        self.pending = pending;
        log
    }
}

impl TurnController for Board {
    type Action = SimpleAction;

    fn current_team(&self) -> TeamId {
        self.state.active
    }
}

/// Attack an opponent.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Attack {
    /// Team to damage.
    pub target: TeamId,
    /// Damage dealt.
    pub power: i64,
}

impl Attack {
    /// Create an attack command.
    #[must_use]
    pub fn new(target: TeamId, power: i64) -> Self {
        Self { target, power }
    }
}

impl Command<Board> for Attack {
    fn on_execute(&self, board: &mut Board) -> ActionLog<SimpleAction> {
        board.attack(self.target, self.power)
    }
}

/// Last-team-standing game with a round limit.
///
/// Scores are remaining life.
#[derive(Debug)]
pub struct SimpleGame {
    board: Board,
}

impl SimpleGame {
    /// Registry with the built-in `idle` and `random` bots.
    #[must_use]
    pub fn registry() -> PlayerRegistry<Self> {
        let mut registry = PlayerRegistry::with_builtin();
        registry.register(PlayerSpec::bot("random", RandomBot::default));
        registry
    }
}

impl Simulation for SimpleGame {
    type State = SimpleState;
    type Controller = Board;

    fn create(setup: &SimulationSetup) -> Result<Self, SimulationError> {
        if setup.team_count == 0 || setup.team_count > 255 {
            return Err(SimulationError(format!("unsupported team count {}", setup.team_count)));
        }
        let rules = MapRules::named(&setup.map)?;
        let mut board = Board::new(SimpleState::new(setup.team_count, rules));

        let mut pending = ActionLog::new();
        board.record(&mut pending, TeamId::new(0), SimpleAction::TurnStarted { round: 1 });
        board.pending = pending;

        Ok(Self { board })
    }

    fn state(&self) -> &SimpleState {
        &self.board.state
    }

    fn controller(&mut self) -> &mut Board {
        &mut self.board
    }

    fn clear_and_return_action_log(&mut self) -> LogOf<Self> {
        std::mem::take(&mut self.board.pending)
    }

    fn end_turn(&mut self) -> LogOf<Self> {
        self.board.end_turn()
    }

    fn campaign_opponents(map: &str) -> Vec<PlayerSpec<Self>> {
        match map {
            "tutorial" => vec![PlayerSpec::bot("tutor", || IdleBot)],
            "gauntlet" => vec![
                PlayerSpec::bot("sentry", RandomBot::default),
                PlayerSpec::bot("warden", RandomBot::default),
            ],
            _ => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::GameMode;

    fn setup(map: &str, team_count: usize) -> SimulationSetup {
        SimulationSetup {
            mode: GameMode::Normal,
            map: map.to_string(),
            team_count,
            seed: 42,
        }
    }

    #[test]
    fn test_game_creation() {
        let mut game = SimpleGame::create(&setup("arena", 2)).unwrap();
        let state = game.state();
        assert_eq!(state.team_count(), 2);
        assert_eq!(state.life(TeamId::new(0)), 20);
        assert_eq!(state.life(TeamId::new(1)), 20);
        assert_eq!(state.round(), 1);
        assert!(state.is_active());

        let log = game.clear_and_return_action_log();
        assert_eq!(log.len(), 1);
        assert!(game.clear_and_return_action_log().is_empty());
    }

    #[test]
    fn test_unknown_map() {
        assert!(SimpleGame::create(&setup("moon", 2)).is_err());
    }

    #[test]
    fn test_attack() {
        let mut game = SimpleGame::create(&setup("arena", 3)).unwrap();
        let log = Attack::new(TeamId::new(2), 4).on_execute(game.controller());
        assert_eq!(log.len(), 1);
        assert_eq!(
            log.iter().next().map(|r| r.action.clone()),
            Some(SimpleAction::Damage {
                target: TeamId::new(2),
                amount: 4,
                remaining: 16
            })
        );
        assert_eq!(game.state().life(TeamId::new(2)), 16);
    }

    #[test]
    fn test_invalid_attacks_have_no_effect() {
        let mut game = SimpleGame::create(&setup("arena", 2)).unwrap();
        assert!(game.controller().attack(TeamId::new(0), 5).is_empty());
        assert!(game.controller().attack(TeamId::new(9), 5).is_empty());
        assert!(game.controller().attack(TeamId::new(1), 0).is_empty());
        assert_eq!(game.state().scores(), vec![20.0, 20.0]);
    }

    #[test]
    fn test_elimination_ends_game() {
        let mut game = SimpleGame::create(&setup("sudden-death", 2)).unwrap();
        let log = game.controller().attack(TeamId::new(1), 5);
        assert_eq!(log.len(), 2);
        assert!(!game.state().is_active());
        assert_eq!(game.state().scores(), vec![3.0, 0.0]);

        game.clear_and_return_action_log();
        assert_eq!(game.end_turn().len(), 1);
        let tail = game.clear_and_return_action_log();
        assert_eq!(tail.iter().next().map(|r| r.action.clone()), Some(SimpleAction::GameOver));
    }

    #[test]
    fn test_rounds_advance_and_end() {
        let mut game = SimpleGame::create(&setup("arena", 2)).unwrap();
        let mut turns = 0;
        while game.state().is_active() {
            assert_eq!(game.controller().current_team(), TeamId::new((turns % 2) as u8));
            game.end_turn();
            turns += 1;
        }
        assert_eq!(turns, 10);
        assert_eq!(game.state().round(), 6);
        assert_eq!(game.state().turn(), 10);
    }

    #[test]
    fn test_eliminated_team_is_skipped() {
        let mut game = SimpleGame::create(&setup("sudden-death", 3)).unwrap();
        game.controller().attack(TeamId::new(1), 3);
        game.end_turn();
        assert_eq!(game.state().active_team(), TeamId::new(2));
        game.end_turn();
        assert_eq!(game.state().active_team(), TeamId::new(0));
        assert_eq!(game.state().round(), 2);
    }

    #[test]
    fn test_campaign_opponents() {
        assert_eq!(SimpleGame::campaign_opponents("tutorial").len(), 1);
        assert_eq!(SimpleGame::campaign_opponents("gauntlet").len(), 2);
        assert!(SimpleGame::campaign_opponents("arena").is_empty());
    }

    #[test]
    fn test_registry() {
        assert_eq!(SimpleGame::registry().names(), vec!["idle", "random"]);
    }
}
