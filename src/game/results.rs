//! Match results accumulated for replay and post-game consumers.
//!
//! `GameResults` outlives the runtime objects of a match: after
//! `Game::dispose` the simulation and threads are gone, but names, the
//! initial snapshot, the recorded action-log segments and the final status
//! remain readable.

use im::Vector;

use crate::core::{ActionRecord, GameId, GameMode, Status};
use crate::simulation::{ActionOf, LogOf, Simulation};

/// Replay record of one match.
///
/// Append-only except for `status`. Segments are only recorded when replay
/// saving is enabled.
pub struct GameResults<S: Simulation> {
    game: GameId,
    mode: GameMode,
    map: String,
    player_names: Vec<String>,
    action_logs: Vector<LogOf<S>>,
    initial_state: Option<S::State>,
    status: Status,
}

impl<S: Simulation> Clone for GameResults<S> {
    fn clone(&self) -> Self {
        Self {
            game: self.game,
            mode: self.mode,
            map: self.map.clone(),
            player_names: self.player_names.clone(),
            action_logs: self.action_logs.clone(),
            initial_state: self.initial_state.clone(),
            status: self.status,
        }
    }
}

impl<S: Simulation> std::fmt::Debug for GameResults<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GameResults")
            .field("game", &self.game)
            .field("mode", &self.mode)
            .field("map", &self.map)
            .field("player_names", &self.player_names)
            .field("segments", &self.action_logs.len())
            .field("status", &self.status)
            .finish()
    }
}

impl<S: Simulation> GameResults<S> {
    /// Empty results for a match.
    #[must_use]
    pub fn new(game: GameId, mode: GameMode, map: impl Into<String>) -> Self {
        Self {
            game,
            mode,
            map: map.into(),
            player_names: Vec::new(),
            action_logs: Vector::new(),
            initial_state: None,
            status: Status::Created,
        }
    }

    /// Match the results belong to.
    #[must_use]
    pub fn game(&self) -> GameId {
        self.game
    }

    /// Match mode.
    #[must_use]
    pub fn mode(&self) -> GameMode {
        self.mode
    }

    /// Map identifier.
    #[must_use]
    pub fn map(&self) -> &str {
        &self.map
    }

    /// Display names in team order.
    #[must_use]
    pub fn player_names(&self) -> &[String] {
        &self.player_names
    }

    /// Recorded action-log segments, in the order they were produced.
    #[must_use]
    pub fn action_logs(&self) -> &Vector<LogOf<S>> {
        &self.action_logs
    }

    /// Every recorded action, flattened across segments.
    pub fn records(&self) -> impl Iterator<Item = &ActionRecord<ActionOf<S>>> {
        self.action_logs.iter().flat_map(|log| log.iter())
    }

    /// State before the first turn, when replay saving is enabled.
    #[must_use]
    pub fn initial_state(&self) -> Option<&S::State> {
        self.initial_state.as_ref()
    }

    /// Current status of the match.
    #[must_use]
    pub fn status(&self) -> Status {
        self.status
    }

    pub(crate) fn set_player_names(&mut self, names: Vec<String>) {
        self.player_names = names;
    }

    pub(crate) fn set_initial_state(&mut self, state: S::State) {
        self.initial_state = Some(state);
    }

    pub(crate) fn push_action_log(&mut self, log: LogOf<S>) {
        self.action_logs.push_back(log);
    }

    pub(crate) fn set_status(&mut self, status: Status) {
        self.status = status;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{ActionLog, TeamId};
    use crate::games::simple::{SimpleAction, SimpleGame};

    #[test]
    fn test_new_results_are_empty() {
        let results = GameResults::<SimpleGame>::new(GameId::new(4), GameMode::Normal, "arena");
        assert_eq!(results.game(), GameId::new(4));
        assert_eq!(results.map(), "arena");
        assert!(results.player_names().is_empty());
        assert!(results.action_logs().is_empty());
        assert!(results.initial_state().is_none());
        assert_eq!(results.status(), Status::Created);
    }

    #[test]
    fn test_segments_keep_order_and_snapshot_is_cheap() {
        let mut results = GameResults::<SimpleGame>::new(GameId::new(1), GameMode::Normal, "arena");
        for turn in 0..3 {
            let mut log = ActionLog::new();
            log.push(ActionRecord::new(TeamId::new(0), turn, 0, SimpleAction::TurnEnded));
            results.push_action_log(log);
        }

        let snapshot = results.clone();
        results.push_action_log(ActionLog::new());

        assert_eq!(snapshot.action_logs().len(), 3);
        assert_eq!(results.action_logs().len(), 4);
        let turns: Vec<_> = snapshot.records().map(|r| r.turn).collect();
        assert_eq!(turns, vec![0, 1, 2]);
    }
}
