//! The orchestration thread's turn loop.
//!
//! Per turn:
//!
//! 1. park while paused; stop on shutdown
//! 2. finish when the simulation reports it is inactive
//! 3. record the pending log (pre-turn segment)
//! 4. ask the current team's handler for a turn and apply its commands
//! 5. on the end-turn command, run the end-of-turn transition
//! 6. record whatever is still pending (post-turn segment)

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use tracing::{debug, trace};

use super::listener::AnimationSink;
use super::orchestrator::Game;
use crate::command::{BoxedCommand, CommandHandler};
use crate::concurrent::panic_message;
use crate::core::{AnimationSync, TeamMap};
use crate::error::{AgentError, ArenaResult, GameError};
use crate::player::PlayerHandler;
use crate::simulation::{GameState, LogOf, Simulation, TurnController};

/// Routes log segments to the replay record and the presentation layer.
struct Segments<'a, S: Simulation> {
    game: &'a Game<S>,
    save_replay: bool,
    animation: Option<&'a dyn AnimationSink<S>>,
}

impl<S: Simulation> Segments<'_, S> {
    fn record(&self, log: LogOf<S>, always: bool) {
        if log.is_empty() && !always {
            return;
        }
        if let Some(sink) = self.animation {
            if !log.is_empty() {
                sink.animate(&log);
            }
        }
        if self.save_replay {
            self.game.push_action_log(log);
        }
    }

    fn sync(&self) {
        if let Some(sink) = self.animation {
            sink.await_notification();
        }
    }
}

/// Applies one turn's commands on the orchestration thread.
struct TurnRecorder<'a, 'b, S: Simulation> {
    simulation: &'a mut S,
    segments: &'a Segments<'b, S>,
    sync: AnimationSync,
    turn_ended: bool,
}

impl<S: Simulation> CommandHandler<S::Controller> for TurnRecorder<'_, '_, S> {
    fn handle_command(&mut self, command: BoxedCommand<S::Controller>) {
        trace!(?command, "applying command");
        let log = command.on_execute(self.simulation.controller());
        self.segments.record(log, false);
        if self.sync.at_every_command() {
            self.segments.sync();
        }

        if command.ends_turn() {
            let log = self.simulation.end_turn();
            self.segments.record(log, true);
            if self.sync.at_end_of_turn() {
                self.segments.sync();
            }
            self.turn_ended = true;
        }
    }
}

/// Owns the simulation and the player handlers once a match is running.
pub(crate) struct TurnLoop<S: Simulation> {
    game: Game<S>,
    simulation: S,
    handlers: TeamMap<Box<dyn PlayerHandler<S>>>,
    save_replay: bool,
    animation: Option<Arc<dyn AnimationSink<S>>>,
    sync: AnimationSync,
}

impl<S: Simulation> TurnLoop<S> {
    pub(crate) fn new(
        game: Game<S>,
        simulation: S,
        handlers: TeamMap<Box<dyn PlayerHandler<S>>>,
        save_replay: bool,
        animation: Option<Arc<dyn AnimationSink<S>>>,
        sync: AnimationSync,
    ) -> Self {
        Self {
            game,
            simulation,
            handlers,
            save_replay,
            animation,
            sync,
        }
    }

    /// Run until the match ends, then dispose the handlers and report the
    /// outcome to the game.
    pub(crate) fn run_to_end(mut self) {
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| self.run()))
            .unwrap_or_else(|payload| Err(GameError::Panicked(panic_message(payload.as_ref()))));

        for (_, handler) in self.handlers.iter_mut() {
            handler.dispose();
        }
        self.game.finish(outcome);
    }

    fn run(&mut self) -> ArenaResult<()> {
        let segments = Segments {
            game: &self.game,
            save_replay: self.save_replay,
            animation: self.animation.as_deref(),
        };

        loop {
            if !self.game.wait_while_paused() {
                return Err(GameError::Disposed);
            }

            let state = self.simulation.state();
            if !state.is_active() {
                self.game.publish_snapshot(state.clone());
                return Ok(());
            }

            let pending = self.simulation.clear_and_return_action_log();
            segments.record(pending, true);

            let team = self.simulation.controller().current_team();
            let handler = self.handlers.get_mut(team).ok_or(GameError::UnknownTeam(team))?;
            debug!(
                game = %self.game.id(),
                %team,
                player = handler.name(),
                human = handler.is_human_player(),
                "turn started"
            );

            let turn = handler
                .execute_turn(self.simulation.state())
                .map_err(|e| GameError::agent(team, e))?;

            let mut recorder = TurnRecorder {
                simulation: &mut self.simulation,
                segments: &segments,
                sync: self.sync,
                turn_ended: false,
            };
            turn.wait(&mut recorder).map_err(|e| GameError::agent(team, e))?;
            if !recorder.turn_ended {
                return Err(GameError::agent(team, AgentError::MissingEndTurn));
            }

            let post = self.simulation.clear_and_return_action_log();
            segments.record(post, false);
            self.game.publish_snapshot(self.simulation.state().clone());
        }
    }
}
