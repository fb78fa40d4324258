//! The `Game` handle and its lifecycle state machine.
//!
//! ```text
//! Created --start--> Active <--pause/resume--> Paused
//!    |                  |
//!    |                  +--> Completed   simulation reported inactive
//!    |                  +--> Crashed     agent or orchestration failure
//!    +--> Aborted                        configuration rejected in `new`
//! ```
//!
//! `start` performs setup on the calling thread and then hands the
//! simulation and the player handlers to a dedicated orchestration thread
//! (`game-<id>`) running the turn loop. Only that thread mutates the
//! simulation. Every status transition goes through one mutex; the turn loop
//! parks on its condition variable while paused.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};
use tracing::{debug, error, info, warn};

use super::config::GameConfig;
use super::listener::{CompletionListener, CrashReport};
use super::results::GameResults;
use super::turn_loop::TurnLoop;
use crate::concurrent::Interrupter;
use crate::core::{GameId, GameMode, GameRng, Isolation, Status, TeamId, TeamMap};
use crate::error::{AgentError, ArenaResult, ConfigError, GameError};
use crate::player::{LocalPlayerHandler, PlayerHandler, PlayerSpec, ProcessPlayerHandler, ThreadLauncher};
use crate::simulation::{CommandOf, GameState, LogOf, Simulation, SimulationSetup};

/// Status and loop bookkeeping guarded by the scheduling lock.
#[derive(Debug, Default)]
struct Schedule {
    status: Status,
    shutdown: bool,
    started: bool,
    loop_done: bool,
}

struct Shared<S: Simulation> {
    id: GameId,
    schedule: Mutex<Schedule>,
    changed: Condvar,
    config: Mutex<Option<GameConfig<S>>>,
    rejection: Option<ConfigError>,
    results: Mutex<GameResults<S>>,
    snapshot: Mutex<Option<S::State>>,
    scores: Mutex<Option<Vec<f32>>>,
    crash: Mutex<Option<CrashReport>>,
    listeners: Mutex<Vec<CompletionListener<S>>>,
    interrupters: Mutex<Vec<Interrupter>>,
    thread: Mutex<Option<JoinHandle<()>>>,
    disposed: AtomicBool,
}

/// One match: lifecycle, results and the orchestration thread.
///
/// Cheap to clone; clones share the same match.
///
/// ## Example
///
/// ```
/// use rust_arena::core::{Isolation, Status};
/// use rust_arena::game::{Game, GameConfig};
/// use rust_arena::games::simple::SimpleGame;
/// use rust_arena::core::GameId;
/// use rust_arena::player::{IdleBot, PlayerSpec};
///
/// let config = GameConfig::<SimpleGame>::new("arena")
///     .with_player(PlayerSpec::bot("a", || IdleBot))
///     .with_player(PlayerSpec::bot("b", || IdleBot))
///     .with_isolation(Isolation::Local);
///
/// let game = Game::new(GameId::new(1), config);
/// game.start().unwrap();
/// game.wait();
///
/// assert_eq!(game.status(), Status::Completed);
/// assert_eq!(game.scores().map(|s| s.len()), Some(2));
/// game.dispose();
/// ```
pub struct Game<S: Simulation> {
    inner: Arc<Shared<S>>,
}

impl<S: Simulation> Clone for Game<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<S: Simulation> std::fmt::Debug for Game<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Game")
            .field("id", &self.inner.id)
            .field("status", &self.status())
            .finish_non_exhaustive()
    }
}

impl<S: Simulation> Game<S> {
    /// Create a match from `config`.
    ///
    /// Campaign matches get the map's opponents appended to their single
    /// configured player. A rejected configuration leaves the game
    /// `Aborted`; `start` is then a no-op.
    pub fn new(id: GameId, mut config: GameConfig<S>) -> Self {
        let rejection = prepare(&mut config).err();
        let status = if rejection.is_some() { Status::Aborted } else { Status::Created };

        let mut results = GameResults::new(id, config.mode, config.map.clone());
        results.set_player_names(config.player_names());
        results.set_status(status);

        match &rejection {
            Some(err) => info!(game = %id, error = %err, "game aborted"),
            None => debug!(game = %id, map = %config.map, teams = config.team_count, "game created"),
        }

        Self {
            inner: Arc::new(Shared {
                id,
                schedule: Mutex::new(Schedule {
                    status,
                    ..Schedule::default()
                }),
                changed: Condvar::new(),
                config: Mutex::new(Some(config)),
                rejection,
                results: Mutex::new(results),
                snapshot: Mutex::new(None),
                scores: Mutex::new(None),
                crash: Mutex::new(None),
                listeners: Mutex::new(Vec::new()),
                interrupters: Mutex::new(Vec::new()),
                thread: Mutex::new(None),
                disposed: AtomicBool::new(false),
            }),
        }
    }

    /// Match identifier.
    #[must_use]
    pub fn id(&self) -> GameId {
        self.inner.id
    }

    /// Current status.
    #[must_use]
    pub fn status(&self) -> Status {
        self.inner.schedule.lock().status
    }

    /// The configuration, until `start` consumes it.
    #[must_use]
    pub fn config(&self) -> Option<GameConfig<S>> {
        self.inner.config.lock().clone()
    }

    /// Why the configuration was rejected, for an `Aborted` game.
    #[must_use]
    pub fn config_error(&self) -> Option<&ConfigError> {
        self.inner.rejection.as_ref()
    }

    /// Final scores, one per team.
    ///
    /// Unset until the match completes. A crash keeps the scores of the last
    /// published state; `dispose` does the same if none were captured.
    #[must_use]
    pub fn scores(&self) -> Option<Vec<f32>> {
        self.inner.scores.lock().clone()
    }

    /// Latest state published by the turn loop; `None` before `start` and
    /// after `dispose`.
    #[must_use]
    pub fn state(&self) -> Option<S::State> {
        self.inner.snapshot.lock().clone()
    }

    /// Snapshot of the accumulated results.
    #[must_use]
    pub fn game_results(&self) -> GameResults<S> {
        self.inner.results.lock().clone()
    }

    /// Diagnostics of a crashed match.
    #[must_use]
    pub fn crash_report(&self) -> Option<CrashReport> {
        self.inner.crash.lock().clone()
    }

    /// Register a listener invoked once when the match completes or crashes.
    pub fn add_completion_listener(&self, listener: impl Fn(&Game<S>) + Send + Sync + 'static) {
        self.inner.listeners.lock().push(Box::new(listener));
    }

    /// Start the match.
    ///
    /// Sets up the simulation, initialises every player handler in team
    /// order (waiting for each), then launches the orchestration thread. A
    /// no-op on an `Aborted` game. Agent failures during setup crash the
    /// match and are returned.
    pub fn start(&self) -> ArenaResult<()> {
        if self.inner.disposed.load(Ordering::SeqCst) {
            return Err(GameError::Disposed);
        }

        let config = {
            let mut schedule = self.inner.schedule.lock();
            match schedule.status {
                Status::Aborted => return Ok(()),
                Status::Created => {}
                from => return Err(GameError::InvalidTransition { from, action: "start" }),
            }
            let config = self.inner.config.lock().take().ok_or(GameError::ConfigConsumed)?;
            schedule.status = Status::Active;
            schedule.started = true;
            self.inner.results.lock().set_status(Status::Active);
            config
        };

        info!(game = %self.inner.id, map = %config.map, teams = config.team_count, "game starting");

        match self.launch(config) {
            Ok(()) => Ok(()),
            Err(err) => {
                if self.shutdown_requested() {
                    warn!(game = %self.inner.id, error = %err, "game start cancelled");
                } else {
                    self.crash(&err);
                }
                self.mark_loop_done();
                Err(err)
            }
        }
    }

    fn launch(&self, config: GameConfig<S>) -> ArenaResult<()> {
        let id = self.inner.id;
        let setup = SimulationSetup {
            mode: config.mode,
            map: config.map.clone(),
            team_count: config.team_count,
            seed: config.seed,
        };
        let mut simulation = S::create(&setup)?;
        let initial = simulation.state().clone();
        if config.save_replay {
            self.inner.results.lock().set_initial_state(initial.clone());
        }
        self.publish_snapshot(initial.clone());

        let timeout = config.effective_turn_timeout();
        if config.debug && config.isolation == Isolation::Process {
            warn!(game = %id, "debug mode: agent turn timeouts disabled");
        }

        let rng = GameRng::new(config.seed);
        let mut handlers: Vec<Box<dyn PlayerHandler<S>>> = Vec::with_capacity(config.team_count);
        for (index, spec) in config.players.iter().enumerate() {
            let team = TeamId::new(index as u8);
            let mut handler = build_handler(&config, spec, id, team, timeout).map_err(|e| GameError::agent(team, e))?;
            self.register_interrupter(handler.interrupter());

            debug!(game = %id, %team, player = spec.name(), "initialising player");
            handler
                .init(&initial, rng.team_seed(team))
                .and_then(|init| {
                    init.wait(&mut |command: CommandOf<S>| {
                        command.on_execute(simulation.controller());
                    })
                })
                .map_err(|e| GameError::agent(team, e))?;
            handlers.push(handler);
        }

        let handlers = TeamMap::from_vec(handlers).ok_or(ConfigError::TeamCount(config.team_count))?;

        if let Some(sink) = &config.animation {
            sink.init(&initial, &config.player_names(), &setup);
        }

        let turn_loop = TurnLoop::new(
            self.clone(),
            simulation,
            handlers,
            config.save_replay,
            config.animation.clone(),
            config.animation_sync,
        );
        let thread = thread::Builder::new()
            .name(id.to_string())
            .spawn(move || turn_loop.run_to_end())
            .map_err(|e| GameError::Spawn(e.to_string()))?;
        *self.inner.thread.lock() = Some(thread);

        // A dispose that ran before the handle was stored could not join it.
        if self.inner.disposed.load(Ordering::SeqCst) {
            self.join_thread();
        }
        Ok(())
    }

    fn register_interrupter(&self, interrupter: Interrupter) {
        self.inner.interrupters.lock().push(interrupter.clone());
        if self.shutdown_requested() {
            interrupter.interrupt();
        }
    }

    /// Park the turn loop at its next safe point.
    pub fn pause(&self) -> ArenaResult<()> {
        self.transition(Status::Paused, "pause")
    }

    /// Let a paused turn loop continue.
    pub fn resume(&self) -> ArenaResult<()> {
        self.transition(Status::Active, "resume")
    }

    fn transition(&self, to: Status, action: &'static str) -> ArenaResult<()> {
        let mut schedule = self.inner.schedule.lock();
        if !schedule.status.is_running() {
            return Err(GameError::InvalidTransition {
                from: schedule.status,
                action,
            });
        }
        if schedule.status == to {
            return Ok(());
        }
        schedule.status = to;
        self.inner.results.lock().set_status(to);
        self.inner.changed.notify_all();
        debug!(game = %self.inner.id, status = %to, "game {action}d");
        Ok(())
    }

    /// Stop the match and release its runtime objects.
    ///
    /// Interrupts every player handler, joins the orchestration thread
    /// (unless called from it), captures scores from the last published
    /// state if none were captured, and drops the live snapshot. A match
    /// stopped this way keeps its status and does not notify listeners.
    /// Idempotent; safe in any state.
    pub fn dispose(&self) {
        if self.inner.disposed.swap(true, Ordering::SeqCst) {
            return;
        }
        {
            let mut schedule = self.inner.schedule.lock();
            schedule.shutdown = true;
            self.inner.changed.notify_all();
        }
        for interrupter in self.inner.interrupters.lock().iter() {
            interrupter.interrupt();
        }
        self.join_thread();

        let last = self.inner.snapshot.lock().take();
        let mut scores = self.inner.scores.lock();
        if scores.is_none() {
            *scores = last.map(|state| state.scores());
        }
        info!(game = %self.inner.id, status = %self.status(), "game disposed");
    }

    fn join_thread(&self) {
        let thread = self.inner.thread.lock().take();
        if let Some(thread) = thread {
            if thread.thread().id() != thread::current().id() {
                let _ = thread.join();
            }
        }
    }

    /// Block until the turn loop has finished (completed, crashed or
    /// cancelled). Returns at once for a game that never started.
    pub fn wait(&self) {
        let mut schedule = self.inner.schedule.lock();
        while schedule.started && !schedule.loop_done {
            self.inner.changed.wait(&mut schedule);
        }
    }

    /// Like `wait` with a deadline. Returns whether the loop finished.
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut schedule = self.inner.schedule.lock();
        while schedule.started && !schedule.loop_done {
            if self.inner.changed.wait_until(&mut schedule, deadline).timed_out() {
                return !schedule.started || schedule.loop_done;
            }
        }
        true
    }

    // === Turn-loop side ===

    /// Block while paused. Returns `false` once shutdown was requested.
    pub(crate) fn wait_while_paused(&self) -> bool {
        let mut schedule = self.inner.schedule.lock();
        while schedule.status == Status::Paused && !schedule.shutdown {
            self.inner.changed.wait(&mut schedule);
        }
        !schedule.shutdown
    }

    pub(crate) fn shutdown_requested(&self) -> bool {
        self.inner.schedule.lock().shutdown
    }

    pub(crate) fn publish_snapshot(&self, state: S::State) {
        if !self.inner.disposed.load(Ordering::SeqCst) {
            *self.inner.snapshot.lock() = Some(state);
        }
    }

    pub(crate) fn push_action_log(&self, log: LogOf<S>) {
        self.inner.results.lock().push_action_log(log);
    }

    /// Record the loop's outcome and notify listeners.
    pub(crate) fn finish(&self, outcome: ArenaResult<()>) {
        match outcome {
            Ok(()) => {
                let scores = self.inner.snapshot.lock().as_ref().map(GameState::scores);
                *self.inner.scores.lock() = scores.clone();
                self.set_status(Status::Completed);
                info!(game = %self.inner.id, ?scores, "game completed");
                self.notify_listeners();
            }
            Err(err) if self.shutdown_requested() => {
                warn!(game = %self.inner.id, error = %err, "game cancelled");
            }
            Err(err) => self.crash(&err),
        }
        self.mark_loop_done();
    }

    fn crash(&self, err: &GameError) {
        let partial = self.inner.snapshot.lock().as_ref().map(GameState::scores);
        if partial.is_some() {
            *self.inner.scores.lock() = partial;
        }

        let status = self.set_status(Status::Crashed);
        let report = CrashReport {
            game: self.inner.id,
            status,
            team: err.team(),
            error: err.to_string(),
            players: self.inner.results.lock().player_names().to_vec(),
        };
        error!(
            game = %report.game,
            status = %report.status,
            team = ?report.team,
            error = %report.error,
            "game crashed"
        );
        *self.inner.crash.lock() = Some(report);
        self.notify_listeners();
    }

    /// Set a terminal status; returns the previous one.
    fn set_status(&self, status: Status) -> Status {
        let mut schedule = self.inner.schedule.lock();
        let previous = std::mem::replace(&mut schedule.status, status);
        self.inner.results.lock().set_status(status);
        self.inner.changed.notify_all();
        previous
    }

    fn notify_listeners(&self) {
        let listeners = std::mem::take(&mut *self.inner.listeners.lock());
        for listener in &listeners {
            listener(self);
        }
    }

    fn mark_loop_done(&self) {
        let mut schedule = self.inner.schedule.lock();
        schedule.loop_done = true;
        self.inner.changed.notify_all();
    }
}

/// Campaign roster expansion and validation.
fn prepare<S: Simulation>(config: &mut GameConfig<S>) -> Result<(), ConfigError> {
    if config.mode == GameMode::Campaign {
        if config.players.len() != 1 {
            return Err(ConfigError::CampaignPlayerCount {
                found: config.players.len(),
            });
        }
        config.players.extend(S::campaign_opponents(&config.map));
        config.team_count = config.players.len();
    }
    config.validate()
}

fn build_handler<S: Simulation>(
    config: &GameConfig<S>,
    spec: &PlayerSpec<S>,
    game: GameId,
    team: TeamId,
    timeout: Option<Duration>,
) -> Result<Box<dyn PlayerHandler<S>>, AgentError> {
    if spec.is_human() || config.isolation == Isolation::Local {
        return Ok(Box::new(LocalPlayerHandler::new(spec.clone(), game, team)?));
    }
    let launcher = config.launcher.clone().unwrap_or_else(|| Arc::new(ThreadLauncher));
    Ok(Box::new(
        ProcessPlayerHandler::new(spec.clone(), game, team, launcher, timeout)?.with_debug(config.debug),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::games::simple::SimpleGame;
    use crate::player::IdleBot;

    fn idle(name: &str) -> PlayerSpec<SimpleGame> {
        PlayerSpec::bot(name, || IdleBot)
    }

    fn two_idle() -> GameConfig<SimpleGame> {
        GameConfig::new("arena")
            .with_player(idle("a"))
            .with_player(idle("b"))
            .with_isolation(Isolation::Local)
    }

    #[test]
    fn test_new_game_is_created() {
        let game = Game::new(GameId::new(1), two_idle());
        assert_eq!(game.status(), Status::Created);
        assert!(game.config().is_some());
        assert!(game.scores().is_none());
        assert!(game.state().is_none());
        assert_eq!(game.game_results().player_names(), &["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn test_campaign_roster_is_expanded() {
        let config = GameConfig::<SimpleGame>::new("tutorial")
            .with_mode(GameMode::Campaign)
            .with_player(idle("hero"));
        let game = Game::new(GameId::new(2), config);
        assert_eq!(game.status(), Status::Created);
        let config = game.config().unwrap();
        assert_eq!(config.team_count, 2);
        assert_eq!(config.player_names(), vec!["hero".to_string(), "tutor".to_string()]);
    }

    #[test]
    fn test_campaign_with_two_players_aborts() {
        let config = two_idle().with_mode(GameMode::Campaign);
        let game = Game::new(GameId::new(3), config);
        assert_eq!(game.status(), Status::Aborted);
        assert_eq!(game.config_error(), Some(&ConfigError::CampaignPlayerCount { found: 2 }));

        assert!(game.start().is_ok());
        assert_eq!(game.status(), Status::Aborted);
        assert!(game.state().is_none());
        assert!(game.inner.thread.lock().is_none());
    }

    #[test]
    fn test_pause_requires_active() {
        let game = Game::new(GameId::new(4), two_idle());
        assert!(matches!(
            game.pause(),
            Err(GameError::InvalidTransition {
                from: Status::Created,
                action: "pause"
            })
        ));
        assert!(matches!(game.resume(), Err(GameError::InvalidTransition { .. })));
    }

    #[test]
    fn test_config_consumed_by_start() {
        let game = Game::new(GameId::new(5), two_idle());
        game.start().unwrap();
        assert!(game.config().is_none());
        game.wait();
        assert!(matches!(
            game.start(),
            Err(GameError::InvalidTransition {
                from: Status::Completed,
                ..
            })
        ));
        game.dispose();
    }

    #[test]
    fn test_start_after_dispose() {
        let game = Game::new(GameId::new(6), two_idle());
        game.dispose();
        assert_eq!(game.start(), Err(GameError::Disposed));
        assert_eq!(game.status(), Status::Created);
    }

    #[test]
    fn test_unknown_map_crashes_on_start() {
        let config = GameConfig::<SimpleGame>::new("moon")
            .with_player(idle("a"))
            .with_player(idle("b"));
        let game = Game::new(GameId::new(7), config);
        assert!(matches!(game.start(), Err(GameError::Simulation(_))));
        assert_eq!(game.status(), Status::Crashed);
        let report = game.crash_report().unwrap();
        assert_eq!(report.status, Status::Active);
        assert_eq!(report.team, None);
        game.wait();
    }
}
