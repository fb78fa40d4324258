//! Match configuration.
//!
//! A `GameConfig` is built once, handed to `Game::new`, and consumed by
//! `Game::start`. Afterwards `Game::config` reports `None`.

use std::sync::Arc;
use std::time::Duration;

use super::listener::AnimationSink;
use crate::core::{debugger_attached, AnimationSync, GameMode, Isolation};
use crate::error::ConfigError;
use crate::player::{PlayerSpec, ProcessLauncher};
use crate::simulation::Simulation;

/// Default per-turn deadline for process-isolated agents.
pub const DEFAULT_TURN_TIMEOUT: Duration = Duration::from_secs(2);

/// Description of one match.
///
/// ## Example
///
/// ```
/// use rust_arena::game::GameConfig;
/// use rust_arena::games::simple::SimpleGame;
/// use rust_arena::player::{IdleBot, PlayerSpec};
///
/// let config = GameConfig::<SimpleGame>::new("arena")
///     .with_player(PlayerSpec::bot("a", || IdleBot))
///     .with_player(PlayerSpec::bot("b", || IdleBot))
///     .with_seed(7);
///
/// assert_eq!(config.team_count, 2);
/// assert!(config.validate().is_ok());
/// ```
pub struct GameConfig<S: Simulation> {
    /// Match mode.
    pub mode: GameMode,
    /// Map identifier passed to the simulation.
    pub map: String,
    /// Players in team order.
    pub players: Vec<PlayerSpec<S>>,
    /// Number of team slots.
    pub team_count: usize,
    /// Record action-log segments and the initial snapshot.
    pub save_replay: bool,
    /// A presentation layer is attached. Required for human players.
    pub interactive: bool,
    /// Base seed; per-team agent seeds derive from it.
    pub seed: u64,
    /// Disable agent turn timeouts.
    pub debug: bool,
    /// Per-turn deadline for process-isolated agents.
    pub turn_timeout: Option<Duration>,
    /// Where bot agents run.
    pub isolation: Isolation,
    /// Launcher for process-isolated agents; in-memory threads when unset.
    pub launcher: Option<Arc<dyn ProcessLauncher<S>>>,
    /// Presentation layer fed with log segments.
    pub animation: Option<Arc<dyn AnimationSink<S>>>,
    /// When the loop waits for the presentation layer.
    pub animation_sync: AnimationSync,
}

impl<S: Simulation> GameConfig<S> {
    /// Create a configuration for `map` with no players.
    ///
    /// `debug` defaults to whether a debugger is attached.
    pub fn new(map: impl Into<String>) -> Self {
        Self {
            mode: GameMode::Normal,
            map: map.into(),
            players: Vec::new(),
            team_count: 0,
            save_replay: false,
            interactive: false,
            seed: 0,
            debug: debugger_attached(),
            turn_timeout: Some(DEFAULT_TURN_TIMEOUT),
            isolation: Isolation::default(),
            launcher: None,
            animation: None,
            animation_sync: AnimationSync::default(),
        }
    }

    /// Set the match mode.
    #[must_use]
    pub fn with_mode(mut self, mode: GameMode) -> Self {
        self.mode = mode;
        self
    }

    /// Append a player; the team count follows the player count.
    #[must_use]
    pub fn with_player(mut self, player: PlayerSpec<S>) -> Self {
        self.players.push(player);
        self.team_count = self.players.len();
        self
    }

    /// Override the team count.
    #[must_use]
    pub fn with_team_count(mut self, team_count: usize) -> Self {
        self.team_count = team_count;
        self
    }

    /// Enable or disable replay recording.
    #[must_use]
    pub fn with_save_replay(mut self, save_replay: bool) -> Self {
        self.save_replay = save_replay;
        self
    }

    /// Mark the session as interactive.
    #[must_use]
    pub fn with_interactive(mut self, interactive: bool) -> Self {
        self.interactive = interactive;
        self
    }

    /// Set the base seed.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Enable or disable debug mode.
    #[must_use]
    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    /// Set the per-turn deadline; `None` disables it.
    #[must_use]
    pub fn with_turn_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.turn_timeout = timeout;
        self
    }

    /// Choose where bot agents run.
    #[must_use]
    pub fn with_isolation(mut self, isolation: Isolation) -> Self {
        self.isolation = isolation;
        self
    }

    /// Use `launcher` for process-isolated agents.
    #[must_use]
    pub fn with_launcher(mut self, launcher: Arc<dyn ProcessLauncher<S>>) -> Self {
        self.launcher = Some(launcher);
        self
    }

    /// Attach a presentation layer.
    #[must_use]
    pub fn with_animation(mut self, sink: Arc<dyn AnimationSink<S>>, sync: AnimationSync) -> Self {
        self.animation = Some(sink);
        self.animation_sync = sync;
        self
    }

    /// Turn deadline actually applied to process-isolated agents.
    #[must_use]
    pub fn effective_turn_timeout(&self) -> Option<Duration> {
        if self.debug {
            None
        } else {
            self.turn_timeout
        }
    }

    /// Check team and player setup.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.team_count == 0 || self.team_count > 255 {
            return Err(ConfigError::TeamCount(self.team_count));
        }
        if self.team_count != self.players.len() {
            return Err(ConfigError::TeamCountMismatch {
                team_count: self.team_count,
                players: self.players.len(),
            });
        }
        if !self.interactive {
            if let Some(human) = self.players.iter().find(|p| p.is_human()) {
                return Err(ConfigError::HumanWithoutInterface {
                    name: human.name().to_string(),
                });
            }
        }
        Ok(())
    }

    /// Display names in team order.
    #[must_use]
    pub fn player_names(&self) -> Vec<String> {
        self.players.iter().map(|p| p.name().to_string()).collect()
    }
}

impl<S: Simulation> Clone for GameConfig<S> {
    fn clone(&self) -> Self {
        Self {
            mode: self.mode,
            map: self.map.clone(),
            players: self.players.clone(),
            team_count: self.team_count,
            save_replay: self.save_replay,
            interactive: self.interactive,
            seed: self.seed,
            debug: self.debug,
            turn_timeout: self.turn_timeout,
            isolation: self.isolation,
            launcher: self.launcher.clone(),
            animation: self.animation.clone(),
            animation_sync: self.animation_sync,
        }
    }
}

impl<S: Simulation> std::fmt::Debug for GameConfig<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GameConfig")
            .field("mode", &self.mode)
            .field("map", &self.map)
            .field("players", &self.players)
            .field("team_count", &self.team_count)
            .field("save_replay", &self.save_replay)
            .field("interactive", &self.interactive)
            .field("seed", &self.seed)
            .field("debug", &self.debug)
            .field("turn_timeout", &self.turn_timeout)
            .field("isolation", &self.isolation)
            .field("launcher", &self.launcher.is_some())
            .field("animation", &self.animation.is_some())
            .field("animation_sync", &self.animation_sync)
            .finish()
    }
}
