//! Match orchestration.
//!
//! - `Game`: lifecycle state machine and the orchestration thread
//! - `GameConfig` / `RunConfig`: match setup, in code or from TOML
//! - `GameResults`: replay record that survives `Game::dispose`
//! - `AnimationSink` and completion listeners: presentation hooks

mod config;
mod listener;
mod orchestrator;
mod results;
mod run_config;
mod turn_loop;

pub use config::{GameConfig, DEFAULT_TURN_TIMEOUT};
pub use listener::{AnimationSink, CompletionListener, CrashReport};
pub use orchestrator::Game;
pub use results::GameResults;
pub use run_config::RunConfig;
