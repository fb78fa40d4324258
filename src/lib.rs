//! # rust-arena
//!
//! Orchestration for turn-based, multi-party matches: a lifecycle state
//! machine per match, player handlers that run agents locally or behind a
//! process boundary, and replayable action logs.
//!
//! ## Design Principles
//!
//! 1. **Game-Agnostic**: Rules live behind the `Simulation` trait. The
//!    orchestrator only sees states, controllers, commands and action logs.
//!
//! 2. **Single Writer**: Only the match's orchestration thread mutates the
//!    simulation. Agents never touch it; they emit commands that are applied
//!    in order on that thread.
//!
//! 3. **Interruptible Waits**: Every blocking wait on an agent can be
//!    cancelled, so `Game::dispose` always returns.
//!
//! ## Modules
//!
//! - `core`: team IDs, status, action logs, RNG, mode enums
//! - `command`: the command protocol between agents and the simulation
//! - `concurrent`: cancellation tokens and the single-worker executor
//! - `simulation`: traits a rules engine implements
//! - `player`: agents, player handlers and the player registry
//! - `game`: the `Game` handle, its configuration and results
//! - `games`: reference game implementations

pub mod command;
pub mod concurrent;
pub mod core;
pub mod error;
pub mod game;
pub mod games;
pub mod player;
pub mod simulation;

// Re-export commonly used types
pub use crate::core::{
    ActionLog, ActionRecord, AnimationSync, GameId, GameMode, GameRng, Isolation, Status, TeamId, TeamMap,
};

pub use crate::command::{BoxedCommand, Command, CommandHandler, EndTurnCommand};

pub use crate::error::{AgentError, ArenaResult, ConfigError, GameError, SimulationError, TransportError};

pub use crate::simulation::{GameState, Simulation, SimulationSetup, TurnController};

pub use crate::player::{
    AgentController, LocalPlayerHandler, Player, PlayerHandler, PlayerRegistry, PlayerSpec, ProcessPlayerHandler,
    TurnHandle,
};

pub use crate::game::{AnimationSink, CrashReport, Game, GameConfig, GameResults, RunConfig};
