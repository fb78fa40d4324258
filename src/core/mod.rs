//! Core match types: teams, status, actions, RNG, configuration values.
//!
//! This module contains the building blocks that are independent of any
//! particular rules engine or player strategy.

pub mod action;
pub mod config;
pub mod rng;
pub mod status;
pub mod team;

pub use action::{ActionLog, ActionRecord};
pub use config::{debugger_attached, AnimationSync, GameId, GameMode, Isolation};
pub use rng::GameRng;
pub use status::Status;
pub use team::{TeamId, TeamMap};
