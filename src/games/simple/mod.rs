//! Simple last-team-standing game for exercising the orchestrator.
//!
//! A minimal simulation:
//! - Each team starts with the map's life total
//! - On your turn: issue any number of `Attack` commands, then end the turn
//! - A team at 0 life is eliminated and skipped
//! - The match ends with one team left or after the map's round limit
//!
//! Supports any number of teams to verify N-team generality.

mod bots;
mod game;

pub use bots::RandomBot;
pub use game::{Attack, Board, MapRules, SimpleAction, SimpleGame, SimpleState};
