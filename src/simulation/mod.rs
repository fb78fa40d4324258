//! Simulation collaborator traits.
//!
//! Defines the `Simulation` trait that rules engines implement, together with
//! the `GameState` and `TurnController` views the orchestrator relies on.

mod engine;

pub use engine::{ActionOf, CommandOf, GameState, LogOf, Simulation, SimulationSetup, TurnController};
