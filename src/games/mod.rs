//! Reference simulations.

pub mod simple;
