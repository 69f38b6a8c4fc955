//! # Simulation Crate
//!
//! The `sim` crate provides the individual-based engine for evolutionary
//! game dynamics. It includes modules for building interaction geometries,
//! defining games and update rules, managing multi-species populations,
//! collecting statistics and exporting resumable snapshots.
//!
//! A run is fully determined by its configuration and seed: every random
//! decision is drawn from one stream in a fixed order.

pub mod base;
pub mod errors;
pub mod evolution;
pub mod geometry;
pub mod simulation;
pub mod storage;
pub mod prelude;

pub use base::SimRng;
pub use simulation::{Configuration, Simulation, SimulationBuilder};
