//! Base types shared by every part of the engine.
//!
//! This module provides the deterministic random stream and the payoff to
//! fitness mapping.

pub mod fitness;
pub mod rng;

pub use fitness::{FitnessMap, PayoffAccounting};
pub use rng::{SimRng, RNG_ALGORITHM, RNG_STATE_WORDS};
