//! Evolutionary rules: games, player and population updates, mutation.
//!
//! - **Games**: the payoff contract ([`DiscreteGame`], [`ContinuousGame`])
//!   and the built-in payoff definitions
//! - **Update**: scheduling disciplines and player decision rules
//! - **Mutation**: rate and kernel of strategy or trait mutation

pub mod games;
pub mod mutation;
pub mod update;

pub use games::{ContinuousGame, ContinuousSnowdrift, DiscreteGame, Game, GameConfig, MatrixGame};
pub use mutation::{Mutation, MutationKernel};
pub use update::{PlayerUpdate, PopulationUpdate};
