//! Simulation engine and population management.
//!
//! This module provides the scheduler, the population state and the
//! statistics of a run.
//!
//! - `Simulation`: the engine that takes elementary steps and decides when a
//!   run ends.
//! - `Population`: traits and cached scores of every species.
//! - `SimulationBuilder`: fluent builder for constructing `Simulation`
//!   instances with sensible defaults and validation.
//! - `FixationExperiment`: independent replicates run in parallel.

pub mod builder;
pub mod configs;
pub mod engine;
pub mod population;
pub mod replicates;
pub mod statistics;

pub use builder::SimulationBuilder;
pub use configs::{
    Configuration, DynamicsConfig, ExecutionConfig, InitConfig, SpeciesConfig, StatisticsConfig,
};
pub use engine::{RunStatus, Simulation};
pub use population::{Population, Species, Trait, Traits};
pub use replicates::{FixationExperiment, FixationReport, ReplicateOutcome, SpeciesFixation};
pub use statistics::{Accumulator, SpeciesReport, SpeciesStatistics, Statistics, Summary};
