//! Commonly used imports for convenience.
//!
//! # Example
//!
//! ```
//! use evolab_sim::prelude::*;
//!
//! let mut sim = SimulationBuilder::new()
//!     .well_mixed(100)
//!     .generations(2.0)
//!     .species(SpeciesConfig::new(
//!         "players",
//!         GameConfig::Neutral { strategies: 2 },
//!         InitConfig::Random,
//!     ))
//!     .seed(1)
//!     .build()
//!     .unwrap();
//! assert!(sim.run().is_terminal());
//! ```

pub use crate::base::{FitnessMap, PayoffAccounting, SimRng};
pub use crate::errors::{BuilderError, ConfigError, GeometryError, SnapshotError};
pub use crate::evolution::{
    GameConfig, Mutation, MutationKernel, PlayerUpdate, PopulationUpdate,
};
pub use crate::geometry::{Boundary, Geometry, GeometryConfig, GeometryType, Neighborhood};
pub use crate::simulation::{
    Configuration, FixationExperiment, InitConfig, RunStatus, Simulation, SimulationBuilder,
    SpeciesConfig,
};
pub use crate::storage::{RecordingStrategy, Snapshot};
