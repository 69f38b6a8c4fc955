//! Builder pattern for creating simulations.
//!
//! Provides a fluent API that assembles a [`Configuration`] with sensible
//! defaults and validates it before a [`Simulation`] is created.

use crate::base::{FitnessMap, PayoffAccounting};
pub use crate::errors::BuilderError;
use crate::evolution::{PlayerUpdate, PopulationUpdate};
use crate::geometry::{Boundary, GeometryConfig, GeometryType};
use crate::simulation::configs::{
    Configuration, DynamicsConfig, ExecutionConfig, SpeciesConfig, StatisticsConfig,
};
use crate::simulation::Simulation;
use crate::storage::RecordingStrategy;

/// Builder for constructing Simulation instances with a fluent API.
///
/// # Examples
///
/// ```
/// use evolab_sim::evolution::{GameConfig, PlayerUpdate};
/// use evolab_sim::geometry::Neighborhood;
/// use evolab_sim::simulation::{InitConfig, SimulationBuilder, SpeciesConfig};
///
/// let mut sim = SimulationBuilder::new()
///     .square(100, Neighborhood::VonNeumann)
///     .generations(5.0)
///     .player_update(PlayerUpdate::Thermal { noise: 0.5 })
///     .species(SpeciesConfig::new(
///         "players",
///         GameConfig::Donation { benefit: 3.0, cost: 1.0 },
///         InitConfig::Frequencies { frequencies: vec![0.5, 0.5] },
///     ))
///     .seed(42)
///     .build()
///     .unwrap();
/// sim.run();
/// ```
#[derive(Debug, Clone, Default)]
pub struct SimulationBuilder {
    // Required parameters
    geometry: Option<GeometryConfig>,
    generations: Option<f64>,
    species: Vec<SpeciesConfig>,

    // Optional, with defaults
    boundary: Option<Boundary>,
    dynamics: DynamicsConfig,
    recording: Option<RecordingStrategy>,
    seed: Option<u64>,
}

impl SimulationBuilder {
    /// Create a new simulation builder with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the interaction geometry (required).
    pub fn geometry(mut self, topology: GeometryType, size: usize) -> Self {
        self.geometry = Some(GeometryConfig::new(topology, size));
        self
    }

    /// Shorthand for a well-mixed population of `size` agents.
    pub fn well_mixed(self, size: usize) -> Self {
        self.geometry(GeometryType::WellMixed, size)
    }

    /// Shorthand for a square lattice of `size` nodes.
    pub fn square(self, size: usize, neighborhood: crate::geometry::Neighborhood) -> Self {
        self.geometry(GeometryType::Square { neighborhood }, size)
    }

    /// Lattice boundary condition (default: periodic).
    pub fn boundary(mut self, boundary: Boundary) -> Self {
        self.boundary = Some(boundary);
        self
    }

    /// Set the generation limit (required).
    pub fn generations(mut self, generations: f64) -> Self {
        self.generations = Some(generations);
        self
    }

    /// Add a species (at least one is required).
    pub fn species(mut self, species: SpeciesConfig) -> Self {
        self.species.push(species);
        self
    }

    pub fn population_update(mut self, update: PopulationUpdate) -> Self {
        self.dynamics.population_update = update;
        self
    }

    pub fn player_update(mut self, rule: PlayerUpdate) -> Self {
        self.dynamics.player_update = rule;
        self
    }

    pub fn accounting(mut self, accounting: PayoffAccounting) -> Self {
        self.dynamics.accounting = accounting;
        self
    }

    pub fn fitness(mut self, fitness: FitnessMap) -> Self {
        self.dynamics.fitness = fitness;
        self
    }

    /// Trace strategy counts at these generations (default: every one).
    pub fn recording(mut self, recording: RecordingStrategy) -> Self {
        self.recording = Some(recording);
        self
    }

    /// Set random seed for reproducibility (optional).
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Assemble and validate the configuration without building a run.
    pub fn build_config(self) -> Result<Configuration, BuilderError> {
        let mut geometry = self
            .geometry
            .ok_or(BuilderError::MissingRequired("geometry"))?;
        let max_generations = self
            .generations
            .ok_or(BuilderError::MissingRequired("generations"))?;
        if self.species.is_empty() {
            return Err(BuilderError::MissingRequired("species"));
        }
        if let Some(boundary) = self.boundary {
            geometry.boundary = boundary;
        }

        let config = Configuration {
            execution: ExecutionConfig {
                seed: self.seed,
                max_generations,
            },
            geometry,
            dynamics: self.dynamics,
            species: self.species,
            statistics: self
                .recording
                .map(|recording| StatisticsConfig { recording })
                .unwrap_or_default(),
        };
        config.validate()?;
        Ok(config)
    }

    /// Build the simulation.
    pub fn build(self) -> Result<Simulation, BuilderError> {
        let config = self.build_config()?;
        Ok(Simulation::new(config)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evolution::{GameConfig, Mutation, MutationKernel};
    use crate::simulation::configs::InitConfig;

    fn players() -> SpeciesConfig {
        SpeciesConfig::new(
            "players",
            GameConfig::Neutral { strategies: 2 },
            InitConfig::Frequencies {
                frequencies: vec![0.5, 0.5],
            },
        )
    }

    #[test]
    fn test_builder_minimal() {
        let sim = SimulationBuilder::new()
            .well_mixed(20)
            .generations(3.0)
            .species(players())
            .build()
            .unwrap();
        assert_eq!(sim.population().size(), 20);
        assert_eq!(sim.config().execution.max_generations, 3.0);
        assert!(sim.config().execution.seed.is_some());
    }

    #[test]
    fn test_builder_with_seed() {
        let a = SimulationBuilder::new()
            .well_mixed(20)
            .generations(3.0)
            .species(players())
            .seed(11)
            .build()
            .unwrap();
        assert_eq!(a.seed(), 11);
    }

    #[test]
    fn test_builder_missing_geometry() {
        let result = SimulationBuilder::new()
            .generations(3.0)
            .species(players())
            .build();
        assert!(matches!(result, Err(BuilderError::MissingRequired("geometry"))));
    }

    #[test]
    fn test_builder_missing_generations() {
        let result = SimulationBuilder::new().well_mixed(10).species(players()).build();
        assert!(matches!(result, Err(BuilderError::MissingRequired("generations"))));
    }

    #[test]
    fn test_builder_missing_species() {
        let result = SimulationBuilder::new().well_mixed(10).generations(1.0).build();
        assert!(matches!(result, Err(BuilderError::MissingRequired("species"))));
    }

    #[test]
    fn test_builder_invalid_mutation_rate() {
        let result = SimulationBuilder::new()
            .well_mixed(10)
            .generations(1.0)
            .species(players().with_mutation(Mutation {
                rate: 1.5,
                kernel: MutationKernel::Uniform,
            }))
            .build();
        assert!(matches!(result, Err(BuilderError::Config(_))));
    }

    #[test]
    fn test_builder_fixed_boundary() {
        let config = SimulationBuilder::new()
            .square(16, crate::geometry::Neighborhood::Moore)
            .boundary(Boundary::Fixed)
            .generations(1.0)
            .recording(RecordingStrategy::None)
            .species(players())
            .build_config()
            .unwrap();
        assert_eq!(config.geometry.boundary, Boundary::Fixed);
        assert_eq!(config.statistics.recording, RecordingStrategy::None);
    }
}
