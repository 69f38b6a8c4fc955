//! Shared default values for the command-line flags.

pub const CONFIG_FILE: &str = "evolab.json";
pub const SNAPSHOT_FILE: &str = "snapshot.json";
pub const SPECIES_NAME: &str = "players";

pub const POPULATION_SIZE: usize = 100;
pub const GENERATIONS: f64 = 1000.0;

pub const BENEFIT: f64 = 3.0;
pub const COST: f64 = 1.0;
pub const STRATEGIES: usize = 2;

pub const NOISE: f64 = 0.1;
pub const MUTATION_RATE: f64 = 0.0;
pub const MUTATION_SDEV: f64 = 0.01;

pub const RECORD_EVERY: u64 = 1;
pub const REPLICATES: usize = 100;
