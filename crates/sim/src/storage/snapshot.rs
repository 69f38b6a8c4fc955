//! Snapshot export and import.
//!
//! A snapshot holds everything needed to resume a run: the configuration
//! string, the clock, the explicit links of the geometry, every species'
//! traits and cached scores, the generator state and the statistics.
//! Importing a snapshot and continuing gives the same trajectory as a run
//! that was never interrupted.

use crate::base::{SimRng, RNG_ALGORITHM};
use crate::errors::{ConfigError, SnapshotError};
use crate::evolution::Game;
use crate::geometry::{Boundary, Geometry, GeometryType};
use crate::simulation::configs::Configuration;
use crate::simulation::engine::{RunStatus, Simulation};
use crate::simulation::population::{Population, Species, Traits};
use crate::simulation::statistics::{Accumulator, SpeciesReport, SpeciesStatistics, Statistics};
use crate::storage::TraceEntry;
use evolab_codec::{check_header, decode_words, encode_words, CodecStrategy};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::Path;

/// Format tag written to every snapshot.
pub const SNAPSHOT_FORMAT: &str = "evolab-snapshot";
/// Newest snapshot version this crate reads and the one it writes.
pub const SNAPSHOT_VERSION: u64 = 1;

/// Complete, versioned model state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub format: String,
    pub version: u64,
    /// Export time (RFC 3339), ignored by comparisons
    pub exported: String,
    /// Writer version, ignored by comparisons
    pub generator: String,
    /// Canonical configuration string
    pub config: String,
    pub clock: ClockRecord,
    pub geometry: GeometryRecord,
    pub population: PopulationRecord,
    pub rng: RngRecord,
    pub statistics: StatisticsRecord,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClockRecord {
    pub steps: u64,
    pub generation: f64,
    pub status: RunStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeometryRecord {
    pub topology: GeometryType,
    pub size: usize,
    pub boundary: Boundary,
    pub directed: bool,
    /// Out-neighbour lists; empty for well-mixed populations
    pub links: Vec<Vec<usize>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PopulationRecord {
    pub species: Vec<SpeciesRecord>,
}

/// One species. Exactly one of `strategies` and `values` is present.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpeciesRecord {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strategies: Option<Vec<usize>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub values: Option<Vec<f64>>,
    pub counts: Vec<usize>,
    pub scores: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RngRecord {
    pub algorithm: String,
    /// State words as `0x`-prefixed hex
    pub state: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatisticsRecord {
    pub absorbed: bool,
    /// Time up to which `summary` folds the pending states
    pub end_time: f64,
    pub species: Vec<SpeciesStatisticsRecord>,
    pub trace: Vec<TraceEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpeciesStatisticsRecord {
    pub traits: Accumulator,
    pub payoff: Accumulator,
    pub summary: SpeciesReport,
}

fn mismatch(msg: impl Into<String>) -> SnapshotError {
    SnapshotError::Mismatch(msg.into())
}

impl Snapshot {
    /// Capture the state of `sim`.
    pub fn capture(sim: &Simulation) -> Result<Self, SnapshotError> {
        let geometry = sim.geometry();
        let population = sim.population();
        let species = population
            .species()
            .iter()
            .map(|s| {
                let (strategies, values) = match s.traits() {
                    Traits::Discrete(v) => (Some(v.clone()), None),
                    Traits::Continuous(v) => (None, Some(v.clone())),
                };
                SpeciesRecord {
                    name: s.name().to_string(),
                    strategies,
                    values,
                    counts: s.counts().to_vec(),
                    scores: s.scores().to_vec(),
                }
            })
            .collect();

        let summaries = sim.report();
        let statistics = StatisticsRecord {
            absorbed: sim.status() == RunStatus::Absorbed,
            end_time: sim.end_time(),
            species: sim
                .statistics()
                .species()
                .iter()
                .zip(summaries)
                .map(|(stats, summary)| SpeciesStatisticsRecord {
                    traits: stats.traits.clone(),
                    payoff: stats.payoff.clone(),
                    summary,
                })
                .collect(),
            trace: sim.statistics().trace().to_vec(),
        };

        Ok(Self {
            format: SNAPSHOT_FORMAT.to_string(),
            version: SNAPSHOT_VERSION,
            exported: chrono::Utc::now().to_rfc3339(),
            generator: format!("evolab-sim {}", env!("CARGO_PKG_VERSION")),
            config: sim.config().to_config_string()?,
            clock: ClockRecord {
                steps: sim.steps(),
                generation: sim.generation(),
                status: sim.status(),
            },
            geometry: GeometryRecord {
                topology: geometry.topology().clone(),
                size: geometry.size(),
                boundary: geometry.boundary(),
                directed: geometry.is_directed(),
                links: geometry.links().to_vec(),
            },
            population: PopulationRecord { species },
            rng: RngRecord {
                algorithm: RNG_ALGORITHM.to_string(),
                state: encode_words(&sim.rng().state_words()?),
            },
            statistics,
        })
    }

    pub fn to_value(&self) -> Result<Value, SnapshotError> {
        Ok(serde_json::to_value(self)?)
    }

    /// Parse a document, checking its header first.
    pub fn from_value(doc: Value) -> Result<Self, SnapshotError> {
        check_header(&doc, SNAPSHOT_FORMAT, SNAPSHOT_VERSION)?;
        Ok(serde_json::from_value(doc)?)
    }

    pub fn encode(&self, strategy: CodecStrategy) -> Result<Vec<u8>, SnapshotError> {
        Ok(strategy.encode(&self.to_value()?)?)
    }

    pub fn decode(data: &[u8]) -> Result<Self, SnapshotError> {
        let doc = CodecStrategy::default().decode(data)?;
        Self::from_value(doc)
    }

    pub fn write_to(&self, path: impl AsRef<Path>, strategy: CodecStrategy) -> Result<(), SnapshotError> {
        let path = path.as_ref();
        std::fs::write(path, self.encode(strategy)?)?;
        tracing::info!(path = %path.display(), steps = self.clock.steps, "Snapshot written");
        Ok(())
    }

    pub fn read_from(path: impl AsRef<Path>) -> Result<Self, SnapshotError> {
        let path = path.as_ref();
        let snapshot = Self::decode(&std::fs::read(path)?)?;
        tracing::info!(path = %path.display(), steps = snapshot.clock.steps, "Snapshot read");
        Ok(snapshot)
    }

    /// Rebuild the run, refusing any state that does not match its own
    /// configuration.
    pub fn restore(&self) -> Result<Simulation, SnapshotError> {
        let config = Configuration::from_config_string(&self.config)?;
        config.validate()?;
        if config.execution.seed.is_none() {
            return Err(mismatch("configuration string carries no seed"));
        }

        let geometry = self.restore_geometry(&config)?;
        let population = self.restore_population(&config, &geometry)?;

        if self.rng.algorithm != RNG_ALGORITHM {
            return Err(SnapshotError::Rng(format!(
                "unsupported generator '{}', expected '{RNG_ALGORITHM}'",
                self.rng.algorithm
            )));
        }
        let rng = SimRng::from_state_words(&decode_words(&self.rng.state)?)?;

        let statistics = self.restore_statistics(&config, &population)?;

        let sim = Simulation::from_parts(
            config,
            geometry,
            population,
            statistics,
            rng,
            self.clock.steps,
            self.clock.status,
        );
        if sim.generation() != self.clock.generation {
            return Err(mismatch(format!(
                "clock generation {} does not match {} steps",
                self.clock.generation, self.clock.steps
            )));
        }
        tracing::info!(
            steps = sim.steps(),
            generation = sim.generation(),
            status = %sim.status(),
            "Snapshot restored"
        );
        Ok(sim)
    }

    fn restore_geometry(&self, config: &Configuration) -> Result<Geometry, SnapshotError> {
        let record = &self.geometry;
        if record.topology != config.geometry.topology
            || record.size != config.geometry.size
            || record.boundary != config.geometry.boundary
        {
            return Err(mismatch(format!(
                "geometry {} of size {} does not match the configuration",
                record.topology, record.size
            )));
        }
        if record.directed != record.topology.is_directed() {
            return Err(mismatch("geometry directedness does not match its topology"));
        }
        Geometry::from_links(&config.geometry, record.links.clone())
            .map_err(|e| SnapshotError::Config(ConfigError::from(e)))
    }

    fn restore_population(
        &self,
        config: &Configuration,
        geometry: &Geometry,
    ) -> Result<Population, SnapshotError> {
        let records = &self.population.species;
        if records.len() != config.species.len() {
            return Err(mismatch(format!(
                "snapshot holds {} species, configuration {}",
                records.len(),
                config.species.len()
            )));
        }
        let size = geometry.size();
        let games = config.build_games()?;
        let mut species = Vec::with_capacity(records.len());
        for (index, ((record, sc), game)) in records.iter().zip(&config.species).zip(games).enumerate() {
            if record.name != sc.name {
                return Err(mismatch(format!(
                    "species {index} is named '{}', configuration says '{}'",
                    record.name, sc.name
                )));
            }
            let traits = match (&game, &record.strategies, &record.values) {
                (Game::Discrete(g), Some(strategies), None) => {
                    if let Some(bad) = strategies.iter().find(|&&s| s >= g.n_traits()) {
                        return Err(mismatch(format!(
                            "species '{}' holds strategy {bad} of {}",
                            record.name,
                            g.n_traits()
                        )));
                    }
                    Traits::Discrete(strategies.clone())
                }
                (Game::Continuous(g), None, Some(values)) => {
                    let (lo, hi) = g.bounds();
                    if let Some(bad) = values.iter().find(|v| !(lo..=hi).contains(*v)) {
                        return Err(mismatch(format!(
                            "species '{}' holds trait {bad} outside [{lo}, {hi}]",
                            record.name
                        )));
                    }
                    Traits::Continuous(values.clone())
                }
                _ => {
                    return Err(mismatch(format!(
                        "species '{}' traits do not match its game",
                        record.name
                    )))
                }
            };
            if traits.len() != size || record.scores.len() != size {
                return Err(mismatch(format!(
                    "species '{}' must hold {size} traits and scores",
                    record.name
                )));
            }
            if record.scores.iter().any(|s| !s.is_finite()) {
                return Err(mismatch(format!(
                    "species '{}' has non-finite scores",
                    record.name
                )));
            }
            let restored = Species::from_state(
                record.name.clone(),
                game,
                sc.mutation,
                config.opponent_of(index),
                traits,
                record.scores.clone(),
            );
            if restored.counts() != record.counts.as_slice() {
                return Err(mismatch(format!(
                    "species '{}' counts do not match its strategies",
                    record.name
                )));
            }
            species.push(restored);
        }
        Ok(Population::from_species(
            species,
            config.dynamics.accounting,
            geometry,
        ))
    }

    fn restore_statistics(
        &self,
        config: &Configuration,
        population: &Population,
    ) -> Result<Statistics, SnapshotError> {
        let records = &self.statistics.species;
        if records.len() != population.n_species() {
            return Err(mismatch("statistics do not cover every species"));
        }
        for (record, species) in records.iter().zip(population.species()) {
            if record.traits.dim() != species.observable_dim() || record.payoff.dim() != 1
            {
                return Err(mismatch(format!(
                    "statistics of species '{}' have the wrong dimension",
                    species.name()
                )));
            }
        }
        Ok(Statistics::from_parts(
            records
                .iter()
                .map(|r| SpeciesStatistics {
                    traits: r.traits.clone(),
                    payoff: r.payoff.clone(),
                })
                .collect(),
            self.statistics.trace.clone(),
            config.statistics.recording.clone(),
        ))
    }
}

impl Simulation {
    /// Capture the current state.
    pub fn snapshot(&self) -> Result<Snapshot, SnapshotError> {
        Snapshot::capture(self)
    }

    /// Rebuild a run from an encoded snapshot.
    pub fn from_snapshot(data: &[u8]) -> Result<Self, SnapshotError> {
        Snapshot::decode(data)?.restore()
    }
}
