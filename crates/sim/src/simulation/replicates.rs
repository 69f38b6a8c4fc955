//! Independent replicate runs for fixation statistics.
//!
//! Replicate `r` is the configured run with seed `base + r` (wrapping). The
//! replicates share nothing and run in parallel on the rayon pool; results
//! are folded in replicate order, so the report does not depend on the
//! number of threads.

use crate::errors::ConfigError;
use crate::simulation::configs::Configuration;
use crate::simulation::engine::{RunStatus, Simulation};
use crate::storage::RecordingStrategy;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Outcome of one replicate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplicateOutcome {
    pub seed: u64,
    pub status: RunStatus,
    /// Generation at which the run ended
    pub generation: f64,
    /// Strategy fixed in each species, if any
    pub fixed: Vec<Option<usize>>,
}

/// Fixation counts of one species.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpeciesFixation {
    pub name: String,
    /// Replicates that absorbed with each strategy fixed
    pub counts: Vec<usize>,
    /// `counts` over the number of replicates
    pub probabilities: Vec<f64>,
}

/// Aggregated result of a fixation experiment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FixationReport {
    pub base_seed: u64,
    pub replicates: usize,
    pub species: Vec<SpeciesFixation>,
    /// Replicates that reached the generation limit before absorbing
    pub unresolved: usize,
    /// Mean absorption time over the absorbed replicates
    pub mean_time: f64,
    pub time_variance: f64,
}

/// Runs `replicates` copies of a configuration until absorption.
#[derive(Debug, Clone)]
pub struct FixationExperiment {
    config: Configuration,
    replicates: usize,
}

impl FixationExperiment {
    /// Every species must have discrete strategies and no mutation, otherwise
    /// no replicate can absorb.
    pub fn new(config: Configuration, replicates: usize) -> Result<Self, ConfigError> {
        let config = config.resolved();
        config.validate()?;
        if replicates == 0 {
            return Err(ConfigError::InvalidParameter(
                "at least one replicate is required".into(),
            ));
        }
        let games = config.build_games()?;
        for (species, game) in config.species.iter().zip(&games) {
            if !game.is_discrete() {
                return Err(ConfigError::Incompatible(format!(
                    "species '{}' has continuous traits and cannot fix",
                    species.name
                )));
            }
            if species.mutation.is_active() {
                tracing::warn!(
                    species = %species.name,
                    "mutation is active; replicates will only end at the generation limit"
                );
            }
        }
        Ok(Self {
            config,
            replicates,
        })
    }

    /// The resolved configuration shared by every replicate.
    pub fn config(&self) -> &Configuration {
        &self.config
    }

    pub fn base_seed(&self) -> u64 {
        self.config.execution.seed.unwrap_or_default()
    }

    pub fn replicates(&self) -> usize {
        self.replicates
    }

    /// Run replicate `index` on the calling thread.
    pub fn replicate(&self, index: usize) -> Result<ReplicateOutcome, ConfigError> {
        let seed = self.base_seed().wrapping_add(index as u64);
        let mut config = self.config.clone();
        config.execution.seed = Some(seed);
        config.statistics.recording = RecordingStrategy::None;
        let mut sim = Simulation::new(config)?;
        let status = sim.run();
        Ok(ReplicateOutcome {
            seed,
            status,
            generation: sim.generation(),
            fixed: sim
                .population()
                .species()
                .iter()
                .map(|s| s.monomorphic_strategy())
                .collect(),
        })
    }

    /// Run every replicate in parallel.
    pub fn run(&self) -> Result<FixationReport, ConfigError> {
        tracing::info!(
            replicates = self.replicates,
            base_seed = self.base_seed(),
            threads = rayon::current_num_threads(),
            "Starting fixation experiment"
        );
        let outcomes = (0..self.replicates)
            .into_par_iter()
            .map(|r| self.replicate(r))
            .collect::<Result<Vec<_>, _>>()?;
        let report = self.summarize(&outcomes)?;
        tracing::info!(
            unresolved = report.unresolved,
            mean_time = report.mean_time,
            "Fixation experiment finished"
        );
        Ok(report)
    }

    /// Fold outcomes in replicate order.
    pub fn summarize(&self, outcomes: &[ReplicateOutcome]) -> Result<FixationReport, ConfigError> {
        let games = self.config.build_games()?;
        let mut species: Vec<SpeciesFixation> = self
            .config
            .species
            .iter()
            .zip(&games)
            .map(|(s, g)| SpeciesFixation {
                name: s.name.clone(),
                counts: vec![0; g.n_traits().unwrap_or(0)],
                probabilities: Vec::new(),
            })
            .collect();

        let mut unresolved = 0;
        let mut absorbed = 0usize;
        let mut mean = 0.0;
        let mut m2 = 0.0;
        for outcome in outcomes {
            if outcome.status != RunStatus::Absorbed {
                unresolved += 1;
                continue;
            }
            absorbed += 1;
            let delta = outcome.generation - mean;
            mean += delta / absorbed as f64;
            m2 += delta * (outcome.generation - mean);
            for (entry, fixed) in species.iter_mut().zip(&outcome.fixed) {
                if let Some(strategy) = *fixed {
                    entry.counts[strategy] += 1;
                }
            }
        }

        let total = outcomes.len().max(1) as f64;
        for entry in &mut species {
            entry.probabilities = entry.counts.iter().map(|&c| c as f64 / total).collect();
        }
        Ok(FixationReport {
            base_seed: self.base_seed(),
            replicates: outcomes.len(),
            species,
            unresolved,
            mean_time: mean,
            time_variance: if absorbed > 0 { m2 / absorbed as f64 } else { 0.0 },
        })
    }
}
