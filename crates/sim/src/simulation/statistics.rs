//! Time-weighted running statistics.
//!
//! Observables are sampled after every step. Because the population holds a
//! state *until the next event*, a sample is not folded into the running
//! averages when it is taken: it is kept as the pending state and folded once
//! the next sample arrives, weighted by the time that elapsed in between.
//!
//! The first sample initialises the mean with zero variance. When a run ends
//! early by absorption, reports fold the pending state up to the nominal end
//! of the run in one weighted step ([`Accumulator::finalized`]); the stored
//! accumulator itself is left untouched so that a resumed run continues from
//! exactly the same state.

use crate::simulation::population::Population;
use crate::storage::{RecordingStrategy, TraceEntry};
use serde::{Deserialize, Serialize};

/// Weighted online mean and variance of a vector observable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Accumulator {
    mean: Vec<f64>,
    /// Weighted sum of squared deviations
    m2: Vec<f64>,
    weight: f64,
    /// State observed at `last_time`, not yet folded
    pending: Option<Vec<f64>>,
    last_time: f64,
    samples: u64,
}

impl Accumulator {
    pub fn new(dim: usize) -> Self {
        Self {
            mean: vec![0.0; dim],
            m2: vec![0.0; dim],
            weight: 0.0,
            pending: None,
            last_time: 0.0,
            samples: 0,
        }
    }

    pub fn dim(&self) -> usize {
        self.mean.len()
    }

    pub fn samples(&self) -> u64 {
        self.samples
    }

    pub fn last_time(&self) -> f64 {
        self.last_time
    }

    /// Total weight folded so far.
    pub fn weight(&self) -> f64 {
        self.weight
    }

    /// Record the state observed at `time`.
    pub fn sample(&mut self, time: f64, values: &[f64]) {
        debug_assert_eq!(values.len(), self.dim());
        match self.pending.take() {
            None => self.mean.copy_from_slice(values),
            Some(previous) => self.fold(&previous, time - self.last_time),
        }
        self.pending = Some(values.to_vec());
        self.last_time = time;
        self.samples += 1;
    }

    fn fold(&mut self, values: &[f64], weight: f64) {
        if weight <= 0.0 {
            return;
        }
        self.weight += weight;
        let ratio = weight / self.weight;
        for ((mean, m2), &x) in self.mean.iter_mut().zip(&mut self.m2).zip(values) {
            let delta = x - *mean;
            *mean += delta * ratio;
            *m2 += weight * delta * (x - *mean);
        }
    }

    pub fn mean(&self) -> &[f64] {
        &self.mean
    }

    /// Weighted variance; zero while no weight has accumulated.
    pub fn variance(&self) -> Vec<f64> {
        if self.weight > 0.0 {
            self.m2.iter().map(|m2| m2 / self.weight).collect()
        } else {
            vec![0.0; self.dim()]
        }
    }

    /// Mean and variance with the pending state folded up to `end_time`.
    pub fn finalized(&self, end_time: f64) -> Summary {
        let mut acc = self.clone();
        if let Some(pending) = acc.pending.take() {
            acc.fold(&pending, end_time - acc.last_time);
        }
        Summary {
            variance: acc.variance(),
            mean: acc.mean,
            weight: acc.weight,
        }
    }
}

/// Reported mean and variance of one observable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    pub mean: Vec<f64>,
    pub variance: Vec<f64>,
    pub weight: f64,
}

/// Final summary of one species.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpeciesReport {
    pub name: String,
    pub traits: Summary,
    pub payoff: Summary,
    /// Strategy shared by every agent at the end of the run
    pub fixed: Option<usize>,
}

/// Accumulators of one species.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpeciesStatistics {
    /// Strategy frequencies (discrete) or mean trait (continuous)
    pub traits: Accumulator,
    /// Mean score
    pub payoff: Accumulator,
}

/// All statistics of a run.
#[derive(Debug, Clone, PartialEq)]
pub struct Statistics {
    species: Vec<SpeciesStatistics>,
    trace: Vec<TraceEntry>,
    recording: RecordingStrategy,
}

impl Statistics {
    pub fn new(population: &Population, recording: RecordingStrategy) -> Self {
        let species = population
            .species()
            .iter()
            .map(|s| SpeciesStatistics {
                traits: Accumulator::new(s.observable_dim()),
                payoff: Accumulator::new(1),
            })
            .collect();
        Self {
            species,
            trace: Vec::new(),
            recording,
        }
    }

    /// Rebuild from exported parts.
    pub(crate) fn from_parts(
        species: Vec<SpeciesStatistics>,
        trace: Vec<TraceEntry>,
        recording: RecordingStrategy,
    ) -> Self {
        Self {
            species,
            trace,
            recording,
        }
    }

    pub fn sample(&mut self, time: f64, population: &Population) {
        let mut buf = Vec::new();
        for (stats, species) in self.species.iter_mut().zip(population.species()) {
            species.observables(&mut buf);
            stats.traits.sample(time, &buf);
            stats.payoff.sample(time, &[species.mean_score()]);
        }
    }

    /// Append a trace entry if `generation` is selected for recording.
    pub fn record(&mut self, generation: u64, population: &Population) {
        if !self.recording.should_record(generation) {
            return;
        }
        let counts = population
            .species()
            .iter()
            .map(|s| s.counts().to_vec())
            .collect();
        self.trace.push(TraceEntry { generation, counts });
    }

    pub fn species(&self) -> &[SpeciesStatistics] {
        &self.species
    }

    /// Summaries of every species with pending states folded up to
    /// `end_time`.
    pub fn report(&self, population: &Population, end_time: f64) -> Vec<SpeciesReport> {
        self.species
            .iter()
            .zip(population.species())
            .map(|(stats, species)| SpeciesReport {
                name: species.name().to_string(),
                traits: stats.traits.finalized(end_time),
                payoff: stats.payoff.finalized(end_time),
                fixed: species.monomorphic_strategy(),
            })
            .collect()
    }

    pub fn trace(&self) -> &[TraceEntry] {
        &self.trace
    }

    pub fn recording(&self) -> &RecordingStrategy {
        &self.recording
    }
}
