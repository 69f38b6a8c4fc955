//! Population- and player-update rules.
//!
//! [`PopulationUpdate`] decides which agents act in an elementary step;
//! [`PlayerUpdate`] decides what a focal agent does given its reference set.
//! The stochastic parts of both are driven from the engine's single step
//! function so that the draw order is visible in one place; this module holds
//! the rule definitions and their deterministic decision functions.

use crate::errors::ConfigError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Scheduling discipline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PopulationUpdate {
    /// One random focal agent per elementary step.
    #[default]
    Asynchronous,
    /// Every agent updates against the previous generation.
    Synchronous,
    /// Fitness-proportional parent, offspring replaces a random neighbour.
    MoranBirthDeath,
    /// Random agent dies, replaced by the offspring of a fitness-proportional
    /// neighbour.
    MoranDeathBirth,
}

impl PopulationUpdate {
    pub fn is_moran(&self) -> bool {
        matches!(self, Self::MoranBirthDeath | Self::MoranDeathBirth)
    }
}

impl fmt::Display for PopulationUpdate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Asynchronous => "asynchronous",
            Self::Synchronous => "synchronous",
            Self::MoranBirthDeath => "moran birth-death",
            Self::MoranDeathBirth => "moran death-birth",
        };
        write!(f, "{name}")
    }
}

/// Decision rule of a focal agent.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PlayerUpdate {
    /// Adopt a random reference's strategy with the Fermi probability
    /// `1 / (1 + exp(-(reference - focal) / noise))`.
    Thermal { noise: f64 },
    /// Adopt a random reference's strategy with probability proportional to
    /// its payoff advantage, scaled by the attainable score range.
    Imitate,
    /// Adopt a random reference's strategy only if it scores strictly higher.
    ImitateBetter,
    /// Adopt the strategy of the best scoring agent among focal and all
    /// references; the focal agent wins ties.
    Best,
    /// Switch to the strategy that maximises payoff against the current
    /// local composition; ties go to the lowest strategy index.
    BestResponse,
}

impl Default for PlayerUpdate {
    fn default() -> Self {
        Self::Thermal { noise: 0.1 }
    }
}

impl PlayerUpdate {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Thermal { .. } => "thermal",
            Self::Imitate => "imitate",
            Self::ImitateBetter => "imitate-better",
            Self::Best => "best",
            Self::BestResponse => "best-response",
        }
    }

    /// Whether the rule picks one random reference (one draw).
    pub fn draws_reference(&self) -> bool {
        matches!(self, Self::Thermal { .. } | Self::Imitate | Self::ImitateBetter)
    }

    /// Whether the rule draws one uniform to accept or reject adoption.
    pub fn draws_decision(&self) -> bool {
        matches!(self, Self::Thermal { .. } | Self::Imitate)
    }

    pub fn validate(&self, continuous: bool) -> Result<(), ConfigError> {
        match *self {
            Self::Thermal { noise } if !(noise.is_finite() && noise >= 0.0) => {
                Err(ConfigError::InvalidParameter(format!(
                    "thermal noise must be finite and non-negative, got {noise}"
                )))
            }
            Self::BestResponse if continuous => Err(ConfigError::Incompatible(
                "best-response requires discrete strategies".into(),
            )),
            _ => Ok(()),
        }
    }

    /// Probability that the focal agent adopts the reference's strategy.
    ///
    /// Only meaningful for rules with a decision draw; `range` is the width
    /// of the attainable score interval used by `Imitate`.
    pub fn adoption_probability(&self, focal: f64, reference: f64, range: f64) -> f64 {
        match *self {
            Self::Thermal { noise } => fermi(reference - focal, noise),
            Self::Imitate => {
                if range > 0.0 {
                    ((reference - focal) / range).clamp(0.0, 1.0)
                } else {
                    0.0
                }
            }
            Self::ImitateBetter => {
                if reference > focal {
                    1.0
                } else {
                    0.0
                }
            }
            Self::Best | Self::BestResponse => 0.0,
        }
    }
}

impl fmt::Display for PlayerUpdate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Thermal { noise } => write!(f, "thermal (noise {noise})"),
            other => write!(f, "{}", other.name()),
        }
    }
}

/// Fermi function of a payoff advantage. Zero noise is a step with one half
/// on ties.
#[inline]
pub fn fermi(advantage: f64, noise: f64) -> f64 {
    if noise <= 0.0 {
        return match advantage.partial_cmp(&0.0) {
            Some(std::cmp::Ordering::Greater) => 1.0,
            Some(std::cmp::Ordering::Less) => 0.0,
            _ => 0.5,
        };
    }
    1.0 / (1.0 + (-advantage / noise).exp())
}

/// First candidate attaining the maximum score, or `None` when no candidate
/// beats `keep_score` (the focal agent keeps its strategy).
pub fn best_of(keep_score: f64, candidates: impl IntoIterator<Item = (usize, f64)>) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (idx, score) in candidates {
        if score > keep_score && best.map_or(true, |(_, b)| score > b) {
            best = Some((idx, score));
        }
    }
    best.map(|(idx, _)| idx)
}

/// Lowest index among the maximal payoffs.
pub fn argmax_lowest(payoffs: &[f64]) -> usize {
    let mut best = 0;
    for (idx, &p) in payoffs.iter().enumerate().skip(1) {
        if p > payoffs[best] {
            best = idx;
        }
    }
    best
}
