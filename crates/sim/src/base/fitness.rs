use serde::{Deserialize, Serialize};
use std::fmt;

use crate::errors::ConfigError;

/// How the payoffs from a group of interactions are combined into one score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PayoffAccounting {
    /// Mean payoff over all interactions.
    #[default]
    Average,
    /// Sum of payoffs over all interactions.
    Accumulated,
}

impl fmt::Display for PayoffAccounting {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Average => write!(f, "average"),
            Self::Accumulated => write!(f, "accumulated"),
        }
    }
}

/// Map from payoff (score) to reproductive fitness.
///
/// Only fitness-proportional population updates (the Moran variants) use
/// fitness; player-update rules compare raw payoffs.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FitnessMap {
    /// `fitness = baseline + selection * payoff`
    Static { baseline: f64, selection: f64 },
    /// `fitness = baseline * exp(selection * payoff)`
    Exponential { baseline: f64, selection: f64 },
}

impl Default for FitnessMap {
    fn default() -> Self {
        Self::Static {
            baseline: 1.0,
            selection: 1.0,
        }
    }
}

impl FitnessMap {
    /// Fitness of a score.
    #[inline]
    pub fn map(&self, payoff: f64) -> f64 {
        match *self {
            Self::Static {
                baseline,
                selection,
            } => baseline + selection * payoff,
            Self::Exponential {
                baseline,
                selection,
            } => baseline * (selection * payoff).exp(),
        }
    }

    /// Check that every score in `[min_score, max_score]` maps to a
    /// non-negative, finite fitness.
    pub fn validate(&self, min_score: f64, max_score: f64) -> Result<(), ConfigError> {
        let (baseline, selection) = match *self {
            Self::Static {
                baseline,
                selection,
            }
            | Self::Exponential {
                baseline,
                selection,
            } => (baseline, selection),
        };
        if !baseline.is_finite() || !selection.is_finite() {
            return Err(ConfigError::InvalidParameter(format!(
                "fitness map parameters must be finite (baseline {baseline}, selection {selection})"
            )));
        }
        if let Self::Exponential { .. } = self {
            if baseline <= 0.0 {
                return Err(ConfigError::InvalidParameter(format!(
                    "exponential fitness map requires a positive baseline, got {baseline}"
                )));
            }
            return Ok(());
        }
        let low = self.map(min_score).min(self.map(max_score));
        if low < 0.0 {
            return Err(ConfigError::InvalidParameter(format!(
                "static fitness map yields negative fitness {low} for scores in [{min_score}, {max_score}]"
            )));
        }
        Ok(())
    }
}
