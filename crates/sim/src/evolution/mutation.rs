//! Mutation of strategies and traits.
//!
//! A mutation fires with probability `rate` per update event: once per
//! elementary step in asynchronous and Moran updates, once per agent in a
//! synchronous sweep. The trigger is checked *before* the player-update
//! decision; when it fires, the kernel's draws replace the player-update
//! draws for that event.
//!
//! Draw budget per kernel:
//!
//! | kernel                | traits     | draws                        |
//! |-----------------------|------------|------------------------------|
//! | trigger               | any        | 1 (`random01`), skipped at rate 0 |
//! | `Uniform`             | discrete   | 1 (`random0n(n)`)            |
//! | `Uniform`             | continuous | 1 (`random01`)               |
//! | `Other`               | discrete   | 1 (`random0n(n - 1)`)        |
//! | `Gaussian`            | continuous | 2 (Box-Muller)               |

use crate::base::SimRng;
pub use crate::errors::MutationError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// How a mutant strategy or trait is chosen.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MutationKernel {
    /// Uniform reselection over the whole strategy set or trait range; the
    /// current strategy may be drawn again.
    Uniform,
    /// Uniform reselection among all strategies except the current one.
    Other,
    /// Gaussian step with standard deviation `sdev`, reflected at the range
    /// boundaries.
    Gaussian { sdev: f64 },
}

impl MutationKernel {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Uniform => "uniform",
            Self::Other => "other",
            Self::Gaussian { .. } => "gaussian",
        }
    }
}

impl fmt::Display for MutationKernel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Gaussian { sdev } => write!(f, "gaussian (sdev {sdev})"),
            other => write!(f, "{}", other.name()),
        }
    }
}

/// Mutation rate and kernel of one species.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Mutation {
    /// Probability per update event
    pub rate: f64,
    pub kernel: MutationKernel,
}

impl Default for Mutation {
    fn default() -> Self {
        Self::none()
    }
}

impl Mutation {
    pub fn new(rate: f64, kernel: MutationKernel) -> Result<Self, MutationError> {
        let mutation = Self { rate, kernel };
        mutation.validate_rate()?;
        Ok(mutation)
    }

    /// No mutation.
    pub fn none() -> Self {
        Self {
            rate: 0.0,
            kernel: MutationKernel::Uniform,
        }
    }

    pub fn is_active(&self) -> bool {
        self.rate > 0.0
    }

    fn validate_rate(&self) -> Result<(), MutationError> {
        if !(0.0..=1.0).contains(&self.rate) {
            return Err(MutationError::InvalidMutationRate(self.rate));
        }
        Ok(())
    }

    /// Check rate and kernel against a discrete strategy set of size
    /// `n_traits`.
    pub fn validate_discrete(&self, n_traits: usize) -> Result<(), MutationError> {
        self.validate_rate()?;
        match self.kernel {
            MutationKernel::Uniform => Ok(()),
            MutationKernel::Other if n_traits >= 2 => Ok(()),
            MutationKernel::Other => Err(MutationError::InvalidParameter(
                "reselecting another strategy needs at least 2 strategies".into(),
            )),
            MutationKernel::Gaussian { .. } => Err(MutationError::IncompatibleKernel {
                kernel: self.kernel.name(),
                traits: "discrete",
            }),
        }
    }

    pub fn validate_continuous(&self) -> Result<(), MutationError> {
        self.validate_rate()?;
        match self.kernel {
            MutationKernel::Uniform => Ok(()),
            MutationKernel::Gaussian { sdev } if sdev.is_finite() && sdev > 0.0 => Ok(()),
            MutationKernel::Gaussian { sdev } => Err(MutationError::InvalidParameter(format!(
                "gaussian standard deviation must be positive, got {sdev}"
            ))),
            MutationKernel::Other => Err(MutationError::IncompatibleKernel {
                kernel: self.kernel.name(),
                traits: "continuous",
            }),
        }
    }

    /// Trigger check. Consumes one draw unless the rate is zero.
    #[inline]
    pub fn triggers(&self, rng: &mut SimRng) -> bool {
        self.is_active() && rng.chance(self.rate)
    }

    /// Mutant of discrete strategy `current` out of `n_traits`.
    pub fn mutate_discrete(&self, current: usize, n_traits: usize, rng: &mut SimRng) -> usize {
        match self.kernel {
            MutationKernel::Other => {
                let pick = rng.random0n(n_traits - 1);
                if pick >= current {
                    pick + 1
                } else {
                    pick
                }
            }
            // Gaussian is rejected for discrete traits at validation.
            MutationKernel::Uniform | MutationKernel::Gaussian { .. } => rng.random0n(n_traits),
        }
    }

    /// Mutant of continuous trait `current` within `[lo, hi]`.
    pub fn mutate_continuous(&self, current: f64, (lo, hi): (f64, f64), rng: &mut SimRng) -> f64 {
        match self.kernel {
            MutationKernel::Gaussian { sdev } => reflect(current + sdev * rng.next_gaussian(), lo, hi),
            // Other is rejected for continuous traits at validation.
            MutationKernel::Uniform | MutationKernel::Other => lo + rng.random01() * (hi - lo),
        }
    }
}

/// Fold `x` back into `[lo, hi]` by mirroring at the boundaries.
fn reflect(mut x: f64, lo: f64, hi: f64) -> f64 {
    let width = hi - lo;
    if !(width > 0.0) {
        return lo;
    }
    // Fold into one period of length 2 * width first so huge steps terminate.
    let period = 2.0 * width;
    let mut offset = (x - lo).rem_euclid(period);
    if offset > width {
        offset = period - offset;
    }
    x = lo + offset;
    x.clamp(lo, hi)
}
