//! Payoff contracts and the built-in games.
//!
//! A game tells the engine how well a focal agent does against the group it
//! interacts with. Games never draw randomness, so computing payoffs can be
//! separated from the stochastic scheduler.
//!
//! ## Discrete games
//! Agents carry one of `n_traits` strategies. The group is summarised by a
//! count per opponent strategy and [`DiscreteGame::payoff`] returns the total
//! payoff of one interaction with every group member. How totals become
//! scores (mean or sum) is decided by the population's
//! [`PayoffAccounting`](crate::base::PayoffAccounting).
//!
//! ## Continuous games
//! Agents carry a real trait inside [`ContinuousGame::bounds`];
//! [`ContinuousGame::payoff`] is the pairwise payoff of one interaction.

use crate::errors::GameError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Payoff contract for games with a finite strategy set.
pub trait DiscreteGame: fmt::Debug + Send + Sync {
    /// Number of strategies available to the focal species.
    fn n_traits(&self) -> usize;

    /// Number of strategies of the opponent species.
    fn n_opponent_traits(&self) -> usize {
        self.n_traits()
    }

    /// Total payoff of `focal` from one interaction with each member of a
    /// group holding `counts[j]` opponents of strategy `j`.
    fn payoff(&self, focal: usize, counts: &[usize]) -> f64;

    /// Total payoff of every focal strategy against the same group.
    fn payoffs(&self, counts: &[usize], out: &mut [f64]) {
        for (focal, slot) in out.iter_mut().enumerate() {
            *slot = self.payoff(focal, counts);
        }
    }

    /// Smallest payoff of a single interaction.
    fn min_payoff(&self) -> f64;

    /// Largest payoff of a single interaction.
    fn max_payoff(&self) -> f64;

    /// Payoff of a single interaction when focal and opponent share
    /// `strategy`.
    fn monomorphic_payoff(&self, strategy: usize) -> f64;
}

/// Payoff contract for games with a real-valued trait.
pub trait ContinuousGame: fmt::Debug + Send + Sync {
    /// Closed interval of admissible trait values.
    fn bounds(&self) -> (f64, f64);

    /// Payoff of one interaction between traits `focal` and `opponent`.
    fn payoff(&self, focal: f64, opponent: f64) -> f64;

    fn min_payoff(&self) -> f64;

    fn max_payoff(&self) -> f64;

    fn monomorphic_payoff(&self, value: f64) -> f64 {
        self.payoff(value, value)
    }
}

/// Discrete game given by a payoff matrix.
///
/// `matrix[i][j]` is the payoff of focal strategy `i` against opponent
/// strategy `j`. Rectangular matrices describe one side of a bimatrix game
/// between two species.
#[derive(Debug, Clone, PartialEq)]
pub struct MatrixGame {
    matrix: Vec<Vec<f64>>,
    min: f64,
    max: f64,
}

impl MatrixGame {
    pub fn new(matrix: Vec<Vec<f64>>) -> Result<Self, GameError> {
        let cols = matrix.first().map(Vec::len).unwrap_or(0);
        if matrix.is_empty() || cols == 0 {
            return Err(GameError::InvalidParameter(
                "payoff matrix must not be empty".into(),
            ));
        }
        if let Some(row) = matrix.iter().position(|r| r.len() != cols) {
            return Err(GameError::InvalidParameter(format!(
                "payoff matrix row {row} has {} entries, expected {cols}",
                matrix[row].len()
            )));
        }
        if matrix.iter().flatten().any(|v| !v.is_finite()) {
            return Err(GameError::InvalidParameter(
                "payoff matrix entries must be finite".into(),
            ));
        }
        let min = matrix.iter().flatten().copied().fold(f64::INFINITY, f64::min);
        let max = matrix
            .iter()
            .flatten()
            .copied()
            .fold(f64::NEG_INFINITY, f64::max);
        Ok(Self { matrix, min, max })
    }

    /// `n` strategies with identical payoffs.
    pub fn neutral(n: usize) -> Result<Self, GameError> {
        if n < 2 {
            return Err(GameError::InvalidParameter(
                "a neutral game needs at least 2 strategies".into(),
            ));
        }
        Self::new(vec![vec![1.0; n]; n])
    }

    /// Donation game (prisoner's dilemma); strategy 0 cooperates.
    pub fn donation(benefit: f64, cost: f64) -> Result<Self, GameError> {
        Self::new(vec![vec![benefit - cost, -cost], vec![benefit, 0.0]])
    }

    /// Snowdrift game; strategy 0 cooperates and mutual cooperators share
    /// the cost.
    pub fn snowdrift(benefit: f64, cost: f64) -> Result<Self, GameError> {
        Self::new(vec![
            vec![benefit - 0.5 * cost, benefit - cost],
            vec![benefit, 0.0],
        ])
    }

    /// Rock (0), paper (1), scissors (2).
    pub fn rock_paper_scissors(win: f64, loss: f64) -> Result<Self, GameError> {
        Self::new(vec![
            vec![0.0, -loss, win],
            vec![win, 0.0, -loss],
            vec![-loss, win, 0.0],
        ])
    }

    pub fn matrix(&self) -> &[Vec<f64>] {
        &self.matrix
    }
}

impl DiscreteGame for MatrixGame {
    fn n_traits(&self) -> usize {
        self.matrix.len()
    }

    fn n_opponent_traits(&self) -> usize {
        self.matrix[0].len()
    }

    #[inline]
    fn payoff(&self, focal: usize, counts: &[usize]) -> f64 {
        self.matrix[focal]
            .iter()
            .zip(counts)
            .map(|(a, &n)| a * n as f64)
            .sum()
    }

    fn min_payoff(&self) -> f64 {
        self.min
    }

    fn max_payoff(&self) -> f64 {
        self.max
    }

    fn monomorphic_payoff(&self, strategy: usize) -> f64 {
        self.matrix[strategy]
            .get(strategy)
            .copied()
            .unwrap_or(f64::NAN)
    }
}

/// Continuous snowdrift game.
///
/// Payoff `B(x + y) - C(x)` with quadratic benefit
/// `B(s) = b1 * s + b2 * s^2` of the summed investment and quadratic cost
/// `C(x) = c1 * x + c2 * x^2` of the own investment.
#[derive(Debug, Clone, PartialEq)]
pub struct ContinuousSnowdrift {
    benefit: [f64; 2],
    cost: [f64; 2],
    bounds: (f64, f64),
    min: f64,
    max: f64,
}

impl ContinuousSnowdrift {
    pub fn new(benefit: [f64; 2], cost: [f64; 2], bounds: (f64, f64)) -> Result<Self, GameError> {
        let (lo, hi) = bounds;
        if !(lo.is_finite() && hi.is_finite() && lo < hi) {
            return Err(GameError::InvalidParameter(format!(
                "trait range [{lo}, {hi}] must be finite and non-empty"
            )));
        }
        if benefit.iter().chain(cost.iter()).any(|v| !v.is_finite()) {
            return Err(GameError::InvalidParameter(
                "benefit and cost coefficients must be finite".into(),
            ));
        }
        let mut game = Self {
            benefit,
            cost,
            bounds,
            min: 0.0,
            max: 0.0,
        };
        let (min, max) = game.extremes();
        game.min = min;
        game.max = max;
        Ok(game)
    }

    /// Extremes of the payoff over the trait square.
    ///
    /// A quadratic on a box attains its extremes at a corner, at a critical
    /// point along an edge, or at an interior critical point, so evaluating
    /// those candidates (clamped into the box) is exact.
    fn extremes(&self) -> (f64, f64) {
        let (lo, hi) = self.bounds;
        let [b1, b2] = self.benefit;
        let [c1, c2] = self.cost;
        let clamp = |v: f64| if v.is_finite() { v.clamp(lo, hi) } else { lo };

        let mut candidates = vec![(lo, lo), (lo, hi), (hi, lo), (hi, hi)];
        for x in [lo, hi] {
            // d/dy: b1 + 2 b2 (x + y) = 0
            candidates.push((x, clamp(-b1 / (2.0 * b2) - x)));
        }
        for y in [lo, hi] {
            // d/dx: b1 + 2 b2 (x + y) - c1 - 2 c2 x = 0
            candidates.push((clamp((c1 - b1 - 2.0 * b2 * y) / (2.0 * (b2 - c2))), y));
        }
        let x = clamp(-c1 / (2.0 * c2));
        candidates.push((x, clamp(-b1 / (2.0 * b2) - x)));

        candidates
            .into_iter()
            .map(|(x, y)| self.payoff(x, y))
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(min, max), p| {
                (min.min(p), max.max(p))
            })
    }
}

impl ContinuousGame for ContinuousSnowdrift {
    fn bounds(&self) -> (f64, f64) {
        self.bounds
    }

    #[inline]
    fn payoff(&self, focal: f64, opponent: f64) -> f64 {
        let s = focal + opponent;
        let [b1, b2] = self.benefit;
        let [c1, c2] = self.cost;
        (b2 * s + b1) * s - (c2 * focal + c1) * focal
    }

    fn min_payoff(&self) -> f64 {
        self.min
    }

    fn max_payoff(&self) -> f64 {
        self.max
    }
}

/// Game selection as it appears in a configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GameConfig {
    /// Explicit payoff matrix.
    Matrix { payoffs: Vec<Vec<f64>> },
    Neutral { strategies: usize },
    Donation { benefit: f64, cost: f64 },
    Snowdrift { benefit: f64, cost: f64 },
    RockPaperScissors { win: f64, loss: f64 },
    ContinuousSnowdrift {
        benefit: [f64; 2],
        cost: [f64; 2],
        min: f64,
        max: f64,
    },
}

impl GameConfig {
    pub fn build(&self) -> Result<Game, GameError> {
        Ok(match self {
            Self::Matrix { payoffs } => Game::Discrete(Arc::new(MatrixGame::new(payoffs.clone())?)),
            Self::Neutral { strategies } => Game::Discrete(Arc::new(MatrixGame::neutral(*strategies)?)),
            Self::Donation { benefit, cost } => {
                Game::Discrete(Arc::new(MatrixGame::donation(*benefit, *cost)?))
            }
            Self::Snowdrift { benefit, cost } => {
                Game::Discrete(Arc::new(MatrixGame::snowdrift(*benefit, *cost)?))
            }
            Self::RockPaperScissors { win, loss } => {
                Game::Discrete(Arc::new(MatrixGame::rock_paper_scissors(*win, *loss)?))
            }
            Self::ContinuousSnowdrift {
                benefit,
                cost,
                min,
                max,
            } => Game::Continuous(Arc::new(ContinuousSnowdrift::new(
                *benefit,
                *cost,
                (*min, *max),
            )?)),
        })
    }

    pub fn is_continuous(&self) -> bool {
        matches!(self, Self::ContinuousSnowdrift { .. })
    }
}

/// A built game, shared read-only by every agent of a species.
#[derive(Debug, Clone)]
pub enum Game {
    Discrete(Arc<dyn DiscreteGame>),
    Continuous(Arc<dyn ContinuousGame>),
}

impl Game {
    pub fn is_discrete(&self) -> bool {
        matches!(self, Self::Discrete(_))
    }

    /// Number of strategies; `None` for continuous traits.
    pub fn n_traits(&self) -> Option<usize> {
        match self {
            Self::Discrete(g) => Some(g.n_traits()),
            Self::Continuous(_) => None,
        }
    }

    pub fn min_payoff(&self) -> f64 {
        match self {
            Self::Discrete(g) => g.min_payoff(),
            Self::Continuous(g) => g.min_payoff(),
        }
    }

    pub fn max_payoff(&self) -> f64 {
        match self {
            Self::Discrete(g) => g.max_payoff(),
            Self::Continuous(g) => g.max_payoff(),
        }
    }

    pub fn trait_kind(&self) -> &'static str {
        match self {
            Self::Discrete(_) => "discrete",
            Self::Continuous(_) => "continuous",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_matrix_payoff_sums_group() {
        let game = MatrixGame::donation(3.0, 1.0).unwrap();
        // cooperator against 2 cooperators and 1 defector
        assert_relative_eq!(game.payoff(0, &[2, 1]), 2.0 * 2.0 - 1.0);
        // defector against the same group
        assert_relative_eq!(game.payoff(1, &[2, 1]), 6.0);
        let mut out = [0.0; 2];
        game.payoffs(&[2, 1], &mut out);
        assert_eq!(out, [3.0, 6.0]);
    }

    #[test]
    fn test_matrix_bounds_and_monomorphic() {
        let game = MatrixGame::rock_paper_scissors(1.0, 2.0).unwrap();
        assert_eq!(game.min_payoff(), -2.0);
        assert_eq!(game.max_payoff(), 1.0);
        assert_eq!(game.monomorphic_payoff(1), 0.0);

        let sd = MatrixGame::snowdrift(1.0, 0.5).unwrap();
        assert_relative_eq!(sd.monomorphic_payoff(0), 0.75);
        assert_eq!(sd.monomorphic_payoff(1), 0.0);
    }

    #[test]
    fn test_matrix_rejects_ragged() {
        assert!(MatrixGame::new(vec![vec![1.0, 2.0], vec![3.0]]).is_err());
        assert!(MatrixGame::new(vec![]).is_err());
        assert!(MatrixGame::new(vec![vec![f64::NAN]]).is_err());
        assert!(MatrixGame::neutral(1).is_err());
    }

    #[test]
    fn test_bimatrix_side() {
        let game = MatrixGame::new(vec![vec![1.0, 0.0, 2.0], vec![0.0, 1.0, 0.0]]).unwrap();
        assert_eq!(game.n_traits(), 2);
        assert_eq!(game.n_opponent_traits(), 3);
        assert_eq!(game.payoff(0, &[1, 1, 1]), 3.0);
    }

    #[test]
    fn test_continuous_snowdrift_payoff() {
        let game = ContinuousSnowdrift::new([6.0, -1.4], [4.56, -1.6], (0.0, 1.0)).unwrap();
        let p = game.payoff(0.5, 0.25);
        let s = 0.75;
        assert_relative_eq!(
            p,
            6.0 * s - 1.4 * s * s - (4.56 * 0.5 - 1.6 * 0.25),
            epsilon = 1e-12
        );
        assert_relative_eq!(game.monomorphic_payoff(0.0), 0.0);
    }

    #[test]
    fn test_continuous_extremes_match_grid_search() {
        let game = ContinuousSnowdrift::new([6.0, -1.4], [4.56, -1.6], (0.0, 1.0)).unwrap();
        let mut lo = f64::INFINITY;
        let mut hi = f64::NEG_INFINITY;
        for i in 0..=200 {
            for j in 0..=200 {
                let p = game.payoff(i as f64 / 200.0, j as f64 / 200.0);
                lo = lo.min(p);
                hi = hi.max(p);
            }
        }
        assert!(game.min_payoff() <= lo + 1e-12);
        assert!(game.max_payoff() >= hi - 1e-12);
        assert!(game.min_payoff() >= lo - 1e-3);
        assert!(game.max_payoff() <= hi + 1e-3);
    }

    #[test]
    fn test_config_build() {
        let cfg: GameConfig =
            serde_json::from_str(r#"{"type":"donation","benefit":2.0,"cost":1.0}"#).unwrap();
        let game = cfg.build().unwrap();
        assert!(game.is_discrete());
        assert_eq!(game.n_traits(), Some(2));

        let cont = GameConfig::ContinuousSnowdrift {
            benefit: [1.0, 0.0],
            cost: [0.5, 0.0],
            min: 1.0,
            max: 0.0,
        };
        assert!(cont.build().is_err());
    }
}
