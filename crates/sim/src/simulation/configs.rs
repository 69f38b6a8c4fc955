//! Run configuration.
//!
//! A [`Configuration`] fully determines a run together with its seed. It is
//! grouped into sections and round-trips through JSON; the compact JSON form
//! is the canonical *configuration string* recorded in every snapshot.

use crate::base::{FitnessMap, PayoffAccounting, SimRng};
use crate::errors::ConfigError;
use crate::evolution::{Game, GameConfig, Mutation, PlayerUpdate, PopulationUpdate};
use crate::geometry::GeometryConfig;
use crate::storage::RecordingStrategy;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// The master configuration struct.
/// Can be deserialized from a file to fully reproduce a simulation setup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Configuration {
    pub execution: ExecutionConfig,
    pub geometry: GeometryConfig,
    #[serde(default)]
    pub dynamics: DynamicsConfig,
    pub species: Vec<SpeciesConfig>,
    #[serde(default)]
    pub statistics: StatisticsConfig,
}

/// Run length and seed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionConfig {
    /// Optional RNG seed; resolved to a concrete value before a run starts
    #[serde(default)]
    pub seed: Option<u64>,
    /// Generation limit
    pub max_generations: f64,
}

/// Update rules shared by all species.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct DynamicsConfig {
    #[serde(default)]
    pub population_update: PopulationUpdate,
    #[serde(default)]
    pub player_update: PlayerUpdate,
    #[serde(default)]
    pub accounting: PayoffAccounting,
    /// Payoff to fitness map for the Moran updates
    #[serde(default)]
    pub fitness: FitnessMap,
}

/// One species: its game, initial state and mutation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpeciesConfig {
    pub name: String,
    pub game: GameConfig,
    pub init: InitConfig,
    #[serde(default)]
    pub mutation: Mutation,
    /// Index of the species this one interacts with (itself when absent)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub opponent: Option<usize>,
}

impl SpeciesConfig {
    pub fn new(name: impl Into<String>, game: GameConfig, init: InitConfig) -> Self {
        Self {
            name: name.into(),
            game,
            init,
            mutation: Mutation::none(),
            opponent: None,
        }
    }

    pub fn with_mutation(mut self, mutation: Mutation) -> Self {
        self.mutation = mutation;
        self
    }

    /// Interact with species `opponent` instead of with conspecifics.
    pub fn against(mut self, opponent: usize) -> Self {
        self.opponent = Some(opponent);
        self
    }
}

/// Initial arrangement of strategies or traits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InitConfig {
    /// Exact counts from relative frequencies (largest remainder), placed by
    /// a random permutation.
    Frequencies { frequencies: Vec<f64> },
    /// Independent uniform strategy (or trait) per node.
    Random,
    /// Every node plays `strategy`.
    Monomorphic { strategy: usize },
    /// Every node plays `resident` except one random node playing `mutant`.
    Mutant { resident: usize, mutant: usize },
    /// Every node carries trait `value`.
    Trait { value: f64 },
    /// Every node carries `resident` except one random node with `mutant`.
    TraitMutant { resident: f64, mutant: f64 },
}

impl InitConfig {
    pub(crate) fn validate(&self, game: &Game) -> Result<(), ConfigError> {
        let incompatible = |what: &str| {
            Err(ConfigError::Incompatible(format!(
                "{what} initialization cannot be used with {} traits",
                game.trait_kind()
            )))
        };
        match (self, game) {
            (Self::Random, _) => Ok(()),
            (Self::Frequencies { frequencies }, Game::Discrete(g)) => {
                if frequencies.len() != g.n_traits() {
                    return Err(ConfigError::InvalidParameter(format!(
                        "expected {} initial frequencies, found {}",
                        g.n_traits(),
                        frequencies.len()
                    )));
                }
                if frequencies.iter().any(|f| !f.is_finite() || *f < 0.0)
                    || frequencies.iter().sum::<f64>() <= 0.0
                {
                    return Err(ConfigError::InvalidParameter(
                        "initial frequencies must be non-negative with a positive sum".into(),
                    ));
                }
                Ok(())
            }
            (Self::Monomorphic { strategy }, Game::Discrete(g)) => {
                check_strategy(*strategy, g.n_traits())
            }
            (Self::Mutant { resident, mutant }, Game::Discrete(g)) => {
                check_strategy(*resident, g.n_traits())?;
                check_strategy(*mutant, g.n_traits())?;
                if resident == mutant {
                    return Err(ConfigError::InvalidParameter(
                        "mutant and resident strategies must differ".into(),
                    ));
                }
                Ok(())
            }
            (Self::Trait { value }, Game::Continuous(g)) => check_value(*value, g.bounds()),
            (Self::TraitMutant { resident, mutant }, Game::Continuous(g)) => {
                check_value(*resident, g.bounds())?;
                check_value(*mutant, g.bounds())
            }
            (Self::Frequencies { .. }, _) => incompatible("frequency"),
            (Self::Monomorphic { .. }, _) => incompatible("monomorphic"),
            (Self::Mutant { .. }, _) => incompatible("mutant"),
            (Self::Trait { .. }, _) => incompatible("trait"),
            (Self::TraitMutant { .. }, _) => incompatible("trait mutant"),
        }
    }
}

fn check_strategy(strategy: usize, n: usize) -> Result<(), ConfigError> {
    if strategy >= n {
        return Err(ConfigError::InvalidParameter(format!(
            "strategy {strategy} out of range for {n} strategies"
        )));
    }
    Ok(())
}

fn check_value(value: f64, (lo, hi): (f64, f64)) -> Result<(), ConfigError> {
    if !(lo..=hi).contains(&value) {
        return Err(ConfigError::InvalidParameter(format!(
            "trait {value} outside [{lo}, {hi}]"
        )));
    }
    Ok(())
}

/// What is recorded besides the running averages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatisticsConfig {
    /// Integral generations at which strategy counts are traced
    #[serde(default = "default_recording")]
    pub recording: RecordingStrategy,
}

fn default_recording() -> RecordingStrategy {
    RecordingStrategy::EveryN(1)
}

impl Default for StatisticsConfig {
    fn default() -> Self {
        Self {
            recording: default_recording(),
        }
    }
}

impl Configuration {
    /// Parse a configuration string or file contents.
    pub fn from_config_string(s: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(s)?)
    }

    /// Canonical compact JSON form.
    pub fn to_config_string(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Parse(format!("cannot read {}: {e}", path.display())))?;
        Self::from_config_string(&text)
    }

    pub fn to_file(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let text = serde_json::to_string_pretty(self)?;
        std::fs::write(path, text + "\n")
            .map_err(|e| ConfigError::Parse(format!("cannot write {}: {e}", path.display())))
    }

    /// Copy with a concrete seed, drawing one if none is set.
    pub fn resolved(&self) -> Self {
        let mut config = self.clone();
        if config.execution.seed.is_none() {
            config.execution.seed = Some(SimRng::entropy_seed());
        }
        config
    }

    /// Build every species' game, in species order.
    pub fn build_games(&self) -> Result<Vec<Game>, ConfigError> {
        self.species
            .iter()
            .map(|s| s.game.build().map_err(ConfigError::from))
            .collect()
    }

    /// Opponent index of species `index`.
    pub fn opponent_of(&self, index: usize) -> usize {
        self.species[index].opponent.unwrap_or(index)
    }

    /// Check the configuration. Geometry shape parameters are checked when
    /// the geometry is built.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let limit = self.execution.max_generations;
        if !limit.is_finite() || limit < 0.0 {
            return Err(ConfigError::InvalidParameter(format!(
                "generation limit must be finite and non-negative, got {limit}"
            )));
        }
        if self.species.is_empty() {
            return Err(ConfigError::InvalidParameter(
                "at least one species is required".into(),
            ));
        }
        if self.geometry.size == 0 {
            return Err(ConfigError::InvalidParameter(
                "population size must be positive".into(),
            ));
        }
        if let RecordingStrategy::EveryN(0) = self.statistics.recording {
            return Err(ConfigError::InvalidParameter(
                "trace interval must be positive".into(),
            ));
        }

        let games = self.build_games()?;
        let any_continuous = games.iter().any(|g| !g.is_discrete());
        self.dynamics.player_update.validate(any_continuous)?;

        for (index, (species, game)) in self.species.iter().zip(&games).enumerate() {
            let opponent = self.opponent_of(index);
            let Some(opponent_game) = games.get(opponent) else {
                return Err(ConfigError::InvalidParameter(format!(
                    "species '{}' names opponent {opponent}, but only {} species exist",
                    species.name,
                    games.len()
                )));
            };
            match (game, opponent_game) {
                (Game::Discrete(g), Game::Discrete(o)) => {
                    if g.n_opponent_traits() != o.n_traits() {
                        return Err(ConfigError::Incompatible(format!(
                            "species '{}' has payoffs against {} strategies, opponent has {}",
                            species.name,
                            g.n_opponent_traits(),
                            o.n_traits()
                        )));
                    }
                    species.mutation.validate_discrete(g.n_traits())?;
                }
                (Game::Continuous(_), Game::Continuous(_)) => {
                    species.mutation.validate_continuous()?;
                }
                _ => {
                    return Err(ConfigError::Incompatible(format!(
                        "species '{}' and its opponent mix discrete and continuous traits",
                        species.name
                    )));
                }
            }
            species.init.validate(game)?;
        }

        if self.dynamics.population_update == PopulationUpdate::Synchronous
            && self.dynamics.player_update == PlayerUpdate::Best
            && self.geometry.topology == crate::geometry::GeometryType::WellMixed
        {
            tracing::warn!(
                "synchronous best-strategy updates make a well-mixed population monomorphic in one generation"
            );
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evolution::MutationKernel;

    fn basic() -> Configuration {
        Configuration {
            execution: ExecutionConfig {
                seed: Some(7),
                max_generations: 10.0,
            },
            geometry: GeometryConfig::well_mixed(100),
            dynamics: DynamicsConfig::default(),
            species: vec![SpeciesConfig::new(
                "players",
                GameConfig::Donation {
                    benefit: 2.0,
                    cost: 1.0,
                },
                InitConfig::Frequencies {
                    frequencies: vec![0.5, 0.5],
                },
            )],
            statistics: StatisticsConfig::default(),
        }
    }

    #[test]
    fn test_valid_config() {
        basic().validate().unwrap();
    }

    #[test]
    fn test_config_string_round_trip() {
        let config = basic();
        let s = config.to_config_string().unwrap();
        assert!(!s.contains('\n'));
        let back = Configuration::from_config_string(&s).unwrap();
        assert_eq!(back, config);
        assert_eq!(back.to_config_string().unwrap(), s);
    }

    #[test]
    fn test_defaults_fill_in() {
        let text = r#"{
            "execution": {"max_generations": 5},
            "geometry": {"topology": {"type": "well_mixed"}, "size": 10},
            "species": [{"name": "a", "game": {"type": "neutral", "strategies": 2},
                         "init": {"type": "random"}}]
        }"#;
        let config = Configuration::from_config_string(text).unwrap();
        assert_eq!(config.execution.seed, None);
        assert_eq!(config.dynamics.population_update, PopulationUpdate::Asynchronous);
        assert_eq!(config.statistics.recording, RecordingStrategy::EveryN(1));
        config.validate().unwrap();
        assert!(config.resolved().execution.seed.is_some());
    }

    #[test]
    fn test_rejects_bad_limit_and_empty_species() {
        let mut config = basic();
        config.execution.max_generations = -1.0;
        assert!(config.validate().is_err());

        let mut config = basic();
        config.species.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_mismatched_frequencies() {
        let mut config = basic();
        config.species[0].init = InitConfig::Frequencies {
            frequencies: vec![1.0, 0.0, 0.0],
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_rejects_incompatible_kernel() {
        let mut config = basic();
        config.species[0].mutation = Mutation {
            rate: 0.1,
            kernel: MutationKernel::Gaussian { sdev: 0.1 },
        };
        assert!(matches!(config.validate(), Err(ConfigError::Mutation(_))));
    }

    #[test]
    fn test_rejects_bad_opponent() {
        let mut config = basic();
        config.species[0].opponent = Some(3);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_best_response_on_continuous() {
        let mut config = basic();
        config.dynamics.player_update = PlayerUpdate::BestResponse;
        config.species[0].game = GameConfig::ContinuousSnowdrift {
            benefit: [6.0, -1.4],
            cost: [4.56, -1.6],
            min: 0.0,
            max: 1.0,
        };
        config.species[0].init = InitConfig::Trait { value: 0.1 };
        assert!(matches!(config.validate(), Err(ConfigError::Incompatible(_))));
    }

    #[test]
    fn test_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        basic().to_file(&path).unwrap();
        assert_eq!(Configuration::from_file(&path).unwrap(), basic());
    }
}
