//! Simulation engine for evolutionary games.
//!
//! This module owns the scheduler: it selects the acting agents, asks the
//! player-update rule for a decision, applies mutation and feeds the
//! statistics. Every random draw of a run happens in this file, in the order
//! documented on each step function.

use crate::base::{FitnessMap, SimRng};
use crate::errors::ConfigError;
use crate::evolution::{
    update::{argmax_lowest, best_of},
    Game, PlayerUpdate, PopulationUpdate,
};
use crate::geometry::Geometry;
use crate::simulation::configs::Configuration;
use crate::simulation::population::{Population, References, Trait};
use crate::simulation::statistics::{SpeciesReport, Statistics};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Lifecycle of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    /// Steps may still be taken.
    Running,
    /// Every species is fixed on one strategy, mutation is off and the
    /// update rule cannot leave the state.
    Absorbed,
    /// The generation limit was reached.
    LimitReached,
    /// A caller requested a stop.
    Stopped,
}

impl RunStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Running)
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Running => "running",
            Self::Absorbed => "absorbed",
            Self::LimitReached => "limit reached",
            Self::Stopped => "stopped",
        };
        write!(f, "{name}")
    }
}

/// Main simulation engine.
#[derive(Debug)]
pub struct Simulation {
    /// Resolved configuration (the seed is always set)
    config: Configuration,
    geometry: Geometry,
    population: Population,
    statistics: Statistics,
    rng: SimRng,
    /// Elementary steps taken so far
    steps: u64,
    status: RunStatus,
    steps_per_generation: u64,
    step_limit: u64,
    stop: Arc<AtomicBool>,
}

impl Simulation {
    /// Create a run from a configuration.
    ///
    /// The geometry is generated first, then the species are initialised in
    /// order, all from the one stream seeded by the configuration. Unset
    /// seeds are drawn here and written back into the stored configuration.
    pub fn new(config: Configuration) -> Result<Self, ConfigError> {
        let config = config.resolved();
        config.validate()?;
        let seed = config.execution.seed.unwrap_or_default();
        let mut rng = SimRng::new(seed);

        let geometry = Geometry::new(&config.geometry, &mut rng)?;
        let (min_degree, _, _) = geometry.degree_stats();
        if !geometry.is_well_mixed() && min_degree == 0 {
            tracing::warn!(
                "geometry {} has isolated nodes; their updates are no-ops",
                geometry.topology()
            );
        }

        let games = config.build_games()?;
        let population = Population::initialize(&config, games, &geometry, &mut rng)?;
        if config.dynamics.population_update.is_moran() {
            for species in population.species() {
                let (lo, hi) = species.score_range();
                config.dynamics.fitness.validate(lo, hi)?;
            }
        }

        let mut statistics = Statistics::new(&population, config.statistics.recording.clone());
        statistics.sample(0.0, &population);
        statistics.record(0, &population);

        let steps_per_generation = steps_per_generation(&config, &geometry);
        let step_limit = step_limit(config.execution.max_generations, steps_per_generation);

        tracing::info!(
            seed,
            size = geometry.size(),
            species = population.n_species(),
            topology = %geometry.topology(),
            "Simulation initialised"
        );

        Ok(Self {
            config,
            geometry,
            population,
            statistics,
            rng,
            steps: 0,
            status: RunStatus::Running,
            steps_per_generation,
            step_limit,
            stop: Arc::new(AtomicBool::new(false)),
        })
    }

    /// Reassemble a run from restored parts.
    pub(crate) fn from_parts(
        config: Configuration,
        geometry: Geometry,
        population: Population,
        statistics: Statistics,
        rng: SimRng,
        steps: u64,
        status: RunStatus,
    ) -> Self {
        let steps_per_generation = steps_per_generation(&config, &geometry);
        let step_limit = step_limit(config.execution.max_generations, steps_per_generation);
        Self {
            config,
            geometry,
            population,
            statistics,
            rng,
            steps,
            status,
            steps_per_generation,
            step_limit,
            stop: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Get the configuration.
    pub fn config(&self) -> &Configuration {
        &self.config
    }

    pub fn geometry(&self) -> &Geometry {
        &self.geometry
    }

    pub fn population(&self) -> &Population {
        &self.population
    }

    pub fn statistics(&self) -> &Statistics {
        &self.statistics
    }

    pub(crate) fn rng(&self) -> &SimRng {
        &self.rng
    }

    /// Seed the run was started from.
    pub fn seed(&self) -> u64 {
        self.config.execution.seed.unwrap_or_default()
    }

    pub fn steps(&self) -> u64 {
        self.steps
    }

    /// Elapsed time in generations.
    pub fn generation(&self) -> f64 {
        self.steps as f64 / self.steps_per_generation as f64
    }

    pub fn steps_per_generation(&self) -> u64 {
        self.steps_per_generation
    }

    pub fn step_limit(&self) -> u64 {
        self.step_limit
    }

    pub fn status(&self) -> RunStatus {
        self.status
    }

    /// Flag that stops [`Simulation::run`] before its next step.
    ///
    /// The flag is not cleared by the engine.
    pub fn stop_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.stop)
    }

    /// Move the generation limit, typically before resuming a run.
    pub fn set_max_generations(&mut self, max_generations: f64) -> Result<(), ConfigError> {
        if !max_generations.is_finite() || max_generations < 0.0 {
            return Err(ConfigError::InvalidParameter(format!(
                "generation limit must be finite and non-negative, got {max_generations}"
            )));
        }
        self.config.execution.max_generations = max_generations;
        self.step_limit = step_limit(max_generations, self.steps_per_generation);
        if matches!(self.status, RunStatus::LimitReached | RunStatus::Stopped) {
            self.status = RunStatus::Running;
        }
        Ok(())
    }

    /// Time up to which pending statistics are folded in reports.
    ///
    /// An absorbed population keeps its state until the nominal end of the
    /// run.
    pub fn end_time(&self) -> f64 {
        let now = self.generation();
        match self.status {
            RunStatus::Absorbed => now.max(self.config.execution.max_generations),
            _ => now,
        }
    }

    /// Per-species summaries at the current end time.
    pub fn report(&self) -> Vec<SpeciesReport> {
        self.statistics.report(&self.population, self.end_time())
    }

    /// Whether no further step can change the population.
    pub fn is_absorbed(&self) -> bool {
        self.population.is_absorbed(&self.geometry, &self.config.dynamics)
    }

    /// Why the run would stop now, if it would.
    fn termination(&self) -> Option<RunStatus> {
        if self.stop.load(Ordering::Relaxed) {
            return Some(RunStatus::Stopped);
        }
        if self.is_absorbed() {
            return Some(RunStatus::Absorbed);
        }
        if self.steps >= self.step_limit {
            return Some(RunStatus::LimitReached);
        }
        None
    }

    /// Run until absorption, the generation limit or a stop request.
    pub fn run(&mut self) -> RunStatus {
        self.run_with(|_| {})
    }

    /// Like [`Simulation::run`], calling `observer` at every integral
    /// generation.
    pub fn run_with<F>(&mut self, mut observer: F) -> RunStatus
    where
        F: FnMut(&Simulation),
    {
        tracing::info!(
            generation = self.generation(),
            limit = self.config.execution.max_generations,
            update = %self.config.dynamics.population_update,
            rule = %self.config.dynamics.player_update,
            "Starting run"
        );
        loop {
            if let Some(status) = self.termination() {
                self.status = status;
                break;
            }
            self.step();
            if self.steps.is_multiple_of(self.steps_per_generation) {
                observer(self);
            }
        }
        if self.status == RunStatus::Absorbed {
            tracing::debug!(
                generation = self.generation(),
                fixed = ?self
                    .population
                    .species()
                    .iter()
                    .map(|s| s.monomorphic_strategy())
                    .collect::<Vec<_>>(),
                "Population absorbed"
            );
        }
        tracing::info!(
            status = %self.status,
            steps = self.steps,
            generation = self.generation(),
            "Run finished"
        );
        self.status
    }

    /// Take one elementary step and sample the statistics.
    ///
    /// One step is one focal update (asynchronous), one birth-death or
    /// death-birth event (Moran) or a full sweep (synchronous).
    pub fn step(&mut self) {
        match self.config.dynamics.population_update {
            PopulationUpdate::Asynchronous => self.asynchronous_step(),
            PopulationUpdate::Synchronous => self.synchronous_step(),
            PopulationUpdate::MoranBirthDeath => self.birth_death_step(),
            PopulationUpdate::MoranDeathBirth => self.death_birth_step(),
        }
        self.steps += 1;
        self.statistics.sample(self.generation(), &self.population);
        if self.steps.is_multiple_of(self.steps_per_generation) {
            self.statistics
                .record(self.steps / self.steps_per_generation, &self.population);
        }
    }

    /// Species draw (only with several species), focal draw, then the
    /// decision.
    fn pick_species(&mut self) -> usize {
        let n = self.population.n_species();
        if n > 1 {
            self.rng.random0n(n)
        } else {
            0
        }
    }

    /// Draws: species, focal, mutation trigger, kernel or rule.
    fn asynchronous_step(&mut self) {
        let sp = self.pick_species();
        let focal = self.rng.random0n(self.population.size());
        let rule = self.config.dynamics.player_update;
        if let Some(value) = decide(
            &self.population,
            &self.geometry,
            rule,
            sp,
            focal,
            &mut self.rng,
        ) {
            self.population.set_trait(&self.geometry, sp, focal, value);
        }
    }

    /// Every agent of every species decides against the previous state, in
    /// species then node order; all changes are applied together.
    fn synchronous_step(&mut self) {
        let previous = self.population.clone();
        let rule = self.config.dynamics.player_update;
        let mut changes = Vec::new();
        for sp in 0..previous.n_species() {
            for node in 0..previous.size() {
                if let Some(value) = decide(&previous, &self.geometry, rule, sp, node, &mut self.rng) {
                    changes.push((sp, node, value));
                }
            }
        }
        let mut changed = false;
        for (sp, node, value) in changes {
            changed |= self.population.assign_unscored(sp, node, value);
        }
        if changed {
            self.population.rescore_all(&self.geometry);
        }
    }

    /// Draws: species, fitness-proportional parent, neighbour to replace,
    /// mutation trigger, kernel.
    fn birth_death_step(&mut self) {
        let sp = self.pick_species();
        let map = self.config.dynamics.fitness;
        let species = &self.population.species()[sp];
        let candidates = (0..species.size()).map(|j| (j, fitness(map, species.score(j))));
        let Some(parent) = roulette(&mut self.rng, candidates) else {
            return;
        };
        let references = References::of(&self.geometry, parent);
        if references.is_empty() {
            return;
        }
        let target = references.get(self.rng.random0n(references.len()));
        let offspring = inherit(&self.population, sp, parent, &mut self.rng);
        self.population.set_trait(&self.geometry, sp, target, offspring);
    }

    /// Draws: species, node to replace, fitness-proportional parent among
    /// its neighbours, mutation trigger, kernel.
    fn death_birth_step(&mut self) {
        let sp = self.pick_species();
        let dead = self.rng.random0n(self.population.size());
        let map = self.config.dynamics.fitness;
        let species = &self.population.species()[sp];
        let references = References::of(&self.geometry, dead);
        let candidates = references
            .iter()
            .map(|j| (j, fitness(map, species.score(j))));
        let Some(parent) = roulette(&mut self.rng, candidates) else {
            return;
        };
        let offspring = inherit(&self.population, sp, parent, &mut self.rng);
        self.population.set_trait(&self.geometry, sp, dead, offspring);
    }
}

fn steps_per_generation(config: &Configuration, geometry: &Geometry) -> u64 {
    match config.dynamics.population_update {
        PopulationUpdate::Synchronous => 1,
        _ => (geometry.size() * config.species.len()).max(1) as u64,
    }
}

fn step_limit(max_generations: f64, steps_per_generation: u64) -> u64 {
    (max_generations * steps_per_generation as f64).ceil() as u64
}

#[inline]
fn fitness(map: FitnessMap, score: f64) -> f64 {
    map.map(score).max(0.0)
}

/// Parent trait, mutated if the trigger fires.
fn inherit(population: &Population, sp: usize, parent: usize, rng: &mut SimRng) -> Trait {
    let species = &population.species()[sp];
    let value = species.trait_at(parent);
    if species.mutation().triggers(rng) {
        species.mutate(value, rng)
    } else {
        value
    }
}

/// Fitness-proportional choice: one uniform draw scanned over the
/// cumulative weights, or a uniform index when every weight is zero.
fn roulette<I>(rng: &mut SimRng, candidates: I) -> Option<usize>
where
    I: Iterator<Item = (usize, f64)> + Clone,
{
    let mut total = 0.0;
    let mut count = 0;
    let mut last = None;
    for (j, w) in candidates.clone() {
        total += w;
        count += 1;
        last = Some(j);
    }
    let last = last?;
    if total <= 0.0 || !total.is_finite() {
        let pick = rng.random0n(count);
        return candidates.map(|(j, _)| j).nth(pick);
    }
    let mut target = rng.random01() * total;
    for (j, w) in candidates {
        target -= w;
        if target < 0.0 {
            return Some(j);
        }
    }
    Some(last)
}

/// New trait of `focal` in species `sp`, judged against `view`.
///
/// The mutation trigger is checked first; a triggered mutation replaces the
/// decision. `None` means the agent keeps its trait without considering an
/// alternative (empty reference set, rejected adoption).
fn decide(
    view: &Population,
    geometry: &Geometry,
    rule: PlayerUpdate,
    sp: usize,
    focal: usize,
    rng: &mut SimRng,
) -> Option<Trait> {
    let species = &view.species()[sp];
    let current = species.trait_at(focal);
    if species.mutation().triggers(rng) {
        return Some(species.mutate(current, rng));
    }
    let references = References::of(geometry, focal);
    if references.is_empty() {
        return None;
    }
    let focal_score = species.score(focal);
    match rule {
        PlayerUpdate::Thermal { .. } | PlayerUpdate::Imitate | PlayerUpdate::ImitateBetter => {
            let reference = references.get(rng.random0n(references.len()));
            let reference_score = species.score(reference);
            let adopt = if rule.draws_decision() {
                let (lo, hi) = species.score_range();
                rng.random01() < rule.adoption_probability(focal_score, reference_score, hi - lo)
            } else {
                reference_score > focal_score
            };
            adopt.then(|| species.trait_at(reference))
        }
        PlayerUpdate::Best => {
            let scores = references.iter().map(|j| (j, species.score(j)));
            best_of(focal_score, scores).map(|j| species.trait_at(j))
        }
        PlayerUpdate::BestResponse => {
            let Game::Discrete(game) = species.game() else {
                return None;
            };
            let mut counts = vec![0; game.n_opponent_traits()];
            view.group_counts(geometry, sp, focal, &mut counts);
            let mut payoffs = vec![0.0; game.n_traits()];
            game.payoffs(&counts, &mut payoffs);
            Some(Trait::Discrete(argmax_lowest(&payoffs)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evolution::{GameConfig, Mutation, MutationKernel};
    use crate::geometry::GeometryConfig;
    use crate::simulation::configs::{
        DynamicsConfig, ExecutionConfig, InitConfig, SpeciesConfig, StatisticsConfig,
    };

    fn config(population_update: PopulationUpdate, player_update: PlayerUpdate) -> Configuration {
        Configuration {
            execution: ExecutionConfig {
                seed: Some(42),
                max_generations: 20.0,
            },
            geometry: GeometryConfig::well_mixed(50),
            dynamics: DynamicsConfig {
                population_update,
                player_update,
                ..DynamicsConfig::default()
            },
            species: vec![SpeciesConfig::new(
                "players",
                GameConfig::Snowdrift {
                    benefit: 1.0,
                    cost: 0.6,
                },
                InitConfig::Frequencies {
                    frequencies: vec![0.5, 0.5],
                },
            )],
            statistics: StatisticsConfig::default(),
        }
    }

    #[test]
    fn test_roulette_uniform_fallback() {
        let mut rng = SimRng::new(3);
        let mut hits = [0usize; 3];
        for _ in 0..3000 {
            let pick = roulette(&mut rng, [(0, 0.0), (1, 0.0), (2, 0.0)].into_iter()).unwrap();
            hits[pick] += 1;
        }
        assert!(hits.iter().all(|&h| h > 800));
        assert_eq!(roulette(&mut rng, std::iter::empty()), None);
    }

    #[test]
    fn test_roulette_respects_weights() {
        let mut rng = SimRng::new(4);
        for _ in 0..100 {
            assert_eq!(roulette(&mut rng, [(5, 0.0), (9, 2.0)].into_iter()), Some(9));
        }
    }

    #[test]
    fn test_time_accounting() {
        let mut sim = Simulation::new(config(
            PopulationUpdate::Asynchronous,
            PlayerUpdate::default(),
        ))
        .unwrap();
        assert_eq!(sim.steps_per_generation(), 50);
        assert_eq!(sim.step_limit(), 1000);
        for _ in 0..25 {
            sim.step();
        }
        assert_eq!(sim.generation(), 0.5);

        let sync = Simulation::new(config(PopulationUpdate::Synchronous, PlayerUpdate::default()))
            .unwrap();
        assert_eq!(sync.steps_per_generation(), 1);
        assert_eq!(sync.step_limit(), 20);
    }

    #[test]
    fn test_run_reaches_limit_or_absorbs() {
        for update in [
            PopulationUpdate::Asynchronous,
            PopulationUpdate::Synchronous,
            PopulationUpdate::MoranBirthDeath,
            PopulationUpdate::MoranDeathBirth,
        ] {
            let mut sim = Simulation::new(config(update, PlayerUpdate::Imitate)).unwrap();
            let status = sim.run();
            assert!(status.is_terminal());
            match status {
                RunStatus::LimitReached => assert_eq!(sim.steps(), sim.step_limit()),
                RunStatus::Absorbed => assert!(sim.is_absorbed()),
                other => panic!("unexpected status {other}"),
            }
            let total: usize = sim.population().species()[0].counts().iter().sum();
            assert_eq!(total, 50);
        }
    }

    #[test]
    fn test_best_response_on_snowdrift_is_deterministic() {
        let mut a = Simulation::new(config(
            PopulationUpdate::Synchronous,
            PlayerUpdate::BestResponse,
        ))
        .unwrap();
        let mut b = Simulation::new(config(
            PopulationUpdate::Synchronous,
            PlayerUpdate::BestResponse,
        ))
        .unwrap();
        a.run();
        b.run();
        assert_eq!(
            a.population().species()[0].traits(),
            b.population().species()[0].traits()
        );
    }

    #[test]
    fn test_stop_flag() {
        let mut sim = Simulation::new(config(
            PopulationUpdate::Asynchronous,
            PlayerUpdate::default(),
        ))
        .unwrap();
        sim.stop_handle().store(true, Ordering::Relaxed);
        assert_eq!(sim.run(), RunStatus::Stopped);
        assert_eq!(sim.steps(), 0);
    }

    #[test]
    fn test_absorbed_from_start() {
        let mut cfg = config(PopulationUpdate::Asynchronous, PlayerUpdate::default());
        cfg.species[0].init = InitConfig::Monomorphic { strategy: 1 };
        let mut sim = Simulation::new(cfg).unwrap();
        assert_eq!(sim.run(), RunStatus::Absorbed);
        assert_eq!(sim.steps(), 0);
        assert_eq!(sim.end_time(), 20.0);
        let report = sim.report();
        assert_eq!(report[0].fixed, Some(1));
        assert_eq!(report[0].traits.mean, vec![0.0, 1.0]);
        assert_eq!(report[0].traits.weight, 20.0);
    }

    #[test]
    fn test_mutation_prevents_absorption() {
        let mut cfg = config(PopulationUpdate::Asynchronous, PlayerUpdate::ImitateBetter);
        cfg.species[0].init = InitConfig::Monomorphic { strategy: 0 };
        cfg.species[0].mutation = Mutation::new(0.01, MutationKernel::Uniform).unwrap();
        cfg.execution.max_generations = 2.0;
        let mut sim = Simulation::new(cfg).unwrap();
        assert_eq!(sim.run(), RunStatus::LimitReached);
    }

    #[test]
    fn test_isolated_node_still_advances_time() {
        let mut cfg = config(PopulationUpdate::Asynchronous, PlayerUpdate::default());
        cfg.geometry = GeometryConfig::well_mixed(1);
        cfg.species[0].game = GameConfig::ContinuousSnowdrift {
            benefit: [6.0, -1.4],
            cost: [4.56, -1.6],
            min: 0.0,
            max: 1.0,
        };
        cfg.species[0].init = InitConfig::Trait { value: 0.3 };
        cfg.execution.max_generations = 3.0;
        let mut sim = Simulation::new(cfg).unwrap();
        assert_eq!(sim.run(), RunStatus::LimitReached);
        assert_eq!(sim.generation(), 3.0);
        assert_eq!(sim.population().species()[0].trait_at(0), Trait::Continuous(0.3));
        assert_eq!(sim.population().species()[0].score(0), 0.0);
    }

    #[test]
    fn test_resume_extends_limit() {
        let mut sim = Simulation::new(config(
            PopulationUpdate::Asynchronous,
            PlayerUpdate::Thermal { noise: 1.0 },
        ))
        .unwrap();
        sim.set_max_generations(1.0).unwrap();
        assert_eq!(sim.run(), RunStatus::LimitReached);
        assert_eq!(sim.steps(), 50);
        sim.set_max_generations(2.0).unwrap();
        assert_eq!(sim.status(), RunStatus::Running);
        sim.run();
        assert!(sim.steps() == 100 || sim.status() == RunStatus::Absorbed);
        assert!(sim.set_max_generations(f64::NAN).is_err());
    }
}
