//! Population state and payoff bookkeeping.
//!
//! A [`Population`] holds one or more [`Species`] on the nodes of a shared
//! [`Geometry`]. Each species stores a trait per node, strategy counts (for
//! discrete traits) and a cached score per node.
//!
//! Scores follow the interaction groups:
//! - a species playing against itself interacts with its neighbours, the
//!   focal node excluded (everybody else in a well-mixed population);
//! - a species playing against another species interacts with the opponent
//!   on the same node and with the opponents on its neighbours (the whole
//!   opponent population when well-mixed).
//!
//! After a change at node `i` only the scores that depend on it are
//! recomputed: `i` itself and the nodes that have `i` in their group
//! (`i`'s in-neighbours). Well-mixed discrete species are rescored from a
//! per-strategy table; well-mixed continuous species are shifted by the
//! payoff difference of the changed interaction.

use crate::base::{PayoffAccounting, SimRng};
use crate::errors::ConfigError;
use crate::evolution::{update::argmax_lowest, Game, Mutation, PlayerUpdate};
use crate::geometry::Geometry;
use crate::simulation::configs::{Configuration, DynamicsConfig, InitConfig};
use std::cmp::Ordering;
use std::sync::Arc;

/// Value held by one agent.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Trait {
    Discrete(usize),
    Continuous(f64),
}

/// Per-node values of one species.
#[derive(Debug, Clone, PartialEq)]
pub enum Traits {
    Discrete(Vec<usize>),
    Continuous(Vec<f64>),
}

impl Traits {
    pub fn len(&self) -> usize {
        match self {
            Self::Discrete(v) => v.len(),
            Self::Continuous(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// One species: game, mutation and per-node state.
#[derive(Debug, Clone)]
pub struct Species {
    name: String,
    game: Game,
    mutation: Mutation,
    opponent: usize,
    traits: Traits,
    counts: Vec<usize>,
    scores: Vec<f64>,
    score_range: (f64, f64),
}

impl Species {
    /// Assemble a species from stored state. Counts are derived from the
    /// traits; scores are taken as given.
    pub(crate) fn from_state(
        name: String,
        game: Game,
        mutation: Mutation,
        opponent: usize,
        traits: Traits,
        scores: Vec<f64>,
    ) -> Self {
        let counts = tally(&game, &traits);
        Self {
            name,
            game,
            mutation,
            opponent,
            traits,
            counts,
            scores,
            score_range: (0.0, 0.0),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn game(&self) -> &Game {
        &self.game
    }

    pub fn mutation(&self) -> &Mutation {
        &self.mutation
    }

    /// Index of the species this one interacts with.
    pub fn opponent(&self) -> usize {
        self.opponent
    }

    pub fn traits(&self) -> &Traits {
        &self.traits
    }

    /// Agents per strategy; empty for continuous traits.
    pub fn counts(&self) -> &[usize] {
        &self.counts
    }

    pub fn scores(&self) -> &[f64] {
        &self.scores
    }

    #[inline]
    pub fn score(&self, node: usize) -> f64 {
        self.scores[node]
    }

    pub fn size(&self) -> usize {
        self.traits.len()
    }

    pub fn is_discrete(&self) -> bool {
        self.game.is_discrete()
    }

    /// Attainable score interval under the population's accounting.
    pub fn score_range(&self) -> (f64, f64) {
        self.score_range
    }

    #[inline]
    pub fn trait_at(&self, node: usize) -> Trait {
        match &self.traits {
            Traits::Discrete(v) => Trait::Discrete(v[node]),
            Traits::Continuous(v) => Trait::Continuous(v[node]),
        }
    }

    /// The strategy every agent plays, if the species is monomorphic.
    pub fn monomorphic_strategy(&self) -> Option<usize> {
        let size = self.size();
        self.counts.iter().position(|&c| c == size && size > 0)
    }

    /// Single-interaction payoff of the monomorphic state, for species that
    /// play against themselves.
    pub fn monomorphic_payoff(&self) -> Option<f64> {
        if let Game::Discrete(g) = &self.game {
            return self.monomorphic_strategy().map(|s| g.monomorphic_payoff(s));
        }
        None
    }

    /// Number of entries in the trait observable.
    pub fn observable_dim(&self) -> usize {
        match &self.traits {
            Traits::Discrete(_) => self.counts.len(),
            Traits::Continuous(_) => 1,
        }
    }

    /// Strategy frequencies (discrete) or mean trait (continuous).
    pub fn observables(&self, out: &mut Vec<f64>) {
        out.clear();
        let n = self.size() as f64;
        match &self.traits {
            Traits::Discrete(_) => out.extend(self.counts.iter().map(|&c| c as f64 / n)),
            Traits::Continuous(v) => out.push(v.iter().sum::<f64>() / n),
        }
    }

    /// Mean score, summed in node order.
    pub fn mean_score(&self) -> f64 {
        self.scores.iter().sum::<f64>() / self.size() as f64
    }

    /// Apply the mutation kernel to `current`.
    pub fn mutate(&self, current: Trait, rng: &mut SimRng) -> Trait {
        match (current, &self.game) {
            (Trait::Discrete(s), Game::Discrete(g)) => {
                Trait::Discrete(self.mutation.mutate_discrete(s, g.n_traits(), rng))
            }
            (Trait::Continuous(x), Game::Continuous(g)) => {
                Trait::Continuous(self.mutation.mutate_continuous(x, g.bounds(), rng))
            }
            (other, _) => other,
        }
    }

    /// Store `value` at `node` and keep counts in step. Scores are not
    /// touched.
    fn assign(&mut self, node: usize, value: Trait) {
        match (&mut self.traits, value) {
            (Traits::Discrete(v), Trait::Discrete(s)) => {
                self.counts[v[node]] -= 1;
                self.counts[s] += 1;
                v[node] = s;
            }
            (Traits::Continuous(v), Trait::Continuous(x)) => v[node] = x,
            _ => debug_assert!(false, "trait kind mismatch"),
        }
    }
}

fn tally(game: &Game, traits: &Traits) -> Vec<usize> {
    match (game, traits) {
        (Game::Discrete(g), Traits::Discrete(v)) => {
            let mut counts = vec![0; g.n_traits()];
            for &s in v {
                counts[s] += 1;
            }
            counts
        }
        _ => Vec::new(),
    }
}

/// Reference set of a focal node.
#[derive(Debug, Clone, Copy)]
pub(crate) enum References<'a> {
    /// Every node but the focal one.
    All { size: usize, focal: usize },
    Listed(&'a [usize]),
}

impl<'a> References<'a> {
    pub(crate) fn of(geometry: &'a Geometry, focal: usize) -> Self {
        if geometry.is_well_mixed() {
            Self::All {
                size: geometry.size(),
                focal,
            }
        } else {
            Self::Listed(geometry.out_neighbors(focal))
        }
    }

    pub(crate) fn len(&self) -> usize {
        match *self {
            Self::All { size, .. } => size.saturating_sub(1),
            Self::Listed(list) => list.len(),
        }
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The `k`-th reference, `k < len()`.
    #[inline]
    pub(crate) fn get(&self, k: usize) -> usize {
        match *self {
            Self::All { focal, .. } => {
                if k >= focal {
                    k + 1
                } else {
                    k
                }
            }
            Self::Listed(list) => list[k],
        }
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = usize> + Clone + '_ {
        (0..self.len()).map(move |k| self.get(k))
    }
}

/// All species of a run.
#[derive(Debug, Clone)]
pub struct Population {
    species: Vec<Species>,
    accounting: PayoffAccounting,
    size: usize,
}

impl Population {
    /// Create the initial population, drawing initial traits species by
    /// species, and score it.
    pub fn initialize(
        config: &Configuration,
        games: Vec<Game>,
        geometry: &Geometry,
        rng: &mut SimRng,
    ) -> Result<Self, ConfigError> {
        let size = geometry.size();
        let mut species = Vec::with_capacity(games.len());
        for (index, (sc, game)) in config.species.iter().zip(games).enumerate() {
            let traits = initial_traits(&sc.init, &game, size, rng)?;
            species.push(Species::from_state(
                sc.name.clone(),
                game,
                sc.mutation,
                config.opponent_of(index),
                traits,
                vec![0.0; size],
            ));
        }
        let mut population = Self::from_species(species, config.dynamics.accounting, geometry);
        population.rescore_all(geometry);
        Ok(population)
    }

    /// Assemble from species whose scores are already valid.
    pub(crate) fn from_species(
        species: Vec<Species>,
        accounting: PayoffAccounting,
        geometry: &Geometry,
    ) -> Self {
        let mut population = Self {
            species,
            accounting,
            size: geometry.size(),
        };
        population.update_score_ranges(geometry);
        population
    }

    pub fn species(&self) -> &[Species] {
        &self.species
    }

    pub fn n_species(&self) -> usize {
        self.species.len()
    }

    /// Nodes per species.
    pub fn size(&self) -> usize {
        self.size
    }

    pub fn accounting(&self) -> PayoffAccounting {
        self.accounting
    }

    /// Total number of agents over all species.
    pub fn total_agents(&self) -> usize {
        self.species.iter().map(Species::size).sum()
    }

    /// True when every species is discrete, monomorphic and free of
    /// mutation, and the update rule cannot introduce a new strategy.
    /// Continuous traits never absorb.
    ///
    /// Imitation and Moran reproduction only copy strategies present in the
    /// population. Best response can switch to an absent strategy, so under
    /// it every agent must already play its best reply.
    pub fn is_absorbed(&self, geometry: &Geometry, dynamics: &DynamicsConfig) -> bool {
        let best_response = !dynamics.population_update.is_moran()
            && matches!(dynamics.player_update, PlayerUpdate::BestResponse);
        (0..self.species.len()).all(|sp| {
            let s = &self.species[sp];
            let Some(strategy) = s.monomorphic_strategy() else {
                return false;
            };
            s.is_discrete()
                && !s.mutation.is_active()
                && (!best_response || self.plays_best_response(geometry, sp, strategy))
        })
    }

    /// Whether every agent of species `sp` that has references would keep
    /// `strategy` under best response.
    fn plays_best_response(&self, geometry: &Geometry, sp: usize, strategy: usize) -> bool {
        let Game::Discrete(game) = &self.species[sp].game else {
            return false;
        };
        let mut counts = vec![0; game.n_opponent_traits()];
        let mut payoffs = vec![0.0; game.n_traits()];
        (0..self.size).all(|node| {
            if References::of(geometry, node).is_empty() {
                return true;
            }
            self.group_counts(geometry, sp, node, &mut counts);
            game.payoffs(&counts, &mut payoffs);
            argmax_lowest(&payoffs) == strategy
        })
    }

    /// Number of group members of `node` in species `sp`.
    pub fn group_size(&self, geometry: &Geometry, sp: usize, node: usize) -> usize {
        let intra = self.species[sp].opponent == sp;
        let neighbors = if geometry.is_well_mixed() {
            self.size - 1
        } else {
            geometry.out_neighbors(node).len()
        };
        if intra {
            neighbors
        } else if geometry.is_well_mixed() {
            self.size
        } else {
            neighbors + 1
        }
    }

    /// Count the opponent strategies in the group of `node`. Returns the
    /// group size.
    pub fn group_counts(
        &self,
        geometry: &Geometry,
        sp: usize,
        node: usize,
        counts: &mut [usize],
    ) -> usize {
        let species = &self.species[sp];
        let intra = species.opponent == sp;
        let opponent = &self.species[species.opponent];
        let Traits::Discrete(other) = &opponent.traits else {
            return 0;
        };
        if geometry.is_well_mixed() {
            counts.copy_from_slice(&opponent.counts);
            if intra {
                counts[other[node]] -= 1;
                return self.size - 1;
            }
            return self.size;
        }
        counts.iter_mut().for_each(|c| *c = 0);
        let mut n = 0;
        if !intra {
            counts[other[node]] += 1;
            n += 1;
        }
        for &j in geometry.out_neighbors(node) {
            counts[other[j]] += 1;
            n += 1;
        }
        n
    }

    #[inline]
    fn account(&self, total: f64, members: usize) -> f64 {
        match self.accounting {
            PayoffAccounting::Average if members > 0 => total / members as f64,
            PayoffAccounting::Average => 0.0,
            PayoffAccounting::Accumulated => total,
        }
    }

    /// Score of `node` in species `sp`, computed from scratch.
    pub fn compute_score(&self, geometry: &Geometry, sp: usize, node: usize) -> f64 {
        let species = &self.species[sp];
        let intra = species.opponent == sp;
        let opponent = &self.species[species.opponent];
        match (&species.game, &species.traits, &opponent.traits) {
            (Game::Discrete(g), Traits::Discrete(own), Traits::Discrete(_)) => {
                let mut counts = vec![0; g.n_opponent_traits()];
                let n = self.group_counts(geometry, sp, node, &mut counts);
                self.account(g.payoff(own[node], &counts), n)
            }
            (Game::Continuous(g), Traits::Continuous(own), Traits::Continuous(other)) => {
                let x = own[node];
                let mut total = 0.0;
                let mut n = 0;
                if geometry.is_well_mixed() {
                    for (j, &y) in other.iter().enumerate() {
                        if intra && j == node {
                            continue;
                        }
                        total += g.payoff(x, y);
                        n += 1;
                    }
                } else {
                    if !intra {
                        total += g.payoff(x, other[node]);
                        n += 1;
                    }
                    for &j in geometry.out_neighbors(node) {
                        total += g.payoff(x, other[j]);
                        n += 1;
                    }
                }
                self.account(total, n)
            }
            // Mixed trait kinds are rejected by configuration validation.
            _ => 0.0,
        }
    }

    /// Recompute every score from scratch.
    pub fn rescore_all(&mut self, geometry: &Geometry) {
        for sp in 0..self.species.len() {
            if geometry.is_well_mixed() && self.species[sp].is_discrete() {
                self.refresh_well_mixed(sp);
                continue;
            }
            let scores: Vec<f64> = (0..self.size)
                .map(|node| self.compute_score(geometry, sp, node))
                .collect();
            self.species[sp].scores = scores;
        }
    }

    /// Set the trait of `node` in species `sp` and update the affected
    /// scores. Returns whether anything changed.
    pub fn set_trait(&mut self, geometry: &Geometry, sp: usize, node: usize, value: Trait) -> bool {
        let old = self.species[sp].trait_at(node);
        if old == value {
            return false;
        }
        self.species[sp].assign(node, value);
        self.rescore_after(geometry, sp, node, old);
        true
    }

    /// Set traits without rescoring; callers finish with
    /// [`Population::rescore_all`].
    pub(crate) fn assign_unscored(&mut self, sp: usize, node: usize, value: Trait) -> bool {
        if self.species[sp].trait_at(node) == value {
            return false;
        }
        self.species[sp].assign(node, value);
        true
    }

    fn rescore_after(&mut self, geometry: &Geometry, changed: usize, node: usize, old: Trait) {
        for sp in 0..self.species.len() {
            let watches = self.species[sp].opponent == changed;
            if !watches && sp != changed {
                continue;
            }
            if geometry.is_well_mixed() {
                if self.species[sp].is_discrete() {
                    self.refresh_well_mixed(sp);
                    continue;
                }
                if watches {
                    self.shift_continuous(sp, changed, node, old);
                }
                if sp == changed {
                    let score = self.compute_score(geometry, sp, node);
                    self.species[sp].scores[node] = score;
                }
                continue;
            }
            let score = self.compute_score(geometry, sp, node);
            self.species[sp].scores[node] = score;
            if watches {
                for &j in geometry.in_neighbors(node) {
                    let score = self.compute_score(geometry, sp, j);
                    self.species[sp].scores[j] = score;
                }
            }
        }
    }

    /// Rescore a well-mixed discrete species from a per-strategy table.
    fn refresh_well_mixed(&mut self, sp: usize) {
        let species = &self.species[sp];
        let Game::Discrete(game) = &species.game else {
            return;
        };
        let intra = species.opponent == sp;
        let opponent_counts = &self.species[species.opponent].counts;
        let members = if intra { self.size - 1 } else { self.size };
        let mut group = opponent_counts.clone();
        let table: Vec<f64> = (0..game.n_traits())
            .map(|s| {
                if intra {
                    if species.counts[s] == 0 {
                        return 0.0;
                    }
                    group.copy_from_slice(opponent_counts);
                    group[s] -= 1;
                }
                self.account(game.payoff(s, &group), members)
            })
            .collect();
        let Traits::Discrete(own) = &species.traits else {
            return;
        };
        let scores: Vec<f64> = own.iter().map(|&s| table[s]).collect();
        self.species[sp].scores = scores;
    }

    /// Shift the scores of well-mixed continuous species `sp` after the
    /// opponent at `node` of species `changed` moved away from `old`.
    fn shift_continuous(&mut self, sp: usize, changed: usize, node: usize, old: Trait) {
        let (Trait::Continuous(old_x), Trait::Continuous(new_x)) =
            (old, self.species[changed].trait_at(node))
        else {
            return;
        };
        let Game::Continuous(game) = &self.species[sp].game else {
            return;
        };
        let game = Arc::clone(game);
        let intra = sp == changed;
        let members = if intra { self.size - 1 } else { self.size };
        let accounting = self.accounting;
        let Species { traits, scores, .. } = &mut self.species[sp];
        let Traits::Continuous(own) = traits else {
            return;
        };
        for (j, (score, &y)) in scores.iter_mut().zip(own.iter()).enumerate() {
            if intra && j == node {
                continue;
            }
            let delta = game.payoff(y, new_x) - game.payoff(y, old_x);
            *score += match accounting {
                PayoffAccounting::Average => delta / members as f64,
                PayoffAccounting::Accumulated => delta,
            };
        }
    }

    /// Attainable score interval per species, from the single-interaction
    /// payoff bounds and the group sizes of the geometry.
    fn update_score_ranges(&mut self, geometry: &Geometry) {
        for sp in 0..self.species.len() {
            let (lo, hi) = (
                self.species[sp].game.min_payoff(),
                self.species[sp].game.max_payoff(),
            );
            let range = match self.accounting {
                PayoffAccounting::Average => (lo, hi),
                PayoffAccounting::Accumulated => {
                    let (gmin, gmax) = (0..self.size)
                        .map(|node| self.group_size(geometry, sp, node))
                        .fold((usize::MAX, 0), |(a, b), g| (a.min(g), b.max(g)));
                    let (gmin, gmax) = (gmin as f64, gmax as f64);
                    ((lo * gmin).min(lo * gmax), (hi * gmin).max(hi * gmax))
                }
            };
            self.species[sp].score_range = range;
        }
    }
}

fn initial_traits(
    init: &InitConfig,
    game: &Game,
    size: usize,
    rng: &mut SimRng,
) -> Result<Traits, ConfigError> {
    let traits = match (init, game) {
        (InitConfig::Frequencies { frequencies }, Game::Discrete(_)) => {
            let counts = apportion(frequencies, size);
            let mut strategies: Vec<usize> = counts
                .iter()
                .enumerate()
                .flat_map(|(s, &c)| std::iter::repeat(s).take(c))
                .collect();
            for i in (1..size).rev() {
                let j = rng.random0n(i + 1);
                strategies.swap(i, j);
            }
            Traits::Discrete(strategies)
        }
        (InitConfig::Random, Game::Discrete(g)) => {
            Traits::Discrete((0..size).map(|_| rng.random0n(g.n_traits())).collect())
        }
        (InitConfig::Random, Game::Continuous(g)) => {
            let (lo, hi) = g.bounds();
            Traits::Continuous((0..size).map(|_| lo + rng.random01() * (hi - lo)).collect())
        }
        (InitConfig::Monomorphic { strategy }, Game::Discrete(_)) => {
            Traits::Discrete(vec![*strategy; size])
        }
        (InitConfig::Mutant { resident, mutant }, Game::Discrete(_)) => {
            let mut strategies = vec![*resident; size];
            strategies[rng.random0n(size)] = *mutant;
            Traits::Discrete(strategies)
        }
        (InitConfig::Trait { value }, Game::Continuous(_)) => Traits::Continuous(vec![*value; size]),
        (InitConfig::TraitMutant { resident, mutant }, Game::Continuous(_)) => {
            let mut values = vec![*resident; size];
            values[rng.random0n(size)] = *mutant;
            Traits::Continuous(values)
        }
        _ => {
            return Err(ConfigError::Incompatible(format!(
                "initialization does not fit {} traits",
                game.trait_kind()
            )))
        }
    };
    Ok(traits)
}

/// Integer counts summing to `total` from relative weights, by largest
/// remainder with ties to the lower index.
fn apportion(weights: &[f64], total: usize) -> Vec<usize> {
    let sum: f64 = weights.iter().sum();
    let exact: Vec<f64> = weights.iter().map(|w| w / sum * total as f64).collect();
    let mut counts: Vec<usize> = exact.iter().map(|e| e.floor() as usize).collect();
    let assigned: usize = counts.iter().sum();
    let mut order: Vec<usize> = (0..weights.len()).collect();
    order.sort_by(|&a, &b| {
        let ra = exact[a] - exact[a].floor();
        let rb = exact[b] - exact[b].floor();
        rb.partial_cmp(&ra).unwrap_or(Ordering::Equal).then(a.cmp(&b))
    });
    for &i in order.iter().cycle().take(total.saturating_sub(assigned)) {
        counts[i] += 1;
    }
    counts
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evolution::{DiscreteGame, GameConfig, MatrixGame};
    use crate::geometry::{GeometryConfig, GeometryType, Neighborhood};
    use crate::simulation::configs::{
        DynamicsConfig, ExecutionConfig, SpeciesConfig, StatisticsConfig,
    };
    use approx::assert_relative_eq;

    fn config(geometry: GeometryConfig, species: Vec<SpeciesConfig>) -> Configuration {
        Configuration {
            execution: ExecutionConfig {
                seed: Some(1),
                max_generations: 1.0,
            },
            geometry,
            dynamics: DynamicsConfig::default(),
            species,
            statistics: StatisticsConfig::default(),
        }
    }

    fn build(config: &Configuration) -> (Geometry, Population) {
        let mut rng = SimRng::new(config.execution.seed.unwrap_or(0));
        let geometry = Geometry::new(&config.geometry, &mut rng).unwrap();
        let games = config.build_games().unwrap();
        let population = Population::initialize(config, games, &geometry, &mut rng).unwrap();
        (geometry, population)
    }

    fn assert_scores_fresh(geometry: &Geometry, population: &Population) {
        for sp in 0..population.n_species() {
            for node in 0..population.size() {
                assert_relative_eq!(
                    population.species()[sp].score(node),
                    population.compute_score(geometry, sp, node),
                    epsilon = 1e-12
                );
            }
        }
    }

    #[test]
    fn test_apportion() {
        assert_eq!(apportion(&[0.5, 0.5], 1000), vec![500, 500]);
        assert_eq!(apportion(&[1.0, 1.0, 1.0], 10), vec![4, 3, 3]);
        assert_eq!(apportion(&[0.0, 2.0], 7), vec![0, 7]);
        assert_eq!(apportion(&[0.15, 0.85], 10).iter().sum::<usize>(), 10);
    }

    #[test]
    fn test_frequencies_give_exact_counts() {
        let cfg = config(
            GeometryConfig::well_mixed(1000),
            vec![SpeciesConfig::new(
                "a",
                GameConfig::Neutral { strategies: 2 },
                InitConfig::Frequencies {
                    frequencies: vec![0.5, 0.5],
                },
            )],
        );
        let (_, pop) = build(&cfg);
        assert_eq!(pop.species()[0].counts(), &[500, 500]);
        assert_eq!(pop.total_agents(), 1000);
    }

    #[test]
    fn test_well_mixed_scores_exclude_focal() {
        let cfg = config(
            GeometryConfig::well_mixed(4),
            vec![SpeciesConfig::new(
                "a",
                GameConfig::Donation {
                    benefit: 3.0,
                    cost: 1.0,
                },
                InitConfig::Mutant {
                    resident: 1,
                    mutant: 0,
                },
            )],
        );
        let (geo, pop) = build(&cfg);
        let species = &pop.species()[0];
        let coop = (0..4).find(|&i| species.trait_at(i) == Trait::Discrete(0)).unwrap();
        // lone cooperator pays the cost against three defectors
        assert_relative_eq!(species.score(coop), -1.0);
        let defector = (coop + 1) % 4;
        // each defector meets one cooperator among three partners
        assert_relative_eq!(species.score(defector), 1.0);
        assert_scores_fresh(&geo, &pop);
    }

    #[test]
    fn test_incremental_scores_match_recompute_on_lattice() {
        let cfg = config(
            GeometryConfig::square(25, Neighborhood::Moore),
            vec![SpeciesConfig::new(
                "a",
                GameConfig::Snowdrift {
                    benefit: 1.0,
                    cost: 0.6,
                },
                InitConfig::Random,
            )],
        );
        let (geo, mut pop) = build(&cfg);
        let mut rng = SimRng::new(5);
        for _ in 0..200 {
            let node = rng.random0n(25);
            let s = rng.random0n(2);
            pop.set_trait(&geo, 0, node, Trait::Discrete(s));
            assert_scores_fresh(&geo, &pop);
        }
        assert_eq!(pop.species()[0].counts().iter().sum::<usize>(), 25);
    }

    #[test]
    fn test_continuous_well_mixed_shift_matches_recompute() {
        let cfg = config(
            GeometryConfig::well_mixed(30),
            vec![SpeciesConfig::new(
                "a",
                GameConfig::ContinuousSnowdrift {
                    benefit: [6.0, -1.4],
                    cost: [4.56, -1.6],
                    min: 0.0,
                    max: 1.0,
                },
                InitConfig::Random,
            )],
        );
        let (geo, mut pop) = build(&cfg);
        let mut rng = SimRng::new(9);
        for _ in 0..100 {
            let node = rng.random0n(30);
            let x = rng.random01();
            pop.set_trait(&geo, 0, node, Trait::Continuous(x));
        }
        assert_scores_fresh(&geo, &pop);
    }

    #[test]
    fn test_two_species_inter_scores() {
        let mut cfg = config(
            GeometryConfig::new(
                GeometryType::Linear { neighbors: 2 },
                10,
            ),
            vec![
                SpeciesConfig::new(
                    "hosts",
                    GameConfig::Matrix {
                        payoffs: vec![vec![1.0, 0.0, 2.0], vec![0.0, 1.0, 0.0]],
                    },
                    InitConfig::Random,
                )
                .against(1),
                SpeciesConfig::new(
                    "parasites",
                    GameConfig::Matrix {
                        payoffs: vec![vec![0.0, 1.0], vec![1.0, 0.0], vec![0.5, 0.5]],
                    },
                    InitConfig::Random,
                )
                .against(0),
            ],
        );
        cfg.dynamics.accounting = PayoffAccounting::Accumulated;
        cfg.validate().unwrap();
        let (geo, mut pop) = build(&cfg);
        assert_eq!(pop.group_size(&geo, 0, 3), 3);
        assert_scores_fresh(&geo, &pop);
        let mut rng = SimRng::new(2);
        for _ in 0..100 {
            let sp = rng.random0n(2);
            let node = rng.random0n(10);
            let n = if sp == 0 { 2 } else { 3 };
            let s = rng.random0n(n);
            pop.set_trait(&geo, sp, node, Trait::Discrete(s));
            assert_scores_fresh(&geo, &pop);
        }
    }

    #[test]
    fn test_absorption() {
        let cfg = config(
            GeometryConfig::well_mixed(5),
            vec![SpeciesConfig::new(
                "a",
                GameConfig::Neutral { strategies: 3 },
                InitConfig::Monomorphic { strategy: 2 },
            )],
        );
        let (geo, mut pop) = build(&cfg);
        assert!(pop.is_absorbed(&geo, &cfg.dynamics));
        assert_eq!(pop.species()[0].monomorphic_strategy(), Some(2));
        assert_eq!(pop.species()[0].monomorphic_payoff(), Some(1.0));
        pop.set_trait(&geo, 0, 0, Trait::Discrete(1));
        assert!(!pop.is_absorbed(&geo, &cfg.dynamics));
    }

    #[test]
    fn test_absorption_under_best_response() {
        let mut cfg = config(
            GeometryConfig::square(16, Neighborhood::VonNeumann),
            vec![SpeciesConfig::new(
                "a",
                GameConfig::Snowdrift {
                    benefit: 1.0,
                    cost: 0.6,
                },
                InitConfig::Monomorphic { strategy: 1 },
            )],
        );
        cfg.dynamics.player_update = PlayerUpdate::BestResponse;
        let (geo, pop) = build(&cfg);
        // cooperating pays b - c/2 > 0 against defectors
        assert!(!pop.is_absorbed(&geo, &cfg.dynamics));

        // Moran reproduction ignores the player rule
        cfg.dynamics.population_update = crate::evolution::PopulationUpdate::MoranDeathBirth;
        assert!(pop.is_absorbed(&geo, &cfg.dynamics));

        // defection is the best reply to cooperators in a donation game
        let mut cfg = config(
            GeometryConfig::square(16, Neighborhood::VonNeumann),
            vec![SpeciesConfig::new(
                "a",
                GameConfig::Donation {
                    benefit: 3.0,
                    cost: 1.0,
                },
                InitConfig::Monomorphic { strategy: 0 },
            )],
        );
        cfg.dynamics.player_update = PlayerUpdate::BestResponse;
        let (geo, pop) = build(&cfg);
        assert!(!pop.is_absorbed(&geo, &cfg.dynamics));
        cfg.species[0].init = InitConfig::Monomorphic { strategy: 1 };
        let (geo, pop) = build(&cfg);
        assert!(pop.is_absorbed(&geo, &cfg.dynamics));
    }

    #[test]
    fn test_references_skip_focal() {
        let mut rng = SimRng::new(0);
        let geo = Geometry::new(&GeometryConfig::well_mixed(4), &mut rng).unwrap();
        let refs = References::of(&geo, 2);
        assert_eq!(refs.len(), 3);
        assert_eq!(refs.iter().collect::<Vec<_>>(), vec![0, 1, 3]);
    }

    #[test]
    fn test_score_range_accumulated() {
        let game = MatrixGame::donation(2.0, 1.0).unwrap();
        assert_eq!(game.min_payoff(), -1.0);
        let mut cfg = config(
            GeometryConfig::square(16, Neighborhood::VonNeumann),
            vec![SpeciesConfig::new(
                "a",
                GameConfig::Donation {
                    benefit: 2.0,
                    cost: 1.0,
                },
                InitConfig::Random,
            )],
        );
        cfg.dynamics.accounting = PayoffAccounting::Accumulated;
        let (_, pop) = build(&cfg);
        assert_eq!(pop.species()[0].score_range(), (-4.0, 8.0));
    }
}
