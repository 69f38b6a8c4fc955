//! End-to-end scenarios with known outcomes.

use evolab_sim::evolution::{GameConfig, Mutation, MutationKernel, PlayerUpdate, PopulationUpdate};
use evolab_sim::geometry::{GeometryType, Neighborhood};
use evolab_sim::simulation::{
    FixationExperiment, InitConfig, RunStatus, SimulationBuilder, SpeciesConfig,
};
use evolab_sim::storage::RecordingStrategy;

#[test]
fn test_well_mixed_thousand_agents_conserve_size() {
    let mut sim = SimulationBuilder::new()
        .well_mixed(1000)
        .generations(10.0)
        .player_update(PlayerUpdate::Thermal { noise: 0.1 })
        .species(SpeciesConfig::new(
            "players",
            GameConfig::Snowdrift {
                benefit: 1.0,
                cost: 0.6,
            },
            InitConfig::Frequencies {
                frequencies: vec![0.5, 0.5],
            },
        ))
        .recording(RecordingStrategy::All)
        .seed(0)
        .build()
        .unwrap();
    assert_eq!(sim.population().species()[0].counts(), &[500, 500]);
    assert_eq!(sim.step_limit(), 10_000);

    match sim.run() {
        RunStatus::LimitReached => assert_eq!(sim.steps(), 10_000),
        RunStatus::Absorbed => {
            let counts = sim.population().species()[0].counts();
            assert!(counts.contains(&1000));
        }
        other => panic!("unexpected status {other}"),
    }
    let trace = sim.statistics().trace();
    assert!(!trace.is_empty());
    for entry in trace {
        assert_eq!(entry.total(0), 1000, "generation {}", entry.generation);
    }
    let snapshot = sim.snapshot().unwrap();
    assert_eq!(snapshot.population.species[0].counts.iter().sum::<usize>(), 1000);
}

#[test]
fn test_lattice_run_keeps_degree_four() {
    let mut sim = SimulationBuilder::new()
        .square(100, Neighborhood::VonNeumann)
        .generations(5.0)
        .player_update(PlayerUpdate::ImitateBetter)
        .species(SpeciesConfig::new(
            "players",
            GameConfig::Donation {
                benefit: 4.0,
                cost: 1.0,
            },
            InitConfig::Random,
        ))
        .seed(3)
        .build()
        .unwrap();
    sim.run();
    for node in 0..100 {
        assert_eq!(sim.geometry().degree(node), 4);
    }
}

#[test]
fn test_forced_mutation_picks_other_strategies_evenly() {
    let mut sim = SimulationBuilder::new()
        .well_mixed(60)
        .generations(1000.0)
        .species(
            SpeciesConfig::new(
                "players",
                GameConfig::Neutral { strategies: 3 },
                InitConfig::Random,
            )
            .with_mutation(Mutation::new(1.0, MutationKernel::Other).unwrap()),
        )
        .recording(RecordingStrategy::None)
        .seed(17)
        .build()
        .unwrap();

    // transitions[from][to]
    let mut transitions = [[0usize; 3]; 3];
    let mut before = sim.population().species()[0].counts().to_vec();
    for _ in 0..30_000 {
        sim.step();
        let after = sim.population().species()[0].counts().to_vec();
        let from = (0..3).find(|&s| after[s] + 1 == before[s]);
        let to = (0..3).find(|&s| after[s] == before[s] + 1);
        let (Some(from), Some(to)) = (from, to) else {
            panic!("a forced mutation must change exactly one agent");
        };
        assert_ne!(from, to);
        transitions[from][to] += 1;
        before = after;
    }
    for (from, row) in transitions.iter().enumerate() {
        let total: usize = row.iter().sum();
        assert!(total > 5000);
        for (to, &n) in row.iter().enumerate() {
            if to == from {
                assert_eq!(n, 0);
                continue;
            }
            let share = n as f64 / total as f64;
            assert!((0.46..0.54).contains(&share), "{from}->{to}: {share}");
        }
    }
}

#[test]
fn test_neutral_fixation_is_symmetric() {
    let config = SimulationBuilder::new()
        .well_mixed(10)
        .generations(5000.0)
        .player_update(PlayerUpdate::Thermal { noise: 0.1 })
        .species(SpeciesConfig::new(
            "neutral",
            GameConfig::Neutral { strategies: 2 },
            InitConfig::Frequencies {
                frequencies: vec![0.5, 0.5],
            },
        ))
        .seed(1000)
        .build_config()
        .unwrap();
    let report = FixationExperiment::new(config, 400).unwrap().run().unwrap();
    assert_eq!(report.unresolved, 0);
    let p = report.species[0].probabilities[0];
    assert!((0.4..0.6).contains(&p), "fixation probability {p}");
    assert!(report.mean_time > 0.0);
}

#[test]
fn test_neutral_mean_frequency_matches_initial() {
    let mut total = 0.0;
    let replicates = 400;
    for seed in 0..replicates {
        let mut sim = SimulationBuilder::new()
            .geometry(GeometryType::Linear { neighbors: 2 }, 12)
            .generations(100.0)
            .player_update(PlayerUpdate::Thermal { noise: 1.0 })
            .species(SpeciesConfig::new(
                "neutral",
                GameConfig::Neutral { strategies: 2 },
                InitConfig::Frequencies {
                    frequencies: vec![0.5, 0.5],
                },
            ))
            .recording(RecordingStrategy::None)
            .seed(seed)
            .build()
            .unwrap();
        sim.run();
        total += sim.report()[0].traits.mean[0];
    }
    let mean = total / replicates as f64;
    assert!((0.4..0.6).contains(&mean), "mean frequency {mean}");
}

#[test]
fn test_moran_single_mutant_fixes_with_probability_one_over_n() {
    let config = SimulationBuilder::new()
        .well_mixed(10)
        .generations(10_000.0)
        .population_update(PopulationUpdate::MoranBirthDeath)
        .species(SpeciesConfig::new(
            "neutral",
            GameConfig::Neutral { strategies: 2 },
            InitConfig::Mutant {
                resident: 0,
                mutant: 1,
            },
        ))
        .seed(77)
        .build_config()
        .unwrap();
    let report = FixationExperiment::new(config, 2000).unwrap().run().unwrap();
    assert_eq!(report.unresolved, 0);
    let p = report.species[0].probabilities[1];
    assert!((0.07..0.13).contains(&p), "fixation probability {p}");
}

fn best_response(game: GameConfig, strategy: usize) -> SimulationBuilder {
    SimulationBuilder::new()
        .well_mixed(20)
        .generations(10.0)
        .player_update(PlayerUpdate::BestResponse)
        .species(SpeciesConfig::new(
            "players",
            game,
            InitConfig::Monomorphic { strategy },
        ))
        .seed(5)
}

#[test]
fn test_best_response_leaves_monomorphic_state_with_better_reply() {
    let snowdrift = GameConfig::Snowdrift {
        benefit: 1.0,
        cost: 0.6,
    };
    let mut sim = best_response(snowdrift.clone(), 1).build().unwrap();
    assert!(!sim.is_absorbed());
    sim.step();
    assert_eq!(sim.population().species()[0].counts(), &[1, 19]);

    let mut sim = best_response(snowdrift.clone(), 1).build().unwrap();
    assert_eq!(sim.run(), RunStatus::LimitReached);
    assert_eq!(sim.steps(), sim.step_limit());
    assert!(sim.population().species()[0].counts()[0] > 0);

    let config = best_response(snowdrift, 1).build_config().unwrap();
    let report = FixationExperiment::new(config, 8).unwrap().run().unwrap();
    assert_eq!(report.unresolved, 8);
    assert_eq!(report.species[0].counts, vec![0, 0]);
}

#[test]
fn test_best_response_absorbs_when_current_strategy_is_best_reply() {
    let donation = GameConfig::Donation {
        benefit: 3.0,
        cost: 1.0,
    };
    let mut sim = best_response(donation.clone(), 1).build().unwrap();
    assert_eq!(sim.run(), RunStatus::Absorbed);
    assert_eq!(sim.steps(), 0);
    assert_eq!(sim.report()[0].fixed, Some(1));

    // a synchronous sweep moves every cooperator to defection at once
    let mut sim = best_response(donation, 0)
        .population_update(PopulationUpdate::Synchronous)
        .build()
        .unwrap();
    assert_eq!(sim.run(), RunStatus::Absorbed);
    assert_eq!(sim.steps(), 1);
    assert_eq!(sim.report()[0].fixed, Some(1));
}

#[test]
fn test_best_response_ties_go_to_lowest_strategy() {
    let mut sim = best_response(GameConfig::Neutral { strategies: 3 }, 2)
        .population_update(PopulationUpdate::Synchronous)
        .build()
        .unwrap();
    assert!(!sim.is_absorbed());
    assert_eq!(sim.run(), RunStatus::Absorbed);
    assert_eq!(sim.steps(), 1);
    assert_eq!(sim.population().species()[0].counts(), &[20, 0, 0]);
}

#[test]
fn test_uniform_mutation_changes_strategy_at_rate_times_n_minus_one_over_n() {
    let rate = 0.3;
    let n = 3;
    let mut sim = SimulationBuilder::new()
        .well_mixed(60)
        .generations(1000.0)
        .player_update(PlayerUpdate::ImitateBetter)
        .species(
            SpeciesConfig::new(
                "players",
                GameConfig::Neutral { strategies: n },
                InitConfig::Monomorphic { strategy: 0 },
            )
            .with_mutation(Mutation::new(rate, MutationKernel::Uniform).unwrap()),
        )
        .recording(RecordingStrategy::None)
        .seed(23)
        .build()
        .unwrap();

    let steps = 30_000;
    let mut changes = 0usize;
    let mut before = sim.population().species()[0].counts().to_vec();
    for _ in 0..steps {
        sim.step();
        let after = sim.population().species()[0].counts().to_vec();
        if after != before {
            changes += 1;
        }
        before = after;
    }
    let observed = changes as f64 / steps as f64;
    let expected = rate * (n - 1) as f64 / n as f64;
    assert!((observed - expected).abs() < 0.01, "change rate {observed}");

    let report = sim.report();
    for (s, &freq) in report[0].traits.mean.iter().enumerate() {
        assert!((0.3..0.37).contains(&freq), "strategy {s}: {freq}");
    }
}
