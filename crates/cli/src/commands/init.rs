use anyhow::{Context, Result, bail};
use evolab_sim::base::{FitnessMap, PayoffAccounting};
use evolab_sim::evolution::{
    GameConfig, Mutation, MutationKernel, PlayerUpdate, PopulationUpdate,
};
use evolab_sim::geometry::{Boundary, GeometryConfig, GeometryType, Neighborhood};
use evolab_sim::simulation::{
    Configuration, DynamicsConfig, ExecutionConfig, InitConfig, SpeciesConfig, StatisticsConfig,
};
use evolab_sim::storage::RecordingStrategy;

use crate::args::{GameArg, InitArgs, KernelArg, PlayerUpdateArg, PopulationUpdateArg, TopologyArg};
use crate::defaults;
use crate::printing::print_parameters;

pub fn init_configuration(args: &InitArgs) -> Result<()> {
    println!("🎲 Evolab - Evolutionary Game Simulator");
    println!("============================================\n");

    let config = build_configuration(args)?;
    config
        .validate()
        .context("Configuration is not valid")?;

    print_parameters(&config);

    config
        .to_file(&args.output)
        .with_context(|| format!("Failed to write {}", args.output.display()))?;

    println!("✓ Configuration written to {}", args.output.display());
    println!(
        "\n💡 Use 'evolab run -c {}' to start the simulation",
        args.output.display()
    );
    Ok(())
}

pub fn build_configuration(args: &InitArgs) -> Result<Configuration> {
    let topology = match args.topology {
        TopologyArg::WellMixed => GeometryType::WellMixed,
        TopologyArg::Complete => GeometryType::Complete,
        TopologyArg::Linear => GeometryType::Linear {
            neighbors: args.degree,
        },
        TopologyArg::VonNeumann => GeometryType::Square {
            neighborhood: Neighborhood::VonNeumann,
        },
        TopologyArg::SecondNeighbor => GeometryType::Square {
            neighborhood: Neighborhood::SecondNeighbor,
        },
        TopologyArg::Moore => GeometryType::Square {
            neighborhood: Neighborhood::Moore,
        },
        TopologyArg::Cubic => GeometryType::Cubic,
        TopologyArg::Hexagonal => GeometryType::Hexagonal,
        TopologyArg::Triangular => GeometryType::Triangular,
        TopologyArg::Star => GeometryType::Star,
        TopologyArg::RandomGraph => GeometryType::RandomGraph {
            degree: args.degree,
        },
        TopologyArg::RandomRegular => GeometryType::RandomRegular {
            degree: args.degree,
        },
        TopologyArg::DirectedRandom => GeometryType::DirectedRandom {
            degree: args.degree,
        },
        TopologyArg::ScaleFree => GeometryType::ScaleFree {
            degree: args.degree,
        },
        TopologyArg::Hierarchical => {
            if args.units.is_empty() {
                bail!("a hierarchical topology needs --units");
            }
            GeometryType::Hierarchical {
                units: args.units.clone(),
            }
        }
    };
    let boundary = if args.fixed_boundary {
        Boundary::Fixed
    } else {
        Boundary::Periodic
    };

    let game = match args.game {
        GameArg::Neutral => GameConfig::Neutral {
            strategies: args.strategies,
        },
        GameArg::Donation => GameConfig::Donation {
            benefit: args.benefit,
            cost: args.cost,
        },
        GameArg::Snowdrift => GameConfig::Snowdrift {
            benefit: args.benefit,
            cost: args.cost,
        },
        GameArg::RockPaperScissors => GameConfig::RockPaperScissors {
            win: args.benefit,
            loss: args.cost,
        },
        GameArg::ContinuousSnowdrift => GameConfig::ContinuousSnowdrift {
            benefit: [args.benefit, args.quadratic_benefit],
            cost: [args.cost, args.quadratic_cost],
            min: 0.0,
            max: 1.0,
        },
    };

    let init = if !args.frequencies.is_empty() {
        InitConfig::Frequencies {
            frequencies: args.frequencies.clone(),
        }
    } else if let [resident, mutant] = args.mutant[..] {
        InitConfig::Mutant { resident, mutant }
    } else if let Some(value) = args.trait_value {
        InitConfig::Trait { value }
    } else {
        InitConfig::Random
    };

    let kernel = match args.kernel {
        KernelArg::Uniform => MutationKernel::Uniform,
        KernelArg::Other => MutationKernel::Other,
        KernelArg::Gaussian => MutationKernel::Gaussian { sdev: args.sdev },
    };
    let mutation = Mutation::new(args.mutation_rate, kernel).context("Invalid mutation")?;

    let population_update = match args.population_update {
        PopulationUpdateArg::Async => PopulationUpdate::Asynchronous,
        PopulationUpdateArg::Sync => PopulationUpdate::Synchronous,
        PopulationUpdateArg::MoranBd => PopulationUpdate::MoranBirthDeath,
        PopulationUpdateArg::MoranDb => PopulationUpdate::MoranDeathBirth,
    };
    let player_update = match args.player_update {
        PlayerUpdateArg::Thermal => PlayerUpdate::Thermal { noise: args.noise },
        PlayerUpdateArg::Imitate => PlayerUpdate::Imitate,
        PlayerUpdateArg::ImitateBetter => PlayerUpdate::ImitateBetter,
        PlayerUpdateArg::Best => PlayerUpdate::Best,
        PlayerUpdateArg::BestResponse => PlayerUpdate::BestResponse,
    };

    let recording = match args.record_every {
        0 => RecordingStrategy::None,
        1 => RecordingStrategy::All,
        n => RecordingStrategy::EveryN(n),
    };

    Ok(Configuration {
        execution: ExecutionConfig {
            seed: args.seed,
            max_generations: args.generations,
        },
        geometry: GeometryConfig::new(topology, args.population_size).with_boundary(boundary),
        dynamics: DynamicsConfig {
            population_update,
            player_update,
            accounting: if args.accumulated {
                PayoffAccounting::Accumulated
            } else {
                PayoffAccounting::Average
            },
            fitness: FitnessMap::default(),
        },
        species: vec![SpeciesConfig::new(defaults::SPECIES_NAME, game, init).with_mutation(mutation)],
        statistics: StatisticsConfig { recording },
    })
}
