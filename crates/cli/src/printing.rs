use evolab_sim::simulation::{Configuration, RunStatus, Simulation, SpeciesReport};

pub fn print_parameters(config: &Configuration) {
    let execution = &config.execution;
    let geometry = &config.geometry;
    let dynamics = &config.dynamics;

    println!("\n📋 Simulation Configuration");
    println!("  • Population Size: {} [-n, --population-size]", geometry.size);
    println!("  • Generations: {} [-g, --generations]", execution.max_generations);
    if let Some(seed) = execution.seed {
        println!("  • Random Seed: {seed} [--seed]");
    } else {
        println!("  • Random Seed: Random [--seed]");
    }

    println!("\n🕸  Geometry");
    println!("  • Topology: {} [--topology]", geometry.topology);
    if geometry.topology.is_lattice() {
        println!("  • Boundary: {:?} [--fixed-boundary]", geometry.boundary);
    }

    println!("\n⚙  Dynamics");
    println!("  • Population Update: {} [--population-update]", dynamics.population_update);
    println!("  • Player Update: {} [--player-update]", dynamics.player_update);
    println!("  • Payoff Accounting: {} [--accumulated]", dynamics.accounting);
    if dynamics.population_update.is_moran() {
        println!("  • Fitness Map: {:?}", dynamics.fitness);
    }

    for species in &config.species {
        println!("\n🎯 Species '{}'", species.name);
        println!("  • Game: {:?} [--game]", species.game);
        println!("  • Initial State: {:?}", species.init);
        if species.mutation.is_active() {
            println!(
                "  • Mutation: rate {:.2e}, kernel {} [--mutation-rate, --kernel]",
                species.mutation.rate, species.mutation.kernel
            );
        } else {
            println!("  • Mutation: Disabled [--mutation-rate]");
        }
        if let Some(opponent) = species.opponent {
            println!("  • Opponent: species {opponent}");
        }
    }
    println!();
}

pub fn print_status(sim: &Simulation) {
    let verdict = match sim.status() {
        RunStatus::Absorbed => "absorbed",
        RunStatus::LimitReached => "generation limit reached",
        RunStatus::Stopped => "stopped",
        RunStatus::Running => "running",
    };
    println!("  • Status: {verdict}");
    println!("  • Generation: {} ({} steps)", sim.generation(), sim.steps());
    println!("  • End Time: {}", sim.end_time());
}

pub fn print_reports(reports: &[SpeciesReport]) {
    for report in reports {
        println!("\n📈 Species '{}'", report.name);
        match report.fixed {
            Some(strategy) => println!("  • Fixed Strategy: {strategy}"),
            None => println!("  • Fixed Strategy: none"),
        }
        println!("  • Averaging Time: {}", report.traits.weight);
        for (i, (mean, var)) in report
            .traits
            .mean
            .iter()
            .zip(&report.traits.variance)
            .enumerate()
        {
            println!("    - trait[{i}]: mean {mean:.6}, variance {var:.6}");
        }
        if let (Some(mean), Some(var)) = (report.payoff.mean.first(), report.payoff.variance.first()) {
            println!("    - payoff: mean {mean:.6}, variance {var:.6}");
        }
    }
    println!();
}
