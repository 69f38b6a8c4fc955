use anyhow::{Context, Result};
use evolab_sim::simulation::{Configuration, FixationExperiment};

use crate::args::FixationArgs;
use crate::printing::print_parameters;

pub fn run_fixation(args: &FixationArgs) -> Result<()> {
    println!("🎲 Evolab - Fixation Experiment");
    println!("============================================\n");

    let mut config = Configuration::from_file(&args.config)
        .with_context(|| format!("Failed to load {}", args.config.display()))?;
    if let Some(seed) = args.seed {
        config.execution.seed = Some(seed);
    }

    let experiment =
        FixationExperiment::new(config, args.replicates).context("Invalid experiment")?;
    print_parameters(experiment.config());
    println!(
        "Running {} replicates from seed {} on {} threads...",
        experiment.replicates(),
        experiment.base_seed(),
        rayon::current_num_threads()
    );

    let report = experiment.run().context("Replicate failed")?;

    println!("\n📈 Fixation");
    for species in &report.species {
        println!("  • Species '{}'", species.name);
        for (strategy, (count, p)) in species
            .counts
            .iter()
            .zip(&species.probabilities)
            .enumerate()
        {
            println!("    - strategy {strategy}: {count} replicates, probability {p:.4}");
        }
    }
    println!("  • Unresolved: {}", report.unresolved);
    println!(
        "  • Absorption Time: mean {:.3}, variance {:.3}",
        report.mean_time, report.time_variance
    );

    if let Some(output) = &args.output {
        let text = serde_json::to_string_pretty(&report)?;
        std::fs::write(output, text + "\n")
            .with_context(|| format!("Failed to write {}", output.display()))?;
        println!("💾 Report written to {}", output.display());
    }
    Ok(())
}
