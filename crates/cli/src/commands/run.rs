use anyhow::{Context, Result};
use evolab_codec::CodecStrategy;
use evolab_sim::simulation::{Configuration, Simulation};
use evolab_sim::storage::Snapshot;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::Path;

use crate::args::{ResumeArgs, RunArgs};
use crate::printing::{print_parameters, print_reports, print_status};

pub fn run_simulation(args: &RunArgs) -> Result<()> {
    println!("🎲 Evolab - Running Simulation");
    println!("============================================\n");

    let mut config = Configuration::from_file(&args.config)
        .with_context(|| format!("Failed to load {}", args.config.display()))?;
    if let Some(seed) = args.seed {
        config.execution.seed = Some(seed);
    }
    if let Some(generations) = args.generations {
        config.execution.max_generations = generations;
    }

    let mut sim = Simulation::new(config).context("Failed to initialize simulation")?;
    print_parameters(sim.config());
    println!("Using seed {}", sim.seed());

    drive(&mut sim, args.progress);
    finish(&sim, &args.output, args.compact)
}

pub fn resume_simulation(args: &ResumeArgs) -> Result<()> {
    println!("🎲 Evolab - Resuming Simulation");
    println!("============================================\n");

    let snapshot = Snapshot::read_from(&args.snapshot)
        .with_context(|| format!("Failed to load snapshot {}", args.snapshot.display()))?;
    let mut sim = snapshot.restore().context("Snapshot is not consistent")?;

    println!(
        "📂 Loaded snapshot at generation {} ({})",
        sim.generation(),
        sim.status()
    );
    sim.set_max_generations(args.generations)
        .context("Invalid generation limit")?;
    println!("  Target generations: {}", args.generations);

    drive(&mut sim, args.progress);
    let output = args.output.as_deref().unwrap_or(args.snapshot.as_path());
    finish(&sim, output, args.compact)
}

fn drive(sim: &mut Simulation, show_progress: bool) {
    let limit = sim.config().execution.max_generations.ceil() as u64;
    let pb = if show_progress {
        let pb = ProgressBar::new(limit);
        pb.set_position(sim.generation() as u64);
        let style = ProgressStyle::default_bar()
            .template(
                "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta}) {per_sec}",
            )
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#>-");
        pb.set_style(style);
        Some(pb)
    } else {
        None
    };

    sim.run_with(|sim| {
        if let Some(pb) = &pb {
            pb.set_position(sim.generation() as u64);
        }
    });

    if let Some(pb) = pb {
        pb.finish_with_message("Done");
    }
}

fn finish(sim: &Simulation, output: &Path, compact: bool) -> Result<()> {
    println!("\n✓ Simulation finished");
    print_status(sim);
    print_reports(&sim.report());

    let strategy = if compact {
        CodecStrategy::Compact
    } else {
        CodecStrategy::Pretty
    };
    sim.snapshot()
        .context("Failed to capture snapshot")?
        .write_to(output, strategy)
        .with_context(|| format!("Failed to write snapshot {}", output.display()))?;
    println!("💾 Snapshot written to {}", output.display());
    println!(
        "\n💡 Use 'evolab inspect {}' to view results",
        output.display()
    );
    Ok(())
}
