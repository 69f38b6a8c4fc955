mod args;
mod commands;
pub mod defaults;
mod printing;

use anyhow::Result;
use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use args::{CompareArgs, FixationArgs, InitArgs, ResumeArgs, RunArgs};
use commands::{compare, fixation, init, inspect, run};

/// Evolab: an individual-based simulator for evolutionary games
///
/// Agents on an interaction graph play games with their neighbours and
/// revise their strategies according to a player-update rule.
#[derive(Parser, Debug)]
#[command(name = "evolab")]
#[command(author, version, about = "Individual-based simulations of evolutionary games", long_about = None)]
struct Cli {
    /// Number of threads to use for replicate runs
    ///
    /// If not specified, defaults to the number of logical CPUs.
    #[arg(short = 't', long, global = true)]
    threads: Option<usize>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Write a new configuration file.
    ///
    /// Sets up the parameters of a run (geometry, game, update rules,
    /// mutation) but does not run it.
    Init(Box<InitArgs>),

    /// Run a configuration to termination and write a snapshot.
    Run(RunArgs),

    /// Continue a run from a snapshot with a new generation limit.
    Resume(ResumeArgs),

    /// Summarise a snapshot.
    Inspect {
        /// Snapshot file
        #[arg(default_value = defaults::SNAPSHOT_FILE)]
        snapshot: PathBuf,

        /// Print the summary as JSON
        #[arg(long)]
        json: bool,
    },

    /// Compare two snapshots field by field.
    ///
    /// Exits with a non-zero status when major differences are found.
    Compare(CompareArgs),

    /// Estimate fixation probabilities from independent replicates.
    Fixation(FixationArgs),
}

fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Some(threads) = cli.threads {
        rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build_global()?;
    }

    match cli.command {
        Commands::Init(args) => {
            init::init_configuration(&args)?;
        }
        Commands::Run(args) => {
            run::run_simulation(&args)?;
        }
        Commands::Resume(args) => {
            run::resume_simulation(&args)?;
        }
        Commands::Inspect { snapshot, json } => {
            inspect::show_snapshot(&snapshot, json)?;
        }
        Commands::Compare(args) => {
            if !compare::compare_snapshots(&args)? {
                std::process::exit(1);
            }
        }
        Commands::Fixation(args) => {
            fixation::run_fixation(&args)?;
        }
    }

    Ok(())
}
