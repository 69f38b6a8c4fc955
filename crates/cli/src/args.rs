use clap::{Args, ValueEnum};
use std::path::PathBuf;

use crate::defaults;

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TopologyArg {
    WellMixed,
    Complete,
    Linear,
    VonNeumann,
    SecondNeighbor,
    Moore,
    Cubic,
    Hexagonal,
    Triangular,
    Star,
    RandomGraph,
    RandomRegular,
    DirectedRandom,
    ScaleFree,
    Hierarchical,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameArg {
    Neutral,
    Donation,
    Snowdrift,
    RockPaperScissors,
    ContinuousSnowdrift,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PopulationUpdateArg {
    Async,
    Sync,
    MoranBd,
    MoranDb,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerUpdateArg {
    Thermal,
    Imitate,
    ImitateBetter,
    Best,
    BestResponse,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum KernelArg {
    Uniform,
    Other,
    Gaussian,
}

#[derive(Args, Debug)]
pub struct InitArgs {
    /// Output configuration file
    #[arg(short, long, default_value = defaults::CONFIG_FILE)]
    pub output: PathBuf,

    /// Number of agents (nodes of the interaction graph)
    #[arg(short = 'n', long, default_value_t = defaults::POPULATION_SIZE)]
    pub population_size: usize,

    /// Generation limit
    #[arg(short = 'g', long, default_value_t = defaults::GENERATIONS)]
    pub generations: f64,

    /// Interaction topology
    #[arg(long, value_enum, default_value = "well-mixed")]
    pub topology: TopologyArg,

    /// Degree (or neighbour count) for linear and random topologies
    #[arg(long, default_value = "4")]
    pub degree: usize,

    /// Level sizes of a hierarchical topology, e.g. "10,5,2"
    #[arg(long, value_delimiter = ',')]
    pub units: Vec<usize>,

    /// Drop links that would cross a lattice edge
    #[arg(long)]
    pub fixed_boundary: bool,

    /// Game played by the species
    #[arg(long, value_enum, default_value = "donation")]
    pub game: GameArg,

    /// Benefit (or win payoff for rock-paper-scissors)
    #[arg(long, default_value_t = defaults::BENEFIT)]
    pub benefit: f64,

    /// Cost (or loss payoff for rock-paper-scissors)
    #[arg(long, default_value_t = defaults::COST)]
    pub cost: f64,

    /// Quadratic benefit coefficient of the continuous snowdrift game
    #[arg(long, default_value = "-1.4", allow_hyphen_values = true)]
    pub quadratic_benefit: f64,

    /// Quadratic cost coefficient of the continuous snowdrift game
    #[arg(long, default_value = "-1.6", allow_hyphen_values = true)]
    pub quadratic_cost: f64,

    /// Number of strategies of the neutral game
    #[arg(long, default_value_t = defaults::STRATEGIES)]
    pub strategies: usize,

    /// Initial strategy frequencies, e.g. "0.5,0.5"
    #[arg(long, value_delimiter = ',', conflicts_with_all = ["mutant", "trait_value"])]
    pub frequencies: Vec<f64>,

    /// Resident and mutant strategy: a single mutant in a monomorphic population
    #[arg(long, num_args = 2, value_names = ["RESIDENT", "MUTANT"], conflicts_with = "trait_value")]
    pub mutant: Vec<usize>,

    /// Initial trait value of a continuous species
    #[arg(long)]
    pub trait_value: Option<f64>,

    /// Population update
    #[arg(long, value_enum, default_value = "async")]
    pub population_update: PopulationUpdateArg,

    /// Player update rule
    #[arg(long, value_enum, default_value = "thermal")]
    pub player_update: PlayerUpdateArg,

    /// Noise of the thermal rule
    #[arg(long, default_value_t = defaults::NOISE)]
    pub noise: f64,

    /// Sum payoffs over interactions instead of averaging them
    #[arg(long)]
    pub accumulated: bool,

    /// Mutation probability per update event
    #[arg(long, default_value_t = defaults::MUTATION_RATE)]
    pub mutation_rate: f64,

    /// Mutation kernel
    #[arg(long, value_enum, default_value = "uniform")]
    pub kernel: KernelArg,

    /// Standard deviation of the gaussian kernel
    #[arg(long, default_value_t = defaults::MUTATION_SDEV)]
    pub sdev: f64,

    /// Trace strategy counts every N generations (0 disables the trace)
    #[arg(long, default_value_t = defaults::RECORD_EVERY)]
    pub record_every: u64,

    /// Random seed
    #[arg(long)]
    pub seed: Option<u64>,
}

#[derive(Args, Debug)]
pub struct RunArgs {
    /// Configuration file
    #[arg(short, long, default_value = defaults::CONFIG_FILE)]
    pub config: PathBuf,

    /// Snapshot written when the run ends
    #[arg(short, long, default_value = defaults::SNAPSHOT_FILE)]
    pub output: PathBuf,

    /// Override the configured seed
    #[arg(long)]
    pub seed: Option<u64>,

    /// Override the configured generation limit
    #[arg(short = 'g', long)]
    pub generations: Option<f64>,

    /// Write the snapshot as compact JSON
    #[arg(long)]
    pub compact: bool,

    /// Show progress bar
    #[arg(long, default_value = "true", action = clap::ArgAction::Set)]
    pub progress: bool,
}

#[derive(Args, Debug)]
pub struct ResumeArgs {
    /// Snapshot to continue from
    pub snapshot: PathBuf,

    /// New generation limit
    #[arg(short = 'g', long)]
    pub generations: f64,

    /// Snapshot written when the run ends (defaults to overwriting the input)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Write the snapshot as compact JSON
    #[arg(long)]
    pub compact: bool,

    /// Show progress bar
    #[arg(long, default_value = "true", action = clap::ArgAction::Set)]
    pub progress: bool,
}

#[derive(Args, Debug)]
pub struct CompareArgs {
    /// Reference snapshot
    pub reference: PathBuf,

    /// Candidate snapshot
    pub candidate: PathBuf,

    /// Absolute tolerance for reals
    #[arg(long, default_value = "1e-12")]
    pub abs_tol: f64,

    /// Relative tolerance for reals
    #[arg(long, default_value = "1e-9")]
    pub rel_tol: f64,

    /// Additional top-level keys to ignore
    #[arg(long)]
    pub ignore: Vec<String>,

    /// List every difference, not only the major ones
    #[arg(long)]
    pub all: bool,
}

#[derive(Args, Debug)]
pub struct FixationArgs {
    /// Configuration file
    #[arg(short, long, default_value = defaults::CONFIG_FILE)]
    pub config: PathBuf,

    /// Number of independent replicates
    #[arg(short, long, default_value_t = defaults::REPLICATES)]
    pub replicates: usize,

    /// Base seed; replicate r runs with seed + r
    #[arg(long)]
    pub seed: Option<u64>,

    /// Write the report as JSON to this file
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}
