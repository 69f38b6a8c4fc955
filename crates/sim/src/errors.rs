use evolab_codec::CodecError;
use thiserror::Error;

/// Errors raised while constructing an interaction geometry.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GeometryError {
    /// The population size does not fit the requested topology.
    #[error("Invalid size {size} for {kind}: {reason}")]
    InvalidSize {
        kind: &'static str,
        size: usize,
        reason: String,
    },

    /// The requested degree cannot be realised on `size` nodes.
    #[error("Invalid degree {degree} for {kind} with {size} nodes: {reason}")]
    InvalidDegree {
        kind: &'static str,
        degree: usize,
        size: usize,
        reason: String,
    },

    /// A randomized generator gave up after too many restarts.
    #[error("Failed to generate {kind} after {attempts} attempts")]
    GenerationFailed { kind: &'static str, attempts: usize },

    /// Adjacency lists violate a structural invariant.
    #[error("Inconsistent geometry: {0}")]
    Inconsistent(String),
}

/// Errors that can occur during mutation operations.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MutationError {
    /// Invalid mutation rate (must be between 0.0 and 1.0)
    #[error("Invalid mutation rate: {0} (must be between 0.0 and 1.0)")]
    InvalidMutationRate(f64),

    /// The kernel cannot act on the trait type it was paired with.
    #[error("Mutation kernel {kernel} cannot be used with {traits} traits")]
    IncompatibleKernel {
        kernel: &'static str,
        traits: &'static str,
    },

    /// Kernel parameter out of range.
    #[error("Invalid mutation kernel parameter: {0}")]
    InvalidParameter(String),
}

/// Errors that can occur in payoff definitions.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GameError {
    #[error("Invalid game parameter: {0}")]
    InvalidParameter(String),
}

/// Configuration errors. A run never starts with an invalid configuration.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Incompatible settings: {0}")]
    Incompatible(String),

    #[error(transparent)]
    Geometry(#[from] GeometryError),

    #[error(transparent)]
    Mutation(#[from] MutationError),

    #[error(transparent)]
    Game(#[from] GameError),

    #[error("Malformed configuration string: {0}")]
    Parse(String),
}

impl From<serde_json::Error> for ConfigError {
    fn from(e: serde_json::Error) -> Self {
        Self::Parse(e.to_string())
    }
}

/// Errors that can occur during simulation building.
#[derive(Debug, Error)]
pub enum BuilderError {
    /// A required parameter is missing
    #[error("Missing required parameter: {0}")]
    MissingRequired(&'static str),

    /// The assembled configuration was rejected.
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Errors raised when exporting or restoring a snapshot.
#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error(transparent)]
    Codec(#[from] CodecError),

    #[error("Snapshot structure error: {0}")]
    Structure(#[from] serde_json::Error),

    #[error("Snapshot configuration rejected: {0}")]
    Config(#[from] ConfigError),

    #[error("Invalid RNG state: {0}")]
    Rng(String),

    #[error("Snapshot is inconsistent: {0}")]
    Mismatch(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
