//! Snapshot document layer.
//!
//! Provides the runtime-independent pieces of model-state exchange:
//! document encoding strategies, a versioned header check, lossless encoding
//! of 64-bit generator state words, and the major/minor semantic comparator
//! used to validate runs against reference documents.

mod compare;
mod error;
mod header;
mod strategies;
mod traits;
mod utils;

pub use compare::{Comparator, DiffReport, Difference, Severity, Tolerance, DEFAULT_IGNORED};
pub use error::CodecError as Error;
pub use error::CodecError;
pub use header::check_header;
pub use strategies::{CompactJson, PrettyJson};
pub use traits::Codec;
pub use utils::{
    bytes_to_words, decode_word, decode_words, encode_word, encode_words, words_to_bytes,
};

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Strategies for writing documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CodecStrategy {
    /// Indented, one field per line.
    Pretty,
    /// Single line.
    Compact,
}

impl CodecStrategy {
    /// Encode using the selected strategy.
    pub fn encode(&self, doc: &Value) -> Result<Vec<u8>, CodecError> {
        match self {
            CodecStrategy::Pretty => PrettyJson.encode(doc),
            CodecStrategy::Compact => CompactJson.encode(doc),
        }
    }

    /// Decode using the selected strategy.
    pub fn decode(&self, data: &[u8]) -> Result<Value, CodecError> {
        match self {
            CodecStrategy::Pretty => PrettyJson.decode(data),
            CodecStrategy::Compact => CompactJson.decode(data),
        }
    }
}

impl Default for CodecStrategy {
    fn default() -> Self {
        Self::Pretty
    }
}

impl std::fmt::Display for CodecStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pretty => write!(f, "pretty"),
            Self::Compact => write!(f, "compact"),
        }
    }
}

impl std::str::FromStr for CodecStrategy {
    type Err = CodecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pretty" => Ok(Self::Pretty),
            "compact" => Ok(Self::Compact),
            other => Err(CodecError::Decode(format!("unknown codec strategy '{other}'"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_strategies_decode_each_other() {
        let doc = json!({ "rng": { "state": ["0x0000000000000001"] }, "t": 1.5 });
        let pretty = CodecStrategy::Pretty.encode(&doc).unwrap();
        let compact = CodecStrategy::Compact.encode(&doc).unwrap();
        assert!(pretty.len() > compact.len());
        assert_eq!(CodecStrategy::Compact.decode(&pretty).unwrap(), doc);
        assert_eq!(CodecStrategy::Pretty.decode(&compact).unwrap(), doc);
    }

    #[test]
    fn test_strategy_from_str() {
        assert_eq!("Pretty".parse::<CodecStrategy>().unwrap(), CodecStrategy::Pretty);
        assert_eq!("compact".parse::<CodecStrategy>().unwrap(), CodecStrategy::Compact);
        assert!("zstd".parse::<CodecStrategy>().is_err());
        assert_eq!(CodecStrategy::default().to_string(), "pretty");
    }
}
