use serde::{Deserialize, Serialize};

/// Recording strategy for when to trace population composition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordingStrategy {
    /// Record every N generations.
    EveryN(u64),

    /// Record at specific generations.
    Specific(Vec<u64>),

    /// Record all generations.
    All,

    /// No recording.
    None,
}

impl RecordingStrategy {
    /// Check if generation should be recorded
    pub fn should_record(&self, generation: u64) -> bool {
        match self {
            Self::EveryN(n) => generation.is_multiple_of(*n),
            Self::Specific(gens) => gens.contains(&generation),
            Self::All => true,
            Self::None => false,
        }
    }
}

/// Strategy counts of every species at one integral generation.
///
/// Continuous species contribute an empty count vector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraceEntry {
    pub generation: u64,
    pub counts: Vec<Vec<usize>>,
}

impl TraceEntry {
    /// Agents of species `species` accounted for in this entry.
    pub fn total(&self, species: usize) -> usize {
        self.counts.get(species).map(|c| c.iter().sum()).unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_should_record() {
        assert!(RecordingStrategy::EveryN(5).should_record(0));
        assert!(RecordingStrategy::EveryN(5).should_record(10));
        assert!(!RecordingStrategy::EveryN(5).should_record(7));
        assert!(RecordingStrategy::Specific(vec![3, 9]).should_record(9));
        assert!(!RecordingStrategy::Specific(vec![3, 9]).should_record(4));
        assert!(RecordingStrategy::All.should_record(123));
        assert!(!RecordingStrategy::None.should_record(0));
    }

    #[test]
    fn test_serde_shape() {
        let json = serde_json::to_string(&RecordingStrategy::EveryN(2)).unwrap();
        assert_eq!(json, r#"{"every_n":2}"#);
        let all: RecordingStrategy = serde_json::from_str(r#""all""#).unwrap();
        assert_eq!(all, RecordingStrategy::All);
    }

    #[test]
    fn test_trace_total() {
        let entry = TraceEntry {
            generation: 4,
            counts: vec![vec![3, 7], vec![]],
        };
        assert_eq!(entry.total(0), 10);
        assert_eq!(entry.total(1), 0);
        assert_eq!(entry.total(5), 0);
    }
}
