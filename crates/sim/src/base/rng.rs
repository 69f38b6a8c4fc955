//! The single deterministic random stream of a run.
//!
//! Every stochastic decision in the engine draws from one [`SimRng`], and
//! each helper consumes a fixed number of raw 64-bit draws:
//!
//! | method            | raw draws | mapping                               |
//! |-------------------|-----------|---------------------------------------|
//! | `next_u64`        | 1         | identity                              |
//! | `random01`        | 1         | `(x >> 11) * 2^-53`, in `[0, 1)`      |
//! | `random0n(n)`     | 1         | `(x * n) >> 64` (128-bit product)     |
//! | `next_gaussian`   | 2         | Box-Muller on two `random01` draws    |
//!
//! These mappings are part of the reproducibility contract: a second runtime
//! implementing the same generator and the same mappings produces the same
//! trajectory for the same seed.

use crate::errors::SnapshotError;
use evolab_codec::{bytes_to_words, words_to_bytes};
use rand::{RngCore, SeedableRng};
use rand_xoshiro::Xoshiro256PlusPlus;

/// Name recorded in snapshots.
pub const RNG_ALGORITHM: &str = "xoshiro256++";

/// Number of 64-bit words in the generator state.
pub const RNG_STATE_WORDS: usize = 4;

const TWO_POW_M53: f64 = 1.0 / (1u64 << 53) as f64;

/// Seeded random stream with exportable internal state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimRng {
    inner: Xoshiro256PlusPlus,
}

impl SimRng {
    /// Create a stream from a 64-bit seed.
    pub fn new(seed: u64) -> Self {
        Self {
            inner: Xoshiro256PlusPlus::seed_from_u64(seed),
        }
    }

    /// Draw a fresh seed from the operating system-backed thread RNG.
    ///
    /// Only used to resolve configurations that do not fix a seed; the drawn
    /// seed is written back into the configuration before the run starts.
    pub fn entropy_seed() -> u64 {
        rand::rng().next_u64()
    }

    #[inline]
    pub fn next_u64(&mut self) -> u64 {
        self.inner.next_u64()
    }

    /// Uniform real in `[0, 1)` from the top 53 bits of one draw.
    #[inline]
    pub fn random01(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 * TWO_POW_M53
    }

    /// Uniform integer in `[0, n)` from one draw. `n` must be positive.
    #[inline]
    pub fn random0n(&mut self, n: usize) -> usize {
        debug_assert!(n > 0, "random0n requires n > 0");
        ((self.next_u64() as u128 * n as u128) >> 64) as usize
    }

    /// Standard normal deviate (Box-Muller, two draws, no caching).
    pub fn next_gaussian(&mut self) -> f64 {
        // 1 - u lies in (0, 1], keeping the logarithm finite.
        let u1 = 1.0 - self.random01();
        let u2 = self.random01();
        (-2.0 * u1.ln()).sqrt() * (std::f64::consts::TAU * u2).cos()
    }

    /// Bernoulli trial consuming exactly one draw.
    #[inline]
    pub fn chance(&mut self, p: f64) -> bool {
        self.random01() < p
    }

    /// Serialized generator state (32 little-endian bytes).
    pub fn state_bytes(&self) -> Result<Vec<u8>, SnapshotError> {
        let bytes = bincode::serialize(&self.inner)
            .map_err(|e| SnapshotError::Rng(format!("failed to serialize state: {e}")))?;
        if bytes.len() != RNG_STATE_WORDS * 8 {
            return Err(SnapshotError::Rng(format!(
                "serialized state has {} bytes, expected {}",
                bytes.len(),
                RNG_STATE_WORDS * 8
            )));
        }
        Ok(bytes)
    }

    /// Restore the generator from bytes produced by [`SimRng::state_bytes`].
    pub fn from_state_bytes(bytes: &[u8]) -> Result<Self, SnapshotError> {
        if bytes.len() != RNG_STATE_WORDS * 8 {
            return Err(SnapshotError::Rng(format!(
                "expected {} bytes of state, found {}",
                RNG_STATE_WORDS * 8,
                bytes.len()
            )));
        }
        if bytes.iter().all(|&b| b == 0) {
            return Err(SnapshotError::Rng("all-zero state is invalid".into()));
        }
        let inner = bincode::deserialize(bytes)
            .map_err(|e| SnapshotError::Rng(format!("failed to deserialize state: {e}")))?;
        Ok(Self { inner })
    }

    /// Internal state as four 64-bit words.
    pub fn state_words(&self) -> Result<Vec<u64>, SnapshotError> {
        Ok(bytes_to_words(&self.state_bytes()?)?)
    }

    pub fn from_state_words(words: &[u64]) -> Result<Self, SnapshotError> {
        if words.len() != RNG_STATE_WORDS {
            return Err(SnapshotError::Rng(format!(
                "expected {RNG_STATE_WORDS} state words, found {}",
                words.len()
            )));
        }
        Self::from_state_bytes(&words_to_bytes(words))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_seed_same_stream() {
        let mut a = SimRng::new(42);
        let mut b = SimRng::new(42);
        for _ in 0..100 {
            assert_eq!(a.next_u64(), b.next_u64());
        }
    }

    #[test]
    fn test_different_seeds_differ() {
        let mut a = SimRng::new(1);
        let mut b = SimRng::new(2);
        let xs: Vec<u64> = (0..8).map(|_| a.next_u64()).collect();
        let ys: Vec<u64> = (0..8).map(|_| b.next_u64()).collect();
        assert_ne!(xs, ys);
    }

    #[test]
    fn test_random01_mapping() {
        let mut a = SimRng::new(7);
        let mut b = SimRng::new(7);
        for _ in 0..1000 {
            let raw = a.next_u64();
            let u = b.random01();
            assert_eq!(u, (raw >> 11) as f64 / (1u64 << 53) as f64);
            assert!((0.0..1.0).contains(&u));
        }
    }

    #[test]
    fn test_random0n_mapping_and_range() {
        let mut a = SimRng::new(9);
        let mut b = SimRng::new(9);
        for n in 1..200usize {
            let raw = a.next_u64();
            let k = b.random0n(n);
            assert!(k < n);
            assert_eq!(k, ((raw as u128 * n as u128) >> 64) as usize);
        }
    }

    #[test]
    fn test_gaussian_consumes_two_draws() {
        let mut a = SimRng::new(3);
        let mut b = SimRng::new(3);
        a.next_gaussian();
        b.next_u64();
        b.next_u64();
        assert_eq!(a, b);
    }

    #[test]
    fn test_gaussian_moments() {
        let mut rng = SimRng::new(11);
        let n = 20_000;
        let xs: Vec<f64> = (0..n).map(|_| rng.next_gaussian()).collect();
        let mean = xs.iter().sum::<f64>() / n as f64;
        let var = xs.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / n as f64;
        assert!(mean.abs() < 0.05, "mean {mean}");
        assert!((var - 1.0).abs() < 0.05, "var {var}");
    }

    #[test]
    fn test_state_round_trip_resumes_stream() {
        let mut rng = SimRng::new(123);
        for _ in 0..17 {
            rng.next_u64();
        }
        let words = rng.state_words().unwrap();
        assert_eq!(words.len(), RNG_STATE_WORDS);
        assert_eq!(rng.state_bytes().unwrap().len(), RNG_STATE_WORDS * 8);

        let mut restored = SimRng::from_state_words(&words).unwrap();
        for _ in 0..50 {
            assert_eq!(rng.next_u64(), restored.next_u64());
        }
    }

    #[test]
    fn test_rejects_bad_state() {
        assert!(SimRng::from_state_words(&[0, 0, 0, 0]).is_err());
        assert!(SimRng::from_state_words(&[1, 2, 3]).is_err());
        assert!(SimRng::from_state_bytes(&[1u8; 31]).is_err());
    }
}
