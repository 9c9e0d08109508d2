//! Operation generator for deterministic simulation testing.
//!
//! Generates random but reproducible sequences of tree operations over a
//! small key space, so keys are revisited often and removals hit.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Configuration for operation generation.
#[derive(Debug, Clone)]
pub struct OpGenConfig {
    /// Keys are drawn from `0..key_space`.
    pub key_space: i64,
    /// Values are drawn from `0..value_space`; small so that
    /// `remove_entry` sometimes matches.
    pub value_space: i64,
    /// Probability of a removal rather than a write (0.0 - 1.0).
    pub remove_rate: f64,
    /// Probability that an operation uses a strict primitive
    /// (`insert`, `update`, `remove_entry`).
    pub strict_rate: f64,
    /// Probability that an `add_nn` carries no value.
    pub null_rate: f64,
}

impl Default for OpGenConfig {
    fn default() -> Self {
        Self {
            key_space: 200,
            value_space: 8,
            remove_rate: 0.4,
            strict_rate: 0.25,
            null_rate: 0.1,
        }
    }
}

/// A single generated operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Add { key: i64, value: i64 },
    AddNn { key: i64, value: Option<i64> },
    Insert { key: i64, value: i64 },
    Update { key: i64, value: i64 },
    Remove { key: i64 },
    RemoveEntry { key: i64, value: i64 },
}

/// Generator for random operations.
pub struct OpGenerator {
    rng: StdRng,
    config: OpGenConfig,
}

impl OpGenerator {
    /// Create a generator with the default configuration.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self::with_config(seed, OpGenConfig::default())
    }

    #[must_use]
    pub fn with_config(seed: u64, config: OpGenConfig) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            config,
        }
    }

    pub const fn config(&self) -> &OpGenConfig {
        &self.config
    }

    /// Generate the next operation.
    pub fn next_operation(&mut self) -> Operation {
        let key = self.rng.random_range(0..self.config.key_space);
        let value = self.rng.random_range(0..self.config.value_space);
        let strict = self.rng.random::<f64>() < self.config.strict_rate;

        if self.rng.random::<f64>() < self.config.remove_rate {
            return if strict {
                Operation::RemoveEntry { key, value }
            } else {
                Operation::Remove { key }
            };
        }
        if strict {
            return if self.rng.random_bool(0.5) {
                Operation::Insert { key, value }
            } else {
                Operation::Update { key, value }
            };
        }
        if self.rng.random::<f64>() < self.config.null_rate {
            return Operation::AddNn { key, value: None };
        }
        if self.rng.random_bool(0.5) {
            Operation::AddNn {
                key,
                value: Some(value),
            }
        } else {
            Operation::Add { key, value }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_seed_same_sequence() {
        let mut a = OpGenerator::new(7);
        let mut b = OpGenerator::new(7);
        for _ in 0..100 {
            assert_eq!(a.next_operation(), b.next_operation());
        }
    }

    #[test]
    fn test_keys_stay_in_key_space() {
        let config = OpGenConfig {
            key_space: 10,
            ..OpGenConfig::default()
        };
        let mut generator = OpGenerator::with_config(3, config);
        for _ in 0..500 {
            let key = match generator.next_operation() {
                Operation::Add { key, .. }
                | Operation::AddNn { key, .. }
                | Operation::Insert { key, .. }
                | Operation::Update { key, .. }
                | Operation::Remove { key }
                | Operation::RemoveEntry { key, .. } => key,
            };
            assert!((0..10).contains(&key));
        }
    }

    #[test]
    fn test_remove_rate_zero_never_removes() {
        let config = OpGenConfig {
            remove_rate: 0.0,
            ..OpGenConfig::default()
        };
        let mut generator = OpGenerator::with_config(11, config);
        for _ in 0..500 {
            assert!(!matches!(
                generator.next_operation(),
                Operation::Remove { .. } | Operation::RemoveEntry { .. }
            ));
        }
    }
}
