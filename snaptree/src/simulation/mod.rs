//! Deterministic simulation testing for trees.
//!
//! This module drives a tree with long random sequences of operations and
//! checks it against a `BTreeMap` model after every step:
//! - Reproducible operation generation from a seed
//! - Invariant checking after each operation
//! - Old versions re-checked at the end to prove they never changed
//!
//! # Design Principles
//!
//! 1. All randomness is seeded for reproducibility
//! 2. Given the same seed, execution is identical
//! 3. Every rejected operation must be rejected for the reason the model
//!    predicts
//!
//! # Usage
//!
//! ```ignore
//! use simulation::simulator::{Simulator, SimulatorConfig};
//!
//! let config = SimulatorConfig::new(12345) // seed
//!     .with_remove_rate(0.5);
//!
//! let mut sim = Simulator::new(config);
//! let result = sim.run(1000); // Run 1000 operations
//!
//! assert!(result.invariant_violations.is_empty());
//! ```

mod op_gen;
mod simulator;

pub use invariants::{InvariantChecker, InvariantViolation};
pub use op_gen::{OpGenConfig, OpGenerator, Operation};
