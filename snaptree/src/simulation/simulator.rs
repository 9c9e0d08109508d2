//! Main simulator harness for deterministic simulation testing.
//!
//! Applies generated operations to a tree and to a `BTreeMap` model side by
//! side, checks the invariants after each one, and keeps periodic snapshots
//! of earlier versions to re-check once the run is over.

use std::collections::BTreeMap;

use crate::config::TreeConfig;
use crate::error::TreeError;
use crate::tree::Tree;

use super::{InvariantChecker, InvariantViolation, OpGenConfig, OpGenerator, Operation};

/// Configuration for the simulator.
#[derive(Debug, Clone)]
pub struct SimulatorConfig {
    /// Random seed for reproducibility.
    pub seed: u64,
    /// Configuration of the tree under test.
    pub tree_config: TreeConfig,
    /// Operation generation configuration.
    pub op_config: OpGenConfig,
    /// Keep a snapshot of the tree every this many operations.
    pub snapshot_interval: usize,
}

impl SimulatorConfig {
    /// Create a new simulator config with the given seed.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            tree_config: TreeConfig::default(),
            op_config: OpGenConfig::default(),
            snapshot_interval: 50,
        }
    }

    /// Set the tree configuration.
    #[must_use]
    pub const fn with_tree_config(mut self, config: TreeConfig) -> Self {
        self.tree_config = config;
        self
    }

    /// Set the operation configuration.
    #[must_use]
    pub const fn with_op_config(mut self, config: OpGenConfig) -> Self {
        self.op_config = config;
        self
    }

    /// Set the removal rate.
    #[must_use]
    pub const fn with_remove_rate(mut self, rate: f64) -> Self {
        self.op_config.remove_rate = rate;
        self
    }
}

/// Results from a simulation run.
#[derive(Debug)]
pub struct SimulationResult {
    /// The seed used for this simulation.
    pub seed: u64,
    /// Number of operations processed.
    pub operations_processed: u64,
    /// Number of operations that produced a new version.
    pub successful_operations: u64,
    /// Number of operations rejected as the model predicted.
    pub failed_operations: u64,
    /// Number of associations left in the final tree.
    pub final_count: u64,
    /// Height of the final tree.
    pub final_height: usize,
    /// Invariant violations detected.
    pub invariant_violations: Vec<InvariantViolation>,
}

impl SimulationResult {
    /// Check if the simulation passed (no invariant violations).
    #[must_use]
    pub const fn passed(&self) -> bool {
        self.invariant_violations.is_empty()
    }
}

/// The main simulator harness.
pub struct Simulator {
    config: SimulatorConfig,
    generator: OpGenerator,
    checker: InvariantChecker,
    tree: Tree<i64, i64>,
    model: BTreeMap<i64, i64>,
    snapshots: Vec<(usize, Tree<i64, i64>, BTreeMap<i64, i64>)>,
    operations_processed: u64,
    successful_operations: u64,
    failed_operations: u64,
}

impl Simulator {
    /// Create a new simulator with the given configuration.
    #[must_use]
    pub fn new(config: SimulatorConfig) -> Self {
        let generator = OpGenerator::with_config(config.seed, config.op_config.clone());
        let tree = Tree::with_config(config.tree_config);
        Self {
            config,
            generator,
            checker: InvariantChecker::new(),
            tree,
            model: BTreeMap::new(),
            snapshots: Vec::new(),
            operations_processed: 0,
            successful_operations: 0,
            failed_operations: 0,
        }
    }

    /// Run the simulation for a given number of operations.
    ///
    /// Checks invariants after each operation, then re-checks every kept
    /// snapshot against the model state it was taken with.
    pub fn run(mut self, operation_count: usize) -> SimulationResult {
        let key_space = self.generator.config().key_space;

        for index in 0..operation_count {
            let operation = self.generator.next_operation();
            self.operations_processed += 1;

            match self.apply(operation, index) {
                Ok(true) => self.successful_operations += 1,
                Ok(false) => self.failed_operations += 1,
                Err(e) => {
                    self.checker.add_violation(InvariantViolation {
                        description: format!("{operation:?} failed: {e}"),
                        operation_index: index,
                        context: self.tree.to_string(),
                    });
                }
            }
            self.checker.check_tree(&self.tree, &self.model, key_space, index);

            if index % self.config.snapshot_interval == 0 {
                self.snapshots
                    .push((index, self.tree.clone(), self.model.clone()));
            }
        }

        for (index, tree, model) in &self.snapshots {
            self.checker.check_tree(tree, model, key_space, *index);
        }

        tracing::debug!(
            seed = self.config.seed,
            operations = self.operations_processed,
            count = self.tree.count(),
            height = self.tree.height(),
            "simulation finished"
        );

        SimulationResult {
            seed: self.config.seed,
            operations_processed: self.operations_processed,
            successful_operations: self.successful_operations,
            failed_operations: self.failed_operations,
            final_count: self.tree.count(),
            final_height: self.tree.height(),
            invariant_violations: self.checker.into_violations(),
        }
    }

    /// Apply one operation to the tree and the model.
    ///
    /// Returns whether the operation changed anything. A rejection the
    /// model does not predict is reported as a violation.
    fn apply(&mut self, operation: Operation, index: usize) -> Result<bool, TreeError> {
        let present = |model: &BTreeMap<i64, i64>, key: i64| model.contains_key(&key);
        match operation {
            Operation::Add { key, value } => {
                self.tree = self.tree.add(key, value);
                self.model.insert(key, value);
                Ok(true)
            }
            Operation::AddNn { key, value } => match (value, self.tree.add_nn(key, value)) {
                (Some(value), Ok(tree)) => {
                    self.tree = tree;
                    self.model.insert(key, value);
                    Ok(true)
                }
                (None, Err(TreeError::NullAssociation)) => Ok(false),
                (_, Err(e)) => Err(e),
                (None, Ok(_)) => {
                    self.unexpected(index, "add_nn accepted a null value");
                    Ok(false)
                }
            },
            Operation::Insert { key, value } => {
                let expected_duplicate = present(&self.model, key);
                match self.tree.insert(key, value) {
                    Ok(tree) if !expected_duplicate => {
                        self.tree = tree;
                        self.model.insert(key, value);
                        Ok(true)
                    }
                    Err(TreeError::DuplicateKey) if expected_duplicate => Ok(false),
                    Ok(_) => {
                        self.unexpected(index, "insert accepted a duplicate key");
                        Ok(false)
                    }
                    Err(e) => Err(e),
                }
            }
            Operation::Update { key, value } => {
                let expected_missing = !present(&self.model, key);
                match self.tree.update(&key, value) {
                    Ok(tree) if !expected_missing => {
                        self.tree = tree;
                        self.model.insert(key, value);
                        Ok(true)
                    }
                    Err(TreeError::MissingKey) if expected_missing => Ok(false),
                    Ok(_) => {
                        self.unexpected(index, "update accepted a missing key");
                        Ok(false)
                    }
                    Err(e) => Err(e),
                }
            }
            Operation::Remove { key } => {
                let tree = self.tree.remove(&key)?;
                let removed = self.model.remove(&key).is_some();
                if !removed && !tree.same_root(&self.tree) {
                    self.unexpected(index, "removing an absent key built a new root");
                }
                self.tree = tree;
                Ok(removed)
            }
            Operation::RemoveEntry { key, value } => {
                self.tree = self.tree.remove_entry(&key, &value)?;
                if self.model.get(&key) == Some(&value) {
                    self.model.remove(&key);
                    return Ok(true);
                }
                Ok(false)
            }
        }
    }

    fn unexpected(&mut self, index: usize, description: &str) {
        self.checker.add_violation(InvariantViolation {
            description: description.to_string(),
            operation_index: index,
            context: self.tree.to_string(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_passes(result: &SimulationResult) {
        assert!(
            result.passed(),
            "seed {} failed: {}",
            result.seed,
            result
                .invariant_violations
                .iter()
                .take(5)
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join("\n")
        );
    }

    #[test]
    fn test_simulator_basic() {
        let result = Simulator::new(SimulatorConfig::new(12345)).run(300);
        assert_passes(&result);
        assert_eq!(result.operations_processed, 300);
        assert_eq!(
            result.successful_operations + result.failed_operations,
            300
        );
        assert!(result.final_count > 0);
    }

    #[test]
    fn test_simulator_deterministic() {
        let first = Simulator::new(SimulatorConfig::new(777)).run(200);
        let second = Simulator::new(SimulatorConfig::new(777)).run(200);
        assert_eq!(first.successful_operations, second.successful_operations);
        assert_eq!(first.failed_operations, second.failed_operations);
        assert_eq!(first.final_count, second.final_count);
        assert_eq!(first.final_height, second.final_height);
    }

    #[test]
    fn test_simulator_across_fanouts() {
        for fanout in [4, 6, 8, 16, 32] {
            let tree_config = TreeConfig::new(fanout, 0).expect("valid fanout");
            for seed in [1, 2, 3] {
                let config = SimulatorConfig::new(seed).with_tree_config(tree_config);
                assert_passes(&Simulator::new(config).run(400));
            }
        }
    }

    #[test]
    fn test_simulator_growth_only() {
        let tree_config = TreeConfig::new(4, 0).expect("valid fanout");
        let config = SimulatorConfig::new(42)
            .with_tree_config(tree_config)
            .with_remove_rate(0.0);
        let result = Simulator::new(config).run(500);
        assert_passes(&result);
        assert!(result.final_height >= 3);
    }

    #[test]
    fn test_simulator_removal_heavy() {
        let config = SimulatorConfig::new(99).with_op_config(OpGenConfig {
            key_space: 60,
            remove_rate: 0.6,
            ..OpGenConfig::default()
        });
        let result = Simulator::new(config).run(1000);
        assert_passes(&result);
        assert!(result.failed_operations > 0);
    }

    #[test]
    fn test_simulator_wide_key_space() {
        let config = SimulatorConfig::new(2024).with_op_config(OpGenConfig {
            key_space: 2000,
            remove_rate: 0.3,
            ..OpGenConfig::default()
        });
        assert_passes(&Simulator::new(config).run(600));
    }

    #[test]
    #[ignore] // Long running test
    fn test_simulator_stress() {
        for (seed, fanout) in (0..50).zip([4, 6, 8, 10, 12, 14].into_iter().cycle()) {
            let tree_config = TreeConfig::new(fanout, 0).expect("valid");
            let config = SimulatorConfig::new(seed).with_tree_config(tree_config);
            assert_passes(&Simulator::new(config).run(5000));
        }
    }
}
