//! Tree configuration module.
//!
//! This module provides the configuration passed to every tree at
//! construction, and loading of that configuration from environment
//! variables.
//!
//! # Environment Variables
//!
//! - `SNAPTREE_FANOUT`: Maximum number of slots in a node (default: `8`)
//! - `SNAPTREE_MEMORY_LIMIT`: Soft cap on node memory in bytes (default: `0`, no limit)
//!
//! # Invariants
//!
//! - `fanout` is always even and in the range 4-255
//! - `memory_limit` of zero means unlimited

/// Tree configuration.
///
/// Trees carry their configuration by value, so differently configured
/// trees can coexist in one process.
///
/// # Post-conditions
///
/// When constructed via `new()` or `from_env()`:
/// - `fanout` is even and in the range 4-255
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TreeConfig {
    /// Maximum number of slots in a node.
    /// Full nodes are split before an insert descends into them.
    fanout: usize,
    /// Soft cap on the memory used by nodes, in bytes.
    /// Carried for the surrounding engine; the tree does not enforce it.
    memory_limit: u64,
}

/// Error returned when loading configuration fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// An environment variable has an invalid value.
    InvalidValue { name: String, message: String },
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidValue { name, message } => {
                write!(f, "invalid value for {name}: {message}")
            }
        }
    }
}

impl std::error::Error for ConfigError {}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            fanout: Self::DEFAULT_FANOUT,
            memory_limit: Self::DEFAULT_MEMORY_LIMIT,
        }
    }
}

impl TreeConfig {
    /// Default maximum number of slots in a node.
    pub const DEFAULT_FANOUT: usize = 8;
    /// Default memory limit (no limit).
    pub const DEFAULT_MEMORY_LIMIT: u64 = 0;
    /// Smallest fan-out that still leaves a non-empty low half on split.
    pub const MIN_FANOUT: usize = 4;
    /// Largest fan-out; slot counts fit in a byte.
    pub const MAX_FANOUT: usize = 255;

    const FANOUT_VAR: &'static str = "SNAPTREE_FANOUT";
    const MEMORY_LIMIT_VAR: &'static str = "SNAPTREE_MEMORY_LIMIT";

    /// Create a configuration with the given fan-out and memory limit.
    ///
    /// # Errors
    ///
    /// Returns an error if `fanout` is odd or outside 4-255.
    pub fn new(fanout: usize, memory_limit: u64) -> Result<Self, ConfigError> {
        Self::validate_fanout(Self::FANOUT_VAR, fanout)?;
        Ok(Self {
            fanout,
            memory_limit,
        })
    }

    /// Load configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `SNAPTREE_FANOUT`: Node fan-out (default: `8`)
    /// - `SNAPTREE_MEMORY_LIMIT`: Memory limit in bytes (default: `0`)
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - `SNAPTREE_FANOUT` is set but not an even number in 4-255
    /// - `SNAPTREE_MEMORY_LIMIT` is set but not a non-negative integer
    pub fn from_env() -> Result<Self, ConfigError> {
        let fanout = Self::load_fanout()?;
        let memory_limit = Self::load_memory_limit()?;

        Ok(Self {
            fanout,
            memory_limit,
        })
    }

    /// Maximum number of slots in a node.
    #[must_use]
    pub const fn fanout(&self) -> usize {
        self.fanout
    }

    /// Soft memory cap in bytes, zero for none.
    #[must_use]
    pub const fn memory_limit(&self) -> u64 {
        self.memory_limit
    }

    /// Number of slots in the low half of a split leaf.
    #[must_use]
    pub(crate) const fn half(&self) -> usize {
        self.fanout >> 1
    }

    /// Fewest slots a non-root node may keep after a removal.
    ///
    /// An inner split leaves `half() - 1` slots in its low half, so this is
    /// the bound both node kinds are held to.
    #[must_use]
    pub(crate) const fn min_slots(&self) -> usize {
        self.half() - 1
    }

    /// Load the fan-out from environment.
    ///
    /// Returns the default if not set.
    fn load_fanout() -> Result<usize, ConfigError> {
        Self::parse_fanout(std::env::var(Self::FANOUT_VAR).ok().as_deref())
    }

    /// Load the memory limit from environment.
    ///
    /// Returns the default if not set.
    fn load_memory_limit() -> Result<u64, ConfigError> {
        Self::parse_memory_limit(std::env::var(Self::MEMORY_LIMIT_VAR).ok().as_deref())
    }

    fn parse_fanout(value: Option<&str>) -> Result<usize, ConfigError> {
        let Some(value) = value else {
            return Ok(Self::DEFAULT_FANOUT);
        };
        let fanout = value
            .parse::<usize>()
            .map_err(|_| ConfigError::InvalidValue {
                name: Self::FANOUT_VAR.to_string(),
                message: format!("'{value}' is not a valid number"),
            })?;
        Self::validate_fanout(Self::FANOUT_VAR, fanout)?;
        Ok(fanout)
    }

    fn parse_memory_limit(value: Option<&str>) -> Result<u64, ConfigError> {
        let Some(value) = value else {
            return Ok(Self::DEFAULT_MEMORY_LIMIT);
        };
        value.parse::<u64>().map_err(|_| ConfigError::InvalidValue {
            name: Self::MEMORY_LIMIT_VAR.to_string(),
            message: format!("'{value}' is not a valid byte count"),
        })
    }

    fn validate_fanout(name: &str, fanout: usize) -> Result<(), ConfigError> {
        if !(Self::MIN_FANOUT..=Self::MAX_FANOUT).contains(&fanout) {
            return Err(ConfigError::InvalidValue {
                name: name.to_string(),
                message: format!(
                    "{fanout} is out of range (must be {}-{})",
                    Self::MIN_FANOUT,
                    Self::MAX_FANOUT
                ),
            });
        }
        if !fanout.is_multiple_of(2) {
            return Err(ConfigError::InvalidValue {
                name: name.to_string(),
                message: format!("{fanout} must be even"),
            });
        }
        Ok(())
    }
}
