//! Error types shared by the tree and the engine layers above it.
//!
//! - [`TreeError`]: failures of tree operations, each with a short engine code.
//! - [`EngineError`]: internal engine failure; logged when constructed.
//! - [`DatabaseError`]: SQL-standard failure with a signal string, meant to
//!   reach the client unchanged.

/// Errors that can occur during tree operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TreeError {
    /// A value was required but none was supplied.
    NullAssociation,
    /// The strict insert found the key already present.
    DuplicateKey,
    /// The strict update did not find the key.
    MissingKey,
    /// A structural invariant does not hold.
    Corrupt(&'static str),
    /// The lock guarding a shared tree was poisoned by a panicking writer.
    LockPoisoned,
}

impl TreeError {
    /// The engine's short code for this error.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::NullAssociation => "PE000",
            Self::MissingKey => "PE01",
            Self::DuplicateKey => "PE02",
            Self::Corrupt(_) => "PE03",
            Self::LockPoisoned => "PE04",
        }
    }
}

impl std::fmt::Display for TreeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NullAssociation => write!(f, "{}: null association", self.code()),
            Self::DuplicateKey => write!(f, "{}: key already present", self.code()),
            Self::MissingKey => write!(f, "{}: key not present", self.code()),
            Self::Corrupt(what) => write!(f, "{}: tree corrupted: {what}", self.code()),
            Self::LockPoisoned => write!(f, "{}: shared tree lock poisoned", self.code()),
        }
    }
}

impl std::error::Error for TreeError {}

/// An internal failure of the engine.
///
/// Construction emits a diagnostic line, so the failure is recorded even if a
/// caller higher up discards the error.
#[derive(Debug)]
pub struct EngineError {
    message: String,
    source: Option<TreeError>,
}

impl EngineError {
    /// Create a new internal failure and log it.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        let message = message.into();
        tracing::error!("engine failure: {message}");
        Self {
            message,
            source: None,
        }
    }

    /// The failure message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl std::fmt::Display for EngineError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "engine failure: {}", self.message)
    }
}

impl std::error::Error for EngineError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| e as &(dyn std::error::Error + 'static))
    }
}

impl From<TreeError> for EngineError {
    fn from(e: TreeError) -> Self {
        let mut error = Self::new(e.to_string());
        error.source = Some(e);
        error
    }
}

/// A failure conforming to the SQL standard.
///
/// The signal is a fixed SQLSTATE-style string; the message is free text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseError {
    signal: String,
    message: String,
}

impl DatabaseError {
    /// Create a new failure with the given signal and message.
    #[must_use]
    pub fn new(signal: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            signal: signal.into(),
            message: message.into(),
        }
    }

    /// The signal string.
    #[must_use]
    pub fn signal(&self) -> &str {
        &self.signal
    }

    /// The message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl std::fmt::Display for DatabaseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.signal)?;
        if !self.message.is_empty() {
            write!(f, ": {}", self.message)?;
        }
        Ok(())
    }
}

impl std::error::Error for DatabaseError {}
