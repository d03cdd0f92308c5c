//! Error types for the memory game engine.
//!
//! None of these cross the host boundary as failures: route handlers turn
//! them into JSON error documents and the engine turns them into
//! `diagnostic` events.

use thiserror::Error;

/// Main error type for engine operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// Phase id not present in the catalog
    #[error("unknown phase `{0}`")]
    UnknownPhase(String),

    /// Round outside the playable range
    #[error("round {round} is outside 1..={max}")]
    InvalidRound { round: u8, max: u8 },

    /// Catalog cannot supply enough tokens for the round (includes empty words)
    #[error("phase `{phase}` cannot supply round {round}: needs {needed} syllables, has {available}")]
    IncompleteSequence {
        phase: String,
        round: u8,
        needed: usize,
        available: usize,
    },

    /// Two syllables of one word share a progress key
    #[error("phase `{phase}` repeats syllable `{syllable}`")]
    DuplicateSyllable { phase: String, syllable: String },

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// Catalog parse error
    #[error("catalog error: {0}")]
    Catalog(String),

    /// Snapshot decode or consistency error
    #[error("snapshot error: {0}")]
    Snapshot(String),

    #[error("phase `{0}` is not complete yet")]
    PhaseNotComplete(String),

    #[error("phase `{0}` is the final phase")]
    NoNextPhase(String),

    #[error("engine is not active")]
    Inactive,
}

/// Result type for engine operations
pub type EngineResult<T> = Result<T, EngineError>;

impl EngineError {
    /// Create a config error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a snapshot error
    pub fn snapshot(msg: impl Into<String>) -> Self {
        Self::Snapshot(msg.into())
    }

    /// Create a catalog error
    pub fn catalog(msg: impl Into<String>) -> Self {
        Self::Catalog(msg.into())
    }

    /// Whether this error means the catalog broke its own invariants, as
    /// opposed to a bad request from the host.
    pub fn is_invariant_violation(&self) -> bool {
        matches!(
            self,
            Self::IncompleteSequence { .. } | Self::DuplicateSyllable { .. }
        )
    }
}
