//! Error types for the decision core.

use thiserror::Error;

use crate::goal::GoalType;

/// Result type alias using [`DecisionError`].
pub type Result<T> = std::result::Result<T, DecisionError>;

/// Top-level error type for the decision core.
#[derive(Debug, Error)]
pub enum DecisionError {
    /// A goal was asked for a target while no candidate exists for it.
    #[error("No target available for goal {goal}")]
    ImpossibleTarget {
        /// Goal that could not be served.
        goal: GoalType,
    },

    /// A goal identifier outside the known vocabulary.
    #[error("Unknown goal type: {0}")]
    UnknownGoalType(String),

    /// The player snapshot has no controllable reaper.
    #[error("Player {0} has no reaper on the field")]
    MissingOwnUnit(u8),

    /// Configuration failed validation.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Configuration file does not exist.
    #[error("Configuration file not found: {0}")]
    ConfigNotFound(String),

    /// Configuration could not be written out.
    #[error("Failed to serialize configuration: {0}")]
    ConfigSerialize(#[from] ron::Error),

    /// Configuration file could not be parsed.
    #[error("Failed to parse configuration: {0}")]
    ConfigParse(#[from] ron::error::SpannedError),

    /// Value table (de)serialization failed.
    #[error("Value table serialization failed: {0}")]
    Persistence(#[from] bincode::Error),

    /// Persisted value table was written by an incompatible version.
    #[error("Value table version mismatch: expected {expected}, found {found}")]
    TableVersionMismatch {
        /// Version this build writes.
        expected: u32,
        /// Version found on disk.
        found: u32,
    },

    /// Filesystem error while loading or saving.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
