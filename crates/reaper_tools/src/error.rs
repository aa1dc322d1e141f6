//! Tool error types.

use thiserror::Error;

/// Errors reported by the tools.
#[derive(Debug, Error)]
pub enum ToolError {
    /// The decision core rejected an input.
    #[error(transparent)]
    Decision(#[from] reaper_core::error::DecisionError),

    /// JSON rendering failed.
    #[error("JSON output failed: {0}")]
    Json(#[from] serde_json::Error),

    /// A command-line argument is out of range.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

/// Result alias for tool operations.
pub type Result<T> = std::result::Result<T, ToolError>;
