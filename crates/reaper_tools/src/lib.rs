//! # Reaper Development Tools
//!
//! Command-line tools for working on the decision core:
//! - Configuration validation
//! - Planner runs and parallel distance sweeps
//! - Value table inspection

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

pub mod error;
pub mod inspect;
pub mod plan;
pub mod validate;

pub use error::{Result, ToolError};
