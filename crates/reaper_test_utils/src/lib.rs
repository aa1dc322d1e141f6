//! # Reaper Test Utilities
//!
//! Shared testing utilities for the workspace:
//! - Unit, world and player fixtures
//! - A scripted match that drives the decision core round by round
//! - Determinism test harness
//! - Property-based testing strategies

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod determinism;
pub mod fixtures;

/// Re-export proptest for convenience.
pub use proptest;
