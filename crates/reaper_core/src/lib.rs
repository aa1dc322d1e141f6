//! # Reaper Core
//!
//! Per-round decision core for an arena reaper.
//!
//! Each round the world is reduced to a small relational state over grid
//! categories, a learned table picks a goal for that state, a concrete target
//! is extracted for the goal, and a genetic planner produces the throttle that
//! drives the reaper there. Missions are rewarded when they resolve and,
//! for successful harvests and rams, once more over a short horizon.
//!
//! This crate does no IO beyond loading configuration and persisting the
//! learned table, and draws randomness only from a seeded generator.
//!
//! ## Crate Structure
//!
//! - [`categorize`] - Grid cells and distance/risk categories
//! - [`world`] - Units, grid indices and player state
//! - [`relation`] - Relational state built from a world snapshot
//! - [`qstate`] - State keys and the learned value table
//! - [`policy`] - Epsilon-greedy goal selection
//! - [`selector`] - Target extraction and goal feasibility
//! - [`tracker`] / [`availability`] - Target tracking and goal validity
//! - [`mission`] / [`long_term`] - Immediate and delayed rewards
//! - [`planner`] - Genetic throttle planner
//! - [`decision`] - Per-round orchestration

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

pub mod availability;
pub mod categorize;
pub mod config;
pub mod decision;
pub mod error;
pub mod goal;
pub mod long_term;
pub mod math;
pub mod mission;
pub mod planner;
pub mod policy;
pub mod qstate;
pub mod relation;
pub mod selector;
pub mod tracker;
pub mod world;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::availability::Availability;
    pub use crate::categorize::{DistanceCategory, GridCell, RiskCategory, SpatialCategorizer};
    pub use crate::config::DecisionConfig;
    pub use crate::decision::{DecisionOrchestrator, DecisionType, MovementCommand, RoundDecision};
    pub use crate::error::{DecisionError, Result};
    pub use crate::goal::{GoalFamily, GoalType};
    pub use crate::math::Vec2;
    pub use crate::planner::{PlanInput, PlannerConfig, PlannerPreset, ThrottlePathPlanner};
    pub use crate::qstate::{QStateKey, QTable};
    pub use crate::relation::{RelationalState, RelationalStateBuilder};
    pub use crate::selector::SelectedTarget;
    pub use crate::world::{HostileGroup, PlayerId, PlayerState, Unit, UnitId, UnitKind, WorldSnapshot};
}
