//! Target selection and goal feasibility.
//!
//! A goal is feasible exactly when its target extractor finds a candidate,
//! so feasibility and selection can never disagree. [`select_target`] still
//! reports [`DecisionError::ImpossibleTarget`] when called for a goal with
//! no candidate.

use serde::{Deserialize, Serialize};

use crate::categorize::{DistanceCategory, RiskCategory};
use crate::error::{DecisionError, Result};
use crate::goal::{GoalFamily, GoalType};
use crate::relation::{HostileKey, RelationMap, RelationalState, ResourceKey};
use crate::world::{HostileGroup, PlayerId, UnitId, UnitKind};

/// Concrete target chosen for a goal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectedTarget {
    /// Target unit id.
    pub id: UnitId,
    /// Target kind, used to find it again in later rounds.
    pub kind: UnitKind,
    /// Owning player of the target, filled in once the unit is looked up.
    pub owner: Option<PlayerId>,
}

impl SelectedTarget {
    /// Create a target without owner information.
    #[must_use]
    pub const fn new(id: UnitId, kind: UnitKind) -> Self {
        Self {
            id,
            kind,
            owner: None,
        }
    }

    /// Attach the owning player.
    #[must_use]
    pub const fn with_owner(mut self, owner: Option<PlayerId>) -> Self {
        self.owner = owner;
        self
    }
}

/// First candidate for a goal, or `None` when the goal has no candidate.
///
/// `wait` never has a target.
#[must_use]
pub fn candidate(state: &RelationalState, goal: GoalType) -> Option<SelectedTarget> {
    match goal.family() {
        GoalFamily::Harvest => {
            let risk = goal.risk()?;
            first_by_distance(&state.wreck_vs_primary, risk)
                .map(|id| SelectedTarget::new(id, UnitKind::Wreck))
        }
        GoalFamily::MoveTanker => {
            let risk = goal.risk()?;
            first_by_distance(&state.tanker_vs_hostiles, risk)
                .map(|id| SelectedTarget::new(id, UnitKind::Tanker))
        }
        GoalFamily::Ram(group) => {
            let distance = goal.distance()?;
            first_by_resource(state.hostiles(group), distance)
                .map(|id| SelectedTarget::new(id, UnitKind::Hostile(group)))
        }
        GoalFamily::UseSpecial => RiskCategory::ALL
            .into_iter()
            .find_map(|risk| first_by_distance(&state.wreck_vs_primary, risk))
            .map(|id| SelectedTarget::new(id, UnitKind::Wreck)),
        GoalFamily::Wait => None,
    }
}

/// Whether a goal can be pursued in this state.
#[must_use]
pub fn is_feasible(state: &RelationalState, goal: GoalType) -> bool {
    match goal.family() {
        GoalFamily::Wait => true,
        GoalFamily::UseSpecial => state.special_available && candidate(state, goal).is_some(),
        _ => candidate(state, goal).is_some(),
    }
}

/// Target for a goal.
///
/// Returns `Ok(None)` for `wait`.
///
/// # Errors
///
/// Returns [`DecisionError::ImpossibleTarget`] if the goal needs a target and
/// none exists.
pub fn select_target(state: &RelationalState, goal: GoalType) -> Result<Option<SelectedTarget>> {
    if goal.family() == GoalFamily::Wait {
        return Ok(None);
    }
    candidate(state, goal)
        .map(Some)
        .ok_or(DecisionError::ImpossibleTarget { goal })
}

fn first_by_distance(map: &RelationMap<ResourceKey>, risk: RiskCategory) -> Option<UnitId> {
    DistanceCategory::ALL
        .into_iter()
        .find_map(|distance| map.first(ResourceKey::new(distance, risk)))
}

fn first_by_resource(map: &RelationMap<HostileKey>, distance: DistanceCategory) -> Option<UnitId> {
    [DistanceCategory::Close, DistanceCategory::Medium]
        .into_iter()
        .find_map(|resource| map.first(HostileKey::new(distance, resource)))
}

/// Hostile group a ram target belongs to, if the target is a hostile.
#[must_use]
pub const fn hostile_group(target: &SelectedTarget) -> Option<HostileGroup> {
    match target.kind {
        UnitKind::Hostile(group) => Some(group),
        _ => None,
    }
}
