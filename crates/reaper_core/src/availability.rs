//! Goal availability state machine.
//!
//! Pure functions over a tracker and the target's presence. `Invalid` and
//! `Reached` end the mission, `Valid` and `Replan` keep it alive; `Replan`
//! additionally discards the cached throttle plan.

use serde::{Deserialize, Serialize};

use crate::goal::{GoalFamily, GoalType};
use crate::tracker::TargetTracker;

/// Outcome of the per-round availability check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Availability {
    /// Keep going with the current plan.
    Valid,
    /// Mission failed.
    Invalid,
    /// Keep the goal but plan a fresh path.
    Replan,
    /// Mission succeeded.
    Reached,
}

impl Availability {
    /// Whether the mission ends this round.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Invalid | Self::Reached)
    }
}

/// Limits for goals that approach a stationary target.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ApproachLimits {
    /// Consecutive growing-distance rounds that trigger a replan.
    pub replan_window: usize,
    /// Rounds allowed before the mission is abandoned.
    pub round_cap: u32,
    /// Distance at which the target counts as reached.
    pub reach_distance: f64,
}

/// Limits for ram goals.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RamLimits {
    /// Consecutive growing-distance rounds that trigger a replan.
    pub replan_window: usize,
    /// Rounds allowed before the mission is abandoned.
    pub round_cap: u32,
}

/// Limits for every goal family.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AvailabilityLimits {
    /// Harvest goals.
    pub harvest: ApproachLimits,
    /// Tanker goals.
    pub move_tanker: ApproachLimits,
    /// Ram goals.
    pub ram: RamLimits,
    /// Rounds a wait lasts.
    pub wait_rounds: u32,
    /// Rounds a special skill lasts.
    pub special_rounds: u32,
}

impl Default for AvailabilityLimits {
    fn default() -> Self {
        Self {
            harvest: ApproachLimits {
                replan_window: 3,
                round_cap: 10,
                reach_distance: 25.0,
            },
            move_tanker: ApproachLimits {
                replan_window: 3,
                round_cap: 15,
                reach_distance: 50.0,
            },
            ram: RamLimits {
                replan_window: 1,
                round_cap: 10,
            },
            wait_rounds: 1,
            special_rounds: 1,
        }
    }
}

/// Availability of the current goal.
///
/// `target_present` reports whether the target still exists in this round's
/// world; it is ignored for `wait`.
#[must_use]
pub fn determine(
    goal: GoalType,
    target_present: bool,
    tracker: &dyn TargetTracker,
    limits: &AvailabilityLimits,
) -> Availability {
    match goal.family() {
        GoalFamily::Harvest => approach(target_present, tracker, &limits.harvest),
        GoalFamily::MoveTanker => approach(target_present, tracker, &limits.move_tanker),
        GoalFamily::Ram(_) => ram(target_present, tracker, &limits.ram),
        GoalFamily::UseSpecial => {
            if !target_present {
                return Availability::Invalid;
            }
            rounds_elapsed(tracker, limits.special_rounds)
        }
        GoalFamily::Wait => rounds_elapsed(tracker, limits.wait_rounds),
    }
}

fn approach(target_present: bool, tracker: &dyn TargetTracker, limits: &ApproachLimits) -> Availability {
    if !target_present || tracker.steps_taken() > limits.round_cap {
        return Availability::Invalid;
    }
    // Reaching wins over a drifting distance.
    if tracker.is_within_threshold(limits.reach_distance) {
        return Availability::Reached;
    }
    if tracker.is_distance_growing(limits.replan_window) {
        return Availability::Replan;
    }
    Availability::Valid
}

fn ram(target_present: bool, tracker: &dyn TargetTracker, limits: &RamLimits) -> Availability {
    if !target_present || tracker.steps_taken() > limits.round_cap {
        return Availability::Invalid;
    }
    if tracker.is_within_collision_radius() {
        if tracker.is_moving_towards_target() && tracker.is_higher_momentum() {
            return Availability::Reached;
        }
        return Availability::Invalid;
    }
    if tracker.is_distance_growing(limits.replan_window) || tracker.is_moving_towards_target() {
        return Availability::Replan;
    }
    Availability::Valid
}

fn rounds_elapsed(tracker: &dyn TargetTracker, limit: u32) -> Availability {
    if tracker.steps_taken() > limit {
        Availability::Reached
    } else {
        Availability::Valid
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::Vec2;
    use crate::tracker::{tracker_for, DynamicTargetTracker, StaticTargetTracker};
    use crate::world::{HostileGroup, Unit, UnitKind};

    fn reaper_at(x: f64) -> Unit {
        Unit::new(0, UnitKind::OwnUnit, Vec2::new(x, 0.0))
    }

    fn wreck() -> Unit {
        Unit::new(1, UnitKind::Wreck, Vec2::ZERO)
    }

    #[test]
    fn test_harvest_valid_while_approaching() {
        let mut tracker = StaticTargetTracker::default();
        tracker.track(&reaper_at(1400.0), Some(&wreck()));
        tracker.track(&reaper_at(30.0), Some(&wreck()));
        let limits = AvailabilityLimits::default();
        assert_eq!(
            determine(GoalType::HarvestSafe, true, &tracker, &limits),
            Availability::Valid
        );
    }

    #[test]
    fn test_harvest_reached_and_vanished() {
        let mut tracker = StaticTargetTracker::default();
        tracker.track(&reaper_at(10.0), Some(&wreck()));
        let limits = AvailabilityLimits::default();
        assert_eq!(
            determine(GoalType::HarvestRisky, true, &tracker, &limits),
            Availability::Reached
        );
        assert_eq!(
            determine(GoalType::HarvestRisky, false, &tracker, &limits),
            Availability::Invalid
        );
    }

    #[test]
    fn test_harvest_replans_after_growing_window() {
        let mut tracker = StaticTargetTracker::default();
        for x in [500.0, 520.0, 540.0, 560.0] {
            tracker.track(&reaper_at(x), Some(&wreck()));
        }
        let limits = AvailabilityLimits::default();
        assert_eq!(
            determine(GoalType::HarvestSafe, true, &tracker, &limits),
            Availability::Replan
        );
    }

    #[test]
    fn test_tanker_round_cap() {
        let mut tracker = StaticTargetTracker::default();
        let tanker = Unit::new(2, UnitKind::Tanker, Vec2::ZERO);
        for _ in 0..16 {
            tracker.track(&reaper_at(3000.0), Some(&tanker));
        }
        let limits = AvailabilityLimits::default();
        assert_eq!(
            determine(GoalType::MoveTankerSafe, true, &tracker, &limits),
            Availability::Invalid
        );
    }

    fn ram_tracker(pursuer_mass: f64, target_mass: f64) -> DynamicTargetTracker {
        let pursuer = Unit::new(0, UnitKind::OwnUnit, Vec2::ZERO)
            .with_velocity(Vec2::new(10.0, 0.0))
            .with_mass(pursuer_mass)
            .with_radius(400.0);
        let target = Unit::new(7, UnitKind::Hostile(HostileGroup::Primary), Vec2::new(50.0, 0.0))
            .with_velocity(Vec2::new(2.0, 0.0))
            .with_mass(target_mass)
            .with_radius(400.0);
        let mut tracker = DynamicTargetTracker::default();
        tracker.track(&pursuer, Some(&target));
        tracker
    }

    #[test]
    fn test_ram_momentum_decides_collision() {
        let limits = AvailabilityLimits::default();
        assert_eq!(
            determine(GoalType::RamPrimaryClose, true, &ram_tracker(1000.0, 10.0), &limits),
            Availability::Reached
        );
        assert_eq!(
            determine(GoalType::RamPrimaryClose, true, &ram_tracker(1.0, 1000.0), &limits),
            Availability::Invalid
        );
    }

    #[test]
    fn test_ram_outside_radius() {
        let pursuer = Unit::new(0, UnitKind::OwnUnit, Vec2::ZERO)
            .with_velocity(Vec2::new(10.0, 0.0))
            .with_radius(400.0);
        let target = Unit::new(7, UnitKind::Hostile(HostileGroup::Secondary), Vec2::new(3000.0, 0.0))
            .with_radius(400.0);
        let mut tracker = DynamicTargetTracker::default();
        tracker.track(&pursuer, Some(&target));
        let limits = AvailabilityLimits::default();
        assert_eq!(
            determine(GoalType::RamSecondaryFar, true, &tracker, &limits),
            Availability::Replan
        );

        let mut drifting = DynamicTargetTracker::default();
        let idle = pursuer.with_velocity(Vec2::ZERO);
        drifting.track(&idle, Some(&target));
        assert_eq!(
            determine(GoalType::RamSecondaryFar, true, &drifting, &limits),
            Availability::Valid
        );
    }

    #[test]
    fn test_wait_lasts_one_round() {
        let limits = AvailabilityLimits::default();
        let mut tracker = tracker_for(GoalType::Wait);
        tracker.track(&reaper_at(0.0), None);
        assert_eq!(determine(GoalType::Wait, false, tracker.as_ref(), &limits), Availability::Valid);
        tracker.track(&reaper_at(0.0), None);
        assert_eq!(determine(GoalType::Wait, false, tracker.as_ref(), &limits), Availability::Reached);
    }

    #[test]
    fn test_special_invalid_when_target_gone() {
        let limits = AvailabilityLimits::default();
        let mut tracker = tracker_for(GoalType::UseSpecial);
        tracker.track(&reaper_at(0.0), Some(&wreck()));
        tracker.track(&reaper_at(0.0), Some(&wreck()));
        assert_eq!(
            determine(GoalType::UseSpecial, true, tracker.as_ref(), &limits),
            Availability::Reached
        );
        assert_eq!(
            determine(GoalType::UseSpecial, false, tracker.as_ref(), &limits),
            Availability::Invalid
        );
    }
}
