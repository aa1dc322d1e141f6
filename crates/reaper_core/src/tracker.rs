//! Per-goal target trackers.
//!
//! A tracker records the pursuer/target relation once per round while a goal
//! is active. The availability state machine only ever talks to trackers
//! through [`TargetTracker`], so every variant answers every predicate.

use std::fmt;

use crate::goal::{GoalFamily, GoalType};
use crate::math::Vec2;
use crate::world::Unit;

/// Kinematic history of one goal episode.
pub trait TargetTracker: fmt::Debug + Send {
    /// Record one round. `target` is `None` for goals without a target.
    fn track(&mut self, pursuer: &Unit, target: Option<&Unit>);

    /// Number of recorded rounds.
    fn steps_taken(&self) -> u32;

    /// Whether the distance never shrank over the last `window` rounds and
    /// ended farther than it started.
    ///
    /// Needs at least `window` recorded changes.
    fn is_distance_growing(&self, window: usize) -> bool;

    /// Whether the latest distance is within `threshold`.
    fn is_within_threshold(&self, threshold: f64) -> bool;

    /// Whether pursuer and target are closing on each other.
    fn is_moving_towards_target(&self) -> bool;

    /// Whether the pursuer carries more momentum than the target.
    fn is_higher_momentum(&self) -> bool;

    /// Whether the two bodies overlap.
    fn is_within_collision_radius(&self) -> bool;
}

/// Tracker matching a goal.
#[must_use]
pub fn tracker_for(goal: GoalType) -> Box<dyn TargetTracker> {
    match goal.family() {
        GoalFamily::Harvest | GoalFamily::MoveTanker => Box::<StaticTargetTracker>::default(),
        GoalFamily::Ram(_) => Box::<DynamicTargetTracker>::default(),
        GoalFamily::UseSpecial => Box::<NoOpTracker>::default(),
        GoalFamily::Wait => Box::<RoundCountTracker>::default(),
    }
}

fn growing(distances: &[f64], window: usize) -> bool {
    if window == 0 || distances.len() < window + 1 {
        return false;
    }
    let recent = &distances[distances.len() - window - 1..];
    let non_decreasing = recent.windows(2).all(|pair| pair[1] >= pair[0]);
    // A standstill is not growth.
    non_decreasing && recent[recent.len() - 1] > recent[0]
}

#[allow(clippy::cast_possible_truncation)]
fn count(distances: &[f64]) -> u32 {
    distances.len() as u32
}

/// Tracker for stationary targets (wrecks, tankers).
#[derive(Debug, Clone, Default)]
pub struct StaticTargetTracker {
    distances: Vec<f64>,
    contact_radius: f64,
}

impl TargetTracker for StaticTargetTracker {
    fn track(&mut self, pursuer: &Unit, target: Option<&Unit>) {
        let Some(target) = target else {
            return;
        };
        self.distances.push(pursuer.position.distance(target.position));
        self.contact_radius = pursuer.radius + target.radius;
    }

    fn steps_taken(&self) -> u32 {
        count(&self.distances)
    }

    fn is_distance_growing(&self, window: usize) -> bool {
        growing(&self.distances, window)
    }

    fn is_within_threshold(&self, threshold: f64) -> bool {
        self.distances.last().is_some_and(|d| *d <= threshold)
    }

    fn is_moving_towards_target(&self) -> bool {
        match self.distances.as_slice() {
            [.., previous, latest] => latest < previous,
            _ => false,
        }
    }

    fn is_higher_momentum(&self) -> bool {
        true
    }

    fn is_within_collision_radius(&self) -> bool {
        self.is_within_threshold(self.contact_radius)
    }
}

/// Snapshot of a moving pursuer/target pair.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Encounter {
    relative_position: Vec2,
    relative_velocity: Vec2,
    pursuer_momentum: f64,
    target_momentum: f64,
    contact_radius: f64,
}

/// Tracker for moving targets (hostile vehicles).
#[derive(Debug, Clone, Default)]
pub struct DynamicTargetTracker {
    distances: Vec<f64>,
    latest: Option<Encounter>,
}

impl TargetTracker for DynamicTargetTracker {
    fn track(&mut self, pursuer: &Unit, target: Option<&Unit>) {
        let Some(target) = target else {
            return;
        };
        let encounter = Encounter {
            relative_position: target.position - pursuer.position,
            relative_velocity: target.velocity - pursuer.velocity,
            pursuer_momentum: pursuer.momentum(),
            target_momentum: target.momentum(),
            contact_radius: pursuer.radius + target.radius,
        };
        self.distances.push(encounter.relative_position.length());
        self.latest = Some(encounter);
    }

    fn steps_taken(&self) -> u32 {
        count(&self.distances)
    }

    fn is_distance_growing(&self, window: usize) -> bool {
        growing(&self.distances, window)
    }

    fn is_within_threshold(&self, threshold: f64) -> bool {
        self.distances.last().is_some_and(|d| *d <= threshold)
    }

    fn is_moving_towards_target(&self) -> bool {
        self.latest
            .is_some_and(|e| e.relative_velocity.dot(e.relative_position) < 0.0)
    }

    fn is_higher_momentum(&self) -> bool {
        self.latest
            .is_some_and(|e| e.pursuer_momentum > e.target_momentum)
    }

    fn is_within_collision_radius(&self) -> bool {
        self.latest
            .is_some_and(|e| e.relative_position.length() <= e.contact_radius)
    }
}

/// Tracker for the special skill: counts rounds, every predicate passes.
#[derive(Debug, Clone, Default)]
pub struct NoOpTracker {
    rounds: u32,
}

impl TargetTracker for NoOpTracker {
    fn track(&mut self, _pursuer: &Unit, _target: Option<&Unit>) {
        self.rounds += 1;
    }

    fn steps_taken(&self) -> u32 {
        self.rounds
    }

    fn is_distance_growing(&self, _window: usize) -> bool {
        false
    }

    fn is_within_threshold(&self, _threshold: f64) -> bool {
        true
    }

    fn is_moving_towards_target(&self) -> bool {
        true
    }

    fn is_higher_momentum(&self) -> bool {
        true
    }

    fn is_within_collision_radius(&self) -> bool {
        true
    }
}

/// Tracker for waiting: only elapsed rounds matter.
#[derive(Debug, Clone, Default)]
pub struct RoundCountTracker {
    rounds: u32,
}

impl TargetTracker for RoundCountTracker {
    fn track(&mut self, _pursuer: &Unit, _target: Option<&Unit>) {
        self.rounds += 1;
    }

    fn steps_taken(&self) -> u32 {
        self.rounds
    }

    fn is_distance_growing(&self, _window: usize) -> bool {
        false
    }

    fn is_within_threshold(&self, _threshold: f64) -> bool {
        false
    }

    fn is_moving_towards_target(&self) -> bool {
        false
    }

    fn is_higher_momentum(&self) -> bool {
        false
    }

    fn is_within_collision_radius(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::{HostileGroup, UnitKind};

    fn reaper(x: f64) -> Unit {
        Unit::new(0, UnitKind::OwnUnit, Vec2::new(x, 0.0))
    }

    fn wreck() -> Unit {
        Unit::new(1, UnitKind::Wreck, Vec2::ZERO)
    }

    #[test]
    fn test_static_growing_needs_full_window() {
        let mut tracker = StaticTargetTracker::default();
        tracker.track(&reaper(100.0), Some(&wreck()));
        tracker.track(&reaper(110.0), Some(&wreck()));
        tracker.track(&reaper(120.0), Some(&wreck()));
        assert!(tracker.is_distance_growing(2));
        assert!(!tracker.is_distance_growing(3));

        tracker.track(&reaper(115.0), Some(&wreck()));
        assert!(!tracker.is_distance_growing(1));
        assert!(tracker.is_moving_towards_target());
        assert_eq!(tracker.steps_taken(), 4);
    }

    #[test]
    fn test_static_plateau_counts_but_standstill_does_not() {
        let mut tracker = StaticTargetTracker::default();
        tracker.track(&reaper(100.0), Some(&wreck()));
        tracker.track(&reaper(100.0), Some(&wreck()));
        tracker.track(&reaper(100.0), Some(&wreck()));
        assert!(!tracker.is_distance_growing(2));

        tracker.track(&reaper(140.0), Some(&wreck()));
        assert!(tracker.is_distance_growing(2));
        assert!(tracker.is_distance_growing(3));
    }

    #[test]
    fn test_static_threshold_uses_latest_distance() {
        let mut tracker = StaticTargetTracker::default();
        assert!(!tracker.is_within_threshold(25.0));
        tracker.track(&reaper(1400.0), Some(&wreck()));
        tracker.track(&reaper(30.0), Some(&wreck()));
        assert!(!tracker.is_within_threshold(25.0));
        tracker.track(&reaper(20.0), Some(&wreck()));
        assert!(tracker.is_within_threshold(25.0));
    }

    #[test]
    fn test_static_ignores_missing_target() {
        let mut tracker = StaticTargetTracker::default();
        tracker.track(&reaper(10.0), None);
        assert_eq!(tracker.steps_taken(), 0);
    }

    #[test]
    fn test_dynamic_closing_and_momentum() {
        let pursuer = Unit::new(0, UnitKind::OwnUnit, Vec2::ZERO)
            .with_velocity(Vec2::new(10.0, 0.0))
            .with_mass(1000.0)
            .with_radius(400.0);
        let target = Unit::new(5, UnitKind::Hostile(HostileGroup::Primary), Vec2::new(50.0, 0.0))
            .with_velocity(Vec2::new(2.0, 0.0))
            .with_mass(10.0)
            .with_radius(400.0);
        let mut tracker = DynamicTargetTracker::default();
        tracker.track(&pursuer, Some(&target));
        assert!(tracker.is_moving_towards_target());
        assert!(tracker.is_higher_momentum());
        assert!(tracker.is_within_collision_radius());

        let fleeing = target.with_velocity(Vec2::new(20.0, 0.0));
        tracker.track(&pursuer, Some(&fleeing));
        assert!(!tracker.is_moving_towards_target());
    }

    #[test]
    fn test_round_counters() {
        let mut noop = NoOpTracker::default();
        let mut rounds = RoundCountTracker::default();
        noop.track(&reaper(0.0), None);
        rounds.track(&reaper(0.0), None);
        rounds.track(&reaper(0.0), None);
        assert_eq!(noop.steps_taken(), 1);
        assert_eq!(rounds.steps_taken(), 2);
        assert!(noop.is_within_collision_radius());
        assert!(!rounds.is_distance_growing(1));
    }

    #[test]
    fn test_tracker_for_every_goal() {
        for goal in GoalType::ALL {
            let tracker = tracker_for(goal);
            assert_eq!(tracker.steps_taken(), 0);
        }
    }
}
