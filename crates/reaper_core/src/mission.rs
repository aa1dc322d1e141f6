//! Mission bookkeeping and immediate reward propagation.
//!
//! A mission is one goal episode: the goal, its target, the tracker watching
//! the target, and one [`MissionStep`] per round the goal stayed active.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::availability::Availability;
use crate::goal::GoalType;
use crate::planner::Throttle;
use crate::qstate::{QStateKey, QTable};
use crate::selector::SelectedTarget;
use crate::tracker::{tracker_for, TargetTracker};
use crate::world::PlayerId;

/// One round of an active mission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MissionStep {
    /// State the round was decided in.
    pub key: QStateKey,
    /// Goal recorded for that state.
    pub goal: GoalType,
}

/// Direction a terminal reward pushes the weights.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RewardSign {
    /// Add the magnitude.
    Positive,
    /// Subtract the magnitude.
    Negative,
}

impl RewardSign {
    /// Multiplier for this sign.
    #[must_use]
    pub const fn factor(self) -> f64 {
        match self {
            Self::Positive => 1.0,
            Self::Negative => -1.0,
        }
    }
}

/// A terminal reward, magnitude and sign configured independently.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TerminalReward {
    /// Absolute size of the reward.
    pub magnitude: f64,
    /// Direction of the reward.
    pub sign: RewardSign,
}

impl TerminalReward {
    /// Signed delta.
    #[must_use]
    pub fn delta(self) -> f64 {
        self.magnitude.abs() * self.sign.factor()
    }
}

/// Immediate reward settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RewardConfig {
    /// Subtracted from every active step each round.
    pub step_penalty: f64,
    /// Applied to every step when a mission succeeds.
    pub success: TerminalReward,
    /// Applied to every step when a mission fails.
    pub failure: TerminalReward,
}

impl Default for RewardConfig {
    fn default() -> Self {
        Self {
            step_penalty: 0.1,
            success: TerminalReward {
                magnitude: 1.0,
                sign: RewardSign::Positive,
            },
            failure: TerminalReward {
                magnitude: 0.5,
                sign: RewardSign::Negative,
            },
        }
    }
}

impl RewardConfig {
    /// Terminal delta for an availability outcome. Non-terminal outcomes yield `None`.
    #[must_use]
    pub fn terminal_delta(&self, outcome: Availability) -> Option<f64> {
        match outcome {
            Availability::Reached => Some(self.success.delta()),
            Availability::Invalid => Some(self.failure.delta()),
            Availability::Valid | Availability::Replan => None,
        }
    }
}

/// The active goal episode.
#[derive(Debug)]
pub struct Mission {
    goal: GoalType,
    target: Option<SelectedTarget>,
    steps: Vec<MissionStep>,
    tracker: Box<dyn TargetTracker>,
    path: VecDeque<Throttle>,
}

impl Mission {
    /// Start a mission, recording its first step.
    #[must_use]
    pub fn start(key: QStateKey, goal: GoalType, target: Option<SelectedTarget>) -> Self {
        Self {
            goal,
            target,
            steps: vec![MissionStep { key, goal }],
            tracker: tracker_for(goal),
            path: VecDeque::new(),
        }
    }

    /// Goal the mission was started with.
    #[must_use]
    pub const fn goal(&self) -> GoalType {
        self.goal
    }

    /// Target of the mission.
    #[must_use]
    pub const fn target(&self) -> Option<&SelectedTarget> {
        self.target.as_ref()
    }

    /// Update the target's owner once the unit has been looked up.
    pub fn set_target_owner(&mut self, owner: Option<PlayerId>) {
        if let Some(target) = self.target.as_mut() {
            target.owner = owner;
        }
    }

    /// Recorded steps, oldest first.
    #[must_use]
    pub fn steps(&self) -> &[MissionStep] {
        &self.steps
    }

    /// Append a step.
    pub fn record(&mut self, key: QStateKey, goal: GoalType) {
        self.steps.push(MissionStep { key, goal });
    }

    /// Tracker watching the target.
    #[must_use]
    pub fn tracker(&self) -> &dyn TargetTracker {
        self.tracker.as_ref()
    }

    /// Mutable tracker access.
    pub fn tracker_mut(&mut self) -> &mut dyn TargetTracker {
        self.tracker.as_mut()
    }

    /// Replace the cached throttle plan.
    pub fn set_path(&mut self, path: Vec<Throttle>) {
        self.path = path.into();
    }

    /// Take the next throttle from the cached plan.
    pub fn next_throttle(&mut self) -> Option<Throttle> {
        self.path.pop_front()
    }

    /// Whether the cached plan is used up.
    #[must_use]
    pub fn path_exhausted(&self) -> bool {
        self.path.is_empty()
    }

    /// Add `delta` to every recorded step.
    pub fn propagate(&self, table: &mut QTable, delta: f64) {
        propagate_steps(&self.steps, table, delta);
    }
}

/// Add `delta` to each step's `(key, goal)` weight.
pub fn propagate_steps(steps: &[MissionStep], table: &mut QTable, delta: f64) {
    for step in steps {
        table.adjust(step.key, step.goal, delta);
    }
}
