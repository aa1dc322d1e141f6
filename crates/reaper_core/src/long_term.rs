//! Delayed rewards for resolved missions.
//!
//! When a mission resolves, a long-term tracker may be spawned to watch its
//! consequences for a few more rounds. Whatever the tracker reports is
//! credited to every step of the mission that spawned it, not to the
//! mission running now.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::availability::Availability;
use crate::goal::{GoalFamily, GoalType};
use crate::mission::MissionStep;
use crate::qstate::{QStateKey, QTable};
use crate::selector::SelectedTarget;
use crate::world::{HostileGroup, PlayerId, PlayerState, UnitId, WorldSnapshot};

/// Horizon, gain and decay of one tracker kind.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HorizonReward {
    /// Rounds the tracker stays alive.
    pub horizon: u32,
    /// Reward before decay.
    pub gain: f64,
    /// Per-round decay factor.
    pub decay: f64,
}

impl HorizonReward {
    /// Reward after `rounds` rounds of decay.
    #[must_use]
    pub fn decayed(&self, rounds: u32) -> f64 {
        self.gain * self.decay.powi(i32::try_from(rounds).unwrap_or(i32::MAX))
    }
}

/// Long-term reward settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LongTermConfig {
    /// Harvest follow-up.
    pub harvest: HorizonReward,
    /// Ram follow-up against opponent reapers.
    pub ram: HorizonReward,
}

impl Default for LongTermConfig {
    fn default() -> Self {
        Self {
            harvest: HorizonReward {
                horizon: 5,
                gain: 10.0,
                decay: 0.9,
            },
            ram: HorizonReward {
                horizon: 5,
                gain: 3.0,
                decay: 0.9,
            },
        }
    }
}

/// A tracker observing a resolved mission's aftermath.
pub trait LongTermTracker: fmt::Debug + Send {
    /// Observe one round. Returns the reward to credit, if any.
    fn per_round_delta(
        &mut self,
        player: &PlayerState,
        opponents: &[PlayerState],
        world: &WorldSnapshot,
    ) -> Option<f64>;

    /// Whether the tracker is done and can be dropped.
    fn is_expired(&self) -> bool;

    /// Short label for logging.
    fn label(&self) -> &'static str;
}

/// Credits harvesting that keeps paying off at the same wreck.
#[derive(Debug, Clone)]
pub struct HarvestSuccessTracker {
    wreck: UnitId,
    rounds: u32,
    reward: HorizonReward,
}

impl HarvestSuccessTracker {
    /// Track a harvested wreck.
    #[must_use]
    pub const fn new(wreck: UnitId, reward: HorizonReward) -> Self {
        Self {
            wreck,
            rounds: 0,
            reward,
        }
    }
}

impl LongTermTracker for HarvestSuccessTracker {
    fn per_round_delta(
        &mut self,
        player: &PlayerState,
        _opponents: &[PlayerState],
        world: &WorldSnapshot,
    ) -> Option<f64> {
        self.rounds += 1;
        if player.score_gained == 0 {
            return None;
        }
        let wreck_cell = world.wrecks.cell_of(self.wreck)?;
        if player.reaper_cell(&world.categorizer) != wreck_cell {
            return None;
        }
        Some(self.reward.decayed(self.rounds))
    }

    fn is_expired(&self) -> bool {
        self.rounds >= self.reward.horizon
    }

    fn label(&self) -> &'static str {
        "harvest"
    }
}

/// Credits a successful ram if the rammed opponent stays dry.
///
/// The reward is withheld until the horizon passes. If the opponent scores
/// in the meantime, the tracker expires without paying.
#[derive(Debug, Clone)]
pub struct RamSuccessTracker {
    opponent: Option<PlayerId>,
    rounds: u32,
    recovered: bool,
    reward: HorizonReward,
}

impl RamSuccessTracker {
    /// Track the owner of a rammed reaper.
    #[must_use]
    pub const fn new(opponent: Option<PlayerId>, reward: HorizonReward) -> Self {
        Self {
            opponent,
            rounds: 0,
            recovered: false,
            reward,
        }
    }
}

impl LongTermTracker for RamSuccessTracker {
    fn per_round_delta(
        &mut self,
        _player: &PlayerState,
        opponents: &[PlayerState],
        _world: &WorldSnapshot,
    ) -> Option<f64> {
        self.rounds += 1;
        let scored = self.opponent.is_some_and(|id| {
            opponents
                .iter()
                .any(|o| o.player_id == id && o.score_gained > 0)
        });
        if scored {
            self.recovered = true;
            return None;
        }
        (self.rounds >= self.reward.horizon).then(|| self.reward.decayed(self.rounds))
    }

    fn is_expired(&self) -> bool {
        self.recovered || self.rounds >= self.reward.horizon
    }

    fn label(&self) -> &'static str {
        "ram"
    }
}

/// Tracker to spawn when a mission resolves.
///
/// Only successful harvests and successful rams on opponent reapers have
/// follow-up trackers. Failures spawn none.
#[must_use]
pub fn tracker_for_outcome(
    goal: GoalType,
    target: Option<&SelectedTarget>,
    outcome: Availability,
    config: &LongTermConfig,
) -> Option<Box<dyn LongTermTracker>> {
    if outcome != Availability::Reached {
        return None;
    }
    let target = target?;
    match goal.family() {
        GoalFamily::Harvest => Some(Box::new(HarvestSuccessTracker::new(target.id, config.harvest))),
        GoalFamily::Ram(HostileGroup::Primary) => {
            Some(Box::new(RamSuccessTracker::new(target.owner, config.ram)))
        }
        GoalFamily::Ram(HostileGroup::Secondary)
        | GoalFamily::MoveTanker
        | GoalFamily::UseSpecial
        | GoalFamily::Wait => None,
    }
}

/// One weight change produced by a long-term tracker.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RewardAdjustment {
    /// State of the original step.
    pub key: QStateKey,
    /// Goal of the original step.
    pub goal: GoalType,
    /// Amount added.
    pub delta: f64,
}

#[derive(Debug)]
struct LiveTracker {
    tracker: Box<dyn LongTermTracker>,
    steps: Vec<MissionStep>,
}

/// Owns live long-term trackers and turns their reports into adjustments.
#[derive(Debug, Default)]
pub struct LongTermRewardOrchestrator {
    live: Vec<LiveTracker>,
}

impl LongTermRewardOrchestrator {
    /// Create an orchestrator with no trackers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Start tracking, crediting the given mission steps.
    pub fn register(&mut self, tracker: Box<dyn LongTermTracker>, steps: Vec<MissionStep>) {
        tracing::debug!(tracker = tracker.label(), steps = steps.len(), "Registered long-term tracker");
        self.live.push(LiveTracker { tracker, steps });
    }

    /// Number of live trackers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.live.len()
    }

    /// Whether no tracker is live.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.live.is_empty()
    }

    /// Poll every tracker once, prune expired ones, and return the
    /// adjustments. The table is not touched.
    pub fn orchestrate(
        &mut self,
        player: &PlayerState,
        opponents: &[PlayerState],
        world: &WorldSnapshot,
    ) -> Vec<RewardAdjustment> {
        let mut adjustments = Vec::new();
        for live in &mut self.live {
            let delta = live.tracker.per_round_delta(player, opponents, world);
            if let Some(delta) = delta.filter(|d| *d != 0.0) {
                tracing::debug!(tracker = live.tracker.label(), delta, "Long-term reward");
                adjustments.extend(live.steps.iter().map(|step| RewardAdjustment {
                    key: step.key,
                    goal: step.goal,
                    delta,
                }));
            }
        }
        self.live.retain(|live| !live.tracker.is_expired());
        adjustments
    }
}

/// Apply adjustments to the table.
pub fn apply(adjustments: &[RewardAdjustment], table: &mut QTable) {
    for adjustment in adjustments {
        table.adjust(adjustment.key, adjustment.goal, adjustment.delta);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::categorize::SpatialCategorizer;
    use crate::math::Vec2;
    use crate::world::{Unit, UnitKind};

    fn player(x: f64, score_gained: u32) -> PlayerState {
        let reaper = Unit::new(0, UnitKind::OwnUnit, Vec2::new(x, 100.0));
        PlayerState::new(0, reaper, 10 + score_gained, 0, Some(10), None)
    }

    fn opponent(id: PlayerId, score_gained: u32) -> PlayerState {
        let reaper = Unit::new(u32::from(id) * 10, UnitKind::Hostile(HostileGroup::Primary), Vec2::ZERO);
        PlayerState::new(id, reaper, score_gained, 0, Some(0), None)
    }

    #[test]
    fn test_harvest_rewards_only_same_cell_scoring() {
        let world = WorldSnapshot::from_units(SpatialCategorizer::default(), [Unit::new(
            1,
            UnitKind::Wreck,
            Vec2::new(100.0, 100.0),
        )]);
        let mut tracker = HarvestSuccessTracker::new(1, LongTermConfig::default().harvest);

        assert_eq!(tracker.per_round_delta(&player(50.0, 0), &[], &world), None);
        let second = tracker.per_round_delta(&player(50.0, 3), &[], &world);
        assert!(second.is_some_and(|d| (d - 10.0 * 0.9_f64.powi(2)).abs() < 1e-9));
        // Scoring elsewhere does not count.
        assert_eq!(tracker.per_round_delta(&player(4000.0, 3), &[], &world), None);
        assert!(!tracker.is_expired());
        tracker.per_round_delta(&player(50.0, 0), &[], &world);
        tracker.per_round_delta(&player(50.0, 0), &[], &world);
        assert!(tracker.is_expired());
    }

    #[test]
    fn test_ram_tracker_pays_at_horizon() {
        let world = WorldSnapshot::default();
        let config = LongTermConfig::default();
        let mut tracker = RamSuccessTracker::new(Some(1), config.ram);
        let dry = [opponent(1, 0), opponent(2, 4)];
        for _ in 0..4 {
            assert_eq!(tracker.per_round_delta(&player(0.0, 0), &dry, &world), None);
        }
        let paid = tracker.per_round_delta(&player(0.0, 0), &dry, &world);
        assert!(paid.is_some_and(|d| (d - 3.0 * 0.9_f64.powi(5)).abs() < 1e-9));
        assert!(tracker.is_expired());
    }

    #[test]
    fn test_ram_tracker_expires_on_recovery() {
        let world = WorldSnapshot::default();
        let mut tracker = RamSuccessTracker::new(Some(1), LongTermConfig::default().ram);
        assert_eq!(tracker.per_round_delta(&player(0.0, 0), &[opponent(1, 2)], &world), None);
        assert!(tracker.is_expired());
    }

    #[test]
    fn test_tracker_for_outcome_table() {
        let config = LongTermConfig::default();
        let wreck = SelectedTarget::new(1, UnitKind::Wreck);
        assert!(tracker_for_outcome(GoalType::HarvestSafe, Some(&wreck), Availability::Reached, &config).is_some());
        assert!(tracker_for_outcome(GoalType::HarvestSafe, Some(&wreck), Availability::Invalid, &config).is_none());
        let hostile = SelectedTarget::new(9, UnitKind::Hostile(HostileGroup::Secondary));
        assert!(
            tracker_for_outcome(GoalType::RamSecondaryClose, Some(&hostile), Availability::Reached, &config).is_none()
        );
        assert!(tracker_for_outcome(GoalType::Wait, None, Availability::Reached, &config).is_none());
    }

    #[test]
    fn test_orchestrate_credits_original_steps_and_prunes() {
        let world = WorldSnapshot::default();
        let mut orchestrator = LongTermRewardOrchestrator::new();
        let step = MissionStep {
            key: QStateKey::default(),
            goal: GoalType::RamPrimaryFar,
        };
        let reward = HorizonReward {
            horizon: 1,
            gain: 2.0,
            decay: 1.0,
        };
        orchestrator.register(Box::new(RamSuccessTracker::new(Some(1), reward)), vec![step, step]);

        let adjustments = orchestrator.orchestrate(&player(0.0, 0), &[opponent(1, 0)], &world);
        assert_eq!(adjustments.len(), 2);
        assert!(orchestrator.is_empty());

        let mut table = QTable::new();
        apply(&adjustments, &mut table);
        assert_eq!(
            table.weights(QStateKey::default()).map(|w| w.get(GoalType::RamPrimaryFar)),
            Some(4.0)
        );
    }
}
