//! Per-round decision orchestration.
//!
//! [`DecisionOrchestrator::decide`] is called once per round with the learned
//! table, the round's world, our player and the opponents. It keeps the
//! active mission alive across rounds, rewards it when it resolves, and emits
//! one [`MovementCommand`].

use std::fmt;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::availability::{determine, Availability};
use crate::config::DecisionConfig;
use crate::error::{DecisionError, Result};
use crate::goal::{GoalFamily, GoalType};
use crate::long_term::{self, tracker_for_outcome, LongTermRewardOrchestrator};
use crate::mission::Mission;
use crate::planner::{PathStrategy, PlanInput, Throttle, ThrottlePathPlanner};
use crate::policy::GoalSelector;
use crate::qstate::{QStateKey, QTable};
use crate::relation::{RelationalState, RelationalStateBuilder};
use crate::selector::{select_target, SelectedTarget};
use crate::world::{PlayerState, Unit, UnitKind, WorldSnapshot};

/// Command sent for our reaper.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MovementCommand {
    /// Do nothing this round.
    Wait,
    /// Use the special skill at a position.
    Skill {
        /// Target x.
        x: i64,
        /// Target y.
        y: i64,
    },
    /// Accelerate towards a position.
    Move {
        /// Target x.
        x: i64,
        /// Target y.
        y: i64,
        /// Throttle for this round.
        throttle: Throttle,
    },
}

impl fmt::Display for MovementCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Wait => f.write_str("WAIT"),
            Self::Skill { x, y } => write!(f, "SKILL {x} {y}"),
            Self::Move { x, y, throttle } => write!(f, "{x} {y} {throttle}"),
        }
    }
}

/// How this round's goal came about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DecisionType {
    /// First decision, no mission existed.
    NewOnUndefined,
    /// Previous mission failed.
    NewOnFailure,
    /// Previous mission succeeded.
    NewOnSuccess,
    /// Continuing the mission on the cached plan.
    ExistingTarget,
    /// Continuing the mission on a fresh plan.
    ReplanExistingTarget,
}

/// Everything decided in one round.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoundDecision {
    /// How the goal came about.
    pub decision_type: DecisionType,
    /// Goal pursued after this round's decision.
    pub goal: GoalType,
    /// Target of that goal.
    pub target: Option<SelectedTarget>,
    /// Availability of the mission that was active when the round began.
    pub availability: Option<Availability>,
    /// State key the round was decided in.
    pub key: QStateKey,
    /// Command to send.
    pub command: MovementCommand,
}

/// Wires the decision components together and owns the cross-round state.
#[derive(Debug)]
pub struct DecisionOrchestrator {
    config: DecisionConfig,
    builder: RelationalStateBuilder,
    selector: GoalSelector,
    long_term: LongTermRewardOrchestrator,
    mission: Option<Mission>,
    rng: ChaCha8Rng,
}

impl DecisionOrchestrator {
    /// Create an orchestrator, seeding its random source from the config.
    ///
    /// # Errors
    ///
    /// Returns [`DecisionError::InvalidConfig`] if `config` fails
    /// [`DecisionConfig::validate`].
    pub fn new(config: DecisionConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            builder: RelationalStateBuilder::new(config.special_rage_threshold),
            selector: GoalSelector::new(config.exploration),
            long_term: LongTermRewardOrchestrator::new(),
            mission: None,
            rng: ChaCha8Rng::seed_from_u64(config.seed),
            config,
        })
    }

    /// Active configuration.
    #[must_use]
    pub const fn config(&self) -> &DecisionConfig {
        &self.config
    }

    /// Mission carried into the next round.
    #[must_use]
    pub const fn mission(&self) -> Option<&Mission> {
        self.mission.as_ref()
    }

    /// Live delayed-reward trackers.
    #[must_use]
    pub const fn long_term(&self) -> &LongTermRewardOrchestrator {
        &self.long_term
    }

    /// Decide one round.
    ///
    /// A snapshot bucketed with a different grid than the configured one is
    /// re-bucketed first, so categories always follow `config.grid`.
    ///
    /// # Errors
    ///
    /// Returns [`DecisionError::MissingOwnUnit`] if the player's reaper is not
    /// an own unit, and [`DecisionError::ImpossibleTarget`] if a selected goal
    /// turns out to have no target.
    pub fn decide(
        &mut self,
        table: &mut QTable,
        world: &WorldSnapshot,
        player: &PlayerState,
        opponents: &[PlayerState],
    ) -> Result<RoundDecision> {
        if player.reaper.kind != UnitKind::OwnUnit {
            return Err(DecisionError::MissingOwnUnit(player.player_id));
        }

        let regridded;
        let world = if world.categorizer == self.config.grid {
            world
        } else {
            tracing::trace!("Re-bucketing snapshot with the configured grid");
            regridded = world.regrid(self.config.grid);
            &regridded
        };

        let state = self.builder.build(world, player);
        let key = QStateKey::from_state(&state);

        let adjustments = self.long_term.orchestrate(player, opponents, world);
        long_term::apply(&adjustments, table);

        let (mut mission, decision_type, availability) = match self.mission.take() {
            None => {
                let mission = self.start_mission(table, &state, key, world, player)?;
                (mission, DecisionType::NewOnUndefined, None)
            }
            Some(mission) => self.continue_mission(mission, table, &state, key, world, player)?,
        };

        let command = self.command_for(&mut mission, world, player);
        let decision = RoundDecision {
            decision_type,
            goal: mission.goal(),
            target: mission.target().copied(),
            availability,
            key,
            command,
        };
        tracing::debug!(
            decision = ?decision.decision_type,
            goal = %decision.goal,
            command = %decision.command,
            "Round decided"
        );
        self.mission = Some(mission);
        Ok(decision)
    }

    fn continue_mission(
        &mut self,
        mut mission: Mission,
        table: &mut QTable,
        state: &RelationalState,
        key: QStateKey,
        world: &WorldSnapshot,
        player: &PlayerState,
    ) -> Result<(Mission, DecisionType, Option<Availability>)> {
        let target_unit = mission.target().and_then(|t| world.find(t.kind, t.id));
        if let Some(unit) = target_unit {
            mission.set_target_owner(unit.owner);
        }
        if target_unit.is_some() || mission.target().is_none() {
            mission.tracker_mut().track(&player.reaper, target_unit);
        }

        let availability = determine(
            mission.goal(),
            target_unit.is_some(),
            mission.tracker(),
            &self.config.availability,
        );
        let recorded = state.recategorize(mission.goal(), mission.target());
        mission.record(key, recorded);
        mission.propagate(table, -self.config.rewards.step_penalty);
        tracing::debug!(goal = %mission.goal(), recorded = %recorded, ?availability, "Mission checked");

        let decision_type = match availability {
            Availability::Invalid | Availability::Reached => {
                self.resolve(&mission, table, availability);
                let next = self.start_mission(table, state, key, world, player)?;
                let decision_type = if availability == Availability::Reached {
                    DecisionType::NewOnSuccess
                } else {
                    DecisionType::NewOnFailure
                };
                return Ok((next, decision_type, Some(availability)));
            }
            Availability::Replan => {
                self.plan_path(&mut mission, target_unit, player);
                DecisionType::ReplanExistingTarget
            }
            Availability::Valid if mission.path_exhausted() => {
                self.plan_path(&mut mission, target_unit, player);
                DecisionType::ReplanExistingTarget
            }
            Availability::Valid => DecisionType::ExistingTarget,
        };
        Ok((mission, decision_type, Some(availability)))
    }

    /// Pay the terminal reward and hand successful missions to a long-term tracker.
    fn resolve(&mut self, mission: &Mission, table: &mut QTable, outcome: Availability) {
        if let Some(delta) = self.config.rewards.terminal_delta(outcome) {
            mission.propagate(table, delta);
        }
        tracing::info!(
            goal = %mission.goal(),
            ?outcome,
            steps = mission.steps().len(),
            "Mission resolved"
        );
        if let Some(tracker) =
            tracker_for_outcome(mission.goal(), mission.target(), outcome, &self.config.long_term)
        {
            self.long_term.register(tracker, mission.steps().to_vec());
        }
    }

    fn start_mission(
        &mut self,
        table: &mut QTable,
        state: &RelationalState,
        key: QStateKey,
        world: &WorldSnapshot,
        player: &PlayerState,
    ) -> Result<Mission> {
        let goal = self.selector.select(table, key, state, &mut self.rng);
        let target = select_target(state, goal)?;
        let target_unit = target.and_then(|t| world.find(t.kind, t.id));
        let target = target.map(|t| t.with_owner(target_unit.and_then(|u| u.owner)));

        let mut mission = Mission::start(key, goal, target);
        mission.tracker_mut().track(&player.reaper, target_unit);
        self.plan_path(&mut mission, target_unit, player);
        mission.propagate(table, -self.config.rewards.step_penalty);
        tracing::debug!(goal = %goal, target = ?target.map(|t| t.id), "Mission started");
        Ok(mission)
    }

    fn plan_path(&mut self, mission: &mut Mission, target: Option<&Unit>, player: &PlayerState) {
        let preset = match PathStrategy::for_goal(mission.goal()) {
            PathStrategy::Idle => {
                mission.set_path(vec![0]);
                return;
            }
            PathStrategy::Genetic(preset) => preset,
        };
        let reaper = &player.reaper;
        let mass = if reaper.mass > 0.0 {
            reaper.mass
        } else {
            self.config.reaper.default_mass
        };
        let distance = target.map_or(0.0, |t| reaper.position.distance(t.position));
        let input = PlanInput::new(reaper.velocity.length(), mass, self.config.reaper.friction, distance);
        let planner = ThrottlePathPlanner::new(*self.config.planner.get(preset));
        let result = planner.plan(&input, &mut self.rng);
        tracing::debug!(
            ?preset,
            distance,
            len = result.sequence.len(),
            fitness = result.fitness.score,
            "Planned throttle path"
        );
        mission.set_path(result.sequence);
    }

    fn command_for(&mut self, mission: &mut Mission, world: &WorldSnapshot, player: &PlayerState) -> MovementCommand {
        let goal = mission.goal();
        if goal.family() == GoalFamily::Wait {
            return MovementCommand::Wait;
        }
        let Some(target) = mission.target().and_then(|t| world.find(t.kind, t.id)) else {
            tracing::warn!(goal = %goal, "Target missing when issuing command");
            return MovementCommand::Wait;
        };
        let (x, y) = target.position.round_to_i64();
        if goal.family() == GoalFamily::UseSpecial {
            return MovementCommand::Skill { x, y };
        }
        if mission.path_exhausted() {
            self.plan_path(mission, Some(target), player);
        }
        let throttle = mission.next_throttle().unwrap_or(0);
        MovementCommand::Move { x, y, throttle }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::categorize::SpatialCategorizer;
    use crate::math::Vec2;
    use crate::world::HostileGroup;

    fn reaper(x: f64, y: f64) -> Unit {
        Unit::new(0, UnitKind::OwnUnit, Vec2::new(x, y)).with_mass(0.5).with_radius(400.0)
    }

    fn player(x: f64, y: f64, rage: u32) -> PlayerState {
        PlayerState::new(0, reaper(x, y), 0, rage, None, None)
    }

    fn world_with(units: Vec<Unit>) -> WorldSnapshot {
        WorldSnapshot::from_units(SpatialCategorizer::default(), units)
    }

    fn greedy() -> DecisionConfig {
        let mut config = DecisionConfig::default();
        config.exploration.rate = 0.0;
        config
    }

    #[test]
    fn test_command_strings() {
        assert_eq!(MovementCommand::Wait.to_string(), "WAIT");
        assert_eq!(MovementCommand::Skill { x: -120, y: 40 }.to_string(), "SKILL -120 40");
        assert_eq!(
            MovementCommand::Move {
                x: 3,
                y: 4,
                throttle: 250
            }
            .to_string(),
            "3 4 250"
        );
    }

    #[test]
    fn test_empty_world_waits() {
        let mut orchestrator = DecisionOrchestrator::new(greedy()).expect("valid config");
        let mut table = QTable::new();
        let decision = orchestrator
            .decide(&mut table, &world_with(vec![]), &player(0.0, 0.0, 0), &[])
            .expect("decide");
        assert_eq!(decision.decision_type, DecisionType::NewOnUndefined);
        assert_eq!(decision.goal, GoalType::Wait);
        assert_eq!(decision.command, MovementCommand::Wait);
        assert!(decision.availability.is_none());
    }

    #[test]
    fn test_first_round_moves_to_wreck() {
        let mut orchestrator = DecisionOrchestrator::new(greedy()).expect("valid config");
        let mut table = QTable::new();
        let world = world_with(vec![Unit::new(9, UnitKind::Wreck, Vec2::new(1000.0, 0.0))]);
        let decision = orchestrator
            .decide(&mut table, &world, &player(0.0, 0.0, 0), &[])
            .expect("decide");
        assert_eq!(decision.goal, GoalType::HarvestSafe);
        assert_eq!(decision.target.map(|t| t.id), Some(9));
        match decision.command {
            MovementCommand::Move { x, y, throttle } => {
                assert_eq!((x, y), (1000, 0));
                assert!(throttle <= orchestrator.config().planner.precise.throttle_max);
            }
            other => panic!("unexpected command {other}"),
        }
        let penalty = table
            .weights(decision.key)
            .map(|w| w.get(GoalType::HarvestSafe));
        assert_eq!(penalty, Some(-orchestrator.config().rewards.step_penalty));
    }

    #[test]
    fn test_wait_resolves_and_restarts() {
        let mut orchestrator = DecisionOrchestrator::new(greedy()).expect("valid config");
        let mut table = QTable::new();
        let world = world_with(vec![]);
        let me = player(0.0, 0.0, 0);
        orchestrator.decide(&mut table, &world, &me, &[]).expect("round 1");
        let second = orchestrator.decide(&mut table, &world, &me, &[]).expect("round 2");
        assert_eq!(second.availability, Some(Availability::Reached));
        assert_eq!(second.decision_type, DecisionType::NewOnSuccess);
        assert_eq!(second.command, MovementCommand::Wait);
        assert_eq!(orchestrator.mission().map(|m| m.steps().len()), Some(1));
    }

    #[test]
    fn test_vanished_target_fails_mission() {
        let mut orchestrator = DecisionOrchestrator::new(greedy()).expect("valid config");
        let mut table = QTable::new();
        let me = player(0.0, 0.0, 0);
        let world = world_with(vec![Unit::new(9, UnitKind::Wreck, Vec2::new(1000.0, 0.0))]);
        orchestrator.decide(&mut table, &world, &me, &[]).expect("round 1");

        let decision = orchestrator
            .decide(&mut table, &world_with(vec![]), &me, &[])
            .expect("round 2");
        assert_eq!(decision.availability, Some(Availability::Invalid));
        assert_eq!(decision.decision_type, DecisionType::NewOnFailure);
        assert_eq!(decision.goal, GoalType::Wait);
        assert!(orchestrator.long_term().is_empty());
    }

    #[test]
    fn test_special_uses_skill_at_wreck() {
        let mut config = greedy();
        let mut orchestrator = DecisionOrchestrator::new(config.clone()).expect("valid config");
        let mut table = QTable::new();
        let me = player(0.0, 0.0, 40);
        let world = world_with(vec![Unit::new(5, UnitKind::Wreck, Vec2::new(-2500.0, 1300.0))]);
        let state = RelationalStateBuilder::new(config.special_rage_threshold).build(&world, &me);
        table.adjust(QStateKey::from_state(&state), GoalType::UseSpecial, 3.0);

        let decision = orchestrator.decide(&mut table, &world, &me, &[]).expect("decide");
        assert_eq!(decision.goal, GoalType::UseSpecial);
        assert_eq!(decision.command, MovementCommand::Skill { x: -2500, y: 1300 });

        config.special_rage_threshold = 50;
        let mut orchestrator = DecisionOrchestrator::new(config).expect("valid config");
        let decision = orchestrator.decide(&mut table, &world, &me, &[]).expect("decide");
        assert_ne!(decision.goal, GoalType::UseSpecial);
    }

    #[test]
    fn test_rejects_non_reaper_player() {
        let mut orchestrator = DecisionOrchestrator::new(greedy()).expect("valid config");
        let mut table = QTable::new();
        let mut me = player(0.0, 0.0, 0);
        me.reaper.kind = UnitKind::Hostile(HostileGroup::Primary);
        let result = orchestrator.decide(&mut table, &world_with(vec![]), &me, &[]);
        assert!(matches!(result, Err(DecisionError::MissingOwnUnit(0))));
    }
}
