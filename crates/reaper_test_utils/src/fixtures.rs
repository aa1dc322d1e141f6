//! Fixture builders for worlds, players and whole matches.

use reaper_core::config::DecisionConfig;
use reaper_core::decision::{DecisionOrchestrator, MovementCommand, RoundDecision};
use reaper_core::planner::PlannerConfig;
use reaper_core::prelude::*;

/// Mass of every reaper in the fixtures.
pub const REAPER_MASS: f64 = 0.5;
/// Collision radius of every reaper in the fixtures.
pub const REAPER_RADIUS: f64 = 400.0;

/// Our reaper at a position.
#[must_use]
pub fn reaper_at(x: f64, y: f64) -> Unit {
    Unit::new(0, UnitKind::OwnUnit, Vec2::new(x, y))
        .with_owner(0)
        .with_mass(REAPER_MASS)
        .with_radius(REAPER_RADIUS)
}

/// A wreck holding `water` units.
#[must_use]
pub fn wreck_at(id: UnitId, x: f64, y: f64, water: u32) -> Unit {
    Unit::new(id, UnitKind::Wreck, Vec2::new(x, y))
        .with_radius(600.0)
        .with_water(water, None)
}

/// A tanker.
#[must_use]
pub fn tanker_at(id: UnitId, x: f64, y: f64) -> Unit {
    Unit::new(id, UnitKind::Tanker, Vec2::new(x, y))
        .with_radius(550.0)
        .with_mass(5.5)
        .with_water(1, Some(4))
}

/// An opponent's unit.
#[must_use]
pub fn hostile_at(id: UnitId, group: HostileGroup, owner: PlayerId, x: f64, y: f64) -> Unit {
    Unit::new(id, UnitKind::Hostile(group), Vec2::new(x, y))
        .with_owner(owner)
        .with_mass(REAPER_MASS)
        .with_radius(REAPER_RADIUS)
}

/// World snapshot on the default grid.
#[must_use]
pub fn world(units: impl IntoIterator<Item = Unit>) -> WorldSnapshot {
    WorldSnapshot::from_units(SpatialCategorizer::default(), units)
}

/// Player 0 controlling `reaper`, with no history.
#[must_use]
pub fn player(reaper: Unit, score: u32, rage: u32) -> PlayerState {
    PlayerState::new(0, reaper, score, rage, None, None)
}

/// Default configuration with planners small enough for tests and a time
/// budget that never triggers, so results depend only on the seed.
#[must_use]
pub fn deterministic_config(seed: u64) -> DecisionConfig {
    let mut config = DecisionConfig {
        seed,
        ..DecisionConfig::default()
    };
    config.planner.fast = PlannerConfig {
        population_size: 40,
        generations: 15,
        timeout_ms: 60_000,
        ..PlannerConfig::fast()
    };
    config.planner.precise = PlannerConfig {
        population_size: 40,
        generations: 15,
        timeout_ms: 60_000,
        ..PlannerConfig::precise()
    };
    config
}

/// A small self-contained match: our reaper, three wrecks, a tanker and an
/// idle opponent. Movement follows the same drag model the planner assumes;
/// a wreck pays one point per round while the reaper sits inside it.
#[derive(Debug)]
pub struct ScriptedMatch {
    /// Decision core under test.
    pub orchestrator: DecisionOrchestrator,
    /// Learned table, carried across rounds.
    pub table: QTable,
    /// Our reaper.
    pub reaper: Unit,
    /// Every other unit.
    pub others: Vec<Unit>,
    /// Our score.
    pub score: u32,
    /// Our rage.
    pub rage: u32,
    /// Score at the start of the previous round.
    pub previous_score: Option<u32>,
    /// Commands issued so far.
    pub commands: Vec<MovementCommand>,
}

impl ScriptedMatch {
    /// Set up the standard layout.
    ///
    /// # Panics
    ///
    /// Panics if `config` fails validation.
    #[must_use]
    pub fn new(config: DecisionConfig) -> Self {
        Self {
            orchestrator: DecisionOrchestrator::new(config).expect("scripted match config should validate"),
            table: QTable::new(),
            reaper: reaper_at(0.0, 0.0),
            others: vec![
                wreck_at(10, 1800.0, 600.0, 3),
                wreck_at(11, -2500.0, 1300.0, 2),
                wreck_at(12, 400.0, -4200.0, 4),
                tanker_at(20, -3000.0, -3000.0),
                hostile_at(30, HostileGroup::Primary, 1, 4000.0, 2000.0),
                hostile_at(31, HostileGroup::Secondary, 1, -4500.0, 500.0),
            ],
            score: 0,
            rage: 0,
            previous_score: None,
            commands: Vec::new(),
        }
    }

    /// Decide one round and apply the command.
    ///
    /// # Panics
    ///
    /// Panics if the decision core returns an error.
    pub fn play_round(&mut self) -> RoundDecision {
        let world = world(self.others.iter().cloned());
        let me = PlayerState::new(0, self.reaper.clone(), self.score, self.rage, self.previous_score, None);
        let decision = self
            .orchestrator
            .decide(&mut self.table, &world, &me, &[])
            .expect("scripted round should decide");
        self.previous_score = Some(self.score);
        self.apply(decision.command);
        self.commands.push(decision.command);
        decision
    }

    fn apply(&mut self, command: MovementCommand) {
        let friction = self.orchestrator.config().reaper.friction;
        match command {
            MovementCommand::Move { x, y, throttle } => {
                #[allow(clippy::cast_precision_loss)]
                let target = Vec2::new(x as f64, y as f64);
                let offset = target - self.reaper.position;
                let length = offset.length();
                if length > 0.0 {
                    let push = f64::from(throttle) / self.reaper.mass;
                    self.reaper.velocity = self.reaper.velocity + offset * (push / length);
                }
            }
            MovementCommand::Skill { .. } => self.rage = self.rage.saturating_sub(30),
            MovementCommand::Wait => {}
        }
        self.reaper.position = self.reaper.position + self.reaper.velocity;
        self.reaper.velocity = self.reaper.velocity * (1.0 - friction);
        self.harvest();
    }

    fn harvest(&mut self) {
        let position = self.reaper.position;
        for wreck in self.others.iter_mut().filter(|u| u.kind == UnitKind::Wreck) {
            if position.distance(wreck.position) <= wreck.radius {
                let water = wreck.water.unwrap_or(0);
                if water > 0 {
                    wreck.water = Some(water - 1);
                    self.score += 1;
                    self.rage += 10;
                }
            }
        }
        self.others
            .retain(|u| u.kind != UnitKind::Wreck || u.water.unwrap_or(0) > 0);
    }

    /// Hash of every issued command and the learned table.
    ///
    /// # Panics
    ///
    /// Panics if the table cannot be serialized.
    #[must_use]
    pub fn state_hash(&self) -> u64 {
        let rendered: Vec<String> = self.commands.iter().map(ToString::to_string).collect();
        let table = self.table.to_bytes().expect("table should serialize");
        crate::determinism::compute_hash(&(rendered, table, self.score))
    }
}
