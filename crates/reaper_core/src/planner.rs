//! Genetic throttle planner.
//!
//! Searches for a short throttle sequence that covers a required straight
//! line distance under linear drag:
//!
//! ```text
//! speed    = (speed + throttle / mass) * (1 - friction)
//! distance = distance + speed
//! ```
//!
//! Lower fitness is better. The search stops after the configured number of
//! generations or once the wall-clock budget is spent, whichever comes
//! first, and always returns the best sequence seen so far.
//!
//! # Example
//!
//! ```
//! use rand::SeedableRng;
//! use rand_chacha::ChaCha8Rng;
//! use reaper_core::planner::{PlanInput, PlannerConfig, ThrottlePathPlanner};
//!
//! let planner = ThrottlePathPlanner::new(PlannerConfig::fast());
//! let input = PlanInput::new(0.0, 0.5, 0.2, 500.0);
//! let result = planner.plan(&input, &mut ChaCha8Rng::seed_from_u64(7));
//! assert!(!result.sequence.is_empty());
//! ```

use std::time::{Duration, Instant};

use rand::seq::{index, SliceRandom};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::{DecisionError, Result};
use crate::goal::{GoalFamily, GoalType};

/// Throttle value as sent on the wire.
pub type Throttle = u32;

/// Objective weights.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FitnessWeights {
    /// Weight of the distance error.
    pub distance: f64,
    /// Weight of the final speed penalty.
    pub speed: f64,
    /// Weight of the sequence length.
    pub length: f64,
    /// Weight of the non-zero throttle count.
    pub nonzero: f64,
}

/// Genetic search hyperparameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlannerConfig {
    /// Longest allowed sequence.
    pub max_sequence_length: usize,
    /// Individuals per generation.
    pub population_size: usize,
    /// Generation limit.
    pub generations: usize,
    /// Per-gene mutation probability, also the shrink probability.
    pub mutation_rate: f64,
    /// Best individuals kept as parents and carried over unchanged.
    pub elite_count: usize,
    /// Random individuals added to the parent pool.
    pub random_count: usize,
    /// Final speed tolerated without penalty.
    pub speed_threshold: f64,
    /// Smallest throttle.
    pub throttle_min: Throttle,
    /// Largest throttle.
    pub throttle_max: Throttle,
    /// Objective weights.
    pub weights: FitnessWeights,
    /// Wall-clock budget in milliseconds.
    pub timeout_ms: u64,
}

impl PlannerConfig {
    /// Large population, short sequences, distance dominates.
    #[must_use]
    pub const fn fast() -> Self {
        Self {
            max_sequence_length: 12,
            population_size: 1000,
            generations: 100,
            mutation_rate: 0.1,
            elite_count: 20,
            random_count: 10,
            speed_threshold: 5.0,
            throttle_min: 0,
            throttle_max: 300,
            weights: FitnessWeights {
                distance: 1.0,
                speed: 0.001,
                length: 0.001,
                nonzero: 0.001,
            },
            timeout_ms: 300,
        }
    }

    /// Small population, long sequences, arrival speed matters.
    #[must_use]
    pub const fn precise() -> Self {
        Self {
            max_sequence_length: 50,
            population_size: 100,
            generations: 100,
            mutation_rate: 0.1,
            elite_count: 20,
            random_count: 10,
            speed_threshold: 3.0,
            throttle_min: 0,
            throttle_max: 300,
            weights: FitnessWeights {
                distance: 0.5,
                speed: 0.6,
                length: 0.3,
                nonzero: 0.3,
            },
            timeout_ms: 300,
        }
    }

    /// Check that the configuration can run.
    ///
    /// # Errors
    ///
    /// Returns [`DecisionError::InvalidConfig`] naming the first bad field.
    pub fn validate(&self) -> Result<()> {
        let fail = |msg: &str| Err(DecisionError::InvalidConfig(msg.to_string()));
        if self.max_sequence_length == 0 {
            return fail("planner max_sequence_length must be at least 1");
        }
        if self.population_size == 0 {
            return fail("planner population_size must be at least 1");
        }
        if self.throttle_min > self.throttle_max {
            return fail("planner throttle_min exceeds throttle_max");
        }
        if !(0.0..=1.0).contains(&self.mutation_rate) {
            return fail("planner mutation_rate must be within [0, 1]");
        }
        if self.elite_count + self.random_count == 0 {
            return fail("planner needs at least one parent per generation");
        }
        Ok(())
    }
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self::fast()
    }
}

/// Named planner configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlannerPreset {
    /// [`PlannerConfig::fast`].
    Fast,
    /// [`PlannerConfig::precise`].
    Precise,
}

/// How a goal's throttle is produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PathStrategy {
    /// Search with a planner preset.
    Genetic(PlannerPreset),
    /// Fixed single zero throttle.
    Idle,
}

impl PathStrategy {
    /// Strategy for a goal.
    #[must_use]
    pub const fn for_goal(goal: GoalType) -> Self {
        match goal.family() {
            GoalFamily::Harvest => Self::Genetic(PlannerPreset::Precise),
            GoalFamily::Ram(_) | GoalFamily::MoveTanker => Self::Genetic(PlannerPreset::Fast),
            GoalFamily::UseSpecial | GoalFamily::Wait => Self::Idle,
        }
    }
}

/// Start conditions for one plan.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlanInput {
    /// Current speed.
    pub speed: f64,
    /// Vehicle mass.
    pub mass: f64,
    /// Friction applied every round.
    pub friction: f64,
    /// Distance to cover.
    pub distance: f64,
}

impl PlanInput {
    /// Create an input.
    #[must_use]
    pub const fn new(speed: f64, mass: f64, friction: f64, distance: f64) -> Self {
        Self {
            speed,
            mass,
            friction,
            distance,
        }
    }

    /// Speed after one throttle step.
    #[must_use]
    pub fn step(&self, speed: f64, throttle: Throttle) -> f64 {
        (speed + f64::from(throttle) / self.mass) * (1.0 - self.friction)
    }

    /// Distance covered and final speed after a sequence.
    #[must_use]
    pub fn simulate(&self, throttles: &[Throttle]) -> (f64, f64) {
        throttles
            .iter()
            .fold((0.0, self.speed), |(distance, speed), &throttle| {
                let speed = self.step(speed, throttle);
                (distance + speed, speed)
            })
    }

    /// `(distance, speed)` after every step, starting with `(0, speed)`.
    #[must_use]
    pub fn trajectory(&self, throttles: &[Throttle]) -> Vec<(f64, f64)> {
        let mut points = Vec::with_capacity(throttles.len() + 1);
        let (mut distance, mut speed) = (0.0, self.speed);
        points.push((distance, speed));
        for &throttle in throttles {
            speed = self.step(speed, throttle);
            distance += speed;
            points.push((distance, speed));
        }
        points
    }
}

/// Breakdown of one fitness evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FitnessScore {
    /// Weighted total, lower is better.
    pub score: f64,
    /// Absolute distance error.
    pub distance_diff: f64,
    /// Final speed penalty.
    pub speed_penalty: f64,
    /// Sequence length.
    pub length: usize,
}

/// Evaluate a sequence.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn fitness(input: &PlanInput, throttles: &[Throttle], config: &PlannerConfig) -> FitnessScore {
    let (distance, final_speed) = input.simulate(throttles);
    let distance_diff = (input.distance - distance).abs();
    let speed_penalty = if (0.0..=config.speed_threshold).contains(&final_speed) {
        0.0
    } else {
        (final_speed - config.speed_threshold).abs()
    };
    let length = throttles.len();
    let nonzero = throttles.iter().filter(|t| **t != 0).count();
    let w = &config.weights;
    FitnessScore {
        score: w.distance * distance_diff
            + w.speed * speed_penalty
            + w.length * length as f64
            + w.nonzero * nonzero as f64,
        distance_diff,
        speed_penalty,
        length,
    }
}

/// Outcome of a planning run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanResult {
    /// Best sequence found.
    pub sequence: Vec<Throttle>,
    /// Fitness of that sequence.
    pub fitness: FitnessScore,
    /// Best score of each completed generation.
    pub history: Vec<f64>,
    /// Whether the wall-clock budget cut the search short.
    pub timed_out: bool,
}

/// Genetic planner bound to one configuration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThrottlePathPlanner {
    config: PlannerConfig,
}

impl ThrottlePathPlanner {
    /// Create a planner.
    #[must_use]
    pub const fn new(config: PlannerConfig) -> Self {
        Self { config }
    }

    /// Planner configuration.
    #[must_use]
    pub const fn config(&self) -> &PlannerConfig {
        &self.config
    }

    /// Run the search.
    pub fn plan<R: Rng + ?Sized>(&self, input: &PlanInput, rng: &mut R) -> PlanResult {
        let config = &self.config;
        let deadline = Instant::now() + Duration::from_millis(config.timeout_ms);
        let mut population: Vec<Vec<Throttle>> = (0..config.population_size.max(1))
            .map(|_| self.random_sequence(rng))
            .collect();

        let mut best: Option<(Vec<Throttle>, FitnessScore)> = None;
        let mut history = Vec::with_capacity(config.generations);
        let mut timed_out = false;

        for generation in 0..config.generations.max(1) {
            let mut scored: Vec<(Vec<Throttle>, FitnessScore)> = population
                .into_iter()
                .map(|seq| {
                    let score = fitness(input, &seq, config);
                    (seq, score)
                })
                .collect();
            scored.sort_by(|a, b| a.1.score.total_cmp(&b.1.score));

            let (leader, leader_score) = &scored[0];
            history.push(leader_score.score);
            if best.as_ref().map_or(true, |(_, s)| leader_score.score < s.score) {
                best = Some((leader.clone(), *leader_score));
            }
            tracing::trace!(generation, best = leader_score.score, "Planner generation");

            if Instant::now() >= deadline {
                timed_out = generation + 1 < config.generations;
                if timed_out {
                    tracing::warn!(
                        generation = generation + 1,
                        timeout_ms = config.timeout_ms,
                        "Planner stopped on time budget"
                    );
                }
                break;
            }
            population = self.next_generation(&scored, rng);
        }

        let (sequence, fitness) = best.unwrap_or_else(|| {
            let fallback = vec![config.throttle_min];
            let score = fitness(input, &fallback, config);
            (fallback, score)
        });
        PlanResult {
            sequence,
            fitness,
            history,
            timed_out,
        }
    }

    fn random_sequence<R: Rng + ?Sized>(&self, rng: &mut R) -> Vec<Throttle> {
        let len = rng.gen_range(1..=self.config.max_sequence_length.max(1));
        (0..len).map(|_| self.random_throttle(rng)).collect()
    }

    fn random_throttle<R: Rng + ?Sized>(&self, rng: &mut R) -> Throttle {
        rng.gen_range(self.config.throttle_min..=self.config.throttle_max)
    }

    /// Elites survive unchanged; the rest are mutated offspring of the
    /// elite-plus-random parent pool.
    fn next_generation<R: Rng + ?Sized>(
        &self,
        scored: &[(Vec<Throttle>, FitnessScore)],
        rng: &mut R,
    ) -> Vec<Vec<Throttle>> {
        let config = &self.config;
        let elites: Vec<&Vec<Throttle>> = scored.iter().take(config.elite_count).map(|(s, _)| s).collect();
        let mut pool = elites.clone();
        pool.extend(
            scored
                .choose_multiple(rng, config.random_count)
                .map(|(s, _)| s),
        );

        let size = config.population_size.max(1);
        let mut next: Vec<Vec<Throttle>> = elites.into_iter().take(size).cloned().collect();
        while next.len() < size {
            let child = if pool.len() >= 2 {
                let picks = index::sample(rng, pool.len(), 2);
                self.crossover(pool[picks.index(0)], pool[picks.index(1)], rng)
            } else {
                pool[0].clone()
            };
            next.push(self.mutate(child, rng));
        }
        next
    }

    fn crossover<R: Rng + ?Sized>(&self, a: &[Throttle], b: &[Throttle], rng: &mut R) -> Vec<Throttle> {
        let cut_a = rng.gen_range(1..=a.len());
        let cut_b = rng.gen_range(1..=b.len());
        let mut child: Vec<Throttle> = a[..cut_a].iter().chain(&b[cut_b..]).copied().collect();
        child.truncate(self.config.max_sequence_length);
        child
    }

    fn mutate<R: Rng + ?Sized>(&self, mut sequence: Vec<Throttle>, rng: &mut R) -> Vec<Throttle> {
        let rate = self.config.mutation_rate;
        for gene in &mut sequence {
            if rng.gen_bool(rate) {
                *gene = self.random_throttle(rng);
            }
        }
        if sequence.len() > 1 && rng.gen_bool(rate) {
            let at = rng.gen_range(0..sequence.len());
            sequence.remove(at);
        }
        sequence
    }
}
