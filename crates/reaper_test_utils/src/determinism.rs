//! Determinism testing utilities.
//!
//! A match driven by the decision core must replay identically for a fixed
//! seed and configuration. Sources of divergence to watch for:
//!
//! - **Unseeded randomness**: every draw goes through the orchestrator's
//!   seeded generator.
//! - **Map iteration order**: indices and the value table use ordered maps.
//! - **Wall-clock budgets**: the planner's time budget can cut a search
//!   short; determinism tests raise it so the generation limit decides.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::thread;

/// Result of a determinism test.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeterminismResult {
    /// Whether all runs produced identical results.
    pub is_deterministic: bool,
    /// Hashes from each run.
    pub hashes: Vec<u64>,
    /// Number of rounds played.
    pub rounds: u64,
}

impl DeterminismResult {
    /// All distinct hashes; one for a deterministic run.
    #[must_use]
    pub fn unique_hashes(&self) -> Vec<u64> {
        let mut unique = self.hashes.clone();
        unique.sort_unstable();
        unique.dedup();
        unique
    }

    /// Assert that every run matched.
    ///
    /// # Panics
    ///
    /// Panics if the runs produced different hashes.
    pub fn assert_deterministic(&self) {
        assert!(
            self.is_deterministic,
            "Decisions are non-deterministic!\n\
             Runs: {}\n\
             Rounds: {}\n\
             Unique hashes: {} (expected 1)\n\
             All hashes: {:?}",
            self.hashes.len(),
            self.rounds,
            self.unique_hashes().len(),
            self.hashes
        );
    }
}

/// Play a setup several times and compare final hashes.
///
/// # Example
///
/// ```ignore
/// use reaper_test_utils::determinism::verify_determinism;
/// use reaper_test_utils::fixtures::{deterministic_config, ScriptedMatch};
///
/// let result = verify_determinism(
///     3,
///     30,
///     || ScriptedMatch::new(deterministic_config(7)),
///     |game| { game.play_round(); },
///     ScriptedMatch::state_hash,
/// );
/// result.assert_deterministic();
/// ```
pub fn verify_determinism<S, Setup, Step, HashFn>(
    runs: usize,
    rounds: u64,
    setup: Setup,
    step: Step,
    hash: HashFn,
) -> DeterminismResult
where
    Setup: Fn() -> S,
    Step: Fn(&mut S),
    HashFn: Fn(&S) -> u64,
{
    let hashes: Vec<u64> = (0..runs)
        .map(|_| {
            let mut state = setup();
            for _ in 0..rounds {
                step(&mut state);
            }
            hash(&state)
        })
        .collect();
    tracing::debug!(runs, rounds, ?hashes, "Determinism runs finished");

    DeterminismResult {
        is_deterministic: hashes.windows(2).all(|w| w[0] == w[1]),
        hashes,
        rounds,
    }
}

/// Like [`verify_determinism`] but each run on its own scoped thread.
///
/// # Panics
///
/// Panics if a run panics.
pub fn verify_determinism_parallel<S, Setup, Step, HashFn>(
    runs: usize,
    rounds: u64,
    setup: Setup,
    step: Step,
    hash: HashFn,
) -> DeterminismResult
where
    Setup: Fn() -> S + Sync,
    Step: Fn(&mut S) + Sync,
    HashFn: Fn(&S) -> u64 + Sync,
{
    let hashes: Vec<u64> = thread::scope(|s| {
        let handles: Vec<_> = (0..runs)
            .map(|_| {
                s.spawn(|| {
                    let mut state = setup();
                    for _ in 0..rounds {
                        step(&mut state);
                    }
                    hash(&state)
                })
            })
            .collect();
        handles
            .into_iter()
            .map(|h| h.join().expect("determinism run panicked"))
            .collect()
    });

    DeterminismResult {
        is_deterministic: hashes.windows(2).all(|w| w[0] == w[1]),
        hashes,
        rounds,
    }
}

/// Hash any hashable value with the std hasher.
pub fn compute_hash<T: Hash>(value: &T) -> u64 {
    let mut hasher = DefaultHasher::new();
    value.hash(&mut hasher);
    hasher.finish()
}

/// Proptest strategies for decision-core inputs.
pub mod strategies {
    use proptest::prelude::*;
    use reaper_core::categorize::PLAYFIELD_RADIUS;
    use reaper_core::prelude::*;

    /// Coordinate inside the playfield's bounding square.
    pub fn arb_coordinate() -> impl Strategy<Value = f64> {
        -PLAYFIELD_RADIUS..PLAYFIELD_RADIUS
    }

    /// Position inside the playfield's bounding square.
    pub fn arb_position() -> impl Strategy<Value = Vec2> {
        (arb_coordinate(), arb_coordinate()).prop_map(|(x, y)| Vec2::new(x, y))
    }

    /// Any non-own unit kind.
    pub fn arb_other_kind() -> impl Strategy<Value = UnitKind> {
        prop_oneof![
            Just(UnitKind::Wreck),
            Just(UnitKind::Tanker),
            Just(UnitKind::Hostile(HostileGroup::Primary)),
            Just(UnitKind::Hostile(HostileGroup::Secondary)),
        ]
    }

    /// Units with distinct ids starting at 1.
    pub fn arb_units(max_units: usize) -> impl Strategy<Value = Vec<Unit>> {
        proptest::collection::vec((arb_other_kind(), arb_position()), 0..max_units).prop_map(|specs| {
            specs
                .into_iter()
                .zip(1u32..)
                .map(|((kind, position), id)| Unit::new(id, kind, position))
                .collect()
        })
    }

    /// Any goal type.
    pub fn arb_goal() -> impl Strategy<Value = GoalType> {
        (0..GoalType::ALL.len()).prop_map(|i| GoalType::ALL[i])
    }

    /// Planner input in the range a reaper sees in play.
    pub fn arb_plan_input() -> impl Strategy<Value = PlanInput> {
        (0.0..300.0f64, 0.5..10.0f64, 0.0..0.5f64, 0.0..3000.0f64)
            .prop_map(|(speed, mass, friction, distance)| PlanInput::new(speed, mass, friction, distance))
    }
}
