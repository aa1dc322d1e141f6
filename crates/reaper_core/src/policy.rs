//! Epsilon-greedy goal selection.

use rand::seq::SliceRandom;
use rand::Rng;

use crate::config::ExplorationConfig;
use crate::goal::GoalType;
use crate::qstate::{QStateKey, QTable};
use crate::relation::RelationalState;
use crate::selector::is_feasible;

/// Picks the next goal from the learned weights.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GoalSelector {
    exploration: ExplorationConfig,
}

impl GoalSelector {
    /// Create a selector.
    #[must_use]
    pub const fn new(exploration: ExplorationConfig) -> Self {
        Self { exploration }
    }

    /// Explore with the configured probability, otherwise exploit.
    ///
    /// Never returns an infeasible goal; `wait` is always feasible.
    pub fn select<R: Rng + ?Sized>(
        &self,
        table: &mut QTable,
        key: QStateKey,
        state: &RelationalState,
        rng: &mut R,
    ) -> GoalType {
        if rng.gen::<f64>() < self.exploration.rate {
            let goal = self.explore(state, rng);
            tracing::debug!(goal = %goal, "Exploring");
            goal
        } else {
            let goal = Self::exploit(table, key, state);
            tracing::debug!(goal = %goal, "Exploiting");
            goal
        }
    }

    /// Random feasible goal, falling back to `wait` once the attempts run out.
    pub fn explore<R: Rng + ?Sized>(&self, state: &RelationalState, rng: &mut R) -> GoalType {
        (0..self.exploration.attempts)
            .filter_map(|_| GoalType::ALL.choose(rng).copied())
            .find(|goal| is_feasible(state, *goal))
            .unwrap_or(GoalType::Wait)
    }

    /// Highest weighted feasible goal, ties broken by declaration order.
    pub fn exploit(table: &mut QTable, key: QStateKey, state: &RelationalState) -> GoalType {
        table
            .ranked(key)
            .into_iter()
            .find(|goal| is_feasible(state, *goal))
            .unwrap_or(GoalType::Wait)
    }
}
