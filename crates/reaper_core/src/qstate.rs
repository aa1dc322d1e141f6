//! Decision state key and the learned value table.
//!
//! [`QStateKey`] collapses the relational state into presence flags, one per
//! canonical category pair of each relation map, plus the special-skill
//! flag. Concrete ids never reach the key, so two worlds with the same
//! category configuration share a table row.
//!
//! [`QTable`] maps keys to per-goal weights. Rows are created lazily with
//! every weight at zero the first time a key is read for ranking or
//! adjusted.

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{DecisionError, Result};
use crate::goal::GoalType;
use crate::relation::{RelationKey, RelationMap, RelationalState};

/// Value table file format version.
pub const QTABLE_VERSION: u32 = 1;

/// Names of the relation maps in key order.
pub const RELATION_NAMES: [&str; 5] = [
    "wreck/primary",
    "wreck/secondary",
    "tanker/hostiles",
    "hostile/primary",
    "hostile/secondary",
];

/// One `(first, second, has_candidate)` entry of a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RelationTriple {
    /// Index into [`RELATION_NAMES`].
    pub relation: usize,
    /// Ordinal of the first category.
    pub first: u8,
    /// Ordinal of the second category.
    pub second: u8,
    /// Whether the bucket held any candidate.
    pub present: bool,
}

/// Canonical, id-free state key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct QStateKey {
    presence: u64,
    special_available: bool,
}

impl QStateKey {
    /// Total number of presence flags.
    pub const WIDTH: usize = 39;

    /// Derive the key from a relational state.
    #[must_use]
    pub fn from_state(state: &RelationalState) -> Self {
        let mut presence = 0u64;
        let flags = flags(&state.wreck_vs_primary)
            .chain(flags(&state.wreck_vs_secondary))
            .chain(flags(&state.tanker_vs_hostiles))
            .chain(flags(&state.hostile_primary))
            .chain(flags(&state.hostile_secondary));
        for (bit, present) in flags.enumerate() {
            if present {
                presence |= 1 << bit;
            }
        }
        Self {
            presence,
            special_available: state.special_available,
        }
    }

    /// Raw presence bit set.
    #[must_use]
    pub const fn presence(self) -> u64 {
        self.presence
    }

    /// Whether the special skill was available.
    #[must_use]
    pub const fn special_available(self) -> bool {
        self.special_available
    }

    /// Expand the key back into its ordered triples.
    #[must_use]
    pub fn triples(self) -> Vec<RelationTriple> {
        use crate::relation::{HostileKey, ResourceKey};

        let resource = ResourceKey::CANONICAL.iter().map(|k| k.encode());
        let hostile = HostileKey::CANONICAL.iter().map(|k| k.encode());
        let layout = resource
            .clone()
            .map(|e| (0, e))
            .chain(resource.clone().map(|e| (1, e)))
            .chain(resource.map(|e| (2, e)))
            .chain(hostile.clone().map(|e| (3, e)))
            .chain(hostile.map(|e| (4, e)));

        layout
            .enumerate()
            .map(|(bit, (relation, (first, second)))| RelationTriple {
                relation,
                first,
                second,
                present: self.presence & (1 << bit) != 0,
            })
            .collect()
    }
}

fn flags<K: RelationKey>(map: &RelationMap<K>) -> impl Iterator<Item = bool> + '_ {
    map.presence().map(|(_, present)| present)
}

impl fmt::Display for QStateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut current = usize::MAX;
        for triple in self.triples() {
            if triple.relation != current {
                if current != usize::MAX {
                    f.write_str(" ")?;
                }
                write!(f, "{}:", RELATION_NAMES[triple.relation])?;
                current = triple.relation;
            }
            f.write_str(if triple.present { "1" } else { "0" })?;
        }
        write!(f, " special:{}", u8::from(self.special_available))
    }
}

/// Per-goal weights for one state.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ActionWeights {
    weights: [f64; GoalType::COUNT],
}

impl ActionWeights {
    /// Weight of a goal.
    #[must_use]
    pub const fn get(&self, goal: GoalType) -> f64 {
        self.weights[goal.index()]
    }

    /// Add a delta to a goal's weight.
    pub fn add(&mut self, goal: GoalType, delta: f64) {
        self.weights[goal.index()] += delta;
    }

    /// Goals by descending weight. Ties keep declaration order.
    #[must_use]
    pub fn ranked(&self) -> Vec<GoalType> {
        let mut goals = GoalType::ALL.to_vec();
        goals.sort_by(|a, b| self.get(*b).total_cmp(&self.get(*a)));
        goals
    }

    /// Highest weighted goal and its weight.
    #[must_use]
    pub fn best(&self) -> (GoalType, f64) {
        let goal = self.ranked()[0];
        (goal, self.get(goal))
    }

    /// `(goal, weight)` pairs in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (GoalType, f64)> + '_ {
        GoalType::ALL.into_iter().map(|g| (g, self.get(g)))
    }
}

#[derive(Serialize, Deserialize)]
struct QTableFile {
    version: u32,
    rows: BTreeMap<QStateKey, ActionWeights>,
}

/// State key to action weights. Owned by the caller for the whole game.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QTable {
    rows: BTreeMap<QStateKey, ActionWeights>,
}

impl QTable {
    /// Create an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Row for a key, created zeroed on first access.
    pub fn weights_mut(&mut self, key: QStateKey) -> &mut ActionWeights {
        self.rows.entry(key).or_default()
    }

    /// Row for a key without creating it.
    #[must_use]
    pub fn weights(&self, key: QStateKey) -> Option<&ActionWeights> {
        self.rows.get(&key)
    }

    /// Goals ranked for a key, creating the row if needed.
    pub fn ranked(&mut self, key: QStateKey) -> Vec<GoalType> {
        self.weights_mut(key).ranked()
    }

    /// Strongest goal for a key, if the key has been seen.
    #[must_use]
    pub fn best_action(&self, key: QStateKey) -> Option<(GoalType, f64)> {
        self.weights(key).map(ActionWeights::best)
    }

    /// Add a delta to one `(key, goal)` weight.
    pub fn adjust(&mut self, key: QStateKey, goal: GoalType, delta: f64) {
        self.weights_mut(key).add(goal, delta);
    }

    /// Number of rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the table has no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Iterate rows in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&QStateKey, &ActionWeights)> {
        self.rows.iter()
    }

    /// Serialize to bytes with a version header.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let file = QTableFile {
            version: QTABLE_VERSION,
            rows: self.rows.clone(),
        };
        Ok(bincode::serialize(&file)?)
    }

    /// Deserialize from bytes, checking the version header.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let file: QTableFile = bincode::deserialize(bytes)?;
        if file.version != QTABLE_VERSION {
            return Err(DecisionError::TableVersionMismatch {
                expected: QTABLE_VERSION,
                found: file.version,
            });
        }
        Ok(Self { rows: file.rows })
    }

    /// Save to a file.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the write fails.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        std::fs::write(path.as_ref(), self.to_bytes()?)?;
        tracing::debug!(rows = self.len(), path = %path.as_ref().display(), "Saved value table");
        Ok(())
    }

    /// Load from a file.
    ///
    /// # Errors
    ///
    /// Returns an error if the read fails, the bytes do not decode, or the
    /// file was written by another format version.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let bytes = std::fs::read(path.as_ref())?;
        Self::from_bytes(&bytes)
    }
}
