//! Relational state: the five category-keyed candidate maps.
//!
//! Each map buckets candidate entity ids by an ordinal category pair. Maps
//! are pre-populated with every canonical key so that two worlds with the
//! same category configuration always expose the same key set, whatever
//! ids fill the buckets.

use std::collections::BTreeMap;
use std::fmt::Debug;

use serde::{Deserialize, Serialize};

use crate::categorize::{DistanceCategory, GridCell, RiskCategory, SpatialCategorizer};
use crate::goal::{GoalFamily, GoalType};
use crate::selector::SelectedTarget;
use crate::world::{GridIndex, HostileGroup, PlayerState, UnitId, WorldSnapshot};

/// A category pair usable as a relation map key.
pub trait RelationKey: Copy + Ord + Debug + 'static {
    /// Every key the map must expose, in canonical order.
    const CANONICAL: &'static [Self];

    /// Ordinal encoding of both components.
    fn encode(self) -> (u8, u8);
}

/// Key for resource relations: distance to us, worst hostile risk at the resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ResourceKey {
    /// Distance category from our reaper.
    pub distance: DistanceCategory,
    /// Worst risk category at the resource.
    pub risk: RiskCategory,
}

impl ResourceKey {
    /// Create a key.
    #[must_use]
    pub const fn new(distance: DistanceCategory, risk: RiskCategory) -> Self {
        Self { distance, risk }
    }
}

impl RelationKey for ResourceKey {
    const CANONICAL: &'static [Self] = &{
        use DistanceCategory::{Close, Far, Medium};
        use RiskCategory::{Dangerous, Risky, Safe};
        [
            Self::new(Close, Safe),
            Self::new(Close, Risky),
            Self::new(Close, Dangerous),
            Self::new(Medium, Safe),
            Self::new(Medium, Risky),
            Self::new(Medium, Dangerous),
            Self::new(Far, Safe),
            Self::new(Far, Risky),
            Self::new(Far, Dangerous),
        ]
    };

    fn encode(self) -> (u8, u8) {
        (self.distance as u8, self.risk as u8)
    }
}

/// Key for hostile relations: distance to us, the hostile's distance to its
/// nearest resource. The second component is never [`DistanceCategory::Far`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct HostileKey {
    /// Distance category from our reaper.
    pub distance: DistanceCategory,
    /// Distance category from the hostile to its nearest wreck or tanker.
    pub resource: DistanceCategory,
}

impl HostileKey {
    /// Create a key.
    #[must_use]
    pub const fn new(distance: DistanceCategory, resource: DistanceCategory) -> Self {
        Self { distance, resource }
    }
}

impl RelationKey for HostileKey {
    const CANONICAL: &'static [Self] = &{
        use DistanceCategory::{Close, Far, Medium};
        [
            Self::new(Close, Close),
            Self::new(Close, Medium),
            Self::new(Medium, Close),
            Self::new(Medium, Medium),
            Self::new(Far, Close),
            Self::new(Far, Medium),
        ]
    };

    fn encode(self) -> (u8, u8) {
        (self.distance as u8, self.resource as u8)
    }
}

/// Category pair to candidate ids, with a reverse id lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelationMap<K: RelationKey> {
    buckets: BTreeMap<K, Vec<UnitId>>,
    reverse: BTreeMap<UnitId, K>,
}

impl<K: RelationKey> Default for RelationMap<K> {
    fn default() -> Self {
        Self {
            buckets: K::CANONICAL.iter().map(|k| (*k, Vec::new())).collect(),
            reverse: BTreeMap::new(),
        }
    }
}

impl<K: RelationKey> RelationMap<K> {
    /// Create a map with every canonical key present and empty.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a candidate id under a key.
    pub fn push(&mut self, key: K, id: UnitId) {
        self.buckets.entry(key).or_default().push(id);
        self.reverse.insert(id, key);
    }

    /// Candidates under a key.
    #[must_use]
    pub fn bucket(&self, key: K) -> &[UnitId] {
        self.buckets.get(&key).map_or(&[][..], Vec::as_slice)
    }

    /// First candidate under a key.
    #[must_use]
    pub fn first(&self, key: K) -> Option<UnitId> {
        self.bucket(key).first().copied()
    }

    /// Current category of a candidate id.
    #[must_use]
    pub fn category_of(&self, id: UnitId) -> Option<K> {
        self.reverse.get(&id).copied()
    }

    /// `(key, has_candidate)` for every canonical key, in canonical order.
    pub fn presence(&self) -> impl Iterator<Item = (K, bool)> + '_ {
        K::CANONICAL
            .iter()
            .map(|k| (*k, !self.bucket(*k).is_empty()))
    }

    /// Total number of candidates.
    #[must_use]
    pub fn len(&self) -> usize {
        self.reverse.len()
    }

    /// Whether the map holds no candidates.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.reverse.is_empty()
    }
}

/// The five relation maps plus special-resource availability.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RelationalState {
    /// Wrecks, risk against opponent reapers.
    pub wreck_vs_primary: RelationMap<ResourceKey>,
    /// Wrecks, risk against other opponent vehicles.
    pub wreck_vs_secondary: RelationMap<ResourceKey>,
    /// Tankers, risk against every opponent vehicle.
    pub tanker_vs_hostiles: RelationMap<ResourceKey>,
    /// Opponent reapers near a resource.
    pub hostile_primary: RelationMap<HostileKey>,
    /// Other opponent vehicles near a resource.
    pub hostile_secondary: RelationMap<HostileKey>,
    /// Whether the special skill can be used this round.
    pub special_available: bool,
}

impl RelationalState {
    /// Hostile relation map for a group.
    #[must_use]
    pub const fn hostiles(&self, group: HostileGroup) -> &RelationMap<HostileKey> {
        match group {
            HostileGroup::Primary => &self.hostile_primary,
            HostileGroup::Secondary => &self.hostile_secondary,
        }
    }

    /// Goal variant matching the target's current category.
    ///
    /// A harvest goal whose wreck turned risky becomes the risky harvest goal,
    /// a ram goal whose target drifted away becomes the farther ram goal, and
    /// so on. Goals without categories, and targets no longer present in the
    /// relevant map, are returned unchanged.
    #[must_use]
    pub fn recategorize(&self, goal: GoalType, target: Option<&SelectedTarget>) -> GoalType {
        let Some(target) = target else {
            return goal;
        };
        let adjusted = match goal.family() {
            GoalFamily::Harvest => self
                .wreck_vs_primary
                .category_of(target.id)
                .map(|key| GoalType::harvest(key.risk)),
            GoalFamily::MoveTanker => self
                .tanker_vs_hostiles
                .category_of(target.id)
                .map(|key| GoalType::move_tanker(key.risk)),
            GoalFamily::Ram(group) => self
                .hostiles(group)
                .category_of(target.id)
                .map(|key| GoalType::ram(group, key.distance)),
            GoalFamily::UseSpecial | GoalFamily::Wait => None,
        };
        adjusted.unwrap_or(goal)
    }
}

/// Builds a [`RelationalState`] from a world snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RelationalStateBuilder {
    /// Rage needed before the special skill counts as available.
    pub special_rage_threshold: u32,
}

impl Default for RelationalStateBuilder {
    fn default() -> Self {
        Self {
            special_rage_threshold: 30,
        }
    }
}

impl RelationalStateBuilder {
    /// Create a builder.
    #[must_use]
    pub const fn new(special_rage_threshold: u32) -> Self {
        Self {
            special_rage_threshold,
        }
    }

    /// Categorize every candidate relative to the player's reaper.
    #[must_use]
    pub fn build(&self, world: &WorldSnapshot, player: &PlayerState) -> RelationalState {
        let categorizer = &world.categorizer;
        let origin = player.reaper_cell(categorizer);

        RelationalState {
            wreck_vs_primary: resource_relation(categorizer, origin, &world.wrecks, &[
                &world.hostile_primary,
            ]),
            wreck_vs_secondary: resource_relation(categorizer, origin, &world.wrecks, &[
                &world.hostile_secondary,
            ]),
            tanker_vs_hostiles: resource_relation(categorizer, origin, &world.tankers, &[
                &world.hostile_primary,
                &world.hostile_secondary,
            ]),
            hostile_primary: hostile_relation(categorizer, origin, world, HostileGroup::Primary),
            hostile_secondary: hostile_relation(categorizer, origin, world, HostileGroup::Secondary),
            special_available: player.rage >= self.special_rage_threshold,
        }
    }
}

fn resource_relation(
    categorizer: &SpatialCategorizer,
    origin: GridCell,
    resources: &GridIndex,
    hostiles: &[&GridIndex],
) -> RelationMap<ResourceKey> {
    let mut map = RelationMap::new();
    for (cell, resource) in resources.iter() {
        let distance = categorizer.distance(origin, cell);
        let hostile_cells = hostiles.iter().flat_map(|index| index.iter().map(|(c, _)| c));
        let risk = categorizer.worst_risk(cell, hostile_cells);
        map.push(ResourceKey::new(distance, risk), resource.id);
    }
    map
}

fn hostile_relation(
    categorizer: &SpatialCategorizer,
    origin: GridCell,
    world: &WorldSnapshot,
    group: HostileGroup,
) -> RelationMap<HostileKey> {
    let mut map = RelationMap::new();
    for (cell, hostile) in world.hostiles(group).iter() {
        let nearest = nearest_resource(categorizer, cell, world);
        if nearest == DistanceCategory::Far {
            continue;
        }
        let distance = categorizer.distance(origin, cell);
        map.push(HostileKey::new(distance, nearest), hostile.id);
    }
    map
}

fn nearest_resource(categorizer: &SpatialCategorizer, cell: GridCell, world: &WorldSnapshot) -> DistanceCategory {
    world
        .wrecks
        .iter()
        .chain(world.tankers.iter())
        .map(|(resource, _)| categorizer.distance(cell, resource))
        .min()
        .unwrap_or(DistanceCategory::Far)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::Vec2;
    use crate::world::{Unit, UnitKind};

    fn player_at(x: f64, y: f64, rage: u32) -> PlayerState {
        let reaper = Unit::new(0, UnitKind::OwnUnit, Vec2::new(x, y));
        PlayerState::new(0, reaper, 0, rage, None, None)
    }

    fn at_cell(id: UnitId, kind: UnitKind, cx: i64, cy: i64) -> Unit {
        // Centre of the cell at the default 1200 cell size.
        #[allow(clippy::cast_precision_loss)]
        let pos = Vec2::new(cx as f64 * 1200.0 + 600.0, cy as f64 * 1200.0 + 600.0);
        Unit::new(id, kind, pos)
    }

    #[test]
    fn test_canonical_key_counts() {
        assert_eq!(ResourceKey::CANONICAL.len(), 9);
        assert_eq!(HostileKey::CANONICAL.len(), 6);
        assert!(HostileKey::CANONICAL
            .iter()
            .all(|k| k.resource != DistanceCategory::Far));
    }

    #[test]
    fn test_tanker_close_and_safe_without_hostiles() {
        let world = WorldSnapshot::from_units(SpatialCategorizer::default(), [at_cell(
            5,
            UnitKind::Tanker,
            1,
            1,
        )]);
        let state = RelationalStateBuilder::default().build(&world, &player_at(600.0, 600.0, 0));
        let key = ResourceKey::new(DistanceCategory::Close, RiskCategory::Safe);
        assert_eq!(state.tanker_vs_hostiles.bucket(key), &[5]);
        assert_eq!(state.tanker_vs_hostiles.category_of(5), Some(key));
    }

    #[test]
    fn test_wreck_risk_depends_on_group() {
        let world = WorldSnapshot::from_units(SpatialCategorizer::default(), [
            at_cell(1, UnitKind::Wreck, 0, 0),
            at_cell(2, UnitKind::Hostile(HostileGroup::Primary), 1, 0),
            at_cell(3, UnitKind::Hostile(HostileGroup::Secondary), 3, 0),
        ]);
        let state = RelationalStateBuilder::default().build(&world, &player_at(600.0, 600.0, 0));
        assert_eq!(
            state.wreck_vs_primary.category_of(1).map(|k| k.risk),
            Some(RiskCategory::Dangerous)
        );
        assert_eq!(
            state.wreck_vs_secondary.category_of(1).map(|k| k.risk),
            Some(RiskCategory::Risky)
        );
        assert_eq!(
            state.tanker_vs_hostiles.len(),
            0,
            "no tankers on the field"
        );
    }

    #[test]
    fn test_hostiles_far_from_resources_are_excluded() {
        let world = WorldSnapshot::from_units(SpatialCategorizer::default(), [
            at_cell(1, UnitKind::Wreck, 0, 0),
            at_cell(2, UnitKind::Hostile(HostileGroup::Primary), 1, 1),
            at_cell(3, UnitKind::Hostile(HostileGroup::Primary), 4, 4),
        ]);
        let state = RelationalStateBuilder::default().build(&world, &player_at(600.0, 600.0, 0));
        assert_eq!(
            state.hostile_primary.category_of(2),
            Some(HostileKey::new(DistanceCategory::Close, DistanceCategory::Close))
        );
        assert_eq!(state.hostile_primary.category_of(3), None);
    }

    #[test]
    fn test_special_availability_threshold() {
        let world = WorldSnapshot::default();
        let builder = RelationalStateBuilder::default();
        assert!(!builder.build(&world, &player_at(0.0, 0.0, 29)).special_available);
        assert!(builder.build(&world, &player_at(0.0, 0.0, 30)).special_available);
    }

    #[test]
    fn test_recategorize_harvest_goal() {
        let world = WorldSnapshot::from_units(SpatialCategorizer::default(), [
            at_cell(1, UnitKind::Wreck, 0, 0),
            at_cell(2, UnitKind::Hostile(HostileGroup::Primary), 2, 0),
        ]);
        let state = RelationalStateBuilder::default().build(&world, &player_at(600.0, 600.0, 0));
        let target = SelectedTarget::new(1, UnitKind::Wreck);
        assert_eq!(
            state.recategorize(GoalType::HarvestSafe, Some(&target)),
            GoalType::HarvestRisky
        );
        let gone = SelectedTarget::new(99, UnitKind::Wreck);
        assert_eq!(
            state.recategorize(GoalType::HarvestSafe, Some(&gone)),
            GoalType::HarvestSafe
        );
        assert_eq!(state.recategorize(GoalType::Wait, None), GoalType::Wait);
    }
}
