//! World snapshot consumed by the decision core each round.
//!
//! The protocol layer is expected to build one [`WorldSnapshot`] per round
//! from the flat unit list, plus one [`PlayerState`] per player. Everything
//! is stored in ordered maps so iteration order (and therefore every
//! decision derived from it) is reproducible.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::categorize::{GridCell, SpatialCategorizer};
use crate::math::Vec2;

/// Unique unit identifier as issued by the referee.
pub type UnitId = u32;

/// Player index (0 is always us).
pub type PlayerId = u8;

/// Which hostile group a unit belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum HostileGroup {
    /// Opponent reapers (water collectors).
    Primary,
    /// Every other opponent vehicle.
    Secondary,
}

impl HostileGroup {
    /// Both groups, primary first.
    pub const ALL: [Self; 2] = [Self::Primary, Self::Secondary];
}

/// Kind of entity on the field, from the reaper's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UnitKind {
    /// One of our own vehicles.
    OwnUnit,
    /// An opponent vehicle.
    Hostile(HostileGroup),
    /// A water wreck.
    Wreck,
    /// A water tanker.
    Tanker,
    /// A slowing hazard (oil pool, tar pool).
    Hazard,
}

/// A single entity with its kinematics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Unit {
    /// Unit identifier.
    pub id: UnitId,
    /// Entity kind.
    pub kind: UnitKind,
    /// Owning player, if any.
    pub owner: Option<PlayerId>,
    /// World position.
    pub position: Vec2,
    /// Velocity per round.
    pub velocity: Vec2,
    /// Collision radius.
    pub radius: f64,
    /// Mass. Zero for massless entities such as wrecks.
    pub mass: f64,
    /// Remaining water in a wreck or tanker.
    pub water: Option<u32>,
    /// Tanker water capacity.
    pub capacity: Option<u32>,
}

impl Unit {
    /// Create a stationary unit with zero mass and radius.
    #[must_use]
    pub const fn new(id: UnitId, kind: UnitKind, position: Vec2) -> Self {
        Self {
            id,
            kind,
            owner: None,
            position,
            velocity: Vec2::ZERO,
            radius: 0.0,
            mass: 0.0,
            water: None,
            capacity: None,
        }
    }

    /// Set the velocity.
    #[must_use]
    pub const fn with_velocity(mut self, velocity: Vec2) -> Self {
        self.velocity = velocity;
        self
    }

    /// Set the mass.
    #[must_use]
    pub const fn with_mass(mut self, mass: f64) -> Self {
        self.mass = mass;
        self
    }

    /// Set the collision radius.
    #[must_use]
    pub const fn with_radius(mut self, radius: f64) -> Self {
        self.radius = radius;
        self
    }

    /// Set the owning player.
    #[must_use]
    pub const fn with_owner(mut self, owner: PlayerId) -> Self {
        self.owner = Some(owner);
        self
    }

    /// Set remaining water (and capacity, for tankers).
    #[must_use]
    pub const fn with_water(mut self, water: u32, capacity: Option<u32>) -> Self {
        self.water = Some(water);
        self.capacity = capacity;
        self
    }

    /// Momentum magnitude.
    #[must_use]
    pub fn momentum(&self) -> f64 {
        self.mass * self.velocity.length()
    }
}

/// Units of one kind bucketed by grid cell, with an id reverse lookup.
#[derive(Debug, Clone, Default)]
pub struct GridIndex {
    cells: BTreeMap<GridCell, Vec<Unit>>,
    by_id: BTreeMap<UnitId, GridCell>,
}

impl GridIndex {
    /// Create an empty index.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a unit at a cell. A repeated id replaces the previous entry.
    pub fn insert(&mut self, cell: GridCell, unit: Unit) {
        if let Some(previous) = self.by_id.insert(unit.id, cell) {
            if let Some(bucket) = self.cells.get_mut(&previous) {
                bucket.retain(|u| u.id != unit.id);
                if bucket.is_empty() {
                    self.cells.remove(&previous);
                }
            }
        }
        self.cells.entry(cell).or_default().push(unit);
    }

    /// Cell of a unit id.
    #[must_use]
    pub fn cell_of(&self, id: UnitId) -> Option<GridCell> {
        self.by_id.get(&id).copied()
    }

    /// Look up a unit by id.
    #[must_use]
    pub fn get(&self, id: UnitId) -> Option<&Unit> {
        let cell = self.by_id.get(&id)?;
        self.cells.get(cell)?.iter().find(|u| u.id == id)
    }

    /// Whether a unit id is present.
    #[must_use]
    pub fn contains(&self, id: UnitId) -> bool {
        self.by_id.contains_key(&id)
    }

    /// Units in a single cell.
    #[must_use]
    pub fn units_at(&self, cell: GridCell) -> &[Unit] {
        self.cells.get(&cell).map_or(&[][..], Vec::as_slice)
    }

    /// Iterate `(cell, unit)` in cell order, then insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (GridCell, &Unit)> {
        self.cells
            .iter()
            .flat_map(|(cell, units)| units.iter().map(move |u| (*cell, u)))
    }

    /// Number of units.
    #[must_use]
    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    /// Whether the index holds no units.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }
}

/// Everything on the field except our own vehicles.
#[derive(Debug, Clone, Default)]
pub struct WorldSnapshot {
    /// Grid geometry used to bucket the units.
    pub categorizer: SpatialCategorizer,
    /// Water wrecks.
    pub wrecks: GridIndex,
    /// Water tankers.
    pub tankers: GridIndex,
    /// Opponent reapers.
    pub hostile_primary: GridIndex,
    /// Other opponent vehicles.
    pub hostile_secondary: GridIndex,
    /// Slowing hazards.
    pub hazards: GridIndex,
}

impl WorldSnapshot {
    /// Bucket a flat unit list. Own units are skipped; they travel in
    /// [`PlayerState`].
    pub fn from_units<I>(categorizer: SpatialCategorizer, units: I) -> Self
    where
        I: IntoIterator<Item = Unit>,
    {
        let mut world = Self {
            categorizer,
            ..Self::default()
        };
        for unit in units {
            world.insert(unit);
        }
        world
    }

    /// Insert a single unit into the matching index.
    pub fn insert(&mut self, unit: Unit) {
        let cell = self.categorizer.cell_of(unit.position);
        let index = match unit.kind {
            UnitKind::OwnUnit => return,
            UnitKind::Hostile(group) => self.hostiles_mut(group),
            UnitKind::Wreck => &mut self.wrecks,
            UnitKind::Tanker => &mut self.tankers,
            UnitKind::Hazard => &mut self.hazards,
        };
        index.insert(cell, unit);
    }

    /// Hostile index for a group.
    #[must_use]
    pub const fn hostiles(&self, group: HostileGroup) -> &GridIndex {
        match group {
            HostileGroup::Primary => &self.hostile_primary,
            HostileGroup::Secondary => &self.hostile_secondary,
        }
    }

    fn hostiles_mut(&mut self, group: HostileGroup) -> &mut GridIndex {
        match group {
            HostileGroup::Primary => &mut self.hostile_primary,
            HostileGroup::Secondary => &mut self.hostile_secondary,
        }
    }

    /// Index holding a given kind, if the kind is indexed.
    #[must_use]
    pub const fn index_for(&self, kind: UnitKind) -> Option<&GridIndex> {
        match kind {
            UnitKind::OwnUnit => None,
            UnitKind::Hostile(group) => Some(self.hostiles(group)),
            UnitKind::Wreck => Some(&self.wrecks),
            UnitKind::Tanker => Some(&self.tankers),
            UnitKind::Hazard => Some(&self.hazards),
        }
    }

    /// Every indexed unit, grouped by kind.
    pub fn units(&self) -> impl Iterator<Item = &Unit> {
        [
            &self.wrecks,
            &self.tankers,
            &self.hostile_primary,
            &self.hostile_secondary,
            &self.hazards,
        ]
        .into_iter()
        .flat_map(|index| index.iter().map(|(_, unit)| unit))
    }

    /// The same units bucketed with another categorizer.
    #[must_use]
    pub fn regrid(&self, categorizer: SpatialCategorizer) -> Self {
        Self::from_units(categorizer, self.units().cloned())
    }

    /// Look up a unit of a given kind by id.
    #[must_use]
    pub fn find(&self, kind: UnitKind, id: UnitId) -> Option<&Unit> {
        self.index_for(kind)?.get(id)
    }
}

/// Per-player round state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerState {
    /// Player index.
    pub player_id: PlayerId,
    /// The player's reaper.
    pub reaper: Unit,
    /// Current score.
    pub score: u32,
    /// Current rage.
    pub rage: u32,
    /// Score gained since the previous round.
    pub score_gained: u32,
    /// Rage gained since the previous round.
    pub rage_gained: u32,
}

impl PlayerState {
    /// Build a player state, deriving gains from the previous round's values.
    ///
    /// Unknown previous values yield zero gains.
    #[must_use]
    pub fn new(
        player_id: PlayerId,
        reaper: Unit,
        score: u32,
        rage: u32,
        previous_score: Option<u32>,
        previous_rage: Option<u32>,
    ) -> Self {
        Self {
            player_id,
            reaper,
            score,
            rage,
            score_gained: previous_score.map_or(0, |p| score.saturating_sub(p)),
            rage_gained: previous_rage.map_or(0, |p| rage.saturating_sub(p)),
        }
    }

    /// Grid cell of this player's reaper.
    #[must_use]
    pub fn reaper_cell(&self, categorizer: &SpatialCategorizer) -> GridCell {
        categorizer.cell_of(self.reaper.position)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wreck(id: UnitId, x: f64, y: f64) -> Unit {
        Unit::new(id, UnitKind::Wreck, Vec2::new(x, y))
    }

    #[test]
    fn test_from_units_buckets_by_kind() {
        let units = vec![
            wreck(1, 0.0, 0.0),
            Unit::new(2, UnitKind::Tanker, Vec2::new(1300.0, 0.0)),
            Unit::new(3, UnitKind::Hostile(HostileGroup::Primary), Vec2::new(0.0, 0.0)),
            Unit::new(4, UnitKind::OwnUnit, Vec2::new(0.0, 0.0)),
        ];
        let world = WorldSnapshot::from_units(SpatialCategorizer::default(), units);
        assert_eq!(world.wrecks.len(), 1);
        assert_eq!(world.tankers.cell_of(2), Some(GridCell::new(1, 0)));
        assert!(world.hostile_primary.contains(3));
        assert!(world.hostile_secondary.is_empty());
        assert!(world.find(UnitKind::OwnUnit, 4).is_none());
    }

    #[test]
    fn test_regrid_rebuckets_every_unit() {
        let units = vec![
            wreck(1, 2500.0, 0.0),
            Unit::new(2, UnitKind::Tanker, Vec2::new(-700.0, 300.0)),
            Unit::new(3, UnitKind::Hostile(HostileGroup::Secondary), Vec2::new(0.0, 4100.0)),
        ];
        let world = WorldSnapshot::from_units(SpatialCategorizer::default(), units);
        let fine = SpatialCategorizer {
            cell_size: 500.0,
            ..SpatialCategorizer::default()
        };
        let regridded = world.regrid(fine);

        assert_eq!(regridded.categorizer, fine);
        assert_eq!(regridded.units().count(), 3);
        assert_eq!(world.wrecks.cell_of(1), Some(GridCell::new(2, 0)));
        assert_eq!(regridded.wrecks.cell_of(1), Some(GridCell::new(5, 0)));
        assert_eq!(regridded.tankers.cell_of(2), Some(GridCell::new(-2, 0)));
        assert_eq!(regridded.hostile_secondary.cell_of(3), Some(GridCell::new(0, 8)));
    }

    #[test]
    fn test_grid_index_reinsert_moves_unit() {
        let mut index = GridIndex::new();
        index.insert(GridCell::new(0, 0), wreck(7, 0.0, 0.0));
        index.insert(GridCell::new(2, 2), wreck(7, 2500.0, 2500.0));
        assert_eq!(index.len(), 1);
        assert!(index.units_at(GridCell::new(0, 0)).is_empty());
        assert_eq!(index.get(7).map(|u| u.position.x), Some(2500.0));
    }

    #[test]
    fn test_iteration_is_cell_ordered() {
        let mut index = GridIndex::new();
        index.insert(GridCell::new(3, 0), wreck(1, 0.0, 0.0));
        index.insert(GridCell::new(-1, 0), wreck(2, 0.0, 0.0));
        let ids: Vec<_> = index.iter().map(|(_, u)| u.id).collect();
        assert_eq!(ids, vec![2, 1]);
    }

    #[test]
    fn test_player_state_gains() {
        let reaper = Unit::new(0, UnitKind::OwnUnit, Vec2::ZERO);
        let state = PlayerState::new(0, reaper.clone(), 12, 40, Some(10), None);
        assert_eq!(state.score_gained, 2);
        assert_eq!(state.rage_gained, 0);

        let first = PlayerState::new(0, reaper, 12, 40, None, None);
        assert_eq!(first.score_gained, 0);
    }

    #[test]
    fn test_momentum() {
        let unit = Unit::new(1, UnitKind::OwnUnit, Vec2::ZERO)
            .with_mass(2.0)
            .with_velocity(Vec2::new(3.0, 4.0));
        assert!((unit.momentum() - 10.0).abs() < f64::EPSILON);
    }
}
