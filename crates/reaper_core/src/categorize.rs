//! Spatial categorization.
//!
//! The arena is discretized into a square grid and every pairwise relation
//! the policy cares about is reduced to an ordinal category computed from
//! the Manhattan distance between grid cells.

use serde::{Deserialize, Serialize};

use crate::math::Vec2;

/// Default arena radius in world units.
pub const PLAYFIELD_RADIUS: f64 = 6000.0;

/// Default number of cells along each axis.
pub const CELLS_PER_AXIS: u32 = 10;

/// Integer grid cell coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct GridCell {
    /// Column.
    pub x: i64,
    /// Row.
    pub y: i64,
}

impl GridCell {
    /// Create a new grid cell.
    #[must_use]
    pub const fn new(x: i64, y: i64) -> Self {
        Self { x, y }
    }

    /// Manhattan distance between two cells.
    #[must_use]
    pub const fn manhattan(self, other: Self) -> u64 {
        self.x.abs_diff(other.x) + self.y.abs_diff(other.y)
    }
}

/// Distance between two cells, bucketed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum DistanceCategory {
    /// Within the close threshold.
    Close,
    /// Within the medium threshold.
    Medium,
    /// Beyond every threshold.
    Far,
}

impl DistanceCategory {
    /// All categories, nearest first.
    pub const ALL: [Self; 3] = [Self::Close, Self::Medium, Self::Far];
}

/// Proximity of the nearest hostile, bucketed. Ordered from least to most severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RiskCategory {
    /// No hostile within the risky threshold.
    Safe,
    /// A hostile within the risky threshold.
    Risky,
    /// A hostile within the dangerous threshold.
    Dangerous,
}

impl RiskCategory {
    /// All categories, safest first.
    pub const ALL: [Self; 3] = [Self::Safe, Self::Risky, Self::Dangerous];
}

/// Manhattan thresholds (in cells) for both category families.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CategoryThresholds {
    /// Largest distance still considered close.
    pub close: u64,
    /// Largest distance still considered medium.
    pub medium: u64,
    /// Largest hostile distance considered dangerous.
    pub dangerous: u64,
    /// Largest hostile distance considered risky.
    pub risky: u64,
}

impl CategoryThresholds {
    /// Thresholds scaled to the total number of grid squares.
    #[must_use]
    pub const fn for_grid_squares(squares: u64) -> Self {
        Self {
            close: squares / 20,
            medium: squares / 15,
            dangerous: squares / 90,
            risky: squares / 25,
        }
    }
}

impl Default for CategoryThresholds {
    fn default() -> Self {
        let per_axis = CELLS_PER_AXIS as u64;
        Self::for_grid_squares(per_axis * per_axis)
    }
}

/// Grid geometry plus thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpatialCategorizer {
    /// Side length of one cell in world units.
    pub cell_size: f64,
    /// Category thresholds.
    pub thresholds: CategoryThresholds,
}

impl Default for SpatialCategorizer {
    fn default() -> Self {
        Self {
            cell_size: PLAYFIELD_RADIUS * 2.0 / f64::from(CELLS_PER_AXIS),
            thresholds: CategoryThresholds::default(),
        }
    }
}

impl SpatialCategorizer {
    /// Create a categorizer with an explicit cell size.
    #[must_use]
    pub const fn new(cell_size: f64, thresholds: CategoryThresholds) -> Self {
        Self {
            cell_size,
            thresholds,
        }
    }

    /// Cell containing a world position, using floored division.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn cell_of(&self, position: Vec2) -> GridCell {
        GridCell::new(
            (position.x / self.cell_size).floor() as i64,
            (position.y / self.cell_size).floor() as i64,
        )
    }

    /// Distance category between two cells.
    #[must_use]
    pub fn distance(&self, a: GridCell, b: GridCell) -> DistanceCategory {
        let d = a.manhattan(b);
        if d <= self.thresholds.close {
            DistanceCategory::Close
        } else if d <= self.thresholds.medium {
            DistanceCategory::Medium
        } else {
            DistanceCategory::Far
        }
    }

    /// Risk category for a single hostile at the given cell.
    #[must_use]
    pub fn risk(&self, object: GridCell, hostile: GridCell) -> RiskCategory {
        let d = object.manhattan(hostile);
        if d <= self.thresholds.dangerous {
            RiskCategory::Dangerous
        } else if d <= self.thresholds.risky {
            RiskCategory::Risky
        } else {
            RiskCategory::Safe
        }
    }

    /// Worst risk over a set of hostile cells.
    ///
    /// Stops scanning as soon as a dangerous hostile is found.
    pub fn worst_risk<I>(&self, object: GridCell, hostiles: I) -> RiskCategory
    where
        I: IntoIterator<Item = GridCell>,
    {
        let mut worst = RiskCategory::Safe;
        for hostile in hostiles {
            let risk = self.risk(object, hostile);
            if risk == RiskCategory::Dangerous {
                return risk;
            }
            worst = worst.max(risk);
        }
        worst
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_geometry() {
        let cat = SpatialCategorizer::default();
        assert!((cat.cell_size - 1200.0).abs() < f64::EPSILON);
        assert_eq!(cat.thresholds.close, 5);
        assert_eq!(cat.thresholds.medium, 6);
        assert_eq!(cat.thresholds.dangerous, 1);
        assert_eq!(cat.thresholds.risky, 4);
    }

    #[test]
    fn test_cell_of_floors_negative_coordinates() {
        let cat = SpatialCategorizer::default();
        assert_eq!(cat.cell_of(Vec2::new(-1.0, 1199.0)), GridCell::new(-1, 0));
        assert_eq!(cat.cell_of(Vec2::new(-6000.0, 5999.0)), GridCell::new(-5, 4));
    }

    #[test]
    fn test_distance_thresholds() {
        let cat = SpatialCategorizer::default();
        let origin = GridCell::new(0, 0);
        assert_eq!(cat.distance(origin, GridCell::new(2, 3)), DistanceCategory::Close);
        assert_eq!(cat.distance(origin, GridCell::new(3, 3)), DistanceCategory::Medium);
        assert_eq!(cat.distance(origin, GridCell::new(4, 3)), DistanceCategory::Far);
    }

    #[test]
    fn test_worst_risk_short_circuits_on_dangerous() {
        let cat = SpatialCategorizer::default();
        let object = GridCell::new(0, 0);
        let hostiles = [GridCell::new(9, 9), GridCell::new(2, 1), GridCell::new(1, 0)];
        assert_eq!(cat.worst_risk(object, hostiles), RiskCategory::Dangerous);
        assert_eq!(cat.worst_risk(object, [GridCell::new(2, 2)]), RiskCategory::Risky);
        assert_eq!(cat.worst_risk(object, []), RiskCategory::Safe);
    }
}
