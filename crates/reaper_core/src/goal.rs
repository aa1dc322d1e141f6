//! Goal vocabulary.
//!
//! Goals are a closed set. Everything that dispatches on a goal does so via
//! [`GoalType::family`] and an exhaustive `match`, so adding a goal is a
//! compile error at every dispatch site until it is handled.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::categorize::{DistanceCategory, RiskCategory};
use crate::error::DecisionError;
use crate::world::HostileGroup;

/// Every goal the reaper can pursue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum GoalType {
    /// Collect water from a safe wreck.
    HarvestSafe,
    /// Collect water from a risky wreck.
    HarvestRisky,
    /// Collect water from a dangerous wreck.
    HarvestDangerous,
    /// Ram a close opponent reaper.
    RamPrimaryClose,
    /// Ram an opponent reaper at medium distance.
    RamPrimaryMid,
    /// Ram a far opponent reaper.
    RamPrimaryFar,
    /// Ram a close opponent vehicle.
    RamSecondaryClose,
    /// Ram an opponent vehicle at medium distance.
    RamSecondaryMid,
    /// Ram a far opponent vehicle.
    RamSecondaryFar,
    /// Fire the special skill.
    UseSpecial,
    /// Do nothing this round.
    Wait,
    /// Move toward a safe tanker.
    MoveTankerSafe,
    /// Move toward a risky tanker.
    MoveTankerRisky,
    /// Move toward a dangerous tanker.
    MoveTankerDangerous,
}

/// Goals grouped by how they are tracked and resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GoalFamily {
    /// Static wreck target.
    Harvest,
    /// Moving hostile target.
    Ram(HostileGroup),
    /// Static-ish tanker target.
    MoveTanker,
    /// One-round skill.
    UseSpecial,
    /// One-round idle.
    Wait,
}

impl GoalType {
    /// Number of goals.
    pub const COUNT: usize = 14;

    /// All goals in declaration order.
    pub const ALL: [Self; Self::COUNT] = [
        Self::HarvestSafe,
        Self::HarvestRisky,
        Self::HarvestDangerous,
        Self::RamPrimaryClose,
        Self::RamPrimaryMid,
        Self::RamPrimaryFar,
        Self::RamSecondaryClose,
        Self::RamSecondaryMid,
        Self::RamSecondaryFar,
        Self::UseSpecial,
        Self::Wait,
        Self::MoveTankerSafe,
        Self::MoveTankerRisky,
        Self::MoveTankerDangerous,
    ];

    /// Position in [`GoalType::ALL`].
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Stable snake-case name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::HarvestSafe => "harvest_safe",
            Self::HarvestRisky => "harvest_risky",
            Self::HarvestDangerous => "harvest_dangerous",
            Self::RamPrimaryClose => "ram_primary_close",
            Self::RamPrimaryMid => "ram_primary_mid",
            Self::RamPrimaryFar => "ram_primary_far",
            Self::RamSecondaryClose => "ram_secondary_close",
            Self::RamSecondaryMid => "ram_secondary_mid",
            Self::RamSecondaryFar => "ram_secondary_far",
            Self::UseSpecial => "use_special",
            Self::Wait => "wait",
            Self::MoveTankerSafe => "move_tanker_safe",
            Self::MoveTankerRisky => "move_tanker_risky",
            Self::MoveTankerDangerous => "move_tanker_dangerous",
        }
    }

    /// Family this goal belongs to.
    #[must_use]
    pub const fn family(self) -> GoalFamily {
        match self {
            Self::HarvestSafe | Self::HarvestRisky | Self::HarvestDangerous => GoalFamily::Harvest,
            Self::RamPrimaryClose | Self::RamPrimaryMid | Self::RamPrimaryFar => {
                GoalFamily::Ram(HostileGroup::Primary)
            }
            Self::RamSecondaryClose | Self::RamSecondaryMid | Self::RamSecondaryFar => {
                GoalFamily::Ram(HostileGroup::Secondary)
            }
            Self::UseSpecial => GoalFamily::UseSpecial,
            Self::Wait => GoalFamily::Wait,
            Self::MoveTankerSafe | Self::MoveTankerRisky | Self::MoveTankerDangerous => {
                GoalFamily::MoveTanker
            }
        }
    }

    /// Requested risk tier for resource goals.
    #[must_use]
    pub const fn risk(self) -> Option<RiskCategory> {
        match self {
            Self::HarvestSafe | Self::MoveTankerSafe => Some(RiskCategory::Safe),
            Self::HarvestRisky | Self::MoveTankerRisky => Some(RiskCategory::Risky),
            Self::HarvestDangerous | Self::MoveTankerDangerous => Some(RiskCategory::Dangerous),
            _ => None,
        }
    }

    /// Requested distance tier for ram goals.
    #[must_use]
    pub const fn distance(self) -> Option<DistanceCategory> {
        match self {
            Self::RamPrimaryClose | Self::RamSecondaryClose => Some(DistanceCategory::Close),
            Self::RamPrimaryMid | Self::RamSecondaryMid => Some(DistanceCategory::Medium),
            Self::RamPrimaryFar | Self::RamSecondaryFar => Some(DistanceCategory::Far),
            _ => None,
        }
    }

    /// Harvest goal for a risk tier.
    #[must_use]
    pub const fn harvest(risk: RiskCategory) -> Self {
        match risk {
            RiskCategory::Safe => Self::HarvestSafe,
            RiskCategory::Risky => Self::HarvestRisky,
            RiskCategory::Dangerous => Self::HarvestDangerous,
        }
    }

    /// Tanker goal for a risk tier.
    #[must_use]
    pub const fn move_tanker(risk: RiskCategory) -> Self {
        match risk {
            RiskCategory::Safe => Self::MoveTankerSafe,
            RiskCategory::Risky => Self::MoveTankerRisky,
            RiskCategory::Dangerous => Self::MoveTankerDangerous,
        }
    }

    /// Ram goal for a hostile group and distance tier.
    #[must_use]
    pub const fn ram(group: HostileGroup, distance: DistanceCategory) -> Self {
        match (group, distance) {
            (HostileGroup::Primary, DistanceCategory::Close) => Self::RamPrimaryClose,
            (HostileGroup::Primary, DistanceCategory::Medium) => Self::RamPrimaryMid,
            (HostileGroup::Primary, DistanceCategory::Far) => Self::RamPrimaryFar,
            (HostileGroup::Secondary, DistanceCategory::Close) => Self::RamSecondaryClose,
            (HostileGroup::Secondary, DistanceCategory::Medium) => Self::RamSecondaryMid,
            (HostileGroup::Secondary, DistanceCategory::Far) => Self::RamSecondaryFar,
        }
    }
}

impl fmt::Display for GoalType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for GoalType {
    type Err = DecisionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|g| g.name() == s)
            .ok_or_else(|| DecisionError::UnknownGoalType(s.to_string()))
    }
}

impl TryFrom<u8> for GoalType {
    type Error = DecisionError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::ALL
            .get(usize::from(value))
            .copied()
            .ok_or_else(|| DecisionError::UnknownGoalType(value.to_string()))
    }
}
