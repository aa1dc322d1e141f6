//! Decision core configuration.
//!
//! Every tunable lives here as plain data. Configurations are stored as RON
//! and every field falls back to its default when omitted:
//!
//! ```ron
//! (
//!     seed: 42,
//!     exploration: (rate: 0.1, attempts: 20),
//!     special_rage_threshold: 30,
//! )
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::availability::AvailabilityLimits;
use crate::categorize::SpatialCategorizer;
use crate::error::{DecisionError, Result};
use crate::long_term::LongTermConfig;
use crate::mission::RewardConfig;
use crate::planner::{PlannerConfig, PlannerPreset};

/// Epsilon-greedy exploration settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ExplorationConfig {
    /// Probability of exploring on a goal selection.
    pub rate: f64,
    /// Random draws attempted before falling back to waiting.
    pub attempts: u32,
}

impl Default for ExplorationConfig {
    fn default() -> Self {
        Self {
            rate: 0.2,
            attempts: 14,
        }
    }
}

/// Physical constants of our reaper.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReaperPhysics {
    /// Friction applied every round.
    pub friction: f64,
    /// Mass used when the snapshot carries none.
    pub default_mass: f64,
}

impl Default for ReaperPhysics {
    fn default() -> Self {
        Self {
            friction: 0.2,
            default_mass: 0.5,
        }
    }
}

/// Planner configuration per preset.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlannerPresets {
    /// Used by ram and tanker goals.
    pub fast: PlannerConfig,
    /// Used by harvest goals.
    pub precise: PlannerConfig,
}

impl Default for PlannerPresets {
    fn default() -> Self {
        Self {
            fast: PlannerConfig::fast(),
            precise: PlannerConfig::precise(),
        }
    }
}

impl PlannerPresets {
    /// Configuration of a preset.
    #[must_use]
    pub const fn get(&self, preset: PlannerPreset) -> &PlannerConfig {
        match preset {
            PlannerPreset::Fast => &self.fast,
            PlannerPreset::Precise => &self.precise,
        }
    }
}

/// Complete decision core configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecisionConfig {
    /// Seed for exploration and planning.
    pub seed: u64,
    /// Exploration settings.
    pub exploration: ExplorationConfig,
    /// Grid geometry and category thresholds.
    pub grid: SpatialCategorizer,
    /// Rage needed to use the special skill.
    pub special_rage_threshold: u32,
    /// Goal availability limits.
    pub availability: AvailabilityLimits,
    /// Immediate rewards.
    pub rewards: RewardConfig,
    /// Delayed rewards.
    pub long_term: LongTermConfig,
    /// Planner presets.
    pub planner: PlannerPresets,
    /// Reaper physics.
    pub reaper: ReaperPhysics,
}

impl Default for DecisionConfig {
    fn default() -> Self {
        Self {
            seed: 0x5EED,
            exploration: ExplorationConfig::default(),
            grid: SpatialCategorizer::default(),
            special_rage_threshold: 30,
            availability: AvailabilityLimits::default(),
            rewards: RewardConfig::default(),
            long_term: LongTermConfig::default(),
            planner: PlannerPresets::default(),
            reaper: ReaperPhysics::default(),
        }
    }
}

impl DecisionConfig {
    /// Load and validate a configuration file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file is missing, unreadable, malformed, or
    /// fails validation.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(DecisionError::ConfigNotFound(path.display().to_string()));
        }
        let contents = std::fs::read_to_string(path)?;
        Self::from_ron_str(&contents)
    }

    /// Parse and validate a RON string.
    ///
    /// # Errors
    ///
    /// Returns an error if the string is malformed or fails validation.
    pub fn from_ron_str(ron: &str) -> Result<Self> {
        let config: Self = ron::from_str(ron)?;
        config.validate()?;
        Ok(config)
    }

    /// Render as pretty RON.
    pub fn to_ron_string(&self) -> Result<String> {
        Ok(ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())?)
    }

    /// Check every value that would make the core misbehave.
    ///
    /// # Errors
    ///
    /// Returns [`DecisionError::InvalidConfig`] describing the first problem.
    pub fn validate(&self) -> Result<()> {
        let invalid = |msg: String| Err(DecisionError::InvalidConfig(msg));

        if !(0.0..=1.0).contains(&self.exploration.rate) {
            return invalid(format!("exploration rate {} outside [0, 1]", self.exploration.rate));
        }
        if self.grid.cell_size.is_nan() || self.grid.cell_size <= 0.0 {
            return invalid(format!("grid cell_size must be positive, got {}", self.grid.cell_size));
        }
        let t = &self.grid.thresholds;
        if t.close > t.medium {
            return invalid(format!("close threshold {} exceeds medium {}", t.close, t.medium));
        }
        if t.dangerous > t.risky {
            return invalid(format!("dangerous threshold {} exceeds risky {}", t.dangerous, t.risky));
        }
        if !(0.0..1.0).contains(&self.reaper.friction) {
            return invalid(format!("friction {} outside [0, 1)", self.reaper.friction));
        }
        if self.reaper.default_mass.is_nan() || self.reaper.default_mass <= 0.0 {
            return invalid("reaper default_mass must be positive".to_string());
        }
        for (name, horizon) in [("harvest", &self.long_term.harvest), ("ram", &self.long_term.ram)] {
            if horizon.horizon == 0 {
                return invalid(format!("{name} long-term horizon must be at least 1"));
            }
        }
        self.planner.fast.validate()?;
        self.planner.precise.validate()?;
        Ok(())
    }
}
