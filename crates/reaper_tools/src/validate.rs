//! Configuration validation.

use std::path::{Path, PathBuf};

use reaper_core::config::DecisionConfig;
use serde::Serialize;

use crate::error::Result;

/// Headline values of a validated configuration.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConfigSummary {
    /// File the configuration came from.
    pub path: PathBuf,
    /// Random seed.
    pub seed: u64,
    /// Exploration probability.
    pub exploration_rate: f64,
    /// Grid cell side length.
    pub cell_size: f64,
    /// Fast preset population and generation limit.
    pub fast_search: (usize, usize),
    /// Precise preset population and generation limit.
    pub precise_search: (usize, usize),
}

impl ConfigSummary {
    fn new(path: &Path, config: &DecisionConfig) -> Self {
        Self {
            path: path.to_path_buf(),
            seed: config.seed,
            exploration_rate: config.exploration.rate,
            cell_size: config.grid.cell_size,
            fast_search: (config.planner.fast.population_size, config.planner.fast.generations),
            precise_search: (
                config.planner.precise.population_size,
                config.planner.precise.generations,
            ),
        }
    }
}

/// Validate one configuration file, or every `.ron` file in a directory.
///
/// # Errors
///
/// Returns the first file's load or validation error.
pub fn validate_path(path: &Path) -> Result<Vec<ConfigSummary>> {
    let files = if path.is_dir() {
        let mut files: Vec<PathBuf> = std::fs::read_dir(path)
            .map_err(reaper_core::error::DecisionError::from)?
            .filter_map(std::result::Result::ok)
            .map(|entry| entry.path())
            .filter(|p| p.extension().is_some_and(|ext| ext == "ron"))
            .collect();
        files.sort();
        files
    } else {
        vec![path.to_path_buf()]
    };

    files
        .iter()
        .map(|file| {
            tracing::debug!(path = %file.display(), "Validating config");
            let config = DecisionConfig::load(file)?;
            Ok(ConfigSummary::new(file, &config))
        })
        .collect()
}
