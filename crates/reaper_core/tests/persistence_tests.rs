//! Value table persistence and shipped configuration.

use std::path::Path;

use reaper_core::config::DecisionConfig;
use reaper_core::prelude::*;
use reaper_test_utils::fixtures::{deterministic_config, ScriptedMatch};

/// Load the shipped config whether tests run from the workspace or the crate.
fn shipped_config_path() -> &'static Path {
    let paths = [Path::new("assets/decision.ron"), Path::new("../../assets/decision.ron")];
    paths
        .into_iter()
        .find(|p| p.exists())
        .unwrap_or_else(|| panic!("Could not find assets/decision.ron. Tried: {paths:?}"))
}

#[test]
fn test_shipped_config_parses_and_validates() {
    let config = DecisionConfig::load(shipped_config_path()).expect("shipped config");
    assert_eq!(config.special_rage_threshold, 30);
    assert!((0.0..=1.0).contains(&config.exploration.rate));
    assert!(config.planner.fast.population_size > config.planner.precise.population_size);
}

#[test]
fn test_table_survives_save_and_load() {
    let mut game = ScriptedMatch::new(deterministic_config(3));
    for _ in 0..12 {
        game.play_round();
    }
    assert!(!game.table.is_empty());

    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("table.bin");
    game.table.save(&path).expect("save");
    let loaded = QTable::load(&path).expect("load");

    assert_eq!(loaded, game.table);
    for (key, weights) in game.table.iter() {
        assert_eq!(loaded.best_action(*key), Some(weights.best()));
    }
}

#[test]
fn test_table_from_other_version_is_rejected() {
    let mut table = QTable::new();
    table.adjust(QStateKey::default(), GoalType::Wait, 1.5);
    let mut bytes = table.to_bytes().expect("serialize");
    bytes[..4].copy_from_slice(&99u32.to_le_bytes());

    let result = QTable::from_bytes(&bytes);
    assert!(matches!(
        result,
        Err(DecisionError::TableVersionMismatch { found: 99, .. })
    ));
}

#[test]
fn test_missing_table_file_is_io_error() {
    let dir = tempfile::tempdir().expect("tempdir");
    let result = QTable::load(dir.path().join("absent.bin"));
    assert!(matches!(result, Err(DecisionError::Io(_))));
}
