//! Planner runs and distance sweeps.

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use reaper_core::config::PlannerPresets;
use reaper_core::planner::{PlanInput, PlannerPreset, Throttle, ThrottlePathPlanner};
use serde::Serialize;

use crate::error::{Result, ToolError};

/// One planner invocation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlanRequest {
    /// Start conditions.
    pub input: PlanInput,
    /// Preset to search with.
    pub preset: PlannerPreset,
    /// Seed for the search.
    pub seed: u64,
}

/// Result of one planner invocation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlanReport {
    /// Requested distance.
    pub distance: f64,
    /// Best throttle sequence.
    pub sequence: Vec<Throttle>,
    /// Weighted fitness, lower is better.
    pub score: f64,
    /// Absolute distance error.
    pub distance_error: f64,
    /// Simulated `(distance, speed)` after each throttle.
    pub trajectory: Vec<(f64, f64)>,
    /// Whether the time budget stopped the search.
    pub timed_out: bool,
}

/// Run the planner once.
#[must_use]
pub fn run_plan(request: &PlanRequest, presets: &PlannerPresets) -> PlanReport {
    let planner = ThrottlePathPlanner::new(*presets.get(request.preset));
    let mut rng = ChaCha8Rng::seed_from_u64(request.seed);
    let result = planner.plan(&request.input, &mut rng);
    PlanReport {
        distance: request.input.distance,
        trajectory: request.input.trajectory(&result.sequence),
        score: result.fitness.score,
        distance_error: result.fitness.distance_diff,
        sequence: result.sequence,
        timed_out: result.timed_out,
    }
}

/// Distances from `from` to `to` inclusive in steps of `step`.
///
/// # Errors
///
/// Returns [`ToolError::InvalidArgument`] for a non-positive step or an
/// empty range.
pub fn distance_range(from: f64, to: f64, step: f64) -> Result<Vec<f64>> {
    if step.is_nan() || step <= 0.0 {
        return Err(ToolError::InvalidArgument(format!("step must be positive, got {step}")));
    }
    if from.is_nan() || to.is_nan() || from > to {
        return Err(ToolError::InvalidArgument(format!("empty range {from}..={to}")));
    }
    let mut distances = Vec::new();
    let mut i = 0u32;
    loop {
        let distance = from + step * f64::from(i);
        if distance > to {
            break;
        }
        distances.push(distance);
        i += 1;
    }
    Ok(distances)
}

/// Plan every distance in parallel. Run `i` is seeded with `seed + i`, so a
/// sweep is reproducible regardless of thread count.
#[must_use]
pub fn sweep(
    distances: &[f64],
    template: PlanInput,
    preset: PlannerPreset,
    seed: u64,
    presets: &PlannerPresets,
) -> Vec<PlanReport> {
    tracing::info!(runs = distances.len(), ?preset, "Starting planner sweep");
    distances
        .par_iter()
        .enumerate()
        .map(|(i, distance)| {
            let request = PlanRequest {
                input: PlanInput {
                    distance: *distance,
                    ..template
                },
                preset,
                seed: seed.wrapping_add(i as u64),
            };
            run_plan(&request, presets)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use reaper_core::planner::PlannerConfig;

    fn quick_presets() -> PlannerPresets {
        let quick = PlannerConfig {
            population_size: 40,
            generations: 10,
            timeout_ms: 60_000,
            ..PlannerConfig::fast()
        };
        PlannerPresets {
            fast: quick,
            precise: quick,
        }
    }

    #[test]
    fn test_distance_range_is_inclusive() {
        assert_eq!(distance_range(100.0, 300.0, 100.0).expect("range"), vec![100.0, 200.0, 300.0]);
        assert_eq!(distance_range(5.0, 5.0, 1.0).expect("range"), vec![5.0]);
    }

    #[test]
    fn test_distance_range_rejects_bad_input() {
        assert!(matches!(distance_range(0.0, 10.0, 0.0), Err(ToolError::InvalidArgument(_))));
        assert!(matches!(distance_range(10.0, 0.0, 1.0), Err(ToolError::InvalidArgument(_))));
    }

    #[test]
    fn test_report_trajectory_follows_sequence() {
        let request = PlanRequest {
            input: PlanInput::new(0.0, 0.5, 0.2, 800.0),
            preset: PlannerPreset::Fast,
            seed: 4,
        };
        let report = run_plan(&request, &quick_presets());
        assert_eq!(report.trajectory.len(), report.sequence.len() + 1);
        assert!((report.distance - 800.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_sweep_matches_sequential_runs() {
        let presets = quick_presets();
        let template = PlanInput::new(0.0, 0.5, 0.2, 0.0);
        let distances = [200.0, 700.0, 1500.0];
        let parallel = sweep(&distances, template, PlannerPreset::Fast, 10, &presets);

        for (i, (distance, report)) in distances.iter().zip(&parallel).enumerate() {
            let request = PlanRequest {
                input: PlanInput::new(0.0, 0.5, 0.2, *distance),
                preset: PlannerPreset::Fast,
                seed: 10 + i as u64,
            };
            assert_eq!(&run_plan(&request, &presets), report);
        }
    }
}
