//! Planner and per-round decision benchmarks for reaper_core.
//!
//! Run with: `cargo bench -p reaper_core`

// Benchmark binaries don't need docs on macro-generated functions
#![allow(missing_docs)]

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use reaper_core::prelude::*;

/// Planner search time per preset over a few distances.
pub fn planner_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("planner");
    for (name, config) in [("fast", PlannerConfig::fast()), ("precise", PlannerConfig::precise())] {
        let planner = ThrottlePathPlanner::new(PlannerConfig {
            timeout_ms: 60_000,
            ..config
        });
        for distance in [500.0, 2000.0] {
            let input = PlanInput::new(0.0, 0.5, 0.2, distance);
            group.bench_with_input(BenchmarkId::new(name, distance), &input, |b, input| {
                b.iter(|| {
                    let mut rng = ChaCha8Rng::seed_from_u64(1);
                    black_box(planner.plan(input, &mut rng))
                });
            });
        }
    }
    group.finish();
}

/// Relational state and key construction for a busy arena.
pub fn state_benchmark(c: &mut Criterion) {
    let mut units = Vec::new();
    for i in 0..12u32 {
        let angle = f64::from(i) * 0.52;
        let kind = match i % 4 {
            0 => UnitKind::Wreck,
            1 => UnitKind::Tanker,
            2 => UnitKind::Hostile(HostileGroup::Primary),
            _ => UnitKind::Hostile(HostileGroup::Secondary),
        };
        units.push(Unit::new(i + 1, kind, Vec2::new(angle.cos() * 4000.0, angle.sin() * 4000.0)));
    }
    let world = WorldSnapshot::from_units(SpatialCategorizer::default(), units);
    let reaper = Unit::new(0, UnitKind::OwnUnit, Vec2::ZERO);
    let player = PlayerState::new(0, reaper, 0, 40, None, None);
    let builder = RelationalStateBuilder::default();

    c.bench_function("relational_state", |b| {
        b.iter(|| black_box(QStateKey::from_state(&builder.build(&world, &player))));
    });
}

criterion_group!(benches, planner_benchmark, state_benchmark);
criterion_main!(benches);
