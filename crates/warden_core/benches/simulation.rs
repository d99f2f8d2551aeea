//! Simulation benchmarks for warden_core.
//!
//! Run with: `cargo bench -p warden_core`

// Benchmark binaries don't need docs on macro-generated functions
#![allow(missing_docs)]

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use warden_core::components::TeamId;
use warden_core::net::NetRole;
use warden_core::simulation::Simulation;
use warden_test_utils::fixtures::{arena, at, skirmish, spawn, DAGGER, FLARE};

fn crowd(units: i32) -> Simulation {
    let mut sim = arena(NetRole::Standalone);
    for i in 0..units {
        let team = if i % 2 == 0 { TeamId::SHARDED } else { TeamId::CRUX };
        let kind = if i % 5 == 0 { FLARE } else { DAGGER };
        spawn(&mut sim, kind, team, at(20 + (i % 20) * 24, 20 + (i / 20) * 24), None);
    }
    sim
}

/// Tick cost as the unit count grows.
pub fn tick_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("tick");
    for units in [10, 100, 400] {
        group.bench_with_input(BenchmarkId::from_parameter(units), &units, |b, &units| {
            let mut sim = crowd(units);
            b.iter(|| black_box(sim.tick()));
        });
    }
    group.finish();
}

/// Save and snapshot encoding of a running skirmish.
pub fn codec_benchmark(c: &mut Criterion) {
    let mut sim = skirmish(NetRole::Server);
    for _ in 0..30 {
        sim.tick();
    }

    c.bench_function("save", |b| b.iter(|| black_box(sim.save())));
    c.bench_function("snapshot_messages", |b| {
        b.iter(|| black_box(sim.snapshot_messages()))
    });

    let bytes = sim.save().unwrap_or_default();
    c.bench_function("load", |b| {
        b.iter(|| {
            let mut restored = skirmish(NetRole::Standalone);
            black_box(restored.load(&bytes))
        })
    });
}

criterion_group!(benches, tick_benchmark, codec_benchmark);
criterion_main!(benches);
