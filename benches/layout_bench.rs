//! Layout build benchmarks.
//!
//! Measures each pass on generated universes of increasing size, plus the
//! whole pipeline with and without verification.

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use hubforge::emit::hub_records;
use hubforge::{
    LayoutOptions, SubtypeGraph, SyntheticShape, TypeCheckLayout, TypeUniverse, WorldMode,
    build_layout, limits::SLOT_CAPACITY, synthetic_universe,
};
use hubforge_dispatch::build_dispatch;
use once_cell::sync::Lazy;

const SIZES: [usize; 3] = [200, 2_000, 20_000];

/// Generated universes shared by every benchmark, keyed by class count.
static UNIVERSES: Lazy<Vec<(usize, TypeUniverse)>> = Lazy::new(|| {
    SIZES
        .iter()
        .map(|&classes| {
            let shape = SyntheticShape {
                classes,
                interfaces: classes / 5,
                ..SyntheticShape::default()
            };
            let universe = synthetic_universe(&shape)
                .unwrap_or_else(|err| panic!("synthetic universe with {classes} classes: {err}"));
            (classes, universe)
        })
        .collect()
});

fn unverified() -> LayoutOptions {
    LayoutOptions::default()
        .with_verify_type_checks(false)
        .with_verify_dispatch(false)
}

/// Subtype graph construction alone.
fn bench_subtype_graph(c: &mut Criterion) {
    let mut group = c.benchmark_group("subtype_graph");
    for (classes, universe) in UNIVERSES.iter() {
        group.bench_with_input(BenchmarkId::new("build", classes), universe, |b, universe| {
            b.iter(|| black_box(SubtypeGraph::build(universe).map(|graph| graph.num_included())))
        });
    }
    group.finish();
}

/// Class and interface id assignment.
fn bench_type_check_ids(c: &mut Criterion) {
    let mut group = c.benchmark_group("type_check_ids");
    for (classes, universe) in UNIVERSES.iter() {
        let Ok(graph) = SubtypeGraph::build(universe) else {
            continue;
        };
        group.bench_with_input(BenchmarkId::new("assign", classes), universe, |b, universe| {
            b.iter(|| {
                black_box(
                    TypeCheckLayout::build(universe, &graph, SLOT_CAPACITY)
                        .map(|layout| layout.total_slots()),
                )
            })
        });
    }
    group.finish();
}

/// Vtables and itables in both worlds.
fn bench_dispatch(c: &mut Criterion) {
    let mut group = c.benchmark_group("dispatch");
    for (classes, universe) in UNIVERSES.iter() {
        let Ok(graph) = SubtypeGraph::build(universe) else {
            continue;
        };
        for world in [WorldMode::Closed, WorldMode::Open] {
            let id = BenchmarkId::new(format!("{world:?}").to_lowercase(), classes);
            group.bench_with_input(id, universe, |b, universe| {
                b.iter(|| {
                    black_box(
                        build_dispatch(universe, &graph, world)
                            .map(|layout| layout.total_entries()),
                    )
                })
            });
        }
    }
    group.finish();
}

/// The whole pipeline, then record emission.
fn bench_pipeline(c: &mut Criterion) {
    let mut group = c.benchmark_group("pipeline");
    group.sample_size(20);
    for (classes, universe) in UNIVERSES.iter() {
        group.bench_with_input(BenchmarkId::new("unverified", classes), universe, |b, universe| {
            b.iter(|| black_box(build_layout(universe, &unverified()).is_ok()))
        });
        if *classes <= 2_000 {
            group.bench_with_input(BenchmarkId::new("verified", classes), universe, |b, universe| {
                b.iter(|| black_box(build_layout(universe, &LayoutOptions::default()).is_ok()))
            });
        }
        if let Ok(layout) = build_layout(universe, &unverified()) {
            group.bench_with_input(BenchmarkId::new("emit", classes), universe, |b, universe| {
                b.iter(|| black_box(hub_records(universe, &layout).len()))
            });
        }
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_subtype_graph,
    bench_type_check_ids,
    bench_dispatch,
    bench_pipeline
);
criterion_main!(benches);
