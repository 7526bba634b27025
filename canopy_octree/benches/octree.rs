// Copyright 2026 the Canopy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Benchmarks for the octree index and its alternative backends.

use std::hint::black_box;

use canopy_octree::backends::FlatVec;
use canopy_octree::{Aabb3D, Backend, IndexGeneric, Point3, SpatialIndex};
use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const HALF: f64 = 1_000.0;

fn points(n: usize, seed: u64) -> Vec<Point3<f64>> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..n)
        .map(|_| {
            Point3::new(
                rng.random_range(-HALF..HALF),
                rng.random_range(-HALF..HALF),
                rng.random_range(-HALF..HALF),
            )
        })
        .collect()
}

fn world() -> SpatialIndex<u32> {
    SpatialIndex::new(Aabb3D::new(-HALF, -HALF, -HALF, HALF, HALF, HALF)).unwrap()
}

fn filled<B: Backend<f64>>(mut idx: IndexGeneric<u32, f64, B>, pts: &[Point3<f64>]) -> IndexGeneric<u32, f64, B> {
    for (id, p) in (0..).zip(pts) {
        idx.insert(id, *p);
    }
    idx
}

fn bench_insert(c: &mut Criterion) {
    let mut group = c.benchmark_group("insert");
    for n in [1_000_usize, 10_000] {
        let pts = points(n, 1);
        group.bench_with_input(BenchmarkId::new("octree", n), &pts, |b, pts| {
            b.iter(|| black_box(filled(world(), pts)));
        });
    }
    group.finish();
}

fn bench_update(c: &mut Criterion) {
    let pts = points(10_000, 2);
    let moves = points(10_000, 3);
    c.bench_function("update_10000", |b| {
        b.iter_batched(
            || filled(world(), &pts),
            |mut idx| {
                for (id, p) in (0..).zip(&moves) {
                    idx.update(id, *p);
                }
                idx
            },
            criterion::BatchSize::LargeInput,
        );
    });
}

fn bench_queries(c: &mut Criterion) {
    let pts = points(10_000, 4);
    let octree = filled(world(), &pts);
    let flat = filled(IndexGeneric::with_backend(FlatVec::default()), &pts);
    let center = Point3::new(12.0, -40.0, 250.0);

    let mut group = c.benchmark_group("query_10000");
    group.bench_function("octree_radius", |b| {
        b.iter(|| black_box(octree.query_radius(center, 100.0).count()));
    });
    group.bench_function("flatvec_radius", |b| {
        b.iter(|| black_box(flat.query_radius(center, 100.0).count()));
    });
    let aabb = Aabb3D::new(-100.0, -100.0, -100.0, 100.0, 100.0, 100.0);
    group.bench_function("octree_aabb", |b| {
        b.iter(|| black_box(octree.query_aabb(aabb).count()));
    });
    group.bench_function("octree_nearest_10", |b| {
        b.iter(|| black_box(octree.query_nearest(center, 10).count()));
    });
    group.bench_function("flatvec_nearest_10", |b| {
        b.iter(|| black_box(flat.query_nearest(center, 10).count()));
    });
    group.finish();
}

fn bench_rebuild(c: &mut Criterion) {
    let batch: Vec<(u32, Point3<f64>)> = (0..).zip(points(10_000, 5)).collect();
    let mut idx = world();
    c.bench_function("rebuild_10000", |b| {
        b.iter(|| {
            idx.rebuild(batch.iter().copied());
            black_box(idx.len())
        });
    });
}

criterion_group!(benches, bench_insert, bench_update, bench_queries, bench_rebuild);
criterion_main!(benches);
