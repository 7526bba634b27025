// Copyright 2026 the Canopy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! End-to-end behavior of the default octree index with string entity ids.

use canopy_octree::{Aabb3D, Point3, SpatialIndex, Statistics};

fn world() -> SpatialIndex<String> {
    SpatialIndex::new(Aabb3D::new(-100.0, -100.0, -100.0, 100.0, 100.0, 100.0)).unwrap()
}

fn p(x: f64, y: f64, z: f64) -> Point3<f64> {
    Point3::new(x, y, z)
}

fn sorted<'a>(hits: impl Iterator<Item = (&'a String, Point3<f64>)>) -> Vec<String> {
    let mut out: Vec<_> = hits.map(|(id, _)| id.clone()).collect();
    out.sort();
    out
}

#[test]
fn single_entity_radius() {
    let mut idx = world();
    idx.insert("a".into(), p(0.0, 0.0, 0.0));
    assert_eq!(sorted(idx.query_radius(p(0.0, 0.0, 0.0), 10.0)), ["a"]);
}

#[test]
fn radius_filters_by_distance() {
    let mut idx = world();
    for (i, x) in [0.0, 5.0, 10.0, 20.0].into_iter().enumerate() {
        idx.insert(format!("e{}", i + 1), p(x, 0.0, 0.0));
    }
    assert_eq!(sorted(idx.query_radius(p(0.0, 0.0, 0.0), 6.0)), ["e1", "e2"]);
}

#[test]
fn update_leaves_the_old_position() {
    let mut idx = world();
    idx.insert("e1".into(), p(0.0, 0.0, 0.0));
    idx.update("e1".into(), p(50.0, 0.0, 0.0));
    assert!(sorted(idx.query_radius(p(0.0, 0.0, 0.0), 10.0)).is_empty());
    assert_eq!(sorted(idx.query_radius(p(50.0, 0.0, 0.0), 10.0)), ["e1"]);

    let old_box = Aabb3D::new(-1.0, -1.0, -1.0, 1.0, 1.0, 1.0);
    assert_eq!(idx.query_aabb(old_box).count(), 0);
}

#[test]
fn nearest_three_in_distance_order() {
    let mut idx = world();
    idx.insert("e1".into(), p(0.0, 0.0, 0.0));
    idx.insert("e2".into(), p(10.0, 0.0, 0.0));
    idx.insert("e3".into(), p(5.0, 0.0, 0.0));
    let order: Vec<_> = idx
        .query_nearest(p(4.0, 0.0, 0.0), 3)
        .map(|(id, _)| id.as_str())
        .collect();
    assert_eq!(order, ["e3", "e1", "e2"]);
}

#[test]
fn corner_of_the_world_is_inside() {
    let mut idx = world();
    idx.insert("corner".into(), p(100.0, 100.0, 100.0));
    assert_eq!(
        sorted(idx.query_radius(p(100.0, 100.0, 100.0), 1.0)),
        ["corner"]
    );
    assert_eq!(idx.statistics().outside_entities, 0);
}

#[test]
fn twenty_entities_build_a_tree() {
    let mut idx = world();
    for i in 0..20 {
        let t = f64::from(i);
        idx.insert(format!("entity-{i}"), p(t * 9.0 - 90.0, t * 3.0, -t * 4.0));
    }
    let stats = idx.statistics();
    assert_eq!(stats.total_entities, 20);
    assert!(stats.tree_depth > 0);
    assert!(stats.nodes_count > 0);
}

#[test]
fn rebuild_matches_clear_then_insert() {
    let batch: Vec<(String, Point3<f64>)> = (0..40)
        .map(|i| {
            let t = f64::from(i);
            // Every fifth id repeats an earlier one at a new position.
            let id = if i % 5 == 4 { i - 4 } else { i };
            (format!("e{id}"), p((t * 17.0) % 180.0 - 90.0, (t * 11.0) % 160.0 - 80.0, t))
        })
        .collect();

    let mut rebuilt = world();
    rebuilt.insert("stale".into(), p(1.0, 1.0, 1.0));
    rebuilt.rebuild(batch.clone());

    let mut manual = world();
    manual.clear();
    for (id, pos) in batch {
        manual.insert(id, pos);
    }

    assert_eq!(rebuilt.statistics(), manual.statistics());
    assert_eq!(rebuilt.len(), 32);
    for (id, pos) in manual.iter() {
        assert_eq!(rebuilt.position(id), Some(pos));
    }
    let center = p(0.0, 0.0, 20.0);
    assert_eq!(
        sorted(rebuilt.query_radius(center, 60.0)),
        sorted(manual.query_radius(center, 60.0))
    );
    let a: Vec<_> = rebuilt.query_nearest(center, 7).map(|(id, _)| id.clone()).collect();
    let b: Vec<_> = manual.query_nearest(center, 7).map(|(id, _)| id.clone()).collect();
    assert_eq!(a, b);
}

#[test]
fn removing_unknown_ids_changes_nothing() {
    let mut idx = world();
    idx.insert("a".into(), p(3.0, 3.0, 3.0));
    let before = idx.statistics();
    assert!(!idx.remove("nope"));
    assert!(!idx.remove("nope"));
    assert_eq!(idx.statistics(), before);
    assert_eq!(sorted(idx.query_radius(p(3.0, 3.0, 3.0), 0.0)), ["a"]);
}

#[test]
fn clear_resets_statistics() {
    let mut idx = world();
    for i in 0..50 {
        let t = f64::from(i);
        idx.insert(i.to_string(), p(t, -t, t * 0.5));
    }
    idx.insert("far away".into(), p(1e6, 0.0, 0.0));
    idx.clear();
    assert_eq!(
        idx.statistics(),
        Statistics {
            total_entities: 0,
            tree_depth: 0,
            nodes_count: 1,
            outside_entities: 0,
        }
    );
    assert!(idx.is_empty());
    assert_eq!(idx.nearest(p(0.0, 0.0, 0.0)), None);
}
