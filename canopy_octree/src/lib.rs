// Copyright 2026 the Canopy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

// After you edit the crate's doc comment, run this command, then check README.md for any missing links
// cargo rdme --workspace-project=canopy_octree --heading-base-level=0

//! Canopy Octree: a dynamic 3D point index keyed by entity id.
//!
//! Canopy Octree answers "what is near here?" for a moving population of
//! entities, such as agents, particles, or pickups in a simulation.
//!
//! - Insert, update, and remove points by id; ids can be any `Eq + Hash + Clone` key.
//! - Query by radius (sphere) or by axis-aligned box, both inclusive of the boundary.
//! - Find the `k` nearest entities, nearest first, with ties broken by insertion order.
//! - Rebuild from a batch, clear, compact after churn, and inspect tree statistics.
//!
//! It is generic over the scalar type `T` (`f32`, `f64`, or `i64`) and does not
//! depend on any geometry crate. Distances are compared squared in a widened
//! accumulator (`f32`→`f64`, `f64`→`f64`, `i64`→`i128`), so no square roots are
//! taken. Integer distances too large for `i128` saturate, so even opposite
//! corners of the full `i64` range compare correctly.
//!
//! ## Features
//!
//! - `backend_grid` *(default)*: enables an unbounded uniform grid backend backed by `hashbrown`.
//! - `serde`: `Serialize`/`Deserialize` for the geometry types, [`OctreeConfig`], and [`Statistics`].
//!
//! # Example
//!
//! ```rust
//! use canopy_octree::{Aabb3D, Point3, SpatialIndex};
//!
//! let world = Aabb3D::new(-100.0, -100.0, -100.0, 100.0, 100.0, 100.0);
//! let mut idx: SpatialIndex<&str> = SpatialIndex::new(world).unwrap();
//! idx.insert("e1", Point3::new(0.0, 0.0, 0.0));
//! idx.insert("e2", Point3::new(10.0, 0.0, 0.0));
//! idx.insert("e3", Point3::new(5.0, 0.0, 0.0));
//!
//! // Radius queries include entities exactly on the sphere.
//! let mut hits: Vec<_> = idx
//!     .query_radius(Point3::new(0.0, 0.0, 0.0), 5.0)
//!     .map(|(id, _)| *id)
//!     .collect();
//! hits.sort();
//! assert_eq!(hits, ["e1", "e3"]);
//!
//! // Nearest queries come back nearest first.
//! let order: Vec<_> = idx
//!     .query_nearest(Point3::new(4.0, 0.0, 0.0), 3)
//!     .map(|(id, _)| *id)
//!     .collect();
//! assert_eq!(order, ["e3", "e1", "e2"]);
//!
//! // Moving an entity is a single call.
//! idx.update("e2", Point3::new(-50.0, 0.0, 0.0));
//! assert_eq!(idx.query_radius(Point3::new(10.0, 0.0, 0.0), 1.0).count(), 0);
//! ```
//!
//! The octree is tuned through [`OctreeConfig`]:
//!
//! ```rust
//! use canopy_octree::{Aabb3D, OctreeConfig, Point3, SpatialIndex};
//!
//! let world = Aabb3D::new(0, 0, 0, 1 << 20, 1 << 20, 1 << 20);
//! let config = OctreeConfig::default().with_capacity(4).with_max_depth(12);
//! let mut idx: SpatialIndex<u64, i64> = SpatialIndex::with_config(world, config).unwrap();
//! for id in 0..100 {
//!     idx.insert(id, Point3::new(id as i64 * 1000, 0, 0));
//! }
//! let stats = idx.statistics();
//! assert_eq!(stats.total_entities, 100);
//! assert!(stats.tree_depth > 0);
//! ```
//!
//! With the `backend_grid` feature enabled (default), you can also use a uniform grid backend,
//! which needs no world bounds:
//!
//! ```rust
//! # #[cfg(feature = "backend_grid")]
//! # {
//! use canopy_octree::{Point3, SpatialIndex};
//!
//! // Use a grid backend (f32) with an 8-unit cell size.
//! let mut idx = SpatialIndex::<u32, f32>::with_grid(8.0);
//! idx.insert(1, Point3::new(1.0e6, 0.0, 0.0));
//! assert_eq!(idx.nearest(Point3::new(0.0, 0.0, 0.0)).map(|(id, _)| *id), Some(1));
//! # }
//! ```
//!
//! ## Choosing a backend
//!
//! - `Octree` (default): adaptive subdivision over a fixed world volume. Handles clustered
//!   and sparse populations alike; points outside the volume are still indexed, but scanned
//!   linearly.
//! - `FlatVec`: simplest and smallest, linear scans. Good for a few dozen entities.
//! - `GridF32`/`GridF64`/`GridI64` *(feature `backend_grid`)*: uniform hashed grid. A good fit
//!   when entities are spread evenly and queries are about the size of a cell.
//!
//! See the [`backends`] docs for the octree layout.
//!
//! ### Float semantics
//!
//! Coordinates should be finite. A NaN coordinate is accepted but never matches a query;
//! a negative or NaN radius and an inverted box match nothing.

#![no_std]

extern crate alloc;

mod backend;
pub mod backends;
mod config;
mod error;
mod index;
mod nearest;
mod types;

pub use backend::Backend;
pub use config::OctreeConfig;
pub use error::Error;
pub use index::{IndexGeneric, SpatialIndex, Statistics};
pub use nearest::{Candidate, KNearest};
pub use types::{Aabb3D, Axis, Point3, Scalar, ScalarAcc};

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec::Vec;

    fn sorted(mut v: Vec<u32>) -> Vec<u32> {
        v.sort_unstable();
        v
    }

    #[test]
    fn default_index_covers_a_large_world() {
        let mut idx: SpatialIndex<u32> = SpatialIndex::default();
        assert_eq!(
            idx.bounds(),
            Aabb3D::new(-10_000.0, -10_000.0, -10_000.0, 10_000.0, 10_000.0, 10_000.0)
        );
        assert_eq!(idx.config(), OctreeConfig::default());
        idx.insert(1, Point3::new(9_999.0, -9_999.0, 0.0));
        assert_eq!(idx.statistics().outside_entities, 0);
    }

    #[test]
    fn box_query_includes_every_face() {
        let mut idx: SpatialIndex<u32> = SpatialIndex::default();
        idx.insert(1, Point3::new(0.0, 0.0, 0.0));
        idx.insert(2, Point3::new(10.0, 10.0, 10.0));
        idx.insert(3, Point3::new(10.0, 5.0, 0.0));
        idx.insert(4, Point3::new(10.1, 5.0, 5.0));
        let hits: Vec<_> = idx
            .query_aabb(Aabb3D::new(0.0, 0.0, 0.0, 10.0, 10.0, 10.0))
            .map(|(id, _)| *id)
            .collect();
        assert_eq!(sorted(hits), [1, 2, 3]);
    }

    #[test]
    fn many_updates_keep_one_record_per_id() {
        let mut idx: SpatialIndex<u32, f32> =
            SpatialIndex::new(Aabb3D::new(-64.0, -64.0, -64.0, 64.0, 64.0, 64.0)).unwrap();
        for id in 0..32_u32 {
            idx.insert(id, Point3::new(0.0, 0.0, 0.0));
        }
        for step in 1..8_u16 {
            for id in 0..32_u32 {
                let t = f32::from(step) * 4.0;
                idx.update(id, Point3::new(t, -t, f32::from(u16::try_from(id).unwrap())));
            }
        }
        assert_eq!(idx.len(), 32);
        assert_eq!(idx.statistics().total_entities, 32);
        assert_eq!(idx.query_aabb(idx.bounds()).count(), 32);
        let near_origin = idx.query_radius(Point3::new(0.0, 0.0, 0.0), 8.0).count();
        assert_eq!(near_origin, 0);
    }
}
