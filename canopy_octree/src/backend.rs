// Copyright 2026 the Canopy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Backend trait for spatial indexing implementations.

use crate::nearest::KNearest;
use crate::types::{Aabb3D, Point3, Scalar};

/// Spatial backend abstraction used by [`IndexGeneric`][crate::IndexGeneric].
///
/// A backend stores one point per slot. The index owns the slots (ids,
/// positions, insertion stamps) and only hands backends valid query inputs:
/// the radius is non-negative and the query box is not inverted. Inserting a
/// slot that is already present moves it.
pub trait Backend<T: Scalar> {
    /// Insert a slot at the given point.
    fn insert(&mut self, slot: usize, point: Point3<T>);

    /// Remove a slot from the spatial structure. Unknown slots are ignored.
    fn remove(&mut self, slot: usize);

    /// Clear all spatial structures.
    fn clear(&mut self);

    /// Visit slots whose point lies within the sphere (boundary included).
    fn visit_sphere<F: FnMut(usize)>(&self, center: Point3<T>, radius: T, f: F);

    /// Visit slots whose point lies within the box (all six faces included).
    fn visit_box<F: FnMut(usize)>(&self, aabb: Aabb3D<T>, f: F);

    /// Offer slots to `best` so that afterwards it holds the `k` nearest.
    ///
    /// Backends may skip any slot they can prove would be rejected.
    fn visit_nearest<R: Fn(usize) -> u64>(&self, point: Point3<T>, best: &mut KNearest<T::Acc, R>);

    /// Total number of nodes (or cells) in the structure.
    fn node_count(&self) -> usize {
        1
    }

    /// Deepest level reached by any node; zero for flat structures.
    fn max_depth(&self) -> u32 {
        0
    }

    /// Number of slots stored outside the structure's bounded volume.
    fn outside_count(&self) -> usize {
        0
    }
}

/// Collecting forms of the visitor queries, for backend unit tests.
#[cfg(test)]
pub(crate) trait CollectQueries<T: Scalar>: Backend<T> {
    fn query_sphere(&self, center: Point3<T>, radius: T) -> alloc::vec::IntoIter<usize> {
        let mut out = alloc::vec::Vec::new();
        self.visit_sphere(center, radius, |i| out.push(i));
        out.into_iter()
    }

    fn query_box(&self, aabb: Aabb3D<T>) -> alloc::vec::IntoIter<usize> {
        let mut out = alloc::vec::Vec::new();
        self.visit_box(aabb, |i| out.push(i));
        out.into_iter()
    }
}

#[cfg(test)]
impl<T: Scalar, B: Backend<T>> CollectQueries<T> for B {}
