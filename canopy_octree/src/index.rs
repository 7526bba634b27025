// Copyright 2026 the Canopy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Public index API and generic implementation over a pluggable backend.

use alloc::vec::Vec;
use core::borrow::Borrow;
use core::cmp::Ordering;
use core::hash::Hash;

use hashbrown::HashMap;

use crate::backend::Backend;
use crate::backends::{FlatVec, Octree};
use crate::config::OctreeConfig;
use crate::error::Error;
use crate::nearest::KNearest;
use crate::types::{Aabb3D, Point3, Scalar};

#[derive(Clone, Debug)]
struct Entry<I, T> {
    id: I,
    position: Point3<T>,
    /// Insertion order, used to break distance ties.
    stamp: u64,
}

/// Shape of an index, as reported by [`IndexGeneric::statistics`].
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Statistics {
    /// Number of live entities.
    pub total_entities: usize,
    /// Deepest node level reached (the root is level 0).
    pub tree_depth: u32,
    /// Number of nodes, internal and leaf.
    pub nodes_count: usize,
    /// Entities stored outside the backend's bounded volume.
    pub outside_entities: usize,
}

/// A 3D point index keyed by entity id, parameterized by a spatial backend.
///
/// Ids are any `Eq + Hash + Clone` key: `String`, `&'static str`, integers, or
/// a host's own entity handle.
#[derive(Debug)]
pub struct IndexGeneric<I, T: Scalar, B: Backend<T>> {
    entries: Vec<Option<Entry<I, T>>>,
    free_list: Vec<usize>,
    ids: HashMap<I, usize>,
    next_stamp: u64,
    backend: B,
}

/// Index over the default octree backend.
pub type SpatialIndex<I, T = f64> = IndexGeneric<I, T, Octree<T>>;

impl<I, T, B> Default for IndexGeneric<I, T, B>
where
    I: Eq + Hash + Clone,
    T: Scalar,
    B: Backend<T> + Default,
{
    fn default() -> Self {
        Self::with_backend(B::default())
    }
}

impl<I, T> SpatialIndex<I, T>
where
    I: Eq + Hash + Clone,
    T: Scalar,
{
    /// Create an empty octree index over `bounds` with the default [`OctreeConfig`].
    ///
    /// Fails with [`Error::InvalidBounds`] if `min > max` on any axis.
    pub fn new(bounds: Aabb3D<T>) -> Result<Self, Error> {
        Octree::new(bounds).map(Self::with_backend)
    }

    /// Create an empty octree index over `bounds` with an explicit configuration.
    pub fn with_config(bounds: Aabb3D<T>, config: OctreeConfig) -> Result<Self, Error> {
        Octree::with_config(bounds, config).map(Self::with_backend)
    }

    /// The world volume covered by the octree.
    pub fn bounds(&self) -> Aabb3D<T> {
        self.backend.bounds()
    }

    /// The octree configuration.
    pub fn config(&self) -> OctreeConfig {
        self.backend.config()
    }

    /// Create a linear-scan index, for tiny sets.
    pub fn with_flat_vec() -> IndexGeneric<I, T, FlatVec<T>> {
        IndexGeneric::with_backend(FlatVec::default())
    }
}

#[cfg(feature = "backend_grid")]
impl<I, T> SpatialIndex<I, T>
where
    I: Eq + Hash + Clone,
    T: crate::backends::GridScalar,
{
    /// Create a uniform-grid index with the given cell size.
    pub fn with_grid(cell_size: T) -> IndexGeneric<I, T, crate::backends::Grid<T>> {
        IndexGeneric::with_backend(crate::backends::Grid::new(cell_size))
    }
}

impl<I, T, B> IndexGeneric<I, T, B>
where
    I: Eq + Hash + Clone,
    T: Scalar,
    B: Backend<T>,
{
    /// Create an empty index using an explicit backend instance.
    ///
    /// The backend must be empty.
    pub fn with_backend(backend: B) -> Self {
        Self {
            entries: Vec::new(),
            free_list: Vec::new(),
            ids: HashMap::new(),
            next_stamp: 0,
            backend,
        }
    }

    /// The spatial backend.
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Reserve space for at least `n` more entities.
    pub fn reserve(&mut self, n: usize) {
        self.entries.reserve(n);
        self.ids.reserve(n);
    }

    /// Number of live entities.
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// Whether the index holds no entities.
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Whether `id` is indexed.
    pub fn contains<Q>(&self, id: &Q) -> bool
    where
        I: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.ids.contains_key(id)
    }

    /// Current position of `id`, if indexed.
    pub fn position<Q>(&self, id: &Q) -> Option<Point3<T>>
    where
        I: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let slot = *self.ids.get(id)?;
        Some(self.entry(slot).position)
    }

    /// Iterate over all entities in unspecified order.
    pub fn iter(&self) -> impl Iterator<Item = (&I, Point3<T>)> + '_ {
        self.entries
            .iter()
            .flatten()
            .map(|e| (&e.id, e.position))
    }

    /// Insert an entity at `position`.
    ///
    /// Inserting an id that is already indexed is the same as
    /// [`update`][Self::update]: the old record is replaced.
    pub fn insert(&mut self, id: I, position: Point3<T>) {
        if self.ids.contains_key(&id) {
            self.update(id, position);
        } else {
            self.insert_vacant(id, position);
        }
    }

    /// Remove an entity. Returns whether it was indexed; unknown ids are a no-op.
    pub fn remove<Q>(&mut self, id: &Q) -> bool
    where
        I: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let Some(slot) = self.ids.remove(id) else {
            return false;
        };
        self.backend.remove(slot);
        self.entries[slot] = None;
        self.free_list.push(slot);
        true
    }

    /// Move an entity: [`remove`][Self::remove] followed by [`insert`][Self::insert].
    ///
    /// Queries around the old position no longer report `id`, and the entity
    /// counts as newly inserted for nearest-neighbor tie-breaks. An unknown id
    /// is simply inserted.
    pub fn update(&mut self, id: I, position: Point3<T>) {
        self.remove(&id);
        self.insert_vacant(id, position);
    }

    fn insert_vacant(&mut self, id: I, position: Point3<T>) {
        let stamp = self.next_stamp;
        self.next_stamp += 1;
        let entry = Entry {
            id: id.clone(),
            position,
            stamp,
        };
        let slot = if let Some(slot) = self.free_list.pop() {
            self.entries[slot] = Some(entry);
            slot
        } else {
            self.entries.push(Some(entry));
            self.entries.len() - 1
        };
        self.backend.insert(slot, position);
        self.ids.insert(id, slot);
    }

    /// Remove every entity and reset the backend to its initial shape.
    pub fn clear(&mut self) {
        log::debug!("clearing index of {} entities", self.ids.len());
        self.entries.clear();
        self.free_list.clear();
        self.ids.clear();
        self.next_stamp = 0;
        self.backend.clear();
    }

    /// Replace the contents of the index with `entities`.
    ///
    /// Equivalent to [`clear`][Self::clear] followed by inserting every pair in
    /// order, so a later duplicate id wins.
    pub fn rebuild<E>(&mut self, entities: E)
    where
        E: IntoIterator<Item = (I, Point3<T>)>,
    {
        self.clear();
        let entities = entities.into_iter();
        self.reserve(entities.size_hint().0);
        for (id, position) in entities {
            self.insert(id, position);
        }
        log::debug!("rebuilt index with {} entities", self.ids.len());
    }

    /// Rebuild the backend from the live entities, in insertion order.
    ///
    /// Ids, positions, and tie-break order are unchanged; the backend comes out
    /// the same as if only the live entities had ever been inserted. Useful
    /// after heavy churn, since octree nodes never merge on their own.
    pub fn rebalance(&mut self) {
        let mut live: Vec<(u64, usize, Point3<T>)> = self
            .entries
            .iter()
            .enumerate()
            .filter_map(|(slot, e)| e.as_ref().map(|e| (e.stamp, slot, e.position)))
            .collect();
        live.sort_unstable_by_key(|&(stamp, ..)| stamp);

        let before = self.backend.node_count();
        self.backend.clear();
        for (_, slot, position) in live {
            self.backend.insert(slot, position);
        }
        log::debug!(
            "rebalanced {} entities: {before} nodes -> {}",
            self.ids.len(),
            self.backend.node_count()
        );
    }

    /// Entity count and backend shape, computed by a full traversal.
    pub fn statistics(&self) -> Statistics {
        Statistics {
            total_entities: self.ids.len(),
            tree_depth: self.backend.max_depth(),
            nodes_count: self.backend.node_count(),
            outside_entities: self.backend.outside_count(),
        }
    }

    /// Query entities within `radius` of `center`, boundary included.
    ///
    /// A negative (or NaN) radius matches nothing.
    pub fn query_radius(
        &self,
        center: Point3<T>,
        radius: T,
    ) -> impl Iterator<Item = (&I, Point3<T>)> + '_ {
        let mut out = Vec::new();
        self.visit_radius(center, radius, |id, p| out.push((id, p)));
        out.into_iter()
    }

    /// Visit entities within `radius` of `center` (does not allocate result storage).
    ///
    /// Calls `f(id, position)` for each match. The order is backend-dependent.
    pub fn visit_radius<'a, F>(&'a self, center: Point3<T>, radius: T, mut f: F)
    where
        F: FnMut(&'a I, Point3<T>),
    {
        if !matches!(
            radius.partial_cmp(&T::zero()),
            Some(Ordering::Greater | Ordering::Equal)
        ) {
            return;
        }
        self.backend.visit_sphere(center, radius, |slot| {
            let e = self.entry(slot);
            f(&e.id, e.position);
        });
    }

    /// Query entities inside `aabb`, all six faces included.
    ///
    /// An inverted box (`min > max` on some axis) matches nothing.
    pub fn query_aabb(&self, aabb: Aabb3D<T>) -> impl Iterator<Item = (&I, Point3<T>)> + '_ {
        let mut out = Vec::new();
        self.visit_aabb(aabb, |id, p| out.push((id, p)));
        out.into_iter()
    }

    /// Visit entities inside `aabb` (does not allocate result storage).
    ///
    /// Calls `f(id, position)` for each match. The order is backend-dependent.
    pub fn visit_aabb<'a, F>(&'a self, aabb: Aabb3D<T>, mut f: F)
    where
        F: FnMut(&'a I, Point3<T>),
    {
        if aabb.is_empty() {
            return;
        }
        self.backend.visit_box(aabb, |slot| {
            let e = self.entry(slot);
            f(&e.id, e.position);
        });
    }

    /// The `k` entities nearest to `point`, nearest first.
    ///
    /// Returns every entity when fewer than `k` exist, and nothing for `k == 0`.
    /// Entities at equal distance come out in insertion order.
    pub fn query_nearest(
        &self,
        point: Point3<T>,
        k: usize,
    ) -> impl Iterator<Item = (&I, Point3<T>)> + '_ {
        let mut out = Vec::new();
        if k > 0 && !self.is_empty() {
            let mut best = KNearest::new(k, |slot| self.entry(slot).stamp);
            self.backend.visit_nearest(point, &mut best);
            out.extend(best.into_sorted().map(|c| {
                let e = self.entry(c.slot);
                (&e.id, e.position)
            }));
        }
        out.into_iter()
    }

    /// The single entity nearest to `point`.
    pub fn nearest(&self, point: Point3<T>) -> Option<(&I, Point3<T>)> {
        self.query_nearest(point, 1).next()
    }

    fn entry(&self, slot: usize) -> &Entry<I, T> {
        self.entries
            .get(slot)
            .and_then(Option::as_ref)
            .expect("index invariant violated: backend reported a vacant slot")
    }
}
