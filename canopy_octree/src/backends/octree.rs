// Copyright 2026 the Canopy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Dynamic point octree backend.
//!
//! Nodes live in a flat arena. A node is either a leaf holding up to
//! [`OctreeConfig::capacity`] slots, or an internal node whose eight children
//! are stored contiguously starting at `first_child`, in octant index order
//! (bit0 = X, bit1 = Y, bit2 = Z). Each slot remembers the leaf holding it, so
//! removal does not traverse the tree.
//!
//! Nodes only ever subdivide; they are not merged back after removals. Call
//! [`IndexGeneric::rebalance`][crate::IndexGeneric::rebalance] to compact a
//! tree after heavy churn.

use alloc::vec;
use alloc::vec::Vec;
use core::cmp::Ordering;
use core::fmt::Debug;

use smallvec::{SmallVec, smallvec};

use crate::backend::Backend;
use crate::config::OctreeConfig;
use crate::error::Error;
use crate::nearest::KNearest;
use crate::types::{Aabb3D, Point3, Scalar};

/// Index of the root node in the arena.
const ROOT: usize = 0;

/// Half extent of the world volume used by [`Octree::default`].
pub const DEFAULT_WORLD_HALF_EXTENT: f64 = 10_000.0;

/// Octree backend over a fixed world volume.
///
/// Points outside the world volume are kept in a separate bucket that every
/// query scans, so they are never lost, only slower to find.
pub struct Octree<T: Scalar> {
    bounds: Aabb3D<T>,
    config: OctreeConfig,
    nodes: Vec<Node<T>>,
    slots: Vec<Option<SlotEntry<T>>>,
    outside: Vec<usize>,
}

#[derive(Clone, Debug)]
struct Node<T> {
    bounds: Aabb3D<T>,
    depth: u32,
    kind: NodeKind,
}

#[derive(Clone, Debug)]
enum NodeKind {
    Leaf(SmallVec<[usize; 8]>),
    Internal { first_child: usize },
}

impl<T> Node<T> {
    fn leaf(bounds: Aabb3D<T>, depth: u32) -> Self {
        Self {
            bounds,
            depth,
            kind: NodeKind::Leaf(SmallVec::new()),
        }
    }
}

#[derive(Copy, Clone, Debug)]
struct SlotEntry<T> {
    point: Point3<T>,
    home: Home,
}

/// Where a slot is currently stored.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum Home {
    Leaf(usize),
    Outside,
}

impl<T: Scalar> Debug for Octree<T> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let live_slots = self.slots.iter().filter(|s| s.is_some()).count();
        f.debug_struct("Octree")
            .field("bounds", &self.bounds)
            .field("config", &self.config)
            .field("nodes", &self.nodes.len())
            .field("live_slots", &live_slots)
            .field("outside", &self.outside.len())
            .finish_non_exhaustive()
    }
}

impl Default for Octree<f64> {
    /// An octree over a cube of half extent [`DEFAULT_WORLD_HALF_EXTENT`] centered on the origin.
    fn default() -> Self {
        let h = DEFAULT_WORLD_HALF_EXTENT;
        Self::build(Aabb3D::new(-h, -h, -h, h, h, h), OctreeConfig::default())
    }
}

impl<T: Scalar> Octree<T> {
    /// Create an empty octree over `bounds` with the default configuration.
    pub fn new(bounds: Aabb3D<T>) -> Result<Self, Error> {
        Self::with_config(bounds, OctreeConfig::default())
    }

    /// Create an empty octree over `bounds`.
    ///
    /// Fails if `min > max` on any axis of `bounds`, or if the leaf capacity is zero.
    pub fn with_config(bounds: Aabb3D<T>, config: OctreeConfig) -> Result<Self, Error> {
        if let Some(axis) = bounds.invalid_axis() {
            return Err(Error::InvalidBounds { axis });
        }
        if config.capacity == 0 {
            return Err(Error::ZeroCapacity);
        }
        log::debug!(
            "octree over {bounds:?} (capacity {}, max depth {})",
            config.capacity,
            config.max_depth
        );
        Ok(Self::build(bounds, config))
    }

    fn build(bounds: Aabb3D<T>, config: OctreeConfig) -> Self {
        Self {
            bounds,
            config,
            nodes: vec![Node::leaf(bounds, 0)],
            slots: Vec::new(),
            outside: Vec::new(),
        }
    }

    /// The world volume covered by the tree.
    pub fn bounds(&self) -> Aabb3D<T> {
        self.bounds
    }

    /// The configuration the tree was built with.
    pub fn config(&self) -> OctreeConfig {
        self.config
    }

    fn ensure_slot(&mut self, slot: usize) {
        if self.slots.len() <= slot {
            self.slots.resize_with(slot + 1, || None);
        }
    }

    fn slot_entry(&self, slot: usize) -> &SlotEntry<T> {
        self.slots
            .get(slot)
            .expect("octree invariant violated: node references out-of-bounds slot")
            .as_ref()
            .expect("octree invariant violated: node references vacant slot")
    }

    #[inline]
    fn point_of(&self, slot: usize) -> Point3<T> {
        self.slot_entry(slot).point
    }

    fn set_home(&mut self, slot: usize, home: Home) {
        if let Some(entry) = self.slots[slot].as_mut() {
            entry.home = home;
        }
    }

    /// Descend from `node` and append `slot` to the leaf owning `point`,
    /// subdividing full leaves on the way.
    fn place(&mut self, mut node: usize, slot: usize, point: Point3<T>) {
        let capacity = self.config.capacity;
        let max_depth = self.config.max_depth;
        loop {
            let n = &mut self.nodes[node];
            match &mut n.kind {
                NodeKind::Internal { first_child } => {
                    node = *first_child + n.bounds.octant_of(point);
                }
                NodeKind::Leaf(entities) => {
                    if entities.len() < capacity || n.depth >= max_depth {
                        entities.push(slot);
                        self.set_home(slot, Home::Leaf(node));
                        return;
                    }
                    let occupants = core::mem::take(entities);
                    self.subdivide(node);
                    for occupant in occupants {
                        let p = self.point_of(occupant);
                        self.place(node, occupant, p);
                    }
                    // `node` is internal now; the next iteration descends into a child.
                }
            }
        }
    }

    fn subdivide(&mut self, node: usize) {
        let parent = &self.nodes[node];
        let depth = parent.depth + 1;
        let octants = parent.bounds.split_octants();
        let first_child = self.nodes.len();
        self.nodes
            .extend(octants.into_iter().map(|bounds| Node::leaf(bounds, depth)));
        self.nodes[node].kind = NodeKind::Internal { first_child };
        log::trace!("subdivided octree node {node} at depth {}", depth - 1);
    }

    fn detach(&mut self, slot: usize, home: Home) {
        match home {
            Home::Outside => {
                let pos = self
                    .outside
                    .iter()
                    .position(|&s| s == slot)
                    .expect("octree invariant violated: slot not found in outside bucket");
                self.outside.swap_remove(pos);
            }
            Home::Leaf(node) => {
                let NodeKind::Leaf(entities) = &mut self.nodes[node].kind else {
                    panic!("octree invariant violated: slot recorded in an internal node");
                };
                let pos = entities
                    .iter()
                    .position(|&s| s == slot)
                    .expect("octree invariant violated: slot not found in its leaf");
                entities.swap_remove(pos);
            }
        }
    }

    fn nearest_in<R: Fn(usize) -> u64>(
        &self,
        node: usize,
        point: Point3<T>,
        best: &mut KNearest<T::Acc, R>,
    ) {
        match &self.nodes[node].kind {
            NodeKind::Leaf(entities) => {
                for &slot in entities {
                    best.offer(slot, self.point_of(slot).distance_squared(&point));
                }
            }
            NodeKind::Internal { first_child } => {
                // Nearest children first: the child containing `point` is at distance zero.
                let mut order: [(usize, T::Acc); 8] = core::array::from_fn(|octant| {
                    let child = first_child + octant;
                    (child, self.nodes[child].bounds.distance_squared_to(point))
                });
                order.sort_unstable_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(Ordering::Equal));
                for (child, lower_bound) in order {
                    if best.prunes(lower_bound) {
                        break;
                    }
                    self.nearest_in(child, point, best);
                }
            }
        }
    }

    /// Walk the tree from the root, returning `(node count, max depth)`.
    fn walk(&self) -> (usize, u32) {
        let mut count = 0;
        let mut deepest = 0;
        let mut stack: SmallVec<[usize; 64]> = smallvec![ROOT];
        while let Some(node) = stack.pop() {
            let n = &self.nodes[node];
            count += 1;
            deepest = deepest.max(n.depth);
            if let NodeKind::Internal { first_child } = n.kind {
                stack.extend(first_child..first_child + 8);
            }
        }
        debug_assert_eq!(count, self.nodes.len(), "octree arena holds unreachable nodes");
        (count, deepest)
    }
}

impl<T: Scalar> Backend<T> for Octree<T> {
    fn insert(&mut self, slot: usize, point: Point3<T>) {
        self.ensure_slot(slot);

        // A reused slot must leave its old leaf first.
        if let Some(old) = self.slots[slot].take() {
            self.detach(slot, old.home);
        }

        if !self.bounds.contains_point(point) {
            log::trace!("slot {slot} at {point:?} is outside the octree bounds");
            self.outside.push(slot);
            self.slots[slot] = Some(SlotEntry {
                point,
                home: Home::Outside,
            });
            return;
        }

        self.slots[slot] = Some(SlotEntry {
            point,
            home: Home::Leaf(ROOT),
        });
        self.place(ROOT, slot, point);
    }

    fn remove(&mut self, slot: usize) {
        let Some(entry) = self.slots.get_mut(slot).and_then(Option::take) else {
            return;
        };
        self.detach(slot, entry.home);
    }

    fn clear(&mut self) {
        self.nodes.clear();
        self.nodes.push(Node::leaf(self.bounds, 0));
        self.slots.clear();
        self.outside.clear();
    }

    fn visit_sphere<F: FnMut(usize)>(&self, center: Point3<T>, radius: T, mut f: F) {
        let radius_squared = T::widen(radius) * T::widen(radius);
        for &slot in &self.outside {
            if self.point_of(slot).distance_squared(&center) <= radius_squared {
                f(slot);
            }
        }

        let mut stack: SmallVec<[usize; 64]> = smallvec![ROOT];
        while let Some(node) = stack.pop() {
            let n = &self.nodes[node];
            if !n.bounds.intersects_sphere(center, radius_squared) {
                continue;
            }
            match &n.kind {
                NodeKind::Leaf(entities) => {
                    for &slot in entities {
                        if self.point_of(slot).distance_squared(&center) <= radius_squared {
                            f(slot);
                        }
                    }
                }
                NodeKind::Internal { first_child } => {
                    stack.extend((*first_child..first_child + 8).rev());
                }
            }
        }
    }

    fn visit_box<F: FnMut(usize)>(&self, aabb: Aabb3D<T>, mut f: F) {
        for &slot in &self.outside {
            if aabb.contains_point(self.point_of(slot)) {
                f(slot);
            }
        }

        let mut stack: SmallVec<[usize; 64]> = smallvec![ROOT];
        while let Some(node) = stack.pop() {
            let n = &self.nodes[node];
            if !n.bounds.overlaps(&aabb) {
                continue;
            }
            match &n.kind {
                NodeKind::Leaf(entities) => {
                    for &slot in entities {
                        if aabb.contains_point(self.point_of(slot)) {
                            f(slot);
                        }
                    }
                }
                NodeKind::Internal { first_child } => {
                    stack.extend((*first_child..first_child + 8).rev());
                }
            }
        }
    }

    fn visit_nearest<R: Fn(usize) -> u64>(&self, point: Point3<T>, best: &mut KNearest<T::Acc, R>) {
        for &slot in &self.outside {
            best.offer(slot, self.point_of(slot).distance_squared(&point));
        }
        if best.prunes(self.bounds.distance_squared_to(point)) {
            return;
        }
        self.nearest_in(ROOT, point, best);
    }

    fn node_count(&self) -> usize {
        self.walk().0
    }

    fn max_depth(&self) -> u32 {
        self.walk().1
    }

    fn outside_count(&self) -> usize {
        self.outside.len()
    }
}

/// Octree backend over `f32` coordinates.
pub type OctreeF32 = Octree<f32>;
/// Octree backend over `f64` coordinates.
pub type OctreeF64 = Octree<f64>;
/// Octree backend over `i64` coordinates.
pub type OctreeI64 = Octree<i64>;
