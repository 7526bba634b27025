// Copyright 2026 the Canopy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Flat vector backend: no structure, every query is a linear scan.

use alloc::vec::Vec;
use core::fmt::Debug;

use crate::backend::Backend;
use crate::nearest::KNearest;
use crate::types::{Aabb3D, Point3, Scalar};

/// Linear-scan backend.
///
/// Inserts and removals are O(1). Queries touch every live slot, which is the
/// right trade for a few dozen entities, and a handy reference when checking a
/// smarter backend.
pub struct FlatVec<T> {
    slots: Vec<Option<Point3<T>>>,
}

impl<T> Default for FlatVec<T> {
    fn default() -> Self {
        Self { slots: Vec::new() }
    }
}

impl<T: Debug> Debug for FlatVec<T> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let live_slots = self.slots.iter().filter(|s| s.is_some()).count();
        f.debug_struct("FlatVec")
            .field("total_slots", &self.slots.len())
            .field("live_slots", &live_slots)
            .finish_non_exhaustive()
    }
}

impl<T: Copy> FlatVec<T> {
    fn live(&self) -> impl Iterator<Item = (usize, Point3<T>)> + '_ {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(slot, p)| p.map(|p| (slot, p)))
    }
}

impl<T: Scalar> Backend<T> for FlatVec<T> {
    fn insert(&mut self, slot: usize, point: Point3<T>) {
        if self.slots.len() <= slot {
            self.slots.resize_with(slot + 1, || None);
        }
        self.slots[slot] = Some(point);
    }

    fn remove(&mut self, slot: usize) {
        if let Some(s) = self.slots.get_mut(slot) {
            *s = None;
        }
        // Trailing vacancies are dropped so a drained backend shrinks back.
        while matches!(self.slots.last(), Some(None)) {
            self.slots.pop();
        }
    }

    fn clear(&mut self) {
        self.slots.clear();
    }

    fn visit_sphere<F: FnMut(usize)>(&self, center: Point3<T>, radius: T, mut f: F) {
        let radius_squared = T::widen(radius) * T::widen(radius);
        for (slot, p) in self.live() {
            if p.distance_squared(&center) <= radius_squared {
                f(slot);
            }
        }
    }

    fn visit_box<F: FnMut(usize)>(&self, aabb: Aabb3D<T>, mut f: F) {
        for (slot, p) in self.live() {
            if aabb.contains_point(p) {
                f(slot);
            }
        }
    }

    fn visit_nearest<R: Fn(usize) -> u64>(&self, point: Point3<T>, best: &mut KNearest<T::Acc, R>) {
        for (slot, p) in self.live() {
            best.offer(slot, p.distance_squared(&point));
        }
    }
}
