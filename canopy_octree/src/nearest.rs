// Copyright 2026 the Canopy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Bounded candidate set for k-nearest searches.

use alloc::collections::BinaryHeap;
use core::cmp::Ordering;
use core::fmt::Debug;

/// A slot offered to a [`KNearest`] set, with its squared distance and insertion stamp.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Candidate<A> {
    /// Slot of the entity in the index.
    pub slot: usize,
    /// Squared distance to the query point.
    pub distance_squared: A,
    /// Insertion stamp of the entity; smaller stamps win distance ties.
    pub stamp: u64,
}

/// Heap entry ordered by `(distance, stamp)`, so the max-heap top is the worst kept candidate.
///
/// NaN distances never enter the heap, which makes this a total order.
struct Ranked<A>(Candidate<A>);

impl<A: PartialOrd> Ord for Ranked<A> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0
            .distance_squared
            .partial_cmp(&other.0.distance_squared)
            .unwrap_or(Ordering::Equal)
            .then(self.0.stamp.cmp(&other.0.stamp))
    }
}

impl<A: PartialOrd> PartialOrd for Ranked<A> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<A: PartialOrd> PartialEq for Ranked<A> {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl<A: PartialOrd> Eq for Ranked<A> {}

/// The running best-`k` set of a nearest-neighbor search.
///
/// A max-heap of at most `k` candidates keyed by `(distance, stamp)`: the top
/// is the candidate to evict next. Backends call [`offer`][Self::offer] for
/// every entity they cannot rule out, and use [`prunes`][Self::prunes] to skip
/// whole regions once the set is full.
///
/// `R` maps a slot to its insertion stamp so that equal distances resolve the
/// same way regardless of traversal order.
pub struct KNearest<A, R> {
    k: usize,
    rank: R,
    heap: BinaryHeap<Ranked<A>>,
}

impl<A, R> Debug for KNearest<A, R> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("KNearest")
            .field("k", &self.k)
            .field("len", &self.heap.len())
            .finish_non_exhaustive()
    }
}

impl<A, R> KNearest<A, R>
where
    A: Copy + PartialOrd,
    R: Fn(usize) -> u64,
{
    /// Create an empty set that keeps the `k` best candidates.
    pub fn new(k: usize, rank: R) -> Self {
        Self {
            k,
            rank,
            heap: BinaryHeap::new(),
        }
    }

    /// The number of candidates this set keeps.
    pub fn k(&self) -> usize {
        self.k
    }

    /// The number of candidates currently held.
    pub fn len(&self) -> usize {
        self.heap.len()
    }

    /// Whether no candidate has been accepted yet.
    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    /// Whether the set holds `k` candidates.
    pub fn is_full(&self) -> bool {
        self.heap.len() >= self.k
    }

    /// The largest squared distance held, once the set is full.
    pub fn worst(&self) -> Option<A> {
        if self.is_full() {
            self.heap.peek().map(|r| r.0.distance_squared)
        } else {
            None
        }
    }

    /// Whether a region whose closest point is `lower_bound` away can be skipped.
    ///
    /// Only strictly farther regions are skipped: a region at exactly the worst
    /// distance may still hold an entity that wins the stamp tie-break.
    #[inline]
    pub fn prunes(&self, lower_bound: A) -> bool {
        self.worst().is_some_and(|worst| lower_bound > worst)
    }

    /// Offer a slot at the given squared distance. Returns whether it was kept.
    ///
    /// NaN distances are never kept. O(log k).
    pub fn offer(&mut self, slot: usize, distance_squared: A) -> bool {
        if self.k == 0 || distance_squared.partial_cmp(&distance_squared).is_none() {
            return false;
        }
        let candidate = Ranked(Candidate {
            slot,
            distance_squared,
            stamp: (self.rank)(slot),
        });
        if self.heap.len() < self.k {
            self.heap.push(candidate);
            return true;
        }
        match self.heap.peek_mut() {
            Some(mut worst) if candidate < *worst => {
                *worst = candidate;
                true
            }
            _ => false,
        }
    }

    /// Consume the set, yielding candidates nearest first.
    pub fn into_sorted(self) -> impl Iterator<Item = Candidate<A>> {
        self.heap.into_sorted_vec().into_iter().map(|r| r.0)
    }
}
