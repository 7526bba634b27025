// Copyright 2026 the Canopy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Uniform grid backend for 3D points.
//!
//! This backend buckets points into fixed-size cubic cells and answers queries
//! by touching only the cells overlapping the query primitive. It is intended
//! for workloads with:
//! - moderately uniform spatial density,
//! - constant churn (every point moves every tick), and
//! - query radii that are small compared to the full world extent.
//!
//! Unlike the octree it has no world bounds: any finite point can be stored.

use alloc::vec::Vec;
use core::cmp::Ordering;
use core::fmt::Debug;

use hashbrown::HashMap;
use smallvec::SmallVec;

use crate::backend::Backend;
use crate::nearest::KNearest;
use crate::types::{Aabb3D, Point3, Scalar};

type CellKey = (i32, i32, i32);

/// Scalar types supported by the grid backend.
///
/// This is kept separate from [`Scalar`] so that the grid implementation can
/// use type-specific logic (e.g., Euclidean division for integers).
pub trait GridScalar: Scalar {
    /// Map a scalar coordinate to a grid coordinate along one axis.
    ///
    /// The mapping is based on an origin and uniform cell size. Implementations
    /// are expected to be monotonic in `value` for fixed `origin` and
    /// `cell_size`.
    fn cell_coord(value: Self, origin: Self, cell_size: Self) -> i32;

    /// Lower edge of the cell with the given grid coordinate along one axis.
    fn cell_start(coord: i32, origin: Self, cell_size: Self) -> Self;
}

impl GridScalar for f32 {
    #[allow(
        clippy::cast_possible_truncation,
        reason = "Grid cell indices are intentionally i32; out-of-range values are saturated."
    )]
    #[inline]
    fn cell_coord(value: Self, origin: Self, cell_size: Self) -> i32 {
        debug_assert!(
            cell_size > 0.0,
            "grid cell_size must be strictly positive (f32)"
        );
        let t = (value - origin) / cell_size;
        let coord = t as i32;

        // Round towards -∞ (the cast above has already truncated).
        if t < 0.0 && (coord as Self) > t {
            coord.saturating_sub(1)
        } else {
            coord
        }
    }

    #[allow(
        clippy::cast_precision_loss,
        reason = "Cell coordinates far from the origin only need to bound, not locate, points."
    )]
    #[inline]
    fn cell_start(coord: i32, origin: Self, cell_size: Self) -> Self {
        origin + coord as Self * cell_size
    }
}

impl GridScalar for f64 {
    #[allow(
        clippy::cast_possible_truncation,
        reason = "Grid cell indices are intentionally i32; out-of-range values are saturated."
    )]
    #[inline]
    fn cell_coord(value: Self, origin: Self, cell_size: Self) -> i32 {
        debug_assert!(
            cell_size > 0.0,
            "grid cell_size must be strictly positive (f64)"
        );
        let t = (value - origin) / cell_size;
        let coord = t as i32;

        // Round towards -∞ (the cast above has already truncated).
        if t < 0.0 && (coord as Self) > t {
            coord.saturating_sub(1)
        } else {
            coord
        }
    }

    #[inline]
    fn cell_start(coord: i32, origin: Self, cell_size: Self) -> Self {
        origin + Self::from(coord) * cell_size
    }
}

impl GridScalar for i64 {
    #[allow(
        clippy::cast_possible_truncation,
        reason = "Grid cell indices are intentionally i32; out-of-range values are saturated."
    )]
    #[inline]
    fn cell_coord(value: Self, origin: Self, cell_size: Self) -> i32 {
        debug_assert!(
            cell_size > 0,
            "grid cell_size must be strictly positive (i64)"
        );
        let rel = value.saturating_sub(origin);
        // Euclidean division rounds toward -∞, which matches floor for all
        // integer values.
        let coord = rel.div_euclid(cell_size);

        // Saturate values out of `i32` range.
        if coord >= Self::from(i32::MAX) {
            i32::MAX
        } else if coord <= Self::from(i32::MIN) {
            i32::MIN
        } else {
            coord as i32
        }
    }

    #[inline]
    fn cell_start(coord: i32, origin: Self, cell_size: Self) -> Self {
        origin.saturating_add(Self::from(coord).saturating_mul(cell_size))
    }
}

/// Uniform grid backend with fixed cell size.
pub struct Grid<T: GridScalar> {
    cell_size: T,
    origin: Point3<T>,
    cells: HashMap<CellKey, Cell>,
    slots: Vec<Option<SlotEntry<T>>>,
}

#[derive(Clone, Debug)]
struct SlotEntry<T: GridScalar> {
    point: Point3<T>,
    // The single cell containing this point.
    cell: CellKey,
}

#[derive(Default)]
struct Cell {
    slots: SmallVec<[usize; 8]>,
}

impl<T: GridScalar> Debug for Grid<T> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let total_slots = self.slots.len();
        let live_slots = self.slots.iter().filter(|s| s.is_some()).count();
        let num_cells = self.cells.len();
        f.debug_struct("Grid")
            .field("cell_size", &self.cell_size)
            .field("origin", &self.origin)
            .field("total_slots", &total_slots)
            .field("live_slots", &live_slots)
            .field("cells", &num_cells)
            .finish_non_exhaustive()
    }
}

impl<T: GridScalar> Grid<T> {
    /// Create a new grid backend with the given cell size and origin at (0, 0, 0).
    pub fn new(cell_size: T) -> Self {
        Self::with_origin(cell_size, Point3::new(T::zero(), T::zero(), T::zero()))
    }

    /// Create a new grid backend with the given cell size and origin.
    pub fn with_origin(cell_size: T, origin: Point3<T>) -> Self {
        debug_assert!(cell_size > T::zero(), "cell_size must be strictly positive");
        Self {
            cell_size,
            origin,
            cells: HashMap::new(),
            slots: Vec::new(),
        }
    }

    fn ensure_slot(&mut self, slot: usize) {
        if self.slots.len() <= slot {
            self.slots.resize_with(slot + 1, || None);
        }
    }

    fn slot_entry(&self, slot: usize) -> &SlotEntry<T> {
        self.slots
            .get(slot)
            .expect("grid invariant violated: cell references out-of-bounds slot")
            .as_ref()
            .expect("grid invariant violated: cell references vacant slot")
    }

    fn remove_from_cell(&mut self, slot: usize, key: CellKey) {
        let cell = self
            .cells
            .get_mut(&key)
            .expect("grid invariant violated: missing cell while removing slot");

        let pos = cell
            .slots
            .iter()
            .position(|&s| s == slot)
            .expect("grid invariant violated: slot not found in expected cell");
        cell.slots.swap_remove(pos);

        if cell.slots.is_empty() {
            // Dropping empty cells keeps the map compact for sparse grids.
            self.cells.remove(&key);
        }
    }

    fn cell_of(&self, p: Point3<T>) -> CellKey {
        (
            T::cell_coord(p.x, self.origin.x, self.cell_size),
            T::cell_coord(p.y, self.origin.y, self.cell_size),
            T::cell_coord(p.z, self.origin.z, self.cell_size),
        )
    }

    /// A lower bound on the squared distance from `point` to any slot in cell `key`.
    ///
    /// The cell is padded by one neighbor on every side to absorb rounding in
    /// [`GridScalar::cell_coord`]. Saturated edge cells hold arbitrarily far
    /// points, so they bound nothing.
    fn cell_lower_bound(&self, (ix, iy, iz): CellKey, point: Point3<T>) -> T::Acc {
        let saturated = |c: i32| c == i32::MIN || c == i32::MAX;
        if saturated(ix) || saturated(iy) || saturated(iz) {
            return T::widen(T::zero());
        }
        let start = |c: i32, o: T| T::cell_start(c - 1, o, self.cell_size);
        let end = |c: i32, o: T| T::cell_start(c.saturating_add(2), o, self.cell_size);
        Aabb3D::new(
            start(ix, self.origin.x),
            start(iy, self.origin.y),
            start(iz, self.origin.z),
            end(ix, self.origin.x),
            end(iy, self.origin.y),
            end(iz, self.origin.z),
        )
        .distance_squared_to(point)
    }

    /// Visit the slots of every cell a box touches.
    ///
    /// When the box spans more cells than are occupied, the occupied cells are
    /// filtered instead, so huge query volumes stay proportional to the data.
    fn visit_cells_in<F: FnMut(usize)>(&self, aabb: &Aabb3D<T>, mut f: F) {
        let (ix0, iy0, iz0) = self.cell_of(aabb.min());
        let (ix1, iy1, iz1) = self.cell_of(aabb.max());
        let span = |a: i32, b: i32| u64::from(b.abs_diff(a)) + 1;
        let volume = span(ix0, ix1)
            .saturating_mul(span(iy0, iy1))
            .saturating_mul(span(iz0, iz1));

        if volume > self.cells.len() as u64 {
            let inside = |k: &CellKey| {
                (ix0..=ix1).contains(&k.0) && (iy0..=iy1).contains(&k.1) && (iz0..=iz1).contains(&k.2)
            };
            for (key, cell) in &self.cells {
                if inside(key) {
                    cell.slots.iter().copied().for_each(&mut f);
                }
            }
            return;
        }

        for ix in ix0..=ix1 {
            for iy in iy0..=iy1 {
                for iz in iz0..=iz1 {
                    if let Some(cell) = self.cells.get(&(ix, iy, iz)) {
                        cell.slots.iter().copied().for_each(&mut f);
                    }
                }
            }
        }
    }
}

impl<T: GridScalar> Backend<T> for Grid<T> {
    fn insert(&mut self, slot: usize, point: Point3<T>) {
        self.ensure_slot(slot);

        // If this slot was previously used, clean up its old cell membership.
        if let Some(old) = self.slots[slot].take() {
            self.remove_from_cell(slot, old.cell);
        }

        let cell = self.cell_of(point);
        self.cells.entry(cell).or_default().slots.push(slot);
        self.slots[slot] = Some(SlotEntry { point, cell });
    }

    fn remove(&mut self, slot: usize) {
        if slot >= self.slots.len() {
            return;
        }
        if let Some(entry) = self.slots[slot].take() {
            self.remove_from_cell(slot, entry.cell);
        }
    }

    fn clear(&mut self) {
        self.cells.clear();
        self.slots.clear();
    }

    fn visit_sphere<F: FnMut(usize)>(&self, center: Point3<T>, radius: T, mut f: F) {
        let radius_squared = T::widen(radius) * T::widen(radius);
        let search = Aabb3D::from_center_half_extent(center, radius);
        self.visit_cells_in(&search, |slot| {
            if self.slot_entry(slot).point.distance_squared(&center) <= radius_squared {
                f(slot);
            }
        });
    }

    fn visit_box<F: FnMut(usize)>(&self, aabb: Aabb3D<T>, mut f: F) {
        self.visit_cells_in(&aabb, |slot| {
            if aabb.contains_point(self.slot_entry(slot).point) {
                f(slot);
            }
        });
    }

    fn visit_nearest<R: Fn(usize) -> u64>(&self, point: Point3<T>, best: &mut KNearest<T::Acc, R>) {
        let mut order: Vec<(T::Acc, &Cell)> = self
            .cells
            .iter()
            .map(|(&key, cell)| (self.cell_lower_bound(key, point), cell))
            .collect();
        order.sort_unstable_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(Ordering::Equal));
        for (lower_bound, cell) in order {
            if best.prunes(lower_bound) {
                break;
            }
            for &slot in &cell.slots {
                best.offer(slot, self.slot_entry(slot).point.distance_squared(&point));
            }
        }
    }

    fn node_count(&self) -> usize {
        self.cells.len()
    }
}

/// Grid backend over `f32` coordinates.
pub type GridF32 = Grid<f32>;
/// Grid backend over `f64` coordinates.
pub type GridF64 = Grid<f64>;
/// Grid backend over `i64` coordinates.
pub type GridI64 = Grid<i64>;
