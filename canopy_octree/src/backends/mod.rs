// Copyright 2026 the Canopy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Backend implementations for different spatial strategies.
//!
//! - `octree`: bounded, adaptively subdivided octree (aliases: `OctreeF32`, `OctreeF64`, `OctreeI64`).
//! - `flatvec`: flat vector with linear scans (small, simple).
//! - `grid` (feature `backend_grid`): unbounded uniform grid with configurable cell size.
//!
//! Octree layout
//! -------------
//! Nodes live in one arena. An internal node stores the index of its first child; the
//! eight children are contiguous and ordered by octant code, where bit 0 is set for the
//! high half on x, bit 1 for y, and bit 2 for z. A coordinate equal to the split plane
//! belongs to the low half. Nodes never merge back after removals; call
//! [`IndexGeneric::rebalance`][crate::IndexGeneric::rebalance] to compact a tree after
//! heavy churn.
//!
//! Distances are compared squared, in the widened accumulator of the scalar
//! (`f32`→`f64`, `f64`→`f64`, `i64`→`i128`).

pub(crate) mod flatvec;
#[cfg(feature = "backend_grid")]
pub(crate) mod grid;
pub(crate) mod octree;

pub use flatvec::FlatVec;
#[cfg(feature = "backend_grid")]
pub use grid::{Grid, GridF32, GridF64, GridI64, GridScalar};
pub use octree::{DEFAULT_WORLD_HALF_EXTENT, Octree, OctreeF32, OctreeF64, OctreeI64};
