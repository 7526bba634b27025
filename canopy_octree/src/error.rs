// Copyright 2026 the Canopy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Construction errors.

use crate::types::Axis;

/// Errors raised when building an index.
///
/// Only construction can fail. Once an index exists, every operation on it is
/// total: unknown ids and degenerate queries are no-ops or empty results.
#[derive(Copy, Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// The world bounds have `min > max` (or a NaN bound) on `axis`.
    #[error("invalid bounds: min exceeds max on the {axis} axis")]
    InvalidBounds {
        /// The first offending axis.
        axis: Axis,
    },
    /// The leaf capacity was zero, so no leaf could ever hold an entity.
    #[error("leaf capacity must be at least 1")]
    ZeroCapacity,
}
