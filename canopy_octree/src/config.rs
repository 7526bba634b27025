// Copyright 2026 the Canopy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Octree tuning parameters.

/// Tuning parameters for the [`Octree`][crate::backends::Octree] backend.
///
/// The defaults (8 entities per leaf, depth 8) suit a few thousand moving
/// entities spread over a world a few kilometres across. With the `serde`
/// feature, missing fields deserialize to their defaults.
///
/// ```
/// use canopy_octree::OctreeConfig;
///
/// let config = OctreeConfig::default().with_capacity(16).with_max_depth(6);
/// assert_eq!(config.capacity, 16);
/// assert_eq!(config.max_depth, 6);
/// ```
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct OctreeConfig {
    /// Entities a leaf holds before it subdivides.
    pub capacity: usize,
    /// Depth at which leaves stop subdividing and grow past `capacity` instead.
    pub max_depth: u32,
}

impl OctreeConfig {
    /// Default leaf capacity.
    pub const DEFAULT_CAPACITY: usize = 8;
    /// Default maximum depth.
    pub const DEFAULT_MAX_DEPTH: u32 = 8;

    /// Set the leaf capacity.
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    /// Set the maximum depth.
    pub fn with_max_depth(mut self, max_depth: u32) -> Self {
        self.max_depth = max_depth;
        self
    }
}

impl Default for OctreeConfig {
    fn default() -> Self {
        Self {
            capacity: Self::DEFAULT_CAPACITY,
            max_depth: Self::DEFAULT_MAX_DEPTH,
        }
    }
}

#[cfg(all(test, feature = "serde"))]
mod tests {
    use super::OctreeConfig;

    #[test]
    fn partial_config_fills_in_defaults() {
        let config: OctreeConfig = serde_json::from_str(r#"{ "capacity": 32 }"#).unwrap();
        assert_eq!(config.capacity, 32);
        assert_eq!(config.max_depth, OctreeConfig::DEFAULT_MAX_DEPTH);
    }
}
