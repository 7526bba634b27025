// Copyright 2026 the Canopy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Primitive geometry types and helpers.

use core::cmp::Ordering;
use core::fmt::{self, Debug, Display};

/// A point in 3D space.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Point3<T> {
    /// X coordinate.
    pub x: T,
    /// Y coordinate.
    pub y: T,
    /// Z coordinate.
    pub z: T,
}

impl<T> Point3<T> {
    /// Create a new point.
    #[inline(always)]
    pub const fn new(x: T, y: T, z: T) -> Self {
        Self { x, y, z }
    }
}

impl<T> From<[T; 3]> for Point3<T> {
    #[inline]
    fn from([x, y, z]: [T; 3]) -> Self {
        Self { x, y, z }
    }
}

impl<T> From<(T, T, T)> for Point3<T> {
    #[inline]
    fn from((x, y, z): (T, T, T)) -> Self {
        Self { x, y, z }
    }
}

impl<T: Scalar> Point3<T> {
    /// Squared Euclidean distance to another point, in the widened accumulator type.
    #[inline]
    pub fn distance_squared(&self, other: &Self) -> T::Acc {
        let dx = T::widen(self.x) - T::widen(other.x);
        let dy = T::widen(self.y) - T::widen(other.y);
        let dz = T::widen(self.z) - T::widen(other.z);
        T::sum_of_squares(dx, dy, dz)
    }
}

/// One of the three coordinate axes.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Axis {
    /// The X axis.
    X,
    /// The Y axis.
    Y,
    /// The Z axis.
    Z,
}

impl Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::X => "x",
            Self::Y => "y",
            Self::Z => "z",
        })
    }
}

/// Axis-aligned bounding box in 3D.
///
/// Both corners are inclusive: a point lying exactly on a face is inside.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Aabb3D<T> {
    /// Minimum x
    pub min_x: T,
    /// Minimum y
    pub min_y: T,
    /// Minimum z
    pub min_z: T,
    /// Maximum x
    pub max_x: T,
    /// Maximum y
    pub max_y: T,
    /// Maximum z
    pub max_z: T,
}

impl<T> Aabb3D<T> {
    /// Create a new AABB from min/max coordinates.
    #[inline(always)]
    pub const fn new(min_x: T, min_y: T, min_z: T, max_x: T, max_y: T, max_z: T) -> Self {
        Self {
            min_x,
            min_y,
            min_z,
            max_x,
            max_y,
            max_z,
        }
    }

    /// Create a new AABB from its min and max corners.
    #[inline]
    pub fn from_corners(min: Point3<T>, max: Point3<T>) -> Self {
        Self::new(min.x, min.y, min.z, max.x, max.y, max.z)
    }
}

impl<T: Copy> Aabb3D<T> {
    /// The minimum corner.
    #[inline]
    pub fn min(&self) -> Point3<T> {
        Point3::new(self.min_x, self.min_y, self.min_z)
    }

    /// The maximum corner.
    #[inline]
    pub fn max(&self) -> Point3<T> {
        Point3::new(self.max_x, self.max_y, self.max_z)
    }
}

impl<T: Copy + PartialOrd> Aabb3D<T> {
    /// Whether this AABB contains the point (inclusive on all six faces).
    #[inline]
    pub fn contains_point(&self, p: Point3<T>) -> bool {
        self.min_x <= p.x
            && self.min_y <= p.y
            && self.min_z <= p.z
            && p.x <= self.max_x
            && p.y <= self.max_y
            && p.z <= self.max_z
    }

    /// Determines whether this AABB overlaps with another in any way.
    ///
    /// Faces count as part of the box, so two boxes that only touch are
    /// considered to overlap.
    ///
    /// # Examples
    ///
    /// ```
    /// use canopy_octree::Aabb3D;
    ///
    /// let a = Aabb3D::new(0.0, 0.0, 0.0, 10.0, 10.0, 10.0);
    /// let b = Aabb3D::new(10.0, 0.0, 0.0, 20.0, 10.0, 10.0);
    /// assert!(a.overlaps(&b));
    ///
    /// let c = Aabb3D::new(11.0, 0.0, 0.0, 20.0, 10.0, 10.0);
    /// assert!(!a.overlaps(&c));
    /// ```
    #[inline]
    pub fn overlaps(&self, other: &Self) -> bool {
        self.min_x <= other.max_x
            && self.max_x >= other.min_x
            && self.min_y <= other.max_y
            && self.max_y >= other.min_y
            && self.min_z <= other.max_z
            && self.max_z >= other.min_z
    }

    /// The first axis on which `min > max`, or on which a bound is NaN.
    ///
    /// Returns `None` for a well-formed box, including zero-thickness ones.
    #[inline]
    pub fn invalid_axis(&self) -> Option<Axis> {
        if !ordered(self.min_x, self.max_x) {
            Some(Axis::X)
        } else if !ordered(self.min_y, self.max_y) {
            Some(Axis::Y)
        } else if !ordered(self.min_z, self.max_z) {
            Some(Axis::Z)
        } else {
            None
        }
    }

    /// Whether the box is well formed on every axis.
    #[inline]
    pub fn is_valid(&self) -> bool {
        self.invalid_axis().is_none()
    }

    /// Return true if the AABB is inverted on some axis (or NaN), so that no point can lie in it.
    ///
    /// Unlike an area test, a box with zero thickness is not empty: it still
    /// contains the points on its faces.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.invalid_axis().is_some()
    }
}

impl<T: Scalar> Aabb3D<T> {
    /// Create a cube centered on `center` with the given half extent on every axis.
    #[inline]
    pub fn from_center_half_extent(center: Point3<T>, half: T) -> Self {
        Self::new(
            T::sub(center.x, half),
            T::sub(center.y, half),
            T::sub(center.z, half),
            T::add(center.x, half),
            T::add(center.y, half),
            T::add(center.z, half),
        )
    }

    /// The center of the box.
    #[inline]
    pub fn center(&self) -> Point3<T> {
        Point3::new(
            T::mid(self.min_x, self.max_x),
            T::mid(self.min_y, self.max_y),
            T::mid(self.min_z, self.max_z),
        )
    }

    /// Index of the octant owning `p`.
    ///
    /// Bit layout: bit0 = X, bit1 = Y, bit2 = Z (0 = low half, 1 = high half).
    /// A coordinate exactly on the split plane belongs to the low half.
    #[inline]
    pub fn octant_of(&self, p: Point3<T>) -> usize {
        let c = self.center();
        usize::from(p.x > c.x) | (usize::from(p.y > c.y) << 1) | (usize::from(p.z > c.z) << 2)
    }

    /// Split at the midpoint of every axis into eight children, in octant index order.
    ///
    /// The children share their split faces; their union is exactly `self`.
    pub fn split_octants(&self) -> [Self; 8] {
        let c = self.center();
        core::array::from_fn(|octant| {
            let (min_x, max_x) = if octant & 1 == 0 {
                (self.min_x, c.x)
            } else {
                (c.x, self.max_x)
            };
            let (min_y, max_y) = if octant & 2 == 0 {
                (self.min_y, c.y)
            } else {
                (c.y, self.max_y)
            };
            let (min_z, max_z) = if octant & 4 == 0 {
                (self.min_z, c.z)
            } else {
                (c.z, self.max_z)
            };
            Self::new(min_x, min_y, min_z, max_x, max_y, max_z)
        })
    }

    /// Squared distance from `p` to the closest point of the box (zero when inside).
    #[inline]
    pub fn distance_squared_to(&self, p: Point3<T>) -> T::Acc {
        let dx = axis_gap(p.x, self.min_x, self.max_x);
        let dy = axis_gap(p.y, self.min_y, self.max_y);
        let dz = axis_gap(p.z, self.min_z, self.max_z);
        T::sum_of_squares(dx, dy, dz)
    }

    /// Whether the sphere with the given center and squared radius touches the box.
    #[inline]
    pub fn intersects_sphere(&self, center: Point3<T>, radius_squared: T::Acc) -> bool {
        self.distance_squared_to(center) <= radius_squared
    }
}

/// `a <= b`, false when either side is NaN.
#[inline]
fn ordered<T: PartialOrd>(a: T, b: T) -> bool {
    matches!(a.partial_cmp(&b), Some(Ordering::Less | Ordering::Equal))
}

#[inline]
fn axis_gap<T: Scalar>(v: T, min: T, max: T) -> T::Acc {
    if v < min {
        T::widen(min) - T::widen(v)
    } else if v > max {
        T::widen(v) - T::widen(max)
    } else {
        T::widen(T::zero())
    }
}

/// Numeric scalar abstraction for 3D points used by backends.
///
/// Distances are compared squared, in an associated widened accumulator type
/// (e.g., f32→f64, i64→i128), so no square roots are needed. Integer
/// distances beyond the accumulator's range saturate rather than wrap.
pub trait Scalar: Copy + PartialOrd + Debug {
    /// Widened accumulator type suitable for squared distances.
    type Acc: Copy
        + PartialOrd
        + core::ops::Add<Output = Self::Acc>
        + core::ops::Sub<Output = Self::Acc>
        + core::ops::Mul<Output = Self::Acc>
        + Debug;

    /// Add two scalar values.
    fn add(a: Self, b: Self) -> Self;

    /// Subtract two scalar values: a - b.
    fn sub(a: Self, b: Self) -> Self;

    /// Zero value for the scalar type.
    fn zero() -> Self;

    /// Midpoint between a and b (the split plane of an octree node).
    fn mid(a: Self, b: Self) -> Self;

    /// Convert a scalar to the accumulator type.
    fn widen(v: Self) -> Self::Acc;

    /// `dx² + dy² + dz²` in the accumulator type.
    ///
    /// Bounded accumulators saturate instead of wrapping, so any distance too
    /// large to represent compares as the largest value.
    #[inline]
    fn sum_of_squares(dx: Self::Acc, dy: Self::Acc, dz: Self::Acc) -> Self::Acc {
        dx * dx + dy * dy + dz * dz
    }
}

impl Scalar for f32 {
    type Acc = f64;

    #[inline]
    fn add(a: Self, b: Self) -> Self {
        a + b
    }

    #[inline]
    fn sub(a: Self, b: Self) -> Self {
        a - b
    }

    #[inline(always)]
    fn zero() -> Self {
        0.0
    }

    #[inline]
    fn mid(a: Self, b: Self) -> Self {
        0.5 * (a + b)
    }

    #[inline]
    fn widen(v: Self) -> Self::Acc {
        f64::from(v)
    }
}

impl Scalar for f64 {
    type Acc = Self;

    #[inline]
    fn add(a: Self, b: Self) -> Self {
        a + b
    }

    #[inline]
    fn sub(a: Self, b: Self) -> Self {
        a - b
    }

    #[inline(always)]
    fn zero() -> Self {
        0.0
    }

    #[inline]
    fn mid(a: Self, b: Self) -> Self {
        0.5 * (a + b)
    }

    #[inline(always)]
    fn widen(v: Self) -> Self::Acc {
        v
    }
}

impl Scalar for i64 {
    type Acc = i128;

    #[inline]
    fn add(a: Self, b: Self) -> Self {
        a.saturating_add(b)
    }

    #[inline]
    fn sub(a: Self, b: Self) -> Self {
        a.saturating_sub(b)
    }

    #[inline(always)]
    fn zero() -> Self {
        0
    }

    #[inline]
    fn mid(a: Self, b: Self) -> Self {
        // Average without overflow, rounding toward -∞.
        (a & b) + ((a ^ b) >> 1)
    }

    #[inline]
    fn widen(v: Self) -> Self::Acc {
        i128::from(v)
    }

    #[inline]
    fn sum_of_squares(dx: i128, dy: i128, dz: i128) -> i128 {
        // An axis span reaches 2^64, whose square does not fit in i128.
        dx.saturating_mul(dx)
            .saturating_add(dy.saturating_mul(dy))
            .saturating_add(dz.saturating_mul(dz))
    }
}

/// Helper alias for the widened accumulator type `Scalar::Acc` associated with a `T: Scalar`.
pub type ScalarAcc<T> = <T as Scalar>::Acc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn boundary_points_are_inside() {
        let b = Aabb3D::new(-100.0, -100.0, -100.0, 100.0, 100.0, 100.0);
        assert!(b.contains_point(Point3::new(100.0, 100.0, 100.0)));
        assert!(b.contains_point(Point3::new(-100.0, 0.0, 100.0)));
        assert!(!b.contains_point(Point3::new(100.5, 0.0, 0.0)));
        assert!(!b.contains_point(Point3::new(f64::NAN, 0.0, 0.0)));
    }

    #[test]
    fn split_octants_partition_the_parent() {
        let b = Aabb3D::new(0.0, 0.0, 0.0, 8.0, 4.0, 2.0);
        let kids = b.split_octants();
        assert_eq!(kids[0], Aabb3D::new(0.0, 0.0, 0.0, 4.0, 2.0, 1.0));
        assert_eq!(kids[1], Aabb3D::new(4.0, 0.0, 0.0, 8.0, 2.0, 1.0));
        assert_eq!(kids[2], Aabb3D::new(0.0, 2.0, 0.0, 4.0, 4.0, 1.0));
        assert_eq!(kids[4], Aabb3D::new(0.0, 0.0, 1.0, 4.0, 2.0, 2.0));
        assert_eq!(kids[7], Aabb3D::new(4.0, 2.0, 1.0, 8.0, 4.0, 2.0));
    }

    #[test]
    fn octant_of_prefers_the_low_half_on_split_planes() {
        let b = Aabb3D::new(-10.0, -10.0, -10.0, 10.0, 10.0, 10.0);
        assert_eq!(b.octant_of(Point3::new(0.0, 0.0, 0.0)), 0);
        assert_eq!(b.octant_of(Point3::new(0.1, 0.0, 0.0)), 1);
        assert_eq!(b.octant_of(Point3::new(0.0, 5.0, 0.0)), 2);
        assert_eq!(b.octant_of(Point3::new(5.0, 5.0, 5.0)), 7);

        // Whatever octant is chosen must contain the point.
        let kids = b.split_octants();
        for p in [
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(-10.0, 10.0, 0.0),
            Point3::new(10.0, 10.0, 10.0),
        ] {
            assert!(kids[b.octant_of(p)].contains_point(p));
        }
    }

    #[test]
    fn sphere_and_distance_tests() {
        let b = Aabb3D::new(0.0, 0.0, 0.0, 10.0, 10.0, 10.0);
        assert_eq!(b.distance_squared_to(Point3::new(5.0, 5.0, 5.0)), 0.0);
        assert_eq!(b.distance_squared_to(Point3::new(13.0, 14.0, 5.0)), 25.0);
        assert!(b.intersects_sphere(Point3::new(13.0, 14.0, 5.0), 25.0));
        assert!(!b.intersects_sphere(Point3::new(13.0, 14.0, 5.0), 24.9));
    }

    #[test]
    fn empty_means_inverted_not_flat() {
        let flat = Aabb3D::new(0.0, 0.0, 0.0, 0.0, 10.0, 10.0);
        assert!(!flat.is_empty());
        assert!(flat.is_valid());
        assert!(flat.contains_point(Point3::new(0.0, 3.0, 3.0)));

        let inverted = Aabb3D::new(0.0, 5.0, 0.0, 10.0, 4.0, 10.0);
        assert!(inverted.is_empty());
        assert_eq!(inverted.invalid_axis(), Some(Axis::Y));

        let nan = Aabb3D::new(0.0, 0.0, f64::NAN, 1.0, 1.0, 1.0);
        assert_eq!(nan.invalid_axis(), Some(Axis::Z));
        assert!(!nan.is_valid());
    }

    #[test]
    fn integer_coordinates_do_not_overflow() {
        let far = Point3::new(-(1_i64 << 61), -(1_i64 << 61), -(1_i64 << 61));
        let near = Point3::new(1_i64 << 61, 1_i64 << 61, 1_i64 << 61);
        assert_eq!(far.distance_squared(&near), 3 * (1_i128 << 124));
        assert_eq!(i64::mid(i64::MIN, i64::MAX), -1);
        assert_eq!(i64::mid(-3, 4), 0);
    }

    #[test]
    fn integer_distances_across_the_full_range_saturate() {
        let min = Point3::new(i64::MIN, i64::MIN, i64::MIN);
        let max = Point3::new(i64::MAX, i64::MAX, i64::MAX);
        assert_eq!(min.distance_squared(&max), i128::MAX);
        assert_eq!(max.distance_squared(&min), i128::MAX);

        let corner = Aabb3D::from_corners(max, max);
        assert_eq!(corner.distance_squared_to(min), i128::MAX);
        assert!(!corner.intersects_sphere(min, 1));

        // One saturated axis is enough to exceed any representable radius.
        let edge = Point3::new(i64::MAX, 0, 0);
        let far_edge = Point3::new(i64::MIN, 0, 0);
        assert_eq!(edge.distance_squared(&far_edge), i128::MAX);
    }
}
