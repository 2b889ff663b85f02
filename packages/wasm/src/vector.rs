//! Three-component float vector used for vertex positions and force directions.
//!
//! 2D layouts use the same type with `z == 0` throughout.

use std::fmt;
use std::ops::{Add, AddAssign, Div, DivAssign, Mul, MulAssign, Sub, SubAssign};

/// A position or direction in layout space.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
#[repr(C)]
pub struct Vector3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vector3 {
    pub const ZERO: Self = Self::new(0.0, 0.0, 0.0);

    #[inline]
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    /// Euclidean length.
    #[inline]
    pub fn length(self) -> f32 {
        (self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }

    /// Euclidean distance to `other`.
    #[inline]
    pub fn distance(self, other: Self) -> f32 {
        (self - other).length()
    }

    #[inline]
    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }

    /// Componentwise minimum.
    #[inline]
    pub fn min(self, other: Self) -> Self {
        Self::new(self.x.min(other.x), self.y.min(other.y), self.z.min(other.z))
    }

    /// Componentwise maximum.
    #[inline]
    pub fn max(self, other: Self) -> Self {
        Self::new(self.x.max(other.x), self.y.max(other.y), self.z.max(other.z))
    }

    /// Largest per-axis extent of the cuboid spanned by `min` and `max`.
    #[inline]
    pub fn width(min: Self, max: Self) -> f32 {
        let extent = max - min;
        extent.x.max(extent.y).max(extent.z)
    }

    /// Componentwise minimum over all positions.
    ///
    /// Returns `None` for an empty collection.
    pub fn min_of<I>(positions: I) -> Option<Self>
    where
        I: IntoIterator<Item = Self>,
    {
        positions.into_iter().reduce(Self::min)
    }

    /// Componentwise maximum over all positions.
    ///
    /// Returns `None` for an empty collection.
    pub fn max_of<I>(positions: I) -> Option<Self>
    where
        I: IntoIterator<Item = Self>,
    {
        positions.into_iter().reduce(Self::max)
    }
}

impl fmt::Display for Vector3 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.x, self.y, self.z)
    }
}

impl From<[f32; 3]> for Vector3 {
    #[inline]
    fn from([x, y, z]: [f32; 3]) -> Self {
        Self::new(x, y, z)
    }
}

impl From<Vector3> for [f32; 3] {
    #[inline]
    fn from(v: Vector3) -> Self {
        [v.x, v.y, v.z]
    }
}

impl Add for Vector3 {
    type Output = Self;

    #[inline]
    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl Sub for Vector3 {
    type Output = Self;

    #[inline]
    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl Mul for Vector3 {
    type Output = Self;

    #[inline]
    fn mul(self, rhs: Self) -> Self {
        Self::new(self.x * rhs.x, self.y * rhs.y, self.z * rhs.z)
    }
}

impl Div for Vector3 {
    type Output = Self;

    #[inline]
    fn div(self, rhs: Self) -> Self {
        Self::new(self.x / rhs.x, self.y / rhs.y, self.z / rhs.z)
    }
}

impl Mul<f32> for Vector3 {
    type Output = Self;

    #[inline]
    fn mul(self, scalar: f32) -> Self {
        Self::new(self.x * scalar, self.y * scalar, self.z * scalar)
    }
}

impl Div<f32> for Vector3 {
    type Output = Self;

    #[inline]
    fn div(self, scalar: f32) -> Self {
        Self::new(self.x / scalar, self.y / scalar, self.z / scalar)
    }
}

impl AddAssign for Vector3 {
    #[inline]
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl SubAssign for Vector3 {
    #[inline]
    fn sub_assign(&mut self, rhs: Self) {
        *self = *self - rhs;
    }
}

impl MulAssign<f32> for Vector3 {
    #[inline]
    fn mul_assign(&mut self, scalar: f32) {
        *self = *self * scalar;
    }
}

impl DivAssign<f32> for Vector3 {
    #[inline]
    fn div_assign(&mut self, scalar: f32) {
        *self = *self / scalar;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_elementwise_arithmetic() {
        let a = Vector3::new(1.0, 2.0, 3.0);
        let b = Vector3::new(4.0, 5.0, 6.0);

        assert_eq!(a + b, Vector3::new(5.0, 7.0, 9.0));
        assert_eq!(b - a, Vector3::new(3.0, 3.0, 3.0));
        assert_eq!(a * b, Vector3::new(4.0, 10.0, 18.0));
        assert_eq!(b / a, Vector3::new(4.0, 2.5, 2.0));
    }

    #[test]
    fn test_scalar_arithmetic() {
        let mut v = Vector3::new(2.0, -4.0, 8.0);
        assert_eq!(v * 0.5, Vector3::new(1.0, -2.0, 4.0));
        assert_eq!(v / 2.0, Vector3::new(1.0, -2.0, 4.0));

        v *= 2.0;
        assert_eq!(v, Vector3::new(4.0, -8.0, 16.0));
        v /= 4.0;
        assert_eq!(v, Vector3::new(1.0, -2.0, 4.0));
    }

    #[test]
    fn test_length_and_distance() {
        let v = Vector3::new(3.0, 4.0, 0.0);
        assert_eq!(v.length(), 5.0);
        assert_eq!(Vector3::ZERO.distance(Vector3::new(0.0, 0.0, -2.0)), 2.0);
    }

    #[test]
    fn test_min_max_reduction() {
        let positions = [
            Vector3::new(1.0, -5.0, 0.0),
            Vector3::new(-2.0, 3.0, 7.0),
            Vector3::new(0.5, 0.0, -1.0),
        ];

        let min = Vector3::min_of(positions).unwrap();
        let max = Vector3::max_of(positions).unwrap();
        assert_eq!(min, Vector3::new(-2.0, -5.0, -1.0));
        assert_eq!(max, Vector3::new(1.0, 3.0, 7.0));
        assert_eq!(Vector3::width(min, max), 8.0);
    }

    #[test]
    fn test_reduction_of_empty_set() {
        assert_eq!(Vector3::min_of(std::iter::empty()), None);
        assert_eq!(Vector3::max_of(std::iter::empty()), None);
    }
}
