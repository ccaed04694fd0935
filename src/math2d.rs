//! 2D Math Utilities
//!
//! Vectors and canvas-style affine transforms for the heart renderer.

use std::ops::{Add, AddAssign, Mul, Neg, Sub};

/// 2D Vector
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub const ZERO: Self = Self::new(0.0, 0.0);

    #[inline]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    #[inline]
    pub fn length(&self) -> f32 {
        (self.x * self.x + self.y * self.y).sqrt()
    }

    #[inline]
    pub fn normalize(&self) -> Self {
        let len = self.length();
        if len > 0.0 {
            Self {
                x: self.x / len,
                y: self.y / len,
            }
        } else {
            *self
        }
    }

    /// Left-hand perpendicular (rotated 90° in screen space)
    #[inline]
    pub fn perp(&self) -> Self {
        Self::new(-self.y, self.x)
    }

    /// Approximate equality check for floating point comparison
    #[inline]
    #[cfg(test)]
    pub fn approx_eq(&self, other: &Self, epsilon: f32) -> bool {
        (self.x - other.x).abs() < epsilon && (self.y - other.y).abs() < epsilon
    }
}

impl Add for Vec2 {
    type Output = Self;
    #[inline]
    fn add(self, other: Self) -> Self {
        Self::new(self.x + other.x, self.y + other.y)
    }
}

impl AddAssign for Vec2 {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.x += other.x;
        self.y += other.y;
    }
}

impl Sub for Vec2 {
    type Output = Self;
    #[inline]
    fn sub(self, other: Self) -> Self {
        Self::new(self.x - other.x, self.y - other.y)
    }
}

impl Neg for Vec2 {
    type Output = Self;
    #[inline]
    fn neg(self) -> Self {
        Self::new(-self.x, -self.y)
    }
}

impl Mul<f32> for Vec2 {
    type Output = Self;
    #[inline]
    fn mul(self, scalar: f32) -> Self {
        Self::new(self.x * scalar, self.y * scalar)
    }
}

impl Mul<Vec2> for f32 {
    type Output = Vec2;
    #[inline]
    fn mul(self, v: Vec2) -> Vec2 {
        Vec2::new(self * v.x, self * v.y)
    }
}

/// Affine transform in HTML canvas layout:
///
/// ```text
/// | a c e |
/// | b d f |
/// | 0 0 1 |
/// ```
///
/// `translate`, `rotate` and `scale` post-multiply, so each call acts in the
/// coordinate system produced by the calls before it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform2D {
    pub a: f32,
    pub b: f32,
    pub c: f32,
    pub d: f32,
    pub e: f32,
    pub f: f32,
}

impl Transform2D {
    pub const IDENTITY: Self = Self {
        a: 1.0,
        b: 0.0,
        c: 0.0,
        d: 1.0,
        e: 0.0,
        f: 0.0,
    };

    #[inline]
    pub fn translate(&mut self, tx: f32, ty: f32) {
        self.e += self.a * tx + self.c * ty;
        self.f += self.b * tx + self.d * ty;
    }

    /// Rotate by `angle` radians (clockwise on screen, y pointing down)
    #[inline]
    pub fn rotate(&mut self, angle: f32) {
        let (sin, cos) = angle.sin_cos();
        let (a, b, c, d) = (self.a, self.b, self.c, self.d);
        self.a = a * cos + c * sin;
        self.b = b * cos + d * sin;
        self.c = c * cos - a * sin;
        self.d = d * cos - b * sin;
    }

    #[inline]
    pub fn scale(&mut self, sx: f32, sy: f32) {
        self.a *= sx;
        self.b *= sx;
        self.c *= sy;
        self.d *= sy;
    }

    /// Map a local point into device space
    #[inline]
    pub fn apply(&self, p: Vec2) -> Vec2 {
        Vec2::new(
            self.a * p.x + self.c * p.y + self.e,
            self.b * p.x + self.d * p.y + self.f,
        )
    }

    #[inline]
    pub fn determinant(&self) -> f32 {
        self.a * self.d - self.b * self.c
    }

    /// Inverse transform, or `None` when the matrix is singular
    pub fn inverse(&self) -> Option<Self> {
        let det = self.determinant();
        if det.abs() < 1e-12 {
            return None;
        }
        let inv = 1.0 / det;
        Some(Self {
            a: self.d * inv,
            b: -self.b * inv,
            c: -self.c * inv,
            d: self.a * inv,
            e: (self.c * self.f - self.d * self.e) * inv,
            f: (self.b * self.e - self.a * self.f) * inv,
        })
    }

    /// Largest factor by which this transform stretches a unit length
    pub fn max_scale(&self) -> f32 {
        let sx = (self.a * self.a + self.b * self.b).sqrt();
        let sy = (self.c * self.c + self.d * self.d).sqrt();
        sx.max(sy)
    }

    #[cfg(test)]
    pub fn approx_eq(&self, other: &Self, epsilon: f32) -> bool {
        (self.a - other.a).abs() < epsilon
            && (self.b - other.b).abs() < epsilon
            && (self.c - other.c).abs() < epsilon
            && (self.d - other.d).abs() < epsilon
            && (self.e - other.e).abs() < epsilon
            && (self.f - other.f).abs() < epsilon
    }
}

impl Default for Transform2D {
    fn default() -> Self {
        Self::IDENTITY
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::FRAC_PI_2;

    #[test]
    fn test_vec2_ops() {
        let v = Vec2::new(3.0, 4.0);
        assert_eq!(v.length(), 5.0);
        assert!(v.normalize().approx_eq(&Vec2::new(0.6, 0.8), 1e-6));
        assert_eq!(v + Vec2::new(1.0, 1.0), Vec2::new(4.0, 5.0));
        assert_eq!(v - Vec2::new(1.0, 1.0), Vec2::new(2.0, 3.0));
        assert_eq!(-v, Vec2::new(-3.0, -4.0));
        assert_eq!(v * 2.0, 2.0 * v);
        assert_eq!(Vec2::ZERO.normalize(), Vec2::ZERO);
    }

    #[test]
    fn test_translate_then_scale_order() {
        let mut t = Transform2D::IDENTITY;
        t.translate(10.0, 20.0);
        t.scale(2.0, 2.0);
        // Scale applies in the translated space
        let p = t.apply(Vec2::new(1.0, 1.0));
        assert!(p.approx_eq(&Vec2::new(12.0, 22.0), 1e-6));
    }

    #[test]
    fn test_rotate_quarter_turn() {
        let mut t = Transform2D::IDENTITY;
        t.rotate(FRAC_PI_2);
        // +x maps to +y (down) on a y-down screen
        let p = t.apply(Vec2::new(1.0, 0.0));
        assert!(p.approx_eq(&Vec2::new(0.0, 1.0), 1e-6));
    }

    #[test]
    fn test_inverse_round_trip() {
        let mut t = Transform2D::IDENTITY;
        t.translate(50.0, -7.0);
        t.rotate(0.7);
        t.scale(1.5, 1.5);
        t.translate(-12.0, -12.0);

        let inv = t.inverse().unwrap();
        let p = Vec2::new(3.0, 9.0);
        assert!(inv.apply(t.apply(p)).approx_eq(&p, 1e-4));
        assert!((t.max_scale() - 1.5).abs() < 1e-5);
    }

    #[test]
    fn test_singular_has_no_inverse() {
        let mut t = Transform2D::IDENTITY;
        t.scale(0.0, 1.0);
        assert!(t.inverse().is_none());
    }
}
