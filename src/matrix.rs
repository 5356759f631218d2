//! 2D affine transform.
//!
//! `Matrix` is the 2x3 affine (a, b, c, d, e, f) mapping
//! `(x, y) -> (a*x + c*y + e, b*x + d*y + f)`.
//!
//! The builder operations (`translate`, `scale`, `rotate`, `flip_y`)
//! pre-multiply: the new step applies first, in the local coordinate
//! frame, before the transform already held by the matrix.

use crate::basics::Point;
use crate::error::{Error, Result};

const EPSILON: f64 = 1e-14;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Matrix {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub d: f64,
    pub e: f64,
    pub f: f64,
}

impl Matrix {
    pub fn identity() -> Self {
        Self {
            a: 1.0,
            b: 0.0,
            c: 0.0,
            d: 1.0,
            e: 0.0,
            f: 0.0,
        }
    }

    pub fn new(a: f64, b: f64, c: f64, d: f64, e: f64, f: f64) -> Self {
        Self { a, b, c, d, e, f }
    }

    pub fn translation(tx: f64, ty: f64) -> Self {
        Self::new(1.0, 0.0, 0.0, 1.0, tx, ty)
    }

    pub fn scaling(sx: f64, sy: f64) -> Self {
        Self::new(sx, 0.0, 0.0, sy, 0.0, 0.0)
    }

    pub fn rotation(rad: f64) -> Self {
        let (sin, cos) = rad.sin_cos();
        Self::new(cos, sin, -sin, cos, 0.0, 0.0)
    }

    /// Compose so that `m` applies first, then `self`.
    pub fn pre_multiply(&mut self, m: &Matrix) -> &mut Self {
        *self = Self {
            a: self.a * m.a + self.c * m.b,
            b: self.b * m.a + self.d * m.b,
            c: self.a * m.c + self.c * m.d,
            d: self.b * m.c + self.d * m.d,
            e: self.a * m.e + self.c * m.f + self.e,
            f: self.b * m.e + self.d * m.f + self.f,
        };
        self
    }

    /// Compose so that `self` applies first, then `m`.
    pub fn then(&self, m: &Matrix) -> Matrix {
        let mut out = *m;
        out.pre_multiply(self);
        out
    }

    pub fn translate(&mut self, tx: f64, ty: f64) -> &mut Self {
        self.pre_multiply(&Self::translation(tx, ty))
    }

    pub fn scale(&mut self, sx: f64, sy: f64) -> &mut Self {
        self.pre_multiply(&Self::scaling(sx, sy))
    }

    pub fn rotate(&mut self, rad: f64) -> &mut Self {
        self.pre_multiply(&Self::rotation(rad))
    }

    /// Mirror the local Y axis (y-down <-> y-up).
    pub fn flip_y(&mut self) -> &mut Self {
        self.pre_multiply(&Self::scaling(1.0, -1.0))
    }

    pub fn set(&mut self, m: &Matrix) -> &mut Self {
        *self = *m;
        self
    }

    #[inline]
    pub fn apply(&self, p: Point) -> Point {
        Point {
            x: self.a * p.x + self.c * p.y + self.e,
            y: self.b * p.x + self.d * p.y + self.f,
        }
    }

    /// Transform by the inverse. Fails on a singular matrix; the forward
    /// transform never fails.
    pub fn apply_inverse(&self, p: Point) -> Result<Point> {
        Ok(self.inverse()?.apply(p))
    }

    pub fn determinant(&self) -> f64 {
        self.a * self.d - self.b * self.c
    }

    pub fn inverse(&self) -> Result<Matrix> {
        let det = self.determinant();
        if det.abs() < EPSILON {
            return Err(Error::SingularMatrix);
        }
        let inv = 1.0 / det;
        let a = self.d * inv;
        let b = -self.b * inv;
        let c = -self.c * inv;
        let d = self.a * inv;
        Ok(Matrix {
            a,
            b,
            c,
            d,
            e: -(self.e * a + self.f * c),
            f: -(self.e * b + self.f * d),
        })
    }

    /// Average device scale of the linear part, used to size flattening
    /// tolerances in device pixels.
    pub fn scale_factor(&self) -> f64 {
        let x = std::f64::consts::FRAC_1_SQRT_2 * (self.a + self.c);
        let y = std::f64::consts::FRAC_1_SQRT_2 * (self.b + self.d);
        (x * x + y * y).sqrt()
    }

    pub fn is_identity(&self) -> bool {
        self.approx_eq(&Self::identity(), EPSILON)
    }

    pub fn approx_eq(&self, m: &Matrix, eps: f64) -> bool {
        (self.a - m.a).abs() < eps
            && (self.b - m.b).abs() < eps
            && (self.c - m.c).abs() < eps
            && (self.d - m.d).abs() < eps
            && (self.e - m.e).abs() < eps
            && (self.f - m.f).abs() < eps
    }
}

impl Default for Matrix {
    fn default() -> Self {
        Self::identity()
    }
}
