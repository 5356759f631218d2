//! 8-bit RGBA color and the fixed-point blend arithmetic used by the
//! compositor and gradient engine.

use crate::basics::uround;

/// RGBA color with u8 components, non-premultiplied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rgba8 {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba8 {
    pub const BASE_SHIFT: u32 = 8;
    pub const BASE_SCALE: u32 = 1 << Self::BASE_SHIFT;
    pub const BASE_MASK: u32 = Self::BASE_SCALE - 1;
    pub const BASE_MSB: u32 = 1 << (Self::BASE_SHIFT - 1);

    pub const TRANSPARENT: Rgba8 = Rgba8 {
        r: 0,
        g: 0,
        b: 0,
        a: 0,
    };

    pub fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub fn opaque(r: u8, g: u8, b: u8) -> Self {
        Self::new(r, g, b, 255)
    }

    /// Build from floating-point components in 0..=1.
    pub fn from_f64(r: f64, g: f64, b: f64, a: f64) -> Self {
        let q = |v: f64| uround(v.clamp(0.0, 1.0) * Self::BASE_MASK as f64) as u8;
        Self::new(q(r), q(g), q(b), q(a))
    }

    pub fn is_transparent(&self) -> bool {
        self.a == 0
    }

    pub fn is_opaque(&self) -> bool {
        self.a as u32 == Self::BASE_MASK
    }

    /// Fixed-point multiply, exact over u8: `round(a * b / 255)`.
    #[inline]
    pub fn multiply(a: u8, b: u8) -> u8 {
        let t: u32 = a as u32 * b as u32 + Self::BASE_MSB;
        (((t >> Self::BASE_SHIFT) + t) >> Self::BASE_SHIFT) as u8
    }

    /// Multiply a channel by a coverage value.
    #[inline]
    pub fn mult_cover(a: u8, cover: u8) -> u8 {
        Self::multiply(a, cover)
    }

    /// Interpolate p toward q by a.
    #[inline]
    pub fn lerp(p: u8, q: u8, a: u8) -> u8 {
        let t = (q as i32 - p as i32) * a as i32 + Self::BASE_MSB as i32 - (p > q) as i32;
        (p as i32 + (((t >> Self::BASE_SHIFT) + t) >> Self::BASE_SHIFT)) as u8
    }

    /// Interpolate p toward q by a, assuming q is premultiplied by a.
    #[inline]
    pub fn prelerp(p: u8, q: u8, a: u8) -> u8 {
        p.wrapping_add(q).wrapping_sub(Self::multiply(p, a))
    }

    /// Premultiplied copy of the color.
    pub fn premultiplied(&self) -> Self {
        if self.is_opaque() {
            *self
        } else if self.a == 0 {
            Self::TRANSPARENT
        } else {
            Self {
                r: Self::multiply(self.r, self.a),
                g: Self::multiply(self.g, self.a),
                b: Self::multiply(self.b, self.a),
                a: self.a,
            }
        }
    }

    /// Undo premultiplication.
    pub fn demultiplied(&self) -> Self {
        if self.a as u32 >= Self::BASE_MASK || self.a == 0 {
            return *self;
        }
        let d = |v: u8| {
            ((v as u32 * Self::BASE_MASK) / self.a as u32).min(Self::BASE_MASK) as u8
        };
        Self {
            r: d(self.r),
            g: d(self.g),
            b: d(self.b),
            a: self.a,
        }
    }

    /// Interpolate between `self` and `c` by parameter `k` in 0..=1.
    pub fn gradient(&self, c: &Rgba8, k: f64) -> Rgba8 {
        let ik = uround(k * Self::BASE_MASK as f64) as u8;
        Rgba8 {
            r: Self::lerp(self.r, c.r, ik),
            g: Self::lerp(self.g, c.g, ik),
            b: Self::lerp(self.b, c.b, ik),
            a: Self::lerp(self.a, c.a, ik),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_multiply_identities() {
        assert_eq!(Rgba8::multiply(255, 255), 255);
        assert_eq!(Rgba8::multiply(128, 255), 128);
        assert_eq!(Rgba8::multiply(0, 255), 0);
        assert_eq!(Rgba8::multiply(255, 0), 0);
    }

    #[test]
    fn test_lerp_endpoints() {
        assert_eq!(Rgba8::lerp(10, 200, 0), 10);
        assert_eq!(Rgba8::lerp(10, 200, 255), 200);
        assert_eq!(Rgba8::lerp(200, 10, 255), 10);
    }

    #[test]
    fn test_lerp_midpoint() {
        let m = Rgba8::lerp(0, 200, 128);
        assert!((m as i32 - 100).abs() <= 1, "midpoint lerp got {m}");
    }

    #[test]
    fn test_prelerp_full_alpha_replaces() {
        // q premultiplied with a=255 is q itself; p + q - p = q
        assert_eq!(Rgba8::prelerp(37, 200, 255), 200);
    }

    #[test]
    fn test_premultiply_roundtrip() {
        let c = Rgba8::new(200, 100, 50, 128);
        let p = c.premultiplied();
        assert!(p.r <= c.r && p.g <= c.g && p.b <= c.b);
        let d = p.demultiplied();
        assert!((d.r as i32 - c.r as i32).abs() <= 2);
        assert!((d.g as i32 - c.g as i32).abs() <= 2);
        assert!((d.b as i32 - c.b as i32).abs() <= 2);
    }

    #[test]
    fn test_gradient_endpoints() {
        let a = Rgba8::opaque(255, 0, 0);
        let b = Rgba8::opaque(0, 0, 255);
        assert_eq!(a.gradient(&b, 0.0), a);
        assert_eq!(a.gradient(&b, 1.0), b);
    }

    #[test]
    fn test_from_f64_clamps() {
        let c = Rgba8::from_f64(2.0, -1.0, 0.5, 1.0);
        assert_eq!(c.r, 255);
        assert_eq!(c.g, 0);
        assert_eq!(c.a, 255);
    }
}
