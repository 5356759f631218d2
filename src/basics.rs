//! Foundation types and constants shared by the whole pipeline.

/// Round a double to the nearest integer (round half away from zero).
#[inline]
pub fn iround(v: f64) -> i32 {
    if v < 0.0 {
        (v - 0.5) as i32
    } else {
        (v + 0.5) as i32
    }
}

/// Round a non-negative double to the nearest unsigned integer.
#[inline]
pub fn uround(v: f64) -> u32 {
    (v + 0.5) as u32
}

// ============================================================================
// Coverage constants
// ============================================================================

pub const COVER_SHIFT: u32 = 8;
pub const COVER_SIZE: u32 = 1 << COVER_SHIFT;
pub const COVER_MASK: u32 = COVER_SIZE - 1;
pub const COVER_FULL: u8 = COVER_MASK as u8;

// ============================================================================
// Sub-pixel constants
// ============================================================================

/// Fractional bits per axis for rasterizer coordinates (24.8 fixed point).
/// With 8 fractional bits and 32-bit integers, coordinate capacity is 24 bits.
pub const SUBPIXEL_SHIFT: u32 = 8;
pub const SUBPIXEL_SCALE: u32 = 1 << SUBPIXEL_SHIFT;
pub const SUBPIXEL_MASK: u32 = SUBPIXEL_SCALE - 1;

/// Convert a device-space coordinate to 24.8 fixed point.
#[inline]
pub fn to_subpixel(v: f64) -> i32 {
    iround(v * SUBPIXEL_SCALE as f64)
}

// ============================================================================
// Fill rule
// ============================================================================

/// Winding rule for polygon interiors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FillRule {
    #[default]
    NonZero,
    EvenOdd,
}

// ============================================================================
// Point
// ============================================================================

/// A 2D point in double precision.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    #[inline]
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Squared distance between two points.
#[inline]
pub fn sq_distance(x1: f64, y1: f64, x2: f64, y2: f64) -> f64 {
    let dx = x2 - x1;
    let dy = y2 - y1;
    dx * dx + dy * dy
}

/// Cross product of (p2-p1) x (p-p2); sign gives turn direction.
#[inline]
pub fn cross_product(x1: f64, y1: f64, x2: f64, y2: f64, x: f64, y: f64) -> f64 {
    (x - x2) * (y2 - y1) - (y - y2) * (x2 - x1)
}

/// Intersection of two infinite lines (a,b) and (c,d), if not parallel.
pub fn line_intersection(
    ax: f64,
    ay: f64,
    bx: f64,
    by: f64,
    cx: f64,
    cy: f64,
    dx: f64,
    dy: f64,
) -> Option<(f64, f64)> {
    let num = (ay - cy) * (dx - cx) - (ax - cx) * (dy - cy);
    let den = (bx - ax) * (dy - cy) - (by - ay) * (dx - cx);
    if den.abs() < 1e-30 {
        return None;
    }
    let r = num / den;
    Some((ax + r * (bx - ax), ay + r * (by - ay)))
}

// ============================================================================
// Integer rectangle
// ============================================================================

/// An inclusive integer rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RectI {
    pub x1: i32,
    pub y1: i32,
    pub x2: i32,
    pub y2: i32,
}

impl RectI {
    pub fn new(x1: i32, y1: i32, x2: i32, y2: i32) -> Self {
        Self { x1, y1, x2, y2 }
    }

    pub fn is_valid(&self) -> bool {
        self.x1 <= self.x2 && self.y1 <= self.y2
    }

    /// Clip to the intersection with `r`; returns `false` if empty.
    pub fn clip(&mut self, r: &Self) -> bool {
        if self.x2 > r.x2 {
            self.x2 = r.x2;
        }
        if self.y2 > r.y2 {
            self.y2 = r.y2;
        }
        if self.x1 < r.x1 {
            self.x1 = r.x1;
        }
        if self.y1 < r.y1 {
            self.y1 = r.y1;
        }
        self.is_valid()
    }

    pub fn hit_test(&self, x: i32, y: i32) -> bool {
        x >= self.x1 && x <= self.x2 && y >= self.y1 && y <= self.y2
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_iround() {
        assert_eq!(iround(0.5), 1);
        assert_eq!(iround(0.49), 0);
        assert_eq!(iround(-0.5), -1);
        assert_eq!(iround(-0.49), 0);
        assert_eq!(iround(0.0), 0);
    }

    #[test]
    fn test_uround() {
        assert_eq!(uround(0.5), 1);
        assert_eq!(uround(0.49), 0);
        assert_eq!(uround(1.5), 2);
    }

    #[test]
    fn test_to_subpixel() {
        assert_eq!(to_subpixel(0.0), 0);
        assert_eq!(to_subpixel(1.0), SUBPIXEL_SCALE as i32);
        assert_eq!(to_subpixel(-1.0), -(SUBPIXEL_SCALE as i32));
        assert_eq!(to_subpixel(0.5), 128);
    }

    #[test]
    fn test_subpixel_constants() {
        assert_eq!(SUBPIXEL_SHIFT, 8);
        assert_eq!(SUBPIXEL_SCALE, 256);
        assert_eq!(SUBPIXEL_MASK, 255);
        assert_eq!(COVER_FULL, 255);
    }

    #[test]
    fn test_rect_clip() {
        let mut r = RectI::new(10, 20, 100, 200);
        assert!(r.clip(&RectI::new(50, 50, 80, 80)));
        assert_eq!(r, RectI::new(50, 50, 80, 80));

        let mut r = RectI::new(0, 0, 10, 10);
        assert!(!r.clip(&RectI::new(20, 20, 30, 30)));
    }

    #[test]
    fn test_rect_hit_test() {
        let r = RectI::new(10, 20, 30, 40);
        assert!(r.hit_test(10, 20));
        assert!(r.hit_test(30, 40));
        assert!(!r.hit_test(31, 40));
    }

    #[test]
    fn test_line_intersection() {
        let p = line_intersection(0.0, 0.0, 10.0, 10.0, 0.0, 10.0, 10.0, 0.0);
        let (x, y) = p.expect("lines cross");
        assert!((x - 5.0).abs() < 1e-9);
        assert!((y - 5.0).abs() < 1e-9);

        // Parallel lines
        assert!(line_intersection(0.0, 0.0, 10.0, 0.0, 0.0, 1.0, 10.0, 1.0).is_none());
    }

    #[test]
    fn test_cross_product_sign() {
        // Left turn is positive going counter-clockwise
        let left = cross_product(0.0, 0.0, 10.0, 0.0, 10.0, 10.0);
        let right = cross_product(0.0, 0.0, 10.0, 0.0, 10.0, -10.0);
        assert!(left * right < 0.0);
    }
}
