//! Gradient paints: linear and radial color ramps evaluated per pixel.
//!
//! A gradient captures the inverse of the draw transform when it is
//! built, so pixel centers map back into the space the geometry was
//! specified in. Color between stops interpolates in premultiplied
//! RGBA so translucent stops do not bleed darkened fringes.

use crate::basics::Point;
use crate::color::Rgba8;
use crate::error::{Error, Result};
use crate::matrix::Matrix;

/// How the ramp extends outside the 0..=1 parameter range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Spread {
    #[default]
    Pad,
    Repeat,
    Reflect,
}

/// A color stop at a normalized offset.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GradientStop {
    pub offset: f64,
    pub color: Rgba8,
}

impl GradientStop {
    pub fn new(offset: f64, color: Rgba8) -> Self {
        Self { offset, color }
    }
}

#[derive(Debug, Clone)]
enum Kind {
    Linear {
        origin: Point,
        // Axis direction pre-divided by its squared length, so the
        // parameter is a single dot product.
        axis: Point,
    },
    Radial {
        center: Point,
        radius: f64,
        // Focus relative to the center; zero for a plain radial.
        focus: Point,
        // r / (r^2 - |focus|^2), precomputed.
        mul: f64,
    },
}

/// A fully specified gradient paint.
#[derive(Debug, Clone)]
pub struct Gradient {
    kind: Kind,
    stops: Vec<GradientStop>,
    spread: Spread,
    inverse: Matrix,
}

impl Gradient {
    /// Linear ramp along the segment (x1, y1) -> (x2, y2), in the
    /// coordinate space `mtx` draws from.
    pub fn linear(
        x1: f64,
        y1: f64,
        x2: f64,
        y2: f64,
        stops: Vec<GradientStop>,
        spread: Spread,
        mtx: &Matrix,
    ) -> Result<Self> {
        let dx = x2 - x1;
        let dy = y2 - y1;
        let len2 = dx * dx + dy * dy;
        if len2 < 1e-24 {
            return Err(Error::InvalidState("degenerate gradient axis"));
        }
        Ok(Self {
            kind: Kind::Linear {
                origin: Point::new(x1, y1),
                axis: Point::new(dx / len2, dy / len2),
            },
            stops: normalize_stops(stops)?,
            spread,
            inverse: mtx.inverse()?,
        })
    }

    /// Radial ramp around (cx, cy) with radius `r`; the parameter is 0
    /// at the center and 1 on the circle.
    pub fn radial(
        cx: f64,
        cy: f64,
        r: f64,
        stops: Vec<GradientStop>,
        spread: Spread,
        mtx: &Matrix,
    ) -> Result<Self> {
        Self::radial_focus(cx, cy, r, cx, cy, stops, spread, mtx)
    }

    /// Radial ramp with a displaced focal point (fx, fy): the parameter
    /// is 0 at the focus and 1 where the ray from the focus through the
    /// pixel meets the circle.
    #[allow(clippy::too_many_arguments)]
    pub fn radial_focus(
        cx: f64,
        cy: f64,
        r: f64,
        fx: f64,
        fy: f64,
        stops: Vec<GradientStop>,
        spread: Spread,
        mtx: &Matrix,
    ) -> Result<Self> {
        if r <= 0.0 {
            return Err(Error::InvalidState("radial gradient radius must be positive"));
        }
        let mut fx = fx - cx;
        let mut fy = fy - cy;
        // A focus on or outside the circle makes the denominator
        // vanish; pull it just inside.
        let d = (fx * fx + fy * fy).sqrt();
        if d >= r * 0.999 {
            let s = r * 0.999 / d;
            fx *= s;
            fy *= s;
        }
        let mul = r / (r * r - (fx * fx + fy * fy));
        Ok(Self {
            kind: Kind::Radial {
                center: Point::new(cx, cy),
                radius: r,
                focus: Point::new(fx, fy),
                mul,
            },
            stops: normalize_stops(stops)?,
            spread,
            inverse: mtx.inverse()?,
        })
    }

    pub fn spread(&self) -> Spread {
        self.spread
    }

    /// Raw ramp parameter at a point in gradient space, before the
    /// spread is applied.
    fn raw_t(&self, p: Point) -> f64 {
        match &self.kind {
            Kind::Linear { origin, axis } => {
                (p.x - origin.x) * axis.x + (p.y - origin.y) * axis.y
            }
            Kind::Radial {
                center,
                radius,
                focus,
                mul,
            } => {
                let dx = p.x - center.x - focus.x;
                let dy = p.y - center.y - focus.y;
                let d2 = dx * focus.y - dy * focus.x;
                let d3 = radius * radius * (dx * dx + dy * dy) - d2 * d2;
                let val = (dx * focus.x + dy * focus.y + d3.abs().sqrt()) * mul;
                val / radius
            }
        }
    }

    fn spread_t(&self, t: f64) -> f64 {
        match self.spread {
            Spread::Pad => t.clamp(0.0, 1.0),
            Spread::Repeat => {
                let f = t.fract();
                if f < 0.0 {
                    f + 1.0
                } else {
                    f
                }
            }
            Spread::Reflect => {
                let mut u = t % 2.0;
                if u < 0.0 {
                    u += 2.0;
                }
                if u > 1.0 {
                    2.0 - u
                } else {
                    u
                }
            }
        }
    }

    /// Ramp color at a spread-applied parameter. Stops are few, so a
    /// linear scan beats building a lookup table per draw.
    fn color_at(&self, t: f64) -> Rgba8 {
        let stops = &self.stops;
        if t <= stops[0].offset {
            return stops[0].color;
        }
        let last = &stops[stops.len() - 1];
        if t >= last.offset {
            return last.color;
        }
        for w in stops.windows(2) {
            if t <= w[1].offset {
                let span = w[1].offset - w[0].offset;
                let k = if span > 0.0 { (t - w[0].offset) / span } else { 0.0 };
                // Interpolate premultiplied, hand back straight alpha.
                let p = w[0].color.premultiplied();
                let q = w[1].color.premultiplied();
                return p.gradient(&q, k).demultiplied();
            }
        }
        last.color
    }

    /// Fill `span` with colors for the pixel run starting at device
    /// pixel (x, y). Pixels sample at their centers.
    pub fn generate_span(&self, x: i32, y: i32, span: &mut [Rgba8]) {
        let yc = y as f64 + 0.5;
        for (i, out) in span.iter_mut().enumerate() {
            let p = self.inverse.apply(Point::new(x as f64 + i as f64 + 0.5, yc));
            *out = self.color_at(self.spread_t(self.raw_t(p)));
        }
    }

    /// Color at a single device pixel, mainly for tests and picking.
    pub fn color_at_pixel(&self, x: i32, y: i32) -> Rgba8 {
        let p = self
            .inverse
            .apply(Point::new(x as f64 + 0.5, y as f64 + 0.5));
        self.color_at(self.spread_t(self.raw_t(p)))
    }
}

// Clamp offsets into 0..=1 and sort; at least one stop is required.
fn normalize_stops(mut stops: Vec<GradientStop>) -> Result<Vec<GradientStop>> {
    if stops.is_empty() {
        return Err(Error::InvalidState("gradient needs at least one stop"));
    }
    for s in &mut stops {
        s.offset = s.offset.clamp(0.0, 1.0);
    }
    stops.sort_by(|a, b| a.offset.total_cmp(&b.offset));
    Ok(stops)
}
