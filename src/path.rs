//! Path store: an ordered sequence of typed drawing verbs.
//!
//! A `Path` only records geometry; flattening and rasterization read it
//! without mutating, so one path can be drawn any number of times.

use crate::basics::Point;
use crate::error::{Error, Result};

/// One drawing verb with its control points, in path space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Verb {
    MoveTo(Point),
    LineTo(Point),
    /// Quadratic Bezier: control point, endpoint.
    QuadTo(Point, Point),
    /// Cubic Bezier: two control points, endpoint.
    CubicTo(Point, Point, Point),
    /// SVG endpoint-parameterized elliptical arc.
    ArcTo {
        rx: f64,
        ry: f64,
        /// Ellipse x-axis rotation, radians.
        rotation: f64,
        large_arc: bool,
        sweep: bool,
        end: Point,
    },
    Close,
}

/// Ordered verb sequence with current-point tracking.
#[derive(Debug, Clone, Default)]
pub struct Path {
    verbs: Vec<Verb>,
    current: Option<Point>,
    subpath_start: Option<Point>,
}

impl Path {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn verbs(&self) -> &[Verb] {
        &self.verbs
    }

    pub fn len(&self) -> usize {
        self.verbs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.verbs.is_empty()
    }

    /// The endpoint of the last verb, if any subpath is open.
    pub fn last_point(&self) -> Option<Point> {
        self.current
    }

    pub fn clear(&mut self) {
        self.verbs.clear();
        self.current = None;
        self.subpath_start = None;
    }

    pub fn move_to(&mut self, x: f64, y: f64) {
        let p = Point::new(x, y);
        self.verbs.push(Verb::MoveTo(p));
        self.current = Some(p);
        self.subpath_start = Some(p);
    }

    fn require_current(&self) -> Result<Point> {
        self.current.ok_or(Error::NoCurrentPoint)
    }

    pub fn line_to(&mut self, x: f64, y: f64) -> Result<()> {
        self.require_current()?;
        let p = Point::new(x, y);
        self.verbs.push(Verb::LineTo(p));
        self.current = Some(p);
        Ok(())
    }

    pub fn quad_to(&mut self, cx: f64, cy: f64, x: f64, y: f64) -> Result<()> {
        self.require_current()?;
        let p = Point::new(x, y);
        self.verbs.push(Verb::QuadTo(Point::new(cx, cy), p));
        self.current = Some(p);
        Ok(())
    }

    #[allow(clippy::too_many_arguments)]
    pub fn cubic_to(&mut self, c1x: f64, c1y: f64, c2x: f64, c2y: f64, x: f64, y: f64) -> Result<()> {
        self.require_current()?;
        let p = Point::new(x, y);
        self.verbs
            .push(Verb::CubicTo(Point::new(c1x, c1y), Point::new(c2x, c2y), p));
        self.current = Some(p);
        Ok(())
    }

    #[allow(clippy::too_many_arguments)]
    pub fn arc_to(
        &mut self,
        rx: f64,
        ry: f64,
        rotation: f64,
        large_arc: bool,
        sweep: bool,
        x: f64,
        y: f64,
    ) -> Result<()> {
        self.require_current()?;
        let end = Point::new(x, y);
        self.verbs.push(Verb::ArcTo {
            rx,
            ry,
            rotation,
            large_arc,
            sweep,
            end,
        });
        self.current = Some(end);
        Ok(())
    }

    /// Mark the current subpath closed. The current point returns to the
    /// subpath start. A close with no open subpath is a no-op.
    pub fn close(&mut self) {
        if self.current.is_some() {
            self.verbs.push(Verb::Close);
            self.current = self.subpath_start;
        }
    }

    // Relative variants, offsets from the current point.

    pub fn line_rel(&mut self, dx: f64, dy: f64) -> Result<()> {
        let p = self.require_current()?;
        self.line_to(p.x + dx, p.y + dy)
    }

    pub fn quad_rel(&mut self, dcx: f64, dcy: f64, dx: f64, dy: f64) -> Result<()> {
        let p = self.require_current()?;
        self.quad_to(p.x + dcx, p.y + dcy, p.x + dx, p.y + dy)
    }

    pub fn move_rel(&mut self, dx: f64, dy: f64) -> Result<()> {
        let p = self.require_current()?;
        self.move_to(p.x + dx, p.y + dy);
        Ok(())
    }

    /// Append an axis-aligned rectangle as a closed subpath.
    pub fn rect(&mut self, x: f64, y: f64, w: f64, h: f64) {
        self.move_to(x, y);
        // line_to cannot fail after a move_to
        let _ = self.line_to(x + w, y);
        let _ = self.line_to(x + w, y + h);
        let _ = self.line_to(x, y + h);
        self.close();
    }

    /// Control-point bounding box (loose for curves and arcs).
    pub fn bounding_box(&self) -> Option<(Point, Point)> {
        let mut min = Point::new(f64::MAX, f64::MAX);
        let mut max = Point::new(f64::MIN, f64::MIN);
        let mut any = false;
        let mut grow = |p: &Point| {
            min.x = min.x.min(p.x);
            min.y = min.y.min(p.y);
            max.x = max.x.max(p.x);
            max.y = max.y.max(p.y);
            any = true;
        };
        for v in &self.verbs {
            match v {
                Verb::MoveTo(p) | Verb::LineTo(p) => grow(p),
                Verb::QuadTo(c, p) => {
                    grow(c);
                    grow(p);
                }
                Verb::CubicTo(c1, c2, p) => {
                    grow(c1);
                    grow(c2);
                    grow(p);
                }
                Verb::ArcTo { end, rx, ry, .. } => {
                    grow(end);
                    grow(&Point::new(end.x - rx.abs(), end.y - ry.abs()));
                    grow(&Point::new(end.x + rx.abs(), end.y + ry.abs()));
                }
                Verb::Close => {}
            }
        }
        any.then_some((min, max))
    }
}
