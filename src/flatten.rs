//! Curve and arc flattening.
//!
//! Converts a `Path` into device-space polylines. Control points are
//! transformed first, then Bezier segments are subdivided recursively
//! until the midpoint deviation drops under the tolerance, so the
//! flatness guarantee holds in device pixels regardless of the
//! transform's scale.

use crate::basics::{sq_distance, Point};
use crate::matrix::Matrix;
use crate::path::{Path, Verb};

const COLLINEARITY_EPSILON: f64 = 1e-30;
const RECURSION_LIMIT: u32 = 32;

/// Smallest tolerance accepted, in device pixels.
const MIN_TOLERANCE: f64 = 1e-3;

/// One flattened subpath in device space.
#[derive(Debug, Clone, Default)]
pub struct Contour {
    pub points: Vec<Point>,
    pub closed: bool,
}

impl Contour {
    pub fn is_degenerate(&self) -> bool {
        self.points.len() < 2
    }
}

/// Flattens paths to contours at a fixed device-space tolerance.
#[derive(Debug, Clone, Copy)]
pub struct Flattener {
    tolerance: f64,
    tolerance_sq: f64,
}

impl Default for Flattener {
    fn default() -> Self {
        Self::new(0.25)
    }
}

impl Flattener {
    pub fn new(tolerance: f64) -> Self {
        let t = tolerance.max(MIN_TOLERANCE);
        Self {
            tolerance: t,
            tolerance_sq: t * t,
        }
    }

    pub fn tolerance(&self) -> f64 {
        self.tolerance
    }

    /// Flatten `path` through `mtx` into device-space contours.
    /// Degenerate subpaths (fewer than two points) are dropped.
    pub fn flatten(&self, path: &Path, mtx: &Matrix) -> Vec<Contour> {
        let mut out: Vec<Contour> = Vec::new();
        let mut cur = Contour::default();
        // Untransformed endpoint of the previous verb, needed by arcs.
        let mut last = Point::default();
        // Untransformed start of the current subpath.
        let mut start = Point::default();

        let mut flush = |cur: &mut Contour, out: &mut Vec<Contour>| {
            if !cur.is_degenerate() {
                out.push(std::mem::take(cur));
            } else {
                cur.points.clear();
                cur.closed = false;
            }
        };

        for verb in path.verbs() {
            match *verb {
                Verb::MoveTo(p) => {
                    flush(&mut cur, &mut out);
                    cur.points.push(mtx.apply(p));
                    last = p;
                    start = p;
                }
                Verb::LineTo(p) => {
                    cur.points.push(mtx.apply(p));
                    last = p;
                }
                Verb::QuadTo(c, p) => {
                    let p1 = mtx.apply(last);
                    let p2 = mtx.apply(c);
                    let p3 = mtx.apply(p);
                    self.quad(&mut cur.points, p1, p2, p3, 0);
                    cur.points.push(p3);
                    last = p;
                }
                Verb::CubicTo(c1, c2, p) => {
                    let p1 = mtx.apply(last);
                    let p2 = mtx.apply(c1);
                    let p3 = mtx.apply(c2);
                    let p4 = mtx.apply(p);
                    self.cubic(&mut cur.points, p1, p2, p3, p4, 0);
                    cur.points.push(p4);
                    last = p;
                }
                Verb::ArcTo {
                    rx,
                    ry,
                    rotation,
                    large_arc,
                    sweep,
                    end,
                } => {
                    self.arc(
                        &mut cur.points,
                        last,
                        rx,
                        ry,
                        rotation,
                        large_arc,
                        sweep,
                        end,
                        mtx,
                    );
                    last = end;
                }
                Verb::Close => {
                    cur.closed = true;
                    flush(&mut cur, &mut out);
                    // The close moves the pen back to the subpath start,
                    // so an implicit continuation begins there.
                    cur.points.push(mtx.apply(start));
                    last = start;
                }
            }
        }
        flush(&mut cur, &mut out);
        out
    }

    // Recursive midpoint subdivision. Pushes interior points only; the
    // caller appends the final endpoint once.
    fn quad(&self, out: &mut Vec<Point>, p1: Point, p2: Point, p3: Point, level: u32) {
        if level > RECURSION_LIMIT {
            return;
        }

        let x12 = (p1.x + p2.x) / 2.0;
        let y12 = (p1.y + p2.y) / 2.0;
        let x23 = (p2.x + p3.x) / 2.0;
        let y23 = (p2.y + p3.y) / 2.0;
        let x123 = (x12 + x23) / 2.0;
        let y123 = (y12 + y23) / 2.0;

        let dx = p3.x - p1.x;
        let dy = p3.y - p1.y;
        let d = ((p2.x - p3.x) * dy - (p2.y - p3.y) * dx).abs();

        if d > COLLINEARITY_EPSILON {
            if d * d <= self.tolerance_sq * (dx * dx + dy * dy) {
                out.push(Point::new(x123, y123));
                return;
            }
        } else {
            // Collinear control point: measure its distance to the chord.
            let da = dx * dx + dy * dy;
            let dist = if da == 0.0 {
                sq_distance(p1.x, p1.y, p2.x, p2.y)
            } else {
                let t = ((p2.x - p1.x) * dx + (p2.y - p1.y) * dy) / da;
                if t > 0.0 && t < 1.0 {
                    // Control point lies on the chord, nothing to refine.
                    return;
                }
                if t <= 0.0 {
                    sq_distance(p2.x, p2.y, p1.x, p1.y)
                } else {
                    sq_distance(p2.x, p2.y, p3.x, p3.y)
                }
            };
            if dist < self.tolerance_sq {
                out.push(p2);
                return;
            }
        }

        let mid = Point::new(x123, y123);
        self.quad(out, p1, Point::new(x12, y12), mid, level + 1);
        self.quad(out, mid, Point::new(x23, y23), p3, level + 1);
    }

    fn cubic(&self, out: &mut Vec<Point>, p1: Point, p2: Point, p3: Point, p4: Point, level: u32) {
        if level > RECURSION_LIMIT {
            return;
        }

        let x12 = (p1.x + p2.x) / 2.0;
        let y12 = (p1.y + p2.y) / 2.0;
        let x23 = (p2.x + p3.x) / 2.0;
        let y23 = (p2.y + p3.y) / 2.0;
        let x34 = (p3.x + p4.x) / 2.0;
        let y34 = (p3.y + p4.y) / 2.0;
        let x123 = (x12 + x23) / 2.0;
        let y123 = (y12 + y23) / 2.0;
        let x234 = (x23 + x34) / 2.0;
        let y234 = (y23 + y34) / 2.0;
        let x1234 = (x123 + x234) / 2.0;
        let y1234 = (y123 + y234) / 2.0;

        let dx = p4.x - p1.x;
        let dy = p4.y - p1.y;
        let d2 = ((p2.x - p4.x) * dy - (p2.y - p4.y) * dx).abs();
        let d3 = ((p3.x - p4.x) * dy - (p3.y - p4.y) * dx).abs();

        let case = ((d2 > COLLINEARITY_EPSILON) as u32) << 1 | (d3 > COLLINEARITY_EPSILON) as u32;
        match case {
            0 => {
                // Both control points collinear with the chord.
                let k = dx * dx + dy * dy;
                if k == 0.0 {
                    let d2 = sq_distance(p1.x, p1.y, p2.x, p2.y);
                    let d3 = sq_distance(p4.x, p4.y, p3.x, p3.y);
                    if d2 < self.tolerance_sq && d3 < self.tolerance_sq {
                        out.push(Point::new(x1234, y1234));
                        return;
                    }
                } else {
                    let k = 1.0 / k;
                    let da1 = p2.x - p1.x;
                    let da2 = p2.y - p1.y;
                    let db1 = p3.x - p1.x;
                    let db2 = p3.y - p1.y;
                    let t2 = (da1 * dx + da2 * dy) * k;
                    let t3 = (db1 * dx + db2 * dy) * k;
                    if t2 > 0.0 && t2 < 1.0 && t3 > 0.0 && t3 < 1.0 {
                        return;
                    }
                    let d2 = seg_distance_sq(p2, p1, p4, t2, dx, dy);
                    let d3 = seg_distance_sq(p3, p1, p4, t3, dx, dy);
                    if d2.max(d3) < self.tolerance_sq {
                        out.push(Point::new(x1234, y1234));
                        return;
                    }
                }
            }
            1 => {
                // Only p2 collinear.
                if d3 * d3 <= self.tolerance_sq * (dx * dx + dy * dy) {
                    out.push(Point::new(x23, y23));
                    return;
                }
            }
            2 => {
                // Only p3 collinear.
                if d2 * d2 <= self.tolerance_sq * (dx * dx + dy * dy) {
                    out.push(Point::new(x23, y23));
                    return;
                }
            }
            _ => {
                let d = d2 + d3;
                if d * d <= self.tolerance_sq * (dx * dx + dy * dy) {
                    out.push(Point::new(x23, y23));
                    return;
                }
            }
        }

        self.cubic(
            out,
            p1,
            Point::new(x12, y12),
            Point::new(x123, y123),
            Point::new(x1234, y1234),
            level + 1,
        );
        self.cubic(
            out,
            Point::new(x1234, y1234),
            Point::new(x234, y234),
            Point::new(x34, y34),
            p4,
            level + 1,
        );
    }

    /// SVG endpoint-parameterized elliptical arc. The center
    /// parameterization is computed in path space, then sampled at an
    /// angular step sized for the transformed radius, so large arcs
    /// stay smooth under magnification.
    #[allow(clippy::too_many_arguments)]
    fn arc(
        &self,
        out: &mut Vec<Point>,
        from: Point,
        rx: f64,
        ry: f64,
        rotation: f64,
        large_arc: bool,
        sweep: bool,
        to: Point,
        mtx: &Matrix,
    ) {
        // Degenerate by the SVG rules: same endpoints draw nothing,
        // a zero radius collapses to a straight line.
        if from == to {
            return;
        }
        let mut rx = rx.abs();
        let mut ry = ry.abs();
        if rx < 1e-12 || ry < 1e-12 {
            out.push(mtx.apply(to));
            return;
        }

        let (sin_a, cos_a) = rotation.sin_cos();

        // Midpoint in the rotated frame.
        let dx2 = (from.x - to.x) / 2.0;
        let dy2 = (from.y - to.y) / 2.0;
        let x1 = cos_a * dx2 + sin_a * dy2;
        let y1 = -sin_a * dx2 + cos_a * dy2;

        // Scale radii up if they cannot span the endpoints.
        let px1 = x1 * x1;
        let py1 = y1 * y1;
        let radii_check = px1 / (rx * rx) + py1 / (ry * ry);
        if radii_check > 1.0 {
            let s = radii_check.sqrt();
            rx *= s;
            ry *= s;
        }
        let prx = rx * rx;
        let pry = ry * ry;

        // Center in the rotated frame.
        let sign = if large_arc == sweep { -1.0 } else { 1.0 };
        let sq = (prx * pry - prx * py1 - pry * px1) / (prx * py1 + pry * px1);
        let coef = sign * sq.max(0.0).sqrt();
        let cx1 = coef * (rx * y1 / ry);
        let cy1 = coef * -(ry * x1 / rx);

        let cx = (from.x + to.x) / 2.0 + cos_a * cx1 - sin_a * cy1;
        let cy = (from.y + to.y) / 2.0 + sin_a * cx1 + cos_a * cy1;

        // Start angle and sweep.
        let ux = (x1 - cx1) / rx;
        let uy = (y1 - cy1) / ry;
        let vx = (-x1 - cx1) / rx;
        let vy = (-y1 - cy1) / ry;

        let n = (ux * ux + uy * uy).sqrt();
        let sign = if uy < 0.0 { -1.0 } else { 1.0 };
        let start_angle = sign * (ux / n).clamp(-1.0, 1.0).acos();

        let n = ((ux * ux + uy * uy) * (vx * vx + vy * vy)).sqrt();
        let p = ux * vx + uy * vy;
        let sign = if ux * vy - uy * vx < 0.0 { -1.0 } else { 1.0 };
        let mut sweep_angle = sign * (p / n).clamp(-1.0, 1.0).acos();
        if !sweep && sweep_angle > 0.0 {
            sweep_angle -= std::f64::consts::TAU;
        } else if sweep && sweep_angle < 0.0 {
            sweep_angle += std::f64::consts::TAU;
        }

        // Angular step for the device-space radius.
        let scale = mtx.scale_factor().max(1e-6);
        let ra = (rx + ry) / 2.0 * scale;
        let da = (ra / (ra + self.tolerance)).acos() * 2.0;
        let steps = (sweep_angle.abs() / da).ceil().max(1.0) as usize;

        for i in 1..steps {
            let angle = start_angle + sweep_angle * (i as f64 / steps as f64);
            let (s, c) = angle.sin_cos();
            let ex = rx * c;
            let ey = ry * s;
            out.push(mtx.apply(Point::new(
                cx + cos_a * ex - sin_a * ey,
                cy + sin_a * ex + cos_a * ey,
            )));
        }
        // Endpoint pinned exactly.
        out.push(mtx.apply(to));
    }
}

// Distance from a control point to the chord, squared, with the
// projection parameter already known.
fn seg_distance_sq(p: Point, a: Point, b: Point, t: f64, dx: f64, dy: f64) -> f64 {
    if t <= 0.0 {
        sq_distance(p.x, p.y, a.x, a.y)
    } else if t >= 1.0 {
        sq_distance(p.x, p.y, b.x, b.y)
    } else {
        sq_distance(p.x, p.y, a.x + t * dx, a.y + t * dy)
    }
}
