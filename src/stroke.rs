//! Stroke outline generation.
//!
//! Strokes are built from already flattened contours: each polyline is
//! offset by half the line width on both sides, with joins at interior
//! vertices and caps at the ends, and the resulting outline is filled
//! nonzero. Dashing splits the polyline before offsetting.

use crate::basics::{line_intersection, sq_distance, Point};
use crate::flatten::Contour;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LineCap {
    #[default]
    Butt,
    Square,
    Round,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LineJoin {
    #[default]
    Miter,
    Round,
    Bevel,
}

/// Full stroke description held by the drawing context.
#[derive(Debug, Clone, PartialEq)]
pub struct LineStyle {
    /// Stroke width in device pixels. Outlines are built after the
    /// transform is applied, so the context matrix does not scale it.
    pub width: f64,
    pub cap: LineCap,
    pub join: LineJoin,
    pub miter_limit: f64,
    /// Alternating on/off lengths in device pixels; empty strokes solid.
    pub dash: Vec<f64>,
    pub dash_offset: f64,
}

impl Default for LineStyle {
    fn default() -> Self {
        Self {
            width: 1.0,
            cap: LineCap::Butt,
            join: LineJoin::Miter,
            miter_limit: 4.0,
            dash: Vec::new(),
            dash_offset: 0.0,
        }
    }
}

/// Expands contours into stroke outlines.
#[derive(Debug)]
pub struct Stroker {
    half_width: f64,
    cap: LineCap,
    join: LineJoin,
    miter_limit: f64,
    dash: Vec<f64>,
    dash_offset: f64,
    tolerance: f64,
}

impl Stroker {
    pub fn new(style: &LineStyle, tolerance: f64) -> Self {
        Self {
            half_width: style.width / 2.0,
            cap: style.cap,
            join: style.join,
            miter_limit: style.miter_limit.max(1.0),
            dash: style.dash.clone(),
            dash_offset: style.dash_offset,
            tolerance: tolerance.max(1e-3),
        }
    }

    /// Outline every contour. The result is a set of closed polygons
    /// meant for nonzero filling.
    pub fn stroke_contours(&self, contours: &[Contour]) -> Vec<Contour> {
        let mut out = Vec::new();
        if self.half_width <= 0.0 {
            return out;
        }
        for c in contours {
            let pts = dedup(&c.points);
            if pts.len() < 2 {
                continue;
            }
            if self.dash_is_active() {
                for piece in self.dash_split(&pts, c.closed) {
                    if piece.len() >= 2 {
                        out.push(self.outline_open(&piece));
                    }
                }
            } else if c.closed {
                out.push(self.outline_ring(&pts, false));
                out.push(self.outline_ring(&pts, true));
            } else {
                out.push(self.outline_open(&pts));
            }
        }
        out
    }

    fn dash_is_active(&self) -> bool {
        !self.dash.is_empty() && self.dash.iter().any(|&d| d > 0.0)
    }

    // Walk the polyline against the repeating on/off pattern; collect
    // the "on" pieces as open polylines.
    fn dash_split(&self, pts: &[Point], closed: bool) -> Vec<Vec<Point>> {
        let mut path: Vec<Point> = pts.to_vec();
        if closed {
            path.push(pts[0]);
        }

        let total: f64 = self.dash.iter().sum();
        let mut phase = self.dash_offset.rem_euclid(total);
        let mut idx = 0;
        while phase >= self.dash[idx] {
            phase -= self.dash[idx];
            idx = (idx + 1) % self.dash.len();
        }
        let mut remaining = self.dash[idx] - phase;
        let mut drawing = idx % 2 == 0;

        let mut pieces = Vec::new();
        let mut piece: Vec<Point> = Vec::new();
        if drawing {
            piece.push(path[0]);
        }

        for w in path.windows(2) {
            let (a, b) = (w[0], w[1]);
            let mut seg_len = sq_distance(a.x, a.y, b.x, b.y).sqrt();
            if seg_len <= 0.0 {
                continue;
            }
            let dir = Point::new((b.x - a.x) / seg_len, (b.y - a.y) / seg_len);
            let mut pos = a;
            while seg_len > remaining {
                let cut = Point::new(pos.x + dir.x * remaining, pos.y + dir.y * remaining);
                if drawing {
                    piece.push(cut);
                    pieces.push(std::mem::take(&mut piece));
                }
                seg_len -= remaining;
                pos = cut;
                idx = (idx + 1) % self.dash.len();
                remaining = self.dash[idx];
                drawing = !drawing;
                if drawing {
                    piece.clear();
                    piece.push(cut);
                }
            }
            remaining -= seg_len;
            if drawing {
                piece.push(b);
            }
        }
        if drawing && piece.len() >= 2 {
            pieces.push(piece);
        }
        pieces
    }

    // One closed offset ring along one side of a closed polyline.
    // Reversing the input walks the other side with opposite winding,
    // which is what turns the pair into a fillable annulus.
    fn outline_ring(&self, pts: &[Point], reversed: bool) -> Contour {
        let mut order: Vec<Point> = pts.to_vec();
        if reversed {
            order.reverse();
        }
        let n = order.len();
        let mut out = Vec::new();
        for i in 0..n {
            let prev = order[(i + n - 1) % n];
            let v = order[i];
            let next = order[(i + 1) % n];
            self.join_at(&mut out, prev, v, next);
        }
        Contour {
            points: out,
            closed: true,
        }
    }

    // Single closed outline around an open polyline: down one side,
    // cap, back the other side, cap.
    fn outline_open(&self, pts: &[Point]) -> Contour {
        let mut out = Vec::new();
        self.offset_side(&mut out, pts);
        let last = pts[pts.len() - 1];
        let before_last = pts[pts.len() - 2];
        self.cap_at(&mut out, before_last, last);

        let rev: Vec<Point> = pts.iter().rev().copied().collect();
        self.offset_side(&mut out, &rev);
        self.cap_at(&mut out, rev[rev.len() - 2], rev[rev.len() - 1]);

        Contour {
            points: out,
            closed: true,
        }
    }

    fn offset_side(&self, out: &mut Vec<Point>, pts: &[Point]) {
        let n0 = normal(pts[0], pts[1], self.half_width);
        out.push(Point::new(pts[0].x + n0.x, pts[0].y + n0.y));
        for i in 1..pts.len() - 1 {
            self.join_at(out, pts[i - 1], pts[i], pts[i + 1]);
        }
        let last = pts[pts.len() - 1];
        let nl = normal(pts[pts.len() - 2], last, self.half_width);
        out.push(Point::new(last.x + nl.x, last.y + nl.y));
    }

    // Join geometry at vertex v between segments prev->v and v->next.
    fn join_at(&self, out: &mut Vec<Point>, prev: Point, v: Point, next: Point) {
        let na = normal(prev, v, self.half_width);
        let nb = normal(v, next, self.half_width);
        let pa = Point::new(v.x + na.x, v.y + na.y);
        let pb = Point::new(v.x + nb.x, v.y + nb.y);

        match self.join {
            LineJoin::Bevel => {
                out.push(pa);
                out.push(pb);
            }
            LineJoin::Miter => {
                // Intersection of the two offset lines; fall back to
                // bevel past the miter limit.
                if let Some((ix, iy)) = line_intersection(
                    prev.x + na.x,
                    prev.y + na.y,
                    pa.x,
                    pa.y,
                    pb.x,
                    pb.y,
                    next.x + nb.x,
                    next.y + nb.y,
                ) {
                    let d2 = sq_distance(v.x, v.y, ix, iy);
                    let lim = self.miter_limit * self.half_width;
                    if d2 <= lim * lim {
                        out.push(Point::new(ix, iy));
                        return;
                    }
                }
                out.push(pa);
                out.push(pb);
            }
            LineJoin::Round => {
                out.push(pa);
                self.round_arc(out, v, na.y.atan2(na.x), nb.y.atan2(nb.x));
                out.push(pb);
            }
        }
    }

    // Cap closing the outline across the end of the polyline at `v`,
    // approached from `prev`. The side walked next starts at v - n.
    fn cap_at(&self, out: &mut Vec<Point>, prev: Point, v: Point) {
        let n = normal(prev, v, self.half_width);
        match self.cap {
            LineCap::Butt => {}
            LineCap::Square => {
                // Extend along the direction by half the width.
                let len = sq_distance(prev.x, prev.y, v.x, v.y).sqrt();
                let d = Point::new(
                    (v.x - prev.x) / len * self.half_width,
                    (v.y - prev.y) / len * self.half_width,
                );
                out.push(Point::new(v.x + n.x + d.x, v.y + n.y + d.y));
                out.push(Point::new(v.x - n.x + d.x, v.y - n.y + d.y));
            }
            LineCap::Round => {
                let a1 = n.y.atan2(n.x);
                self.sweep_arc(out, v, a1, std::f64::consts::PI);
            }
        }
    }

    // Shortest arc from angle a1 to a2 around v at half_width radius.
    fn round_arc(&self, out: &mut Vec<Point>, v: Point, a1: f64, a2: f64) {
        let mut sweep = a2 - a1;
        while sweep > std::f64::consts::PI {
            sweep -= std::f64::consts::TAU;
        }
        while sweep < -std::f64::consts::PI {
            sweep += std::f64::consts::TAU;
        }
        self.sweep_arc(out, v, a1, sweep);
    }

    fn sweep_arc(&self, out: &mut Vec<Point>, v: Point, a1: f64, sweep: f64) {
        let r = self.half_width;
        let da = (r / (r + self.tolerance)).acos() * 2.0;
        let steps = (sweep.abs() / da).ceil().max(1.0) as usize;
        for i in 1..steps {
            let a = a1 + sweep * (i as f64 / steps as f64);
            out.push(Point::new(v.x + r * a.cos(), v.y + r * a.sin()));
        }
    }
}

// Perpendicular of the segment a->b scaled to `w`.
fn normal(a: Point, b: Point, w: f64) -> Point {
    let dx = b.x - a.x;
    let dy = b.y - a.y;
    let len = (dx * dx + dy * dy).sqrt();
    if len < 1e-12 {
        return Point::new(0.0, 0.0);
    }
    Point::new(dy / len * w, -dx / len * w)
}

// Drop zero-length segments.
fn dedup(pts: &[Point]) -> Vec<Point> {
    let mut out: Vec<Point> = Vec::with_capacity(pts.len());
    for &p in pts {
        if out.last().map_or(true, |&q| sq_distance(p.x, p.y, q.x, q.y) > 1e-20) {
            out.push(p);
        }
    }
    // A closed contour may repeat its first point at the end.
    if out.len() > 2 && out[0] == out[out.len() - 1] {
        out.pop();
    }
    out
}
