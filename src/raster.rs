//! Anti-aliased scanline rasterizer.
//!
//! Device-space contours come in as f64 coordinates, get snapped to
//! 24.8 fixed point, and are decomposed into cells carrying signed
//! cover and area contributions. Sorting the cells by row and sweeping
//! them left to right yields per-pixel coverage without ever touching
//! pixels a polygon does not reach.

use crate::basics::{iround, uround, FillRule, SUBPIXEL_SCALE, SUBPIXEL_SHIFT};
use crate::flatten::Contour;
use crate::gamma::GammaFn;
use crate::span::Scanline;

const SHIFT: i64 = SUBPIXEL_SHIFT as i64;
const SCALE: i64 = SUBPIXEL_SCALE as i64;
const MASK: i64 = SCALE - 1;

const AA_SHIFT: i64 = 8;
const AA_SCALE: i64 = 1 << AA_SHIFT;
const AA_MASK: i64 = AA_SCALE - 1;
const AA_SCALE2: i64 = AA_SCALE * 2;
const AA_MASK2: i64 = AA_SCALE2 - 1;

// Horizontal spans longer than this are split at the midpoint so the
// delta/modulo arithmetic stays inside 64 bits.
const DX_LIMIT: i64 = 16384 << SHIFT;

#[derive(Debug, Clone, Copy)]
struct Cell {
    x: i32,
    y: i32,
    cover: i32,
    area: i32,
}

const CELL_NONE: Cell = Cell {
    x: i32::MAX,
    y: i32::MAX,
    cover: 0,
    area: 0,
};

/// Accumulates cells for all edges, then sorts them into rows.
#[derive(Debug)]
struct CellStore {
    cells: Vec<Cell>,
    curr: Cell,
    min_x: i64,
    min_y: i64,
    max_x: i64,
    max_y: i64,
    sorted: bool,
    sorted_cells: Vec<Cell>,
    row_starts: Vec<(u32, u32)>,
}

impl CellStore {
    fn new() -> Self {
        Self {
            cells: Vec::new(),
            curr: CELL_NONE,
            min_x: i64::MAX,
            min_y: i64::MAX,
            max_x: i64::MIN,
            max_y: i64::MIN,
            sorted: false,
            sorted_cells: Vec::new(),
            row_starts: Vec::new(),
        }
    }

    fn reset(&mut self) {
        self.cells.clear();
        self.sorted_cells.clear();
        self.row_starts.clear();
        self.curr = CELL_NONE;
        self.min_x = i64::MAX;
        self.min_y = i64::MAX;
        self.max_x = i64::MIN;
        self.max_y = i64::MIN;
        self.sorted = false;
    }

    fn is_empty(&self) -> bool {
        self.cells.is_empty() && (self.curr.cover == 0 && self.curr.area == 0)
    }

    #[inline]
    fn set_curr_cell(&mut self, x: i64, y: i64) {
        if self.curr.x != x as i32 || self.curr.y != y as i32 {
            if self.curr.cover != 0 || self.curr.area != 0 {
                self.cells.push(self.curr);
            }
            self.curr = Cell {
                x: x as i32,
                y: y as i32,
                cover: 0,
                area: 0,
            };
        }
    }

    // One row's worth of an edge: x1..x2 in subpixel units, y1..y2 the
    // subpixel offsets inside row ey.
    fn render_hline(&mut self, ey: i64, x1: i64, y1: i64, x2: i64, y2: i64) {
        let ex1 = x1 >> SHIFT;
        let ex2 = x2 >> SHIFT;
        let fx1 = x1 & MASK;
        let fx2 = x2 & MASK;

        // Horizontal line inside the row contributes nothing.
        if y1 == y2 {
            self.set_curr_cell(ex2, ey);
            return;
        }

        if ex1 == ex2 {
            let delta = y2 - y1;
            self.curr.cover += delta as i32;
            self.curr.area += ((fx1 + fx2) * delta) as i32;
            return;
        }

        // The edge crosses cell columns; run the delta/modulo walk.
        let mut p = (SCALE - fx1) * (y2 - y1);
        let mut first = SCALE;
        let mut incr = 1i64;
        let mut dx = x2 - x1;
        if dx < 0 {
            p = fx1 * (y2 - y1);
            first = 0;
            incr = -1;
            dx = -dx;
        }

        let mut delta = p / dx;
        let mut xmod = p % dx;
        if xmod < 0 {
            delta -= 1;
            xmod += dx;
        }

        self.curr.cover += delta as i32;
        self.curr.area += ((fx1 + first) * delta) as i32;

        let mut ex1 = ex1 + incr;
        self.set_curr_cell(ex1, ey);
        let mut y1 = y1 + delta;

        if ex1 != ex2 {
            p = SCALE * (y2 - y1 + delta);
            let mut lift = p / dx;
            let mut rem = p % dx;
            if rem < 0 {
                lift -= 1;
                rem += dx;
            }
            xmod -= dx;

            while ex1 != ex2 {
                delta = lift;
                xmod += rem;
                if xmod >= 0 {
                    xmod -= dx;
                    delta += 1;
                }
                self.curr.cover += delta as i32;
                self.curr.area += (SCALE * delta) as i32;
                y1 += delta;
                ex1 += incr;
                self.set_curr_cell(ex1, ey);
            }
        }
        let delta = y2 - y1;
        self.curr.cover += delta as i32;
        self.curr.area += ((fx2 + SCALE - first) * delta) as i32;
    }

    /// Rasterize one edge, subpixel endpoint coordinates.
    fn line(&mut self, x1: i64, y1: i64, x2: i64, y2: i64) {
        let dx = x2 - x1;
        if dx >= DX_LIMIT || dx <= -DX_LIMIT {
            let cx = (x1 + x2) >> 1;
            let cy = (y1 + y2) >> 1;
            self.line(x1, y1, cx, cy);
            self.line(cx, cy, x2, y2);
            return;
        }

        let dy = y2 - y1;
        let ex1 = x1 >> SHIFT;
        let ex2 = x2 >> SHIFT;
        let mut ey1 = y1 >> SHIFT;
        let ey2 = y2 >> SHIFT;
        let fy1 = y1 & MASK;
        let fy2 = y2 & MASK;

        self.min_x = self.min_x.min(ex1.min(ex2));
        self.max_x = self.max_x.max(ex1.max(ex2));
        self.min_y = self.min_y.min(ey1.min(ey2));
        self.max_y = self.max_y.max(ey1.max(ey2));

        self.set_curr_cell(ex1, ey1);

        if ey1 == ey2 {
            self.render_hline(ey1, x1, fy1, x2, fy2);
            return;
        }

        if dx == 0 {
            // Vertical edge: one cell per row, no hline walk needed.
            let ex = x1 >> SHIFT;
            let two_fx = (x1 - (ex << SHIFT)) << 1;
            let (first, incr) = if dy < 0 { (0, -1) } else { (SCALE, 1) };

            let mut delta = first - fy1;
            self.curr.cover += delta as i32;
            self.curr.area += (two_fx * delta) as i32;

            ey1 += incr;
            self.set_curr_cell(ex, ey1);

            delta = first + first - SCALE;
            let area = two_fx * delta;
            while ey1 != ey2 {
                self.curr.cover = delta as i32;
                self.curr.area = area as i32;
                ey1 += incr;
                self.set_curr_cell(ex, ey1);
            }
            let delta = fy2 - SCALE + first;
            self.curr.cover += delta as i32;
            self.curr.area += (two_fx * delta) as i32;
            return;
        }

        // The edge crosses rows; split it into per-row hlines.
        let (mut p, first, incr, dy_abs) = if dy < 0 {
            (fy1 * dx, 0i64, -1i64, -dy)
        } else {
            ((SCALE - fy1) * dx, SCALE, 1i64, dy)
        };

        let mut delta = p / dy_abs;
        let mut xmod = p % dy_abs;
        if xmod < 0 {
            delta -= 1;
            xmod += dy_abs;
        }

        let mut x_from = x1 + delta;
        self.render_hline(ey1, x1, fy1, x_from, first);

        ey1 += incr;
        self.set_curr_cell(x_from >> SHIFT, ey1);

        if ey1 != ey2 {
            p = SCALE * dx;
            let mut lift = p / dy_abs;
            let mut rem = p % dy_abs;
            if rem < 0 {
                lift -= 1;
                rem += dy_abs;
            }
            xmod -= dy_abs;

            while ey1 != ey2 {
                delta = lift;
                xmod += rem;
                if xmod >= 0 {
                    xmod -= dy_abs;
                    delta += 1;
                }
                let x_to = x_from + delta;
                self.render_hline(ey1, x_from, SCALE - first, x_to, first);
                x_from = x_to;
                ey1 += incr;
                self.set_curr_cell(x_from >> SHIFT, ey1);
            }
        }
        self.render_hline(ey1, x_from, SCALE - first, x2, fy2);
    }

    /// Three passes: count cells per row, compute row offsets, scatter
    /// and sort each row by x.
    fn sort(&mut self) {
        if self.sorted {
            return;
        }
        if self.curr.cover != 0 || self.curr.area != 0 {
            self.cells.push(self.curr);
            self.curr = CELL_NONE;
        }
        self.sorted = true;
        if self.cells.is_empty() {
            return;
        }

        let rows = (self.max_y - self.min_y + 1) as usize;
        let mut counts = vec![0u32; rows];
        for c in &self.cells {
            counts[(c.y as i64 - self.min_y) as usize] += 1;
        }

        self.row_starts.clear();
        self.row_starts.reserve(rows);
        let mut start = 0u32;
        for &n in &counts {
            self.row_starts.push((start, n));
            start += n;
        }

        self.sorted_cells.clear();
        self.sorted_cells.resize(self.cells.len(), CELL_NONE);
        let mut fill = counts;
        fill.iter_mut().zip(&self.row_starts).for_each(|(f, &(s, _))| *f = s);
        for c in &self.cells {
            let row = (c.y as i64 - self.min_y) as usize;
            self.sorted_cells[fill[row] as usize] = *c;
            fill[row] += 1;
        }
        for &(s, n) in &self.row_starts {
            self.sorted_cells[s as usize..(s + n) as usize].sort_unstable_by_key(|c| c.x);
        }
    }

    fn row(&self, y: i64) -> &[Cell] {
        let (s, n) = self.row_starts[(y - self.min_y) as usize];
        &self.sorted_cells[s as usize..(s + n) as usize]
    }
}

// ----------------------------------------------------------------------------
// Segment clipper
// ----------------------------------------------------------------------------

#[derive(Debug, Clone, Copy)]
struct ClipRect {
    x1: i64,
    y1: i64,
    x2: i64,
    y2: i64,
}

// Out-code bits: 1 right, 2 below, 4 left, 8 above.
#[inline]
fn clip_flags(x: i64, y: i64, c: &ClipRect) -> u32 {
    (x > c.x2) as u32 | (((y > c.y2) as u32) << 1) | (((x < c.x1) as u32) << 2) | (((y < c.y1) as u32) << 3)
}

#[inline]
fn clip_flags_y(y: i64, c: &ClipRect) -> u32 {
    (((y > c.y2) as u32) << 1) | (((y < c.y1) as u32) << 3)
}

#[inline]
fn mul_div(a: i64, b: i64, c: i64) -> i64 {
    iround(a as f64 * b as f64 / c as f64) as i64
}

/// Clips edges to a subpixel box before they reach the cells. Segments
/// outside vertically vanish; segments outside horizontally ride the
/// box edge so winding counts inside stay correct.
#[derive(Debug)]
struct Clipper {
    clip: Option<ClipRect>,
    x1: i64,
    y1: i64,
    f1: u32,
}

impl Clipper {
    fn new() -> Self {
        Self {
            clip: None,
            x1: 0,
            y1: 0,
            f1: 0,
        }
    }

    fn set_clip_box(&mut self, x1: i64, y1: i64, x2: i64, y2: i64) {
        self.clip = Some(ClipRect {
            x1: x1.min(x2),
            y1: y1.min(y2),
            x2: x1.max(x2),
            y2: y1.max(y2),
        });
    }

    fn move_to(&mut self, x: i64, y: i64) {
        self.x1 = x;
        self.y1 = y;
        if let Some(c) = &self.clip {
            self.f1 = clip_flags(x, y, c);
        }
    }

    fn line_to(&mut self, cells: &mut CellStore, x2: i64, y2: i64) {
        let Some(c) = self.clip else {
            cells.line(self.x1, self.y1, x2, y2);
            self.x1 = x2;
            self.y1 = y2;
            return;
        };

        let f2 = clip_flags(x2, y2, &c);
        // Both endpoints in the same out-of-range vertical band: the
        // segment contributes nothing.
        if (self.f1 & 10) == (f2 & 10) && (self.f1 & 10) != 0 {
            self.x1 = x2;
            self.y1 = y2;
            self.f1 = f2;
            return;
        }

        let (x1, y1, f1) = (self.x1, self.y1, self.f1);
        match ((f1 & 5) << 1) | (f2 & 5) {
            0 => {
                self.line_clip_y(cells, &c, x1, y1, x2, y2, f1, f2);
            }
            1 => {
                // exits right
                let y3 = y1 + mul_div(c.x2 - x1, y2 - y1, x2 - x1);
                let f3 = clip_flags_y(y3, &c);
                self.line_clip_y(cells, &c, x1, y1, c.x2, y3, f1, f3);
                self.line_clip_y(cells, &c, c.x2, y3, c.x2, y2, f3, f2);
            }
            2 => {
                // enters from the right
                let y3 = y1 + mul_div(c.x2 - x1, y2 - y1, x2 - x1);
                let f3 = clip_flags_y(y3, &c);
                self.line_clip_y(cells, &c, c.x2, y1, c.x2, y3, f1, f3);
                self.line_clip_y(cells, &c, c.x2, y3, x2, y2, f3, f2);
            }
            3 => {
                // entirely to the right
                self.line_clip_y(cells, &c, c.x2, y1, c.x2, y2, f1, f2);
            }
            4 => {
                // exits left
                let y3 = y1 + mul_div(c.x1 - x1, y2 - y1, x2 - x1);
                let f3 = clip_flags_y(y3, &c);
                self.line_clip_y(cells, &c, x1, y1, c.x1, y3, f1, f3);
                self.line_clip_y(cells, &c, c.x1, y3, c.x1, y2, f3, f2);
            }
            6 => {
                // crosses right to left
                let y3 = y1 + mul_div(c.x2 - x1, y2 - y1, x2 - x1);
                let y4 = y1 + mul_div(c.x1 - x1, y2 - y1, x2 - x1);
                let f3 = clip_flags_y(y3, &c);
                let f4 = clip_flags_y(y4, &c);
                self.line_clip_y(cells, &c, c.x2, y1, c.x2, y3, f1, f3);
                self.line_clip_y(cells, &c, c.x2, y3, c.x1, y4, f3, f4);
                self.line_clip_y(cells, &c, c.x1, y4, c.x1, y2, f4, f2);
            }
            8 => {
                // enters from the left
                let y3 = y1 + mul_div(c.x1 - x1, y2 - y1, x2 - x1);
                let f3 = clip_flags_y(y3, &c);
                self.line_clip_y(cells, &c, c.x1, y1, c.x1, y3, f1, f3);
                self.line_clip_y(cells, &c, c.x1, y3, x2, y2, f3, f2);
            }
            9 => {
                // crosses left to right
                let y3 = y1 + mul_div(c.x1 - x1, y2 - y1, x2 - x1);
                let y4 = y1 + mul_div(c.x2 - x1, y2 - y1, x2 - x1);
                let f3 = clip_flags_y(y3, &c);
                let f4 = clip_flags_y(y4, &c);
                self.line_clip_y(cells, &c, c.x1, y1, c.x1, y3, f1, f3);
                self.line_clip_y(cells, &c, c.x1, y3, c.x2, y4, f3, f4);
                self.line_clip_y(cells, &c, c.x2, y4, c.x2, y2, f4, f2);
            }
            12 => {
                // entirely to the left
                self.line_clip_y(cells, &c, c.x1, y1, c.x1, y2, f1, f2);
            }
            _ => {}
        }
        self.f1 = f2;
        self.x1 = x2;
        self.y1 = y2;
    }

    #[allow(clippy::too_many_arguments)]
    fn line_clip_y(
        &self,
        cells: &mut CellStore,
        c: &ClipRect,
        x1: i64,
        y1: i64,
        x2: i64,
        y2: i64,
        f1: u32,
        f2: u32,
    ) {
        let f1 = f1 & 10;
        let f2 = f2 & 10;
        if (f1 | f2) == 0 {
            cells.line(x1, y1, x2, y2);
            return;
        }
        if f1 == f2 {
            return;
        }
        let (mut tx1, mut ty1, mut tx2, mut ty2) = (x1, y1, x2, y2);
        if f1 & 8 != 0 {
            tx1 = x1 + mul_div(c.y1 - y1, x2 - x1, y2 - y1);
            ty1 = c.y1;
        }
        if f1 & 2 != 0 {
            tx1 = x1 + mul_div(c.y2 - y1, x2 - x1, y2 - y1);
            ty1 = c.y2;
        }
        if f2 & 8 != 0 {
            tx2 = x1 + mul_div(c.y1 - y1, x2 - x1, y2 - y1);
            ty2 = c.y1;
        }
        if f2 & 2 != 0 {
            tx2 = x1 + mul_div(c.y2 - y1, x2 - x1, y2 - y1);
            ty2 = c.y2;
        }
        cells.line(tx1, ty1, tx2, ty2);
    }
}

// ----------------------------------------------------------------------------
// Rasterizer
// ----------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Status {
    Initial,
    MoveTo,
    LineTo,
}

/// Fills device-space contours into scanlines of coverage.
#[derive(Debug)]
pub struct Rasterizer {
    cells: CellStore,
    clipper: Clipper,
    fill_rule: FillRule,
    gamma: [u8; 256],
    start_x: i64,
    start_y: i64,
    status: Status,
    scan_y: i64,
}

impl Default for Rasterizer {
    fn default() -> Self {
        Self::new()
    }
}

impl Rasterizer {
    pub fn new() -> Self {
        let mut gamma = [0u8; 256];
        for (i, g) in gamma.iter_mut().enumerate() {
            *g = i as u8;
        }
        Self {
            cells: CellStore::new(),
            clipper: Clipper::new(),
            fill_rule: FillRule::NonZero,
            gamma,
            start_x: 0,
            start_y: 0,
            status: Status::Initial,
            scan_y: 0,
        }
    }

    pub fn reset(&mut self) {
        self.cells.reset();
        self.status = Status::Initial;
    }

    pub fn set_fill_rule(&mut self, rule: FillRule) {
        self.fill_rule = rule;
    }

    /// Sample a coverage transfer function into the alpha table.
    pub fn set_gamma<F: GammaFn>(&mut self, f: &F) {
        for (i, g) in self.gamma.iter_mut().enumerate() {
            *g = uround(f.apply(i as f64 / AA_MASK as f64) * AA_MASK as f64) as u8;
        }
    }

    /// Restrict rasterization to a device-space box.
    pub fn set_clip_box(&mut self, x1: f64, y1: f64, x2: f64, y2: f64) {
        self.clipper.set_clip_box(
            upscale(x1),
            upscale(y1),
            upscale(x2),
            upscale(y2),
        );
    }

    pub fn move_to_d(&mut self, x: f64, y: f64) {
        if self.status == Status::LineTo {
            self.close_polygon();
        }
        self.start_x = upscale(x);
        self.start_y = upscale(y);
        self.clipper.move_to(self.start_x, self.start_y);
        self.status = Status::MoveTo;
    }

    pub fn line_to_d(&mut self, x: f64, y: f64) {
        self.clipper.line_to(&mut self.cells, upscale(x), upscale(y));
        self.status = Status::LineTo;
    }

    pub fn close_polygon(&mut self) {
        if self.status == Status::LineTo {
            self.clipper.line_to(&mut self.cells, self.start_x, self.start_y);
            self.status = Status::MoveTo;
        }
    }

    /// Add a flattened contour. Open contours are closed implicitly;
    /// filling has no notion of an open figure.
    pub fn add_contour(&mut self, contour: &Contour) {
        let mut it = contour.points.iter();
        if let Some(first) = it.next() {
            self.move_to_d(first.x, first.y);
            for p in it {
                self.line_to_d(p.x, p.y);
            }
            self.close_polygon();
        }
    }

    pub fn min_x(&self) -> i32 {
        self.cells.min_x as i32
    }

    pub fn max_x(&self) -> i32 {
        self.cells.max_x as i32
    }

    pub fn min_y(&self) -> i32 {
        self.cells.min_y as i32
    }

    pub fn max_y(&self) -> i32 {
        self.cells.max_y as i32
    }

    /// Sort cells and position the sweep at the top row. Returns false
    /// when nothing was rasterized.
    pub fn rewind_scanlines(&mut self) -> bool {
        self.close_polygon();
        self.cells.sort();
        if self.cells.is_empty() {
            return false;
        }
        self.scan_y = self.cells.min_y;
        true
    }

    fn calculate_alpha(&self, area: i64) -> u8 {
        let mut cover = area >> (SHIFT * 2 + 1 - AA_SHIFT);
        if cover < 0 {
            cover = -cover;
        }
        if self.fill_rule == FillRule::EvenOdd {
            cover &= AA_MASK2;
            if cover > AA_SCALE {
                cover = AA_SCALE2 - cover;
            }
        }
        if cover > AA_MASK {
            cover = AA_MASK;
        }
        self.gamma[cover as usize]
    }

    /// Produce the next non-empty scanline. The caller resets `sl` to
    /// the rasterizer's x range once before the sweep.
    pub fn sweep_scanline(&mut self, sl: &mut Scanline) -> bool {
        loop {
            if self.scan_y > self.cells.max_y {
                return false;
            }
            sl.reset_spans();

            let row = self.cells.row(self.scan_y);
            let mut cover: i64 = 0;
            let mut i = 0;
            while i < row.len() {
                let mut x = row[i].x;
                let mut area = row[i].area as i64;
                cover += row[i].cover as i64;
                i += 1;
                while i < row.len() && row[i].x == x {
                    area += row[i].area as i64;
                    cover += row[i].cover as i64;
                    i += 1;
                }
                if area != 0 {
                    let alpha = self.calculate_alpha((cover << (SHIFT + 1)) - area);
                    if alpha != 0 {
                        sl.add_cell(x, alpha);
                    }
                    x += 1;
                }
                if i < row.len() && row[i].x > x {
                    let alpha = self.calculate_alpha(cover << (SHIFT + 1));
                    if alpha != 0 {
                        sl.add_span(x, row[i].x - x, alpha);
                    }
                }
            }

            if sl.num_spans() != 0 {
                break;
            }
            self.scan_y += 1;
        }
        sl.finalize(self.scan_y as i32);
        self.scan_y += 1;
        true
    }
}

#[inline]
fn upscale(v: f64) -> i64 {
    iround(v * SCALE as f64) as i64
}
