//! Scanline container: one row of coverage runs handed from the
//! rasterizer sweep to the renderer.

/// A horizontal run of pixels on one scanline. `cover_start` indexes
/// into the scanline's cover buffer; the run holds `len` cover bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub x: i32,
    pub len: i32,
    pub cover_start: usize,
}

/// Unpacked scanline: per-pixel cover bytes grouped into spans.
/// Reused across rows; `reset` sizes it once per rasterization.
#[derive(Debug, Default)]
pub struct Scanline {
    min_x: i32,
    last_x: i64,
    y: i32,
    covers: Vec<u8>,
    spans: Vec<Span>,
}

// Sentinel guaranteeing the first add never merges.
const LAST_X_NONE: i64 = 0x7FFF_FFF0;

impl Scanline {
    pub fn new() -> Self {
        Self {
            last_x: LAST_X_NONE,
            ..Self::default()
        }
    }

    /// Size the cover buffer for rows spanning `min_x..=max_x`.
    pub fn reset(&mut self, min_x: i32, max_x: i32) {
        let width = (max_x - min_x + 2).max(0) as usize;
        if self.covers.len() < width {
            self.covers.resize(width, 0);
        }
        self.min_x = min_x;
        self.last_x = LAST_X_NONE;
        self.spans.clear();
    }

    /// Drop accumulated spans, keep the buffer.
    pub fn reset_spans(&mut self) {
        self.last_x = LAST_X_NONE;
        self.spans.clear();
    }

    pub fn add_cell(&mut self, x: i32, cover: u8) {
        let off = (x - self.min_x) as usize;
        self.covers[off] = cover;
        if x as i64 == self.last_x + 1 {
            if let Some(s) = self.spans.last_mut() {
                s.len += 1;
            }
        } else {
            self.spans.push(Span {
                x,
                len: 1,
                cover_start: off,
            });
        }
        self.last_x = x as i64;
    }

    pub fn add_span(&mut self, x: i32, len: i32, cover: u8) {
        let off = (x - self.min_x) as usize;
        self.covers[off..off + len as usize].fill(cover);
        if x as i64 == self.last_x + 1 {
            if let Some(s) = self.spans.last_mut() {
                s.len += len;
            }
        } else {
            self.spans.push(Span {
                x,
                len,
                cover_start: off,
            });
        }
        self.last_x = (x + len - 1) as i64;
    }

    pub fn finalize(&mut self, y: i32) {
        self.y = y;
    }

    pub fn y(&self) -> i32 {
        self.y
    }

    pub fn num_spans(&self) -> usize {
        self.spans.len()
    }

    pub fn spans(&self) -> &[Span] {
        &self.spans
    }

    pub fn covers(&self, span: &Span) -> &[u8] {
        &self.covers[span.cover_start..span.cover_start + span.len as usize]
    }
}
