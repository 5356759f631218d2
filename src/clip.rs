//! Clip mask: a canvas-sized 8-bit coverage buffer.
//!
//! The mask is rasterized once from a path and multiplied into every
//! span's coverage afterwards, so clipping costs one multiply per
//! pixel and clips anti-aliased edges smoothly.

use crate::basics::FillRule;
use crate::color::Rgba8;
use crate::error::{Error, Result};
use crate::flatten::Flattener;
use crate::matrix::Matrix;
use crate::path::Path;
use crate::raster::Rasterizer;
use crate::span::Scanline;

#[derive(Debug, Clone)]
pub struct ClipMask {
    width: u32,
    height: u32,
    mask: Vec<u8>,
}

impl ClipMask {
    /// Rasterize `path` under `mtx` into a width x height mask.
    pub fn from_path(
        path: &Path,
        mtx: &Matrix,
        width: u32,
        height: u32,
        fill_rule: FillRule,
        tolerance: f64,
    ) -> Result<Self> {
        let size = (width as usize)
            .checked_mul(height as usize)
            .ok_or(Error::OutOfMemory)?;
        let mut mask = Vec::new();
        mask.try_reserve_exact(size).map_err(|_| Error::OutOfMemory)?;
        mask.resize(size, 0);

        let mut ras = Rasterizer::new();
        ras.set_fill_rule(fill_rule);
        ras.set_clip_box(0.0, 0.0, width as f64, height as f64);
        for contour in Flattener::new(tolerance).flatten(path, mtx) {
            ras.add_contour(&contour);
        }

        if ras.rewind_scanlines() {
            let mut sl = Scanline::new();
            sl.reset(ras.min_x(), ras.max_x());
            while ras.sweep_scanline(&mut sl) {
                let y = sl.y();
                if y < 0 || y as u32 >= height {
                    continue;
                }
                let row = y as usize * width as usize;
                for span in sl.spans().iter() {
                    let covers = sl.covers(span);
                    for (i, &c) in covers.iter().enumerate() {
                        let x = span.x + i as i32;
                        if x >= 0 && (x as u32) < width {
                            mask[row + x as usize] = c;
                        }
                    }
                }
            }
        }

        Ok(Self {
            width,
            height,
            mask,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Mask coverage at a pixel; outside the mask is zero.
    pub fn cover(&self, x: i32, y: i32) -> u8 {
        if x < 0 || y < 0 || x as u32 >= self.width || y as u32 >= self.height {
            return 0;
        }
        self.mask[y as usize * self.width as usize + x as usize]
    }

    /// Multiply a span's covers by the mask along row `y` starting at
    /// pixel `x`.
    pub fn apply(&self, x: i32, y: i32, covers: &mut [u8]) {
        for (i, c) in covers.iter_mut().enumerate() {
            *c = Rgba8::mult_cover(*c, self.cover(x + i as i32, y));
        }
    }
}
