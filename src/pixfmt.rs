//! Pixel buffer and the packed color formats it can hold.
//!
//! `Canvas` owns the bytes; every write goes through the layout's
//! pack/unpack so the rest of the pipeline only ever sees `Rgba8`.
//! Span writes clip to the buffer, nothing reads or writes past
//! `stride * height`.

use crate::color::Rgba8;
use crate::compose::{blend_pix, CompositeOp};
use crate::error::{Error, Result};

/// Byte order and depth of one pixel in the buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelLayout {
    Rgba,
    Bgra,
    Argb,
    Abgr,
    Rgb,
    Bgr,
    Rgb565,
    Rgb555,
}

impl PixelLayout {
    pub fn bytes_per_pixel(self) -> usize {
        match self {
            Self::Rgba | Self::Bgra | Self::Argb | Self::Abgr => 4,
            Self::Rgb | Self::Bgr => 3,
            Self::Rgb565 | Self::Rgb555 => 2,
        }
    }

    pub fn bit_depth(self) -> u32 {
        match self {
            Self::Rgba | Self::Bgra | Self::Argb | Self::Abgr => 32,
            Self::Rgb | Self::Bgr => 24,
            Self::Rgb565 | Self::Rgb555 => 16,
        }
    }

    pub fn has_alpha(self) -> bool {
        matches!(self, Self::Rgba | Self::Bgra | Self::Argb | Self::Abgr)
    }

    fn pack(self, c: Rgba8, out: &mut [u8]) {
        match self {
            Self::Rgba => out[..4].copy_from_slice(&[c.r, c.g, c.b, c.a]),
            Self::Bgra => out[..4].copy_from_slice(&[c.b, c.g, c.r, c.a]),
            Self::Argb => out[..4].copy_from_slice(&[c.a, c.r, c.g, c.b]),
            Self::Abgr => out[..4].copy_from_slice(&[c.a, c.b, c.g, c.r]),
            Self::Rgb => out[..3].copy_from_slice(&[c.r, c.g, c.b]),
            Self::Bgr => out[..3].copy_from_slice(&[c.b, c.g, c.r]),
            Self::Rgb565 => {
                let v = ((c.r as u16 >> 3) << 11) | ((c.g as u16 >> 2) << 5) | (c.b as u16 >> 3);
                out[..2].copy_from_slice(&v.to_le_bytes());
            }
            Self::Rgb555 => {
                let v = ((c.r as u16 >> 3) << 10) | ((c.g as u16 >> 3) << 5) | (c.b as u16 >> 3);
                out[..2].copy_from_slice(&v.to_le_bytes());
            }
        }
    }

    fn unpack(self, px: &[u8]) -> Rgba8 {
        match self {
            Self::Rgba => Rgba8::new(px[0], px[1], px[2], px[3]),
            Self::Bgra => Rgba8::new(px[2], px[1], px[0], px[3]),
            Self::Argb => Rgba8::new(px[1], px[2], px[3], px[0]),
            Self::Abgr => Rgba8::new(px[3], px[2], px[1], px[0]),
            Self::Rgb => Rgba8::opaque(px[0], px[1], px[2]),
            Self::Bgr => Rgba8::opaque(px[2], px[1], px[0]),
            Self::Rgb565 => {
                let v = u16::from_le_bytes([px[0], px[1]]);
                Rgba8::opaque(
                    expand5((v >> 11) as u8 & 0x1f),
                    expand6((v >> 5) as u8 & 0x3f),
                    expand5(v as u8 & 0x1f),
                )
            }
            Self::Rgb555 => {
                let v = u16::from_le_bytes([px[0], px[1]]);
                Rgba8::opaque(
                    expand5((v >> 10) as u8 & 0x1f),
                    expand5((v >> 5) as u8 & 0x1f),
                    expand5(v as u8 & 0x1f),
                )
            }
        }
    }
}

// Bit replication: the low bits repeat the high bits so 0x1f maps to
// 0xff and 0 stays 0.
#[inline]
fn expand5(v: u8) -> u8 {
    (v << 3) | (v >> 2)
}

#[inline]
fn expand6(v: u8) -> u8 {
    (v << 2) | (v >> 4)
}

/// An in-memory pixel buffer. Never resizes implicitly.
#[derive(Debug, Clone)]
pub struct Canvas {
    width: u32,
    height: u32,
    stride: usize,
    layout: PixelLayout,
    data: Vec<u8>,
}

impl Canvas {
    /// Allocate a zeroed buffer, tightly packed rows.
    pub fn new(width: u32, height: u32, layout: PixelLayout) -> Result<Self> {
        let stride = width as usize * layout.bytes_per_pixel();
        Self::with_stride(width, height, stride, layout)
    }

    /// Allocate with an explicit row stride in bytes.
    pub fn with_stride(width: u32, height: u32, stride: usize, layout: PixelLayout) -> Result<Self> {
        if stride < width as usize * layout.bytes_per_pixel() {
            return Err(Error::InvalidState("stride smaller than a pixel row"));
        }
        let size = stride.checked_mul(height as usize).ok_or(Error::OutOfMemory)?;
        let mut data = Vec::new();
        data.try_reserve_exact(size).map_err(|_| Error::OutOfMemory)?;
        data.resize(size, 0);
        Ok(Self {
            width,
            height,
            stride,
            layout,
            data,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn stride(&self) -> usize {
        self.stride
    }

    pub fn layout(&self) -> PixelLayout {
        self.layout
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    #[inline]
    fn offset(&self, x: u32, y: u32) -> usize {
        y as usize * self.stride + x as usize * self.layout.bytes_per_pixel()
    }

    pub fn get_pixel(&self, x: u32, y: u32) -> Rgba8 {
        if x >= self.width || y >= self.height {
            return Rgba8::TRANSPARENT;
        }
        let o = self.offset(x, y);
        self.layout.unpack(&self.data[o..])
    }

    pub fn set_pixel(&mut self, x: u32, y: u32, c: Rgba8) {
        if x >= self.width || y >= self.height {
            return;
        }
        let o = self.offset(x, y);
        let layout = self.layout;
        layout.pack(c, &mut self.data[o..]);
    }

    /// Overwrite every pixel with `c`.
    pub fn clear(&mut self, c: Rgba8) {
        let bpp = self.layout.bytes_per_pixel();
        let mut px = [0u8; 4];
        self.layout.pack(c, &mut px);
        for y in 0..self.height as usize {
            let row = &mut self.data[y * self.stride..y * self.stride + self.width as usize * bpp];
            for chunk in row.chunks_exact_mut(bpp) {
                chunk.copy_from_slice(&px[..bpp]);
            }
        }
    }

    pub fn blend_pixel(&mut self, x: i32, y: i32, c: Rgba8, cover: u8, op: CompositeOp) {
        if x < 0 || y < 0 || x as u32 >= self.width || y as u32 >= self.height {
            return;
        }
        let (x, y) = (x as u32, y as u32);
        let dst = self.get_pixel(x, y);
        self.set_pixel(x, y, blend_pix(op, dst, c, cover));
    }

    // Clip a span of `len` pixels starting at x to the row, returning
    // the pixel range and the offset into the cover slice.
    fn clip_span(&self, x: i32, y: i32, len: usize) -> Option<(u32, u32, usize)> {
        if y < 0 || y as u32 >= self.height || len == 0 {
            return None;
        }
        let x2 = x.saturating_add(len as i32);
        let cx1 = x.max(0);
        let cx2 = x2.min(self.width as i32);
        if cx1 >= cx2 {
            return None;
        }
        Some((cx1 as u32, cx2 as u32, (cx1 - x) as usize))
    }

    /// Blend one color across a horizontal run with per-pixel covers.
    pub fn blend_solid_hspan(&mut self, x: i32, y: i32, c: Rgba8, covers: &[u8], op: CompositeOp) {
        let Some((x1, x2, skip)) = self.clip_span(x, y, covers.len()) else {
            return;
        };
        for (i, px) in (x1..x2).enumerate() {
            let cover = covers[skip + i];
            if cover == 0 {
                continue;
            }
            let dst = self.get_pixel(px, y as u32);
            self.set_pixel(px, y as u32, blend_pix(op, dst, c, cover));
        }
    }

    /// Blend per-pixel colors (a gradient span) with per-pixel covers.
    pub fn blend_color_hspan(
        &mut self,
        x: i32,
        y: i32,
        colors: &[Rgba8],
        covers: &[u8],
        op: CompositeOp,
    ) {
        let len = colors.len().min(covers.len());
        let Some((x1, x2, skip)) = self.clip_span(x, y, len) else {
            return;
        };
        for (i, px) in (x1..x2).enumerate() {
            let cover = covers[skip + i];
            if cover == 0 {
                continue;
            }
            let dst = self.get_pixel(px, y as u32);
            self.set_pixel(px, y as u32, blend_pix(op, dst, colors[skip + i], cover));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout_metadata() {
        assert_eq!(PixelLayout::Rgba.bytes_per_pixel(), 4);
        assert_eq!(PixelLayout::Rgb.bytes_per_pixel(), 3);
        assert_eq!(PixelLayout::Rgb565.bytes_per_pixel(), 2);
        assert_eq!(PixelLayout::Rgb565.bit_depth(), 16);
        assert!(PixelLayout::Bgra.has_alpha());
        assert!(!PixelLayout::Rgb555.has_alpha());
    }

    #[test]
    fn test_four_byte_layout_round_trip() {
        let c = Rgba8::new(10, 20, 30, 40);
        for layout in [
            PixelLayout::Rgba,
            PixelLayout::Bgra,
            PixelLayout::Argb,
            PixelLayout::Abgr,
        ] {
            let mut buf = [0u8; 4];
            layout.pack(c, &mut buf);
            assert_eq!(layout.unpack(&buf), c, "{layout:?}");
        }
    }

    #[test]
    fn test_rgb_layout_drops_alpha() {
        let c = Rgba8::new(10, 20, 30, 40);
        let mut buf = [0u8; 3];
        PixelLayout::Bgr.pack(c, &mut buf);
        assert_eq!(buf, [30, 20, 10]);
        assert_eq!(PixelLayout::Bgr.unpack(&buf), Rgba8::opaque(10, 20, 30));
    }

    #[test]
    fn test_rgb565_packing() {
        let mut buf = [0u8; 2];
        PixelLayout::Rgb565.pack(Rgba8::opaque(255, 255, 255), &mut buf);
        assert_eq!(u16::from_le_bytes(buf), 0xffff);
        assert_eq!(
            PixelLayout::Rgb565.unpack(&buf),
            Rgba8::opaque(255, 255, 255)
        );

        PixelLayout::Rgb565.pack(Rgba8::opaque(0, 0, 0), &mut buf);
        assert_eq!(u16::from_le_bytes(buf), 0);
    }

    #[test]
    fn test_rgb565_truncation_error_bounded() {
        let c = Rgba8::opaque(200, 100, 50);
        let mut buf = [0u8; 2];
        PixelLayout::Rgb565.pack(c, &mut buf);
        let back = PixelLayout::Rgb565.unpack(&buf);
        assert!((back.r as i32 - c.r as i32).abs() <= 8);
        assert!((back.g as i32 - c.g as i32).abs() <= 4);
        assert!((back.b as i32 - c.b as i32).abs() <= 8);
    }

    #[test]
    fn test_rgb555_round_trip_extremes() {
        let mut buf = [0u8; 2];
        PixelLayout::Rgb555.pack(Rgba8::opaque(255, 0, 255), &mut buf);
        let back = PixelLayout::Rgb555.unpack(&buf);
        assert_eq!((back.r, back.g, back.b), (255, 0, 255));
    }

    #[test]
    fn test_canvas_clear_and_get() {
        let mut cv = Canvas::new(4, 3, PixelLayout::Rgba).unwrap();
        cv.clear(Rgba8::opaque(1, 2, 3));
        assert_eq!(cv.get_pixel(0, 0), Rgba8::opaque(1, 2, 3));
        assert_eq!(cv.get_pixel(3, 2), Rgba8::opaque(1, 2, 3));
        // Out of range reads transparent.
        assert_eq!(cv.get_pixel(4, 0), Rgba8::TRANSPARENT);
    }

    #[test]
    fn test_span_clipping() {
        let mut cv = Canvas::new(4, 2, PixelLayout::Rgba).unwrap();
        let covers = [255u8; 10];
        // Span starts left of the buffer and overruns the right edge.
        cv.blend_solid_hspan(-3, 0, Rgba8::opaque(9, 9, 9), &covers, CompositeOp::SourceOver);
        for x in 0..4 {
            assert_eq!(cv.get_pixel(x, 0), Rgba8::opaque(9, 9, 9));
        }
        // Row below untouched.
        assert_eq!(cv.get_pixel(0, 1), Rgba8::TRANSPARENT);
        // Fully outside row is a no-op.
        cv.blend_solid_hspan(0, 5, Rgba8::opaque(9, 9, 9), &covers, CompositeOp::SourceOver);
    }

    #[test]
    fn test_color_hspan_uses_matching_offsets() {
        let mut cv = Canvas::new(4, 1, PixelLayout::Rgba).unwrap();
        let colors = [
            Rgba8::opaque(1, 0, 0),
            Rgba8::opaque(2, 0, 0),
            Rgba8::opaque(3, 0, 0),
            Rgba8::opaque(4, 0, 0),
        ];
        let covers = [255u8; 4];
        cv.blend_color_hspan(-1, 0, &colors, &covers, CompositeOp::SourceOver);
        // colors[0] fell off the left edge; pixel 0 gets colors[1].
        assert_eq!(cv.get_pixel(0, 0).r, 2);
        assert_eq!(cv.get_pixel(2, 0).r, 4);
    }

    #[test]
    fn test_stride_validation() {
        assert!(Canvas::with_stride(4, 1, 8, PixelLayout::Rgba).is_err());
        let cv = Canvas::with_stride(4, 2, 32, PixelLayout::Rgba).unwrap();
        assert_eq!(cv.stride(), 32);
        assert_eq!(cv.data().len(), 64);
    }

    #[test]
    fn test_blend_on_565_buffer() {
        let mut cv = Canvas::new(2, 1, PixelLayout::Rgb565).unwrap();
        cv.clear(Rgba8::opaque(255, 255, 255));
        cv.blend_pixel(0, 0, Rgba8::opaque(0, 0, 0), 128, CompositeOp::SourceOver);
        let c = cv.get_pixel(0, 0);
        assert!((c.r as i32 - 128).abs() <= 8, "r {}", c.r);
    }
}
