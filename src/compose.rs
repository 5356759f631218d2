//! Per-pixel composite operators.
//!
//! All operators take the destination, a straight-alpha source color
//! and a coverage byte, and return the new destination. Coverage
//! scales the source's effect, so a half-covered edge pixel gets half
//! the operator.

use crate::color::Rgba8;

/// Porter-Duff subset used by the renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CompositeOp {
    /// Source over destination, the usual painting operator.
    #[default]
    SourceOver,
    /// Source replaces destination.
    Source,
    /// Saturating additive blend.
    Plus,
    /// Destination is erased.
    Clear,
}

/// Apply `op` to one pixel.
#[inline]
pub fn blend_pix(op: CompositeOp, dst: Rgba8, src: Rgba8, cover: u8) -> Rgba8 {
    match op {
        CompositeOp::SourceOver => source_over(dst, src, cover),
        CompositeOp::Source => source(dst, src, cover),
        CompositeOp::Plus => plus(dst, src, cover),
        CompositeOp::Clear => clear(dst, cover),
    }
}

#[inline]
fn source_over(dst: Rgba8, src: Rgba8, cover: u8) -> Rgba8 {
    let alpha = Rgba8::multiply(src.a, cover);
    if alpha == 0 {
        return dst;
    }
    if alpha == 255 {
        return Rgba8::new(src.r, src.g, src.b, 255);
    }
    Rgba8 {
        r: Rgba8::lerp(dst.r, src.r, alpha),
        g: Rgba8::lerp(dst.g, src.g, alpha),
        b: Rgba8::lerp(dst.b, src.b, alpha),
        // da' = da + sa - da*sa
        a: Rgba8::prelerp(dst.a, alpha, alpha),
    }
}

#[inline]
fn source(dst: Rgba8, src: Rgba8, cover: u8) -> Rgba8 {
    if cover == 255 {
        return src;
    }
    Rgba8 {
        r: Rgba8::lerp(dst.r, src.r, cover),
        g: Rgba8::lerp(dst.g, src.g, cover),
        b: Rgba8::lerp(dst.b, src.b, cover),
        a: Rgba8::lerp(dst.a, src.a, cover),
    }
}

// Additive blend works in premultiplied space; the result is converted
// back to straight alpha for storage.
#[inline]
fn plus(dst: Rgba8, src: Rgba8, cover: u8) -> Rgba8 {
    let s = src.premultiplied();
    let d = dst.premultiplied();
    let sum = Rgba8 {
        r: d.r.saturating_add(Rgba8::multiply(s.r, cover)),
        g: d.g.saturating_add(Rgba8::multiply(s.g, cover)),
        b: d.b.saturating_add(Rgba8::multiply(s.b, cover)),
        a: d.a.saturating_add(Rgba8::multiply(s.a, cover)),
    };
    sum.demultiplied()
}

#[inline]
fn clear(dst: Rgba8, cover: u8) -> Rgba8 {
    if cover == 255 {
        return Rgba8::TRANSPARENT;
    }
    let keep = 255 - cover;
    Rgba8 {
        r: Rgba8::multiply(dst.r, keep),
        g: Rgba8::multiply(dst.g, keep),
        b: Rgba8::multiply(dst.b, keep),
        a: Rgba8::multiply(dst.a, keep),
    }
}
