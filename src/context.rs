//! Drawing context: owns the per-draw state and runs the pipeline.
//!
//! A `DrawContext` borrows one canvas mutably for its lifetime, so two
//! contexts can never write the same buffer at once. Each draw call
//! flattens, rasterizes, paints and composites synchronously; when a
//! call returns an error the canvas has not been touched.

use log::{debug, trace};

use crate::basics::FillRule;
use crate::clip::ClipMask;
use crate::color::Rgba8;
use crate::compose::CompositeOp;
use crate::error::Result;
use crate::flatten::{Contour, Flattener};
use crate::gamma::{GammaNone, GammaPower, GammaThreshold};
use crate::gradient::Gradient;
use crate::matrix::Matrix;
use crate::path::Path;
use crate::pixfmt::Canvas;
use crate::raster::Rasterizer;
use crate::span::Scanline;
use crate::stroke::{LineStyle, Stroker};

/// What a fill or stroke paints with.
#[derive(Debug, Clone)]
pub enum Paint {
    Solid(Rgba8),
    Gradient(Gradient),
}

/// The stateful drawing interface over one canvas.
pub struct DrawContext<'a> {
    canvas: &'a mut Canvas,
    matrix: Matrix,
    paint: Paint,
    fill_rule: FillRule,
    line_style: LineStyle,
    op: CompositeOp,
    antialias: bool,
    gamma: f64,
    tolerance: f64,
    clip: Option<ClipMask>,
    // Reused across draw calls; reset keeps its cell capacity.
    ras: Rasterizer,
    // (antialias, gamma) the rasterizer's alpha table was sampled for.
    gamma_applied: (bool, f64),
}

impl<'a> DrawContext<'a> {
    pub fn new(canvas: &'a mut Canvas) -> Self {
        Self {
            canvas,
            matrix: Matrix::identity(),
            paint: Paint::Solid(Rgba8::opaque(0, 0, 0)),
            fill_rule: FillRule::NonZero,
            line_style: LineStyle::default(),
            op: CompositeOp::SourceOver,
            antialias: true,
            gamma: 1.0,
            tolerance: 0.25,
            clip: None,
            ras: Rasterizer::new(),
            gamma_applied: (true, 1.0),
        }
    }

    pub fn canvas(&self) -> &Canvas {
        self.canvas
    }

    pub fn transform(&self) -> &Matrix {
        &self.matrix
    }

    pub fn transform_mut(&mut self) -> &mut Matrix {
        &mut self.matrix
    }

    pub fn set_transform(&mut self, m: &Matrix) {
        self.matrix = *m;
    }

    pub fn set_paint(&mut self, paint: Paint) {
        self.paint = paint;
    }

    pub fn set_solid(&mut self, c: Rgba8) {
        self.paint = Paint::Solid(c);
    }

    pub fn set_gradient(&mut self, g: Gradient) {
        self.paint = Paint::Gradient(g);
    }

    pub fn set_fill_rule(&mut self, rule: FillRule) {
        self.fill_rule = rule;
    }

    pub fn set_line_style(&mut self, style: LineStyle) {
        self.line_style = style;
    }

    pub fn line_style_mut(&mut self) -> &mut LineStyle {
        &mut self.line_style
    }

    pub fn set_composite_op(&mut self, op: CompositeOp) {
        self.op = op;
    }

    pub fn set_antialias(&mut self, on: bool) {
        self.antialias = on;
    }

    /// Coverage gamma exponent; 1.0 is the identity.
    pub fn set_gamma(&mut self, exponent: f64) {
        self.gamma = exponent;
    }

    /// Curve flattening tolerance in device pixels.
    pub fn set_tolerance(&mut self, tolerance: f64) {
        self.tolerance = tolerance;
    }

    /// Fill the whole canvas with a color, ignoring clip and transform.
    pub fn clear(&mut self, c: Rgba8) {
        self.canvas.clear(c);
    }

    /// Rasterize `path` into the clip mask; spans of later draw calls
    /// are multiplied by it.
    pub fn set_clip(&mut self, path: &Path) -> Result<()> {
        self.clip = Some(ClipMask::from_path(
            path,
            &self.matrix,
            self.canvas.width(),
            self.canvas.height(),
            self.fill_rule,
            self.tolerance,
        )?);
        Ok(())
    }

    pub fn clear_clip(&mut self) {
        self.clip = None;
    }

    /// Fill the path's interior under the current fill rule.
    pub fn fill(&mut self, path: &Path) -> Result<()> {
        let contours = Flattener::new(self.tolerance).flatten(path, &self.matrix);
        debug!(
            "fill: {} verbs -> {} contours",
            path.len(),
            contours.len()
        );
        self.render(&contours, self.fill_rule);
        Ok(())
    }

    /// Stroke the path with the current line style.
    pub fn stroke(&mut self, path: &Path) -> Result<()> {
        let flat = Flattener::new(self.tolerance).flatten(path, &self.matrix);
        let stroker = Stroker::new(&self.line_style, self.tolerance);
        let outlines = stroker.stroke_contours(&flat);
        debug!(
            "stroke: {} verbs -> {} outline rings",
            path.len(),
            outlines.len()
        );
        // Stroke outlines overlap at joins; nonzero keeps them solid.
        self.render(&outlines, FillRule::NonZero);
        Ok(())
    }

    fn render(&mut self, contours: &[Contour], rule: FillRule) {
        self.ras.reset();
        self.ras.set_fill_rule(rule);
        self.ras.set_clip_box(
            0.0,
            0.0,
            self.canvas.width() as f64,
            self.canvas.height() as f64,
        );
        // Re-sample the alpha table only when the settings changed.
        if self.gamma_applied != (self.antialias, self.gamma) {
            if !self.antialias {
                self.ras.set_gamma(&GammaThreshold::default());
            } else if self.gamma != 1.0 {
                self.ras.set_gamma(&GammaPower::new(self.gamma));
            } else {
                self.ras.set_gamma(&GammaNone);
            }
            self.gamma_applied = (self.antialias, self.gamma);
        }
        for c in contours {
            self.ras.add_contour(c);
        }
        if !self.ras.rewind_scanlines() {
            return;
        }

        let mut sl = Scanline::new();
        sl.reset(self.ras.min_x(), self.ras.max_x());
        let mut covers: Vec<u8> = Vec::new();
        let mut colors: Vec<Rgba8> = Vec::new();
        let mut span_total = 0usize;

        while self.ras.sweep_scanline(&mut sl) {
            let y = sl.y();
            span_total += sl.num_spans();
            for span in sl.spans() {
                covers.clear();
                covers.extend_from_slice(sl.covers(span));
                if let Some(clip) = &self.clip {
                    clip.apply(span.x, y, &mut covers);
                }
                match &self.paint {
                    Paint::Solid(c) => {
                        self.canvas.blend_solid_hspan(span.x, y, *c, &covers, self.op);
                    }
                    Paint::Gradient(g) => {
                        colors.resize(covers.len(), Rgba8::TRANSPARENT);
                        g.generate_span(span.x, y, &mut colors);
                        self.canvas
                            .blend_color_hspan(span.x, y, &colors, &covers, self.op);
                    }
                }
            }
        }
        trace!("render: {span_total} spans composited");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gradient::{GradientStop, Spread};
    use crate::pixfmt::PixelLayout;

    fn canvas(w: u32, h: u32) -> Canvas {
        Canvas::new(w, h, PixelLayout::Rgba).unwrap()
    }

    #[test]
    fn test_fill_solid_rect() {
        let mut cv = canvas(16, 16);
        let mut ctx = DrawContext::new(&mut cv);
        ctx.clear(Rgba8::opaque(255, 255, 255));
        ctx.set_solid(Rgba8::opaque(255, 0, 0));
        let mut p = Path::new();
        p.rect(4.0, 4.0, 8.0, 8.0);
        ctx.fill(&p).unwrap();
        assert_eq!(cv.get_pixel(8, 8), Rgba8::opaque(255, 0, 0));
        assert_eq!(cv.get_pixel(1, 1), Rgba8::opaque(255, 255, 255));
    }

    #[test]
    fn test_fill_respects_transform() {
        let mut cv = canvas(20, 20);
        let mut ctx = DrawContext::new(&mut cv);
        ctx.set_solid(Rgba8::opaque(0, 255, 0));
        ctx.transform_mut().translate(10.0, 10.0);
        let mut p = Path::new();
        p.rect(0.0, 0.0, 5.0, 5.0);
        ctx.fill(&p).unwrap();
        assert_eq!(cv.get_pixel(12, 12), Rgba8::opaque(0, 255, 0));
        assert_eq!(cv.get_pixel(2, 2), Rgba8::TRANSPARENT);
    }

    #[test]
    fn test_stroke_leaves_interior_empty() {
        let mut cv = canvas(20, 20);
        let mut ctx = DrawContext::new(&mut cv);
        ctx.set_solid(Rgba8::opaque(0, 0, 255));
        ctx.line_style_mut().width = 2.0;
        let mut p = Path::new();
        p.rect(4.0, 4.0, 12.0, 12.0);
        ctx.stroke(&p).unwrap();
        // Edge painted, center empty.
        assert_eq!(cv.get_pixel(10, 4), Rgba8::opaque(0, 0, 255));
        assert_eq!(cv.get_pixel(10, 10), Rgba8::TRANSPARENT);
    }

    #[test]
    fn test_clip_limits_fill() {
        let mut cv = canvas(20, 20);
        let mut ctx = DrawContext::new(&mut cv);
        ctx.set_solid(Rgba8::opaque(9, 9, 9));
        let mut clip = Path::new();
        clip.rect(0.0, 0.0, 10.0, 20.0);
        ctx.set_clip(&clip).unwrap();
        let mut p = Path::new();
        p.rect(0.0, 0.0, 20.0, 20.0);
        ctx.fill(&p).unwrap();
        assert_eq!(cv.get_pixel(5, 5), Rgba8::opaque(9, 9, 9));
        assert_eq!(cv.get_pixel(15, 5), Rgba8::TRANSPARENT);
    }

    #[test]
    fn test_clear_clip_restores_full_canvas() {
        let mut cv = canvas(10, 10);
        let mut ctx = DrawContext::new(&mut cv);
        ctx.set_solid(Rgba8::opaque(1, 1, 1));
        let mut clip = Path::new();
        clip.rect(0.0, 0.0, 1.0, 1.0);
        ctx.set_clip(&clip).unwrap();
        ctx.clear_clip();
        let mut p = Path::new();
        p.rect(0.0, 0.0, 10.0, 10.0);
        ctx.fill(&p).unwrap();
        assert_eq!(cv.get_pixel(9, 9), Rgba8::opaque(1, 1, 1));
    }

    #[test]
    fn test_gradient_fill() {
        let mut cv = canvas(32, 4);
        let mut ctx = DrawContext::new(&mut cv);
        let g = Gradient::linear(
            0.0,
            0.0,
            32.0,
            0.0,
            vec![
                GradientStop::new(0.0, Rgba8::opaque(255, 0, 0)),
                GradientStop::new(1.0, Rgba8::opaque(0, 0, 255)),
            ],
            Spread::Pad,
            ctx.transform(),
        )
        .unwrap();
        ctx.set_gradient(g);
        let mut p = Path::new();
        p.rect(0.0, 0.0, 32.0, 4.0);
        ctx.fill(&p).unwrap();
        let left = cv.get_pixel(1, 2);
        let right = cv.get_pixel(30, 2);
        assert!(left.r > 200 && left.b < 60, "left {left:?}");
        assert!(right.b > 200 && right.r < 60, "right {right:?}");
    }

    #[test]
    fn test_antialias_off_binarizes_edges() {
        let mut cv = canvas(10, 10);
        let mut ctx = DrawContext::new(&mut cv);
        ctx.set_antialias(false);
        ctx.set_solid(Rgba8::opaque(0, 0, 0));
        let mut p = Path::new();
        p.move_to(0.0, 0.0);
        p.line_to(10.0, 0.0).unwrap();
        p.line_to(0.0, 10.0).unwrap();
        p.close();
        ctx.fill(&p).unwrap();
        for y in 0..10 {
            for x in 0..10 {
                let a = cv.get_pixel(x, y).a;
                assert!(a == 0 || a == 255, "pixel ({x},{y}) alpha {a}");
            }
        }
    }

    #[test]
    fn test_antialias_toggle_between_draws() {
        // One context, several draws: the alpha table must follow the
        // AA flag each time the setting changes.
        let mut cv = canvas(10, 10);
        let mut ctx = DrawContext::new(&mut cv);
        ctx.set_solid(Rgba8::opaque(0, 0, 0));
        let mut p = Path::new();
        p.move_to(0.0, 0.0);
        p.line_to(10.0, 0.0).unwrap();
        p.line_to(0.0, 10.0).unwrap();
        p.close();

        ctx.set_antialias(false);
        ctx.fill(&p).unwrap();
        let binary = (0..10).all(|x| {
            let a = ctx.canvas().get_pixel(x, 9 - x).a;
            a == 0 || a == 255
        });
        assert!(binary);

        ctx.clear(Rgba8::TRANSPARENT);
        ctx.set_antialias(true);
        ctx.fill(&p).unwrap();
        let partial = (0..10).any(|x| {
            let a = ctx.canvas().get_pixel(x, 9 - x).a;
            a > 0 && a < 255
        });
        assert!(partial, "diagonal should carry fractional cover");
    }

    #[test]
    fn test_composite_source_ignores_dst() {
        let mut cv = canvas(8, 8);
        let mut ctx = DrawContext::new(&mut cv);
        ctx.clear(Rgba8::opaque(255, 255, 255));
        ctx.set_composite_op(CompositeOp::Source);
        ctx.set_solid(Rgba8::new(10, 20, 30, 77));
        let mut p = Path::new();
        p.rect(0.0, 0.0, 8.0, 8.0);
        ctx.fill(&p).unwrap();
        assert_eq!(cv.get_pixel(4, 4), Rgba8::new(10, 20, 30, 77));
    }

    #[test]
    fn test_empty_path_noop() {
        let mut cv = canvas(4, 4);
        let mut ctx = DrawContext::new(&mut cv);
        ctx.set_solid(Rgba8::opaque(9, 9, 9));
        let p = Path::new();
        ctx.fill(&p).unwrap();
        assert_eq!(cv.get_pixel(2, 2), Rgba8::TRANSPARENT);
    }
}
