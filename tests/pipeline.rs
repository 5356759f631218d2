//! End-to-end pipeline tests: path -> transform -> flatten ->
//! rasterize -> paint -> composite, through the public API only.

use rastrum::{
    Canvas, CompositeOp, DrawContext, FillRule, Gradient, GradientStop, Matrix, Path, PixelLayout,
    Point, Rgba8, Spread,
};

fn canvas(w: u32, h: u32) -> Canvas {
    Canvas::new(w, h, PixelLayout::Rgba).unwrap()
}

fn coverage_sum(cv: &Canvas) -> u64 {
    let mut total = 0u64;
    for y in 0..cv.height() {
        for x in 0..cv.width() {
            total += cv.get_pixel(x, y).a as u64;
        }
    }
    total
}

#[test]
fn transform_round_trip() {
    let mut m = Matrix::identity();
    m.translate(12.5, -3.0);
    m.rotate(0.83);
    m.scale(3.0, 0.4);
    let p = Point::new(41.0, -17.25);
    let back = m.apply_inverse(m.apply(p)).unwrap();
    assert!((back.x - p.x).abs() < 1e-9);
    assert!((back.y - p.y).abs() < 1e-9);
}

#[test]
fn convex_polygon_coverage_aa_off() {
    // With AA off every pixel is either fully in or out, so the total
    // coverage equals 255 times the pixel count of the interior and
    // approximates the geometric area.
    let mut cv = canvas(40, 40);
    let mut ctx = DrawContext::new(&mut cv);
    ctx.set_antialias(false);
    ctx.set_solid(Rgba8::opaque(0, 0, 0));

    let mut p = Path::new();
    p.move_to(5.0, 5.0);
    p.line_to(35.0, 5.0).unwrap();
    p.line_to(35.0, 25.0).unwrap();
    p.line_to(5.0, 25.0).unwrap();
    p.close();
    ctx.fill(&p).unwrap();

    let area = 30.0 * 20.0;
    let covered = coverage_sum(&cv) as f64 / 255.0;
    assert!(
        (covered - area).abs() <= area * 0.02,
        "covered {covered}, area {area}"
    );
    for y in 0..40 {
        for x in 0..40 {
            let a = cv.get_pixel(x, y).a;
            assert!(a == 0 || a == 255);
        }
    }
}

#[test]
fn figure_eight_fill_rules() {
    // One continuous self-intersecting path: an outer loop and an
    // inner loop wound the same way, joined by a connector that is
    // retraced by the close. The inner region winds twice: nonzero
    // fills it, even-odd punches it out.
    let double_loop = || {
        let mut p = Path::new();
        p.move_to(2.0, 2.0);
        p.line_to(30.0, 2.0).unwrap();
        p.line_to(30.0, 30.0).unwrap();
        p.line_to(2.0, 30.0).unwrap();
        p.line_to(2.0, 2.0).unwrap();
        p.line_to(10.0, 10.0).unwrap();
        p.line_to(24.0, 10.0).unwrap();
        p.line_to(24.0, 24.0).unwrap();
        p.line_to(10.0, 24.0).unwrap();
        p.line_to(10.0, 10.0).unwrap();
        p.close();
        p
    };

    let mut nz_cv = canvas(40, 40);
    {
        let mut ctx = DrawContext::new(&mut nz_cv);
        ctx.set_solid(Rgba8::opaque(0, 0, 0));
        ctx.fill(&double_loop()).unwrap();
    }

    let mut eo_cv = canvas(40, 40);
    {
        let mut ctx = DrawContext::new(&mut eo_cv);
        ctx.set_fill_rule(FillRule::EvenOdd);
        ctx.set_solid(Rgba8::opaque(0, 0, 0));
        ctx.fill(&double_loop()).unwrap();
    }

    // Singly wound band fills under both rules.
    assert_eq!(nz_cv.get_pixel(5, 16).a, 255);
    assert_eq!(eo_cv.get_pixel(5, 16).a, 255);
    // Doubly wound center: nonzero fills, even-odd empties.
    assert_eq!(nz_cv.get_pixel(16, 16).a, 255);
    assert_eq!(eo_cv.get_pixel(16, 16).a, 0);
}

#[test]
fn flattening_deviation_scales_with_transform() {
    // Magnifying a curve 8x must not leave visible polygon corners:
    // compare against drawing the pre-scaled curve directly.
    let mut small_path = Path::new();
    small_path.move_to(1.0, 4.0);
    small_path.cubic_to(2.0, 0.0, 4.0, 0.0, 5.0, 4.0).unwrap();
    small_path.close();

    let mut big_path = Path::new();
    big_path.move_to(8.0, 32.0);
    big_path.cubic_to(16.0, 0.0, 32.0, 0.0, 40.0, 32.0).unwrap();
    big_path.close();

    let mut scaled_cv = canvas(48, 40);
    {
        let mut ctx = DrawContext::new(&mut scaled_cv);
        ctx.set_solid(Rgba8::opaque(0, 0, 0));
        ctx.transform_mut().scale(8.0, 8.0);
        ctx.fill(&small_path).unwrap();
    }

    let mut direct_cv = canvas(48, 40);
    {
        let mut ctx = DrawContext::new(&mut direct_cv);
        ctx.set_solid(Rgba8::opaque(0, 0, 0));
        ctx.fill(&big_path).unwrap();
    }

    let scaled = coverage_sum(&scaled_cv) as f64;
    let direct = coverage_sum(&direct_cv) as f64;
    let ratio = scaled / direct;
    assert!((ratio - 1.0).abs() < 0.01, "coverage ratio {ratio}");
}

#[test]
fn gradient_spread_endpoints() {
    let red = Rgba8::opaque(255, 0, 0);
    let blue = Rgba8::opaque(0, 0, 255);
    let stops = vec![GradientStop::new(0.0, red), GradientStop::new(1.0, blue)];

    for spread in [Spread::Pad, Spread::Repeat, Spread::Reflect] {
        let mut cv = canvas(64, 4);
        let mut ctx = DrawContext::new(&mut cv);
        let g = Gradient::linear(16.0, 0.0, 48.0, 0.0, stops.clone(), spread, ctx.transform())
            .unwrap();
        ctx.set_gradient(g);
        let mut p = Path::new();
        p.rect(0.0, 0.0, 64.0, 4.0);
        ctx.fill(&p).unwrap();

        // Inside the ramp all spreads agree at the stop positions.
        let start = cv.get_pixel(16, 2);
        let end = cv.get_pixel(47, 2);
        assert!(start.r > 240, "{spread:?} start {start:?}");
        assert!(end.b > 240, "{spread:?} end {end:?}");

        let before = cv.get_pixel(2, 2);
        match spread {
            // Pad clamps to the first stop.
            Spread::Pad => assert!(before.r > 240, "pad {before:?}"),
            // Repeat just left of the start sits near the ramp's end.
            Spread::Repeat => assert!(before.b > before.r, "repeat {before:?}"),
            // Reflect mirrors around the ramp start: pixel centers at
            // 2.5 and 29.5 map to the same parameter.
            Spread::Reflect => {
                let mirrored = cv.get_pixel(29, 2);
                assert!(
                    (before.r as i32 - mirrored.r as i32).abs() <= 8,
                    "reflect {before:?} vs {mirrored:?}"
                );
            }
        }
    }
}

#[test]
fn solid_rect_visual_match_across_layouts() {
    // The same scene drawn into RGBA, BGRA and RGB565 buffers decodes
    // to the same visual color (within 16-bit quantization).
    let color = Rgba8::opaque(200, 120, 40);
    let mut results = Vec::new();
    for layout in [PixelLayout::Rgba, PixelLayout::Bgra, PixelLayout::Rgb565] {
        let mut cv = Canvas::new(16, 16, layout).unwrap();
        let mut ctx = DrawContext::new(&mut cv);
        ctx.set_solid(color);
        let mut p = Path::new();
        p.rect(2.0, 2.0, 12.0, 12.0);
        ctx.fill(&p).unwrap();
        results.push((layout, cv.get_pixel(8, 8)));
    }
    for (layout, c) in &results {
        assert!(
            (c.r as i32 - color.r as i32).abs() <= 8
                && (c.g as i32 - color.g as i32).abs() <= 4
                && (c.b as i32 - color.b as i32).abs() <= 8,
            "{layout:?} decoded {c:?}"
        );
    }
    // Outside stays untouched in every layout.
    let mut cv = Canvas::new(16, 16, PixelLayout::Rgb565).unwrap();
    let mut ctx = DrawContext::new(&mut cv);
    ctx.set_solid(color);
    let mut p = Path::new();
    p.rect(2.0, 2.0, 12.0, 12.0);
    ctx.fill(&p).unwrap();
    assert_eq!(cv.get_pixel(0, 0), Rgba8::opaque(0, 0, 0));
}

#[test]
fn arc_flag_combinations_render_distinct() {
    // The four large-arc/sweep combinations of one endpoint pair are
    // four different curves; their filled renderings must differ.
    let mut images = Vec::new();
    for (large, sweep) in [(false, false), (false, true), (true, false), (true, true)] {
        let mut cv = canvas(80, 80);
        let mut ctx = DrawContext::new(&mut cv);
        ctx.set_solid(Rgba8::opaque(0, 0, 0));
        let mut p = Path::new();
        p.move_to(20.0, 40.0);
        p.arc_to(25.0, 18.0, 0.0, large, sweep, 60.0, 40.0).unwrap();
        p.close();
        ctx.fill(&p).unwrap();
        images.push(cv.data().to_vec());
    }
    for i in 0..4 {
        for j in i + 1..4 {
            assert_ne!(images[i], images[j], "flag combos {i} and {j} identical");
        }
    }
}

#[test]
fn translucent_fills_accumulate_with_source_over() {
    let mut cv = canvas(8, 8);
    let mut ctx = DrawContext::new(&mut cv);
    ctx.clear(Rgba8::opaque(255, 255, 255));
    ctx.set_solid(Rgba8::new(0, 0, 0, 128));
    let mut p = Path::new();
    p.rect(0.0, 0.0, 8.0, 8.0);
    ctx.fill(&p).unwrap();
    let once = ctx.canvas().get_pixel(4, 4).r;
    ctx.fill(&p).unwrap();
    let twice = ctx.canvas().get_pixel(4, 4).r;
    assert!(once > 100 && once < 150, "once {once}");
    assert!(twice < once, "twice {twice} should darken");
}

#[test]
fn plus_op_accumulates_and_saturates() {
    let mut cv = canvas(8, 8);
    let mut ctx = DrawContext::new(&mut cv);
    ctx.set_composite_op(CompositeOp::Plus);
    ctx.set_solid(Rgba8::opaque(100, 0, 0));
    let mut p = Path::new();
    p.rect(0.0, 0.0, 8.0, 8.0);
    ctx.fill(&p).unwrap();
    ctx.fill(&p).unwrap();
    assert_eq!(ctx.canvas().get_pixel(4, 4).r, 200);
    ctx.fill(&p).unwrap();
    assert_eq!(ctx.canvas().get_pixel(4, 4).r, 255);
}

#[test]
fn failed_draw_leaves_canvas_untouched() {
    let mut cv = canvas(8, 8);
    let mut ctx = DrawContext::new(&mut cv);
    ctx.set_solid(Rgba8::opaque(9, 9, 9));
    // Building the bad path fails up front; the canvas never sees it.
    let mut p = Path::new();
    assert!(p.line_to(4.0, 4.0).is_err());
    ctx.fill(&p).unwrap();
    assert_eq!(coverage_sum(ctx.canvas()), 0);
}

#[test]
fn stroke_dashed_circle() {
    let mut cv = canvas(64, 64);
    let mut ctx = DrawContext::new(&mut cv);
    ctx.set_solid(Rgba8::opaque(0, 0, 0));
    ctx.line_style_mut().width = 3.0;
    ctx.line_style_mut().dash = vec![6.0, 6.0];

    // Full circle from two arc halves.
    let mut p = Path::new();
    p.move_to(12.0, 32.0);
    p.arc_to(20.0, 20.0, 0.0, false, true, 52.0, 32.0).unwrap();
    p.arc_to(20.0, 20.0, 0.0, false, true, 12.0, 32.0).unwrap();
    ctx.stroke(&p).unwrap();

    let total = coverage_sum(&cv) as f64 / 255.0;
    // Half the circumference at width 3, loosely.
    let expect = std::f64::consts::PI * 40.0 / 2.0 * 3.0;
    assert!(total > expect * 0.6 && total < expect * 1.5, "painted {total}, expected about {expect}");
    // Center of the circle stays empty.
    assert_eq!(cv.get_pixel(32, 32).a, 0);
}
