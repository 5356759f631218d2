//! # rastrum
//!
//! Software 2D vector graphics rendering. Paths built from lines,
//! Bezier curves and elliptical arcs are transformed, flattened and
//! rasterized with anti-aliasing into an in-memory pixel buffer, with
//! solid or gradient paints and a small set of composite operators.
//! Everything runs on the CPU; there is no GPU, windowing or text
//! dependency.
//!
//! ## Pipeline
//!
//! 1. **Path** — records drawing verbs with a current-point discipline
//! 2. **Flattening** — curves and arcs become device-space polylines
//!    within a tolerance
//! 3. **Rasterization** — signed-area cell accumulation in 24.8 fixed
//!    point, swept into coverage scanlines
//! 4. **Paint** — solid color or gradient evaluated per span
//! 5. **Composite** — coverage-weighted blending into the canvas
//!
//! ## Example
//!
//! ```
//! use rastrum::{Canvas, DrawContext, Path, PixelLayout, Rgba8};
//!
//! let mut canvas = Canvas::new(64, 64, PixelLayout::Rgba)?;
//! let mut ctx = DrawContext::new(&mut canvas);
//! ctx.set_solid(Rgba8::opaque(200, 30, 30));
//!
//! let mut path = Path::new();
//! path.move_to(8.0, 8.0);
//! path.line_to(56.0, 8.0)?;
//! path.quad_to(56.0, 56.0, 8.0, 56.0)?;
//! path.close();
//! ctx.fill(&path)?;
//! # Ok::<(), rastrum::Error>(())
//! ```

pub mod basics;
pub mod clip;
pub mod codec;
pub mod color;
pub mod compose;
pub mod context;
pub mod error;
pub mod flatten;
pub mod gamma;
pub mod gradient;
pub mod matrix;
pub mod path;
pub mod pixfmt;
pub mod raster;
pub mod span;
pub mod stroke;

pub use basics::{FillRule, Point, RectI};
pub use clip::ClipMask;
pub use codec::{CodecRegistry, ImageCodec, ImageHeader};
pub use color::Rgba8;
pub use compose::CompositeOp;
pub use context::{DrawContext, Paint};
pub use error::{Error, Result};
pub use flatten::{Contour, Flattener};
pub use gradient::{Gradient, GradientStop, Spread};
pub use matrix::Matrix;
pub use path::{Path, Verb};
pub use pixfmt::{Canvas, PixelLayout};
pub use raster::Rasterizer;
pub use span::Scanline;
pub use stroke::{LineCap, LineJoin, LineStyle, Stroker};
