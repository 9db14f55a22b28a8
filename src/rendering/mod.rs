//! Raster output built on `tiny-skia`.
//!
//! [`RasterDevice`] is a [`DrawDevice`](crate::device::DrawDevice) that
//! paints into an RGBA pixmap. It is the output end of the anonymization
//! pipeline and the surface the diagnostic overlay is drawn on.
//!
//! ## Example
//!
//! ```ignore
//! use pdf_anonymizer::rendering::RasterDevice;
//!
//! let mut device = RasterDevice::new(2550, 3300)?;
//! document.run_page(0, &mut device, &ctm)?;
//! device.to_image()?.save("page-1.png")?;
//! ```
//!
//! Text is drawn as one filled cell per glyph, spanning the glyph advance
//! and most of the x-height. That keeps the layout visible (word lengths,
//! line breaks, column structure) without needing glyph outlines.

mod path_rasterizer;
mod raster_device;
mod text_rasterizer;

pub use raster_device::{RasterDevice, RenderedImage};

use crate::device::{BlendMode, Color};
use tiny_skia::Paint;

/// Create a solid paint from a device color and opacity.
pub(crate) fn create_paint(color: &Color, alpha: f32) -> Paint<'static> {
    let [r, g, b] = color.to_rgb();
    let mut paint = Paint::default();
    paint.set_color(skia_color(r, g, b, alpha));
    paint.anti_alias = true;
    paint
}

/// Clamp components into a tiny-skia color.
pub(crate) fn skia_color(r: f32, g: f32, b: f32, a: f32) -> tiny_skia::Color {
    tiny_skia::Color::from_rgba(
        r.clamp(0.0, 1.0),
        g.clamp(0.0, 1.0),
        b.clamp(0.0, 1.0),
        a.clamp(0.0, 1.0),
    )
    .unwrap_or(tiny_skia::Color::BLACK)
}

/// Convert a blend mode to tiny-skia.
pub(crate) fn skia_blend_mode(mode: BlendMode) -> tiny_skia::BlendMode {
    match mode {
        BlendMode::Normal => tiny_skia::BlendMode::SourceOver,
        BlendMode::Multiply => tiny_skia::BlendMode::Multiply,
        BlendMode::Screen => tiny_skia::BlendMode::Screen,
        BlendMode::Overlay => tiny_skia::BlendMode::Overlay,
        BlendMode::Darken => tiny_skia::BlendMode::Darken,
        BlendMode::Lighten => tiny_skia::BlendMode::Lighten,
        BlendMode::ColorDodge => tiny_skia::BlendMode::ColorDodge,
        BlendMode::ColorBurn => tiny_skia::BlendMode::ColorBurn,
        BlendMode::HardLight => tiny_skia::BlendMode::HardLight,
        BlendMode::SoftLight => tiny_skia::BlendMode::SoftLight,
        BlendMode::Difference => tiny_skia::BlendMode::Difference,
        BlendMode::Exclusion => tiny_skia::BlendMode::Exclusion,
    }
}
