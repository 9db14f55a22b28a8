//! A draw device that rasterizes into a pixmap.

use crate::device::{
    BlendMode, Color, DrawDevice, Image, Path, Shade, ShadeKind, StrokeState, Text,
};
use crate::error::{Error, Result};
use crate::geometry::{Matrix, Rect};

use tiny_skia::{
    FillRule, FilterQuality, GradientStop, IntSize, LinearGradient, Mask, MaskType, Paint,
    Pixmap, PixmapPaint, RadialGradient, SpreadMode, Transform,
};

use super::path_rasterizer::{quads_to_path, to_skia_path, to_skia_stroke, to_transform};
use super::text_rasterizer::{glyph_cells, mean_scale};
use super::{create_paint, skia_blend_mode, skia_color};

/// Encoded raster output.
#[derive(Debug, Clone)]
pub struct RenderedImage {
    /// PNG data
    pub data: Vec<u8>,
    /// Image width in pixels
    pub width: u32,
    /// Image height in pixels
    pub height: u32,
}

impl RenderedImage {
    /// Save the image to a file.
    pub fn save(&self, path: impl AsRef<std::path::Path>) -> Result<()> {
        std::fs::write(path.as_ref(), &self.data)?;
        Ok(())
    }

    /// Get the encoded image data.
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Decode back to straight RGBA8.
    pub fn to_rgba(&self) -> Result<image::RgbaImage> {
        let decoded = image::load_from_memory_with_format(&self.data, image::ImageFormat::Png)
            .map_err(|e| Error::Render(format!("PNG decoding failed: {}", e)))?;
        Ok(decoded.to_rgba8())
    }
}

enum LayerKind {
    Mask { luminosity: bool },
    Group { blend: BlendMode, alpha: f32 },
    Tile,
}

/// An offscreen surface for a soft mask, group or tile.
struct Layer {
    pixmap: Pixmap,
    kind: LayerKind,
}

/// Rasterizes drawing calls onto a white page.
///
/// Clips and soft masks are kept as a stack of coverage masks, each one the
/// intersection of everything pushed before it. Groups and tiles are drawn
/// into offscreen layers and composited when they end; tile cells are
/// composited once, not repeated.
pub struct RasterDevice {
    base: Pixmap,
    layers: Vec<Layer>,
    clips: Vec<Mask>,
    closed: bool,
}

impl std::fmt::Debug for RasterDevice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RasterDevice")
            .field("width", &self.base.width())
            .field("height", &self.base.height())
            .field("layers", &self.layers.len())
            .field("clips", &self.clips.len())
            .field("closed", &self.closed)
            .finish()
    }
}

impl RasterDevice {
    /// Create a device with a white background.
    pub fn new(width: u32, height: u32) -> Result<Self> {
        let mut base = new_pixmap(width, height)?;
        base.fill(tiny_skia::Color::WHITE);
        Ok(Self {
            base,
            layers: Vec::new(),
            clips: Vec::new(),
            closed: false,
        })
    }

    /// Width in pixels.
    pub fn width(&self) -> u32 {
        self.base.width()
    }

    /// Height in pixels.
    pub fn height(&self) -> u32 {
        self.base.height()
    }

    /// Straight RGBA of a page pixel.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        self.base.pixel(x, y).map(|p| {
            let c = p.demultiply();
            [c.red(), c.green(), c.blue(), c.alpha()]
        })
    }

    /// Encode the page as PNG.
    pub fn to_image(&self) -> Result<RenderedImage> {
        if !self.layers.is_empty() {
            log::warn!("Encoding page with {} unfinished layers", self.layers.len());
        }
        let data = self
            .base
            .encode_png()
            .map_err(|e| Error::Render(format!("PNG encoding failed: {}", e)))?;
        Ok(RenderedImage {
            data,
            width: self.base.width(),
            height: self.base.height(),
        })
    }

    /// Whether `close` has been called.
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    fn surface(&mut self) -> (&mut Pixmap, Option<&Mask>) {
        let clip = self.clips.last();
        let pixmap = match self.layers.last_mut() {
            Some(layer) => &mut layer.pixmap,
            None => &mut self.base,
        };
        (pixmap, clip)
    }

    fn fill_skia_path(
        &mut self,
        path: &tiny_skia::Path,
        rule: FillRule,
        transform: Transform,
        color: &Color,
        alpha: f32,
    ) {
        let paint = create_paint(color, alpha);
        let (pixmap, clip) = self.surface();
        pixmap.fill_path(path, &paint, rule, transform, clip);
    }

    fn stroke_skia_path(
        &mut self,
        path: &tiny_skia::Path,
        stroke: &tiny_skia::Stroke,
        transform: Transform,
        color: &Color,
        alpha: f32,
    ) {
        let paint = create_paint(color, alpha);
        let (pixmap, clip) = self.surface();
        pixmap.stroke_path(path, &paint, stroke, transform, clip);
    }

    /// Push the intersection of the current clip and `path`.
    fn push_path_clip(
        &mut self,
        path: Option<tiny_skia::Path>,
        rule: FillRule,
        transform: Transform,
    ) -> Result<()> {
        let mut mask = match self.clips.last() {
            Some(current) => current.clone(),
            None => {
                let mut full = new_mask(self.width(), self.height())?;
                full.data_mut().fill(u8::MAX);
                full
            },
        };
        match path {
            Some(path) => mask.intersect_path(&path, rule, true, transform),
            // Nothing to clip to: everything is clipped out
            None => mask.data_mut().fill(0),
        }
        self.clips.push(mask);
        Ok(())
    }

    /// Push the intersection of the current clip and a coverage mask.
    fn push_mask_clip(&mut self, mut mask: Mask) {
        if let Some(current) = self.clips.last() {
            for (value, limit) in mask.data_mut().iter_mut().zip(current.data()) {
                *value = ((*value as u16 * *limit as u16 + 127) / 255) as u8;
            }
        }
        self.clips.push(mask);
    }

    fn push_layer(&mut self, kind: LayerKind, background: Option<tiny_skia::Color>) -> Result<()> {
        let mut pixmap = new_pixmap(self.width(), self.height())?;
        if let Some(color) = background {
            pixmap.fill(color);
        }
        self.layers.push(Layer { pixmap, kind });
        Ok(())
    }

    fn draw_image_pixmap(&mut self, pixmap: &Pixmap, ctm: &Matrix, alpha: f32) {
        let transform = to_transform(ctm)
            .pre_scale(1.0 / pixmap.width() as f32, 1.0 / pixmap.height() as f32);
        let paint = PixmapPaint {
            opacity: alpha.clamp(0.0, 1.0),
            quality: FilterQuality::Bilinear,
            ..PixmapPaint::default()
        };
        let (target, clip) = self.surface();
        target.draw_pixmap(0, 0, pixmap.as_ref(), &paint, transform, clip);
    }
}

impl DrawDevice for RasterDevice {
    fn fill_text(&mut self, text: &Text, ctm: &Matrix, color: &Color, alpha: f32) -> Result<()> {
        if let Some(path) = quads_to_path(&glyph_cells(text, ctm)) {
            self.fill_skia_path(&path, FillRule::Winding, Transform::identity(), color, alpha);
        }
        Ok(())
    }

    fn stroke_text(
        &mut self,
        text: &Text,
        stroke: &StrokeState,
        ctm: &Matrix,
        color: &Color,
        alpha: f32,
    ) -> Result<()> {
        if let Some(path) = quads_to_path(&glyph_cells(text, ctm)) {
            let mut skia_stroke = to_skia_stroke(stroke);
            skia_stroke.width *= mean_scale(ctm);
            self.stroke_skia_path(&path, &skia_stroke, Transform::identity(), color, alpha);
        }
        Ok(())
    }

    fn clip_text(&mut self, text: &Text, ctm: &Matrix) -> Result<()> {
        let path = quads_to_path(&glyph_cells(text, ctm));
        self.push_path_clip(path, FillRule::Winding, Transform::identity())
    }

    fn clip_stroke_text(&mut self, text: &Text, _stroke: &StrokeState, ctm: &Matrix) -> Result<()> {
        self.clip_text(text, ctm)
    }

    fn fill_path(
        &mut self,
        path: &Path,
        even_odd: bool,
        ctm: &Matrix,
        color: &Color,
        alpha: f32,
    ) -> Result<()> {
        if let Some(path) = to_skia_path(path) {
            self.fill_skia_path(&path, fill_rule(even_odd), to_transform(ctm), color, alpha);
        }
        Ok(())
    }

    fn stroke_path(
        &mut self,
        path: &Path,
        stroke: &StrokeState,
        ctm: &Matrix,
        color: &Color,
        alpha: f32,
    ) -> Result<()> {
        if let Some(path) = to_skia_path(path) {
            let stroke = to_skia_stroke(stroke);
            self.stroke_skia_path(&path, &stroke, to_transform(ctm), color, alpha);
        }
        Ok(())
    }

    fn clip_path(&mut self, path: &Path, even_odd: bool, ctm: &Matrix) -> Result<()> {
        self.push_path_clip(to_skia_path(path), fill_rule(even_odd), to_transform(ctm))
    }

    fn clip_stroke_path(&mut self, path: &Path, stroke: &StrokeState, ctm: &Matrix) -> Result<()> {
        let outline = to_skia_path(path).and_then(|p| p.stroke(&to_skia_stroke(stroke), 1.0));
        self.push_path_clip(outline, FillRule::Winding, to_transform(ctm))
    }

    fn fill_shade(&mut self, shade: &Shade, ctm: &Matrix, alpha: f32) -> Result<()> {
        let stops: Vec<GradientStop> = shade
            .stops
            .iter()
            .map(|stop| {
                let [r, g, b] = stop.color.to_rgb();
                GradientStop::new(stop.offset, skia_color(r, g, b, alpha))
            })
            .collect();
        let transform = to_transform(ctm);
        let shader = match shade.kind {
            ShadeKind::Axial { start, end } => LinearGradient::new(
                tiny_skia::Point::from_xy(start.x, start.y),
                tiny_skia::Point::from_xy(end.x, end.y),
                stops,
                SpreadMode::Pad,
                transform,
            ),
            ShadeKind::Radial { center, radius } => {
                let center = tiny_skia::Point::from_xy(center.x, center.y);
                RadialGradient::new(center, center, radius, stops, SpreadMode::Pad, transform)
            },
        };
        let Some(shader) = shader else {
            log::debug!("Skipping degenerate shading {:?}", shade.kind);
            return Ok(());
        };
        let paint = Paint {
            shader,
            anti_alias: true,
            ..Paint::default()
        };
        let area = tiny_skia::Rect::from_xywh(0.0, 0.0, self.width() as f32, self.height() as f32);
        if let Some(area) = area {
            let (pixmap, clip) = self.surface();
            pixmap.fill_rect(area, &paint, Transform::identity(), clip);
        }
        Ok(())
    }

    fn fill_image(&mut self, image: &Image, ctm: &Matrix, alpha: f32) -> Result<()> {
        let pixmap = image_pixmap(image, |px| [px[0], px[1], px[2], px[3]])?;
        self.draw_image_pixmap(&pixmap, ctm, alpha);
        Ok(())
    }

    fn fill_image_mask(
        &mut self,
        image: &Image,
        ctm: &Matrix,
        color: &Color,
        alpha: f32,
    ) -> Result<()> {
        let [r, g, b] = color.to_rgb().map(|c| (c.clamp(0.0, 1.0) * 255.0).round() as u8);
        let pixmap = image_pixmap(image, |px| [r, g, b, px[3]])?;
        self.draw_image_pixmap(&pixmap, ctm, alpha);
        Ok(())
    }

    fn clip_image_mask(&mut self, image: &Image, ctm: &Matrix) -> Result<()> {
        let source = image_pixmap(image, |px| [0, 0, 0, px[3]])?;
        let mut coverage = new_pixmap(self.width(), self.height())?;
        let transform = to_transform(ctm)
            .pre_scale(1.0 / source.width() as f32, 1.0 / source.height() as f32);
        coverage.draw_pixmap(
            0,
            0,
            source.as_ref(),
            &PixmapPaint::default(),
            transform,
            None,
        );
        self.push_mask_clip(Mask::from_pixmap(coverage.as_ref(), MaskType::Alpha));
        Ok(())
    }

    fn pop_clip(&mut self) -> Result<()> {
        if self.clips.pop().is_none() {
            log::warn!("Unbalanced clip pop ignored");
        }
        Ok(())
    }

    fn begin_mask(&mut self, _area: &Rect, luminosity: bool, backdrop: &Color) -> Result<()> {
        let background = luminosity.then(|| {
            let [r, g, b] = backdrop.to_rgb();
            skia_color(r, g, b, 1.0)
        });
        self.push_layer(LayerKind::Mask { luminosity }, background)
    }

    fn end_mask(&mut self) -> Result<()> {
        let Some(layer) = self.layers.pop() else {
            return Err(Error::Render("end_mask without begin_mask".to_string()));
        };
        let LayerKind::Mask { luminosity } = layer.kind else {
            return Err(Error::Render("end_mask closes a group or tile".to_string()));
        };
        let mask_type = if luminosity {
            MaskType::Luminance
        } else {
            MaskType::Alpha
        };
        self.push_mask_clip(Mask::from_pixmap(layer.pixmap.as_ref(), mask_type));
        Ok(())
    }

    fn begin_group(
        &mut self,
        _area: &Rect,
        _isolated: bool,
        _knockout: bool,
        blend: BlendMode,
        alpha: f32,
    ) -> Result<()> {
        self.push_layer(LayerKind::Group { blend, alpha }, None)
    }

    fn end_group(&mut self) -> Result<()> {
        let Some(layer) = self.layers.pop() else {
            return Err(Error::Render("end_group without begin_group".to_string()));
        };
        let LayerKind::Group { blend, alpha } = layer.kind else {
            return Err(Error::Render("end_group closes a mask or tile".to_string()));
        };
        let paint = PixmapPaint {
            opacity: alpha.clamp(0.0, 1.0),
            blend_mode: skia_blend_mode(blend),
            quality: FilterQuality::Nearest,
        };
        let (pixmap, clip) = self.surface();
        pixmap.draw_pixmap(0, 0, layer.pixmap.as_ref(), &paint, Transform::identity(), clip);
        Ok(())
    }

    fn begin_tile(
        &mut self,
        _area: &Rect,
        _view: &Rect,
        _xstep: f32,
        _ystep: f32,
        _ctm: &Matrix,
    ) -> Result<()> {
        self.push_layer(LayerKind::Tile, None)
    }

    fn end_tile(&mut self) -> Result<()> {
        let Some(layer) = self.layers.pop() else {
            return Err(Error::Render("end_tile without begin_tile".to_string()));
        };
        if !matches!(layer.kind, LayerKind::Tile) {
            return Err(Error::Render("end_tile closes a mask or group".to_string()));
        }
        let (pixmap, _) = self.surface();
        pixmap.draw_pixmap(
            0,
            0,
            layer.pixmap.as_ref(),
            &PixmapPaint::default(),
            Transform::identity(),
            None,
        );
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        if !self.clips.is_empty() || !self.layers.is_empty() {
            log::warn!(
                "Closing raster device with {} clips and {} layers open",
                self.clips.len(),
                self.layers.len()
            );
        }
        self.closed = true;
        Ok(())
    }
}

fn fill_rule(even_odd: bool) -> FillRule {
    if even_odd {
        FillRule::EvenOdd
    } else {
        FillRule::Winding
    }
}

fn new_pixmap(width: u32, height: u32) -> Result<Pixmap> {
    Pixmap::new(width, height)
        .ok_or_else(|| Error::Render(format!("Failed to create pixmap {}x{}", width, height)))
}

fn new_mask(width: u32, height: u32) -> Result<Mask> {
    Mask::new(width, height)
        .ok_or_else(|| Error::Render(format!("Failed to create mask {}x{}", width, height)))
}

/// Premultiply an image into a pixmap, mapping each straight RGBA pixel first.
fn image_pixmap(image: &Image, map: impl Fn(&[u8]) -> [u8; 4]) -> Result<Pixmap> {
    image.validate()?;
    let mut data = Vec::with_capacity(image.pixels().len());
    for px in image.pixels().chunks_exact(4) {
        let [r, g, b, a] = map(px);
        let premultiply = |c: u8| ((c as u16 * a as u16 + 127) / 255) as u8;
        data.extend_from_slice(&[premultiply(r), premultiply(g), premultiply(b), a]);
    }
    IntSize::from_wh(image.width(), image.height())
        .and_then(|size| Pixmap::from_vec(data, size))
        .ok_or_else(|| Error::Render("Failed to wrap image pixels".to_string()))
}
