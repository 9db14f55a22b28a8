//! Values passed through the draw device interface.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::fonts::{FontRef, WritingMode};
use crate::geometry::{Matrix, Point, Quad, Rect};

/// One glyph as the host engine shows it.
#[derive(Debug, Clone)]
pub struct GlyphShow {
    /// Font the glyph belongs to
    pub font: FontRef,
    /// Glyph space to text space
    pub matrix: Matrix,
    /// Font-internal glyph index
    pub glyph: u32,
    /// Unicode codepoint
    pub unicode: u32,
    /// Writing mode
    pub wmode: WritingMode,
    /// Extra advance in glyph space on top of the font metric
    pub kerning: f32,
}

/// A run of shown glyphs.
#[derive(Debug, Clone, Default)]
pub struct Text {
    glyphs: Vec<GlyphShow>,
}

impl Text {
    /// Create an empty text run.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a run from glyph shows.
    pub fn from_glyphs(glyphs: Vec<GlyphShow>) -> Self {
        Self { glyphs }
    }

    /// Append a glyph.
    pub fn show_glyph(
        &mut self,
        font: FontRef,
        matrix: Matrix,
        glyph: u32,
        unicode: u32,
        wmode: WritingMode,
    ) {
        self.show_kerned_glyph(font, matrix, glyph, unicode, wmode, 0.0);
    }

    /// Append a glyph whose advance is adjusted by `kerning`.
    pub fn show_kerned_glyph(
        &mut self,
        font: FontRef,
        matrix: Matrix,
        glyph: u32,
        unicode: u32,
        wmode: WritingMode,
        kerning: f32,
    ) {
        self.glyphs.push(GlyphShow {
            font,
            matrix,
            glyph,
            unicode,
            wmode,
            kerning,
        });
    }

    /// Glyphs in show order.
    pub fn glyphs(&self) -> &[GlyphShow] {
        &self.glyphs
    }

    /// Number of glyphs.
    pub fn len(&self) -> usize {
        self.glyphs.len()
    }

    /// Whether the run shows nothing.
    pub fn is_empty(&self) -> bool {
        self.glyphs.is_empty()
    }

    /// Characters of the run, invalid codepoints as U+FFFD.
    pub fn to_plain_string(&self) -> String {
        self.glyphs
            .iter()
            .map(|g| char::from_u32(g.unicode).unwrap_or(char::REPLACEMENT_CHARACTER))
            .collect()
    }
}

/// One path construction step.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PathSegment {
    /// Start a subpath
    MoveTo(Point),
    /// Straight line
    LineTo(Point),
    /// Cubic Bézier curve: two control points then the end point
    CurveTo(Point, Point, Point),
    /// Close the current subpath
    Close,
}

/// A vector path in the coordinate space of the ctm it is drawn with.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Path {
    segments: Vec<PathSegment>,
}

impl Path {
    /// Create an empty path.
    pub fn new() -> Self {
        Self::default()
    }

    /// Begin a subpath.
    pub fn move_to(&mut self, x: f32, y: f32) -> &mut Self {
        self.segments.push(PathSegment::MoveTo(Point::new(x, y)));
        self
    }

    /// Add a straight line.
    pub fn line_to(&mut self, x: f32, y: f32) -> &mut Self {
        self.segments.push(PathSegment::LineTo(Point::new(x, y)));
        self
    }

    /// Add a cubic curve.
    pub fn curve_to(&mut self, x1: f32, y1: f32, x2: f32, y2: f32, x3: f32, y3: f32) -> &mut Self {
        self.segments.push(PathSegment::CurveTo(
            Point::new(x1, y1),
            Point::new(x2, y2),
            Point::new(x3, y3),
        ));
        self
    }

    /// Close the current subpath.
    pub fn close(&mut self) -> &mut Self {
        self.segments.push(PathSegment::Close);
        self
    }

    /// Closed outline of a quadrilateral.
    pub fn from_quad(quad: &Quad) -> Self {
        let mut path = Self::new();
        let [p0, p1, p2, p3] = quad.points;
        path.move_to(p0.x, p0.y)
            .line_to(p1.x, p1.y)
            .line_to(p2.x, p2.y)
            .line_to(p3.x, p3.y)
            .close();
        path
    }

    /// Closed outline of a rectangle.
    pub fn from_rect(rect: &Rect) -> Self {
        Self::from_quad(&Quad::new([
            Point::new(rect.left(), rect.top()),
            Point::new(rect.right(), rect.top()),
            Point::new(rect.right(), rect.bottom()),
            Point::new(rect.left(), rect.bottom()),
        ]))
    }

    /// Construction steps in order.
    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }

    /// Whether the path has no segments.
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }
}

/// Line cap style.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineCap {
    /// Square end at the endpoint
    #[default]
    Butt,
    /// Semicircular end
    Round,
    /// Square end projecting half the line width
    Square,
}

/// Line join style.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineJoin {
    /// Sharp corner up to the miter limit
    #[default]
    Miter,
    /// Rounded corner
    Round,
    /// Cut-off corner
    Bevel,
}

/// Stroke parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StrokeState {
    /// Line width in user space
    pub line_width: f32,
    /// Cap style
    pub line_cap: LineCap,
    /// Join style
    pub line_join: LineJoin,
    /// Miter limit
    pub miter_limit: f32,
    /// Dash lengths; empty for solid lines
    pub dash: Vec<f32>,
    /// Offset into the dash pattern
    pub dash_phase: f32,
}

impl Default for StrokeState {
    fn default() -> Self {
        Self {
            line_width: 1.0,
            line_cap: LineCap::Butt,
            line_join: LineJoin::Miter,
            miter_limit: 10.0,
            dash: Vec::new(),
            dash_phase: 0.0,
        }
    }
}

impl StrokeState {
    /// Solid stroke of the given width.
    pub fn with_width(line_width: f32) -> Self {
        Self {
            line_width,
            ..Self::default()
        }
    }
}

/// A device color in its color space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Color {
    /// DeviceGray
    Gray(f32),
    /// DeviceRGB
    Rgb([f32; 3]),
    /// DeviceCMYK
    Cmyk([f32; 4]),
}

impl Default for Color {
    fn default() -> Self {
        Color::BLACK
    }
}

impl Color {
    /// Black in DeviceGray.
    pub const BLACK: Color = Color::Gray(0.0);

    /// Red in DeviceRGB.
    pub const RED: Color = Color::Rgb([1.0, 0.0, 0.0]);

    /// Convert to RGB components in [0, 1].
    pub fn to_rgb(&self) -> [f32; 3] {
        match *self {
            Color::Gray(g) => [g, g, g],
            Color::Rgb(rgb) => rgb,
            Color::Cmyk([c, m, y, k]) => cmyk_to_rgb(c, m, y, k),
        }
    }
}

/// Naive CMYK to RGB conversion.
pub fn cmyk_to_rgb(c: f32, m: f32, y: f32, k: f32) -> [f32; 3] {
    [(1.0 - c) * (1.0 - k), (1.0 - m) * (1.0 - k), (1.0 - y) * (1.0 - k)]
}

/// A raster image in straight (non-premultiplied) RGBA8.
///
/// Images are drawn into the unit square of their ctm, top row first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Image {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl Image {
    /// Wrap RGBA8 pixel data.
    pub fn new(width: u32, height: u32, pixels: Vec<u8>) -> Result<Self> {
        let image = Self {
            width,
            height,
            pixels,
        };
        image.validate()?;
        Ok(image)
    }

    /// An image of a single color.
    pub fn solid(width: u32, height: u32, rgba: [u8; 4]) -> Self {
        let pixels = rgba
            .iter()
            .copied()
            .cycle()
            .take(width as usize * height as usize * 4)
            .collect();
        Self {
            width,
            height,
            pixels,
        }
    }

    /// Check that the pixel buffer matches the dimensions.
    pub fn validate(&self) -> Result<()> {
        let expected = self.width as usize * self.height as usize * 4;
        if self.width == 0 || self.height == 0 || self.pixels.len() != expected {
            return Err(Error::Render(format!(
                "image {}x{} needs {} bytes of RGBA, got {}",
                self.width,
                self.height,
                expected,
                self.pixels.len()
            )));
        }
        Ok(())
    }

    /// Width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// RGBA8 pixels, row-major.
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }
}

/// Shading geometry.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShadeKind {
    /// Linear gradient between two points
    Axial {
        /// Where offset 0 lies
        start: Point,
        /// Where offset 1 lies
        end: Point,
    },
    /// Circular gradient around a center
    Radial {
        /// Circle center
        center: Point,
        /// Radius at offset 1
        radius: f32,
    },
}

/// One color stop of a shading.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ShadeStop {
    /// Position in [0, 1]
    pub offset: f32,
    /// Color at that position
    pub color: Color,
}

/// A smooth shading filling the current clip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Shade {
    /// Geometry
    pub kind: ShadeKind,
    /// Color stops, ordered by offset
    pub stops: Vec<ShadeStop>,
}

/// Transparency group blend mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlendMode {
    /// Source over
    #[default]
    Normal,
    /// Multiply
    Multiply,
    /// Screen
    Screen,
    /// Overlay
    Overlay,
    /// Darken
    Darken,
    /// Lighten
    Lighten,
    /// Color dodge
    ColorDodge,
    /// Color burn
    ColorBurn,
    /// Hard light
    HardLight,
    /// Soft light
    SoftLight,
    /// Difference
    Difference,
    /// Exclusion
    Exclusion,
}
