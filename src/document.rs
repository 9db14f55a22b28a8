//! JSON page descriptions.
//!
//! A [`JsonDocument`] is a small, engine-free stand-in for a real document:
//! a set of fonts given by their metrics and a list of pages, each a list of
//! drawing operations in page space (points, y down). Pages are compiled to
//! [`DisplayList`]s when the document is loaded, so running a page only
//! replays recorded calls.
//!
//! ```json
//! {
//!   "fonts": {
//!     "Body": { "kind": "metrics", "default_advance": 0.5, "advances": { "i": 0.25 } },
//!     "Serif": { "kind": "truetype", "path": "fonts/serif.ttf" }
//!   },
//!   "pages": [
//!     {
//!       "width": 612, "height": 792,
//!       "content": [
//!         { "op": "text", "font": "Body", "size": 12, "x": 72, "y": 72, "text": "Dear Alice," },
//!         { "op": "path", "path": [ { "move_to": { "x": 72, "y": 80 } }, { "line_to": { "x": 300, "y": 80 } } ],
//!           "stroke": { "gray": 0.0 } }
//!       ]
//!     }
//!   ]
//! }
//! ```

use std::path::{Path as FsPath, PathBuf};
use std::sync::Arc;

use indexmap::IndexMap;
use serde::Deserialize;

use crate::anonymizer::PageSource;
use crate::device::{
    BlendMode, Color, DisplayList, DisplayListPage, DrawDevice, Image, Path, Shade, StrokeState,
    Text,
};
use crate::error::{Error, Result};
use crate::fonts::{FontRef, MetricsFont, TrueTypeFont, WritingMode};
use crate::geometry::{Matrix, Rect};

/// How a font is provided.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FontSpec {
    /// An advance table in em units, keyed by character
    Metrics {
        /// Advance of characters missing from `advances`
        #[serde(default = "default_advance")]
        default_advance: f32,
        /// Per-character advances
        #[serde(default)]
        advances: IndexMap<char, f32>,
    },
    /// A TrueType/OpenType file, relative to the document
    #[serde(rename = "truetype")]
    TrueType {
        /// Font file path
        path: PathBuf,
    },
}

fn default_advance() -> f32 {
    0.5
}

fn opaque() -> f32 {
    1.0
}

/// How a text run is painted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextRender {
    /// Fill the glyphs
    #[default]
    Fill,
    /// Stroke the glyph outlines
    Stroke,
    /// Add the glyphs to the clip
    Clip,
    /// Add the stroked glyphs to the clip
    ClipStroke,
    /// Lay out the glyphs without painting them
    Invisible,
}

/// One drawing operation of a page.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum ContentOp {
    /// A run of text starting at the baseline point `(x, y)`
    Text {
        /// Font name from the `fonts` table
        font: String,
        /// Font size in points
        size: f32,
        /// Baseline start x
        x: f32,
        /// Baseline start y
        y: f32,
        /// Characters to show
        text: String,
        /// Paint mode
        #[serde(default)]
        render: TextRender,
        /// Paint color
        #[serde(default)]
        color: Color,
        /// Opacity
        #[serde(default = "opaque")]
        alpha: f32,
        /// Writing mode
        #[serde(default)]
        wmode: WritingMode,
        /// Stroke parameters for stroked modes
        #[serde(default)]
        stroke: StrokeState,
    },
    /// A path, filled and/or stroked
    Path {
        /// Segments
        path: Path,
        /// Fill color
        #[serde(default)]
        fill: Option<Color>,
        /// Stroke color
        #[serde(default)]
        stroke: Option<Color>,
        /// Stroke parameters
        #[serde(default)]
        stroke_state: StrokeState,
        /// Use the even-odd fill rule
        #[serde(default)]
        even_odd: bool,
        /// Opacity
        #[serde(default = "opaque")]
        alpha: f32,
    },
    /// An image placed in a rectangle
    Image {
        /// Placement rectangle
        rect: Rect,
        /// Pixels
        image: Image,
        /// Opacity
        #[serde(default = "opaque")]
        alpha: f32,
    },
    /// A smooth shading over the current clip
    Shade {
        /// Shading
        shade: Shade,
        /// Opacity
        #[serde(default = "opaque")]
        alpha: f32,
    },
    /// Push a clip path
    Clip {
        /// Segments
        path: Path,
        /// Use the even-odd fill rule
        #[serde(default)]
        even_odd: bool,
    },
    /// Pop the most recent clip
    PopClip,
    /// A transparency group
    Group {
        /// Group opacity
        #[serde(default = "opaque")]
        alpha: f32,
        /// Blend mode
        #[serde(default)]
        blend: BlendMode,
        /// Group content
        content: Vec<ContentOp>,
    },
}

/// One page: its size in points and its content.
#[derive(Debug, Clone, Deserialize)]
pub struct PageDescription {
    /// Width in points
    pub width: f32,
    /// Height in points
    pub height: f32,
    /// Drawing operations in order
    #[serde(default)]
    pub content: Vec<ContentOp>,
}

/// The deserialized document file.
#[derive(Debug, Clone, Deserialize)]
pub struct DocumentDescription {
    /// Fonts by name
    #[serde(default)]
    pub fonts: IndexMap<String, FontSpec>,
    /// Pages in order
    pub pages: Vec<PageDescription>,
}

/// A document compiled from a [`DocumentDescription`].
#[derive(Debug, Clone)]
pub struct JsonDocument {
    pages: Vec<DisplayListPage>,
}

impl JsonDocument {
    /// Load a document file; font paths resolve against its directory.
    pub fn open(path: impl AsRef<FsPath>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)?;
        let base_dir = path.parent().unwrap_or_else(|| FsPath::new("."));
        let document = Self::from_json_str(&json, base_dir)?;
        log::info!("Loaded {} ({} pages)", path.display(), document.pages.len());
        Ok(document)
    }

    /// Parse a document from JSON text.
    pub fn from_json_str(json: &str, base_dir: &FsPath) -> Result<Self> {
        let description: DocumentDescription = serde_json::from_str(json)?;
        Self::from_description(&description, base_dir)
    }

    /// Compile a parsed description.
    pub fn from_description(description: &DocumentDescription, base_dir: &FsPath) -> Result<Self> {
        let fonts = description
            .fonts
            .iter()
            .map(|(name, spec)| Ok((name.clone(), load_font(name, spec, base_dir)?)))
            .collect::<Result<IndexMap<String, FontRef>>>()?;

        let pages = description
            .pages
            .iter()
            .map(|page| {
                let bounds = Rect::new(0.0, 0.0, page.width, page.height);
                let mut list = DisplayList::new();
                for op in &page.content {
                    compile_op(op, &fonts, &bounds, &mut list)?;
                }
                Ok(DisplayListPage::new(bounds, list))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { pages })
    }

    /// Compiled pages.
    pub fn pages(&self) -> &[DisplayListPage] {
        &self.pages
    }

    fn page(&self, index: usize) -> Result<&DisplayListPage> {
        self.pages.get(index).ok_or(Error::PageOutOfRange {
            index,
            count: self.pages.len(),
        })
    }
}

impl PageSource for JsonDocument {
    fn page_count(&self) -> usize {
        self.pages.len()
    }

    fn page_bounds(&self, index: usize) -> Result<Rect> {
        Ok(self.page(index)?.bounds())
    }

    fn run_page(&self, index: usize, device: &mut dyn DrawDevice, ctm: &Matrix) -> Result<()> {
        self.page(index)?.list().replay(device, ctm)
    }
}

fn load_font(name: &str, spec: &FontSpec, base_dir: &FsPath) -> Result<FontRef> {
    Ok(match spec {
        FontSpec::Metrics {
            default_advance,
            advances,
        } => Arc::new(MetricsFont::from_char_advances(
            name,
            *default_advance,
            advances.iter().map(|(&ch, &advance)| (ch, advance)),
        )),
        FontSpec::TrueType { path } => {
            Arc::new(TrueTypeFont::open(base_dir.join(path), Some(name))?)
        },
    })
}

/// Lay out a string as glyph shows, one per character.
pub fn layout_text(
    font: &FontRef,
    size: f32,
    x: f32,
    y: f32,
    text: &str,
    wmode: WritingMode,
) -> Text {
    let mut run = Text::new();
    let mut matrix = Matrix::new(size, 0.0, 0.0, -size, x, y);
    for ch in text.chars() {
        let unicode = ch as u32;
        let glyph = font.glyph_for_unicode(unicode).unwrap_or(unicode);
        run.show_glyph(font.clone(), matrix, glyph, unicode, wmode);
        let advance = font.advance_glyph(glyph, wmode);
        matrix = match wmode {
            WritingMode::Horizontal => matrix.advance(advance, 0.0),
            WritingMode::Vertical => matrix.advance(0.0, -advance),
        };
    }
    run
}

fn compile_op(
    op: &ContentOp,
    fonts: &IndexMap<String, FontRef>,
    bounds: &Rect,
    list: &mut DisplayList,
) -> Result<()> {
    let identity = Matrix::identity();
    match op {
        ContentOp::Text {
            font,
            size,
            x,
            y,
            text,
            render,
            color,
            alpha,
            wmode,
            stroke,
        } => {
            let font = fonts
                .get(font)
                .ok_or_else(|| Error::UnknownFont(font.clone()))?;
            let run = layout_text(font, *size, *x, *y, text, *wmode);
            match render {
                TextRender::Fill => list.fill_text(&run, &identity, color, *alpha),
                TextRender::Stroke => list.stroke_text(&run, stroke, &identity, color, *alpha),
                TextRender::Clip => list.clip_text(&run, &identity),
                TextRender::ClipStroke => list.clip_stroke_text(&run, stroke, &identity),
                TextRender::Invisible => list.ignore_text(&run, &identity),
            }
        },
        ContentOp::Path {
            path,
            fill,
            stroke,
            stroke_state,
            even_odd,
            alpha,
        } => {
            if let Some(color) = fill {
                list.fill_path(path, *even_odd, &identity, color, *alpha)?;
            }
            if let Some(color) = stroke {
                list.stroke_path(path, stroke_state, &identity, color, *alpha)?;
            }
            Ok(())
        },
        ContentOp::Image { rect, image, alpha } => {
            image.validate()?;
            let placement = Matrix::new(rect.width, 0.0, 0.0, rect.height, rect.x, rect.y);
            list.fill_image(image, &placement, *alpha)
        },
        ContentOp::Shade { shade, alpha } => list.fill_shade(shade, &identity, *alpha),
        ContentOp::Clip { path, even_odd } => list.clip_path(path, *even_odd, &identity),
        ContentOp::PopClip => list.pop_clip(),
        ContentOp::Group {
            alpha,
            blend,
            content,
        } => {
            // Groups span the whole page
            list.begin_group(bounds, true, false, *blend, *alpha)?;
            for inner in content {
                compile_op(inner, fonts, bounds, list)?;
            }
            list.end_group()
        },
    }
}
