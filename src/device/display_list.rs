//! Recorded drawing calls.

use super::{BlendMode, Color, DrawDevice, Image, Path, Shade, StrokeState, Text};
use crate::anonymizer::PageSource;
use crate::error::{Error, Result};
use crate::geometry::{Matrix, Rect};

/// One recorded device call.
#[derive(Debug, Clone)]
#[allow(missing_docs)]
pub enum DisplayCommand {
    FillText {
        text: Text,
        ctm: Matrix,
        color: Color,
        alpha: f32,
    },
    StrokeText {
        text: Text,
        stroke: StrokeState,
        ctm: Matrix,
        color: Color,
        alpha: f32,
    },
    ClipText {
        text: Text,
        ctm: Matrix,
    },
    ClipStrokeText {
        text: Text,
        stroke: StrokeState,
        ctm: Matrix,
    },
    IgnoreText {
        text: Text,
        ctm: Matrix,
    },
    FillPath {
        path: Path,
        even_odd: bool,
        ctm: Matrix,
        color: Color,
        alpha: f32,
    },
    StrokePath {
        path: Path,
        stroke: StrokeState,
        ctm: Matrix,
        color: Color,
        alpha: f32,
    },
    ClipPath {
        path: Path,
        even_odd: bool,
        ctm: Matrix,
    },
    ClipStrokePath {
        path: Path,
        stroke: StrokeState,
        ctm: Matrix,
    },
    FillShade {
        shade: Shade,
        ctm: Matrix,
        alpha: f32,
    },
    FillImage {
        image: Image,
        ctm: Matrix,
        alpha: f32,
    },
    FillImageMask {
        image: Image,
        ctm: Matrix,
        color: Color,
        alpha: f32,
    },
    ClipImageMask {
        image: Image,
        ctm: Matrix,
    },
    PopClip,
    BeginMask {
        area: Rect,
        luminosity: bool,
        backdrop: Color,
    },
    EndMask,
    BeginGroup {
        area: Rect,
        isolated: bool,
        knockout: bool,
        blend: BlendMode,
        alpha: f32,
    },
    EndGroup,
    BeginTile {
        area: Rect,
        view: Rect,
        xstep: f32,
        ystep: f32,
        ctm: Matrix,
    },
    EndTile,
}

impl DisplayCommand {
    /// Whether this is one of the five text operations.
    pub fn is_text(&self) -> bool {
        matches!(
            self,
            DisplayCommand::FillText { .. }
                | DisplayCommand::StrokeText { .. }
                | DisplayCommand::ClipText { .. }
                | DisplayCommand::ClipStrokeText { .. }
                | DisplayCommand::IgnoreText { .. }
        )
    }

    /// The text run, for text operations.
    pub fn text(&self) -> Option<&Text> {
        match self {
            DisplayCommand::FillText { text, .. }
            | DisplayCommand::StrokeText { text, .. }
            | DisplayCommand::ClipText { text, .. }
            | DisplayCommand::ClipStrokeText { text, .. }
            | DisplayCommand::IgnoreText { text, .. } => Some(text),
            _ => None,
        }
    }

    /// Issue this call on `device`, with `ctm` appended to every transform.
    pub fn replay(&self, device: &mut dyn DrawDevice, ctm: &Matrix) -> Result<()> {
        use DisplayCommand::*;
        let m = |own: &Matrix| own.concat(ctm);
        match self {
            FillText {
                text,
                ctm: own,
                color,
                alpha,
            } => device.fill_text(text, &m(own), color, *alpha),
            StrokeText {
                text,
                stroke,
                ctm: own,
                color,
                alpha,
            } => device.stroke_text(text, stroke, &m(own), color, *alpha),
            ClipText { text, ctm: own } => device.clip_text(text, &m(own)),
            ClipStrokeText {
                text,
                stroke,
                ctm: own,
            } => device.clip_stroke_text(text, stroke, &m(own)),
            IgnoreText { text, ctm: own } => device.ignore_text(text, &m(own)),
            FillPath {
                path,
                even_odd,
                ctm: own,
                color,
                alpha,
            } => device.fill_path(path, *even_odd, &m(own), color, *alpha),
            StrokePath {
                path,
                stroke,
                ctm: own,
                color,
                alpha,
            } => device.stroke_path(path, stroke, &m(own), color, *alpha),
            ClipPath {
                path,
                even_odd,
                ctm: own,
            } => device.clip_path(path, *even_odd, &m(own)),
            ClipStrokePath {
                path,
                stroke,
                ctm: own,
            } => device.clip_stroke_path(path, stroke, &m(own)),
            FillShade {
                shade,
                ctm: own,
                alpha,
            } => device.fill_shade(shade, &m(own), *alpha),
            FillImage {
                image,
                ctm: own,
                alpha,
            } => device.fill_image(image, &m(own), *alpha),
            FillImageMask {
                image,
                ctm: own,
                color,
                alpha,
            } => device.fill_image_mask(image, &m(own), color, *alpha),
            ClipImageMask { image, ctm: own } => device.clip_image_mask(image, &m(own)),
            PopClip => device.pop_clip(),
            BeginMask {
                area,
                luminosity,
                backdrop,
            } => device.begin_mask(&area.transform(ctm), *luminosity, backdrop),
            EndMask => device.end_mask(),
            BeginGroup {
                area,
                isolated,
                knockout,
                blend,
                alpha,
            } => device.begin_group(&area.transform(ctm), *isolated, *knockout, *blend, *alpha),
            EndGroup => device.end_group(),
            BeginTile {
                area,
                view,
                xstep,
                ystep,
                ctm: own,
            } => device.begin_tile(&area.transform(ctm), view, *xstep, *ystep, &m(own)),
            EndTile => device.end_tile(),
        }
    }
}

/// A device that records every call it receives.
#[derive(Debug, Clone, Default)]
pub struct DisplayList {
    commands: Vec<DisplayCommand>,
    closed: bool,
}

impl DisplayList {
    /// Create an empty list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a command.
    pub fn push(&mut self, command: DisplayCommand) {
        self.commands.push(command);
    }

    /// Recorded commands in call order.
    pub fn commands(&self) -> &[DisplayCommand] {
        &self.commands
    }

    /// Number of recorded commands.
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    /// Whether nothing was recorded.
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Whether `close` was called.
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Every text run recorded, in order.
    pub fn texts(&self) -> impl Iterator<Item = &Text> {
        self.commands.iter().filter_map(DisplayCommand::text)
    }

    /// Replay every command onto `device`.
    pub fn replay(&self, device: &mut dyn DrawDevice, ctm: &Matrix) -> Result<()> {
        for command in &self.commands {
            command.replay(device, ctm)?;
        }
        Ok(())
    }
}

impl DrawDevice for DisplayList {
    fn fill_text(&mut self, text: &Text, ctm: &Matrix, color: &Color, alpha: f32) -> Result<()> {
        self.push(DisplayCommand::FillText {
            text: text.clone(),
            ctm: *ctm,
            color: *color,
            alpha,
        });
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
        self.push(DisplayCommand::StrokeText {
            text: text.clone(),
            stroke: stroke.clone(),
            ctm: *ctm,
            color: *color,
            alpha,
        });
        Ok(())
    }

    fn clip_text(&mut self, text: &Text, ctm: &Matrix) -> Result<()> {
        self.push(DisplayCommand::ClipText {
            text: text.clone(),
            ctm: *ctm,
        });
        Ok(())
    }

    fn clip_stroke_text(&mut self, text: &Text, stroke: &StrokeState, ctm: &Matrix) -> Result<()> {
        self.push(DisplayCommand::ClipStrokeText {
            text: text.clone(),
            stroke: stroke.clone(),
            ctm: *ctm,
        });
        Ok(())
    }

    fn ignore_text(&mut self, text: &Text, ctm: &Matrix) -> Result<()> {
        self.push(DisplayCommand::IgnoreText {
            text: text.clone(),
            ctm: *ctm,
        });
        Ok(())
    }

    fn fill_path(
        &mut self,
        path: &Path,
        even_odd: bool,
        ctm: &Matrix,
        color: &Color,
        alpha: f32,
    ) -> Result<()> {
        self.push(DisplayCommand::FillPath {
            path: path.clone(),
            even_odd,
            ctm: *ctm,
            color: *color,
            alpha,
        });
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
        self.push(DisplayCommand::StrokePath {
            path: path.clone(),
            stroke: stroke.clone(),
            ctm: *ctm,
            color: *color,
            alpha,
        });
        Ok(())
    }

    fn clip_path(&mut self, path: &Path, even_odd: bool, ctm: &Matrix) -> Result<()> {
        self.push(DisplayCommand::ClipPath {
            path: path.clone(),
            even_odd,
            ctm: *ctm,
        });
        Ok(())
    }

    fn clip_stroke_path(&mut self, path: &Path, stroke: &StrokeState, ctm: &Matrix) -> Result<()> {
        self.push(DisplayCommand::ClipStrokePath {
            path: path.clone(),
            stroke: stroke.clone(),
            ctm: *ctm,
        });
        Ok(())
    }

    fn fill_shade(&mut self, shade: &Shade, ctm: &Matrix, alpha: f32) -> Result<()> {
        self.push(DisplayCommand::FillShade {
            shade: shade.clone(),
            ctm: *ctm,
            alpha,
        });
        Ok(())
    }

    fn fill_image(&mut self, image: &Image, ctm: &Matrix, alpha: f32) -> Result<()> {
        self.push(DisplayCommand::FillImage {
            image: image.clone(),
            ctm: *ctm,
            alpha,
        });
        Ok(())
    }

    fn fill_image_mask(
        &mut self,
        image: &Image,
        ctm: &Matrix,
        color: &Color,
        alpha: f32,
    ) -> Result<()> {
        self.push(DisplayCommand::FillImageMask {
            image: image.clone(),
            ctm: *ctm,
            color: *color,
            alpha,
        });
        Ok(())
    }

    fn clip_image_mask(&mut self, image: &Image, ctm: &Matrix) -> Result<()> {
        self.push(DisplayCommand::ClipImageMask {
            image: image.clone(),
            ctm: *ctm,
        });
        Ok(())
    }

    fn pop_clip(&mut self) -> Result<()> {
        self.push(DisplayCommand::PopClip);
        Ok(())
    }

    fn begin_mask(&mut self, area: &Rect, luminosity: bool, backdrop: &Color) -> Result<()> {
        self.push(DisplayCommand::BeginMask {
            area: *area,
            luminosity,
            backdrop: *backdrop,
        });
        Ok(())
    }

    fn end_mask(&mut self) -> Result<()> {
        self.push(DisplayCommand::EndMask);
        Ok(())
    }

    fn begin_group(
        &mut self,
        area: &Rect,
        isolated: bool,
        knockout: bool,
        blend: BlendMode,
        alpha: f32,
    ) -> Result<()> {
        self.push(DisplayCommand::BeginGroup {
            area: *area,
            isolated,
            knockout,
            blend,
            alpha,
        });
        Ok(())
    }

    fn end_group(&mut self) -> Result<()> {
        self.push(DisplayCommand::EndGroup);
        Ok(())
    }

    fn begin_tile(
        &mut self,
        area: &Rect,
        view: &Rect,
        xstep: f32,
        ystep: f32,
        ctm: &Matrix,
    ) -> Result<()> {
        self.push(DisplayCommand::BeginTile {
            area: *area,
            view: *view,
            xstep,
            ystep,
            ctm: *ctm,
        });
        Ok(())
    }

    fn end_tile(&mut self) -> Result<()> {
        self.push(DisplayCommand::EndTile);
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        self.closed = true;
        Ok(())
    }
}

/// A single page backed by a display list recorded in page space.
#[derive(Debug, Clone)]
pub struct DisplayListPage {
    bounds: Rect,
    list: DisplayList,
}

impl DisplayListPage {
    /// Wrap a display list with its page bounds.
    pub fn new(bounds: Rect, list: DisplayList) -> Self {
        Self { bounds, list }
    }

    /// Page bounds in page space.
    pub fn bounds(&self) -> Rect {
        self.bounds
    }

    /// The recorded content.
    pub fn list(&self) -> &DisplayList {
        &self.list
    }
}

impl PageSource for DisplayListPage {
    fn page_count(&self) -> usize {
        1
    }

    fn page_bounds(&self, index: usize) -> Result<Rect> {
        if index != 0 {
            return Err(Error::PageOutOfRange { index, count: 1 });
        }
        Ok(self.bounds)
    }

    fn run_page(&self, index: usize, device: &mut dyn DrawDevice, ctm: &Matrix) -> Result<()> {
        if index != 0 {
            return Err(Error::PageOutOfRange { index, count: 1 });
        }
        self.list.replay(device, ctm)
    }
}
