//! The draw device interface.
//!
//! A page is rendered by calling one [`DrawDevice`] method per drawing
//! primitive, in content order. Every method has a default that forwards
//! to [`DrawDevice::target`], so wrapping devices only override what they
//! change and pass everything else through untouched.
//!
//! Devices in this module:
//!
//! - [`AnonymizingDevice`] rewrites every text run before forwarding it
//! - [`CharacterAnalyzer`] records glyph shows to build the character catalog
//! - [`DisplayList`] records calls for later replay

mod analyzer;
mod anonymizing;
mod display_list;
mod values;

pub use analyzer::CharacterAnalyzer;
pub use anonymizing::AnonymizingDevice;
pub use display_list::{DisplayCommand, DisplayList, DisplayListPage};
pub use values::{
    cmyk_to_rgb, BlendMode, Color, GlyphShow, Image, LineCap, LineJoin, Path, PathSegment, Shade,
    ShadeKind, ShadeStop, StrokeState, Text,
};

use crate::error::Result;
use crate::geometry::{Matrix, Rect};

/// A sink for drawing primitives.
///
/// `ctm` arguments map the primitive's own space to device space. Areas
/// passed to mask, group and tile calls are in device space.
pub trait DrawDevice {
    /// Device that calls are forwarded to by default.
    fn target(&mut self) -> Option<&mut dyn DrawDevice> {
        None
    }

    /// Fill glyph outlines.
    fn fill_text(&mut self, text: &Text, ctm: &Matrix, color: &Color, alpha: f32) -> Result<()> {
        match self.target() {
            Some(target) => target.fill_text(text, ctm, color, alpha),
            None => Ok(()),
        }
    }

    /// Stroke glyph outlines.
    fn stroke_text(
        &mut self,
        text: &Text,
        stroke: &StrokeState,
        ctm: &Matrix,
        color: &Color,
        alpha: f32,
    ) -> Result<()> {
        match self.target() {
            Some(target) => target.stroke_text(text, stroke, ctm, color, alpha),
            None => Ok(()),
        }
    }

    /// Push glyph outlines as a clip.
    fn clip_text(&mut self, text: &Text, ctm: &Matrix) -> Result<()> {
        match self.target() {
            Some(target) => target.clip_text(text, ctm),
            None => Ok(()),
        }
    }

    /// Push stroked glyph outlines as a clip.
    fn clip_stroke_text(&mut self, text: &Text, stroke: &StrokeState, ctm: &Matrix) -> Result<()> {
        match self.target() {
            Some(target) => target.clip_stroke_text(text, stroke, ctm),
            None => Ok(()),
        }
    }

    /// Text that is laid out but not painted (render mode 3).
    fn ignore_text(&mut self, text: &Text, ctm: &Matrix) -> Result<()> {
        match self.target() {
            Some(target) => target.ignore_text(text, ctm),
            None => Ok(()),
        }
    }

    /// Fill a path.
    fn fill_path(
        &mut self,
        path: &Path,
        even_odd: bool,
        ctm: &Matrix,
        color: &Color,
        alpha: f32,
    ) -> Result<()> {
        match self.target() {
            Some(target) => target.fill_path(path, even_odd, ctm, color, alpha),
            None => Ok(()),
        }
    }

    /// Stroke a path.
    fn stroke_path(
        &mut self,
        path: &Path,
        stroke: &StrokeState,
        ctm: &Matrix,
        color: &Color,
        alpha: f32,
    ) -> Result<()> {
        match self.target() {
            Some(target) => target.stroke_path(path, stroke, ctm, color, alpha),
            None => Ok(()),
        }
    }

    /// Push a path as a clip.
    fn clip_path(&mut self, path: &Path, even_odd: bool, ctm: &Matrix) -> Result<()> {
        match self.target() {
            Some(target) => target.clip_path(path, even_odd, ctm),
            None => Ok(()),
        }
    }

    /// Push a stroked path as a clip.
    fn clip_stroke_path(&mut self, path: &Path, stroke: &StrokeState, ctm: &Matrix) -> Result<()> {
        match self.target() {
            Some(target) => target.clip_stroke_path(path, stroke, ctm),
            None => Ok(()),
        }
    }

    /// Fill the current clip with a shading.
    fn fill_shade(&mut self, shade: &Shade, ctm: &Matrix, alpha: f32) -> Result<()> {
        match self.target() {
            Some(target) => target.fill_shade(shade, ctm, alpha),
            None => Ok(()),
        }
    }

    /// Draw an image into the unit square of `ctm`.
    fn fill_image(&mut self, image: &Image, ctm: &Matrix, alpha: f32) -> Result<()> {
        match self.target() {
            Some(target) => target.fill_image(image, ctm, alpha),
            None => Ok(()),
        }
    }

    /// Paint `color` through the image's alpha channel.
    fn fill_image_mask(
        &mut self,
        image: &Image,
        ctm: &Matrix,
        color: &Color,
        alpha: f32,
    ) -> Result<()> {
        match self.target() {
            Some(target) => target.fill_image_mask(image, ctm, color, alpha),
            None => Ok(()),
        }
    }

    /// Push the image's alpha channel as a clip.
    fn clip_image_mask(&mut self, image: &Image, ctm: &Matrix) -> Result<()> {
        match self.target() {
            Some(target) => target.clip_image_mask(image, ctm),
            None => Ok(()),
        }
    }

    /// Pop the most recent clip (including a finished soft mask).
    fn pop_clip(&mut self) -> Result<()> {
        match self.target() {
            Some(target) => target.pop_clip(),
            None => Ok(()),
        }
    }

    /// Start drawing a soft mask.
    fn begin_mask(&mut self, area: &Rect, luminosity: bool, backdrop: &Color) -> Result<()> {
        match self.target() {
            Some(target) => target.begin_mask(area, luminosity, backdrop),
            None => Ok(()),
        }
    }

    /// Finish the soft mask and push it as a clip.
    fn end_mask(&mut self) -> Result<()> {
        match self.target() {
            Some(target) => target.end_mask(),
            None => Ok(()),
        }
    }

    /// Start a transparency group.
    fn begin_group(
        &mut self,
        area: &Rect,
        isolated: bool,
        knockout: bool,
        blend: BlendMode,
        alpha: f32,
    ) -> Result<()> {
        match self.target() {
            Some(target) => target.begin_group(area, isolated, knockout, blend, alpha),
            None => Ok(()),
        }
    }

    /// Composite the current transparency group.
    fn end_group(&mut self) -> Result<()> {
        match self.target() {
            Some(target) => target.end_group(),
            None => Ok(()),
        }
    }

    /// Start a tiling pattern cell.
    fn begin_tile(
        &mut self,
        area: &Rect,
        view: &Rect,
        xstep: f32,
        ystep: f32,
        ctm: &Matrix,
    ) -> Result<()> {
        match self.target() {
            Some(target) => target.begin_tile(area, view, xstep, ystep, ctm),
            None => Ok(()),
        }
    }

    /// Finish the tiling pattern cell.
    fn end_tile(&mut self) -> Result<()> {
        match self.target() {
            Some(target) => target.end_tile(),
            None => Ok(()),
        }
    }

    /// Flush and release the device.
    fn close(&mut self) -> Result<()> {
        match self.target() {
            Some(target) => target.close(),
            None => Ok(()),
        }
    }
}

/// A device that ignores every call.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullDevice;

impl DrawDevice for NullDevice {}
