//! Analysis pass: collect every glyph a page shows.

use super::{Color, DrawDevice, StrokeState, Text};
use crate::catalog::{CatalogBuilder, CharacterCatalog, SubstitutionTable};
use crate::error::Result;
use crate::geometry::Matrix;

/// Device that records glyph shows from all five text operations.
///
/// Everything else is dropped. Run a page through it once, then call
/// [`CharacterAnalyzer::into_catalog`].
#[derive(Debug, Clone)]
pub struct CharacterAnalyzer {
    builder: CatalogBuilder,
    glyphs_seen: usize,
}

impl CharacterAnalyzer {
    /// Start an analysis against a substitution table.
    pub fn new(table: SubstitutionTable) -> Self {
        Self {
            builder: CatalogBuilder::new(table),
            glyphs_seen: 0,
        }
    }

    /// Number of glyph shows observed so far.
    pub fn glyphs_seen(&self) -> usize {
        self.glyphs_seen
    }

    fn observe(&mut self, text: &Text) {
        for show in text.glyphs() {
            self.builder.observe_show(show);
        }
        self.glyphs_seen += text.len();
    }

    /// Finish the pass and compute pools and coverage.
    pub fn into_catalog(self) -> CharacterCatalog {
        log::debug!("Character analysis saw {} glyphs", self.glyphs_seen);
        self.builder.build()
    }
}

impl DrawDevice for CharacterAnalyzer {
    fn fill_text(&mut self, text: &Text, _ctm: &Matrix, _color: &Color, _alpha: f32) -> Result<()> {
        self.observe(text);
        Ok(())
    }

    fn stroke_text(
        &mut self,
        text: &Text,
        _stroke: &StrokeState,
        _ctm: &Matrix,
        _color: &Color,
        _alpha: f32,
    ) -> Result<()> {
        self.observe(text);
        Ok(())
    }

    fn clip_text(&mut self, text: &Text, _ctm: &Matrix) -> Result<()> {
        self.observe(text);
        Ok(())
    }

    fn clip_stroke_text(&mut self, text: &Text, _stroke: &StrokeState, _ctm: &Matrix) -> Result<()> {
        self.observe(text);
        Ok(())
    }

    fn ignore_text(&mut self, text: &Text, _ctm: &Matrix) -> Result<()> {
        self.observe(text);
        Ok(())
    }
}
