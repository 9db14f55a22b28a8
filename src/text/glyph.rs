//! Positioned glyph instances.

use serde::Serialize;

use crate::device::GlyphShow;
use crate::fonts::{FontRef, WritingMode};
use crate::geometry::{Matrix, Point, Quad};

/// Why a glyph was or was not substituted.
///
/// Drives the color of the diagnostic overlay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Highlight {
    /// Inside a zone whitelist rectangle
    ZoneWhitelisted,
    /// Character is in the character whitelist
    CharacterWhitelisted,
    /// Replaced by a different character
    Substituted,
    /// The weighted draw picked the original character again
    Unchanged,
    /// Replaced from a pool whose coverage is below the warning threshold
    LowCoverage,
    /// Character belongs to no substitution pool of its font
    NotSubstitutable,
    /// The search gave up and kept the original glyph
    Unreplaceable,
}

impl Highlight {
    /// RGB overlay color.
    pub fn color(&self) -> [f32; 3] {
        match self {
            Highlight::ZoneWhitelisted => [0.0, 0.0, 1.0],
            Highlight::CharacterWhitelisted => [0.6, 0.6, 0.6],
            Highlight::Substituted => [0.0, 1.0, 0.0],
            Highlight::Unchanged => [0.0, 1.0, 1.0],
            Highlight::LowCoverage => [1.0, 0.0, 0.0],
            Highlight::NotSubstitutable => [1.0, 0.5, 0.0],
            Highlight::Unreplaceable => [0.5, 0.0, 0.5],
        }
    }
}

/// Stable identity of a glyph occurrence.
///
/// Derived from device-space placement, so the same visual occurrence maps
/// to the same key whether it is drawn as fill, clip or stroke.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GlyphKey {
    font: String,
    device_matrix: [u32; 6],
    unicode: u32,
    glyph: u32,
    wmode: WritingMode,
}

impl GlyphKey {
    /// Font name.
    pub fn font(&self) -> &str {
        &self.font
    }

    /// Source codepoint.
    pub fn unicode(&self) -> u32 {
        self.unicode
    }

    /// Source glyph index.
    pub fn glyph(&self) -> u32 {
        self.glyph
    }
}

/// A character instance placed on the page.
///
/// Everything that depends on font metrics (advance, next pen position,
/// device footprint, nominal size) is computed once at construction.
#[derive(Debug, Clone)]
pub struct Glyph {
    font: FontRef,
    matrix: Matrix,
    glyph: u32,
    unicode: u32,
    wmode: WritingMode,
    ctm: Matrix,
    kerning: f32,
    highlight: Option<Highlight>,

    advance: f32,
    next_matrix: Matrix,
    quad: Quad,
    size: f32,
}

impl Glyph {
    /// Place `glyph` of `font` at `matrix` (text space), drawn under `ctm`.
    pub fn new(
        font: FontRef,
        matrix: Matrix,
        glyph: u32,
        unicode: u32,
        wmode: WritingMode,
        ctm: Matrix,
    ) -> Self {
        Self::build(font, matrix, glyph, unicode, wmode, ctm, 0.0, None)
    }

    /// Build a glyph from a host glyph-show event.
    pub fn from_show(show: &GlyphShow, ctm: &Matrix) -> Self {
        Self::build(
            show.font.clone(),
            show.matrix,
            show.glyph,
            show.unicode,
            show.wmode,
            *ctm,
            show.kerning,
            None,
        )
    }

    fn build(
        font: FontRef,
        matrix: Matrix,
        glyph: u32,
        unicode: u32,
        wmode: WritingMode,
        ctm: Matrix,
        kerning: f32,
        highlight: Option<Highlight>,
    ) -> Self {
        let advance = font.advance_glyph(glyph, wmode) + kerning;
        let corner = |tx: f32, ty: f32| -> Point { matrix.advance(tx, ty).concat(&ctm).origin() };
        let (next_matrix, size, quad) = match wmode {
            WritingMode::Horizontal => (
                matrix.advance(advance, 0.0),
                matrix.distance(&matrix.advance(0.0, 1.0)),
                Quad::new([
                    corner(0.0, 0.0),
                    corner(0.0, 1.0),
                    corner(advance, 1.0),
                    corner(advance, 0.0),
                ]),
            ),
            WritingMode::Vertical => (
                matrix.advance(0.0, -advance),
                matrix.distance(&matrix.advance(1.0, 0.0)),
                Quad::new([
                    corner(0.0, 0.0),
                    corner(1.0, 0.0),
                    corner(1.0, -advance),
                    corner(0.0, -advance),
                ]),
            ),
        };

        Self {
            font,
            matrix,
            glyph,
            unicode,
            wmode,
            ctm,
            kerning,
            highlight,
            advance,
            next_matrix,
            quad,
            size,
        }
    }

    /// Same glyph tagged with a diagnostic highlight.
    pub fn with_highlight(mut self, highlight: Highlight) -> Self {
        self.highlight = Some(highlight);
        self
    }

    /// Another character of the same font at the same position.
    pub fn with_substitute(&self, glyph: u32, unicode: u32, highlight: Highlight) -> Self {
        Self::build(
            self.font.clone(),
            self.matrix,
            glyph,
            unicode,
            self.wmode,
            self.ctm,
            self.kerning,
            Some(highlight),
        )
    }

    /// This glyph moved to `matrix`, drawn under `ctm`.
    pub fn with_placement(&self, matrix: Matrix, ctm: Matrix) -> Self {
        Self::build(
            self.font.clone(),
            matrix,
            self.glyph,
            self.unicode,
            self.wmode,
            ctm,
            self.kerning,
            self.highlight,
        )
    }

    /// This glyph moved to where the pen stands after `previous`.
    pub fn place_after(&self, previous: &Glyph) -> Self {
        self.with_placement(previous.next_matrix, previous.ctm)
    }

    /// Font handle.
    pub fn font(&self) -> &FontRef {
        &self.font
    }

    /// Placement in text space.
    pub fn matrix(&self) -> &Matrix {
        &self.matrix
    }

    /// Font-internal glyph index.
    pub fn glyph(&self) -> u32 {
        self.glyph
    }

    /// Unicode codepoint.
    pub fn unicode(&self) -> u32 {
        self.unicode
    }

    /// Codepoint as a char, if valid.
    pub fn character(&self) -> Option<char> {
        char::from_u32(self.unicode)
    }

    /// Writing mode.
    pub fn wmode(&self) -> WritingMode {
        self.wmode
    }

    /// Transform from text space to device space.
    pub fn ctm(&self) -> &Matrix {
        &self.ctm
    }

    /// Diagnostic highlight, once classified.
    pub fn highlight(&self) -> Option<Highlight> {
        self.highlight
    }

    /// Advance in glyph space, kerning included.
    pub fn advance(&self) -> f32 {
        self.advance
    }

    /// Where the next glyph would start, in text space.
    pub fn next_matrix(&self) -> &Matrix {
        &self.next_matrix
    }

    /// Placement in device space.
    pub fn device_matrix(&self) -> Matrix {
        self.matrix.concat(&self.ctm)
    }

    /// Next pen position in device space.
    pub fn device_next_matrix(&self) -> Matrix {
        self.next_matrix.concat(&self.ctm)
    }

    /// Footprint in device space.
    pub fn quad(&self) -> &Quad {
        &self.quad
    }

    /// Nominal size (one em) in text space.
    pub fn size(&self) -> f32 {
        self.size
    }

    /// Nominal size (one em) in device space.
    pub fn device_size(&self) -> f32 {
        let device = self.device_matrix();
        match self.wmode {
            WritingMode::Horizontal => device.distance(&device.advance(0.0, 1.0)),
            WritingMode::Vertical => device.distance(&device.advance(1.0, 0.0)),
        }
    }

    /// Identity used by the replacement cache.
    pub fn key(&self) -> GlyphKey {
        GlyphKey {
            font: self.font.name().to_string(),
            device_matrix: self.device_matrix().to_bits(),
            unicode: self.unicode,
            glyph: self.glyph,
            wmode: self.wmode,
        }
    }

    /// Convert back into a host glyph-show event.
    pub fn to_show(&self) -> GlyphShow {
        GlyphShow {
            font: self.font.clone(),
            matrix: self.matrix,
            glyph: self.glyph,
            unicode: self.unicode,
            wmode: self.wmode,
            kerning: self.kerning,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::Text;
    use crate::fonts::MetricsFont;
    use std::sync::Arc;

    fn font() -> FontRef {
        Arc::new(MetricsFont::from_char_advances("F1", 0.5, [('i', 0.25), ('m', 0.75)]))
    }

    #[test]
    fn test_horizontal_metrics() {
        let g = Glyph::new(
            font(),
            Matrix::new(10.0, 0.0, 0.0, 10.0, 100.0, 50.0),
            'm' as u32,
            'm' as u32,
            WritingMode::Horizontal,
            Matrix::identity(),
        );
        assert_eq!(g.advance(), 0.75);
        assert_eq!(g.next_matrix().e, 107.5);
        assert_eq!(g.next_matrix().f, 50.0);
        assert_eq!(g.size(), 10.0);
        assert_eq!(g.character(), Some('m'));

        let q = g.quad();
        assert_eq!(q.points[0], Point::new(100.0, 50.0));
        assert_eq!(q.points[1], Point::new(100.0, 60.0));
        assert_eq!(q.points[2], Point::new(107.5, 60.0));
        assert_eq!(q.points[3], Point::new(107.5, 50.0));
    }

    #[test]
    fn test_vertical_metrics() {
        let g = Glyph::new(
            font(),
            Matrix::new(10.0, 0.0, 0.0, 10.0, 0.0, 100.0),
            1,
            0x4E00,
            WritingMode::Vertical,
            Matrix::identity(),
        );
        assert_eq!(g.advance(), 1.0);
        assert_eq!(g.next_matrix().e, 0.0);
        assert_eq!(g.next_matrix().f, 90.0);
        assert_eq!(g.quad().points[2], Point::new(10.0, 90.0));
    }

    #[test]
    fn test_kerning_from_show() {
        let mut text = Text::new();
        text.show_kerned_glyph(
            font(),
            Matrix::new(10.0, 0.0, 0.0, 10.0, 0.0, 0.0),
            'i' as u32,
            'i' as u32,
            WritingMode::Horizontal,
            0.25,
        );
        let g = Glyph::from_show(&text.glyphs()[0], &Matrix::identity());
        assert_eq!(g.advance(), 0.5);
        assert_eq!(g.next_matrix().e, 5.0);
        assert_eq!(g.quad().points[2], Point::new(5.0, 10.0));

        // Substitutes keep the adjustment, and it survives the trip back
        let substitute = g.with_substitute('m' as u32, 'm' as u32, Highlight::Substituted);
        assert_eq!(substitute.advance(), 1.0);
        assert_eq!(substitute.to_show().kerning, 0.25);
    }

    #[test]
    fn test_device_space_projection() {
        let ctm = Matrix::scaling(2.0, 2.0);
        let g = Glyph::new(
            font(),
            Matrix::new(10.0, 0.0, 0.0, 10.0, 10.0, 10.0),
            'i' as u32,
            'i' as u32,
            WritingMode::Horizontal,
            ctm,
        );
        assert_eq!(g.size(), 10.0);
        assert_eq!(g.device_size(), 20.0);
        assert_eq!(g.device_next_matrix().e, 25.0);
        assert_eq!(g.quad().points[3], Point::new(25.0, 20.0));
    }

    #[test]
    fn test_place_after() {
        let f = font();
        let first = Glyph::new(
            f.clone(),
            Matrix::new(10.0, 0.0, 0.0, 10.0, 0.0, 0.0),
            'm' as u32,
            'm' as u32,
            WritingMode::Horizontal,
            Matrix::identity(),
        );
        let second = Glyph::new(
            f,
            Matrix::new(10.0, 0.0, 0.0, 10.0, 999.0, 999.0),
            'i' as u32,
            'i' as u32,
            WritingMode::Horizontal,
            Matrix::identity(),
        )
        .place_after(&first);
        assert_eq!(second.matrix(), first.next_matrix());
        assert_eq!(second.next_matrix().e, 10.0);
    }

    #[test]
    fn test_key_uses_device_placement() {
        let f = font();
        // Same device position reached through different text matrix / ctm splits
        let a = Glyph::new(
            f.clone(),
            Matrix::new(10.0, 0.0, 0.0, 10.0, 4.0, 4.0),
            1,
            'a' as u32,
            WritingMode::Horizontal,
            Matrix::scaling(2.0, 2.0),
        );
        let b = Glyph::new(
            f.clone(),
            Matrix::new(20.0, 0.0, 0.0, 20.0, 8.0, 8.0),
            1,
            'a' as u32,
            WritingMode::Horizontal,
            Matrix::identity(),
        );
        assert_eq!(a.key(), b.key());

        let c = b.with_substitute(2, 'b' as u32, Highlight::Substituted);
        assert_ne!(b.key(), c.key());
        assert_eq!(c.highlight(), Some(Highlight::Substituted));
    }

    #[test]
    fn test_highlight_colors_distinct() {
        let all = [
            Highlight::ZoneWhitelisted,
            Highlight::CharacterWhitelisted,
            Highlight::Substituted,
            Highlight::Unchanged,
            Highlight::LowCoverage,
            Highlight::NotSubstitutable,
            Highlight::Unreplaceable,
        ];
        for (i, a) in all.iter().enumerate() {
            for b in &all[i + 1..] {
                assert_ne!(a.color(), b.color());
            }
        }
    }
}
