//! Glyph placeholder geometry.
//!
//! Glyph outlines are not available, so each visible glyph is drawn as a
//! cell: inset by 5% of the advance on each side, from the baseline up to
//! 70% of the em. Whitespace glyphs produce no cell.

use crate::device::Text;
use crate::fonts::WritingMode;
use crate::geometry::{Matrix, Quad};

const SIDE_BEARING: f32 = 0.05;
const CELL_HEIGHT: f32 = 0.7;

/// Device-space cells for every visible glyph of a text run.
pub(crate) fn glyph_cells(text: &Text, ctm: &Matrix) -> Vec<Quad> {
    text.glyphs()
        .iter()
        .filter(|show| !char::from_u32(show.unicode).is_some_and(char::is_whitespace))
        .map(|show| {
            let m = show.matrix.concat(ctm);
            let advance = show.font.advance_glyph(show.glyph, show.wmode) + show.kerning;
            let (x0, x1, y0, y1) = match show.wmode {
                WritingMode::Horizontal => (
                    advance * SIDE_BEARING,
                    advance * (1.0 - SIDE_BEARING),
                    0.0,
                    CELL_HEIGHT,
                ),
                WritingMode::Vertical => (
                    (1.0 - CELL_HEIGHT) / 2.0,
                    (1.0 + CELL_HEIGHT) / 2.0,
                    -advance * SIDE_BEARING,
                    -advance * (1.0 - SIDE_BEARING),
                ),
            };
            Quad::new([
                m.transform_point(x0, y0),
                m.transform_point(x0, y1),
                m.transform_point(x1, y1),
                m.transform_point(x1, y0),
            ])
        })
        .collect()
}

/// Approximate uniform scale of a transform, for stroke widths.
pub(crate) fn mean_scale(ctm: &Matrix) -> f32 {
    ctm.determinant().abs().sqrt()
}
