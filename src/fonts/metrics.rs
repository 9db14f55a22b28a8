//! In-memory font metrics.

use std::collections::HashMap;

use super::{Font, WritingMode};

/// A font described only by its advance table and cmap.
///
/// Glyphs missing from the table use `default_advance`. Vertical advances
/// are a constant one em unless set explicitly.
#[derive(Debug, Clone)]
pub struct MetricsFont {
    name: String,
    default_advance: f32,
    vertical_advance: f32,
    advances: HashMap<u32, f32>,
    cmap: HashMap<u32, u32>,
}

impl MetricsFont {
    /// Create a font where every glyph advances by `default_advance`.
    pub fn monospace(name: impl Into<String>, default_advance: f32) -> Self {
        Self {
            name: name.into(),
            default_advance,
            vertical_advance: 1.0,
            advances: HashMap::new(),
            cmap: HashMap::new(),
        }
    }

    /// Create a font from `(unicode, advance)` pairs.
    ///
    /// Each codepoint is mapped to a glyph index equal to the codepoint
    /// itself, which keeps test fixtures and page descriptions readable.
    pub fn from_char_advances<I>(name: impl Into<String>, default_advance: f32, advances: I) -> Self
    where
        I: IntoIterator<Item = (char, f32)>,
    {
        let mut font = Self::monospace(name, default_advance);
        for (ch, advance) in advances {
            font = font.with_glyph(ch as u32, ch as u32, advance);
        }
        font
    }

    /// Register a glyph with its unicode mapping and advance.
    pub fn with_glyph(mut self, unicode: u32, glyph: u32, advance: f32) -> Self {
        self.cmap.insert(unicode, glyph);
        self.advances.insert(glyph, advance);
        self
    }

    /// Set the advance used for every glyph in vertical writing mode.
    pub fn with_vertical_advance(mut self, advance: f32) -> Self {
        self.vertical_advance = advance;
        self
    }
}

impl Font for MetricsFont {
    fn name(&self) -> &str {
        &self.name
    }

    fn advance_glyph(&self, glyph: u32, wmode: WritingMode) -> f32 {
        match wmode {
            WritingMode::Horizontal => self
                .advances
                .get(&glyph)
                .copied()
                .unwrap_or(self.default_advance),
            WritingMode::Vertical => self.vertical_advance,
        }
    }

    fn glyph_for_unicode(&self, unicode: u32) -> Option<u32> {
        self.cmap.get(&unicode).copied()
    }
}
