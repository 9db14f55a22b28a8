//! TrueType/OpenType metrics.
//!
//! This module wraps the `ttf-parser` crate to read the two tables the
//! anonymizer needs from a font program: horizontal/vertical advances
//! (`hmtx`/`vmtx`) and the unicode cmap. The face is parsed once and the
//! tables are copied out, so the font owns no borrowed data.

use std::collections::HashMap;
use std::path::Path;

use ttf_parser::{Face, GlyphId};

use super::{Font, WritingMode};
use crate::error::{Error, Result};

/// Font metrics extracted from a TrueType/OpenType program.
#[derive(Debug, Clone)]
pub struct TrueTypeFont {
    name: String,
    units_per_em: f32,
    /// Glyph ID -> horizontal advance in font units
    hor_advances: Vec<u16>,
    /// Glyph ID -> vertical advance in font units (empty without `vmtx`)
    ver_advances: Vec<u16>,
    /// Unicode -> glyph ID
    unicode_to_glyph: HashMap<u32, u16>,
}

impl TrueTypeFont {
    /// Parse a font program from raw data.
    ///
    /// `name` overrides the PostScript name; PDF subset fonts are referred
    /// to by their resource name rather than the embedded one.
    pub fn parse(data: &[u8], name: Option<&str>) -> Result<Self> {
        if data.is_empty() {
            return Err(Error::Font("font file is empty".to_string()));
        }

        let face = Face::parse(data, 0).map_err(|e| Error::Font(e.to_string()))?;

        let units_per_em = face.units_per_em();
        if units_per_em == 0 {
            return Err(Error::Font("units per em is zero".to_string()));
        }

        let name = name
            .map(str::to_string)
            .or_else(|| postscript_name(&face))
            .unwrap_or_else(|| "Unnamed".to_string());

        let glyph_count = face.number_of_glyphs();
        let hor_advances = (0..glyph_count)
            .map(|id| face.glyph_hor_advance(GlyphId(id)).unwrap_or(0))
            .collect();
        let ver_advances = if face.tables().vmtx.is_some() {
            (0..glyph_count)
                .map(|id| face.glyph_ver_advance(GlyphId(id)).unwrap_or(0))
                .collect()
        } else {
            Vec::new()
        };

        // Iterate through BMP (Basic Multilingual Plane)
        let mut unicode_to_glyph = HashMap::new();
        for codepoint in 0..=0xFFFF_u32 {
            if let Some(ch) = char::from_u32(codepoint) {
                if let Some(glyph_id) = face.glyph_index(ch) {
                    unicode_to_glyph.insert(codepoint, glyph_id.0);
                }
            }
        }

        log::debug!(
            "Loaded font {} ({} glyphs, {} cmap entries)",
            name,
            glyph_count,
            unicode_to_glyph.len()
        );

        Ok(Self {
            name,
            units_per_em: units_per_em as f32,
            hor_advances,
            ver_advances,
            unicode_to_glyph,
        })
    }

    /// Read and parse a font file.
    pub fn open(path: impl AsRef<Path>, name: Option<&str>) -> Result<Self> {
        let data = std::fs::read(path.as_ref())?;
        Self::parse(&data, name)
    }

    /// Number of glyphs in the font program.
    pub fn glyph_count(&self) -> usize {
        self.hor_advances.len()
    }
}

fn postscript_name(face: &Face<'_>) -> Option<String> {
    face.names()
        .into_iter()
        .find(|name| name.name_id == ttf_parser::name_id::POST_SCRIPT_NAME)
        .and_then(|name| name.to_string())
}

impl Font for TrueTypeFont {
    fn name(&self) -> &str {
        &self.name
    }

    fn advance_glyph(&self, glyph: u32, wmode: WritingMode) -> f32 {
        let table = match wmode {
            WritingMode::Horizontal => &self.hor_advances,
            WritingMode::Vertical if self.ver_advances.is_empty() => {
                return 1.0;
            },
            WritingMode::Vertical => &self.ver_advances,
        };
        table
            .get(glyph as usize)
            .map(|&units| units as f32 / self.units_per_em)
            .unwrap_or(0.0)
    }

    fn glyph_for_unicode(&self, unicode: u32) -> Option<u32> {
        self.unicode_to_glyph.get(&unicode).map(|&g| g as u32)
    }
}
