//! Character and zone whitelists.
//!
//! Whitelisted glyphs are never substituted. Characters are whitelisted by
//! value (spaces, punctuation); zones are page regions given in normalized
//! page coordinates and scaled to device pixels per page.

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::geometry::{Quad, Rect};
use crate::text::Glyph;

/// Space plus ASCII punctuation.
pub const DEFAULT_CHARACTER_WHITELIST: &str = " !\"#$%&'()*+,-./:;<=>?@[\\]^_`{|}~";

/// Characters that are never substituted and always end a token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CharacterWhitelist {
    chars: HashSet<u32>,
}

impl CharacterWhitelist {
    /// Whitelist every character of `chars`.
    pub fn new(chars: &str) -> Self {
        Self {
            chars: chars.chars().map(|c| c as u32).collect(),
        }
    }

    /// Whether the codepoint is whitelisted.
    pub fn contains(&self, unicode: u32) -> bool {
        self.chars.contains(&unicode)
    }

    /// Number of whitelisted characters.
    pub fn len(&self) -> usize {
        self.chars.len()
    }

    /// Whether nothing is whitelisted.
    pub fn is_empty(&self) -> bool {
        self.chars.is_empty()
    }
}

impl Default for CharacterWhitelist {
    fn default() -> Self {
        Self::new(DEFAULT_CHARACTER_WHITELIST)
    }
}

/// One zone record as stored on disk.
///
/// Coordinates are fractions of the page width and height, origin at the
/// top-left. A record without a page index applies to every page.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ZoneRecord {
    /// Left edge
    pub x1: f32,
    /// Top edge
    pub y1: f32,
    /// Right edge
    pub x2: f32,
    /// Bottom edge
    pub y2: f32,
    /// Zero-based page the zone belongs to
    #[serde(default, alias = "page_idx", skip_serializing_if = "Option::is_none")]
    pub page_index: Option<usize>,
}

impl ZoneRecord {
    fn validate(&self, index: usize) -> Result<()> {
        let coords = [self.x1, self.y1, self.x2, self.y2];
        if let Some(v) = coords.iter().find(|v| !(0.0..=1.0).contains(*v)) {
            return Err(Error::InvalidWhitelist {
                index,
                reason: format!("coordinate {} outside [0, 1]", v),
            });
        }
        if self.x1 > self.x2 {
            return Err(Error::InvalidWhitelist {
                index,
                reason: format!("x1 ({}) > x2 ({})", self.x1, self.x2),
            });
        }
        if self.y1 > self.y2 {
            return Err(Error::InvalidWhitelist {
                index,
                reason: format!("y1 ({}) > y2 ({})", self.y1, self.y2),
            });
        }
        Ok(())
    }

    /// Whether the record applies to `page_index`.
    pub fn applies_to(&self, page_index: usize) -> bool {
        self.page_index.map_or(true, |p| p == page_index)
    }

    /// Parse and validate a JSON array of records.
    pub fn parse_all(json: &str) -> Result<Vec<ZoneRecord>> {
        let records: Vec<ZoneRecord> = serde_json::from_str(json)?;
        for (index, record) in records.iter().enumerate() {
            record.validate(index)?;
        }
        Ok(records)
    }

    /// Load records from a file. A missing file yields no records.
    pub fn load_all(path: impl AsRef<Path>) -> Result<Vec<ZoneRecord>> {
        let path = path.as_ref();
        let json = match std::fs::read_to_string(path) {
            Ok(json) => json,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                log::debug!("No zone whitelist at {}, using none", path.display());
                return Ok(Vec::new());
            },
            Err(e) => return Err(e.into()),
        };
        let records = Self::parse_all(&json)?;
        log::info!("Loaded {} whitelist zones from {}", records.len(), path.display());
        Ok(records)
    }
}

/// Page regions, in device pixels, where nothing is substituted.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ZoneWhitelist {
    zones: Vec<Rect>,
}

impl ZoneWhitelist {
    /// Whitelist the given device-space rectangles.
    pub fn new(zones: Vec<Rect>) -> Self {
        Self { zones }
    }

    /// Select the records for one page and scale them to its pixel size.
    pub fn for_page(records: &[ZoneRecord], page_index: usize, width: f32, height: f32) -> Self {
        let zones = records
            .iter()
            .filter(|r| r.applies_to(page_index))
            .map(|r| Rect::from_points(r.x1, r.y1, r.x2, r.y2).scale(width, height))
            .collect();
        Self { zones }
    }

    /// Device-space rectangles.
    pub fn zones(&self) -> &[Rect] {
        &self.zones
    }

    /// Whether there are no zones.
    pub fn is_empty(&self) -> bool {
        self.zones.is_empty()
    }

    /// Whether a glyph footprint falls in a zone.
    ///
    /// The baseline start, the centroid and the baseline end are tested;
    /// any one of them inside a zone is enough.
    pub fn covers(&self, quad: &Quad) -> bool {
        let probes = [quad.points[0], quad.centroid(), quad.points[3]];
        self.zones
            .iter()
            .any(|zone| probes.iter().any(|p| zone.contains_point(p)))
    }

    /// Whether a glyph falls in a zone.
    pub fn contains_glyph(&self, glyph: &Glyph) -> bool {
        self.covers(glyph.quad())
    }
}
