//! Font handling.
//!
//! The anonymizer never parses font programs on its own; it only needs a
//! name to group glyphs by, and an advance width per glyph. [`Font`] is
//! that contract. Two implementations are provided:
//!
//! - [`MetricsFont`]: an in-memory advance table (page descriptions, tests)
//! - [`TrueTypeFont`]: advances and cmap read from a TrueType/OpenType program

mod metrics;
mod truetype;

pub use metrics::MetricsFont;
pub use truetype::TrueTypeFont;

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// Direction the pen moves after a glyph is shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WritingMode {
    /// Left to right along the local x axis
    #[default]
    Horizontal,
    /// Top to bottom along the local y axis
    Vertical,
}

/// Font metrics supplied by the host rendering engine.
///
/// Implementations must be deterministic and side-effect free.
pub trait Font: fmt::Debug + Send + Sync {
    /// Name identifying the font (for subset fonts, the subset name).
    fn name(&self) -> &str;

    /// Advance of `glyph` in glyph space (one unit = one em).
    fn advance_glyph(&self, glyph: u32, wmode: WritingMode) -> f32;

    /// Glyph index for a unicode codepoint, when the font exposes a cmap.
    fn glyph_for_unicode(&self, _unicode: u32) -> Option<u32> {
        None
    }
}

/// Shared handle to a font.
pub type FontRef = Arc<dyn Font>;

/// Whether two handles refer to the same font.
pub fn same_font(a: &FontRef, b: &FontRef) -> bool {
    Arc::ptr_eq(a, b) || a.name() == b.name()
}
