//! Glyph entities and tokenization.

mod glyph;
mod tokenizer;

pub use glyph::{Glyph, GlyphKey, Highlight};
pub use tokenizer::{Token, Tokenizer, DEFAULT_MAX_GLYPH_DISTANCE_RATIO};
