//! Grouping glyphs into substitution tokens.
//!
//! A token is the unit of width matching: the search replaces all of its
//! glyphs at once and only checks where the pen ends up. Tokens therefore
//! must be runs the eye reads as continuous. A new token starts when:
//!
//! - the previous glyph is a separator (character whitelist member),
//! - the font or writing mode changes,
//! - the glyph does not start where the previous one left the pen, within
//!   `size × max_glyph_distance_ratio` (explicit spacing, line breaks).

use crate::fonts::same_font;
use crate::whitelist::CharacterWhitelist;

use super::Glyph;

/// Default continuity tolerance as a fraction of glyph size.
pub const DEFAULT_MAX_GLYPH_DISTANCE_RATIO: f32 = 0.1;

/// A non-empty run of continuous glyphs.
#[derive(Debug, Clone)]
pub struct Token {
    glyphs: Vec<Glyph>,
}

impl Token {
    /// Wrap a glyph run; `None` when empty.
    pub fn new(glyphs: Vec<Glyph>) -> Option<Self> {
        if glyphs.is_empty() {
            None
        } else {
            Some(Self { glyphs })
        }
    }

    /// Glyphs in drawing order.
    pub fn glyphs(&self) -> &[Glyph] {
        &self.glyphs
    }

    /// Number of glyphs (always at least one).
    pub fn len(&self) -> usize {
        self.glyphs.len()
    }

    /// Always false; present for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.glyphs.is_empty()
    }

    /// First glyph.
    pub fn first(&self) -> &Glyph {
        &self.glyphs[0]
    }

    /// Last glyph.
    pub fn last(&self) -> &Glyph {
        &self.glyphs[self.glyphs.len() - 1]
    }

    /// Pen position after the last glyph, in device space.
    pub fn final_device_next(&self) -> crate::geometry::Matrix {
        self.last().device_next_matrix()
    }

    /// The token's characters, invalid codepoints as U+FFFD.
    pub fn text(&self) -> String {
        self.glyphs
            .iter()
            .map(|g| g.character().unwrap_or(char::REPLACEMENT_CHARACTER))
            .collect()
    }
}

/// Splits glyph sequences into tokens.
#[derive(Debug, Clone, Copy)]
pub struct Tokenizer {
    max_glyph_distance_ratio: f32,
}

impl Default for Tokenizer {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_GLYPH_DISTANCE_RATIO)
    }
}

impl Tokenizer {
    /// Create a tokenizer with the given continuity ratio.
    pub fn new(max_glyph_distance_ratio: f32) -> Self {
        Self {
            max_glyph_distance_ratio,
        }
    }

    /// Whether `current` continues the token ending in `previous`.
    pub fn continues(
        &self,
        previous: &Glyph,
        current: &Glyph,
        separators: &CharacterWhitelist,
    ) -> bool {
        if separators.contains(previous.unicode()) {
            return false;
        }
        if !same_font(previous.font(), current.font()) {
            return false;
        }
        if previous.wmode() != current.wmode() {
            return false;
        }
        previous.next_matrix().equals_within(
            current.matrix(),
            previous.size() * self.max_glyph_distance_ratio,
        )
    }

    /// Group glyphs into tokens, preserving order.
    pub fn tokenize(&self, glyphs: Vec<Glyph>, separators: &CharacterWhitelist) -> Vec<Token> {
        let mut tokens = Vec::new();
        let mut run: Vec<Glyph> = Vec::new();
        for glyph in glyphs {
            if let Some(last) = run.last() {
                if !self.continues(last, &glyph, separators) {
                    tokens.extend(Token::new(std::mem::take(&mut run)));
                }
            }
            run.push(glyph);
        }
        tokens.extend(Token::new(run));
        tokens
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fonts::{FontRef, MetricsFont, WritingMode};
    use crate::geometry::Matrix;
    use std::sync::Arc;

    fn line(font: &FontRef, text: &str, x: f32, y: f32) -> Vec<Glyph> {
        let mut glyphs: Vec<Glyph> = Vec::new();
        let mut m = Matrix::new(10.0, 0.0, 0.0, 10.0, x, y);
        for ch in text.chars() {
            let g = Glyph::new(
                font.clone(),
                m,
                ch as u32,
                ch as u32,
                WritingMode::Horizontal,
                Matrix::identity(),
            );
            m = *g.next_matrix();
            glyphs.push(g);
        }
        glyphs
    }

    fn texts(tokens: &[Token]) -> Vec<String> {
        tokens.iter().map(Token::text).collect()
    }

    #[test]
    fn test_empty_input() {
        let tokens = Tokenizer::default().tokenize(Vec::new(), &CharacterWhitelist::default());
        assert!(tokens.is_empty());
    }

    #[test]
    fn test_splits_after_separator() {
        let font: FontRef = Arc::new(MetricsFont::monospace("F1", 0.5));
        let glyphs = line(&font, "hello big world", 0.0, 0.0);
        let tokens = Tokenizer::default().tokenize(glyphs, &CharacterWhitelist::default());
        assert_eq!(texts(&tokens), vec!["hello ", "big ", "world"]);
    }

    #[test]
    fn test_splits_on_discontinuity() {
        let font: FontRef = Arc::new(MetricsFont::monospace("F1", 0.5));
        let mut glyphs = line(&font, "ab", 0.0, 0.0);
        // 2 units gap: well beyond 10 * 0.1
        glyphs.extend(line(&font, "cd", 12.0, 0.0));
        // Next line
        glyphs.extend(line(&font, "ef", 0.0, -12.0));
        let tokens = Tokenizer::default().tokenize(glyphs, &CharacterWhitelist::new(""));
        assert_eq!(texts(&tokens), vec!["ab", "cd", "ef"]);
    }

    #[test]
    fn test_small_jitter_is_continuous() {
        let font: FontRef = Arc::new(MetricsFont::monospace("F1", 0.5));
        let mut glyphs = line(&font, "ab", 0.0, 0.0);
        glyphs.extend(line(&font, "cd", 10.5, 0.0));
        let tokens = Tokenizer::default().tokenize(glyphs, &CharacterWhitelist::new(""));
        assert_eq!(texts(&tokens), vec!["abcd"]);
    }

    #[test]
    fn test_splits_on_font_change() {
        let f1: FontRef = Arc::new(MetricsFont::monospace("F1", 0.5));
        let f2: FontRef = Arc::new(MetricsFont::monospace("F2", 0.5));
        let mut glyphs = line(&f1, "ab", 0.0, 0.0);
        glyphs.extend(line(&f2, "cd", 10.0, 0.0));
        let tokens = Tokenizer::default().tokenize(glyphs, &CharacterWhitelist::new(""));
        assert_eq!(texts(&tokens), vec!["ab", "cd"]);
    }

    #[test]
    fn test_splits_on_linear_part_change() {
        let font: FontRef = Arc::new(MetricsFont::monospace("F1", 0.5));
        let mut glyphs = line(&font, "ab", 0.0, 0.0);
        let next = *glyphs[1].next_matrix();
        glyphs.push(Glyph::new(
            font.clone(),
            Matrix { a: 12.0, d: 12.0, ..next },
            'c' as u32,
            'c' as u32,
            WritingMode::Horizontal,
            Matrix::identity(),
        ));
        let tokens = Tokenizer::default().tokenize(glyphs, &CharacterWhitelist::new(""));
        assert_eq!(texts(&tokens), vec!["ab", "c"]);
    }

    #[test]
    fn test_splits_on_writing_mode_change() {
        let font: FontRef = Arc::new(MetricsFont::monospace("F1", 0.5));
        let mut glyphs = line(&font, "ab", 0.0, 0.0);
        // Starts exactly where the pen stands, only the writing mode differs
        let next = *glyphs[1].next_matrix();
        let vertical = Glyph::new(
            font.clone(),
            next,
            'c' as u32,
            'c' as u32,
            WritingMode::Vertical,
            Matrix::identity(),
        );
        let below = Glyph::new(
            font.clone(),
            *vertical.next_matrix(),
            'd' as u32,
            'd' as u32,
            WritingMode::Vertical,
            Matrix::identity(),
        );
        glyphs.push(vertical);
        glyphs.push(below);
        let tokenizer = Tokenizer::default();
        let separators = CharacterWhitelist::new("");
        assert!(!tokenizer.continues(&glyphs[1], &glyphs[2], &separators));
        assert!(tokenizer.continues(&glyphs[2], &glyphs[3], &separators));
        let tokens = tokenizer.tokenize(glyphs, &separators);
        assert_eq!(texts(&tokens), vec!["ab", "cd"]);
    }
}
