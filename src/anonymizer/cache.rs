//! Accepted replacements, keyed by glyph identity.

use indexmap::IndexMap;

use crate::text::{Glyph, GlyphKey};

/// Replacements accepted during one anonymization run.
///
/// Entries are write-once: the first replacement recorded for a key wins.
/// Text drawn more than once (fill then clip, say) is therefore rewritten
/// the same way every time. Iteration follows insertion order.
#[derive(Debug, Clone, Default)]
pub struct ReplacementCache {
    entries: IndexMap<GlyphKey, Glyph>,
}

impl ReplacementCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replacement recorded for `key`.
    pub fn get(&self, key: &GlyphKey) -> Option<&Glyph> {
        self.entries.get(key)
    }

    /// Whether `key` has a replacement.
    pub fn contains(&self, key: &GlyphKey) -> bool {
        self.entries.contains_key(key)
    }

    /// Record a replacement unless one already exists.
    ///
    /// Returns whether the entry was inserted.
    pub fn insert(&mut self, key: GlyphKey, replacement: Glyph) -> bool {
        if self.entries.contains_key(&key) {
            return false;
        }
        self.entries.insert(key, replacement);
        true
    }

    /// Number of recorded replacements.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing was recorded.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&GlyphKey, &Glyph)> {
        self.entries.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fonts::{FontRef, MetricsFont, WritingMode};
    use crate::geometry::Matrix;
    use crate::text::Highlight;
    use std::sync::Arc;

    fn glyph(unicode: char, x: f32) -> Glyph {
        let font: FontRef = Arc::new(MetricsFont::monospace("F1", 0.5));
        Glyph::new(
            font,
            Matrix::new(10.0, 0.0, 0.0, 10.0, x, 0.0),
            unicode as u32,
            unicode as u32,
            WritingMode::Horizontal,
            Matrix::identity(),
        )
    }

    #[test]
    fn test_first_insert_wins() {
        let mut cache = ReplacementCache::new();
        let source = glyph('a', 0.0);
        let first = source.with_substitute('x' as u32, 'x' as u32, Highlight::Substituted);
        let second = source.with_substitute('y' as u32, 'y' as u32, Highlight::Substituted);

        assert!(cache.insert(source.key(), first));
        assert!(!cache.insert(source.key(), second));
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get(&source.key()).map(Glyph::unicode), Some('x' as u32));
    }

    #[test]
    fn test_insertion_order() {
        let mut cache = ReplacementCache::new();
        for (i, ch) in "cab".chars().enumerate() {
            let g = glyph(ch, i as f32 * 5.0);
            cache.insert(g.key(), g);
        }
        let order: String = cache.iter().filter_map(|(_, g)| g.character()).collect();
        assert_eq!(order, "cab");
        assert!(cache.contains(&glyph('a', 5.0).key()));
        assert!(!cache.contains(&glyph('a', 0.0).key()));
    }
}
