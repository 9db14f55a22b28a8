//! Text-rewriting device adapter.

use rand::rngs::StdRng;
use rand::SeedableRng;

use super::{Color, DrawDevice, StrokeState, Text};
use crate::anonymizer::{
    ReplacementCache, SearchContext, SearchPolicy, SearchStats, SubstitutionSearch,
};
use crate::catalog::CharacterCatalog;
use crate::config::AnonymizerConfig;
use crate::error::Result;
use crate::geometry::Matrix;
use crate::text::{Glyph, Tokenizer};
use crate::whitelist::{CharacterWhitelist, ZoneWhitelist};

/// Wraps a device and anonymizes every text run on its way through.
///
/// The five text operations are rewritten and forwarded with the same
/// operation; every other call reaches the wrapped device untouched.
/// One replacement cache lives for the lifetime of the adapter, so text
/// drawn repeatedly is rewritten identically.
pub struct AnonymizingDevice<'a> {
    inner: &'a mut dyn DrawDevice,
    catalog: &'a CharacterCatalog,
    characters: CharacterWhitelist,
    zones: ZoneWhitelist,
    tokenizer: Tokenizer,
    search: SubstitutionSearch,
    cache: ReplacementCache,
    rng: StdRng,
    stats: SearchStats,
}

impl<'a> AnonymizingDevice<'a> {
    /// Wrap `inner` using the page's catalog and zones.
    pub fn new(
        inner: &'a mut dyn DrawDevice,
        catalog: &'a CharacterCatalog,
        zones: ZoneWhitelist,
        config: &AnonymizerConfig,
    ) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            inner,
            catalog,
            characters: config.character_whitelist(),
            zones,
            tokenizer: Tokenizer::new(config.max_glyph_distance_ratio),
            search: SubstitutionSearch::new(SearchPolicy::from(config)),
            cache: ReplacementCache::new(),
            rng,
            stats: SearchStats::default(),
        }
    }

    /// Rewrite a text run drawn under `ctm`.
    pub fn anonymize_text(&mut self, text: &Text, ctm: &Matrix) -> Text {
        if text.is_empty() {
            return Text::new();
        }
        let glyphs: Vec<Glyph> = text
            .glyphs()
            .iter()
            .map(|show| Glyph::from_show(show, ctm))
            .collect();
        let ctx = SearchContext {
            catalog: self.catalog,
            characters: &self.characters,
            zones: &self.zones,
        };

        let mut shows = Vec::with_capacity(text.len());
        for token in self.tokenizer.tokenize(glyphs, &self.characters) {
            let replacement =
                self.search
                    .anonymize_token(&token, &ctx, &mut self.cache, &mut self.rng);
            self.stats.record(&replacement.outcome);
            shows.extend(replacement.glyphs.iter().map(Glyph::to_show));
        }
        Text::from_glyphs(shows)
    }

    /// Replacements accepted so far.
    pub fn cache(&self) -> &ReplacementCache {
        &self.cache
    }

    /// Search counters so far.
    pub fn stats(&self) -> &SearchStats {
        &self.stats
    }

    /// The zones in force.
    pub fn zones(&self) -> &ZoneWhitelist {
        &self.zones
    }

    /// Release the wrapped device, keeping the run's results.
    pub fn into_parts(self) -> (ReplacementCache, SearchStats) {
        (self.cache, self.stats)
    }
}

impl DrawDevice for AnonymizingDevice<'_> {
    fn target(&mut self) -> Option<&mut dyn DrawDevice> {
        Some(&mut *self.inner)
    }

    fn fill_text(&mut self, text: &Text, ctm: &Matrix, color: &Color, alpha: f32) -> Result<()> {
        let text = self.anonymize_text(text, ctm);
        self.inner.fill_text(&text, ctm, color, alpha)
    }

    fn stroke_text(
        &mut self,
        text: &Text,
        stroke: &StrokeState,
        ctm: &Matrix,
        color: &Color,
        alpha: f32,
    ) -> Result<()> {
        let text = self.anonymize_text(text, ctm);
        self.inner.stroke_text(&text, stroke, ctm, color, alpha)
    }

    fn clip_text(&mut self, text: &Text, ctm: &Matrix) -> Result<()> {
        let text = self.anonymize_text(text, ctm);
        self.inner.clip_text(&text, ctm)
    }

    fn clip_stroke_text(&mut self, text: &Text, stroke: &StrokeState, ctm: &Matrix) -> Result<()> {
        let text = self.anonymize_text(text, ctm);
        self.inner.clip_stroke_text(&text, stroke, ctm)
    }

    fn ignore_text(&mut self, text: &Text, ctm: &Matrix) -> Result<()> {
        let text = self.anonymize_text(text, ctm);
        self.inner.ignore_text(&text, ctm)
    }
}
