//! Page anonymization pipeline.
//!
//! Anonymizing a page takes two passes over its content:
//!
//! 1. An analysis pass through a [`CharacterAnalyzer`] collects every glyph
//!    the page shows and builds the per-font [`CharacterCatalog`].
//! 2. A render pass through an [`AnonymizingDevice`] rewrites each text run
//!    token by token and forwards everything to the output device.
//!
//! The accepted replacements of the run are returned as a [`PageReport`],
//! which also drives the diagnostic overlay.

mod cache;
mod search;

pub use cache::ReplacementCache;
pub use search::{
    KeepReason, SearchContext, SearchOutcome, SearchPolicy, SearchStats, SubstitutionSearch,
    TokenReplacement,
};

use serde::Serialize;

use crate::catalog::{CharacterCatalog, SubstitutionTable};
use crate::config::AnonymizerConfig;
use crate::device::{AnonymizingDevice, CharacterAnalyzer, DrawDevice};
use crate::error::Result;
use crate::geometry::{Matrix, Quad, Rect};
use crate::text::Highlight;
use crate::whitelist::{ZoneRecord, ZoneWhitelist};

/// A paginated document the pipeline can run.
///
/// `run_page` must issue the page's drawing calls on `device` in content
/// order, with `ctm` appended to every transform. It is called twice per
/// anonymized page and must produce the same calls both times.
pub trait PageSource {
    /// Number of pages.
    fn page_count(&self) -> usize;

    /// Page bounds in page space (points, y down).
    fn page_bounds(&self, index: usize) -> Result<Rect>;

    /// Draw page `index` onto `device`.
    fn run_page(&self, index: usize, device: &mut dyn DrawDevice, ctm: &Matrix) -> Result<()>;
}

/// One accepted replacement, as shown in reports and overlays.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReplacementRecord {
    /// Font name
    pub font: String,
    /// Source character
    pub original: String,
    /// Replacement character
    pub replacement: String,
    /// Why the replacement looks the way it does
    pub highlight: Option<Highlight>,
    /// Device-space footprint of the replacement
    pub quad: Quad,
}

/// Result of anonymizing one page.
#[derive(Debug, Clone, Serialize)]
pub struct PageReport {
    /// Zero-based page index
    pub page_index: usize,
    /// Output width in pixels
    pub width: u32,
    /// Output height in pixels
    pub height: u32,
    /// Accepted replacements in first-seen order
    pub replacements: Vec<ReplacementRecord>,
    /// Zone whitelist in device pixels
    pub zones: Vec<Rect>,
    /// Search counters
    pub stats: SearchStats,
}

impl PageReport {
    fn new(
        page_index: usize,
        (width, height): (u32, u32),
        cache: &ReplacementCache,
        zones: &ZoneWhitelist,
        stats: SearchStats,
    ) -> Self {
        let replacements = cache
            .iter()
            .map(|(key, glyph)| ReplacementRecord {
                font: key.font().to_string(),
                original: char_string(key.unicode()),
                replacement: char_string(glyph.unicode()),
                highlight: glyph.highlight(),
                quad: *glyph.quad(),
            })
            .collect();
        Self {
            page_index,
            width,
            height,
            replacements,
            zones: zones.zones().to_vec(),
            stats,
        }
    }

    /// Number of replacements with the given highlight.
    pub fn count(&self, highlight: Highlight) -> usize {
        self.replacements
            .iter()
            .filter(|r| r.highlight == Some(highlight))
            .count()
    }
}

fn char_string(unicode: u32) -> String {
    char::from_u32(unicode)
        .unwrap_or(char::REPLACEMENT_CHARACTER)
        .to_string()
}

/// Clean and highlighted rasters of one page.
#[cfg(feature = "rendering")]
#[derive(Debug, Clone)]
pub struct RenderedPage {
    /// Anonymized page
    pub clean: crate::rendering::RenderedImage,
    /// Anonymized page with the diagnostic overlay
    pub highlighted: crate::rendering::RenderedImage,
    /// What was replaced
    pub report: PageReport,
}

/// Runs pages through analysis and anonymization.
#[derive(Debug, Clone)]
pub struct Anonymizer {
    config: AnonymizerConfig,
    table: SubstitutionTable,
    zone_records: Vec<ZoneRecord>,
}

impl Anonymizer {
    /// Create a pipeline with the English substitution table and no zones.
    pub fn new(config: AnonymizerConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            table: SubstitutionTable::english(),
            zone_records: Vec::new(),
        })
    }

    /// Use a different substitution table.
    pub fn with_substitution_table(mut self, table: SubstitutionTable) -> Self {
        self.table = table;
        self
    }

    /// Use zone whitelist records (normalized page coordinates).
    pub fn with_zone_records(mut self, records: Vec<ZoneRecord>) -> Self {
        self.zone_records = records;
        self
    }

    /// The configuration in use.
    pub fn config(&self) -> &AnonymizerConfig {
        &self.config
    }

    /// Page space to device pixels.
    pub fn page_transform(&self, bounds: &Rect) -> Matrix {
        let scale = self.config.page_scale();
        Matrix::translation(-bounds.x, -bounds.y).concat(&Matrix::scaling(scale, scale))
    }

    /// Output size in pixels for a page.
    pub fn page_pixel_size(&self, bounds: &Rect) -> (u32, u32) {
        let scale = self.config.page_scale();
        (
            (bounds.width * scale).ceil().max(1.0) as u32,
            (bounds.height * scale).ceil().max(1.0) as u32,
        )
    }

    /// Zones for a page, scaled to its pixel size.
    pub fn zones_for_page(&self, index: usize, bounds: &Rect) -> ZoneWhitelist {
        let (width, height) = self.page_pixel_size(bounds);
        ZoneWhitelist::for_page(&self.zone_records, index, width as f32, height as f32)
    }

    /// Analysis pass: build the character catalog of a page.
    pub fn analyze_page<S: PageSource + ?Sized>(
        &self,
        source: &S,
        index: usize,
    ) -> Result<CharacterCatalog> {
        let mut analyzer = CharacterAnalyzer::new(self.table.clone());
        source.run_page(index, &mut analyzer, &Matrix::identity())?;
        Ok(analyzer.into_catalog())
    }

    /// Anonymize page `index` onto `device`.
    ///
    /// The device receives the page at output resolution. It is not closed.
    pub fn anonymize_page<S: PageSource + ?Sized>(
        &self,
        source: &S,
        index: usize,
        device: &mut dyn DrawDevice,
    ) -> Result<PageReport> {
        let bounds = source.page_bounds(index)?;
        let catalog = self.analyze_page(source, index)?;
        for (font, pool) in catalog.weakest_pools() {
            if pool.coverage() < self.config.low_coverage_threshold {
                log::debug!(
                    "Font {} covers {:.0}% of group {}",
                    font,
                    pool.coverage() * 100.0,
                    pool.group()
                );
            }
        }

        let zones = self.zones_for_page(index, &bounds);
        let ctm = self.page_transform(&bounds);
        let mut anonymizing = AnonymizingDevice::new(device, &catalog, zones.clone(), &self.config);
        source.run_page(index, &mut anonymizing, &ctm)?;
        let (cache, stats) = anonymizing.into_parts();

        log::info!(
            "Page {}: {} tokens ({} substituted, {} reused, {} whitelisted, {} unreplaceable), {} attempts",
            index + 1,
            stats.tokens,
            stats.substituted,
            stats.reused,
            stats.whitelisted,
            stats.unreplaceable,
            stats.attempts
        );
        Ok(PageReport::new(
            index,
            self.page_pixel_size(&bounds),
            &cache,
            &zones,
            stats,
        ))
    }

    /// Rasterize an anonymized page, with and without the overlay.
    #[cfg(feature = "rendering")]
    pub fn render_page<S: PageSource + ?Sized>(
        &self,
        source: &S,
        index: usize,
    ) -> Result<RenderedPage> {
        use crate::rendering::RasterDevice;

        let bounds = source.page_bounds(index)?;
        let (width, height) = self.page_pixel_size(&bounds);
        let mut raster = RasterDevice::new(width, height)?;
        let report = self.anonymize_page(source, index, &mut raster)?;
        let clean = raster.to_image()?;
        crate::debug::draw_overlay(&report, &mut raster, &self.config)?;
        let highlighted = raster.to_image()?;
        raster.close()?;
        Ok(RenderedPage {
            clean,
            highlighted,
            report,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::{Color, DisplayList, DisplayListPage, Text};
    use crate::fonts::{FontRef, MetricsFont, WritingMode};
    use std::sync::Arc;

    fn page(words: &str) -> DisplayListPage {
        let font: FontRef = Arc::new(MetricsFont::monospace("Mono", 0.6));
        let mut text = Text::new();
        let mut m = Matrix::new(10.0, 0.0, 0.0, -10.0, 10.0, 20.0);
        for ch in words.chars() {
            text.show_glyph(font.clone(), m, ch as u32, ch as u32, WritingMode::Horizontal);
            m = m.advance(0.6, 0.0);
        }
        let mut list = DisplayList::new();
        list.fill_text(&text, &Matrix::identity(), &Color::BLACK, 1.0)
            .unwrap();
        DisplayListPage::new(Rect::new(0.0, 0.0, 200.0, 100.0), list)
    }

    #[test]
    fn test_page_geometry() {
        let anonymizer = Anonymizer::new(AnonymizerConfig::new().with_resolution(144.0)).unwrap();
        let bounds = Rect::new(10.0, 20.0, 100.0, 50.5);
        assert_eq!(anonymizer.page_pixel_size(&bounds), (200, 101));
        let ctm = anonymizer.page_transform(&bounds);
        let origin = ctm.transform_point(10.0, 20.0);
        assert_eq!((origin.x, origin.y), (0.0, 0.0));
    }

    #[test]
    fn test_invalid_config_rejected() {
        assert!(Anonymizer::new(AnonymizerConfig::new().with_resolution(-1.0)).is_err());
    }

    #[test]
    fn test_anonymize_page_report() {
        let anonymizer = Anonymizer::new(AnonymizerConfig::new().with_seed(4)).unwrap();
        let source = page("sphinx of black quartz");
        let mut sink = DisplayList::new();
        let report = anonymizer.anonymize_page(&source, 0, &mut sink).unwrap();
        assert_eq!(report.page_index, 0);
        assert_eq!(report.replacements.len(), "sphinx of black quartz".len());
        assert_eq!(report.count(Highlight::CharacterWhitelisted), 3);
        assert_eq!(report.stats.tokens, 4);
        assert!(report.zones.is_empty());
        assert_eq!(sink.texts().next().map(Text::len), Some(22));
    }

    #[test]
    fn test_zone_records_apply() {
        let anonymizer = Anonymizer::new(AnonymizerConfig::new().with_seed(4))
            .unwrap()
            .with_zone_records(vec![ZoneRecord {
                x1: 0.0,
                y1: 0.0,
                x2: 1.0,
                y2: 1.0,
                page_index: None,
            }]);
        let source = page("private");
        let mut sink = DisplayList::new();
        let report = anonymizer.anonymize_page(&source, 0, &mut sink).unwrap();
        assert_eq!(report.zones.len(), 1);
        assert_eq!(report.count(Highlight::ZoneWhitelisted), 7);
        assert_eq!(
            sink.texts().next().map(Text::to_plain_string).as_deref(),
            Some("private")
        );
    }
}
