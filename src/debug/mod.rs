//! Diagnostic overlay for anonymized pages.
//!
//! The overlay paints every accepted replacement with a translucent fill
//! in the color of its [`Highlight`](crate::text::Highlight), then outlines
//! each zone whitelist rectangle in red. It is drawn through the
//! [`DrawDevice`] interface so any device can receive it.
//!
//! ## Example
//!
//! ```ignore
//! use pdf_anonymizer::debug::draw_overlay;
//!
//! let report = anonymizer.anonymize_page(&document, 0, &mut raster)?;
//! draw_overlay(&report, &mut raster, anonymizer.config())?;
//! raster.to_image()?.save("page-1.info.png")?;
//! ```

use crate::anonymizer::PageReport;
use crate::config::AnonymizerConfig;
use crate::device::{Color, DrawDevice, Path, StrokeState};
use crate::error::Result;
use crate::geometry::Matrix;

/// Draw highlights and zone outlines for a page report.
///
/// Report coordinates are device pixels, so everything is drawn with an
/// identity transform. Replacements without a highlight are skipped.
pub fn draw_overlay(
    report: &PageReport,
    device: &mut dyn DrawDevice,
    config: &AnonymizerConfig,
) -> Result<()> {
    let identity = Matrix::identity();
    let mut highlighted = 0;
    for record in &report.replacements {
        let Some(highlight) = record.highlight else {
            continue;
        };
        device.fill_path(
            &Path::from_quad(&record.quad),
            false,
            &identity,
            &Color::Rgb(highlight.color()),
            config.highlight_alpha,
        )?;
        highlighted += 1;
    }

    let outline = StrokeState::with_width(config.zone_outline_width);
    for zone in &report.zones {
        device.stroke_path(&Path::from_rect(zone), &outline, &identity, &Color::RED, 1.0)?;
    }
    log::debug!(
        "Overlay for page {}: {} highlights, {} zones",
        report.page_index + 1,
        highlighted,
        report.zones.len()
    );
    Ok(())
}
