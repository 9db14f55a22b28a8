// Allow some clippy lints that are too pedantic for this project
#![allow(clippy::too_many_arguments)]
#![allow(clippy::enum_variant_names)]
#![allow(clippy::should_implement_trait)]
// Allow unused for tests
#![cfg_attr(test, allow(dead_code))]
#![cfg_attr(test, allow(unused_variables))]

//! # PDF Anonymizer
//!
//! Glyph-level text anonymization for rendered document pages. Every visible
//! character is replaced by a different character drawn from the same
//! font, chosen so that each word keeps nearly the same on-page footprint.
//! The page still looks like a page (same layout, same line lengths, same
//! fonts) but its text no longer says anything.
//!
//! ## Core Features
//!
//! - **Footprint-preserving substitution**: randomized search per token,
//!   accepted once the replacement ends within a tolerance of the original
//! - **Frequency-weighted draws**: replacements follow English letter
//!   frequencies, restricted to characters the font actually shows on the page
//! - **Whitelists**: characters (punctuation, spaces) and page zones that are
//!   never touched
//! - **Consistent output**: every glyph is replaced the same way each time
//!   it is drawn (fill, clip, stroke)
//! - **Diagnostic overlay**: color-coded highlights of every decision
//!
//! ## Architecture
//!
//! The host engine draws pages through the [`device::DrawDevice`] trait.
//! [`device::AnonymizingDevice`] sits in front of the real output device,
//! rewrites text runs and forwards everything else untouched.
//! [`anonymizer::Anonymizer`] runs the analysis and render passes for a page
//! from any [`anonymizer::PageSource`].
//!
//! ## Quick Start
//!
//! ```ignore
//! use pdf_anonymizer::anonymizer::Anonymizer;
//! use pdf_anonymizer::config::AnonymizerConfig;
//! use pdf_anonymizer::document::JsonDocument;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let document = JsonDocument::open("letter.json")?;
//! let anonymizer = Anonymizer::new(AnonymizerConfig::default().with_seed(7))?;
//! let page = anonymizer.render_page(&document, 0)?;
//! page.clean.save("page-1.png")?;
//! page.highlighted.save("page-1.info.png")?;
//! # Ok(())
//! # }
//! ```
//!
//! ## License
//!
//! Licensed under either of:
//!
//! * Apache License, Version 2.0 ([LICENSE-APACHE](LICENSE-APACHE) or <http://www.apache.org/licenses/LICENSE-2.0>)
//! * MIT license ([LICENSE-MIT](LICENSE-MIT) or <http://opensource.org/licenses/MIT>)
//!
//! at your option.

#![warn(missing_docs)]
#![cfg_attr(docsrs, feature(doc_cfg))]

// Error handling
pub mod error;

// Configuration
pub mod config;

// Geometry and fonts
pub mod fonts;
pub mod geometry;

// Character analysis and tokenization
pub mod catalog;
pub mod text;
pub mod whitelist;

// Substitution search and page pipeline
pub mod anonymizer;

// Draw device interface and adapters
pub mod device;

// Page rendering to images (optional)
#[cfg(feature = "rendering")]
#[cfg_attr(docsrs, doc(cfg(feature = "rendering")))]
pub mod rendering;

// Diagnostic overlay
pub mod debug;

// JSON page descriptions
pub mod document;

// Re-exports
pub use anonymizer::{Anonymizer, PageReport, PageSource};
pub use config::AnonymizerConfig;
pub use device::{AnonymizingDevice, DrawDevice};
pub use document::JsonDocument;
pub use error::{Error, Result};

// Internal utilities
pub(crate) mod utils {
    //! Internal utility functions for the library.

    use std::cmp::Ordering;

    /// Compare two floats with NaN sorted after every number.
    ///
    /// Sorting with this never panics, whatever the input.
    #[inline]
    pub fn safe_float_cmp(a: f32, b: f32) -> Ordering {
        match (a.is_nan(), b.is_nan()) {
            (true, true) => Ordering::Equal,
            (true, false) => Ordering::Greater,
            (false, true) => Ordering::Less,
            (false, false) => a.partial_cmp(&b).unwrap_or(Ordering::Equal),
        }
    }

}

// Version info
/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
