//! Error types for the anonymizer.
//!
//! This module defines all error types that can occur while loading
//! configuration and whitelists, resolving fonts, and rendering pages.
//! The substitution search itself never fails: it can only fall back to
//! keeping the original glyphs.

/// Result type alias for anonymizer operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur during anonymization.
#[derive(Debug, thiserror::Error)]
#[allow(clippy::enum_variant_names)] // "Invalid" prefix is intentional for clarity
pub enum Error {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON decoding error (config, whitelist, frequency table, page description)
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A zone whitelist record is malformed
    #[error("Invalid zone whitelist record {index}: {reason}")]
    InvalidWhitelist {
        /// Position of the offending record in the file
        index: usize,
        /// Reason the record was rejected
        reason: String,
    },

    /// A tunable parameter is out of range
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Font error
    #[error("Font error: {0}")]
    Font(String),

    /// A drawing command references a font that was never declared
    #[error("Unknown font: {0}")]
    UnknownFont(String),

    /// Rendering or image encoding error
    #[error("Render error: {0}")]
    Render(String),

    /// Page index past the end of the document
    #[error("Page {index} out of range (document has {count} pages)")]
    PageOutOfRange {
        /// Requested zero-based page index
        index: usize,
        /// Number of pages in the document
        count: usize,
    },
}
