//! Anonymization tunables.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::whitelist::{CharacterWhitelist, DEFAULT_CHARACTER_WHITELIST};

/// Anonymization configuration.
///
/// Every field has a default, so a JSON file only needs to list the
/// values it changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnonymizerConfig {
    /// Output pixels per inch. Page space is scaled by `resolution / 72`.
    pub resolution: f32,

    /// Initial acceptance tolerance, as a multiple of the glyph size.
    pub glyph_replacement_tolerance: f32,

    /// Back off every `back_off_frequency × token length` failed attempts.
    pub back_off_frequency: usize,

    /// Tolerance multiplier applied at each back-off.
    pub back_off_amount: f32,

    /// Tokenizer continuity tolerance, as a fraction of glyph size.
    pub max_glyph_distance_ratio: f32,

    /// Pool coverage under which a substitution is flagged.
    pub low_coverage_threshold: f32,

    /// Attempt ceiling per token; `None` searches until success.
    pub max_attempts: Option<usize>,

    /// Wall-clock budget per token in milliseconds.
    pub deadline_ms: Option<u64>,

    /// RNG seed; `None` seeds from entropy.
    pub seed: Option<u64>,

    /// Characters that are never substituted.
    pub character_whitelist: String,

    /// Opacity of the highlight fill in the diagnostic overlay.
    pub highlight_alpha: f32,

    /// Zone outline width in the diagnostic overlay, in pixels.
    pub zone_outline_width: f32,
}

impl Default for AnonymizerConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl AnonymizerConfig {
    /// Create a configuration with defaults.
    pub fn new() -> Self {
        Self {
            resolution: 300.0,
            glyph_replacement_tolerance: 0.1,
            back_off_frequency: 10,
            back_off_amount: 1.5,
            max_glyph_distance_ratio: 0.1,
            low_coverage_threshold: 0.25,
            max_attempts: Some(10_000),
            deadline_ms: None,
            seed: None,
            character_whitelist: DEFAULT_CHARACTER_WHITELIST.to_string(),
            highlight_alpha: 0.3,
            zone_outline_width: 5.0,
        }
    }

    /// Set the output resolution.
    pub fn with_resolution(mut self, dpi: f32) -> Self {
        self.resolution = dpi;
        self
    }

    /// Set the initial acceptance tolerance.
    pub fn with_glyph_replacement_tolerance(mut self, tolerance: f32) -> Self {
        self.glyph_replacement_tolerance = tolerance;
        self
    }

    /// Set the back-off schedule.
    pub fn with_back_off(mut self, frequency: usize, amount: f32) -> Self {
        self.back_off_frequency = frequency;
        self.back_off_amount = amount;
        self
    }

    /// Set the tokenizer continuity ratio.
    pub fn with_max_glyph_distance_ratio(mut self, ratio: f32) -> Self {
        self.max_glyph_distance_ratio = ratio;
        self
    }

    /// Set the low coverage warning threshold.
    pub fn with_low_coverage_threshold(mut self, threshold: f32) -> Self {
        self.low_coverage_threshold = threshold;
        self
    }

    /// Set the attempt ceiling.
    pub fn with_max_attempts(mut self, max_attempts: Option<usize>) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    /// Set the per-token deadline.
    pub fn with_deadline_ms(mut self, deadline_ms: Option<u64>) -> Self {
        self.deadline_ms = deadline_ms;
        self
    }

    /// Seed the substitution RNG.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Replace the character whitelist.
    pub fn with_character_whitelist(mut self, chars: impl Into<String>) -> Self {
        self.character_whitelist = chars.into();
        self
    }

    /// Set the overlay fill opacity.
    pub fn with_highlight_alpha(mut self, alpha: f32) -> Self {
        self.highlight_alpha = alpha;
        self
    }

    /// Page space to device space scale factor.
    pub fn page_scale(&self) -> f32 {
        self.resolution / 72.0
    }

    /// Character whitelist as a lookup set.
    pub fn character_whitelist(&self) -> CharacterWhitelist {
        CharacterWhitelist::new(&self.character_whitelist)
    }

    /// Check that every tunable is usable.
    pub fn validate(&self) -> Result<()> {
        let positive = [
            ("resolution", self.resolution),
            ("glyph_replacement_tolerance", self.glyph_replacement_tolerance),
            ("back_off_amount", self.back_off_amount),
            ("max_glyph_distance_ratio", self.max_glyph_distance_ratio),
        ];
        for (name, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(Error::InvalidConfig(format!("{} must be positive, got {}", name, value)));
            }
        }
        if self.back_off_frequency == 0 {
            return Err(Error::InvalidConfig("back_off_frequency must be at least 1".into()));
        }
        // Without a ceiling only a growing tolerance guarantees termination
        if self.max_attempts.is_none() && self.back_off_amount <= 1.0 {
            return Err(Error::InvalidConfig(format!(
                "back_off_amount must exceed 1 when max_attempts is unbounded, got {}",
                self.back_off_amount
            )));
        }
        if !(0.0..=1.0).contains(&self.low_coverage_threshold) {
            return Err(Error::InvalidConfig(format!(
                "low_coverage_threshold must be in [0, 1], got {}",
                self.low_coverage_threshold
            )));
        }
        if !(0.0..=1.0).contains(&self.highlight_alpha) {
            return Err(Error::InvalidConfig(format!(
                "highlight_alpha must be in [0, 1], got {}",
                self.highlight_alpha
            )));
        }
        Ok(())
    }

    /// Load and validate a JSON configuration file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path.as_ref())?;
        let config: Self = serde_json::from_str(&json)?;
        config.validate()?;
        Ok(config)
    }
}
