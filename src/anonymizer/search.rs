//! Width-matched token substitution.
//!
//! For each token the search draws random replacement sequences until one
//! ends, in device space, close enough to where the original token ends.
//! Individual glyphs may be wider or narrower than the ones they replace;
//! only the cumulative error at the end of the token is checked.
//!
//! The acceptance tolerance starts at `glyph_replacement_tolerance` times
//! the device size of the token's first glyph, and is multiplied by
//! `back_off_amount` every `back_off_frequency × token length` rejected
//! candidates. An optional attempt ceiling and deadline end the search by
//! keeping the original glyphs.

use std::time::{Duration, Instant};

use rand::Rng;
use serde::Serialize;

use super::ReplacementCache;
use crate::catalog::CharacterCatalog;
use crate::config::AnonymizerConfig;
use crate::text::{Glyph, Highlight, Token};
use crate::whitelist::{CharacterWhitelist, ZoneWhitelist};

/// Search tunables.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchPolicy {
    /// Initial tolerance as a multiple of the first glyph's device size
    pub glyph_replacement_tolerance: f32,
    /// Back off every `back_off_frequency × token length` failures
    pub back_off_frequency: usize,
    /// Tolerance multiplier per back-off
    pub back_off_amount: f32,
    /// Pool coverage below which substitutions are flagged
    pub low_coverage_threshold: f32,
    /// Candidates to try before keeping the original; `None` for no limit
    pub max_attempts: Option<usize>,
    /// Wall-clock budget per token
    pub deadline: Option<Duration>,
}

impl Default for SearchPolicy {
    fn default() -> Self {
        Self::from(&AnonymizerConfig::default())
    }
}

impl From<&AnonymizerConfig> for SearchPolicy {
    fn from(config: &AnonymizerConfig) -> Self {
        Self {
            glyph_replacement_tolerance: config.glyph_replacement_tolerance,
            back_off_frequency: config.back_off_frequency,
            back_off_amount: config.back_off_amount,
            low_coverage_threshold: config.low_coverage_threshold,
            max_attempts: config.max_attempts,
            deadline: config.deadline_ms.map(Duration::from_millis),
        }
    }
}

/// Read-only inputs shared by every token of a page.
#[derive(Debug, Clone, Copy)]
pub struct SearchContext<'a> {
    /// Per-font pools for the page
    pub catalog: &'a CharacterCatalog,
    /// Never-substituted characters
    pub characters: &'a CharacterWhitelist,
    /// Never-substituted regions, in device space
    pub zones: &'a ZoneWhitelist,
}

impl SearchContext<'_> {
    /// Why a glyph is exempt from substitution, if it is.
    ///
    /// Zones take precedence over characters.
    pub fn exemption(&self, glyph: &Glyph) -> Option<Highlight> {
        if self.zones.contains_glyph(glyph) {
            Some(Highlight::ZoneWhitelisted)
        } else if self.characters.contains(glyph.unicode()) {
            Some(Highlight::CharacterWhitelisted)
        } else {
            None
        }
    }
}

/// Why the original glyphs were kept.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "snake_case", tag = "reason")]
pub enum KeepReason {
    /// Every glyph is zone or character whitelisted
    Whitelisted,
    /// The attempt ceiling was reached
    AttemptsExhausted {
        /// Candidates tried
        attempts: usize,
    },
    /// The per-token deadline passed
    DeadlineExceeded {
        /// Candidates tried before the deadline
        attempts: usize,
    },
}

/// How a token was resolved.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "snake_case", tag = "outcome")]
pub enum SearchOutcome {
    /// A candidate within tolerance was accepted
    Substituted {
        /// Candidates built, the accepted one included
        attempts: usize,
        /// Number of tolerance increases
        back_offs: u32,
        /// Tolerance in force when the candidate was accepted
        tolerance: f32,
        /// End-position error of the accepted candidate
        distance: f32,
    },
    /// Every glyph already had a replacement
    Reused,
    /// The original glyphs were emitted
    KeptOriginal(KeepReason),
}

/// Resolved glyphs for one token.
#[derive(Debug, Clone)]
pub struct TokenReplacement {
    /// Glyphs to draw, one per source glyph
    pub glyphs: Vec<Glyph>,
    /// How they were chosen
    pub outcome: SearchOutcome,
}

/// Per-run counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct SearchStats {
    /// Tokens resolved
    pub tokens: usize,
    /// Tokens replaced by an accepted candidate
    pub substituted: usize,
    /// Tokens served entirely from the cache
    pub reused: usize,
    /// Tokens skipped because every glyph is whitelisted
    pub whitelisted: usize,
    /// Tokens kept after hitting the attempt ceiling or deadline
    pub unreplaceable: usize,
    /// Candidates built across all tokens
    pub attempts: usize,
    /// Tolerance increases across all tokens
    pub back_offs: u64,
}

impl SearchStats {
    /// Fold one outcome into the counters.
    pub fn record(&mut self, outcome: &SearchOutcome) {
        self.tokens += 1;
        match *outcome {
            SearchOutcome::Substituted {
                attempts,
                back_offs,
                ..
            } => {
                self.substituted += 1;
                self.attempts += attempts;
                self.back_offs += u64::from(back_offs);
            },
            SearchOutcome::Reused => self.reused += 1,
            SearchOutcome::KeptOriginal(KeepReason::Whitelisted) => self.whitelisted += 1,
            SearchOutcome::KeptOriginal(
                KeepReason::AttemptsExhausted { attempts }
                | KeepReason::DeadlineExceeded { attempts },
            ) => {
                self.unreplaceable += 1;
                self.attempts += attempts;
            },
        }
    }
}

/// The randomized width-matching search.
#[derive(Debug, Clone, Default)]
pub struct SubstitutionSearch {
    policy: SearchPolicy,
}

impl SubstitutionSearch {
    /// Create a search with the given policy.
    pub fn new(policy: SearchPolicy) -> Self {
        Self { policy }
    }

    /// The policy in use.
    pub fn policy(&self) -> &SearchPolicy {
        &self.policy
    }

    /// Tolerance before any back-off, in device units.
    pub fn initial_tolerance(&self, token: &Token) -> f32 {
        // Degenerate glyph matrices still need a tolerance that can grow
        (self.policy.glyph_replacement_tolerance * token.first().device_size())
            .max(f32::MIN_POSITIVE)
    }

    /// Choose replacement glyphs for `token`.
    ///
    /// Never fails: when no candidate is accepted before the attempt ceiling
    /// or deadline, the original glyphs are returned flagged
    /// [`Highlight::Unreplaceable`]. Every source glyph ends up with an
    /// entry in `cache`.
    pub fn anonymize_token<R: Rng + ?Sized>(
        &self,
        token: &Token,
        ctx: &SearchContext<'_>,
        cache: &mut ReplacementCache,
        rng: &mut R,
    ) -> TokenReplacement {
        let source = token.glyphs();
        let exemptions: Vec<Option<Highlight>> = source.iter().map(|g| ctx.exemption(g)).collect();

        if exemptions.iter().all(Option::is_some) {
            let glyphs: Vec<Glyph> = source
                .iter()
                .zip(&exemptions)
                .map(|(g, reason)| match reason {
                    Some(highlight) => g.clone().with_highlight(*highlight),
                    None => g.clone(),
                })
                .collect();
            record(cache, source, &glyphs);
            return TokenReplacement {
                glyphs,
                outcome: SearchOutcome::KeptOriginal(KeepReason::Whitelisted),
            };
        }

        if source.iter().all(|g| cache.contains(&g.key())) {
            let glyphs = self.build_candidate(source, &exemptions, ctx, cache, rng);
            return TokenReplacement {
                glyphs,
                outcome: SearchOutcome::Reused,
            };
        }

        let target = token.final_device_next();
        let initial = self.initial_tolerance(token);
        let period = self.policy.back_off_frequency.max(1) * source.len();
        let started = Instant::now();
        let mut tolerance = initial;
        let mut attempts = 0usize;
        let mut back_offs = 0u32;

        log::debug!("replacing {:?} (tolerance: {:.3})", token.text(), tolerance);

        loop {
            attempts += 1;
            let candidate = self.build_candidate(source, &exemptions, ctx, cache, rng);
            let distance = candidate
                .last()
                .map_or(0.0, |g| g.device_next_matrix().distance(&target));
            log::trace!("{:?} -> {:?} ({:.3})", token.text(), text_of(&candidate), distance);

            if distance <= tolerance {
                log::debug!(
                    "{:?} -> {:?} after {} attempts",
                    token.text(),
                    text_of(&candidate),
                    attempts
                );
                record(cache, source, &candidate);
                return TokenReplacement {
                    glyphs: candidate,
                    outcome: SearchOutcome::Substituted {
                        attempts,
                        back_offs,
                        tolerance,
                        distance,
                    },
                };
            }

            if self.policy.max_attempts.is_some_and(|max| attempts >= max) {
                log::warn!(
                    "Keeping {:?}: no replacement within {:.3} after {} attempts",
                    token.text(),
                    tolerance,
                    attempts
                );
                return self.keep_original(
                    source,
                    &exemptions,
                    cache,
                    KeepReason::AttemptsExhausted { attempts },
                );
            }
            if self
                .policy
                .deadline
                .is_some_and(|deadline| started.elapsed() >= deadline)
            {
                log::warn!(
                    "Keeping {:?}: deadline passed after {} attempts",
                    token.text(),
                    attempts
                );
                return self.keep_original(
                    source,
                    &exemptions,
                    cache,
                    KeepReason::DeadlineExceeded { attempts },
                );
            }

            if attempts % period == 0 {
                tolerance *= self.policy.back_off_amount;
                back_offs += 1;
                log::debug!("increasing tolerance to {:.3}", tolerance);
            }
        }
    }

    /// One candidate, laid out glyph after glyph from the token start.
    fn build_candidate<R: Rng + ?Sized>(
        &self,
        source: &[Glyph],
        exemptions: &[Option<Highlight>],
        ctx: &SearchContext<'_>,
        cache: &ReplacementCache,
        rng: &mut R,
    ) -> Vec<Glyph> {
        let mut candidate: Vec<Glyph> = Vec::with_capacity(source.len());
        for (original, exemption) in source.iter().zip(exemptions) {
            let next = match cache.get(&original.key()) {
                Some(cached) => place(cached, candidate.last(), original),
                None => {
                    let placed = place(original, candidate.last(), original);
                    match exemption {
                        Some(highlight) => placed.with_highlight(*highlight),
                        None => self.substitute(&placed, ctx, rng),
                    }
                },
            };
            candidate.push(next);
        }
        candidate
    }

    fn substitute<R: Rng + ?Sized>(
        &self,
        glyph: &Glyph,
        ctx: &SearchContext<'_>,
        rng: &mut R,
    ) -> Glyph {
        let proposal =
            ctx.catalog
                .propose_substitute(glyph.font().name(), glyph.unicode(), glyph.glyph(), rng);
        let highlight = match proposal.coverage {
            None => Highlight::NotSubstitutable,
            Some(coverage) if coverage < self.policy.low_coverage_threshold => {
                Highlight::LowCoverage
            },
            Some(_) if proposal.unicode == glyph.unicode() => Highlight::Unchanged,
            Some(_) => Highlight::Substituted,
        };
        glyph.with_substitute(proposal.glyph, proposal.unicode, highlight)
    }

    fn keep_original(
        &self,
        source: &[Glyph],
        exemptions: &[Option<Highlight>],
        cache: &mut ReplacementCache,
        reason: KeepReason,
    ) -> TokenReplacement {
        let glyphs: Vec<Glyph> = source
            .iter()
            .zip(exemptions)
            .map(|(g, exemption)| match cache.get(&g.key()) {
                Some(cached) => cached.with_placement(*g.matrix(), *g.ctm()),
                None => g
                    .clone()
                    .with_highlight(exemption.unwrap_or(Highlight::Unreplaceable)),
            })
            .collect();
        record(cache, source, &glyphs);
        TokenReplacement {
            glyphs,
            outcome: SearchOutcome::KeptOriginal(reason),
        }
    }
}

/// Position `glyph` after `previous`, or where `original` starts.
fn place(glyph: &Glyph, previous: Option<&Glyph>, original: &Glyph) -> Glyph {
    match previous {
        Some(previous) => glyph.place_after(previous),
        None => glyph.with_placement(*original.matrix(), *original.ctm()),
    }
}

fn record(cache: &mut ReplacementCache, source: &[Glyph], replacements: &[Glyph]) {
    for (original, replacement) in source.iter().zip(replacements) {
        cache.insert(original.key(), replacement.clone());
    }
}

fn text_of(glyphs: &[Glyph]) -> String {
    glyphs
        .iter()
        .map(|g| g.character().unwrap_or(char::REPLACEMENT_CHARACTER))
        .collect()
}
