//! Substitution search behavior: acceptance, distribution and exemptions.

use pdf_anonymizer::anonymizer::{
    KeepReason, ReplacementCache, SearchContext, SearchOutcome, SearchPolicy, SubstitutionSearch,
};
use pdf_anonymizer::catalog::{CharacterCatalog, SubstitutionTable};
use pdf_anonymizer::fonts::{FontRef, MetricsFont, WritingMode};
use pdf_anonymizer::geometry::{Matrix, Rect};
use pdf_anonymizer::text::{Glyph, Highlight, Token, Tokenizer};
use pdf_anonymizer::whitelist::{CharacterWhitelist, ZoneWhitelist};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

const LOWER: &str = "abcdefghijklmnopqrstuvwxyz";

fn proportional_font() -> FontRef {
    // Narrow i/l/j, wide m/w, everything else in between
    let advances = LOWER.chars().map(|ch| {
        let advance = match ch {
            'i' | 'l' | 'j' => 0.25,
            'f' | 't' | 'r' => 0.35,
            'm' | 'w' => 0.8,
            _ => 0.5,
        };
        (ch, advance)
    });
    Arc::new(MetricsFont::from_char_advances("Prop", 0.5, advances))
}

fn catalog(font: &FontRef, text: &str) -> CharacterCatalog {
    let mut builder = CharacterCatalog::builder(SubstitutionTable::english());
    for ch in text.chars() {
        builder.observe(font.name(), ch as u32, ch as u32);
    }
    builder.build()
}

fn glyphs(font: &FontRef, text: &str, x: f32, y: f32) -> Vec<Glyph> {
    let mut m = Matrix::new(12.0, 0.0, 0.0, -12.0, x, y);
    text.chars()
        .map(|ch| {
            let g = Glyph::new(
                font.clone(),
                m,
                ch as u32,
                ch as u32,
                WritingMode::Horizontal,
                Matrix::scaling(300.0 / 72.0, 300.0 / 72.0),
            );
            m = *g.next_matrix();
            g
        })
        .collect()
}

fn token(font: &FontRef, text: &str) -> Token {
    Token::new(glyphs(font, text, 72.0, 100.0)).unwrap()
}

fn text_of(glyphs: &[Glyph]) -> String {
    glyphs.iter().filter_map(Glyph::character).collect()
}

mod acceptance {
    use super::*;

    #[test]
    fn test_cat_is_replaced_within_tolerance() {
        let font = proportional_font();
        let catalog = catalog(&font, LOWER);
        let characters = CharacterWhitelist::default();
        let zones = ZoneWhitelist::default();
        let ctx = SearchContext {
            catalog: &catalog,
            characters: &characters,
            zones: &zones,
        };
        let search = SubstitutionSearch::default();
        let mut cache = ReplacementCache::new();
        let mut rng = StdRng::seed_from_u64(11);

        let source = token(&font, "cat");
        let result = search.anonymize_token(&source, &ctx, &mut cache, &mut rng);

        assert_eq!(result.glyphs.len(), 3);
        assert!(text_of(&result.glyphs).chars().all(|c| c.is_ascii_lowercase()));
        let end = result.glyphs[2].device_next_matrix();
        let target = source.final_device_next();
        match result.outcome {
            SearchOutcome::Substituted {
                back_offs,
                tolerance,
                distance,
                ..
            } => {
                let policy = search.policy();
                let bound = search.initial_tolerance(&source)
                    * policy.back_off_amount.powi(back_offs as i32);
                assert!(tolerance <= bound * 1.0001);
                assert!(distance <= tolerance);
                assert!((end.distance(&target) - distance).abs() < 1e-3);
            },
            other => panic!("expected a substitution, got {:?}", other),
        }
        // First replacement starts exactly where the source did
        assert_eq!(result.glyphs[0].matrix(), source.first().matrix());
        assert_eq!(cache.len(), 3);
    }

    #[test]
    fn test_accepted_replacements_across_seeds() {
        let font = proportional_font();
        let catalog = catalog(&font, LOWER);
        let characters = CharacterWhitelist::default();
        let zones = ZoneWhitelist::default();
        let ctx = SearchContext {
            catalog: &catalog,
            characters: &characters,
            zones: &zones,
        };
        let search = SubstitutionSearch::default();

        for (seed, word) in ["minimum", "width", "lilt", "anonymous", "a"].iter().enumerate() {
            let mut cache = ReplacementCache::new();
            let mut rng = StdRng::seed_from_u64(seed as u64);
            let source = token(&font, word);
            let result = search.anonymize_token(&source, &ctx, &mut cache, &mut rng);
            assert_eq!(result.glyphs.len(), word.len());
            if let SearchOutcome::Substituted {
                tolerance, distance, ..
            } = result.outcome
            {
                assert!(distance <= tolerance, "{}: {} > {}", word, distance, tolerance);
                let end = result.glyphs.last().unwrap().device_next_matrix();
                assert!(end.distance(&source.final_device_next()) <= tolerance + 1e-3);
            }
            // Each source glyph has exactly one cached replacement
            assert_eq!(cache.len(), word.len());
        }
    }

    #[test]
    fn test_back_off_reaches_acceptance() {
        // One very wide letter among narrow ones: the tolerance has to grow
        let advances = LOWER
            .chars()
            .map(|ch| (ch, if ch == 'w' { 2.0 } else { 0.3 }));
        let font: FontRef = Arc::new(MetricsFont::from_char_advances("Odd", 0.3, advances));
        let catalog = catalog(&font, LOWER);
        let characters = CharacterWhitelist::default();
        let zones = ZoneWhitelist::default();
        let ctx = SearchContext {
            catalog: &catalog,
            characters: &characters,
            zones: &zones,
        };
        let search = SubstitutionSearch::new(SearchPolicy {
            back_off_frequency: 1,
            back_off_amount: 2.0,
            max_attempts: None,
            ..SearchPolicy::default()
        });
        let mut cache = ReplacementCache::new();
        let mut rng = StdRng::seed_from_u64(5);
        let result = search.anonymize_token(&token(&font, "w"), &ctx, &mut cache, &mut rng);
        assert!(matches!(result.outcome, SearchOutcome::Substituted { .. }));
    }

    #[test]
    fn test_attempt_ceiling_keeps_original() {
        let advances = LOWER
            .chars()
            .map(|ch| (ch, if ch == 'w' { 2.0 } else { 0.3 }));
        let font: FontRef = Arc::new(MetricsFont::from_char_advances("Odd", 0.3, advances));
        let catalog = catalog(&font, LOWER);
        let characters = CharacterWhitelist::default();
        let zones = ZoneWhitelist::default();
        let ctx = SearchContext {
            catalog: &catalog,
            characters: &characters,
            zones: &zones,
        };
        let search = SubstitutionSearch::new(SearchPolicy {
            max_attempts: Some(1),
            ..SearchPolicy::default()
        });

        // 'w' is drawn itself with probability 19/1618; find a seed where it is not
        let kept = (0..20u64).find_map(|seed| {
            let mut cache = ReplacementCache::new();
            let mut rng = StdRng::seed_from_u64(seed);
            let result = search.anonymize_token(&token(&font, "w."), &ctx, &mut cache, &mut rng);
            match result.outcome {
                SearchOutcome::KeptOriginal(reason) => Some((reason, result.glyphs, cache)),
                _ => None,
            }
        });
        let (reason, glyphs, cache) = kept.expect("a seed where the single attempt fails");
        assert_eq!(reason, KeepReason::AttemptsExhausted { attempts: 1 });
        assert_eq!(text_of(&glyphs), "w.");
        assert_eq!(glyphs[0].highlight(), Some(Highlight::Unreplaceable));
        // The period was never a candidate for replacement
        assert_eq!(glyphs[1].highlight(), Some(Highlight::CharacterWhitelisted));
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_deadline_keeps_original() {
        // Only 'm' and 'i' can be drawn; no pair of them is as wide as "xx"
        let font: FontRef = Arc::new(MetricsFont::from_char_advances(
            "Narrow",
            0.5,
            [('m', 1.0), ('i', 0.1), ('x', 0.7)],
        ));
        let catalog = catalog(&font, "mi");
        let characters = CharacterWhitelist::default();
        let zones = ZoneWhitelist::default();
        let ctx = SearchContext {
            catalog: &catalog,
            characters: &characters,
            zones: &zones,
        };
        let search = SubstitutionSearch::new(SearchPolicy {
            glyph_replacement_tolerance: 1e-6,
            back_off_amount: 1.0,
            max_attempts: None,
            deadline: Some(Duration::from_millis(5)),
            ..SearchPolicy::default()
        });
        let mut cache = ReplacementCache::new();
        let mut rng = StdRng::seed_from_u64(2);
        let result = search.anonymize_token(&token(&font, "xx,"), &ctx, &mut cache, &mut rng);

        match result.outcome {
            SearchOutcome::KeptOriginal(KeepReason::DeadlineExceeded { attempts }) => {
                assert!(attempts >= 1)
            },
            other => panic!("expected the deadline to pass, got {:?}", other),
        }
        assert_eq!(text_of(&result.glyphs), "xx,");
        let highlights: Vec<_> = result.glyphs.iter().map(Glyph::highlight).collect();
        assert_eq!(
            highlights,
            vec![
                Some(Highlight::Unreplaceable),
                Some(Highlight::Unreplaceable),
                Some(Highlight::CharacterWhitelisted),
            ]
        );
        assert_eq!(cache.len(), 3);
    }

    #[test]
    fn test_vertical_token_within_tolerance() {
        let font = proportional_font();
        let catalog = catalog(&font, LOWER);
        let characters = CharacterWhitelist::default();
        let zones = ZoneWhitelist::default();
        let ctx = SearchContext {
            catalog: &catalog,
            characters: &characters,
            zones: &zones,
        };
        let ctm = Matrix::scaling(300.0 / 72.0, 300.0 / 72.0);
        let mut m = Matrix::new(12.0, 0.0, 0.0, -12.0, 300.0, 72.0);
        let column: Vec<Glyph> = "column"
            .chars()
            .map(|ch| {
                let g = Glyph::new(
                    font.clone(),
                    m,
                    ch as u32,
                    ch as u32,
                    WritingMode::Vertical,
                    ctm,
                );
                m = *g.next_matrix();
                g
            })
            .collect();
        let tokens = Tokenizer::default().tokenize(column, &characters);
        assert_eq!(tokens.len(), 1);
        let source = &tokens[0];

        let search = SubstitutionSearch::default();
        let mut cache = ReplacementCache::new();
        let mut rng = StdRng::seed_from_u64(21);
        let result = search.anonymize_token(source, &ctx, &mut cache, &mut rng);

        assert_eq!(result.glyphs.len(), 6);
        assert!(result.glyphs.iter().all(|g| g.wmode() == WritingMode::Vertical));
        let end = result.glyphs[5].device_next_matrix();
        let target = source.final_device_next();
        match result.outcome {
            SearchOutcome::Substituted {
                tolerance, distance, ..
            } => {
                assert!(distance <= tolerance);
                assert!(end.distance(&target) <= tolerance + 1e-3);
            },
            other => panic!("expected a substitution, got {:?}", other),
        }
        // The pen runs down the column, not across it
        let start = source.first().device_matrix();
        assert!((end.e - start.e).abs() < 1e-3);
        assert!(end.f > start.f);
    }
}

mod distribution {
    use super::*;

    /// Single-glyph tokens in a monospace font are always accepted on the
    /// first draw, so replacement frequencies follow the pool weights.
    #[test]
    fn test_replacements_follow_letter_weights() {
        let font: FontRef = Arc::new(MetricsFont::monospace("Mono", 0.6));
        let catalog = catalog(&font, LOWER);
        let characters = CharacterWhitelist::default();
        let zones = ZoneWhitelist::default();
        let ctx = SearchContext {
            catalog: &catalog,
            characters: &characters,
            zones: &zones,
        };
        let search = SubstitutionSearch::default();
        let mut rng = StdRng::seed_from_u64(2024);
        let source = token(&font, "e");

        const DRAWS: usize = 20_000;
        let mut counts: HashMap<char, usize> = HashMap::new();
        for _ in 0..DRAWS {
            let mut cache = ReplacementCache::new();
            let result = search.anonymize_token(&source, &ctx, &mut cache, &mut rng);
            let ch = result.glyphs[0].character().unwrap();
            *counts.entry(ch).or_default() += 1;
        }

        let table = SubstitutionTable::english();
        let group = &table.groups()[table.group_index('e' as u32).unwrap()];
        let total = group.total_weight();
        let chi_square: f64 = group
            .entries()
            .iter()
            .map(|&(ch, weight)| {
                let expected = DRAWS as f64 * weight / total;
                let observed = *counts.get(&ch).unwrap_or(&0) as f64;
                (observed - expected).powi(2) / expected
            })
            .sum();
        // 25 degrees of freedom; 52.6 is the 0.1% critical value
        assert!(chi_square < 60.0, "chi-square {:.1}", chi_square);
        assert!(counts.keys().all(|c| c.is_ascii_lowercase()));
    }

    #[test]
    fn test_pool_limited_to_page_characters() {
        let font: FontRef = Arc::new(MetricsFont::monospace("Mono", 0.6));
        let catalog = catalog(&font, "abc");
        let characters = CharacterWhitelist::default();
        let zones = ZoneWhitelist::default();
        let ctx = SearchContext {
            catalog: &catalog,
            characters: &characters,
            zones: &zones,
        };
        let search = SubstitutionSearch::default();
        let mut rng = StdRng::seed_from_u64(9);
        for _ in 0..200 {
            let mut cache = ReplacementCache::new();
            let result = search.anonymize_token(&token(&font, "b"), &ctx, &mut cache, &mut rng);
            let ch = result.glyphs[0].character().unwrap();
            assert!("abc".contains(ch), "drew {:?}", ch);
        }
    }
}

mod exemptions {
    use super::*;

    #[test]
    fn test_punctuation_and_spaces_survive() {
        let font = proportional_font();
        let source = glyphs(&font, "hello, world", 72.0, 100.0);
        let catalog = catalog(&font, LOWER);
        let characters = CharacterWhitelist::default();
        let zones = ZoneWhitelist::default();
        let ctx = SearchContext {
            catalog: &catalog,
            characters: &characters,
            zones: &zones,
        };
        let search = SubstitutionSearch::default();
        let mut cache = ReplacementCache::new();
        let mut rng = StdRng::seed_from_u64(1);

        let tokens = Tokenizer::default().tokenize(source, &characters);
        let texts: Vec<String> = tokens.iter().map(|t| t.text()).collect();
        assert_eq!(texts, vec!["hello,", " ", "world"]);

        let mut out = Vec::new();
        for token in &tokens {
            out.extend(search.anonymize_token(token, &ctx, &mut cache, &mut rng).glyphs);
        }
        let text = text_of(&out);
        assert_eq!(text.len(), "hello, world".len());
        assert_eq!(&text[5..7], ", ");
        assert_eq!(out[5].highlight(), Some(Highlight::CharacterWhitelisted));
        assert_eq!(out[6].highlight(), Some(Highlight::CharacterWhitelisted));
    }

    #[test]
    fn test_whitelisted_glyphs_follow_the_replacement() {
        let font = proportional_font();
        let catalog = catalog(&font, LOWER);
        let characters = CharacterWhitelist::default();
        let zones = ZoneWhitelist::default();
        let ctx = SearchContext {
            catalog: &catalog,
            characters: &characters,
            zones: &zones,
        };
        let search = SubstitutionSearch::default();
        let mut cache = ReplacementCache::new();
        let mut rng = StdRng::seed_from_u64(8);

        let result = search.anonymize_token(&token(&font, "mix."), &ctx, &mut cache, &mut rng);
        let period = &result.glyphs[3];
        assert_eq!(period.character(), Some('.'));
        // The period sits right after the last replacement letter
        assert!(period
            .matrix()
            .equals_within(result.glyphs[2].next_matrix(), 1e-4));
    }

    #[test]
    fn test_zone_covers_token() {
        let font = proportional_font();
        let catalog = catalog(&font, LOWER);
        let characters = CharacterWhitelist::default();
        let zones = ZoneWhitelist::new(vec![Rect::new(0.0, 0.0, 3000.0, 3000.0)]);
        let ctx = SearchContext {
            catalog: &catalog,
            characters: &characters,
            zones: &zones,
        };
        let mut cache = ReplacementCache::new();
        let mut rng = StdRng::seed_from_u64(3);
        let source = token(&font, "account");
        let result = SubstitutionSearch::default().anonymize_token(&source, &ctx, &mut cache, &mut rng);

        assert_eq!(result.outcome, SearchOutcome::KeptOriginal(KeepReason::Whitelisted));
        assert_eq!(text_of(&result.glyphs), "account");
        assert!(result
            .glyphs
            .iter()
            .all(|g| g.highlight() == Some(Highlight::ZoneWhitelisted)));
        for (original, kept) in source.glyphs().iter().zip(&result.glyphs) {
            assert_eq!(original.matrix(), kept.matrix());
        }
    }

    #[test]
    fn test_unmapped_characters_are_flagged() {
        let font = proportional_font();
        let catalog = catalog(&font, "ab\u{e9}");
        let characters = CharacterWhitelist::default();
        let zones = ZoneWhitelist::default();
        let ctx = SearchContext {
            catalog: &catalog,
            characters: &characters,
            zones: &zones,
        };
        let mut cache = ReplacementCache::new();
        let mut rng = StdRng::seed_from_u64(3);
        let result =
            SubstitutionSearch::default().anonymize_token(&token(&font, "\u{e9}"), &ctx, &mut cache, &mut rng);
        assert_eq!(result.glyphs[0].character(), Some('\u{e9}'));
        assert_eq!(result.glyphs[0].highlight(), Some(Highlight::NotSubstitutable));
    }
}

mod classification {
    use super::*;

    #[test]
    fn test_sparse_pool_is_low_coverage() {
        // A page showing only 'z' and 'j' covers a sliver of the lowercase weight
        let font: FontRef = Arc::new(MetricsFont::from_char_advances(
            "Sparse",
            0.5,
            [('z', 0.5), ('j', 0.25)],
        ));
        let catalog = catalog(&font, "zj");
        let pool = catalog.font("Sparse").and_then(|f| f.pool("lower")).unwrap();
        assert!(pool.coverage() < 0.25);

        let characters = CharacterWhitelist::default();
        let zones = ZoneWhitelist::default();
        let ctx = SearchContext {
            catalog: &catalog,
            characters: &characters,
            zones: &zones,
        };
        let search = SubstitutionSearch::default();
        let mut cache = ReplacementCache::new();
        let mut rng = StdRng::seed_from_u64(9);
        let result = search.anonymize_token(&token(&font, "zj"), &ctx, &mut cache, &mut rng);

        assert!(matches!(result.outcome, SearchOutcome::Substituted { .. }));
        let highlights: Vec<_> = result.glyphs.iter().map(Glyph::highlight).collect();
        assert_eq!(
            highlights,
            vec![Some(Highlight::LowCoverage), Some(Highlight::LowCoverage)]
        );
    }

    #[test]
    fn test_self_draw_is_unchanged() {
        let font: FontRef = Arc::new(MetricsFont::monospace("Mono", 0.6));
        let catalog = catalog(&font, LOWER);
        let characters = CharacterWhitelist::default();
        let zones = ZoneWhitelist::default();
        let ctx = SearchContext {
            catalog: &catalog,
            characters: &characters,
            zones: &zones,
        };
        let search = SubstitutionSearch::default();

        let mut kept = 0;
        let mut replaced = 0;
        for seed in 0..200u64 {
            let mut cache = ReplacementCache::new();
            let mut rng = StdRng::seed_from_u64(seed);
            let result = search.anonymize_token(&token(&font, "e"), &ctx, &mut cache, &mut rng);
            let glyph = &result.glyphs[0];
            if glyph.character() == Some('e') {
                assert_eq!(glyph.highlight(), Some(Highlight::Unchanged));
                kept += 1;
            } else {
                assert_eq!(glyph.highlight(), Some(Highlight::Substituted));
                replaced += 1;
            }
        }
        // 'e' carries about an eighth of the lowercase weight
        assert!(kept > 0);
        assert!(replaced > kept);
    }
}
