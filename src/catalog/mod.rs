//! Per-font character catalog.
//!
//! The catalog answers two questions during anonymization:
//!
//! 1. Which characters can a font render on this page? Only glyphs that
//!    were actually drawn are usable, since a subset font carries nothing
//!    else.
//! 2. What should a character be replaced with? A frequency-weighted draw
//!    from the font's substitution pool for the character's group.
//!
//! The catalog is built once per page from an analysis pass over every
//! glyph the page shows, and is read-only afterwards.

mod frequencies;

pub use frequencies::{SubstitutionGroup, SubstitutionTable};

use std::collections::HashMap;

use indexmap::IndexMap;
use rand::distributions::{Distribution, WeightedIndex};
use rand::Rng;

use crate::device::GlyphShow;
use crate::utils::safe_float_cmp;

/// Unicode to glyph index mapping observed for one font.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GlyphInventory {
    glyphs: HashMap<u32, u32>,
}

impl GlyphInventory {
    /// Glyph index drawn for `unicode`, if the page ever showed it.
    pub fn glyph(&self, unicode: u32) -> Option<u32> {
        self.glyphs.get(&unicode).copied()
    }

    /// Whether `unicode` was observed.
    pub fn contains(&self, unicode: u32) -> bool {
        self.glyphs.contains_key(&unicode)
    }

    /// Number of distinct codepoints observed.
    pub fn len(&self) -> usize {
        self.glyphs.len()
    }

    /// Whether nothing was observed.
    pub fn is_empty(&self) -> bool {
        self.glyphs.is_empty()
    }
}

/// The part of a substitution group one font can actually render.
#[derive(Debug, Clone)]
pub struct FontSubstitutionPool {
    group: String,
    entries: Vec<(char, f64)>,
    distribution: Option<WeightedIndex<f64>>,
    coverage: f32,
}

impl FontSubstitutionPool {
    fn new(group: &SubstitutionGroup, inventory: &GlyphInventory) -> Self {
        let entries: Vec<(char, f64)> = group
            .entries()
            .iter()
            .filter(|(ch, _)| inventory.contains(*ch as u32))
            .copied()
            .collect();
        let present: f64 = entries.iter().map(|(_, w)| w).sum();
        let coverage = (present / group.total_weight()) as f32;
        let distribution = WeightedIndex::new(entries.iter().map(|(_, w)| *w)).ok();
        Self {
            group: group.name().to_string(),
            entries,
            distribution,
            coverage,
        }
    }

    /// Name of the substitution group this pool belongs to.
    pub fn group(&self) -> &str {
        &self.group
    }

    /// Renderable characters with their original weights.
    pub fn entries(&self) -> &[(char, f64)] {
        &self.entries
    }

    /// Share of the group's weight the font can render, in [0, 1].
    ///
    /// Low coverage means few alternatives exist, so replacements are
    /// more likely to look suspicious.
    pub fn coverage(&self) -> f32 {
        self.coverage
    }

    /// Whether the font renders no character of the group.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn draw<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<char> {
        let distribution = self.distribution.as_ref()?;
        Some(self.entries[distribution.sample(rng)].0)
    }
}

/// Inventory and substitution pools for one font.
#[derive(Debug, Clone)]
pub struct FontCatalog {
    inventory: GlyphInventory,
    pools: Vec<FontSubstitutionPool>,
}

impl FontCatalog {
    /// Observed unicode to glyph mapping.
    pub fn inventory(&self) -> &GlyphInventory {
        &self.inventory
    }

    /// One pool per substitution group, in table order.
    pub fn pools(&self) -> &[FontSubstitutionPool] {
        &self.pools
    }

    /// Pool for a named group.
    pub fn pool(&self, group: &str) -> Option<&FontSubstitutionPool> {
        self.pools.iter().find(|p| p.group == group)
    }
}

/// A proposed replacement for one character.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Substitute {
    /// Replacement codepoint
    pub unicode: u32,
    /// Glyph index of the replacement in the same font
    pub glyph: u32,
    /// Coverage of the pool the replacement came from; `None` when the
    /// character is not substitutable and was returned unchanged
    pub coverage: Option<f32>,
}

impl Substitute {
    /// Whether the character belongs to a usable substitution pool.
    pub fn is_substitutable(&self) -> bool {
        self.coverage.is_some()
    }
}

/// Incremental catalog construction from observed glyph shows.
#[derive(Debug, Clone)]
pub struct CatalogBuilder {
    table: SubstitutionTable,
    inventories: IndexMap<String, GlyphInventory>,
}

impl CatalogBuilder {
    /// Start an empty catalog for the given substitution table.
    pub fn new(table: SubstitutionTable) -> Self {
        Self {
            table,
            inventories: IndexMap::new(),
        }
    }

    /// Record that `font` drew `unicode` with `glyph`.
    pub fn observe(&mut self, font: &str, unicode: u32, glyph: u32) {
        if !self.inventories.contains_key(font) {
            self.inventories
                .insert(font.to_string(), GlyphInventory::default());
        }
        if let Some(inventory) = self.inventories.get_mut(font) {
            inventory.glyphs.insert(unicode, glyph);
        }
    }

    /// Record a glyph show event.
    pub fn observe_show(&mut self, show: &GlyphShow) {
        self.observe(show.font.name(), show.unicode, show.glyph);
    }

    /// Compute substitution pools and coverage for every observed font.
    pub fn build(self) -> CharacterCatalog {
        let table = self.table;
        let fonts = self
            .inventories
            .into_iter()
            .map(|(name, inventory)| {
                let pools = table
                    .groups()
                    .iter()
                    .map(|group| FontSubstitutionPool::new(group, &inventory))
                    .collect();
                (name, FontCatalog { inventory, pools })
            })
            .collect();
        CharacterCatalog { table, fonts }
    }
}

/// Per-font inventories and substitution pools for one page.
#[derive(Debug, Clone)]
pub struct CharacterCatalog {
    table: SubstitutionTable,
    fonts: IndexMap<String, FontCatalog>,
}

impl CharacterCatalog {
    /// Start incremental construction.
    pub fn builder(table: SubstitutionTable) -> CatalogBuilder {
        CatalogBuilder::new(table)
    }

    /// Build a catalog from every glyph show observed on a page.
    pub fn build<'a, I>(shows: I, table: SubstitutionTable) -> Self
    where
        I: IntoIterator<Item = &'a GlyphShow>,
    {
        let mut builder = CatalogBuilder::new(table);
        for show in shows {
            builder.observe_show(show);
        }
        builder.build()
    }

    /// The substitution table the pools were derived from.
    pub fn table(&self) -> &SubstitutionTable {
        &self.table
    }

    /// Names of every observed font, in first-seen order.
    pub fn font_names(&self) -> impl Iterator<Item = &str> {
        self.fonts.keys().map(String::as_str)
    }

    /// Catalog entry for one font.
    pub fn font(&self, name: &str) -> Option<&FontCatalog> {
        self.fonts.get(name)
    }

    /// Propose a replacement for `unicode` drawn in `font`.
    ///
    /// The character's group is the first group of the table listing it.
    /// The replacement is drawn from the font's pool for that group with
    /// probability proportional to its weight. Characters outside every
    /// group, or whose pool is empty, come back unchanged with no coverage.
    pub fn propose_substitute<R: Rng + ?Sized>(
        &self,
        font: &str,
        unicode: u32,
        glyph: u32,
        rng: &mut R,
    ) -> Substitute {
        let unchanged = Substitute {
            unicode,
            glyph,
            coverage: None,
        };

        let Some(group) = self.table.group_index(unicode) else {
            return unchanged;
        };
        let Some(catalog) = self.fonts.get(font) else {
            return unchanged;
        };
        let pool = &catalog.pools[group];
        let Some(ch) = pool.draw(rng) else {
            return unchanged;
        };

        match catalog.inventory.glyph(ch as u32) {
            Some(replacement) => Substitute {
                unicode: ch as u32,
                glyph: replacement,
                coverage: Some(pool.coverage),
            },
            None => unchanged,
        }
    }

    /// Non-empty pools across all fonts, lowest coverage first.
    pub fn weakest_pools(&self) -> Vec<(&str, &FontSubstitutionPool)> {
        let mut pools: Vec<_> = self
            .fonts
            .iter()
            .flat_map(|(name, font)| {
                font.pools
                    .iter()
                    .filter(|p| !p.is_empty())
                    .map(move |p| (name.as_str(), p))
            })
            .collect();
        pools.sort_by(|a, b| safe_float_cmp(a.1.coverage, b.1.coverage));
        pools
    }
}
