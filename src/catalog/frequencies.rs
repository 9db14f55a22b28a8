//! Substitution groups and their frequency weights.
//!
//! A substitution group is a set of characters that may replace one another
//! (lowercase letters, uppercase letters, digits). Each character carries a
//! relative weight so that replacements follow natural-language letter
//! frequencies instead of a uniform draw.

use std::path::Path;

use indexmap::IndexMap;

use crate::error::{Error, Result};

/// English lowercase letter weights.
const LOWER: &[(char, f64)] = &[
    ('a', 127.0),
    ('b', 20.0),
    ('c', 66.0),
    ('d', 54.0),
    ('e', 189.0),
    ('f', 23.0),
    ('g', 24.0),
    ('h', 35.0),
    ('i', 106.0),
    ('j', 1.0),
    ('k', 10.0),
    ('l', 71.0),
    ('m', 44.0),
    ('n', 111.0),
    ('o', 126.0),
    ('p', 32.0),
    ('q', 3.0),
    ('r', 106.0),
    ('s', 81.0),
    ('t', 128.0),
    ('u', 61.0),
    ('v', 19.0),
    ('w', 19.0),
    ('x', 9.0),
    ('y', 33.0),
    ('z', 1.0),
];

/// English uppercase letter weights (sentence-initial distribution).
const UPPER: &[(char, f64)] = &[
    ('A', 35.0),
    ('B', 14.0),
    ('C', 23.0),
    ('D', 20.0),
    ('E', 31.0),
    ('F', 8.0),
    ('G', 11.0),
    ('H', 8.0),
    ('I', 26.0),
    ('J', 3.0),
    ('K', 3.0),
    ('L', 18.0),
    ('M', 13.0),
    ('N', 26.0),
    ('O', 23.0),
    ('P', 21.0),
    ('Q', 2.0),
    ('R', 22.0),
    ('S', 29.0),
    ('T', 35.0),
    ('U', 11.0),
    ('V', 6.0),
    ('W', 7.0),
    ('X', 3.0),
    ('Y', 6.0),
    ('Z', 1.0),
];

/// Digit weights (Benford-leaning, zero-heavy).
const DIGIT: &[(char, f64)] = &[
    ('0', 4.0),
    ('1', 2.0),
    ('2', 2.0),
    ('3', 1.0),
    ('4', 1.0),
    ('5', 1.0),
    ('6', 1.0),
    ('7', 1.0),
    ('8', 1.0),
    ('9', 1.0),
];

/// A named set of interchangeable characters with relative weights.
#[derive(Debug, Clone, PartialEq)]
pub struct SubstitutionGroup {
    name: String,
    entries: Vec<(char, f64)>,
    total_weight: f64,
}

impl SubstitutionGroup {
    /// Create a group, rejecting empty groups, duplicate characters and
    /// weights that are not finite and positive.
    pub fn new(name: impl Into<String>, entries: Vec<(char, f64)>) -> Result<Self> {
        let name = name.into();
        if entries.is_empty() {
            return Err(Error::InvalidConfig(format!("substitution group '{}' is empty", name)));
        }
        for (i, (ch, weight)) in entries.iter().enumerate() {
            if !weight.is_finite() || *weight <= 0.0 {
                return Err(Error::InvalidConfig(format!(
                    "substitution group '{}': weight for {:?} must be positive, got {}",
                    name, ch, weight
                )));
            }
            if entries[..i].iter().any(|(other, _)| other == ch) {
                return Err(Error::InvalidConfig(format!(
                    "substitution group '{}': duplicate character {:?}",
                    name, ch
                )));
            }
        }
        let total_weight = entries.iter().map(|(_, w)| w).sum();
        Ok(Self {
            name,
            entries,
            total_weight,
        })
    }

    fn from_static(name: &str, entries: &[(char, f64)]) -> Self {
        let total_weight = entries.iter().map(|(_, w)| w).sum();
        Self {
            name: name.to_string(),
            entries: entries.to_vec(),
            total_weight,
        }
    }

    /// Group name (`lower`, `upper`, `digit`, ...).
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Characters and weights in declaration order.
    pub fn entries(&self) -> &[(char, f64)] {
        &self.entries
    }

    /// Sum of all weights in the group.
    pub fn total_weight(&self) -> f64 {
        self.total_weight
    }

    /// Whether the group contains the codepoint.
    pub fn contains(&self, unicode: u32) -> bool {
        self.entries.iter().any(|(ch, _)| *ch as u32 == unicode)
    }
}

/// Ordered list of substitution groups.
///
/// A character belongs to the first group that lists it.
#[derive(Debug, Clone, PartialEq)]
pub struct SubstitutionTable {
    groups: Vec<SubstitutionGroup>,
}

impl SubstitutionTable {
    /// Create a table from groups in priority order.
    pub fn new(groups: Vec<SubstitutionGroup>) -> Self {
        Self { groups }
    }

    /// English letter and digit frequencies: `lower`, `upper`, `digit`.
    pub fn english() -> Self {
        Self::new(vec![
            SubstitutionGroup::from_static("lower", LOWER),
            SubstitutionGroup::from_static("upper", UPPER),
            SubstitutionGroup::from_static("digit", DIGIT),
        ])
    }

    /// Parse a JSON table: `{"group": {"a": 12.0, ...}, ...}`.
    ///
    /// Group order in the document is preserved.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let raw: IndexMap<String, IndexMap<String, f64>> = serde_json::from_str(json)?;
        let mut groups = Vec::with_capacity(raw.len());
        for (name, chars) in raw {
            let mut entries = Vec::with_capacity(chars.len());
            for (key, weight) in chars {
                let mut it = key.chars();
                let ch = match (it.next(), it.next()) {
                    (Some(ch), None) => ch,
                    _ => {
                        return Err(Error::InvalidConfig(format!(
                            "substitution group '{}': key {:?} is not a single character",
                            name, key
                        )))
                    },
                };
                entries.push((ch, weight));
            }
            groups.push(SubstitutionGroup::new(name, entries)?);
        }
        Ok(Self::new(groups))
    }

    /// Read and parse a JSON table from disk.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path.as_ref())?;
        Self::from_json_str(&json)
    }

    /// All groups in priority order.
    pub fn groups(&self) -> &[SubstitutionGroup] {
        &self.groups
    }

    /// Index of the first group containing `unicode`.
    pub fn group_index(&self, unicode: u32) -> Option<usize> {
        self.groups.iter().position(|g| g.contains(unicode))
    }
}

impl Default for SubstitutionTable {
    fn default() -> Self {
        Self::english()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_english_table() {
        let table = SubstitutionTable::english();
        let names: Vec<_> = table.groups().iter().map(|g| g.name()).collect();
        assert_eq!(names, vec!["lower", "upper", "digit"]);
        assert_eq!(table.groups()[0].entries().len(), 26);
        assert_eq!(table.groups()[0].total_weight(), 1499.0);
        assert_eq!(table.groups()[1].total_weight(), 405.0);
        assert_eq!(table.groups()[2].total_weight(), 15.0);
    }

    #[test]
    fn test_group_index() {
        let table = SubstitutionTable::english();
        assert_eq!(table.group_index('q' as u32), Some(0));
        assert_eq!(table.group_index('Q' as u32), Some(1));
        assert_eq!(table.group_index('7' as u32), Some(2));
        assert_eq!(table.group_index('#' as u32), None);
    }

    #[test]
    fn test_first_group_wins() {
        let table = SubstitutionTable::new(vec![
            SubstitutionGroup::new("vowels", vec![('a', 1.0), ('e', 1.0)]).unwrap(),
            SubstitutionGroup::new("all", vec![('a', 1.0), ('b', 1.0)]).unwrap(),
        ]);
        assert_eq!(table.group_index('a' as u32), Some(0));
        assert_eq!(table.group_index('b' as u32), Some(1));
    }

    #[test]
    fn test_from_json_preserves_order() {
        let table =
            SubstitutionTable::from_json_str(r#"{"zeta": {"z": 1}, "alpha": {"a": 2, "b": 0.5}}"#)
                .unwrap();
        assert_eq!(table.groups()[0].name(), "zeta");
        assert_eq!(table.groups()[1].name(), "alpha");
        assert_eq!(table.groups()[1].total_weight(), 2.5);
    }

    #[test]
    fn test_from_json_rejects_bad_tables() {
        assert!(SubstitutionTable::from_json_str(r#"{"g": {"ab": 1}}"#).is_err());
        assert!(SubstitutionTable::from_json_str(r#"{"g": {"a": 0}}"#).is_err());
        assert!(SubstitutionTable::from_json_str(r#"{"g": {}}"#).is_err());
        assert!(SubstitutionTable::from_json_str(r#"["a"]"#).is_err());
    }

    #[test]
    fn test_duplicate_character_rejected() {
        let err = SubstitutionGroup::new("g", vec![('a', 1.0), ('a', 2.0)]).unwrap_err();
        assert!(format!("{}", err).contains("duplicate"));
    }
}
