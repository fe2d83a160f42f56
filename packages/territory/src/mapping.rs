//! Province-source to boundary-source country name lookup.
//!
//! Province datasets use formal names ("Czech Republic", "Republic of
//! Serbia") while boundary datasets use short ones ("Czechia", "Serbia").
//! Names without an entry pass through unchanged.

use std::collections::BTreeMap;

/// Many-to-one mapping from province-source country names to
/// boundary-source country names.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CountryNameMapping {
    names: BTreeMap<String, String>,
}

impl CountryNameMapping {
    /// Creates a mapping from `(province_name, boundary_name)` pairs.
    #[must_use]
    pub const fn new(names: BTreeMap<String, String>) -> Self {
        Self { names }
    }

    /// Resolves a province-source country name.
    #[must_use]
    pub fn map<'a>(&'a self, name: &'a str) -> &'a str {
        self.names.get(name).map_or(name, String::as_str)
    }

    /// Adds or replaces entries. Later entries win.
    pub fn extend(&mut self, entries: impl IntoIterator<Item = (String, String)>) {
        self.names.extend(entries);
    }

    /// Number of explicit entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Whether the mapping has no explicit entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Iterates entries in province-name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.names.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl FromIterator<(String, String)> for CountryNameMapping {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}
