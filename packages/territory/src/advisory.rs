//! Merges travel-safety advisories onto territory aggregates.
//!
//! Lookup order: exact territory name, then the country part of a split
//! territory name (`"France - Pacific 17°S"` → `"France"`), then the
//! level-1 default. A miss is never an error.

use std::collections::BTreeMap;

use climate_map_territory_models::{SafetyRecord, TerritoryAggregate};

use crate::naming::parent_name;

/// Travel advisories keyed by boundary-source country name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AdvisoryTable {
    records: BTreeMap<String, SafetyRecord>,
}

/// How a territory's advisory was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdvisoryMatch<'a> {
    /// The territory name itself is in the table.
    Exact(&'a SafetyRecord),
    /// The territory is split off a country that is in the table.
    Parent(&'a SafetyRecord),
    /// Nothing matched.
    Default,
}

impl AdvisoryMatch<'_> {
    /// Whether the record came from the table.
    #[must_use]
    pub const fn is_matched(&self) -> bool {
        !matches!(self, Self::Default)
    }

    /// The record to attach.
    #[must_use]
    pub fn record(&self) -> SafetyRecord {
        match self {
            Self::Exact(record) | Self::Parent(record) => (*record).clone(),
            Self::Default => SafetyRecord::default(),
        }
    }
}

impl AdvisoryTable {
    /// Creates a table from name-keyed records.
    #[must_use]
    pub const fn new(records: BTreeMap<String, SafetyRecord>) -> Self {
        Self { records }
    }

    /// Number of advisories.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the table is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Finds the advisory for `territory_name`.
    #[must_use]
    pub fn resolve(&self, territory_name: &str) -> AdvisoryMatch<'_> {
        if let Some(record) = self.records.get(territory_name) {
            return AdvisoryMatch::Exact(record);
        }

        parent_name(territory_name)
            .and_then(|parent| self.records.get(parent))
            .map_or(AdvisoryMatch::Default, AdvisoryMatch::Parent)
    }
}

impl FromIterator<(String, SafetyRecord)> for AdvisoryTable {
    fn from_iter<I: IntoIterator<Item = (String, SafetyRecord)>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

/// Sets `safety` on every aggregate and returns how many matched the table.
///
/// Without a table every aggregate gets the default record.
pub fn merge_advisories(aggregates: &mut [TerritoryAggregate], table: Option<&AdvisoryTable>) -> u64 {
    let mut matched = 0;

    for aggregate in aggregates.iter_mut() {
        let found = table.map_or(AdvisoryMatch::Default, |table| {
            table.resolve(&aggregate.territory.name)
        });

        if found.is_matched() {
            matched += 1;
        }
        aggregate.safety = Some(found.record());
    }

    log::info!(
        "Matched travel advisories for {matched}/{} territories",
        aggregates.len()
    );

    matched
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use chrono::NaiveDate;
    use climate_map_territory_models::{Territory, TerritoryKind};
    use geo::{MultiPolygon, Point};

    use super::*;

    fn advisory(level: u8) -> SafetyRecord {
        SafetyRecord {
            level,
            description: format!("Level {level}"),
            summary: "summary".to_string(),
            url: "https://example.com".to_string(),
            date: NaiveDate::from_ymd_opt(2025, 1, 15),
        }
    }

    fn table() -> AdvisoryTable {
        [("France".to_string(), advisory(2)), ("Mali".to_string(), advisory(4))]
            .into_iter()
            .collect()
    }

    fn aggregate(name: &str) -> TerritoryAggregate {
        TerritoryAggregate {
            territory: Territory {
                name: name.to_string(),
                parent_country_name: name.to_string(),
                geometry: MultiPolygon(vec![]),
                area_km2: 1.0,
                centroid: Point::new(0.0, 0.0),
                kind: TerritoryKind::Main,
            },
            variable_means: BTreeMap::new(),
            overall_score: None,
            province_count: 1,
            safety: None,
        }
    }

    #[test]
    fn exact_match() {
        assert_eq!(table().resolve("Mali"), AdvisoryMatch::Exact(&advisory(4)));
    }

    #[test]
    fn split_territory_uses_parent() {
        assert_eq!(
            table().resolve("France - Pacific 17°S"),
            AdvisoryMatch::Parent(&advisory(2))
        );
    }

    #[test]
    fn unmatched_defaults_to_level_one() {
        let table = table();
        let found = table.resolve("Atlantis - Pacific 3°N");
        assert_eq!(found, AdvisoryMatch::Default);
        assert!(!found.is_matched());
        assert_eq!(found.record(), SafetyRecord::default());
    }

    #[test]
    fn merge_sets_every_record() {
        let mut aggregates = vec![aggregate("France"), aggregate("Tahiti"), aggregate("Mali")];
        let matched = merge_advisories(&mut aggregates, Some(&table()));

        assert_eq!(matched, 2);
        let levels: Vec<u8> = aggregates
            .iter()
            .map(|a| a.safety.as_ref().map_or(0, |s| s.level))
            .collect();
        assert_eq!(levels, vec![2, 1, 4]);
    }

    #[test]
    fn merge_without_table_defaults_all() {
        let mut aggregates = vec![aggregate("France")];
        assert_eq!(merge_advisories(&mut aggregates, None), 0);
        assert_eq!(aggregates[0].safety, Some(SafetyRecord::default()));
    }
}
