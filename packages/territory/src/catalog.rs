//! Split territories for every country, computed once per run.
//!
//! Splitting depends only on geometry and the threshold, so the catalog is
//! built before the monthly passes and shared read-only between them.

use std::collections::BTreeMap;

use climate_map_spatial::{EnvelopeIndex, EqualAreaProjection};
use climate_map_territory_models::{CountryBoundary, Territory};
use geo::{MultiPolygon, Validation as _};

use crate::split::split_country;

/// All territories of all countries plus lookup structures.
pub struct TerritoryCatalog {
    territories: Vec<Territory>,
    /// Whether each territory geometry is valid for boolean operations.
    valid: Vec<bool>,
    by_country: BTreeMap<String, Vec<usize>>,
    index: EnvelopeIndex,
    countries_skipped: usize,
}

impl TerritoryCatalog {
    /// Splits every country. Countries whose geometry cannot be measured are
    /// skipped with a warning.
    #[must_use]
    pub fn build(
        projection: &EqualAreaProjection,
        countries: &[CountryBoundary],
        threshold_km: f64,
    ) -> Self {
        let mut territories = Vec::new();
        let mut countries_skipped = 0;

        for country in countries {
            match split_country(projection, &country.name, &country.geometry, threshold_km) {
                Ok(split) => territories.extend(split),
                Err(e) => {
                    log::warn!("Skipping country {}: {e}", country.name);
                    countries_skipped += 1;
                }
            }
        }

        log::info!(
            "Split {} countries into {} territories ({threshold_km} km threshold)",
            countries.len() - countries_skipped,
            territories.len()
        );

        Self::from_territories(territories, countries_skipped)
    }

    pub(crate) fn from_territories(territories: Vec<Territory>, countries_skipped: usize) -> Self {
        let mut by_country: BTreeMap<String, Vec<usize>> = BTreeMap::new();
        for (slot, territory) in territories.iter().enumerate() {
            by_country
                .entry(territory.parent_country_name.clone())
                .or_default()
                .push(slot);
        }

        let valid = territories
            .iter()
            .map(|territory| {
                let valid = territory.geometry.is_valid();
                if !valid {
                    log::debug!(
                        "Territory {} has invalid geometry; province matching will use fallbacks",
                        territory.name
                    );
                }
                valid
            })
            .collect();

        let index = EnvelopeIndex::build(territories.iter().map(|t| &t.geometry));

        Self {
            territories,
            valid,
            by_country,
            index,
            countries_skipped,
        }
    }

    /// All territories in country order, each country's main territory
    /// first.
    #[must_use]
    pub fn territories(&self) -> &[Territory] {
        &self.territories
    }

    /// The territory at `slot`.
    #[must_use]
    pub fn territory(&self, slot: usize) -> &Territory {
        &self.territories[slot]
    }

    /// Number of territories.
    #[must_use]
    pub fn len(&self) -> usize {
        self.territories.len()
    }

    /// Whether no territory was built.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.territories.is_empty()
    }

    /// Countries dropped because their geometry could not be split.
    #[must_use]
    pub const fn countries_skipped(&self) -> usize {
        self.countries_skipped
    }

    /// Slots of the territories of `country_name`, main territory first.
    #[must_use]
    pub fn candidates(&self, country_name: &str) -> &[usize] {
        self.by_country
            .get(country_name)
            .map_or(&[], Vec::as_slice)
    }

    /// Whether the geometry at `slot` supports intersection.
    #[must_use]
    pub fn is_valid(&self, slot: usize) -> bool {
        self.valid[slot]
    }

    /// Slots whose bounding box overlaps `geometry`'s.
    #[must_use]
    pub fn overlapping(&self, geometry: &MultiPolygon<f64>) -> std::collections::BTreeSet<usize> {
        self.index.overlapping(geometry)
    }
}
