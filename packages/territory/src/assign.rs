//! Matches provinces to the territory that owns them.
//!
//! Candidates are the territories of the province's (mapped) country. The
//! largest intersection area wins; ties keep the first candidate in catalog
//! order. Candidates whose intersection cannot be computed (invalid
//! geometry on either side) fall back to centroid containment and then to
//! a distance-based pseudo-area. A country with territories but no match
//! keeps the province on its main territory. A country with no territories
//! at all yields [`Assignment::Synthetic`].

use climate_map_spatial::{EqualAreaProjection, GeometryError};
use climate_map_territory_models::ProvinceClimateRecord;
use geo::{BooleanOps as _, Contains as _, MultiPolygon, Point, Validation as _};

use crate::catalog::TerritoryCatalog;

/// Pseudo-area of a fallback candidate at zero distance.
pub const PSEUDO_AREA_CEILING: f64 = 1_000_000.0;

/// Pseudo-area lost per kilometre of centroid distance.
pub const PSEUDO_AREA_PER_KM: f64 = 1000.0;

/// A province with the measurements matching needs.
#[derive(Debug, Clone, Copy)]
pub struct MeasuredProvince<'a> {
    /// The source record.
    pub record: &'a ProvinceClimateRecord,
    /// Equal-area province area.
    pub area_km2: f64,
    /// Province centroid in longitude/latitude.
    pub centroid: Point<f64>,
    /// Whether the geometry supports boolean operations.
    pub valid: bool,
}

impl<'a> MeasuredProvince<'a> {
    /// Measures `record`'s geometry.
    ///
    /// # Errors
    ///
    /// Returns [`GeometryError`] if the geometry is empty, has a non-finite
    /// coordinate, or has no centroid.
    pub fn measure(
        projection: &EqualAreaProjection,
        record: &'a ProvinceClimateRecord,
    ) -> Result<Self, GeometryError> {
        Ok(Self {
            record,
            area_km2: projection.area_km2(&record.geometry)?,
            centroid: projection.centroid(&record.geometry)?,
            valid: record.geometry.is_valid(),
        })
    }
}

/// Where a province belongs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Assignment {
    /// A catalog slot.
    Territory(usize),
    /// No territory exists for the mapped country; the province founds (or
    /// joins) a territory with this name.
    Synthetic(String),
}

/// Assigns provinces against a [`TerritoryCatalog`].
pub struct ProvinceAssigner<'a> {
    catalog: &'a TerritoryCatalog,
    projection: &'a EqualAreaProjection,
}

impl<'a> ProvinceAssigner<'a> {
    /// Creates an assigner measuring with `projection`.
    #[must_use]
    pub const fn new(catalog: &'a TerritoryCatalog, projection: &'a EqualAreaProjection) -> Self {
        Self {
            catalog,
            projection,
        }
    }

    /// Picks the owning territory for `province`, whose country has already
    /// been mapped to the boundary-source name `country_name`.
    #[must_use]
    pub fn assign(&self, country_name: &str, province: &MeasuredProvince<'_>) -> Assignment {
        let candidates = self.catalog.candidates(country_name);

        let Some(&main) = candidates.first() else {
            return Assignment::Synthetic(country_name.to_string());
        };

        if candidates.len() == 1 {
            return Assignment::Territory(main);
        }

        let geometry = &province.record.geometry;
        let nearby = self.catalog.overlapping(geometry);

        let mut best: Option<(usize, f64)> = None;
        let mut failed = Vec::new();

        for &slot in candidates {
            if !province.valid || !self.catalog.is_valid(slot) {
                failed.push(slot);
                continue;
            }

            if !nearby.contains(&slot) {
                continue;
            }

            match self.intersection_area(geometry, &self.catalog.territory(slot).geometry) {
                Some(area) if area > 0.0 && best.is_none_or(|(_, best_area)| area > best_area) => {
                    best = Some((slot, area));
                }
                Some(_) => {}
                None => failed.push(slot),
            }
        }

        if let Some((slot, _)) = best {
            return Assignment::Territory(slot);
        }

        if let Some(slot) = self.fallback(province, &failed) {
            log::debug!(
                "Province {} matched {} by fallback",
                province.record.name,
                self.catalog.territory(slot).name
            );
            return Assignment::Territory(slot);
        }

        Assignment::Territory(main)
    }

    /// Intersection area in km², or `None` when it cannot be measured.
    fn intersection_area(&self, a: &MultiPolygon<f64>, b: &MultiPolygon<f64>) -> Option<f64> {
        let shared = a.intersection(b);
        if shared.0.is_empty() {
            return Some(0.0);
        }
        self.projection.area_km2(&shared).ok()
    }

    fn fallback(&self, province: &MeasuredProvince<'_>, failed: &[usize]) -> Option<usize> {
        if let Some(&slot) = failed
            .iter()
            .find(|&&slot| self.catalog.territory(slot).geometry.contains(&province.centroid))
        {
            return Some(slot);
        }

        let mut best: Option<(usize, f64)> = None;
        for &slot in failed {
            let distance = self
                .projection
                .distance_km(province.centroid, self.catalog.territory(slot).centroid);
            let score = pseudo_area(distance);
            if score > 0.0 && best.is_none_or(|(_, best_score)| score > best_score) {
                best = Some((slot, score));
            }
        }

        best.map(|(slot, _)| slot)
    }
}

/// Ranking proxy for candidates without a measurable intersection.
#[must_use]
pub fn pseudo_area(distance_km: f64) -> f64 {
    (PSEUDO_AREA_PER_KM.mul_add(-distance_km, PSEUDO_AREA_CEILING)).max(0.0)
}
