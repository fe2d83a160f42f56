//! Monthly province climate files.
//!
//! Each feature carries `name`, `admin` (the province source's country
//! name), and one property per climate variable. Missing, `null`,
//! non-numeric, non-finite, and physically impossible values all load as
//! `None` so they never reach a weighted mean.

use std::collections::BTreeMap;
use std::path::Path;

use climate_map_spatial::geojson_to_multipolygon;
use climate_map_territory::{PipelineError, ProvinceSource};
use climate_map_territory_models::{ClimateVariable, Month, ProvinceClimateRecord};
use geo::MultiPolygon;
use geojson::Feature;
use strum::IntoEnumIterator as _;

use crate::{DataLayout, GeoError, read_feature_collection};

/// Country name used when a province has no `admin` property.
pub const UNKNOWN_COUNTRY: &str = "Unknown";

/// Loads every province in a monthly file.
///
/// Provinces without a usable geometry are kept with an empty geometry so
/// the aggregation counts them as skipped.
///
/// # Errors
///
/// Returns [`GeoError`] if the file is missing or is not a `GeoJSON`
/// `FeatureCollection`.
pub fn load_provinces(path: &Path) -> Result<Vec<ProvinceClimateRecord>, GeoError> {
    let collection = read_feature_collection(path)?;

    let provinces: Vec<ProvinceClimateRecord> = collection
        .features
        .into_iter()
        .map(province_from_feature)
        .collect();

    log::info!("Loaded {} provinces from {}", provinces.len(), path.display());

    Ok(provinces)
}

fn province_from_feature(feature: Feature) -> ProvinceClimateRecord {
    let text = |key: &str| {
        feature
            .property(key)
            .and_then(serde_json::Value::as_str)
            .map(str::to_string)
    };

    let name = text("name").unwrap_or_default();
    let parent_country_name = text("admin").unwrap_or_else(|| UNKNOWN_COUNTRY.to_string());

    let variables: BTreeMap<ClimateVariable, Option<f64>> = ClimateVariable::iter()
        .map(|variable| {
            let value = numeric(feature.property(variable.property_key()))
                .filter(|&value| in_range(variable, value));
            (variable, value)
        })
        .collect();

    let geometry = feature
        .geometry
        .and_then(geojson_to_multipolygon)
        .unwrap_or_else(|| {
            log::debug!("Province {name} ({parent_country_name}) has no polygon geometry");
            MultiPolygon(vec![])
        });

    ProvinceClimateRecord {
        name,
        parent_country_name,
        geometry,
        variables,
    }
}

/// A finite number, or `None`.
fn numeric(value: Option<&serde_json::Value>) -> Option<f64> {
    value
        .and_then(serde_json::Value::as_f64)
        .filter(|value| value.is_finite())
}

fn in_range(variable: ClimateVariable, value: f64) -> bool {
    let (min, max) = variable.valid_range();
    (min..=max).contains(&value)
}

/// Reads province files from a [`DataLayout`].
pub struct FsProvinceSource {
    layout: DataLayout,
}

impl FsProvinceSource {
    /// Reads months from `layout`'s province directory.
    #[must_use]
    pub const fn new(layout: DataLayout) -> Self {
        Self { layout }
    }
}

impl ProvinceSource for FsProvinceSource {
    fn load_month(&self, month: Month) -> Result<Vec<ProvinceClimateRecord>, PipelineError> {
        let path = self.layout.province_file(month);

        load_provinces(&path).map_err(|e| match e {
            GeoError::NotFound { path } => PipelineError::MissingSourceFile { month, path },
            e => PipelineError::Source {
                month,
                message: e.to_string(),
            },
        })
    }
}
