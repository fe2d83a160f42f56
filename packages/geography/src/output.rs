//! Aggregated `GeoJSON` and metadata writers.
//!
//! Each month becomes one `FeatureCollection` with a flat property bag
//! per territory. Files are written to a temporary sibling and renamed into
//! place, so a failed write never leaves a truncated month behind.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use climate_map_territory::{AggregateSink, AggregationConfig, PipelineError, ScoringConfig};
use climate_map_territory_models::{
    ClimateVariable, Month, MonthOutput, SafetyRecord, TerritoryAggregate,
};
use geojson::{Feature, FeatureCollection, Geometry, JsonObject, Value};
use serde::Serialize;
use serde_json::json;
use strum::IntoEnumIterator as _;

use crate::{DataLayout, GeoError};

/// Builds the feature for one territory.
#[must_use]
pub fn territory_feature(aggregate: &TerritoryAggregate) -> Feature {
    let territory = &aggregate.territory;
    let mut properties = JsonObject::new();

    properties.insert("name".to_string(), json!(territory.name));
    properties.insert(
        "original_name".to_string(),
        json!(territory.parent_country_name),
    );
    properties.insert("area_km2".to_string(), json!(territory.area_km2));

    for variable in ClimateVariable::iter() {
        properties.insert(
            variable.property_key().to_string(),
            json!(aggregate.mean(variable)),
        );
    }

    properties.insert("overall_score".to_string(), json!(aggregate.overall_score));
    properties.insert("province_count".to_string(), json!(aggregate.province_count));

    let safety = aggregate.safety.clone().unwrap_or_default();
    insert_safety(&mut properties, &safety);

    Feature {
        bbox: None,
        geometry: Some(Geometry::new(Value::from(&territory.geometry))),
        id: None,
        properties: Some(properties),
        foreign_members: None,
    }
}

fn insert_safety(properties: &mut JsonObject, safety: &SafetyRecord) {
    properties.insert("safety_level".to_string(), json!(safety.level));
    properties.insert("safety_description".to_string(), json!(safety.description));
    properties.insert("safety_summary".to_string(), json!(safety.summary));
    properties.insert("safety_url".to_string(), json!(safety.url));
    properties.insert(
        "safety_date".to_string(),
        json!(safety.date.map(|date| date.format("%Y-%m-%d").to_string())),
    );
}

/// Builds the collection for one month.
#[must_use]
pub fn month_feature_collection(output: &MonthOutput) -> FeatureCollection {
    FeatureCollection {
        bbox: None,
        features: output.territories.iter().map(territory_feature).collect(),
        foreign_members: None,
    }
}

/// Writes `bytes` to a temporary sibling of `path` and renames it into
/// place.
fn write_atomically(path: &Path, bytes: &[u8]) -> Result<(), GeoError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let mut tmp_name = path.file_name().unwrap_or_default().to_os_string();
    tmp_name.push(".tmp");
    let tmp = path.with_file_name(tmp_name);

    if let Err(e) = std::fs::write(&tmp, bytes).and_then(|()| std::fs::rename(&tmp, path)) {
        let _ = std::fs::remove_file(&tmp);
        return Err(e.into());
    }

    Ok(())
}

/// Writes one month's `FeatureCollection` to `path`.
///
/// # Errors
///
/// Returns [`GeoError`] if serialization or the filesystem fails.
pub fn write_month(path: &Path, output: &MonthOutput) -> Result<(), GeoError> {
    let collection = month_feature_collection(output);
    let bytes = serde_json::to_vec(&collection)?;
    write_atomically(path, &bytes)?;

    log::info!(
        "Saved {} territories for month {} to {}",
        output.territories.len(),
        output.month,
        path.display()
    );

    Ok(())
}

#[derive(Debug, Serialize)]
struct FieldMetadata {
    description: String,
    units: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    source: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    license: Option<&'static str>,
}

impl FieldMetadata {
    fn new(description: impl Into<String>, units: &'static str) -> Self {
        Self {
            description: description.into(),
            units,
            source: None,
            license: None,
        }
    }
}

#[derive(Debug, Serialize)]
struct Metadata<'a> {
    description: &'static str,
    source: &'static str,
    distance_threshold_km: f64,
    note: String,
    scoring: &'a ScoringConfig,
    variables: BTreeMap<&'static str, FieldMetadata>,
    months: Vec<u8>,
    format: &'static str,
    created: String,
}

fn field_metadata() -> BTreeMap<&'static str, FieldMetadata> {
    let mut fields: BTreeMap<&'static str, FieldMetadata> = ClimateVariable::iter()
        .map(|variable| {
            (
                variable.property_key(),
                FieldMetadata::new(variable.description(), variable.units()),
            )
        })
        .collect();

    fields.insert(
        "overall_score",
        FieldMetadata::new("Overall climate score (0-1, higher is better)", "dimensionless"),
    );
    fields.insert(
        "safety_level",
        FieldMetadata {
            source: Some("U.S. Department of State Travel Advisories"),
            license: Some("Public Domain (U.S. Government data)"),
            ..FieldMetadata::new(
                "U.S. State Dept travel advisory level (1=Normal, 2=Caution, 3=Reconsider, 4=Do Not Travel)",
                "level",
            )
        },
    );
    fields.insert(
        "safety_description",
        FieldMetadata::new("Travel advisory level description", "text"),
    );
    fields.insert(
        "safety_summary",
        FieldMetadata::new("Brief summary of travel advisory", "text"),
    );
    fields.insert(
        "safety_url",
        FieldMetadata::new("URL to detailed travel advisory", "url"),
    );
    fields.insert(
        "safety_date",
        FieldMetadata::new("Date of travel advisory data", "YYYY-MM-DD"),
    );

    fields
}

/// Writes `metadata.json` describing the aggregated files.
///
/// # Errors
///
/// Returns [`GeoError`] if serialization or the filesystem fails.
pub fn write_metadata(
    path: &Path,
    config: &AggregationConfig,
    months: &[Month],
) -> Result<(), GeoError> {
    let metadata = Metadata {
        description: "Country-level aggregated climate data with distant territories split",
        source: "Aggregated from province-level data",
        distance_threshold_km: config.distance_threshold_km,
        note: format!(
            "Countries with territories more than {} km from the main landmass are split into separate entries",
            config.distance_threshold_km
        ),
        scoring: &config.scoring,
        variables: field_metadata(),
        months: months.iter().map(|month| month.number()).collect(),
        format: "GeoJSON",
        created: chrono::Utc::now().to_rfc3339(),
    };

    let bytes = serde_json::to_vec_pretty(&metadata)?;
    write_atomically(path, &bytes)?;

    log::info!("Created metadata file: {}", path.display());

    Ok(())
}

/// Writes each month under a [`DataLayout`]'s output directory.
pub struct GeoJsonSink {
    layout: DataLayout,
}

impl GeoJsonSink {
    /// Writes months into `layout`'s output directory.
    #[must_use]
    pub const fn new(layout: DataLayout) -> Self {
        Self { layout }
    }

    /// Where `month` is written.
    #[must_use]
    pub fn path(&self, month: Month) -> PathBuf {
        self.layout.output_file(month)
    }
}

impl AggregateSink for GeoJsonSink {
    fn write_month(&self, output: &MonthOutput) -> Result<(), PipelineError> {
        write_month(&self.path(output.month), output).map_err(|e| PipelineError::Sink {
            month: output.month,
            message: e.to_string(),
        })
    }
}
