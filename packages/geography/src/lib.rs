#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! On-disk inputs and outputs of the country aggregation.
//!
//! Reads Natural Earth country boundaries, monthly province climate
//! files, the travel advisory table, the country-name lookup table, and
//! the optional aggregation config; writes one `GeoJSON`
//! `FeatureCollection` per month plus a `metadata.json`. Everything here
//! is a thin collaborator around `climate_map_territory`.

pub mod advisories;
pub mod boundaries;
pub mod names;
pub mod output;
pub mod provinces;

use std::path::{Path, PathBuf};

use climate_map_territory::{AggregationConfig, config::ConfigError};
use climate_map_territory_models::Month;
use geojson::{FeatureCollection, GeoJson};
use thiserror::Error;

pub use advisories::load_advisories;
pub use boundaries::load_countries;
pub use names::{default_name_mapping, load_name_mapping};
pub use output::{GeoJsonSink, write_metadata, write_month};
pub use provinces::{FsProvinceSource, load_provinces};

/// Errors that can occur while reading or writing data files.
#[derive(Debug, Error)]
pub enum GeoError {
    /// Filesystem operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing or serialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// `GeoJSON` structure was invalid.
    #[error("GeoJSON error: {0}")]
    GeoJson(#[from] geojson::Error),

    /// TOML parsing failed.
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// A required input file does not exist.
    #[error("File not found: {}", path.display())]
    NotFound {
        /// The missing file.
        path: PathBuf,
    },

    /// The aggregation config has an unusable value.
    #[error("Invalid config: {0}")]
    Config(#[from] ConfigError),
}

/// Conventional locations of every input and output under a data root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataLayout {
    root: PathBuf,
}

impl Default for DataLayout {
    fn default() -> Self {
        Self::new("data")
    }
}

impl DataLayout {
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Natural Earth country boundaries.
    #[must_use]
    pub fn countries_file(&self) -> PathBuf {
        self.root.join("countries").join("countries.geojson")
    }

    /// Province climate statistics for `month`.
    #[must_use]
    pub fn province_file(&self, month: Month) -> PathBuf {
        self.root
            .join("provinces")
            .join("aggregated")
            .join(format!("provinces_month_{month}.geojson"))
    }

    /// Travel advisory table keyed by country name.
    #[must_use]
    pub fn advisories_file(&self) -> PathBuf {
        self.root.join("travel_advisories.json")
    }

    /// Directory holding the aggregated country files.
    #[must_use]
    pub fn output_dir(&self) -> PathBuf {
        self.root.join("countries").join("aggregated")
    }

    /// Aggregated territories for `month`.
    #[must_use]
    pub fn output_file(&self, month: Month) -> PathBuf {
        self.output_dir()
            .join(format!("countries_month_{month}.geojson"))
    }

    /// Metadata describing the aggregated files.
    #[must_use]
    pub fn metadata_file(&self) -> PathBuf {
        self.output_dir().join("metadata.json")
    }
}

/// Loads and validates an aggregation config from a TOML file.
///
/// Keys left out of the file keep their defaults.
///
/// # Errors
///
/// Returns [`GeoError`] if the file is missing, is not valid TOML, or
/// holds an unusable threshold or tolerance.
pub fn load_config(path: &Path) -> Result<AggregationConfig, GeoError> {
    let text = read_to_string(path)?;
    let config: AggregationConfig = toml::from_str(&text)?;
    config.validate()?;

    log::info!(
        "Loaded config from {} (threshold {} km)",
        path.display(),
        config.distance_threshold_km
    );

    Ok(config)
}

/// Reads a file, mapping a missing file to [`GeoError::NotFound`].
pub(crate) fn read_to_string(path: &Path) -> Result<String, GeoError> {
    match std::fs::read_to_string(path) {
        Ok(text) => Ok(text),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(GeoError::NotFound {
            path: path.to_path_buf(),
        }),
        Err(e) => Err(e.into()),
    }
}

/// Reads a `GeoJSON` file that must hold a `FeatureCollection`.
pub(crate) fn read_feature_collection(path: &Path) -> Result<FeatureCollection, GeoError> {
    let geojson: GeoJson = read_to_string(path)?.parse()?;
    Ok(FeatureCollection::try_from(geojson)?)
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::path::PathBuf;

    /// A fresh directory under the system temp dir, removed on drop.
    pub struct TempDir(pub PathBuf);

    impl TempDir {
        pub fn new(name: &str) -> Self {
            let path = std::env::temp_dir().join(format!(
                "climate_map_geography_{}_{name}",
                std::process::id()
            ));
            let _ = std::fs::remove_dir_all(&path);
            std::fs::create_dir_all(&path).unwrap();
            Self(path)
        }
    }

    impl Drop for TempDir {
        fn drop(&mut self) {
            let _ = std::fs::remove_dir_all(&self.0);
        }
    }
}
