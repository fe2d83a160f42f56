//! Tunable policy for splitting and scoring.
//!
//! Both structs deserialize with `#[serde(default)]`, so a configuration
//! file only needs the keys it overrides.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Distance above which a country part becomes a separate territory.
pub const DEFAULT_DISTANCE_THRESHOLD_KM: f64 = 1500.0;

/// Invalid configuration values.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    /// The split threshold must be a positive, finite distance.
    #[error("distance threshold must be positive and finite, got {0} km")]
    InvalidThreshold(f64),

    /// A scoring tolerance must be positive and finite.
    #[error("scoring tolerance `{name}` must be positive and finite, got {value}")]
    InvalidTolerance {
        /// Name of the offending field.
        name: &'static str,
        /// The rejected value.
        value: f64,
    },
}

/// Settings for one aggregation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AggregationConfig {
    /// Centroid distance (km) within which parts join the main territory
    /// or a distant cluster.
    pub distance_threshold_km: f64,
    /// Composite score targets.
    pub scoring: ScoringConfig,
}

impl Default for AggregationConfig {
    fn default() -> Self {
        Self {
            distance_threshold_km: DEFAULT_DISTANCE_THRESHOLD_KM,
            scoring: ScoringConfig::default(),
        }
    }
}

impl AggregationConfig {
    /// Checks that every distance and tolerance is usable.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] naming the first invalid value.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.distance_threshold_km.is_finite() && self.distance_threshold_km > 0.0) {
            return Err(ConfigError::InvalidThreshold(self.distance_threshold_km));
        }
        self.scoring.validate()
    }
}

/// Targets and tolerances of the `overall_score` composite.
///
/// Each component scores `max(0, 1 - |value - target| / tolerance)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    /// Ideal average temperature (°C).
    pub temp_target_c: f64,
    /// Temperature deviation that scores zero.
    pub temp_tolerance_c: f64,
    /// Ideal precipitation (mm/day).
    pub rain_target_mm: f64,
    /// Precipitation deviation that scores zero.
    pub rain_tolerance_mm: f64,
    /// Ideal sunshine (hours/day).
    pub sun_target_hours: f64,
    /// Sunshine deviation that scores zero.
    pub sun_tolerance_hours: f64,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            temp_target_c: 22.5,
            temp_tolerance_c: 30.0,
            rain_target_mm: 2.0,
            rain_tolerance_mm: 20.0,
            sun_target_hours: 8.0,
            sun_tolerance_hours: 12.0,
        }
    }
}

impl ScoringConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        for (name, value) in [
            ("temp_tolerance_c", self.temp_tolerance_c),
            ("rain_tolerance_mm", self.rain_tolerance_mm),
            ("sun_tolerance_hours", self.sun_tolerance_hours),
        ] {
            if !(value.is_finite() && value > 0.0) {
                return Err(ConfigError::InvalidTolerance { name, value });
            }
        }
        Ok(())
    }
}
