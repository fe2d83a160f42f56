#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Province, country, and territory climate types.
//!
//! These types describe the inputs of the territory aggregation engine
//! (country boundaries and per-month province climate records) and its
//! outputs (one [`TerritoryAggregate`] per surviving territory per month).
//! Geometries are WGS84 longitude/latitude [`MultiPolygon`]s; a single
//! polygon is represented as a one-element multi-polygon.

use std::collections::BTreeMap;
use std::fmt;

use chrono::NaiveDate;
use geo::{MultiPolygon, Point};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString};
use thiserror::Error;

/// A climate variable carried by province records and aggregated per
/// territory.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    AsRefStr,
    Display,
    EnumIter,
    EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ClimateVariable {
    /// Mean daily minimum temperature.
    Tmin,
    /// Mean daily maximum temperature.
    Tmax,
    /// Mean daily precipitation.
    Prec,
    /// Mean daily sunshine duration.
    Sunhours,
    /// Average temperature, aggregated as its own variable.
    TempAvg,
}

impl ClimateVariable {
    /// Feature property key used for this variable in both the province
    /// input files and the territory output files.
    #[must_use]
    pub const fn property_key(self) -> &'static str {
        match self {
            Self::Tmin => "tmin_mean",
            Self::Tmax => "tmax_mean",
            Self::Prec => "prec_mean",
            Self::Sunhours => "sunhours_mean",
            Self::TempAvg => "temp_avg",
        }
    }

    /// Human-readable description.
    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            Self::Tmin => "Mean minimum temperature",
            Self::Tmax => "Mean maximum temperature",
            Self::Prec => "Mean precipitation",
            Self::Sunhours => "Mean sunshine hours",
            Self::TempAvg => "Average temperature (mean of tmin and tmax)",
        }
    }

    /// Physical units.
    #[must_use]
    pub const fn units(self) -> &'static str {
        match self {
            Self::Tmin | Self::Tmax | Self::TempAvg => "°C",
            Self::Prec => "mm/day",
            Self::Sunhours => "hours/day",
        }
    }

    /// Physically valid `(min, max)` range. Values outside it are
    /// filtered upstream, before records reach the aggregation engine.
    #[must_use]
    pub const fn valid_range(self) -> (f64, f64) {
        match self {
            Self::Tmin | Self::Tmax | Self::TempAvg => (-90.0, 60.0),
            Self::Prec => (0.0, 1000.0),
            Self::Sunhours => (0.0, 24.0),
        }
    }
}

/// Error returned when a month number is outside `1..=12`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("invalid month {0}: expected a value between 1 and 12")]
pub struct InvalidMonth(pub u8);

/// A calendar month (1 = January ... 12 = December).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Month(u8);

impl Month {
    /// Creates a month from its 1-based number.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidMonth`] if `number` is not in `1..=12`.
    pub const fn new(number: u8) -> Result<Self, InvalidMonth> {
        if number >= 1 && number <= 12 {
            Ok(Self(number))
        } else {
            Err(InvalidMonth(number))
        }
    }

    /// All twelve months in calendar order.
    pub fn all() -> impl Iterator<Item = Self> {
        (1..=12).map(Self)
    }

    /// The 1-based month number.
    #[must_use]
    pub const fn number(self) -> u8 {
        self.0
    }
}

impl TryFrom<u8> for Month {
    type Error = InvalidMonth;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Month> for u8 {
    fn from(month: Month) -> Self {
        month.0
    }
}

impl fmt::Display for Month {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}", self.0)
    }
}

/// A country boundary as loaded from the boundary dataset.
#[derive(Debug, Clone, PartialEq)]
pub struct CountryBoundary {
    /// Boundary-source country name (e.g. "France", "Dem. Rep. Congo").
    pub name: String,
    /// Possibly multi-part country geometry.
    pub geometry: MultiPolygon<f64>,
}

/// Climate statistics for one province in one month.
#[derive(Debug, Clone, PartialEq)]
pub struct ProvinceClimateRecord {
    /// Province name (e.g. "French Polynesia").
    pub name: String,
    /// Raw parent country name as used by the province data source.
    /// Mapped to a boundary-source name before territory lookup.
    pub parent_country_name: String,
    /// Province geometry.
    pub geometry: MultiPolygon<f64>,
    /// Per-variable value; absent or `None` means missing source data.
    pub variables: BTreeMap<ClimateVariable, Option<f64>>,
}

impl ProvinceClimateRecord {
    /// Returns the value for `variable`, or `None` if it is missing.
    #[must_use]
    pub fn value(&self, variable: ClimateVariable) -> Option<f64> {
        self.variables.get(&variable).copied().flatten()
    }
}

/// How a territory came into existence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TerritoryKind {
    /// The country's main landmass plus every part near it.
    Main,
    /// One cluster of parts far from the main landmass.
    Distant,
    /// Built from provinces whose country has no boundary.
    Synthetic,
}

/// A derived spatial unit: a country's main landmass or one cluster of its
/// distant parts.
#[derive(Debug, Clone, PartialEq)]
pub struct Territory {
    /// Display name. Distant territories start as
    /// `"{country} - {placeholder}"` and may be renamed after provinces are
    /// assigned.
    pub name: String,
    /// Boundary-source name of the owning country.
    pub parent_country_name: String,
    /// Territory geometry.
    pub geometry: MultiPolygon<f64>,
    /// Area in square kilometres (equal-area projection).
    pub area_km2: f64,
    /// Centroid in WGS84 longitude/latitude.
    pub centroid: Point<f64>,
    /// Origin of the territory.
    pub kind: TerritoryKind,
}

impl Territory {
    /// Whether this territory is a distant cluster split off a country.
    #[must_use]
    pub fn is_distant(&self) -> bool {
        self.kind == TerritoryKind::Distant
    }
}

/// Default advisory URL used when no advisory matches a territory.
pub const DEFAULT_ADVISORY_URL: &str =
    "https://travel.state.gov/content/travel/en/traveladvisories/traveladvisories.html";

/// A travel-safety advisory record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SafetyRecord {
    /// Advisory level: 1 (normal precautions) to 4 (do not travel).
    pub level: u8,
    /// Short level description (e.g. "Reconsider Travel").
    pub description: String,
    /// One-sentence advisory summary.
    pub summary: String,
    /// Link to the full advisory.
    pub url: String,
    /// Date the advisory was published, if known.
    #[serde(default)]
    pub date: Option<NaiveDate>,
}

impl SafetyRecord {
    /// Returns `true` if the level is one of the four defined levels.
    #[must_use]
    pub const fn has_valid_level(&self) -> bool {
        matches!(self.level, 1..=4)
    }
}

impl Default for SafetyRecord {
    fn default() -> Self {
        Self {
            level: 1,
            description: "Exercise Normal Precautions".to_string(),
            summary: "Exercise normal precautions when traveling to this country.".to_string(),
            url: DEFAULT_ADVISORY_URL.to_string(),
            date: None,
        }
    }
}

/// Aggregated climate statistics for one territory in one month.
#[derive(Debug, Clone, PartialEq)]
pub struct TerritoryAggregate {
    /// The territory, after any renaming.
    pub territory: Territory,
    /// Area-weighted mean per variable; `None` when no province contributed.
    pub variable_means: BTreeMap<ClimateVariable, Option<f64>>,
    /// Composite 0-1 desirability score.
    pub overall_score: Option<f64>,
    /// Number of provinces assigned to this territory.
    pub province_count: u64,
    /// Merged advisory record.
    pub safety: Option<SafetyRecord>,
}

impl TerritoryAggregate {
    /// Returns the weighted mean of `variable`.
    #[must_use]
    pub fn mean(&self, variable: ClimateVariable) -> Option<f64> {
        self.variable_means.get(&variable).copied().flatten()
    }
}

/// Counters describing one month's aggregation run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthStats {
    /// Province records received for the month.
    pub provinces_loaded: u64,
    /// Provinces skipped because their geometry was unusable.
    pub provinces_skipped: u64,
    /// Territories built before filtering.
    pub territories_total: u64,
    /// Territories dropped for having no assigned provinces.
    pub territories_dropped: u64,
    /// Territories synthesized for provinces whose country had no boundary.
    pub territories_synthesized: u64,
    /// Emitted territories whose advisory came from the advisory table.
    pub advisories_matched: u64,
}

/// The output record set for one month.
#[derive(Debug, Clone, PartialEq)]
pub struct MonthOutput {
    /// The month these aggregates describe.
    pub month: Month,
    /// One aggregate per emitted territory, main territories first in
    /// country order.
    pub territories: Vec<TerritoryAggregate>,
    /// Run counters.
    pub stats: MonthStats,
}
