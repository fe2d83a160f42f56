//! Area-weighted accumulation of province climate values.
//!
//! Every (territory, variable) pair keeps a [`WeightedSeries`] of the
//! values that were present together with the contributing province areas.
//! A province with a missing value for a variable contributes to neither the
//! numerator nor the denominator of that variable's mean.

use std::collections::BTreeMap;

use climate_map_territory_models::{ClimateVariable, ProvinceClimateRecord};
use strum::IntoEnumIterator as _;

use crate::config::ScoringConfig;

/// Parallel lists of values and the areas weighting them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WeightedSeries {
    values: Vec<f64>,
    areas: Vec<f64>,
}

impl WeightedSeries {
    /// Records `value` weighted by `area_km2`.
    ///
    /// Returns `false` (and records nothing) for a non-finite value or a
    /// non-positive area.
    pub fn push(&mut self, value: f64, area_km2: f64) -> bool {
        if !value.is_finite() || !(area_km2.is_finite() && area_km2 > 0.0) {
            return false;
        }
        self.values.push(value);
        self.areas.push(area_km2);
        true
    }

    /// Whether nothing has been recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Sum of the recorded areas (the mean's denominator).
    #[must_use]
    pub fn total_area(&self) -> f64 {
        self.areas.iter().sum()
    }

    /// `Σ(value·area) / Σ(area)`, or `None` when empty.
    #[must_use]
    pub fn weighted_mean(&self) -> Option<f64> {
        if self.is_empty() {
            return None;
        }

        let weighted: f64 = self
            .values
            .iter()
            .zip(&self.areas)
            .map(|(value, area)| value * area)
            .sum();

        Some(weighted / self.total_area())
    }
}

/// Running state for one territory during one month.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TerritoryAccumulator {
    series: BTreeMap<ClimateVariable, WeightedSeries>,
    province_count: u64,
    provinces: Vec<(String, f64)>,
}

impl TerritoryAccumulator {
    /// Adds one province's values weighted by its area.
    pub fn add_province(&mut self, record: &ProvinceClimateRecord, area_km2: f64) {
        for variable in ClimateVariable::iter() {
            if let Some(value) = record.value(variable) {
                self.series
                    .entry(variable)
                    .or_default()
                    .push(value, area_km2);
            }
        }

        self.province_count += 1;

        if !record.name.is_empty() {
            self.provinces.push((record.name.clone(), area_km2));
        }
    }

    /// Number of provinces assigned so far.
    #[must_use]
    pub const fn province_count(&self) -> u64 {
        self.province_count
    }

    /// `(name, area_km2)` of every named province, in assignment order.
    #[must_use]
    pub fn provinces(&self) -> &[(String, f64)] {
        &self.provinces
    }

    #[cfg(test)]
    fn series(&self, variable: ClimateVariable) -> Option<&WeightedSeries> {
        self.series.get(&variable).filter(|series| !series.is_empty())
    }

    /// Weighted mean of every variable; `None` where nothing contributed.
    #[must_use]
    pub fn means(&self) -> BTreeMap<ClimateVariable, Option<f64>> {
        ClimateVariable::iter()
            .map(|variable| {
                let mean = self
                    .series
                    .get(&variable)
                    .and_then(WeightedSeries::weighted_mean);
                (variable, mean)
            })
            .collect()
    }
}

/// Composite 0-1 desirability score.
///
/// Requires `temp_avg`, `prec`, and `sunhours`; returns `None` if any is
/// missing.
#[must_use]
pub fn overall_score(
    means: &BTreeMap<ClimateVariable, Option<f64>>,
    scoring: &ScoringConfig,
) -> Option<f64> {
    let get = |variable| means.get(&variable).copied().flatten();

    let temp_avg = get(ClimateVariable::TempAvg)?;
    let prec = get(ClimateVariable::Prec)?;
    let sunhours = get(ClimateVariable::Sunhours)?;

    let temp_score = proximity(temp_avg, scoring.temp_target_c, scoring.temp_tolerance_c);
    let rain_score = proximity(prec, scoring.rain_target_mm, scoring.rain_tolerance_mm);
    let sun_score = proximity(sunhours, scoring.sun_target_hours, scoring.sun_tolerance_hours);

    Some((temp_score + rain_score + sun_score) / 3.0)
}

fn proximity(value: f64, target: f64, tolerance: f64) -> f64 {
    (1.0 - (value - target).abs() / tolerance).max(0.0)
}
