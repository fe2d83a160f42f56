//! Monthly aggregation passes.
//!
//! Territories are split once into a shared [`PipelineContext`]; each month
//! then runs assignment, accumulation, renaming, filtering, and advisory
//! merging with its own private state. A failing month is reported and does
//! not stop the others.

use std::collections::BTreeMap;

use climate_map_spatial::EqualAreaProjection;
use climate_map_territory_models::{
    CountryBoundary, Month, MonthOutput, MonthStats, ProvinceClimateRecord, Territory,
    TerritoryAggregate, TerritoryKind,
};
use geo::{MultiPolygon, Point, Polygon};

use crate::{
    PipelineError,
    advisory::{AdvisoryTable, merge_advisories},
    assign::{Assignment, MeasuredProvince, ProvinceAssigner},
    catalog::TerritoryCatalog,
    config::AggregationConfig,
    mapping::CountryNameMapping,
    naming::largest_province_name,
    stats::{TerritoryAccumulator, overall_score},
};

/// Read-only inputs shared by every month.
pub struct PipelineContext {
    pub projection: EqualAreaProjection,
    pub config: AggregationConfig,
    pub catalog: TerritoryCatalog,
    pub names: CountryNameMapping,
    pub advisories: Option<AdvisoryTable>,
}

impl PipelineContext {
    /// Splits `countries` with `config`'s threshold and bundles the lookup
    /// tables.
    #[must_use]
    pub fn new(
        projection: EqualAreaProjection,
        config: AggregationConfig,
        countries: &[CountryBoundary],
        names: CountryNameMapping,
        advisories: Option<AdvisoryTable>,
    ) -> Self {
        let catalog = TerritoryCatalog::build(&projection, countries, config.distance_threshold_km);

        Self {
            projection,
            config,
            catalog,
            names,
            advisories,
        }
    }
}

/// Supplies one month of province records.
pub trait ProvinceSource: Send + Sync {
    /// Loads every province record for `month`.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError`] if the month's data is missing or
    /// unreadable.
    fn load_month(&self, month: Month) -> Result<Vec<ProvinceClimateRecord>, PipelineError>;
}

/// Receives one month of aggregates.
pub trait AggregateSink: Send + Sync {
    /// Persists `output`. Implementations must not leave partial output
    /// behind on failure.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError`] if the output cannot be written.
    fn write_month(&self, output: &MonthOutput) -> Result<(), PipelineError>;
}

/// Provinces collected for a country that has no boundary.
struct SyntheticTerritory {
    name: String,
    polygons: Vec<Polygon<f64>>,
    area_km2: f64,
    first_centroid: Point<f64>,
    accumulator: TerritoryAccumulator,
}

/// Aggregates one month of province records into territory records.
#[must_use]
pub fn aggregate_month(
    ctx: &PipelineContext,
    month: Month,
    provinces: &[ProvinceClimateRecord],
) -> MonthOutput {
    let assigner = ProvinceAssigner::new(&ctx.catalog, &ctx.projection);

    let mut accumulators = vec![TerritoryAccumulator::default(); ctx.catalog.len()];
    let mut synthetic: Vec<SyntheticTerritory> = Vec::new();
    let mut synthetic_slots: BTreeMap<String, usize> = BTreeMap::new();

    let mut stats = MonthStats {
        provinces_loaded: provinces.len() as u64,
        ..MonthStats::default()
    };

    for record in provinces {
        let province = match MeasuredProvince::measure(&ctx.projection, record) {
            Ok(province) => province,
            Err(e) => {
                log::warn!(
                    "Month {month}: skipping province {} ({}): {e}",
                    record.name,
                    record.parent_country_name
                );
                stats.provinces_skipped += 1;
                continue;
            }
        };

        let country_name = ctx.names.map(&record.parent_country_name);

        match assigner.assign(country_name, &province) {
            Assignment::Territory(slot) => {
                accumulators[slot].add_province(record, province.area_km2);
            }
            Assignment::Synthetic(name) => {
                let slot = *synthetic_slots.entry(name.clone()).or_insert_with(|| {
                    log::debug!("Month {month}: no boundary for {name}, synthesizing territory");
                    synthetic.push(SyntheticTerritory {
                        name,
                        polygons: Vec::new(),
                        area_km2: 0.0,
                        first_centroid: province.centroid,
                        accumulator: TerritoryAccumulator::default(),
                    });
                    synthetic.len() - 1
                });

                let entry = &mut synthetic[slot];
                entry.polygons.extend(record.geometry.0.iter().cloned());
                entry.area_km2 += province.area_km2;
                entry.accumulator.add_province(record, province.area_km2);
            }
        }
    }

    let territories_total = ctx.catalog.len() + synthetic.len();
    stats.territories_total = territories_total as u64;
    stats.territories_synthesized = synthetic.len() as u64;

    let mut territories = Vec::with_capacity(territories_total);

    for (territory, accumulator) in ctx.catalog.territories().iter().zip(&accumulators) {
        if accumulator.province_count() == 0 {
            log::debug!("Month {month}: dropping {} (no provinces)", territory.name);
            stats.territories_dropped += 1;
            continue;
        }

        let mut territory = territory.clone();
        if territory.is_distant() {
            if let Some(name) = largest_province_name(accumulator.provinces()) {
                log::debug!("Month {month}: renaming {} to {name}", territory.name);
                territory.name = name.to_string();
            }
        }

        territories.push(finish(ctx, territory, accumulator));
    }

    for entry in synthetic {
        let geometry = MultiPolygon(entry.polygons);
        let centroid = ctx
            .projection
            .centroid(&geometry)
            .unwrap_or(entry.first_centroid);

        let territory = Territory {
            parent_country_name: entry.name.clone(),
            name: entry.name,
            geometry,
            area_km2: entry.area_km2,
            centroid,
            kind: TerritoryKind::Synthetic,
        };

        territories.push(finish(ctx, territory, &entry.accumulator));
    }

    stats.advisories_matched = merge_advisories(&mut territories, ctx.advisories.as_ref());

    log::info!(
        "Month {month}: {} provinces ({} skipped) -> {} territories ({} dropped, {} synthesized)",
        stats.provinces_loaded,
        stats.provinces_skipped,
        territories.len(),
        stats.territories_dropped,
        stats.territories_synthesized
    );

    MonthOutput {
        month,
        territories,
        stats,
    }
}

fn finish(
    ctx: &PipelineContext,
    territory: Territory,
    accumulator: &TerritoryAccumulator,
) -> TerritoryAggregate {
    let variable_means = accumulator.means();
    let overall_score = overall_score(&variable_means, &ctx.config.scoring);

    TerritoryAggregate {
        territory,
        variable_means,
        overall_score,
        province_count: accumulator.province_count(),
        safety: None,
    }
}

/// Loads, aggregates, and writes one month.
///
/// # Errors
///
/// Returns the source or sink error; nothing is written if loading fails.
pub fn process_month(
    ctx: &PipelineContext,
    source: &dyn ProvinceSource,
    sink: &dyn AggregateSink,
    month: Month,
) -> Result<MonthStats, PipelineError> {
    let provinces = source.load_month(month)?;
    let output = aggregate_month(ctx, month, &provinces);
    sink.write_month(&output)?;
    Ok(output.stats)
}

/// Outcome of a multi-month run.
#[derive(Debug, Default)]
pub struct RunSummary {
    /// Months written, in completion order.
    pub succeeded: Vec<(Month, MonthStats)>,
    /// Months that failed, with the reason.
    pub failed: Vec<(Month, PipelineError)>,
}

impl RunSummary {
    /// Records the result of one month, logging failures.
    pub fn record(&mut self, month: Month, result: Result<MonthStats, PipelineError>) {
        match result {
            Ok(stats) => self.succeeded.push((month, stats)),
            Err(e) => {
                log::error!("Month {month} failed: {e}");
                self.failed.push((month, e));
            }
        }
    }

    /// Months that were written, sorted.
    #[must_use]
    pub fn processed_months(&self) -> Vec<Month> {
        let mut months: Vec<Month> = self.succeeded.iter().map(|(month, _)| *month).collect();
        months.sort_unstable();
        months
    }

    /// Whether every attempted month succeeded.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use climate_map_territory_models::ClimateVariable;
    use geo::{Rect, coord};

    use super::*;

    fn square(min_lon: f64, min_lat: f64, size: f64) -> Polygon<f64> {
        Rect::new(
            coord! { x: min_lon, y: min_lat },
            coord! { x: min_lon + size, y: min_lat + size },
        )
        .to_polygon()
    }

    fn province(
        name: &str,
        admin: &str,
        polygon: Polygon<f64>,
        values: &[(ClimateVariable, Option<f64>)],
    ) -> ProvinceClimateRecord {
        ProvinceClimateRecord {
            name: name.to_string(),
            parent_country_name: admin.to_string(),
            geometry: MultiPolygon(vec![polygon]),
            variables: values.iter().copied().collect(),
        }
    }

    fn context(advisories: Option<AdvisoryTable>) -> PipelineContext {
        let countries = vec![
            CountryBoundary {
                name: "X".to_string(),
                geometry: MultiPolygon(vec![square(0.0, -1.0, 2.0), square(40.0, 0.0, 1.0)]),
            },
            CountryBoundary {
                name: "Y".to_string(),
                geometry: MultiPolygon(vec![square(-20.0, 0.0, 1.0)]),
            },
        ];
        let names = [("Xland".to_string(), "X".to_string())].into_iter().collect();

        PipelineContext::new(
            EqualAreaProjection::world_mollweide(),
            AggregationConfig::default(),
            &countries,
            names,
            advisories,
        )
    }

    fn provinces() -> Vec<ProvinceClimateRecord> {
        use ClimateVariable::{Prec, Sunhours, TempAvg, Tmin};

        vec![
            province(
                "North",
                "Xland",
                square(0.2, 0.1, 0.5),
                &[
                    (Tmin, Some(10.0)),
                    (TempAvg, Some(22.5)),
                    (Prec, Some(2.0)),
                    (Sunhours, Some(8.0)),
                ],
            ),
            province("South", "Xland", square(0.2, -0.9, 0.9), &[(Tmin, None)]),
            province("Isla Chica", "X", square(40.7, 0.7, 0.2), &[(Tmin, Some(20.0))]),
            province("Isla Grande", "X", square(40.1, 0.1, 0.5), &[(Tmin, Some(24.0))]),
            province("Orphan", "Z", square(60.0, 10.0, 0.5), &[(Tmin, Some(5.0))]),
        ]
    }

    fn month(number: u8) -> Month {
        Month::new(number).unwrap()
    }

    fn find<'a>(output: &'a MonthOutput, name: &str) -> &'a TerritoryAggregate {
        output
            .territories
            .iter()
            .find(|t| t.territory.name == name)
            .unwrap_or_else(|| panic!("no territory named {name} in {:?}", names(output)))
    }

    fn names(output: &MonthOutput) -> Vec<&str> {
        output
            .territories
            .iter()
            .map(|t| t.territory.name.as_str())
            .collect()
    }

    #[test]
    fn every_emitted_territory_has_provinces() {
        let output = aggregate_month(&context(None), month(1), &provinces());

        assert!(output.territories.iter().all(|t| t.province_count >= 1));
        assert_eq!(names(&output), vec!["X", "Isla Grande", "Z"]);
        assert_eq!(output.stats.territories_total, 4);
        assert_eq!(output.stats.territories_dropped, 1);
    }

    #[test]
    fn distant_territory_takes_largest_province_name() {
        let output = aggregate_month(&context(None), month(1), &provinces());
        let island = find(&output, "Isla Grande");

        assert_eq!(island.territory.kind, TerritoryKind::Distant);
        assert_eq!(island.territory.parent_country_name, "X");
        assert_eq!(island.province_count, 2);
    }

    #[test]
    fn null_value_does_not_dilute_mean() {
        let output = aggregate_month(&context(None), month(1), &provinces());
        let main = find(&output, "X");

        assert_eq!(main.province_count, 2);
        let tmin = main.mean(ClimateVariable::Tmin).unwrap();
        assert!((tmin - 10.0).abs() < 1e-9, "tmin_mean = {tmin}");
        assert!((main.overall_score.unwrap() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn score_is_null_without_inputs() {
        let output = aggregate_month(&context(None), month(1), &provinces());
        assert_eq!(find(&output, "Isla Grande").overall_score, None);
    }

    #[test]
    fn unknown_country_is_synthesized() {
        let output = aggregate_month(&context(None), month(1), &provinces());
        let orphan = find(&output, "Z");

        assert_eq!(orphan.territory.kind, TerritoryKind::Synthetic);
        assert_eq!(orphan.province_count, 1);
        assert!(orphan.territory.area_km2 > 0.0);
        assert_eq!(output.stats.territories_synthesized, 1);
    }

    #[test]
    fn broken_province_is_skipped() {
        let mut records = provinces();
        records.push(ProvinceClimateRecord {
            name: "Broken".to_string(),
            parent_country_name: "X".to_string(),
            geometry: MultiPolygon(vec![]),
            variables: BTreeMap::new(),
        });

        let output = aggregate_month(&context(None), month(1), &records);
        assert_eq!(output.stats.provinces_loaded, 6);
        assert_eq!(output.stats.provinces_skipped, 1);
        assert_eq!(find(&output, "X").province_count, 2);
    }

    #[test]
    fn advisories_are_merged() {
        let table: AdvisoryTable = [(
            "X".to_string(),
            climate_map_territory_models::SafetyRecord {
                level: 3,
                ..Default::default()
            },
        )]
        .into_iter()
        .collect();

        let output = aggregate_month(&context(Some(table)), month(1), &provinces());

        assert_eq!(find(&output, "X").safety.as_ref().map(|s| s.level), Some(3));
        assert_eq!(find(&output, "Z").safety.as_ref().map(|s| s.level), Some(1));
        assert_eq!(output.stats.advisories_matched, 1);
    }

    struct FlakySource {
        failing: Month,
    }

    impl ProvinceSource for FlakySource {
        fn load_month(&self, month: Month) -> Result<Vec<ProvinceClimateRecord>, PipelineError> {
            if month == self.failing {
                return Err(PipelineError::MissingSourceFile {
                    month,
                    path: "provinces_month_03.geojson".into(),
                });
            }
            Ok(provinces())
        }
    }

    #[derive(Default)]
    struct MemorySink {
        written: Mutex<Vec<Month>>,
    }

    impl AggregateSink for MemorySink {
        fn write_month(&self, output: &MonthOutput) -> Result<(), PipelineError> {
            self.written.lock().unwrap().push(output.month);
            Ok(())
        }
    }

    #[test]
    fn failing_month_does_not_stop_others() {
        let ctx = context(None);
        let source = FlakySource { failing: month(3) };
        let sink = MemorySink::default();
        let months: Vec<Month> = (1..=4).map(month).collect();

        let mut summary = RunSummary::default();
        for &month in &months {
            summary.record(month, process_month(&ctx, &source, &sink, month));
        }

        assert_eq!(
            summary.processed_months(),
            vec![month(1), month(2), month(4)]
        );
        assert_eq!(summary.failed.len(), 1);
        assert!(matches!(
            summary.failed[0],
            (m, PipelineError::MissingSourceFile { .. }) if m == month(3)
        ));
        assert!(!summary.is_complete());
        assert_eq!(*sink.written.lock().unwrap(), summary.processed_months());
    }
}
