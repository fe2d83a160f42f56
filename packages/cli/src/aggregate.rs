//! Runs the monthly aggregation over a data directory.
//!
//! Inputs are loaded and countries are split once; months then run on
//! blocking tasks, at most `jobs` at a time, sharing the read-only
//! [`PipelineContext`].

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use climate_map_cli_utils::{IndicatifProgress, MultiProgress};
use climate_map_geography::{
    DataLayout, FsProvinceSource, GeoJsonSink, load_advisories, load_config, load_countries,
    load_name_mapping, write_metadata,
};
use climate_map_spatial::EqualAreaProjection;
use climate_map_territory::{
    AggregateSink, AggregationConfig, PipelineContext, PipelineError, ProgressCallback,
    ProvinceSource, RunSummary, process_month,
};
use climate_map_territory_models::Month;
use tokio::sync::{AcquireError, Semaphore};
use tokio::task::JoinSet;

/// Default number of months aggregated at once.
pub const DEFAULT_JOBS: usize = 4;

/// Everything an aggregation run needs from the user.
pub struct AggregateOptions {
    pub data_dir: PathBuf,
    /// Months to process; empty means all twelve.
    pub months: Vec<Month>,
    /// Overrides the config file's threshold.
    pub threshold_km: Option<f64>,
    pub config: Option<PathBuf>,
    pub name_mapping: Option<PathBuf>,
    pub jobs: usize,
}

impl AggregateOptions {
    /// All months under `data_dir` with default settings.
    #[must_use]
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            months: Vec::new(),
            threshold_km: None,
            config: None,
            name_mapping: None,
            jobs: DEFAULT_JOBS,
        }
    }
}

/// Resolves the effective config: file (if any), then the CLI threshold.
///
/// # Errors
///
/// Returns an error if the config file cannot be loaded or the result is
/// invalid.
pub fn resolve_config(
    config: Option<&Path>,
    threshold_km: Option<f64>,
) -> Result<AggregationConfig, Box<dyn std::error::Error>> {
    let mut resolved = match config {
        Some(path) => load_config(path)?,
        None => AggregationConfig::default(),
    };

    if let Some(threshold_km) = threshold_km {
        resolved.distance_threshold_km = threshold_km;
    }

    resolved.validate()?;
    Ok(resolved)
}

/// Aggregates the requested months and writes their files plus metadata.
///
/// # Errors
///
/// Returns an error if shared inputs cannot be loaded, a task panics, or
/// no month succeeds. Individual month failures are logged and reported in
/// the summary.
pub async fn run(
    multi: &MultiProgress,
    options: AggregateOptions,
) -> Result<RunSummary, Box<dyn std::error::Error>> {
    let start = Instant::now();
    let layout = DataLayout::new(&options.data_dir);

    let months = if options.months.is_empty() {
        Month::all().collect()
    } else {
        options.months
    };

    let config = resolve_config(options.config.as_deref(), options.threshold_km)?;
    let names = load_name_mapping(options.name_mapping.as_deref())?;
    let advisories = load_advisories(&layout.advisories_file())?;

    let spinner = IndicatifProgress::stage_spinner(multi, "Splitting country boundaries...");
    let countries_file = layout.countries_file();
    let ctx = tokio::task::spawn_blocking(move || {
        let countries = load_countries(&countries_file)?;
        Ok::<_, climate_map_geography::GeoError>(PipelineContext::new(
            EqualAreaProjection::world_mollweide(),
            config,
            &countries,
            names,
            advisories,
        ))
    })
    .await??;
    spinner.finish(format!(
        "Split countries into {} territories ({} countries skipped)",
        ctx.catalog.len(),
        ctx.catalog.countries_skipped()
    ));

    let ctx = Arc::new(ctx);
    let source: Arc<dyn ProvinceSource> = Arc::new(FsProvinceSource::new(layout.clone()));
    let sink: Arc<dyn AggregateSink> = Arc::new(GeoJsonSink::new(layout.clone()));
    let progress = IndicatifProgress::months_bar(multi, months.len() as u64);

    let summary = run_months(
        Arc::clone(&ctx),
        source,
        sink,
        &months,
        options.jobs,
        progress,
    )
    .await?;

    log::info!(
        "Summary: successfully processed {}/{} months in {:.1}s",
        summary.succeeded.len(),
        months.len(),
        start.elapsed().as_secs_f64()
    );

    if summary.succeeded.is_empty() {
        return Err("no month was aggregated".into());
    }

    write_metadata(
        &layout.metadata_file(),
        &ctx.config,
        &summary.processed_months(),
    )?;

    log::info!("Output files saved to: {}", layout.output_dir().display());

    Ok(summary)
}

/// Runs `months` on blocking tasks, at most `jobs` at a time.
///
/// Every month ends up in the summary: a month whose task panics is
/// recorded as [`PipelineError::Aborted`] and the others keep running.
///
/// # Errors
///
/// Returns an error only if the job semaphore is closed.
pub async fn run_months(
    ctx: Arc<PipelineContext>,
    source: Arc<dyn ProvinceSource>,
    sink: Arc<dyn AggregateSink>,
    months: &[Month],
    jobs: usize,
    progress: Arc<dyn ProgressCallback>,
) -> Result<RunSummary, AcquireError> {
    let semaphore = Arc::new(Semaphore::new(jobs.max(1)));
    progress.set_total(months.len() as u64);

    let mut tasks = JoinSet::new();
    let mut pending = HashMap::new();

    for &month in months {
        let permit = Arc::clone(&semaphore).acquire_owned().await?;
        let ctx = Arc::clone(&ctx);
        let source = Arc::clone(&source);
        let sink = Arc::clone(&sink);
        let progress = Arc::clone(&progress);

        let handle = tasks.spawn_blocking(move || {
            let _permit = permit;
            progress.set_message(format!("Month {month}"));
            process_month(&ctx, source.as_ref(), sink.as_ref(), month)
        });
        pending.insert(handle.id(), month);
    }

    let mut summary = RunSummary::default();
    while let Some(joined) = tasks.join_next_with_id().await {
        let (id, result) = match joined {
            Ok((id, result)) => (id, Ok(result)),
            Err(e) => (e.id(), Err(e.to_string())),
        };

        let Some(month) = pending.remove(&id) else {
            log::error!("Finished task {id} has no month");
            continue;
        };

        let result =
            result.unwrap_or_else(|message| Err(PipelineError::Aborted { month, message }));
        summary.record(month, result);
        progress.inc(1);
    }

    progress.finish(format!(
        "Aggregated {}/{} months",
        summary.succeeded.len(),
        months.len()
    ));

    Ok(summary)
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use climate_map_territory::CountryNameMapping;
    use climate_map_territory_models::{MonthOutput, ProvinceClimateRecord};

    use super::*;

    const COUNTRIES: &str = r#"{"type":"FeatureCollection","features":[
        {"type":"Feature","properties":{"name":"X"},
         "geometry":{"type":"Polygon","coordinates":[[[0,-1],[2,-1],[2,1],[0,1],[0,-1]]]}}
    ]}"#;

    const PROVINCES: &str = r#"{"type":"FeatureCollection","features":[
        {"type":"Feature",
         "properties":{"name":"North","admin":"X","tmin_mean":10.0,"temp_avg":22.5,
                       "prec_mean":2.0,"sunhours_mean":8.0},
         "geometry":{"type":"Polygon","coordinates":[[[0.2,0.1],[0.7,0.1],[0.7,0.6],[0.2,0.6],[0.2,0.1]]]}}
    ]}"#;

    struct TempDir(PathBuf);

    impl TempDir {
        fn new(name: &str) -> Self {
            let path = std::env::temp_dir().join(format!(
                "climate_map_cli_{}_{name}",
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

    fn month(number: u8) -> Month {
        Month::new(number).unwrap()
    }

    fn write(path: &Path, contents: &str) {
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, contents).unwrap();
    }

    fn data_tree(dir: &TempDir, province_months: &[u8]) -> DataLayout {
        let layout = DataLayout::new(&dir.0);
        write(&layout.countries_file(), COUNTRIES);
        for &number in province_months {
            write(&layout.province_file(month(number)), PROVINCES);
        }
        layout
    }

    fn options(layout: &DataLayout, months: &[u8]) -> AggregateOptions {
        let mut options = AggregateOptions::new(layout.root());
        options.months = months.iter().copied().map(month).collect();
        options.jobs = 2;
        options
    }

    #[tokio::test]
    async fn missing_month_does_not_stop_the_run() {
        let dir = TempDir::new("missing_month");
        let layout = data_tree(&dir, &[1, 3]);

        let summary = run(&MultiProgress::new(), options(&layout, &[1, 2, 3]))
            .await
            .unwrap();

        assert_eq!(summary.processed_months(), vec![month(1), month(3)]);
        assert_eq!(summary.failed.len(), 1);
        assert!(matches!(
            summary.failed[0],
            (m, PipelineError::MissingSourceFile { .. }) if m == month(2)
        ));

        assert!(layout.output_file(month(1)).exists());
        assert!(!layout.output_file(month(2)).exists());
        assert!(layout.output_file(month(3)).exists());

        let metadata: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(layout.metadata_file()).unwrap())
                .unwrap();
        assert_eq!(metadata["months"], serde_json::json!([1, 3]));
    }

    #[tokio::test]
    async fn run_fails_when_no_month_succeeds() {
        let dir = TempDir::new("no_month");
        let layout = data_tree(&dir, &[]);

        let result = run(&MultiProgress::new(), options(&layout, &[1, 2])).await;

        assert!(result.is_err());
        assert!(!layout.metadata_file().exists());
    }

    struct PanickingSource {
        panics_on: Month,
    }

    impl ProvinceSource for PanickingSource {
        fn load_month(&self, month: Month) -> Result<Vec<ProvinceClimateRecord>, PipelineError> {
            assert_ne!(month, self.panics_on, "corrupt month {month}");
            Ok(Vec::new())
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

    struct Quiet;

    impl ProgressCallback for Quiet {
        fn set_total(&self, _total: u64) {}
        fn inc(&self, _delta: u64) {}
        fn set_message(&self, _msg: String) {}
        fn finish(&self, _msg: String) {}
    }

    #[tokio::test]
    async fn panicking_month_is_recorded_as_aborted() {
        let ctx = PipelineContext::new(
            EqualAreaProjection::world_mollweide(),
            AggregationConfig::default(),
            &[],
            CountryNameMapping::default(),
            None,
        );
        let sink = Arc::new(MemorySink::default());
        let months: Vec<Month> = (1..=4).map(month).collect();

        let summary = run_months(
            Arc::new(ctx),
            Arc::new(PanickingSource { panics_on: month(2) }),
            Arc::clone(&sink) as Arc<dyn AggregateSink>,
            &months,
            2,
            Arc::new(Quiet),
        )
        .await
        .unwrap();

        assert_eq!(
            summary.processed_months(),
            vec![month(1), month(3), month(4)]
        );
        assert_eq!(summary.failed.len(), 1);
        assert!(matches!(
            summary.failed[0],
            (m, PipelineError::Aborted { .. }) if m == month(2)
        ));

        let mut written = sink.written.lock().unwrap().clone();
        written.sort_unstable();
        assert_eq!(written, summary.processed_months());
    }
}
