//! Menu-driven front end for running the tools without memorizing flags.

use std::path::PathBuf;

use climate_map_cli_utils::MultiProgress;
use climate_map_territory::config::DEFAULT_DISTANCE_THRESHOLD_KM;
use climate_map_territory_models::Month;
use dialoguer::{Confirm, Input, MultiSelect, Select};

use crate::aggregate::{self, AggregateOptions, DEFAULT_JOBS};
use crate::inspect;

/// Top-level actions of the interactive menu.
enum Tool {
    AggregateAll,
    AggregateMonths,
    InspectSplit,
    ListNames,
}

impl Tool {
    const ALL: &[Self] = &[
        Self::AggregateAll,
        Self::AggregateMonths,
        Self::InspectSplit,
        Self::ListNames,
    ];

    #[must_use]
    const fn label(&self) -> &'static str {
        match self {
            Self::AggregateAll => "Aggregate all months",
            Self::AggregateMonths => "Aggregate selected months",
            Self::InspectSplit => "Inspect country territory split",
            Self::ListNames => "List country name mappings",
        }
    }
}

/// Runs the interactive menu.
///
/// # Errors
///
/// Returns an error if a prompt fails or the selected tool fails.
pub async fn run(multi: &MultiProgress) -> Result<(), Box<dyn std::error::Error>> {
    let labels: Vec<&str> = Tool::ALL.iter().map(Tool::label).collect();

    let idx = Select::new()
        .with_prompt("What would you like to do?")
        .items(&labels)
        .default(0)
        .interact()?;

    match Tool::ALL[idx] {
        Tool::AggregateAll => {
            let options = prompt_options(Vec::new())?;
            aggregate::run(multi, options).await?;
        }
        Tool::AggregateMonths => {
            let months = prompt_months()?;
            if months.is_empty() {
                log::info!("No months selected.");
                return Ok(());
            }
            let options = prompt_options(months)?;
            aggregate::run(multi, options).await?;
        }
        Tool::InspectSplit => {
            let data_dir = prompt_data_dir()?;
            let countries: String = Input::new()
                .with_prompt("Country names (comma-separated, as in the boundary file)")
                .interact_text()?;
            let countries: Vec<String> = countries
                .split(',')
                .map(str::trim)
                .filter(|name| !name.is_empty())
                .map(str::to_string)
                .collect();
            let threshold_km = prompt_threshold()?;

            inspect::split(&data_dir, &countries, Some(threshold_km), None)?;
        }
        Tool::ListNames => inspect::names(None)?,
    }

    Ok(())
}

fn prompt_data_dir() -> Result<PathBuf, dialoguer::Error> {
    let data_dir: String = Input::new()
        .with_prompt("Data directory")
        .default("data".to_string())
        .interact_text()?;
    Ok(PathBuf::from(data_dir))
}

fn prompt_threshold() -> Result<f64, dialoguer::Error> {
    Input::new()
        .with_prompt("Distance threshold (km)")
        .default(DEFAULT_DISTANCE_THRESHOLD_KM)
        .interact_text()
}

fn prompt_months() -> Result<Vec<Month>, dialoguer::Error> {
    let months: Vec<Month> = Month::all().collect();
    let labels: Vec<String> = months.iter().map(|m| format!("Month {m}")).collect();

    let selected = MultiSelect::new()
        .with_prompt("Months (space=toggle, enter=confirm)")
        .items(&labels)
        .interact()?;

    Ok(selected.into_iter().map(|idx| months[idx]).collect())
}

fn prompt_options(months: Vec<Month>) -> Result<AggregateOptions, dialoguer::Error> {
    let mut options = AggregateOptions::new(prompt_data_dir()?);
    options.months = months;

    let customize = Confirm::new()
        .with_prompt("Customize threshold and parallelism?")
        .default(false)
        .interact()?;

    if customize {
        options.threshold_km = Some(prompt_threshold()?);
        options.jobs = Input::new()
            .with_prompt("Months to process in parallel")
            .default(DEFAULT_JOBS)
            .interact_text()?;
    }

    Ok(options)
}
