#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Command-line driver for the country climate aggregation.
//!
//! Splits country boundaries into territories, aggregates the monthly
//! province climate files onto them, and writes one `GeoJSON` file per
//! month. Without a subcommand an interactive menu is shown.
//!
//! Logging goes through [`climate_map_cli_utils::init_logger`], so log
//! lines and progress bars share the terminal cleanly.

mod aggregate;
mod inspect;
mod interactive;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use climate_map_territory_models::Month;

use crate::aggregate::{AggregateOptions, DEFAULT_JOBS};

#[derive(Parser)]
#[command(
    name = "climate_map_cli",
    about = "Territory-aware country climate aggregation"
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Aggregate province climate files into per-territory country files
    Aggregate {
        /// Root of the data directory tree
        #[arg(long, default_value = "data")]
        data_dir: PathBuf,
        /// Comma-separated months to process (e.g. "1,2,12"); all if omitted
        #[arg(long, value_delimiter = ',', value_parser = parse_month)]
        months: Vec<Month>,
        /// Distance (km) beyond which country parts become separate
        /// territories; overrides the config file
        #[arg(long)]
        threshold_km: Option<f64>,
        /// TOML file with threshold and scoring settings
        #[arg(long)]
        config: Option<PathBuf>,
        /// TOML `[names]` table extending the built-in country name mapping
        #[arg(long)]
        name_mapping: Option<PathBuf>,
        /// Number of months processed in parallel
        #[arg(long, default_value_t = DEFAULT_JOBS)]
        jobs: usize,
    },
    /// Show how countries split into territories
    Split {
        /// Boundary-source country name; repeat for several countries
        #[arg(long, required = true)]
        country: Vec<String>,
        /// Root of the data directory tree
        #[arg(long, default_value = "data")]
        data_dir: PathBuf,
        /// Distance threshold in km; overrides the config file
        #[arg(long)]
        threshold_km: Option<f64>,
        /// TOML file with threshold and scoring settings
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// List the effective country name mapping
    Names {
        /// TOML `[names]` table extending the built-in mapping
        #[arg(long)]
        name_mapping: Option<PathBuf>,
    },
}

fn parse_month(value: &str) -> Result<Month, String> {
    let number: u8 = value
        .trim()
        .parse()
        .map_err(|e| format!("invalid month {value:?}: {e}"))?;
    Month::new(number).map_err(|e| e.to_string())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let multi = climate_map_cli_utils::init_logger();
    let cli = Cli::parse();

    let Some(command) = cli.command else {
        println!("Climate Map Toolchain");
        println!();
        return interactive::run(&multi).await;
    };

    match command {
        Commands::Aggregate {
            data_dir,
            months,
            threshold_km,
            config,
            name_mapping,
            jobs,
        } => {
            let options = AggregateOptions {
                data_dir,
                months,
                threshold_km,
                config,
                name_mapping,
                jobs,
            };
            aggregate::run(&multi, options).await?;
        }
        Commands::Split {
            country,
            data_dir,
            threshold_km,
            config,
        } => inspect::split(&data_dir, &country, threshold_km, config.as_deref())?,
        Commands::Names { name_mapping } => inspect::names(name_mapping.as_deref())?,
    }

    Ok(())
}
