#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Territory-aware aggregation of province climate statistics.
//!
//! Countries made of far-apart landmasses (a mainland plus overseas
//! islands) are split into a main territory and distant clusters, so each
//! cluster gets its own climate summary. Provinces are matched to
//! territories by intersection area, averaged per variable weighted by
//! province area, scored, and annotated with travel advisories. The
//! pipeline runs once per calendar month; months are independent.

pub mod advisory;
pub mod assign;
pub mod catalog;
pub mod config;
pub mod mapping;
pub mod naming;
pub mod pipeline;
pub mod progress;
pub mod split;
pub mod stats;

use std::path::PathBuf;

use climate_map_territory_models::Month;
use thiserror::Error;

pub use advisory::{AdvisoryTable, merge_advisories};
pub use catalog::TerritoryCatalog;
pub use config::{AggregationConfig, ScoringConfig};
pub use mapping::CountryNameMapping;
pub use pipeline::{
    AggregateSink, PipelineContext, ProvinceSource, RunSummary, aggregate_month, process_month,
};
pub use progress::ProgressCallback;

/// Errors that abort a single month.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PipelineError {
    /// The month's province dataset does not exist.
    #[error("Month {month}: province data not found at {}", path.display())]
    MissingSourceFile {
        /// The month being processed.
        month: Month,
        /// Where the dataset was expected.
        path: PathBuf,
    },

    /// The month's province dataset could not be read.
    #[error("Month {month}: failed to load provinces: {message}")]
    Source {
        /// The month being processed.
        month: Month,
        /// Description of what went wrong.
        message: String,
    },

    /// The month's output could not be written.
    #[error("Month {month}: failed to write output: {message}")]
    Sink {
        /// The month being processed.
        month: Month,
        /// Description of what went wrong.
        message: String,
    },

    /// The task running the month panicked or was cancelled.
    #[error("Month {month}: aggregation aborted: {message}")]
    Aborted {
        /// The month being processed.
        month: Month,
        /// Description of what went wrong.
        message: String,
    },
}

impl PipelineError {
    /// The month that failed.
    #[must_use]
    pub const fn month(&self) -> Month {
        match self {
            Self::MissingSourceFile { month, .. }
            | Self::Source { month, .. }
            | Self::Sink { month, .. }
            | Self::Aborted { month, .. } => *month,
        }
    }
}
