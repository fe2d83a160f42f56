//! Travel advisory table loading.
//!
//! The file is a JSON object keyed by boundary-source country name:
//!
//! ```json
//! {"Mali": {"level": 4, "description": "Do Not Travel", "summary": "...",
//!           "url": "https://...", "date": "2025-01-15"}}
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use chrono::NaiveDate;
use climate_map_territory::AdvisoryTable;
use climate_map_territory_models::SafetyRecord;
use serde::Deserialize;

use crate::{GeoError, read_to_string};

/// An advisory entry as written in the file.
#[derive(Debug, Deserialize)]
struct RawAdvisory {
    level: i64,
    #[serde(default)]
    description: String,
    #[serde(default)]
    summary: String,
    #[serde(default)]
    url: String,
    #[serde(default)]
    date: Option<String>,
}

/// Loads the advisory table.
///
/// A missing file is not an error: every territory then gets the default
/// level-1 advisory. Entries with a level outside 1-4 or an unreadable
/// shape are skipped with a warning; an unparseable date becomes `None`.
///
/// # Errors
///
/// Returns [`GeoError`] if the file exists but cannot be read or is not a
/// JSON object.
pub fn load_advisories(path: &Path) -> Result<Option<AdvisoryTable>, GeoError> {
    let text = match read_to_string(path) {
        Ok(text) => text,
        Err(GeoError::NotFound { .. }) => {
            log::info!(
                "Travel advisories file not found: {}; using default advisories",
                path.display()
            );
            return Ok(None);
        }
        Err(e) => return Err(e),
    };

    let entries: BTreeMap<String, serde_json::Value> = serde_json::from_str(&text)?;
    let total = entries.len();

    let table: AdvisoryTable = entries
        .into_iter()
        .filter_map(|(country, value)| {
            let raw: RawAdvisory = match serde_json::from_value(value) {
                Ok(raw) => raw,
                Err(e) => {
                    log::warn!("Skipping advisory for {country}: {e}");
                    return None;
                }
            };
            to_record(&country, raw).map(|record| (country, record))
        })
        .collect();

    log::info!(
        "Loaded travel advisories for {} countries ({} skipped)",
        table.len(),
        total - table.len()
    );

    Ok(Some(table))
}

fn to_record(country: &str, raw: RawAdvisory) -> Option<SafetyRecord> {
    let date = raw.date.and_then(|date| {
        NaiveDate::parse_from_str(&date, "%Y-%m-%d")
            .map_err(|e| log::warn!("Ignoring advisory date {date:?} for {country}: {e}"))
            .ok()
    });

    let record = SafetyRecord {
        level: u8::try_from(raw.level).unwrap_or(0),
        description: raw.description,
        summary: raw.summary,
        url: raw.url,
        date,
    };

    if !record.has_valid_level() {
        log::warn!("Skipping advisory for {country}: level {} is not 1-4", raw.level);
        return None;
    }

    Some(record)
}
