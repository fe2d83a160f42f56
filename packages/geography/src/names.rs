//! Country-name lookup table.
//!
//! The default table is embedded at compile time via [`include_str!`]. An
//! override file with the same `[names]` layout can add entries or replace
//! defaults.

use std::collections::BTreeMap;
use std::path::Path;

use climate_map_territory::CountryNameMapping;
use serde::Deserialize;

use crate::{GeoError, read_to_string};

/// Default table baked into the binary.
const DEFAULT_NAMES_TOML: &str = include_str!("../names/country_names.toml");

#[derive(Debug, Deserialize)]
struct NameTable {
    #[serde(default)]
    names: BTreeMap<String, String>,
}

/// Parses a `[names]` TOML table.
///
/// # Errors
///
/// Returns [`GeoError::Toml`] if `toml` is not a valid name table.
pub fn parse_name_table(toml: &str) -> Result<BTreeMap<String, String>, GeoError> {
    let table: NameTable = toml::from_str(toml)?;
    Ok(table.names)
}

/// The embedded default mapping.
///
/// # Errors
///
/// Returns [`GeoError::Toml`] if the embedded table is malformed.
pub fn default_name_mapping() -> Result<CountryNameMapping, GeoError> {
    Ok(CountryNameMapping::new(parse_name_table(DEFAULT_NAMES_TOML)?))
}

/// The default mapping extended by the entries in `overrides`, if given.
///
/// # Errors
///
/// Returns [`GeoError`] if the override file is missing or malformed.
pub fn load_name_mapping(overrides: Option<&Path>) -> Result<CountryNameMapping, GeoError> {
    let mut mapping = default_name_mapping()?;

    if let Some(path) = overrides {
        let extra = parse_name_table(&read_to_string(path)?)?;
        log::info!(
            "Loaded {} country name overrides from {}",
            extra.len(),
            path.display()
        );
        mapping.extend(extra);
    }

    log::debug!("Country name table has {} entries", mapping.len());

    Ok(mapping)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::TempDir;

    #[test]
    fn embedded_table_parses() {
        let mapping = default_name_mapping().unwrap();
        assert!(mapping.len() >= 50, "only {} entries", mapping.len());
    }

    #[test]
    fn embedded_table_maps_known_names() {
        let mapping = default_name_mapping().unwrap();
        assert_eq!(mapping.map("Democratic Republic of the Congo"), "Dem. Rep. Congo");
        assert_eq!(mapping.map("Czech Republic"), "Czechia");
        assert_eq!(mapping.map("West Bank"), "Palestine");
        assert_eq!(mapping.map("Gaza"), "Palestine");
        assert_eq!(mapping.map("Ivory Coast"), "Côte d'Ivoire");
        assert_eq!(mapping.map("France"), "France");
    }

    #[test]
    fn embedded_values_are_not_keys() {
        // A mapped name must not be remapped again.
        let mapping = default_name_mapping().unwrap();
        for (from, to) in mapping.iter() {
            assert_eq!(mapping.map(to), to, "{from} maps to {to}, which is remapped");
        }
    }

    #[test]
    fn overrides_extend_and_replace() {
        let dir = TempDir::new("names_override");
        let path = dir.0.join("names.toml");
        std::fs::write(
            &path,
            "[names]\n\"Czech Republic\" = \"Czech Rep.\"\n\"Burma\" = \"Myanmar\"\n",
        )
        .unwrap();

        let mapping = load_name_mapping(Some(&path)).unwrap();
        assert_eq!(mapping.map("Czech Republic"), "Czech Rep.");
        assert_eq!(mapping.map("Burma"), "Myanmar");
        assert_eq!(mapping.map("Gaza"), "Palestine");
    }

    #[test]
    fn malformed_override_is_an_error() {
        let dir = TempDir::new("names_malformed");
        let path = dir.0.join("names.toml");
        std::fs::write(&path, "[names]\n\"Burma\" = 12\n").unwrap();

        assert!(matches!(
            load_name_mapping(Some(&path)),
            Err(GeoError::Toml(_))
        ));
    }
}
