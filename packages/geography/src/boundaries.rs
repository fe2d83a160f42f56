//! Natural Earth country boundary loading.

use std::path::Path;

use climate_map_spatial::geojson_to_multipolygon;
use climate_map_territory_models::CountryBoundary;

use crate::{GeoError, read_feature_collection};

/// Loads every country with a name and a polygonal geometry, in file
/// order. Other features are skipped with a warning.
///
/// # Errors
///
/// Returns [`GeoError`] if the file is missing or is not a `GeoJSON`
/// `FeatureCollection`.
pub fn load_countries(path: &Path) -> Result<Vec<CountryBoundary>, GeoError> {
    let collection = read_feature_collection(path)?;
    let total = collection.features.len();

    let countries: Vec<CountryBoundary> = collection
        .features
        .into_iter()
        .enumerate()
        .filter_map(|(idx, feature)| {
            let name = feature
                .property("name")
                .and_then(serde_json::Value::as_str)
                .map(str::to_string);

            let Some(name) = name else {
                log::warn!("Skipping country feature {idx}: no name");
                return None;
            };

            let Some(geometry) = feature.geometry.and_then(geojson_to_multipolygon) else {
                log::warn!("Skipping country {name}: geometry is not a polygon");
                return None;
            };

            Some(CountryBoundary { name, geometry })
        })
        .collect();

    log::info!(
        "Loaded {} country boundaries from {} ({} skipped)",
        countries.len(),
        path.display(),
        total - countries.len()
    );

    Ok(countries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::TempDir;

    const COUNTRIES: &str = r#"{
        "type": "FeatureCollection",
        "features": [
            {
                "type": "Feature",
                "properties": {"name": "Square"},
                "geometry": {"type": "Polygon", "coordinates": [[[0,0],[1,0],[1,1],[0,1],[0,0]]]}
            },
            {
                "type": "Feature",
                "properties": {"name": "Islands"},
                "geometry": {"type": "MultiPolygon", "coordinates": [
                    [[[0,0],[1,0],[1,1],[0,1],[0,0]]],
                    [[[40,0],[41,0],[41,1],[40,1],[40,0]]]
                ]}
            },
            {
                "type": "Feature",
                "properties": {"name": "Pin"},
                "geometry": {"type": "Point", "coordinates": [5, 5]}
            },
            {
                "type": "Feature",
                "properties": {},
                "geometry": {"type": "Polygon", "coordinates": [[[0,0],[1,0],[1,1],[0,1],[0,0]]]}
            }
        ]
    }"#;

    #[test]
    fn loads_polygon_countries_in_order() {
        let dir = TempDir::new("countries");
        let path = dir.0.join("countries.geojson");
        std::fs::write(&path, COUNTRIES).unwrap();

        let countries = load_countries(&path).unwrap();
        let names: Vec<&str> = countries.iter().map(|c| c.name.as_str()).collect();

        assert_eq!(names, vec!["Square", "Islands"]);
        assert_eq!(countries[0].geometry.0.len(), 1);
        assert_eq!(countries[1].geometry.0.len(), 2);
    }

    #[test]
    fn missing_file_is_not_found() {
        let result = load_countries(Path::new("/nonexistent/countries.geojson"));
        assert!(matches!(result, Err(GeoError::NotFound { .. })));
    }
}
