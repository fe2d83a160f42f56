//! Diagnostic listings: how countries split and which names get mapped.

use std::path::Path;

use climate_map_geography::{DataLayout, load_countries, load_name_mapping};
use climate_map_spatial::EqualAreaProjection;
use climate_map_territory::split::split_country;

use crate::aggregate::resolve_config;

/// Prints the territories each named country splits into.
///
/// # Errors
///
/// Returns an error if the config or country boundaries cannot be loaded.
pub fn split(
    data_dir: &Path,
    countries: &[String],
    threshold_km: Option<f64>,
    config: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = resolve_config(config, threshold_km)?;
    let boundaries = load_countries(&DataLayout::new(data_dir).countries_file())?;
    let projection = EqualAreaProjection::world_mollweide();

    for name in countries {
        let Some(boundary) = boundaries.iter().find(|b| &b.name == name) else {
            log::warn!("Country not found in boundaries: {name}");
            continue;
        };

        let territories = split_country(
            &projection,
            &boundary.name,
            &boundary.geometry,
            config.distance_threshold_km,
        )?;

        println!(
            "{name}: {} part(s) -> {} territory(ies) at {} km",
            boundary.geometry.0.len(),
            territories.len(),
            config.distance_threshold_km
        );
        for territory in &territories {
            println!(
                "  {:<40} {:>12.0} km²  ({:.2}, {:.2})",
                territory.name,
                territory.area_km2,
                territory.centroid.x(),
                territory.centroid.y()
            );
        }
        println!();
    }

    Ok(())
}

/// Prints the effective country-name lookup table.
///
/// # Errors
///
/// Returns an error if the override file cannot be loaded.
pub fn names(name_mapping: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    let mapping = load_name_mapping(name_mapping)?;

    println!("{:<45} BOUNDARY NAME", "PROVINCE-SOURCE NAME");
    println!("{}", "-".repeat(70));
    for (from, to) in mapping.iter() {
        println!("{from:<45} {to}");
    }
    println!();
    println!("{} entries", mapping.len());

    Ok(())
}
