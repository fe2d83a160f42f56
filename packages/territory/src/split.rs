//! Splits a country boundary into a main territory and distant clusters.
//!
//! Parts are ordered by area (largest first, stable), so the anchor is the
//! largest part and clustering is reproducible. Parts whose centroid lies
//! within the threshold of the anchor centroid join the main territory. The
//! rest are grouped by single-link clustering: each joins the first group
//! holding any member within the threshold, or starts a new group.

use climate_map_spatial::{EqualAreaProjection, GeometryError};
use climate_map_territory_models::{Territory, TerritoryKind};
use geo::{MultiPolygon, Point, Polygon};

use crate::naming::distant_name;

/// One polygon of a country with its measurements.
struct Part {
    polygon: Polygon<f64>,
    area_km2: f64,
    centroid: Point<f64>,
}

/// Splits `geometry` into `[main, distant_1, distant_2, ...]`.
///
/// A single-part geometry comes back unchanged as the main territory.
/// Individual parts that cannot be measured are skipped with a warning.
///
/// # Errors
///
/// Returns [`GeometryError`] if the geometry is empty or no part can be
/// measured.
pub fn split_country(
    projection: &EqualAreaProjection,
    country_name: &str,
    geometry: &MultiPolygon<f64>,
    threshold_km: f64,
) -> Result<Vec<Territory>, GeometryError> {
    if geometry.0.len() <= 1 {
        return Ok(vec![Territory {
            name: country_name.to_string(),
            parent_country_name: country_name.to_string(),
            geometry: geometry.clone(),
            area_km2: projection.area_km2(geometry)?,
            centroid: projection.centroid(geometry)?,
            kind: TerritoryKind::Main,
        }]);
    }

    let mut parts = measure_parts(projection, country_name, geometry)?;
    parts.sort_by(|a, b| b.area_km2.total_cmp(&a.area_km2));

    let mut parts = parts.into_iter();
    let Some(anchor) = parts.next() else {
        return Err(GeometryError::Empty);
    };

    let anchor_centroid = anchor.centroid;
    let mut main = vec![anchor];
    let mut distant = Vec::new();

    for part in parts {
        if projection.distance_km(anchor_centroid, part.centroid) <= threshold_km {
            main.push(part);
        } else {
            distant.push(part);
        }
    }

    let groups = cluster(projection, distant, threshold_km);

    let mut territories = Vec::with_capacity(groups.len() + 1);
    territories.push(merge(
        projection,
        country_name,
        country_name.to_string(),
        main,
        TerritoryKind::Main,
    )?);

    for group in groups {
        let centroid = group_centroid(projection, &group)?;
        territories.push(merge(
            projection,
            country_name,
            distant_name(country_name, centroid),
            group,
            TerritoryKind::Distant,
        )?);
    }

    if territories.len() > 1 {
        log::debug!(
            "Split {country_name} into {} territories: {}",
            territories.len(),
            territories
                .iter()
                .map(|t| t.name.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        );
    }

    Ok(territories)
}

fn measure_parts(
    projection: &EqualAreaProjection,
    country_name: &str,
    geometry: &MultiPolygon<f64>,
) -> Result<Vec<Part>, GeometryError> {
    let mut parts = Vec::with_capacity(geometry.0.len());
    let mut last_error = GeometryError::Empty;

    for polygon in &geometry.0 {
        let single = MultiPolygon(vec![polygon.clone()]);
        let measured = projection
            .area_km2(&single)
            .and_then(|area_km2| Ok((area_km2, projection.centroid(&single)?)));

        match measured {
            Ok((area_km2, centroid)) => parts.push(Part {
                polygon: polygon.clone(),
                area_km2,
                centroid,
            }),
            Err(e) => {
                log::warn!("Skipping unmeasurable part of {country_name}: {e}");
                last_error = e;
            }
        }
    }

    if parts.is_empty() {
        return Err(last_error);
    }

    Ok(parts)
}

/// Single-link clustering with first-match-wins placement.
fn cluster(projection: &EqualAreaProjection, candidates: Vec<Part>, threshold_km: f64) -> Vec<Vec<Part>> {
    let mut groups: Vec<Vec<Part>> = Vec::new();

    for part in candidates {
        let home = groups.iter().position(|group| {
            group
                .iter()
                .any(|member| projection.distance_km(member.centroid, part.centroid) <= threshold_km)
        });

        match home {
            Some(index) => groups[index].push(part),
            None => groups.push(vec![part]),
        }
    }

    groups
}

fn group_centroid(projection: &EqualAreaProjection, group: &[Part]) -> Result<Point<f64>, GeometryError> {
    match group {
        [single] => Ok(single.centroid),
        _ => projection.centroid(&MultiPolygon(
            group.iter().map(|part| part.polygon.clone()).collect(),
        )),
    }
}

fn merge(
    projection: &EqualAreaProjection,
    country_name: &str,
    name: String,
    parts: Vec<Part>,
    kind: TerritoryKind,
) -> Result<Territory, GeometryError> {
    let area_km2 = parts.iter().map(|part| part.area_km2).sum();
    let centroid = group_centroid(projection, &parts)?;

    Ok(Territory {
        name,
        parent_country_name: country_name.to_string(),
        geometry: MultiPolygon(parts.into_iter().map(|part| part.polygon).collect()),
        area_km2,
        centroid,
        kind,
    })
}
