//! Names for distant territories.
//!
//! A distant territory starts with a coordinate-bucket placeholder such as
//! `"France - Pacific 17°S"`. Once provinces are assigned it takes the name
//! of its largest province, which is always more recognizable.

use geo::Point;

/// Separator between the country name and the territory suffix.
pub const TERRITORY_SEPARATOR: &str = " - ";

/// Coarse ocean-basin label for a centroid, e.g. `"Pacific 12°S"`.
#[must_use]
pub fn placeholder_name(centroid: Point<f64>) -> String {
    let (lon, lat) = (centroid.x(), centroid.y());

    let hemisphere = if lat > 0.0 { "N" } else { "S" };

    let region = if lon < -120.0 {
        "Pacific"
    } else if lon < -30.0 {
        "Atlantic"
    } else if lon < 60.0 {
        "Atlantic/Africa"
    } else if lon < 130.0 {
        "Indian Ocean"
    } else {
        "Pacific"
    };

    format!("{region} {:.0}°{hemisphere}", lat.trunc().abs())
}

/// Initial name of a distant territory of `country_name`.
#[must_use]
pub fn distant_name(country_name: &str, centroid: Point<f64>) -> String {
    format!(
        "{country_name}{TERRITORY_SEPARATOR}{}",
        placeholder_name(centroid)
    )
}

/// Country part of a split territory name (`"France - Pacific 17°S"` →
/// `"France"`), or `None` if the name has no separator.
#[must_use]
pub fn parent_name(territory_name: &str) -> Option<&str> {
    territory_name
        .split_once(TERRITORY_SEPARATOR)
        .map(|(parent, _)| parent)
}

/// Name of the largest `(name, area_km2)` entry. Ties keep the earliest.
#[must_use]
pub fn largest_province_name(provinces: &[(String, f64)]) -> Option<&str> {
    let mut best: Option<&(String, f64)> = None;

    for entry in provinces {
        match best {
            Some((_, area)) if entry.1 <= *area => {}
            _ => best = Some(entry),
        }
    }

    best.map(|(name, _)| name.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pacific_south() {
        assert_eq!(placeholder_name(Point::new(-149.4, -17.6)), "Pacific 17°S");
        assert_eq!(placeholder_name(Point::new(165.0, -12.9)), "Pacific 12°S");
    }

    #[test]
    fn basin_bands() {
        assert_eq!(placeholder_name(Point::new(-61.0, 16.2)), "Atlantic 16°N");
        assert_eq!(placeholder_name(Point::new(55.5, -21.1)), "Atlantic/Africa 21°S");
        assert_eq!(placeholder_name(Point::new(96.8, -12.2)), "Indian Ocean 12°S");
    }

    #[test]
    fn equator_counts_as_south() {
        assert_eq!(placeholder_name(Point::new(-160.0, 0.0)), "Pacific 0°S");
    }

    #[test]
    fn distant_name_carries_parent() {
        let name = distant_name("France", Point::new(-149.4, -17.6));
        assert_eq!(name, "France - Pacific 17°S");
        assert_eq!(parent_name(&name), Some("France"));
        assert_eq!(parent_name("France"), None);
    }

    #[test]
    fn largest_province_wins() {
        let provinces = vec![
            ("Wallis".to_string(), 80.0),
            ("French Polynesia".to_string(), 3500.0),
            ("Futuna".to_string(), 60.0),
        ];
        assert_eq!(largest_province_name(&provinces), Some("French Polynesia"));
    }

    #[test]
    fn largest_province_tie_keeps_first() {
        let provinces = vec![("A".to_string(), 10.0), ("B".to_string(), 10.0)];
        assert_eq!(largest_province_name(&provinces), Some("A"));
        assert_eq!(largest_province_name(&[]), None);
    }
}
