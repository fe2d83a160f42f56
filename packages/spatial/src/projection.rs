//! World Mollweide equal-area projection.
//!
//! Areas, centroids, and distances are all computed in projected metres so
//! that a fixed kilometre threshold means the same thing at every latitude.
//! The projection is a plain value with precomputed constants: build it once
//! and pass it (or a copy) to every component that measures geometry.

use std::f64::consts::{FRAC_PI_2, PI, SQRT_2};

use geo::{Area as _, Centroid as _, Coord, CoordsIter as _, MapCoords as _, MultiPolygon, Point};

use crate::GeometryError;

/// Semi-major axis of WGS84, used as the sphere radius (matches `ESRI:54009`).
pub const EARTH_RADIUS_M: f64 = 6_378_137.0;

const MAX_ITERATIONS: usize = 30;
const TOLERANCE: f64 = 1e-12;

/// Forward/inverse Mollweide transform plus the measurements built on it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EqualAreaProjection {
    central_meridian: f64,
    x_scale: f64,
    y_scale: f64,
}

impl Default for EqualAreaProjection {
    fn default() -> Self {
        Self::world_mollweide()
    }
}

impl EqualAreaProjection {
    /// World Mollweide centred on the prime meridian.
    #[must_use]
    pub fn world_mollweide() -> Self {
        Self::new(EARTH_RADIUS_M, 0.0)
    }

    /// Mollweide on a sphere of `radius_m` centred on `central_meridian_deg`.
    #[must_use]
    pub fn new(radius_m: f64, central_meridian_deg: f64) -> Self {
        Self {
            central_meridian: central_meridian_deg.to_radians(),
            x_scale: radius_m * 2.0 * SQRT_2 / PI,
            y_scale: radius_m * SQRT_2,
        }
    }

    /// Projects a longitude/latitude coordinate (degrees) to metres.
    #[must_use]
    pub fn forward(&self, coord: Coord<f64>) -> Coord<f64> {
        let lambda = wrap_longitude(coord.x.to_radians() - self.central_meridian);
        let theta = auxiliary_angle(coord.y.to_radians());

        Coord {
            x: self.x_scale * lambda * theta.cos(),
            y: self.y_scale * theta.sin(),
        }
    }

    /// Maps projected metres back to longitude/latitude degrees.
    #[must_use]
    pub fn inverse(&self, coord: Coord<f64>) -> Coord<f64> {
        let theta = (coord.y / self.y_scale).clamp(-1.0, 1.0).asin();
        let phi = ((2.0 * theta + (2.0 * theta).sin()) / PI)
            .clamp(-1.0, 1.0)
            .asin();

        let cos_theta = theta.cos();
        let lambda = if cos_theta.abs() < TOLERANCE {
            self.central_meridian
        } else {
            self.central_meridian + coord.x / (self.x_scale * cos_theta)
        };

        Coord {
            x: lambda.to_degrees(),
            y: phi.to_degrees(),
        }
    }

    /// Projects every coordinate of `geometry`.
    ///
    /// # Errors
    ///
    /// Returns [`GeometryError`] if the geometry is empty or has a
    /// non-finite coordinate.
    pub fn project(&self, geometry: &MultiPolygon<f64>) -> Result<MultiPolygon<f64>, GeometryError> {
        validate(geometry)?;
        Ok(geometry.map_coords(|coord| self.forward(coord)))
    }

    /// Area of `geometry` in square kilometres.
    ///
    /// # Errors
    ///
    /// Returns [`GeometryError`] if the geometry cannot be projected.
    pub fn area_km2(&self, geometry: &MultiPolygon<f64>) -> Result<f64, GeometryError> {
        Ok(self.project(geometry)?.unsigned_area() / 1_000_000.0)
    }

    /// Area-weighted centroid of `geometry`, computed in projected space and
    /// returned as longitude/latitude.
    ///
    /// # Errors
    ///
    /// Returns [`GeometryError`] if the geometry cannot be projected or has
    /// no centroid.
    pub fn centroid(&self, geometry: &MultiPolygon<f64>) -> Result<Point<f64>, GeometryError> {
        let centroid = self
            .project(geometry)?
            .centroid()
            .ok_or(GeometryError::NoCentroid)?;

        Ok(Point::from(self.inverse(centroid.0)))
    }

    /// Planar distance between two longitude/latitude points, in kilometres.
    #[must_use]
    pub fn distance_km(&self, a: Point<f64>, b: Point<f64>) -> f64 {
        let a = self.forward(a.0);
        let b = self.forward(b.0);
        (a.x - b.x).hypot(a.y - b.y) / 1000.0
    }
}

/// Solves `2θ + sin 2θ = π sin φ` for the auxiliary angle `θ`.
fn auxiliary_angle(phi: f64) -> f64 {
    if FRAC_PI_2 - phi.abs() < TOLERANCE {
        return phi.signum() * FRAC_PI_2;
    }

    let target = PI * phi.sin();
    let mut two_theta = phi;

    for _ in 0..MAX_ITERATIONS {
        let step = (two_theta + two_theta.sin() - target) / (1.0 + two_theta.cos());
        two_theta -= step;
        if step.abs() < TOLERANCE {
            return two_theta / 2.0;
        }
    }

    log::debug!("Mollweide iteration did not converge for latitude {phi} rad");
    two_theta / 2.0
}

fn wrap_longitude(lambda: f64) -> f64 {
    if lambda > PI {
        lambda - 2.0 * PI
    } else if lambda < -PI {
        lambda + 2.0 * PI
    } else {
        lambda
    }
}

fn validate(geometry: &MultiPolygon<f64>) -> Result<(), GeometryError> {
    if geometry.0.iter().all(|polygon| polygon.exterior().0.is_empty()) {
        return Err(GeometryError::Empty);
    }

    if geometry
        .coords_iter()
        .any(|coord| !coord.x.is_finite() || !coord.y.is_finite())
    {
        return Err(GeometryError::NonFiniteCoordinate);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use geo::{Rect, coord};

    use super::*;

    fn square(min_lon: f64, min_lat: f64, size: f64) -> MultiPolygon<f64> {
        MultiPolygon(vec![
            Rect::new(
                coord! { x: min_lon, y: min_lat },
                coord! { x: min_lon + size, y: min_lat + size },
            )
            .to_polygon(),
        ])
    }

    #[test]
    fn forward_inverse_roundtrip() {
        let projection = EqualAreaProjection::world_mollweide();
        for &(lon, lat) in &[(0.0, 0.0), (2.35, 48.85), (-149.5, -17.5), (170.0, -45.0)] {
            let back = projection.inverse(projection.forward(coord! { x: lon, y: lat }));
            assert!((back.x - lon).abs() < 1e-6, "lon {lon} came back as {}", back.x);
            assert!((back.y - lat).abs() < 1e-6, "lat {lat} came back as {}", back.y);
        }
    }

    #[test]
    fn poles_project_to_axis_ends() {
        let projection = EqualAreaProjection::world_mollweide();
        let north = projection.forward(coord! { x: 45.0, y: 90.0 });
        assert!(north.x.abs() < 1e-6);
        assert!((north.y - EARTH_RADIUS_M * SQRT_2).abs() < 1e-3);
    }

    #[test]
    fn one_degree_square_at_equator() {
        let projection = EqualAreaProjection::world_mollweide();
        let area = projection.area_km2(&square(0.0, 0.0, 1.0)).unwrap();
        // R^2 * dLon * (sin(1deg) - sin(0)) on the projection sphere.
        let expected = 12_391.0;
        assert!(
            (area - expected).abs() / expected < 0.01,
            "expected ~{expected} km2, got {area}"
        );
    }

    #[test]
    fn area_shrinks_toward_the_poles() {
        let projection = EqualAreaProjection::world_mollweide();
        let equator = projection.area_km2(&square(10.0, 0.0, 1.0)).unwrap();
        let north = projection.area_km2(&square(10.0, 60.0, 1.0)).unwrap();
        let ratio = north / equator;
        // cos(60.5deg) relative to cos(0.5deg)
        assert!((ratio - 0.4924).abs() < 0.01, "ratio was {ratio}");
    }

    #[test]
    fn centroid_of_square() {
        let projection = EqualAreaProjection::world_mollweide();
        let centroid = projection.centroid(&square(10.0, 10.0, 2.0)).unwrap();
        assert!((centroid.x() - 11.0).abs() < 0.05);
        assert!((centroid.y() - 11.0).abs() < 0.05);
    }

    #[test]
    fn distance_along_equator() {
        let projection = EqualAreaProjection::world_mollweide();
        let distance = projection.distance_km(Point::new(0.0, 0.0), Point::new(30.0, 0.0));
        assert!((distance - 3006.7).abs() < 1.0, "distance was {distance}");
        assert!(projection.distance_km(Point::new(5.0, 5.0), Point::new(5.0, 5.0)).abs() < 1e-9);
    }

    #[test]
    fn empty_geometry_is_an_error() {
        let projection = EqualAreaProjection::world_mollweide();
        assert_eq!(
            projection.area_km2(&MultiPolygon(vec![])),
            Err(GeometryError::Empty)
        );
        assert_eq!(
            projection.centroid(&MultiPolygon(vec![])),
            Err(GeometryError::Empty)
        );
    }

    #[test]
    fn non_finite_coordinate_is_an_error() {
        let projection = EqualAreaProjection::world_mollweide();
        let geometry = square(f64::NAN, 0.0, 1.0);
        assert_eq!(
            projection.area_km2(&geometry),
            Err(GeometryError::NonFiniteCoordinate)
        );
    }
}
