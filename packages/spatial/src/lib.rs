#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Equal-area measurement and envelope indexing for territory matching.
//!
//! Provides the [`EqualAreaProjection`] service used for every area,
//! centroid, and distance computation, an R-tree [`EnvelopeIndex`] that
//! narrows province-to-territory intersection tests to geometries whose
//! bounding boxes overlap, and helpers for turning `GeoJSON` geometries into
//! [`MultiPolygon`]s.

pub mod projection;

pub use projection::EqualAreaProjection;

use std::collections::BTreeSet;

use geo::{BoundingRect as _, MultiPolygon};
use rstar::{AABB, RTree, RTreeObject};
use thiserror::Error;

/// Errors raised when a geometry cannot be measured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum GeometryError {
    /// The geometry has no polygons or only empty rings.
    #[error("geometry is empty")]
    Empty,

    /// A coordinate is NaN or infinite.
    #[error("geometry has a non-finite coordinate")]
    NonFiniteCoordinate,

    /// No centroid could be computed.
    #[error("geometry has no centroid")]
    NoCentroid,
}

/// One indexed geometry envelope with its caller-assigned slot.
struct EnvelopeEntry {
    slot: usize,
    envelope: AABB<[f64; 2]>,
}

impl RTreeObject for EnvelopeEntry {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        self.envelope
    }
}

/// R-tree over geometry bounding boxes.
///
/// Slots are the positions of the geometries in the iterator passed to
/// [`EnvelopeIndex::build`], so callers can keep their own `Vec` of
/// territories and use the index purely as a prefilter.
pub struct EnvelopeIndex {
    tree: RTree<EnvelopeEntry>,
}

impl EnvelopeIndex {
    /// Builds the index. Geometries without a bounding box are not indexed.
    pub fn build<'a>(geometries: impl IntoIterator<Item = &'a MultiPolygon<f64>>) -> Self {
        let entries = geometries
            .into_iter()
            .enumerate()
            .filter_map(|(slot, geometry)| {
                envelope(geometry).map(|envelope| EnvelopeEntry { slot, envelope })
            })
            .collect();

        Self {
            tree: RTree::bulk_load(entries),
        }
    }

    /// Number of indexed geometries.
    #[must_use]
    pub fn size(&self) -> usize {
        self.tree.size()
    }

    /// Slots whose envelope intersects the envelope of `geometry`.
    #[must_use]
    pub fn overlapping(&self, geometry: &MultiPolygon<f64>) -> BTreeSet<usize> {
        let Some(query) = envelope(geometry) else {
            return BTreeSet::new();
        };

        self.tree
            .locate_in_envelope_intersecting(&query)
            .map(|entry| entry.slot)
            .collect()
    }
}

/// Bounding box of a [`MultiPolygon`] as an R-tree envelope.
#[must_use]
pub fn envelope(geometry: &MultiPolygon<f64>) -> Option<AABB<[f64; 2]>> {
    geometry
        .bounding_rect()
        .map(|rect| AABB::from_corners([rect.min().x, rect.min().y], [rect.max().x, rect.max().y]))
}

/// Converts a [`geo::Geometry`] into a [`MultiPolygon`].
/// Handles both `Polygon` and `MultiPolygon`; other types yield `None`.
#[must_use]
pub fn to_multipolygon(geometry: geo::Geometry<f64>) -> Option<MultiPolygon<f64>> {
    match geometry {
        geo::Geometry::MultiPolygon(mp) => Some(mp),
        geo::Geometry::Polygon(p) => Some(MultiPolygon(vec![p])),
        _ => None,
    }
}

/// Converts a `GeoJSON` geometry object into a [`MultiPolygon`].
#[must_use]
pub fn geojson_to_multipolygon(geometry: geojson::Geometry) -> Option<MultiPolygon<f64>> {
    let geo_geom: geo::Geometry<f64> = geometry.try_into().ok()?;
    to_multipolygon(geo_geom)
}
