use geo::{Area, BooleanOps, Intersects, MultiPolygon};
use rstar::RTree;

use crate::geom::bbox::{envelope_of, PartEnvelope};

/// A polygonal region with an R-tree over its parts, used as a cheap
/// intersects predicate before exact boolean operations.
#[derive(Debug, Clone)]
pub struct PreparedPolygon {
    shape: MultiPolygon<f64>,
    rtree: RTree<PartEnvelope>,
    area: f64,
}

impl PreparedPolygon {
    /// Index the parts of `shape`.
    pub fn new(shape: MultiPolygon<f64>) -> Self {
        let rtree = RTree::bulk_load(
            shape.0.iter().enumerate()
                .filter_map(|(i, polygon)| PartEnvelope::of(i, polygon))
                .collect()
        );
        let area = shape.unsigned_area();
        Self { shape, rtree, area }
    }

    /// Union a set of shapes into one prepared region.
    /// Overlapping or identical parts are merged, so their area is counted once.
    pub fn union_of(shapes: impl IntoIterator<Item = MultiPolygon<f64>>) -> Self {
        let unioned = shapes.into_iter()
            .reduce(|a, b| a.union(&b))
            .unwrap_or_else(|| MultiPolygon(Vec::new()));
        Self::new(unioned)
    }

    #[inline] pub fn shape(&self) -> &MultiPolygon<f64> { &self.shape }

    /// Planar area of the region, in squared CRS units.
    #[inline] pub fn area(&self) -> f64 { self.area }

    #[inline] pub fn is_empty(&self) -> bool { self.shape.0.is_empty() }

    /// True if `other` shares at least one point with this region.
    /// Rejects on bounding boxes first, then tests only the candidate parts.
    pub fn intersects(&self, other: &MultiPolygon<f64>) -> bool {
        let Some(envelope) = envelope_of(other) else { return false };
        self.rtree.locate_in_envelope_intersecting(&envelope)
            .any(|cand| self.shape.0[cand.part()].intersects(other))
    }

    /// Exact intersection area with `other`.
    pub fn intersection_area(&self, other: &MultiPolygon<f64>) -> f64 {
        self.shape.intersection(other).unsigned_area()
    }
}
