use geo::{BoundingRect, MultiPolygon, Polygon};
use rstar::{RTreeObject, AABB};

/// Envelope of one polygon part of a prepared region, indexed in its R-tree.
#[derive(Debug, Clone)]
pub(super) struct PartEnvelope {
    part: usize, // position in MultiPolygon::0
    envelope: AABB<[f64; 2]>,
}

impl PartEnvelope {
    /// None for a part without coordinates.
    pub(super) fn of(part: usize, polygon: &Polygon<f64>) -> Option<Self> {
        polygon.bounding_rect()
            .map(|rect| Self { part, envelope: AABB::from_corners(rect.min().into(), rect.max().into()) })
    }

    #[inline] pub(super) fn part(&self) -> usize { self.part }
}

impl RTreeObject for PartEnvelope {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope { self.envelope }
}

/// Envelope of a whole MultiPolygon, or None if it has no coordinates.
pub(super) fn envelope_of(shape: &MultiPolygon<f64>) -> Option<AABB<[f64; 2]>> {
    shape.bounding_rect()
        .map(|rect| AABB::from_corners(rect.min().into(), rect.max().into()))
}
