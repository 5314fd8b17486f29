use geo::{Coord, MapCoords, MultiPolygon};
use proj4rs::{proj::Proj as Proj4, transform::transform};

use crate::{error::{Error, Result}, geom::Crs};

/// Coordinate transform between two EPSG-coded reference systems.
/// Geographic systems take and return degrees in lon/lat axis order.
pub struct Reprojector {
    from: Crs,
    to: Crs,
    projs: Option<(Proj4, Proj4)>, // None when from == to
}

impl Reprojector {
    /// Build PROJ.4 transforms for `from` -> `to`.
    pub fn new(from: Crs, to: Crs) -> Result<Self> {
        if from == to {
            return Ok(Self { from, to, projs: None });
        }

        fn build(crs: Crs) -> Result<Proj4> {
            let def = crs.proj4().ok_or(Error::UnsupportedCrs { epsg: crs.epsg() })?;
            Proj4::from_proj_string(&def).map_err(|e| Error::Projection {
                from: crs.epsg(),
                to: crs.epsg(),
                message: format!("failed to build PROJ.4 '{def}': {e}"),
            })
        }

        Ok(Self { from, to, projs: Some((build(from)?, build(to)?)) })
    }

    #[inline] pub fn source(&self) -> Crs { self.from }

    #[inline] pub fn target(&self) -> Crs { self.to }

    /// Transform a single coordinate.
    pub fn project_coord(&self, coord: Coord<f64>) -> Result<Coord<f64>> {
        let Some((from, to)) = &self.projs else { return Ok(coord) };

        // Degrees -> radians in for geographic sources, radians -> degrees out for geographic targets.
        let mut point = if from.is_latlong() {
            (coord.x.to_radians(), coord.y.to_radians(), 0.0)
        } else {
            (coord.x, coord.y, 0.0)
        };

        transform(from, to, &mut point).map_err(|e| Error::Projection {
            from: self.from.epsg(),
            to: self.to.epsg(),
            message: format!("({}, {}): {e}", coord.x, coord.y),
        })?;

        if !point.0.is_finite() || !point.1.is_finite() {
            return Err(Error::Projection {
                from: self.from.epsg(),
                to: self.to.epsg(),
                message: format!("({}, {}) projected to a non-finite coordinate", coord.x, coord.y),
            });
        }

        Ok(if to.is_latlong() {
            Coord { x: point.0.to_degrees(), y: point.1.to_degrees() }
        } else {
            Coord { x: point.0, y: point.1 }
        })
    }

    /// Transform every vertex of a MultiPolygon.
    pub fn project(&self, shape: &MultiPolygon<f64>) -> Result<MultiPolygon<f64>> {
        if self.projs.is_none() { return Ok(shape.clone()) }
        shape.try_map_coords(|coord| self.project_coord(coord))
    }
}
