//! ESRI Shapefile reading for boundary datasets.

use std::path::{Path, PathBuf};

use geo::{Coord, LineString, MultiPolygon, Polygon};
use shapefile::{dbase::{self, FieldValue, Record}, PolygonRing, Reader, Shape};

use crate::{error::{Error, Result}, geom::Crs};

/// An opened shapefile: declared attribute fields and the CRS from its `.prj`.
#[derive(Debug, Clone)]
pub(crate) struct ShapefileLayer {
    path: PathBuf,
    crs: Crs,
    fields: Vec<String>,
}

impl ShapefileLayer {
    /// Read the `.dbf` header and `.prj` sidecar without touching any records.
    pub(crate) fn open(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(Error::InputNotFound { path: path.to_path_buf() });
        }

        let dbf_path = path.with_extension("dbf");
        let dbf = dbase::Reader::from_path(&dbf_path)
            .map_err(|e| Error::Shapefile { path: dbf_path.clone(), source: shapefile::Error::DbaseError(e) })?;
        let fields = dbf.fields().iter()
            .map(|field| field.name().to_string())
            .collect();

        Ok(Self { path: path.to_path_buf(), crs: crs_from_prj(path), fields })
    }

    #[inline] pub(crate) fn crs(&self) -> Crs { self.crs }

    #[inline] pub(crate) fn fields(&self) -> &[String] { &self.fields }

    /// Stream every record once, passing the text of `key_field` and the
    /// polygon geometry (None for non-polygonal shapes) to `visit`.
    pub(crate) fn for_each_feature(
        &self,
        key_field: &str,
        mut visit: impl FnMut(String, Option<MultiPolygon<f64>>),
    ) -> Result<()> {
        let shapefile_error = |source| Error::Shapefile { path: self.path.clone(), source };

        let mut reader = Reader::from_path(&self.path).map_err(shapefile_error)?;
        for result in reader.iter_shapes_and_records() {
            let (shape, record) = result.map_err(shapefile_error)?;
            visit(record_text(&record, key_field), shape_to_multipolygon(shape));
        }

        Ok(())
    }
}

/// Resolve the CRS from the `.prj` sidecar, defaulting to WGS84 when absent.
fn crs_from_prj(path: &Path) -> Crs {
    match std::fs::read_to_string(path.with_extension("prj")) {
        Ok(wkt) => Crs::from_wkt(&wkt),
        Err(_) => {
            log::warn!("[io::shp] no .prj next to {}; assuming {}", path.display(), Crs::WGS84);
            Crs::WGS84
        }
    }
}

/// Render an attribute value as text; integral numbers drop their fraction.
fn record_text(record: &Record, field: &str) -> String {
    fn number(n: f64) -> String {
        if n.fract() == 0.0 && n.abs() < 1e15 { format!("{n:.0}") } else { n.to_string() }
    }

    match record.get(field) {
        Some(FieldValue::Character(Some(s))) => s.trim().to_string(),
        Some(FieldValue::Numeric(Some(n))) => number(*n),
        Some(FieldValue::Float(Some(f))) => number(f64::from(*f)),
        Some(FieldValue::Double(d)) => number(*d),
        Some(FieldValue::Integer(i)) => i.to_string(),
        _ => String::new(),
    }
}

/// Coerce a polygonal shape into an owned multipolygon; other shapes yield None.
fn shape_to_multipolygon(shape: Shape) -> Option<MultiPolygon<f64>> {
    match shape {
        Shape::Polygon(polygon) => Some(rings_to_multipolygon(
            polygon.rings().iter().map(|ring| (is_outer(ring), ring.points().iter().map(|p| Coord { x: p.x, y: p.y })))
        )),
        Shape::PolygonM(polygon) => Some(rings_to_multipolygon(
            polygon.rings().iter().map(|ring| (is_outer(ring), ring.points().iter().map(|p| Coord { x: p.x, y: p.y })))
        )),
        Shape::PolygonZ(polygon) => Some(rings_to_multipolygon(
            polygon.rings().iter().map(|ring| (is_outer(ring), ring.points().iter().map(|p| Coord { x: p.x, y: p.y })))
        )),
        _ => None,
    }
}

#[inline]
fn is_outer<P>(ring: &PolygonRing<P>) -> bool {
    matches!(ring, PolygonRing::Outer(_))
}

/// Group rings into polygons: each exterior with its following holes
/// (Shapefile stores rings in this order).
fn rings_to_multipolygon<I>(rings: impl Iterator<Item = (bool, I)>) -> MultiPolygon<f64>
where
    I: Iterator<Item = Coord<f64>>,
{
    let mut polys: Vec<Polygon<f64>> = Vec::new();
    let mut current_exterior: Option<LineString<f64>> = None;
    let mut current_holes: Vec<LineString<f64>> = Vec::new();

    for (outer, coords) in rings {
        let mut coords: Vec<Coord<f64>> = coords.collect();
        if let (Some(&first), Some(&last)) = (coords.first(), coords.last()) {
            if first != last { coords.push(first) }
        }
        let ring = LineString(coords);

        if outer {
            // flush previous polygon
            if let Some(exterior) = current_exterior.take() {
                polys.push(Polygon::new(exterior, std::mem::take(&mut current_holes)));
            }
            current_exterior = Some(ring);
        } else {
            current_holes.push(ring);
        }
    }
    if let Some(exterior) = current_exterior {
        polys.push(Polygon::new(exterior, current_holes));
    }

    MultiPolygon(polys)
}
