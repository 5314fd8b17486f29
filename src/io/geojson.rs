//! GeoJSON reading and writing for polygon feature collections.

use std::{fs::File, io::{BufWriter, Write}, path::{Path, PathBuf}};

use geo::{Coord, LineString, MultiPolygon, Polygon};
use serde_json::{json, Map, Value};

use crate::{error::{Error, Result}, geom::Crs};

/// A parsed GeoJSON FeatureCollection with its declared reference system.
#[derive(Debug, Clone)]
pub struct FeatureCollection {
    pub source: PathBuf,
    pub crs: Crs,
    pub crs_name: Option<String>,
    pub features: Vec<Feature>,
}

/// A single feature; geometry is decoded lazily so one malformed feature
/// does not prevent reading the rest of the collection.
#[derive(Debug, Clone)]
pub struct Feature {
    pub properties: Map<String, Value>,
    pub geometry: Option<Value>,
}

impl Feature {
    /// Get a property as text; numbers are rendered without a trailing `.0`.
    pub fn property_text(&self, key: &str) -> Option<String> {
        self.properties.get(key).and_then(value_to_text)
    }

    /// Decode the geometry as a MultiPolygon (Polygon is promoted).
    pub fn multipolygon(&self) -> Result<MultiPolygon<f64>> {
        match &self.geometry {
            Some(geometry) => parse_geometry(geometry),
            None => Err(Error::Geometry("feature has no geometry".into())),
        }
    }
}

/// Read a FeatureCollection from `path`.
pub fn read_feature_collection(path: &Path) -> Result<FeatureCollection> {
    if !path.exists() {
        return Err(Error::InputNotFound { path: path.to_path_buf() });
    }
    let bytes = std::fs::read(path).map_err(|e| Error::io(path, e))?;
    let mut collection = read_feature_collection_bytes(&bytes)?;
    collection.source = path.to_path_buf();
    Ok(collection)
}

/// Read a FeatureCollection from GeoJSON bytes.
pub fn read_feature_collection_bytes(bytes: &[u8]) -> Result<FeatureCollection> {
    let mut value: Value = serde_json::from_slice(bytes)?;

    let crs_name = value["crs"]["properties"]["name"].as_str().map(str::to_string);
    let crs = Crs::from_name(crs_name.as_deref());

    let features = match value.get_mut("features").map(Value::take) {
        Some(Value::Array(features)) => features.into_iter()
            .map(|mut feature| Feature {
                properties: match feature.get_mut("properties").map(Value::take) {
                    Some(Value::Object(properties)) => properties,
                    _ => Map::new(),
                },
                geometry: feature.get_mut("geometry").map(Value::take).filter(|g| !g.is_null()),
            })
            .collect(),
        _ => return Err(Error::Geometry("GeoJSON has no 'features' array".into())),
    };

    Ok(FeatureCollection { source: PathBuf::from("<memory>"), crs, crs_name, features })
}

/// Write a FeatureCollection with a `crs` member naming `crs`.
pub fn write_feature_collection(path: &Path, crs: Crs, features: Vec<Value>) -> Result<()> {
    let collection = json!({
        "type": "FeatureCollection",
        "crs": { "type": "name", "properties": { "name": crs.urn() } },
        "features": features,
    });

    let file = File::create(path).map_err(|e| Error::io(path, e))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer(&mut writer, &collection)?;
    writer.flush().map_err(|e| Error::io(path, e))
}

/// Convert a MultiPolygon to a GeoJSON geometry value.
pub fn multipolygon_to_geojson(mp: &MultiPolygon<f64>) -> Value {
    fn ring(ls: &LineString<f64>) -> Vec<[f64; 2]> {
        ls.coords().map(|c| [c.x, c.y]).collect()
    }

    let polygons: Vec<Vec<Vec<[f64; 2]>>> = mp.0.iter()
        .map(|polygon| std::iter::once(ring(polygon.exterior()))
            .chain(polygon.interiors().iter().map(ring))
            .collect())
        .collect();

    json!({ "type": "MultiPolygon", "coordinates": polygons })
}

/// Parse a GeoJSON Polygon or MultiPolygon geometry.
pub(crate) fn parse_geometry(geometry: &Value) -> Result<MultiPolygon<f64>> {
    let coords = geometry["coordinates"].as_array()
        .ok_or_else(|| Error::Geometry("geometry has no coordinates array".into()))?;

    match geometry["type"].as_str() {
        Some("Polygon") => Ok(MultiPolygon(vec![parse_polygon_coords(coords)?])),
        Some("MultiPolygon") => coords.iter()
            .map(|polygon| polygon.as_array()
                .ok_or_else(|| Error::Geometry("MultiPolygon member is not an array".into()))
                .and_then(|rings| parse_polygon_coords(rings)))
            .collect::<Result<Vec<_>>>()
            .map(MultiPolygon),
        other => Err(Error::Geometry(format!("unsupported geometry type: {}", other.unwrap_or("<missing>")))),
    }
}

/// Parse polygon rings: [[exterior], [hole], ...]
fn parse_polygon_coords(rings: &[Value]) -> Result<Polygon<f64>> {
    let mut rings = rings.iter().map(|ring| ring.as_array()
        .ok_or_else(|| Error::Geometry("ring is not an array".into()))
        .and_then(|ring| parse_ring_coords(ring)));

    let exterior = rings.next()
        .ok_or_else(|| Error::Geometry("polygon is missing its exterior ring".into()))??;
    let interiors = rings.collect::<Result<Vec<_>>>()?;

    Ok(Polygon::new(exterior, interiors))
}

/// Parse a ring from [[x, y], [x, y], ...], closing it if needed.
fn parse_ring_coords(coords: &[Value]) -> Result<LineString<f64>> {
    let mut points = coords.iter()
        .map(|pair| match pair.as_array().map(Vec::as_slice) {
            Some([x, y, ..]) => match (x.as_f64(), y.as_f64()) {
                (Some(x), Some(y)) => Ok(Coord { x, y }),
                _ => Err(Error::Geometry("coordinate must be numeric".into())),
            },
            _ => Err(Error::Geometry("coordinate must have at least two values".into())),
        })
        .collect::<Result<Vec<_>>>()?;

    if let (Some(&first), Some(&last)) = (points.first(), points.last()) {
        if first != last { points.push(first) }
    }

    Ok(LineString(points))
}

/// Render a scalar JSON value as text.
fn value_to_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(match (n.as_i64(), n.as_f64()) {
            (Some(i), _) => i.to_string(),
            (None, Some(f)) if f.fract() == 0.0 && f.abs() < 1e15 => format!("{f:.0}"),
            _ => n.to_string(),
        }),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}
