use std::{collections::HashMap, path::{Path, PathBuf}};

use ahash::RandomState;
use geo::MultiPolygon;

use crate::{
    detect::detect_key_field,
    error::{Error, Result},
    geom::Crs,
    io::{geojson::read_feature_collection, shp::ShapefileLayer},
    types::{GeographyScale, IdSet, NormalizedId},
};

/// Boundary geometry loaded once per request, keyed by normalized id.
#[derive(Debug, Clone)]
pub struct GeometryStore {
    path: PathBuf,
    scale: GeographyScale,
    crs: Crs,
    key_field: String,
    shapes: HashMap<NormalizedId, MultiPolygon<f64>, RandomState>,
    skipped: usize,
}

impl GeometryStore {
    /// Load every feature of the dataset at `path` whose id is in `requested`
    /// (all features when `requested` is empty).
    ///
    /// `.shp` files are read with their `.dbf`/`.prj` sidecars; `.geojson` and
    /// `.json` files are read whole. Features without polygonal geometry are
    /// skipped and counted.
    pub fn load(path: &Path, scale: GeographyScale, requested: &IdSet) -> Result<Self> {
        if !path.exists() {
            return Err(Error::InputNotFound { path: path.to_path_buf() });
        }

        let extension = path.extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();

        let mut store = Self {
            path: path.to_path_buf(),
            scale,
            crs: Crs::default(),
            key_field: String::new(),
            shapes: HashMap::default(),
            skipped: 0,
        };

        match extension.as_str() {
            "geojson" | "json" => store.load_geojson(requested)?,
            _ => store.load_shapefile(requested)?,
        }

        if store.skipped > 0 {
            log::warn!("[store] {}: skipped {} features without polygon geometry", path.display(), store.skipped);
        }
        log::info!(
            "[store] {}: cached {} {} geometries by '{}' ({})",
            path.display(), store.shapes.len(), scale, store.key_field, store.crs,
        );

        Ok(store)
    }

    fn load_shapefile(&mut self, requested: &IdSet) -> Result<()> {
        let layer = ShapefileLayer::open(&self.path)?;
        self.crs = layer.crs();
        self.key_field = self.key_field_of(layer.fields())?;

        let scale = self.scale;
        let (shapes, skipped) = (&mut self.shapes, &mut self.skipped);
        layer.for_each_feature(&self.key_field, |raw, geometry| {
            let id = NormalizedId::normalize(&raw, scale);
            if id.is_empty() || !(requested.is_empty() || requested.contains(&id)) { return }
            match geometry {
                Some(shape) => { shapes.insert(id, shape); }
                None => *skipped += 1,
            }
        })
    }

    fn load_geojson(&mut self, requested: &IdSet) -> Result<()> {
        let collection = read_feature_collection(&self.path)?;
        self.crs = collection.crs;

        let fields = collection.features.first()
            .map(|feature| feature.properties.keys().cloned().collect::<Vec<_>>())
            .unwrap_or_default();
        self.key_field = self.key_field_of(&fields)?;

        for feature in &collection.features {
            let id = NormalizedId::normalize(&feature.property_text(&self.key_field).unwrap_or_default(), self.scale);
            if id.is_empty() || !(requested.is_empty() || requested.contains(&id)) { continue }
            match feature.multipolygon() {
                Ok(shape) => { self.shapes.insert(id, shape); }
                Err(e) => {
                    log::debug!("[store] {}: feature {}: {}", self.path.display(), id, e);
                    self.skipped += 1;
                }
            }
        }

        Ok(())
    }

    fn key_field_of(&self, fields: &[String]) -> Result<String> {
        detect_key_field(fields, self.scale).ok_or_else(|| Error::KeyFieldNotFound {
            path: self.path.clone(),
            scale: self.scale,
            expected: self.scale.boundary_key_candidates().join(", "),
            available: fields.join(", "),
        })
    }

    #[inline] pub fn path(&self) -> &Path { &self.path }

    #[inline] pub fn scale(&self) -> GeographyScale { self.scale }

    /// Native CRS of the source dataset.
    #[inline] pub fn crs(&self) -> Crs { self.crs }

    /// Field the identifiers were read from.
    #[inline] pub fn key_field(&self) -> &str { &self.key_field }

    /// Number of matching features dropped for lacking polygon geometry.
    #[inline] pub fn skipped(&self) -> usize { self.skipped }

    #[inline] pub fn len(&self) -> usize { self.shapes.len() }

    #[inline] pub fn is_empty(&self) -> bool { self.shapes.is_empty() }

    /// Geometry cached for `id`.
    #[inline]
    pub fn get(&self, id: &NormalizedId) -> Option<&MultiPolygon<f64>> {
        self.shapes.get(id)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use tempfile::TempDir;

    use super::*;

    fn write_boundaries(dir: &TempDir) -> PathBuf {
        let path = dir.path().join("zones.geojson");
        let square = |x: f64| json!({ "type": "Polygon", "coordinates": [[[x, 0.0], [x + 1.0, 0.0], [x + 1.0, 1.0], [x, 1.0], [x, 0.0]]] });
        let collection = json!({
            "type": "FeatureCollection",
            "crs": { "type": "name", "properties": { "name": "urn:ogc:def:crs:EPSG::7844" } },
            "features": [
                { "type": "Feature", "properties": { "OBJECTID": 1, "DZN_CODE21": "206-1" }, "geometry": square(0.0) },
                { "type": "Feature", "properties": { "OBJECTID": 2, "DZN_CODE21": 2062 }, "geometry": square(1.0) },
                { "type": "Feature", "properties": { "OBJECTID": 3, "DZN_CODE21": "2063" }, "geometry": { "type": "Point", "coordinates": [0, 0] } },
                { "type": "Feature", "properties": { "OBJECTID": 4, "DZN_CODE21": "2064" }, "geometry": null },
            ]
        });
        std::fs::write(&path, serde_json::to_vec(&collection).unwrap()).unwrap();
        path
    }

    #[test]
    fn loads_all_features_when_nothing_requested() {
        let dir = TempDir::new().unwrap();
        let store = GeometryStore::load(&write_boundaries(&dir), GeographyScale::DestinationZone, &IdSet::default()).unwrap();

        assert_eq!(store.crs(), Crs::GDA2020);
        assert_eq!(store.key_field(), "DZN_CODE21");
        assert_eq!(store.len(), 2);
        assert_eq!(store.skipped(), 2);
        assert!(store.get(&NormalizedId::normalize("2061", GeographyScale::DestinationZone)).is_some());
    }

    #[test]
    fn filters_to_requested_ids() {
        let dir = TempDir::new().unwrap();
        let requested: IdSet = [NormalizedId::normalize("2062", GeographyScale::DestinationZone)].into_iter().collect();
        let store = GeometryStore::load(&write_boundaries(&dir), GeographyScale::DestinationZone, &requested).unwrap();

        assert_eq!(store.len(), 1);
        assert_eq!(store.skipped(), 0);
    }

    fn write_sa1_shapefile(dir: &TempDir) -> PathBuf {
        use shapefile::{dbase::{FieldValue, Record, TableWriterBuilder}, Point, Polygon, PolygonRing, Writer};

        let path = dir.path().join("sa1.shp");
        let table = TableWriterBuilder::new()
            .add_character_field("LABEL".try_into().unwrap(), 16)
            .add_numeric_field("SA1_CODE21".try_into().unwrap(), 11, 0);
        let square = |x: f64| Polygon::new(PolygonRing::Outer(vec![
            Point::new(x, 0.0), Point::new(x, 1.0), Point::new(x + 1.0, 1.0), Point::new(x + 1.0, 0.0), Point::new(x, 0.0),
        ]));

        let mut writer = Writer::from_path(&path, table).unwrap();
        for (x, label, code) in [(0.0, "north", 20601110102.0), (1.0, "south", 2060111.0)] {
            let mut record = Record::default();
            record.insert("LABEL".to_string(), FieldValue::Character(Some(label.to_string())));
            record.insert("SA1_CODE21".to_string(), FieldValue::Numeric(Some(code)));
            writer.write_shape_and_record(&square(x), &record).unwrap();
        }
        drop(writer);

        std::fs::write(
            path.with_extension("prj"),
            r#"GEOGCS["GDA2020",DATUM["GDA2020",SPHEROID["GRS_1980",6378137.0,298.257222101]],PRIMEM["Greenwich",0.0],UNIT["Degree",0.0174532925199433]]"#,
        ).unwrap();
        path
    }

    #[test]
    fn shapefile_keys_numeric_codes_and_reads_prj() {
        let dir = TempDir::new().unwrap();
        let path = write_sa1_shapefile(&dir);
        let store = GeometryStore::load(&path, GeographyScale::Sa1, &IdSet::default()).unwrap();

        assert_eq!(store.key_field(), "SA1_CODE21");
        assert_eq!(store.crs(), Crs::GDA2020);
        assert_eq!(store.len(), 2);
        assert!(store.get(&NormalizedId::normalize("20601110102", GeographyScale::Sa1)).is_some());
        assert!(store.get(&NormalizedId::normalize("00002060111", GeographyScale::Sa1)).is_some());

        let requested: IdSet = [NormalizedId::normalize("2060111", GeographyScale::Sa1)].into_iter().collect();
        let filtered = GeometryStore::load(&path, GeographyScale::Sa1, &requested).unwrap();
        assert_eq!(filtered.len(), 1);
        let shape = filtered.get(&NormalizedId::normalize("2060111", GeographyScale::Sa1)).unwrap();
        assert!((geo::Area::unsigned_area(shape) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn missing_key_field_is_reported() {
        let dir = TempDir::new().unwrap();
        let err = GeometryStore::load(&write_boundaries(&dir), GeographyScale::MeshBlock, &IdSet::default()).unwrap_err();
        assert!(matches!(err, Error::KeyFieldNotFound { .. }));
    }

    #[test]
    fn missing_dataset_is_reported() {
        let err = GeometryStore::load(Path::new("/nonexistent/zones.shp"), GeographyScale::Sa1, &IdSet::default()).unwrap_err();
        assert!(matches!(err, Error::InputNotFound { .. }));
    }
}
