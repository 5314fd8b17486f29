//! Join attribute rows to cached boundary geometry.

use std::path::Path;

use geo::MultiPolygon;
use serde_json::{json, Map, Value};

use crate::{
    error::{Error, Result},
    geom::Crs,
    indicator::DerivedIndicator,
    io::geojson::{multipolygon_to_geojson, write_feature_collection},
    store::GeometryStore,
    table::AttributeTable,
    types::{IdSet, NormalizedId},
};

/// A single output property value.
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyValue {
    Text(String),
    Number(f64),
}

impl PropertyValue {
    fn to_json(&self) -> Value {
        match self {
            PropertyValue::Text(s) => Value::String(s.clone()),
            PropertyValue::Number(n) => serde_json::Number::from_f64(*n).map_or(Value::Null, Value::Number),
        }
    }
}

/// Property keys shared by every output feature: the id key, then the
/// attribute columns, then the computed columns.
#[derive(Debug, Clone, PartialEq)]
pub struct OutputSchema {
    id_key: String,
    attributes: Vec<String>,
    computed: Vec<DerivedIndicator>,
}

impl OutputSchema {
    /// Schema for `table` with optional computed columns.
    /// Attribute columns keep header order; a column named like the id key
    /// is folded into the id.
    pub fn new(table: &AttributeTable, computed: impl IntoIterator<Item = DerivedIndicator>) -> Self {
        let id_key = table.scale().output_id_key().to_string();
        let mut attributes: Vec<String> = Vec::with_capacity(table.columns().len());
        for column in table.columns() {
            if *column != id_key && !attributes.contains(column) {
                attributes.push(column.clone());
            }
        }
        Self { id_key, attributes, computed: computed.into_iter().collect() }
    }

    #[inline] pub fn id_key(&self) -> &str { &self.id_key }

    #[inline] pub fn attributes(&self) -> &[String] { &self.attributes }

    #[inline] pub fn computed(&self) -> &[DerivedIndicator] { &self.computed }

    /// Every property key in output order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.id_key.as_str())
            .chain(self.attributes.iter().map(String::as_str))
            .chain(self.computed.iter().map(|d| -> &str { d.column_name() }))
    }

    /// Number of values stored per feature (excludes the id).
    #[inline] pub fn width(&self) -> usize { self.attributes.len() + self.computed.len() }
}

/// A joined feature; `values` are aligned to the schema's attributes then computed columns.
#[derive(Debug, Clone)]
pub struct OutputFeature {
    pub id: NormalizedId,
    pub geometry: MultiPolygon<f64>,
    pub values: Vec<Option<PropertyValue>>,
}

impl OutputFeature {
    /// Render as a GeoJSON Feature; absent values are written as "".
    pub fn to_geojson(&self, schema: &OutputSchema) -> Value {
        let mut properties = Map::new();
        properties.insert(schema.id_key.clone(), Value::String(self.id.to_string()));
        for (key, value) in schema.keys().skip(1).zip(&self.values) {
            properties.insert(
                key.to_string(),
                value.as_ref().map_or_else(|| Value::String(String::new()), PropertyValue::to_json),
            );
        }

        json!({
            "type": "Feature",
            "properties": properties,
            "geometry": multipolygon_to_geojson(&self.geometry),
        })
    }
}

/// Result of a join: the schema, the features, and the boundary CRS they are in.
#[derive(Debug, Clone)]
pub struct JoinedFeatures {
    pub schema: OutputSchema,
    pub features: Vec<OutputFeature>,
    pub crs: Crs,
}

impl JoinedFeatures {
    #[inline] pub fn len(&self) -> usize { self.features.len() }

    #[inline] pub fn is_empty(&self) -> bool { self.features.is_empty() }

    /// Write as a GeoJSON FeatureCollection in the boundary CRS.
    pub fn write(&self, path: &Path) -> Result<()> {
        let features = self.features.iter()
            .map(|feature| feature.to_geojson(&self.schema))
            .collect();
        write_feature_collection(path, self.crs, features)
    }
}

/// Join `table` rows to `store` geometry for every id in `requested`
/// (every table id when `requested` is empty), computing `derived` per row.
///
/// Ids present on only one side are dropped. Fails with
/// `NoMatchingGeometry` when nothing joins.
pub fn build_features(
    table: &AttributeTable,
    store: &GeometryStore,
    requested: &IdSet,
    derived: Option<DerivedIndicator>,
) -> Result<JoinedFeatures> {
    let schema = OutputSchema::new(table, derived);

    let features = table.rows().iter()
        .filter(|row| requested.is_empty() || requested.contains(&row.id))
        .filter_map(|row| {
            let geometry = store.get(&row.id)?.clone();
            let mut values = Vec::with_capacity(schema.width());
            values.extend(schema.attributes.iter()
                .map(|column| table.cell(row, column).map(|s| PropertyValue::Text(s.to_string()))));
            values.extend(schema.computed.iter()
                .map(|indicator| Some(PropertyValue::Number(
                    indicator.compute(|column| table.cell(row, column), table.value_columns())
                ))));
            Some(OutputFeature { id: row.id.clone(), geometry, values })
        })
        .collect::<Vec<_>>();

    if features.is_empty() {
        return Err(Error::NoMatchingGeometry { path: store.path().to_path_buf(), scale: store.scale() });
    }

    log::info!(
        "[join] {} of {} rows joined to {} geometries",
        features.len(), table.len(), store.scale(),
    );

    Ok(JoinedFeatures { schema, features, crs: store.crs() })
}
