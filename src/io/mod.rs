//! IO module for format-specific reading and writing operations.
//!
//! - `csv` - comma-delimited indicator tables, read as text
//! - `geojson` - polygon FeatureCollections (read and write)
//! - `shp` - Shapefile boundary datasets

pub mod csv;
pub mod geojson;
pub(crate) mod shp;
