#![doc = "Arealink public API"]
mod config;
mod detect;
mod error;
mod geom;
mod indicator;
mod io;
mod join;
mod overlay;
mod service;
mod store;
mod table;
mod types;

#[doc(inline)]
pub use error::{Error, Result};

#[doc(inline)]
pub use types::{GeographyScale, IdSet, NormalizedId};

#[doc(inline)]
pub use geom::{Crs, PreparedPolygon, Reprojector};

#[doc(inline)]
pub use detect::{detect_id_column, detect_key_field, detect_scale};

#[doc(inline)]
pub use indicator::{parse_number, specialisation_index, DerivedIndicator, Indicator, INDUSTRY_COLUMNS};

#[doc(inline)]
pub use io::{csv::{read_table, read_table_str, RawTable}, geojson::{read_feature_collection, read_feature_collection_bytes, Feature, FeatureCollection}};

#[doc(inline)]
pub use table::{AttributeRow, AttributeTable};

#[doc(inline)]
pub use store::GeometryStore;

#[doc(inline)]
pub use join::{build_features, JoinedFeatures, OutputFeature, OutputSchema, PropertyValue};

#[doc(inline)]
pub use overlay::{overlay, OverlayOptions, OverlayRequest, OverlayResponse, OverlayYear, Precinct, ZoneIntersection, ZoneOutcome, PRECINCTS_FILE};

#[doc(inline)]
pub use config::DataConfig;

#[doc(inline)]
pub use service::{parse_target_ids, GenerateOutput, GenerateRequest, IndicatorSearch, RankedIndicator, Service, TargetIds};
