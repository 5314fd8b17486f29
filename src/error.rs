use std::path::PathBuf;

use thiserror::Error;

use crate::types::GeographyScale;

/// Errors raised by the join and overlay pipelines.
///
/// Every variant is terminal for the current request. Per-row numeric parse
/// failures and per-zone geometry failures never surface here; they are
/// folded into defaults or skip counts by the caller.
#[derive(Debug, Error)]
pub enum Error {
    /// A dataset, table or ids file does not exist.
    #[error("input not found: {}", path.display())]
    InputNotFound { path: PathBuf },

    /// The requested indicator / dataset name is not in the catalogue.
    #[error("unknown indicator: {name}. Valid: {valid}")]
    UnknownIndicator { name: String, valid: String },

    /// The requested scale name is not one of sa1|mb|dzn.
    #[error("unknown scale: {name}. Use one of sa1|mb|dzn")]
    UnknownScale { name: String },

    /// The overlay year is not one with a zone dataset.
    #[error("unsupported year {year}; use one of 2011, 2016, 2021")]
    UnsupportedYear { year: String },

    /// Header columns identify a different scale than the one requested.
    #[error(
        "spatial scale mismatch in {}: table appears to use '{detected}' identifiers but '{requested}' was selected",
        path.display()
    )]
    ScaleMismatch { path: PathBuf, detected: GeographyScale, requested: GeographyScale },

    /// No identifier column could be found in a table or boundary dataset.
    #[error("could not detect {scale} identifier field in {}; expected one of {expected}. Available fields: {available}", path.display())]
    KeyFieldNotFound { path: PathBuf, scale: GeographyScale, expected: String, available: String },

    /// The tabular input has a header but no rows.
    #[error("no rows read from table: {}", path.display())]
    EmptyTable { path: PathBuf },

    /// The join produced zero output features.
    #[error("no {scale} geometries in {} matched the requested identifiers", path.display())]
    NoMatchingGeometry { path: PathBuf, scale: GeographyScale },

    /// No precinct feature carries the requested name.
    #[error("precinct '{name}' not found in {}", path.display())]
    PrecinctNotFound { name: String, path: PathBuf },

    /// A geometry has zero or negative area after reprojection.
    #[error("degenerate geometry for '{name}': {reason}")]
    DegenerateGeometry { name: String, reason: String },

    /// No projection definition is known for an EPSG code.
    #[error("unsupported coordinate reference system EPSG:{epsg}")]
    UnsupportedCrs { epsg: u32 },

    /// The service was built without a search collaborator.
    #[error("indicator search is not available")]
    SearchUnavailable,

    /// A coordinate could not be transformed between reference systems.
    #[error("projection failed ({from} -> {to}): {message}")]
    Projection { from: u32, to: u32, message: String },

    /// A feature geometry could not be decoded.
    #[error("invalid geometry: {0}")]
    Geometry(String),

    #[error("I/O error on {}: {source}", path.display())]
    Io { path: PathBuf, source: std::io::Error },

    #[error("failed to read CSV {}: {source}", path.display())]
    Csv { path: PathBuf, source: polars::error::PolarsError },

    #[error("failed to read shapefile {}: {source}", path.display())]
    Shapefile { path: PathBuf, source: shapefile::Error },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io { path: path.into(), source }
    }
}
