use std::path::{Path, PathBuf};

use crate::{
    error::{Error, Result},
    indicator::Indicator,
    overlay::{OverlayYear, PRECINCTS_FILE},
    types::GeographyScale,
};

/// Directories the service reads inputs from and writes outputs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataConfig {
    /// Boundary datasets and bundled indicator tables.
    pub data_dir: PathBuf,
    /// Precinct and zone-jobs GeoJSON for the overlay.
    pub overlay_dir: PathBuf,
    /// Default destination of generated GeoJSON.
    pub out_dir: PathBuf,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./data"),
            overlay_dir: PathBuf::from("./data"),
            out_dir: std::env::temp_dir(),
        }
    }
}

impl DataConfig {
    /// Use `data_dir` for both boundary and overlay inputs.
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        let data_dir = data_dir.into();
        Self { overlay_dir: data_dir.clone(), data_dir, ..Self::default() }
    }

    /// Defaults overridden by `FILTER_DATA_DIR`, `FILTER_OVERLAY_DIR` and `FILTER_OUT_DIR`.
    pub fn from_env() -> Self {
        let var = |key: &str| std::env::var_os(key).filter(|v| !v.is_empty()).map(PathBuf::from);
        let defaults = Self::default();
        Self {
            data_dir: var("FILTER_DATA_DIR").unwrap_or(defaults.data_dir),
            overlay_dir: var("FILTER_OVERLAY_DIR").unwrap_or(defaults.overlay_dir),
            out_dir: var("FILTER_OUT_DIR").unwrap_or(defaults.out_dir),
        }
    }

    pub fn with_overlay_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.overlay_dir = dir.into();
        self
    }

    pub fn with_out_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.out_dir = dir.into();
        self
    }

    /// First existing boundary file for `scale`; `InputNotFound` names the preferred one.
    pub fn boundary_path(&self, scale: GeographyScale) -> Result<PathBuf> {
        let candidates = scale.boundary_files().iter()
            .map(|name| self.data_dir.join(name))
            .collect::<Vec<_>>();

        match candidates.iter().find(|path| path.exists()) {
            Some(path) => Ok(path.clone()),
            None => Err(Error::InputNotFound {
                path: candidates.into_iter().next().unwrap_or_else(|| self.data_dir.clone()),
            }),
        }
    }

    /// Bundled table for `indicator`, if it has one.
    pub fn table_path(&self, indicator: Indicator) -> Option<PathBuf> {
        indicator.default_table().map(|name| self.data_dir.join(name))
    }

    pub fn precincts_path(&self) -> PathBuf {
        self.overlay_dir.join(PRECINCTS_FILE)
    }

    pub fn zones_path(&self, year: OverlayYear) -> PathBuf {
        self.overlay_dir.join(year.dataset_file())
    }

    /// Output path for a join, under `out_dir` unless overridden.
    pub fn output_path(&self, out_dir: Option<&Path>, indicator: Indicator, scale: GeographyScale) -> PathBuf {
        out_dir.unwrap_or(&self.out_dir).join(indicator.output_file_name(scale))
    }
}
