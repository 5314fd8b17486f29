use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::{
    config::DataConfig,
    error::{Error, Result},
    geom::Crs,
    indicator::Indicator,
    io::geojson::read_feature_collection,
    join::build_features,
    overlay::{overlay, OverlayOptions, OverlayRequest, OverlayResponse},
    store::GeometryStore,
    table::AttributeTable,
    types::{GeographyScale, IdSet, NormalizedId},
};

/// Ranks catalogue indicators against a free-text query.
pub trait IndicatorSearch: Send + Sync {
    fn search(&self, query: &str, limit: usize) -> Vec<RankedIndicator>;
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedIndicator {
    pub indicator: String,
    pub score: f32,
}

/// Explicit identifiers to emit, overriding the table's own ids.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TargetIds {
    /// Comma-separated ids.
    List(String),
    /// File with one id per line.
    File(PathBuf),
}

/// Normalize explicit target ids for `scale`; entries without digits are dropped.
pub fn parse_target_ids(targets: &TargetIds, scale: GeographyScale) -> Result<IdSet> {
    let text = match targets {
        TargetIds::List(list) => list.clone(),
        TargetIds::File(path) => {
            if !path.exists() {
                return Err(Error::InputNotFound { path: path.clone() });
            }
            std::fs::read_to_string(path).map_err(|e| Error::io(path, e))?
        }
    };

    Ok(text.split([',', '\n'])
        .map(str::trim)
        .filter(|raw| !raw.is_empty())
        .map(|raw| NormalizedId::normalize(raw, scale))
        .filter(|id| !id.is_empty())
        .collect())
}

/// One join request.
#[derive(Debug, Clone)]
pub struct GenerateRequest {
    pub indicator: Indicator,
    /// Defaults to the indicator's scale.
    pub scale: Option<GeographyScale>,
    pub table: PathBuf,
    pub targets: Option<TargetIds>,
    /// Boundary dataset; resolved from the data directory when absent.
    pub boundary: Option<PathBuf>,
    /// Output directory; the configured one when absent.
    pub out_dir: Option<PathBuf>,
}

impl GenerateRequest {
    pub fn new(indicator: Indicator, table: impl Into<PathBuf>) -> Self {
        Self { indicator, scale: None, table: table.into(), targets: None, boundary: None, out_dir: None }
    }
}

/// Summary of a written output file.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GenerateOutput {
    pub indicator: Indicator,
    pub scale: GeographyScale,
    pub path: PathBuf,
    pub feature_count: usize,
    pub crs: Crs,
}

/// Request-scoped entry point over a data configuration.
pub struct Service {
    config: DataConfig,
    search: Option<Box<dyn IndicatorSearch>>,
}

impl Service {
    pub fn new(config: DataConfig) -> Self {
        Self { config, search: None }
    }

    pub fn with_search(mut self, search: Box<dyn IndicatorSearch>) -> Self {
        self.search = Some(search);
        self
    }

    #[inline] pub fn config(&self) -> &DataConfig { &self.config }

    /// Join one table to its boundaries and write the GeoJSON output.
    ///
    /// Targets that normalize to nothing fall back to the table's own ids.
    pub fn generate(&self, request: &GenerateRequest) -> Result<GenerateOutput> {
        let indicator = request.indicator;
        let scale = request.scale.unwrap_or_else(|| indicator.default_scale());
        log::info!("[generate] {} at {} from {}", indicator, scale, request.table.display());

        let table = AttributeTable::read(&request.table, scale)?;
        let requested = match &request.targets {
            Some(targets) => parse_target_ids(targets, scale)?,
            None => IdSet::default(),
        };
        let requested = if requested.is_empty() { table.ids() } else { requested };

        let boundary = match &request.boundary {
            Some(path) => path.clone(),
            None => self.config.boundary_path(scale)?,
        };
        let store = GeometryStore::load(&boundary, scale, &requested)?;

        self.write_join(indicator, &table, &store, &requested, request.out_dir.as_deref())
    }

    /// Tables bundled in the data directory for every indicator that has one.
    pub fn bundled_tables(&self) -> Vec<(Indicator, PathBuf)> {
        Indicator::all().into_iter()
            .filter_map(|indicator| self.config.table_path(indicator).map(|path| (indicator, path)))
            .collect()
    }

    /// Join several tables at one scale against a single boundary load.
    ///
    /// Every table is read before the boundaries; the requested set is
    /// `targets`, or the union of all table ids when `targets` is absent or
    /// yields no usable id.
    pub fn generate_batch(
        &self,
        tables: &[(Indicator, PathBuf)],
        scale: GeographyScale,
        targets: Option<&TargetIds>,
        boundary: Option<&Path>,
        out_dir: Option<&Path>,
    ) -> Result<Vec<GenerateOutput>> {
        let loaded = tables.iter()
            .map(|(indicator, path)| AttributeTable::read(path, scale).map(|table| (*indicator, table)))
            .collect::<Result<Vec<_>>>()?;

        let requested = match targets {
            Some(targets) => parse_target_ids(targets, scale)?,
            None => IdSet::default(),
        };
        let requested = if requested.is_empty() {
            loaded.iter().flat_map(|(_, table)| table.ids()).collect()
        } else {
            requested
        };

        let boundary = match boundary {
            Some(path) => path.to_path_buf(),
            None => self.config.boundary_path(scale)?,
        };
        let store = GeometryStore::load(&boundary, scale, &requested)?;
        if store.is_empty() {
            return Err(Error::NoMatchingGeometry { path: boundary, scale });
        }

        loaded.iter()
            .map(|(indicator, table)| self.write_join(*indicator, table, &store, &requested, out_dir))
            .collect()
    }

    fn write_join(
        &self,
        indicator: Indicator,
        table: &AttributeTable,
        store: &GeometryStore,
        requested: &IdSet,
        out_dir: Option<&Path>,
    ) -> Result<GenerateOutput> {
        let joined = build_features(table, store, requested, indicator.derived())?;

        let path = self.config.output_path(out_dir, indicator, table.scale());
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
        }
        joined.write(&path)?;
        log::info!("[generate] wrote {} features to {}", joined.len(), path.display());

        Ok(GenerateOutput {
            indicator,
            scale: table.scale(),
            path,
            feature_count: joined.len(),
            crs: joined.crs,
        })
    }

    /// Disaggregate the year's zone jobs onto a precinct.
    pub fn precinct_overlay(&self, request: &OverlayRequest, options: &OverlayOptions) -> Result<OverlayResponse> {
        let precincts = read_feature_collection(&self.config.precincts_path())?;
        let zones = read_feature_collection(&self.config.zones_path(request.year))?;
        overlay(&precincts, &zones, request, options)
    }

    /// Rank indicators for `query` with the configured search collaborator.
    pub fn search(&self, query: &str, limit: usize) -> Result<Vec<RankedIndicator>> {
        let search = self.search.as_ref().ok_or(Error::SearchUnavailable)?;
        Ok(search.search(query, limit))
    }
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    struct FixedSearch;

    impl IndicatorSearch for FixedSearch {
        fn search(&self, _query: &str, limit: usize) -> Vec<RankedIndicator> {
            vec![
                RankedIndicator { indicator: "income".into(), score: 0.9 },
                RankedIndicator { indicator: "education".into(), score: 0.4 },
            ].into_iter().take(limit).collect()
        }
    }

    #[test]
    fn search_requires_a_collaborator() {
        let service = Service::new(DataConfig::default());
        assert!(matches!(service.search("jobs", 5), Err(Error::SearchUnavailable)));

        let service = service.with_search(Box::new(FixedSearch));
        let ranked = service.search("money", 1).unwrap();
        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].indicator, "income");
    }

    #[test]
    fn target_list_is_normalized() {
        let ids = parse_target_ids(&TargetIds::List("2060111, 20601110102,,abc".into()), GeographyScale::Sa1).unwrap();
        assert_eq!(ids.len(), 2);
        assert!(ids.contains(&NormalizedId::normalize("00002060111", GeographyScale::Sa1)));
    }

    #[test]
    fn target_file_reads_one_id_per_line() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("ids.txt");
        std::fs::write(&path, "206\n\n 207 \n206\n").unwrap();
        let ids = parse_target_ids(&TargetIds::File(path), GeographyScale::DestinationZone).unwrap();
        assert_eq!(ids.len(), 2);

        let missing = parse_target_ids(&TargetIds::File(dir.path().join("nope.txt")), GeographyScale::Sa1);
        assert!(matches!(missing, Err(Error::InputNotFound { .. })));
    }

    #[test]
    fn bundled_tables_cover_sa1_indicators() {
        let service = Service::new(DataConfig::new("/data"));
        let names = service.bundled_tables().into_iter().map(|(i, _)| i).collect::<Vec<_>>();
        assert_eq!(names, vec![
            Indicator::Education, Indicator::Employment, Indicator::Income, Indicator::Pob, Indicator::Occupation,
        ]);
    }
}
