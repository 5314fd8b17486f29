//! Area-weighted overlay of destination zones onto a named precinct.

use std::{fmt, str::FromStr, time::{Duration, Instant}};

use geo::{Area, MultiPolygon};
use rayon::prelude::*;
use serde::{Serialize, Serializer};
use serde_json::Value;

use crate::{
    error::{Error, Result},
    geom::{Crs, PreparedPolygon, Reprojector},
    indicator::parse_number,
    io::geojson::{Feature, FeatureCollection},
};

/// File holding the official precinct boundaries.
pub const PRECINCTS_FILE: &str = "fb-precincts-official-boundary.geojson";

/// Census years with a destination-zone jobs dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OverlayYear {
    Y2011,
    Y2016,
    Y2021,
}

impl OverlayYear {
    pub fn year(&self) -> u16 {
        match self {
            OverlayYear::Y2011 => 2011,
            OverlayYear::Y2016 => 2016,
            OverlayYear::Y2021 => 2021,
        }
    }

    fn suffix(&self) -> &'static str {
        match self {
            OverlayYear::Y2011 => "11",
            OverlayYear::Y2016 => "16",
            OverlayYear::Y2021 => "21",
        }
    }

    /// Zone dataset file name, e.g. `Number_of_Jobs_DZN_16.geojson`.
    pub fn dataset_file(&self) -> String {
        format!("Number_of_Jobs_DZN_{}.geojson", self.suffix())
    }

    /// Zone code property, e.g. `DZN_CODE16`.
    pub fn code_property(&self) -> String {
        format!("DZN_CODE{}", self.suffix())
    }

    /// Jobs count property, e.g. `TotJob_16`.
    pub fn value_property(&self) -> String {
        format!("TotJob_{}", self.suffix())
    }
}

impl TryFrom<u16> for OverlayYear {
    type Error = Error;

    fn try_from(year: u16) -> Result<Self> {
        match year {
            2011 => Ok(OverlayYear::Y2011),
            2016 => Ok(OverlayYear::Y2016),
            2021 => Ok(OverlayYear::Y2021),
            _ => Err(Error::UnsupportedYear { year: year.to_string() }),
        }
    }
}

impl FromStr for OverlayYear {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let year = s.trim().parse::<u16>().map_err(|_| Error::UnsupportedYear { year: s.trim().to_string() })?;
        OverlayYear::try_from(year)
    }
}

impl fmt::Display for OverlayYear {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.year())
    }
}

impl Serialize for OverlayYear {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_u16(self.year())
    }
}

/// Which precinct to disaggregate onto, and for which year.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OverlayRequest {
    pub precinct_name: String,
    pub year: OverlayYear,
}

/// Tuning for one overlay run.
#[derive(Debug, Clone)]
pub struct OverlayOptions {
    /// Planar CRS in which areas are measured.
    pub target: Crs,
    /// Precinct property compared against the requested name.
    pub name_property: String,
    /// Intersect zones on the rayon pool.
    pub parallel: bool,
    /// Wall-clock limit for the zone scan.
    pub budget: Option<Duration>,
}

impl Default for OverlayOptions {
    fn default() -> Self {
        Self {
            target: Crs::WEB_MERCATOR,
            name_property: "name".to_string(),
            parallel: true,
            budget: None,
        }
    }
}

/// A named region unioned from every part carrying that name.
#[derive(Debug, Clone)]
pub struct Precinct {
    pub name: String,
    pub region: PreparedPolygon,
}

impl Precinct {
    /// Reproject and union every feature of `collection` named `name`.
    pub fn from_collection(
        collection: &FeatureCollection,
        name: &str,
        name_property: &str,
        reprojector: &Reprojector,
    ) -> Result<Self> {
        let matching = collection.features.iter()
            .filter(|feature| feature.property_text(name_property).as_deref() == Some(name))
            .collect::<Vec<_>>();

        if matching.is_empty() {
            return Err(Error::PrecinctNotFound { name: name.to_string(), path: collection.source.clone() });
        }
        log::debug!("[overlay] {} feature(s) named '{}'", matching.len(), name);

        let parts = matching.into_iter()
            .filter_map(|feature| match feature.multipolygon().and_then(|shape| reprojector.project(&shape)) {
                Ok(shape) if shape.unsigned_area() > 0.0 => Some(shape),
                Ok(_) => None,
                Err(e) => {
                    log::warn!("[overlay] dropping part of precinct '{}': {}", name, e);
                    None
                }
            })
            .collect::<Vec<_>>();

        if parts.is_empty() {
            return Err(Error::DegenerateGeometry {
                name: name.to_string(),
                reason: "no polygon part with positive area after reprojection".into(),
            });
        }

        let region = PreparedPolygon::union_of(parts);
        if region.is_empty() || region.area() <= 0.0 {
            return Err(Error::DegenerateGeometry {
                name: name.to_string(),
                reason: format!("unioned area is {}", region.area()),
            });
        }

        Ok(Self { name: name.to_string(), region })
    }

    /// Planar area of the unioned region, in square metres for metric targets.
    #[inline] pub fn area_m2(&self) -> f64 { self.region.area() }
}

/// Overlap of one zone with the precinct.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ZoneIntersection {
    pub zone_code: String,
    pub attribute_value: f64,
    pub intersection_area_m2: f64,
    pub area_fraction_of_precinct: f64,
}

/// Result of scanning a single zone.
#[derive(Debug, Clone, PartialEq)]
pub enum ZoneOutcome {
    /// The zone overlaps the precinct with positive area.
    Hit(ZoneIntersection),
    /// Disjoint, or touching only along the boundary.
    Miss,
    /// The zone geometry could not be decoded, reprojected or has no area.
    Invalid { zone_code: String, reason: String },
    /// Not started before the time budget ran out.
    Expired,
}

impl ZoneOutcome {
    fn is_skip(&self) -> bool {
        matches!(self, ZoneOutcome::Invalid { .. } | ZoneOutcome::Expired)
    }
}

/// Ranked zone overlaps for one precinct.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OverlayResponse {
    pub precinct_name: String,
    pub year: OverlayYear,
    pub precinct_area_m2: f64,
    pub intersection_count: usize,
    pub intersections: Vec<ZoneIntersection>,
    pub skipped: usize,
    pub truncated: bool,
}

/// A zone decoded and projected into the target CRS, ready to intersect.
struct ProjectedZone {
    code: String,
    value: f64,
    shape: MultiPolygon<f64>,
}

/// Disaggregate `zones` onto the precinct named in `request`.
///
/// Both collections are reprojected into `options.target`. Zones are then
/// intersected against the unioned precinct, on the rayon pool unless
/// `options.parallel` is false, and returned by descending area fraction.
pub fn overlay(
    precincts: &FeatureCollection,
    zones: &FeatureCollection,
    request: &OverlayRequest,
    options: &OverlayOptions,
) -> Result<OverlayResponse> {
    log::info!(
        "[overlay] precinct='{}' year={} precincts={} zones={} -> {}",
        request.precinct_name, request.year, precincts.crs, zones.crs, options.target,
    );

    let precinct = Precinct::from_collection(
        precincts,
        &request.precinct_name,
        &options.name_property,
        &Reprojector::new(precincts.crs, options.target)?,
    )?;
    log::info!("[overlay] precinct area = {:.2}", precinct.area_m2());

    let deadline = options.budget.map(|budget| Instant::now() + budget);
    let expired = || deadline.is_some_and(|d| Instant::now() >= d);

    let code_property = request.year.code_property();
    let value_property = request.year.value_property();

    // Reprojection stays on this thread; only the boolean operations fan out.
    let zone_projector = Reprojector::new(zones.crs, options.target)?;
    let projected = zones.features.iter()
        .map(|feature| {
            if expired() { return Err(ZoneOutcome::Expired) }
            project_zone(feature, &code_property, &value_property, &zone_projector)
        })
        .collect::<Vec<_>>();

    let evaluate = |zone: std::result::Result<ProjectedZone, ZoneOutcome>| match zone {
        Err(outcome) => outcome,
        Ok(_) if expired() => ZoneOutcome::Expired,
        Ok(zone) => intersect_zone(&precinct, zone),
    };

    let outcomes: Vec<ZoneOutcome> = if options.parallel {
        projected.into_par_iter().map(evaluate).collect()
    } else {
        projected.into_iter().map(evaluate).collect()
    };

    let mut skipped = 0;
    let mut truncated = false;
    let mut intersections = Vec::new();
    for outcome in outcomes {
        if outcome.is_skip() { skipped += 1 }
        match outcome {
            ZoneOutcome::Hit(hit) => intersections.push(hit),
            ZoneOutcome::Invalid { zone_code, reason } => {
                log::debug!("[overlay] skipped zone '{}': {}", zone_code, reason);
            }
            ZoneOutcome::Expired => truncated = true,
            ZoneOutcome::Miss => {}
        }
    }

    intersections.sort_by(|a, b| b.area_fraction_of_precinct.total_cmp(&a.area_fraction_of_precinct));

    if skipped > 0 {
        log::warn!("[overlay] skipped {} of {} zones{}", skipped, zones.features.len(),
            if truncated { " (time budget exhausted)" } else { "" });
    }
    log::info!("[overlay] {} intersecting zones", intersections.len());

    Ok(OverlayResponse {
        precinct_name: precinct.name.clone(),
        year: request.year,
        precinct_area_m2: precinct.area_m2(),
        intersection_count: intersections.len(),
        intersections,
        skipped,
        truncated,
    })
}

fn project_zone(
    feature: &Feature,
    code_property: &str,
    value_property: &str,
    projector: &Reprojector,
) -> std::result::Result<ProjectedZone, ZoneOutcome> {
    let code = feature.property_text(code_property).unwrap_or_default();

    let shape = feature.multipolygon()
        .and_then(|shape| projector.project(&shape))
        .map_err(|e| ZoneOutcome::Invalid { zone_code: code.clone(), reason: e.to_string() })?;

    if shape.0.is_empty() || shape.unsigned_area() <= 0.0 {
        return Err(ZoneOutcome::Invalid { zone_code: code, reason: "zone has no area".into() });
    }

    let value = match feature.properties.get(value_property) {
        Some(Value::Number(n)) => n.as_f64().unwrap_or(0.0),
        Some(Value::String(s)) => parse_number(s).unwrap_or(0.0),
        _ => 0.0,
    };

    Ok(ProjectedZone { code, value, shape })
}

fn intersect_zone(precinct: &Precinct, zone: ProjectedZone) -> ZoneOutcome {
    if !precinct.region.intersects(&zone.shape) { return ZoneOutcome::Miss }

    let area = precinct.region.intersection_area(&zone.shape);
    if area <= 0.0 { return ZoneOutcome::Miss }

    ZoneOutcome::Hit(ZoneIntersection {
        zone_code: zone.code,
        attribute_value: zone.value,
        intersection_area_m2: area,
        area_fraction_of_precinct: area / precinct.area_m2(),
    })
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::io::geojson::read_feature_collection_bytes;

    fn rect(x0: f64, y0: f64, x1: f64, y1: f64) -> Value {
        json!({ "type": "Polygon", "coordinates": [[[x0, y0], [x1, y0], [x1, y1], [x0, y1], [x0, y0]]] })
    }

    fn collection(features: Vec<Value>) -> FeatureCollection {
        let fc = json!({
            "type": "FeatureCollection",
            "crs": { "type": "name", "properties": { "name": "EPSG:3857" } },
            "features": features,
        });
        read_feature_collection_bytes(&serde_json::to_vec(&fc).unwrap()).unwrap()
    }

    fn precincts() -> FeatureCollection {
        collection(vec![
            json!({ "type": "Feature", "properties": { "name": "Montague" }, "geometry": rect(0.0, 0.0, 10.0, 10.0) }),
            json!({ "type": "Feature", "properties": { "name": "Split" }, "geometry": rect(0.0, 0.0, 1.0, 1.0) }),
            json!({ "type": "Feature", "properties": { "name": "Split" }, "geometry": rect(5.0, 5.0, 7.0, 7.0) }),
            json!({ "type": "Feature", "properties": { "name": "Flat" }, "geometry": rect(0.0, 0.0, 5.0, 0.0) }),
        ])
    }

    fn zones() -> FeatureCollection {
        collection(vec![
            json!({ "type": "Feature", "properties": { "DZN_CODE21": "B", "TotJob_21": "1,500" }, "geometry": rect(4.0, 0.0, 9.0, 5.0) }),
            json!({ "type": "Feature", "properties": { "DZN_CODE21": "A", "TotJob_21": 120 }, "geometry": rect(0.0, 0.0, 4.0, 10.0) }),
            json!({ "type": "Feature", "properties": { "DZN_CODE21": "C", "TotJob_21": 7 }, "geometry": rect(10.0, 0.0, 12.0, 10.0) }),
            json!({ "type": "Feature", "properties": { "DZN_CODE21": "D", "TotJob_21": "n/a" }, "geometry": rect(50.0, 50.0, 60.0, 60.0) }),
            json!({ "type": "Feature", "properties": { "DZN_CODE21": "E" }, "geometry": { "type": "Point", "coordinates": [1, 1] } }),
        ])
    }

    fn options() -> OverlayOptions {
        OverlayOptions { target: Crs::WEB_MERCATOR, ..OverlayOptions::default() }
    }

    fn request(name: &str) -> OverlayRequest {
        OverlayRequest { precinct_name: name.to_string(), year: OverlayYear::Y2021 }
    }

    #[test]
    fn fractions_are_ranked_and_touching_zones_excluded() {
        let response = overlay(&precincts(), &zones(), &request("Montague"), &options()).unwrap();

        assert!((response.precinct_area_m2 - 100.0).abs() < 1e-9);
        assert_eq!(response.intersection_count, 2);
        let codes = response.intersections.iter().map(|i| i.zone_code.as_str()).collect::<Vec<_>>();
        assert_eq!(codes, vec!["A", "B"]);
        assert!((response.intersections[0].area_fraction_of_precinct - 0.40).abs() < 1e-9);
        assert!((response.intersections[1].area_fraction_of_precinct - 0.25).abs() < 1e-9);
        assert_eq!(response.intersections[0].attribute_value, 120.0);
        assert_eq!(response.intersections[1].attribute_value, 1500.0);
        assert_eq!(response.skipped, 1);
        assert!(!response.truncated);
    }

    #[test]
    fn sequential_matches_parallel() {
        let parallel = overlay(&precincts(), &zones(), &request("Montague"), &options()).unwrap();
        let sequential = overlay(
            &precincts(), &zones(), &request("Montague"),
            &OverlayOptions { parallel: false, ..options() },
        ).unwrap();
        assert_eq!(parallel, sequential);
    }

    #[test]
    fn disjoint_parts_form_one_region() {
        let response = overlay(&precincts(), &zones(), &request("Split"), &options()).unwrap();
        assert!((response.precinct_area_m2 - 5.0).abs() < 1e-9);
        // A covers the unit square; B only touches the upper part along y = 5
        let codes = response.intersections.iter().map(|i| i.zone_code.as_str()).collect::<Vec<_>>();
        assert_eq!(codes, vec!["A"]);
        assert!((response.intersections[0].area_fraction_of_precinct - 0.2).abs() < 1e-9);
    }

    #[test]
    fn unknown_precinct_is_not_found() {
        let err = overlay(&precincts(), &zones(), &request("Nowhere"), &options()).unwrap_err();
        assert!(matches!(err, Error::PrecinctNotFound { .. }));
    }

    #[test]
    fn zero_area_precinct_is_degenerate() {
        let err = overlay(&precincts(), &zones(), &request("Flat"), &options()).unwrap_err();
        assert!(matches!(err, Error::DegenerateGeometry { .. }));
    }

    #[test]
    fn exhausted_budget_truncates() {
        let response = overlay(
            &precincts(), &zones(), &request("Montague"),
            &OverlayOptions { budget: Some(Duration::ZERO), ..options() },
        ).unwrap();
        assert!(response.truncated);
        assert_eq!(response.skipped, 5);
        assert!(response.intersections.is_empty());
    }

    #[test]
    fn years_map_to_datasets() {
        let year = OverlayYear::try_from(2016).unwrap();
        assert_eq!(year.dataset_file(), "Number_of_Jobs_DZN_16.geojson");
        assert_eq!(year.code_property(), "DZN_CODE16");
        assert_eq!(year.value_property(), "TotJob_16");
        assert!(matches!(OverlayYear::try_from(2019), Err(Error::UnsupportedYear { year }) if year == "2019"));
        assert_eq!("2011".parse::<OverlayYear>().unwrap(), OverlayYear::Y2011);
    }

    #[test]
    fn non_numeric_year_keeps_its_text() {
        let err = "twenty".parse::<OverlayYear>().unwrap_err();
        assert!(matches!(&err, Error::UnsupportedYear { year } if year == "twenty"));
        assert_eq!(err.to_string(), "unsupported year twenty; use one of 2011, 2016, 2021");
    }

    #[test]
    fn response_serializes_with_plain_year() {
        let response = overlay(&precincts(), &zones(), &request("Montague"), &options()).unwrap();
        let value = serde_json::to_value(&response).unwrap();
        assert_eq!(value["year"], 2021);
        assert_eq!(value["precinct_name"], "Montague");
        assert_eq!(value["intersections"][0]["zone_code"], "A");
    }
}
