use std::{fmt, sync::LazyLock};

use regex::Regex;
use serde::{Deserialize, Serialize};

/// EPSG-coded coordinate reference system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Crs(pub u32);

static EPSG_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)EPSG(?:::|:)[^0-9]*(\d+)").expect("valid EPSG regex")
});

static AUTHORITY_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)AUTHORITY\s*\[\s*"EPSG"\s*,\s*"(\d+)"\s*\]"#).expect("valid AUTHORITY regex")
});

impl Crs {
    /// WGS84 geographic lon/lat.
    pub const WGS84: Crs = Crs(4326);
    /// GDA94 geographic lon/lat.
    pub const GDA94: Crs = Crs(4283);
    /// GDA2020 geographic lon/lat.
    pub const GDA2020: Crs = Crs(7844);
    /// Spherical (web) mercator, metres.
    pub const WEB_MERCATOR: Crs = Crs(3857);

    #[inline] pub fn epsg(&self) -> u32 { self.0 }

    /// Resolve a CRS from a declared name, e.g. `urn:ogc:def:crs:EPSG::4283`,
    /// `EPSG:7844` or `urn:ogc:def:crs:OGC:1.3:CRS84`.
    /// Unknown or absent names fall back to WGS84.
    pub fn from_name(name: Option<&str>) -> Self {
        let Some(name) = name else { return Crs::WGS84 };

        if let Some(code) = EPSG_PATTERN.captures(name)
            .and_then(|caps| caps[1].parse::<u32>().ok()) {
            return Crs(code);
        }

        let upper = name.to_ascii_uppercase();
        if upper.contains("CRS84") { return Crs::WGS84 }
        if upper.contains("GDA2020") { return Crs::GDA2020 }
        if upper.contains("GDA94") { return Crs::GDA94 }

        Crs::WGS84
    }

    /// Resolve a CRS from the WKT of a shapefile `.prj` sidecar.
    /// The outermost (last) EPSG authority wins; otherwise the datum name is used.
    pub fn from_wkt(wkt: &str) -> Self {
        let authority = AUTHORITY_PATTERN.captures_iter(wkt)
            .filter_map(|caps| caps[1].parse::<u32>().ok())
            .last();
        if let Some(code) = authority { return Crs(code) }

        let upper = wkt.to_ascii_uppercase();
        let geographic = upper.trim_start().starts_with("GEOGCS") || upper.trim_start().starts_with("GEOGCRS");
        if geographic && (upper.contains("GDA2020") || upper.contains("GDA_2020")) {
            Crs::GDA2020
        } else if geographic && (upper.contains("GDA94") || upper.contains("GDA_1994")) {
            Crs::GDA94
        } else {
            Crs::from_name(Some(wkt))
        }
    }

    /// URN written into the `crs` member of output GeoJSON.
    pub fn urn(&self) -> String {
        format!("urn:ogc:def:crs:EPSG::{}", self.0)
    }

    /// PROJ.4 definition for the codes this crate can transform.
    pub(crate) fn proj4(&self) -> Option<String> {
        const GRS80_NULL_SHIFT: &str = "+ellps=GRS80 +towgs84=0,0,0,0,0,0,0";
        let def = match self.0 {
            4326 => "+proj=longlat +datum=WGS84 +no_defs +type=crs".to_string(),
            4269 => "+proj=longlat +datum=NAD83 +no_defs +type=crs".to_string(),
            4283 | 7844 => format!("+proj=longlat {GRS80_NULL_SHIFT} +no_defs +type=crs"),
            3857 => "+proj=merc +a=6378137 +b=6378137 +lat_ts=0 +lon_0=0 +x_0=0 +y_0=0 +k=1 +units=m +no_defs +type=crs".to_string(),
            // MGA zones 49-56 on GDA94 (283zz) and GDA2020 (78zz)
            code @ (28349..=28356 | 7849..=7856) => {
                let zone = code % 100;
                format!("+proj=utm +zone={zone} +south {GRS80_NULL_SHIFT} +units=m +no_defs +type=crs")
            }
            // WGS84 UTM north (326zz) / south (327zz)
            code @ (32601..=32660 | 32701..=32760) => {
                let zone = code % 100;
                let south = if code > 32700 { " +south" } else { "" };
                format!("+proj=utm +zone={zone}{south} +datum=WGS84 +units=m +no_defs +type=crs")
            }
            _ => return None,
        };
        Some(def)
    }
}

impl Default for Crs {
    fn default() -> Self { Crs::WGS84 }
}

impl fmt::Display for Crs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EPSG:{}", self.0)
    }
}
