use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Statistical geography scale of a boundary dataset or table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GeographyScale {
    #[serde(rename = "sa1")]
    Sa1,             // Statistical Area Level 1
    #[serde(rename = "mb")]
    MeshBlock,       // Smallest census building block
    #[serde(rename = "dzn")]
    DestinationZone, // Journey-to-work destination zone
}

impl GeographyScale {
    /// Short lowercase code used in file names and CLI flags.
    pub fn to_str(&self) -> &'static str {
        match self {
            GeographyScale::Sa1 => "sa1",
            GeographyScale::MeshBlock => "mb",
            GeographyScale::DestinationZone => "dzn",
        }
    }

    /// Order in which header candidates are tested by the scale detector.
    pub fn detection_order() -> [GeographyScale; 3] {
        [
            GeographyScale::DestinationZone,
            GeographyScale::MeshBlock,
            GeographyScale::Sa1,
        ]
    }

    /// Canonical digit width of identifiers, if they are zero-padded.
    pub fn id_width(&self) -> Option<usize> {
        match self {
            GeographyScale::Sa1 => Some(11),
            GeographyScale::MeshBlock | GeographyScale::DestinationZone => None,
        }
    }

    /// Lower-cased header names that identify this scale in a table.
    pub fn header_candidates(&self) -> &'static [&'static str] {
        match self {
            GeographyScale::Sa1 => &["sa1 (ur)", "sa1_code21", "sa1_code_2021", "sa1_code", "sa1_2021"],
            GeographyScale::MeshBlock => &["mb_code21", "mb_code_2021", "mb_code"],
            GeographyScale::DestinationZone => &["dzn_21", "dzn_code21", "dzn_code_2021", "dzn_code", "dznid"],
        }
    }

    /// Exact-case identifier column names accepted in a table, in priority order.
    pub fn table_id_candidates(&self) -> &'static [&'static str] {
        match self {
            GeographyScale::Sa1 => &["SA1 (UR)", "SA1_CODE21", "SA1_CODE_2021", "SA1_CODE", "SA1_2021"],
            GeographyScale::MeshBlock => &["MB_CODE21", "MB_CODE_2021", "MB_CODE"],
            GeographyScale::DestinationZone => &["DZN_21", "DZN_CODE21", "DZN_CODE_2021", "DZN_CODE"],
        }
    }

    /// Identifier field names accepted in a boundary dataset, in priority order.
    pub fn boundary_key_candidates(&self) -> &'static [&'static str] {
        match self {
            GeographyScale::Sa1 => &["SA1_CODE21", "SA1_2021", "SA1_CODE_2021", "SA1_CODE", "SA1 (UR)"],
            GeographyScale::MeshBlock => &["MB_CODE21", "MB_CODE_2021", "MB_CODE"],
            GeographyScale::DestinationZone => &["DZN_21", "DZN_CODE21", "DZN_CODE_2021", "DZN_CODE", "DZN_2021", "DZNID"],
        }
    }

    /// Lower-case substring used when no candidate name matches.
    pub fn field_hint(&self) -> &'static str {
        match self {
            GeographyScale::Sa1 => "sa1",
            GeographyScale::MeshBlock => "mb_code",
            GeographyScale::DestinationZone => "dzn",
        }
    }

    /// Boundary shapefile names searched in the data directory.
    pub fn boundary_files(&self) -> &'static [&'static str] {
        match self {
            GeographyScale::Sa1 => &["SA1_2021_AUST_GDA2020.shp", "SA1_2021_AUST.shp"],
            GeographyScale::MeshBlock => &["MB_2021_AUST_GDA2020.shp", "MB_2021_AUST.shp", "MB_2021_VIC_GDA2020.shp"],
            GeographyScale::DestinationZone => &["Melb_DNZ_21.shp"],
        }
    }

    /// Property key under which the normalized id is written to output.
    pub fn output_id_key(&self) -> &'static str {
        match self {
            GeographyScale::Sa1 => "SA1_CODE",
            GeographyScale::MeshBlock => "MB_CODE21",
            GeographyScale::DestinationZone => "DZN_21",
        }
    }
}

impl fmt::Display for GeographyScale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_str().to_ascii_uppercase())
    }
}

impl FromStr for GeographyScale {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sa1" => Ok(GeographyScale::Sa1),
            "mb" | "meshblock" | "mesh_block" => Ok(GeographyScale::MeshBlock),
            "dzn" | "destinationzone" | "destination_zone" => Ok(GeographyScale::DestinationZone),
            _ => Err(Error::UnknownScale { name: s.to_string() }),
        }
    }
}
