//! Named indicator datasets and the derived indicators computed from them.

use std::{fmt, str::FromStr};

use serde::Serialize;

use crate::{error::Error, types::GeographyScale};

/// Industry columns of the place-of-work tables, in output order.
pub const INDUSTRY_COLUMNS: [&str; 19] = [
    "Agriculture, Forestry and Fishing",
    "Mining",
    "Manufacturing",
    "Electricity, Gas, Water and Waste Services",
    "Construction",
    "Wholesale Trade",
    "Retail Trade",
    "Accommodation and Food Services",
    "Transport, Postal and Warehousing",
    "Information Media and Telecommunications",
    "Financial and Insurance Services",
    "Rental, Hiring and Real Estate Services",
    "Professional, Scientific and Technical Services",
    "Administrative and Support Services",
    "Public Administration and Safety",
    "Education and Training",
    "Health Care and Social Assistance",
    "Arts and Recreation Services",
    "Other Services",
];

/// Indicator datasets that can be joined to boundaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Indicator {
    Education,
    Employment,
    Income,
    Pob,
    Occupation,
    LandUseMix,
    TotalJobs,
    IndustrySpecialisation,
}

/// Indicators computed per feature from attribute columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum DerivedIndicator {
    /// Sum of squared category shares (Herfindahl-type concentration).
    Specialisation,
    /// Sum of category counts.
    TotalCount,
}

impl Indicator {
    pub fn all() -> [Indicator; 8] {
        [
            Indicator::Education,
            Indicator::Employment,
            Indicator::Income,
            Indicator::Pob,
            Indicator::Occupation,
            Indicator::LandUseMix,
            Indicator::TotalJobs,
            Indicator::IndustrySpecialisation,
        ]
    }

    /// Canonical display name, also used for output file names.
    pub fn name(&self) -> &'static str {
        match self {
            Indicator::Education => "education",
            Indicator::Employment => "employment",
            Indicator::Income => "income",
            Indicator::Pob => "pob",
            Indicator::Occupation => "occupation",
            Indicator::LandUseMix => "land use mix",
            Indicator::TotalJobs => "total number of jobs",
            Indicator::IndustrySpecialisation => "industry specialisation",
        }
    }

    /// Scale assumed when the caller does not choose one.
    pub fn default_scale(&self) -> GeographyScale {
        match self {
            Indicator::Education
            | Indicator::Employment
            | Indicator::Income
            | Indicator::Pob
            | Indicator::Occupation => GeographyScale::Sa1,
            Indicator::LandUseMix
            | Indicator::TotalJobs
            | Indicator::IndustrySpecialisation => GeographyScale::DestinationZone,
        }
    }

    /// Bundled table for batch runs; destination-zone indicators are upload-only.
    pub fn default_table(&self) -> Option<&'static str> {
        match self {
            Indicator::Education => Some("Education-VIC.csv"),
            Indicator::Employment => Some("employment-VIC.csv"),
            Indicator::Income => Some("Income-VIC1.csv"),
            Indicator::Pob => Some("POB-VIC1.csv"),
            Indicator::Occupation => Some("Occupation-VIC.csv"),
            Indicator::LandUseMix | Indicator::TotalJobs | Indicator::IndustrySpecialisation => None,
        }
    }

    /// Derived column computed for this indicator, if any.
    pub fn derived(&self) -> Option<DerivedIndicator> {
        match self {
            Indicator::TotalJobs => Some(DerivedIndicator::TotalCount),
            Indicator::IndustrySpecialisation => Some(DerivedIndicator::Specialisation),
            _ => None,
        }
    }

    /// Output file name for a join at `scale`.
    pub fn output_file_name(&self, scale: GeographyScale) -> String {
        format!("selected_{}_{}.geojson", scale.to_str(), self.name().replace(' ', "_"))
    }
}

impl fmt::Display for Indicator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Indicator {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "education" => Ok(Indicator::Education),
            "employment" => Ok(Indicator::Employment),
            "income" => Ok(Indicator::Income),
            "pob" => Ok(Indicator::Pob),
            "occupation" => Ok(Indicator::Occupation),
            "land use mix" | "land_use_mix" | "landusemix" => Ok(Indicator::LandUseMix),
            "total number of jobs" | "total_jobs" | "jobs_total" => Ok(Indicator::TotalJobs),
            "industry specialisation" | "industry_specialisation" | "industryspecialisation" => {
                Ok(Indicator::IndustrySpecialisation)
            }
            _ => Err(Error::UnknownIndicator {
                name: s.to_string(),
                valid: Indicator::all().iter().map(Indicator::name).collect::<Vec<_>>().join(", "),
            }),
        }
    }
}

impl DerivedIndicator {
    /// Output property name of the computed column.
    pub fn column_name(&self) -> &'static str {
        match self {
            DerivedIndicator::Specialisation => "Industry Specialisation_21",
            DerivedIndicator::TotalCount => "Total number of jobs_2021",
        }
    }

    /// Compute the indicator for one row.
    ///
    /// `value` looks up a column's raw text; `columns` lists every non-id
    /// header column. An industry column in the header counts even when its
    /// cell is blank or unparseable (as 0.0). Specialisation falls back to
    /// the numeric cells of every column only when the header has no
    /// industry column at all.
    pub fn compute<'a>(
        &self,
        value: impl Fn(&str) -> Option<&'a str>,
        columns: impl Iterator<Item = &'a str>,
    ) -> f64 {
        let columns = columns.collect::<Vec<_>>();
        let industries = INDUSTRY_COLUMNS.iter()
            .filter(|c| columns.contains(*c))
            .map(|&c| value(c).and_then(parse_number).unwrap_or(0.0))
            .collect::<Vec<_>>();

        match self {
            DerivedIndicator::TotalCount => industries.iter().sum(),
            DerivedIndicator::Specialisation if industries.is_empty() => {
                let values = columns.into_iter()
                    .filter_map(|c| value(c).and_then(parse_number))
                    .collect::<Vec<_>>();
                specialisation_index(&values)
            }
            DerivedIndicator::Specialisation => specialisation_index(&industries),
        }
    }
}

/// Sum of squared shares of the total; 0.0 when the total is not positive.
pub fn specialisation_index(values: &[f64]) -> f64 {
    let total: f64 = values.iter().sum();
    if total <= 0.0 { return 0.0 }
    values.iter().map(|v| (v / total).powi(2)).sum()
}

/// Parse a count, stripping thousands separators; None if not numeric.
pub fn parse_number(raw: &str) -> Option<f64> {
    raw.trim().replace(',', "").parse::<f64>().ok().filter(|v| v.is_finite())
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn row(pairs: &[(&'static str, &'static str)]) -> HashMap<&'static str, &'static str> {
        pairs.iter().copied().collect()
    }

    fn compute(indicator: DerivedIndicator, row: &HashMap<&'static str, &'static str>) -> f64 {
        indicator.compute(|c| row.get(c).copied(), row.keys().copied())
    }

    #[test]
    fn names_and_aliases_resolve() {
        assert_eq!("Industry Specialisation".parse::<Indicator>().unwrap(), Indicator::IndustrySpecialisation);
        assert_eq!("total_jobs".parse::<Indicator>().unwrap(), Indicator::TotalJobs);
        assert_eq!("LandUseMix".parse::<Indicator>().unwrap(), Indicator::LandUseMix);
        assert!(matches!("crime".parse::<Indicator>(), Err(Error::UnknownIndicator { .. })));
    }

    #[test]
    fn default_scales_follow_dataset() {
        assert_eq!(Indicator::Income.default_scale(), GeographyScale::Sa1);
        assert_eq!(Indicator::TotalJobs.default_scale(), GeographyScale::DestinationZone);
    }

    #[test]
    fn output_file_name_is_deterministic() {
        assert_eq!(
            Indicator::IndustrySpecialisation.output_file_name(GeographyScale::DestinationZone),
            "selected_dzn_industry_specialisation.geojson"
        );
    }

    #[test]
    fn even_split_over_four_categories() {
        let r = row(&[("Mining", "10"), ("Manufacturing", "10"), ("Construction", "10"), ("Retail Trade", "10")]);
        assert!((compute(DerivedIndicator::Specialisation, &r) - 0.25).abs() < 1e-12);
        assert!((compute(DerivedIndicator::TotalCount, &r) - 40.0).abs() < 1e-12);
    }

    #[test]
    fn all_zero_categories_give_zero_index() {
        let r = row(&[("Mining", "0"), ("Manufacturing", "0")]);
        assert_eq!(compute(DerivedIndicator::Specialisation, &r), 0.0);
        assert_eq!(compute(DerivedIndicator::TotalCount, &r), 0.0);
    }

    #[test]
    fn single_category_is_fully_concentrated() {
        let r = row(&[("Mining", "1,200"), ("Manufacturing", "0")]);
        assert!((compute(DerivedIndicator::Specialisation, &r) - 1.0).abs() < 1e-12);
        assert!((compute(DerivedIndicator::TotalCount, &r) - 1200.0).abs() < 1e-12);
    }

    #[test]
    fn unparseable_categories_count_as_zero() {
        let r = row(&[("Mining", "n/a"), ("Manufacturing", "30"), ("Construction", "10")]);
        assert!((compute(DerivedIndicator::TotalCount, &r) - 40.0).abs() < 1e-12);
        let expected = (0.75f64).powi(2) + (0.25f64).powi(2);
        assert!((compute(DerivedIndicator::Specialisation, &r) - expected).abs() < 1e-12);
    }

    #[test]
    fn falls_back_to_numeric_columns_without_industries() {
        let r = row(&[("A", "5"), ("B", "5"), ("Label", "north")]);
        assert!((compute(DerivedIndicator::Specialisation, &r) - 0.5).abs() < 1e-12);
        assert_eq!(compute(DerivedIndicator::TotalCount, &r), 0.0);
    }

    #[test]
    fn blank_industry_cells_do_not_trigger_fallback() {
        let r = row(&[("Mining", ""), ("Manufacturing", ""), ("Area", "5"), ("Workers", "5")]);
        let columns = ["Mining", "Manufacturing", "Area", "Workers"];
        let lookup = |c: &str| r.get(c).copied().filter(|v| !v.is_empty());
        assert_eq!(DerivedIndicator::Specialisation.compute(lookup, columns.into_iter()), 0.0);
        assert_eq!(DerivedIndicator::TotalCount.compute(lookup, columns.into_iter()), 0.0);
    }

    #[test]
    fn parse_number_strips_separators() {
        assert_eq!(parse_number(" 12,345.5 "), Some(12345.5));
        assert_eq!(parse_number("abc"), None);
        assert_eq!(parse_number(""), None);
    }
}
