use std::{collections::HashMap, path::{Path, PathBuf}};

use ahash::RandomState;

use crate::{
    detect::{detect_id_column, detect_scale},
    error::{Error, Result},
    io::csv::{read_table, RawTable},
    types::{GeographyScale, IdSet, NormalizedId},
};

/// One attribute row: the normalized id plus raw cells aligned to the table's columns.
#[derive(Debug, Clone)]
pub struct AttributeRow {
    pub id: NormalizedId,
    pub values: Vec<Option<String>>,
}

/// Tabular indicator input keyed by normalized identifier.
///
/// Rows keep the order in which their id first appeared. A repeated id
/// replaces the earlier row's values in place (last write wins).
#[derive(Debug, Clone)]
pub struct AttributeTable {
    path: PathBuf,
    scale: GeographyScale,
    columns: Vec<String>,
    id_column: usize,
    rows: Vec<AttributeRow>,
    index: HashMap<NormalizedId, usize, RandomState>,
    column_index: HashMap<String, usize, RandomState>,
}

impl AttributeTable {
    /// Read a CSV file and key its rows for `scale`.
    pub fn read(path: &Path, scale: GeographyScale) -> Result<Self> {
        Self::from_raw(path, read_table(path)?, scale)
    }

    /// Key an already parsed table; `path` only labels diagnostics.
    pub fn from_raw(path: &Path, raw: RawTable, scale: GeographyScale) -> Result<Self> {
        let RawTable { columns, rows: raw_rows } = raw;

        if raw_rows.is_empty() {
            return Err(Error::EmptyTable { path: path.to_path_buf() });
        }

        let Some(id_column) = detect_id_column(&columns, scale) else {
            return Err(match detect_scale(&columns) {
                Some(detected) if detected != scale => Error::ScaleMismatch {
                    path: path.to_path_buf(), detected, requested: scale,
                },
                _ => Error::KeyFieldNotFound {
                    path: path.to_path_buf(),
                    scale,
                    expected: scale.table_id_candidates().join(", "),
                    available: columns.join(", "),
                },
            });
        };

        let mut rows: Vec<AttributeRow> = Vec::with_capacity(raw_rows.len());
        let mut index = HashMap::<NormalizedId, usize, RandomState>::default();
        let mut unmatched = 0_usize;

        for values in raw_rows {
            let id = NormalizedId::normalize(values.get(id_column).and_then(|v| v.as_deref()).unwrap_or(""), scale);
            if id.is_empty() {
                unmatched += 1;
                continue;
            }

            match index.get(&id) {
                Some(&i) => rows[i].values = values,
                None => {
                    index.insert(id.clone(), rows.len());
                    rows.push(AttributeRow { id, values });
                }
            }
        }

        if unmatched > 0 {
            log::debug!("[table] {}: {} rows without a usable {} id", path.display(), unmatched, scale);
        }
        log::info!("[table] {}: {} rows keyed by '{}'", path.display(), rows.len(), columns[id_column]);

        let column_index = columns.iter().enumerate()
            .map(|(i, name)| (name.clone(), i))
            .collect();

        Ok(Self { path: path.to_path_buf(), scale, columns, id_column, rows, index, column_index })
    }

    #[inline] pub fn path(&self) -> &Path { &self.path }

    #[inline] pub fn scale(&self) -> GeographyScale { self.scale }

    /// Column names in header order.
    #[inline] pub fn columns(&self) -> &[String] { &self.columns }

    /// Name of the column the ids were read from.
    #[inline] pub fn id_column(&self) -> &str { &self.columns[self.id_column] }

    #[inline] pub fn rows(&self) -> &[AttributeRow] { &self.rows }

    #[inline] pub fn len(&self) -> usize { self.rows.len() }

    #[inline] pub fn is_empty(&self) -> bool { self.rows.is_empty() }

    /// The set of distinct ids in the table.
    pub fn ids(&self) -> IdSet {
        self.rows.iter().map(|row| row.id.clone()).collect()
    }

    /// Row keyed by `id`, if present.
    pub fn get(&self, id: &NormalizedId) -> Option<&AttributeRow> {
        self.index.get(id).map(|&i| &self.rows[i])
    }

    /// Raw text of `column` in `row`, if the column exists and the cell is non-empty.
    pub fn cell<'a>(&self, row: &'a AttributeRow, column: &str) -> Option<&'a str> {
        self.column_index.get(column)
            .and_then(|&i| row.values.get(i))
            .and_then(|v| v.as_deref())
    }

    /// Every column except the id column.
    pub fn value_columns(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().enumerate()
            .filter(move |&(i, _)| i != self.id_column)
            .map(|(_, name)| name.as_str())
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::*;
    use crate::io::csv::read_table_str;

    fn table(csv: &str, scale: GeographyScale) -> Result<AttributeTable> {
        AttributeTable::from_raw(Path::new("test.csv"), read_table_str(csv)?, scale)
    }

    #[test]
    fn ids_are_normalized_for_scale() {
        let t = table("SA1_CODE21,Persons\n2060111,5\n20601110102,7\n", GeographyScale::Sa1).unwrap();
        assert_eq!(t.id_column(), "SA1_CODE21");
        let ids = t.rows().iter().map(|r| r.id.as_str()).collect::<Vec<_>>();
        assert_eq!(ids, vec!["00002060111", "20601110102"]);
    }

    #[test]
    fn duplicate_ids_keep_first_position_and_last_values() {
        let t = table("DZN_21,Mining\n1,10\n2,20\n1,30\n", GeographyScale::DestinationZone).unwrap();
        assert_eq!(t.len(), 2);
        assert_eq!(t.rows()[0].id.as_str(), "1");
        assert_eq!(t.cell(&t.rows()[0], "Mining"), Some("30"));
        assert_eq!(t.rows()[1].id.as_str(), "2");
    }

    #[test]
    fn rows_without_digits_are_dropped() {
        let t = table("DZN_21,Mining\nTotal,99\n206,1\n", GeographyScale::DestinationZone).unwrap();
        assert_eq!(t.len(), 1);
        assert!(t.get(&NormalizedId::normalize("206", GeographyScale::DestinationZone)).is_some());
    }

    #[test]
    fn dzn_header_with_sa1_requested_is_a_mismatch() {
        let err = table("DZN_21,Mining\n1,10\n", GeographyScale::Sa1).unwrap_err();
        match err {
            Error::ScaleMismatch { detected, requested, .. } => {
                assert_eq!(detected, GeographyScale::DestinationZone);
                assert_eq!(requested, GeographyScale::Sa1);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn unrecognized_header_is_missing_key_field() {
        let err = table("LGA,Persons\n1,10\n", GeographyScale::Sa1).unwrap_err();
        assert!(matches!(err, Error::KeyFieldNotFound { .. }));
        assert!(err.to_string().contains("LGA, Persons"));
    }

    #[test]
    fn header_only_is_empty_table() {
        let err = table("SA1_CODE21,Persons\n", GeographyScale::Sa1).unwrap_err();
        assert!(matches!(err, Error::EmptyTable { .. }));
    }

    #[test]
    fn value_columns_skip_id() {
        let t = table("Label,DZN_21,Mining\nx,1,10\n", GeographyScale::DestinationZone).unwrap();
        assert_eq!(t.value_columns().collect::<Vec<_>>(), vec!["Label", "Mining"]);
    }
}
