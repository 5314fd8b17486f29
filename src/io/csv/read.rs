//! CSV reading operations.

use std::{fs::File, io::Cursor, path::Path};

use polars::{frame::DataFrame, io::SerReader, prelude::{CsvReadOptions, CsvReader, PolarsResult}};

use crate::error::{Error, Result};

/// A header plus rows of raw cell text; `None` marks an empty or missing cell.
#[derive(Debug, Clone, Default)]
pub struct RawTable {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Option<String>>>,
}

/// Reads a comma-delimited file with a header row, keeping every column as text
/// so identifiers keep their leading zeros.
pub fn read_table(path: &Path) -> Result<RawTable> {
    if !path.exists() {
        return Err(Error::InputNotFound { path: path.to_path_buf() });
    }
    let file = File::open(path).map_err(|e| Error::io(path, e))?;
    let df = text_options()
        .into_reader_with_file_handle(file)
        .finish()
        .map_err(|source| Error::Csv { path: path.to_path_buf(), source })?;
    dataframe_to_table(&df).map_err(|source| Error::Csv { path: path.to_path_buf(), source })
}

/// Reads a CSV from a string (for uploaded content held in memory).
pub fn read_table_str(csv: &str) -> Result<RawTable> {
    let df = CsvReader::new(Cursor::new(csv.as_bytes()))
        .with_options(text_options())
        .finish()
        .map_err(|source| Error::Csv { path: "<memory>".into(), source })?;
    dataframe_to_table(&df).map_err(|source| Error::Csv { path: "<memory>".into(), source })
}

/// Header on, no type inference: every column is read as String.
fn text_options() -> CsvReadOptions {
    CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(0))
}

fn dataframe_to_table(df: &DataFrame) -> PolarsResult<RawTable> {
    let columns = df.get_column_names().iter()
        .map(|name| name.to_string())
        .collect::<Vec<_>>();

    let cells = df.get_columns().iter()
        .map(|column| column.str())
        .collect::<PolarsResult<Vec<_>>>()?;

    let rows = (0..df.height())
        .map(|i| cells.iter()
            .map(|chunked| chunked.get(i)
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string))
            .collect())
        .collect();

    Ok(RawTable { columns, rows })
}
