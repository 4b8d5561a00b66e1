use std::io::Read;
use std::path::Path;

use csv::ReaderBuilder;
use tracing::debug;

use commlens_model::{CellValue, Platform, RawTable, Table};

use crate::error::IngestError;

fn normalize_header(raw: &str) -> String {
    let trimmed = raw.trim().trim_matches('\u{feff}');
    trimmed.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Empty cells become [`CellValue::Missing`]; everything else stays text
/// until the normalizer coerces it.
fn normalize_cell(raw: &str) -> CellValue {
    let trimmed = raw.trim().trim_matches('\u{feff}');
    if trimmed.is_empty() {
        CellValue::Missing
    } else {
        CellValue::text(trimmed)
    }
}

/// Reads a platform export from disk.
pub fn read_raw_table(path: &Path, platform: Platform) -> Result<RawTable, IngestError> {
    if !path.is_file() {
        return Err(IngestError::FileNotFound {
            path: path.to_path_buf(),
        });
    }
    let file = std::fs::File::open(path).map_err(|source| IngestError::CsvParse {
        path: path.to_path_buf(),
        source: source.into(),
    })?;
    read_raw_table_from_reader(file, platform, path)
}

/// Reads a platform export from any reader; `source` labels errors.
pub fn read_raw_table_from_reader<R: Read>(
    reader: R,
    platform: Platform,
    source: &Path,
) -> Result<RawTable, IngestError> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);
    let headers: Vec<String> = reader
        .headers()
        .map_err(|source_err| IngestError::CsvParse {
            path: source.to_path_buf(),
            source: source_err,
        })?
        .iter()
        .map(normalize_header)
        .collect();
    if headers.iter().all(String::is_empty) {
        return Err(IngestError::EmptyCsv {
            path: source.to_path_buf(),
        });
    }
    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|source_err| IngestError::CsvParse {
            path: source.to_path_buf(),
            source: source_err,
        })?;
        let row: Vec<CellValue> = record.iter().map(normalize_cell).collect();
        if row.iter().all(CellValue::is_missing) {
            continue;
        }
        rows.push(row);
    }
    let table = Table::from_rows(&headers, rows).map_err(|source_err| IngestError::Schema {
        path: source.to_path_buf(),
        source: source_err,
    })?;
    debug!(
        platform = %platform,
        rows = table.height(),
        columns = table.width(),
        source = %source.display(),
        "read raw table"
    );
    Ok(RawTable::new(platform, table))
}
