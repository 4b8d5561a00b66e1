//! Tests for CSV ingestion.

use std::io::Write;
use std::path::Path;

use commlens_ingest::{IngestError, read_raw_table, read_raw_table_from_reader};
use commlens_model::{CellValue, Platform};

#[test]
fn reads_headers_and_marks_empty_cells_missing() {
    let data = "name,subscribers,rules\nrust,1200,No spam; Be civil\nempty,,\n";
    let raw = read_raw_table_from_reader(data.as_bytes(), Platform::Reddit, Path::new("mem"))
        .expect("read csv");
    assert_eq!(raw.platform, Platform::Reddit);
    assert_eq!(raw.table.column_names(), vec!["name", "subscribers", "rules"]);
    assert_eq!(raw.table.height(), 2);
    assert_eq!(
        raw.table.get(0, "rules"),
        Some(&CellValue::text("No spam; Be civil"))
    );
    assert_eq!(raw.table.get(1, "subscribers"), Some(&CellValue::Missing));
}

#[test]
fn skips_blank_rows_and_pads_short_records() {
    let data = "domain,title,total_users\n,,\nexample.social,Example\n";
    let raw = read_raw_table_from_reader(data.as_bytes(), Platform::Mastodon, Path::new("mem"))
        .expect("read csv");
    assert_eq!(raw.table.height(), 1);
    assert_eq!(raw.table.get(0, "total_users"), Some(&CellValue::Missing));
}

#[test]
fn quoted_literal_cells_survive_as_text() {
    let data = "domain,rules\nx.social,\"[{'id': '1', 'text': 'Be kind, always'}]\"\n";
    let raw = read_raw_table_from_reader(data.as_bytes(), Platform::Mastodon, Path::new("mem"))
        .expect("read csv");
    assert_eq!(
        raw.table.get(0, "rules").and_then(CellValue::as_str),
        Some("[{'id': '1', 'text': 'Be kind, always'}]")
    );
}

#[test]
fn reads_from_disk() {
    let mut file = tempfile::NamedTempFile::new().expect("temp file");
    writeln!(file, "\u{feff}domain ,languages").unwrap();
    writeln!(file, "a.social,\"['en']\"").unwrap();
    let raw = read_raw_table(file.path(), Platform::Mastodon).expect("read csv");
    assert_eq!(raw.table.column_names(), vec!["domain", "languages"]);
}

#[test]
fn missing_file_is_reported() {
    let err = read_raw_table(Path::new("/nonexistent/commlens.csv"), Platform::Reddit).unwrap_err();
    assert!(matches!(err, IngestError::FileNotFound { .. }));
}
