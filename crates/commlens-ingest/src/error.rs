//! Error types for dataset ingestion.

use std::path::PathBuf;
use thiserror::Error;

use commlens_model::SchemaError;

/// Errors that can occur while loading a platform export.
#[derive(Debug, Error)]
pub enum IngestError {
    /// CSV file not found.
    #[error("CSV file not found: {path}")]
    FileNotFound { path: PathBuf },

    /// Failed to read or parse a CSV record.
    #[error("failed to parse CSV {path}: {source}")]
    CsvParse {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    /// CSV file has no header row.
    #[error("CSV file is empty: {path}")]
    EmptyCsv { path: PathBuf },

    /// Header row names the same column twice, or similar.
    #[error("malformed table in {path}: {source}")]
    Schema {
        path: PathBuf,
        #[source]
        source: SchemaError,
    },
}

/// Why a cell could not be read as a list/dict literal.
///
/// Callers treat this as a cell-level defect and fall back to a default.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LiteralError {
    #[error("unexpected end of input")]
    UnexpectedEnd,

    #[error("unexpected character '{found}' at offset {offset}")]
    Unexpected { found: char, offset: usize },

    #[error("unterminated string starting at offset {offset}")]
    UnterminatedString { offset: usize },

    #[error("invalid escape sequence at offset {offset}")]
    InvalidEscape { offset: usize },

    #[error("invalid number '{text}'")]
    InvalidNumber { text: String },

    #[error("nesting too deep at offset {offset}")]
    TooDeep { offset: usize },

    #[error("trailing input at offset {offset}")]
    TrailingInput { offset: usize },
}
