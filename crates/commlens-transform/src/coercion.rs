//! Cell coercion strategies for canonical columns.
//!
//! Every strategy is total: a malformed cell resolves to the column
//! default and is counted, never raised. Strategies also accept values
//! that are already in canonical form, so coercing a coerced column
//! returns it unchanged.

use commlens_ingest::parse_literal;
use commlens_model::{CellValue, Column};

/// How a canonical column's cells are settled on one type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoercionStrategy {
    /// Non-negative integer; absent or invalid becomes 0.
    Integer,
    /// Boolean; absent or unrecognized becomes false.
    Boolean,
    /// Textual list literal; failure or non-text input becomes `[]`.
    LiteralList,
    /// Textual list literal whose items are all records, else `[]`.
    RecordList,
    /// Text split on a delimiter into raw items, absent becomes `[]`.
    DelimitedList(char),
    /// Single string; absent becomes `""`, other values their text form.
    ScalarText,
    /// Free text; non-text values become their text form.
    FreeText,
    /// Number of non-empty entries in delimiter-joined text.
    EntryCount(char),
}

/// Result of coercing one column.
#[derive(Debug, Clone, PartialEq)]
pub struct CoercedColumn {
    pub column: Column,
    /// Present cells that could not be read and fell back to the default.
    pub defaulted: usize,
}

impl CoercionStrategy {
    pub fn display_name(self) -> &'static str {
        match self {
            Self::Integer => "Integer",
            Self::Boolean => "Boolean",
            Self::LiteralList => "Literal list",
            Self::RecordList => "Record list",
            Self::DelimitedList(_) => "Delimited list",
            Self::ScalarText => "Scalar text",
            Self::FreeText => "Free text",
            Self::EntryCount(_) => "Entry count",
        }
    }

    /// Coerces every cell of `source`, naming the output `target`.
    pub fn apply(self, source: &Column, target: &str) -> CoercedColumn {
        let mut defaulted = 0usize;
        let values = source
            .values
            .iter()
            .map(|cell| {
                let (value, fell_back) = self.coerce_cell(cell);
                if fell_back {
                    defaulted += 1;
                }
                value
            })
            .collect();
        CoercedColumn {
            column: Column::new(target, values),
            defaulted,
        }
    }

    /// Coerces a single cell. The flag is set when a present value was
    /// unreadable and replaced by the default.
    pub fn coerce_cell(self, cell: &CellValue) -> (CellValue, bool) {
        match self {
            Self::Integer => coerce_integer(cell),
            Self::Boolean => coerce_boolean(cell),
            Self::LiteralList => coerce_literal_list(cell, false),
            Self::RecordList => coerce_literal_list(cell, true),
            Self::DelimitedList(delimiter) => coerce_delimited(cell, delimiter),
            Self::ScalarText | Self::FreeText => (CellValue::Text(text_form(cell)), false),
            Self::EntryCount(delimiter) => coerce_entry_count(cell, delimiter),
        }
    }
}

fn text_form(cell: &CellValue) -> String {
    match cell {
        CellValue::Text(s) => s.clone(),
        other => other.to_string(),
    }
}

fn integer_from_f64(v: f64) -> Option<i64> {
    // i64::MAX is not exactly representable; stay strictly below it.
    if v.is_finite() && v >= 0.0 && v < 9.2e18 {
        Some(v.trunc() as i64)
    } else {
        None
    }
}

fn coerce_integer(cell: &CellValue) -> (CellValue, bool) {
    let parsed = match cell {
        CellValue::Missing => return (CellValue::Int(0), false),
        CellValue::Int(v) => (*v >= 0).then_some(*v),
        CellValue::Float(v) => integer_from_f64(*v),
        CellValue::Bool(b) => Some(i64::from(*b)),
        CellValue::Text(s) => {
            let trimmed = s.trim();
            trimmed
                .parse::<i64>()
                .ok()
                .filter(|v| *v >= 0)
                .or_else(|| trimmed.parse::<f64>().ok().and_then(integer_from_f64))
        }
        CellValue::List(_) | CellValue::Record(_) => None,
    };
    match parsed {
        Some(v) => (CellValue::Int(v), false),
        None => (CellValue::Int(0), true),
    }
}

fn coerce_boolean(cell: &CellValue) -> (CellValue, bool) {
    let parsed = match cell {
        CellValue::Missing => return (CellValue::Bool(false), false),
        CellValue::Bool(b) => Some(*b),
        CellValue::Int(v) => Some(*v != 0),
        CellValue::Float(v) => Some(*v != 0.0),
        CellValue::Text(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "t" | "yes" | "y" | "1" | "1.0" => Some(true),
            "false" | "f" | "no" | "n" | "0" | "0.0" | "" => Some(false),
            _ => None,
        },
        CellValue::List(_) | CellValue::Record(_) => None,
    };
    match parsed {
        Some(b) => (CellValue::Bool(b), false),
        None => (CellValue::Bool(false), true),
    }
}

fn coerce_literal_list(cell: &CellValue, records_only: bool) -> (CellValue, bool) {
    let accept = |items: &[CellValue]| {
        !records_only || items.iter().all(|item| matches!(item, CellValue::Record(_)))
    };
    let empty = CellValue::List(Vec::new());
    match cell {
        CellValue::Missing => (empty, false),
        CellValue::List(items) if accept(items.as_slice()) => (cell.clone(), false),
        CellValue::Text(s) => match parse_literal(s) {
            Ok(CellValue::List(items)) if accept(items.as_slice()) => {
                (CellValue::List(items), false)
            }
            _ => (empty, true),
        },
        _ => (empty, true),
    }
}

fn coerce_delimited(cell: &CellValue, delimiter: char) -> (CellValue, bool) {
    match cell {
        CellValue::Missing => (CellValue::List(Vec::new()), false),
        CellValue::List(items) if items.iter().all(|item| item.as_str().is_some()) => {
            (cell.clone(), false)
        }
        CellValue::Text(s) => (
            CellValue::List(s.split(delimiter).map(CellValue::text).collect()),
            false,
        ),
        _ => (CellValue::List(Vec::new()), true),
    }
}

/// Splits delimiter-joined text into trimmed, non-empty entries.
pub fn split_entries(text: &str, delimiter: char) -> Vec<&str> {
    text.split(delimiter)
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .collect()
}

fn coerce_entry_count(cell: &CellValue, delimiter: char) -> (CellValue, bool) {
    match cell {
        CellValue::Missing => (CellValue::Int(0), false),
        CellValue::Text(s) => (CellValue::Int(split_entries(s, delimiter).len() as i64), false),
        CellValue::List(items) => (CellValue::Int(items.len() as i64), false),
        _ => (CellValue::Int(0), true),
    }
}
