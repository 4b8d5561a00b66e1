//! Column-oriented tables of loosely typed cells.
//!
//! Raw platform exports mix scalars, textual list literals and delimited
//! strings in the same file, so a cell carries its own type until the
//! normalizer settles each canonical column on one.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::SchemaError;

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value")]
pub enum CellValue {
    #[default]
    Missing,
    Text(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    List(Vec<CellValue>),
    Record(BTreeMap<String, CellValue>),
}

impl CellValue {
    pub fn text(value: impl Into<String>) -> Self {
        Self::Text(value.into())
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, Self::Missing)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[CellValue]> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_record(&self) -> Option<&BTreeMap<String, CellValue>> {
        match self {
            Self::Record(fields) => Some(fields),
            _ => None,
        }
    }

    /// Short type label used in error messages and coercion traces.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Missing => "missing",
            Self::Text(_) => "text",
            Self::Int(_) => "int",
            Self::Float(_) => "float",
            Self::Bool(_) => "bool",
            Self::List(_) => "list",
            Self::Record(_) => "record",
        }
    }

    fn fmt_nested(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(s) => write!(f, "'{}'", s.replace('\'', "\\'")),
            other => write!(f, "{other}"),
        }
    }
}

/// Formats a float without trailing zeros.
pub fn format_numeric(v: f64) -> String {
    let s = format!("{v}");
    if s.contains('.') {
        s.trim_end_matches('0').trim_end_matches('.').to_string()
    } else {
        s
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Missing => Ok(()),
            Self::Text(s) => f.write_str(s),
            Self::Int(v) => write!(f, "{v}"),
            Self::Float(v) => f.write_str(&format_numeric(*v)),
            Self::Bool(v) => write!(f, "{v}"),
            Self::List(items) => {
                f.write_str("[")?;
                for (idx, item) in items.iter().enumerate() {
                    if idx > 0 {
                        f.write_str(", ")?;
                    }
                    item.fmt_nested(f)?;
                }
                f.write_str("]")
            }
            Self::Record(fields) => {
                f.write_str("{")?;
                for (idx, (key, value)) in fields.iter().enumerate() {
                    if idx > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "'{key}': ")?;
                    value.fmt_nested(f)?;
                }
                f.write_str("}")
            }
        }
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for CellValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<i64> for CellValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<bool> for CellValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    pub values: Vec<CellValue>,
}

impl Column {
    pub fn new(name: impl Into<String>, values: Vec<CellValue>) -> Self {
        Self {
            name: name.into(),
            values,
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }
}

/// A set of equally long, uniquely named columns.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Table {
    columns: Vec<Column>,
}

impl Table {
    pub fn new(columns: Vec<Column>) -> Result<Self, SchemaError> {
        let mut table = Self::default();
        for column in columns {
            if table.column(&column.name).is_some() {
                return Err(SchemaError::DuplicateColumn(column.name));
            }
            table.push_column(column)?;
        }
        Ok(table)
    }

    /// Builds a table from a header and row-major text records.
    ///
    /// Short records are padded with missing cells.
    pub fn from_rows(headers: &[String], rows: Vec<Vec<CellValue>>) -> Result<Self, SchemaError> {
        let mut columns: Vec<Column> = headers
            .iter()
            .map(|name| Column::new(name.clone(), Vec::with_capacity(rows.len())))
            .collect();
        for row in rows {
            let mut cells = row.into_iter();
            for column in &mut columns {
                column.values.push(cells.next().unwrap_or_default());
            }
        }
        Self::new(columns)
    }

    pub fn height(&self) -> usize {
        self.columns.first().map_or(0, Column::len)
    }

    pub fn width(&self) -> usize {
        self.columns.len()
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn into_columns(self) -> Vec<Column> {
        self.columns
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn get(&self, row: usize, column: &str) -> Option<&CellValue> {
        self.column(column).and_then(|c| c.values.get(row))
    }

    /// Replaces the column with the same name, or appends it.
    pub fn with_column(&mut self, column: Column) -> Result<(), SchemaError> {
        if let Some(pos) = self.columns.iter().position(|c| c.name == column.name) {
            self.check_height(&column)?;
            self.columns[pos] = column;
            Ok(())
        } else {
            self.push_column(column)
        }
    }

    /// Keeps only the named columns that exist, in the given order.
    pub fn select(&self, names: &[&str]) -> Self {
        let columns = names
            .iter()
            .filter_map(|name| self.column(name).cloned())
            .collect();
        Self { columns }
    }

    fn push_column(&mut self, column: Column) -> Result<(), SchemaError> {
        if !self.columns.is_empty() {
            self.check_height(&column)?;
        }
        self.columns.push(column);
        Ok(())
    }

    fn check_height(&self, column: &Column) -> Result<(), SchemaError> {
        let expected = self.height();
        if column.len() != expected {
            return Err(SchemaError::ColumnLength {
                column: column.name.clone(),
                expected,
                actual: column.len(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn list_display_quotes_nested_text() {
        let cell = CellValue::List(vec![CellValue::text("en"), CellValue::Int(3)]);
        assert_eq!(cell.to_string(), "['en', 3]");
    }

    #[test]
    fn float_display_strips_trailing_zeros() {
        assert_eq!(CellValue::Float(10.0).to_string(), "10");
        assert_eq!(CellValue::Float(2.50).to_string(), "2.5");
    }

    #[test]
    fn table_rejects_ragged_columns() {
        let result = Table::new(vec![
            Column::new("a", vec![CellValue::Int(1)]),
            Column::new("b", vec![]),
        ]);
        assert!(matches!(result, Err(SchemaError::ColumnLength { .. })));
    }

    #[test]
    fn from_rows_pads_short_records() {
        let headers = vec!["a".to_string(), "b".to_string()];
        let table = Table::from_rows(&headers, vec![vec![CellValue::text("x")]]).unwrap();
        assert_eq!(table.height(), 1);
        assert_eq!(table.get(0, "b"), Some(&CellValue::Missing));
    }
}
