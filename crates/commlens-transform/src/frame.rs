//! Bridges canonical tables and rule metrics into polars frames for the
//! statistics layer.

use commlens_model::{CellValue, Column as TableColumn};
use polars::prelude::*;

use crate::metrics::ServerRuleMetrics;
use crate::normalize::CanonicalTable;

pub const RULE_COUNT: &str = "rule_count";
pub const MEAN_TOKENS: &str = "mean_tokens";
pub const STRICT_SHARE: &str = "strict_share";
pub const ENGLISH_SHARE: &str = "english_share";

/// Converts one table column when every present cell shares a scalar kind.
/// List and record columns are skipped.
fn to_polars(column: &TableColumn) -> Option<Column> {
    let name: PlSmallStr = column.name.as_str().into();
    let present = || column.values.iter().filter(|cell| !cell.is_missing());

    if present().all(|cell| matches!(cell, CellValue::Int(_))) {
        let values: Vec<Option<i64>> = column.values.iter().map(CellValue::as_i64).collect();
        return Some(Column::new(name, values));
    }
    if present().all(|cell| matches!(cell, CellValue::Int(_) | CellValue::Float(_))) {
        let values: Vec<Option<f64>> = column
            .values
            .iter()
            .map(|cell| match cell {
                CellValue::Int(v) => Some(*v as f64),
                CellValue::Float(v) => Some(*v),
                _ => None,
            })
            .collect();
        return Some(Column::new(name, values));
    }
    if present().all(|cell| matches!(cell, CellValue::Bool(_))) {
        let values: Vec<Option<bool>> = column.values.iter().map(CellValue::as_bool).collect();
        return Some(Column::new(name, values));
    }
    if present().all(|cell| matches!(cell, CellValue::Text(_))) {
        let values: Vec<Option<&str>> = column.values.iter().map(CellValue::as_str).collect();
        return Some(Column::new(name, values));
    }
    None
}

/// Scalar columns of a canonical table, one row per community.
pub fn community_frame(table: &CanonicalTable) -> PolarsResult<DataFrame> {
    let columns: Vec<Column> = table
        .table()
        .columns()
        .iter()
        .filter_map(to_polars)
        .collect();
    if columns.is_empty() {
        return Ok(DataFrame::empty());
    }
    DataFrame::new(columns)
}

/// [`community_frame`] joined row-wise with per-server rule metrics.
pub fn metrics_frame(
    table: &CanonicalTable,
    metrics: &[ServerRuleMetrics],
) -> PolarsResult<DataFrame> {
    let height = table.height();
    if metrics.len() != height {
        polars_bail!(
            ShapeMismatch: "{} metric rows for {} communities", metrics.len(), height
        );
    }
    let mut df = community_frame(table)?;
    let extra = [
        Column::new(
            RULE_COUNT.into(),
            metrics.iter().map(|m| m.rule_count as i64).collect::<Vec<_>>(),
        ),
        Column::new(
            MEAN_TOKENS.into(),
            metrics.iter().map(|m| m.mean_tokens).collect::<Vec<_>>(),
        ),
        Column::new(
            STRICT_SHARE.into(),
            metrics.iter().map(|m| m.strict_share).collect::<Vec<_>>(),
        ),
        Column::new(
            ENGLISH_SHARE.into(),
            metrics.iter().map(|m| m.english_share).collect::<Vec<_>>(),
        ),
    ];
    for column in extra {
        df.with_column(column)?;
    }
    Ok(df)
}
