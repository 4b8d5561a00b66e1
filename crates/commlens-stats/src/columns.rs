//! Numeric views of polars frames.

use polars::prelude::*;

use crate::error::Result;

/// A column cast to `f64`; nulls stay `None`.
pub fn numeric_column(df: &DataFrame, name: &str) -> Result<Vec<Option<f64>>> {
    let column = df.column(name)?.cast(&DataType::Float64)?;
    Ok(column.f64()?.into_iter().collect())
}

/// Rows where every named column holds a finite value, as one vector per
/// column in the order given.
pub fn complete_columns(df: &DataFrame, names: &[&str]) -> Result<Vec<Vec<f64>>> {
    let raw = names
        .iter()
        .map(|name| numeric_column(df, name))
        .collect::<Result<Vec<_>>>()?;
    let mut out = vec![Vec::with_capacity(df.height()); names.len()];
    for row in 0..df.height() {
        let values: Option<Vec<f64>> = raw
            .iter()
            .map(|column| column[row].filter(|v| v.is_finite()))
            .collect();
        if let Some(values) = values {
            for (target, value) in out.iter_mut().zip(values) {
                target.push(value);
            }
        }
    }
    Ok(out)
}

/// Two columns with incomplete rows dropped.
pub fn paired_columns(df: &DataFrame, x: &str, y: &str) -> Result<(Vec<f64>, Vec<f64>)> {
    let mut columns = complete_columns(df, &[x, y])?;
    let y_values = columns.pop().unwrap_or_default();
    let x_values = columns.pop().unwrap_or_default();
    Ok((x_values, y_values))
}
