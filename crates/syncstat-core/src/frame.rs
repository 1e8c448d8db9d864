use polars::prelude::*;

use crate::error::Result;

/// Column values as floats, or `None` when the frame has no such column.
/// Cells that cannot be read as numbers become nulls.
pub(crate) fn float_values(df: &DataFrame, name: &str) -> Result<Option<Vec<Option<f64>>>> {
    if df.get_column_index(name).is_none() {
        return Ok(None);
    }
    let column = df.column(name)?.cast(&DataType::Float64)?;
    let values = column.f64()?.into_iter().collect();
    Ok(Some(values))
}

pub(crate) fn int_values(df: &DataFrame, name: &str) -> Result<Option<Vec<Option<i64>>>> {
    if df.get_column_index(name).is_none() {
        return Ok(None);
    }
    let column = df.column(name)?.cast(&DataType::Int64)?;
    let values = column.i64()?.into_iter().collect();
    Ok(Some(values))
}

pub(crate) fn first_present<'a>(df: &DataFrame, names: &[&'a str]) -> Option<&'a str> {
    names
        .iter()
        .copied()
        .find(|name| df.get_column_index(name).is_some())
}

pub(crate) fn present(values: &[Option<f64>]) -> Vec<f64> {
    values
        .iter()
        .flatten()
        .copied()
        .filter(|value| value.is_finite())
        .collect()
}

pub(crate) fn take_rows(df: &DataFrame, rows: &[usize]) -> Result<DataFrame> {
    let indices: Vec<IdxSize> = rows.iter().map(|&row| row as IdxSize).collect();
    let indices = IdxCa::from_vec("row_index".into(), indices);
    Ok(df.take(&indices)?)
}
