use anyhow::{Context, Result};
use polars::prelude::*;

use crate::error::RvSimError;

pub fn frame_from_columns(height: usize, columns: Vec<Column>) -> Result<DataFrame> {
    let mut df = DataFrame::empty();
    for column in columns {
        if column.len() != height {
            return Err(RvSimError::ShapeMismatch(format!(
                "column {} has {} rows, expected {height}",
                column.name(),
                column.len()
            ))
            .into());
        }
        df.with_column(column).context("assemble data frame")?;
    }
    Ok(df)
}

pub fn require_column<'a>(df: &'a DataFrame, name: &str) -> Result<&'a Column> {
    Ok(df
        .column(name)
        .map_err(|_| RvSimError::MissingColumn(name.to_string()))?)
}

pub fn require_columns(df: &DataFrame, names: &[&str]) -> Result<()> {
    for name in names {
        require_column(df, name)?;
    }
    Ok(())
}

pub fn f64_values(df: &DataFrame, name: &str) -> Result<Vec<f64>> {
    let casted = require_column(df, name)?
        .cast(&DataType::Float64)
        .with_context(|| format!("cast {name} to Float64"))?;
    Ok(casted
        .f64()?
        .into_iter()
        .map(|v| v.unwrap_or(f64::NAN))
        .collect())
}

pub fn i64_values(df: &DataFrame, name: &str) -> Result<Vec<i64>> {
    let casted = require_column(df, name)?
        .cast(&DataType::Int64)
        .with_context(|| format!("cast {name} to Int64"))?;
    let values = casted
        .i64()?
        .into_iter()
        .enumerate()
        .map(|(row, v)| -> Result<i64> {
            Ok(v.ok_or_else(|| {
                RvSimError::InvalidArgument(format!(
                    "{name} is missing or not an integer at row {row}"
                ))
            })?)
        })
        .collect();
    values
}

pub fn string_values(df: &DataFrame, name: &str) -> Result<Vec<String>> {
    let casted = require_column(df, name)?
        .cast(&DataType::String)
        .with_context(|| format!("cast {name} to String"))?;
    Ok(casted
        .str()?
        .into_iter()
        .map(|v| v.unwrap_or("").to_string())
        .collect())
}

pub fn replace_column<T>(df: &mut DataFrame, name: &str, values: Vec<T>) -> Result<()>
where
    Series: NamedFrom<Vec<T>, [T]>,
{
    let series = Series::new(name.into(), values);
    df.with_column(series.into_column())
        .with_context(|| format!("replace column {name}"))?;
    Ok(())
}

pub fn with_row_index(mut df: DataFrame, name: &str) -> Result<DataFrame> {
    if df.column(name).is_ok() {
        return Ok(df);
    }
    let rows: Vec<i64> = (0..df.height() as i64).collect();
    replace_column(&mut df, name, rows)?;
    Ok(df)
}

pub fn ensure_utf8(mut df: DataFrame, cols: &[&str]) -> Result<DataFrame> {
    for col in cols {
        if let Ok(column) = df.column(col)
            && column.dtype() != &DataType::String
        {
            let casted = column.cast(&DataType::String)?;
            df.with_column(casted)?;
        }
    }
    Ok(df)
}

pub fn ensure_f64(mut df: DataFrame, cols: &[&str]) -> Result<DataFrame> {
    for col in cols {
        if let Ok(column) = df.column(col)
            && column.dtype() != &DataType::Float64
        {
            let casted = column.cast(&DataType::Float64)?;
            df.with_column(casted)?;
        }
    }
    Ok(df)
}
