use polars::prelude::DataFrame;

use crate::error::{Result, RvSimError};

pub fn check_equal_length(
    left_len: usize,
    right_len: usize,
    left_name: &str,
    right_name: &str,
) -> Result<()> {
    if left_len != right_len {
        return Err(RvSimError::ShapeMismatch(format!(
            "{left_name} has {left_len} rows but {right_name} has {right_len}"
        )));
    }
    Ok(())
}

pub fn check_even_columns(ncols: usize) -> Result<()> {
    if ncols % 2 != 0 {
        return Err(RvSimError::OddHaplotypeColumns(ncols));
    }
    Ok(())
}

pub fn check_range_f64(value: f64, min: f64, max: f64, name: &str) -> Result<()> {
    if !value.is_finite() {
        return Err(RvSimError::InvalidArgument(format!(
            "Value of {name} should be finite"
        )));
    }
    if value <= min || value >= max {
        return Err(RvSimError::InvalidArgument(format!(
            "Value of {name} should lie strictly between {min} and {max}, got {value}"
        )));
    }
    Ok(())
}

pub fn check_positive(value: f64, name: &str) -> Result<()> {
    if !value.is_finite() || value <= 0.0 {
        return Err(RvSimError::InvalidArgument(format!(
            "{name} should be a positive number, got {value}"
        )));
    }
    Ok(())
}

pub fn check_legend_rows(legend: &DataFrame, rows: usize, table: &str) -> Result<()> {
    check_equal_length(legend.height(), rows, "legend", table)
}
