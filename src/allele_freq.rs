use anyhow::{Context, Result};
use ndarray::Axis;
use polars::prelude::*;
use tracing::info;

use crate::df_utils::{frame_from_columns, i64_values, replace_column};
use crate::error::RvSimError;
use crate::logging::log_frame_shape;
use crate::qc::{check_legend_rows, check_positive};
use crate::types::{AC, AF, CountTable, LEGEND_MAC};

pub fn count_column_names(population: Option<&str>) -> (String, String) {
    match population {
        Some(pop) => {
            let pop = pop.to_lowercase();
            (format!("{AC}_{pop}"), format!("{AF}_{pop}"))
        }
        None => (AC.to_string(), AF.to_string()),
    }
}

pub fn calc_allele_freqs(
    matrix: &ndarray::Array2<u8>,
    n: usize,
    population: Option<&str>,
) -> Result<CountTable> {
    check_positive(n as f64, "sample size")?;
    let denom = 2.0 * n as f64;

    let ac: Vec<i64> = matrix
        .axis_iter(Axis(0))
        .map(|row| row.iter().map(|&v| i64::from(v)).sum())
        .collect();
    let af: Vec<f64> = ac.iter().map(|&c| c as f64 / denom).collect();

    let (ac_name, af_name) = count_column_names(population);
    let df = frame_from_columns(
        ac.len(),
        vec![
            Series::new(ac_name.as_str().into(), ac).into(),
            Series::new(af_name.as_str().into(), af).into(),
        ],
    )?;
    log_frame_shape("allele counts", &df);
    Ok(CountTable { df, n: n as f64 })
}

pub fn merge_count_tables(own: &CountTable, refs: &[CountTable]) -> Result<CountTable> {
    let mut df = own.df.clone();
    for reference in refs {
        if reference.df.height() != df.height() {
            return Err(RvSimError::ShapeMismatch(format!(
                "reference count table has {} rows but sample table has {}",
                reference.df.height(),
                df.height()
            ))
            .into());
        }
        df = df
            .hstack(reference.df.get_columns())
            .context("merge reference counts")?;
    }
    info!(
        "Merged {} reference count tables ({} columns)",
        refs.len(),
        df.width()
    );
    Ok(CountTable { df, n: own.n })
}

pub fn add_mac(legend: &DataFrame, counts: &CountTable) -> Result<DataFrame> {
    check_legend_rows(legend, counts.df.height(), "count table")?;
    let total = (2.0 * counts.n).round() as i64;
    let mac: Vec<i64> = i64_values(&counts.df, AC)?
        .into_iter()
        .map(|ac| ac.min(total - ac).max(0))
        .collect();
    let mut out = legend.clone();
    replace_column(&mut out, LEGEND_MAC, mac)?;
    Ok(out)
}
