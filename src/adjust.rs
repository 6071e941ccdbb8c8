use anyhow::{Context, Result};
use polars::prelude::*;
use tracing::{info, warn};

use crate::ancestry::reference_af_columns;
use crate::df_utils::{frame_from_columns, replace_column, require_columns};
use crate::error::RvSimError;
use crate::qc::{check_equal_length, check_positive};
use crate::types::{AC, AF, CountTable, ProportionEstimate};

pub const ADJUST_INDEX: &str = "row_idx";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdjustMethod {
    Average,
    LeaveOneOut,
}

#[derive(Debug, Clone)]
pub struct AdjustRequest {
    pub table: DataFrame,
    pub index_col: String,
    pub reference_cols: Vec<String>,
    pub observed_col: String,
    pub target_props: Vec<f64>,
    pub observed_props: Vec<f64>,
    pub reference_sizes: Vec<f64>,
    pub observed_size: f64,
    pub method: AdjustMethod,
    pub filter: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IndexedAf {
    pub index: usize,
    pub af: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AdjustedAf {
    pub rows: Vec<IndexedAf>,
    pub effective_n: f64,
}

/// External allele-frequency adjustment routine. It may omit rows it cannot
/// adjust but must key every returned value by the request's index column.
pub trait AfAdjuster {
    fn adjust(&self, request: &AdjustRequest) -> Result<AdjustedAf>;
}

#[derive(Debug, Clone)]
pub struct AdjustConfig {
    pub populations: Vec<String>,
    pub reference_sizes: Vec<f64>,
    pub observed_n: f64,
    pub use_effective_n: bool,
}

#[derive(Debug, Clone)]
pub struct AdjustedCounts {
    pub counts: CountTable,
    pub effective_n: Option<f64>,
    pub dropped: usize,
}

/// The output is aligned row-for-row with `table`. Rows the external routine
/// drops come back as monomorphic (ac = 0, af = 0).
pub fn adjust_af<A: AfAdjuster + ?Sized>(
    table: &DataFrame,
    case_est: &ProportionEstimate,
    control_est: &ProportionEstimate,
    config: &AdjustConfig,
    adjuster: &A,
) -> Result<AdjustedCounts> {
    check_equal_length(
        config.populations.len(),
        config.reference_sizes.len(),
        "populations",
        "reference sample sizes",
    )?;
    check_positive(config.observed_n, "observed sample size")?;

    let reference_cols = reference_af_columns(&config.populations);
    let mut needed: Vec<&str> = vec![AF];
    needed.extend(reference_cols.iter().map(String::as_str));
    require_columns(table, &needed)?;

    let height = table.height();
    let mut indexed = table.clone();
    replace_column(&mut indexed, ADJUST_INDEX, (0..height as i64).collect::<Vec<_>>())?;

    let request = AdjustRequest {
        table: indexed,
        index_col: ADJUST_INDEX.to_string(),
        target_props: case_est.ordered(&config.populations)?,
        observed_props: control_est.ordered(&config.populations)?,
        reference_cols,
        observed_col: AF.to_string(),
        reference_sizes: config.reference_sizes.clone(),
        observed_size: config.observed_n,
        method: AdjustMethod::Average,
        filter: true,
    };
    let adjusted = adjuster
        .adjust(&request)
        .context("external allele frequency adjustment")?;

    let mut af = vec![0.0_f64; height];
    let mut seen = vec![false; height];
    for IndexedAf { index, af: value } in &adjusted.rows {
        let slot = af.get_mut(*index).ok_or_else(|| {
            RvSimError::InvalidArgument(format!(
                "adjuster returned row index {index} for a table of {height} rows"
            ))
        })?;
        *slot = *value;
        seen[*index] = true;
    }
    let dropped = seen.iter().filter(|s| !**s).count();
    if dropped > 0 {
        warn!("{dropped} of {height} variants were not adjusted; treating them as monomorphic");
    }

    let n_used = if config.use_effective_n {
        check_positive(adjusted.effective_n, "effective sample size")?;
        adjusted.effective_n
    } else {
        config.observed_n
    };
    let ac: Vec<i64> = af.iter().map(|v| (v * 2.0 * n_used).round() as i64).collect();

    let df = frame_from_columns(
        height,
        vec![
            Series::new(AC.into(), ac).into(),
            Series::new(AF.into(), af).into(),
        ],
    )?;
    info!("Adjusted allele frequencies for {} variants (N = {n_used:.1})", height - dropped);

    Ok(AdjustedCounts {
        counts: CountTable { df, n: n_used },
        effective_n: config.use_effective_n.then_some(adjusted.effective_n),
        dropped,
    })
}
