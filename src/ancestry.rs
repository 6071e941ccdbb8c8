use anyhow::{Context, Result};
use polars::prelude::*;
use tracing::{info, warn};

use crate::allele_freq::count_column_names;
use crate::df_utils::{f64_values, require_columns};
use crate::error::RvSimError;
use crate::logging::log_frame_shape;
use crate::qc::check_range_f64;
use crate::types::{AF, ProportionEstimate};

#[derive(Debug, Clone)]
pub struct EstimateRequest {
    pub table: DataFrame,
    pub reference_cols: Vec<String>,
    pub observed_col: String,
    pub goodness_of_fit: bool,
    /// Keep populations whose estimated proportion falls below 1%.
    pub keep_small_proportions: bool,
}

pub trait ProportionEstimator {
    fn estimate(&self, request: &EstimateRequest) -> Result<ProportionEstimate>;
}

pub fn reference_af_columns(populations: &[String]) -> Vec<String> {
    populations
        .iter()
        .map(|p| count_column_names(Some(p)).1)
        .collect()
}

fn is_common(af: f64, threshold: f64) -> bool {
    af > threshold && af < 1.0 - threshold
}

pub fn filter_common(table: &DataFrame, populations: &[String], threshold: f64) -> Result<DataFrame> {
    check_range_f64(threshold, 0.0, 0.5, "common variant threshold")?;
    let ref_cols = reference_af_columns(populations);
    let mut needed: Vec<&str> = vec![AF];
    needed.extend(ref_cols.iter().map(String::as_str));
    require_columns(table, &needed)?;

    let own = f64_values(table, AF)?;
    let refs = ref_cols
        .iter()
        .map(|c| f64_values(table, c))
        .collect::<Result<Vec<_>>>()?;

    let mask: BooleanChunked = (0..table.height())
        .map(|row| is_common(own[row], threshold) || refs.iter().any(|r| is_common(r[row], threshold)))
        .collect();
    let filtered = table.filter(&mask).context("filter common variants")?;
    log_frame_shape("common variants", &filtered);
    Ok(filtered)
}

pub fn est_props<E: ProportionEstimator + ?Sized>(
    table: &DataFrame,
    populations: &[String],
    threshold: f64,
    estimator: &E,
) -> Result<ProportionEstimate> {
    if populations.is_empty() {
        return Err(RvSimError::InvalidArgument(
            "at least one reference population is required".into(),
        )
        .into());
    }
    let common = filter_common(table, populations, threshold)?;
    let dropped = table.height() - common.height();
    if common.height() == 0 {
        warn!("No common variants left for ancestry estimation ({dropped} dropped)");
    } else {
        info!(
            "Estimating ancestry proportions from {} common variants ({dropped} rare dropped)",
            common.height()
        );
    }

    let request = EstimateRequest {
        table: common,
        reference_cols: reference_af_columns(populations),
        observed_col: AF.to_string(),
        goodness_of_fit: true,
        keep_small_proportions: true,
    };
    let estimate = estimator
        .estimate(&request)
        .context("external ancestry estimation")?;
    for (pop, value) in &estimate.proportions {
        info!("Estimated proportion {pop}: {value:.4}");
    }
    Ok(estimate)
}
