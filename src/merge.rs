use std::collections::HashSet;

use anyhow::Result;
use ndarray::Axis;
use polars::prelude::DataFrame;
use tracing::info;

use crate::df_utils::string_values;
use crate::error::RvSimError;
use crate::qc::check_legend_rows;
use crate::types::{HaplotypeMatrix, LEGEND_GENE};

pub fn merge_cases(
    power: &HaplotypeMatrix,
    t1e: &HaplotypeMatrix,
    legend: &DataFrame,
    power_genes: &HashSet<String>,
) -> Result<HaplotypeMatrix> {
    if power.dim() != t1e.dim() {
        return Err(RvSimError::ShapeMismatch(format!(
            "power haplotypes are {:?} but type I error haplotypes are {:?}",
            power.dim(),
            t1e.dim()
        ))
        .into());
    }
    check_legend_rows(legend, power.nrows(), "case haplotypes")?;

    let genes = string_values(legend, LEGEND_GENE)?;
    let mut merged = t1e.clone();
    let mut from_power = 0usize;
    for (pos, gene) in genes.iter().enumerate() {
        if power_genes.contains(gene) {
            merged
                .index_axis_mut(Axis(0), pos)
                .assign(&power.index_axis(Axis(0), pos));
            from_power += 1;
        }
    }
    info!(
        "Merged cases: {from_power} variants from power genes, {} from type I error genes",
        genes.len() - from_power
    );
    Ok(merged)
}
