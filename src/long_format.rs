use anyhow::Result;
use polars::prelude::*;
use tracing::info;

use crate::df_utils::{frame_from_columns, i64_values, string_values};
use crate::error::RvSimError;
use crate::qc::check_legend_rows;
use crate::types::{AC, CountTable, LEGEND_FUN, LEGEND_GENE, LEGEND_ID};

pub const LONG_CASE: &str = "case";
pub const LONG_GROUP: &str = "group";

pub fn make_long(
    counts: &CountTable,
    legend: &DataFrame,
    case: &str,
    group: &str,
) -> Result<DataFrame> {
    check_legend_rows(legend, counts.df.height(), "count table")?;
    let ac = i64_values(&counts.df, AC)?;
    let ids = string_values(legend, LEGEND_ID)?;
    let genes = string_values(legend, LEGEND_GENE)?;
    let funs = string_values(legend, LEGEND_FUN)?;

    if let Some((row, bad)) = ac.iter().enumerate().find(|(_, c)| **c < 0) {
        return Err(RvSimError::InvalidArgument(format!(
            "negative allele count {bad} at row {row}"
        ))
        .into());
    }
    let total: usize = ac.iter().map(|c| *c as usize).sum();

    let mut id_out = Vec::with_capacity(total);
    let mut gene_out = Vec::with_capacity(total);
    let mut fun_out = Vec::with_capacity(total);
    for (row, count) in ac.iter().enumerate() {
        for _ in 0..*count {
            id_out.push(ids[row].clone());
            gene_out.push(genes[row].clone());
            fun_out.push(funs[row].clone());
        }
    }

    let df = frame_from_columns(
        total,
        vec![
            Series::new(LEGEND_ID.into(), id_out).into(),
            Series::new(LEGEND_GENE.into(), gene_out).into(),
            Series::new(LEGEND_FUN.into(), fun_out).into(),
            Series::new(LONG_CASE.into(), vec![case.to_string(); total]).into(),
            Series::new(LONG_GROUP.into(), vec![group.to_string(); total]).into(),
        ],
    )?;
    info!("Expanded {} variants into {total} allele records ({case}, {group})", ac.len());
    Ok(df)
}
