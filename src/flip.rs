use std::collections::HashSet;

use anyhow::{Context, Result};
use ndarray::Axis;
use polars::prelude::*;
use tracing::{debug, info};

use crate::df_utils::{f64_values, i64_values, replace_column, string_values};
use crate::error::RvSimError;
use crate::qc::{check_legend_rows, check_range_f64};
use crate::types::{
    AC, AF, ControlConfig, CountTable, GenotypeMatrix, LEGEND_ALT, LEGEND_REF, TableKind,
};

#[derive(Debug, Clone)]
pub enum FlipTable {
    Frame(DataFrame),
    Matrix(ndarray::Array2<u8>),
}

fn row_set(rows: &[usize], height: usize) -> Result<HashSet<usize>> {
    if let Some(bad) = rows.iter().find(|r| **r >= height) {
        return Err(RvSimError::InvalidArgument(format!(
            "flip row {bad} outside table of {height} rows"
        ))
        .into());
    }
    Ok(rows.iter().copied().collect())
}

pub fn flag_flip_rows(counts: &DataFrame, threshold: f64) -> Result<Vec<usize>> {
    check_range_f64(threshold, 0.0, 0.5, "flip threshold")?;
    let cutoff = 1.0 - threshold;
    let rows: Vec<usize> = f64_values(counts, AF)?
        .into_iter()
        .enumerate()
        .filter(|(_, af)| *af > cutoff)
        .map(|(row, _)| row)
        .collect();
    info!("Flagged {} variants with af > {cutoff}", rows.len());
    Ok(rows)
}

pub fn flip_legend(legend: &DataFrame, rows: &[usize]) -> Result<DataFrame> {
    let flip = row_set(rows, legend.height())?;
    let mut reference = string_values(legend, LEGEND_REF)?;
    let mut alternate = string_values(legend, LEGEND_ALT)?;
    for row in &flip {
        std::mem::swap(&mut reference[*row], &mut alternate[*row]);
    }
    let mut out = legend.clone();
    replace_column(&mut out, LEGEND_REF, reference)?;
    replace_column(&mut out, LEGEND_ALT, alternate)?;
    Ok(out)
}

/// Re-codes `rows` as `ploidy - v`; 2 for genotypes, 1 for haplotypes.
pub fn flip_matrix(
    matrix: &ndarray::Array2<u8>,
    rows: &[usize],
    ploidy: u8,
) -> Result<ndarray::Array2<u8>> {
    let flip = row_set(rows, matrix.nrows())?;
    let mut out = matrix.clone();
    for (idx, mut row) in out.axis_iter_mut(Axis(0)).enumerate() {
        if !flip.contains(&idx) {
            continue;
        }
        for value in row.iter_mut() {
            let current = *value;
            *value = ploidy.checked_sub(current).ok_or_else(|| {
                RvSimError::InvalidArgument(format!(
                    "value {current} at row {idx} exceeds ploidy {ploidy}"
                ))
            })?;
        }
    }
    Ok(out)
}

pub fn flip_counts(counts: &CountTable, rows: &[usize]) -> Result<CountTable> {
    let flip = row_set(rows, counts.df.height())?;
    let total = 2.0 * counts.n;
    let mut ac = i64_values(&counts.df, AC)?;
    let mut af = f64_values(&counts.df, AF)?;
    for row in &flip {
        let exact = af[*row] == ac[*row] as f64 / total;
        ac[*row] = (total - ac[*row] as f64).round() as i64;
        // adjusted tables carry af independent of ac
        af[*row] = if exact {
            ac[*row] as f64 / total
        } else {
            1.0 - af[*row]
        };
    }
    let mut df = counts.df.clone();
    replace_column(&mut df, AC, ac)?;
    replace_column(&mut df, AF, af)?;
    Ok(CountTable { df, n: counts.n })
}

pub fn flip_file(
    table: FlipTable,
    kind: TableKind,
    rows: &[usize],
    n: Option<f64>,
) -> Result<FlipTable> {
    match (kind, table) {
        (TableKind::Legend, FlipTable::Frame(df)) => Ok(FlipTable::Frame(flip_legend(&df, rows)?)),
        (TableKind::Genotype, FlipTable::Matrix(m)) => Ok(FlipTable::Matrix(flip_matrix(&m, rows, 2)?)),
        (TableKind::Haplotype, FlipTable::Matrix(m)) => Ok(FlipTable::Matrix(flip_matrix(&m, rows, 1)?)),
        (TableKind::Count, FlipTable::Frame(df)) => {
            let n = n.ok_or_else(|| {
                RvSimError::InvalidArgument("flipping a count table requires its sample size".into())
            })?;
            Ok(FlipTable::Frame(flip_counts(&CountTable { df, n }, rows)?.df))
        }
        (kind, FlipTable::Frame(_)) => Err(RvSimError::UnsupportedTableKind(format!(
            "{kind} cannot be applied to a data frame"
        ))
        .into()),
        (kind, FlipTable::Matrix(_)) => Err(RvSimError::UnsupportedTableKind(format!(
            "{kind} cannot be applied to a matrix"
        ))
        .into()),
    }
}

#[derive(Debug, Clone)]
pub struct FlipInputs {
    pub legend: DataFrame,
    pub case_geno: GenotypeMatrix,
    pub case_counts: CountTable,
    pub internal_geno: Option<GenotypeMatrix>,
    pub internal_counts: Option<CountTable>,
    pub external_counts: Option<CountTable>,
    pub external_adjusted_counts: Option<CountTable>,
}

#[derive(Debug, Clone)]
pub struct FlipOutputs {
    pub legend: DataFrame,
    pub case_geno: GenotypeMatrix,
    pub case_counts: CountTable,
    pub internal_geno: Option<GenotypeMatrix>,
    pub internal_counts: Option<CountTable>,
    pub external_counts: Option<CountTable>,
    pub external_adjusted_counts: Option<CountTable>,
}

impl From<FlipInputs> for FlipOutputs {
    fn from(inputs: FlipInputs) -> Self {
        FlipOutputs {
            legend: inputs.legend,
            case_geno: inputs.case_geno,
            case_counts: inputs.case_counts,
            internal_geno: inputs.internal_geno,
            internal_counts: inputs.internal_counts,
            external_counts: inputs.external_counts,
            external_adjusted_counts: inputs.external_adjusted_counts,
        }
    }
}

fn required<'a, T>(table: &'a Option<T>, config: ControlConfig, name: &str) -> Result<&'a T> {
    table.as_ref().ok_or_else(|| {
        RvSimError::InvalidArgument(format!("control configuration {config:?} requires {name}"))
            .into()
    })
}

struct Flipped {
    legend: DataFrame,
    case_geno: GenotypeMatrix,
    case_counts: CountTable,
}

fn flip_cases(inputs: &FlipInputs, rows: &[usize]) -> Result<Flipped> {
    check_legend_rows(&inputs.legend, inputs.case_geno.nrows(), "case genotypes")?;
    check_legend_rows(&inputs.legend, inputs.case_counts.df.height(), "case counts")?;
    Ok(Flipped {
        legend: flip_legend(&inputs.legend, rows).context("flip legend")?,
        case_geno: flip_matrix(&inputs.case_geno, rows, 2).context("flip case genotypes")?,
        case_counts: flip_counts(&inputs.case_counts, rows).context("flip case counts")?,
    })
}

fn flip_internal(
    inputs: &FlipInputs,
    rows: &[usize],
    config: ControlConfig,
) -> Result<(GenotypeMatrix, CountTable)> {
    let geno = required(&inputs.internal_geno, config, "internal control genotypes")?;
    let counts = required(&inputs.internal_counts, config, "internal control counts")?;
    check_legend_rows(&inputs.legend, geno.nrows(), "internal control genotypes")?;
    check_legend_rows(&inputs.legend, counts.df.height(), "internal control counts")?;
    Ok((
        flip_matrix(geno, rows, 2).context("flip internal control genotypes")?,
        flip_counts(counts, rows).context("flip internal control counts")?,
    ))
}

fn flip_external(inputs: &FlipInputs, rows: &[usize], config: ControlConfig) -> Result<CountTable> {
    let counts = required(&inputs.external_counts, config, "external control counts")?;
    check_legend_rows(&inputs.legend, counts.df.height(), "external control counts")?;
    flip_counts(counts, rows).context("flip external control counts")
}

fn flip_external_adjusted(
    inputs: &FlipInputs,
    rows: &[usize],
    config: ControlConfig,
) -> Result<CountTable> {
    let counts = required(
        &inputs.external_adjusted_counts,
        config,
        "adjusted external control counts",
    )?;
    check_legend_rows(&inputs.legend, counts.df.height(), "adjusted external control counts")?;
    flip_counts(counts, rows).context("flip adjusted external control counts")
}

fn assemble(
    cases: Flipped,
    internal: Option<(GenotypeMatrix, CountTable)>,
    external_counts: Option<CountTable>,
    external_adjusted_counts: Option<CountTable>,
) -> FlipOutputs {
    let (internal_geno, internal_counts) = internal.unzip();
    FlipOutputs {
        legend: cases.legend,
        case_geno: cases.case_geno,
        case_counts: cases.case_counts,
        internal_geno,
        internal_counts,
        external_counts,
        external_adjusted_counts,
    }
}

/// An empty `rows` returns the inputs untouched, including controls the
/// configuration would otherwise leave out.
pub fn flip_data(inputs: FlipInputs, rows: &[usize], config: ControlConfig) -> Result<FlipOutputs> {
    if rows.is_empty() {
        debug!("No variants to flip");
        return Ok(inputs.into());
    }
    info!("Flipping {} variants ({config:?})", rows.len());

    let cases = flip_cases(&inputs, rows)?;
    let out = match config {
        ControlConfig::InternalOnly => {
            assemble(cases, Some(flip_internal(&inputs, rows, config)?), None, None)
        }
        ControlConfig::ExternalOnly => {
            assemble(cases, None, Some(flip_external(&inputs, rows, config)?), None)
        }
        ControlConfig::ExternalAdjusted => assemble(
            cases,
            None,
            None,
            Some(flip_external_adjusted(&inputs, rows, config)?),
        ),
        ControlConfig::InternalExternal => assemble(
            cases,
            Some(flip_internal(&inputs, rows, config)?),
            Some(flip_external(&inputs, rows, config)?),
            None,
        ),
        ControlConfig::InternalExternalAdjusted => assemble(
            cases,
            Some(flip_internal(&inputs, rows, config)?),
            None,
            Some(flip_external_adjusted(&inputs, rows, config)?),
        ),
    };
    Ok(out)
}
