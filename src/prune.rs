use std::collections::{BTreeSet, HashMap};

use anyhow::Result;
use ndarray::Axis;
use polars::prelude::DataFrame;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::df_utils::i64_values;
use crate::error::RvSimError;
use crate::parallel::{collect_results, resolve_threads, run_in_pool};
use crate::qc::check_legend_rows;
use crate::types::{HaplotypeMatrix, LEGEND_MAC, LEGEND_ROW, MacBin};

#[derive(Debug, Clone)]
pub struct ReplicateConfig {
    pub seed: u64,
    pub replicates: usize,
    pub parallel: bool,
    pub cores: Option<usize>,
}

fn check_bins(bins: &[MacBin]) -> Result<()> {
    for bin in bins {
        if bin.lower > bin.upper {
            return Err(RvSimError::InvalidArgument(format!(
                "MAC bin lower bound {} exceeds upper bound {}",
                bin.lower, bin.upper
            ))
            .into());
        }
        if !bin.expected_var.is_finite() || bin.expected_var < 0.0 {
            return Err(RvSimError::InvalidArgument(format!(
                "MAC bin [{}, {}] has invalid expected count {}",
                bin.lower, bin.upper, bin.expected_var
            ))
            .into());
        }
    }
    Ok(())
}

/// Every legend row whose `mac` falls in a bin draws one uniform value and is
/// marked for removal when the draw exceeds `expected_var / rows_in_bin`.
pub fn select_var<R: Rng>(
    legend: &DataFrame,
    bins: &[MacBin],
    rng: &mut R,
) -> Result<Vec<usize>> {
    check_bins(bins)?;
    let mac = i64_values(legend, LEGEND_MAC)?;
    let rows = i64_values(legend, LEGEND_ROW)?;

    let mut remove = BTreeSet::new();
    for bin in bins {
        let candidates: Vec<usize> = mac
            .iter()
            .enumerate()
            .filter(|(_, m)| u32::try_from(**m).is_ok_and(|m| bin.contains(m)))
            .map(|(pos, _)| pos)
            .collect();
        if candidates.is_empty() {
            warn!("MAC bin [{}, {}] has no variants", bin.lower, bin.upper);
            continue;
        }

        let keep_prob = bin.expected_var / candidates.len() as f64;
        let before = remove.len();
        for pos in candidates.iter().copied() {
            let draw: f64 = rng.random();
            if draw > keep_prob {
                let row = usize::try_from(rows[pos]).map_err(|_| {
                    RvSimError::InvalidArgument(format!("negative legend row {}", rows[pos]))
                })?;
                remove.insert(row);
            }
        }
        debug!(
            "MAC bin [{}, {}]: {} candidates, keep probability {keep_prob:.3}, {} removed",
            bin.lower,
            bin.upper,
            candidates.len(),
            remove.len() - before
        );
    }

    info!("Selected {} variants for pruning", remove.len());
    Ok(remove.into_iter().collect())
}

/// Replicate `i` is seeded with `seed + i`, wrapping at `u64::MAX`.
pub fn select_var_replicates(
    legend: &DataFrame,
    bins: &[MacBin],
    config: &ReplicateConfig,
) -> Result<Vec<Vec<usize>>> {
    let seeds: Vec<u64> = (0..config.replicates as u64)
        .map(|i| config.seed.wrapping_add(i))
        .collect();
    let run_one = |seed: u64| {
        let mut rng = StdRng::seed_from_u64(seed);
        select_var(legend, bins, &mut rng)
    };

    if config.parallel {
        let cores = resolve_threads(config.cores, config.replicates);
        let results = run_in_pool(cores, "build pruning thread pool", || {
            seeds.par_iter().map(|seed| run_one(*seed)).collect::<Vec<_>>()
        })?;
        collect_results(results)
    } else {
        seeds.into_iter().map(run_one).collect()
    }
}

pub fn prune_var(
    haps: &HaplotypeMatrix,
    legend: &DataFrame,
    remove: &[usize],
) -> Result<HaplotypeMatrix> {
    check_legend_rows(legend, haps.nrows(), "haplotypes")?;
    let position: HashMap<i64, usize> = i64_values(legend, LEGEND_ROW)?
        .into_iter()
        .enumerate()
        .map(|(pos, row)| (row, pos))
        .collect();

    let mut out = haps.clone();
    for row in remove {
        let pos = *position.get(&(*row as i64)).ok_or_else(|| {
            RvSimError::InvalidArgument(format!("pruned row {row} not present in legend"))
        })?;
        out.index_axis_mut(Axis(0), pos).fill(0);
    }
    info!(
        "Pruned {} of {} variants to reference-only rows",
        remove.len(),
        haps.nrows()
    );
    Ok(out)
}
