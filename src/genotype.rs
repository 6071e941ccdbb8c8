use anyhow::Result;
use ndarray::{Array2, Axis};
use tracing::info;

use crate::logging::log_matrix_shape;
use crate::qc::check_even_columns;
use crate::types::{GenotypeMatrix, HaplotypeMatrix};

pub fn make_geno(haps: &HaplotypeMatrix) -> Result<GenotypeMatrix> {
    let (n_var, n_hap) = haps.dim();
    check_even_columns(n_hap)?;

    let n_ind = n_hap / 2;
    let mut geno = Array2::<u8>::zeros((n_var, n_ind));
    for (mut out_row, hap_row) in geno.axis_iter_mut(Axis(0)).zip(haps.axis_iter(Axis(0))) {
        for (ind, dosage) in out_row.iter_mut().enumerate() {
            *dosage = hap_row[2 * ind] + hap_row[2 * ind + 1];
        }
    }

    log_matrix_shape("genotypes", geno.dim());
    info!("Built genotypes for {n_ind} individuals across {n_var} variants");
    Ok(geno)
}
