mod common;

use ndarray::array;
use rvsim_prep::allele_freq::{add_mac, calc_allele_freqs, merge_count_tables};
use rvsim_prep::error::RvSimError;
use rvsim_prep::genotype::make_geno;

use common::{column_f64, column_i64, counts, legend};

#[test]
fn genotypes_sum_haplotype_pairs() {
    let haps = array![[0u8, 1, 1, 0], [1, 1, 0, 0]];
    let geno = make_geno(&haps).expect("make geno");
    assert_eq!(geno, array![[1u8, 1], [2, 0]]);
}

#[test]
fn genotypes_stay_within_ploidy() {
    let haps = array![[1u8, 1, 1, 1, 0, 0], [0, 0, 0, 1, 1, 1], [1, 0, 0, 0, 0, 1]];
    let geno = make_geno(&haps).expect("make geno");
    assert_eq!(geno.dim(), (3, 3));
    for ((row, ind), value) in geno.indexed_iter() {
        assert_eq!(*value, haps[[row, 2 * ind]] + haps[[row, 2 * ind + 1]]);
        assert!(*value <= 2);
    }
}

#[test]
fn odd_haplotype_columns_are_rejected() {
    let haps = array![[0u8, 1, 1]];
    let err = make_geno(&haps).expect_err("odd columns");
    assert!(matches!(
        err.downcast_ref::<RvSimError>(),
        Some(RvSimError::OddHaplotypeColumns(3))
    ));
}

#[test]
fn allele_frequency_is_count_over_two_n() {
    let geno = array![[1u8, 1], [2, 0], [0, 0], [2, 2]];
    let table = calc_allele_freqs(&geno, 2, None).expect("counts");
    assert_eq!(column_i64(&table.df, "ac"), vec![2, 2, 0, 4]);
    assert_eq!(column_f64(&table.df, "af"), vec![0.5, 0.5, 0.0, 1.0]);
    assert_eq!(table.n, 2.0);
}

#[test]
fn population_label_namespaces_columns() {
    let haps = array![[0u8, 1, 1, 0]];
    let table = calc_allele_freqs(&haps, 2, Some("AFR")).expect("counts");
    let names: Vec<String> = table
        .df
        .get_column_names()
        .iter()
        .map(|s| s.to_string())
        .collect();
    assert_eq!(names, vec!["ac_afr", "af_afr"]);
}

#[test]
fn zero_sample_size_is_rejected() {
    let geno = array![[1u8]];
    assert!(calc_allele_freqs(&geno, 0, None).is_err());
}

#[test]
fn merged_tables_sit_side_by_side() {
    let own = counts(&[1, 2], 2.0);
    let afr = calc_allele_freqs(&array![[1u8, 0], [0, 0]], 1, Some("afr")).expect("afr");
    let nfe = calc_allele_freqs(&array![[1u8, 1], [1, 0]], 1, Some("nfe")).expect("nfe");
    let merged = merge_count_tables(&own, &[afr, nfe]).expect("merge");
    assert_eq!(merged.df.width(), 6);
    assert_eq!(column_f64(&merged.df, "af_nfe"), vec![1.0, 0.5]);
    assert_eq!(merged.n, 2.0);
}

#[test]
fn merge_rejects_misaligned_reference() {
    let own = counts(&[1, 2], 2.0);
    let short = counts(&[1], 2.0);
    assert!(merge_count_tables(&own, &[short]).is_err());
}

#[test]
fn mac_takes_the_minor_allele() {
    let leg = legend(&["g1", "g1", "g2"]);
    let table = counts(&[1, 7, 4], 4.0);
    let with_mac = add_mac(&leg, &table).expect("mac");
    assert_eq!(column_i64(&with_mac, "mac"), vec![1, 1, 4]);
}
