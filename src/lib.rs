//! Data preparation for rare-variant association simulation studies.
//!
//! Haplotype and genotype matrices are `ndarray` arrays with one row per
//! variant; legends and count tables are polars data frames aligned
//! row-for-row with them.

pub mod error;
pub mod logging;
pub mod types;

pub mod df_utils;
pub mod io;
pub mod parallel;
pub mod qc;

pub mod adjust;
pub mod allele_freq;
pub mod ancestry;
pub mod flip;
pub mod genotype;
pub mod long_format;
pub mod merge;
pub mod prune;
