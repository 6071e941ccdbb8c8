use std::fmt;
use std::str::FromStr;

use ndarray::Array2;
use polars::prelude::DataFrame;

use crate::error::RvSimError;

/// Variants x haplotypes, two columns per individual, cells in {0, 1}.
pub type HaplotypeMatrix = Array2<u8>;

pub type GenotypeMatrix = Array2<u8>;

pub const LEGEND_ID: &str = "id";
pub const LEGEND_GENE: &str = "gene";
pub const LEGEND_FUN: &str = "fun";
pub const LEGEND_REF: &str = "ref";
pub const LEGEND_ALT: &str = "alt";
pub const LEGEND_ROW: &str = "row";
pub const LEGEND_MAC: &str = "mac";

pub const AC: &str = "ac";
pub const AF: &str = "af";

#[derive(Debug, Clone)]
pub struct CountTable {
    pub df: DataFrame,
    pub n: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MacBin {
    pub lower: u32,
    pub upper: u32,
    pub expected_var: f64,
}

impl MacBin {
    pub fn contains(&self, mac: u32) -> bool {
        mac >= self.lower && mac <= self.upper
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProportionEstimate {
    pub proportions: Vec<(String, f64)>,
    pub goodness_of_fit: f64,
    pub iterations: Option<u32>,
    pub filtered_variants: usize,
}

impl ProportionEstimate {
    /// Looks up a population by its label or by its `af_<pop>` column name.
    pub fn proportion(&self, population: &str) -> Result<f64, RvSimError> {
        let column = format!("{AF}_{}", population.to_lowercase());
        self.proportions
            .iter()
            .find(|(label, _)| label == population || *label == column)
            .map(|(_, value)| *value)
            .ok_or_else(|| RvSimError::MissingPopulation(population.to_string()))
    }

    pub fn ordered(&self, populations: &[String]) -> Result<Vec<f64>, RvSimError> {
        populations.iter().map(|p| self.proportion(p)).collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableKind {
    Legend,
    Genotype,
    Haplotype,
    Count,
}

impl FromStr for TableKind {
    type Err = RvSimError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "legend" | "leg" => Ok(TableKind::Legend),
            "genotype" | "geno" => Ok(TableKind::Genotype),
            "haplotype" | "hap" => Ok(TableKind::Haplotype),
            "count" | "counts" => Ok(TableKind::Count),
            other => Err(RvSimError::UnsupportedTableKind(format!(
                "'{other}' (expected legend, geno, hap or count)"
            ))),
        }
    }
}

impl fmt::Display for TableKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TableKind::Legend => "legend",
            TableKind::Genotype => "geno",
            TableKind::Haplotype => "hap",
            TableKind::Count => "count",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlConfig {
    InternalOnly,
    ExternalOnly,
    ExternalAdjusted,
    InternalExternal,
    InternalExternalAdjusted,
}

impl FromStr for ControlConfig {
    type Err = RvSimError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "int" => Ok(ControlConfig::InternalOnly),
            "ext" => Ok(ControlConfig::ExternalOnly),
            "ext_adj" => Ok(ControlConfig::ExternalAdjusted),
            "int_ext" => Ok(ControlConfig::InternalExternal),
            "int_ext_adj" => Ok(ControlConfig::InternalExternalAdjusted),
            other => Err(RvSimError::UnsupportedControlConfig(format!(
                "'{other}' (expected int, ext, ext_adj, int_ext or int_ext_adj)"
            ))),
        }
    }
}
