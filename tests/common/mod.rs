#![allow(dead_code)]

use polars::prelude::*;
use rvsim_prep::types::CountTable;

pub fn legend(genes: &[&str]) -> DataFrame {
    let n = genes.len();
    df!(
        "id" => (0..n).map(|i| format!("var{i}")).collect::<Vec<_>>(),
        "gene" => genes.iter().map(|g| g.to_string()).collect::<Vec<_>>(),
        "fun" => (0..n).map(|i| if i % 2 == 0 { "missense" } else { "synonymous" }.to_string()).collect::<Vec<_>>(),
        "ref" => vec!["A".to_string(); n],
        "alt" => vec!["G".to_string(); n],
        "row" => (0..n as i64).collect::<Vec<_>>(),
    )
    .expect("legend frame")
}

pub fn counts(ac: &[i64], n: f64) -> CountTable {
    let af: Vec<f64> = ac.iter().map(|c| *c as f64 / (2.0 * n)).collect();
    let df = df!("ac" => ac.to_vec(), "af" => af).expect("count frame");
    CountTable { df, n }
}

pub fn column_i64(df: &DataFrame, name: &str) -> Vec<i64> {
    df.column(name)
        .expect("column")
        .i64()
        .expect("i64 column")
        .into_iter()
        .map(|v| v.expect("non-null"))
        .collect()
}

pub fn column_f64(df: &DataFrame, name: &str) -> Vec<f64> {
    df.column(name)
        .expect("column")
        .f64()
        .expect("f64 column")
        .into_iter()
        .map(|v| v.expect("non-null"))
        .collect()
}

pub fn column_str(df: &DataFrame, name: &str) -> Vec<String> {
    df.column(name)
        .expect("column")
        .str()
        .expect("string column")
        .into_iter()
        .map(|v| v.expect("non-null").to_string())
        .collect()
}
