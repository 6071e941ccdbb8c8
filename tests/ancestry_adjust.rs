use std::cell::RefCell;

use anyhow::Result;
use polars::prelude::*;
use rvsim_prep::adjust::{
    ADJUST_INDEX, AdjustConfig, AdjustMethod, AdjustRequest, AdjustedAf, AfAdjuster, IndexedAf,
    adjust_af,
};
use rvsim_prep::ancestry::{EstimateRequest, ProportionEstimator, est_props, filter_common};
use rvsim_prep::error::RvSimError;
use rvsim_prep::types::ProportionEstimate;

fn merged_table() -> DataFrame {
    df!(
        "ac" => [0i64, 20, 1, 50, 0],
        "af" => [0.0, 0.2, 0.005, 0.5, 0.0],
        "af_afr" => [0.3, 0.0, 0.002, 0.5, 0.999],
        "af_nfe" => [0.0, 0.1, 0.001, 0.4, 1.0],
    )
    .expect("merged table")
}

fn populations() -> Vec<String> {
    vec!["afr".to_string(), "nfe".to_string()]
}

fn estimate(afr: f64, nfe: f64) -> ProportionEstimate {
    ProportionEstimate {
        proportions: vec![("af_nfe".to_string(), nfe), ("af_afr".to_string(), afr)],
        goodness_of_fit: 0.4,
        iterations: Some(12),
        filtered_variants: 0,
    }
}

struct RecordingEstimator {
    seen: RefCell<Option<EstimateRequest>>,
}

impl ProportionEstimator for RecordingEstimator {
    fn estimate(&self, request: &EstimateRequest) -> Result<ProportionEstimate> {
        *self.seen.borrow_mut() = Some(request.clone());
        Ok(estimate(0.25, 0.75))
    }
}

/// Returns `scale * af` for every row except those listed in `drop`.
struct ScalingAdjuster {
    scale: f64,
    drop: Vec<usize>,
    effective_n: f64,
    seen: RefCell<Option<AdjustRequest>>,
}

impl AfAdjuster for ScalingAdjuster {
    fn adjust(&self, request: &AdjustRequest) -> Result<AdjustedAf> {
        *self.seen.borrow_mut() = Some(request.clone());
        let index = request.table.column(&request.index_col)?.i64()?;
        let af = request.table.column(&request.observed_col)?.f64()?;
        let rows = index
            .into_iter()
            .zip(af)
            .filter_map(|(idx, af)| {
                let idx = idx? as usize;
                let af = af?;
                (!self.drop.contains(&idx)).then_some(IndexedAf {
                    index: idx,
                    af: af * self.scale,
                })
            })
            .collect();
        Ok(AdjustedAf {
            rows,
            effective_n: self.effective_n,
        })
    }
}

struct OutOfRange;

impl AfAdjuster for OutOfRange {
    fn adjust(&self, _request: &AdjustRequest) -> Result<AdjustedAf> {
        Ok(AdjustedAf {
            rows: vec![IndexedAf { index: 99, af: 0.1 }],
            effective_n: 10.0,
        })
    }
}

fn config(use_effective_n: bool) -> AdjustConfig {
    AdjustConfig {
        populations: populations(),
        reference_sizes: vec![700.0, 900.0],
        observed_n: 50.0,
        use_effective_n,
    }
}

fn values_f64(df: &DataFrame, name: &str) -> Vec<f64> {
    df.column(name)
        .expect("column")
        .f64()
        .expect("f64")
        .into_iter()
        .map(|v| v.expect("value"))
        .collect()
}

fn values_i64(df: &DataFrame, name: &str) -> Vec<i64> {
    df.column(name)
        .expect("column")
        .i64()
        .expect("i64")
        .into_iter()
        .map(|v| v.expect("value"))
        .collect()
}

#[test]
fn rare_everywhere_variants_are_excluded() {
    let common = filter_common(&merged_table(), &populations(), 0.01).expect("filter");
    // rows 0 (afr common), 1 (own common), 3 (all common) survive; 2 rare; 4 near fixed
    assert_eq!(common.height(), 3);
    assert_eq!(values_i64(&common, "ac"), vec![0, 20, 50]);
}

#[test]
fn estimator_sees_common_variants_and_fit_flags() {
    let estimator = RecordingEstimator {
        seen: RefCell::new(None),
    };
    let est = est_props(&merged_table(), &populations(), 0.01, &estimator).expect("estimate");
    assert_eq!(est.proportion("afr").expect("afr"), 0.25);
    assert_eq!(est.proportion("af_nfe").expect("nfe"), 0.75);

    let request = estimator.seen.borrow().clone().expect("request recorded");
    assert_eq!(request.table.height(), 3);
    assert_eq!(request.reference_cols, vec!["af_afr", "af_nfe"]);
    assert_eq!(request.observed_col, "af");
    assert!(request.goodness_of_fit);
    assert!(request.keep_small_proportions);
}

#[test]
fn missing_population_is_reported() {
    let err = estimate(0.5, 0.5).proportion("eas").expect_err("missing");
    assert!(matches!(err, RvSimError::MissingPopulation(_)));
}

#[test]
fn estimation_needs_reference_populations() {
    let estimator = RecordingEstimator {
        seen: RefCell::new(None),
    };
    assert!(est_props(&merged_table(), &[], 0.01, &estimator).is_err());
    assert!(est_props(&merged_table(), &populations(), 0.6, &estimator).is_err());
}

#[test]
fn dropped_rows_become_monomorphic() {
    let adjuster = ScalingAdjuster {
        scale: 0.5,
        drop: vec![1],
        effective_n: 40.0,
        seen: RefCell::new(None),
    };
    let out = adjust_af(
        &merged_table(),
        &estimate(0.1, 0.9),
        &estimate(0.3, 0.7),
        &config(false),
        &adjuster,
    )
    .expect("adjust");

    assert_eq!(out.dropped, 1);
    assert_eq!(out.effective_n, None);
    assert_eq!(out.counts.n, 50.0);
    assert_eq!(out.counts.df.height(), 5);
    assert_eq!(values_f64(&out.counts.df, "af"), vec![0.0, 0.0, 0.0025, 0.25, 0.0]);
    // ac = round(af * 2 * 50)
    assert_eq!(values_i64(&out.counts.df, "ac"), vec![0, 0, 0, 25, 0]);
}

#[test]
fn request_carries_ordered_proportions() {
    let adjuster = ScalingAdjuster {
        scale: 1.0,
        drop: Vec::new(),
        effective_n: 40.0,
        seen: RefCell::new(None),
    };
    adjust_af(
        &merged_table(),
        &estimate(0.1, 0.9),
        &estimate(0.3, 0.7),
        &config(false),
        &adjuster,
    )
    .expect("adjust");

    let request = adjuster.seen.borrow().clone().expect("request recorded");
    assert_eq!(request.index_col, ADJUST_INDEX);
    assert_eq!(request.target_props, vec![0.1, 0.9]);
    assert_eq!(request.observed_props, vec![0.3, 0.7]);
    assert_eq!(request.reference_sizes, vec![700.0, 900.0]);
    assert_eq!(request.observed_size, 50.0);
    assert_eq!(request.method, AdjustMethod::Average);
    assert!(request.filter);
    assert_eq!(values_i64(&request.table, ADJUST_INDEX), vec![0, 1, 2, 3, 4]);
}

#[test]
fn effective_sample_size_drives_counts() {
    let adjuster = ScalingAdjuster {
        scale: 1.0,
        drop: Vec::new(),
        effective_n: 40.0,
        seen: RefCell::new(None),
    };
    let out = adjust_af(
        &merged_table(),
        &estimate(0.1, 0.9),
        &estimate(0.3, 0.7),
        &config(true),
        &adjuster,
    )
    .expect("adjust");
    assert_eq!(out.effective_n, Some(40.0));
    assert_eq!(out.counts.n, 40.0);
    // 0.2 * 80 = 16, 0.005 * 80 = 0.4 -> 0, 0.5 * 80 = 40
    assert_eq!(values_i64(&out.counts.df, "ac"), vec![0, 16, 0, 40, 0]);
}

#[test]
fn invented_rows_are_rejected() {
    let err = adjust_af(
        &merged_table(),
        &estimate(0.1, 0.9),
        &estimate(0.3, 0.7),
        &config(false),
        &OutOfRange,
    )
    .expect_err("out of range");
    assert!(matches!(
        err.downcast_ref::<RvSimError>(),
        Some(RvSimError::InvalidArgument(_))
    ));
}

#[test]
fn population_and_size_lengths_must_agree() {
    let mut cfg = config(false);
    cfg.reference_sizes.pop();
    let err = adjust_af(
        &merged_table(),
        &estimate(0.1, 0.9),
        &estimate(0.3, 0.7),
        &cfg,
        &OutOfRange,
    )
    .expect_err("length mismatch");
    assert!(matches!(
        err.downcast_ref::<RvSimError>(),
        Some(RvSimError::ShapeMismatch(_))
    ));
}
