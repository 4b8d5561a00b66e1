//! Behavior of the comparison procedures on small samples.

use commlens_stats::{
    BootstrapOptions, CorrelationMethod, StatsError, bootstrap_correlation_diff, correlation,
    fisher_z_test, linear_fit, welch_t_test,
};
use proptest::prelude::*;

fn sample(n: usize, slope: f64, wobble: f64) -> (Vec<f64>, Vec<f64>) {
    let x: Vec<f64> = (0..n).map(|i| i as f64).collect();
    let y = x
        .iter()
        .enumerate()
        .map(|(i, v)| slope * v + wobble * ((i * 7 % 5) as f64 - 2.0))
        .collect();
    (x, y)
}

#[test]
fn doubled_series_correlate_perfectly() {
    let result =
        correlation(&[1.0, 2.0, 3.0, 4.0], &[2.0, 4.0, 6.0, 8.0], CorrelationMethod::Pearson)
            .expect("correlation");
    assert!((result.coefficient - 1.0).abs() < 1e-12);
    assert!(result.p_value.abs() < 1e-9);
    assert_eq!(result.n, 4);
}

#[test]
fn every_method_reports_a_probability() {
    let (x, y) = sample(12, 0.5, 3.0);
    for method in CorrelationMethod::ALL {
        let result = correlation(&x, &y, method).expect("correlation");
        assert!((-1.0..=1.0).contains(&result.coefficient), "{method}");
        assert!((0.0..=1.0).contains(&result.p_value), "{method}");
    }
}

#[test]
fn fisher_detects_opposite_correlations() {
    let (x1, y1) = sample(30, 1.0, 1.0);
    let (x2, y2) = sample(30, -1.0, 1.0);
    let result = fisher_z_test(&x1, &y1, &x2, &y2, CorrelationMethod::Spearman).expect("fisher");
    assert!(result.z_score > 0.0);
    assert!(result.p_value < 0.001);
}

#[test]
fn bootstrap_is_deterministic_for_a_seed() {
    let (x1, y1) = sample(15, 1.0, 4.0);
    let (x2, y2) = sample(12, 0.2, 4.0);
    let options = BootstrapOptions {
        method: CorrelationMethod::Kendall,
        n_iterations: 300,
        seed: 7,
    };
    let a = bootstrap_correlation_diff(&x1, &y1, &x2, &y2, &options).expect("bootstrap");
    let b = bootstrap_correlation_diff(&x1, &y1, &x2, &y2, &options).expect("bootstrap");
    assert_eq!(a, b);
    assert_eq!(a.n_iterations, 300);
    assert_eq!(a.seed, 7);
    assert!(a.valid_iterations <= 300);
    assert!(a.ci_low <= a.ci_high);
}

#[test]
fn adjacent_seeds_draw_different_resamples() {
    let (x1, y1) = sample(40, 0.5, 6.0);
    let (x2, y2) = sample(35, 0.1, 6.0);
    let run = |seed| {
        let options = BootstrapOptions {
            method: CorrelationMethod::Spearman,
            n_iterations: 2_000,
            seed,
        };
        bootstrap_correlation_diff(&x1, &y1, &x2, &y2, &options).expect("bootstrap")
    };
    let (a, b) = (run(42), run(43));

    assert_eq!(a.observed_diff, b.observed_diff);
    assert_eq!((a.seed, b.seed), (42, 43));
    assert_ne!((a.p_value, a.ci_low, a.ci_high), (b.p_value, b.ci_low, b.ci_high));
}

#[test]
fn bootstrap_rejects_pearson_and_constant_input() {
    let (x, y) = sample(10, 1.0, 0.5);
    let pearson = BootstrapOptions {
        method: CorrelationMethod::Pearson,
        ..BootstrapOptions::default()
    };
    assert!(matches!(
        bootstrap_correlation_diff(&x, &y, &x, &y, &pearson),
        Err(StatsError::InvalidArgument(_))
    ));
    let flat = vec![1.0; 10];
    let options = BootstrapOptions {
        n_iterations: 10,
        ..BootstrapOptions::default()
    };
    assert!(bootstrap_correlation_diff(&x, &flat, &x, &y, &options).is_err());
}

#[test]
fn rule_count_means_differ() {
    let few = [2.0, 3.0, 2.0, 4.0, 3.0, 2.0];
    let many = [8.0, 9.0, 7.0, 10.0, 8.0, 9.0];
    let result = welch_t_test(&few, &many, false).expect("t-test");
    assert!(result.t_statistic < 0.0);
    assert!(result.significant);
}

#[test]
fn trend_line_through_noisy_points() {
    let (x, y) = sample(20, 2.0, 0.5);
    let fit = linear_fit(&x, &y).expect("fit");
    assert!((fit.slope - 2.0).abs() < 0.1);
    assert!(fit.r_squared > 0.99);
}

fn paired(n: std::ops::Range<usize>) -> impl Strategy<Value = (Vec<f64>, Vec<f64>)> {
    n.prop_flat_map(|len| {
        (
            prop::collection::vec(-100.0..100.0f64, len),
            prop::collection::vec(-100.0..100.0f64, len),
        )
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn swapping_groups_negates_z(a in paired(4..20), b in paired(4..20)) {
        let forward = fisher_z_test(&a.0, &a.1, &b.0, &b.1, CorrelationMethod::Pearson);
        let backward = fisher_z_test(&b.0, &b.1, &a.0, &a.1, CorrelationMethod::Pearson);
        if let (Ok(f), Ok(r)) = (forward, backward) {
            prop_assert!((f.z_score + r.z_score).abs() < 1e-9);
            prop_assert!((f.p_value - r.p_value).abs() < 1e-12);
        }
    }

    #[test]
    fn bootstrap_p_value_is_a_probability(
        a in paired(3..12),
        b in paired(3..12),
        seed in any::<u64>(),
    ) {
        let options = BootstrapOptions {
            method: CorrelationMethod::Spearman,
            n_iterations: 40,
            seed,
        };
        if let Ok(result) = bootstrap_correlation_diff(&a.0, &a.1, &b.0, &b.1, &options) {
            prop_assert!((0.0..=1.0).contains(&result.p_value));
            prop_assert!(result.valid_iterations >= 1);
        }
    }
}
