//! Attribution over polars frames.

use commlens_stats::{ForestOptions, ShapOptions, paired_columns, shap_attribution};
use polars::prelude::*;

fn frame() -> DataFrame {
    let n = 40_i32;
    let signal: Vec<f64> = (0..n).map(f64::from).collect();
    let noise: Vec<f64> = (0..n).map(|i| f64::from(i * 7 % 11)).collect();
    let target: Vec<f64> = signal.iter().map(|v| 3.0 * v).collect();
    let mut with_gap: Vec<Option<f64>> = signal.iter().copied().map(Some).collect();
    with_gap[3] = None;
    DataFrame::new(vec![
        Column::new("signal".into(), signal),
        Column::new("noise".into(), noise),
        Column::new("target".into(), target),
        Column::new("gappy".into(), with_gap),
    ])
    .expect("frame")
}

fn quick() -> ShapOptions {
    ShapOptions {
        forest: ForestOptions {
            n_trees: 10,
            ..ForestOptions::default()
        },
        ..ShapOptions::default()
    }
}

#[test]
fn the_driving_feature_ranks_first() {
    let report = shap_attribution(
        &frame(),
        &["noise", "signal"],
        "target",
        Some(("noise", "signal")),
        &quick(),
    )
    .expect("attribution");

    assert_eq!(report.test_rows, 10);
    assert_eq!(report.train_rows, 30);
    assert_eq!(report.values.len(), 10);
    assert!(report.values.iter().all(|row| row.len() == 2));
    assert_eq!(report.attributions[0].feature, "signal");
    assert!(report.attributions[0].mean_abs_shap > report.attributions[1].mean_abs_shap);
    let interaction = report.interaction.expect("interaction");
    assert_eq!((interaction.first.as_str(), interaction.second.as_str()), ("noise", "signal"));
    assert!(interaction.mean_abs_interaction.is_finite());
}

#[test]
fn same_seed_same_report() {
    let a = shap_attribution(&frame(), &["noise", "signal"], "target", None, &quick())
        .expect("attribution");
    let b = shap_attribution(&frame(), &["noise", "signal"], "target", None, &quick())
        .expect("attribution");
    assert_eq!(a, b);
}

#[test]
fn rows_with_nulls_are_dropped() {
    let report =
        shap_attribution(&frame(), &["gappy"], "target", None, &quick()).expect("attribution");
    assert_eq!(report.train_rows + report.test_rows, 39);

    let (x, y) = paired_columns(&frame(), "gappy", "target").expect("columns");
    assert_eq!((x.len(), y.len()), (39, 39));
}

#[test]
fn unknown_columns_surface_as_errors() {
    assert!(shap_attribution(&frame(), &["missing"], "target", None, &quick()).is_err());
}
