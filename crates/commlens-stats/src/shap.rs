//! Feature attribution for a random forest fitted on standardized data.
//!
//! Attributions are exact path-dependent Shapley values: the value of a
//! feature subset S is the tree output with features in S fixed to the
//! row's values and the remaining splits averaged by node cover. Every
//! subset is enumerated, so the feature count is capped at
//! [`MAX_FEATURES`].

use std::collections::HashSet;

use polars::prelude::DataFrame;
use rand::SeedableRng;
use rand::seq::SliceRandom;
use rand_pcg::Pcg64;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::columns::complete_columns;
use crate::error::{Result, invalid};
use crate::forest::{ForestOptions, Node, RandomForest, RegressionTree};
use crate::moments::z_scores;

pub const MAX_FEATURES: usize = 12;
pub const MIN_ROWS: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShapOptions {
    /// Share of rows held out for attribution.
    pub test_fraction: f64,
    /// Seed of the train/held-out shuffle.
    pub seed: u64,
    pub forest: ForestOptions,
}

impl Default for ShapOptions {
    fn default() -> Self {
        Self {
            test_fraction: 0.25,
            seed: 42,
            forest: ForestOptions::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeatureAttribution {
    pub feature: String,
    pub mean_abs_shap: f64,
    pub mean_shap: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InteractionAttribution {
    pub first: String,
    pub second: String,
    /// Mean |Φ(first, second)| over held-out rows.
    pub mean_abs_interaction: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ShapReport {
    /// Expected model output, identical for every row.
    pub base_value: f64,
    pub train_rows: usize,
    pub test_rows: usize,
    pub features: Vec<String>,
    /// Held-out rows × features, in `features` order.
    pub values: Vec<Vec<f64>>,
    /// Ranked by `mean_abs_shap`, largest first.
    pub attributions: Vec<FeatureAttribution>,
    pub interaction: Option<InteractionAttribution>,
}

/// Tree output for `row` with only the features in `mask` known.
fn subset_value(tree: &RegressionTree, row: &[f64], mask: usize) -> f64 {
    fn walk(nodes: &[Node], idx: usize, row: &[f64], mask: usize) -> f64 {
        match &nodes[idx] {
            Node::Leaf { value, .. } => *value,
            Node::Split {
                feature,
                threshold,
                left,
                right,
                cover,
            } => {
                if mask & (1 << feature) != 0 {
                    let next = if row[*feature] <= *threshold { *left } else { *right };
                    walk(nodes, next, row, mask)
                } else {
                    (nodes[*left].cover() * walk(nodes, *left, row, mask)
                        + nodes[*right].cover() * walk(nodes, *right, row, mask))
                        / cover
                }
            }
        }
    }
    walk(tree.nodes(), 0, row, mask)
}

/// Forest value of every feature subset, indexed by bitmask.
fn subset_values(forest: &RandomForest, row: &[f64]) -> Vec<f64> {
    let subsets = 1usize << forest.n_features();
    let trees = forest.trees().len() as f64;
    (0..subsets)
        .map(|mask| {
            forest
                .trees()
                .iter()
                .map(|tree| subset_value(tree, row, mask))
                .sum::<f64>()
                / trees
        })
        .collect()
}

fn factorials(m: usize) -> Vec<f64> {
    let mut out = vec![1.0; m + 1];
    for k in 1..=m {
        out[k] = out[k - 1] * k as f64;
    }
    out
}

fn shapley_values(v: &[f64], m: usize, fact: &[f64]) -> Vec<f64> {
    (0..m)
        .map(|i| {
            let bit = 1 << i;
            (0..v.len())
                .filter(|mask| mask & bit == 0)
                .map(|mask| {
                    let s = mask.count_ones() as usize;
                    let weight = fact[s] * fact[m - s - 1] / fact[m];
                    weight * (v[mask | bit] - v[mask])
                })
                .sum()
        })
        .collect()
}

/// Shapley interaction index for `i != j`, split evenly between the
/// (i, j) and (j, i) cells.
fn interaction_value(v: &[f64], m: usize, fact: &[f64], i: usize, j: usize) -> f64 {
    let (bi, bj) = (1 << i, 1 << j);
    (0..v.len())
        .filter(|mask| mask & (bi | bj) == 0)
        .map(|mask| {
            let s = mask.count_ones() as usize;
            let weight = fact[s] * fact[m - s - 2] / (2.0 * fact[m - 1]);
            weight * (v[mask | bi | bj] - v[mask | bi] - v[mask | bj] + v[mask])
        })
        .sum()
}

/// Interaction matrix with main effects on the diagonal; row `i` sums to
/// the Shapley value of feature `i`.
pub(crate) fn interaction_matrix(v: &[f64], m: usize, fact: &[f64], phi: &[f64]) -> Vec<Vec<f64>> {
    let mut matrix = vec![vec![0.0; m]; m];
    for i in 0..m {
        for j in (i + 1)..m {
            let value = interaction_value(v, m, fact, i, j);
            matrix[i][j] = value;
            matrix[j][i] = value;
        }
    }
    for i in 0..m {
        let off_diagonal: f64 = (0..m).filter(|&j| j != i).map(|j| matrix[i][j]).sum();
        matrix[i][i] = phi[i] - off_diagonal;
    }
    matrix
}

fn validate(features: &[&str], target: &str, pair: Option<(&str, &str)>) -> Result<()> {
    if features.is_empty() {
        return Err(invalid("attribution needs at least one feature"));
    }
    if features.len() > MAX_FEATURES {
        return Err(invalid(format!(
            "attribution supports at most {MAX_FEATURES} features, got {}",
            features.len()
        )));
    }
    let unique: HashSet<&str> = features.iter().copied().collect();
    if unique.len() != features.len() {
        return Err(invalid("feature columns must be distinct"));
    }
    if unique.contains(target) {
        return Err(invalid(format!("target '{target}' is also a feature")));
    }
    if let Some((a, b)) = pair {
        if a == b || !unique.contains(a) || !unique.contains(b) {
            return Err(invalid(format!(
                "interaction pair ({a}, {b}) must name two distinct features"
            )));
        }
    }
    Ok(())
}

/// Fits a forest predicting `target` from `features` and attributes its
/// held-out predictions. Rows with a null or non-finite value in any
/// used column are dropped first.
pub fn shap_attribution(
    df: &DataFrame,
    features: &[&str],
    target: &str,
    interaction_pair: Option<(&str, &str)>,
    options: &ShapOptions,
) -> Result<ShapReport> {
    validate(features, target, interaction_pair)?;
    if !(options.test_fraction > 0.0 && options.test_fraction < 1.0) {
        return Err(invalid("test fraction must lie strictly between 0 and 1"));
    }

    let mut names = features.to_vec();
    names.push(target);
    let mut columns = complete_columns(df, &names)?;
    let n = columns.first().map_or(0, Vec::len);
    if n < MIN_ROWS {
        return Err(invalid(format!(
            "attribution needs at least {MIN_ROWS} complete rows, got {n}"
        )));
    }
    for column in &mut columns {
        *column = z_scores(column);
    }
    let y_all = columns.pop().unwrap_or_default();
    let x_all: Vec<Vec<f64>> = (0..n)
        .map(|row| columns.iter().map(|column| column[row]).collect())
        .collect();

    let mut order: Vec<usize> = (0..n).collect();
    order.shuffle(&mut Pcg64::seed_from_u64(options.seed));
    let test_rows = ((n as f64 * options.test_fraction).ceil() as usize).clamp(1, n - 1);
    let (test_idx, train_idx) = order.split_at(test_rows);

    let x_train: Vec<Vec<f64>> = train_idx.iter().map(|&r| x_all[r].clone()).collect();
    let y_train: Vec<f64> = train_idx.iter().map(|&r| y_all[r]).collect();
    let forest = RandomForest::fit(&x_train, &y_train, &options.forest)?;

    let m = features.len();
    let fact = factorials(m);
    let pair_idx = interaction_pair.and_then(|(a, b)| {
        let i = features.iter().position(|f| *f == a)?;
        let j = features.iter().position(|f| *f == b)?;
        Some((i, j))
    });

    let per_row: Vec<(f64, Vec<f64>, Option<f64>)> = test_idx
        .par_iter()
        .map(|&r| {
            let v = subset_values(&forest, &x_all[r]);
            let phi = shapley_values(&v, m, &fact);
            let pair = pair_idx.map(|(i, j)| interaction_matrix(&v, m, &fact, &phi)[i][j]);
            (v[0], phi, pair)
        })
        .collect();

    let base_value = per_row.first().map_or(0.0, |(base, _, _)| *base);
    let rows = per_row.len() as f64;
    let values: Vec<Vec<f64>> = per_row.iter().map(|(_, phi, _)| phi.clone()).collect();

    let mut attributions: Vec<FeatureAttribution> = features
        .iter()
        .enumerate()
        .map(|(i, feature)| FeatureAttribution {
            feature: (*feature).to_string(),
            mean_abs_shap: values.iter().map(|phi| phi[i].abs()).sum::<f64>() / rows,
            mean_shap: values.iter().map(|phi| phi[i]).sum::<f64>() / rows,
        })
        .collect();
    attributions.sort_by(|a, b| b.mean_abs_shap.total_cmp(&a.mean_abs_shap));

    let interaction = interaction_pair.map(|(first, second)| InteractionAttribution {
        first: first.to_string(),
        second: second.to_string(),
        mean_abs_interaction: per_row
            .iter()
            .filter_map(|(_, _, pair)| pair.map(f64::abs))
            .sum::<f64>()
            / rows,
    });

    info!(
        target_column = target,
        features = m,
        train_rows = train_idx.len(),
        test_rows,
        top = attributions.first().map(|a| a.feature.as_str()).unwrap_or_default(),
        "computed feature attributions"
    );
    Ok(ShapReport {
        base_value,
        train_rows: train_idx.len(),
        test_rows,
        features: features.iter().map(|f| (*f).to_string()).collect(),
        values,
        attributions,
        interaction,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shapley_values_of_an_additive_game() {
        // v(S) = 1 for feature 0 plus 2 for feature 1.
        let v = [0.0, 1.0, 2.0, 3.0];
        let fact = factorials(2);
        assert_eq!(shapley_values(&v, 2, &fact), vec![1.0, 2.0]);
        let matrix = interaction_matrix(&v, 2, &fact, &[1.0, 2.0]);
        assert_eq!(matrix[0][1], 0.0);
        assert_eq!(matrix[0][0], 1.0);
    }

    #[test]
    fn pure_interaction_is_split_off_the_diagonal() {
        // v(S) = 4 only when both features are known.
        let v = [0.0, 0.0, 0.0, 4.0];
        let fact = factorials(2);
        let phi = shapley_values(&v, 2, &fact);
        assert_eq!(phi, vec![2.0, 2.0]);
        let matrix = interaction_matrix(&v, 2, &fact, &phi);
        assert_eq!(matrix[0][1], 2.0);
        assert_eq!(matrix[1][0], 2.0);
        assert_eq!(matrix[0][0], 0.0);
    }

    #[test]
    fn attributions_sum_to_the_prediction() {
        let x: Vec<Vec<f64>> = (0..16_i32)
            .map(|i| vec![f64::from(i % 4), f64::from(i / 4), f64::from(i % 3)])
            .collect();
        let y: Vec<f64> = x.iter().map(|r| r[0] * r[1] + r[2]).collect();
        let options = ForestOptions {
            n_trees: 5,
            ..ForestOptions::default()
        };
        let forest = RandomForest::fit(&x, &y, &options).unwrap();
        let fact = factorials(3);
        for row in &x {
            let v = subset_values(&forest, row);
            let phi = shapley_values(&v, 3, &fact);
            let total = v[0] + phi.iter().sum::<f64>();
            assert!((total - forest.predict(row)).abs() < 1e-9);

            let matrix = interaction_matrix(&v, 3, &fact, &phi);
            for (i, line) in matrix.iter().enumerate() {
                assert!((line.iter().sum::<f64>() - phi[i]).abs() < 1e-9);
            }
        }
    }

    #[test]
    fn invalid_feature_sets_are_rejected() {
        assert!(validate(&[], "y", None).is_err());
        assert!(validate(&["a", "a"], "y", None).is_err());
        assert!(validate(&["a", "y"], "y", None).is_err());
        assert!(validate(&["a", "b"], "y", Some(("a", "c"))).is_err());
        assert!(validate(&["a", "b"], "y", Some(("a", "b"))).is_ok());
    }
}
