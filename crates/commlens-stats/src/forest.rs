//! Random forest of CART regression trees.
//!
//! Trees are grown on bootstrap row samples until leaves are pure or
//! hold fewer than `min_samples_split` rows; every split considers all
//! features and minimizes the summed squared error of the children. Each
//! node records its cover, the number of (bootstrap) rows reaching it,
//! which path-dependent attribution needs.

use rand::Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Result, invalid};
use crate::rng::stream_rng;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForestOptions {
    pub n_trees: usize,
    pub min_samples_split: usize,
    pub max_depth: Option<usize>,
    pub seed: u64,
}

impl Default for ForestOptions {
    fn default() -> Self {
        Self {
            n_trees: 100,
            min_samples_split: 2,
            max_depth: None,
            seed: 42,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Leaf {
        value: f64,
        cover: f64,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
        cover: f64,
    },
}

impl Node {
    pub fn cover(&self) -> f64 {
        match self {
            Self::Leaf { cover, .. } | Self::Split { cover, .. } => *cover,
        }
    }
}

/// Nodes in build order; index 0 is the root.
#[derive(Debug, Clone, PartialEq)]
pub struct RegressionTree {
    nodes: Vec<Node>,
}

impl RegressionTree {
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn predict(&self, row: &[f64]) -> f64 {
        let mut idx = 0;
        loop {
            match &self.nodes[idx] {
                Node::Leaf { value, .. } => return *value,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                    ..
                } => idx = if row[*feature] <= *threshold { *left } else { *right },
            }
        }
    }

    fn fit(x: &[Vec<f64>], y: &[f64], rows: Vec<usize>, options: &ForestOptions) -> Self {
        let mut tree = Self { nodes: Vec::new() };
        tree.grow(x, y, rows, 0, options);
        tree
    }

    fn grow(
        &mut self,
        x: &[Vec<f64>],
        y: &[f64],
        rows: Vec<usize>,
        depth: usize,
        options: &ForestOptions,
    ) -> usize {
        let idx = self.nodes.len();
        let cover = rows.len() as f64;
        let value = rows.iter().map(|&r| y[r]).sum::<f64>() / cover;
        self.nodes.push(Node::Leaf { value, cover });

        let depth_reached = options.max_depth.is_some_and(|max| depth >= max);
        if rows.len() < options.min_samples_split || depth_reached {
            return idx;
        }
        let Some(split) = best_split(x, y, &rows) else {
            return idx;
        };
        let (left_rows, right_rows): (Vec<usize>, Vec<usize>) = rows
            .into_iter()
            .partition(|&r| x[r][split.feature] <= split.threshold);
        let left = self.grow(x, y, left_rows, depth + 1, options);
        let right = self.grow(x, y, right_rows, depth + 1, options);
        self.nodes[idx] = Node::Split {
            feature: split.feature,
            threshold: split.threshold,
            left,
            right,
            cover,
        };
        idx
    }
}

struct Split {
    feature: usize,
    threshold: f64,
}

/// Split with the lowest children SSE, or `None` when no split reduces it.
fn best_split(x: &[Vec<f64>], y: &[f64], rows: &[usize]) -> Option<Split> {
    let n = rows.len() as f64;
    let total: f64 = rows.iter().map(|&r| y[r]).sum();
    let total_sq: f64 = rows.iter().map(|&r| y[r] * y[r]).sum();
    let parent_sse = total_sq - total * total / n;
    if parent_sse <= 1e-12 {
        return None;
    }

    let features = x.first().map_or(0, Vec::len);
    let mut best: Option<(f64, Split)> = None;
    let mut order = rows.to_vec();
    for feature in 0..features {
        order.sort_by(|&a, &b| x[a][feature].total_cmp(&x[b][feature]));
        let (mut left_sum, mut left_sq) = (0.0, 0.0);
        for i in 0..order.len() - 1 {
            let yi = y[order[i]];
            left_sum += yi;
            left_sq += yi * yi;
            let here = x[order[i]][feature];
            let next = x[order[i + 1]][feature];
            if here == next {
                continue;
            }
            let nl = (i + 1) as f64;
            let nr = n - nl;
            let right_sum = total - left_sum;
            let right_sq = total_sq - left_sq;
            let sse =
                (left_sq - left_sum * left_sum / nl) + (right_sq - right_sum * right_sum / nr);
            if best.as_ref().is_none_or(|(current, _)| sse < *current) {
                let mut threshold = (here + next) / 2.0;
                if threshold >= next {
                    threshold = here;
                }
                best = Some((sse, Split { feature, threshold }));
            }
        }
    }
    best.filter(|(sse, _)| *sse < parent_sse).map(|(_, split)| split)
}

#[derive(Debug, Clone, PartialEq)]
pub struct RandomForest {
    trees: Vec<RegressionTree>,
    n_features: usize,
}

impl RandomForest {
    /// Fits on row-major `x`; every row must have the same width.
    pub fn fit(x: &[Vec<f64>], y: &[f64], options: &ForestOptions) -> Result<Self> {
        if x.is_empty() || x.len() != y.len() {
            return Err(invalid(format!(
                "forest needs matching non-empty inputs, got {} rows and {} targets",
                x.len(),
                y.len()
            )));
        }
        if options.n_trees == 0 {
            return Err(invalid("forest needs at least one tree"));
        }
        let n_features = x[0].len();
        if n_features == 0 || x.iter().any(|row| row.len() != n_features) {
            return Err(invalid("forest rows must share a non-zero width"));
        }

        let n = x.len();
        let trees: Vec<RegressionTree> = (0..options.n_trees)
            .into_par_iter()
            .map(|t| {
                let mut rng = stream_rng(options.seed, t as u64);
                let rows: Vec<usize> = (0..n).map(|_| rng.random_range(0..n)).collect();
                RegressionTree::fit(x, y, rows, options)
            })
            .collect();
        debug!(
            trees = trees.len(),
            rows = n,
            features = n_features,
            nodes = trees.iter().map(|t| t.nodes.len()).sum::<usize>(),
            "fitted random forest"
        );
        Ok(Self { trees, n_features })
    }

    pub fn trees(&self) -> &[RegressionTree] {
        &self.trees
    }

    pub fn n_features(&self) -> usize {
        self.n_features
    }

    pub fn predict(&self, row: &[f64]) -> f64 {
        self.trees.iter().map(|t| t.predict(row)).sum::<f64>() / self.trees.len() as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn a_single_step_is_learned() {
        let x: Vec<Vec<f64>> = (0..20_i32).map(|i| vec![f64::from(i)]).collect();
        let y: Vec<f64> = (0..20_i32).map(|i| if i < 10 { 0.0 } else { 1.0 }).collect();
        let options = ForestOptions {
            n_trees: 20,
            ..ForestOptions::default()
        };
        let forest = RandomForest::fit(&x, &y, &options).unwrap();
        assert!(forest.predict(&[2.0]) < 0.3);
        assert!(forest.predict(&[17.0]) > 0.7);
    }

    #[test]
    fn constant_target_gives_single_leaf_trees() {
        let x: Vec<Vec<f64>> = (0..5_i32).map(|i| vec![f64::from(i), 1.0]).collect();
        let forest = RandomForest::fit(&x, &[3.0; 5], &ForestOptions::default()).unwrap();
        assert!(forest.trees().iter().all(|t| t.nodes().len() == 1));
        assert_eq!(forest.predict(&[0.0, 0.0]), 3.0);
    }

    #[test]
    fn fitting_is_deterministic() {
        let x: Vec<Vec<f64>> = (0..12_i32).map(|i| vec![f64::from(i % 5), f64::from(i)]).collect();
        let y: Vec<f64> = (0..12_i32).map(|i| f64::from(i * i % 7)).collect();
        let options = ForestOptions {
            n_trees: 8,
            ..ForestOptions::default()
        };
        let a = RandomForest::fit(&x, &y, &options).unwrap();
        let b = RandomForest::fit(&x, &y, &options).unwrap();
        assert_eq!(a, b);

        let next_seed = ForestOptions {
            seed: options.seed + 1,
            ..options
        };
        let c = RandomForest::fit(&x, &y, &next_seed).unwrap();
        assert_ne!(a.trees()[1], c.trees()[0]);
        assert_ne!(a, c);
    }

    #[test]
    fn covers_add_up() {
        let x: Vec<Vec<f64>> = (0..10_i32).map(|i| vec![f64::from(i)]).collect();
        let y: Vec<f64> = (0..10_i32).map(f64::from).collect();
        let forest = RandomForest::fit(&x, &y, &ForestOptions::default()).unwrap();
        for tree in forest.trees() {
            assert_eq!(tree.nodes()[0].cover(), 10.0);
            for node in tree.nodes() {
                if let Node::Split { left, right, cover, .. } = node {
                    let nodes = tree.nodes();
                    assert_eq!(nodes[*left].cover() + nodes[*right].cover(), *cover);
                }
            }
        }
    }
}
