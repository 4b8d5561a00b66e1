//! Bootstrap test for the difference between two rank correlations.

use rand::Rng;
use rand_pcg::Pcg64;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::correlation::{CorrelationMethod, MIN_SAMPLES, check_paired, coefficient};
use crate::error::{Result, invalid};
use crate::moments::percentile;
use crate::rng::stream_rng;

pub const DEFAULT_ITERATIONS: usize = 10_000;
pub const DEFAULT_SEED: u64 = 42;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BootstrapOptions {
    pub method: CorrelationMethod,
    pub n_iterations: usize,
    pub seed: u64,
}

impl Default for BootstrapOptions {
    fn default() -> Self {
        Self {
            method: CorrelationMethod::Spearman,
            n_iterations: DEFAULT_ITERATIONS,
            seed: DEFAULT_SEED,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BootstrapResult {
    pub method: CorrelationMethod,
    /// corr(x1, y1) - corr(x2, y2) on the original samples.
    pub observed_diff: f64,
    pub p_value: f64,
    pub n_iterations: usize,
    pub seed: u64,
    /// Iterations where both resampled correlations were defined.
    pub valid_iterations: usize,
    /// 95% percentile interval of the resampled differences.
    pub ci_low: f64,
    pub ci_high: f64,
}

fn resample(x: &[f64], y: &[f64], rng: &mut Pcg64) -> (Vec<f64>, Vec<f64>) {
    let n = x.len();
    (0..n)
        .map(|_| {
            let idx = rng.random_range(0..n);
            (x[idx], y[idx])
        })
        .unzip()
}

/// Resamples both groups with replacement `options.n_iterations` times.
///
/// The p-value is the share of defined resampled differences whose
/// magnitude reaches the observed one. Iteration `i` draws from stream `i`
/// of the seeded generator, so results do not depend on thread scheduling.
pub fn bootstrap_correlation_diff(
    x1: &[f64],
    y1: &[f64],
    x2: &[f64],
    y2: &[f64],
    options: &BootstrapOptions,
) -> Result<BootstrapResult> {
    let method = options.method;
    if method == CorrelationMethod::Pearson {
        return Err(invalid("bootstrap comparison supports spearman or kendall"));
    }
    if options.n_iterations == 0 {
        return Err(invalid("bootstrap needs at least one iteration"));
    }
    check_paired(x1, y1, MIN_SAMPLES)?;
    check_paired(x2, y2, MIN_SAMPLES)?;

    let observed = match (coefficient(x1, y1, method), coefficient(x2, y2, method)) {
        (Some(r1), Some(r2)) => r1 - r2,
        _ => return Err(invalid(format!("{method} correlation is undefined for constant input"))),
    };

    let diffs: Vec<f64> = (0..options.n_iterations)
        .into_par_iter()
        .map(|i| {
            let mut rng = stream_rng(options.seed, i as u64);
            let (rx1, ry1) = resample(x1, y1, &mut rng);
            let (rx2, ry2) = resample(x2, y2, &mut rng);
            match (coefficient(&rx1, &ry1, method), coefficient(&rx2, &ry2, method)) {
                (Some(r1), Some(r2)) => r1 - r2,
                _ => f64::NAN,
            }
        })
        .collect();

    let mut valid: Vec<f64> = diffs.into_iter().filter(|d| !d.is_nan()).collect();
    if valid.is_empty() {
        return Err(invalid("no bootstrap resample produced a defined correlation"));
    }
    let extreme = valid.iter().filter(|d| d.abs() >= observed.abs()).count();
    let p_value = extreme as f64 / valid.len() as f64;
    valid.sort_by(f64::total_cmp);

    debug!(
        method = %method,
        iterations = options.n_iterations,
        seed = options.seed,
        valid = valid.len(),
        "bootstrap finished"
    );
    Ok(BootstrapResult {
        method,
        observed_diff: observed,
        p_value,
        n_iterations: options.n_iterations,
        seed: options.seed,
        valid_iterations: valid.len(),
        ci_low: percentile(&valid, 2.5),
        ci_high: percentile(&valid, 97.5),
    })
}
