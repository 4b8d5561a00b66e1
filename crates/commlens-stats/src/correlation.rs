//! Pearson, Spearman and Kendall correlation with two-tailed p-values.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::distribution::{normal_sf, student_t_two_tailed};
use crate::error::{Result, StatsError, invalid};
use crate::moments::mean;
use crate::rank::{average_ranks, tie_groups};

pub const MIN_SAMPLES: usize = 3;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CorrelationMethod {
    Pearson,
    #[default]
    Spearman,
    Kendall,
}

impl CorrelationMethod {
    pub const ALL: [CorrelationMethod; 3] = [Self::Pearson, Self::Spearman, Self::Kendall];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pearson => "pearson",
            Self::Spearman => "spearman",
            Self::Kendall => "kendall",
        }
    }
}

impl fmt::Display for CorrelationMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CorrelationMethod {
    type Err = StatsError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pearson" => Ok(Self::Pearson),
            "spearman" => Ok(Self::Spearman),
            "kendall" => Ok(Self::Kendall),
            other => Err(invalid(format!("unknown correlation method '{other}'"))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CorrelationResult {
    pub method: CorrelationMethod,
    pub coefficient: f64,
    pub p_value: f64,
    pub n: usize,
}

pub(crate) fn check_paired(x: &[f64], y: &[f64], min: usize) -> Result<()> {
    if x.len() != y.len() {
        return Err(invalid(format!(
            "paired samples differ in length ({} vs {})",
            x.len(),
            y.len()
        )));
    }
    if x.len() < min {
        return Err(invalid(format!(
            "need at least {min} paired values, got {}",
            x.len()
        )));
    }
    if x.iter().chain(y).any(|v| !v.is_finite()) {
        return Err(invalid("samples contain non-finite values"));
    }
    Ok(())
}

/// Coefficient and two-tailed p-value. Both inputs must hold at least
/// three finite values and neither may be constant.
pub fn correlation(x: &[f64], y: &[f64], method: CorrelationMethod) -> Result<CorrelationResult> {
    check_paired(x, y, MIN_SAMPLES)?;
    let n = x.len();
    let undefined = || invalid(format!("{method} correlation is undefined for constant input"));
    let (coefficient, p_value) = match method {
        CorrelationMethod::Pearson => {
            let r = pearson(x, y).ok_or_else(undefined)?;
            (r, t_test_p_value(r, n))
        }
        CorrelationMethod::Spearman => {
            let r = pearson(&average_ranks(x), &average_ranks(y)).ok_or_else(undefined)?;
            (r, t_test_p_value(r, n))
        }
        CorrelationMethod::Kendall => {
            let tau = kendall(x, y).ok_or_else(undefined)?;
            (tau.tau, tau.p_value)
        }
    };
    Ok(CorrelationResult {
        method,
        coefficient,
        p_value,
        n,
    })
}

/// Coefficient only; `None` where the statistic is undefined. Lengths are
/// assumed checked.
pub(crate) fn coefficient(x: &[f64], y: &[f64], method: CorrelationMethod) -> Option<f64> {
    match method {
        CorrelationMethod::Pearson => pearson(x, y),
        CorrelationMethod::Spearman => pearson(&average_ranks(x), &average_ranks(y)),
        CorrelationMethod::Kendall => kendall(x, y).map(|k| k.tau),
    }
}

fn pearson(x: &[f64], y: &[f64]) -> Option<f64> {
    let mx = mean(x);
    let my = mean(y);
    let (mut sxy, mut sxx, mut syy) = (0.0, 0.0, 0.0);
    for (a, b) in x.iter().zip(y) {
        let dx = a - mx;
        let dy = b - my;
        sxy += dx * dy;
        sxx += dx * dx;
        syy += dy * dy;
    }
    if sxx == 0.0 || syy == 0.0 {
        return None;
    }
    Some((sxy / (sxx * syy).sqrt()).clamp(-1.0, 1.0))
}

fn t_test_p_value(r: f64, n: usize) -> f64 {
    let df = (n - 2) as f64;
    let rest = 1.0 - r * r;
    if rest <= 0.0 {
        return 0.0;
    }
    student_t_two_tailed(r * (df / rest).sqrt(), df)
}

struct Kendall {
    tau: f64,
    p_value: f64,
}

/// Kendall tau-b with the tie-corrected normal approximation.
fn kendall(x: &[f64], y: &[f64]) -> Option<Kendall> {
    let n = x.len();
    let mut balance = 0i64;
    for i in 0..n {
        for j in (i + 1)..n {
            let dx = (x[i] - x[j]).signum() as i64 * i64::from(x[i] != x[j]);
            let dy = (y[i] - y[j]).signum() as i64 * i64::from(y[i] != y[j]);
            balance += dx * dy;
        }
    }

    let nf = n as f64;
    let total = nf * (nf - 1.0) / 2.0;
    let ties = |values: &[f64]| {
        tie_groups(values)
            .into_iter()
            .map(|c| c as f64)
            .fold((0.0, 0.0, 0.0), |(pairs, v0, v1), c| {
                (
                    pairs + c * (c - 1.0) / 2.0,
                    v0 + c * (c - 1.0) * (c - 2.0),
                    v1 + c * (c - 1.0) * (2.0 * c + 5.0),
                )
            })
    };
    let (x_pairs, x0, x1) = ties(x);
    let (y_pairs, y0, y1) = ties(y);

    let denominator = ((total - x_pairs) * (total - y_pairs)).sqrt();
    if denominator == 0.0 {
        return None;
    }
    let balance = balance as f64;
    let tau = (balance / denominator).clamp(-1.0, 1.0);

    let m = nf * (nf - 1.0);
    let var = (m * (2.0 * nf + 5.0) - x1 - y1) / 18.0
        + 2.0 * x_pairs * y_pairs / m
        + x0 * y0 / (9.0 * m * (nf - 2.0));
    let p_value = if var > 0.0 {
        (2.0 * normal_sf((balance / var.sqrt()).abs())).min(1.0)
    } else {
        1.0
    };
    Some(Kendall { tau, p_value })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn perfect_linear_relation() {
        let x = [1.0, 2.0, 3.0, 4.0];
        let y = [2.0, 4.0, 6.0, 8.0];
        let r = correlation(&x, &y, CorrelationMethod::Pearson).unwrap();
        assert!((r.coefficient - 1.0).abs() < 1e-12);
        assert!(r.p_value < 1e-9);
    }

    #[test]
    fn spearman_is_rank_based() {
        let x = [1.0, 2.0, 3.0, 4.0, 5.0];
        let y = [1.0, 4.0, 9.0, 16.0, 100.0];
        let r = correlation(&x, &y, CorrelationMethod::Spearman).unwrap();
        assert!((r.coefficient - 1.0).abs() < 1e-12);
    }

    #[test]
    fn kendall_matches_hand_count() {
        // 5 concordant, 1 discordant pair out of 6.
        let x = [1.0, 2.0, 3.0, 4.0];
        let y = [1.0, 3.0, 2.0, 4.0];
        let r = correlation(&x, &y, CorrelationMethod::Kendall).unwrap();
        assert!((r.coefficient - 4.0 / 6.0).abs() < 1e-12);
        assert!(r.p_value > 0.0 && r.p_value < 1.0);
    }

    #[test]
    fn degenerate_input_is_rejected() {
        let err = correlation(&[1.0, 1.0, 1.0], &[1.0, 2.0, 3.0], CorrelationMethod::Pearson);
        assert!(matches!(err, Err(StatsError::InvalidArgument(_))));
        let err = correlation(&[1.0, 2.0], &[1.0, 2.0], CorrelationMethod::Spearman);
        assert!(matches!(err, Err(StatsError::InvalidArgument(_))));
        let err = correlation(&[1.0, 2.0, 3.0], &[1.0, 2.0], CorrelationMethod::Kendall);
        assert!(matches!(err, Err(StatsError::InvalidArgument(_))));
        let err = correlation(&[1.0, f64::NAN, 3.0], &[1.0, 2.0, 3.0], CorrelationMethod::Kendall);
        assert!(matches!(err, Err(StatsError::InvalidArgument(_))));
    }

    #[test]
    fn method_names_parse() {
        assert_eq!("Kendall".parse::<CorrelationMethod>().unwrap(), CorrelationMethod::Kendall);
        assert!("cosine".parse::<CorrelationMethod>().is_err());
    }
}
