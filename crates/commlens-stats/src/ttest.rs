use serde::Serialize;

use crate::distribution::student_t_two_tailed;
use crate::error::{Result, invalid};
use crate::moments::{mean, variance};

pub const SIGNIFICANCE_LEVEL: f64 = 0.05;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TTestResult {
    pub t_statistic: f64,
    pub p_value: f64,
    pub degrees_of_freedom: f64,
    /// `p_value < 0.05`.
    pub significant: bool,
}

/// Two-sample t-test. Welch's unequal-variance form unless `equal_var`,
/// which pools the variances.
pub fn welch_t_test(sample1: &[f64], sample2: &[f64], equal_var: bool) -> Result<TTestResult> {
    let (n1, n2) = (sample1.len(), sample2.len());
    if n1 < 2 || n2 < 2 {
        return Err(invalid(format!(
            "t-test needs at least 2 values per sample, got {n1} and {n2}"
        )));
    }
    if sample1.iter().chain(sample2).any(|v| !v.is_finite()) {
        return Err(invalid("samples contain non-finite values"));
    }

    let (v1, v2) = (variance(sample1, 1), variance(sample2, 1));
    let (n1f, n2f) = (n1 as f64, n2 as f64);
    let (se2, df) = if equal_var {
        let df = n1f + n2f - 2.0;
        let pooled = ((n1f - 1.0) * v1 + (n2f - 1.0) * v2) / df;
        (pooled * (1.0 / n1f + 1.0 / n2f), df)
    } else {
        let a = v1 / n1f;
        let b = v2 / n2f;
        let df = (a + b).powi(2) / (a * a / (n1f - 1.0) + b * b / (n2f - 1.0));
        (a + b, df)
    };
    if se2 <= 0.0 {
        return Err(invalid("t-test is undefined when both samples are constant"));
    }

    let t_statistic = (mean(sample1) - mean(sample2)) / se2.sqrt();
    let p_value = student_t_two_tailed(t_statistic, df);
    Ok(TTestResult {
        t_statistic,
        p_value,
        degrees_of_freedom: df,
        significant: p_value < SIGNIFICANCE_LEVEL,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn welch_reference_values() {
        let a = [19.8, 20.4, 19.6, 17.8, 18.5, 18.9, 18.3, 18.9, 19.5, 22.0];
        let b = [28.2, 26.6, 20.1, 23.3, 25.2, 22.1, 17.7, 27.6, 20.6, 13.7];
        let result = welch_t_test(&a, &b, false).unwrap();
        assert!((result.t_statistic - (-2.074_015)).abs() < 1e-5);
        assert!((result.degrees_of_freedom - 10.209_185).abs() < 1e-5);
        assert!(result.p_value > 0.05 && result.p_value < 0.1);
        assert!(!result.significant);
    }

    #[test]
    fn pooled_variant_uses_all_degrees_of_freedom() {
        let a = [1.0, 2.0, 3.0];
        let b = [2.0, 3.0, 4.0, 5.0];
        let result = welch_t_test(&a, &b, true).unwrap();
        assert_eq!(result.degrees_of_freedom, 5.0);
        assert!(!result.significant);
    }

    #[test]
    fn constant_samples_are_rejected() {
        assert!(welch_t_test(&[1.0, 1.0], &[1.0, 1.0], false).is_err());
        assert!(welch_t_test(&[1.0], &[1.0, 2.0], false).is_err());
    }
}
