//! Fisher r-to-z comparison of two independent correlations.

use serde::Serialize;

use crate::correlation::{CorrelationMethod, correlation};
use crate::distribution::normal_sf;
use crate::error::{Result, invalid};

/// Correlations are clipped into `[-R_CLIP, R_CLIP]` before transforming.
pub const R_CLIP: f64 = 0.999_999;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FisherZResult {
    pub method: CorrelationMethod,
    pub r1: f64,
    pub r2: f64,
    pub n1: usize,
    pub n2: usize,
    pub z_score: f64,
    pub p_value: f64,
}

pub fn fisher_transform(r: f64) -> f64 {
    let r = r.clamp(-R_CLIP, R_CLIP);
    0.5 * ((1.0 + r) / (1.0 - r)).ln()
}

/// Tests whether corr(x1, y1) and corr(x2, y2) differ. Each group needs
/// more than three pairs.
pub fn fisher_z_test(
    x1: &[f64],
    y1: &[f64],
    x2: &[f64],
    y2: &[f64],
    method: CorrelationMethod,
) -> Result<FisherZResult> {
    if method == CorrelationMethod::Kendall {
        return Err(invalid("Fisher z comparison supports pearson or spearman"));
    }
    let (n1, n2) = (x1.len(), x2.len());
    if n1 <= 3 || n2 <= 3 {
        return Err(invalid(format!(
            "Fisher z comparison needs more than 3 pairs per group, got {n1} and {n2}"
        )));
    }
    let r1 = correlation(x1, y1, method)?.coefficient;
    let r2 = correlation(x2, y2, method)?.coefficient;

    let se = (1.0 / (n1 as f64 - 3.0) + 1.0 / (n2 as f64 - 3.0)).sqrt();
    let z_score = (fisher_transform(r1) - fisher_transform(r2)) / se;
    let p_value = (2.0 * normal_sf(z_score.abs())).min(1.0);
    Ok(FisherZResult {
        method,
        r1,
        r2,
        n1,
        n2,
        z_score,
        p_value,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transform_is_finite_at_the_bounds() {
        assert!(fisher_transform(1.0).is_finite());
        assert!(fisher_transform(-1.0).is_finite());
        assert_eq!(fisher_transform(0.0), 0.0);
        assert_eq!(fisher_transform(1.0), -fisher_transform(-1.0));
    }

    #[test]
    fn identical_groups_do_not_differ() {
        let x = [1.0, 2.0, 3.0, 4.0, 5.0];
        let y = [2.0, 1.0, 4.0, 3.0, 6.0];
        let result = fisher_z_test(&x, &y, &x, &y, CorrelationMethod::Pearson).unwrap();
        assert_eq!(result.z_score, 0.0);
        assert!((result.p_value - 1.0).abs() < 1e-6);
    }

    #[test]
    fn small_groups_and_kendall_are_rejected() {
        let x = [1.0, 2.0, 3.0];
        let long = [1.0, 2.0, 3.0, 4.0];
        assert!(fisher_z_test(&x, &x, &long, &long, CorrelationMethod::Pearson).is_err());
        assert!(fisher_z_test(&long, &long, &long, &long, CorrelationMethod::Kendall).is_err());
    }
}
