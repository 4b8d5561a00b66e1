use serde::Serialize;

use crate::correlation::check_paired;
use crate::error::{Result, invalid};
use crate::moments::mean;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LinearFit {
    pub slope: f64,
    pub intercept: f64,
    pub r_squared: f64,
}

impl LinearFit {
    pub fn predict(&self, x: f64) -> f64 {
        self.slope * x + self.intercept
    }
}

/// Ordinary least squares `y = slope * x + intercept`.
pub fn linear_fit(x: &[f64], y: &[f64]) -> Result<LinearFit> {
    check_paired(x, y, 2)?;
    let (mx, my) = (mean(x), mean(y));
    let (mut sxy, mut sxx, mut syy) = (0.0, 0.0, 0.0);
    for (a, b) in x.iter().zip(y) {
        sxy += (a - mx) * (b - my);
        sxx += (a - mx).powi(2);
        syy += (b - my).powi(2);
    }
    if sxx == 0.0 {
        return Err(invalid("linear fit needs at least two distinct x values"));
    }
    let slope = sxy / sxx;
    // A constant y is fitted exactly by the flat line.
    let r_squared = if syy == 0.0 { 1.0 } else { sxy * sxy / (sxx * syy) };
    Ok(LinearFit {
        slope,
        intercept: my - slope * mx,
        r_squared,
    })
}
