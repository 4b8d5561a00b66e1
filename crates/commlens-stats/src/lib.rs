//! Statistical comparison of community metrics across platforms.
//!
//! - **correlation**: Pearson, Spearman and Kendall with two-tailed p-values
//! - **fisher**: r-to-z test for the difference of two correlations
//! - **bootstrap**: seeded resampling test for a rank-correlation difference
//! - **ttest**: Welch and pooled two-sample t-tests
//! - **regression**: least-squares line fit
//! - **forest** / **shap**: random-forest regression and Shapley attribution
//! - **columns**: numeric extraction from polars frames
//!
//! Every procedure validates its input and returns
//! [`StatsError::InvalidArgument`] instead of a NaN result.

pub mod bootstrap;
pub mod columns;
pub mod correlation;
pub mod distribution;
pub mod error;
pub mod fisher;
pub mod forest;
mod moments;
mod rank;
pub mod regression;
mod rng;
pub mod shap;
pub mod ttest;

pub use bootstrap::{BootstrapOptions, BootstrapResult, bootstrap_correlation_diff};
pub use columns::{complete_columns, numeric_column, paired_columns};
pub use correlation::{CorrelationMethod, CorrelationResult, correlation};
pub use error::{Result, StatsError};
pub use fisher::{FisherZResult, fisher_transform, fisher_z_test};
pub use forest::{ForestOptions, RandomForest};
pub use regression::{LinearFit, linear_fit};
pub use shap::{
    FeatureAttribution, InteractionAttribution, ShapOptions, ShapReport, shap_attribution,
};
pub use ttest::{TTestResult, welch_t_test};
