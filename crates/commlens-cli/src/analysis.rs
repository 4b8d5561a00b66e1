//! Runs both platforms through the pipeline and compares the results.

use std::path::Path;

use anyhow::{Context, Result};
use commlens_ingest::read_raw_table;
use commlens_model::Platform;
use commlens_stats::{
    BootstrapResult, CorrelationResult, FisherZResult, LinearFit, ShapOptions, ShapReport,
    TTestResult, bootstrap_correlation_diff, correlation, fisher_z_test, linear_fit, numeric_column,
    paired_columns, shap_attribution, welch_t_test,
};
use commlens_transform::frame::{MEAN_TOKENS, RULE_COUNT, STRICT_SHARE};
use commlens_transform::schema::{ACTIVE_MONTH, TOTAL_USERS};
use commlens_transform::{
    CanonicalTable, PipelineOutput, StopwordClassifier, adapter_for, english_communities,
    metrics_frame, run_pipeline,
};
use polars::prelude::DataFrame;
use serde::Serialize;
use tracing::{info, info_span, warn};

use crate::config::AnalysisConfig;

/// A statistic, or the reason it could not be computed.
pub type Outcome<T> = std::result::Result<T, String>;

/// Column pairs correlated within each platform.
pub const CORRELATION_PAIRS: [(&str, &str); 4] = [
    (TOTAL_USERS, ACTIVE_MONTH),
    (RULE_COUNT, TOTAL_USERS),
    (RULE_COUNT, ACTIVE_MONTH),
    (STRICT_SHARE, TOTAL_USERS),
];

/// Pair whose correlation is compared across platforms.
pub const CROSS_PLATFORM_PAIR: (&str, &str) = (RULE_COUNT, TOTAL_USERS);

pub const DEFAULT_FEATURES: [&str; 4] = [TOTAL_USERS, ACTIVE_MONTH, MEAN_TOKENS, STRICT_SHARE];
pub const DEFAULT_TARGET: &str = RULE_COUNT;

pub struct PlatformRun {
    pub platform: Platform,
    pub output: PipelineOutput,
    /// Community scalars joined with per-server rule metrics.
    pub frame: DataFrame,
}

pub fn load_canonical(
    path: &Path,
    platform: Platform,
    config: &AnalysisConfig,
) -> Result<CanonicalTable> {
    let raw = read_raw_table(path, platform)
        .with_context(|| format!("read {platform} export {}", path.display()))?;
    let adapter = adapter_for(platform, config.normalize_options())?;
    adapter
        .normalize(raw)
        .with_context(|| format!("normalize {platform} table"))
}

pub fn run_platform(
    path: &Path,
    platform: Platform,
    config: &AnalysisConfig,
) -> Result<PlatformRun> {
    let span = info_span!("platform", platform = %platform, path = %path.display());
    let _guard = span.enter();

    let raw = read_raw_table(path, platform)
        .with_context(|| format!("read {platform} export {}", path.display()))?;
    let adapter = adapter_for(platform, config.normalize_options())?;
    let output = run_pipeline(
        adapter.as_ref(),
        raw,
        &StopwordClassifier::default(),
        &config.pipeline_options(),
    )
    .with_context(|| format!("run {platform} pipeline"))?;
    let frame = metrics_frame(&output.canonical, &output.metrics)
        .context("join community columns with rule metrics")?;
    Ok(PlatformRun {
        platform,
        output,
        frame,
    })
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlatformSummary {
    pub platform: Platform,
    pub communities: usize,
    /// Communities declaring exactly `en`.
    pub english_communities: usize,
    pub rules_extracted: usize,
    pub rules_kept: usize,
    pub removed_pct: f64,
}

impl From<&PlatformRun> for PlatformSummary {
    fn from(run: &PlatformRun) -> Self {
        let output = &run.output;
        Self {
            platform: run.platform,
            communities: output.canonical.height(),
            english_communities: english_communities(&output.canonical)
                .into_iter()
                .filter(|english| *english)
                .count(),
            rules_extracted: output.rules_extracted,
            rules_kept: output.report.after,
            removed_pct: output.report.removed_pct,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CorrelationRow {
    pub platform: Platform,
    pub x: String,
    pub y: String,
    pub result: Outcome<CorrelationResult>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendRow {
    pub platform: Platform,
    pub x: String,
    pub y: String,
    pub fit: Outcome<LinearFit>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparisonReport {
    pub platforms: Vec<PlatformSummary>,
    pub correlations: Vec<CorrelationRow>,
    pub trends: Vec<TrendRow>,
    pub fisher: Outcome<FisherZResult>,
    pub bootstrap: Outcome<BootstrapResult>,
    /// Rules per community with at least one kept rule.
    pub rule_counts: Outcome<TTestResult>,
}

fn outcome<T>(label: &str, result: commlens_stats::Result<T>) -> Outcome<T> {
    result.map_err(|error| {
        warn!(statistic = label, %error, "statistic skipped");
        error.to_string()
    })
}

fn pair(run: &PlatformRun, x: &str, y: &str) -> commlens_stats::Result<(Vec<f64>, Vec<f64>)> {
    paired_columns(&run.frame, x, y)
}

fn active_rule_counts(run: &PlatformRun) -> commlens_stats::Result<Vec<f64>> {
    Ok(numeric_column(&run.frame, RULE_COUNT)?
        .into_iter()
        .flatten()
        .filter(|count| *count > 0.0)
        .collect())
}

pub fn compare(
    mastodon: &PlatformRun,
    reddit: &PlatformRun,
    config: &AnalysisConfig,
) -> ComparisonReport {
    let runs = [mastodon, reddit];
    let method = config.correlation_method;

    let correlations = runs
        .iter()
        .flat_map(|run| {
            CORRELATION_PAIRS.iter().map(move |&(x, y)| CorrelationRow {
                platform: run.platform,
                x: x.to_string(),
                y: y.to_string(),
                result: outcome(
                    "correlation",
                    pair(run, x, y).and_then(|(xs, ys)| correlation(&xs, &ys, method)),
                ),
            })
        })
        .collect();

    let trends = runs
        .iter()
        .map(|run| TrendRow {
            platform: run.platform,
            x: TOTAL_USERS.to_string(),
            y: ACTIVE_MONTH.to_string(),
            fit: outcome(
                "linear fit",
                pair(run, TOTAL_USERS, ACTIVE_MONTH).and_then(|(xs, ys)| linear_fit(&xs, &ys)),
            ),
        })
        .collect();

    let (x, y) = CROSS_PLATFORM_PAIR;
    let groups = pair(mastodon, x, y).and_then(|a| Ok((a, pair(reddit, x, y)?)));
    let fisher = outcome(
        "fisher z",
        groups.as_ref().map_err(clone_error).and_then(|((x1, y1), (x2, y2))| {
            fisher_z_test(x1, y1, x2, y2, config.fisher_method())
        }),
    );
    let bootstrap = outcome(
        "bootstrap",
        groups.as_ref().map_err(clone_error).and_then(|((x1, y1), (x2, y2))| {
            bootstrap_correlation_diff(x1, y1, x2, y2, &config.bootstrap_options())
        }),
    );

    let rule_counts = outcome(
        "welch t",
        active_rule_counts(mastodon)
            .and_then(|a| Ok((a, active_rule_counts(reddit)?)))
            .and_then(|(a, b)| welch_t_test(&a, &b, false)),
    );

    info!(correlation_method = %method, "comparison finished");
    ComparisonReport {
        platforms: runs.iter().map(|run| PlatformSummary::from(*run)).collect(),
        correlations,
        trends,
        fisher,
        bootstrap,
        rule_counts,
    }
}

fn clone_error(error: &commlens_stats::StatsError) -> commlens_stats::StatsError {
    commlens_stats::StatsError::InvalidArgument(error.to_string())
}

/// Attribution of one platform's metric frame.
pub fn attribute(
    run: &PlatformRun,
    features: &[&str],
    target: &str,
    interaction: Option<(&str, &str)>,
    options: &ShapOptions,
) -> Result<ShapReport> {
    shap_attribution(&run.frame, features, target, interaction, options)
        .with_context(|| format!("attribute {target} on {}", run.platform))
}

