//! End-to-end run of one platform: normalize, extract, standardize,
//! classify, filter, aggregate.

use commlens_model::{PipelineError, RawTable};
use tracing::info_span;

use crate::language::{FilterOptions, FilterReport, LanguageClassifier};
use crate::metrics::{ServerRuleMetrics, server_rule_metrics};
use crate::normalize::CanonicalTable;
use crate::platform::PlatformAdapter;

#[derive(Debug, Clone)]
pub struct PipelineOptions {
    pub filter: FilterOptions,
    pub english_label: String,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            filter: FilterOptions::default(),
            english_label: crate::language::ENGLISH_LABEL.to_string(),
        }
    }
}

/// What survives a run. Rule records are dropped once aggregated.
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    pub canonical: CanonicalTable,
    pub rules_extracted: usize,
    pub report: FilterReport,
    pub metrics: Vec<ServerRuleMetrics>,
}

pub fn run_pipeline(
    adapter: &dyn PlatformAdapter,
    raw: RawTable,
    classifier: &dyn LanguageClassifier,
    options: &PipelineOptions,
) -> Result<PipelineOutput, PipelineError> {
    let span = info_span!("pipeline", platform = %adapter.platform());
    let _guard = span.enter();

    let canonical = adapter.normalize(raw)?;
    let rules = adapter.extract_rules(&canonical)?;
    let rules_extracted = rules.len();
    let classified = rules.standardize().classify(
        classifier,
        adapter.classification_input(),
        &options.english_label,
    );
    let filtered = adapter.filter_english(&canonical, classified, &options.filter);
    let metrics = server_rule_metrics(filtered.rules(), filtered.server_count());

    Ok(PipelineOutput {
        canonical,
        rules_extracted,
        report: filtered.report(),
        metrics,
    })
}
