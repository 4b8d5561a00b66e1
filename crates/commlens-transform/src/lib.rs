//! Community-governance data transformations.
//!
//! Stages run in a fixed order, each producing a distinct type:
//!
//! - **normalize**: [`RawTable`](commlens_model::RawTable) → [`CanonicalTable`]
//! - **extract**: [`CanonicalTable`] → [`RulesTable`]
//! - **standardize**: [`RulesTable`] → [`StandardizedRules`]
//! - **language**: [`StandardizedRules`] → [`ClassifiedRules`] → [`FilteredRules`]
//! - **metrics**: [`FilteredRules`] → per-server [`ServerRuleMetrics`]
//!
//! [`PlatformAdapter`] picks the platform-specific variant of each stage and
//! [`run_pipeline`] chains them.

pub mod coercion;
pub mod extract;
pub mod frame;
pub mod language;
pub mod metrics;
pub mod normalize;
pub mod pipeline;
pub mod platform;
pub mod schema;
pub mod standardize;

pub use coercion::{CoercedColumn, CoercionStrategy};
pub use extract::{RulesTable, extract_rules};
pub use frame::{community_frame, metrics_frame};
pub use language::{
    ClassificationInput, ClassifiedRules, ClassifierError, FilterOptions, FilterReport,
    FilteredRules, LanguageClassifier, LanguageRow, StopwordClassifier,
    compare_language_distributions, declared_language_counts, english_communities,
    filter_by_declared_language, filter_by_english_share, is_english_declared,
};
pub use metrics::{ServerRuleMetrics, is_strict, server_rule_metrics};
pub use normalize::{
    CanonicalTable, CoercionRule, ColumnRegistry, NormalizeOptions, SchemaNormalizer,
};
pub use pipeline::{PipelineOptions, PipelineOutput, run_pipeline};
pub use platform::{MastodonAdapter, PlatformAdapter, RedditAdapter, adapter_for};
pub use standardize::{StandardizedRules, build_document, standardize_cell, standardize_text};
