//! English detection and filtering.
//!
//! Two signals are kept apart:
//!
//! - **declared**: a community is English when its canonical `languages`
//!   cell is exactly the text `"en"`. List-valued language cells never
//!   qualify.
//! - **classified**: a rule is English when an injected classifier labels
//!   its text `"English"`. Classifier failures count as not English.

use std::collections::{BTreeMap, BTreeSet};

use commlens_model::{CellValue, Platform, PreconditionError, Rule};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, trace};

use crate::normalize::CanonicalTable;
use crate::schema::LANGUAGES;
use crate::standardize::{StandardizedRules, check_unique, standardize_text};

pub const ENGLISH_CODE: &str = "en";
pub const ENGLISH_LABEL: &str = "English";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClassifierError {
    #[error("no text to classify")]
    EmptyInput,
    #[error("classifier failed: {0}")]
    Failed(String),
}

/// Black-box text → language label capability.
pub trait LanguageClassifier {
    fn classify(&self, text: &str) -> Result<String, ClassifierError>;
}

impl<F> LanguageClassifier for F
where
    F: Fn(&str) -> Result<String, ClassifierError>,
{
    fn classify(&self, text: &str) -> Result<String, ClassifierError> {
        self(text)
    }
}

const ENGLISH_MARKERS: &[&str] = &[
    "a", "about", "all", "allowed", "also", "always", "an", "and", "any", "are", "as", "at", "be",
    "before", "behavior", "by", "can", "content", "do", "don", "else", "every", "for", "from",
    "harassment", "have", "if", "in", "is", "it", "keep", "kind", "may", "must", "no", "not",
    "of", "on", "only", "or", "other", "others", "please", "post", "posting", "posts", "respect",
    "rules", "should", "spam", "that", "the", "this", "to", "use", "we", "will", "with", "you",
    "your",
];

/// Labels text `"English"` when enough of its tokens are common English
/// function words or moderation vocabulary, `"Unknown"` otherwise.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StopwordClassifier {
    pub min_share: f64,
}

impl Default for StopwordClassifier {
    fn default() -> Self {
        Self { min_share: 0.2 }
    }
}

impl LanguageClassifier for StopwordClassifier {
    fn classify(&self, text: &str) -> Result<String, ClassifierError> {
        let tokens = standardize_text(text);
        if tokens.is_empty() {
            return Err(ClassifierError::EmptyInput);
        }
        let hits = tokens
            .iter()
            .filter(|token| ENGLISH_MARKERS.binary_search(&token.as_str()).is_ok())
            .count();
        let share = hits as f64 / tokens.len() as f64;
        let label = if hits > 0 && share >= self.min_share {
            ENGLISH_LABEL
        } else {
            "Unknown"
        };
        Ok(label.to_string())
    }
}

/// Declared signal for one `languages` cell.
pub fn is_english_declared(languages: &CellValue) -> bool {
    matches!(languages, CellValue::Text(code) if code == ENGLISH_CODE)
}

/// Declared signal for every community row.
pub fn english_communities(table: &CanonicalTable) -> Vec<bool> {
    table
        .column(LANGUAGES)
        .map(|column| column.values.iter().map(is_english_declared).collect())
        .unwrap_or_else(|| vec![false; table.height()])
}

/// Classified signal for one text. Any classifier error means not English.
pub fn classify_english(
    classifier: &dyn LanguageClassifier,
    text: &str,
    english_label: &str,
) -> bool {
    match classifier.classify(text) {
        Ok(label) => label == english_label,
        Err(error) => {
            trace!(%error, "classification failed, treating as not English");
            false
        }
    }
}

/// Which standardized text a platform hands to the classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClassificationInput {
    /// Rule tokens followed by hint tokens.
    DocumentTokens,
    /// Rule tokens only.
    StandardizedText,
}

impl ClassificationInput {
    pub fn text_for(self, rule: &Rule) -> String {
        let tokens = match self {
            Self::DocumentTokens => rule.document_tokens.as_ref().or(rule.tokens.as_ref()),
            Self::StandardizedText => rule.tokens.as_ref(),
        };
        tokens.map(|t| t.join(" ")).unwrap_or_default()
    }
}

/// Rules carrying an `is_english_predicted` flag.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassifiedRules {
    platform: Platform,
    server_count: usize,
    rules: Vec<Rule>,
}

impl StandardizedRules {
    pub fn classify(
        self,
        classifier: &dyn LanguageClassifier,
        input: ClassificationInput,
        english_label: &str,
    ) -> ClassifiedRules {
        let platform = self.platform();
        let server_count = self.server_count();
        let rules: Vec<Rule> = self
            .into_rules()
            .into_iter()
            .map(|mut rule| {
                let text = input.text_for(&rule);
                rule.is_english_predicted =
                    Some(classify_english(classifier, &text, english_label));
                rule
            })
            .collect();
        let english = rules
            .iter()
            .filter(|rule| rule.is_english_predicted == Some(true))
            .count();
        info!(platform = %platform, rules = rules.len(), english, "classified rules");
        ClassifiedRules {
            platform,
            server_count,
            rules,
        }
    }
}

impl ClassifiedRules {
    /// Rebuilds the stage from loose records, e.g. deserialized ones.
    pub fn from_rules(
        platform: Platform,
        server_count: usize,
        rules: Vec<Rule>,
    ) -> Result<Self, PreconditionError> {
        check_unique(&rules)?;
        for rule in &rules {
            if rule.tokens.is_none() {
                return Err(PreconditionError::NotStandardized {
                    server_id: rule.server_id,
                    rule_id: rule.rule_id.clone(),
                });
            }
            if rule.is_english_predicted.is_none() {
                return Err(PreconditionError::NotClassified {
                    server_id: rule.server_id,
                    rule_id: rule.rule_id.clone(),
                });
            }
        }
        Ok(Self {
            platform,
            server_count,
            rules,
        })
    }

    pub fn platform(&self) -> Platform {
        self.platform
    }

    pub fn server_count(&self) -> usize {
        self.server_count
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Fraction of each server's rules flagged English.
    pub fn english_share_by_server(&self) -> BTreeMap<usize, f64> {
        let mut counts: BTreeMap<usize, (usize, usize)> = BTreeMap::new();
        for rule in &self.rules {
            let entry = counts.entry(rule.server_id).or_default();
            entry.1 += 1;
            if rule.is_english_predicted == Some(true) {
                entry.0 += 1;
            }
        }
        counts
            .into_iter()
            .map(|(server, (english, total))| (server, english as f64 / total as f64))
            .collect()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterOptions {
    /// Servers whose rules must each be classified English to survive.
    pub override_servers: BTreeSet<usize>,
}

impl FilterOptions {
    #[must_use]
    pub fn with_override(mut self, server_id: usize) -> Self {
        self.override_servers.insert(server_id);
        self
    }
}

/// Before/after counts of a filtering pass.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FilterReport {
    pub before: usize,
    pub after: usize,
    pub removed_pct: f64,
}

impl FilterReport {
    fn new(before: usize, after: usize) -> Self {
        let removed_pct = if before == 0 {
            0.0
        } else {
            (before - after) as f64 / before as f64 * 100.0
        };
        Self {
            before,
            after,
            removed_pct,
        }
    }
}

/// Rules left after English filtering.
#[derive(Debug, Clone, PartialEq)]
pub struct FilteredRules {
    platform: Platform,
    server_count: usize,
    rules: Vec<Rule>,
    report: FilterReport,
}

impl FilteredRules {
    fn new(platform: Platform, server_count: usize, before: usize, rules: Vec<Rule>) -> Self {
        let report = FilterReport::new(before, rules.len());
        info!(
            platform = %platform,
            before = report.before,
            after = report.after,
            removed_pct = format!("{:.2}", report.removed_pct),
            "filtered rules to English"
        );
        Self {
            platform,
            server_count,
            rules,
            report,
        }
    }

    pub fn platform(&self) -> Platform {
        self.platform
    }

    pub fn server_count(&self) -> usize {
        self.server_count
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn report(&self) -> FilterReport {
        self.report
    }
}

/// Drops every rule of a server with no English-classified rule; on
/// override servers, additionally drops each rule not itself English.
pub fn filter_by_english_share(rules: ClassifiedRules, options: &FilterOptions) -> FilteredRules {
    let shares = rules.english_share_by_server();
    let before = rules.len();
    let ClassifiedRules {
        platform,
        server_count,
        rules,
    } = rules;
    let kept = rules
        .into_iter()
        .filter(|rule| {
            let share = shares.get(&rule.server_id).copied().unwrap_or(0.0);
            if share <= 0.0 {
                return false;
            }
            !options.override_servers.contains(&rule.server_id)
                || rule.is_english_predicted == Some(true)
        })
        .collect();
    FilteredRules::new(platform, server_count, before, kept)
}

/// Keeps rules of communities whose declared language is English.
/// Per-rule predictions are carried through untouched.
pub fn filter_by_declared_language(rules: ClassifiedRules, english: &[bool]) -> FilteredRules {
    let before = rules.len();
    let ClassifiedRules {
        platform,
        server_count,
        rules,
    } = rules;
    let kept = rules
        .into_iter()
        .filter(|rule| english.get(rule.server_id).copied().unwrap_or(false))
        .collect();
    FilteredRules::new(platform, server_count, before, kept)
}

/// Value counts of declared languages, most frequent first.
///
/// List cells are joined with `", "` so multi-language directories show
/// up as one combined label.
pub fn declared_language_counts(table: &CanonicalTable) -> Vec<(String, usize)> {
    let Some(column) = table.column(LANGUAGES) else {
        return Vec::new();
    };
    let mut counts: BTreeMap<String, usize> = BTreeMap::new();
    for cell in &column.values {
        let label = match cell {
            CellValue::List(items) => items
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(", "),
            other => other.to_string(),
        };
        *counts.entry(label).or_default() += 1;
    }
    let mut ordered: Vec<(String, usize)> = counts.into_iter().collect();
    ordered.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    ordered
}

/// One row of a side-by-side language distribution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LanguageRow {
    pub left: Option<(String, usize)>,
    pub right: Option<(String, usize)>,
}

/// Pairs two [`declared_language_counts`] results rank by rank; the
/// shorter side is padded with `None`.
pub fn compare_language_distributions(
    left: &[(String, usize)],
    right: &[(String, usize)],
) -> Vec<LanguageRow> {
    (0..left.len().max(right.len()))
        .map(|idx| LanguageRow {
            left: left.get(idx).cloned(),
            right: right.get(idx).cloned(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use commlens_model::RuleId;

    #[test]
    fn markers_are_sorted_for_binary_search() {
        assert!(ENGLISH_MARKERS.windows(2).all(|pair| pair[0] < pair[1]));
    }

    #[test]
    fn declared_signal_requires_scalar_en() {
        assert!(is_english_declared(&CellValue::text("en")));
        assert!(!is_english_declared(&CellValue::text("EN")));
        assert!(!is_english_declared(&CellValue::List(vec![
            CellValue::text("en"),
            CellValue::text("fr"),
        ])));
        assert!(!is_english_declared(&CellValue::List(vec![CellValue::text("en")])));
    }

    #[test]
    fn stopword_classifier_rejects_empty_text() {
        let classifier = StopwordClassifier::default();
        assert_eq!(classifier.classify("  !! "), Err(ClassifierError::EmptyInput));
        assert!(!classify_english(&classifier, "", ENGLISH_LABEL));
        assert!(classify_english(&classifier, "no spam please", ENGLISH_LABEL));
        assert!(!classify_english(&classifier, "keine werbung", ENGLISH_LABEL));
    }

    #[test]
    fn closures_act_as_classifiers() {
        let always_fails = |_: &str| -> Result<String, ClassifierError> {
            Err(ClassifierError::Failed("offline".to_string()))
        };
        assert!(!classify_english(&always_fails, "no spam", ENGLISH_LABEL));
    }

    #[test]
    fn classification_input_uses_hints_only_for_documents() {
        let mut rule = Rule::new(0, RuleId::Sequential(0), "be kind");
        rule.tokens = Some(vec!["be".into(), "kind".into()]);
        rule.document_tokens = Some(vec!["be".into(), "kind".into(), "always".into()]);
        assert_eq!(ClassificationInput::DocumentTokens.text_for(&rule), "be kind always");
        assert_eq!(ClassificationInput::StandardizedText.text_for(&rule), "be kind");
    }

    #[test]
    fn distributions_are_padded_to_the_longer_side() {
        let left = vec![("en".to_string(), 3)];
        let right = vec![("en".to_string(), 5), ("de".to_string(), 1)];
        let rows = compare_language_distributions(&left, &right);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].left, None);
        assert_eq!(rows[1].right, Some(("de".to_string(), 1)));
    }

    #[test]
    fn report_handles_empty_input() {
        let report = FilterReport::new(0, 0);
        assert_eq!(report.removed_pct, 0.0);
        assert_eq!(FilterReport::new(4, 1).removed_pct, 75.0);
    }
}
