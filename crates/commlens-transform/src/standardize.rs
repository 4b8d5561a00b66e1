//! Text standardization into canonical token sequences.

use std::collections::HashSet;

use commlens_model::{CellValue, Platform, PreconditionError, Rule};
use tracing::debug;

use crate::extract::RulesTable;

/// Lowercases, blanks out everything but ASCII letters, digits and
/// whitespace, and splits on whitespace. Never fails; empty input yields
/// no tokens.
pub fn standardize_text(text: &str) -> Vec<String> {
    let cleaned: String = text
        .trim()
        .to_lowercase()
        .chars()
        .map(|ch| {
            if ch.is_ascii_alphanumeric() || ch.is_whitespace() {
                ch
            } else {
                ' '
            }
        })
        .collect();
    cleaned.split_whitespace().map(str::to_string).collect()
}

/// Cell-level standardization: text becomes a list of token cells, any
/// other value is returned unchanged.
pub fn standardize_cell(cell: &CellValue) -> CellValue {
    match cell {
        CellValue::Text(text) => CellValue::List(
            standardize_text(text)
                .into_iter()
                .map(CellValue::Text)
                .collect(),
        ),
        other => other.clone(),
    }
}

/// Rule tokens followed by hint tokens when a hint exists.
pub fn build_document(tokens: &[String], hint_tokens: Option<&[String]>) -> Vec<String> {
    match hint_tokens {
        Some(hint) => tokens.iter().chain(hint).cloned().collect(),
        None => tokens.to_vec(),
    }
}

/// Rules whose `tokens`, `hint_tokens` and `document_tokens` are populated.
#[derive(Debug, Clone, PartialEq)]
pub struct StandardizedRules {
    platform: Platform,
    server_count: usize,
    rules: Vec<Rule>,
}

impl RulesTable {
    /// Adds token fields to every rule; raw text and hint stay untouched.
    pub fn standardize(self) -> StandardizedRules {
        let platform = self.platform();
        let server_count = self.server_count();
        let rules: Vec<Rule> = self
            .into_rules()
            .into_iter()
            .map(|mut rule| {
                let tokens = standardize_text(&rule.text);
                let hint_tokens = rule.hint.as_deref().map(standardize_text);
                rule.document_tokens = Some(build_document(&tokens, hint_tokens.as_deref()));
                rule.tokens = Some(tokens);
                rule.hint_tokens = hint_tokens;
                rule
            })
            .collect();
        debug!(platform = %platform, rules = rules.len(), "standardized rules");
        StandardizedRules {
            platform,
            server_count,
            rules,
        }
    }
}

impl StandardizedRules {
    /// Rebuilds the stage from loose records, e.g. deserialized ones.
    pub fn from_rules(
        platform: Platform,
        server_count: usize,
        rules: Vec<Rule>,
    ) -> Result<Self, PreconditionError> {
        check_unique(&rules)?;
        if let Some(rule) = rules
            .iter()
            .find(|rule| rule.tokens.is_none() || rule.document_tokens.is_none())
        {
            return Err(PreconditionError::NotStandardized {
                server_id: rule.server_id,
                rule_id: rule.rule_id.clone(),
            });
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

    pub fn into_rules(self) -> Vec<Rule> {
        self.rules
    }
}

pub(crate) fn check_unique(rules: &[Rule]) -> Result<(), PreconditionError> {
    let mut seen = HashSet::with_capacity(rules.len());
    for rule in rules {
        if !seen.insert(rule.key()) {
            return Err(PreconditionError::DuplicateRule {
                server_id: rule.server_id,
                rule_id: rule.rule_id.clone(),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(words: &[&str]) -> Vec<String> {
        words.iter().map(|w| (*w).to_string()).collect()
    }

    #[test]
    fn strips_punctuation_and_collapses_whitespace() {
        assert_eq!(
            standardize_text("  No spam!!  Don't   advertise.\t"),
            tokens(&["no", "spam", "don", "t", "advertise"])
        );
    }

    #[test]
    fn non_ascii_letters_become_separators() {
        assert_eq!(
            standardize_text("Keine Beleidigungen – bitte"),
            tokens(&["keine", "beleidigungen", "bitte"])
        );
        assert!(standardize_text("日本語のみ").is_empty());
    }

    #[test]
    fn non_text_cells_pass_through() {
        assert_eq!(standardize_cell(&CellValue::Int(3)), CellValue::Int(3));
        assert_eq!(standardize_cell(&CellValue::Missing), CellValue::Missing);
        assert_eq!(
            standardize_cell(&CellValue::text("Be kind")),
            CellValue::List(vec![CellValue::text("be"), CellValue::text("kind")])
        );
    }

    #[test]
    fn document_appends_hint_tokens() {
        let text = tokens(&["be", "kind"]);
        let hint = tokens(&["no", "slurs"]);
        assert_eq!(
            build_document(&text, Some(&hint)),
            tokens(&["be", "kind", "no", "slurs"])
        );
        assert_eq!(build_document(&text, None), text);
    }
}
