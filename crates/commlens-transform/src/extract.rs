//! Rule extraction: one output row per rule payload of each community.

use std::collections::{BTreeMap, HashSet};

use commlens_model::{CellValue, Platform, Rule, RuleId, SchemaError};
use tracing::{info, warn};

use crate::normalize::CanonicalTable;

const ID_FIELD: &str = "id";
const TEXT_FIELD: &str = "text";
const HINT_FIELD: &str = "hint";

/// Raw extracted rules, keyed by `(server_id, rule_id)`.
#[derive(Debug, Clone, PartialEq)]
pub struct RulesTable {
    platform: Platform,
    server_count: usize,
    rules: Vec<Rule>,
}

impl RulesTable {
    pub fn platform(&self) -> Platform {
        self.platform
    }

    /// Number of community rows the `server_id`s index into.
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

/// Explodes the canonical `rules` column into a flat rules table.
///
/// Record payloads keep their own `id` (a missing or repeated id falls
/// back to the payload's position), string payloads are numbered per
/// server in list order. Null and blank payloads are dropped. Text is
/// kept exactly as ingested.
pub fn extract_rules(table: &CanonicalTable) -> Result<RulesTable, SchemaError> {
    let column = table.rules_column()?;
    let mut rules = Vec::new();
    let mut dropped = 0usize;

    for (server_id, cell) in column.values.iter().enumerate() {
        let payloads = cell.as_list().unwrap_or_default();
        let mut seen: HashSet<RuleId> = HashSet::new();
        let mut position = 0usize;
        for payload in payloads {
            let Some(rule) = rule_from_payload(server_id, position, payload, &seen) else {
                dropped += 1;
                continue;
            };
            seen.insert(rule.rule_id.clone());
            rules.push(rule);
            position += 1;
        }
    }

    info!(
        platform = %table.platform(),
        communities = table.height(),
        rules = rules.len(),
        dropped_payloads = dropped,
        "extracted rules"
    );
    Ok(RulesTable {
        platform: table.platform(),
        server_count: table.height(),
        rules,
    })
}

fn rule_from_payload(
    server_id: usize,
    position: usize,
    payload: &CellValue,
    seen: &HashSet<RuleId>,
) -> Option<Rule> {
    match payload {
        CellValue::Missing => None,
        CellValue::Record(fields) if fields.is_empty() => None,
        CellValue::Record(fields) => Some(rule_from_record(server_id, position, fields, seen)),
        CellValue::Text(text) if text.trim().is_empty() => None,
        other => Some(Rule::new(
            server_id,
            RuleId::Sequential(position),
            other.to_string(),
        )),
    }
}

fn rule_from_record(
    server_id: usize,
    position: usize,
    fields: &BTreeMap<String, CellValue>,
    seen: &HashSet<RuleId>,
) -> Rule {
    let mut extra = fields.clone();
    let explicit = extra
        .remove(ID_FIELD)
        .filter(|id| !id.is_missing())
        .map(|id| RuleId::Explicit(id.to_string()));
    let rule_id = match explicit {
        Some(id) if !seen.contains(&id) => id,
        Some(id) => {
            warn!(server_id, rule_id = %id, position, "duplicate rule id, using position");
            RuleId::Sequential(position)
        }
        None => RuleId::Sequential(position),
    };
    let text = extra.remove(TEXT_FIELD).map(|t| t.to_string()).unwrap_or_default();
    let hint = extra
        .remove(HINT_FIELD)
        .filter(|h| !h.is_missing())
        .map(|h| h.to_string());
    Rule {
        hint,
        extra,
        ..Rule::new(server_id, rule_id, text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(pairs: &[(&str, &str)]) -> CellValue {
        CellValue::Record(
            pairs
                .iter()
                .map(|(k, v)| ((*k).to_string(), CellValue::text(*v)))
                .collect(),
        )
    }

    #[test]
    fn record_without_id_falls_back_to_position() {
        let seen = HashSet::new();
        let rule = rule_from_payload(4, 2, &record(&[("text", "Be kind")]), &seen).unwrap();
        assert_eq!(rule.rule_id, RuleId::Sequential(2));
        assert_eq!(rule.text, "Be kind");
        assert_eq!(rule.hint, None);
    }

    #[test]
    fn extra_record_fields_are_flattened() {
        let seen = HashSet::new();
        let payload = record(&[("id", "9"), ("text", "t"), ("hint", "h"), ("translations", "{}")]);
        let rule = rule_from_payload(0, 0, &payload, &seen).unwrap();
        assert_eq!(rule.rule_id, RuleId::Explicit("9".to_string()));
        assert_eq!(rule.hint.as_deref(), Some("h"));
        assert_eq!(rule.extra.keys().collect::<Vec<_>>(), vec!["translations"]);
    }

    #[test]
    fn null_and_blank_payloads_are_dropped() {
        let seen = HashSet::new();
        assert!(rule_from_payload(0, 0, &CellValue::Missing, &seen).is_none());
        assert!(rule_from_payload(0, 0, &CellValue::text("  "), &seen).is_none());
        assert!(rule_from_payload(0, 0, &CellValue::Record(BTreeMap::new()), &seen).is_none());
    }
}
