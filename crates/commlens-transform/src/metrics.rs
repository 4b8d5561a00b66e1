//! Per-server aggregates over filtered rules.

use commlens_model::Rule;
use serde::Serialize;

/// Prohibition markers, as standardized token sequences.
const STRICT_MARKERS: &[&[&str]] = &[&["no"], &["do", "not"], &["don", "t"]];

/// Whether a standardized rule reads as a prohibition.
pub fn is_strict(tokens: &[String]) -> bool {
    STRICT_MARKERS.iter().any(|marker| {
        tokens
            .windows(marker.len())
            .any(|window| window.iter().zip(marker.iter()).all(|(a, b)| a == b))
    })
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ServerRuleMetrics {
    pub server_id: usize,
    pub rule_count: usize,
    pub mean_tokens: f64,
    pub strict_share: f64,
    pub english_share: f64,
}

impl ServerRuleMetrics {
    fn empty(server_id: usize) -> Self {
        Self {
            server_id,
            rule_count: 0,
            mean_tokens: 0.0,
            strict_share: 0.0,
            english_share: 0.0,
        }
    }
}

/// One entry per server in `0..server_count`; servers without rules get zeros.
pub fn server_rule_metrics(rules: &[Rule], server_count: usize) -> Vec<ServerRuleMetrics> {
    let mut metrics: Vec<ServerRuleMetrics> =
        (0..server_count).map(ServerRuleMetrics::empty).collect();
    let mut tokens = vec![0usize; server_count];
    let mut strict = vec![0usize; server_count];
    let mut english = vec![0usize; server_count];

    for rule in rules {
        let Some(entry) = metrics.get_mut(rule.server_id) else {
            continue;
        };
        entry.rule_count += 1;
        let rule_tokens = rule.tokens.as_deref().unwrap_or_default();
        tokens[rule.server_id] += rule_tokens.len();
        if is_strict(rule_tokens) {
            strict[rule.server_id] += 1;
        }
        if rule.is_english_predicted == Some(true) {
            english[rule.server_id] += 1;
        }
    }

    for entry in metrics.iter_mut().filter(|m| m.rule_count > 0) {
        let n = entry.rule_count as f64;
        entry.mean_tokens = tokens[entry.server_id] as f64 / n;
        entry.strict_share = strict[entry.server_id] as f64 / n;
        entry.english_share = english[entry.server_id] as f64 / n;
    }
    metrics
}
