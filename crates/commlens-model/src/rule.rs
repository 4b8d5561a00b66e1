use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::table::CellValue;

/// Identifier of a rule within its server.
///
/// Structured payloads carry their own id; unstructured ones get a
/// zero-based position counter.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RuleId {
    Sequential(usize),
    Explicit(String),
}

impl fmt::Display for RuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sequential(n) => write!(f, "#{n}"),
            Self::Explicit(id) => f.write_str(id),
        }
    }
}

/// One governance rule extracted from a community.
///
/// `server_id` is the row index of the originating community in its
/// canonical table. The optional fields are filled by later stages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rule {
    pub server_id: usize,
    pub rule_id: RuleId,
    pub text: String,
    pub hint: Option<String>,
    /// Remaining fields of a structured payload, flattened.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub extra: BTreeMap<String, CellValue>,
    #[serde(default)]
    pub tokens: Option<Vec<String>>,
    #[serde(default)]
    pub hint_tokens: Option<Vec<String>>,
    #[serde(default)]
    pub document_tokens: Option<Vec<String>>,
    #[serde(default)]
    pub is_english_predicted: Option<bool>,
}

impl Rule {
    pub fn new(server_id: usize, rule_id: RuleId, text: impl Into<String>) -> Self {
        Self {
            server_id,
            rule_id,
            text: text.into(),
            hint: None,
            extra: BTreeMap::new(),
            tokens: None,
            hint_tokens: None,
            document_tokens: None,
            is_english_predicted: None,
        }
    }

    #[must_use]
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }

    pub fn key(&self) -> (usize, &RuleId) {
        (self.server_id, &self.rule_id)
    }
}
