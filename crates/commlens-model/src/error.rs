use thiserror::Error;

use crate::platform::Platform;
use crate::rule::RuleId;

/// Structural problems with a table or with the coercion registry.
///
/// These are never raised for individual malformed cells; a bad cell is
/// resolved to its column default instead.
#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("column '{column}' has {actual} values, expected {expected}")]
    ColumnLength {
        column: String,
        expected: usize,
        actual: usize,
    },

    #[error("duplicate column '{0}'")]
    DuplicateColumn(String),

    #[error("{found} table handed to the {expected} normalizer")]
    PlatformMismatch { expected: Platform, found: Platform },

    #[error("duplicate coercion target '{0}'")]
    DuplicateStrategy(String),

    #[error("no coercion target '{column}' exists in the {platform} schema")]
    UnknownColumn { column: String, platform: Platform },

    #[error("canonical table has no 'rules' column")]
    MissingRulesColumn,

    #[error("'rules' column is not list-typed: row {row} holds {found}")]
    RulesNotList { row: usize, found: &'static str },
}

/// A pipeline stage was handed records that an earlier stage never populated.
#[derive(Debug, Error)]
pub enum PreconditionError {
    #[error("precondition not met: rule ({server_id}, {rule_id}) has no tokens")]
    NotStandardized { server_id: usize, rule_id: RuleId },

    #[error("precondition not met: rule ({server_id}, {rule_id}) has no English prediction")]
    NotClassified { server_id: usize, rule_id: RuleId },

    #[error("precondition not met: duplicate rule key ({server_id}, {rule_id})")]
    DuplicateRule { server_id: usize, rule_id: RuleId },
}

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Schema(#[from] SchemaError),
    #[error(transparent)]
    Precondition(#[from] PreconditionError),
}

pub type Result<T> = std::result::Result<T, PipelineError>;
