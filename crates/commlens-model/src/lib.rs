//! Shared data model for the commlens pipeline.
//!
//! - **table**: loosely typed cells and column-oriented tables
//! - **platform**: the two source platforms and their raw tables
//! - **rule**: per-community governance rule records
//! - **error**: schema and stage-ordering error taxonomy

pub mod error;
pub mod platform;
pub mod rule;
pub mod table;

pub use error::{PipelineError, PreconditionError, Result, SchemaError};
pub use platform::{Platform, RawTable};
pub use rule::{Rule, RuleId};
pub use table::{CellValue, Column, Table};
