//! Ingestion of raw platform exports.
//!
//! - **csv_table**: reading a platform CSV into a [`RawTable`](commlens_model::RawTable)
//! - **literal**: permissive parsing of list/dict literals stored as text

pub mod csv_table;
pub mod error;
pub mod literal;

pub use csv_table::{read_raw_table, read_raw_table_from_reader};
pub use error::{IngestError, LiteralError};
pub use literal::parse_literal;
