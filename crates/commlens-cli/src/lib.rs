//! Library side of the `commlens` binary.

pub mod analysis;
pub mod config;
pub mod logging;
pub mod summary;
