use polars::prelude::PolarsError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StatsError {
    /// Input a statistic is undefined for: mismatched lengths, too few
    /// samples, constant columns, non-finite values.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error(transparent)]
    Polars(#[from] PolarsError),
}

pub type Result<T> = std::result::Result<T, StatsError>;

pub(crate) fn invalid(message: impl Into<String>) -> StatsError {
    StatsError::InvalidArgument(message.into())
}
