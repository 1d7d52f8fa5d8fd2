use thiserror::Error;

use crate::source::SourceError;

#[derive(Debug, Error)]
pub enum EngineError {
    /// Empty brand/feature selection or an unknown source tag. The caller
    /// should prompt for a selection; the fetch is never issued.
    #[error("invalid filter: {0}")]
    InvalidFilter(String),

    /// The metrics source could not serve the fetch. No zeros are fabricated;
    /// callers degrade to a clearly-labeled placeholder dataset or an error.
    #[error("metrics source unavailable: {0}")]
    FetchUnavailable(#[from] SourceError),
}
