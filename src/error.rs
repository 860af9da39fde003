//! Typed validation failures that abort an analysis run

use thiserror::Error;

/// Fatal input or configuration problems.
///
/// These travel inside [`anyhow::Error`] like every other failure, so callers
/// that care can recover the variant with `err.downcast_ref::<ValidationError>()`.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    /// The source has fewer than the three positional fields
    /// (transaction id, item, reference code).
    #[error("input must provide at least 3 fields (transaction id, item, reference code), found {found}")]
    TooFewColumns { found: usize },

    /// Nothing left to mine after dropping blank items.
    #[error("no transactions found after cleaning the input")]
    NoTransactions,

    /// A configuration value is out of its allowed range.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}
