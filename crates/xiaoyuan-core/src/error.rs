//! Error types for data operations.
//!
//! This module defines [`DataError`] which covers all error cases that can occur
//! when validating parameters, querying the analytics store, or reshaping results.

use thiserror::Error;

/// Errors that can occur during data operations.
#[derive(Error, Debug)]
pub enum DataError {
    /// An invalid parameter was provided.
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// The period token is not accepted by the endpoint.
    #[error("Unsupported period '{period}', expected one of: {accepted}")]
    UnsupportedPeriod {
        /// The token that was supplied.
        period: String,
        /// Comma-separated list of accepted tokens.
        accepted: String,
    },

    /// The query returned no rows.
    #[error("No data found: {0}")]
    EmptyData(String),

    /// The analytics store rejected or failed the query.
    #[error("Query failed: {0}")]
    Query(String),

    /// Error parsing a result frame or configuration.
    #[error("Parse error: {0}")]
    Parse(String),

    /// No fetcher is registered under the requested model name.
    #[error("No fetcher registered for model {0}")]
    ModelNotFound(String),

    /// Any other error.
    #[error("{0}")]
    Other(String),
}

impl DataError {
    /// Returns true for errors caused by caller-supplied parameters.
    #[must_use]
    pub const fn is_invalid_argument(&self) -> bool {
        matches!(self, Self::InvalidParameter(_) | Self::UnsupportedPeriod { .. })
    }

    /// Returns true when the store answered but had nothing to return.
    #[must_use]
    pub const fn is_empty_data(&self) -> bool {
        matches!(self, Self::EmptyData(_))
    }
}

impl From<polars::prelude::PolarsError> for DataError {
    fn from(err: polars::prelude::PolarsError) -> Self {
        Self::Parse(err.to_string())
    }
}

/// Result type alias using [`DataError`].
pub type Result<T> = std::result::Result<T, DataError>;
