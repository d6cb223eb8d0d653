//! Typed failures of the metrics pipeline.

use thiserror::Error;

/// Why a single country's metrics could not be computed.
///
/// These never abort a catalog build; the builder records them per country.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MetricsError {
    /// The raw series is malformed or inconsistent, or the parameters cannot
    /// produce a rolling sample.
    #[error("validation failed: {0}")]
    Validation(String),

    /// The series is too short to compare `window` pairs of rolling values.
    #[error("insufficient history: need at least {required} days, got {actual}")]
    InsufficientHistory { required: usize, actual: usize },
}

impl MetricsError {
    pub(crate) fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }
}

/// Errors returned by catalog queries.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CatalogError {
    #[error("country '{0}' not found in catalog")]
    NotFound(String),
}
