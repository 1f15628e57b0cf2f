//! Error types for job domain validation and parsing.

use thiserror::Error;

/// Errors returned while constructing domain job values.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum JobDomainError {
    /// The correlation identifier is empty after trimming.
    #[error("correlation identifier must not be empty")]
    EmptyCorrelationId,

    /// The user question is missing or blank.
    #[error("user question must not be empty")]
    EmptyQuestion,
}

/// Error returned while parsing job statuses from persistence.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown job status: {0}")]
pub struct ParseJobStatusError(pub String);
