//! Target-database ports: schema introspection and statement execution.

use crate::job::domain::{ResultRow, SchemaDescriptor};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Result type for target-database operations.
pub type DatabaseResult<T> = Result<T, DatabaseError>;

/// Reads the live table and column catalogue of the target database.
#[async_trait]
pub trait SchemaIntrospector: Send + Sync {
    /// Fetches the current catalogue. No state is kept between calls.
    ///
    /// # Errors
    ///
    /// Returns [`DatabaseError`] when the catalogue cannot be read.
    async fn fetch_schema(&self) -> DatabaseResult<SchemaDescriptor>;
}

/// Runs a single statement and collects its rows.
#[async_trait]
pub trait QueryExecutor: Send + Sync {
    /// Executes `sql` and returns every row in result order.
    ///
    /// # Errors
    ///
    /// Returns [`DatabaseError::Transient`] for connection-level faults and
    /// [`DatabaseError::Statement`] for everything the database rejects.
    async fn execute(&self, sql: &str) -> DatabaseResult<Vec<ResultRow>>;
}

/// Errors returned by target-database adapters.
#[derive(Debug, Clone, Error)]
pub enum DatabaseError {
    /// Connection-level fault (reset, aborted, unreachable); safe to retry.
    #[error("database connection error: {0}")]
    Transient(String),

    /// The statement or connection was rejected: syntax, permission,
    /// authentication, or configuration errors. Not retried.
    #[error("{0}")]
    Statement(String),

    /// Adapter-side failure unrelated to the database response.
    #[error("database adapter error: {0}")]
    Internal(Arc<dyn std::error::Error + Send + Sync>),
}

impl DatabaseError {
    /// Creates a transient connection error.
    #[must_use]
    pub fn transient(message: impl Into<String>) -> Self {
        Self::Transient(message.into())
    }

    /// Creates a non-transient statement error.
    #[must_use]
    pub fn statement(message: impl Into<String>) -> Self {
        Self::Statement(message.into())
    }

    /// Wraps an adapter-side failure.
    pub fn internal(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Internal(Arc::new(err))
    }

    /// Returns `true` when the failure is a network-level fault eligible for
    /// retry.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::Transient(_))
    }
}
