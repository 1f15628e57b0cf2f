//! Session record store port: the sole durable state of the pipeline.

use crate::job::domain::{CorrelationId, JobRecord};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Result type for session store operations.
pub type SessionStoreResult<T> = Result<T, SessionStoreError>;

/// Durable key-value store of job records keyed by correlation identifier.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Writes a record, replacing any record stored under the same key.
    ///
    /// # Errors
    ///
    /// Returns [`SessionStoreError`] when the write cannot be persisted.
    async fn upsert(&self, record: &JobRecord) -> SessionStoreResult<()>;

    /// Finds the record for a correlation identifier.
    ///
    /// Returns `None` when no record has been written yet.
    async fn find_by_id(&self, id: &CorrelationId) -> SessionStoreResult<Option<JobRecord>>;

    /// Returns every record, most recent first.
    async fn list_recent(&self) -> SessionStoreResult<Vec<JobRecord>>;
}

/// Errors returned by session store implementations.
#[derive(Debug, Clone, Error)]
pub enum SessionStoreError {
    /// A stored document could not be encoded or decoded.
    #[error("session record serialization error: {0}")]
    Serialization(String),

    /// Persistence-layer failure.
    #[error("persistence error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl SessionStoreError {
    /// Wraps a persistence error.
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }

    /// Creates a serialization error.
    #[must_use]
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::Serialization(message.into())
    }
}
