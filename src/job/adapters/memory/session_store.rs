//! In-memory session store for tests and local runs.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::job::{
    domain::{CorrelationId, JobRecord},
    ports::{SessionStore, SessionStoreError, SessionStoreResult},
};

/// Thread-safe in-memory session store with upsert semantics.
#[derive(Debug, Clone, Default)]
pub struct InMemorySessionStore {
    records: Arc<RwLock<HashMap<CorrelationId, JobRecord>>>,
}

impl InMemorySessionStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of stored records.
    ///
    /// # Errors
    ///
    /// Returns persistence errors when lock acquisition fails.
    pub fn len(&self) -> SessionStoreResult<usize> {
        let records = self.records.read().map_err(|err| {
            SessionStoreError::persistence(std::io::Error::other(err.to_string()))
        })?;
        Ok(records.len())
    }

    /// Returns `true` when no record has been written.
    ///
    /// # Errors
    ///
    /// Returns persistence errors when lock acquisition fails.
    pub fn is_empty(&self) -> SessionStoreResult<bool> {
        Ok(self.len()? == 0)
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn upsert(&self, record: &JobRecord) -> SessionStoreResult<()> {
        let mut records = self.records.write().map_err(|err| {
            SessionStoreError::persistence(std::io::Error::other(err.to_string()))
        })?;
        records.insert(record.id().clone(), record.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: &CorrelationId) -> SessionStoreResult<Option<JobRecord>> {
        let records = self.records.read().map_err(|err| {
            SessionStoreError::persistence(std::io::Error::other(err.to_string()))
        })?;
        Ok(records.get(id).cloned())
    }

    async fn list_recent(&self) -> SessionStoreResult<Vec<JobRecord>> {
        let records = self.records.read().map_err(|err| {
            SessionStoreError::persistence(std::io::Error::other(err.to_string()))
        })?;
        let mut listed: Vec<JobRecord> = records.values().cloned().collect();
        listed.sort_by(|left, right| {
            right
                .timestamp()
                .cmp(&left.timestamp())
                .then_with(|| left.id().cmp(right.id()))
        });
        Ok(listed)
    }
}
