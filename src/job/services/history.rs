//! Read path over terminal records.

use crate::job::{
    domain::{CorrelationId, JobRecord},
    ports::{SessionStore, SessionStoreResult},
};
use std::sync::Arc;

/// Outcome of a status lookup.
#[derive(Debug, Clone, PartialEq)]
pub enum JobStatusView {
    /// A terminal record exists.
    Completed(Box<JobRecord>),
    /// No terminal record exists yet; the job may still be in flight.
    Processing,
}

/// Status and history queries over the session store.
#[derive(Clone)]
pub struct SessionQueryService<S>
where
    S: SessionStore,
{
    store: Arc<S>,
}

impl<S> SessionQueryService<S>
where
    S: SessionStore,
{
    /// Creates a query service.
    #[must_use]
    pub const fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Looks up the terminal record for `id`.
    ///
    /// An unknown identifier reads as [`JobStatusView::Processing`]; the
    /// store cannot tell a job still in flight from one never submitted.
    ///
    /// # Errors
    ///
    /// Propagates store failures.
    pub async fn status(&self, id: &CorrelationId) -> SessionStoreResult<JobStatusView> {
        let record = self.store.find_by_id(id).await?;
        Ok(record.map_or(JobStatusView::Processing, |found| {
            JobStatusView::Completed(Box::new(found))
        }))
    }

    /// Returns recent terminal records, newest first.
    ///
    /// # Errors
    ///
    /// Propagates store failures.
    pub async fn history(&self) -> SessionStoreResult<Vec<JobRecord>> {
        self.store.list_recent().await
    }
}
