//! Validation and execution stage: candidate SQL to terminal record.

use super::prompts;
use crate::job::{
    domain::{
        EMPTY_RESULT_SUMMARY, JobRecord, ResultRow, SUMMARY_UNAVAILABLE, ValidationRequest,
        check_statement,
    },
    ports::{LanguageModel, QueryExecutor, SessionStore, SessionStoreError},
};
use mockable::Clock;
use std::sync::Arc;
use thiserror::Error;
use tracing::{error, info, warn};

/// Errors returned by [`ExecutionService::handle`].
///
/// Validation, execution, and summarization failures are recorded in the
/// terminal record instead of being returned.
#[derive(Debug, Error)]
pub enum ExecutionError {
    /// The session store failed to read or write the terminal record.
    #[error(transparent)]
    Store(#[from] SessionStoreError),
}

/// Result type for execution operations.
pub type ExecutionResult<T> = Result<T, ExecutionError>;

/// Validation and execution stage orchestration.
#[derive(Clone)]
pub struct ExecutionService<E, L, S, C>
where
    E: QueryExecutor,
    L: LanguageModel,
    S: SessionStore,
    C: Clock + Send + Sync,
{
    executor: Arc<E>,
    model: Arc<L>,
    store: Arc<S>,
    clock: Arc<C>,
}

impl<E, L, S, C> ExecutionService<E, L, S, C>
where
    E: QueryExecutor,
    L: LanguageModel,
    S: SessionStore,
    C: Clock + Send + Sync,
{
    /// Creates an execution service.
    #[must_use]
    pub const fn new(executor: Arc<E>, model: Arc<L>, store: Arc<S>, clock: Arc<C>) -> Self {
        Self {
            executor,
            model,
            store,
            clock,
        }
    }

    /// Writes exactly one terminal record for `request`.
    ///
    /// When a terminal record already exists for the correlation identifier
    /// it is returned unchanged and nothing is executed, so a redelivered
    /// message converges on the first outcome.
    ///
    /// # Errors
    ///
    /// Returns [`ExecutionError::Store`] when the store lookup or write fails.
    pub async fn handle(&self, request: &ValidationRequest) -> ExecutionResult<JobRecord> {
        let existing = self.store.find_by_id(&request.correlation_id).await?;
        if let Some(existing) = existing.filter(|found| found.status().is_terminal()) {
            info!(
                correlation_id = %request.correlation_id,
                status = existing.status().as_str(),
                "terminal record already written, skipping"
            );
            return Ok(existing);
        }

        let record = self.evaluate(request).await;
        self.store.upsert(&record).await?;
        info!(
            correlation_id = %request.correlation_id,
            status = record.status().as_str(),
            rows = record.results().len(),
            "terminal record written"
        );
        Ok(record)
    }

    async fn evaluate(&self, request: &ValidationRequest) -> JobRecord {
        if let Err(violation) = check_statement(request.generated_sql.as_str()) {
            warn!(
                correlation_id = %request.correlation_id,
                generation_error = request.error.as_deref(),
                error = %violation,
                "statement rejected"
            );
            return JobRecord::failed(request, violation.to_string(), self.clock.as_ref());
        }

        match self
            .executor
            .execute(request.generated_sql.executable_text())
            .await
        {
            Ok(rows) => {
                let summary = self.summarize(request, &rows).await;
                JobRecord::succeeded(request, rows, summary, self.clock.as_ref())
            }
            Err(err) => {
                error!(
                    correlation_id = %request.correlation_id,
                    error = %err,
                    "statement execution failed"
                );
                JobRecord::failed(request, err.to_string(), self.clock.as_ref())
            }
        }
    }

    async fn summarize(&self, request: &ValidationRequest, rows: &[ResultRow]) -> String {
        if rows.is_empty() {
            return EMPTY_RESULT_SUMMARY.to_owned();
        }

        let outcome = match prompts::summary_prompt(&request.user_question, rows) {
            Ok(prompt) => self
                .model
                .generate(&prompt)
                .await
                .map(|summary| summary.trim().to_owned())
                .map_err(|err| err.to_string()),
            Err(err) => Err(err.to_string()),
        };

        outcome.unwrap_or_else(|reason| {
            warn!(
                correlation_id = %request.correlation_id,
                error = %reason,
                "result summarization failed, using placeholder"
            );
            SUMMARY_UNAVAILABLE.to_owned()
        })
    }
}
