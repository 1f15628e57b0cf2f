//! Intake: accepts a question and hands it to the generation queue.

use crate::job::{
    domain::{CorrelationId, GenerationRequest, UserQuestion},
    ports::{JobQueue, QueueError},
};
use std::sync::Arc;
use thiserror::Error;
use tracing::info;

/// Errors returned by [`IntakeService::submit`].
#[derive(Debug, Error)]
pub enum IntakeError {
    /// The request carried no usable question.
    #[error("Please pass a 'question' in the request body")]
    MissingQuestion,

    /// The generation queue rejected the hand-off.
    #[error(transparent)]
    Queue(#[from] QueueError),
}

/// Result type for intake operations.
pub type IntakeResult<T> = Result<T, IntakeError>;

/// Accepts questions and enqueues generation jobs.
#[derive(Clone)]
pub struct IntakeService<Q>
where
    Q: JobQueue<GenerationRequest>,
{
    queue: Arc<Q>,
}

impl<Q> IntakeService<Q>
where
    Q: JobQueue<GenerationRequest>,
{
    /// Creates an intake service writing to `queue`.
    #[must_use]
    pub const fn new(queue: Arc<Q>) -> Self {
        Self { queue }
    }

    /// Mints a correlation identifier and enqueues the question.
    ///
    /// The identifier is returned only after the hand-off succeeded, so a
    /// caller never receives an identifier for a job that was not queued.
    ///
    /// # Errors
    ///
    /// Returns [`IntakeError::MissingQuestion`] when `question` is absent or
    /// blank, and [`IntakeError::Queue`] when enqueueing fails.
    pub async fn submit(&self, question: Option<&str>) -> IntakeResult<CorrelationId> {
        let user_question = question
            .and_then(|text| UserQuestion::new(text).ok())
            .ok_or(IntakeError::MissingQuestion)?;
        let request = GenerationRequest::new(user_question);

        self.queue.enqueue(&request).await?;
        info!(correlation_id = %request.correlation_id, "question accepted");
        Ok(request.correlation_id)
    }
}
