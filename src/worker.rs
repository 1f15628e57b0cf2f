//! Queue-driven stage workers.
//!
//! A [`StageWorker`] polls one queue and passes each delivery to a
//! [`StageHandler`]. Successful handling acknowledges the delivery; a failed
//! handler releases it so the queue redelivers it later. The worker waits one
//! poll interval after an empty poll or a release before claiming again.

use crate::job::{
    domain::{GenerationRequest, ValidationRequest},
    ports::{
        JobQueue, LanguageModel, QueryExecutor, QueueResult, SchemaIntrospector, SessionStore,
    },
    services::{ExecutionError, ExecutionService, GenerationError, GenerationService},
};
use async_trait::async_trait;
use mockable::Clock;
use std::marker::PhantomData;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, error, info};

/// Default idle wait between empty polls.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Processes one message type for a stage worker.
#[async_trait]
pub trait StageHandler<M>: Send + Sync
where
    M: Send + Sync + 'static,
{
    /// Failure type returned when the delivery must be redelivered.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Stage name used in log events.
    fn stage(&self) -> &'static str;

    /// Handles one message.
    ///
    /// # Errors
    ///
    /// Returns an error only when the message should be redelivered.
    async fn handle(&self, message: &M) -> Result<(), Self::Error>;
}

#[async_trait]
impl<S, L, Q> StageHandler<GenerationRequest> for GenerationService<S, L, Q>
where
    S: SchemaIntrospector,
    L: LanguageModel,
    Q: JobQueue<ValidationRequest>,
{
    type Error = GenerationError;

    fn stage(&self) -> &'static str {
        "generation"
    }

    async fn handle(&self, message: &GenerationRequest) -> Result<(), Self::Error> {
        Self::handle(self, message).await.map(|_| ())
    }
}

#[async_trait]
impl<E, L, S, C> StageHandler<ValidationRequest> for ExecutionService<E, L, S, C>
where
    E: QueryExecutor,
    L: LanguageModel,
    S: SessionStore,
    C: Clock + Send + Sync,
{
    type Error = ExecutionError;

    fn stage(&self) -> &'static str {
        "validation"
    }

    async fn handle(&self, message: &ValidationRequest) -> Result<(), Self::Error> {
        Self::handle(self, message).await.map(|_| ())
    }
}

/// Result of one [`StageWorker::process_next`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    /// The queue had no visible delivery.
    Empty,
    /// A delivery was handled and acknowledged.
    Acknowledged,
    /// The handler failed and the delivery was released.
    Released,
}

/// Polls a queue and dispatches deliveries to a handler.
pub struct StageWorker<M, Q, H> {
    queue: Arc<Q>,
    handler: Arc<H>,
    poll_interval: Duration,
    _message: PhantomData<fn() -> M>,
}

impl<M, Q, H> StageWorker<M, Q, H>
where
    M: Send + Sync + 'static,
    Q: JobQueue<M>,
    H: StageHandler<M>,
{
    /// Creates a worker with the given idle poll interval.
    #[must_use]
    pub const fn new(queue: Arc<Q>, handler: Arc<H>, poll_interval: Duration) -> Self {
        Self {
            queue,
            handler,
            poll_interval,
            _message: PhantomData,
        }
    }

    /// Runs until `shutdown` flips to `true` or its sender is dropped.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        let stage = self.handler.stage();
        info!(stage, "stage worker started");

        loop {
            if *shutdown.borrow() {
                break;
            }

            let outcome = match self.process_next().await {
                Ok(outcome) => outcome,
                Err(err) => {
                    error!(stage, error = %err, "queue operation failed");
                    PollOutcome::Empty
                }
            };
            if outcome == PollOutcome::Acknowledged {
                continue;
            }

            tokio::select! {
                () = tokio::time::sleep(self.poll_interval) => {}
                changed = shutdown.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
            }
        }

        info!(stage, "stage worker stopped");
    }

    /// Claims and handles at most one delivery.
    ///
    /// # Errors
    ///
    /// Returns queue errors from claiming, acknowledging, or releasing.
    pub async fn process_next(&self) -> QueueResult<PollOutcome> {
        let stage = self.handler.stage();
        let Some(delivery) = self.queue.dequeue().await? else {
            return Ok(PollOutcome::Empty);
        };
        debug!(stage, receipt = %delivery.receipt, attempt = delivery.attempt, "delivery claimed");

        match self.handler.handle(&delivery.message).await {
            Ok(()) => {
                self.queue.ack(delivery.receipt).await?;
                Ok(PollOutcome::Acknowledged)
            }
            Err(err) => {
                error!(
                    stage,
                    receipt = %delivery.receipt,
                    attempt = delivery.attempt,
                    error = %err,
                    "stage handler failed, releasing delivery"
                );
                self.queue.release(delivery.receipt).await?;
                Ok(PollOutcome::Released)
            }
        }
    }
}
