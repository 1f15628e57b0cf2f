//! Durable queue port linking pipeline stages.

use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

/// Result type for queue operations.
pub type QueueResult<T> = Result<T, QueueError>;

/// Queue carrying the generation-stage input.
pub const GENERATION_QUEUE: &str = "queryjobs";

/// Queue carrying the validation-stage input.
pub const VALIDATION_QUEUE: &str = "validationjobs";

/// Opaque handle identifying one delivery of a queued message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DeliveryReceipt(Uuid);

impl DeliveryReceipt {
    /// Wraps a queue-entry identifier.
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the wrapped identifier.
    #[must_use]
    pub const fn into_inner(self) -> Uuid {
        self.0
    }
}

impl fmt::Display for DeliveryReceipt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A message claimed from a queue, pending acknowledgement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delivery<M> {
    /// Receipt used to acknowledge or release the delivery.
    pub receipt: DeliveryReceipt,
    /// Number of times this message has been claimed, including this one.
    pub attempt: u32,
    /// The decoded message.
    pub message: M,
}

/// At-least-once message queue.
///
/// A claimed delivery stays invisible to other consumers until it is
/// acknowledged or released; implementations may also make it visible again
/// after a lease expires. Consumers must therefore tolerate redelivery.
#[async_trait]
pub trait JobQueue<M>: Send + Sync
where
    M: Send + Sync + 'static,
{
    /// Appends a message to the queue.
    ///
    /// # Errors
    ///
    /// Returns [`QueueError`] when the message cannot be persisted.
    async fn enqueue(&self, message: &M) -> QueueResult<()>;

    /// Claims the oldest visible message, if any.
    ///
    /// # Errors
    ///
    /// Returns [`QueueError`] when the queue cannot be read.
    async fn dequeue(&self) -> QueueResult<Option<Delivery<M>>>;

    /// Removes a processed delivery from the queue.
    ///
    /// # Errors
    ///
    /// Returns [`QueueError`] when the acknowledgement cannot be recorded.
    async fn ack(&self, receipt: DeliveryReceipt) -> QueueResult<()>;

    /// Returns a delivery to the queue so it can be claimed again.
    ///
    /// # Errors
    ///
    /// Returns [`QueueError`] when the release cannot be recorded.
    async fn release(&self, receipt: DeliveryReceipt) -> QueueResult<()>;
}

/// Errors returned by queue implementations.
#[derive(Debug, Clone, Error)]
pub enum QueueError {
    /// The receipt does not match an in-flight delivery.
    #[error("unknown delivery receipt: {0}")]
    UnknownReceipt(DeliveryReceipt),

    /// A message could not be encoded for the queue.
    #[error("queue payload serialization error: {0}")]
    Serialization(String),

    /// Persistence-layer failure.
    #[error("queue persistence error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl QueueError {
    /// Wraps a persistence error.
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }
}
