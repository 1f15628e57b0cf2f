//! In-memory job queue for tests and single-process runs.

use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard};
use uuid::Uuid;

use crate::job::ports::{Delivery, DeliveryReceipt, JobQueue, QueueError, QueueResult};

/// Thread-safe FIFO queue with explicit acknowledgement.
///
/// Claimed messages are held in flight until acknowledged; a released
/// message returns to the front of the queue. Nothing is durable across
/// process restarts.
#[derive(Debug)]
pub struct InMemoryJobQueue<M> {
    state: Arc<Mutex<InMemoryQueueState<M>>>,
}

#[derive(Debug)]
struct QueuedMessage<M> {
    receipt: DeliveryReceipt,
    deliveries: u32,
    message: M,
}

#[derive(Debug)]
struct InMemoryQueueState<M> {
    ready: VecDeque<QueuedMessage<M>>,
    in_flight: HashMap<DeliveryReceipt, QueuedMessage<M>>,
}

impl<M> Default for InMemoryQueueState<M> {
    fn default() -> Self {
        Self {
            ready: VecDeque::new(),
            in_flight: HashMap::new(),
        }
    }
}

impl<M> Clone for InMemoryJobQueue<M> {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
        }
    }
}

impl<M> Default for InMemoryJobQueue<M> {
    fn default() -> Self {
        Self {
            state: Arc::new(Mutex::new(InMemoryQueueState::default())),
        }
    }
}

impl<M> InMemoryJobQueue<M>
where
    M: Clone,
{
    /// Creates an empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> QueueResult<MutexGuard<'_, InMemoryQueueState<M>>> {
        self.state
            .lock()
            .map_err(|err| QueueError::persistence(std::io::Error::other(err.to_string())))
    }

    /// Returns copies of the messages waiting to be claimed, oldest first.
    ///
    /// # Errors
    ///
    /// Returns persistence errors when lock acquisition fails.
    pub fn pending(&self) -> QueueResult<Vec<M>> {
        let state = self.lock()?;
        Ok(state.ready.iter().map(|entry| entry.message.clone()).collect())
    }

    /// Returns the number of claimed but unacknowledged messages.
    ///
    /// # Errors
    ///
    /// Returns persistence errors when lock acquisition fails.
    pub fn in_flight_count(&self) -> QueueResult<usize> {
        Ok(self.lock()?.in_flight.len())
    }
}

#[async_trait]
impl<M> JobQueue<M> for InMemoryJobQueue<M>
where
    M: Clone + Send + Sync + 'static,
{
    async fn enqueue(&self, message: &M) -> QueueResult<()> {
        let mut state = self.lock()?;
        state.ready.push_back(QueuedMessage {
            receipt: DeliveryReceipt::from_uuid(Uuid::new_v4()),
            deliveries: 0,
            message: message.clone(),
        });
        Ok(())
    }

    async fn dequeue(&self) -> QueueResult<Option<Delivery<M>>> {
        let mut state = self.lock()?;
        let Some(mut entry) = state.ready.pop_front() else {
            return Ok(None);
        };
        entry.deliveries = entry.deliveries.saturating_add(1);
        let delivery = Delivery {
            receipt: entry.receipt,
            attempt: entry.deliveries,
            message: entry.message.clone(),
        };
        state.in_flight.insert(entry.receipt, entry);
        Ok(Some(delivery))
    }

    async fn ack(&self, receipt: DeliveryReceipt) -> QueueResult<()> {
        let mut state = self.lock()?;
        state
            .in_flight
            .remove(&receipt)
            .map(|_| ())
            .ok_or(QueueError::UnknownReceipt(receipt))
    }

    async fn release(&self, receipt: DeliveryReceipt) -> QueueResult<()> {
        let mut state = self.lock()?;
        let entry = state
            .in_flight
            .remove(&receipt)
            .ok_or(QueueError::UnknownReceipt(receipt))?;
        state.ready.push_front(entry);
        Ok(())
    }
}
