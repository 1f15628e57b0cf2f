//! `PostgreSQL` durable job queue.
//!
//! Entries are claimed with `FOR UPDATE SKIP LOCKED`, so concurrent workers
//! never lease the same entry. A claim hides the entry for the visibility
//! timeout; an entry whose worker dies becomes claimable again once that
//! timeout lapses.

use super::{
    blocking_helpers::{PgPool, get_conn_with, run_blocking_with},
    models::{NewQueueMessageRow, QueueMessageRow},
    schema::queue_messages,
};
use crate::job::ports::{Delivery, DeliveryReceipt, JobQueue, QueueError, QueueResult};
use async_trait::async_trait;
use chrono::{TimeDelta, Utc};
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::result::Error as DieselError;
use serde::{Serialize, de::DeserializeOwned};
use std::marker::PhantomData;
use std::time::Duration;
use tracing::error;
use uuid::Uuid;

impl From<DieselError> for QueueError {
    fn from(err: DieselError) -> Self {
        Self::persistence(err)
    }
}

/// `PostgreSQL`-backed queue for one logical queue name.
#[derive(Debug)]
pub struct PostgresJobQueue<M> {
    pool: PgPool,
    queue_name: String,
    visibility_timeout: TimeDelta,
    _message: PhantomData<fn() -> M>,
}

impl<M> Clone for PostgresJobQueue<M> {
    fn clone(&self) -> Self {
        Self {
            pool: self.pool.clone(),
            queue_name: self.queue_name.clone(),
            visibility_timeout: self.visibility_timeout,
            _message: PhantomData,
        }
    }
}

impl<M> PostgresJobQueue<M> {
    /// Creates a queue bound to `queue_name`.
    ///
    /// Claimed entries stay hidden from other consumers for
    /// `visibility_timeout` unless acknowledged or released first.
    #[must_use]
    pub fn new(pool: PgPool, queue_name: impl Into<String>, visibility_timeout: Duration) -> Self {
        Self {
            pool,
            queue_name: queue_name.into(),
            visibility_timeout: TimeDelta::from_std(visibility_timeout)
                .unwrap_or(TimeDelta::MAX),
            _message: PhantomData,
        }
    }

    /// Returns the logical queue name.
    #[must_use]
    pub fn queue_name(&self) -> &str {
        &self.queue_name
    }

    async fn run_blocking<F, T>(&self, f: F) -> QueueResult<T>
    where
        F: FnOnce(&mut PgConnection) -> QueueResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let pool = self.pool.clone();
        run_blocking_with(
            move || {
                let mut connection = get_conn_with(&pool, QueueError::persistence)?;
                f(&mut connection)
            },
            QueueError::persistence,
        )
        .await
    }
}

#[async_trait]
impl<M> JobQueue<M> for PostgresJobQueue<M>
where
    M: Serialize + DeserializeOwned + Send + Sync + 'static,
{
    async fn enqueue(&self, message: &M) -> QueueResult<()> {
        let payload = serde_json::to_value(message)
            .map_err(|err| QueueError::Serialization(err.to_string()))?;
        let now = Utc::now();
        let row = NewQueueMessageRow {
            id: Uuid::new_v4(),
            queue_name: self.queue_name.clone(),
            payload,
            delivery_count: 0,
            enqueued_at: now,
            visible_at: now,
        };

        self.run_blocking(move |connection| {
            diesel::insert_into(queue_messages::table)
                .values(&row)
                .execute(connection)?;
            Ok(())
        })
        .await
    }

    async fn dequeue(&self) -> QueueResult<Option<Delivery<M>>> {
        let queue_name = self.queue_name.clone();
        let visibility_timeout = self.visibility_timeout;
        let claimed = self
            .run_blocking(move |connection| {
                claim_next(connection, &queue_name, visibility_timeout)
            })
            .await?;

        let Some(row) = claimed else {
            return Ok(None);
        };

        match serde_json::from_value::<M>(row.payload) {
            Ok(message) => Ok(Some(Delivery {
                receipt: DeliveryReceipt::from_uuid(row.id),
                attempt: u32::try_from(row.delivery_count).unwrap_or(u32::MAX),
                message,
            })),
            Err(err) => {
                error!(
                    queue = %self.queue_name,
                    entry_id = %row.id,
                    error = %err,
                    "discarding malformed queue payload"
                );
                let id = row.id;
                self.run_blocking(move |connection| {
                    diesel::delete(queue_messages::table.find(id)).execute(connection)?;
                    Ok(())
                })
                .await?;
                Ok(None)
            }
        }
    }

    async fn ack(&self, receipt: DeliveryReceipt) -> QueueResult<()> {
        let queue_name = self.queue_name.clone();
        self.run_blocking(move |connection| {
            let deleted = diesel::delete(
                queue_messages::table
                    .filter(queue_messages::id.eq(receipt.into_inner()))
                    .filter(queue_messages::queue_name.eq(queue_name)),
            )
            .execute(connection)?;
            if deleted == 0 {
                return Err(QueueError::UnknownReceipt(receipt));
            }
            Ok(())
        })
        .await
    }

    async fn release(&self, receipt: DeliveryReceipt) -> QueueResult<()> {
        let queue_name = self.queue_name.clone();
        self.run_blocking(move |connection| {
            let updated = diesel::update(
                queue_messages::table
                    .filter(queue_messages::id.eq(receipt.into_inner()))
                    .filter(queue_messages::queue_name.eq(queue_name)),
            )
            .set(queue_messages::visible_at.eq(Utc::now()))
            .execute(connection)?;
            if updated == 0 {
                return Err(QueueError::UnknownReceipt(receipt));
            }
            Ok(())
        })
        .await
    }
}

fn claim_next(
    connection: &mut PgConnection,
    queue_name: &str,
    visibility_timeout: TimeDelta,
) -> QueueResult<Option<QueueMessageRow>> {
    connection.transaction::<_, QueueError, _>(|tx| {
        let now = Utc::now();
        let candidate = queue_messages::table
            .filter(queue_messages::queue_name.eq(queue_name))
            .filter(queue_messages::visible_at.le(now))
            .order((queue_messages::enqueued_at.asc(), queue_messages::id.asc()))
            .limit(1)
            .select(QueueMessageRow::as_select())
            .for_update()
            .skip_locked()
            .get_result::<QueueMessageRow>(tx)
            .optional()?;

        let Some(mut row) = candidate else {
            return Ok(None);
        };

        row.delivery_count = row.delivery_count.saturating_add(1);
        let lease_until = now.checked_add_signed(visibility_timeout).unwrap_or(now);
        diesel::update(queue_messages::table.find(row.id))
            .set((
                queue_messages::visible_at.eq(lease_until),
                queue_messages::delivery_count.eq(row.delivery_count),
            ))
            .execute(tx)?;
        Ok(Some(row))
    })
}
