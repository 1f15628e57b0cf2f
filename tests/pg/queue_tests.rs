//! Job queue tests against `PostgreSQL`.

use super::helpers::{BoxError, TestSchema};
use datalab::job::adapters::postgres::PostgresJobQueue;
use datalab::job::domain::{GenerationRequest, UserQuestion};
use datalab::job::ports::{DeliveryReceipt, JobQueue, QueueError};
use diesel::prelude::*;
use diesel::sql_types::{Text, Uuid as SqlUuid};
use std::time::Duration;
use uuid::Uuid;

const LEASE: Duration = Duration::from_secs(300);

fn request(question: &str) -> Result<GenerationRequest, BoxError> {
    Ok(GenerationRequest::new(UserQuestion::new(question)?))
}

fn queue(schema: &TestSchema, name: &str, lease: Duration) -> PostgresJobQueue<GenerationRequest> {
    PostgresJobQueue::new(schema.pool(), name, lease)
}

#[tokio::test(flavor = "multi_thread")]
async fn deliveries_follow_enqueue_order() -> Result<(), BoxError> {
    let Some(schema) = TestSchema::create()? else {
        return Ok(());
    };
    let jobs = queue(&schema, "sqlgenerationjobs", LEASE);
    let first = request("show me the top 3 products")?;
    let second = request("how many orders shipped today")?;
    jobs.enqueue(&first).await?;
    jobs.enqueue(&second).await?;

    let one = jobs.dequeue().await?.ok_or("first delivery missing")?;
    let two = jobs.dequeue().await?.ok_or("second delivery missing")?;

    assert_eq!(one.message, first);
    assert_eq!(one.attempt, 1);
    assert_eq!(two.message, second);
    assert!(jobs.dequeue().await?.is_none(), "claimed messages stay hidden");
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn acknowledged_messages_are_removed() -> Result<(), BoxError> {
    let Some(schema) = TestSchema::create()? else {
        return Ok(());
    };
    let jobs = queue(&schema, "sqlgenerationjobs", Duration::ZERO);
    jobs.enqueue(&request("show me the top 3 products")?).await?;

    let delivery = jobs.dequeue().await?.ok_or("delivery missing")?;
    jobs.ack(delivery.receipt).await?;

    assert!(jobs.dequeue().await?.is_none());
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn released_messages_are_redelivered() -> Result<(), BoxError> {
    let Some(schema) = TestSchema::create()? else {
        return Ok(());
    };
    let jobs = queue(&schema, "sqlgenerationjobs", LEASE);
    let message = request("show me the top 3 products")?;
    jobs.enqueue(&message).await?;

    let delivery = jobs.dequeue().await?.ok_or("delivery missing")?;
    jobs.release(delivery.receipt).await?;
    let redelivery = jobs.dequeue().await?.ok_or("redelivery missing")?;

    assert_eq!(redelivery.message, message);
    assert_eq!(redelivery.receipt, delivery.receipt);
    assert_eq!(redelivery.attempt, 2);
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn expired_leases_are_redelivered() -> Result<(), BoxError> {
    let Some(schema) = TestSchema::create()? else {
        return Ok(());
    };
    let jobs = queue(&schema, "sqlgenerationjobs", Duration::ZERO);
    jobs.enqueue(&request("show me the top 3 products")?).await?;

    let delivery = jobs.dequeue().await?.ok_or("delivery missing")?;
    let redelivery = jobs.dequeue().await?.ok_or("redelivery missing")?;

    assert_eq!(redelivery.receipt, delivery.receipt);
    assert_eq!(redelivery.attempt, 2);
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn queues_are_isolated_by_name() -> Result<(), BoxError> {
    let Some(schema) = TestSchema::create()? else {
        return Ok(());
    };
    let generation = queue(&schema, "sqlgenerationjobs", LEASE);
    let validation = queue(&schema, "validationjobs", LEASE);
    generation.enqueue(&request("show me the top 3 products")?).await?;

    assert!(validation.dequeue().await?.is_none());
    assert!(generation.dequeue().await?.is_some());
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn acking_an_unknown_receipt_fails() -> Result<(), BoxError> {
    let Some(schema) = TestSchema::create()? else {
        return Ok(());
    };
    let jobs = queue(&schema, "sqlgenerationjobs", LEASE);
    let receipt = DeliveryReceipt::from_uuid(Uuid::new_v4());

    let result = jobs.ack(receipt).await;

    assert!(matches!(result, Err(QueueError::UnknownReceipt(found)) if found == receipt));
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn malformed_payloads_are_discarded() -> Result<(), BoxError> {
    let Some(schema) = TestSchema::create()? else {
        return Ok(());
    };
    let jobs = queue(&schema, "sqlgenerationjobs", LEASE);
    {
        let mut conn = schema.pool().get()?;
        diesel::sql_query(
            "INSERT INTO queue_messages \
             (id, queue_name, payload, delivery_count, enqueued_at, visible_at) \
             VALUES ($1, $2, '{\"unexpected\": true}'::jsonb, 0, \
             now() - interval '1 minute', now() - interval '1 minute')",
        )
        .bind::<SqlUuid, _>(Uuid::new_v4())
        .bind::<Text, _>(jobs.queue_name())
        .execute(&mut conn)?;
    }
    let message = request("show me the top 3 products")?;
    jobs.enqueue(&message).await?;

    assert!(jobs.dequeue().await?.is_none(), "malformed entry is dropped");
    let delivery = jobs.dequeue().await?.ok_or("valid delivery missing")?;

    assert_eq!(delivery.message, message);
    Ok(())
}
