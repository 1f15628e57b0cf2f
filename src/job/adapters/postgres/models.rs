//! Diesel row models for job pipeline persistence.

use super::schema::{queue_messages, session_records};
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde_json::Value;

/// Stored session record row.
#[derive(Debug, Clone, Queryable, Selectable, Insertable, AsChangeset)]
#[diesel(table_name = session_records)]
#[diesel(check_for_backend(diesel::pg::Pg))]
#[diesel(treat_none_as_null = true)]
pub struct SessionRecordRow {
    /// Correlation identifier.
    pub id: String,
    /// Original question text.
    pub user_question: String,
    /// Generated statement or sentinel.
    pub generated_sql: String,
    /// Statement explanation.
    pub sql_explanation: String,
    /// Terminal status.
    pub status: String,
    /// Failure reason.
    pub error: Option<String>,
    /// Result rows as a JSON array of objects.
    pub results: Value,
    /// Result summary.
    pub result_summary: String,
    /// Write time.
    pub recorded_at: DateTime<Utc>,
}

/// Query result row for a claimed queue entry.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = queue_messages)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct QueueMessageRow {
    /// Queue entry identifier.
    pub id: uuid::Uuid,
    /// Serialized pipeline message.
    pub payload: Value,
    /// Claims so far, excluding the current one.
    pub delivery_count: i32,
}

/// Insert model for queue entries.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = queue_messages)]
pub struct NewQueueMessageRow {
    /// Queue entry identifier.
    pub id: uuid::Uuid,
    /// Logical queue name.
    pub queue_name: String,
    /// Serialized pipeline message.
    pub payload: Value,
    /// Initial claim count.
    pub delivery_count: i32,
    /// Enqueue time.
    pub enqueued_at: DateTime<Utc>,
    /// Earliest claim time.
    pub visible_at: DateTime<Utc>,
}
