//! `PostgreSQL` session record store.

use super::{
    blocking_helpers::{PgPool, get_conn_with, run_blocking_with},
    models::SessionRecordRow,
    schema::session_records,
};
use crate::job::{
    domain::{
        CorrelationId, GeneratedSql, JobRecord, JobStatus, PersistedJobRecord, ResultRow,
        UserQuestion,
    },
    ports::{SessionStore, SessionStoreError, SessionStoreResult},
};
use async_trait::async_trait;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use serde_json::Value;

/// `PostgreSQL`-backed session record store.
#[derive(Debug, Clone)]
pub struct PostgresSessionStore {
    pool: PgPool,
}

impl PostgresSessionStore {
    /// Creates a new store from a `PostgreSQL` connection pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn run_blocking<F, T>(&self, f: F) -> SessionStoreResult<T>
    where
        F: FnOnce(&mut PgConnection) -> SessionStoreResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let pool = self.pool.clone();
        run_blocking_with(
            move || {
                let mut connection = get_conn_with(&pool, SessionStoreError::persistence)?;
                f(&mut connection)
            },
            SessionStoreError::persistence,
        )
        .await
    }
}

#[async_trait]
impl SessionStore for PostgresSessionStore {
    async fn upsert(&self, record: &JobRecord) -> SessionStoreResult<()> {
        let row = to_row(record)?;
        self.run_blocking(move |connection| {
            diesel::insert_into(session_records::table)
                .values(&row)
                .on_conflict(session_records::id)
                .do_update()
                .set(&row)
                .execute(connection)
                .map_err(SessionStoreError::persistence)?;
            Ok(())
        })
        .await
    }

    async fn find_by_id(&self, id: &CorrelationId) -> SessionStoreResult<Option<JobRecord>> {
        let lookup = id.as_str().to_owned();
        self.run_blocking(move |connection| {
            let row = session_records::table
                .filter(session_records::id.eq(lookup))
                .select(SessionRecordRow::as_select())
                .first::<SessionRecordRow>(connection)
                .optional()
                .map_err(SessionStoreError::persistence)?;
            row.map(row_to_record).transpose()
        })
        .await
    }

    async fn list_recent(&self) -> SessionStoreResult<Vec<JobRecord>> {
        self.run_blocking(move |connection| {
            let rows = session_records::table
                .order((session_records::recorded_at.desc(), session_records::id.asc()))
                .select(SessionRecordRow::as_select())
                .load::<SessionRecordRow>(connection)
                .map_err(SessionStoreError::persistence)?;
            rows.into_iter().map(row_to_record).collect()
        })
        .await
    }
}

fn to_row(record: &JobRecord) -> SessionStoreResult<SessionRecordRow> {
    let results = serde_json::to_value(record.results())
        .map_err(|err| SessionStoreError::serialization(err.to_string()))?;

    Ok(SessionRecordRow {
        id: record.id().as_str().to_owned(),
        user_question: record.user_question().as_str().to_owned(),
        generated_sql: record.generated_sql().as_str().to_owned(),
        sql_explanation: record.sql_explanation().to_owned(),
        status: record.status().as_str().to_owned(),
        error: record.error().map(str::to_owned),
        results,
        result_summary: record.result_summary().to_owned(),
        recorded_at: record.timestamp(),
    })
}

fn row_to_record(row: SessionRecordRow) -> SessionStoreResult<JobRecord> {
    let SessionRecordRow {
        id,
        user_question,
        generated_sql,
        sql_explanation,
        status,
        error,
        results,
        result_summary,
        recorded_at,
    } = row;

    Ok(JobRecord::from_persisted(PersistedJobRecord {
        id: CorrelationId::parse(id).map_err(SessionStoreError::persistence)?,
        user_question: UserQuestion::new(user_question)
            .map_err(SessionStoreError::persistence)?,
        generated_sql: GeneratedSql::new(generated_sql),
        sql_explanation,
        status: JobStatus::try_from(status.as_str()).map_err(SessionStoreError::persistence)?,
        error,
        results: decode_results(results)?,
        result_summary,
        timestamp: recorded_at,
    }))
}

fn decode_results(value: Value) -> SessionStoreResult<Vec<ResultRow>> {
    serde_json::from_value(value).map_err(|err| SessionStoreError::serialization(err.to_string()))
}
