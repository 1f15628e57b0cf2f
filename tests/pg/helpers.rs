//! Shared helpers for `PostgreSQL` integration tests.

use chrono::DateTime;
use datalab::job::adapters::postgres::{PgPool, TargetDatabaseSettings, run_pending_migrations};
use datalab::job::domain::{
    CorrelationId, GeneratedSql, JobRecord, JobStatus, PersistedJobRecord, ResultRow,
    UserQuestion,
};
use diesel::connection::SimpleConnection;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, CustomizeConnection, Pool};
use serde_json::json;
use uuid::Uuid;

/// Boxed error used by test setup.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Environment variable naming the test server.
pub const DATABASE_URL_VAR: &str = "DATALAB_TEST_DATABASE_URL";

#[derive(Debug)]
struct SearchPath(String);

impl CustomizeConnection<PgConnection, diesel::r2d2::Error> for SearchPath {
    fn on_acquire(&self, conn: &mut PgConnection) -> Result<(), diesel::r2d2::Error> {
        conn.batch_execute(&format!("SET search_path TO {}", self.0))
            .map_err(diesel::r2d2::Error::QueryError)
    }
}

/// Schema private to one test, dropped with the value.
pub struct TestSchema {
    url: String,
    name: String,
    pool: PgPool,
}

impl TestSchema {
    /// Creates and migrates a fresh schema.
    ///
    /// Returns `Ok(None)` when no test server is configured.
    ///
    /// # Errors
    ///
    /// Returns an error if the schema cannot be created or migrated.
    pub fn create() -> Result<Option<Self>, BoxError> {
        let Some(schema) = Self::create_bare()? else {
            return Ok(None);
        };
        run_pending_migrations(&schema.pool)?;
        Ok(Some(schema))
    }

    /// Creates a fresh schema without applying migrations.
    ///
    /// Returns `Ok(None)` when no test server is configured.
    ///
    /// # Errors
    ///
    /// Returns an error if the schema cannot be created.
    pub fn create_bare() -> Result<Option<Self>, BoxError> {
        let Some(url) = std::env::var(DATABASE_URL_VAR)
            .ok()
            .filter(|value| !value.trim().is_empty())
        else {
            return Ok(None);
        };
        let name = format!("datalab_test_{}", Uuid::new_v4().simple());

        let mut admin = PgConnection::establish(&url)?;
        admin.batch_execute(&format!("CREATE SCHEMA {name}"))?;

        let pool = Pool::builder()
            .max_size(2)
            .connection_customizer(Box::new(SearchPath(name.clone())))
            .build(ConnectionManager::<PgConnection>::new(url.as_str()))?;

        Ok(Some(Self { url, name, pool }))
    }

    /// Returns the schema name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns a pool whose connections resolve tables in this schema.
    pub fn pool(&self) -> PgPool {
        self.pool.clone()
    }

    /// Runs a batch of SQL with this schema on the search path.
    ///
    /// # Errors
    ///
    /// Returns an error if no connection is available or the batch fails.
    pub fn batch_execute(&self, sql: &str) -> Result<(), BoxError> {
        let mut conn = self.pool.get()?;
        conn.batch_execute(sql)?;
        Ok(())
    }

    /// Builds target settings pointing at the test server and this schema.
    ///
    /// # Errors
    ///
    /// Returns an error if the server URL lacks a host or database name.
    pub fn target_settings(&self) -> Result<TargetDatabaseSettings, BoxError> {
        let parsed = reqwest::Url::parse(&self.url)?;
        let host = parsed.host_str().ok_or("test database URL has no host")?;
        let database = parsed.path().trim_start_matches('/');
        if database.is_empty() {
            return Err("test database URL has no database name".into());
        }

        let mut settings = TargetDatabaseSettings::new(
            host,
            parsed.username(),
            parsed.password().unwrap_or_default(),
            database,
        );
        settings.port = parsed.port().unwrap_or(settings.port);
        settings.require_tls = false;
        settings.schema.clone_from(&self.name);
        Ok(settings)
    }
}

impl Drop for TestSchema {
    fn drop(&mut self) {
        if let Ok(mut conn) = PgConnection::establish(&self.url) {
            conn.batch_execute(&format!("DROP SCHEMA IF EXISTS {} CASCADE", self.name))
                .ok();
        }
    }
}

/// Builds a terminal record written at `recorded_at` seconds past the epoch.
///
/// # Errors
///
/// Returns an error if the identifiers are invalid.
pub fn record_at(id: &str, status: JobStatus, recorded_at: i64) -> Result<JobRecord, BoxError> {
    let results = if status == JobStatus::Succeeded {
        vec![row(json!({"product_name": "Laptop", "price": 999}))?]
    } else {
        Vec::new()
    };
    record_with_rows(id, status, results, recorded_at)
}

/// Builds a terminal record carrying `results`.
///
/// # Errors
///
/// Returns an error if the identifiers or timestamp are invalid.
pub fn record_with_rows(
    id: &str,
    status: JobStatus,
    results: Vec<ResultRow>,
    recorded_at: i64,
) -> Result<JobRecord, BoxError> {
    let timestamp = DateTime::from_timestamp(recorded_at, 0).ok_or("timestamp out of range")?;
    let succeeded = status == JobStatus::Succeeded;

    Ok(JobRecord::from_persisted(PersistedJobRecord {
        id: CorrelationId::parse(id)?,
        user_question: UserQuestion::new("show me the top 3 products")?,
        generated_sql: GeneratedSql::new(
            "SELECT product_name, price FROM products ORDER BY price DESC LIMIT 3",
        ),
        sql_explanation: "Lists the most expensive products.".to_owned(),
        status,
        error: (!succeeded).then(|| "Database error: relation does not exist".to_owned()),
        results,
        result_summary: if succeeded {
            "The Laptop is the most expensive product.".to_owned()
        } else {
            String::new()
        },
        timestamp,
    }))
}

/// Converts a JSON object literal into a result row.
///
/// # Errors
///
/// Returns an error if `value` is not an object.
pub fn row(value: serde_json::Value) -> Result<ResultRow, BoxError> {
    match value {
        serde_json::Value::Object(map) => Ok(map),
        other => Err(format!("expected a JSON object, got {other}").into()),
    }
}
