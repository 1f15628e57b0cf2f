//! Target database adapter: schema introspection and statement execution.
//!
//! Each call opens its own connection and drops it before returning, on
//! success and failure alike. Statements run wrapped in a `json_agg`
//! projection so rows of any shape come back as one JSON document whose
//! object keys keep the statement's column order.

use crate::job::{
    domain::{ResultRow, SchemaDescriptor},
    ports::{DatabaseError, DatabaseResult, QueryExecutor, SchemaIntrospector},
};
use async_trait::async_trait;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::result::{ConnectionError, DatabaseErrorKind, Error as DieselError};
use diesel::sql_types::Text;
use std::fmt;
use std::time::Duration;

const DEFAULT_PORT: u16 = 5432;
const DEFAULT_SCHEMA: &str = "public";
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(15);
const DEFAULT_STATEMENT_TIMEOUT: Duration = Duration::from_secs(30);

/// Connection fragments that mark a login the server refused outright.
const REJECTED_LOGIN_MARKERS: [&str; 4] = [
    "authentication failed",
    "does not exist",
    "permission denied",
    "no pg_hba.conf entry",
];

/// Driver messages that indicate the link dropped mid-statement.
const DROPPED_LINK_MARKERS: [&str; 3] = [
    "server closed the connection",
    "connection reset",
    "could not receive data",
];

/// Connection settings for the read-only target database.
#[derive(Clone, PartialEq, Eq)]
pub struct TargetDatabaseSettings {
    /// Server host name.
    pub host: String,
    /// Server port.
    pub port: u16,
    /// Login user.
    pub user: String,
    /// Login password.
    pub password: String,
    /// Database name.
    pub database: String,
    /// Whether TLS is required.
    pub require_tls: bool,
    /// Schema whose tables are described to the language model.
    pub schema: String,
    /// Upper bound on establishing a connection.
    pub connect_timeout: Duration,
    /// Upper bound on a single statement.
    pub statement_timeout: Duration,
}

impl TargetDatabaseSettings {
    /// Creates settings with default port, schema, and timeouts.
    #[must_use]
    pub fn new(
        host: impl Into<String>,
        user: impl Into<String>,
        password: impl Into<String>,
        database: impl Into<String>,
    ) -> Self {
        Self {
            host: host.into(),
            port: DEFAULT_PORT,
            user: user.into(),
            password: password.into(),
            database: database.into(),
            require_tls: true,
            schema: DEFAULT_SCHEMA.to_owned(),
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            statement_timeout: DEFAULT_STATEMENT_TIMEOUT,
        }
    }

    /// Renders a libpq keyword/value connection string.
    #[must_use]
    pub fn connection_string(&self) -> String {
        let sslmode = if self.require_tls { "require" } else { "prefer" };
        format!(
            "host={} port={} user={} password={} dbname={} sslmode={} connect_timeout={} options={}",
            quote_value(&self.host),
            self.port,
            quote_value(&self.user),
            quote_value(&self.password),
            quote_value(&self.database),
            sslmode,
            self.connect_timeout.as_secs().max(1),
            quote_value(&format!(
                "-c statement_timeout={}",
                self.statement_timeout.as_millis()
            )),
        )
    }
}

impl fmt::Debug for TargetDatabaseSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TargetDatabaseSettings")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .field("database", &self.database)
            .field("require_tls", &self.require_tls)
            .field("schema", &self.schema)
            .field("connect_timeout", &self.connect_timeout)
            .field("statement_timeout", &self.statement_timeout)
            .finish()
    }
}

fn quote_value(value: &str) -> String {
    let escaped = value.replace('\\', "\\\\").replace('\'', "\\'");
    format!("'{escaped}'")
}

/// `PostgreSQL` target database used for introspection and execution.
#[derive(Debug, Clone)]
pub struct PostgresTargetDatabase {
    settings: TargetDatabaseSettings,
}

impl PostgresTargetDatabase {
    /// Creates an adapter for the given target.
    #[must_use]
    pub const fn new(settings: TargetDatabaseSettings) -> Self {
        Self { settings }
    }

    async fn with_connection<F, T>(&self, f: F) -> DatabaseResult<T>
    where
        F: FnOnce(&mut PgConnection) -> DatabaseResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let conninfo = self.settings.connection_string();
        tokio::task::spawn_blocking(move || {
            let mut connection =
                PgConnection::establish(&conninfo).map_err(classify_connection_error)?;
            f(&mut connection)
        })
        .await
        .map_err(DatabaseError::internal)?
    }
}

#[derive(QueryableByName)]
struct CatalogColumnRow {
    #[diesel(sql_type = Text)]
    table_name: String,
    #[diesel(sql_type = Text)]
    column_name: String,
    #[diesel(sql_type = Text)]
    data_type: String,
}

#[derive(QueryableByName)]
struct AggregatedRows {
    #[diesel(sql_type = Text)]
    rows: String,
}

#[async_trait]
impl SchemaIntrospector for PostgresTargetDatabase {
    async fn fetch_schema(&self) -> DatabaseResult<SchemaDescriptor> {
        let schema = self.settings.schema.clone();
        let columns = self
            .with_connection(move |connection| {
                diesel::sql_query(concat!(
                    "SELECT table_name::text AS table_name, ",
                    "column_name::text AS column_name, ",
                    "data_type::text AS data_type ",
                    "FROM information_schema.columns ",
                    "WHERE table_schema = $1 ",
                    "ORDER BY table_name, ordinal_position",
                ))
                .bind::<Text, _>(schema)
                .load::<CatalogColumnRow>(connection)
                .map_err(classify_query_error)
            })
            .await?;

        Ok(SchemaDescriptor::from_columns(columns.into_iter().map(
            |row| (row.table_name, row.column_name, row.data_type),
        )))
    }
}

#[async_trait]
impl QueryExecutor for PostgresTargetDatabase {
    async fn execute(&self, sql: &str) -> DatabaseResult<Vec<ResultRow>> {
        let wrapped = wrap_statement(sql);
        let aggregated = self
            .with_connection(move |connection| {
                diesel::sql_query(wrapped)
                    .get_result::<AggregatedRows>(connection)
                    .map_err(classify_query_error)
            })
            .await?;

        serde_json::from_str::<Vec<ResultRow>>(&aggregated.rows).map_err(DatabaseError::internal)
    }
}

/// Wraps a statement so its rows aggregate into a single JSON array.
///
/// The statement sits on its own lines so a trailing line comment cannot
/// swallow the closing parenthesis.
fn wrap_statement(sql: &str) -> String {
    let statement = sql.trim().trim_end_matches(';').trim_end();
    format!("SELECT COALESCE(json_agg(q), '[]'::json)::text AS rows FROM (\n{statement}\n) AS q")
}

fn classify_connection_error(err: ConnectionError) -> DatabaseError {
    match err {
        ConnectionError::BadConnection(message) if contains_any(&message, &REJECTED_LOGIN_MARKERS) => {
            DatabaseError::statement(message)
        }
        ConnectionError::BadConnection(message) => DatabaseError::transient(message),
        other => DatabaseError::statement(other.to_string()),
    }
}

fn classify_query_error(err: DieselError) -> DatabaseError {
    match err {
        DieselError::DatabaseError(DatabaseErrorKind::ClosedConnection, info) => {
            DatabaseError::transient(info.message())
        }
        DieselError::DatabaseError(_, info) if contains_any(info.message(), &DROPPED_LINK_MARKERS) => {
            DatabaseError::transient(info.message())
        }
        DieselError::DatabaseError(_, info) => DatabaseError::statement(info.message()),
        DieselError::NotFound => DatabaseError::statement("statement returned no aggregate row"),
        other => DatabaseError::internal(other),
    }
}

fn contains_any(message: &str, markers: &[&str]) -> bool {
    let lowered = message.to_lowercase();
    markers.iter().any(|marker| lowered.contains(marker))
}
