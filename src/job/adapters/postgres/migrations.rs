//! Embedded schema migrations for the session store and queues.

use super::blocking_helpers::PgPool;
use diesel::pg::PgConnection;
use diesel::r2d2::PoolError;
use diesel_migrations::{EmbeddedMigrations, MigrationHarness, embed_migrations};
use thiserror::Error;

const MIGRATIONS: EmbeddedMigrations = embed_migrations!();

/// Migration failure.
#[derive(Debug, Error)]
pub enum MigrationError {
    /// No connection could be obtained.
    #[error("migration connection error: {0}")]
    Connection(#[from] PoolError),

    /// A migration failed to apply.
    #[error("migration failed: {0}")]
    Apply(String),
}

/// Applies pending migrations on a pooled connection.
///
/// # Errors
///
/// Returns [`MigrationError`] when no connection is available or a migration
/// fails.
pub fn run_pending_migrations(pool: &PgPool) -> Result<(), MigrationError> {
    let mut pooled = pool.get()?;
    let connection: &mut PgConnection = &mut pooled;
    connection
        .run_pending_migrations(MIGRATIONS)
        .map(|_| ())
        .map_err(|err| MigrationError::Apply(err.to_string()))
}
