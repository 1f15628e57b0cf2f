//! `PostgreSQL` adapters for the job pipeline.

mod blocking_helpers;
mod migrations;
mod models;
mod queue;
mod schema;
mod session_store;
mod target;

pub use blocking_helpers::PgPool;
pub use migrations::{MigrationError, run_pending_migrations};
pub use queue::PostgresJobQueue;
pub use session_store::PostgresSessionStore;
pub use target::{PostgresTargetDatabase, TargetDatabaseSettings};
