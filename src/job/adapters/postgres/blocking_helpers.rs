//! Blocking operation helpers for `PostgreSQL` adapters.
//!
//! Diesel connections are synchronous; every adapter call is moved onto the
//! blocking thread pool so the async executor's worker threads stay free.

use diesel::PgConnection;
use diesel::r2d2::{ConnectionManager, Pool, PoolError, PooledConnection};

/// `PostgreSQL` connection pool type used by the store and queue adapters.
pub type PgPool = Pool<ConnectionManager<PgConnection>>;

/// Pooled connection type for internal use.
pub(super) type PooledConn = PooledConnection<ConnectionManager<PgConnection>>;

/// Runs a blocking task and maps join errors into the caller's error type.
pub(super) async fn run_blocking_with<F, T, E, M>(f: F, map_err: M) -> Result<T, E>
where
    F: FnOnce() -> Result<T, E> + Send + 'static,
    T: Send + 'static,
    E: Send + 'static,
    M: FnOnce(tokio::task::JoinError) -> E,
{
    tokio::task::spawn_blocking(f).await.map_err(map_err)?
}

/// Obtains a connection from the pool with a caller-provided error mapper.
pub(super) fn get_conn_with<E, M>(pool: &PgPool, map_err: M) -> Result<PooledConn, E>
where
    M: FnOnce(PoolError) -> E,
{
    pool.get().map_err(map_err)
}
