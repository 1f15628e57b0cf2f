//! Fixed-delay retry for transient query failures.

use crate::job::{
    domain::ResultRow,
    ports::{DatabaseResult, QueryExecutor},
};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

/// Retry schedule applied to transient database errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: u32,
    delay: Duration,
}

impl RetryPolicy {
    /// Creates a policy; zero attempts is treated as one.
    #[must_use]
    pub const fn new(max_attempts: u32, delay: Duration) -> Self {
        let attempts = if max_attempts == 0 { 1 } else { max_attempts };
        Self {
            max_attempts: attempts,
            delay,
        }
    }

    /// Returns the total number of attempts, including the first.
    #[must_use]
    pub const fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Returns the pause between attempts.
    #[must_use]
    pub const fn delay(&self) -> Duration {
        self.delay
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3, Duration::from_secs(1))
    }
}

/// Query executor decorator that retries transient failures.
///
/// Non-transient failures and the final transient failure propagate
/// unchanged.
#[derive(Debug, Clone)]
pub struct RetryingQueryExecutor<E> {
    inner: Arc<E>,
    policy: RetryPolicy,
}

impl<E> RetryingQueryExecutor<E>
where
    E: QueryExecutor,
{
    /// Wraps `inner` with `policy`.
    #[must_use]
    pub const fn new(inner: Arc<E>, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }
}

#[async_trait]
impl<E> QueryExecutor for RetryingQueryExecutor<E>
where
    E: QueryExecutor,
{
    async fn execute(&self, sql: &str) -> DatabaseResult<Vec<ResultRow>> {
        let mut attempt = 1;
        loop {
            match self.inner.execute(sql).await {
                Err(err) if err.is_transient() && attempt < self.policy.max_attempts => {
                    warn!(
                        attempt,
                        max_attempts = self.policy.max_attempts,
                        delay_ms = u64::try_from(self.policy.delay.as_millis()).unwrap_or(u64::MAX),
                        error = %err,
                        "transient database failure, retrying"
                    );
                    tokio::time::sleep(self.policy.delay).await;
                    attempt += 1;
                }
                outcome => return outcome,
            }
        }
    }
}
