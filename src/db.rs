//! Database connection pool, migrations and retry of transient failures.
//!
//! This module provides utilities for:
//! - Creating a PostgreSQL connection pool with bounded waits
//! - Running database migrations automatically
//! - Retrying storage calls that failed for transient reasons

use std::future::Future;
use std::str::FromStr;
use std::time::Duration;

use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::{Pool, Postgres};

use crate::config::Config;
use crate::error::AppError;

/// Type alias for PostgreSQL connection pool.
pub type DbPool = Pool<Postgres>;

/// Create a new PostgreSQL connection pool.
///
/// No storage call is allowed to hang: acquiring a connection waits at most
/// `DATABASE_ACQUIRE_TIMEOUT_SECS`, and every connection runs with a server-side
/// `statement_timeout` of `DATABASE_STATEMENT_TIMEOUT_MS`. Both surface as
/// [`AppError::StorageUnavailable`].
///
/// # Errors
///
/// Returns an error if:
/// - Database connection string is invalid
/// - Cannot connect to PostgreSQL server
/// - Database authentication fails
pub async fn create_pool(config: &Config) -> Result<DbPool, sqlx::Error> {
    let statement_timeout = format!("{}ms", config.database_statement_timeout_ms);
    let options = PgConnectOptions::from_str(&config.database_url)?
        .options([("statement_timeout", statement_timeout.as_str())]);

    PgPoolOptions::new()
        .max_connections(config.database_max_connections)
        .acquire_timeout(config.acquire_timeout())
        .connect_with(options)
        .await
}

/// Run database migrations from the `migrations/` directory.
///
/// Migrations are tracked in the `_sqlx_migrations` table, so each runs only once.
pub async fn run_migrations(pool: &DbPool) -> Result<(), sqlx::migrate::MigrateError> {
    // The macro reads migrations at compile time from ./migrations directory
    sqlx::migrate!("./migrations").run(pool).await
}

/// Bounded retry with exponential backoff for transient storage failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first one.
    pub max_attempts: u32,

    /// Delay before the second attempt; doubled for each further attempt.
    pub initial_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff: Duration::from_millis(100),
        }
    }
}

/// Run `op`, retrying while it fails with a transient error.
///
/// Only [`AppError::is_transient`] errors are retried. Business-rule
/// conflicts, validation errors and successful results are returned as soon
/// as they are produced. Every clock operation is a single conditional write,
/// so re-running one after a lost connection cannot create a second open
/// session.
pub async fn with_retry<T, F, Fut>(policy: RetryPolicy, mut op: F) -> Result<T, AppError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, AppError>>,
{
    let mut attempt = 1;
    let mut backoff = policy.initial_backoff;

    loop {
        match op().await {
            Err(err) if err.is_transient() && attempt < policy.max_attempts => {
                tracing::warn!(
                    attempt,
                    max_attempts = policy.max_attempts,
                    backoff_ms = backoff.as_millis() as u64,
                    "Transient storage failure, retrying: {}",
                    err
                );
                tokio::time::sleep(backoff).await;
                backoff = backoff.saturating_mul(2);
                attempt += 1;
            }
            Err(err) => {
                if err.is_transient() {
                    tracing::error!(attempt, "Storage still unavailable, giving up: {}", err);
                }
                return Err(err);
            }
            Ok(value) => return Ok(value),
        }
    }
}
