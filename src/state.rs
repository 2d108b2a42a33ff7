//! Shared application state handed to every handler.

use crate::db::{DbPool, RetryPolicy};

/// Cloned per request by axum; holds no request-scoped data.
#[derive(Debug, Clone)]
pub struct AppState {
    pub pool: DbPool,

    /// Applied to storage calls that are safe to repeat
    pub retry: RetryPolicy,
}
