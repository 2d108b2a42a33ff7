//! Application configuration management.
//!
//! This module handles loading configuration from environment variables.
//! It uses the `envy` crate to automatically deserialize environment variables into a type-safe struct.

use std::time::Duration;

use serde::Deserialize;

use crate::db::RetryPolicy;

/// Application configuration loaded from environment variables.
///
/// # Environment Variables
///
/// - `DATABASE_URL` (required): PostgreSQL connection string
/// - `SERVER_PORT` (optional): HTTP server port, defaults to 3000
/// - `DATABASE_MAX_CONNECTIONS` (optional): pool size, defaults to 5
/// - `DATABASE_ACQUIRE_TIMEOUT_SECS` (optional): how long a request waits for a pooled connection, defaults to 3
/// - `DATABASE_STATEMENT_TIMEOUT_MS` (optional): PostgreSQL `statement_timeout` per connection, defaults to 5000
/// - `STORE_RETRY_ATTEMPTS` (optional): attempts for transient storage failures, defaults to 3
/// - `STORE_RETRY_BACKOFF_MS` (optional): first retry delay (doubled each attempt), defaults to 100
/// - `REQUEST_TIMEOUT_SECS` (optional): overall HTTP request timeout, defaults to 15
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub database_url: String,

    #[serde(default = "default_port")]
    pub server_port: u16,

    #[serde(default = "default_max_connections")]
    pub database_max_connections: u32,

    #[serde(default = "default_acquire_timeout_secs")]
    pub database_acquire_timeout_secs: u64,

    #[serde(default = "default_statement_timeout_ms")]
    pub database_statement_timeout_ms: u64,

    #[serde(default = "default_retry_attempts")]
    pub store_retry_attempts: u32,

    #[serde(default = "default_retry_backoff_ms")]
    pub store_retry_backoff_ms: u64,

    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

/// Default port if SERVER_PORT environment variable is not set.
fn default_port() -> u16 {
    3000
}

fn default_max_connections() -> u32 {
    5
}

fn default_acquire_timeout_secs() -> u64 {
    3
}

fn default_statement_timeout_ms() -> u64 {
    5_000
}

fn default_retry_attempts() -> u32 {
    3
}

fn default_retry_backoff_ms() -> u64 {
    100
}

fn default_request_timeout_secs() -> u64 {
    15
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// This method first attempts to load a `.env` file (which is optional),
    /// then reads environment variables and deserializes them into a Config struct.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Required environment variables are missing (e.g., DATABASE_URL)
    /// - Environment variable values cannot be parsed into expected types
    pub fn from_env() -> Result<Self, envy::Error> {
        // Try to load .env file if it exists (does nothing if not found)
        dotenvy::dotenv().ok();

        // Field names are automatically converted: database_url -> DATABASE_URL
        envy::from_env::<Config>()
    }

    /// Retry policy applied to storage calls made by the HTTP handlers.
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            // Zero would mean "never run"; one attempt is the floor.
            max_attempts: self.store_retry_attempts.max(1),
            initial_backoff: Duration::from_millis(self.store_retry_backoff_ms),
        }
    }

    pub fn acquire_timeout(&self) -> Duration {
        Duration::from_secs(self.database_acquire_timeout_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}
