//! Error types and HTTP error response handling.
//!
//! This module defines all application errors and how they are converted
//! into HTTP responses with appropriate status codes and JSON bodies.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

/// Application-wide error type.
///
/// Every error is scoped to the single request that produced it; none of
/// them is fatal to the process.
///
/// # Error Categories
///
/// - **Input Errors**: malformed coordinates, empty required fields
/// - **Lookup Errors**: unknown worker, point outside every site
/// - **Device Errors**: the requesting device is bound to another worker
/// - **Business Rule Conflicts**: duplicate registration, double clock-in, clock-out without a session
/// - **Storage Errors**: transient (retryable) or permanent database failures
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Request data is malformed or incomplete.
    ///
    /// Returns HTTP 400 Bad Request. Never retried.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// No worker is registered for the given phone number or device.
    ///
    /// Returns HTTP 404 Not Found.
    #[error("Worker not found")]
    WorkerNotFound,

    /// The requesting device is bound to a different worker than the one named.
    ///
    /// Returns HTTP 403 Forbidden.
    #[error("This device is not linked to that phone number")]
    DeviceMismatch,

    /// The clock-in coordinates are not inside any known job site.
    ///
    /// Returns HTTP 422 Unprocessable Entity.
    #[error("Location is not inside any known job site")]
    OutsideSite,

    /// The phone number is already registered; the device should be linked instead.
    ///
    /// Returns HTTP 409 Conflict.
    #[error("Phone number is already registered")]
    DuplicatePhone,

    /// The worker already has an open session.
    ///
    /// Returns HTTP 409 Conflict.
    #[error("Already clocked in")]
    AlreadyClockedIn,

    /// Clock-out was requested but the worker has no open session.
    ///
    /// Returns HTTP 409 Conflict.
    #[error("Not clocked in")]
    NoOpenSession,

    /// The store timed out or dropped the connection. Safe to retry.
    ///
    /// Returns HTTP 503 Service Unavailable.
    #[error("Storage unavailable: {0}")]
    StorageUnavailable(String),

    /// Any other database failure.
    ///
    /// Returns HTTP 500 Internal Server Error (details hidden from client).
    #[error("Database error: {0}")]
    Database(#[source] sqlx::Error),
}

impl AppError {
    /// Whether retrying the same operation may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, AppError::StorageUnavailable(_))
    }
}

/// Classify sqlx errors into transient and permanent failures.
///
/// Transient: pool acquire timeouts, I/O errors, a crashed connection worker,
/// and the PostgreSQL codes for `statement_timeout` cancellation (57014),
/// serialization failure (40001), deadlock (40P01), lock not available
/// (55P03) and the connection exception class (08xxx).
impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        if is_transient_sqlx(&err) {
            AppError::StorageUnavailable(err.to_string())
        } else {
            AppError::Database(err)
        }
    }
}

fn is_transient_sqlx(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::PoolTimedOut | sqlx::Error::Io(_) | sqlx::Error::WorkerCrashed => true,
        sqlx::Error::Database(db_err) => match db_err.code() {
            Some(code) => {
                matches!(&*code, "57014" | "40001" | "40P01" | "55P03")
                    || code.starts_with("08")
            }
            None => false,
        },
        _ => false,
    }
}

/// Convert AppError into an HTTP response.
///
/// # Response Format
///
/// All errors return JSON in this format:
/// ```json
/// {
///   "error": {
///     "code": "error_type",
///     "message": "Human-readable error message"
///   }
/// }
/// ```
///
/// # Status Code Mapping
///
/// - `InvalidInput` → 400 Bad Request
/// - `WorkerNotFound` → 404 Not Found
/// - `DeviceMismatch` → 403 Forbidden
/// - `OutsideSite` → 422 Unprocessable Entity
/// - `DuplicatePhone`, `AlreadyClockedIn`, `NoOpenSession` → 409 Conflict
/// - `StorageUnavailable` → 503 Service Unavailable
/// - `Database` → 500 Internal Server Error (hides details from client)
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match self {
            AppError::InvalidInput(ref msg) => {
                (StatusCode::BAD_REQUEST, "invalid_input", msg.clone())
            }
            AppError::WorkerNotFound => {
                (StatusCode::NOT_FOUND, "worker_not_found", self.to_string())
            }
            AppError::DeviceMismatch => (
                StatusCode::FORBIDDEN,
                "device_mismatch",
                "This device is not linked to that phone number; link it first".to_string(),
            ),
            AppError::OutsideSite => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "outside_site",
                self.to_string(),
            ),
            AppError::DuplicatePhone => (
                StatusCode::CONFLICT,
                "duplicate_phone",
                "Phone number is already registered; link this device instead".to_string(),
            ),
            AppError::AlreadyClockedIn => (
                StatusCode::CONFLICT,
                "already_clocked_in",
                "Already clocked in; clock out before clocking in again".to_string(),
            ),
            AppError::NoOpenSession => (
                StatusCode::CONFLICT,
                "no_open_session",
                "Not clocked in; there is no open session to close".to_string(),
            ),
            AppError::StorageUnavailable(ref detail) => {
                tracing::warn!("Storage unavailable: {}", detail);
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "storage_unavailable",
                    "The service is temporarily unavailable, please retry".to_string(),
                )
            }
            AppError::Database(ref err) => {
                tracing::error!("Database error: {:?}", err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "An internal error occurred".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message
            }
        }));

        (status, body).into_response()
    }
}
