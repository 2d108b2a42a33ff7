//! Worker (employee registry) model and API request/response types.
//!
//! This module defines:
//! - `Worker`: Database entity for a registered subcontractor employee
//! - `RegisterWorkerRequest`: Request body for registration
//! - `WorkerResponse`: Response body returned to clients
//! - `IdentifyOutcome` and the identify request/response types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Represents a worker record from the database.
///
/// # Database Table
///
/// Maps to the `workers` table. `phone_number` is the natural key and is
/// UNIQUE. Workers are never deleted by this service.
///
/// # Device Binding
///
/// `device_token` holds the most recent device that registered or linked this
/// phone number. A second device linking the same number overwrites the
/// first one's binding. The token is a client-supplied opaque value with no
/// cryptographic verification.
#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
pub struct Worker {
    pub id: Uuid,

    /// Company the employee works for
    pub subcontractor: String,

    pub employee_name: String,

    /// Natural key for the worker and for their time clock entries
    pub phone_number: String,

    /// Last device bound to this worker, if any
    pub device_token: Option<String>,

    pub created_at: DateTime<Utc>,

    /// Touched whenever the device binding changes
    pub updated_at: DateTime<Utc>,
}

/// Request body for registering a new worker.
///
/// The device token is read from the `X-Device-Token` header, not the body.
///
/// ```json
/// {
///   "subcontractor": "Acme",
///   "employee_name": "Jane Doe",
///   "phone_number": "555-0100"
/// }
/// ```
#[derive(Debug, Deserialize)]
pub struct RegisterWorkerRequest {
    pub subcontractor: String,
    pub employee_name: String,
    pub phone_number: String,
}

/// How [`identify`](crate::services::clock_service::identify) resolved the
/// requesting device to a worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IdentifyOutcome {
    /// The device was already bound to the worker.
    Recognized,
    /// The phone number was registered; the device is now bound to it.
    Linked,
    /// A new worker was registered with this device.
    Registered,
}

/// Query string for `POST /api/v1/identify`.
///
/// The subcontractor travels in the link handed out to its crews
/// (`?sub=Alpha%20Electrical`).
#[derive(Debug, Deserialize)]
pub struct SubcontractorQuery {
    pub sub: Option<String>,
}

/// Request body for `POST /api/v1/identify`.
///
/// Both fields are optional: a recognized device needs neither, a known phone
/// number needs no name.
#[derive(Debug, Default, Deserialize)]
pub struct IdentifyRequest {
    #[serde(default)]
    pub phone_number: Option<String>,
    #[serde(default)]
    pub employee_name: Option<String>,
}

/// Response body for `POST /api/v1/identify`.
#[derive(Debug, Serialize)]
pub struct IdentifyResponse {
    pub outcome: IdentifyOutcome,
    pub worker: WorkerResponse,
}

/// Response body for worker endpoints.
///
/// The raw device token is never echoed back; `device_linked` says whether one
/// is bound.
///
/// ```json
/// {
///   "id": "550e8400-e29b-41d4-a716-446655440000",
///   "subcontractor": "Acme",
///   "employee_name": "Jane Doe",
///   "phone_number": "555-0100",
///   "device_linked": true,
///   "created_at": "2025-12-20T10:00:00Z",
///   "updated_at": "2025-12-20T10:00:00Z"
/// }
/// ```
#[derive(Debug, Serialize)]
pub struct WorkerResponse {
    pub id: Uuid,
    pub subcontractor: String,
    pub employee_name: String,
    pub phone_number: String,
    pub device_linked: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Worker> for WorkerResponse {
    fn from(worker: Worker) -> Self {
        Self {
            id: worker.id,
            subcontractor: worker.subcontractor,
            employee_name: worker.employee_name,
            phone_number: worker.phone_number,
            device_linked: worker.device_token.is_some(),
            created_at: worker.created_at,
            updated_at: worker.updated_at,
        }
    }
}
