//! Time clock entry model, clock state and API request/response types.
//!
//! This module defines:
//! - `TimeClockEntry`: Database entity for one clock-in/clock-out session
//! - `ClockState`: The per-worker state machine position
//! - `WorkerStatus`: Worker, open session and derived state, read together
//! - Request types for clock-in and clock-out

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::geo::CoordinateInput;
use crate::models::worker::{Worker, WorkerResponse};

/// Represents a time clock entry from the database.
///
/// # Database Table
///
/// Maps to the `time_clock_entries` table.
///
/// # Open Sessions
///
/// An entry with `clock_out = NULL` is an open session. A partial unique
/// index allows at most one open session per phone number. Entries are
/// never deleted.
#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
pub struct TimeClockEntry {
    pub id: Uuid,

    /// Copied from the worker at clock-in time
    pub subcontractor: String,

    /// Copied from the worker at clock-in time
    pub employee_name: String,

    pub phone_number: String,

    /// Site resolved from the clock-in coordinates
    pub site_name: String,

    pub clock_in: DateTime<Utc>,

    /// NULL while the session is open; never earlier than `clock_in`
    pub clock_out: Option<DateTime<Utc>>,

    /// Latitude at clock-in
    pub lat: f64,

    /// Longitude at clock-in
    pub lon: f64,

    /// Device that performed the clock-in
    pub device_token: String,
}

impl TimeClockEntry {
    pub fn is_open(&self) -> bool {
        self.clock_out.is_none()
    }

    /// Time between clock-in and clock-out, once the session is closed.
    pub fn worked_duration(&self) -> Option<Duration> {
        self.clock_out.map(|out| out - self.clock_in)
    }
}

/// Position of a worker in the clock session state machine.
///
/// ```text
/// Unregistered --register--> ClockedOut --clock_in--> ClockedIn
///                                 ^                       |
///                                 +-------clock_out-------+
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ClockState {
    Unregistered,
    ClockedOut,
    ClockedIn,
}

impl ClockState {
    /// Derive the state from what storage currently holds for a phone number.
    pub fn derive(worker: Option<&Worker>, open_session: Option<&TimeClockEntry>) -> Self {
        match (worker, open_session) {
            (None, _) => ClockState::Unregistered,
            (Some(_), Some(entry)) if entry.is_open() => ClockState::ClockedIn,
            (Some(_), _) => ClockState::ClockedOut,
        }
    }
}

/// Worker, open session and derived state for one phone number.
#[derive(Debug, Clone)]
pub struct WorkerStatus {
    pub phone_number: String,
    pub state: ClockState,
    pub worker: Option<Worker>,
    pub open_session: Option<TimeClockEntry>,
}

/// Request to clock in.
///
/// Coordinates may be JSON numbers or numeric strings. The worker is the one
/// bound to the `X-Device-Token` header; `phone_number` is optional and, when
/// sent, must name that same worker.
///
/// ```json
/// {
///   "phone_number": "555-0100",
///   "lat": 40.005,
///   "lon": -75.005
/// }
/// ```
#[derive(Debug, Deserialize)]
pub struct ClockInRequest {
    #[serde(default)]
    pub phone_number: Option<String>,
    pub lat: CoordinateInput,
    pub lon: CoordinateInput,
}

/// Request to clock out.
///
/// Closes the open session of the worker bound to the requesting device.
///
/// ```json
/// { "phone_number": "555-0100" }
/// ```
#[derive(Debug, Default, Deserialize)]
pub struct ClockOutRequest {
    #[serde(default)]
    pub phone_number: Option<String>,
}

/// Query string for `GET /api/v1/workers/{phone}/entries`.
#[derive(Debug, Deserialize)]
pub struct EntriesQuery {
    pub limit: Option<i64>,
}

/// Response returned for time clock entries.
///
/// ```json
/// {
///   "id": "770e8400-e29b-41d4-a716-446655440002",
///   "subcontractor": "Acme",
///   "employee_name": "Jane Doe",
///   "phone_number": "555-0100",
///   "site_name": "Alpha Yard",
///   "clock_in": "2025-12-21T07:00:00Z",
///   "clock_out": "2025-12-21T15:30:00Z",
///   "lat": 40.005,
///   "lon": -75.005,
///   "worked_minutes": 510
/// }
/// ```
#[derive(Debug, Serialize)]
pub struct TimeClockEntryResponse {
    pub id: Uuid,
    pub subcontractor: String,
    pub employee_name: String,
    pub phone_number: String,
    pub site_name: String,
    pub clock_in: DateTime<Utc>,
    pub clock_out: Option<DateTime<Utc>>,
    pub lat: f64,
    pub lon: f64,
    pub worked_minutes: Option<i64>,
}

/// Convert a database entry to its API form (drops the device token).
impl From<TimeClockEntry> for TimeClockEntryResponse {
    fn from(entry: TimeClockEntry) -> Self {
        let worked_minutes = entry.worked_duration().map(|d| d.num_minutes());
        Self {
            id: entry.id,
            subcontractor: entry.subcontractor,
            employee_name: entry.employee_name,
            phone_number: entry.phone_number,
            site_name: entry.site_name,
            clock_in: entry.clock_in,
            clock_out: entry.clock_out,
            lat: entry.lat,
            lon: entry.lon,
            worked_minutes,
        }
    }
}

/// Response for `GET /api/v1/workers/{phone}/status`.
///
/// ```json
/// {
///   "phone_number": "555-0100",
///   "state": "clocked_in",
///   "worker": { ... },
///   "open_session": { ... }
/// }
/// ```
#[derive(Debug, Serialize)]
pub struct WorkerStatusResponse {
    pub phone_number: String,
    pub state: ClockState,
    pub worker: Option<WorkerResponse>,
    pub open_session: Option<TimeClockEntryResponse>,
}

impl From<WorkerStatus> for WorkerStatusResponse {
    fn from(status: WorkerStatus) -> Self {
        Self {
            phone_number: status.phone_number,
            state: status.state,
            worker: status.worker.map(Into::into),
            open_session: status.open_session.map(Into::into),
        }
    }
}
