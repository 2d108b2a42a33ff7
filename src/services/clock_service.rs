//! Clock session service - worker registration and clock-in/clock-out.
//!
//! This service handles:
//! - Worker registration and device (re)linking
//! - Resolving the requesting device to its bound worker
//! - Clock-in and clock-out transitions
//! - Lookups by phone number and device token
//!
//! # Atomicity Guarantees
//!
//! Every transition is a single conditional statement. The database decides
//! whether the transition applies, so duplicate submits and concurrent
//! requests for the same phone number cannot both succeed:
//!
//! - registration: `INSERT ... ON CONFLICT (phone_number) DO NOTHING`
//! - clock-in: `INSERT ... ON CONFLICT (phone_number) WHERE clock_out IS NULL DO NOTHING`,
//!   arbitrated by the partial unique index on open sessions
//! - clock-out: `UPDATE ... WHERE clock_out IS NULL`
//!
//! When a conditional write changes nothing, a follow-up read only picks the
//! error to report; it never decides whether the write happens.

use chrono::{DateTime, Utc};

use crate::{
    db::DbPool,
    error::AppError,
    models::{
        geo::Coordinates,
        time_clock::{ClockState, TimeClockEntry, WorkerStatus},
        worker::{IdentifyOutcome, Worker},
    },
};

/// Default number of entries returned by [`list_entries`].
pub const DEFAULT_ENTRY_LIMIT: i64 = 50;

/// Upper bound on the number of entries returned by [`list_entries`].
pub const MAX_ENTRY_LIMIT: i64 = 500;

/// Register a new worker.
///
/// # Arguments
///
/// * `pool` - Database connection pool
/// * `subcontractor` - Company the employee works for
/// * `employee_name` - Employee display name
/// * `phone_number` - Natural key; must not be registered yet
/// * `device_token` - Device performing the registration, if known
///
/// # Errors
///
/// - `InvalidInput`: a required field is empty
/// - `DuplicatePhone`: the phone number is already registered (use [`link_device`])
pub async fn register(
    pool: &DbPool,
    subcontractor: &str,
    employee_name: &str,
    phone_number: &str,
    device_token: Option<&str>,
) -> Result<Worker, AppError> {
    let subcontractor = required("subcontractor", subcontractor)?;
    let employee_name = required("employee_name", employee_name)?;
    let phone_number = required("phone_number", phone_number)?;
    let device_token = device_token.map(str::trim).filter(|t| !t.is_empty());

    let worker = sqlx::query_as::<_, Worker>(
        r#"
        INSERT INTO workers (subcontractor, employee_name, phone_number, device_token)
        VALUES ($1, $2, $3, $4)
        ON CONFLICT (phone_number) DO NOTHING
        RETURNING *
        "#,
    )
    .bind(subcontractor)
    .bind(employee_name)
    .bind(phone_number)
    .bind(device_token)
    .fetch_optional(pool)
    .await?
    .ok_or(AppError::DuplicatePhone)?;

    tracing::info!(
        worker_id = %worker.id,
        phone = %worker.phone_number,
        subcontractor = %worker.subcontractor,
        "Worker registered"
    );

    Ok(worker)
}

/// Bind `device_token` to the worker with `phone_number`.
///
/// Last write wins: whatever device was bound before is replaced. Clock
/// state is not affected.
///
/// # Errors
///
/// - `InvalidInput`: phone number or device token is empty
/// - `WorkerNotFound`: no worker has this phone number
pub async fn link_device(
    pool: &DbPool,
    phone_number: &str,
    device_token: &str,
) -> Result<Worker, AppError> {
    let phone_number = required("phone_number", phone_number)?;
    let device_token = required("device_token", device_token)?;

    let worker = sqlx::query_as::<_, Worker>(
        r#"
        UPDATE workers
        SET device_token = $2,
            updated_at = NOW()
        WHERE phone_number = $1
        RETURNING *
        "#,
    )
    .bind(phone_number)
    .bind(device_token)
    .fetch_optional(pool)
    .await?
    .ok_or(AppError::WorkerNotFound)?;

    tracing::info!(worker_id = %worker.id, phone = %worker.phone_number, "Device linked");

    Ok(worker)
}

/// Open a session for `phone_number` at `site_name`.
///
/// # Process
///
/// 1. Validate coordinates and required fields
/// 2. Insert the entry, copying subcontractor and name from the worker row,
///    unless the worker already has an open session
/// 3. If nothing was inserted, report why
///
/// # Errors
///
/// - `InvalidInput`: non-finite coordinates or an empty required field
/// - `WorkerNotFound`: the phone number is not registered
/// - `AlreadyClockedIn`: an open session exists; nothing is written
pub async fn clock_in(
    pool: &DbPool,
    phone_number: &str,
    device_token: &str,
    lat: f64,
    lon: f64,
    site_name: &str,
    at: DateTime<Utc>,
) -> Result<TimeClockEntry, AppError> {
    let point = Coordinates::new(lat, lon)?;
    let phone_number = required("phone_number", phone_number)?;
    let device_token = required("device_token", device_token)?;
    let site_name = required("site_name", site_name)?;

    // The partial unique index on open sessions is the arbiter; a concurrent
    // clock-in for the same phone inserts nothing here.
    let inserted = sqlx::query_as::<_, TimeClockEntry>(
        r#"
        INSERT INTO time_clock_entries (
            subcontractor,
            employee_name,
            phone_number,
            site_name,
            clock_in,
            lat,
            lon,
            device_token
        )
        SELECT w.subcontractor, w.employee_name, w.phone_number, $2, $3, $4, $5, $6
        FROM workers w
        WHERE w.phone_number = $1
        ON CONFLICT (phone_number) WHERE clock_out IS NULL DO NOTHING
        RETURNING *
        "#,
    )
    .bind(phone_number)
    .bind(site_name)
    .bind(at)
    .bind(point.lat)
    .bind(point.lon)
    .bind(device_token)
    .fetch_optional(pool)
    .await?;

    let Some(entry) = inserted else {
        if find_by_phone(pool, phone_number).await?.is_none() {
            return Err(AppError::WorkerNotFound);
        }
        tracing::info!(phone = %phone_number, "Clock-in refused, session already open");
        return Err(AppError::AlreadyClockedIn);
    };

    tracing::info!(
        entry_id = %entry.id,
        phone = %entry.phone_number,
        site = %entry.site_name,
        "Clocked in"
    );

    Ok(entry)
}

/// Close the open session for `phone_number` at `at`.
///
/// # Errors
///
/// - `InvalidInput`: `at` is earlier than the open session's clock-in
/// - `NoOpenSession`: the worker has no open session
pub async fn clock_out(
    pool: &DbPool,
    phone_number: &str,
    at: DateTime<Utc>,
) -> Result<TimeClockEntry, AppError> {
    let phone_number = required("phone_number", phone_number)?;

    let closed = sqlx::query_as::<_, TimeClockEntry>(
        r#"
        UPDATE time_clock_entries
        SET clock_out = $2
        WHERE phone_number = $1
          AND clock_out IS NULL
          AND clock_in <= $2
        RETURNING *
        "#,
    )
    .bind(phone_number)
    .bind(at)
    .fetch_optional(pool)
    .await?;

    match closed {
        Some(entry) => {
            tracing::info!(
                entry_id = %entry.id,
                phone = %entry.phone_number,
                site = %entry.site_name,
                "Clocked out"
            );
            Ok(entry)
        }
        None => match current_session(pool, phone_number).await? {
            Some(open) => Err(AppError::InvalidInput(format!(
                "clock-out time {at} is before clock-in time {}",
                open.clock_in
            ))),
            None => Err(AppError::NoOpenSession),
        },
    }
}

/// Find the worker currently bound to `device_token`.
///
/// A token is normally bound to one worker. If several workers share it
/// (a shared kiosk device), the most recently linked one is returned.
pub async fn find_by_device(
    pool: &DbPool,
    device_token: &str,
) -> Result<Option<Worker>, AppError> {
    let device_token = required("device_token", device_token)?;

    let worker = sqlx::query_as::<_, Worker>(
        r#"
        SELECT * FROM workers
        WHERE device_token = $1
        ORDER BY updated_at DESC
        LIMIT 1
        "#,
    )
    .bind(device_token)
    .fetch_optional(pool)
    .await?;

    Ok(worker)
}

/// The worker bound to `device_token`, checked against a claimed phone number.
///
/// Clock transitions only run for the worker this resolves to. A blank
/// `claimed_phone` is rejected before any storage access.
///
/// # Errors
///
/// - `InvalidInput`: empty device token or blank claimed phone
/// - `WorkerNotFound`: no worker is bound to the device
/// - `DeviceMismatch`: the device is bound to a different phone number
pub async fn bound_worker(
    pool: &DbPool,
    device_token: &str,
    claimed_phone: Option<&str>,
) -> Result<Worker, AppError> {
    let claimed_phone = claimed_phone
        .map(|phone| required("phone_number", phone))
        .transpose()?;

    let worker = find_by_device(pool, device_token)
        .await?
        .ok_or(AppError::WorkerNotFound)?;

    if let Some(phone) = claimed_phone {
        if phone != worker.phone_number {
            tracing::warn!(
                claimed = %phone,
                bound = %worker.phone_number,
                "Device is bound to another worker"
            );
            return Err(AppError::DeviceMismatch);
        }
    }

    Ok(worker)
}

/// Resolve the requesting device to a worker, binding or registering as needed.
///
/// # Process
///
/// 1. A device already bound to the worker (and not naming another phone) is
///    recognized as-is
/// 2. Otherwise the phone number is required. A registered phone gets the
///    device linked to it
/// 3. An unknown phone is registered under `subcontractor` with
///    `employee_name`, both required at this step
///
/// A registration that loses a race to another request for the same phone
/// falls back to linking.
///
/// # Errors
///
/// - `InvalidInput`: a field needed by the step reached is blank or missing
pub async fn identify(
    pool: &DbPool,
    device_token: &str,
    phone_number: Option<&str>,
    subcontractor: Option<&str>,
    employee_name: Option<&str>,
) -> Result<(IdentifyOutcome, Worker), AppError> {
    let device_token = required("device_token", device_token)?;
    let phone_number = phone_number.map(str::trim).filter(|p| !p.is_empty());

    if let Some(worker) = find_by_device(pool, device_token).await? {
        if phone_number.is_none_or(|phone| phone == worker.phone_number) {
            return Ok((IdentifyOutcome::Recognized, worker));
        }
    }

    let phone_number = phone_number
        .ok_or_else(|| AppError::InvalidInput("phone_number is required".to_string()))?;

    if find_by_phone(pool, phone_number).await?.is_some() {
        let worker = link_device(pool, phone_number, device_token).await?;
        return Ok((IdentifyOutcome::Linked, worker));
    }

    let subcontractor = required("subcontractor", subcontractor.unwrap_or_default())?;
    let employee_name = required("employee_name", employee_name.unwrap_or_default())?;

    match register(pool, subcontractor, employee_name, phone_number, Some(device_token)).await {
        Ok(worker) => Ok((IdentifyOutcome::Registered, worker)),
        Err(AppError::DuplicatePhone) => {
            let worker = link_device(pool, phone_number, device_token).await?;
            Ok((IdentifyOutcome::Linked, worker))
        }
        Err(err) => Err(err),
    }
}

/// Find a worker by phone number.
pub async fn find_by_phone(pool: &DbPool, phone_number: &str) -> Result<Option<Worker>, AppError> {
    let phone_number = required("phone_number", phone_number)?;

    let worker = sqlx::query_as::<_, Worker>("SELECT * FROM workers WHERE phone_number = $1")
        .bind(phone_number)
        .fetch_optional(pool)
        .await?;

    Ok(worker)
}

/// The open session for `phone_number`, if any.
pub async fn current_session(
    pool: &DbPool,
    phone_number: &str,
) -> Result<Option<TimeClockEntry>, AppError> {
    let phone_number = required("phone_number", phone_number)?;

    let entry = sqlx::query_as::<_, TimeClockEntry>(
        "SELECT * FROM time_clock_entries WHERE phone_number = $1 AND clock_out IS NULL",
    )
    .bind(phone_number)
    .fetch_optional(pool)
    .await?;

    Ok(entry)
}

/// Worker record, open session and derived [`ClockState`] for one phone number.
///
/// An unknown phone number is not an error; it reports `Unregistered`.
pub async fn worker_status(pool: &DbPool, phone_number: &str) -> Result<WorkerStatus, AppError> {
    let phone_number = required("phone_number", phone_number)?;

    let worker = find_by_phone(pool, phone_number).await?;
    let open_session = match worker {
        Some(_) => current_session(pool, phone_number).await?,
        None => None,
    };
    let state = ClockState::derive(worker.as_ref(), open_session.as_ref());

    Ok(WorkerStatus {
        phone_number: phone_number.to_string(),
        state,
        worker,
        open_session,
    })
}

/// A worker's entries, newest clock-in first.
///
/// `limit` defaults to [`DEFAULT_ENTRY_LIMIT`] and is clamped to
/// `1..=MAX_ENTRY_LIMIT`.
pub async fn list_entries(
    pool: &DbPool,
    phone_number: &str,
    limit: Option<i64>,
) -> Result<Vec<TimeClockEntry>, AppError> {
    let phone_number = required("phone_number", phone_number)?;
    let limit = clamp_limit(limit);

    let entries = sqlx::query_as::<_, TimeClockEntry>(
        r#"
        SELECT * FROM time_clock_entries
        WHERE phone_number = $1
        ORDER BY clock_in DESC
        LIMIT $2
        "#,
    )
    .bind(phone_number)
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(entries)
}

fn clamp_limit(limit: Option<i64>) -> i64 {
    limit.unwrap_or(DEFAULT_ENTRY_LIMIT).clamp(1, MAX_ENTRY_LIMIT)
}

/// Trim a required text field, rejecting it when nothing is left.
fn required<'a>(field: &str, value: &'a str) -> Result<&'a str, AppError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(AppError::InvalidInput(format!("{field} is required")));
    }
    Ok(trimmed)
}
