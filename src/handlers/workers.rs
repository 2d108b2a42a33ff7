//! Worker registry HTTP handlers.
//!
//! This module implements the worker-related API endpoints:
//! - POST /api/v1/workers - Register a worker (device from `X-Device-Token`)
//! - GET /api/v1/workers/{phone} - Look up a worker by phone number
//! - PUT /api/v1/workers/{phone}/device - Rebind the requesting device to a worker
//! - GET /api/v1/workers/{phone}/status - Clock state for a phone number
//! - GET /api/v1/workers/{phone}/entries - Time clock history
//! - GET /api/v1/me - Worker bound to the requesting device
//! - POST /api/v1/identify?sub= - Recognize, link or register the requesting device

use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
};

use crate::{
    db::with_retry,
    error::AppError,
    middleware::device::DeviceContext,
    models::{
        time_clock::{EntriesQuery, TimeClockEntryResponse, WorkerStatusResponse},
        worker::{
            IdentifyOutcome, IdentifyRequest, IdentifyResponse, RegisterWorkerRequest,
            SubcontractorQuery, WorkerResponse,
        },
    },
    services::clock_service,
    state::AppState,
};

/// Register a new worker.
///
/// # Request Body
///
/// ```json
/// {
///   "subcontractor": "Acme",
///   "employee_name": "Jane Doe",
///   "phone_number": "555-0100"
/// }
/// ```
///
/// # Response
///
/// - **201 Created**: the registered worker
/// - **400**: a required field is blank
/// - **409 `duplicate_phone`**: phone already registered; link the device instead
pub async fn register_worker(
    State(state): State<AppState>,
    Extension(device): Extension<DeviceContext>,
    Json(request): Json<RegisterWorkerRequest>,
) -> Result<(StatusCode, Json<WorkerResponse>), AppError> {
    let pool = &state.pool;
    let device_token = device.device_token.as_deref();
    let request = &request;

    let worker = with_retry(state.retry, move || {
        clock_service::register(
            pool,
            &request.subcontractor,
            &request.employee_name,
            &request.phone_number,
            device_token,
        )
    })
    .await?;

    Ok((StatusCode::CREATED, Json(worker.into())))
}

/// Get a worker by phone number.
///
/// # Response
///
/// - **200 OK**: the worker
/// - **404 `worker_not_found`**: no worker with this phone number
pub async fn get_worker(
    State(state): State<AppState>,
    Path(phone_number): Path<String>,
) -> Result<Json<WorkerResponse>, AppError> {
    let pool = &state.pool;
    let phone = phone_number.as_str();

    let worker = with_retry(state.retry, move || clock_service::find_by_phone(pool, phone))
        .await?
        .ok_or(AppError::WorkerNotFound)?;

    Ok(Json(worker.into()))
}

/// Bind the requesting device to the worker with this phone number.
///
/// Last write wins: a device previously bound to this worker loses the
/// binding. Requires the `X-Device-Token` header.
///
/// # Response
///
/// - **200 OK**: the updated worker
/// - **400**: missing device token
/// - **404 `worker_not_found`**: phone number not registered
pub async fn link_device(
    State(state): State<AppState>,
    Extension(device): Extension<DeviceContext>,
    Path(phone_number): Path<String>,
) -> Result<Json<WorkerResponse>, AppError> {
    let device_token = device.require()?;
    let pool = &state.pool;
    let phone = phone_number.as_str();

    let worker = with_retry(state.retry, move || {
        clock_service::link_device(pool, phone, device_token)
    })
    .await?;

    Ok(Json(worker.into()))
}

/// Worker bound to the requesting device.
///
/// # Response
///
/// - **200 OK**: the worker
/// - **400**: missing device token
/// - **404 `worker_not_found`**: no worker is bound to this device
pub async fn current_worker(
    State(state): State<AppState>,
    Extension(device): Extension<DeviceContext>,
) -> Result<Json<WorkerResponse>, AppError> {
    let device_token = device.require()?;
    let pool = &state.pool;

    let worker = with_retry(state.retry, move || {
        clock_service::find_by_device(pool, device_token)
    })
    .await?
    .ok_or(AppError::WorkerNotFound)?;

    Ok(Json(worker.into()))
}

/// Resolve the requesting device to a worker.
///
/// A recognized device needs no body. Otherwise `phone_number` is linked to
/// the device if registered, or registered under `?sub=` with
/// `employee_name` if not. Requires the `X-Device-Token` header.
///
/// # Request Body
///
/// ```json
/// { "phone_number": "555-0100", "employee_name": "Jane Doe" }
/// ```
///
/// # Response
///
/// - **200 OK**: `recognized` or `linked`
/// - **201 Created**: `registered`
/// - **400**: missing device token, or a field the flow needs is missing
pub async fn identify(
    State(state): State<AppState>,
    Extension(device): Extension<DeviceContext>,
    Query(query): Query<SubcontractorQuery>,
    request: Option<Json<IdentifyRequest>>,
) -> Result<(StatusCode, Json<IdentifyResponse>), AppError> {
    let device_token = device.require()?;
    let request = request.map(|Json(body)| body).unwrap_or_default();
    let pool = &state.pool;
    let phone = request.phone_number.as_deref();
    let subcontractor = query.sub.as_deref();
    let name = request.employee_name.as_deref();

    let (outcome, worker) = with_retry(state.retry, move || {
        clock_service::identify(pool, device_token, phone, subcontractor, name)
    })
    .await?;

    let status = match outcome {
        IdentifyOutcome::Registered => StatusCode::CREATED,
        IdentifyOutcome::Recognized | IdentifyOutcome::Linked => StatusCode::OK,
    };

    Ok((
        status,
        Json(IdentifyResponse {
            outcome,
            worker: worker.into(),
        }),
    ))
}

/// Clock state of a phone number.
///
/// Unknown phone numbers are reported as `unregistered`, not 404, so the
/// presentation layer can offer registration.
///
/// ```json
/// {
///   "phone_number": "555-0100",
///   "state": "clocked_in",
///   "worker": { ... },
///   "open_session": { ... }
/// }
/// ```
pub async fn worker_status(
    State(state): State<AppState>,
    Path(phone_number): Path<String>,
) -> Result<Json<WorkerStatusResponse>, AppError> {
    let pool = &state.pool;
    let phone = phone_number.as_str();

    let status = with_retry(state.retry, move || clock_service::worker_status(pool, phone)).await?;

    Ok(Json(status.into()))
}

/// Time clock history for a worker, newest first.
///
/// # Query Parameters
///
/// - `limit` (optional): 1..=500, defaults to 50
///
/// # Response
///
/// - **200 OK**: list of entries (may be empty)
/// - **404 `worker_not_found`**: phone number not registered
pub async fn list_entries(
    State(state): State<AppState>,
    Path(phone_number): Path<String>,
    Query(query): Query<EntriesQuery>,
) -> Result<Json<Vec<TimeClockEntryResponse>>, AppError> {
    let pool = &state.pool;
    let phone = phone_number.as_str();

    with_retry(state.retry, move || clock_service::find_by_phone(pool, phone))
        .await?
        .ok_or(AppError::WorkerNotFound)?;

    let entries = with_retry(state.retry, move || {
        clock_service::list_entries(pool, phone, query.limit)
    })
    .await?;

    Ok(Json(entries.into_iter().map(Into::into).collect()))
}
