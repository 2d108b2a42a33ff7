//! Clock-in / clock-out HTTP handlers.
//!
//! - POST /api/v1/clock/in - Resolve the site from coordinates, then clock in
//! - POST /api/v1/clock/out - Close the open session
//!
//! Both act on the worker bound to the `X-Device-Token` header and use the
//! server clock as the event time.

use axum::{Extension, Json, extract::State, http::StatusCode};
use chrono::Utc;

use crate::{
    db::with_retry,
    error::AppError,
    middleware::device::DeviceContext,
    models::{
        geo::Coordinates,
        time_clock::{ClockInRequest, ClockOutRequest, TimeClockEntryResponse},
    },
    services::{clock_service, geofence_service},
    state::AppState,
};

/// Clock in at the site containing the submitted coordinates.
///
/// Requires the `X-Device-Token` header. The entry is recorded for the worker
/// bound to that device; `phone_number` is optional and must match it.
///
/// # Request Body
///
/// ```json
/// {
///   "phone_number": "555-0100",
///   "lat": 40.005,
///   "lon": -75.005
/// }
/// ```
///
/// # Response
///
/// - **201 Created**: the new open entry
/// - **400 `invalid_input`**: bad coordinates, blank phone, missing device token
/// - **403 `device_mismatch`**: the device is bound to another phone number
/// - **404 `worker_not_found`**: no worker is bound to this device
/// - **409 `already_clocked_in`**: an open session exists
/// - **422 `outside_site`**: the point is not inside any job site
pub async fn clock_in(
    State(state): State<AppState>,
    Extension(device): Extension<DeviceContext>,
    Json(request): Json<ClockInRequest>,
) -> Result<(StatusCode, Json<TimeClockEntryResponse>), AppError> {
    let device_token = device.require()?;
    let point = Coordinates::parse(&request.lat, &request.lon)?;
    let claimed = request.phone_number.as_deref();
    let pool = &state.pool;

    let worker = with_retry(state.retry, move || {
        clock_service::bound_worker(pool, device_token, claimed)
    })
    .await?;

    let site = with_retry(state.retry, move || {
        geofence_service::resolve_site(pool, point.lat, point.lon)
    })
    .await?
    .ok_or(AppError::OutsideSite)?;

    let phone = worker.phone_number.as_str();
    let site_name = site.name.as_str();
    let at = Utc::now();

    let entry = with_retry(state.retry, move || {
        clock_service::clock_in(pool, phone, device_token, point.lat, point.lon, site_name, at)
    })
    .await?;

    Ok((StatusCode::CREATED, Json(entry.into())))
}

/// Clock out of the open session of the worker bound to this device.
///
/// Requires the `X-Device-Token` header. The body may be omitted.
///
/// # Request Body
///
/// ```json
/// { "phone_number": "555-0100" }
/// ```
///
/// # Response
///
/// - **200 OK**: the closed entry
/// - **403 `device_mismatch`**: the device is bound to another phone number
/// - **404 `worker_not_found`**: no worker is bound to this device
/// - **409 `no_open_session`**: nothing to close
pub async fn clock_out(
    State(state): State<AppState>,
    Extension(device): Extension<DeviceContext>,
    request: Option<Json<ClockOutRequest>>,
) -> Result<Json<TimeClockEntryResponse>, AppError> {
    let device_token = device.require()?;
    let request = request.map(|Json(body)| body).unwrap_or_default();
    let claimed = request.phone_number.as_deref();
    let pool = &state.pool;

    let worker = with_retry(state.retry, move || {
        clock_service::bound_worker(pool, device_token, claimed)
    })
    .await?;

    let phone = worker.phone_number.as_str();
    let at = Utc::now();

    let entry = with_retry(state.retry, move || clock_service::clock_out(pool, phone, at)).await?;

    Ok(Json(entry.into()))
}
