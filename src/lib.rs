//! Geofenced time clock service.
//!
//! Subcontractor employees clock in and out at job sites identified by GPS
//! coordinates. Coordinates are matched against a table of rectangular site
//! bounding boxes; workers and their time clock entries live in PostgreSQL.
//!
//! # Architecture
//!
//! - **Web Framework**: Axum (async HTTP server)
//! - **Database**: PostgreSQL with sqlx (async queries, embedded migrations)
//! - **Identity**: opaque device token from the `X-Device-Token` header
//! - **Format**: JSON requests/responses
//!
//! The core is two services: [`services::geofence_service`] resolves a point
//! to a site and [`services::clock_service`] runs the per-worker clock
//! session state machine. Every transition is a single conditional write, so
//! concurrent duplicate requests cannot open two sessions for one worker.

pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;
pub mod state;

use std::time::Duration;

use axum::{
    Router,
    http::StatusCode,
    middleware as axum_middleware,
    routing::{get, post, put},
};
use tower_http::{cors::CorsLayer, timeout::TimeoutLayer, trace::TraceLayer};

use crate::state::AppState;

/// Build the HTTP router with all routes and middleware.
///
/// # Routes
///
/// Public:
/// - `GET /health`
///
/// Under `/api/v1` (device token extracted, never required by the middleware):
/// - `GET /sites`, `GET /sites/resolve`
/// - `POST /workers`, `GET /workers/{phone}`, `PUT /workers/{phone}/device`
/// - `GET /workers/{phone}/status`, `GET /workers/{phone}/entries`
/// - `GET /me`
/// - `POST /clock/in`, `POST /clock/out`
pub fn build_router(state: AppState, request_timeout: Duration) -> Router {
    let api_routes = Router::new()
        // Geofence
        .route("/api/v1/sites", get(handlers::sites::list_sites))
        .route("/api/v1/sites/resolve", get(handlers::sites::resolve_site))
        // Worker registry
        .route("/api/v1/workers", post(handlers::workers::register_worker))
        .route(
            "/api/v1/workers/{phone}",
            get(handlers::workers::get_worker),
        )
        .route(
            "/api/v1/workers/{phone}/device",
            put(handlers::workers::link_device),
        )
        .route(
            "/api/v1/workers/{phone}/status",
            get(handlers::workers::worker_status),
        )
        .route(
            "/api/v1/workers/{phone}/entries",
            get(handlers::workers::list_entries),
        )
        .route("/api/v1/me", get(handlers::workers::current_worker))
        .route("/api/v1/identify", post(handlers::workers::identify))
        // Clock session transitions
        .route("/api/v1/clock/in", post(handlers::clock::clock_in))
        .route("/api/v1/clock/out", post(handlers::clock::clock_out))
        .route_layer(axum_middleware::from_fn(
            middleware::device::device_middleware,
        ));

    Router::new()
        .route("/health", get(handlers::health::health_check))
        .merge(api_routes)
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            request_timeout,
        ))
        // The clock-in pages are served from a different origin
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
