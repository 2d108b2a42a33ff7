//! HTTP request handlers (route handlers).
//!
//! Each handler is an async function that:
//! 1. Receives HTTP request data (JSON body, URL params, device context)
//! 2. Calls into the services, retrying transient storage failures
//! 3. Returns HTTP response (JSON, status code)

/// Clock-in and clock-out
pub mod clock;
/// Service health
pub mod health;
/// Job sites and geofence resolution
pub mod sites;
/// Worker registry and clock state
pub mod workers;
