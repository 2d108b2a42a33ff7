//! Business logic services.
//!
//! Services contain core business logic separated from HTTP handlers.
//! They validate input, run the conditional writes and classify refusals.

pub mod clock_service;
pub mod geofence_service;
