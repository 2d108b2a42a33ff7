//! Data models representing database entities.
//!
//! This module contains all data structures that map to database tables,
//! plus the request and response bodies built from them.

/// Coordinate validation
pub mod geo;
/// Job site bounding boxes
pub mod site;
/// Time clock entries and clock state
pub mod time_clock;
/// Employee registry
pub mod worker;
