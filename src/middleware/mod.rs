//! HTTP middleware components.
//!
//! Middleware are functions that run before route handlers.

/// Device token extraction
pub mod device;
