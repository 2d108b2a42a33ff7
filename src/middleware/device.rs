//! Device token extraction middleware.
//!
//! The presentation layer identifies the browser/device with an opaque token
//! sent in the `X-Device-Token` header. This middleware:
//! 1. Reads and trims the header (absent or blank means "no device")
//! 2. Injects a `DeviceContext` into the request extensions
//!
//! The token is a weak identity hint, not authentication: nothing verifies
//! that a client owns the token it sends. Handlers that need a device call
//! [`DeviceContext::require`].

use axum::{extract::Request, middleware::Next, response::Response};

use crate::error::AppError;

/// Header carrying the device token.
pub const DEVICE_TOKEN_HEADER: &str = "X-Device-Token";

/// Device identity attached to every `/api/v1` request.
#[derive(Debug, Clone, Default)]
pub struct DeviceContext {
    /// Trimmed header value, if a non-blank one was sent
    pub device_token: Option<String>,
}

impl DeviceContext {
    /// The device token, or `InvalidInput` if the request carried none.
    pub fn require(&self) -> Result<&str, AppError> {
        self.device_token.as_deref().ok_or_else(|| {
            AppError::InvalidInput(format!("{DEVICE_TOKEN_HEADER} header is required"))
        })
    }
}

/// Device token middleware function.
///
/// Never rejects a request; a missing or non-UTF-8 header yields an empty
/// `DeviceContext`.
pub async fn device_middleware(mut request: Request, next: Next) -> Response {
    let device_token = request
        .headers()
        .get(DEVICE_TOKEN_HEADER)
        .and_then(|h| h.to_str().ok())
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string);

    request
        .extensions_mut()
        .insert(DeviceContext { device_token });

    next.run(request).await
}
