//! Coordinates and coordinate parsing.
//!
//! Browser geolocation values reach the API either as JSON numbers or as
//! text copied out of form fields. Both are accepted; anything that is not a
//! finite number is rejected with [`AppError::InvalidInput`] before any
//! geofence scan runs.

use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// A validated (finite) latitude/longitude pair.
///
/// No range check is applied: a latitude of 123.0 is accepted and simply
/// matches no site.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lon: f64,
}

/// A coordinate as it arrives on the wire: a JSON number or a string.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum CoordinateInput {
    Number(f64),
    Text(String),
}

impl Coordinates {
    /// Build coordinates from already-numeric values.
    ///
    /// # Errors
    ///
    /// `InvalidInput` if either value is NaN or infinite.
    pub fn new(lat: f64, lon: f64) -> Result<Self, AppError> {
        Ok(Self {
            lat: finite("lat", lat)?,
            lon: finite("lon", lon)?,
        })
    }

    /// Parse raw request values into coordinates.
    pub fn parse(lat: &CoordinateInput, lon: &CoordinateInput) -> Result<Self, AppError> {
        Ok(Self {
            lat: lat.to_f64("lat")?,
            lon: lon.to_f64("lon")?,
        })
    }
}

impl CoordinateInput {
    fn to_f64(&self, axis: &str) -> Result<f64, AppError> {
        match self {
            CoordinateInput::Number(value) => finite(axis, *value),
            CoordinateInput::Text(raw) => {
                let trimmed = raw.trim();
                if trimmed.is_empty() {
                    return Err(AppError::InvalidInput(format!("{axis} is required")));
                }
                let value = trimmed.parse::<f64>().map_err(|_| {
                    AppError::InvalidInput(format!("{axis} is not a number: {trimmed:?}"))
                })?;
                finite(axis, value)
            }
        }
    }
}

fn finite(axis: &str, value: f64) -> Result<f64, AppError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(AppError::InvalidInput(format!(
            "{axis} must be a finite number"
        )))
    }
}
