use super::{LocationUpdate, PositionReport};
use chrono::{DateTime, Utc};
use std::fmt;

pub const LATITUDE_RANGE: (f64, f64) = (-90.0, 90.0);
pub const LONGITUDE_RANGE: (f64, f64) = (-180.0, 180.0);

/// Validation errors for location updates
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    MissingField(&'static str),
    EmptyAgentId,
    NotFinite {
        field: &'static str,
    },
    OutOfRange {
        field: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::MissingField(field) => write!(f, "{} is required", field),
            ValidationError::EmptyAgentId => write!(f, "courier_id must not be empty"),
            ValidationError::NotFinite { field } => {
                write!(f, "{} must be a finite number", field)
            }
            ValidationError::OutOfRange {
                field,
                value,
                min,
                max,
            } => write!(f, "{} {} out of range [{}, {}]", field, value, min, max),
        }
    }
}

impl std::error::Error for ValidationError {}

/// Validates a raw location update.
///
/// Validation rules:
/// - courier_id: required, not empty (the id is stored verbatim, untrimmed)
/// - latitude: required, finite, within [-90, 90]
/// - longitude: required, finite, within [-180, 180]
///
/// Fields are checked in that order; the first violation is returned.
pub fn validate(
    update: LocationUpdate,
    received_at: DateTime<Utc>,
) -> Result<PositionReport, ValidationError> {
    let agent_id = update
        .courier_id
        .ok_or(ValidationError::MissingField("courier_id"))?;
    if agent_id.is_empty() {
        return Err(ValidationError::EmptyAgentId);
    }

    let latitude = check_coordinate("latitude", update.latitude, LATITUDE_RANGE)?;
    let longitude = check_coordinate("longitude", update.longitude, LONGITUDE_RANGE)?;

    Ok(PositionReport {
        agent_id,
        latitude,
        longitude,
        received_at,
    })
}

fn check_coordinate(
    field: &'static str,
    value: Option<f64>,
    (min, max): (f64, f64),
) -> Result<f64, ValidationError> {
    let value = value.ok_or(ValidationError::MissingField(field))?;
    if !value.is_finite() {
        return Err(ValidationError::NotFinite { field });
    }
    if value < min || value > max {
        return Err(ValidationError::OutOfRange {
            field,
            value,
            min,
            max,
        });
    }
    Ok(value)
}
