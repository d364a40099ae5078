//! Shared validation helpers for inbound HTTP adapters.
//!
//! Every helper returns an `invalid_request` error whose details name the
//! offending field, so clients can highlight it.

use std::str::FromStr;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use chrono::{NaiveDate, NaiveTime};
use serde_json::json;

use crate::domain::{Error, GeoPoint, Schedule};

/// Validation error codes for HTTP request failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ErrorCode {
    MissingField,
    InvalidUuid,
    InvalidValue,
    InvalidCoordinates,
    InvalidDate,
    InvalidTime,
    InvalidBase64,
}

impl ErrorCode {
    fn as_str(self) -> &'static str {
        match self {
            ErrorCode::MissingField => "missing_field",
            ErrorCode::InvalidUuid => "invalid_uuid",
            ErrorCode::InvalidValue => "invalid_value",
            ErrorCode::InvalidCoordinates => "invalid_coordinates",
            ErrorCode::InvalidDate => "invalid_date",
            ErrorCode::InvalidTime => "invalid_time",
            ErrorCode::InvalidBase64 => "invalid_base64",
        }
    }
}

/// Newtype wrapper for HTTP field names to provide type safety.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct FieldName(&'static str);

impl FieldName {
    pub(crate) const fn new(name: &'static str) -> Self {
        Self(name)
    }

    fn as_str(self) -> &'static str {
        self.0
    }
}

/// Builder for validation errors with field context.
struct ValidationError {
    field: &'static str,
    message: String,
}

impl ValidationError {
    fn new(field: FieldName, message: impl Into<String>) -> Self {
        Self {
            field: field.as_str(),
            message: message.into(),
        }
    }

    fn with_code(self, code: ErrorCode) -> Error {
        Error::invalid_request(self.message).with_details(json!({
            "field": self.field,
            "code": code.as_str(),
        }))
    }

    fn with_value(self, code: ErrorCode, value: impl Into<String>) -> Error {
        Error::invalid_request(self.message).with_details(json!({
            "field": self.field,
            "value": value.into(),
            "code": code.as_str(),
        }))
    }
}

pub(crate) fn missing_field_error(field: FieldName) -> Error {
    ValidationError::new(field, format!("missing required field: {}", field.as_str()))
        .with_code(ErrorCode::MissingField)
}

/// Unwrap a required field.
pub(crate) fn require<T>(value: Option<T>, field: FieldName) -> Result<T, Error> {
    value.ok_or_else(|| missing_field_error(field))
}

/// Parse a typed identifier such as `RequestId`.
pub(crate) fn parse_id<T: FromStr>(value: &str, field: FieldName) -> Result<T, Error> {
    value.parse().map_err(|_| {
        ValidationError::new(field, format!("{} must be a valid UUID", field.as_str()))
            .with_value(ErrorCode::InvalidUuid, value)
    })
}

/// Parse a closed vocabulary value such as a category or payment method.
pub(crate) fn parse_wire<T>(value: &str, field: FieldName) -> Result<T, Error>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value.parse().map_err(|err: T::Err| {
        ValidationError::new(field, err.to_string()).with_value(ErrorCode::InvalidValue, value)
    })
}

/// Validate a latitude/longitude pair.
pub(crate) fn parse_point(lat: f64, lng: f64, field: FieldName) -> Result<GeoPoint, Error> {
    GeoPoint::new(lat, lng).map_err(|err| {
        Error::invalid_request(err.to_string()).with_details(json!({
            "field": field.as_str(),
            "lat": lat,
            "lng": lng,
            "code": ErrorCode::InvalidCoordinates.as_str(),
        }))
    })
}

/// Parse a `YYYY-MM-DD` date and an `HH:MM` (or `HH:MM:SS`) time.
pub(crate) fn parse_schedule(date: &str, time: &str) -> Result<Schedule, Error> {
    let date = NaiveDate::parse_from_str(date, "%Y-%m-%d").map_err(|_| {
        ValidationError::new(FieldName::new("schedule.date"), "date must be YYYY-MM-DD")
            .with_value(ErrorCode::InvalidDate, date)
    })?;
    let time = NaiveTime::parse_from_str(time, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(time, "%H:%M:%S"))
        .map_err(|_| {
            ValidationError::new(FieldName::new("schedule.time"), "time must be HH:MM")
                .with_value(ErrorCode::InvalidTime, time)
        })?;
    Ok(Schedule { date, time })
}

/// Decode standard base64 content.
pub(crate) fn decode_base64(value: &str, field: FieldName) -> Result<Vec<u8>, Error> {
    STANDARD.decode(value.trim()).map_err(|_| {
        ValidationError::new(field, format!("{} must be base64 encoded", field.as_str()))
            .with_code(ErrorCode::InvalidBase64)
    })
}
