//! Decoder for the encoded polyline format used by Google map APIs.
//!
//! Each coordinate is a zig-zag encoded delta from the previous one, scaled by
//! 1e5 and split into 5-bit chunks offset by 63.

use crate::domain::GeoPoint;

const PRECISION: f64 = 1e5;

/// Raised when the encoded text is truncated or holds invalid characters.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub(super) enum PolylineError {
    #[error("invalid polyline character at byte {0}")]
    InvalidCharacter(usize),
    #[error("polyline ends in the middle of a value")]
    Truncated,
    #[error("polyline decodes to an out-of-range coordinate")]
    OutOfRange,
}

pub(super) fn decode(encoded: &str) -> Result<Vec<GeoPoint>, PolylineError> {
    let bytes = encoded.as_bytes();
    let mut index = 0;
    let mut latitude: i64 = 0;
    let mut longitude: i64 = 0;
    let mut points = Vec::new();

    while index < bytes.len() {
        latitude += next_delta(bytes, &mut index)?;
        longitude += next_delta(bytes, &mut index)?;
        #[expect(
            clippy::cast_precision_loss,
            reason = "scaled coordinates fit comfortably in an f64 mantissa"
        )]
        let point = GeoPoint::new(latitude as f64 / PRECISION, longitude as f64 / PRECISION)
            .map_err(|_| PolylineError::OutOfRange)?;
        points.push(point);
    }
    Ok(points)
}

fn next_delta(bytes: &[u8], index: &mut usize) -> Result<i64, PolylineError> {
    let mut result: i64 = 0;
    let mut shift = 0;
    loop {
        let byte = *bytes.get(*index).ok_or(PolylineError::Truncated)?;
        let chunk = i64::from(byte)
            .checked_sub(63)
            .filter(|value| (0..64).contains(value))
            .ok_or(PolylineError::InvalidCharacter(*index))?;
        *index += 1;
        if shift > 60 {
            return Err(PolylineError::InvalidCharacter(*index - 1));
        }
        result |= (chunk & 0x1f) << shift;
        shift += 5;
        if chunk < 0x20 {
            break;
        }
    }
    Ok(if result & 1 == 1 {
        !(result >> 1)
    } else {
        result >> 1
    })
}
