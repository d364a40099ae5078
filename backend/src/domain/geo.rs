//! Coordinates, addresses and great-circle distance.
//!
//! Distances are reported in kilometres rounded to two decimal places so the
//! figure shown to customers matches the one snapshotted on proposals.

use serde::{Deserialize, Serialize};

/// Mean Earth radius used by the haversine formula.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Distance under which a mechanic counts as having arrived.
pub const ARRIVAL_THRESHOLD_KM: f64 = 0.1;

/// Validation errors raised when constructing a [`GeoPoint`].
#[derive(Debug, Clone, Copy, PartialEq, thiserror::Error)]
pub enum GeoPointValidationError {
    #[error("latitude must be a finite value between -90 and 90, got {0}")]
    Latitude(f64),
    #[error("longitude must be a finite value between -180 and 180, got {0}")]
    Longitude(f64),
}

/// A WGS84 coordinate pair in degrees.
///
/// ## Invariants
/// - latitude lies in `[-90, 90]` and longitude in `[-180, 180]`.
///
/// # Examples
/// ```
/// use marketplace::domain::GeoPoint;
///
/// let point = GeoPoint::new(33.6844, 73.0479).expect("valid point");
/// assert!(GeoPoint::new(91.0, 0.0).is_err());
/// assert_eq!(point.latitude(), 33.6844);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "GeoPointDto", into = "GeoPointDto")]
pub struct GeoPoint {
    latitude: f64,
    longitude: f64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
struct GeoPointDto {
    lat: f64,
    lng: f64,
}

impl GeoPoint {
    /// Validate and construct a coordinate pair.
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, GeoPointValidationError> {
        if !latitude.is_finite() || !(-90.0..=90.0).contains(&latitude) {
            return Err(GeoPointValidationError::Latitude(latitude));
        }
        if !longitude.is_finite() || !(-180.0..=180.0).contains(&longitude) {
            return Err(GeoPointValidationError::Longitude(longitude));
        }
        Ok(Self {
            latitude,
            longitude,
        })
    }

    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    pub fn longitude(&self) -> f64 {
        self.longitude
    }
}

impl TryFrom<GeoPointDto> for GeoPoint {
    type Error = GeoPointValidationError;

    fn try_from(value: GeoPointDto) -> Result<Self, Self::Error> {
        Self::new(value.lat, value.lng)
    }
}

impl From<GeoPoint> for GeoPointDto {
    fn from(value: GeoPoint) -> Self {
        Self {
            lat: value.latitude,
            lng: value.longitude,
        }
    }
}

/// A coordinate plus the human-readable address shown to the mechanic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    #[serde(flatten)]
    point: GeoPoint,
    address: String,
}

impl Location {
    pub fn new(point: GeoPoint, address: impl Into<String>) -> Self {
        Self {
            point,
            address: address.into(),
        }
    }

    pub fn point(&self) -> GeoPoint {
        self.point
    }

    pub fn address(&self) -> &str {
        self.address.as_str()
    }
}

/// Haversine great-circle distance in kilometres, rounded to 2 decimals.
///
/// The function is pure and symmetric; `distance_km(a, a)` is zero.
///
/// # Examples
/// ```
/// use marketplace::domain::{GeoPoint, distance_km};
///
/// let customer = GeoPoint::new(33.6844, 73.0479).expect("valid point");
/// let mechanic = GeoPoint::new(33.70, 73.05).expect("valid point");
/// let km = distance_km(customer, mechanic);
/// assert!(km > 1.0 && km < 3.0);
/// ```
#[must_use]
pub fn distance_km(a: GeoPoint, b: GeoPoint) -> f64 {
    let lat_a = a.latitude.to_radians();
    let lat_b = b.latitude.to_radians();
    let half_dlat = (b.latitude - a.latitude).to_radians() / 2.0;
    let half_dlng = (b.longitude - a.longitude).to_radians() / 2.0;

    let h = half_dlat.sin().powi(2) + lat_a.cos() * lat_b.cos() * half_dlng.sin().powi(2);
    let central_angle = 2.0 * h.sqrt().min(1.0).asin();

    round_km(EARTH_RADIUS_KM * central_angle)
}

fn round_km(km: f64) -> f64 {
    (km * 100.0).round() / 100.0
}

/// True once the mechanic is within [`ARRIVAL_THRESHOLD_KM`] of the destination.
#[must_use]
pub fn has_arrived(mechanic: GeoPoint, destination: GeoPoint) -> bool {
    distance_km(mechanic, destination) < ARRIVAL_THRESHOLD_KM
}
