//! Driven port for route distance, travel time and polyline estimates.

use async_trait::async_trait;
use serde::Serialize;

use crate::domain::GeoPoint;

use super::define_port_error;

/// Route between a mechanic and a job location.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteEstimate {
    /// Road or straight-line distance in kilometres, two decimals.
    pub distance_km: f64,
    /// Expected travel time in whole minutes.
    pub duration_minutes: u32,
    /// Ordered points suitable for drawing the route.
    pub polyline: Vec<GeoPoint>,
}

define_port_error! {
    /// Errors surfaced while estimating a route.
    pub enum RouteEstimateSourceError {
        /// Network transport failed before receiving a response.
        Transport { message: String } =>
            "directions transport failed: {message}",
        /// The directions provider reported a failure.
        Provider { status: String } =>
            "directions provider returned {status}",
        /// The provider response could not be decoded.
        Decode { message: String } =>
            "directions response decode failed: {message}",
    }
}

/// Port for estimating routes between two points.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RouteEstimateSource: Send + Sync {
    /// Estimate the route from `origin` to `destination`.
    async fn estimate(
        &self,
        origin: GeoPoint,
        destination: GeoPoint,
    ) -> Result<RouteEstimate, RouteEstimateSourceError>;
}
