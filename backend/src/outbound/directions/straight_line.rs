use async_trait::async_trait;

use crate::domain::ports::{RouteEstimate, RouteEstimateSource, RouteEstimateSourceError};
use crate::domain::{GeoPoint, distance_km};

/// Urban average used when no routing provider is configured.
pub const DEFAULT_AVERAGE_SPEED_KMH: f64 = 30.0;

/// Estimate from great-circle distance at a constant speed.
#[derive(Debug, Clone, Copy)]
pub struct StraightLineRouteEstimator {
    average_speed_kmh: f64,
}

impl StraightLineRouteEstimator {
    /// Non-positive or non-finite speeds fall back to the default.
    pub fn new(average_speed_kmh: f64) -> Self {
        let average_speed_kmh = if average_speed_kmh.is_finite() && average_speed_kmh > 0.0 {
            average_speed_kmh
        } else {
            DEFAULT_AVERAGE_SPEED_KMH
        };
        Self { average_speed_kmh }
    }
}

impl Default for StraightLineRouteEstimator {
    fn default() -> Self {
        Self::new(DEFAULT_AVERAGE_SPEED_KMH)
    }
}

#[async_trait]
impl RouteEstimateSource for StraightLineRouteEstimator {
    async fn estimate(
        &self,
        origin: GeoPoint,
        destination: GeoPoint,
    ) -> Result<RouteEstimate, RouteEstimateSourceError> {
        let distance = distance_km(origin, destination);
        let minutes = (distance / self.average_speed_kmh * 60.0).ceil();
        #[expect(
            clippy::cast_possible_truncation,
            clippy::cast_sign_loss,
            reason = "minutes derived from a bounded earth distance are small and non-negative"
        )]
        let duration_minutes = minutes as u32;
        Ok(RouteEstimate {
            distance_km: distance,
            duration_minutes,
            polyline: vec![origin, destination],
        })
    }
}
