//! DTOs for decoding Google Directions JSON responses.

use serde::Deserialize;

use super::polyline;
use crate::domain::ports::RouteEstimate;

#[derive(Debug, Deserialize)]
pub(super) struct DirectionsResponseDto {
    pub(super) status: String,
    #[serde(default)]
    pub(super) routes: Vec<RouteDto>,
    pub(super) error_message: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(super) struct RouteDto {
    #[serde(default)]
    pub(super) legs: Vec<LegDto>,
    pub(super) overview_polyline: Option<PolylineDto>,
}

#[derive(Debug, Deserialize)]
pub(super) struct LegDto {
    pub(super) distance: ValueDto,
    pub(super) duration: ValueDto,
}

#[derive(Debug, Deserialize)]
pub(super) struct ValueDto {
    pub(super) value: u64,
}

#[derive(Debug, Deserialize)]
pub(super) struct PolylineDto {
    pub(super) points: String,
}

impl RouteDto {
    /// Sum the legs and decode the overview line.
    pub(super) fn into_domain_estimate(self) -> Result<RouteEstimate, String> {
        if self.legs.is_empty() {
            return Err("route has no legs".to_owned());
        }
        let meters: u64 = self.legs.iter().map(|leg| leg.distance.value).sum();
        let seconds: u64 = self.legs.iter().map(|leg| leg.duration.value).sum();
        let polyline = match self.overview_polyline {
            Some(line) => polyline::decode(&line.points).map_err(|err| err.to_string())?,
            None => Vec::new(),
        };
        #[expect(
            clippy::cast_precision_loss,
            reason = "route lengths in metres are far below 2^52"
        )]
        let distance_km = (meters as f64 / 10.0).round() / 100.0;
        let duration_minutes = u32::try_from(seconds.div_ceil(60))
            .map_err(|_| format!("route duration of {seconds}s is out of range"))?;
        Ok(RouteEstimate {
            distance_km,
            duration_minutes,
            polyline,
        })
    }
}
