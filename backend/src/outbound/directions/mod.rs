//! Route estimate sources.
//!
//! - [`StraightLineRouteEstimator`] derives an estimate from the haversine
//!   distance and a fixed average speed; no network access.
//! - [`GoogleDirectionsSource`] asks the Google Directions API and decodes the
//!   overview polyline.

mod dto;
mod google;
mod polyline;
mod straight_line;

pub use google::{GOOGLE_DIRECTIONS_ENDPOINT, GoogleDirectionsSource};
pub use straight_line::{DEFAULT_AVERAGE_SPEED_KMH, StraightLineRouteEstimator};
