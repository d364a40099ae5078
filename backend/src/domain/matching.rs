//! Radius matching of eligible mechanics against a request location.

use std::cmp::Ordering;

use super::{GeoPoint, Mechanic, MechanicId, distance_km};

/// Default search radius around the customer.
pub const DEFAULT_RADIUS_KM: f64 = 10.0;

/// Default cap on mechanics fetched per request.
pub const DEFAULT_FAN_OUT: usize = 50;

/// Tunables for the matching notifier.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MatchingPolicy {
    pub radius_km: f64,
    pub fan_out: usize,
}

impl Default for MatchingPolicy {
    fn default() -> Self {
        Self {
            radius_km: DEFAULT_RADIUS_KM,
            fan_out: DEFAULT_FAN_OUT,
        }
    }
}

/// A mechanic inside the radius with their distance to the customer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MatchCandidate {
    pub mechanic_id: MechanicId,
    pub distance_km: f64,
}

/// Keep mechanics with a known location inside `radius_km`, nearest first.
///
/// Candidates are assumed to be pre-filtered for eligibility; mechanics with
/// no last known location are dropped.
#[must_use]
pub fn rank_by_distance(
    origin: GeoPoint,
    candidates: &[Mechanic],
    radius_km: f64,
) -> Vec<MatchCandidate> {
    let mut matches: Vec<MatchCandidate> = candidates
        .iter()
        .filter_map(|mechanic| {
            let location = mechanic.location()?;
            let distance = distance_km(origin, location);
            (distance <= radius_km).then_some(MatchCandidate {
                mechanic_id: mechanic.id(),
                distance_km: distance,
            })
        })
        .collect();
    matches.sort_by(|a, b| {
        a.distance_km
            .partial_cmp(&b.distance_km)
            .unwrap_or(Ordering::Equal)
    });
    matches
}
