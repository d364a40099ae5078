//! Mechanic request feed composition.
//!
//! The feed is the union of live requests (pending, unscheduled, younger than
//! the window) and every pending scheduled request, newest first.

use std::collections::HashSet;

use chrono::{DateTime, Duration, Utc};

use super::{RequestId, ServiceRequest};

/// Default age after which unscheduled requests leave the feed.
pub const DEFAULT_LIVE_WINDOW_MINUTES: i64 = 10;

/// Tunables for the live request feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeedPolicy {
    pub live_window: Duration,
}

impl Default for FeedPolicy {
    fn default() -> Self {
        Self {
            live_window: Duration::minutes(DEFAULT_LIVE_WINDOW_MINUTES),
        }
    }
}

impl FeedPolicy {
    /// Oldest creation time still counted as live at `now`.
    pub fn live_since(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        now - self.live_window
    }
}

/// Union both result sets, drop duplicates and anything no longer visible,
/// then sort by creation time descending.
///
/// Stores may return overlapping or slightly stale rows; the visibility check
/// here guarantees the feed never contains a non-pending request.
#[must_use]
pub fn merge_feed(
    live: Vec<ServiceRequest>,
    scheduled: Vec<ServiceRequest>,
    now: DateTime<Utc>,
    policy: FeedPolicy,
) -> Vec<ServiceRequest> {
    let mut seen: HashSet<RequestId> = HashSet::new();
    let mut feed: Vec<ServiceRequest> = live
        .into_iter()
        .chain(scheduled)
        .filter(|request| request.is_visible_to_mechanics(now, policy.live_window))
        .filter(|request| seen.insert(request.id()))
        .collect();
    feed.sort_by(|a, b| {
        b.created_at()
            .cmp(&a.created_at())
            .then_with(|| b.id().cmp(&a.id()))
    });
    feed
}
