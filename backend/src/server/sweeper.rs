//! Background expiry of stale live requests.

use std::sync::Arc;
use std::time::Duration;

use marketplace::domain::ports::ServiceRequestCommand;
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};
use tracing::{debug, info, warn};

/// Run one sweep and return how many requests expired.
///
/// The service logs what it expired. Failures are retried next tick.
pub(super) async fn sweep_once(requests: &dyn ServiceRequestCommand) -> usize {
    match requests.expire_stale_requests().await {
        Ok(expired) => {
            debug!(count = expired.len(), "expiry sweep finished");
            expired.len()
        }
        Err(error) => {
            warn!(error = %error, "expiry sweep failed");
            0
        }
    }
}

/// Counter of requests expired by the sweeper, exposed on `/metrics`.
#[cfg(feature = "metrics")]
pub(super) fn expired_requests_counter(
    registry: &prometheus::Registry,
) -> Result<prometheus::IntCounter, prometheus::Error> {
    let counter = prometheus::IntCounter::new(
        "marketplace_requests_expired_total",
        "Service requests expired by the background sweeper",
    )?;
    registry.register(Box::new(counter.clone()))?;
    Ok(counter)
}

/// Spawn the sweeper on the current runtime.
///
/// `on_expired` receives the count from every sweep that expired something.
pub(super) fn spawn_expiry_sweeper(
    requests: Arc<dyn ServiceRequestCommand>,
    period: Duration,
    on_expired: impl Fn(usize) + Send + 'static,
) -> JoinHandle<()> {
    info!(period_secs = period.as_secs(), "starting request expiry sweeper");
    tokio::spawn(async move {
        let mut ticker = time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        loop {
            ticker.tick().await;
            let expired = sweep_once(requests.as_ref()).await;
            if expired > 0 {
                on_expired(expired);
            }
        }
    })
}
