//! Matching notifier: tells nearby eligible mechanics about a new request.

use std::sync::Arc;

use futures_util::future::join_all;
use tracing::{debug, info, warn};

use crate::domain::ports::{MechanicRepository, MechanicRepositoryError, NotificationSender};
use crate::domain::{
    Error, MatchCandidate, MatchingPolicy, Notification, ServiceRequest, rank_by_distance,
};

pub(crate) fn map_mechanic_repository_error(error: MechanicRepositoryError) -> Error {
    match error {
        MechanicRepositoryError::Duplicate { mechanic_id } => {
            Error::conflict(format!("mechanic {mechanic_id} already exists"))
        }
        MechanicRepositoryError::Connection { message } => {
            Error::remote_failure(format!("mechanic repository unavailable: {message}"))
        }
        MechanicRepositoryError::Query { message } => {
            Error::internal(format!("mechanic repository error: {message}"))
        }
    }
}

/// Finds eligible mechanics near a request and pushes a best-effort alert to
/// each of them.
#[derive(Clone)]
pub struct MatchingNotifier<M> {
    mechanics: Arc<M>,
    notifier: Arc<dyn NotificationSender>,
    policy: MatchingPolicy,
}

impl<M> MatchingNotifier<M> {
    pub fn new(
        mechanics: Arc<M>,
        notifier: Arc<dyn NotificationSender>,
        policy: MatchingPolicy,
    ) -> Self {
        Self {
            mechanics,
            notifier,
            policy,
        }
    }
}

impl<M> MatchingNotifier<M>
where
    M: MechanicRepository,
{
    /// Rank eligible mechanics within the radius and notify each one.
    ///
    /// Delivery failures are logged per mechanic and never fail the call; the
    /// returned list is every mechanic that was targeted, nearest first.
    pub async fn notify_nearby(
        &self,
        request: &ServiceRequest,
    ) -> Result<Vec<MatchCandidate>, Error> {
        let eligible = self
            .mechanics
            .find_eligible(request.category(), self.policy.fan_out)
            .await
            .map_err(map_mechanic_repository_error)?;
        let ranked = rank_by_distance(
            request.location().point(),
            &eligible,
            self.policy.radius_km,
        );
        debug!(
            request_id = %request.id(),
            eligible = eligible.len(),
            in_radius = ranked.len(),
            "ranked mechanics for request"
        );

        let deliveries = ranked.iter().map(|candidate| {
            let notification = Notification::new_service_request(
                candidate.mechanic_id,
                request,
                candidate.distance_km,
            );
            async move {
                if let Err(err) = self.notifier.send(&notification).await {
                    warn!(
                        mechanic_id = %candidate.mechanic_id,
                        request_id = %request.id(),
                        error = %err,
                        "failed to notify mechanic"
                    );
                }
            }
        });
        join_all(deliveries).await;

        info!(
            request_id = %request.id(),
            notified = ranked.len(),
            "notified nearby mechanics"
        );
        Ok(ranked)
    }
}
